use std::collections::HashMap;

/// Occurrence counts per generated value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Histogram {
    counts: HashMap<u64, u64>,
    total: u64,
}

impl Histogram {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn record(&mut self, value: u64) {
        *self.counts.entry(value).or_insert(0) += 1;
        self.total += 1;
    }

    /// Fold another histogram into this one.
    pub fn merge(&mut self, other: Histogram) {
        for (value, count) in other.counts {
            *self.counts.entry(value).or_insert(0) += count;
        }
        self.total += other.total;
    }

    pub fn count(&self, value: u64) -> u64 {
        self.counts.get(&value).copied().unwrap_or(0)
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    /// Number of values seen at least once.
    pub fn distinct(&self) -> usize {
        self.counts.len()
    }

    /// Counts of every seen value, ascending. Values themselves are dropped.
    pub fn sorted_frequencies(&self) -> Vec<u64> {
        let mut freqs: Vec<u64> = self.counts.values().copied().collect();
        freqs.sort_unstable();
        freqs
    }

    /// `(value, count)` with the highest count; ties go to the smaller value.
    pub fn most_frequent(&self) -> Option<(u64, u64)> {
        self.counts
            .iter()
            .map(|(&v, &c)| (v, c))
            .max_by(|a, b| a.1.cmp(&b.1).then(b.0.cmp(&a.0)))
    }

    /// Pearson's chi-squared statistic against `probs`, where `probs[m - 1]`
    /// is the expected probability of value `m`. Unseen values count as zero.
    pub fn chi_squared(&self, probs: &[f64]) -> f64 {
        let total = self.total() as f64;
        probs
            .iter()
            .enumerate()
            .filter(|&(_, &p)| p > 0.0)
            .map(|(i, &p)| {
                let expected = p * total;
                let observed = self.count(i as u64 + 1) as f64;
                let d = observed - expected;
                d * d / expected
            })
            .sum()
    }
}

impl Extend<u64> for Histogram {
    fn extend<I: IntoIterator<Item = u64>>(&mut self, iter: I) {
        for value in iter {
            self.record(value);
        }
    }
}
