use crate::error::{Error, Result};
use crate::math::{h, h_integral, h_integral_inv};
use crate::source::UniformSource;

/// Default cap on rejected candidates per [`ZipfSampler::sample`] call.
///
/// The expected number of iterations is a small constant for every valid
/// parameter pair, so hitting this means the floating point has degenerated.
pub const DEFAULT_MAX_ITERATIONS: u32 = 1_000_000;

/// Largest support for which [`ZipfSampler::probabilities`] builds the mass
/// vector (128 MiB of `f64`).
pub const MAX_PROBABILITY_ELEMENTS: u64 = 1 << 24;

/// Zipf distribution over `1..=num_elements` with `P(k) ∝ k^-exponent`.
///
/// All derived constants are fixed at construction. `sample` takes `&self`,
/// so one sampler can be shared across threads as long as every caller brings
/// its own uniform source.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ZipfSampler {
    num_elements: u64,
    exponent: f64,
    /// `H(1.5) - 1`
    h_integral_x1: f64,
    /// `H(num_elements + 0.5)`
    h_integral_num_elements: f64,
    /// `2 - H^-1(H(2.5) - h(2))`
    s: f64,
    max_iterations: u32,
}

impl ZipfSampler {
    /// Build a sampler for `num_elements >= 1` and a finite `exponent > 0`.
    pub fn new(num_elements: u64, exponent: f64) -> Result<Self> {
        if num_elements == 0 {
            return Err(Error::InvalidParameter {
                name: "num_elements",
                value: num_elements.to_string(),
            });
        }
        // Also rejects NaN.
        if !(exponent > 0.0) || exponent.is_infinite() {
            return Err(Error::InvalidParameter {
                name: "exponent",
                value: exponent.to_string(),
            });
        }

        let n = num_elements as f64;
        let sampler = Self {
            num_elements,
            exponent,
            h_integral_x1: h_integral(1.5, exponent) - 1.0,
            h_integral_num_elements: h_integral(n + 0.5, exponent),
            s: 2.0 - h_integral_inv(h_integral(2.5, exponent) - h(2.0, exponent), exponent),
            max_iterations: DEFAULT_MAX_ITERATIONS,
        };

        tracing::debug!(
            num_elements,
            exponent,
            h_integral_x1 = sampler.h_integral_x1,
            h_integral_num_elements = sampler.h_integral_num_elements,
            s = sampler.s,
            "zipf sampler constructed"
        );

        Ok(sampler)
    }

    /// Replace the per-call iteration cap. A zero limit is raised to one.
    pub fn with_max_iterations(mut self, limit: u32) -> Self {
        self.max_iterations = limit.max(1);
        self
    }

    pub fn num_elements(&self) -> u64 {
        self.num_elements
    }

    pub fn exponent(&self) -> f64 {
        self.exponent
    }

    pub fn max_iterations(&self) -> u32 {
        self.max_iterations
    }

    /// Draw one value in `1..=num_elements`.
    ///
    /// Consumes one uniform variate per candidate. Candidates are rounded with
    /// [`f64::round`], i.e. ties go away from zero.
    pub fn sample<U: UniformSource + ?Sized>(&self, source: &mut U) -> Result<u64> {
        // Algorithm ZRI from the paper uses H(x) = (v + x)^(1 - q) / (1 - q),
        // which has no limit at q = 1. Subtracting 1 in the numerator gives a
        // function that does, so any q > 0 works. Here v = 0 and values come
        // from [1, n] instead of the paper's [0, i_max].
        let hnum = self.h_integral_num_elements;
        let n = self.num_elements as f64;

        for _ in 0..self.max_iterations {
            let u = hnum + source.next_uniform() * (self.h_integral_x1 - hnum);
            // u is uniform on (h_integral_x1, h_integral_num_elements].

            let x = h_integral_inv(u, self.exponent);

            // Numerical error near the edges can put x slightly outside the
            // support. f64::max also maps NaN to 1.
            let k = x.round().max(1.0).min(n);

            // Distribution of k at this point, with C = 1 / (hnum - h_integral_x1):
            //   P(k = 1) = C * (H(1.5) - h_integral_x1) = C
            //   P(k = m) = C * (H(m + 1/2) - H(m - 1/2))   for m >= 2
            //
            // For k = 1 the right inequality always holds, since
            // H(1.5) - h(1) = h_integral_x1 < u. So 1 is returned with
            // probability C = C / 1^q.
            //
            // For k >= 2 the left inequality is a cheap sufficient test.
            // h'(x) < 0 and (-1 / H^-1'(x))'' = (1 + 1/q) x^(1/q - 1) >= 0, so
            // Theorem 2 of the paper holds for every q > 0 and
            // f(x) = x - H^-1(H(x + 1/2) - h(x)) is non-decreasing. Then
            // k - x <= s = f(2) <= f(k) gives u >= H(k + 1/2) - h(k). The
            // acceptance rate is h(m) / (H(m + 1/2) - H(m - 1/2)), so m is
            // returned with probability C * h(m) = C / m^q.
            if k - x <= self.s
                || u >= h_integral(k + 0.5, self.exponent) - h(k, self.exponent)
            {
                return Ok(k as u64);
            }
        }

        tracing::warn!(
            num_elements = self.num_elements,
            exponent = self.exponent,
            iterations = self.max_iterations,
            "zipf sampling stalled"
        );
        Err(Error::SamplingStalled {
            iterations: self.max_iterations,
        })
    }

    /// Exact probability mass for each value, index `m - 1` holding `P(k = m)`.
    ///
    /// Allocates one `f64` per element, so this returns `None` when
    /// `num_elements` exceeds [`MAX_PROBABILITY_ELEMENTS`].
    pub fn probabilities(&self) -> Option<Vec<f64>> {
        if self.num_elements > MAX_PROBABILITY_ELEMENTS {
            return None;
        }
        let mut weights: Vec<f64> = (1..=self.num_elements)
            .map(|m| h(m as f64, self.exponent))
            .collect();
        // Sum smallest terms first.
        let total: f64 = weights.iter().rev().sum();
        for w in &mut weights {
            *w /= total;
        }
        Some(weights)
    }
}
