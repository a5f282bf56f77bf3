use crate::generator::Part;
use crate::histogram::Histogram;
use anyhow::Context;
use serde::Serialize;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Base name shared by every file of one run, e.g. `1000_50000_0.800000`.
pub fn file_stem(data_size: u64, data_accesses: u64, skew: f64) -> String {
    format!("{data_size}_{data_accesses}_{skew:.6}")
}

/// Paths of the files a run produces under `out_dir`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPaths {
    pub trace: PathBuf,
    pub frequencies: PathBuf,
    pub summary: PathBuf,
    pub build_table: PathBuf,
}

impl OutputPaths {
    pub fn new(out_dir: &Path, data_size: u64, data_accesses: u64, skew: f64) -> Self {
        let stem = file_stem(data_size, data_accesses, skew);
        Self {
            trace: out_dir.join(format!("{stem}.csv")),
            frequencies: out_dir.join(format!("{stem}_sorted_freq.csv")),
            summary: out_dir.join(format!("{stem}_summary.json")),
            build_table: out_dir.join(format!("{data_size}_build.txt")),
        }
    }
}

fn create(path: &Path) -> anyhow::Result<BufWriter<File>> {
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    Ok(BufWriter::new(file))
}

/// Concatenate worker part files into the trace, in order, deleting each
/// part once copied.
pub fn write_trace(path: &Path, parts: &[Part]) -> anyhow::Result<()> {
    let mut out = create(path)?;
    for part in parts {
        let mut input = File::open(&part.path)
            .with_context(|| format!("opening {}", part.path.display()))?;
        io::copy(&mut input, &mut out)
            .with_context(|| format!("copying {}", part.path.display()))?;
        std::fs::remove_file(&part.path)
            .with_context(|| format!("removing {}", part.path.display()))?;
    }
    out.flush()
        .with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

/// Occurrence counts of every seen value, ascending, one per line.
pub fn write_frequencies(path: &Path, histogram: &Histogram) -> anyhow::Result<()> {
    let mut out = create(path)?;
    for count in histogram.sorted_frequencies() {
        writeln!(out, "{count}")?;
    }
    out.flush()
        .with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

/// Join-side table with rows `row|row` for `1..=rows`.
pub fn write_build_table(path: &Path, rows: u64) -> anyhow::Result<()> {
    let mut out = create(path)?;
    for row in 1..=rows {
        writeln!(out, "{row}|{row}")?;
    }
    out.flush()
        .with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

#[derive(Debug, Clone, Serialize)]
pub struct ValueCount {
    pub value: u64,
    pub count: u64,
}

/// Run report written next to the trace.
#[derive(Debug, Clone, Serialize)]
pub struct Summary {
    pub data_size: u64,
    pub data_accesses: u64,
    pub skew: f64,
    pub distribution: &'static str,
    pub seed: u64,
    pub workers: usize,
    pub elapsed_ms: u128,
    pub distinct_values: usize,
    pub most_frequent: Option<ValueCount>,
    /// Pearson statistic against the exact Zipf mass; skipped for uniform
    /// runs and very large supports.
    pub chi_squared: Option<f64>,
}

pub fn write_summary(path: &Path, summary: &Summary) -> anyhow::Result<()> {
    let mut out = create(path)?;
    serde_json::to_writer_pretty(&mut out, summary)
        .with_context(|| format!("serializing {}", path.display()))?;
    writeln!(out)?;
    out.flush()
        .with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read(path: &Path) -> String {
        std::fs::read_to_string(path).unwrap()
    }

    #[test]
    fn stem_uses_six_decimals() {
        assert_eq!(file_stem(1000, 50, 0.8), "1000_50_0.800000");
        assert_eq!(file_stem(10, 1, 0.0), "10_1_0.000000");
    }

    #[test]
    fn paths_share_the_stem() {
        let paths = OutputPaths::new(Path::new("out"), 10, 20, 1.5);
        assert_eq!(paths.trace, PathBuf::from("out/10_20_1.500000.csv"));
        assert_eq!(
            paths.frequencies,
            PathBuf::from("out/10_20_1.500000_sorted_freq.csv")
        );
        assert_eq!(
            paths.summary,
            PathBuf::from("out/10_20_1.500000_summary.json")
        );
        assert_eq!(paths.build_table, PathBuf::from("out/10_build.txt"));
    }

    fn part(path: PathBuf, contents: &str) -> Part {
        std::fs::write(&path, contents).unwrap();
        Part {
            path,
            rows: contents.lines().count() as u64,
            histogram: Histogram::new(),
        }
    }

    #[test]
    fn trace_keeps_part_order_and_removes_parts() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trace.csv");
        let parts = vec![
            part(dir.path().join("trace.csv.part0"), "3\n1\n"),
            part(dir.path().join("trace.csv.part1"), ""),
            part(dir.path().join("trace.csv.part2"), "2\n"),
        ];
        write_trace(&path, &parts).unwrap();
        assert_eq!(read(&path), "3\n1\n2\n");
        for p in &parts {
            assert!(!p.path.exists());
        }
    }

    #[test]
    fn frequencies_are_sorted_counts() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("freq.csv");
        let mut histogram = Histogram::new();
        histogram.extend([1, 1, 1, 2, 3, 3]);
        write_frequencies(&path, &histogram).unwrap();
        assert_eq!(read(&path), "1\n2\n3\n");
    }

    #[test]
    fn build_table_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("build.txt");
        write_build_table(&path, 3).unwrap();
        assert_eq!(read(&path), "1|1\n2|2\n3|3\n");
    }

    #[test]
    fn summary_is_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("summary.json");
        let summary = Summary {
            data_size: 10,
            data_accesses: 100,
            skew: 1.0,
            distribution: "zipf",
            seed: 5,
            workers: 2,
            elapsed_ms: 12,
            distinct_values: 9,
            most_frequent: Some(ValueCount {
                value: 1,
                count: 34,
            }),
            chi_squared: Some(3.5),
        };
        write_summary(&path, &summary).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&read(&path)).unwrap();
        assert_eq!(parsed["distribution"], "zipf");
        assert_eq!(parsed["seed"], 5);
        assert_eq!(parsed["most_frequent"]["count"], 34);
        assert_eq!(parsed["chi_squared"], 3.5);
    }

    #[test]
    fn missing_directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope").join("trace.csv");
        let err = write_trace(&path, &[]).unwrap_err();
        assert!(err.to_string().contains("creating"));
    }
}
