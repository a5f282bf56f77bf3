use crate::histogram::Histogram;
use anyhow::Context;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use zipf_sampler::ZipfSampler;

/// Rows generated between updates of the shared progress counter.
const PROGRESS_BATCH: u64 = 4096;

/// Picks item ids in `1..=num_elements`.
///
/// Skew 0 is a plain uniform draw; the Zipf sampler only accepts positive
/// exponents.
#[derive(Debug, Clone)]
pub enum Selector {
    Uniform { num_elements: u64 },
    Zipf(ZipfSampler),
}

impl Selector {
    pub fn new(num_elements: u64, skew: f64) -> anyhow::Result<Self> {
        if skew == 0.0 {
            if num_elements == 0 {
                return Err(zipf_sampler::Error::InvalidParameter {
                    name: "num_elements",
                    value: num_elements.to_string(),
                }
                .into());
            }
            return Ok(Selector::Uniform { num_elements });
        }
        let sampler = ZipfSampler::new(num_elements, skew)?;
        Ok(Selector::Zipf(sampler))
    }

    pub fn name(&self) -> &'static str {
        match self {
            Selector::Uniform { .. } => "uniform",
            Selector::Zipf(_) => "zipf",
        }
    }

    /// Exact probabilities for Zipf selection. `None` for uniform selection or
    /// when the support is too large to tabulate.
    pub fn probabilities(&self) -> Option<Vec<f64>> {
        match self {
            Selector::Uniform { .. } => None,
            Selector::Zipf(sampler) => sampler.probabilities(),
        }
    }

    #[inline]
    pub fn select<R: Rng>(&self, rng: &mut R) -> zipf_sampler::Result<u64> {
        match self {
            Selector::Uniform { num_elements } => Ok(rng.gen_range(1..=*num_elements)),
            Selector::Zipf(sampler) => sampler.sample(rng),
        }
    }
}

/// One worker's share of the trace: rows already on disk at `path`, in
/// generation order, plus their counts.
#[derive(Debug)]
pub struct Part {
    pub path: PathBuf,
    pub rows: u64,
    pub histogram: Histogram,
}

/// Split `rows` across `workers`; earlier workers take the remainder.
pub fn partition(rows: u64, workers: usize) -> Vec<u64> {
    let workers = workers.max(1) as u64;
    let base = rows / workers;
    let extra = rows % workers;
    (0..workers)
        .map(|i| base + u64::from(i < extra))
        .collect()
}

/// Generate `rows` ids on one blocking task per entry of `part_paths`.
///
/// Worker `i` draws from `StdRng::seed_from_u64(seed + i)` and streams its rows
/// to `part_paths[i]`, so the output is a pure function of
/// `(selector, rows, part count, seed)` and memory stays bounded by the
/// histogram. Parts come back in worker order. `progress` is bumped as rows
/// are produced.
pub async fn generate(
    selector: Arc<Selector>,
    rows: u64,
    part_paths: Vec<PathBuf>,
    seed: u64,
    progress: Arc<AtomicU64>,
) -> anyhow::Result<Vec<Part>> {
    let quotas = partition(rows, part_paths.len());
    let mut handles = Vec::with_capacity(quotas.len());
    for (worker_id, (quota, path)) in quotas.into_iter().zip(part_paths).enumerate() {
        let selector = Arc::clone(&selector);
        let progress = Arc::clone(&progress);
        let worker_seed = seed.wrapping_add(worker_id as u64);
        handles.push(tokio::task::spawn_blocking(move || {
            run_worker(&selector, quota, worker_seed, path, &progress)
        }));
    }

    let mut parts = Vec::with_capacity(handles.len());
    for (worker_id, handle) in handles.into_iter().enumerate() {
        let part = handle
            .await
            .with_context(|| format!("worker {worker_id} panicked"))??;
        tracing::debug!(worker_id, rows = part.rows, path = %part.path.display(), "worker finished");
        parts.push(part);
    }
    Ok(parts)
}

fn run_worker(
    selector: &Selector,
    quota: u64,
    seed: u64,
    path: PathBuf,
    progress: &AtomicU64,
) -> anyhow::Result<Part> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut histogram = Histogram::new();
    let file = File::create(&path).with_context(|| format!("creating {}", path.display()))?;
    let mut out = BufWriter::new(file);

    let mut pending = 0;
    for _ in 0..quota {
        let value = selector.select(&mut rng)?;
        writeln!(out, "{value}").with_context(|| format!("writing {}", path.display()))?;
        histogram.record(value);
        pending += 1;
        if pending == PROGRESS_BATCH {
            progress.fetch_add(pending, Ordering::Relaxed);
            pending = 0;
        }
    }
    progress.fetch_add(pending, Ordering::Relaxed);
    out.flush()
        .with_context(|| format!("writing {}", path.display()))?;

    Ok(Part {
        path,
        rows: quota,
        histogram,
    })
}

/// Best-effort removal of part files left behind by a failed run.
pub fn remove_parts(paths: &[PathBuf]) {
    for path in paths {
        if let Err(e) = std::fs::remove_file(path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(path = %path.display(), error = %e, "failed to remove part file");
            }
        }
    }
}

/// `<dir>/<file>.part<i>` for `i` in `0..workers`.
pub fn part_paths(trace: &Path, workers: usize) -> Vec<PathBuf> {
    let base = trace.as_os_str().to_owned();
    (0..workers.max(1))
        .map(|i| {
            let mut name = base.clone();
            name.push(format!(".part{i}"));
            PathBuf::from(name)
        })
        .collect()
}
