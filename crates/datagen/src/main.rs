mod config;
mod generator;
mod histogram;
mod output;

use anyhow::Context;
use clap::Parser;
use config::{Config, Settings};
use generator::Selector;
use histogram::Histogram;
use output::{OutputPaths, Summary, ValueCount};
use rand::Rng;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

/// Largest support for which the summary computes a chi-squared statistic.
const CHI_SQUARED_MAX_ELEMENTS: u64 = 1_000_000;

/// Access-trace generator: Zipf-distributed (or uniform, for skew 0) item ids.
#[derive(Debug, Parser)]
#[command(name = "datagen", allow_negative_numbers = true)]
pub struct Args {
    /// Number of distinct items; ids are drawn from 1..=data_size
    pub data_size: u64,

    /// Number of rows to generate
    pub data_accesses: u64,

    /// Zipf exponent; 0 generates a uniform trace
    pub skew: f64,

    /// Seed for the random engine (default: from OS entropy)
    #[arg(long)]
    pub seed: Option<u64>,

    /// Number of generator tasks
    #[arg(long)]
    pub workers: Option<usize>,

    /// Directory for the output files
    #[arg(long)]
    pub out_dir: Option<PathBuf>,

    /// Also write `<data_size>_build.txt` with `row|row` lines
    #[arg(long)]
    pub build_table: bool,

    /// Skip the JSON run summary
    #[arg(long)]
    pub no_summary: bool,

    /// TOML config file (default: datagen.toml if present)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Emit logs as JSON
    #[arg(long)]
    pub log_json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if args.log_json {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    let config = load_config(args.config.as_deref())?;
    let settings = Settings::resolve(&args, &config)?;
    run(settings).await
}

fn load_config(explicit: Option<&Path>) -> anyhow::Result<Config> {
    if let Some(path) = explicit {
        let config = Config::load(path)?;
        tracing::info!(path = %path.display(), "loaded config");
        return Ok(config);
    }
    let default_path = Path::new("datagen.toml");
    if default_path.exists() {
        let config = Config::load(default_path)?;
        tracing::info!("loaded config from datagen.toml");
        Ok(config)
    } else {
        Ok(Config::default())
    }
}

async fn run(settings: Settings) -> anyhow::Result<()> {
    let seed = settings.seed.unwrap_or_else(|| rand::thread_rng().gen());
    let selector = Arc::new(Selector::new(settings.data_size, settings.skew)?);
    let paths = OutputPaths::new(
        &settings.out_dir,
        settings.data_size,
        settings.data_accesses,
        settings.skew,
    );

    std::fs::create_dir_all(&settings.out_dir)
        .with_context(|| format!("creating {}", settings.out_dir.display()))?;

    tracing::info!(
        data_size = settings.data_size,
        data_accesses = settings.data_accesses,
        skew = settings.skew,
        distribution = selector.name(),
        seed,
        workers = settings.workers,
        out_dir = %settings.out_dir.display(),
        "datagen starting"
    );

    if settings.build_table {
        output::write_build_table(&paths.build_table, settings.data_size)?;
        tracing::info!(path = %paths.build_table.display(), "build table written");
    }

    let progress = Arc::new(AtomicU64::new(0));
    let reporter = spawn_progress_reporter(
        Arc::clone(&progress),
        settings.data_accesses,
        Duration::from_secs(settings.progress_interval_secs),
    );

    let part_paths = generator::part_paths(&paths.trace, settings.workers);
    let started = Instant::now();
    let result = generator::generate(
        Arc::clone(&selector),
        settings.data_accesses,
        part_paths.clone(),
        seed,
        Arc::clone(&progress),
    )
    .await;
    reporter.abort();
    let parts = match result {
        Ok(parts) => parts,
        Err(e) => {
            generator::remove_parts(&part_paths);
            return Err(e);
        }
    };
    let elapsed = started.elapsed();

    tracing::info!(
        rows = progress.load(Ordering::Relaxed),
        elapsed_ms = elapsed.as_millis() as u64,
        "generation finished"
    );

    if let Err(e) = output::write_trace(&paths.trace, &parts) {
        generator::remove_parts(&part_paths);
        return Err(e);
    }
    tracing::info!(path = %paths.trace.display(), "trace written");

    let mut histogram = Histogram::new();
    for part in parts {
        histogram.merge(part.histogram);
    }

    output::write_frequencies(&paths.frequencies, &histogram)?;
    tracing::info!(
        path = %paths.frequencies.display(),
        distinct = histogram.distinct(),
        "frequencies written"
    );

    if settings.summary {
        let chi_squared = if settings.data_size <= CHI_SQUARED_MAX_ELEMENTS {
            selector
                .probabilities()
                .map(|probs| histogram.chi_squared(&probs))
        } else {
            None
        };
        let summary = Summary {
            data_size: settings.data_size,
            data_accesses: settings.data_accesses,
            skew: settings.skew,
            distribution: selector.name(),
            seed,
            workers: settings.workers,
            elapsed_ms: elapsed.as_millis(),
            distinct_values: histogram.distinct(),
            most_frequent: histogram
                .most_frequent()
                .map(|(value, count)| ValueCount { value, count }),
            chi_squared,
        };
        output::write_summary(&paths.summary, &summary)?;
        tracing::info!(path = %paths.summary.display(), chi_squared = ?chi_squared, "summary written");
    }

    tracing::info!("datagen done");
    Ok(())
}

/// Log rows generated and throughput every `interval`.
fn spawn_progress_reporter(
    progress: Arc<AtomicU64>,
    target: u64,
    interval: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut prev = 0u64;
        let mut ticker = tokio::time::interval(interval);
        // First tick fires immediately.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let current = progress.load(Ordering::Relaxed);
            let rate = (current - prev) as f64 / interval.as_secs_f64();
            prev = current;
            tracing::info!(
                rows = current,
                target,
                rps = format!("{:.0}", rate),
                "progress"
            );
        }
    })
}
