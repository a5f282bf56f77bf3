use crate::Args;
use anyhow::{bail, Context};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Optional file-based settings. Command-line flags take precedence.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub generator: GeneratorConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeneratorConfig {
    #[serde(default = "default_workers")]
    pub workers: usize,
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default = "default_progress_interval")]
    pub progress_interval_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_out_dir")]
    pub out_dir: PathBuf,
    #[serde(default)]
    pub build_table: bool,
    #[serde(default = "default_summary")]
    pub summary: bool,
}

impl Config {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let config: Config =
            toml::from_str(&contents).with_context(|| format!("parsing {}", path.display()))?;
        Ok(config)
    }
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            seed: None,
            progress_interval_secs: default_progress_interval(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            out_dir: default_out_dir(),
            build_table: false,
            summary: default_summary(),
        }
    }
}

/// Fully resolved run parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub data_size: u64,
    pub data_accesses: u64,
    pub skew: f64,
    pub seed: Option<u64>,
    pub workers: usize,
    pub out_dir: PathBuf,
    pub build_table: bool,
    pub summary: bool,
    pub progress_interval_secs: u64,
}

impl Settings {
    /// Merge CLI arguments over file config and validate the result.
    pub fn resolve(args: &Args, config: &Config) -> anyhow::Result<Self> {
        if args.data_size == 0 {
            bail!("data size must be at least 1");
        }
        if !(args.skew >= 0.0) || args.skew.is_infinite() {
            bail!("skew must be a finite value >= 0, got {}", args.skew);
        }

        Ok(Self {
            data_size: args.data_size,
            data_accesses: args.data_accesses,
            skew: args.skew,
            seed: args.seed.or(config.generator.seed),
            workers: args.workers.unwrap_or(config.generator.workers).max(1),
            out_dir: args
                .out_dir
                .clone()
                .unwrap_or_else(|| config.output.out_dir.clone()),
            build_table: args.build_table || config.output.build_table,
            summary: !args.no_summary && config.output.summary,
            progress_interval_secs: config.generator.progress_interval_secs.max(1),
        })
    }
}

fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}
fn default_progress_interval() -> u64 {
    5
}
fn default_out_dir() -> PathBuf {
    PathBuf::from(".")
}
fn default_summary() -> bool {
    true
}
