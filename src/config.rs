//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.regbench.toml` files. The built-in defaults reproduce the standard
//! pipeline layout: master table at `results/data.csv`, new results under
//! `all-results/`, and push/cold-pull charts at the repository root.

use crate::models::Metric;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// File locations.
    #[serde(default)]
    pub paths: PathsConfig,

    /// Charts rendered after each aggregation run.
    #[serde(default = "default_charts")]
    pub charts: Vec<ChartConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            paths: PathsConfig::default(),
            charts: default_charts(),
        }
    }
}

/// File locations for the aggregation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Master table CSV, read at job start and rewritten at job end.
    #[serde(default = "default_data_file")]
    pub data_file: PathBuf,

    /// Directory searched recursively for new per-run CSV files.
    #[serde(default = "default_results_dir")]
    pub results_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            data_file: default_data_file(),
            results_dir: default_results_dir(),
        }
    }
}

fn default_data_file() -> PathBuf {
    PathBuf::from("results/data.csv")
}

fn default_results_dir() -> PathBuf {
    PathBuf::from("all-results")
}

/// One chart to render from the aggregated table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartConfig {
    /// Timing column to plot (averaged per registry and size).
    pub metric: Metric,

    /// Output SVG path.
    pub output: PathBuf,

    /// Chart title.
    pub title: String,
}

fn default_charts() -> Vec<ChartConfig> {
    vec![
        ChartConfig {
            metric: Metric::PushTime,
            output: PathBuf::from("chart-push-performance.svg"),
            title: "Push Performance (Time vs. Image Size)".to_string(),
        },
        ChartConfig {
            metric: Metric::ColdPullTime,
            output: PathBuf::from("chart-cold-pull-performance.svg"),
            title: "Cold Pull Performance (Time vs. Image Size)".to_string(),
        },
    ]
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but
    /// can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(".regbench.toml");

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings; only
    /// explicitly provided flags override.
    pub fn merge_with_args(&mut self, args: &crate::cli::AggregateArgs) {
        if let Some(ref data_file) = args.data_file {
            self.paths.data_file = data_file.clone();
        }
        if let Some(ref results_dir) = args.results_dir {
            self.paths.results_dir = results_dir.clone();
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
