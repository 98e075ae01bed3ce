//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Regbench - container registry benchmark aggregation and charting
///
/// Merges per-run benchmark CSV files into a master dataset and renders
/// SVG line charts of push/pull performance versus image size.
///
/// Examples:
///   regbench aggregate
///   regbench aggregate --data-file results/data.csv --results-dir all-results
///   regbench aggregate --init-config
///   regbench chart results/data.csv out.svg "Push Performance" SizeMB PushTime Registry "Image Size (MB)" "Time (ms)"
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose logging output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Run in quiet mode (errors only)
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Merge new benchmark results into the master table and render the
    /// configured charts
    Aggregate(AggregateArgs),

    /// Render a single chart from one CSV file; writes a placeholder image
    /// when the input is missing or empty
    Chart(ChartArgs),
}

/// Arguments for the batch aggregation path.
#[derive(Parser, Debug, Clone)]
pub struct AggregateArgs {
    /// Path to configuration file
    ///
    /// If not specified, looks for .regbench.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Master table CSV path (overrides config)
    #[arg(long, value_name = "FILE")]
    pub data_file: Option<PathBuf>,

    /// Directory searched recursively for new result CSVs (overrides config)
    #[arg(long, value_name = "DIR")]
    pub results_dir: Option<PathBuf>,

    /// Generate a default .regbench.toml configuration file and exit
    #[arg(long)]
    pub init_config: bool,
}

/// Arguments for the standalone single-chart renderer.
///
/// Positional, in the order automation invokes them.
#[derive(Parser, Debug, Clone)]
pub struct ChartArgs {
    /// Input CSV path (with header row)
    pub input: PathBuf,

    /// Output SVG path
    pub output: PathBuf,

    /// Chart title
    pub title: String,

    /// X-axis column name (numeric, e.g. SizeMB)
    pub x_col: String,

    /// Y-axis column name (numeric, e.g. PushTime)
    pub y_col: String,

    /// Group-by column name (one plotted line per distinct value)
    pub group_col: String,

    /// X-axis label
    pub x_label: String,

    /// Y-axis label
    pub y_label: String,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if let Command::Chart(ref chart) = self.command {
            if chart.title.is_empty() {
                return Err("Chart title must not be empty".to_string());
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}
