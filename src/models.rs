//! Data models for the benchmark aggregator.
//!
//! This module contains the measurement row shared by the aggregation
//! and charting paths, plus the metric selector used by chart configs.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Column names in persisted order. The master CSV header row carries
/// exactly these names; per-run result files have no header and are read
/// positionally in this order.
pub const COLUMNS: [&str; 6] = [
    "Timestamp",
    "Registry",
    "SizeMB",
    "PushTime",
    "ColdPullTime",
    "WarmPullTime",
];

/// One benchmark observation: a push plus cold/warm pulls of a single
/// image against a single registry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Measurement {
    /// Run timestamp. Opaque, lexicographically sortable string.
    pub timestamp: String,
    /// Registry under test (the chart grouping key).
    pub registry: String,
    /// Image size in megabytes.
    #[serde(rename = "SizeMB")]
    pub size_mb: f64,
    /// Push duration in milliseconds.
    pub push_time: f64,
    /// Pull duration with cold caches, in milliseconds.
    pub cold_pull_time: f64,
    /// Pull duration with warm caches, in milliseconds.
    pub warm_pull_time: f64,
}

impl Measurement {
    /// Ordering used for the persisted master table:
    /// (Timestamp, Registry, SizeMB) ascending.
    pub fn cmp_by_sort_key(&self, other: &Self) -> Ordering {
        self.timestamp
            .cmp(&other.timestamp)
            .then_with(|| self.registry.cmp(&other.registry))
            .then_with(|| self.size_mb.total_cmp(&other.size_mb))
    }

    /// Hashable identity over all six columns, used for exact-duplicate
    /// removal. Floats compare bit-exact.
    pub fn dedup_key(&self) -> (String, String, u64, u64, u64, u64) {
        (
            self.timestamp.clone(),
            self.registry.clone(),
            self.size_mb.to_bits(),
            self.push_time.to_bits(),
            self.cold_pull_time.to_bits(),
            self.warm_pull_time.to_bits(),
        )
    }

    /// Look up a numeric column by its CSV name.
    pub fn numeric_field(&self, column: &str) -> Option<f64> {
        match column {
            "SizeMB" => Some(self.size_mb),
            "PushTime" => Some(self.push_time),
            "ColdPullTime" => Some(self.cold_pull_time),
            "WarmPullTime" => Some(self.warm_pull_time),
            _ => None,
        }
    }

    /// Look up any column by its CSV name, rendered as text. Used for the
    /// standalone chart's group column.
    pub fn text_field(&self, column: &str) -> Option<String> {
        match column {
            "Timestamp" => Some(self.timestamp.clone()),
            "Registry" => Some(self.registry.clone()),
            other => self.numeric_field(other).map(|v| v.to_string()),
        }
    }
}

/// Timing column plotted by a configured chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Metric {
    PushTime,
    ColdPullTime,
    WarmPullTime,
}

impl Metric {
    /// The CSV column this metric reads.
    pub fn column(&self) -> &'static str {
        match self {
            Metric::PushTime => "PushTime",
            Metric::ColdPullTime => "ColdPullTime",
            Metric::WarmPullTime => "WarmPullTime",
        }
    }

    /// Extract this metric's value from a row.
    pub fn value(&self, row: &Measurement) -> f64 {
        match self {
            Metric::PushTime => row.push_time,
            Metric::ColdPullTime => row.cold_pull_time,
            Metric::WarmPullTime => row.warm_pull_time,
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.column())
    }
}
