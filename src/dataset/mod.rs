//! Master-table loading, new-result discovery, merging, and persistence.
//!
//! The master table is read in full at job start and rewritten in full at
//! job end. There is no locking: concurrent invocations against the same
//! master path race (documented limitation of the pipeline).

use crate::models::{Measurement, COLUMNS};
use anyhow::{Context, Result};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Load the master table. A missing, empty, or unparsable file is treated
/// as an empty table so a fresh pipeline can bootstrap itself.
pub fn load_master(path: &Path) -> Vec<Measurement> {
    if !path.exists() {
        debug!("Master file {} does not exist, starting empty", path.display());
        return Vec::new();
    }

    match read_csv(path, true) {
        Ok(rows) => rows,
        Err(e) => {
            warn!(
                "Master file {} is empty or unparsable, starting empty: {:#}",
                path.display(),
                e
            );
            Vec::new()
        }
    }
}

/// Read a headered CSV into measurement rows. Unlike [`load_master`], any
/// parse failure here is fatal.
pub fn load_csv(path: &Path) -> Result<Vec<Measurement>> {
    read_csv(path, true)
}

/// Read a headerless per-run result file. Columns are assigned positionally
/// per the fixed schema; a non-numeric value in a numeric column is a hard
/// error that aborts the whole job.
pub fn load_new_file(path: &Path) -> Result<Vec<Measurement>> {
    read_csv(path, false)
}

fn read_csv(path: &Path, has_headers: bool) -> Result<Vec<Measurement>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(has_headers)
        .from_path(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;

    let mut rows = Vec::new();
    for result in reader.deserialize() {
        let row: Measurement =
            result.with_context(|| format!("Invalid row in {}", path.display()))?;
        rows.push(row);
    }

    Ok(rows)
}

/// Recursively collect all `*.csv` files under the results directory.
/// A missing directory yields no files. Paths come back sorted so the
/// concatenation order is deterministic across filesystems.
pub fn discover_new_files(dir: &Path) -> Vec<PathBuf> {
    if !dir.is_dir() {
        debug!("Results directory {} does not exist", dir.display());
        return Vec::new();
    }

    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| path.extension().and_then(|e| e.to_str()) == Some("csv"))
        .collect();

    files.sort();
    files
}

/// Union the master table with newly collected rows: exact duplicates are
/// dropped keeping the first occurrence, then the result is stable-sorted
/// by (Timestamp, Registry, SizeMB). Merging the same new rows twice
/// therefore yields the same table as merging them once.
pub fn merge(master: Vec<Measurement>, new_rows: Vec<Measurement>) -> Vec<Measurement> {
    let mut seen = HashSet::new();
    let mut rows: Vec<Measurement> = Vec::with_capacity(master.len() + new_rows.len());

    for row in master.into_iter().chain(new_rows) {
        if seen.insert(row.dedup_key()) {
            rows.push(row);
        }
    }

    rows.sort_by(|a, b| a.cmp_by_sort_key(b));
    rows
}

/// Rewrite the master table in full, header included, creating parent
/// directories as needed. An empty table still gets its header row.
pub fn write_master(path: &Path, rows: &[Measurement]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
    }

    // Header is written by hand so that an empty table still produces it.
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .with_context(|| format!("Failed to open {} for writing", path.display()))?;

    writer
        .write_record(COLUMNS)
        .context("Failed to write CSV header")?;

    for row in rows {
        writer
            .serialize(row)
            .with_context(|| format!("Failed to write row to {}", path.display()))?;
    }

    writer
        .flush()
        .with_context(|| format!("Failed to flush {}", path.display()))?;

    Ok(())
}
