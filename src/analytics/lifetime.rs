//! Lifetime collection across a directory of runs
//!
//! A run's lifetime is the first Step at which both cross-feeder
//! populations fall below the threshold.

use crate::config::LifetimeConfig;
use crate::logtable::first_crossing_in_file;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Experiment arm encoded in the log file name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunLabel {
    /// EPS-secreting cross-feeders
    Eps,
    /// Non-EPS cross-feeders
    Neps,
}

impl RunLabel {
    pub fn code(self) -> u8 {
        match self {
            RunLabel::Eps => 1,
            RunLabel::Neps => 2,
        }
    }
}

/// `neps` anywhere in the name wins over `eps`; case-insensitive
pub fn label_from_name(name: &str) -> Option<RunLabel> {
    let lower = name.to_lowercase();
    if lower.contains("neps") {
        Some(RunLabel::Neps)
    } else if lower.contains("eps") {
        Some(RunLabel::Eps)
    } else {
        None
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LifetimeRecord {
    pub filename: String,
    pub label: RunLabel,
    pub lifetime_step: Option<i64>,
}

/// `*.log` files of a directory, sorted by path
pub(crate) fn log_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir).with_context(|| format!("Failed to list {}", dir.display()))? {
        let path = entry?.path();
        if path.is_file() && path.extension().map_or(false, |e| e == "log") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Scan every labeled log under `config.data_dir`
pub fn collect_lifetimes(config: &LifetimeConfig) -> Result<Vec<LifetimeRecord>> {
    fs::create_dir_all(&config.data_dir)
        .with_context(|| format!("Failed to create {}", config.data_dir.display()))?;

    let files = log_files(&config.data_dir)?;
    let mut records = Vec::new();

    for path in &files {
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        let Some(label) = label_from_name(&filename) else {
            debug!("Unlabeled log skipped: {}", filename);
            continue;
        };

        let lifetime_step = first_crossing_in_file(path, config.threshold)?;
        debug!(file = %filename, ?lifetime_step, "lifetime");

        records.push(LifetimeRecord {
            filename,
            label,
            lifetime_step,
        });
    }

    info!(
        "Scanned {} .log files; {} labeled runs",
        files.len(),
        records.len()
    );
    Ok(records)
}
