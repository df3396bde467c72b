//! Collapse metrics for single replicates and whole sweeps

use super::lifetime::log_files;
use crate::config::CollapseConfig;
use crate::logtable::{parse_log_file, Column, LogTable};
use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

/// First time at which biomass drops below `threshold`.
///
/// Returns the last time point if the threshold is never crossed, and
/// `None` for empty or mismatched series.
pub fn estimate_collapse_time(time: &[f64], biomass: &[f64], threshold: f64) -> Option<f64> {
    if time.is_empty() || time.len() != biomass.len() {
        return None;
    }

    let index = biomass
        .iter()
        .position(|b| *b < threshold)
        .unwrap_or(time.len() - 1);
    Some(time[index])
}

/// Scalar outcome of one replicate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplicateSummary {
    pub collapse_time: f64,
    pub max_biomass: f64,
}

fn resolve(name: &str) -> Result<Column> {
    match Column::from_name(name) {
        Some(column) => Ok(column),
        None => bail!("Unknown column: {}", name),
    }
}

/// Collapse time and peak biomass over two table columns.
///
/// `Ok(None)` when the table carries no rows with both columns.
pub fn summarise_replicate(table: &LogTable, config: &CollapseConfig) -> Result<Option<ReplicateSummary>> {
    let time_col = resolve(&config.time_column)?;
    let biomass_col = resolve(&config.biomass_column)?;
    if !table.has_column(time_col) || !table.has_column(biomass_col) {
        debug!(time = %time_col, biomass = %biomass_col, "columns absent from table");
        return Ok(None);
    }

    let (time, biomass): (Vec<f64>, Vec<f64>) = table.pairs(time_col, biomass_col).into_iter().unzip();

    let Some(collapse_time) = estimate_collapse_time(&time, &biomass, config.threshold) else {
        return Ok(None);
    };
    let max_biomass = biomass.iter().cloned().fold(f64::NEG_INFINITY, f64::max);

    Ok(Some(ReplicateSummary {
        collapse_time,
        max_biomass,
    }))
}

/// One row of a sweep summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateRecord {
    pub sample_id: usize,
    pub filename: String,
    pub rows: usize,
    pub collapse_time: Option<f64>,
    pub max_biomass: Option<f64>,
}

/// Summarise every `*.log` in `dir`, in name order
pub fn aggregate_directory(dir: &Path, config: &CollapseConfig) -> Result<Vec<AggregateRecord>> {
    let mut records = Vec::new();

    for (sample_id, path) in log_files(dir)?.iter().enumerate() {
        let report = parse_log_file(path)?;
        let summary = summarise_replicate(&report.table, config)?;
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        debug!(
            file = %filename,
            rows = report.table.len(),
            skipped = report.skipped.len(),
            "replicate"
        );

        records.push(AggregateRecord {
            sample_id,
            filename,
            rows: report.table.len(),
            collapse_time: summary.as_ref().map(|s| s.collapse_time),
            max_biomass: summary.as_ref().map(|s| s.max_biomass),
        });
    }

    info!("Aggregated {} replicates from {}", records.len(), dir.display());
    Ok(records)
}
