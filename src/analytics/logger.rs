//! Writing analysis results to disk

use super::lifetime::LifetimeRecord;
use super::metrics::AggregateRecord;
use crate::logtable::LogTable;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

/// Overview of one parsed log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableSummary {
    pub input: PathBuf,
    pub columns: Vec<String>,
    pub rows: usize,
    pub skipped_rows: usize,
    pub tables_seen: usize,
    pub first_step: Option<i64>,
    pub last_step: Option<i64>,
    pub threshold: f64,
    pub lifetime_step: Option<i64>,
    pub generated_at: DateTime<Utc>,
}

/// Handles summary files under an output directory
pub struct ResultsLogger {
    output_dir: PathBuf,
}

impl ResultsLogger {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn ensure_dir(&self) -> Result<()> {
        fs::create_dir_all(&self.output_dir).context("Failed to create output directory")
    }

    /// Save a summary as `summary_<timestamp>.json`
    pub fn save_summary(&self, summary: &TableSummary) -> Result<PathBuf> {
        self.ensure_dir()?;

        let timestamp = summary.generated_at.format("%Y%m%d_%H%M%S");
        let path = self.output_dir.join(format!("summary_{}.json", timestamp));
        write_json(summary, &path)?;
        Ok(path)
    }

    pub fn load_summary(path: &Path) -> Result<TableSummary> {
        let contents = fs::read_to_string(path).context("Failed to read summary file")?;
        serde_json::from_str(&contents).context("Failed to parse summary file")
    }
}

fn create(path: &Path) -> Result<File> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
    }
    File::create(path).with_context(|| format!("Failed to create {}", path.display()))
}

pub fn write_json<T: Serialize>(value: &T, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize results")?;
    let mut file = create(path)?;
    file.write_all(json.as_bytes())
        .with_context(|| format!("Failed to write {}", path.display()))?;

    info!("Saved: {}", path.display());
    Ok(())
}

pub fn write_table_csv(table: &LogTable, path: &Path) -> Result<()> {
    table
        .write_csv(create(path)?)
        .with_context(|| format!("Failed to write {}", path.display()))?;

    info!("Wrote CSV: {} (rows={})", path.display(), table.len());
    Ok(())
}

/// `filename,label,lifetime_step`; a run that never crossed gets an empty step
pub fn write_lifetimes_csv(records: &[LifetimeRecord], path: &Path) -> Result<()> {
    let mut csv = csv::Writer::from_writer(create(path)?);
    csv.write_record(["filename", "label", "lifetime_step"])?;

    for record in records {
        csv.write_record([
            record.filename.clone(),
            record.label.code().to_string(),
            record.lifetime_step.map(|s| s.to_string()).unwrap_or_default(),
        ])?;
    }
    csv.flush()?;

    info!("Wrote {} rows to {}", records.len(), path.display());
    Ok(())
}

pub fn write_aggregate_csv(records: &[AggregateRecord], path: &Path) -> Result<()> {
    let mut csv = csv::Writer::from_writer(create(path)?);
    csv.write_record(["sample_id", "filename", "rows", "collapse_time", "max_biomass"])?;

    let opt = |v: Option<f64>| v.map(|x| x.to_string()).unwrap_or_default();
    for record in records {
        csv.write_record([
            record.sample_id.to_string(),
            record.filename.clone(),
            record.rows.to_string(),
            opt(record.collapse_time),
            opt(record.max_biomass),
        ])?;
    }
    csv.flush()?;

    info!("Wrote {} rows to {}", records.len(), path.display());
    Ok(())
}

/// Format a table summary for the terminal
pub fn format_summary(summary: &TableSummary) -> String {
    let opt = |v: Option<i64>| v.map(|s| s.to_string()).unwrap_or_else(|| "-".to_string());

    format!(
        r#"
╔══════════════════════════════════════════════════════════════════╗
║            THERMO LOG SUMMARY                                    ║
╠══════════════════════════════════════════════════════════════════╣
  Input:              {}
  Columns:            {}
  Tables found:       {:>10}
  Rows parsed:        {:>10}
  Rows skipped:       {:>10}
  Step range:         {:>10} .. {}
  Lifetime (< {}):    {:>10}
╚══════════════════════════════════════════════════════════════════╝
Generated: {}
"#,
        summary.input.display(),
        summary.columns.join(", "),
        summary.tables_seen,
        summary.rows,
        summary.skipped_rows,
        opt(summary.first_step),
        opt(summary.last_step),
        summary.threshold,
        opt(summary.lifetime_step),
        summary.generated_at.format("%Y-%m-%d %H:%M:%S UTC"),
    )
}

pub fn print_summary(summary: &TableSummary) {
    println!("{}", format_summary(summary));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::RunLabel;
    use crate::logtable::parse_log_str;
    use tempfile::TempDir;

    fn summary() -> TableSummary {
        TableSummary {
            input: PathBuf::from("neps41.log"),
            columns: vec!["Step".into(), "v_ncross1".into(), "v_ncross2".into()],
            rows: 2,
            skipped_rows: 1,
            tables_seen: 1,
            first_step: Some(10),
            last_step: Some(20),
            threshold: 50.0,
            lifetime_step: Some(20),
            generated_at: Utc::now(),
        }
    }

    #[test]
    fn test_lifetimes_csv_layout() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out").join("lifetimes.csv");
        let records = vec![
            LifetimeRecord {
                filename: "eps1.log".into(),
                label: RunLabel::Eps,
                lifetime_step: Some(20),
            },
            LifetimeRecord {
                filename: "neps1.log".into(),
                label: RunLabel::Neps,
                lifetime_step: None,
            },
        ];
        write_lifetimes_csv(&records, &path).unwrap();

        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "filename,label,lifetime_step\neps1.log,1,20\nneps1.log,2,\n"
        );
    }

    #[test]
    fn test_empty_lifetimes_still_has_header() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("lifetimes.csv");
        write_lifetimes_csv(&[], &path).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "filename,label,lifetime_step\n");
    }

    #[test]
    fn test_table_csv() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cross.csv");
        let table = parse_log_str("Step v_ncross1 v_ncross2\n10 900 900\n20 45 45\n").table;
        write_table_csv(&table, &path).unwrap();
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "Step,v_ncross1,v_ncross2\n10,900,900\n20,45,45\n"
        );
    }

    #[test]
    fn test_summary_round_trip() {
        let dir = TempDir::new().unwrap();
        let logger = ResultsLogger::new(dir.path().join("summaries"));
        let original = summary();

        let path = logger.save_summary(&original).unwrap();
        let loaded = ResultsLogger::load_summary(&path).unwrap();
        assert_eq!(loaded, original);
    }

    #[test]
    fn test_format_summary_mentions_counts() {
        let text = format_summary(&summary());
        assert!(text.contains("neps41.log"));
        assert!(text.contains("Step, v_ncross1, v_ncross2"));
    }
}
