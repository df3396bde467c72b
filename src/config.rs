//! Tool configuration
//!
//! Every command reads its parameters from one of these sections. Defaults
//! match the values the lab's run directories were set up with; a JSON file
//! passed via `--config` can override any of them.

use crate::seeds::SeedLabel;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed config {path}: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// All configuration sections
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolConfig {
    pub table: TableConfig,
    pub lifetime: LifetimeConfig,
    pub seeds: SeedConfig,
    pub atoms: AtomDeckConfig,
    pub collapse: CollapseConfig,
}

impl ToolConfig {
    /// Load configuration from a JSON file. Missing sections and fields keep
    /// their defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        serde_json::from_str(&contents).map_err(|source| ConfigError::Malformed {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Full log-table extraction
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TableConfig {
    /// Thermo log to parse
    pub input: PathBuf,

    /// CSV destination for the extracted table
    pub output: PathBuf,

    /// Cross-count threshold used for the lifetime line in the summary
    pub threshold: f64,

    /// Inclusive lower Step bound (None = unbounded)
    pub step_min: Option<i64>,

    /// Inclusive upper Step bound (None = unbounded)
    pub step_max: Option<i64>,

    /// Whether to write the CSV at all
    pub write_csv: bool,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::from("log.lammps"),
            output: PathBuf::from("cross.csv"),
            threshold: 50.0,
            step_min: None,
            step_max: None,
            write_csv: false,
        }
    }
}

/// Batch first-crossing scan over a directory of logs
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LifetimeConfig {
    pub data_dir: PathBuf,
    pub out_csv: PathBuf,

    /// Both cross counts must be strictly below this value
    pub threshold: f64,
}

impl Default for LifetimeConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data/exp_data"),
            out_csv: PathBuf::from("data/lifetimes.csv"),
            threshold: 50.0,
        }
    }
}

/// Seeded input-script generation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SeedConfig {
    /// Template input script
    pub template: PathBuf,

    /// Output file name prefix; files land next to the template
    pub output_prefix: String,

    /// Output file extension (without the dot)
    pub extension: String,

    /// First index of the generated range
    pub index_start: u32,

    /// Number of files to generate
    pub count: u32,

    /// Seed parameters per fix label
    pub labels: Vec<SeedLabel>,
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self::eps()
    }
}

impl SeedConfig {
    /// EPS-secreting runs: three division fixes and two secretion fixes
    pub fn eps() -> Self {
        Self {
            template: PathBuf::from("inputscript_EPS.nufeb"),
            output_prefix: "inputscript_EPS".to_string(),
            extension: "nufeb".to_string(),
            index_start: 1,
            count: 50,
            labels: SeedLabel::eps_table(),
        }
    }

    /// Non-EPS runs: division fixes only
    pub fn neps() -> Self {
        Self {
            template: PathBuf::from("inputscript_NEPS.nufeb"),
            output_prefix: "inputscript_NEPS".to_string(),
            labels: SeedLabel::division_table(),
            ..Self::eps()
        }
    }

    /// Output path for a given index, alongside the template
    pub fn output_path(&self, index: u32) -> PathBuf {
        let name = format!("{}{}.{}", self.output_prefix, index, self.extension);
        match self.template.parent() {
            Some(dir) => dir.join(name),
            None => PathBuf::from(name),
        }
    }
}

/// One particle species in a generated atom deck
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AtomSpecies {
    pub count: u32,

    /// Radius bounds in metres
    pub rmin: f64,
    pub rmax: f64,

    /// Density in kg/m^3
    pub density: f64,
}

/// Random initial atom deck
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AtomDeckConfig {
    /// Box extent (x, y, z) in metres; the box starts at the origin
    pub box_size: [f64; 3],
    pub species: Vec<AtomSpecies>,
    pub outfile: PathBuf,

    /// Fixed RNG seed for reproducible decks
    pub seed: Option<u64>,
}

impl Default for AtomDeckConfig {
    fn default() -> Self {
        let species = AtomSpecies {
            count: 500,
            rmin: 1e-6,
            rmax: 2e-6,
            density: 500.0,
        };

        Self {
            box_size: [3e-4, 3e-4, 3e-4],
            species: vec![species.clone(), species],
            outfile: PathBuf::from("atom.in"),
            seed: None,
        }
    }
}

/// Collapse-time summary over a parsed table
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CollapseConfig {
    pub time_column: String,
    pub biomass_column: String,
    pub threshold: f64,
}

impl Default for CollapseConfig {
    fn default() -> Self {
        Self {
            time_column: "Step".to_string(),
            biomass_column: "v_mass".to_string(),
            threshold: 1e-3,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_neps_preset_has_only_division_labels() {
        let config = SeedConfig::neps();
        assert_eq!(config.labels.len(), 3);
        assert!(config.labels.iter().all(|l| l.name.starts_with("div")));
        assert_eq!(config.output_prefix, "inputscript_NEPS");
    }

    #[test]
    fn test_output_path_next_to_template() {
        let config = SeedConfig {
            template: PathBuf::from("runs/inputscript_EPS.nufeb"),
            ..SeedConfig::eps()
        };
        assert_eq!(
            config.output_path(7),
            PathBuf::from("runs/inputscript_EPS7.nufeb")
        );
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{ "lifetime": { "threshold": 25.0 } }"#).unwrap();

        let config = ToolConfig::load(&path).unwrap();
        assert_eq!(config.lifetime.threshold, 25.0);
        assert_eq!(config.lifetime.out_csv, PathBuf::from("data/lifetimes.csv"));
        assert_eq!(config.seeds.labels.len(), 5);
    }

    #[test]
    fn test_malformed_json_is_reported() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();

        let err = ToolConfig::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Malformed { .. }));
    }
}
