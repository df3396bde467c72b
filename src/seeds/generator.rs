//! Writes one seeded input script per replicate index

use super::template::substitute_seeds;
use super::SeedError;
use crate::config::SeedConfig;
use anyhow::{Context, Result};
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// Generate `<prefix><i>.<ext>` for every index in the configured range.
///
/// A missing template aborts the whole run before anything is written.
pub fn generate_inputs(config: &SeedConfig) -> Result<Vec<PathBuf>> {
    let invalid = || SeedError::InvalidRange {
        start: config.index_start,
        count: config.count,
    };
    if config.count == 0 || config.index_start == 0 {
        return Err(invalid().into());
    }
    // Exclusive end must fit in u32
    let end = config.index_start.checked_add(config.count).ok_or_else(invalid)?;

    let text = match fs::read_to_string(&config.template) {
        Ok(text) => text,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(SeedError::TemplateNotFound {
                path: config.template.clone(),
            }
            .into());
        }
        Err(e) => {
            return Err(e).with_context(|| {
                format!("Failed to read template {}", config.template.display())
            });
        }
    };

    // Which lines carry a seed does not depend on the index
    if substitute_seeds(&text, config.index_start, &config.labels)
        .replaced
        .is_empty()
    {
        warn!("No seeded fix lines found in {}", config.template.display());
    }

    let mut written = Vec::new();

    for index in config.index_start..end {
        let result = substitute_seeds(&text, index, &config.labels);
        for (label, seed) in &result.replaced {
            debug!(index, label = %label, seed = %seed, "seed");
        }

        let path = config.output_path(index);
        fs::write(&path, result.text)
            .with_context(|| format!("Failed to write {}", path.display()))?;

        info!("Generated: {}", path.display());
        written.push(path);
    }

    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seeds::{read_seeds, SeedLabel};
    use tempfile::TempDir;

    const TEMPLATE: &str = "\
fix div1 CROSS1 nufeb/division/coccus 1.36e-6 1
fix div2 CROSS2 nufeb/division/coccus 1.36e-6 1
fix eps1 CROSS1 nufeb/eps_secretion eps sub 1 1 # secretion
";

    fn config_in(dir: &TempDir) -> SeedConfig {
        SeedConfig {
            template: dir.path().join("inputscript_EPS.nufeb"),
            index_start: 1,
            count: 3,
            ..SeedConfig::eps()
        }
    }

    #[test]
    fn test_generates_range() {
        let dir = TempDir::new().unwrap();
        let config = config_in(&dir);
        fs::write(&config.template, TEMPLATE).unwrap();

        let paths = generate_inputs(&config).unwrap();
        let names: Vec<String> = paths
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(
            names,
            vec![
                "inputscript_EPS1.nufeb",
                "inputscript_EPS2.nufeb",
                "inputscript_EPS3.nufeb"
            ]
        );

        let third = fs::read_to_string(&paths[2]).unwrap();
        let seeds = read_seeds(&third, &SeedLabel::eps_table());
        assert_eq!(
            seeds,
            vec![
                ("div1".to_string(), 9 + 2 + 101),
                ("div2".to_string(), 36 + 4 + 102),
                ("eps1".to_string(), 144 + 8 + 104),
            ]
        );
        assert!(third.ends_with("# secretion\n"));

        // Template is untouched
        assert_eq!(fs::read_to_string(&config.template).unwrap(), TEMPLATE);
    }

    #[test]
    fn test_rerun_is_byte_identical() {
        let dir = TempDir::new().unwrap();
        let config = config_in(&dir);
        fs::write(&config.template, TEMPLATE).unwrap();

        let first = generate_inputs(&config).unwrap();
        let before: Vec<String> = first.iter().map(|p| fs::read_to_string(p).unwrap()).collect();
        let second = generate_inputs(&config).unwrap();
        let after: Vec<String> = second.iter().map(|p| fs::read_to_string(p).unwrap()).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn test_missing_template_is_fatal() {
        let dir = TempDir::new().unwrap();
        let config = config_in(&dir);

        let err = generate_inputs(&config).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<SeedError>(),
            Some(SeedError::TemplateNotFound { .. })
        ));
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_empty_range_rejected() {
        let dir = TempDir::new().unwrap();
        let config = SeedConfig {
            count: 0,
            ..config_in(&dir)
        };
        let err = generate_inputs(&config).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<SeedError>(),
            Some(SeedError::InvalidRange { .. })
        ));
    }

    #[test]
    fn test_unseeded_template_copied_verbatim() {
        let dir = TempDir::new().unwrap();
        let config = config_in(&dir);
        fs::write(&config.template, "atom_style coccus\nrun 1000\n").unwrap();

        let paths = generate_inputs(&config).unwrap();
        assert_eq!(paths.len(), 3);
        for path in &paths {
            assert_eq!(fs::read_to_string(path).unwrap(), "atom_style coccus\nrun 1000\n");
        }
    }

    #[test]
    fn test_overflowing_range_rejected() {
        let dir = TempDir::new().unwrap();
        let config = SeedConfig {
            index_start: u32::MAX,
            count: 3,
            ..config_in(&dir)
        };
        fs::write(&config.template, TEMPLATE).unwrap();

        let err = generate_inputs(&config).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<SeedError>(),
            Some(SeedError::InvalidRange { start: u32::MAX, count: 3 })
        ));
        // Only the template is present
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_range_ending_at_u32_max() {
        let dir = TempDir::new().unwrap();
        let config = SeedConfig {
            index_start: u32::MAX - 2,
            count: 2,
            ..config_in(&dir)
        };
        fs::write(&config.template, TEMPLATE).unwrap();

        let paths = generate_inputs(&config).unwrap();
        assert_eq!(paths.len(), 2);
    }
}
