//! Atom deck writer and reader

use super::DeckError;
use crate::config::{AtomDeckConfig, AtomSpecies};
use anyhow::{Context, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use tracing::info;

/// One particle from the `Atoms` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AtomRecord {
    pub atom_type: u32,
    pub radius: f64,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// Per-type statistics of a deck
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeSummary {
    pub atom_type: u32,
    pub count: usize,
    pub mean_radius: f64,
    pub min_z: f64,
    pub max_z: f64,
}

/// `1.50e-06` style: two decimals, signed two-digit exponent
pub fn sci(value: f64) -> String {
    let formatted = format!("{:.2e}", value);
    match formatted.split_once('e') {
        Some((mantissa, exp)) => {
            let exp: i32 = exp.parse().unwrap_or(0);
            let sign = if exp < 0 { '-' } else { '+' };
            format!("{}e{}{:02}", mantissa, sign, exp.abs())
        }
        None => formatted,
    }
}

fn validate(config: &AtomDeckConfig) -> Result<(), DeckError> {
    let [bx, by, _] = config.box_size;
    for (index, species) in config.species.iter().enumerate() {
        let invalid = |reason: &str| DeckError::InvalidSpecies {
            index,
            reason: reason.to_string(),
        };

        if !(species.rmin > 0.0) {
            return Err(invalid("rmin must be positive"));
        }
        if species.rmin > species.rmax {
            return Err(invalid("rmin exceeds rmax"));
        }
        if 2.0 * species.rmax > bx.min(by) {
            return Err(invalid("particles do not fit in the box"));
        }
    }
    Ok(())
}

fn write_species<R: Rng>(
    out: &mut String,
    rng: &mut R,
    next_id: &mut u64,
    atom_type: usize,
    species: &AtomSpecies,
    box_size: [f64; 3],
) {
    for _ in 0..species.count {
        let r = rng.gen_range(species.rmin..=species.rmax);
        let x = rng.gen_range(r..=box_size[0] - r);
        let y = rng.gen_range(r..=box_size[1] - r);
        // Particles start resting on the substratum
        let z = r;

        out.push_str(&format!(
            "{} {} {} {:.0} {} {} {} {}\n",
            next_id,
            atom_type,
            sci(r),
            species.density,
            sci(x),
            sci(y),
            sci(z),
            sci(r)
        ));
        *next_id += 1;
    }
}

/// Render a LAMMPS data file for the configured species
pub fn generate_deck<R: Rng>(config: &AtomDeckConfig, rng: &mut R) -> Result<String, DeckError> {
    validate(config)?;

    let total: u64 = config.species.iter().map(|s| s.count as u64).sum();
    let [bx, by, bz] = config.box_size;

    let mut out = format!(
        r#"NUFEB Simulation

     {} atoms
     {} atom types

  0.0e+00   {}  xlo xhi
  0.0e+00   {}  ylo yhi
  0.0e+00   {}  zlo zhi

Atoms

"#,
        total,
        config.species.len(),
        sci(bx),
        sci(by),
        sci(bz)
    );

    let mut next_id = 1u64;
    for (i, species) in config.species.iter().enumerate() {
        write_species(&mut out, rng, &mut next_id, i + 1, species, config.box_size);
    }

    Ok(out)
}

/// Generate the deck and write it to the configured file
pub fn write_deck(config: &AtomDeckConfig) -> Result<PathBuf> {
    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let deck = generate_deck(config, &mut rng)?;

    if let Some(parent) = config.outfile.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).context("Failed to create deck directory")?;
        }
    }
    fs::write(&config.outfile, deck)
        .with_context(|| format!("Failed to write {}", config.outfile.display()))?;

    info!("Atom deck written to: {}", config.outfile.display());
    Ok(config.outfile.clone())
}

/// Parse the `Atoms` section of a data file
pub fn read_deck(text: &str) -> Result<Vec<AtomRecord>, DeckError> {
    let lines: Vec<&str> = text.lines().collect();
    let header = lines
        .iter()
        .position(|l| l.trim().starts_with("Atoms"))
        .ok_or(DeckError::MissingAtoms)?;

    let mut records = Vec::new();
    for (offset, line) in lines.iter().enumerate().skip(header + 2) {
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() < 7 {
            continue;
        }

        let bad = || DeckError::BadAtomLine {
            line: offset + 1,
            content: line.to_string(),
        };
        let float = |i: usize| parts[i].parse::<f64>().map_err(|_| bad());

        records.push(AtomRecord {
            atom_type: parts[1].parse().map_err(|_| bad())?,
            radius: float(2)?,
            x: float(4)?,
            y: float(5)?,
            z: float(6)?,
        });
    }

    Ok(records)
}

/// Count, mean radius and height range per atom type
pub fn summarise_deck(records: &[AtomRecord]) -> Vec<TypeSummary> {
    let mut by_type: BTreeMap<u32, Vec<&AtomRecord>> = BTreeMap::new();
    for record in records {
        by_type.entry(record.atom_type).or_default().push(record);
    }

    by_type
        .into_iter()
        .map(|(atom_type, atoms)| {
            let count = atoms.len();
            let mean_radius = atoms.iter().map(|a| a.radius).sum::<f64>() / count as f64;
            let min_z = atoms.iter().map(|a| a.z).fold(f64::INFINITY, f64::min);
            let max_z = atoms.iter().map(|a| a.z).fold(f64::NEG_INFINITY, f64::max);
            TypeSummary {
                atom_type,
                count,
                mean_radius,
                min_z,
                max_z,
            }
        })
        .collect()
}
