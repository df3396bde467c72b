//! Initial atom decks
//!
//! NUFEB reads its starting particles from a LAMMPS data file. Decks are
//! generated with uniformly random radii and positions on the substratum,
//! and can be read back for a quick per-type summary.

pub mod atoms;

pub use atoms::{generate_deck, read_deck, sci, summarise_deck, write_deck, AtomRecord, TypeSummary};

use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum DeckError {
    #[error("cannot find 'Atoms' section")]
    MissingAtoms,

    #[error("bad atom line {line}: {content:?}")]
    BadAtomLine { line: usize, content: String },

    #[error("species {index}: {reason}")]
    InvalidSpecies { index: usize, reason: String },
}
