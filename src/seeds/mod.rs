//! Seeded input-script generation
//!
//! Replicate runs differ only in the random seeds of their division and EPS
//! secretion fixes. Seeds are a fixed polynomial of the replicate index so
//! any run can be regenerated from its index alone.

pub mod template;
pub mod generator;

pub use generator::generate_inputs;
pub use template::{read_seeds, substitute_seeds, FixRole, SeedLabel, Substitution};

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SeedError {
    #[error("template file not found: {path}")]
    TemplateNotFound { path: PathBuf },

    #[error("invalid index range: start {start}, count {count} (indices start at 1 and end within u32)")]
    InvalidRange { start: u32, count: u32 },
}
