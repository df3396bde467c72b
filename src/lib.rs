//! Biofilm Cross-Feeding Tools
//!
//! Utilities around NUFEB biofilm simulations: seeded input-deck generation,
//! thermo log parsing, lifetime and collapse metrics, and small mean-field
//! models used to sanity-check simulation outcomes.

pub mod logtable;
pub mod seeds;
pub mod deck;
pub mod analytics;
pub mod theory;
pub mod config;

pub use config::ToolConfig;
pub use logtable::{parse_log_table, first_crossing_step, LogTable};
pub use seeds::{generate_inputs, substitute_seeds};
