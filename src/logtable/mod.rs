//! Thermo log parsing
//!
//! NUFEB/LAMMPS logs interleave thermo tables with unrelated status output.
//! Two readers live here: the full table parser, which materializes every
//! valid row, and the first-crossing scanner, which stops at the first row
//! where both cross-feeder populations drop below a threshold.

pub mod columns;
pub mod table;
pub mod crossing;

pub use columns::{Column, Value, ValueKind};
pub use crossing::{first_crossing_in_file, first_crossing_in_str, first_crossing_step};
pub use table::{
    parse_log_file, parse_log_str, parse_log_table, HeaderIndex, LogRow, LogTable, ParseReport,
    SkippedRow, TableParser,
};

use std::io::{self, BufRead};
use std::ops::ControlFlow;
use thiserror::Error;

/// Why a line inside a table was not turned into a row
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RowSkip {
    #[error("too few tokens: {found} (need {needed})")]
    TooFewTokens { found: usize, needed: usize },

    #[error("step token is not an integer: {0:?}")]
    NonIntegerStep(String),

    #[error("bad value for {column}: {token:?}")]
    BadValue { column: &'static str, token: String },
}

/// Feed every line of `reader` to `f` until it breaks or input ends.
///
/// Bytes that are not valid UTF-8 are replaced rather than failing the read;
/// affected tokens then fail numeric conversion and the row is skipped.
pub(crate) fn for_each_line<R, F>(mut reader: R, mut f: F) -> io::Result<()>
where
    R: BufRead,
    F: FnMut(&str) -> ControlFlow<()>,
{
    let mut buf = Vec::new();
    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            return Ok(());
        }
        let line = String::from_utf8_lossy(&buf);
        if f(&line).is_break() {
            return Ok(());
        }
    }
}
