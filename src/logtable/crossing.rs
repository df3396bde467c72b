//! First-threshold-crossing scan
//!
//! Header detection here differs from the table parser on purpose: any line
//! that merely contains the three column names as substrings is a header
//! candidate, and positions are then taken from its exact tokens. Once a
//! header is found it is never replaced.

use super::columns::Column;
use super::{for_each_line, RowSkip};
use anyhow::{Context, Result};
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::ops::ControlFlow;
use std::path::Path;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct CrossingHeader {
    step: usize,
    ncross1: usize,
    ncross2: usize,
}

impl CrossingHeader {
    fn detect(line: &str) -> Option<Self> {
        let names = [Column::Step, Column::NCross1, Column::NCross2];
        if !names.iter().all(|c| line.contains(c.name())) {
            return None;
        }

        let tokens: Vec<&str> = line.split_whitespace().collect();
        let find = |column: Column| tokens.iter().position(|t| *t == column.name());

        Some(Self {
            step: find(Column::Step)?,
            ncross1: find(Column::NCross1)?,
            ncross2: find(Column::NCross2)?,
        })
    }

    fn max_position(&self) -> usize {
        self.step.max(self.ncross1).max(self.ncross2)
    }

    /// (step, ncross1, ncross2) of one data line
    fn evaluate(&self, tokens: &[&str]) -> Result<(i64, f64, f64), RowSkip> {
        if tokens.len() <= self.max_position() {
            return Err(RowSkip::TooFewTokens {
                found: tokens.len(),
                needed: self.max_position() + 1,
            });
        }

        let step_token = tokens[self.step];
        if !is_signed_integer(step_token) {
            return Err(RowSkip::NonIntegerStep(step_token.to_string()));
        }

        let parse = |column: Column, token: &str| {
            token.parse::<f64>().map_err(|_| RowSkip::BadValue {
                column: column.name(),
                token: token.to_string(),
            })
        };

        let step = step_token.parse::<i64>().map_err(|_| RowSkip::BadValue {
            column: Column::Step.name(),
            token: step_token.to_string(),
        })?;
        let n1 = parse(Column::NCross1, tokens[self.ncross1])?;
        let n2 = parse(Column::NCross2, tokens[self.ncross2])?;

        Ok((step, n1, n2))
    }
}

/// `-?[0-9]+`
fn is_signed_integer(token: &str) -> bool {
    let digits = token.strip_prefix('-').unwrap_or(token);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

/// Step of the first row where both cross counts are strictly below
/// `threshold`, or `None` if the stream never gets there.
pub fn first_crossing_step<R: BufRead>(reader: R, threshold: f64) -> io::Result<Option<i64>> {
    let mut header: Option<CrossingHeader> = None;
    let mut found = None;
    let mut line_no = 0usize;

    for_each_line(reader, |line| {
        line_no += 1;

        let Some(h) = header else {
            header = CrossingHeader::detect(line);
            if header.is_some() {
                debug!(line = line_no, "crossing header");
            }
            return ControlFlow::Continue(());
        };

        let tokens: Vec<&str> = line.split_whitespace().collect();
        match h.evaluate(&tokens) {
            Ok((step, n1, n2)) if n1 < threshold && n2 < threshold => {
                found = Some(step);
                ControlFlow::Break(())
            }
            Ok(_) => ControlFlow::Continue(()),
            Err(reason) => {
                debug!(line = line_no, %reason, "skipping row");
                ControlFlow::Continue(())
            }
        }
    })?;

    Ok(found)
}

pub fn first_crossing_in_str(text: &str, threshold: f64) -> Option<i64> {
    // Reading from a byte slice cannot fail
    first_crossing_step(text.as_bytes(), threshold).unwrap_or(None)
}

pub fn first_crossing_in_file(path: &Path, threshold: f64) -> Result<Option<i64>> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open log {}", path.display()))?;
    first_crossing_step(BufReader::new(file), threshold)
        .with_context(|| format!("Failed to read log {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_both_counts_must_cross() {
        let text = "Step v_ncross1 v_ncross2\n10 80 80\n20 40 60\n30 30 30\n";
        assert_eq!(first_crossing_in_str(text, 50.0), Some(30));
    }

    #[test]
    fn test_end_to_end_example() {
        let text = "Step v_ncross1 v_ncross2\n10 900 900\n20 45 45\n";
        assert_eq!(first_crossing_in_str(text, 50.0), Some(20));
    }

    #[test]
    fn test_strictly_below() {
        let text = "Step v_ncross1 v_ncross2\n10 50 10\n20 49.5 49.9\n";
        assert_eq!(first_crossing_in_str(text, 50.0), Some(20));
    }

    #[test]
    fn test_never_crossing_is_none() {
        let text = "Step v_ncross1 v_ncross2\n10 80 80\n20 70 70\n";
        assert_eq!(first_crossing_in_str(text, 50.0), None);
        assert_eq!(first_crossing_in_str("", 50.0), None);
        assert_eq!(first_crossing_in_str("10 1 1\n", 50.0), None);
    }

    #[test]
    fn test_substring_header_with_decoration() {
        // The table parser rejects this header; the scanner accepts it
        let text = "[thermo] Step v_ncross1 v_ncross2\n[thermo] 0 100 100\n[thermo] 5 3 4\n";
        assert_eq!(first_crossing_in_str(text, 50.0), Some(5));
        assert!(crate::logtable::parse_log_str(text).table.is_empty());
    }

    #[test]
    fn test_substring_only_match_keeps_searching() {
        let text = "\
variable v_ncross1_avg equal Step*v_ncross2_avg
1 2 3
Step v_ncross1 v_ncross2
7 1 1
";
        assert_eq!(first_crossing_in_str(text, 50.0), Some(7));
    }

    #[test]
    fn test_malformed_rows_skipped() {
        let text = "\
Step v_ncross1 v_ncross2
10 1
64.7% 1 1
20 abc 1
-5 1 1
";
        assert_eq!(first_crossing_in_str(text, 50.0), Some(-5));
    }

    #[test]
    fn test_blank_line_does_not_end_scan() {
        let text = "Step v_ncross1 v_ncross2\n10 80 80\n\nLoop time of 1.0\n30 1 1\n";
        assert_eq!(first_crossing_in_str(text, 50.0), Some(30));
    }

    #[test]
    fn test_float_counts_accepted() {
        let text = "Step v_ncross1 v_ncross2\n10 1.5e1 2e0\n";
        assert_eq!(first_crossing_in_str(text, 50.0), Some(10));
    }

    #[test]
    fn test_signed_integer() {
        assert!(is_signed_integer("12"));
        assert!(is_signed_integer("-12"));
        assert!(!is_signed_integer("-"));
        assert!(!is_signed_integer("+12"));
        assert!(!is_signed_integer("1.0"));
    }
}
