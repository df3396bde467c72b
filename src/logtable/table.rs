//! Full thermo table extraction
//!
//! A table starts at a header line beginning with `Step` that names every
//! required column, and ends at the first blank line. Rows that do not type
//! check are skipped and recorded; scanning always runs to end of input.

use super::columns::{Column, Value};
use super::{for_each_line, RowSkip};
use anyhow::{Context, Result};
use serde::Serialize;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::ops::ControlFlow;
use std::path::Path;
use tracing::debug;

/// Column positions of the active table header
#[derive(Debug, Clone, PartialEq)]
pub struct HeaderIndex {
    /// (column, token position) in preferred column order
    positions: Vec<(Column, usize)>,
    max_position: usize,
}

impl HeaderIndex {
    /// Recognize a header line. Requires the trimmed line to start with
    /// `Step` and every required column to appear as an exact token.
    pub fn from_header(line: &str) -> Option<Self> {
        let trimmed = line.trim();
        if !trimmed.starts_with(Column::Step.name()) {
            return None;
        }

        let tokens: Vec<&str> = trimmed.split_whitespace().collect();
        let find = |column: Column| tokens.iter().position(|t| *t == column.name());

        if !Column::REQUIRED.iter().all(|c| find(*c).is_some()) {
            return None;
        }

        let positions: Vec<(Column, usize)> = Column::PREFERRED
            .into_iter()
            .filter_map(|c| find(c).map(|pos| (c, pos)))
            .collect();
        let max_position = positions.iter().map(|(_, pos)| *pos).max().unwrap_or(0);

        Some(Self {
            positions,
            max_position,
        })
    }

    pub fn position(&self, column: Column) -> Option<usize> {
        self.positions
            .iter()
            .find(|(c, _)| *c == column)
            .map(|(_, pos)| *pos)
    }

    pub fn columns(&self) -> impl Iterator<Item = Column> + '_ {
        self.positions.iter().map(|(c, _)| *c)
    }

    pub fn max_position(&self) -> usize {
        self.max_position
    }

    /// Type one data line against this header
    pub fn extract(&self, tokens: &[&str]) -> Result<LogRow, RowSkip> {
        if tokens.len() <= self.max_position {
            return Err(RowSkip::TooFewTokens {
                found: tokens.len(),
                needed: self.max_position + 1,
            });
        }

        // Summary lines such as "64.7%" land in the Step slot
        let step_pos = self.position(Column::Step).unwrap_or(0);
        let step_token = tokens[step_pos];
        if !step_token.bytes().all(|b| b.is_ascii_digit()) {
            return Err(RowSkip::NonIntegerStep(step_token.to_string()));
        }

        let mut values = Vec::with_capacity(self.positions.len());
        for &(column, pos) in &self.positions {
            let token = tokens[pos];
            let value = column.kind().parse(token).ok_or_else(|| RowSkip::BadValue {
                column: column.name(),
                token: token.to_string(),
            })?;
            values.push((column, value));
        }

        Ok(LogRow { values })
    }
}

/// One typed thermo row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogRow {
    values: Vec<(Column, Value)>,
}

impl LogRow {
    pub fn get(&self, column: Column) -> Option<Value> {
        self.values
            .iter()
            .find(|(c, _)| *c == column)
            .map(|(_, v)| *v)
    }

    /// Step is present in every row
    pub fn step(&self) -> i64 {
        self.get(Column::Step).and_then(Value::as_i64).unwrap_or_default()
    }
}

/// Parsed thermo data; immutable once built
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogTable {
    columns: Vec<Column>,
    rows: Vec<LogRow>,
}

impl LogTable {
    fn from_rows(rows: Vec<LogRow>) -> Self {
        if rows.is_empty() {
            return Self {
                columns: Column::REQUIRED.to_vec(),
                rows,
            };
        }

        let columns = Column::PREFERRED
            .into_iter()
            .filter(|c| rows.iter().any(|r| r.get(*c).is_some()))
            .collect();

        Self { columns, rows }
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn rows(&self) -> &[LogRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_column(&self, column: Column) -> bool {
        self.columns.contains(&column)
    }

    /// Keep rows whose Step lies within the inclusive bounds
    pub fn filter_steps(&self, min: Option<i64>, max: Option<i64>) -> LogTable {
        let rows = self
            .rows
            .iter()
            .filter(|r| min.map_or(true, |m| r.step() >= m))
            .filter(|r| max.map_or(true, |m| r.step() <= m))
            .cloned()
            .collect();

        LogTable {
            columns: self.columns.clone(),
            rows,
        }
    }

    /// (x, y) pairs from rows carrying both columns
    pub fn pairs(&self, x: Column, y: Column) -> Vec<(f64, f64)> {
        self.rows
            .iter()
            .filter_map(|r| Some((r.get(x)?.as_f64(), r.get(y)?.as_f64())))
            .collect()
    }

    /// Write the table as CSV; absent cells are left empty
    pub fn write_csv<W: Write>(&self, writer: W) -> csv::Result<()> {
        let mut csv = csv::Writer::from_writer(writer);
        csv.write_record(self.columns.iter().map(|c| c.name()))?;

        for row in &self.rows {
            csv.write_record(self.columns.iter().map(|c| {
                row.get(*c).map(|v| v.to_string()).unwrap_or_default()
            }))?;
        }

        csv.flush()?;
        Ok(())
    }
}

/// A data line that was dropped
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedRow {
    /// 1-based line number in the input
    pub line: usize,
    pub reason: RowSkip,
}

/// Parsed table plus everything that was dropped on the way
#[derive(Debug, Clone)]
pub struct ParseReport {
    pub table: LogTable,
    pub skipped: Vec<SkippedRow>,

    /// Number of table headers recognized
    pub tables_seen: usize,
}

/// Line-at-a-time table parser
#[derive(Debug, Default)]
pub struct TableParser {
    header: Option<HeaderIndex>,
    rows: Vec<LogRow>,
    skipped: Vec<SkippedRow>,
    tables_seen: usize,
    line_no: usize,
}

impl TableParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn in_table(&self) -> bool {
        self.header.is_some()
    }

    pub fn feed(&mut self, line: &str) {
        self.line_no += 1;

        if self.header.is_none() {
            if let Some(header) = HeaderIndex::from_header(line) {
                debug!(line = self.line_no, columns = header.positions.len(), "table header");
                self.header = Some(header);
                self.tables_seen += 1;
            }
            return;
        }

        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.is_empty() {
            debug!(line = self.line_no, "table end");
            self.header = None;
            return;
        }

        let Some(header) = &self.header else {
            return;
        };
        match header.extract(&tokens) {
            Ok(row) => self.rows.push(row),
            Err(reason) => {
                debug!(line = self.line_no, %reason, "skipping row");
                self.skipped.push(SkippedRow {
                    line: self.line_no,
                    reason,
                });
            }
        }
    }

    pub fn finish(self) -> ParseReport {
        ParseReport {
            table: LogTable::from_rows(self.rows),
            skipped: self.skipped,
            tables_seen: self.tables_seen,
        }
    }
}

/// Parse every thermo table in a stream
pub fn parse_log_table<R: BufRead>(reader: R) -> io::Result<ParseReport> {
    let mut parser = TableParser::new();
    for_each_line(reader, |line| {
        parser.feed(line);
        ControlFlow::Continue(())
    })?;
    Ok(parser.finish())
}

pub fn parse_log_str(text: &str) -> ParseReport {
    let mut parser = TableParser::new();
    for line in text.lines() {
        parser.feed(line);
    }
    parser.finish()
}

pub fn parse_log_file(path: &Path) -> Result<ParseReport> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open log {}", path.display()))?;
    parse_log_table(BufReader::new(file))
        .with_context(|| format!("Failed to read log {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const LOG: &str = "\
LAMMPS (29 Oct 2020)
Reading data file ...
Step CPU Atoms v_ncross1 v_ncross2 v_ncheater v_mass
       0            0     1000      500      500        0   1.2e-12
     100    1.5312043     1010      503      507        2   1.3e-12
     200    3.1021193     1022      510      512        4   1.4e-12
Loop time of 3.10212 on 1 procs for 200 steps with 1022 atoms

Pair  | 0.1234 | 0.1234 | 0.1234 |   0.0 | 64.7
";

    #[test]
    fn test_parses_full_table() {
        let report = parse_log_str(LOG);
        let table = report.table;

        assert_eq!(report.tables_seen, 1);
        assert_eq!(table.len(), 3);
        assert_eq!(
            table.columns(),
            &[
                Column::Step,
                Column::Cpu,
                Column::Atoms,
                Column::NCross1,
                Column::NCross2,
                Column::NCheater,
                Column::Mass
            ]
        );

        let row = &table.rows()[1];
        assert_eq!(row.step(), 100);
        assert_eq!(row.get(Column::Cpu), Some(Value::Float(1.5312043)));
        assert_eq!(row.get(Column::Atoms), Some(Value::Int(1010)));
        assert_eq!(row.get(Column::NCheater), Some(Value::Int(2)));
        assert_eq!(row.get(Column::NDead), None);
    }

    #[test]
    fn test_loop_line_is_skipped_not_fatal() {
        let report = parse_log_str(LOG);
        assert_eq!(report.skipped.len(), 1);
        assert!(matches!(
            report.skipped[0].reason,
            RowSkip::NonIntegerStep(ref t) if t == "Loop"
        ));
        assert_eq!(report.skipped[0].line, 7);
    }

    #[test]
    fn test_header_order_and_extra_tokens() {
        let text = "Step Temp v_ncross2 Press v_ncross1\n5 1.0 7 2.0 9\n";
        let report = parse_log_str(text);
        let header = HeaderIndex::from_header("Step Temp v_ncross2 Press v_ncross1").unwrap();

        assert_eq!(header.position(Column::NCross2), Some(2));
        assert_eq!(header.position(Column::NCross1), Some(4));
        assert_eq!(header.max_position(), 4);

        let row = &report.table.rows()[0];
        assert_eq!(row.get(Column::NCross1), Some(Value::Int(9)));
        assert_eq!(row.get(Column::NCross2), Some(Value::Int(7)));
        assert_eq!(
            report.table.columns(),
            &[Column::Step, Column::NCross1, Column::NCross2]
        );
    }

    #[test]
    fn test_header_requires_exact_tokens() {
        assert!(HeaderIndex::from_header("Step v_ncross1 v_ncross2_avg").is_none());
        assert!(HeaderIndex::from_header("# Step v_ncross1 v_ncross2").is_none());
        assert!(HeaderIndex::from_header("   Step v_ncross1 v_ncross2  ").is_some());
    }

    #[test]
    fn test_percentage_step_rejected() {
        let text = "Step v_ncross1 v_ncross2\n10 5 5\n64.7% 5 5\n20 4 4\n";
        let report = parse_log_str(text);
        let steps: Vec<i64> = report.table.rows().iter().map(LogRow::step).collect();
        assert_eq!(steps, vec![10, 20]);
    }

    #[test]
    fn test_short_row_skipped_stays_in_table() {
        let text = "Step v_ncross1 v_ncross2\n10 5\n20 4 4\n";
        let report = parse_log_str(text);
        assert_eq!(report.table.len(), 1);
        assert_eq!(
            report.skipped[0].reason,
            RowSkip::TooFewTokens { found: 2, needed: 3 }
        );
    }

    #[test]
    fn test_non_integer_count_skipped() {
        let text = "Step v_ncross1 v_ncross2\n10 5.5 5\n20 4 4\n";
        let report = parse_log_str(text);
        assert_eq!(report.table.len(), 1);
        assert_eq!(
            report.skipped[0].reason,
            RowSkip::BadValue {
                column: "v_ncross1",
                token: "5.5".to_string()
            }
        );
    }

    #[test]
    fn test_blank_line_ends_table() {
        let text = "Step v_ncross1 v_ncross2\n10 5 5\n\n20 4 4\n30 3 3\n";
        let report = parse_log_str(text);
        assert_eq!(report.table.len(), 1);
        assert!(report.skipped.is_empty());
    }

    #[test]
    fn test_parser_state_across_tables() {
        let mut parser = TableParser::new();
        assert!(!parser.in_table());
        parser.feed("Step v_ncross1 v_ncross2");
        assert!(parser.in_table());
        parser.feed("10 5 5");
        parser.feed("   ");
        assert!(!parser.in_table());
        parser.feed("20 4 4");
        assert!(!parser.in_table());

        let report = parser.finish();
        assert_eq!(report.table.len(), 1);
        assert!(report.table.has_column(Column::NCross2));
        assert!(!report.table.has_column(Column::Mass));
    }

    #[test]
    fn test_later_header_reopens_table() {
        let text = "\
Step v_ncross1 v_ncross2
10 5 5

run 100
Step Atoms v_ncross1 v_ncross2
20 99 4 4
";
        let report = parse_log_str(text);
        assert_eq!(report.tables_seen, 2);
        assert_eq!(report.table.len(), 2);
        assert_eq!(
            report.table.columns(),
            &[Column::Step, Column::Atoms, Column::NCross1, Column::NCross2]
        );
        assert_eq!(report.table.rows()[0].get(Column::Atoms), None);
        assert_eq!(report.table.rows()[1].get(Column::Atoms), Some(Value::Int(99)));
    }

    #[test]
    fn test_no_header_gives_empty_table() {
        let report = parse_log_str("nothing to see\n10 5 5\n");
        assert!(report.table.is_empty());
        assert_eq!(report.table.columns(), &Column::REQUIRED);
        assert_eq!(report.tables_seen, 0);
    }

    #[test]
    fn test_end_to_end_example() {
        let text = "Step v_ncross1 v_ncross2\n10 900 900\n20 45 45\n";
        let report = parse_log_table(text.as_bytes()).unwrap();
        assert_eq!(report.table.len(), 2);
        assert_eq!(
            report.table.columns(),
            &[Column::Step, Column::NCross1, Column::NCross2]
        );
    }

    #[test]
    fn test_filter_steps_inclusive() {
        let text = "Step v_ncross1 v_ncross2\n10 1 1\n20 1 1\n30 1 1\n40 1 1\n";
        let table = parse_log_str(text).table;
        let filtered = table.filter_steps(Some(20), Some(30));
        let steps: Vec<i64> = filtered.rows().iter().map(LogRow::step).collect();
        assert_eq!(steps, vec![20, 30]);
        assert_eq!(table.filter_steps(None, None).len(), 4);
    }

    #[test]
    fn test_write_csv() {
        let text = "Step v_mass v_ncross1 v_ncross2\n10 2.5 3 4\n";
        let table = parse_log_str(text).table;
        let mut out = Vec::new();
        table.write_csv(&mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Step,v_ncross1,v_ncross2,v_mass\n10,3,4,2.5\n"
        );
    }
}
