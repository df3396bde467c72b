//! Seed substitution on template text
//!
//! A seeded line looks like
//!
//! ```text
//! fix div1 CROSS1 nufeb/division/coccus 1.36e-6 1234   # comment
//! ```
//!
//! The line must start with `fix` and the label token, carry the role's
//! marker token somewhere after the label, and end its code part (everything
//! before the first `#`) with an all-digit token. Only that token changes.

use serde::{Deserialize, Serialize};
use std::ops::Range;

/// What a seeded fix does; decides which marker token confirms the line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FixRole {
    Division,
    Secretion,
}

impl FixRole {
    pub fn marker(self) -> &'static str {
        match self {
            FixRole::Division => "nufeb/division/coccus",
            FixRole::Secretion => "nufeb/eps_secretion",
        }
    }
}

/// Seed parameters for one fix label
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedLabel {
    /// Fix ID, e.g. `div2`
    pub name: String,
    pub role: FixRole,
    pub multiplier: u64,
    pub offset: u64,
}

impl SeedLabel {
    pub fn new(name: &str, role: FixRole, multiplier: u64, offset: u64) -> Self {
        Self {
            name: name.to_string(),
            role,
            multiplier,
            offset,
        }
    }

    /// `i^2 * v^2 + 2v + offset`
    pub fn seed(&self, index: u32) -> u128 {
        let i = index as u128;
        let v = self.multiplier as u128;
        i * i * v * v + 2 * v + self.offset as u128
    }

    /// div1..div3
    pub fn division_table() -> Vec<SeedLabel> {
        vec![
            SeedLabel::new("div1", FixRole::Division, 1, 101),
            SeedLabel::new("div2", FixRole::Division, 2, 102),
            SeedLabel::new("div3", FixRole::Division, 3, 103),
        ]
    }

    /// div1..div3 plus eps1..eps2
    pub fn eps_table() -> Vec<SeedLabel> {
        let mut labels = Self::division_table();
        labels.push(SeedLabel::new("eps1", FixRole::Secretion, 4, 104));
        labels.push(SeedLabel::new("eps2", FixRole::Secretion, 5, 105));
        labels
    }
}

/// Result of rewriting a template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Substitution {
    pub text: String,

    /// (label, new seed) per rewritten line, in file order
    pub replaced: Vec<(String, u128)>,
}

/// Locate the seed token of a seeded line
fn locate_seed<'a>(line: &str, labels: &'a [SeedLabel]) -> Option<(&'a SeedLabel, Range<usize>)> {
    let code_end = line.find('#').unwrap_or(line.len());
    let code = line[..code_end].trim_end();

    let seed_start = code
        .char_indices()
        .rev()
        .find(|(_, c)| c.is_whitespace())
        .map(|(i, c)| i + c.len_utf8())?;
    let seed = &code[seed_start..];
    if seed.is_empty() || !seed.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let mut tokens = code[..seed_start].split_whitespace();
    if tokens.next()? != "fix" {
        return None;
    }
    let name = tokens.next()?;
    let label = labels.iter().find(|l| l.name == name)?;

    if !tokens.any(|t| t == label.role.marker()) {
        return None;
    }

    Some((label, seed_start..code.len()))
}

/// Rewrite every seeded line of `text` for replicate `index`
pub fn substitute_seeds(text: &str, index: u32, labels: &[SeedLabel]) -> Substitution {
    let mut out = String::with_capacity(text.len() + 64);
    let mut replaced = Vec::new();

    for line in text.split_inclusive('\n') {
        match locate_seed(line, labels) {
            Some((label, range)) => {
                let seed = label.seed(index);
                out.push_str(&line[..range.start]);
                out.push_str(&seed.to_string());
                out.push_str(&line[range.end..]);
                replaced.push((label.name.clone(), seed));
            }
            None => out.push_str(line),
        }
    }

    Substitution { text: out, replaced }
}

/// Current seed of every seeded line, in file order
pub fn read_seeds(text: &str, labels: &[SeedLabel]) -> Vec<(String, u128)> {
    text.split_inclusive('\n')
        .filter_map(|line| {
            let (label, range) = locate_seed(line, labels)?;
            let seed = line[range].parse().ok()?;
            Some((label.name.clone(), seed))
        })
        .collect()
}
