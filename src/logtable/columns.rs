//! Known thermo columns and their value types

use serde::{Deserialize, Serialize};
use std::fmt;

/// A thermo column the parser knows how to type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Column {
    Step,
    Cpu,
    Atoms,
    NCross1,
    NCross2,
    NCheater,
    NDead,
    Mass,
}

impl Column {
    /// Output order for tables and CSV files
    pub const PREFERRED: [Column; 8] = [
        Column::Step,
        Column::Cpu,
        Column::Atoms,
        Column::NCross1,
        Column::NCross2,
        Column::NCheater,
        Column::NDead,
        Column::Mass,
    ];

    /// A header must name all of these to start a table
    pub const REQUIRED: [Column; 3] = [Column::Step, Column::NCross1, Column::NCross2];

    /// Header name as printed by the thermo_style command
    pub fn name(self) -> &'static str {
        match self {
            Column::Step => "Step",
            Column::Cpu => "CPU",
            Column::Atoms => "Atoms",
            Column::NCross1 => "v_ncross1",
            Column::NCross2 => "v_ncross2",
            Column::NCheater => "v_ncheater",
            Column::NDead => "v_ndead",
            Column::Mass => "v_mass",
        }
    }

    pub fn from_name(name: &str) -> Option<Column> {
        Column::PREFERRED.into_iter().find(|c| c.name() == name)
    }

    pub fn kind(self) -> ValueKind {
        match self {
            Column::Cpu | Column::Mass => ValueKind::Float,
            _ => ValueKind::Integer,
        }
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Integer,
    Float,
}

impl ValueKind {
    /// Convert one token; `None` when it is not a literal of this kind
    pub fn parse(self, token: &str) -> Option<Value> {
        match self {
            ValueKind::Integer => token.parse::<i64>().ok().map(Value::Int),
            ValueKind::Float => token.parse::<f64>().ok().map(Value::Float),
        }
    }
}

/// A typed cell
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Int(i64),
    Float(f64),
}

impl Value {
    pub fn as_f64(self) -> f64 {
        match self {
            Value::Int(v) => v as f64,
            Value::Float(v) => v,
        }
    }

    pub fn as_i64(self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(v),
            Value::Float(_) => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(v) => write!(f, "{}", v),
            Value::Float(v) => write!(f, "{:?}", v),
        }
    }
}
