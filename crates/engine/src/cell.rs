use std::fmt;

use chrono::NaiveDateTime;
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

/// Text form used for datetimes, both for display and for pattern matching.
pub const DATETIME_DISPLAY_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A present cell value. An absent value (blank cell, empty string) is
/// represented as `None` wherever an `Option<CellValue>` appears, and that
/// `None` is the null sentinel carried through search results and export.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum CellValue {
    Bool(bool),
    Number(OrderedFloat<f64>),
    DateTime(NaiveDateTime),
    Text(String),
    /// Spreadsheet error cell such as `#DIV/0!`, kept as its literal text
    Error(String),
}

impl CellValue {
    pub fn number(n: f64) -> Self {
        CellValue::Number(OrderedFloat(n))
    }

    pub fn text(s: impl Into<String>) -> Self {
        CellValue::Text(s.into())
    }

    /// Builds a value from text, mapping the empty string to `None`.
    pub fn from_text(s: impl Into<String>) -> Option<Self> {
        let s = s.into();
        if s.is_empty() {
            None
        } else {
            Some(CellValue::Text(s))
        }
    }
}

/// Format a number the way it reads in a sheet: integers without decimals.
pub fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Bool(b) => f.write_str(if *b { "TRUE" } else { "FALSE" }),
            CellValue::Number(n) => f.write_str(&format_number(n.into_inner())),
            CellValue::DateTime(dt) => write!(f, "{}", dt.format(DATETIME_DISPLAY_FORMAT)),
            CellValue::Text(s) => f.write_str(s),
            CellValue::Error(e) => f.write_str(e),
        }
    }
}

/// Display text for an optional value; the null sentinel renders empty.
pub fn display_or_empty(value: Option<&CellValue>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}
