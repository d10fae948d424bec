//! Tabular dataset representation
//!
//! A [`Dataset`] is an ordered list of column names plus rows of raw JSON
//! values, exactly as they arrive over the train boundary. Cells may be
//! numbers, strings, booleans, or null; absent keys and empty strings count
//! as missing.

mod loader;
mod stats;

pub use loader::{parse_csv_str, read_csv};
pub use stats::{dataset_stats, ColumnStats, ColumnType};

use crate::error::{ChurnError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;

/// A single data row: column name -> raw cell value.
pub type Row = serde_json::Map<String, Value>;

/// An uploaded customer dataset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dataset {
    /// Ordered column names
    pub headers: Vec<String>,
    /// Data rows; every key must appear in `headers`
    pub rows: Vec<Row>,
}

impl Dataset {
    /// Build a dataset, validating that every row key appears in `headers`.
    pub fn new(headers: Vec<String>, rows: Vec<Row>) -> Result<Self> {
        let known: HashSet<&str> = headers.iter().map(|h| h.as_str()).collect();
        for (i, row) in rows.iter().enumerate() {
            if let Some(key) = row.keys().find(|k| !known.contains(k.as_str())) {
                return Err(ChurnError::DataError(format!(
                    "row {} has unknown column '{}'",
                    i, key
                )));
            }
        }
        Ok(Self { headers, rows })
    }

    /// Number of rows.
    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    /// True when the dataset has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Whether `name` is one of the dataset's columns.
    pub fn has_column(&self, name: &str) -> bool {
        self.headers.iter().any(|h| h == name)
    }

    /// Iterate the raw values of one column, absent cells yielded as `None`.
    pub fn column<'a>(&'a self, name: &'a str) -> impl Iterator<Item = Option<&'a Value>> + 'a {
        self.rows.iter().map(move |row| row.get(name))
    }
}

/// A cell is missing when it is absent, JSON null, or an empty string.
pub fn is_missing(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty(),
        _ => false,
    }
}

/// Extract a numeric cell value. Only actual JSON numbers count; numeric
/// strings do not (they make a column categorical instead).
pub fn as_number(value: Option<&Value>) -> Option<f64> {
    match value {
        Some(Value::Number(n)) => n.as_f64(),
        _ => None,
    }
}

/// Stringified form of a non-missing cell, used for categorical encoding.
pub fn cell_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}
