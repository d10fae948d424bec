//! CSV ingestion with automatic delimiter detection
//!
//! Tries comma, semicolon, and tab, scores each candidate by field-length
//! consistency, and rejects ambiguous files instead of guessing. Cell values
//! are dynamically typed: numbers parse to JSON numbers, `true`/`false` to
//! booleans, empty cells to null.

use super::{Dataset, Row};
use crate::error::{ChurnError, Result};
use serde_json::Value;
use std::path::Path;

const CANDIDATE_DELIMITERS: [u8; 3] = [b',', b';', b'\t'];

/// Minimum acceptable consistency score (0-100 scale).
const MIN_SCORE: f64 = 20.0;
/// Minimum fraction of rows matching the first row's width.
const MIN_CONSISTENCY: f64 = 0.8;

#[derive(Debug, Clone, Copy)]
struct DelimiterScore {
    delimiter: u8,
    score: f64,
    consistency: f64,
    first_width: usize,
}

/// Score one candidate delimiter by how consistently it splits the input.
/// Rows matching the first row's width raise the score; parse errors lower it.
fn score_delimiter(text: &str, delimiter: u8) -> DelimiterScore {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut first_width = 0usize;
    let mut total = 0usize;
    let mut matching = 0usize;
    let mut errors = 0usize;

    for record in reader.records() {
        match record {
            Ok(rec) => {
                total += 1;
                if first_width == 0 {
                    first_width = rec.len();
                }
                if rec.len() == first_width {
                    matching += 1;
                }
            }
            Err(_) => errors += 1,
        }
    }

    if total == 0 || first_width < 2 {
        return DelimiterScore {
            delimiter,
            score: f64::NEG_INFINITY,
            consistency: 0.0,
            first_width,
        };
    }

    let consistency = matching as f64 / total as f64;
    let error_penalty = errors as f64 / total as f64 * 50.0;
    DelimiterScore {
        delimiter,
        score: consistency * 100.0 - error_penalty,
        consistency,
        first_width,
    }
}

/// Dynamically type a raw field the way spreadsheet imports do.
fn coerce_field(field: &str) -> Value {
    if field.is_empty() {
        return Value::Null;
    }
    if field == "true" {
        return Value::Bool(true);
    }
    if field == "false" {
        return Value::Bool(false);
    }
    if let Ok(i) = field.parse::<i64>() {
        return Value::Number(i.into());
    }
    if let Ok(f) = field.parse::<f64>() {
        if f.is_finite() {
            if let Some(n) = serde_json::Number::from_f64(f) {
                return Value::Number(n);
            }
        }
    }
    Value::String(field.to_string())
}

/// Parse CSV text into a [`Dataset`], auto-detecting the delimiter.
pub fn parse_csv_str(text: &str) -> Result<Dataset> {
    let best = CANDIDATE_DELIMITERS
        .iter()
        .map(|&d| score_delimiter(text, d))
        .max_by(|a, b| a.score.partial_cmp(&b.score).unwrap_or(std::cmp::Ordering::Equal))
        .expect("candidate list is non-empty");

    if best.score < MIN_SCORE || best.consistency < MIN_CONSISTENCY || best.first_width < 2 {
        return Err(ChurnError::DataError(
            "ambiguous CSV format, specify the delimiter manually".to_string(),
        ));
    }

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(best.delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut records = reader.records();
    let headers: Vec<String> = match records.next() {
        Some(rec) => rec?.iter().map(|f| f.trim().to_string()).collect(),
        None => return Err(ChurnError::DataError("CSV has no header row".to_string())),
    };
    if headers.len() < 2 {
        return Err(ChurnError::DataError(
            "CSV must have at least two columns".to_string(),
        ));
    }

    let mut rows: Vec<Row> = Vec::new();
    for record in records {
        let rec = record?;
        let mut row = Row::new();
        for (header, field) in headers.iter().zip(rec.iter()) {
            row.insert(header.clone(), coerce_field(field));
        }
        rows.push(row);
    }
    if rows.is_empty() {
        return Err(ChurnError::DataError("CSV has no data rows".to_string()));
    }

    Dataset::new(headers, rows)
}

/// Read and parse a CSV file from disk.
pub fn read_csv(path: impl AsRef<Path>) -> Result<Dataset> {
    let text = std::fs::read_to_string(path)?;
    parse_csv_str(&text)
}
