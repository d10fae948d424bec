//! Tabular preprocessing
//!
//! Turns raw JSON rows into a dense numeric feature matrix plus a 0/1 label
//! vector, building the encoding map that inference later reuses. The input
//! dataset is never mutated; the matrix is assembled in one pass from
//! per-column vectors.

mod encoding;
mod split;

pub use encoding::{CategoryEncoding, EncodingMap};
pub use split::{train_test_split, Split};

use crate::dataset::{as_number, cell_to_string, is_missing, Dataset};
use crate::error::{ChurnError, Result};
use ndarray::{Array1, Array2};
use serde_json::Value;

/// Output of preprocessing: the training contract between raw rows and the
/// model trainers.
#[derive(Debug, Clone)]
pub struct Preprocessed {
    /// Dense feature matrix, one column per configured feature
    pub x: Array2<f64>,
    /// Binary labels derived from the target column
    pub y: Array1<f64>,
    /// Categorical value -> code lookup, keyed by feature name
    pub encoding_map: EncodingMap,
}

/// Strings that mark a positive (churned) target label, matched
/// case-insensitively after trimming.
const POSITIVE_TARGET_TOKENS: [&str; 6] = ["1", "true", "yes", "y", "churn", "churned"];

/// Normalize a raw target cell to a 0/1 label.
///
/// Positive iff the value is a non-zero number, boolean true, or one of the
/// recognized positive strings. Missing cells and everything else are 0.
pub fn target_label(value: Option<&Value>) -> f64 {
    match value {
        Some(Value::Number(n)) => {
            if n.as_f64().map_or(false, |v| v != 0.0) {
                1.0
            } else {
                0.0
            }
        }
        Some(Value::Bool(b)) => {
            if *b {
                1.0
            } else {
                0.0
            }
        }
        Some(Value::String(s)) => {
            let token = s.trim().to_ascii_lowercase();
            if POSITIVE_TARGET_TOKENS.contains(&token.as_str()) {
                1.0
            } else {
                0.0
            }
        }
        _ => 0.0,
    }
}

/// Encode one feature column into numeric values, extending `encoding_map`
/// when the column is categorical.
fn encode_column(dataset: &Dataset, feature: &str, encoding_map: &mut EncodingMap) -> Vec<f64> {
    let cells: Vec<Option<&Value>> = dataset.column(feature).collect();
    let numeric = cells
        .iter()
        .all(|cell| is_missing(*cell) || as_number(*cell).is_some());

    if numeric {
        let numbers: Vec<f64> = cells.iter().filter_map(|cell| as_number(*cell)).collect();
        let mean = if numbers.is_empty() {
            0.0
        } else {
            numbers.iter().sum::<f64>() / numbers.len() as f64
        };
        return cells
            .iter()
            .map(|cell| as_number(*cell).unwrap_or(mean))
            .collect();
    }

    // Categorical: codes and the imputation mode both follow first-seen
    // order so repeated runs over the same rows are identical.
    let mut seen: Vec<(String, usize)> = Vec::new();
    for cell in &cells {
        if is_missing(*cell) {
            continue;
        }
        let key = cell_to_string(cell.expect("non-missing cell"));
        match seen.iter_mut().find(|(value, _)| *value == key) {
            Some((_, count)) => *count += 1,
            None => seen.push((key, 1)),
        }
    }

    let mode = seen
        .iter()
        .max_by_key(|(_, count)| *count)
        .map(|(value, _)| value.clone())
        .unwrap_or_default();

    let encoding = encoding_map.entry(feature.to_string()).or_default();
    for (value, _) in &seen {
        encoding.insert_if_absent(value);
    }

    cells
        .iter()
        .map(|cell| {
            if is_missing(*cell) {
                encoding.code_or_default(&mode)
            } else {
                encoding.code_or_default(&cell_to_string(cell.expect("non-missing cell")))
            }
        })
        .collect()
}

/// Preprocess a dataset into `(X, y, encoding map)`.
///
/// Column typing: a feature is numerical when every non-missing cell is an
/// actual number; otherwise it is categorical. Numerical gaps are imputed
/// with the column mean, categorical gaps with the column mode.
pub fn preprocess(
    dataset: &Dataset,
    target_variable: &str,
    features: &[String],
) -> Result<Preprocessed> {
    if dataset.is_empty() {
        return Err(ChurnError::DataError(
            "dataset has no rows to train on".to_string(),
        ));
    }
    if !dataset.has_column(target_variable) {
        return Err(ChurnError::FeatureNotFound(target_variable.to_string()));
    }
    for feature in features {
        if !dataset.has_column(feature) {
            return Err(ChurnError::FeatureNotFound(feature.clone()));
        }
    }
    if dataset.column(target_variable).all(is_missing) {
        return Err(ChurnError::DataError(format!(
            "target column '{}' has no values",
            target_variable
        )));
    }

    let n_rows = dataset.n_rows();
    let mut encoding_map = EncodingMap::new();
    let columns: Vec<Vec<f64>> = features
        .iter()
        .map(|feature| encode_column(dataset, feature, &mut encoding_map))
        .collect();

    let x = Array2::from_shape_fn((n_rows, features.len()), |(i, j)| columns[j][i]);
    let y: Array1<f64> = dataset.column(target_variable).map(target_label).collect();

    Ok(Preprocessed { x, y, encoding_map })
}
