//! Per-column dataset statistics
//!
//! Used by callers to audit an uploaded dataset before configuring a
//! training run: type detection, missing counts, and value frequencies.

use super::{as_number, cell_to_string, is_missing, Dataset};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// Detected type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    Numerical,
    Categorical,
}

/// Summary statistics for one column.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnStats {
    /// Total number of cells (== number of rows)
    pub total: usize,
    /// Number of missing cells (absent, null, or empty string)
    pub missing: usize,
    /// Number of distinct non-missing values
    pub unique: usize,
    /// Detected column type
    pub column_type: ColumnType,
    /// Frequency of each stringified non-missing value
    pub value_counts: BTreeMap<String, usize>,
}

/// Compute statistics for every column of a dataset.
///
/// A column is numerical when every non-missing cell is an actual JSON
/// number. The same rule drives the preprocessor's encoding decision.
pub fn dataset_stats(dataset: &Dataset) -> BTreeMap<String, ColumnStats> {
    let mut stats = BTreeMap::new();
    if dataset.is_empty() {
        return stats;
    }

    for header in &dataset.headers {
        let total = dataset.n_rows();
        let mut missing = 0usize;
        let mut numeric = true;
        let mut distinct: HashSet<String> = HashSet::new();
        let mut value_counts: BTreeMap<String, usize> = BTreeMap::new();

        for cell in dataset.column(header) {
            if is_missing(cell) {
                missing += 1;
                continue;
            }
            if as_number(cell).is_none() {
                numeric = false;
            }
            let key = cell_to_string(cell.expect("non-missing cell"));
            distinct.insert(key.clone());
            *value_counts.entry(key).or_insert(0) += 1;
        }

        stats.insert(
            header.clone(),
            ColumnStats {
                total,
                missing,
                unique: distinct.len(),
                column_type: if numeric {
                    ColumnType::Numerical
                } else {
                    ColumnType::Categorical
                },
                value_counts,
            },
        );
    }

    stats
}
