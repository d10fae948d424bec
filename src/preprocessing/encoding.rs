//! Categorical encoding map
//!
//! Built once at training time from the observed category set and embedded
//! in the model artifact. Inference reuses it read-only: the same value maps
//! to the same code forever, and values never seen in training map to 0.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Value -> integer code lookup for one categorical feature.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryEncoding {
    codes: BTreeMap<String, u32>,
}

impl CategoryEncoding {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assign the next sequential code to `value` if it has none yet.
    pub fn insert_if_absent(&mut self, value: &str) {
        if !self.codes.contains_key(value) {
            let code = self.codes.len() as u32;
            self.codes.insert(value.to_string(), code);
        }
    }

    /// Code for a value, or None when it was never seen in training.
    pub fn code(&self, value: &str) -> Option<u32> {
        self.codes.get(value).copied()
    }

    /// Code for a value, defaulting unseen categories to 0.
    pub fn code_or_default(&self, value: &str) -> f64 {
        self.code(value).unwrap_or(0) as f64
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }
}

/// Per-feature encodings. Features absent from the map are numerical.
pub type EncodingMap = BTreeMap<String, CategoryEncoding>;
