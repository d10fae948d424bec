//! CART-style decision tree
//!
//! The base learner for both ensembles: gini-split classification trees for
//! the random forest, variance-split regression trees for boosting on
//! logistic residuals. Split search runs per-feature in parallel over a
//! sorted scan with prefix statistics.

use crate::error::{ChurnError, Result};
use ndarray::{Array1, Array2};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// A fitted tree node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TreeNode {
    Leaf {
        value: f64,
    },
    Branch {
        feature: usize,
        threshold: f64,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
    },
}

/// Impurity criterion for split selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SplitCriterion {
    /// Gini impurity over binary labels (classification)
    Gini,
    /// Variance reduction (regression)
    Variance,
}

/// Decision tree model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTree {
    root: Option<TreeNode>,
    pub max_depth: usize,
    pub min_samples_leaf: usize,
    criterion: SplitCriterion,
    n_features: usize,
    feature_importances: Option<Vec<f64>>,
}

/// Gains below this threshold are treated as no improvement.
const MIN_GAIN: f64 = 1e-12;

impl DecisionTree {
    /// Binary classification tree using gini impurity.
    pub fn new_classifier(max_depth: usize) -> Self {
        Self {
            root: None,
            max_depth,
            min_samples_leaf: 1,
            criterion: SplitCriterion::Gini,
            n_features: 0,
            feature_importances: None,
        }
    }

    /// Regression tree using variance reduction.
    pub fn new_regressor(max_depth: usize) -> Self {
        Self {
            root: None,
            max_depth,
            min_samples_leaf: 1,
            criterion: SplitCriterion::Variance,
            n_features: 0,
            feature_importances: None,
        }
    }

    /// Set minimum samples per leaf.
    pub fn with_min_samples_leaf(mut self, min_samples: usize) -> Self {
        self.min_samples_leaf = min_samples.max(1);
        self
    }

    /// Fit the tree to training data.
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<&mut Self> {
        let n_samples = x.nrows();
        if n_samples != y.len() {
            return Err(ChurnError::ShapeError {
                expected: format!("{} labels", n_samples),
                actual: format!("{} labels", y.len()),
            });
        }
        if n_samples == 0 {
            return Err(ChurnError::TrainingError(
                "cannot fit a tree on zero samples".to_string(),
            ));
        }

        self.n_features = x.ncols();
        let mut importances = vec![0.0; self.n_features];
        let indices: Vec<usize> = (0..n_samples).collect();
        self.root = Some(self.build(x, y, &indices, 0, &mut importances));

        let total: f64 = importances.iter().sum();
        if total > 0.0 {
            for imp in &mut importances {
                *imp /= total;
            }
        }
        self.feature_importances = Some(importances);

        Ok(self)
    }

    fn build(
        &self,
        x: &Array2<f64>,
        y: &Array1<f64>,
        indices: &[usize],
        depth: usize,
        importances: &mut [f64],
    ) -> TreeNode {
        let labels: Vec<f64> = indices.iter().map(|&i| y[i]).collect();

        let stop = depth >= self.max_depth
            || indices.len() < 2 * self.min_samples_leaf
            || is_constant(&labels);
        if stop {
            return TreeNode::Leaf {
                value: self.leaf_value(&labels),
            };
        }

        let split = match self.best_split(x, y, indices) {
            Some(split) => split,
            None => {
                return TreeNode::Leaf {
                    value: self.leaf_value(&labels),
                }
            }
        };

        let (left_idx, right_idx): (Vec<usize>, Vec<usize>) = indices
            .iter()
            .partition(|&&i| x[[i, split.feature]] <= split.threshold);

        importances[split.feature] += indices.len() as f64 * split.gain;

        let left = Box::new(self.build(x, y, &left_idx, depth + 1, importances));
        let right = Box::new(self.build(x, y, &right_idx, depth + 1, importances));

        TreeNode::Branch {
            feature: split.feature,
            threshold: split.threshold,
            left,
            right,
        }
    }

    /// Search every feature for the split with the highest impurity decrease.
    /// Features are scanned in parallel; ties go to the lowest feature index
    /// so fitting is deterministic.
    fn best_split(&self, x: &Array2<f64>, y: &Array1<f64>, indices: &[usize]) -> Option<BestSplit> {
        let labels: Vec<f64> = indices.iter().map(|&i| y[i]).collect();
        let parent_impurity = self.impurity(&labels);
        if parent_impurity <= 0.0 {
            return None;
        }

        let candidates: Vec<Option<BestSplit>> = (0..self.n_features)
            .into_par_iter()
            .map(|feature| self.best_split_for_feature(x, y, indices, feature, parent_impurity))
            .collect();

        let mut best: Option<BestSplit> = None;
        for candidate in candidates.into_iter().flatten() {
            let better = match &best {
                Some(current) => candidate.gain > current.gain,
                None => true,
            };
            if better {
                best = Some(candidate);
            }
        }
        best
    }

    fn best_split_for_feature(
        &self,
        x: &Array2<f64>,
        y: &Array1<f64>,
        indices: &[usize],
        feature: usize,
        parent_impurity: f64,
    ) -> Option<BestSplit> {
        let n = indices.len();
        let mut pairs: Vec<(f64, f64)> = indices
            .iter()
            .map(|&i| (x[[i, feature]], y[i]))
            .collect();
        pairs.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));

        // Prefix statistics: positives for gini, sum/sq-sum for variance.
        let mut prefix_pos = vec![0.0; n + 1];
        let mut prefix_sum = vec![0.0; n + 1];
        let mut prefix_sq = vec![0.0; n + 1];
        for (i, (_, label)) in pairs.iter().enumerate() {
            prefix_pos[i + 1] = prefix_pos[i] + if *label > 0.5 { 1.0 } else { 0.0 };
            prefix_sum[i + 1] = prefix_sum[i] + label;
            prefix_sq[i + 1] = prefix_sq[i] + label * label;
        }

        let mut best: Option<BestSplit> = None;
        for i in self.min_samples_leaf..=(n - self.min_samples_leaf) {
            if pairs[i].0 <= pairs[i - 1].0 {
                continue;
            }
            let (nl, nr) = (i as f64, (n - i) as f64);
            let left_impurity = match self.criterion {
                SplitCriterion::Gini => gini_from_counts(prefix_pos[i], nl),
                SplitCriterion::Variance => variance_from_sums(prefix_sum[i], prefix_sq[i], nl),
            };
            let right_impurity = match self.criterion {
                SplitCriterion::Gini => gini_from_counts(prefix_pos[n] - prefix_pos[i], nr),
                SplitCriterion::Variance => variance_from_sums(
                    prefix_sum[n] - prefix_sum[i],
                    prefix_sq[n] - prefix_sq[i],
                    nr,
                ),
            };

            let weighted = (nl * left_impurity + nr * right_impurity) / n as f64;
            let gain = parent_impurity - weighted;
            if gain <= MIN_GAIN {
                continue;
            }
            if best.as_ref().map_or(true, |b| gain > b.gain) {
                best = Some(BestSplit {
                    feature,
                    threshold: (pairs[i - 1].0 + pairs[i].0) / 2.0,
                    gain,
                });
            }
        }
        best
    }

    fn impurity(&self, labels: &[f64]) -> f64 {
        let n = labels.len() as f64;
        if n == 0.0 {
            return 0.0;
        }
        match self.criterion {
            SplitCriterion::Gini => {
                let pos = labels.iter().filter(|&&v| v > 0.5).count() as f64;
                gini_from_counts(pos, n)
            }
            SplitCriterion::Variance => {
                let sum: f64 = labels.iter().sum();
                let sq: f64 = labels.iter().map(|v| v * v).sum();
                variance_from_sums(sum, sq, n)
            }
        }
    }

    fn leaf_value(&self, labels: &[f64]) -> f64 {
        if labels.is_empty() {
            return 0.0;
        }
        let n = labels.len() as f64;
        match self.criterion {
            SplitCriterion::Gini => {
                let pos = labels.iter().filter(|&&v| v > 0.5).count() as f64;
                if pos / n >= 0.5 {
                    1.0
                } else {
                    0.0
                }
            }
            SplitCriterion::Variance => labels.iter().sum::<f64>() / n,
        }
    }

    /// Predict a value for every row.
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let root = self.root.as_ref().ok_or(ChurnError::ModelNotFitted)?;
        let predictions: Vec<f64> = x
            .outer_iter()
            .map(|row| {
                let mut node = root;
                loop {
                    match node {
                        TreeNode::Leaf { value } => return *value,
                        TreeNode::Branch {
                            feature,
                            threshold,
                            left,
                            right,
                        } => {
                            node = if row[*feature] <= *threshold { left } else { right };
                        }
                    }
                }
            })
            .collect();
        Ok(Array1::from_vec(predictions))
    }

    /// Per-feature split-gain importances, normalized to sum to 1.
    pub fn feature_importances(&self) -> Option<&[f64]> {
        self.feature_importances.as_deref()
    }

    /// Depth of the fitted tree (0 when unfitted).
    pub fn depth(&self) -> usize {
        fn node_depth(node: &TreeNode) -> usize {
            match node {
                TreeNode::Leaf { .. } => 1,
                TreeNode::Branch { left, right, .. } => 1 + node_depth(left).max(node_depth(right)),
            }
        }
        self.root.as_ref().map_or(0, node_depth)
    }
}

#[derive(Debug, Clone, Copy)]
struct BestSplit {
    feature: usize,
    threshold: f64,
    gain: f64,
}

fn gini_from_counts(positives: f64, n: f64) -> f64 {
    if n == 0.0 {
        return 0.0;
    }
    let p = positives / n;
    1.0 - p * p - (1.0 - p) * (1.0 - p)
}

fn variance_from_sums(sum: f64, sq_sum: f64, n: f64) -> f64 {
    if n == 0.0 {
        return 0.0;
    }
    let mean = sum / n;
    (sq_sum / n - mean * mean).max(0.0)
}

fn is_constant(labels: &[f64]) -> bool {
    labels
        .first()
        .map_or(true, |&first| labels.iter().all(|&v| (v - first).abs() < 1e-12))
}
