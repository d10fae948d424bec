//! Random forest classifier
//!
//! Bagged gini trees with a per-tree seeded RNG so training is reproducible
//! under a fixed seed. The churn probability of a row is the fraction of
//! trees voting for the positive class.

use super::decision_tree::DecisionTree;
use crate::error::{ChurnError, Result};
use ndarray::{Array1, Array2, Axis};
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Callback invoked as trees finish fitting: `(trees_done, trees_total)`.
pub type TreeProgress<'a> = &'a (dyn Fn(usize, usize) + Sync);

/// Random forest binary classifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomForestClassifier {
    trees: Vec<DecisionTree>,
    pub n_estimators: usize,
    pub max_depth: usize,
    pub min_samples_leaf: usize,
    pub seed: u64,
    n_features: usize,
    feature_importances: Option<Vec<f64>>,
}

impl Default for RandomForestClassifier {
    fn default() -> Self {
        Self::new(50)
    }
}

impl RandomForestClassifier {
    pub fn new(n_estimators: usize) -> Self {
        Self {
            trees: Vec::new(),
            n_estimators,
            max_depth: 10,
            min_samples_leaf: 1,
            seed: 42,
            n_features: 0,
            feature_importances: None,
        }
    }

    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    pub fn with_min_samples_leaf(mut self, min_samples: usize) -> Self {
        self.min_samples_leaf = min_samples;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Fit the forest to training data.
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<&mut Self> {
        self.fit_with_progress(x, y, None)
    }

    /// Fit the forest, reporting tree completions through `progress`.
    pub fn fit_with_progress(
        &mut self,
        x: &Array2<f64>,
        y: &Array1<f64>,
        progress: Option<TreeProgress<'_>>,
    ) -> Result<&mut Self> {
        let n_samples = x.nrows();
        if n_samples != y.len() {
            return Err(ChurnError::ShapeError {
                expected: format!("{} labels", n_samples),
                actual: format!("{} labels", y.len()),
            });
        }
        if n_samples == 0 {
            return Err(ChurnError::TrainingError(
                "cannot fit a forest on an empty training split".to_string(),
            ));
        }

        self.n_features = x.ncols();
        let done = AtomicUsize::new(0);

        let trees: Result<Vec<DecisionTree>> = (0..self.n_estimators)
            .into_par_iter()
            .map(|tree_idx| {
                let mut rng = ChaCha8Rng::seed_from_u64(self.seed.wrapping_add(tree_idx as u64));

                // Bootstrap resample with replacement
                let sample_indices: Vec<usize> =
                    (0..n_samples).map(|_| rng.gen_range(0..n_samples)).collect();
                let x_boot = x.select(Axis(0), &sample_indices);
                let y_boot: Array1<f64> =
                    Array1::from_iter(sample_indices.iter().map(|&i| y[i]));

                let mut tree = DecisionTree::new_classifier(self.max_depth)
                    .with_min_samples_leaf(self.min_samples_leaf);
                tree.fit(&x_boot, &y_boot)?;

                if let Some(report) = progress {
                    let finished = done.fetch_add(1, Ordering::Relaxed) + 1;
                    report(finished, self.n_estimators);
                }
                Ok(tree)
            })
            .collect();

        self.trees = trees?;
        self.feature_importances = self.average_tree_importances();
        Ok(self)
    }

    /// Mean of per-tree split-gain importances, renormalized to sum to 1.
    /// None when no tree produced importances; callers fall back to a
    /// uniform distribution in that case.
    fn average_tree_importances(&self) -> Option<Vec<f64>> {
        let mut totals = vec![0.0; self.n_features];
        let mut contributing = 0usize;
        for tree in &self.trees {
            if let Some(imp) = tree.feature_importances() {
                if imp.len() == self.n_features {
                    for (slot, &value) in totals.iter_mut().zip(imp) {
                        *slot += value;
                    }
                    contributing += 1;
                }
            }
        }
        if contributing == 0 {
            return None;
        }
        for slot in &mut totals {
            *slot /= contributing as f64;
        }
        let sum: f64 = totals.iter().sum();
        if sum > 0.0 {
            for slot in &mut totals {
                *slot /= sum;
            }
            Some(totals)
        } else {
            None
        }
    }

    /// Fraction of trees voting for the positive class, per row.
    pub fn predict_probability(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        if self.trees.is_empty() {
            return Err(ChurnError::ModelNotFitted);
        }

        let all_predictions: Result<Vec<Array1<f64>>> =
            self.trees.par_iter().map(|tree| tree.predict(x)).collect();
        let all_predictions = all_predictions?;

        let n_trees = all_predictions.len() as f64;
        let probabilities: Vec<f64> = (0..x.nrows())
            .map(|row| {
                let votes = all_predictions
                    .iter()
                    .filter(|preds| preds[row] > 0.5)
                    .count();
                votes as f64 / n_trees
            })
            .collect();
        Ok(Array1::from_vec(probabilities))
    }

    /// Discrete class labels: probability above 0.5 means churn.
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let probabilities = self.predict_probability(x)?;
        Ok(probabilities.mapv(|p| if p > 0.5 { 1.0 } else { 0.0 }))
    }

    /// Averaged split-gain importances, normalized to sum to 1.
    pub fn feature_importances(&self) -> Option<&[f64]> {
        self.feature_importances.as_deref()
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn separable_data() -> (Array2<f64>, Array1<f64>) {
        let x = Array2::from_shape_fn((20, 2), |(i, j)| {
            if i < 10 {
                (i + j) as f64 * 0.1
            } else {
                10.0 + (i + j) as f64 * 0.1
            }
        });
        let y = Array1::from_shape_fn(20, |i| if i < 10 { 0.0 } else { 1.0 });
        (x, y)
    }

    #[test]
    fn test_classifier_learns_separable_data() {
        let (x, y) = separable_data();
        let mut forest = RandomForestClassifier::new(20).with_seed(42);
        forest.fit(&x, &y).unwrap();

        let predictions = forest.predict(&x).unwrap();
        let correct = predictions
            .iter()
            .zip(y.iter())
            .filter(|(p, t)| (*p - *t).abs() < 0.5)
            .count();
        assert!(correct >= 18, "only {} of 20 correct", correct);
    }

    #[test]
    fn test_probabilities_in_unit_interval() {
        let (x, y) = separable_data();
        let mut forest = RandomForestClassifier::new(10).with_seed(1);
        forest.fit(&x, &y).unwrap();

        for p in forest.predict_probability(&x).unwrap() {
            assert!((0.0..=1.0).contains(&p));
        }
    }

    #[test]
    fn test_same_seed_same_forest() {
        let (x, y) = separable_data();
        let mut a = RandomForestClassifier::new(10).with_seed(7);
        let mut b = RandomForestClassifier::new(10).with_seed(7);
        a.fit(&x, &y).unwrap();
        b.fit(&x, &y).unwrap();

        assert_eq!(
            serde_json::to_string(&a).unwrap(),
            serde_json::to_string(&b).unwrap()
        );
    }

    #[test]
    fn test_importances_normalized() {
        let (x, y) = separable_data();
        let mut forest = RandomForestClassifier::new(10).with_seed(3);
        forest.fit(&x, &y).unwrap();

        let importances = forest.feature_importances().unwrap();
        assert_eq!(importances.len(), 2);
        assert!((importances.iter().sum::<f64>() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_constant_feature_importances_degrade() {
        let x = array![[5.0], [5.0], [5.0], [5.0]];
        let y = array![0.0, 1.0, 0.0, 1.0];
        let mut forest = RandomForestClassifier::new(5).with_seed(9);
        forest.fit(&x, &y).unwrap();
        // No split gain anywhere: native importances unavailable, not an error
        assert!(forest.feature_importances().is_none());
    }

    #[test]
    fn test_progress_reports_every_tree() {
        let (x, y) = separable_data();
        let count = AtomicUsize::new(0);
        let report = |_done: usize, _total: usize| {
            count.fetch_add(1, Ordering::Relaxed);
        };
        let mut forest = RandomForestClassifier::new(8).with_seed(5);
        forest.fit_with_progress(&x, &y, Some(&report)).unwrap();
        assert_eq!(count.load(Ordering::Relaxed), 8);
    }

    #[test]
    fn test_unfitted_errors() {
        let forest = RandomForestClassifier::new(5);
        let x = array![[1.0, 2.0]];
        assert!(matches!(
            forest.predict(&x),
            Err(ChurnError::ModelNotFitted)
        ));
    }
}
