//! Gradient-boosted decision trees for binary classification
//!
//! Additive boosting in log-odds space: starting from the class-balance
//! log-odds bias, each round fits a regression tree to the logistic
//! residual and adds its shrunken prediction to the running score. The
//! sigmoid of the final score is the churn probability.

use super::decision_tree::DecisionTree;
use super::random_forest::TreeProgress;
use crate::error::{ChurnError, Result};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

/// Gradient boosting binary classifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GbdtClassifier {
    trees: Vec<DecisionTree>,
    initial_prediction: f64,
    pub learning_rate: f64,
    pub n_estimators: usize,
    pub max_depth: usize,
    n_features: usize,
}

pub(crate) fn sigmoid(score: f64) -> f64 {
    1.0 / (1.0 + (-score).exp())
}

impl Default for GbdtClassifier {
    fn default() -> Self {
        Self::new(50)
    }
}

impl GbdtClassifier {
    pub fn new(n_estimators: usize) -> Self {
        Self {
            trees: Vec::new(),
            initial_prediction: 0.0,
            learning_rate: 0.1,
            n_estimators,
            max_depth: 5,
            n_features: 0,
        }
    }

    pub fn with_learning_rate(mut self, learning_rate: f64) -> Self {
        self.learning_rate = learning_rate;
        self
    }

    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    /// Fit the boosted ensemble to training data.
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<&mut Self> {
        self.fit_with_progress(x, y, None)
    }

    /// Fit, reporting each completed boosting round through `progress`.
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
                "cannot fit a boosted ensemble on an empty training split".to_string(),
            ));
        }

        self.n_features = x.ncols();
        self.trees = Vec::with_capacity(self.n_estimators);

        // Log-odds bias from the class balance, counts floored at one so a
        // single-class target stays finite.
        let positives = y.iter().filter(|&&v| v > 0.5).count();
        let negatives = n_samples - positives;
        self.initial_prediction =
            ((positives.max(1) as f64) / (negatives.max(1) as f64)).ln();

        let mut scores = vec![self.initial_prediction; n_samples];

        for round in 0..self.n_estimators {
            let residuals: Array1<f64> = y
                .iter()
                .zip(scores.iter())
                .map(|(&label, &score)| label - sigmoid(score))
                .collect();

            let mut tree = DecisionTree::new_regressor(self.max_depth);
            tree.fit(x, &residuals)?;

            let tree_predictions = tree.predict(x)?;
            for (score, update) in scores.iter_mut().zip(tree_predictions.iter()) {
                *score += self.learning_rate * update;
            }
            self.trees.push(tree);

            if let Some(report) = progress {
                report(round + 1, self.n_estimators);
            }
        }

        Ok(self)
    }

    fn raw_scores(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        if self.trees.is_empty() {
            return Err(ChurnError::ModelNotFitted);
        }
        let mut scores = Array1::from_elem(x.nrows(), self.initial_prediction);
        for tree in &self.trees {
            let tree_predictions = tree.predict(x)?;
            scores
                .iter_mut()
                .zip(tree_predictions.iter())
                .for_each(|(score, update)| *score += self.learning_rate * update);
        }
        Ok(scores)
    }

    /// Churn probability per row: sigmoid of the summed log-odds score.
    pub fn predict_probability(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        Ok(self.raw_scores(x)?.mapv(sigmoid))
    }

    /// Discrete class labels: probability above 0.5 means churn.
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        Ok(self
            .predict_probability(x)?
            .mapv(|p| if p > 0.5 { 1.0 } else { 0.0 }))
    }

    pub fn initial_prediction(&self) -> f64 {
        self.initial_prediction
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }
}
