//! Model evaluation
//!
//! Confusion matrix and derived metrics computed once on the held-out split
//! and snapshotted into the model artifact. Every ratio guards its
//! denominator and falls back to 0, so degenerate splits evaluate cleanly
//! instead of throwing.

use ndarray::Array1;
use serde::{Deserialize, Serialize};

/// 2x2 confusion matrix for the binary churn label.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfusionMatrix {
    pub true_positive: usize,
    pub true_negative: usize,
    pub false_positive: usize,
    pub false_negative: usize,
}

impl ConfusionMatrix {
    /// Tally predictions against true labels.
    pub fn from_predictions(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> Self {
        let mut matrix = Self::default();
        for (&truth, &pred) in y_true.iter().zip(y_pred.iter()) {
            match (truth > 0.5, pred > 0.5) {
                (true, true) => matrix.true_positive += 1,
                (false, false) => matrix.true_negative += 1,
                (false, true) => matrix.false_positive += 1,
                (true, false) => matrix.false_negative += 1,
            }
        }
        matrix
    }

    /// Total number of evaluated rows.
    pub fn total(&self) -> usize {
        self.true_positive + self.true_negative + self.false_positive + self.false_negative
    }
}

/// Performance snapshot captured at training time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelMetrics {
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub roc_auc: f64,
    pub confusion_matrix: ConfusionMatrix,
}

fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator > 0.0 {
        numerator / denominator
    } else {
        0.0
    }
}

/// Exact ROC-AUC by pairwise rank comparison: for every (positive, negative)
/// pair, score 1 when the positive outranks the negative, 0.5 on ties.
/// Mathematically identical to the trapezoidal ROC integral.
fn pairwise_auc(y_true: &Array1<f64>, probabilities: &Array1<f64>) -> f64 {
    let mut positives = Vec::new();
    let mut negatives = Vec::new();
    for (&truth, &p) in y_true.iter().zip(probabilities.iter()) {
        if truth > 0.5 {
            positives.push(p);
        } else {
            negatives.push(p);
        }
    }

    let pairs = positives.len() * negatives.len();
    if pairs == 0 {
        return 0.0;
    }

    let mut ranked = 0.0;
    for &p in &positives {
        for &q in &negatives {
            if p > q {
                ranked += 1.0;
            } else if p == q {
                ranked += 0.5;
            }
        }
    }
    ranked / pairs as f64
}

/// Evaluate predictions against true labels.
///
/// When class probabilities are available ROC-AUC uses the exact pairwise
/// statistic; otherwise it falls back to the `(1 + recall - fpr) / 2`
/// approximation from the discrete confusion matrix.
pub fn evaluate(
    y_true: &Array1<f64>,
    y_pred: &Array1<f64>,
    probabilities: Option<&Array1<f64>>,
) -> ModelMetrics {
    let matrix = ConfusionMatrix::from_predictions(y_true, y_pred);
    let tp = matrix.true_positive as f64;
    let tn = matrix.true_negative as f64;
    let fp = matrix.false_positive as f64;
    let fn_ = matrix.false_negative as f64;

    let accuracy = ratio(tp + tn, matrix.total() as f64);
    let precision = ratio(tp, tp + fp);
    let recall = ratio(tp, tp + fn_);
    let f1 = ratio(2.0 * precision * recall, precision + recall);

    let roc_auc = match probabilities {
        Some(probs) => pairwise_auc(y_true, probs),
        None => {
            if matrix.total() == 0 {
                0.0
            } else {
                let fpr = ratio(fp, fp + tn);
                (1.0 + recall - fpr) / 2.0
            }
        }
    };

    ModelMetrics {
        accuracy,
        precision,
        recall,
        f1,
        roc_auc,
        confusion_matrix: matrix,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_confusion_matrix_counts() {
        let y_true = array![1.0, 1.0, 0.0, 0.0, 1.0];
        let y_pred = array![1.0, 0.0, 0.0, 1.0, 1.0];
        let m = ConfusionMatrix::from_predictions(&y_true, &y_pred);
        assert_eq!(m.true_positive, 2);
        assert_eq!(m.true_negative, 1);
        assert_eq!(m.false_positive, 1);
        assert_eq!(m.false_negative, 1);
        assert_eq!(m.total(), 5);
    }

    #[test]
    fn test_derived_metrics() {
        let y_true = array![1.0, 1.0, 0.0, 0.0];
        let y_pred = array![1.0, 0.0, 0.0, 0.0];
        let metrics = evaluate(&y_true, &y_pred, None);
        assert_eq!(metrics.accuracy, 0.75);
        assert_eq!(metrics.precision, 1.0);
        assert_eq!(metrics.recall, 0.5);
        assert!((metrics.f1 - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_empty_split_all_zeros() {
        let empty = array![];
        let metrics = evaluate(&empty, &empty, None);
        assert_eq!(metrics.accuracy, 0.0);
        assert_eq!(metrics.precision, 0.0);
        assert_eq!(metrics.recall, 0.0);
        assert_eq!(metrics.f1, 0.0);
        assert_eq!(metrics.roc_auc, 0.0);
        assert_eq!(metrics.confusion_matrix.total(), 0);
    }

    #[test]
    fn test_pairwise_auc_perfect_ranking() {
        let y_true = array![0.0, 0.0, 1.0, 1.0];
        let probs = array![0.1, 0.2, 0.8, 0.9];
        let metrics = evaluate(&y_true, &y_true, Some(&probs));
        assert_eq!(metrics.roc_auc, 1.0);
    }

    #[test]
    fn test_pairwise_auc_ties_count_half() {
        let y_true = array![0.0, 1.0];
        let probs = array![0.5, 0.5];
        let metrics = evaluate(&y_true, &y_true, Some(&probs));
        assert_eq!(metrics.roc_auc, 0.5);
    }

    #[test]
    fn test_pairwise_auc_single_class_is_zero() {
        let y_true = array![1.0, 1.0];
        let probs = array![0.6, 0.7];
        let metrics = evaluate(&y_true, &y_true, Some(&probs));
        assert_eq!(metrics.roc_auc, 0.0);
    }

    #[test]
    fn test_fallback_auc_from_confusion_matrix() {
        let y_true = array![1.0, 1.0, 0.0, 0.0];
        let y_pred = array![1.0, 1.0, 0.0, 0.0];
        let metrics = evaluate(&y_true, &y_pred, None);
        // recall 1, fpr 0 => (1 + 1 - 0) / 2
        assert_eq!(metrics.roc_auc, 1.0);
    }

    #[test]
    fn test_metric_bounds() {
        let y_true = array![1.0, 0.0, 1.0, 0.0, 1.0];
        let y_pred = array![0.0, 1.0, 1.0, 0.0, 0.0];
        let probs = array![0.3, 0.6, 0.7, 0.2, 0.4];
        let metrics = evaluate(&y_true, &y_pred, Some(&probs));
        for value in [
            metrics.accuracy,
            metrics.precision,
            metrics.recall,
            metrics.f1,
            metrics.roc_auc,
        ] {
            assert!((0.0..=1.0).contains(&value));
        }
    }

    #[test]
    fn test_camel_case_contract() {
        let metrics = ModelMetrics::default();
        let json = serde_json::to_value(&metrics).unwrap();
        assert!(json.get("rocAuc").is_some());
        assert!(json["confusionMatrix"].get("truePositive").is_some());
    }
}
