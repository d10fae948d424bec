//! Integration test: training pipeline end-to-end

use churnguard_core::dataset::{Dataset, Row};
use churnguard_core::error::ChurnError;
use churnguard_core::training::{Algorithm, Classifier, TrainEngine, TrainingConfig};
use ndarray::Array2;
use serde_json::json;

/// 100 customers: numeric `age` uniform over 18-80, categorical `plan`,
/// churn iff age > 60.
fn churn_dataset() -> Dataset {
    let headers = vec!["age".to_string(), "plan".to_string(), "churn".to_string()];
    let rows: Vec<Row> = (0..100)
        .map(|i| {
            let age = 18 + (i * 62) / 99;
            let mut row = Row::new();
            row.insert("age".to_string(), json!(age));
            row.insert(
                "plan".to_string(),
                json!(if i % 2 == 0 { "basic" } else { "pro" }),
            );
            row.insert("churn".to_string(), json!(if age > 60 { 1 } else { 0 }));
            row
        })
        .collect();
    Dataset::new(headers, rows).unwrap()
}

fn base_config() -> TrainingConfig {
    TrainingConfig::new("churn", vec!["age".to_string(), "plan".to_string()]).with_seed(42)
}

#[test]
fn test_random_forest_learns_age_threshold() {
    let outcome = TrainEngine::new(base_config())
        .train(&churn_dataset())
        .unwrap();

    assert_eq!(outcome.algorithm, Algorithm::RandomForest);
    assert!(
        outcome.metrics.accuracy >= 0.85,
        "accuracy {} below 0.85",
        outcome.metrics.accuracy
    );
}

#[test]
fn test_gradient_boosting_learns_age_threshold() {
    let outcome = TrainEngine::new(base_config().with_algorithm(Algorithm::GradientBoosting))
        .train(&churn_dataset())
        .unwrap();

    assert_eq!(outcome.algorithm, Algorithm::GradientBoosting);
    assert!(
        outcome.metrics.accuracy >= 0.85,
        "accuracy {} below 0.85",
        outcome.metrics.accuracy
    );
}

#[test]
fn test_metric_bounds_and_conservation() {
    for algorithm in [Algorithm::RandomForest, Algorithm::GradientBoosting] {
        let outcome = TrainEngine::new(base_config().with_algorithm(algorithm))
            .train(&churn_dataset())
            .unwrap();
        let m = &outcome.metrics;
        for value in [m.accuracy, m.precision, m.recall, m.f1, m.roc_auc] {
            assert!((0.0..=1.0).contains(&value), "metric {} out of range", value);
        }
        assert_eq!(m.confusion_matrix.total(), outcome.n_test_rows);
    }
}

#[test]
fn test_importance_keys_match_features_and_sum_to_one() {
    for algorithm in [Algorithm::RandomForest, Algorithm::GradientBoosting] {
        let outcome = TrainEngine::new(base_config().with_algorithm(algorithm))
            .train(&churn_dataset())
            .unwrap();

        let keys: Vec<&String> = outcome.feature_importance.keys().collect();
        assert_eq!(keys, vec!["age", "plan"], "{:?} keys mismatch", algorithm);

        let sum: f64 = outcome.feature_importance.values().sum();
        assert!(
            (sum - 1.0).abs() < 1e-6,
            "{:?} importance sums to {}",
            algorithm,
            sum
        );
    }
}

#[test]
fn test_seeded_training_reproduces_serialized_model() {
    let engine = TrainEngine::new(base_config());
    let a = engine.train(&churn_dataset()).unwrap();
    let b = engine.train(&churn_dataset()).unwrap();

    assert_eq!(a.model_json, b.model_json);
    assert_eq!(a.metrics, b.metrics);
    assert_eq!(a.feature_importance, b.feature_importance);
    assert_eq!(a.encoding_map, b.encoding_map);
}

#[test]
fn test_constant_feature_degrades_gracefully() {
    let headers = vec!["x".to_string(), "churn".to_string()];
    let rows: Vec<Row> = (0..30)
        .map(|i| {
            let mut row = Row::new();
            row.insert("x".to_string(), json!(5));
            row.insert("churn".to_string(), json!(i % 2));
            row
        })
        .collect();
    let dataset = Dataset::new(headers, rows).unwrap();

    let outcome = TrainEngine::new(
        TrainingConfig::new("churn", vec!["x".to_string()]).with_seed(42),
    )
    .train(&dataset)
    .unwrap();

    let importance = outcome.feature_importance["x"];
    assert!(importance == 0.0 || importance == 1.0);
    assert!(!importance.is_nan());

    // A constant input must yield a constant prediction
    let model = Classifier::from_json(&outcome.model_json).unwrap();
    let x = Array2::from_elem((5, 1), 5.0);
    let predictions = model.predict(&x).unwrap();
    assert!(predictions.iter().all(|&p| p == predictions[0]));
}

#[test]
fn test_zero_test_fraction_returns_zero_metrics() {
    let outcome = TrainEngine::new(base_config().with_test_fraction(0.0))
        .train(&churn_dataset())
        .unwrap();
    assert_eq!(outcome.n_test_rows, 0);
    assert_eq!(outcome.metrics.accuracy, 0.0);
    assert_eq!(outcome.metrics.confusion_matrix.total(), 0);
}

#[test]
fn test_single_row_dataset_trains_without_error() {
    let headers = vec!["age".to_string(), "plan".to_string(), "churn".to_string()];
    let mut row = Row::new();
    row.insert("age".to_string(), json!(44));
    row.insert("plan".to_string(), json!("basic"));
    row.insert("churn".to_string(), json!(1));
    let dataset = Dataset::new(headers, vec![row]).unwrap();

    let outcome = TrainEngine::new(base_config()).train(&dataset).unwrap();
    assert_eq!(outcome.n_train_rows, 1);
}

#[test]
fn test_configuration_errors_reject_before_compute() {
    let dataset = churn_dataset();

    let no_features = TrainingConfig::new("churn", Vec::new());
    assert!(matches!(
        TrainEngine::new(no_features).train(&dataset),
        Err(ChurnError::ConfigError(_))
    ));

    let missing_column =
        TrainingConfig::new("churn", vec!["tenure".to_string()]).with_seed(42);
    assert!(matches!(
        TrainEngine::new(missing_column).train(&dataset),
        Err(ChurnError::FeatureNotFound(_))
    ));
}

#[test]
fn test_empty_dataset_rejected() {
    let dataset = Dataset::new(
        vec!["age".to_string(), "plan".to_string(), "churn".to_string()],
        Vec::new(),
    )
    .unwrap();
    assert!(matches!(
        TrainEngine::new(base_config()).train(&dataset),
        Err(ChurnError::DataError(_))
    ));
}

#[test]
fn test_training_job_reports_progress_and_result() {
    use churnguard_core::worker::{JobEvent, TrainingJob};

    let handle = TrainingJob::spawn(base_config(), churn_dataset());
    let mut saw_progress = false;
    let mut outcome = None;
    for event in handle.events().iter() {
        match event {
            JobEvent::Progress(_) => saw_progress = true,
            JobEvent::Completed(done) => {
                outcome = Some(*done);
                break;
            }
            JobEvent::Failed(message) => panic!("job failed: {}", message),
        }
    }
    assert!(saw_progress);
    assert!(outcome.unwrap().metrics.accuracy >= 0.85);
}
