//! Training engine
//!
//! Drives one full training run: preprocess, split, fit, evaluate, attribute
//! importance, serialize. The outcome carries everything the caller needs to
//! build and store a model artifact; nothing is persisted here.

use super::classifier::{Algorithm, Classifier};
use super::config::TrainingConfig;
use super::gradient_boosting::GbdtClassifier;
use super::random_forest::RandomForestClassifier;
use crate::dataset::Dataset;
use crate::error::Result;
use crate::evaluation::{evaluate, ModelMetrics};
use crate::importance::{normalize_importance, uniform_importance, PermutationImportance};
use crate::preprocessing::{preprocess, train_test_split, EncodingMap, Split};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{info, warn};

/// Coarse checkpoints emitted while a training run progresses. Advisory
/// only; dropping them changes nothing about the result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum TrainingPhase {
    Preprocessing,
    Splitting,
    Training {
        trees_done: usize,
        trees_total: usize,
    },
    Evaluating,
}

/// Everything a completed training run produces.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainingOutcome {
    /// Algorithm that actually produced the model (fallbacks are recorded,
    /// never silently relabeled)
    pub algorithm: Algorithm,
    pub target_variable: String,
    pub features: Vec<String>,
    pub metrics: ModelMetrics,
    pub feature_importance: BTreeMap<String, f64>,
    pub encoding_map: EncodingMap,
    /// Serialized model, opaque to callers
    pub model_json: String,
    pub n_train_rows: usize,
    pub n_test_rows: usize,
}

/// Training engine: owns a configuration, trains against datasets.
#[derive(Debug, Clone)]
pub struct TrainEngine {
    config: TrainingConfig,
}

impl TrainEngine {
    pub fn new(config: TrainingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    /// Run a full training pass over the dataset.
    pub fn train(&self, dataset: &Dataset) -> Result<TrainingOutcome> {
        self.train_with_progress(dataset, |_| {})
    }

    /// Run a full training pass, reporting [`TrainingPhase`] checkpoints.
    pub fn train_with_progress<F>(&self, dataset: &Dataset, progress: F) -> Result<TrainingOutcome>
    where
        F: Fn(TrainingPhase) + Sync,
    {
        self.config.validate()?;

        progress(TrainingPhase::Preprocessing);
        let prepared = preprocess(
            dataset,
            &self.config.target_variable,
            &self.config.features,
        )?;

        progress(TrainingPhase::Splitting);
        let split = train_test_split(
            &prepared.x,
            &prepared.y,
            self.config.test_fraction,
            self.config.seed,
        );

        // A tiny dataset can shuffle every row into the test half. Training
        // still has to complete, so fall back to fitting on all rows.
        let (x_train, y_train): (&Array2<f64>, &Array1<f64>) = if split.x_train.nrows() == 0 {
            warn!("training split is empty, fitting on the full dataset");
            (&prepared.x, &prepared.y)
        } else {
            (&split.x_train, &split.y_train)
        };

        let model = self.fit_model(x_train, y_train, &progress)?;

        progress(TrainingPhase::Evaluating);
        let probabilities = model.predict_probability(&split.x_test)?;
        let predictions = probabilities.mapv(|p| if p > 0.5 { 1.0 } else { 0.0 });
        let metrics = evaluate(&split.y_test, &predictions, Some(&probabilities));

        let feature_importance = self.attribute_importance(&model, &split)?;
        let model_json = model.to_json()?;

        info!(
            algorithm = %model.algorithm(),
            accuracy = metrics.accuracy,
            n_train = x_train.nrows(),
            n_test = split.x_test.nrows(),
            "training run complete"
        );

        Ok(TrainingOutcome {
            algorithm: model.algorithm(),
            target_variable: self.config.target_variable.clone(),
            features: self.config.features.clone(),
            metrics,
            feature_importance,
            encoding_map: prepared.encoding_map,
            model_json,
            n_train_rows: x_train.nrows(),
            n_test_rows: split.x_test.nrows(),
        })
    }

    /// Fit the configured algorithm, falling back to a random forest when
    /// the preferred path fails. The fallback is logged and the outcome
    /// records the algorithm that actually produced the model.
    fn fit_model<F>(
        &self,
        x_train: &Array2<f64>,
        y_train: &Array1<f64>,
        progress: &F,
    ) -> Result<Classifier>
    where
        F: Fn(TrainingPhase) + Sync,
    {
        let report = |done: usize, total: usize| {
            progress(TrainingPhase::Training {
                trees_done: done,
                trees_total: total,
            })
        };

        let preferred = match self.config.algorithm {
            Algorithm::RandomForest => self.fit_forest(x_train, y_train, &report),
            Algorithm::GradientBoosting => self.fit_gbdt(x_train, y_train, &report),
        };

        match preferred {
            Ok(model) => Ok(model),
            Err(err) if self.config.algorithm != Algorithm::RandomForest => {
                warn!(
                    error = %err,
                    requested = %self.config.algorithm,
                    "preferred algorithm failed, falling back to random forest"
                );
                self.fit_forest(x_train, y_train, &report)
            }
            Err(err) => Err(err),
        }
    }

    fn fit_forest(
        &self,
        x: &Array2<f64>,
        y: &Array1<f64>,
        report: &(dyn Fn(usize, usize) + Sync),
    ) -> Result<Classifier> {
        let mut forest = RandomForestClassifier::new(self.config.n_estimators)
            .with_max_depth(self.config.forest_depth())
            .with_seed(self.config.seed.unwrap_or_else(rand::random));
        forest.fit_with_progress(x, y, Some(report))?;
        Ok(Classifier::RandomForest(forest))
    }

    fn fit_gbdt(
        &self,
        x: &Array2<f64>,
        y: &Array1<f64>,
        report: &(dyn Fn(usize, usize) + Sync),
    ) -> Result<Classifier> {
        let mut model = GbdtClassifier::new(self.config.n_estimators)
            .with_max_depth(self.config.boosting_depth())
            .with_learning_rate(self.config.learning_rate);
        model.fit_with_progress(x, y, Some(report))?;
        Ok(Classifier::GradientBoosting(model))
    }

    /// Importance map keyed exactly by the configured features.
    ///
    /// Forest models use their native split-gain importances; models without
    /// a native path get permutation importance on the held-out split. When
    /// neither signal is available the distribution degrades to uniform.
    fn attribute_importance(
        &self,
        model: &Classifier,
        split: &Split,
    ) -> Result<BTreeMap<String, f64>> {
        let features = &self.config.features;

        if let Some(native) = model.native_importances() {
            if native.len() == features.len() {
                return Ok(normalize_importance(features, native));
            }
        }

        if matches!(model, Classifier::RandomForest(_)) || split.x_test.nrows() == 0 {
            return Ok(uniform_importance(features));
        }

        let raw = PermutationImportance::new()
            .with_seed(self.config.seed.unwrap_or_else(rand::random))
            .with_n_repeats(self.config.importance_repeats)
            .compute(model, &split.x_test, &split.y_test)?;
        Ok(normalize_importance(features, &raw))
    }
}
