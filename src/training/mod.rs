//! Model training module
//!
//! Two interchangeable algorithms behind one tagged union:
//! - Random forest (bagged gini trees, probability by vote fraction)
//! - Gradient-boosted decision trees (log-odds boosting on logistic
//!   residuals)
//!
//! [`TrainEngine`] runs the full pipeline and produces the boundary
//! contract consumed by callers and the model registry.

mod classifier;
mod config;
mod engine;
pub mod decision_tree;
pub mod gradient_boosting;
pub mod random_forest;

pub use classifier::{Algorithm, Classifier};
pub use config::TrainingConfig;
pub use decision_tree::{DecisionTree, SplitCriterion, TreeNode};
pub use engine::{TrainEngine, TrainingOutcome, TrainingPhase};
pub use gradient_boosting::GbdtClassifier;
pub use random_forest::{RandomForestClassifier, TreeProgress};
