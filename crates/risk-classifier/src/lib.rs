//! Risk Classifier
//!
//! Trains a random forest on engineered telemetry to predict the high-risk
//! label, evaluates it on a stratified hold-out set and ranks features.

mod binning;
mod classifier;
mod config;
mod dataset;
mod forest;
mod metrics;
mod training;
mod tree;

pub use classifier::{Capability, Classifier, ProbabilisticClassifier};
pub use config::{ForestConfig, MaxFeatures, SynthesisConfig, TrainingConfig};
pub use dataset::{DatasetSplit, LabeledDataset, RowOrigin, SynthesisReport};
pub use forest::RandomForest;
pub use metrics::{rank_importances, ClassificationMetrics, ConfusionMatrix, FeatureImportance};
pub use training::{train_risk_model, TrainedModel};
pub use tree::DecisionTree;

use thiserror::Error;

/// Errors during training or inference
#[derive(Debug, Error)]
pub enum ClassifierError {
    #[error("Dataset is empty")]
    EmptyDataset,
    #[error("Invalid input shape: expected {expected}, got {actual}")]
    InvalidInputShape { expected: String, actual: String },
    #[error("Model is not fitted")]
    NotFitted,
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("Inference failed: {0}")]
    InferenceFailed(String),
}
