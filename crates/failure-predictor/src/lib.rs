//! Failure Predictor
//!
//! Scores every engineered reading with a trained classifier, applies the
//! hot-reading override and derives the set of high-risk devices, falling back
//! to simple rules where the model gives nothing usable.

mod agreement;
mod config;
mod predictor;

pub use agreement::{PredictedReading, RiskAgreement};
pub use config::PredictorConfig;
pub use predictor::{FailurePredictor, HighRiskSelection, Prediction, PredictionSet, ProbabilitySource};

use thiserror::Error;

/// Errors during prediction
#[derive(Debug, Error)]
pub enum PredictError {
    #[error("Feature table is empty")]
    EmptyTable,
    #[error("Classifier error: {0}")]
    Classifier(#[from] risk_classifier::ClassifierError),
    #[error("No prediction for reading {0}")]
    KeyMismatch(String),
}
