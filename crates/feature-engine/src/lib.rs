//! Feature Engineering Engine
//!
//! Derives rolling statistics, anomaly flags, health scores and model inputs
//! from raw telemetry, one device history at a time.

mod columns;
mod config;
mod features;
mod statistics;
mod table;

pub use columns::{FeatureColumn, DEFAULT_MODEL_COLUMNS};
pub use config::FeatureConfig;
pub use features::{score_health, EngineeredReading, FeatureDeriver, HealthScore};
pub use statistics::{mean, quantile, SummaryStats};
pub use table::FeatureTable;

use thiserror::Error;

/// Errors during feature derivation
#[derive(Debug, Error)]
pub enum FeatureError {
    #[error("Invalid rolling window: {0}")]
    InvalidWindow(#[from] ring_buffer::BufferError),
    #[error("Serialization error: {0}")]
    Serialization(String),
}
