//! Predictor configuration

use serde::{Deserialize, Serialize};

/// Override and selection thresholds
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PredictorConfig {
    /// Temperature quantile above which a reading is forced to `override_probability`
    pub override_quantile: f64,
    /// Probability assigned to readings above the quantile
    pub override_probability: f64,
    /// Probability above which a device is high risk
    pub probability_cutoff: f64,
    /// Devices reported by the hottest-reading fallback
    pub fallback_device_count: usize,
}

impl Default for PredictorConfig {
    fn default() -> Self {
        Self {
            override_quantile: 0.95,
            override_probability: 0.8,
            probability_cutoff: 0.7,
            fallback_device_count: 10,
        }
    }
}
