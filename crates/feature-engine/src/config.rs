//! Feature derivation configuration

use serde::{Deserialize, Serialize};

/// Thresholds and constants used when deriving features
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureConfig {
    /// Rolling window length in samples (hours)
    pub rolling_window: usize,
    /// Temperature excess over the rolling mean that flags an anomaly
    pub anomaly_margin: f64,
    /// Ideal operating temperature (°C)
    pub ideal_temperature: f64,
    /// Score points lost per °C away from ideal
    pub temperature_penalty: f64,
    /// Score points lost per unit of vibration
    pub vibration_penalty: f64,
    /// Lower clamp bound for scores
    pub score_min: f64,
    /// Upper clamp bound for scores
    pub score_max: f64,
    /// Health score below which a row is high risk
    pub high_risk_cutoff: f64,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            rolling_window: 24,
            anomaly_margin: 5.0,
            ideal_temperature: 22.0,
            temperature_penalty: 2.0,
            vibration_penalty: 10.0,
            score_min: 0.0,
            score_max: 100.0,
            high_risk_cutoff: 70.0,
        }
    }
}
