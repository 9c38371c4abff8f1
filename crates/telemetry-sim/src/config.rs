//! Simulation configuration

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Wear applied to the first slice of the fleet late in the horizon
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DegradationConfig {
    /// Share of devices (by creation order) that degrade
    pub device_fraction: f64,
    /// Hour after which degradation starts (strictly greater)
    pub start_hour: u32,
    /// Hours for the degradation term to grow by one unit
    pub hours_per_unit: f64,
    /// Temperature added per degradation unit
    pub temperature_gain: f64,
    /// Vibration added per degradation unit
    pub vibration_gain: f64,
}

impl Default for DegradationConfig {
    fn default() -> Self {
        Self {
            device_fraction: 0.1,
            start_hour: 1800,
            hours_per_unit: 500.0,
            temperature_gain: 5.0,
            vibration_gain: 2.0,
        }
    }
}

/// Telemetry synthesizer configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Number of devices in the fleet
    pub device_count: u32,
    /// Number of hourly samples per device (90 days by default)
    pub horizon_hours: u32,
    /// RNG seed
    pub seed: u64,
    /// Timestamp of the sample *after* the last one. `None` means "now".
    pub reference_time: Option<NaiveDateTime>,
    /// Amplitude of the 24h temperature cycle
    pub daily_amplitude: f64,
    /// Amplitude of the 168h temperature cycle
    pub weekly_amplitude: f64,
    /// Std dev of temperature noise
    pub temperature_noise_sd: f64,
    /// Std dev of vibration noise
    pub vibration_noise_sd: f64,
    /// Mean pressure
    pub pressure_center: f64,
    /// Std dev of pressure noise
    pub pressure_noise_sd: f64,
    /// Wear injection
    pub degradation: DegradationConfig,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            device_count: 500,
            horizon_hours: 90 * 24,
            seed: 42,
            reference_time: None,
            daily_amplitude: 2.0,
            weekly_amplitude: 1.0,
            temperature_noise_sd: 1.0,
            vibration_noise_sd: 0.3,
            pressure_center: 100.0,
            pressure_noise_sd: 10.0,
            degradation: DegradationConfig::default(),
        }
    }
}

impl SimulationConfig {
    /// Small fleet for quick runs and tests
    pub fn small(device_count: u32, horizon_hours: u32) -> Self {
        Self {
            device_count,
            horizon_hours,
            ..Default::default()
        }
    }

    /// Number of leading devices that receive the degradation term
    pub fn degrading_device_count(&self) -> u32 {
        // `i < n * fraction` for integer i
        (f64::from(self.device_count) * self.degradation.device_fraction).ceil() as u32
    }
}
