//! Report configuration

use serde::{Deserialize, Serialize};

/// Illustrative cost figures behind the savings estimate
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BusinessAssumptions {
    /// Fraction of devices expected to fail per year
    pub annual_failure_rate: f64,
    /// Cost of one unplanned failure (USD)
    pub cost_per_failure: u64,
    /// One-off cost of deploying the system (USD)
    pub implementation_cost: u64,
}

impl Default for BusinessAssumptions {
    fn default() -> Self {
        Self {
            annual_failure_rate: 0.1,
            cost_per_failure: 50_000,
            implementation_cost: 100_000,
        }
    }
}

/// Chart and summary settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Trailing rows shown in the device trend chart (one week of hours)
    pub trend_window: usize,
    /// Health score threshold line drawn on the trend chart
    pub risk_threshold: f64,
    /// Bins of the fleet health histogram
    pub histogram_bins: usize,
    /// Devices listed in the worst-devices panel
    pub worst_device_count: usize,
    /// Output image size in pixels
    pub image_width: u32,
    pub image_height: u32,
    pub business: BusinessAssumptions,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            trend_window: 24 * 7,
            risk_threshold: 70.0,
            histogram_bins: 30,
            worst_device_count: 10,
            image_width: 1800,
            image_height: 1200,
            business: BusinessAssumptions::default(),
        }
    }
}
