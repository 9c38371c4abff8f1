//! Per-device sensor trend chart

use crate::chart::{Chart, Range, BLUE, GREEN, PURPLE, RED};
use crate::config::ReportConfig;
use crate::ReportError;
use chrono::NaiveDateTime;
use feature_engine::FeatureTable;
use image::RgbImage;
use telemetry_sim::DeviceId;
use tracing::debug;

/// Trailing window of one device's history
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceTrend {
    pub device_id: DeviceId,
    pub timestamps: Vec<NaiveDateTime>,
    pub temperature: Vec<f64>,
    pub temperature_24h_mean: Vec<f64>,
    pub vibration: Vec<f64>,
    pub health_score: Vec<f64>,
}

impl DeviceTrend {
    /// Last `window` readings of `device_id`
    pub fn from_table(table: &FeatureTable, device_id: DeviceId, window: usize) -> Result<Self, ReportError> {
        let history = table.device_rows(device_id);
        if history.is_empty() {
            return Err(ReportError::UnknownDevice(device_id.to_string()));
        }
        let rows = &history[history.len().saturating_sub(window)..];

        Ok(Self {
            device_id,
            timestamps: rows.iter().map(|r| r.key.timestamp).collect(),
            temperature: rows.iter().map(|r| r.temperature).collect(),
            temperature_24h_mean: rows.iter().map(|r| r.temperature_24h_mean).collect(),
            vibration: rows.iter().map(|r| r.vibration).collect(),
            health_score: rows.iter().map(|r| r.health_score).collect(),
        })
    }

    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    /// Hours since the first timestamp of the window
    fn offsets(&self) -> Vec<f64> {
        let Some(&first) = self.timestamps.first() else {
            return Vec::new();
        };
        self.timestamps
            .iter()
            .map(|t| (*t - first).num_minutes() as f64 / 60.0)
            .collect()
    }
}

fn points(xs: &[f64], ys: &[f64]) -> Vec<(f64, f64)> {
    xs.iter().copied().zip(ys.iter().copied()).collect()
}

/// Three stacked panels: temperature with its rolling mean, vibration, and
/// health score against the risk threshold
pub fn render_sensor_trends(trend: &DeviceTrend, config: &ReportConfig) -> RgbImage {
    let mut chart = Chart::new(config.image_width, config.image_height);
    let cells = chart.grid(3, 1, 0);
    let xs = trend.offsets();
    let x_range = Range::padded(xs.iter().copied());

    let temperature = chart.panel(
        cells[0],
        x_range,
        Range::padded(trend.temperature.iter().chain(&trend.temperature_24h_mean).copied()),
        &format!("Device {} - Sensor Readings", trend.device_id),
        "",
        "Temperature (C)",
    );
    chart.line(&temperature, &points(&xs, &trend.temperature), BLUE);
    chart.dashed_line(&temperature, &points(&xs, &trend.temperature_24h_mean), RED);

    let vibration = chart.panel(
        cells[1],
        x_range,
        Range::padded(trend.vibration.iter().copied()),
        "",
        "",
        "Vibration",
    );
    chart.line(&vibration, &points(&xs, &trend.vibration), GREEN);

    let health_range = Range::padded(trend.health_score.iter().copied()).including(config.risk_threshold);
    let health = chart.panel(cells[2], x_range, health_range, "", "Time", "Health Score");
    chart.line(&health, &points(&xs, &trend.health_score), PURPLE);
    chart.dashed_hline(&health, config.risk_threshold, RED);
    chart.legend(&health, 0, "Risk Threshold", RED);

    if let (Some(first), Some(last)) = (trend.timestamps.first(), trend.timestamps.last()) {
        let span = xs.last().copied().unwrap_or(0.0);
        for panel in [&temperature, &vibration, &health] {
            chart.x_tick(panel, 0.0, &first.format("%m-%d %H:%M").to_string());
            chart.x_tick(panel, span, &last.format("%m-%d %H:%M").to_string());
        }
    }

    debug!("Rendered trend chart for {} ({} readings)", trend.device_id, trend.len());
    chart.into_image()
}

#[cfg(test)]
mod tests {
    use super::*;
    use feature_engine::FeatureDeriver;
    use telemetry_sim::{SimulationConfig, TelemetrySynthesizer};

    fn table(devices: u32, hours: u32) -> FeatureTable {
        let fleet = TelemetrySynthesizer::new(SimulationConfig::small(devices, hours))
            .unwrap()
            .generate();
        FeatureDeriver::default().derive(&fleet.readings).unwrap()
    }

    #[test]
    fn test_trailing_window() {
        let table = table(3, 200);
        let trend = DeviceTrend::from_table(&table, DeviceId(1), 168).unwrap();

        assert_eq!(trend.len(), 168);
        let history = table.device_rows(DeviceId(1));
        assert_eq!(trend.timestamps.first(), Some(&history[32].key.timestamp));
        assert_eq!(trend.timestamps.last(), Some(&history[199].key.timestamp));
        assert_eq!(trend.health_score[0], history[32].health_score);
    }

    #[test]
    fn test_short_history_shows_everything() {
        let table = table(2, 50);
        let trend = DeviceTrend::from_table(&table, DeviceId(0), 168).unwrap();
        assert_eq!(trend.len(), 50);
    }

    #[test]
    fn test_unknown_device() {
        let table = table(2, 10);
        assert!(matches!(
            DeviceTrend::from_table(&table, DeviceId(99), 168),
            Err(ReportError::UnknownDevice(id)) if id == "DEV0099"
        ));
    }

    #[test]
    fn test_render_dimensions() {
        let table = table(1, 72);
        let trend = DeviceTrend::from_table(&table, DeviceId(0), 168).unwrap();
        let config = ReportConfig {
            image_width: 900,
            image_height: 900,
            ..ReportConfig::default()
        };
        let image = render_sensor_trends(&trend, &config);
        assert_eq!(image.dimensions(), (900, 900));
        assert!(image.pixels().any(|p| *p == PURPLE));
    }
}
