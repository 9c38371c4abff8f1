//! Engineered Reading Assembly

use crate::config::FeatureConfig;
use crate::table::FeatureTable;
use crate::FeatureError;
use chrono::{Datelike, Timelike};
use ring_buffer::RollingWindow;
use serde::{Deserialize, Serialize};
use telemetry_sim::{DeviceId, EquipmentType, Reading, ReadingKey};
use tracing::{debug, info};

/// Number of derived columns added on top of a raw reading
pub const DERIVED_FEATURE_COUNT: usize = 12;

/// Columns carried over from the raw reading
const RAW_COLUMN_COUNT: usize = 7;

/// A reading augmented with rolling, scoring and calendar features
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineeredReading {
    pub key: ReadingKey,
    pub equipment_type: EquipmentType,
    pub temperature: f64,
    pub vibration: f64,
    pub pressure: f64,
    pub usage_hours: u32,

    /// Trailing mean of temperature over the rolling window
    pub temperature_24h_mean: f64,
    /// Trailing mean of vibration over the rolling window
    pub vibration_24h_mean: f64,
    /// Difference from the previous sample, absent on the first one
    pub temperature_change: Option<f64>,
    pub vibration_change: Option<f64>,
    /// 1 when temperature exceeds its rolling mean by the anomaly margin
    pub temp_anomaly: u8,

    pub temp_score: f64,
    pub vib_score: f64,
    pub health_score: f64,
    /// 1 when the health score is below the cutoff
    pub high_risk: u8,

    pub temp_x_vib: f64,
    /// Hour of day (0-23)
    pub hour: u32,
    /// Day of week, Monday = 0
    pub day_of_week: u32,
}

impl EngineeredReading {
    pub fn device_id(&self) -> DeviceId {
        self.key.device_id
    }

    pub fn is_high_risk(&self) -> bool {
        self.high_risk == 1
    }

    pub fn is_anomaly(&self) -> bool {
        self.temp_anomaly == 1
    }
}

/// Sub-scores and composite health score for one sample
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HealthScore {
    pub temp_score: f64,
    pub vib_score: f64,
    pub health_score: f64,
    pub high_risk: bool,
}

/// Score a temperature/vibration pair.
///
/// Each sub-score is clamped to the configured bounds, so the composite is
/// bounded as well for any finite input.
pub fn score_health(temperature: f64, vibration: f64, config: &FeatureConfig) -> HealthScore {
    let (lo, hi) = (config.score_min, config.score_max);

    let temp_score = (hi - (temperature - config.ideal_temperature).abs() * config.temperature_penalty)
        .clamp(lo, hi);
    let vib_score = (hi - vibration * config.vibration_penalty).clamp(lo, hi);
    let health_score = ((temp_score + vib_score) / 2.0).clamp(lo, hi);

    HealthScore {
        temp_score,
        vib_score,
        health_score,
        high_risk: health_score < config.high_risk_cutoff,
    }
}

/// Per-device state while walking a device's history
struct DeviceCursor {
    device_id: DeviceId,
    temperature: RollingWindow,
    vibration: RollingWindow,
}

impl DeviceCursor {
    fn new(device_id: DeviceId, window: usize) -> Result<Self, FeatureError> {
        Ok(Self {
            device_id,
            temperature: RollingWindow::new(window)?,
            vibration: RollingWindow::new(window)?,
        })
    }

    fn reset(&mut self, device_id: DeviceId) {
        self.device_id = device_id;
        self.temperature.clear();
        self.vibration.clear();
    }
}

/// Derives engineered features from raw readings
pub struct FeatureDeriver {
    config: FeatureConfig,
}

impl FeatureDeriver {
    /// Create a deriver, validating the rolling window length
    pub fn new(config: FeatureConfig) -> Result<Self, FeatureError> {
        RollingWindow::new(config.rolling_window)?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &FeatureConfig {
        &self.config
    }

    /// Derive one engineered row per input reading.
    ///
    /// Rows are ordered by device, then timestamp. Every statistic only looks
    /// at the same device's earlier samples.
    pub fn derive(&self, readings: &[Reading]) -> Result<FeatureTable, FeatureError> {
        info!("Calculating rolling features for {} readings", readings.len());

        let mut ordered: Vec<&Reading> = readings.iter().collect();
        ordered.sort_by_key(|r| r.key);

        let mut rows = Vec::with_capacity(ordered.len());
        let Some(first) = ordered.first() else {
            return Ok(FeatureTable::from_sorted(rows));
        };
        let mut cursor = DeviceCursor::new(first.device_id(), self.config.rolling_window)?;

        for reading in ordered {
            let device_id = reading.device_id();
            if cursor.device_id != device_id {
                cursor.reset(device_id);
            }
            let temperature_change = cursor.temperature.last().map(|prev| reading.temperature - prev);
            let vibration_change = cursor.vibration.last().map(|prev| reading.vibration - prev);

            cursor.temperature.push(reading.temperature);
            cursor.vibration.push(reading.vibration);

            let temperature_24h_mean = cursor.temperature.mean().unwrap_or(reading.temperature);
            let vibration_24h_mean = cursor.vibration.mean().unwrap_or(reading.vibration);

            rows.push(self.assemble(
                reading,
                temperature_24h_mean,
                vibration_24h_mean,
                temperature_change,
                vibration_change,
            ));
        }

        let table = FeatureTable::from_sorted(rows);
        debug!(
            "{} anomalies, {} high-risk rows",
            table.iter().filter(|r| r.is_anomaly()).count(),
            table.iter().filter(|r| r.is_high_risk()).count()
        );
        info!(
            "Total features: {} ({} derived)",
            RAW_COLUMN_COUNT + DERIVED_FEATURE_COUNT,
            DERIVED_FEATURE_COUNT
        );
        Ok(table)
    }

    fn assemble(
        &self,
        reading: &Reading,
        temperature_24h_mean: f64,
        vibration_24h_mean: f64,
        temperature_change: Option<f64>,
        vibration_change: Option<f64>,
    ) -> EngineeredReading {
        let score = score_health(reading.temperature, reading.vibration, &self.config);
        let anomaly = reading.temperature > temperature_24h_mean + self.config.anomaly_margin;
        let timestamp = reading.timestamp();

        EngineeredReading {
            key: reading.key,
            equipment_type: reading.equipment_type,
            temperature: reading.temperature,
            vibration: reading.vibration,
            pressure: reading.pressure,
            usage_hours: reading.usage_hours,
            temperature_24h_mean,
            vibration_24h_mean,
            temperature_change,
            vibration_change,
            temp_anomaly: u8::from(anomaly),
            temp_score: score.temp_score,
            vib_score: score.vib_score,
            health_score: score.health_score,
            high_risk: u8::from(score.high_risk),
            temp_x_vib: reading.temperature * reading.vibration,
            hour: timestamp.hour(),
            day_of_week: timestamp.weekday().num_days_from_monday(),
        }
    }
}

impl Default for FeatureDeriver {
    fn default() -> Self {
        Self {
            config: FeatureConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate, NaiveDateTime};
    use proptest::prelude::*;

    fn start() -> NaiveDateTime {
        // a Monday
        NaiveDate::from_ymd_opt(2024, 1, 1)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .unwrap()
    }

    fn reading(device: u32, hour: i64, temperature: f64, vibration: f64) -> Reading {
        Reading {
            key: ReadingKey {
                device_id: DeviceId(device),
                timestamp: start() + Duration::hours(hour),
            },
            equipment_type: EquipmentType::XRay,
            temperature,
            vibration,
            pressure: 100.0,
            usage_hours: hour as u32,
        }
    }

    #[test]
    fn test_scores_at_ideal() {
        let score = score_health(22.0, 0.0, &FeatureConfig::default());
        assert_eq!(score.temp_score, 100.0);
        assert_eq!(score.vib_score, 100.0);
        assert_eq!(score.health_score, 100.0);
        assert!(!score.high_risk);
    }

    #[test]
    fn test_scores_clamped() {
        let score = score_health(100.0, 15.0, &FeatureConfig::default());
        assert_eq!(score.temp_score, 0.0);
        assert_eq!(score.vib_score, 0.0);
        assert!(score.high_risk);
    }

    #[test]
    fn test_high_risk_cutoff_is_strict() {
        // temp 22 -> 100, vib 4 -> 60, health = 80
        assert!(!score_health(22.0, 4.0, &FeatureConfig::default()).high_risk);
        // temp 37 -> 70, vib 3 -> 70, health = 70 exactly
        let at_cutoff = score_health(37.0, 3.0, &FeatureConfig::default());
        assert!((at_cutoff.health_score - 70.0).abs() < 1e-9);
        assert!(!at_cutoff.high_risk);
    }

    #[test]
    fn test_first_row_has_no_change() {
        let readings = vec![reading(0, 0, 20.0, 1.0), reading(0, 1, 21.5, 1.25)];
        let table = FeatureDeriver::default().derive(&readings).unwrap();

        assert_eq!(table.rows()[0].temperature_change, None);
        assert_eq!(table.rows()[0].vibration_change, None);
        assert_eq!(table.rows()[1].temperature_change, Some(1.5));
        assert_eq!(table.rows()[1].vibration_change, Some(0.25));
    }

    #[test]
    fn test_rolling_mean_partial_then_full() {
        let readings: Vec<_> = (0..30).map(|h| reading(0, h, h as f64, 1.0)).collect();
        let table = FeatureDeriver::default().derive(&readings).unwrap();

        // first three rows average 0,1,2
        assert_eq!(table.rows()[2].temperature_24h_mean, 1.0);
        // row 29 averages 6..=29
        let expected = (6..=29).sum::<i32>() as f64 / 24.0;
        assert!((table.rows()[29].temperature_24h_mean - expected).abs() < 1e-9);
    }

    #[test]
    fn test_windows_do_not_cross_devices() {
        let readings = vec![
            reading(1, 0, 50.0, 1.0),
            reading(0, 0, 20.0, 1.0),
            reading(0, 1, 20.0, 1.0),
            reading(1, 1, 50.0, 1.0),
        ];
        let table = FeatureDeriver::default().derive(&readings).unwrap();

        let rows = table.rows();
        assert_eq!(rows[0].device_id(), DeviceId(0));
        assert_eq!(rows[2].device_id(), DeviceId(1));
        assert_eq!(rows[2].temperature_24h_mean, 50.0);
        assert_eq!(rows[2].temperature_change, None);
    }

    #[test]
    fn test_sorts_out_of_order_input() {
        let readings = vec![reading(0, 2, 22.0, 1.0), reading(0, 0, 20.0, 1.0), reading(0, 1, 21.0, 1.0)];
        let table = FeatureDeriver::default().derive(&readings).unwrap();
        let temps: Vec<_> = table.iter().map(|r| r.temperature).collect();
        assert_eq!(temps, vec![20.0, 21.0, 22.0]);
    }

    #[test]
    fn test_anomaly_flag() {
        let mut readings: Vec<_> = (0..10).map(|h| reading(0, h, 20.0, 1.0)).collect();
        readings.push(reading(0, 10, 40.0, 1.0));
        let table = FeatureDeriver::default().derive(&readings).unwrap();

        assert!(table.iter().take(10).all(|r| !r.is_anomaly()));
        // mean of ten 20s and one 40 is ~21.8, 40 > 26.8
        assert!(table.rows()[10].is_anomaly());
    }

    #[test]
    fn test_calendar_and_interaction() {
        let readings = vec![reading(0, 24 + 5, 20.0, 2.0)];
        let table = FeatureDeriver::default().derive(&readings).unwrap();
        let row = &table.rows()[0];
        assert_eq!(row.hour, 5);
        // Tuesday
        assert_eq!(row.day_of_week, 1);
        assert_eq!(row.temp_x_vib, 40.0);
    }

    #[test]
    fn test_zero_window_rejected() {
        let config = FeatureConfig {
            rolling_window: 0,
            ..Default::default()
        };
        assert!(matches!(
            FeatureDeriver::new(config),
            Err(FeatureError::InvalidWindow(_))
        ));
    }

    proptest! {
        #[test]
        fn prop_health_score_bounded(temperature in -50.0f64..150.0, vibration in -5.0f64..20.0) {
            let score = score_health(temperature, vibration, &FeatureConfig::default());
            prop_assert!((0.0..=100.0).contains(&score.health_score));
            prop_assert!((0.0..=100.0).contains(&score.temp_score));
            prop_assert!((0.0..=100.0).contains(&score.vib_score));
        }

        #[test]
        fn prop_high_risk_iff_below_cutoff(
            values in proptest::collection::vec((0.0f64..60.0, 0.0f64..8.0), 1..60)
        ) {
            let readings: Vec<_> = values
                .iter()
                .enumerate()
                .map(|(h, (t, v))| reading(0, h as i64, *t, *v))
                .collect();
            let table = FeatureDeriver::default().derive(&readings).unwrap();
            for row in table.iter() {
                prop_assert_eq!(row.high_risk == 1, row.health_score < 70.0);
            }
        }
    }
}
