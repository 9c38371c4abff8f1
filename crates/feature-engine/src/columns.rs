//! Model input columns

use crate::features::EngineeredReading;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A numeric column that can be fed to a model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureColumn {
    Temperature,
    Vibration,
    Pressure,
    #[serde(rename = "temperature_24h_mean")]
    Temperature24hMean,
    #[serde(rename = "vibration_24h_mean")]
    Vibration24hMean,
    TemperatureChange,
    VibrationChange,
    TempXVib,
    Hour,
    DayOfWeek,
}

/// Columns the risk model is trained on by default
pub const DEFAULT_MODEL_COLUMNS: [FeatureColumn; 8] = [
    FeatureColumn::Temperature,
    FeatureColumn::Vibration,
    FeatureColumn::Pressure,
    FeatureColumn::Temperature24hMean,
    FeatureColumn::Vibration24hMean,
    FeatureColumn::TempXVib,
    FeatureColumn::Hour,
    FeatureColumn::DayOfWeek,
];

impl FeatureColumn {
    /// Column name as it appears in reports
    pub fn name(&self) -> &'static str {
        match self {
            FeatureColumn::Temperature => "temperature",
            FeatureColumn::Vibration => "vibration",
            FeatureColumn::Pressure => "pressure",
            FeatureColumn::Temperature24hMean => "temperature_24h_mean",
            FeatureColumn::Vibration24hMean => "vibration_24h_mean",
            FeatureColumn::TemperatureChange => "temperature_change",
            FeatureColumn::VibrationChange => "vibration_change",
            FeatureColumn::TempXVib => "temp_x_vib",
            FeatureColumn::Hour => "hour",
            FeatureColumn::DayOfWeek => "day_of_week",
        }
    }

    /// Value of this column in a row; `None` where the feature is undefined
    pub fn value(&self, row: &EngineeredReading) -> Option<f64> {
        match self {
            FeatureColumn::Temperature => Some(row.temperature),
            FeatureColumn::Vibration => Some(row.vibration),
            FeatureColumn::Pressure => Some(row.pressure),
            FeatureColumn::Temperature24hMean => Some(row.temperature_24h_mean),
            FeatureColumn::Vibration24hMean => Some(row.vibration_24h_mean),
            FeatureColumn::TemperatureChange => row.temperature_change,
            FeatureColumn::VibrationChange => row.vibration_change,
            FeatureColumn::TempXVib => Some(row.temp_x_vib),
            FeatureColumn::Hour => Some(f64::from(row.hour)),
            FeatureColumn::DayOfWeek => Some(f64::from(row.day_of_week)),
        }
    }
}

impl fmt::Display for FeatureColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
