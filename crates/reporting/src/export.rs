//! High-risk device CSV export

use crate::ReportError;
use feature_engine::{mean, EngineeredReading, FeatureTable};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use telemetry_sim::DeviceId;
use tracing::info;

/// Per-device means over the whole history, rounded to 2 decimals
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HighRiskRow {
    pub device_id: DeviceId,
    pub health_score: f64,
    pub temperature: f64,
    pub vibration: f64,
}

/// Summary rows for the high-risk devices, ordered by device id
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HighRiskReport {
    pub rows: Vec<HighRiskRow>,
}

/// Two decimals, ties to even as dataframe rounding does
fn round2(value: f64) -> f64 {
    (value * 100.0).round_ties_even() / 100.0
}

/// Float as a dataframe would print it: whole numbers keep a `.0`
fn csv_float(value: f64) -> String {
    if value.is_finite() && value == value.trunc() {
        format!("{value:.1}")
    } else {
        value.to_string()
    }
}

impl HighRiskReport {
    pub const HEADER: &'static str = "device_id,health_score,temperature,vibration";

    pub fn from_table(table: &FeatureTable, devices: &[DeviceId]) -> Result<Self, ReportError> {
        let mut ids = devices.to_vec();
        ids.sort_unstable();
        ids.dedup();

        let rows = ids
            .into_iter()
            .map(|id| {
                let history = table.device_rows(id);
                let column = |f: fn(&EngineeredReading) -> f64| {
                    let values: Vec<f64> = history.iter().map(f).collect();
                    mean(&values).map(round2)
                };
                match (column(|r| r.health_score), column(|r| r.temperature), column(|r| r.vibration)) {
                    (Some(health_score), Some(temperature), Some(vibration)) => Ok(HighRiskRow {
                        device_id: id,
                        health_score,
                        temperature,
                        vibration,
                    }),
                    _ => Err(ReportError::UnknownDevice(id.to_string())),
                }
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { rows })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn write_csv<W: Write>(&self, writer: &mut W) -> Result<(), ReportError> {
        writeln!(writer, "{}", Self::HEADER)?;
        for row in &self.rows {
            writeln!(
                writer,
                "{},{},{},{}",
                row.device_id,
                csv_float(row.health_score),
                csv_float(row.temperature),
                csv_float(row.vibration)
            )?;
        }
        Ok(())
    }

    /// Write the report to `path`, replacing any existing file
    pub fn save(&self, path: &Path) -> Result<(), ReportError> {
        let mut writer = BufWriter::new(File::create(path)?);
        self.write_csv(&mut writer)?;
        writer.flush()?;
        info!("Wrote {} high-risk devices to {}", self.rows.len(), path.display());
        Ok(())
    }
}
