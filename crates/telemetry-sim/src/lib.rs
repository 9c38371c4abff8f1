//! Telemetry Synthesizer
//!
//! Produces hourly temperature, vibration and pressure readings for a fleet of
//! hospital devices, with daily/weekly cycles and wear injected into a subset
//! of the fleet.

mod config;
mod device;
mod reading;
mod synthesizer;

pub use config::{DegradationConfig, SimulationConfig};
pub use device::{Device, DeviceId, EquipmentType};
pub use reading::{Reading, ReadingKey};
pub use synthesizer::{Fleet, TelemetrySynthesizer};

use thiserror::Error;

/// Errors raised while setting up a simulation run
#[derive(Debug, Error)]
pub enum SimulationError {
    #[error("Fleet must contain at least one device")]
    EmptyFleet,
    #[error("Simulation horizon must be at least one hour")]
    EmptyHorizon,
    #[error("Invalid noise distribution for {field}: {reason}")]
    InvalidDistribution { field: &'static str, reason: String },
    #[error("Reference time out of range: {0}")]
    InvalidReferenceTime(String),
}
