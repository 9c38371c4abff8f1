//! Maintenance Reporting
//!
//! Presentation over engineered and predicted data: per-device trend charts,
//! the fleet dashboard, the executive summary and the high-risk device CSV.
//! Nothing here feeds back into the pipeline.

mod chart;
mod config;
mod dashboard;
mod export;
mod font;
mod summary;
mod trends;

pub use config::{BusinessAssumptions, ReportConfig};
pub use dashboard::{render_risk_dashboard, FleetDashboard, Histogram};
pub use export::{HighRiskReport, HighRiskRow};
pub use image::RgbImage;
pub use summary::ExecutiveSummary;
pub use trends::{render_sensor_trends, DeviceTrend};

use std::path::Path;
use thiserror::Error;

/// Errors while building or writing reports
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("Unknown device: {0}")]
    UnknownDevice(String),
    #[error("Nothing to report: {0}")]
    Empty(String),
}

/// Write a rendered chart as PNG
pub fn save_png(image: &RgbImage, path: &Path) -> Result<(), ReportError> {
    image.save_with_format(path, image::ImageFormat::Png)?;
    tracing::info!("Saved: {}", path.display());
    Ok(())
}
