//! Predictive Maintenance Pipeline - Main Entry Point

use anyhow::Result;
use pipeline::{init_logging, run, PipelineConfig};
use tracing::info;

fn main() -> Result<()> {
    let config = PipelineConfig::load()?;
    init_logging(&config.logging)?;

    info!("=== Medical Equipment Predictive Maintenance v{} ===", env!("CARGO_PKG_VERSION"));

    let report = run(&config)?;
    println!("{}", report.summary);
    info!(
        "Monitored {} devices, {} flagged high-risk",
        report.devices_monitored,
        report.high_risk_devices.len()
    );

    Ok(())
}
