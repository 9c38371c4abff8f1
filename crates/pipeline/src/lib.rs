//! Predictive Maintenance Pipeline
//!
//! Runs the stages in order, each consuming the complete output of the
//! previous one: simulate telemetry, engineer features, train the risk
//! model, predict failures, then write charts, summary and CSV.

mod settings;

pub use settings::{LoggingConfig, PipelineConfig, SETTINGS_FILE};

use anyhow::{Context, Result};
use failure_predictor::{FailurePredictor, HighRiskSelection, RiskAgreement};
use feature_engine::{FeatureDeriver, SummaryStats};
use reporting::{
    render_risk_dashboard, render_sensor_trends, save_png, DeviceTrend, ExecutiveSummary, FleetDashboard,
    HighRiskReport,
};
use risk_classifier::{train_risk_model, ClassificationMetrics};
use std::path::PathBuf;
use std::str::FromStr;
use telemetry_sim::{DeviceId, TelemetrySynthesizer};
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

pub const SENSOR_TRENDS_FILE: &str = "sensor_trends.png";
pub const RISK_DASHBOARD_FILE: &str = "risk_dashboard.png";
pub const EXECUTIVE_SUMMARY_FILE: &str = "executive_summary.txt";
pub const HIGH_RISK_CSV_FILE: &str = "high_risk_devices.csv";

/// Initialize logging
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let level = Level::from_str(&config.level)
        .with_context(|| format!("Unknown log level '{}'", config.level))?;
    let builder = FmtSubscriber::builder().with_max_level(level).with_target(true);

    let installed = if config.json {
        tracing::subscriber::set_global_default(builder.json().finish())
    } else {
        tracing::subscriber::set_global_default(builder.finish())
    };
    installed.context("Failed to set tracing subscriber")
}

/// What a run produced
#[derive(Debug, Clone)]
pub struct PipelineReport {
    pub devices_monitored: usize,
    pub readings: usize,
    /// Health score over every engineered row
    pub health: SummaryStats,
    pub metrics: ClassificationMetrics,
    pub high_risk_devices: Vec<DeviceId>,
    pub selection: HighRiskSelection,
    pub agreement: RiskAgreement,
    pub summary: ExecutiveSummary,
    /// Files written, in order
    pub artifacts: Vec<PathBuf>,
}

/// Run every stage and write the report files
pub fn run(config: &PipelineConfig) -> Result<PipelineReport> {
    info!("1. Generating sensor data...");
    let fleet = TelemetrySynthesizer::new(config.simulation.clone())
        .context("Invalid simulation settings")?
        .generate();

    info!("2. Engineering features...");
    let table = FeatureDeriver::new(config.features.clone())
        .context("Invalid feature settings")?
        .derive(&fleet.readings)
        .context("Feature derivation failed")?;
    drop(fleet);
    let health = table.summary(|r| r.health_score);
    for (name, stats) in [
        ("temperature", table.summary(|r| r.temperature)),
        ("vibration", table.summary(|r| r.vibration)),
        ("health_score", health.clone()),
    ] {
        info!(
            "{:<12} mean={:.2} std={:.2} min={:.2} max={:.2}",
            name, stats.mean, stats.std_dev, stats.min, stats.max
        );
    }

    info!("3. Training ML model...");
    let model = train_risk_model(&table, &config.training).context("Model training failed")?;

    info!("4. Generating predictions...");
    let predictor = FailurePredictor::new(config.predictor.clone());
    let predictions = predictor
        .predict(&model.forest, &table, &model.columns)
        .context("Prediction failed")?;
    let high_risk = predictions.high_risk_devices().to_vec();
    info!("Found {} high-risk devices", high_risk.len());
    info!(
        "High risk devices: {:?}",
        high_risk.iter().take(5).map(|d| d.to_string()).collect::<Vec<_>>()
    );

    let joined = predictions.join(&table).context("Predictions do not match feature rows")?;
    let agreement = RiskAgreement::tally(&joined, predictor.config().probability_cutoff);
    if agreement.disagreements() > 0 {
        warn!(
            "Rule-based and model-based risk disagree on {} of {} rows (rule only: {}, model only: {})",
            agreement.disagreements(),
            agreement.total(),
            agreement.rule_only,
            agreement.model_only
        );
    }

    info!("5. Creating visualizations...");
    let output_dir = &config.output_dir;
    if !output_dir.as_os_str().is_empty() {
        std::fs::create_dir_all(output_dir)
            .with_context(|| format!("Failed to create {}", output_dir.display()))?;
    }
    let mut artifacts = Vec::new();

    if let Some(&device) = high_risk.first() {
        let trend = DeviceTrend::from_table(&table, device, config.report.trend_window)?;
        let path = output_dir.join(SENSOR_TRENDS_FILE);
        save_png(&render_sensor_trends(&trend, &config.report), &path)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        artifacts.push(path);
    }

    let dashboard = FleetDashboard::from_table(&table, &config.report)?;
    let path = output_dir.join(RISK_DASHBOARD_FILE);
    save_png(&render_risk_dashboard(&dashboard, &config.report), &path)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    artifacts.push(path);

    info!("6. Generating business impact report...");
    let devices_monitored = table.device_ids().len();
    let summary = ExecutiveSummary::new(&model.metrics, devices_monitored, &config.report.business);
    info!("{}", summary);
    let path = output_dir.join(EXECUTIVE_SUMMARY_FILE);
    std::fs::write(&path, summary.to_string()).with_context(|| format!("Failed to write {}", path.display()))?;
    artifacts.push(path);

    let report = HighRiskReport::from_table(&table, &high_risk)?;
    let path = output_dir.join(HIGH_RISK_CSV_FILE);
    report
        .save(&path)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    artifacts.push(path);

    info!("Analysis complete");
    Ok(PipelineReport {
        devices_monitored,
        readings: table.len(),
        health,
        metrics: model.metrics,
        high_risk_devices: high_risk,
        selection: predictions.selection(),
        agreement,
        summary,
        artifacts,
    })
}
