//! Pipeline configuration
//!
//! Every stage's settings in one document. Values come from the stage
//! defaults, overridden by an optional `maintenance.toml`.

use anyhow::{Context, Result};
use failure_predictor::PredictorConfig;
use feature_engine::FeatureConfig;
use reporting::ReportConfig;
use risk_classifier::TrainingConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use telemetry_sim::SimulationConfig;

/// Name of the optional settings file, without extension
pub const SETTINGS_FILE: &str = "maintenance";

/// Log output settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Maximum level: trace, debug, info, warn or error
    pub level: String,
    /// Emit JSON lines instead of human-readable text
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

/// Settings for a full run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub simulation: SimulationConfig,
    pub features: FeatureConfig,
    pub training: TrainingConfig,
    pub predictor: PredictorConfig,
    pub report: ReportConfig,
    pub logging: LoggingConfig,
    /// Directory the charts, summary and CSV are written to
    pub output_dir: PathBuf,
}

impl PipelineConfig {
    /// Defaults overridden by `maintenance.toml` in the working directory, if present
    pub fn load() -> Result<Self> {
        Self::from_source(config::File::with_name(SETTINGS_FILE).required(false))
    }

    /// Defaults overridden by the file at `path`, if it exists
    pub fn load_from(path: &Path) -> Result<Self> {
        Self::from_source(config::File::from(path).required(false))
    }

    fn from_source<S>(source: S) -> Result<Self>
    where
        S: config::Source + Send + Sync + 'static,
    {
        let settings = config::Config::builder()
            .add_source(source)
            .build()
            .context("Failed to read pipeline settings")?;
        let config: Self = settings
            .try_deserialize()
            .context("Invalid pipeline settings")?;
        config.training.validate().context("Invalid training settings")?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = PipelineConfig::load_from(&dir.path().join("absent.toml")).unwrap();

        assert_eq!(config.simulation.device_count, 500);
        assert_eq!(config.simulation.horizon_hours, 2160);
        assert_eq!(config.training.forest.n_trees, 100);
        assert_eq!(config.predictor.probability_cutoff, 0.7);
        assert_eq!(config.report.business.cost_per_failure, 50_000);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.output_dir, PathBuf::new());
    }

    #[test]
    fn test_file_overrides_selected_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("maintenance.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            r#"
output_dir = "reports"

[simulation]
device_count = 25
seed = 7

[training.forest]
n_trees = 12

[logging]
level = "debug"
json = true
"#
        )
        .unwrap();

        let config = PipelineConfig::load_from(&path).unwrap();
        assert_eq!(config.simulation.device_count, 25);
        assert_eq!(config.simulation.seed, 7);
        // untouched values keep their defaults
        assert_eq!(config.simulation.horizon_hours, 2160);
        assert_eq!(config.training.forest.n_trees, 12);
        assert_eq!(config.training.forest.max_depth, 10);
        assert_eq!(config.output_dir, PathBuf::from("reports"));
        assert!(config.logging.json);
    }

    #[test]
    fn test_invalid_value_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("maintenance.toml");
        std::fs::write(&path, "[simulation]\ndevice_count = \"many\"\n").unwrap();
        assert!(PipelineConfig::load_from(&path).is_err());
    }

    #[test]
    fn test_inverted_shift_range_rejected_on_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("maintenance.toml");
        std::fs::write(
            &path,
            "[training.synthesis]\ntemperature_shift = [10.0, 5.0]\n",
        )
        .unwrap();

        let err = PipelineConfig::load_from(&path).unwrap_err();
        assert!(format!("{err:#}").contains("temperature_shift"));
    }
}
