//! Full pipeline runs writing into a temporary directory

use chrono::NaiveDate;
use pipeline::{
    init_logging, run, LoggingConfig, PipelineConfig, EXECUTIVE_SUMMARY_FILE, HIGH_RISK_CSV_FILE,
    RISK_DASHBOARD_FILE, SENSOR_TRENDS_FILE,
};
use std::path::Path;
use telemetry_sim::SimulationConfig;

fn reduced_config(output_dir: &Path) -> PipelineConfig {
    let mut config = PipelineConfig {
        output_dir: output_dir.to_path_buf(),
        ..PipelineConfig::default()
    };
    config.simulation = SimulationConfig {
        reference_time: NaiveDate::from_ymd_opt(2024, 1, 1).and_then(|d| d.and_hms_opt(0, 0, 0)),
        ..SimulationConfig::small(40, 720)
    };
    config.training.forest.n_trees = 20;
    config.report.image_width = 1200;
    config.report.image_height = 800;
    config
}

fn assert_artifacts(dir: &Path, report: &pipeline::PipelineReport) {
    assert!(!report.high_risk_devices.is_empty());
    assert!(dir.join(SENSOR_TRENDS_FILE).exists());
    assert!(dir.join(RISK_DASHBOARD_FILE).exists());

    let summary = std::fs::read_to_string(dir.join(EXECUTIVE_SUMMARY_FILE)).unwrap();
    for needle in ["Accuracy:", "Precision:", "Recall:"] {
        assert!(summary.contains(needle), "summary lacks {needle}");
    }
    assert_eq!(summary, report.summary.to_string());

    let csv = std::fs::read_to_string(dir.join(HIGH_RISK_CSV_FILE)).unwrap();
    let mut lines = csv.lines();
    assert_eq!(lines.next(), Some("device_id,health_score,temperature,vibration"));
    let rows: Vec<&str> = lines.collect();
    assert_eq!(rows.len(), report.high_risk_devices.len());
    assert!(rows.iter().all(|r| r.starts_with("DEV") && r.split(',').count() == 4));
}

#[test]
fn test_reduced_scale_run() {
    let dir = tempfile::tempdir().unwrap();
    let report = run(&reduced_config(dir.path())).unwrap();

    assert_eq!(report.devices_monitored, 40);
    assert_eq!(report.readings, 40 * 720);
    assert_eq!(report.artifacts.len(), 4);
    assert_eq!(report.agreement.total(), report.readings);
    assert_eq!(report.health.count, report.readings);
    assert!(report.health.min >= 0.0 && report.health.max <= 100.0);
    assert_artifacts(dir.path(), &report);
}

#[test]
fn test_repeated_runs_write_identical_reports() {
    let first = tempfile::tempdir().unwrap();
    let second = tempfile::tempdir().unwrap();
    run(&reduced_config(first.path())).unwrap();
    run(&reduced_config(second.path())).unwrap();

    for file in [EXECUTIVE_SUMMARY_FILE, HIGH_RISK_CSV_FILE, RISK_DASHBOARD_FILE, SENSOR_TRENDS_FILE] {
        let a = std::fs::read(first.path().join(file)).unwrap();
        let b = std::fs::read(second.path().join(file)).unwrap();
        assert_eq!(a, b, "{file} differs between runs");
    }
}

#[test]
fn test_output_dir_is_created() {
    let dir = tempfile::tempdir().unwrap();
    let nested = dir.path().join("reports").join("latest");
    let mut config = reduced_config(&nested);
    config.simulation.device_count = 12;
    config.simulation.horizon_hours = 96;

    let report = run(&config).unwrap();
    assert!(report.artifacts.iter().all(|p| p.starts_with(&nested) && p.exists()));
}

#[test]
fn test_unknown_log_level_rejected() {
    let config = LoggingConfig {
        level: "loud".to_string(),
        json: false,
    };
    assert!(init_logging(&config).is_err());
}

#[test]
#[ignore = "full fleet: 500 devices over 2160 hours"]
fn test_full_scale_run() {
    let dir = tempfile::tempdir().unwrap();
    let config = PipelineConfig {
        output_dir: dir.path().to_path_buf(),
        ..PipelineConfig::default()
    };
    let report = run(&config).unwrap();

    assert_eq!(report.devices_monitored, 500);
    assert_eq!(report.readings, 500 * 2160);
    assert_artifacts(dir.path(), &report);
}
