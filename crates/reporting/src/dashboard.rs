//! Fleet-wide risk dashboard

use crate::chart::{tick_label, Chart, Range, BLACK, GREEN, ORANGE, RED, SKY_BLUE, YELLOW};
use crate::config::ReportConfig;
use crate::ReportError;
use chrono::NaiveDate;
use feature_engine::{mean, FeatureTable};
use image::RgbImage;
use std::collections::BTreeMap;
use telemetry_sim::{DeviceId, EquipmentType};
use tracing::debug;

/// Equal-width histogram
#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
    /// `counts.len() + 1` bin edges, ascending
    pub edges: Vec<f64>,
    pub counts: Vec<usize>,
}

impl Histogram {
    /// Bin `values` over their own range; the last bin includes the maximum.
    /// A single distinct value is centred in a range of width one.
    pub fn compute(values: &[f64], bins: usize) -> Self {
        let bins = bins.max(1);
        let (mut lo, mut hi) = values
            .iter()
            .filter(|v| v.is_finite())
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
        if lo > hi {
            (lo, hi) = (0.0, 1.0);
        } else if lo == hi {
            (lo, hi) = (lo - 0.5, hi + 0.5);
        }

        let span = hi - lo;
        let edges = (0..=bins).map(|i| lo + span * i as f64 / bins as f64).collect();
        let mut counts = vec![0usize; bins];
        for &v in values.iter().filter(|v| v.is_finite()) {
            let bin = (((v - lo) / span * bins as f64) as usize).min(bins - 1);
            counts[bin] += 1;
        }
        Self { edges, counts }
    }

    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }
}

/// Aggregates behind the four dashboard panels
#[derive(Debug, Clone, PartialEq)]
pub struct FleetDashboard {
    /// Distribution of per-device mean health score
    pub health_histogram: Histogram,
    /// Share of high-risk rows per equipment type, ordered by type label
    pub risk_by_type: Vec<(EquipmentType, f64)>,
    /// Share of anomalous rows per calendar day
    pub daily_anomaly_rate: Vec<(NaiveDate, f64)>,
    /// Devices with the lowest mean health score, worst first
    pub worst_devices: Vec<(DeviceId, f64)>,
}

impl FleetDashboard {
    pub fn from_table(table: &FeatureTable, config: &ReportConfig) -> Result<Self, ReportError> {
        if table.is_empty() {
            return Err(ReportError::Empty("feature table has no rows".to_string()));
        }

        let device_health: Vec<(DeviceId, f64)> = table
            .device_ids()
            .into_iter()
            .filter_map(|id| {
                let scores: Vec<f64> = table.device_rows(id).iter().map(|r| r.health_score).collect();
                mean(&scores).map(|m| (id, m))
            })
            .collect();

        let health_values: Vec<f64> = device_health.iter().map(|(_, m)| *m).collect();
        let health_histogram = Histogram::compute(&health_values, config.histogram_bins);

        let mut by_type: BTreeMap<&'static str, (EquipmentType, usize, usize)> = BTreeMap::new();
        let mut by_day: BTreeMap<NaiveDate, (usize, usize)> = BTreeMap::new();
        for row in table {
            let entry = by_type.entry(row.equipment_type.label()).or_insert((row.equipment_type, 0, 0));
            entry.1 += usize::from(row.high_risk);
            entry.2 += 1;

            let day = by_day.entry(row.key.timestamp.date()).or_insert((0, 0));
            day.0 += usize::from(row.temp_anomaly);
            day.1 += 1;
        }
        let risk_by_type = by_type
            .into_values()
            .map(|(kind, risky, total)| (kind, risky as f64 / total as f64))
            .collect();
        let daily_anomaly_rate = by_day
            .into_iter()
            .map(|(day, (anomalies, total))| (day, anomalies as f64 / total as f64))
            .collect();

        let mut worst_devices = device_health;
        worst_devices.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));
        worst_devices.truncate(config.worst_device_count);

        Ok(Self {
            health_histogram,
            risk_by_type,
            daily_anomaly_rate,
            worst_devices,
        })
    }
}

/// Two-by-two dashboard: health histogram, risk by type, daily anomaly
/// rate and the worst devices
pub fn render_risk_dashboard(dashboard: &FleetDashboard, config: &ReportConfig) -> RgbImage {
    let mut chart = Chart::new(config.image_width, config.image_height);
    chart.heading("Predictive Maintenance Dashboard", 15);
    let cells = chart.grid(2, 2, 60);

    // Health score distribution
    let histogram = &dashboard.health_histogram;
    let hist_x = Range::padded(histogram.edges.iter().copied());
    let hist_y = Range::from_zero(histogram.counts.iter().map(|&c| c as f64));
    let panel = chart.panel(
        cells[0],
        hist_x,
        hist_y,
        "Health Score Distribution",
        "Average Health Score",
        "Number of Devices",
    );
    for (i, &count) in histogram.counts.iter().enumerate() {
        chart.bar(
            &panel,
            histogram.edges[i],
            histogram.edges[i + 1],
            count as f64,
            SKY_BLUE,
            Some(BLACK),
        );
    }
    if let (Some(&first), Some(&last)) = (histogram.edges.first(), histogram.edges.last()) {
        chart.x_tick(&panel, first, &format!("{first:.1}"));
        chart.x_tick(&panel, last, &format!("{last:.1}"));
    }

    // Risk by equipment type
    let palette = [GREEN, YELLOW, ORANGE, RED];
    let type_count = dashboard.risk_by_type.len().max(1) as f64;
    let panel = chart.panel(
        cells[1],
        Range { min: -0.5, max: type_count - 0.5 },
        Range::from_zero(dashboard.risk_by_type.iter().map(|(_, rate)| *rate)),
        "Risk by Equipment Type",
        "Equipment Type",
        "Risk Rate",
    );
    for (i, (kind, rate)) in dashboard.risk_by_type.iter().enumerate() {
        let x = i as f64;
        chart.bar(&panel, x - 0.4, x + 0.4, *rate, palette[i % palette.len()], None);
        chart.x_tick(&panel, x, kind.label());
    }

    // Temperature anomalies over time
    let days = dashboard.daily_anomaly_rate.len();
    let points: Vec<(f64, f64)> = dashboard
        .daily_anomaly_rate
        .iter()
        .enumerate()
        .map(|(i, (_, rate))| (i as f64, *rate))
        .collect();
    let panel = chart.panel(
        cells[2],
        Range::padded(points.iter().map(|p| p.0)),
        Range::padded(points.iter().map(|p| p.1)),
        "Temperature Anomalies Trend",
        "Date",
        "Anomaly Rate",
    );
    chart.line(&panel, &points, RED);
    chart.markers(&panel, &points, RED);
    for i in [0, days / 2, days.saturating_sub(1)] {
        if let Some((day, _)) = dashboard.daily_anomaly_rate.get(i) {
            chart.x_tick(&panel, i as f64, &day.format("%Y-%m-%d").to_string());
        }
    }

    // Top high-risk devices
    let worst = &dashboard.worst_devices;
    let panel = chart.category_panel(
        cells[3],
        Range::from_zero(worst.iter().map(|(_, score)| *score)),
        Range { min: -0.5, max: worst.len().max(1) as f64 - 0.5 },
        &format!("Top {} High-Risk Devices", worst.len()),
        "Health Score",
    );
    for tick in [0.0, 25.0, 50.0, 75.0, 100.0] {
        if tick <= panel.x.max {
            chart.x_tick(&panel, tick, &tick_label(tick));
        }
    }
    for (i, (device, score)) in worst.iter().enumerate() {
        let y = i as f64;
        chart.hbar(&panel, y - 0.4, y + 0.4, *score, RED);
        chart.y_tick(&panel, y, &device.to_string());
    }

    debug!(
        "Rendered dashboard: {} devices, {} types, {} days",
        histogram.total(),
        dashboard.risk_by_type.len(),
        days
    );
    chart.into_image()
}

#[cfg(test)]
mod tests {
    use super::*;
    use feature_engine::{EngineeredReading, FeatureDeriver};
    use proptest::prelude::*;
    use telemetry_sim::{SimulationConfig, TelemetrySynthesizer};

    fn table(devices: u32, hours: u32) -> FeatureTable {
        let fleet = TelemetrySynthesizer::new(SimulationConfig::small(devices, hours))
            .unwrap()
            .generate();
        FeatureDeriver::default().derive(&fleet.readings).unwrap()
    }

    #[test]
    fn test_histogram_bins() {
        let h = Histogram::compute(&[0.0, 1.0, 2.0, 3.0, 4.0], 4);
        assert_eq!(h.edges, vec![0.0, 1.0, 2.0, 3.0, 4.0]);
        // maximum lands in the last bin
        assert_eq!(h.counts, vec![1, 1, 1, 2]);
        assert_eq!(h.total(), 5);
    }

    #[test]
    fn test_histogram_single_value() {
        let h = Histogram::compute(&[80.0, 80.0], 30);
        assert_eq!(h.counts.len(), 30);
        assert_eq!(h.edges[0], 79.5);
        assert_eq!(h.edges[30], 80.5);
        assert_eq!(h.counts[15], 2);
    }

    #[test]
    fn test_histogram_empty() {
        let h = Histogram::compute(&[], 10);
        assert_eq!(h.total(), 0);
        assert_eq!(h.edges.len(), 11);
    }

    #[test]
    fn test_dashboard_aggregates() {
        let table = table(40, 72);
        let config = ReportConfig::default();
        let dashboard = FleetDashboard::from_table(&table, &config).unwrap();

        assert_eq!(dashboard.health_histogram.counts.len(), 30);
        assert_eq!(dashboard.health_histogram.total(), 40);

        let labels: Vec<&str> = dashboard.risk_by_type.iter().map(|(t, _)| t.label()).collect();
        let mut sorted = labels.clone();
        sorted.sort_unstable();
        assert_eq!(labels, sorted);
        assert!(dashboard.risk_by_type.iter().all(|(_, r)| (0.0..=1.0).contains(r)));

        // 72 hours starting at a whole hour span three or four calendar days
        assert!((3..=4).contains(&dashboard.daily_anomaly_rate.len()));
        assert!(dashboard.daily_anomaly_rate.windows(2).all(|w| w[0].0 < w[1].0));

        assert_eq!(dashboard.worst_devices.len(), 10);
        assert!(dashboard.worst_devices.windows(2).all(|w| w[0].1 <= w[1].1));
    }

    #[test]
    fn test_worst_devices_are_lowest_means() {
        let table = table(12, 24);
        let dashboard = FleetDashboard::from_table(&table, &ReportConfig::default()).unwrap();

        let mean_of = |id: DeviceId| {
            let rows: &[EngineeredReading] = table.device_rows(id);
            rows.iter().map(|r| r.health_score).sum::<f64>() / rows.len() as f64
        };
        let included: Vec<DeviceId> = dashboard.worst_devices.iter().map(|(id, _)| *id).collect();
        let cutoff = dashboard.worst_devices.last().map(|(_, m)| *m).unwrap();
        for id in table.device_ids() {
            if !included.contains(&id) {
                assert!(mean_of(id) >= cutoff);
            }
        }
    }

    #[test]
    fn test_empty_table_rejected() {
        assert!(matches!(
            FleetDashboard::from_table(&FeatureTable::default(), &ReportConfig::default()),
            Err(ReportError::Empty(_))
        ));
    }

    #[test]
    fn test_render_dashboard() {
        let table = table(20, 48);
        let config = ReportConfig {
            image_width: 1200,
            image_height: 900,
            ..ReportConfig::default()
        };
        let dashboard = FleetDashboard::from_table(&table, &config).unwrap();
        let image = render_risk_dashboard(&dashboard, &config);
        assert_eq!(image.dimensions(), (1200, 900));
        assert!(image.pixels().any(|p| *p == SKY_BLUE));
    }

    proptest! {
        #[test]
        fn prop_histogram_counts_every_value(
            values in proptest::collection::vec(0.0f64..100.0, 0..200),
            bins in 1usize..40,
        ) {
            let h = Histogram::compute(&values, bins);
            prop_assert_eq!(h.counts.len(), bins);
            prop_assert_eq!(h.edges.len(), bins + 1);
            prop_assert_eq!(h.total(), values.len());
            prop_assert!(h.edges.windows(2).all(|w| w[0] < w[1]));
        }
    }
}
