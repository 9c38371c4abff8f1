use chrono::NaiveDate;
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use feature_engine::FeatureDeriver;
use telemetry_sim::{SimulationConfig, TelemetrySynthesizer};

fn bench_derive(c: &mut Criterion) {
    let config = SimulationConfig {
        reference_time: NaiveDate::from_ymd_opt(2024, 1, 1).and_then(|d| d.and_hms_opt(0, 0, 0)),
        ..SimulationConfig::small(50, 2160)
    };
    let fleet = match TelemetrySynthesizer::new(config) {
        Ok(mut synth) => synth.generate(),
        Err(e) => panic!("invalid bench config: {e}"),
    };
    let deriver = FeatureDeriver::default();

    c.bench_function("derive_50_devices_90_days", |b| {
        b.iter(|| deriver.derive(black_box(&fleet.readings)))
    });
}

criterion_group!(benches, bench_derive);
criterion_main!(benches);
