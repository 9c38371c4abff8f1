//! Fleet telemetry generation

use crate::config::SimulationConfig;
use crate::device::{Device, DeviceId, EquipmentType};
use crate::reading::{round_to, Reading, ReadingKey};
use crate::SimulationError;
use chrono::{Duration, NaiveDateTime, Timelike, Utc};
use rand::prelude::*;
use rand_distr::{Distribution, Normal};
use std::collections::BTreeMap;
use std::f64::consts::PI;
use tracing::{debug, info};

/// Output of one simulation run
#[derive(Debug, Clone)]
pub struct Fleet {
    /// Devices in creation order
    pub devices: Vec<Device>,
    /// Readings ordered by device, then hour
    pub readings: Vec<Reading>,
}

impl Fleet {
    /// Look up a device by id
    pub fn device(&self, id: DeviceId) -> Option<&Device> {
        self.devices.get(id.index() as usize).filter(|d| d.id == id)
    }

    /// Number of devices per equipment type
    pub fn type_counts(&self) -> BTreeMap<EquipmentType, usize> {
        let mut counts = BTreeMap::new();
        for device in &self.devices {
            *counts.entry(device.equipment_type).or_insert(0) += 1;
        }
        counts
    }
}

/// Seeded generator for fleet telemetry
pub struct TelemetrySynthesizer {
    config: SimulationConfig,
    rng: StdRng,
    reference_time: NaiveDateTime,
    temperature_noise: Normal<f64>,
    vibration_noise: Normal<f64>,
    pressure_noise: Normal<f64>,
}

fn noise(field: &'static str, sd: f64) -> Result<Normal<f64>, SimulationError> {
    if !(sd.is_finite() && sd >= 0.0) {
        return Err(SimulationError::InvalidDistribution {
            field,
            reason: format!("standard deviation must be finite and non-negative, got {sd}"),
        });
    }
    Normal::new(0.0, sd).map_err(|e| SimulationError::InvalidDistribution {
        field,
        reason: e.to_string(),
    })
}

fn current_hour() -> Result<NaiveDateTime, SimulationError> {
    let now = Utc::now().naive_utc();
    now.with_minute(0)
        .and_then(|t| t.with_second(0))
        .and_then(|t| t.with_nanosecond(0))
        .ok_or_else(|| SimulationError::InvalidReferenceTime(now.to_string()))
}

impl TelemetrySynthesizer {
    /// Create a synthesizer, validating the configuration
    pub fn new(config: SimulationConfig) -> Result<Self, SimulationError> {
        if config.device_count == 0 {
            return Err(SimulationError::EmptyFleet);
        }
        if config.horizon_hours == 0 {
            return Err(SimulationError::EmptyHorizon);
        }

        let reference_time = match config.reference_time {
            Some(t) => t,
            None => current_hour()?,
        };

        Ok(Self {
            rng: StdRng::seed_from_u64(config.seed),
            reference_time,
            temperature_noise: noise("temperature", config.temperature_noise_sd)?,
            vibration_noise: noise("vibration", config.vibration_noise_sd)?,
            pressure_noise: noise("pressure", config.pressure_noise_sd)?,
            config,
        })
    }

    /// Reference time resolved for this run
    pub fn reference_time(&self) -> NaiveDateTime {
        self.reference_time
    }

    /// Timestamp of the sample taken at `hour`
    pub fn timestamp_at(&self, hour: u32) -> NaiveDateTime {
        self.reference_time - Duration::hours(i64::from(self.config.horizon_hours - hour))
    }

    /// Periodic temperature component at `hour`
    pub fn periodic_temperature(&self, hour: u32) -> f64 {
        let h = f64::from(hour);
        self.config.daily_amplitude * (2.0 * PI * h / 24.0).sin()
            + self.config.weekly_amplitude * (2.0 * PI * h / 168.0).sin()
    }

    /// Generate the whole fleet
    pub fn generate(&mut self) -> Fleet {
        let device_count = self.config.device_count;
        let horizon = self.config.horizon_hours;
        let degrading = self.config.degrading_device_count();

        info!(
            "Generating telemetry: {} devices x {} hours (seed={})",
            device_count, horizon, self.config.seed
        );

        let mut devices = Vec::with_capacity(device_count as usize);
        let mut readings = Vec::with_capacity(device_count as usize * horizon as usize);

        for index in 0..device_count {
            let equipment_type = EquipmentType::ALL[self.rng.gen_range(0..EquipmentType::ALL.len())];
            let device = Device::new(DeviceId(index), equipment_type, index < degrading);

            for hour in 0..horizon {
                readings.push(self.sample(&device, hour));
            }
            devices.push(device);
        }

        let fleet = Fleet { devices, readings };
        debug!("Device mix: {:?}", fleet.type_counts());
        info!(
            "Created {} records ({} degrading devices)",
            fleet.readings.len(),
            degrading.min(device_count)
        );
        fleet
    }

    fn sample(&mut self, device: &Device, hour: u32) -> Reading {
        let degradation = device.degradation_at(hour, &self.config.degradation);

        let mut temperature = device.baseline_temperature
            + self.periodic_temperature(hour)
            + self.temperature_noise.sample(&mut self.rng);
        let mut vibration = device.baseline_vibration + self.vibration_noise.sample(&mut self.rng);

        temperature += degradation * self.config.degradation.temperature_gain;
        vibration += degradation * self.config.degradation.vibration_gain;

        let pressure = self.config.pressure_center + self.pressure_noise.sample(&mut self.rng);

        Reading {
            key: ReadingKey {
                device_id: device.id,
                timestamp: self.timestamp_at(hour),
            },
            equipment_type: device.equipment_type,
            temperature: round_to(temperature, 2),
            vibration: round_to(vibration, 3),
            pressure: round_to(pressure, 1),
            usage_hours: hour,
        }
    }
}
