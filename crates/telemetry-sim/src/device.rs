//! Device identity and equipment baselines

use crate::config::DegradationConfig;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Stable device identifier, the creation index of the device.
///
/// Displays as `DEV` followed by the zero-padded index (`DEV0007`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DeviceId(pub u32);

impl DeviceId {
    /// Creation index
    pub fn index(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DEV{:04}", self.0)
    }
}

impl FromStr for DeviceId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.strip_prefix("DEV")
            .and_then(|digits| digits.parse().ok())
            .map(DeviceId)
            .ok_or_else(|| format!("not a device id: {s}"))
    }
}

/// Kind of hospital equipment
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EquipmentType {
    /// MRI scanner
    Mri,
    /// X-Ray machine
    XRay,
    /// Ventilator
    Ventilator,
    /// Infusion pump
    InfusionPump,
}

impl EquipmentType {
    /// All equipment types, in draw order
    pub const ALL: [EquipmentType; 4] = [
        EquipmentType::Mri,
        EquipmentType::XRay,
        EquipmentType::Ventilator,
        EquipmentType::InfusionPump,
    ];

    /// Human-readable label
    pub fn label(&self) -> &'static str {
        match self {
            EquipmentType::Mri => "MRI",
            EquipmentType::XRay => "X-Ray",
            EquipmentType::Ventilator => "Ventilator",
            EquipmentType::InfusionPump => "Infusion Pump",
        }
    }

    /// Expected steady-state temperature (°C)
    pub fn baseline_temperature(&self) -> f64 {
        match self {
            // MRIs run cold
            EquipmentType::Mri => 18.0,
            EquipmentType::Ventilator => 25.0,
            EquipmentType::XRay | EquipmentType::InfusionPump => 22.0,
        }
    }

    /// Expected steady-state vibration
    pub fn baseline_vibration(&self) -> f64 {
        match self {
            EquipmentType::Mri => 2.5,
            EquipmentType::Ventilator => 0.8,
            EquipmentType::XRay | EquipmentType::InfusionPump => 1.5,
        }
    }
}

impl fmt::Display for EquipmentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A simulated device. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Device {
    pub id: DeviceId,
    pub equipment_type: EquipmentType,
    pub baseline_temperature: f64,
    pub baseline_vibration: f64,
    /// Whether this device is in the wear-injected slice of the fleet
    pub degrading: bool,
}

impl Device {
    /// Create a device with the baselines of its equipment type
    pub fn new(id: DeviceId, equipment_type: EquipmentType, degrading: bool) -> Self {
        Self {
            id,
            equipment_type,
            baseline_temperature: equipment_type.baseline_temperature(),
            baseline_vibration: equipment_type.baseline_vibration(),
            degrading,
        }
    }

    /// Degradation units at `hour`; exactly zero for healthy devices and
    /// for hours up to and including the start hour.
    pub fn degradation_at(&self, hour: u32, config: &DegradationConfig) -> f64 {
        if !self.degrading || hour <= config.start_hour {
            return 0.0;
        }
        f64::from(hour - config.start_hour) / config.hours_per_unit
    }
}
