//! Raw sensor readings

use crate::device::{DeviceId, EquipmentType};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Identity of one row, carried through every pipeline stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ReadingKey {
    pub device_id: DeviceId,
    pub timestamp: NaiveDateTime,
}

/// One hourly sample from one device
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    pub key: ReadingKey,
    pub equipment_type: EquipmentType,
    /// Temperature (°C), 2 decimals
    pub temperature: f64,
    /// Vibration, 3 decimals
    pub vibration: f64,
    /// Pressure, 1 decimal
    pub pressure: f64,
    /// Hours of use since the start of the simulation
    pub usage_hours: u32,
}

impl Reading {
    pub fn device_id(&self) -> DeviceId {
        self.key.device_id
    }

    pub fn timestamp(&self) -> NaiveDateTime {
        self.key.timestamp
    }
}

/// Round to a fixed number of decimals
pub(crate) fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(21.456, 2), 21.46);
        assert_eq!(round_to(1.23449, 3), 1.234);
        assert_eq!(round_to(99.96, 1), 100.0);
    }
}
