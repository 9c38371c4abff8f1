//! Engineered feature table

use crate::features::EngineeredReading;
use crate::statistics::SummaryStats;
use crate::FeatureError;
use telemetry_sim::{DeviceId, EquipmentType, ReadingKey};

/// Engineered rows ordered by `(device_id, timestamp)`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureTable {
    rows: Vec<EngineeredReading>,
}

impl FeatureTable {
    /// Wrap rows already sorted by key
    pub(crate) fn from_sorted(rows: Vec<EngineeredReading>) -> Self {
        debug_assert!(rows.windows(2).all(|w| w[0].key <= w[1].key));
        Self { rows }
    }

    /// Build a table from rows in any order
    pub fn from_rows(mut rows: Vec<EngineeredReading>) -> Self {
        rows.sort_by_key(|r| r.key);
        Self { rows }
    }

    pub fn rows(&self) -> &[EngineeredReading] {
        &self.rows
    }

    pub fn iter(&self) -> std::slice::Iter<'_, EngineeredReading> {
        self.rows.iter()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Row with the given key
    pub fn get(&self, key: &ReadingKey) -> Option<&EngineeredReading> {
        self.rows
            .binary_search_by(|r| r.key.cmp(key))
            .ok()
            .map(|i| &self.rows[i])
    }

    /// Contiguous history of one device, oldest first
    pub fn device_rows(&self, device_id: DeviceId) -> &[EngineeredReading] {
        let start = self.rows.partition_point(|r| r.device_id() < device_id);
        let end = self.rows.partition_point(|r| r.device_id() <= device_id);
        &self.rows[start..end]
    }

    /// Distinct device ids in table order
    pub fn device_ids(&self) -> Vec<DeviceId> {
        let mut ids: Vec<DeviceId> = self.rows.iter().map(|r| r.device_id()).collect();
        ids.dedup();
        ids
    }

    /// Equipment type of a device, if it has any rows
    pub fn equipment_type(&self, device_id: DeviceId) -> Option<EquipmentType> {
        self.device_rows(device_id).first().map(|r| r.equipment_type)
    }

    /// One column of values
    pub fn column(&self, f: impl Fn(&EngineeredReading) -> f64) -> Vec<f64> {
        self.rows.iter().map(f).collect()
    }

    /// Count, mean, spread and range of one column
    pub fn summary(&self, f: impl Fn(&EngineeredReading) -> f64) -> SummaryStats {
        SummaryStats::compute(&self.column(f))
    }

    /// Canonical byte encoding, identical for identical tables
    pub fn to_bytes(&self) -> Result<Vec<u8>, FeatureError> {
        postcard::to_allocvec(&self.rows).map_err(|e| FeatureError::Serialization(e.to_string()))
    }
}

impl<'a> IntoIterator for &'a FeatureTable {
    type Item = &'a EngineeredReading;
    type IntoIter = std::slice::Iter<'a, EngineeredReading>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}
