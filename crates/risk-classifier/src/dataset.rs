//! Labelled training data

use crate::config::SynthesisConfig;
use crate::ClassifierError;
use feature_engine::{FeatureColumn, FeatureTable};
use ndarray::{Array2, Axis};
use rand::prelude::*;
use telemetry_sim::ReadingKey;
use tracing::{debug, warn};

/// Where a training row came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowOrigin {
    /// An engineered reading
    Observed(ReadingKey),
    /// A perturbed copy of an engineered reading
    Synthetic(ReadingKey),
}

impl RowOrigin {
    pub fn key(&self) -> ReadingKey {
        match self {
            RowOrigin::Observed(key) | RowOrigin::Synthetic(key) => *key,
        }
    }

    pub fn is_synthetic(&self) -> bool {
        matches!(self, RowOrigin::Synthetic(_))
    }
}

/// Feature matrix, labels and row identities, kept row-aligned
#[derive(Debug, Clone)]
pub struct LabeledDataset {
    pub columns: Vec<FeatureColumn>,
    pub features: Array2<f64>,
    pub labels: Vec<u8>,
    pub origins: Vec<RowOrigin>,
}

/// Rows added by minority-class synthesis
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SynthesisReport {
    pub added: usize,
    pub label: u8,
}

/// Stratified train/test partition
#[derive(Debug, Clone)]
pub struct DatasetSplit {
    pub train: LabeledDataset,
    pub test: LabeledDataset,
}

impl LabeledDataset {
    /// Build from a feature table, skipping rows with any undefined feature
    pub fn from_table(table: &FeatureTable, columns: &[FeatureColumn]) -> Result<Self, ClassifierError> {
        if columns.is_empty() {
            return Err(ClassifierError::InvalidConfig("no feature columns selected".to_string()));
        }

        let mut data = Vec::with_capacity(table.len() * columns.len());
        let mut labels = Vec::with_capacity(table.len());
        let mut origins = Vec::with_capacity(table.len());
        let mut skipped = 0usize;

        for row in table {
            let values: Option<Vec<f64>> = columns.iter().map(|c| c.value(row)).collect();
            match values {
                Some(values) => {
                    data.extend(values);
                    labels.push(row.high_risk);
                    origins.push(RowOrigin::Observed(row.key));
                }
                None => skipped += 1,
            }
        }

        if labels.is_empty() {
            return Err(ClassifierError::EmptyDataset);
        }
        if skipped > 0 {
            debug!("Excluded {} rows with undefined features", skipped);
        }

        let features = Array2::from_shape_vec((labels.len(), columns.len()), data).map_err(|e| {
            ClassifierError::InvalidInputShape {
                expected: format!("[{}, {}]", labels.len(), columns.len()),
                actual: e.to_string(),
            }
        })?;

        Ok(Self {
            columns: columns.to_vec(),
            features,
            labels,
            origins,
        })
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Number of positive labels
    pub fn positives(&self) -> usize {
        self.labels.iter().filter(|&&l| l == 1).count()
    }

    /// Distinct labels, ascending
    pub fn classes(&self) -> Vec<u8> {
        let mut classes = self.labels.clone();
        classes.sort_unstable();
        classes.dedup();
        classes
    }

    fn column_index(&self, column: FeatureColumn) -> Option<usize> {
        self.columns.iter().position(|&c| c == column)
    }

    /// Make sure both classes are present before splitting.
    ///
    /// With a single class, a random `sample_fraction` of the rows is copied,
    /// temperature and vibration are pushed away from the observed class
    /// (up when the positive class is missing, down otherwise) and the
    /// copies get the missing label.
    pub fn ensure_both_classes(
        &mut self,
        config: &SynthesisConfig,
        rng: &mut StdRng,
    ) -> Result<Option<SynthesisReport>, ClassifierError> {
        config.validate()?;
        let classes = self.classes();
        let present = match classes.as_slice() {
            [] => return Err(ClassifierError::EmptyDataset),
            [only] => *only,
            _ => return Ok(None),
        };
        let label = u8::from(present == 0);
        let direction = if label == 1 { 1.0 } else { -1.0 };

        let n_samples = ((self.len() as f64 * config.sample_fraction) as usize).clamp(1, self.len());
        warn!(
            "Only one class found (label {}), synthesizing {} rows with label {}",
            present, n_samples, label
        );

        let temperature = self.column_index(FeatureColumn::Temperature);
        let vibration = self.column_index(FeatureColumn::Vibration);
        let picked = rand::seq::index::sample(rng, self.len(), n_samples).into_vec();

        let mut synthetic = self.features.select(Axis(0), &picked);
        for mut row in synthetic.rows_mut() {
            if let Some(t) = temperature {
                row[t] += direction * rng.gen_range(config.temperature_shift.0..config.temperature_shift.1);
            }
            if let Some(v) = vibration {
                row[v] += direction * rng.gen_range(config.vibration_shift.0..config.vibration_shift.1);
            }
        }

        self.features
            .append(Axis(0), synthetic.view())
            .map_err(|e| ClassifierError::InvalidInputShape {
                expected: format!("[*, {}]", self.columns.len()),
                actual: e.to_string(),
            })?;
        self.labels.extend(std::iter::repeat(label).take(n_samples));
        let copied: Vec<RowOrigin> = picked
            .iter()
            .map(|&i| RowOrigin::Synthetic(self.origins[i].key()))
            .collect();
        self.origins.extend(copied);

        Ok(Some(SynthesisReport {
            added: n_samples,
            label,
        }))
    }

    /// Rows at the given indices, in that order
    pub fn select(&self, indices: &[usize]) -> Self {
        Self {
            columns: self.columns.clone(),
            features: self.features.select(Axis(0), indices),
            labels: indices.iter().map(|&i| self.labels[i]).collect(),
            origins: indices.iter().map(|&i| self.origins[i]).collect(),
        }
    }

    /// Stratified random split.
    ///
    /// Each class contributes `round(test_fraction * n_class)` rows to the
    /// test set, kept within `1..n_class` whenever the class has two or more
    /// rows so that both partitions see it.
    pub fn stratified_split(&self, test_fraction: f64, seed: u64) -> Result<DatasetSplit, ClassifierError> {
        if !(0.0..1.0).contains(&test_fraction) {
            return Err(ClassifierError::InvalidConfig(format!(
                "test_fraction must be in [0, 1), got {test_fraction}"
            )));
        }
        if self.is_empty() {
            return Err(ClassifierError::EmptyDataset);
        }

        let mut rng = StdRng::seed_from_u64(seed);
        let mut train = Vec::with_capacity(self.len());
        let mut test = Vec::with_capacity((self.len() as f64 * test_fraction) as usize + 2);

        for class in self.classes() {
            let mut members: Vec<usize> = (0..self.len()).filter(|&i| self.labels[i] == class).collect();
            members.shuffle(&mut rng);

            let n = members.len();
            let mut n_test = (n as f64 * test_fraction).round() as usize;
            if n >= 2 && test_fraction > 0.0 {
                n_test = n_test.clamp(1, n - 1);
            } else if n < 2 {
                n_test = 0;
            }

            test.extend_from_slice(&members[..n_test]);
            train.extend_from_slice(&members[n_test..]);
        }

        train.sort_unstable();
        test.sort_unstable();
        debug!("Stratified split: {} train / {} test rows", train.len(), test.len());

        Ok(DatasetSplit {
            train: self.select(&train),
            test: self.select(&test),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use feature_engine::{FeatureDeriver, DEFAULT_MODEL_COLUMNS};
    use proptest::prelude::*;
    use telemetry_sim::{DeviceId, EquipmentType, Reading};

    fn readings(n: usize, temperature: impl Fn(usize) -> f64) -> Vec<Reading> {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .unwrap();
        (0..n)
            .map(|i| Reading {
                key: ReadingKey {
                    device_id: DeviceId((i / 50) as u32),
                    timestamp: start + chrono::Duration::hours((i % 50) as i64),
                },
                equipment_type: EquipmentType::Ventilator,
                temperature: temperature(i),
                vibration: 0.8,
                pressure: 100.0,
                usage_hours: (i % 50) as u32,
            })
            .collect()
    }

    fn dataset(n: usize, temperature: impl Fn(usize) -> f64) -> LabeledDataset {
        let table = FeatureDeriver::default().derive(&readings(n, temperature)).unwrap();
        LabeledDataset::from_table(&table, &DEFAULT_MODEL_COLUMNS).unwrap()
    }

    #[test]
    fn test_from_table_shape() {
        let data = dataset(100, |_| 22.0);
        assert_eq!(data.features.dim(), (100, 8));
        assert_eq!(data.labels.len(), 100);
        assert!(data.origins.iter().all(|o| !o.is_synthetic()));
    }

    #[test]
    fn test_rows_with_undefined_features_excluded() {
        let table = FeatureDeriver::default().derive(&readings(100, |_| 22.0)).unwrap();
        let columns = [FeatureColumn::Temperature, FeatureColumn::TemperatureChange];
        let data = LabeledDataset::from_table(&table, &columns).unwrap();
        // first row of each of the two devices has no change
        assert_eq!(data.len(), 98);
    }

    #[test]
    fn test_synthesizes_missing_positive_class() {
        let mut data = dataset(200, |_| 22.0);
        assert_eq!(data.classes(), vec![0]);

        let mut rng = StdRng::seed_from_u64(42);
        let report = data
            .ensure_both_classes(&SynthesisConfig::default(), &mut rng)
            .unwrap()
            .unwrap();

        assert_eq!(report, SynthesisReport { added: 20, label: 1 });
        assert_eq!(data.len(), 220);
        assert_eq!(data.classes(), vec![0, 1]);
        assert_eq!(data.features.nrows(), data.labels.len());

        for i in 200..220 {
            assert!(data.origins[i].is_synthetic());
            let t = data.features[[i, 0]];
            let v = data.features[[i, 1]];
            assert!((27.0..32.0).contains(&t));
            assert!((1.8..3.8).contains(&v));
        }
    }

    #[test]
    fn test_synthesizes_missing_negative_class() {
        let mut data = dataset(100, |_| 80.0);
        assert_eq!(data.classes(), vec![1]);

        let mut rng = StdRng::seed_from_u64(1);
        let report = data
            .ensure_both_classes(&SynthesisConfig::default(), &mut rng)
            .unwrap()
            .unwrap();
        assert_eq!(report.label, 0);
        assert_eq!(data.classes(), vec![0, 1]);
    }

    #[test]
    fn test_no_synthesis_with_both_classes() {
        let mut data = dataset(100, |i| if i % 10 == 0 { 80.0 } else { 22.0 });
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(data.ensure_both_classes(&SynthesisConfig::default(), &mut rng).unwrap(), None);
        assert_eq!(data.len(), 100);
    }

    #[test]
    fn test_stratified_split_preserves_ratio() {
        let data = dataset(500, |i| if i % 5 == 0 { 80.0 } else { 22.0 });
        assert_eq!(data.positives(), 100);

        let split = data.stratified_split(0.2, 42).unwrap();
        assert_eq!(split.test.len(), 100);
        assert_eq!(split.train.len(), 400);
        assert_eq!(split.test.positives(), 20);
        assert_eq!(split.train.positives(), 80);

        let again = data.stratified_split(0.2, 42).unwrap();
        assert_eq!(split.test.origins, again.test.origins);
    }

    #[test]
    fn test_split_keeps_rare_class_in_both_partitions() {
        let data = dataset(100, |i| if i < 2 { 80.0 } else { 22.0 });
        assert_eq!(data.positives(), 2);
        let split = data.stratified_split(0.2, 7).unwrap();
        assert_eq!(split.test.positives(), 1);
        assert_eq!(split.train.positives(), 1);
    }

    #[test]
    fn test_invalid_test_fraction() {
        let data = dataset(10, |_| 22.0);
        assert!(matches!(
            data.stratified_split(1.5, 1),
            Err(ClassifierError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_inverted_shift_range_is_an_error() {
        let mut data = dataset(100, |_| 22.0);
        let config = SynthesisConfig {
            vibration_shift: (3.0, 1.0),
            ..Default::default()
        };
        let mut rng = StdRng::seed_from_u64(1);
        assert!(matches!(
            data.ensure_both_classes(&config, &mut rng),
            Err(ClassifierError::InvalidConfig(_))
        ));
        assert_eq!(data.len(), 100);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(24))]

        #[test]
        fn prop_single_class_gains_other_label(
            n in 2usize..150,
            temperature in prop_oneof![15.0f64..30.0, 70.0f64..90.0],
            seed in any::<u64>(),
        ) {
            let mut data = dataset(n, |_| temperature);
            prop_assert_eq!(data.classes().len(), 1);

            let mut rng = StdRng::seed_from_u64(seed);
            let report = data.ensure_both_classes(&SynthesisConfig::default(), &mut rng).unwrap();
            prop_assert!(report.is_some());
            prop_assert_eq!(data.classes(), vec![0, 1]);
            prop_assert_eq!(data.features.nrows(), data.labels.len());
            prop_assert_eq!(data.origins.len(), data.labels.len());
        }

        #[test]
        fn prop_split_keeps_both_classes(
            n in 20usize..200,
            every in 2usize..10,
            fraction in 0.05f64..0.5,
            seed in any::<u64>(),
        ) {
            let data = dataset(n, |i| if i % every == 0 { 80.0 } else { 22.0 });
            let split = data.stratified_split(fraction, seed).unwrap();

            prop_assert_eq!(split.train.len() + split.test.len(), data.len());
            prop_assert_eq!(split.train.classes(), vec![0, 1]);
            prop_assert_eq!(split.test.classes(), vec![0, 1]);
        }
    }
}
