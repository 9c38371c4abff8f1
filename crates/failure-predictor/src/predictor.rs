//! Fleet-wide failure probabilities
//!
//! The model's probability is used when the classifier offers one. Otherwise
//! its hard label stands in for the probability. Unusually hot readings are
//! then forced to a fixed probability regardless of the model.

use crate::agreement::PredictedReading;
use crate::config::PredictorConfig;
use crate::PredictError;
use feature_engine::{quantile, FeatureColumn, FeatureTable};
use ndarray::{Array2, ArrayView2};
use risk_classifier::{Capability, Classifier, ProbabilisticClassifier};
use serde::{Deserialize, Serialize};
use telemetry_sim::{DeviceId, ReadingKey};
use tracing::{debug, info, warn};

/// Where a row's probability came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProbabilitySource {
    /// Positive-class probability from the classifier
    Model,
    /// Hard label used as a probability
    LabelFallback,
    /// Temperature above the override quantile
    TemperatureOverride,
}

/// Failure probability for one reading
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub key: ReadingKey,
    pub probability: f64,
    pub source: ProbabilitySource,
}

/// How the high-risk devices were chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HighRiskSelection {
    /// Devices with at least one probability above the cutoff
    Probability,
    /// No probability exceeded the cutoff; hottest devices instead
    TemperatureFallback,
}

/// Predictions for a whole feature table
#[derive(Debug, Clone)]
pub struct PredictionSet {
    predictions: Vec<Prediction>,
    high_risk_devices: Vec<DeviceId>,
    selection: HighRiskSelection,
    override_threshold: f64,
}

impl PredictionSet {
    /// Predictions in table order
    pub fn predictions(&self) -> &[Prediction] {
        &self.predictions
    }

    pub fn len(&self) -> usize {
        self.predictions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.predictions.is_empty()
    }

    /// Prediction for a reading
    pub fn get(&self, key: &ReadingKey) -> Option<&Prediction> {
        self.predictions
            .binary_search_by(|p| p.key.cmp(key))
            .ok()
            .map(|i| &self.predictions[i])
    }

    /// High-risk devices, in table order for [`HighRiskSelection::Probability`]
    /// and hottest first for [`HighRiskSelection::TemperatureFallback`]
    pub fn high_risk_devices(&self) -> &[DeviceId] {
        &self.high_risk_devices
    }

    pub fn selection(&self) -> HighRiskSelection {
        self.selection
    }

    /// Temperature above which the override applied
    pub fn override_threshold(&self) -> f64 {
        self.override_threshold
    }

    /// Number of rows whose probability came from `source`
    pub fn count_by_source(&self, source: ProbabilitySource) -> usize {
        self.predictions.iter().filter(|p| p.source == source).count()
    }

    /// Pair every engineered row with its prediction by key
    pub fn join<'a>(&'a self, table: &'a FeatureTable) -> Result<Vec<PredictedReading<'a>>, PredictError> {
        table
            .iter()
            .map(|reading| {
                self.get(&reading.key)
                    .map(|prediction| PredictedReading { reading, prediction })
                    .ok_or_else(|| {
                        PredictError::KeyMismatch(format!("{} @ {}", reading.key.device_id, reading.key.timestamp))
                    })
            })
            .collect()
    }
}

/// Scores engineered readings with a trained classifier
#[derive(Debug, Clone, Default)]
pub struct FailurePredictor {
    config: PredictorConfig,
}

impl FailurePredictor {
    pub fn new(config: PredictorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PredictorConfig {
        &self.config
    }

    /// Predict a failure probability for every row of `table`
    pub fn predict(
        &self,
        model: &dyn Classifier,
        table: &FeatureTable,
        columns: &[FeatureColumn],
    ) -> Result<PredictionSet, PredictError> {
        if table.is_empty() {
            return Err(PredictError::EmptyTable);
        }

        let x = feature_matrix(table, columns);
        let (probabilities, source) = self.score(model, x.view())?;

        let temperatures = table.column(|r| r.temperature);
        let override_threshold = quantile(&temperatures, self.config.override_quantile).unwrap_or(f64::INFINITY);

        let predictions: Vec<Prediction> = table
            .iter()
            .zip(probabilities)
            .map(|(row, probability)| {
                if row.temperature > override_threshold {
                    Prediction {
                        key: row.key,
                        probability: self.config.override_probability,
                        source: ProbabilitySource::TemperatureOverride,
                    }
                } else {
                    Prediction { key: row.key, probability, source }
                }
            })
            .collect();

        let overridden = predictions
            .iter()
            .filter(|p| p.source == ProbabilitySource::TemperatureOverride)
            .count();
        debug!(
            "Temperature override above {:.2}°C applied to {} rows",
            override_threshold, overridden
        );

        let (high_risk_devices, selection) = self.select_devices(table, &predictions);
        info!(
            "Predicted {} rows, {} high-risk devices ({:?})",
            predictions.len(),
            high_risk_devices.len(),
            selection
        );

        Ok(PredictionSet {
            predictions,
            high_risk_devices,
            selection,
            override_threshold,
        })
    }

    fn score(
        &self,
        model: &dyn Classifier,
        x: ArrayView2<'_, f64>,
    ) -> Result<(Vec<f64>, ProbabilitySource), PredictError> {
        match model.capability() {
            Capability::Probabilistic(classifier) => match positive_probabilities(classifier, x) {
                Ok(probabilities) => return Ok((probabilities, ProbabilitySource::Model)),
                Err(e) => warn!("Probability output failed, using predicted labels: {}", e),
            },
            Capability::LabelOnly => warn!("Classifier has no probability output, using predicted labels"),
        }

        let labels = model.predict(x)?;
        Ok((
            labels.into_iter().map(f64::from).collect(),
            ProbabilitySource::LabelFallback,
        ))
    }

    fn select_devices(&self, table: &FeatureTable, predictions: &[Prediction]) -> (Vec<DeviceId>, HighRiskSelection) {
        let mut devices: Vec<DeviceId> = Vec::new();
        for prediction in predictions {
            if prediction.probability > self.config.probability_cutoff
                && devices.last() != Some(&prediction.key.device_id)
            {
                devices.push(prediction.key.device_id);
            }
        }
        if !devices.is_empty() {
            return (devices, HighRiskSelection::Probability);
        }

        warn!(
            "No device above probability {}, reporting the {} hottest devices",
            self.config.probability_cutoff, self.config.fallback_device_count
        );
        (
            hottest_devices(table, self.config.fallback_device_count),
            HighRiskSelection::TemperatureFallback,
        )
    }
}

/// Model input matrix; undefined features become zero
fn feature_matrix(table: &FeatureTable, columns: &[FeatureColumn]) -> Array2<f64> {
    let rows = table.rows();
    Array2::from_shape_fn((rows.len(), columns.len()), |(i, j)| {
        columns[j].value(&rows[i]).unwrap_or(0.0)
    })
}

/// Probability of the positive class, or of the only class when one was seen
fn positive_probabilities(
    classifier: &dyn ProbabilisticClassifier,
    x: ArrayView2<'_, f64>,
) -> Result<Vec<f64>, risk_classifier::ClassifierError> {
    let proba = classifier.predict_proba(x)?;
    let column = if proba.ncols() >= 2 {
        classifier.classes().iter().position(|&c| c == 1).unwrap_or(1)
    } else {
        0
    };
    Ok(proba.column(column).to_vec())
}

/// Devices ordered by their hottest single reading, descending
fn hottest_devices(table: &FeatureTable, count: usize) -> Vec<DeviceId> {
    let mut peaks: Vec<(DeviceId, f64)> = table
        .device_ids()
        .into_iter()
        .map(|id| {
            let peak = table
                .device_rows(id)
                .iter()
                .map(|r| r.temperature)
                .fold(f64::NEG_INFINITY, f64::max);
            (id, peak)
        })
        .collect();
    peaks.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
    peaks.into_iter().take(count).map(|(id, _)| id).collect()
}
