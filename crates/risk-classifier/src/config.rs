//! Training configuration

use crate::ClassifierError;
use feature_engine::{FeatureColumn, DEFAULT_MODEL_COLUMNS};
use serde::{Deserialize, Serialize};

/// Number of candidate features examined at each split
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaxFeatures {
    /// floor(sqrt(n_features)), at least one
    Sqrt,
    /// Every feature
    All,
    /// A fixed count, capped at n_features
    Count(usize),
}

impl MaxFeatures {
    /// Resolve against the number of available features
    pub fn resolve(&self, n_features: usize) -> usize {
        let n = match self {
            MaxFeatures::Sqrt => (n_features as f64).sqrt().floor() as usize,
            MaxFeatures::All => n_features,
            MaxFeatures::Count(count) => (*count).min(n_features),
        };
        n.max(1).min(n_features.max(1))
    }
}

/// Random forest hyperparameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ForestConfig {
    /// Number of trees
    pub n_trees: usize,
    /// Maximum depth of each tree
    pub max_depth: usize,
    /// Minimum (bootstrap-weighted) samples required to split a node
    pub min_samples_split: usize,
    /// Features considered per split
    pub max_features: MaxFeatures,
    /// Draw a bootstrap sample for each tree
    pub bootstrap: bool,
    /// RNG seed; tree `i` uses `seed + i`
    pub seed: u64,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            n_trees: 100,
            max_depth: 10,
            min_samples_split: 20,
            max_features: MaxFeatures::Sqrt,
            bootstrap: true,
            seed: 42,
        }
    }
}

/// Minority-class synthesis used when the labels contain a single class
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthesisConfig {
    /// Share of existing rows duplicated into the missing class
    pub sample_fraction: f64,
    /// Temperature perturbation range (magnitude)
    pub temperature_shift: (f64, f64),
    /// Vibration perturbation range (magnitude)
    pub vibration_shift: (f64, f64),
    /// RNG seed
    pub seed: u64,
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            sample_fraction: 0.1,
            temperature_shift: (5.0, 10.0),
            vibration_shift: (1.0, 3.0),
            seed: 42,
        }
    }
}

fn check_shift(name: &str, (lo, hi): (f64, f64)) -> Result<(), ClassifierError> {
    if lo.is_finite() && hi.is_finite() && 0.0 <= lo && lo < hi {
        Ok(())
    } else {
        Err(ClassifierError::InvalidConfig(format!(
            "{name} must be a non-empty range of non-negative values, got ({lo}, {hi})"
        )))
    }
}

impl SynthesisConfig {
    /// Reject shift ranges that cannot be sampled
    pub fn validate(&self) -> Result<(), ClassifierError> {
        if !(self.sample_fraction > 0.0 && self.sample_fraction <= 1.0) {
            return Err(ClassifierError::InvalidConfig(format!(
                "sample_fraction must be in (0, 1], got {}",
                self.sample_fraction
            )));
        }
        check_shift("temperature_shift", self.temperature_shift)?;
        check_shift("vibration_shift", self.vibration_shift)
    }
}

/// Full training stage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    /// Model input columns
    pub columns: Vec<FeatureColumn>,
    /// Share of rows held out for evaluation
    pub test_fraction: f64,
    /// Seed for the stratified split
    pub split_seed: u64,
    pub forest: ForestConfig,
    pub synthesis: SynthesisConfig,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            columns: DEFAULT_MODEL_COLUMNS.to_vec(),
            test_fraction: 0.2,
            split_seed: 42,
            forest: ForestConfig::default(),
            synthesis: SynthesisConfig::default(),
        }
    }
}

impl TrainingConfig {
    pub fn validate(&self) -> Result<(), ClassifierError> {
        if self.columns.is_empty() {
            return Err(ClassifierError::InvalidConfig("no feature columns selected".to_string()));
        }
        if !(0.0..1.0).contains(&self.test_fraction) {
            return Err(ClassifierError::InvalidConfig(format!(
                "test_fraction must be in [0, 1), got {}",
                self.test_fraction
            )));
        }
        self.synthesis.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_max_features_resolve() {
        assert_eq!(MaxFeatures::Sqrt.resolve(8), 2);
        assert_eq!(MaxFeatures::Sqrt.resolve(1), 1);
        assert_eq!(MaxFeatures::All.resolve(8), 8);
        assert_eq!(MaxFeatures::Count(20).resolve(8), 8);
        assert_eq!(MaxFeatures::Count(0).resolve(8), 1);
    }

    #[test]
    fn test_default_training_config_is_valid() {
        assert!(TrainingConfig::default().validate().is_ok());
    }

    #[test]
    fn test_rejects_unsampleable_shift_ranges() {
        let inverted = SynthesisConfig {
            temperature_shift: (10.0, 5.0),
            ..Default::default()
        };
        assert!(matches!(inverted.validate(), Err(ClassifierError::InvalidConfig(_))));

        let empty = SynthesisConfig {
            vibration_shift: (2.0, 2.0),
            ..Default::default()
        };
        assert!(matches!(empty.validate(), Err(ClassifierError::InvalidConfig(_))));

        let unbounded = SynthesisConfig {
            temperature_shift: (5.0, f64::INFINITY),
            ..Default::default()
        };
        assert!(unbounded.validate().is_err());

        let training = TrainingConfig {
            synthesis: SynthesisConfig {
                sample_fraction: 0.0,
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(training.validate().is_err());
    }
}
