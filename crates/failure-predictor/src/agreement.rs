//! Agreement between the rule-based and model-based risk notions
//!
//! `high_risk` comes from the health score rule; the model's probability is
//! trained on that label but overridden by the temperature rule, so the two
//! can diverge. Both are kept and compared here.

use crate::predictor::Prediction;
use feature_engine::EngineeredReading;
use serde::{Deserialize, Serialize};

/// An engineered row with its prediction, matched by key
#[derive(Debug, Clone, Copy)]
pub struct PredictedReading<'a> {
    pub reading: &'a EngineeredReading,
    pub prediction: &'a Prediction,
}

impl PredictedReading<'_> {
    /// Model-based risk at the given probability cutoff
    pub fn model_high_risk(&self, cutoff: f64) -> bool {
        self.prediction.probability > cutoff
    }
}

/// Row counts of rule/model agreement
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskAgreement {
    pub both_high: usize,
    pub both_low: usize,
    /// Rule says high risk, model does not
    pub rule_only: usize,
    /// Model says high risk, rule does not
    pub model_only: usize,
}

impl RiskAgreement {
    pub fn tally(rows: &[PredictedReading<'_>], cutoff: f64) -> Self {
        let mut agreement = Self::default();
        for row in rows {
            match (row.reading.is_high_risk(), row.model_high_risk(cutoff)) {
                (true, true) => agreement.both_high += 1,
                (false, false) => agreement.both_low += 1,
                (true, false) => agreement.rule_only += 1,
                (false, true) => agreement.model_only += 1,
            }
        }
        agreement
    }

    pub fn total(&self) -> usize {
        self.both_high + self.both_low + self.rule_only + self.model_only
    }

    pub fn disagreements(&self) -> usize {
        self.rule_only + self.model_only
    }

    /// Fraction of rows on which both notions agree; 1.0 when empty
    pub fn agreement_rate(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            return 1.0;
        }
        (total - self.disagreements()) as f64 / total as f64
    }
}
