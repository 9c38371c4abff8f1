//! Executive summary text

use crate::config::BusinessAssumptions;
use risk_classifier::ClassificationMetrics;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Model performance and an illustrative savings estimate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutiveSummary {
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub devices_monitored: usize,
    /// `devices × failure rate × precision`, truncated
    pub prevented_failures: u64,
    pub estimated_savings: u64,
    /// Return on the implementation cost, in percent
    pub roi_percent: f64,
    pub implementation_cost: u64,
}

impl ExecutiveSummary {
    pub fn new(metrics: &ClassificationMetrics, devices_monitored: usize, assumptions: &BusinessAssumptions) -> Self {
        let expected = devices_monitored as f64 * assumptions.annual_failure_rate * metrics.precision;
        let prevented_failures = expected.max(0.0).trunc() as u64;
        let estimated_savings = prevented_failures * assumptions.cost_per_failure;
        let roi_percent = (estimated_savings as f64 / assumptions.implementation_cost as f64 - 1.0) * 100.0;

        Self {
            accuracy: metrics.accuracy,
            precision: metrics.precision,
            recall: metrics.recall,
            devices_monitored,
            prevented_failures,
            estimated_savings,
            roi_percent,
            implementation_cost: assumptions.implementation_cost,
        }
    }
}

/// `1234567` as `1,234,567`
fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    grouped
}

/// Short dollar amount, `100k` for whole thousands
fn short_amount(value: u64) -> String {
    if value >= 1000 && value % 1000 == 0 {
        format!("{}k", value / 1000)
    } else {
        group_thousands(value)
    }
}

fn percent(value: f64) -> String {
    format!("{:.1}%", value * 100.0)
}

impl fmt::Display for ExecutiveSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let indent = "    ";
        writeln!(f)?;
        writeln!(f, "{indent}PREDICTIVE MAINTENANCE - EXECUTIVE SUMMARY")?;
        writeln!(f, "{indent}==========================================")?;
        writeln!(f, "{indent}")?;
        writeln!(f, "{indent}Model Performance:")?;
        writeln!(f, "{indent}- Accuracy: {}", percent(self.accuracy))?;
        writeln!(f, "{indent}- Precision: {}", percent(self.precision))?;
        writeln!(f, "{indent}- Recall: {}", percent(self.recall))?;
        writeln!(f, "{indent}")?;
        writeln!(f, "{indent}Business Impact:")?;
        writeln!(f, "{indent}- Devices Monitored: {}", self.devices_monitored)?;
        writeln!(f, "{indent}- Prevented Failures: ~{}", self.prevented_failures)?;
        writeln!(
            f,
            "{indent}- Estimated Annual Savings: ${}",
            group_thousands(self.estimated_savings)
        )?;
        writeln!(
            f,
            "{indent}- ROI: {:.0}%  # Assuming ${} implementation cost",
            self.roi_percent,
            short_amount(self.implementation_cost)
        )?;
        writeln!(f, "{indent}")?;
        writeln!(f, "{indent}Recommendation: Deploy to production with phased rollout")?;
        write!(f, "{indent}")
    }
}
