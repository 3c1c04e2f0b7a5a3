//! Supply chain risk index and fraud sub-score

use crate::utils::validate_range;
use crate::Result;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Weights of fraud, delay, temperature anomaly and demand volatility; they sum to 1.0
pub const SCRI_WEIGHTS: [f64; 4] = [0.4, 0.3, 0.2, 0.1];

/// Sub-scores feeding the composite index, each on a 0-100 scale
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SubScores {
    pub fraud_probability: f64,
    pub delay_score: f64,
    pub temperature_anomaly: f64,
    pub demand_volatility: f64,
}

impl SubScores {
    pub fn new(
        fraud_probability: f64,
        delay_score: f64,
        temperature_anomaly: f64,
        demand_volatility: f64,
    ) -> Self {
        Self {
            fraud_probability,
            delay_score,
            temperature_anomaly,
            demand_volatility,
        }
    }

    fn as_array(&self) -> [(&'static str, f64); 4] {
        [
            ("fraud_probability", self.fraud_probability),
            ("delay_score", self.delay_score),
            ("temperature_anomaly", self.temperature_anomaly),
            ("demand_volatility", self.demand_volatility),
        ]
    }
}

fn check_percentage(name: &str, value: f64) -> Result<()> {
    validate_range(value, 0.0, 100.0, name)
}

/// Supply chain risk index (SCRI) in [0, 100]
pub fn composite_risk_index(scores: SubScores) -> Result<f64> {
    let parts = scores.as_array();
    for (name, value) in parts {
        check_percentage(name, value)?;
    }

    Ok(parts
        .iter()
        .zip(SCRI_WEIGHTS.iter())
        .map(|((_, value), weight)| value * weight)
        .sum())
}

/// Fraud risk bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FraudCategory {
    Low,
    Medium,
    High,
}

impl FraudCategory {
    pub fn from_risk(risk: f64) -> Self {
        if risk < 30.0 {
            FraudCategory::Low
        } else if risk < 60.0 {
            FraudCategory::Medium
        } else {
            FraudCategory::High
        }
    }

    /// Recommended action for the bucket
    pub fn action(&self) -> &'static str {
        match self {
            FraudCategory::Low => "Continue monitoring standard protocols",
            FraudCategory::Medium => "Increase inspection frequency and verify documentation",
            FraudCategory::High => "Immediate investigation required - halt shipment pending review",
        }
    }
}

impl fmt::Display for FraudCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            FraudCategory::Low => "Low",
            FraudCategory::Medium => "Medium",
            FraudCategory::High => "High",
        };
        f.write_str(label)
    }
}

/// Fraud sub-score with its bucket and recommended action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FraudAssessment {
    pub fraud_probability: f64,
    pub risk_category: FraudCategory,
    pub action_recommendation: String,
}

/// fraud_risk = 0.5·anomaly_score + 0.3·delay_factor + 0.2·(100 − trust_score)
pub fn assess_fraud(anomaly_score: f64, delay_factor: f64, trust_score: f64) -> Result<FraudAssessment> {
    check_percentage("anomaly_score", anomaly_score)?;
    check_percentage("delay_factor", delay_factor)?;
    check_percentage("trust_score", trust_score)?;

    let risk = 0.5 * anomaly_score + 0.3 * delay_factor + 0.2 * (100.0 - trust_score);
    let category = FraudCategory::from_risk(risk);

    Ok(FraudAssessment {
        fraud_probability: risk,
        risk_category: category,
        action_recommendation: category.action().to_string(),
    })
}
