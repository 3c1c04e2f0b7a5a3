//! Shipment risk classification

use crate::observation::{Observation, RISK_FEATURES};
use crate::{Result, ScoringError};
use serde::{Deserialize, Serialize};
use std::fmt;
use supply_math::logistic::LogisticParams;
use supply_math::stats::train_test_indices;
use supply_math::{LogisticRegression, StandardScaler};
use tracing::{info, warn};

/// Number of contributing factors reported per assessment
pub const TOP_FACTORS: usize = 3;

/// Share of observations held out to measure classifier accuracy
pub const TEST_RATIO: f64 = 0.2;

/// Weighted rule score used to label training observations:
/// delay over 3 days (0.4), temperature outside 15-30°C (0.3), stock below half of demand (0.3)
pub fn risk_rule_score(observation: &Observation) -> f64 {
    let mut score = 0.0;
    if observation.delay_days > 3.0 {
        score += 0.4;
    }
    if observation.temperature < 15.0 || observation.temperature > 30.0 {
        score += 0.3;
    }
    if observation.stock_level < observation.demand * 0.5 {
        score += 0.3;
    }
    score
}

/// Training label: `true` when the rule score exceeds 0.5
pub fn risk_label(observation: &Observation) -> bool {
    risk_rule_score(observation) > 0.5
}

/// Risk tier of a probability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    /// The classifier could not produce a probability
    Unknown,
}

impl RiskLevel {
    pub fn from_probability(probability: f64) -> Self {
        if !probability.is_finite() {
            RiskLevel::Unknown
        } else if probability < 0.4 {
            RiskLevel::Low
        } else if probability < 0.7 {
            RiskLevel::Medium
        } else {
            RiskLevel::High
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "LOW",
            RiskLevel::Medium => "MEDIUM",
            RiskLevel::High => "HIGH",
            RiskLevel::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Risk assessment of one observation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskResult {
    /// Probability of the high-risk class, 0-1
    pub risk_probability: f64,
    pub risk_level: RiskLevel,
    /// Most influential features first
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub top_factors: Vec<String>,
    /// max(p, 1 - p)
    pub confidence: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RiskResult {
    /// Explicit "unknown" sentinel carrying the failure that produced it
    pub fn unknown(error: &dyn fmt::Display) -> Self {
        Self {
            risk_probability: 0.5,
            risk_level: RiskLevel::Unknown,
            top_factors: Vec::new(),
            confidence: 0.5,
            error: Some(error.to_string()),
        }
    }
}

/// Feature with the magnitude of its trained coefficient
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactorImportance {
    pub feature: String,
    pub importance: f64,
}

/// Standardised logistic regression over demand, delay, temperature and stock
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskClassifier {
    scaler: StandardScaler,
    model: LogisticRegression,
    /// Features ranked by |coefficient|, descending
    factors: Vec<FactorImportance>,
}

impl RiskClassifier {
    /// Label, split, scale and fit. Returns the classifier with its held-out accuracy (0-1).
    pub fn train(observations: &[Observation], seed: u64) -> Result<(Self, f64)> {
        let rows: Vec<Vec<f64>> = observations.iter().map(|o| o.risk_features()).collect();
        let labels: Vec<bool> = observations.iter().map(risk_label).collect();

        let positives = labels.iter().filter(|&&l| l).count();
        if positives == 0 || positives == labels.len() {
            return Err(ScoringError::InvalidInput(
                "Risk training data contains a single class".to_string(),
            ));
        }

        let (train_idx, test_idx) = train_test_indices(rows.len(), TEST_RATIO, seed)?;
        let x_train: Vec<Vec<f64>> = train_idx.iter().map(|&i| rows[i].clone()).collect();
        let y_train: Vec<bool> = train_idx.iter().map(|&i| labels[i]).collect();
        let x_test: Vec<Vec<f64>> = test_idx.iter().map(|&i| rows[i].clone()).collect();
        let y_test: Vec<bool> = test_idx.iter().map(|&i| labels[i]).collect();

        let (scaler, x_train) = StandardScaler::fit_transform(&x_train)?;
        let x_test = scaler.transform(&x_test)?;

        let model = LogisticRegression::fit(&x_train, &y_train, LogisticParams::default())?;
        let accuracy = model.score(&x_test, &y_test)?;

        let classifier = Self::from_parts(scaler, model)?;
        info!(
            observations = observations.len(),
            positives,
            accuracy,
            top_factor = %classifier.factors[0].feature,
            "trained risk model"
        );
        Ok((classifier, accuracy))
    }

    /// Assemble a classifier from fitted parts, deriving the factor ranking
    pub fn from_parts(scaler: StandardScaler, model: LogisticRegression) -> Result<Self> {
        let expected = RISK_FEATURES.len();
        if scaler.n_features() != expected || model.coefficients().len() != expected {
            return Err(ScoringError::InvalidInput(format!(
                "Risk model expects {} features, scaler has {} and classifier has {}",
                expected,
                scaler.n_features(),
                model.coefficients().len()
            )));
        }

        let mut factors: Vec<FactorImportance> = RISK_FEATURES
            .iter()
            .zip(model.coefficients())
            .map(|(feature, coef)| FactorImportance {
                feature: feature.to_string(),
                importance: coef.abs(),
            })
            .collect();
        factors.sort_by(|a, b| b.importance.total_cmp(&a.importance));

        Ok(Self {
            scaler,
            model,
            factors,
        })
    }

    /// Full factor ranking, most influential first
    pub fn factors(&self) -> &[FactorImportance] {
        &self.factors
    }

    /// Names of the [`TOP_FACTORS`] most influential features
    pub fn top_factors(&self) -> Vec<String> {
        self.factors
            .iter()
            .take(TOP_FACTORS)
            .map(|f| f.feature.clone())
            .collect()
    }

    /// Probability, tier, top factors and confidence for one observation
    pub fn assess(&self, observation: &Observation) -> Result<RiskResult> {
        let scaled = self.scaler.transform_row(&observation.risk_features())?;
        let probability = self.model.predict_proba_row(&scaled)?;
        if !probability.is_finite() {
            return Err(ScoringError::ModelInference(format!(
                "Classifier returned a non-finite probability: {}",
                probability
            )));
        }

        Ok(RiskResult {
            risk_probability: probability,
            risk_level: RiskLevel::from_probability(probability),
            top_factors: self.top_factors(),
            confidence: probability.max(1.0 - probability),
            error: None,
        })
    }

    /// Assess, degrading any failure to [`RiskResult::unknown`]
    pub fn assess_or_unknown(&self, observation: &Observation) -> RiskResult {
        self.assess(observation).unwrap_or_else(|err| {
            warn!(error = %err, "risk assessment degraded to unknown");
            RiskResult::unknown(&err)
        })
    }
}
