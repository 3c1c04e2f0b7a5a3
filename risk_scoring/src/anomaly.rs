//! Anomaly scoring
//!
//! Two scorers share the [`AnomalyScorer`] trait:
//!
//! - [`DensityAnomalyScorer`] scales the five observation features and scores them
//!   with an isolation forest. Lower scores are more anomalous and the observation is
//!   flagged when it falls below the offset fixed at training time.
//! - [`ZScoreAnomalyScorer`] looks at temperature alone against a fixed transport
//!   baseline of 25°C ± 5°C.

use crate::observation::{Observation, ANOMALY_FEATURES};
use crate::{Result, ScoringError};
use serde::{Deserialize, Serialize};
use std::fmt;
use supply_math::{IsolationForest, StandardScaler};
use tracing::{info, warn};

/// Severity tier of an anomaly score
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    /// Tier for an isolation-forest score. Both boundaries are inclusive:
    /// -0.5 is HIGH and -0.2 is MEDIUM.
    pub fn from_density_score(score: f64) -> Self {
        if score <= -0.5 {
            Severity::High
        } else if score <= -0.2 {
            Severity::Medium
        } else {
            Severity::Low
        }
    }

    /// Tier for an absolute temperature z-score
    pub fn from_z_score(z: f64) -> Self {
        if z > 3.0 {
            Severity::High
        } else if z > 2.0 {
            Severity::Medium
        } else {
            Severity::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "LOW",
            Severity::Medium => "MEDIUM",
            Severity::High => "HIGH",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Scorer-specific detail behind an [`AnomalyResult`]
#[derive(Debug, Clone, PartialEq)]
pub enum AnomalyEvidence {
    /// Isolation-forest score minus the training offset
    Density { decision: f64 },
    /// Temperature deviation from the transport baseline
    ZScore {
        z_score: f64,
        /// Anomaly probability on a 0-100 scale
        probability: f64,
        explanation: String,
    },
}

/// Outcome of scoring one observation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyResult {
    #[serde(rename = "anomaly")]
    pub is_anomaly: bool,
    /// Lower is more anomalous
    pub score: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<Severity>,
    #[serde(skip)]
    pub evidence: Option<AnomalyEvidence>,
    /// Set when this is a degraded fallback rather than a model result
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AnomalyResult {
    /// Non-anomalous result carrying the failure that produced it
    pub fn fallback(error: &dyn fmt::Display) -> Self {
        Self {
            is_anomaly: false,
            score: 0.0,
            severity: None,
            evidence: None,
            error: Some(error.to_string()),
        }
    }

    pub fn is_fallback(&self) -> bool {
        self.error.is_some()
    }
}

/// Strategy that decides whether an observation is anomalous
pub trait AnomalyScorer {
    /// Score one observation
    fn score(&self, observation: &Observation) -> Result<AnomalyResult>;

    /// Short identifier of the scorer
    fn name(&self) -> &str;

    /// Score one observation, degrading any failure to [`AnomalyResult::fallback`]
    fn score_or_fallback(&self, observation: &Observation) -> AnomalyResult {
        self.score(observation).unwrap_or_else(|err| {
            warn!(scorer = self.name(), error = %err, "anomaly scoring degraded to fallback");
            AnomalyResult::fallback(&err)
        })
    }
}

/// Isolation-forest scorer over standardised observation features
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DensityAnomalyScorer {
    scaler: StandardScaler,
    forest: IsolationForest,
}

impl DensityAnomalyScorer {
    /// Expected share of outliers in the training observations
    pub const CONTAMINATION: f64 = 0.05;

    /// Fit the scaler and isolation forest on historical observations
    pub fn train(observations: &[Observation], seed: u64) -> Result<Self> {
        let rows: Vec<Vec<f64>> = observations.iter().map(|o| o.anomaly_features()).collect();
        let (scaler, scaled) = StandardScaler::fit_transform(&rows)?;
        let forest = IsolationForest::fit(
            &scaled,
            IsolationForest::DEFAULT_ESTIMATORS,
            Self::CONTAMINATION,
            seed,
        )?;

        info!(
            observations = observations.len(),
            offset = forest.offset(),
            "trained anomaly model"
        );
        Self::from_parts(scaler, forest)
    }

    /// Assemble a scorer from previously fitted parts
    pub fn from_parts(scaler: StandardScaler, forest: IsolationForest) -> Result<Self> {
        let expected = ANOMALY_FEATURES.len();
        if scaler.n_features() != expected || forest.n_features() != expected {
            return Err(ScoringError::InvalidInput(format!(
                "Anomaly model expects {} features, scaler has {} and forest has {}",
                expected,
                scaler.n_features(),
                forest.n_features()
            )));
        }
        Ok(Self { scaler, forest })
    }

    /// Decision threshold on the raw score
    pub fn offset(&self) -> f64 {
        self.forest.offset()
    }

    pub fn scaler(&self) -> &StandardScaler {
        &self.scaler
    }
}

impl AnomalyScorer for DensityAnomalyScorer {
    fn score(&self, observation: &Observation) -> Result<AnomalyResult> {
        let scaled = self.scaler.transform_row(&observation.anomaly_features())?;
        let score = self.forest.score_row(&scaled)?;
        let decision = score - self.forest.offset();

        Ok(AnomalyResult {
            is_anomaly: decision < 0.0,
            score,
            severity: Some(Severity::from_density_score(score)),
            evidence: Some(AnomalyEvidence::Density { decision }),
            error: None,
        })
    }

    fn name(&self) -> &str {
        "isolation_forest"
    }
}

/// Temperature z-score scorer
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZScoreAnomalyScorer {
    baseline: f64,
    spread: f64,
    threshold: f64,
}

impl Default for ZScoreAnomalyScorer {
    fn default() -> Self {
        Self {
            baseline: 25.0,
            spread: 5.0,
            threshold: 2.0,
        }
    }
}

impl ZScoreAnomalyScorer {
    pub fn new(baseline: f64, spread: f64, threshold: f64) -> Result<Self> {
        if !baseline.is_finite() || baseline == 0.0 {
            return Err(ScoringError::InvalidInput(
                "Baseline temperature must be finite and non-zero".to_string(),
            ));
        }
        if !spread.is_finite() || spread <= 0.0 {
            return Err(ScoringError::InvalidInput(
                "Temperature spread must be finite and positive".to_string(),
            ));
        }
        if !threshold.is_finite() || threshold <= 0.0 {
            return Err(ScoringError::InvalidInput(
                "Z-score threshold must be finite and positive".to_string(),
            ));
        }
        Ok(Self {
            baseline,
            spread,
            threshold,
        })
    }

    /// Absolute z-score of a temperature reading
    pub fn z_score(&self, temperature: f64) -> f64 {
        ((temperature - self.baseline) / self.spread).abs()
    }
}

impl AnomalyScorer for ZScoreAnomalyScorer {
    fn score(&self, observation: &Observation) -> Result<AnomalyResult> {
        let temperature = observation.temperature;
        if !temperature.is_finite() {
            return Err(ScoringError::InvalidInput(format!(
                "Temperature must be finite, got {}",
                temperature
            )));
        }

        let z_score = self.z_score(temperature);
        let is_anomaly = z_score > self.threshold;
        let probability = (z_score / 3.0 * 100.0).min(100.0);
        let explanation = if is_anomaly {
            let deviation = ((temperature - self.baseline) / self.baseline * 100.0).abs();
            format!(
                "Temperature exceeded acceptable threshold by {:.1}% during transport phase, increasing spoilage risk probability.",
                deviation
            )
        } else {
            String::new()
        };

        Ok(AnomalyResult {
            is_anomaly,
            score: -z_score,
            severity: Some(Severity::from_z_score(z_score)),
            evidence: Some(AnomalyEvidence::ZScore {
                z_score,
                probability,
                explanation,
            }),
            error: None,
        })
    }

    fn name(&self) -> &str {
        "temperature_z_score"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    fn temperature(t: f64) -> Observation {
        Observation::new(500.0, 1000.0, 0.0, t, 800.0)
    }

    #[rstest]
    #[case(-0.5, Severity::High)]
    #[case(-0.7, Severity::High)]
    #[case(-0.2, Severity::Medium)]
    #[case(-0.35, Severity::Medium)]
    #[case(-0.1999, Severity::Low)]
    #[case(0.0, Severity::Low)]
    fn test_density_severity_boundaries(#[case] score: f64, #[case] expected: Severity) {
        assert_eq!(Severity::from_density_score(score), expected);
    }

    #[test]
    fn test_baseline_temperature_is_normal() {
        let result = ZScoreAnomalyScorer::default().score(&temperature(25.0)).unwrap();

        assert!(!result.is_anomaly);
        assert_eq!(result.severity, Some(Severity::Low));
        match result.evidence {
            Some(AnomalyEvidence::ZScore {
                z_score,
                probability,
                ref explanation,
            }) => {
                assert_relative_eq!(z_score, 0.0);
                assert_relative_eq!(probability, 0.0);
                assert!(explanation.is_empty());
            }
            other => panic!("unexpected evidence {:?}", other),
        }
    }

    #[test]
    fn test_hot_shipment_is_flagged() {
        // z = 2.6, deviation = 52%
        let result = ZScoreAnomalyScorer::default().score(&temperature(38.0)).unwrap();

        assert!(result.is_anomaly);
        assert_relative_eq!(result.score, -2.6, epsilon = 1e-12);
        assert_eq!(result.severity, Some(Severity::Medium));
        match result.evidence {
            Some(AnomalyEvidence::ZScore {
                probability,
                ref explanation,
                ..
            }) => {
                assert_relative_eq!(probability, 2.6 / 3.0 * 100.0, epsilon = 1e-9);
                assert_eq!(
                    explanation,
                    "Temperature exceeded acceptable threshold by 52.0% during transport phase, increasing spoilage risk probability."
                );
            }
            other => panic!("unexpected evidence {:?}", other),
        }
    }

    #[test]
    fn test_probability_saturates() {
        let result = ZScoreAnomalyScorer::default().score(&temperature(-10.0)).unwrap();
        assert_eq!(result.severity, Some(Severity::High));
        match result.evidence {
            Some(AnomalyEvidence::ZScore { probability, .. }) => {
                assert_relative_eq!(probability, 100.0)
            }
            other => panic!("unexpected evidence {:?}", other),
        }
    }

    #[test]
    fn test_non_finite_temperature_falls_back() {
        let scorer = ZScoreAnomalyScorer::default();
        assert!(scorer.score(&temperature(f64::NAN)).is_err());

        let fallback = scorer.score_or_fallback(&temperature(f64::INFINITY));
        assert!(!fallback.is_anomaly);
        assert!(fallback.is_fallback());
        assert_relative_eq!(fallback.score, 0.0);
    }

    #[test]
    fn test_fallback_serialization() {
        let fallback = AnomalyResult::fallback(&"model missing");
        let json = serde_json::to_value(&fallback).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"anomaly": false, "score": 0.0, "error": "model missing"})
        );
    }
}
