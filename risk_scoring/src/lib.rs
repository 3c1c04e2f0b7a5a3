//! # Risk Scoring
//!
//! `risk_scoring` turns a single supply chain observation into decisions:
//! whether it is anomalous, how likely it is to be a high-risk shipment and
//! where it sits on the composite risk index.
//!
//! ## Scorers
//!
//! - **Anomaly**: isolation-forest density scoring over five features, with a
//!   temperature z-score scorer behind the same [`AnomalyScorer`] trait
//! - **Risk**: logistic regression over four features with ranked contributing factors
//! - **Composite**: weighted supply chain risk index and the fraud sub-score
//!
//! ## Usage Example
//!
//! ```no_run
//! use risk_scoring::utils::generate_observations;
//! use risk_scoring::{AnomalyScorer, DensityAnomalyScorer, Observation, RiskClassifier};
//!
//! let history = generate_observations(500, 42).unwrap();
//! let detector = DensityAnomalyScorer::train(&history, 42).unwrap();
//! let (classifier, accuracy) = RiskClassifier::train(&history, 42).unwrap();
//!
//! let observation = Observation::from_json(r#"{"temperature": 38, "delay_days": 6}"#).unwrap();
//! let anomaly = detector.score(&observation).unwrap();
//! let risk = classifier.assess(&observation).unwrap();
//! println!("{:?} {:?} (accuracy {:.2})", anomaly.severity, risk.risk_level, accuracy);
//! ```

use supply_math::MathError;
use thiserror::Error;

pub mod anomaly;
pub mod composite;
pub mod observation;
pub mod risk;
// Synthetic observation generator
pub mod utils;

pub use anomaly::{
    AnomalyEvidence, AnomalyResult, AnomalyScorer, DensityAnomalyScorer, Severity,
    ZScoreAnomalyScorer,
};
pub use composite::{assess_fraud, composite_risk_index, FraudAssessment, FraudCategory, SubScores};
pub use observation::Observation;
pub use risk::{risk_label, RiskClassifier, RiskLevel, RiskResult};

/// Errors that can occur while scoring observations
#[derive(Error, Debug)]
pub enum ScoringError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Malformed input: {0}")]
    MalformedInput(#[from] serde_json::Error),

    #[error("Model inference failed: {0}")]
    ModelInference(String),

    #[error("Model error: {0}")]
    Math(#[from] MathError),
}

/// Result type for scoring operations
pub type Result<T> = std::result::Result<T, ScoringError>;
