//! Error types for the supply_insight engine

use crate::config::ArtifactKey;
use demand_forecast::ForecastError;
use risk_scoring::ScoringError;
use thiserror::Error;

/// Errors raised while loading, training or running the pipeline
#[derive(Debug, Error)]
pub enum EngineError {
    /// A trained artifact has not been persisted yet; recoverable by training
    #[error("Missing artifact: {0}")]
    MissingArtifact(ArtifactKey),

    /// Input rejected before reaching a model
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Forecast(#[from] ForecastError),

    #[error(transparent)]
    Scoring(#[from] ScoringError),
}

impl EngineError {
    pub fn is_missing_artifact(&self) -> bool {
        matches!(self, EngineError::MissingArtifact(_))
    }
}

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;
