//! Error types for the demand_forecast crate

use supply_math::MathError;
use thiserror::Error;

/// Custom error types for the demand_forecast crate
#[derive(Debug, Error)]
pub enum ForecastError {
    /// Error related to data validation or processing
    #[error("Data error: {0}")]
    DataError(String),

    /// Error related to forecasting operations
    #[error("Forecasting error: {0}")]
    ForecastingError(String),

    /// Error related to parameter validation
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// A ratio whose denominator is exactly zero
    #[error("Division undefined: {0}")]
    DivisionUndefined(String),

    /// A model name missing from the metrics document
    #[error("Missing metrics for model: {0}")]
    MissingMetrics(String),

    /// Error from the underlying numeric routines
    #[error("Math error: {0}")]
    MathError(#[from] MathError),
}

/// Result type with our custom error
pub type Result<T> = std::result::Result<T, ForecastError>;
