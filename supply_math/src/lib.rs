//! # Supply Math
//!
//! Numeric building blocks for the supply chain models.
//! This crate provides small, dependency-light implementations of the
//! estimators the forecasting and scoring crates are built on:
//!
//! - Feature standardisation (`StandardScaler`)
//! - Ordinary least squares regression
//! - Regression trees and random forests
//! - Isolation forests for density-based anomaly scores
//! - L2-regularised logistic regression
//! - ARIMA(p, d, 0) time series models
//!
//! All randomised estimators take an explicit seed so that training is reproducible.

use thiserror::Error;

pub mod arima;
pub mod forest;
pub mod isolation;
pub mod logistic;
pub mod preprocessing;
pub mod regression;
pub mod stats;

pub use arima::Arima;
pub use forest::{RandomForestRegressor, RegressionTree};
pub use isolation::IsolationForest;
pub use logistic::LogisticRegression;
pub use preprocessing::StandardScaler;
pub use regression::LinearRegression;

/// Errors that can occur while fitting or evaluating a model
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MathError {
    #[error("Insufficient data for calculation: {0}")]
    InsufficientData(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Calculation error: {0}")]
    CalculationError(String),

    #[error("Model has not been fitted: {0}")]
    NotFitted(String),
}

/// Result type for numeric operations
pub type Result<T> = std::result::Result<T, MathError>;

/// Check that a feature matrix is non-empty and rectangular, returning its width.
pub(crate) fn check_matrix(rows: &[Vec<f64>]) -> Result<usize> {
    let first = rows.first().ok_or_else(|| {
        MathError::InsufficientData("Feature matrix must contain at least one row".to_string())
    })?;
    let width = first.len();
    if width == 0 {
        return Err(MathError::InvalidInput(
            "Feature matrix must contain at least one column".to_string(),
        ));
    }

    for (i, row) in rows.iter().enumerate() {
        if row.len() != width {
            return Err(MathError::InvalidInput(format!(
                "Row {} has {} features, expected {}",
                i,
                row.len(),
                width
            )));
        }
        if row.iter().any(|v| !v.is_finite()) {
            return Err(MathError::InvalidInput(format!(
                "Row {} contains a non-finite value",
                i
            )));
        }
    }

    Ok(width)
}

/// Check that a single row matches the expected width and holds finite values.
pub(crate) fn check_row(row: &[f64], width: usize) -> Result<()> {
    if row.len() != width {
        return Err(MathError::InvalidInput(format!(
            "Expected {} features, got {}",
            width,
            row.len()
        )));
    }
    if row.iter().any(|v| !v.is_finite()) {
        return Err(MathError::InvalidInput(
            "Input contains a non-finite value".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_check_matrix_rejects_ragged_rows() {
        let rows = vec![vec![1.0, 2.0], vec![3.0]];
        assert!(matches!(check_matrix(&rows), Err(MathError::InvalidInput(_))));
    }

    #[test]
    fn test_check_matrix_rejects_empty() {
        let rows: Vec<Vec<f64>> = Vec::new();
        assert!(matches!(
            check_matrix(&rows),
            Err(MathError::InsufficientData(_))
        ));
    }

    #[rstest]
    #[case(&[1.0, 2.0], true)]
    #[case(&[1.0, f64::NAN], false)]
    #[case(&[f64::INFINITY, 2.0], false)]
    #[case(&[1.0], false)]
    #[case(&[1.0, 2.0, 3.0], false)]
    fn test_check_row(#[case] row: &[f64], #[case] valid: bool) {
        assert_eq!(check_row(row, 2).is_ok(), valid);
    }
}
