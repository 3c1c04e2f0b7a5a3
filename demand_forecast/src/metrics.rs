//! Metrics for evaluating forecast performance

use crate::error::{ForecastError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Model names used as keys in the metrics document
pub const LINEAR_REGRESSION: &str = "linear_regression";
pub const RANDOM_FOREST: &str = "random_forest";
pub const ARIMA: &str = "arima";

fn check_lengths(actual: &[f64], predicted: &[f64]) -> Result<()> {
    if actual.len() != predicted.len() || actual.is_empty() {
        return Err(ForecastError::ValidationError(
            "Forecast and actual values must have the same non-zero length".to_string(),
        ));
    }
    Ok(())
}

/// Mean Absolute Error
pub fn mean_absolute_error(actual: &[f64], predicted: &[f64]) -> Result<f64> {
    check_lengths(actual, predicted)?;
    let n = actual.len() as f64;
    Ok(actual
        .iter()
        .zip(predicted.iter())
        .map(|(a, p)| (a - p).abs())
        .sum::<f64>()
        / n)
}

/// Root Mean Squared Error
pub fn root_mean_squared_error(actual: &[f64], predicted: &[f64]) -> Result<f64> {
    check_lengths(actual, predicted)?;
    let n = actual.len() as f64;
    let mse = actual
        .iter()
        .zip(predicted.iter())
        .map(|(a, p)| (a - p).powi(2))
        .sum::<f64>()
        / n;
    Ok(mse.sqrt())
}

/// Coefficient of determination.
///
/// A constant `actual` series scores 1.0 when predicted exactly and 0.0 otherwise.
pub fn r2_score(actual: &[f64], predicted: &[f64]) -> Result<f64> {
    check_lengths(actual, predicted)?;
    let n = actual.len() as f64;
    let mean = actual.iter().sum::<f64>() / n;

    let ss_res: f64 = actual
        .iter()
        .zip(predicted.iter())
        .map(|(a, p)| (a - p).powi(2))
        .sum();
    let ss_tot: f64 = actual.iter().map(|a| (a - mean).powi(2)).sum();

    if ss_tot.abs() < f64::EPSILON {
        return Ok(if ss_res.abs() < f64::EPSILON { 1.0 } else { 0.0 });
    }

    Ok(1.0 - ss_res / ss_tot)
}

/// Stored accuracy figures for one model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelMetrics {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mae: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rmse: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub r2: Option<f64>,
    /// Accuracy on a 0-100 scale
    pub accuracy: f64,
}

impl ModelMetrics {
    /// Evaluate predictions against held-out actuals; accuracy is R² expressed in percent
    pub fn evaluate(actual: &[f64], predicted: &[f64]) -> Result<Self> {
        let r2 = r2_score(actual, predicted)?;
        Ok(Self {
            mae: Some(mean_absolute_error(actual, predicted)?),
            rmse: Some(root_mean_squared_error(actual, predicted)?),
            r2: Some(r2),
            accuracy: r2 * 100.0,
        })
    }

    /// Metrics that only carry an accuracy figure
    pub fn accuracy_only(accuracy: f64) -> Self {
        Self {
            mae: None,
            rmse: None,
            r2: None,
            accuracy,
        }
    }
}

impl std::fmt::Display for ModelMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let (Some(mae), Some(rmse), Some(r2)) = (self.mae, self.rmse, self.r2) {
            write!(f, "MAE: {:.2}, RMSE: {:.2}, R2: {:.4}", mae, rmse, r2)
        } else {
            write!(f, "Accuracy: {:.2}", self.accuracy)
        }
    }
}

/// Accuracy metrics keyed by model name, persisted as a flat JSON object
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MetricsDocument {
    models: BTreeMap<String, ModelMetrics>,
}

impl MetricsDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, model: impl Into<String>, metrics: ModelMetrics) {
        self.models.insert(model.into(), metrics);
    }

    pub fn get(&self, model: &str) -> Option<&ModelMetrics> {
        self.models.get(model)
    }

    /// Accuracy of a model, failing when the model has no entry
    pub fn accuracy(&self, model: &str) -> Result<f64> {
        self.get(model)
            .map(|m| m.accuracy)
            .ok_or_else(|| ForecastError::MissingMetrics(model.to_string()))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ModelMetrics)> {
        self.models.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_regression_metrics() {
        let actual = vec![10.0, 20.0, 30.0, 40.0, 50.0];
        let predicted = vec![12.0, 18.0, 33.0, 37.0, 52.0];

        assert_relative_eq!(mean_absolute_error(&actual, &predicted).unwrap(), 2.4);
        assert_relative_eq!(
            root_mean_squared_error(&actual, &predicted).unwrap(),
            30.0f64.sqrt() / 5.0f64.sqrt()
        );
        let r2 = r2_score(&actual, &predicted).unwrap();
        assert_relative_eq!(r2, 1.0 - 30.0 / 1000.0);
    }

    #[test]
    fn test_constant_actuals() {
        assert_relative_eq!(r2_score(&[5.0, 5.0], &[5.0, 5.0]).unwrap(), 1.0);
        assert_relative_eq!(r2_score(&[5.0, 5.0], &[4.0, 6.0]).unwrap(), 0.0);
    }

    #[test]
    fn test_mismatched_lengths() {
        assert!(mean_absolute_error(&[1.0, 2.0], &[1.0]).is_err());
        assert!(r2_score(&[], &[]).is_err());
    }

    #[test]
    fn test_document_serializes_flat() {
        let mut doc = MetricsDocument::new();
        doc.insert(ARIMA, ModelMetrics::accuracy_only(85.0));
        let json = serde_json::to_value(&doc).unwrap();
        assert_eq!(json, serde_json::json!({"arima": {"accuracy": 85.0}}));

        assert_relative_eq!(doc.accuracy(ARIMA).unwrap(), 85.0);
        assert!(matches!(
            doc.accuracy(RANDOM_FOREST),
            Err(ForecastError::MissingMetrics(_))
        ));
    }
}
