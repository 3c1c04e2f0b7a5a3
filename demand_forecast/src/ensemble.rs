//! Confidence-weighted ensembling of demand forecasts

use crate::error::{ForecastError, Result};
use serde::{Deserialize, Serialize};

/// Weights for the primary, second and third model; they sum to 1.0
pub const ENSEMBLE_WEIGHTS: [f64; 3] = [0.4, 0.3, 0.3];

/// Multiplier applied to the averaged model accuracy
pub const DATA_QUALITY_FACTOR: f64 = 0.92;

/// Number of points in the early and late windows of the growth calculation
pub const GROWTH_WINDOW: usize = 7;

/// Combined forecast with its growth and confidence figures
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastResult {
    /// Forecasted values, one per horizon step
    #[serde(rename = "forecast")]
    pub values: Vec<f64>,
    /// Percent change from the early window mean to the late window mean
    pub growth_percentage: f64,
    /// Confidence on a 0-100 scale
    pub confidence: f64,
}

impl ForecastResult {
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn horizon(&self) -> usize {
        self.values.len()
    }
}

/// Combines three model forecasts into one
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastEnsembler {
    weights: [f64; 3],
    data_quality: f64,
    growth_window: usize,
}

impl Default for ForecastEnsembler {
    fn default() -> Self {
        Self {
            weights: ENSEMBLE_WEIGHTS,
            data_quality: DATA_QUALITY_FACTOR,
            growth_window: GROWTH_WINDOW,
        }
    }
}

impl ForecastEnsembler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn weights(&self) -> [f64; 3] {
        self.weights
    }

    /// Build the full forecast result from three predictions and their stored accuracies
    pub fn ensemble(
        &self,
        horizon: usize,
        predictions: [&[f64]; 3],
        accuracies: [f64; 3],
    ) -> Result<ForecastResult> {
        if horizon == 0 {
            return Err(ForecastError::ValidationError(
                "Horizon must be a positive number of periods".to_string(),
            ));
        }
        for (i, prediction) in predictions.iter().enumerate() {
            if prediction.len() != horizon {
                return Err(ForecastError::ValidationError(format!(
                    "Prediction {} has {} values, expected horizon {}",
                    i,
                    prediction.len(),
                    horizon
                )));
            }
        }

        let values = self.combine(predictions)?;
        let growth_percentage = self.growth_percentage(&values)?;
        let confidence = self.confidence(accuracies)?;

        Ok(ForecastResult {
            values,
            growth_percentage,
            confidence,
        })
    }

    /// Weighted sum of the three predictions at each step
    pub fn combine(&self, predictions: [&[f64]; 3]) -> Result<Vec<f64>> {
        let len = predictions[0].len();
        if predictions.iter().any(|p| p.len() != len) {
            return Err(ForecastError::ValidationError(
                "Predictions must have equal lengths".to_string(),
            ));
        }

        let values: Vec<f64> = (0..len)
            .map(|step| {
                predictions
                    .iter()
                    .zip(self.weights.iter())
                    .map(|(p, w)| w * p[step])
                    .sum()
            })
            .collect();

        if values.iter().any(|v: &f64| !v.is_finite()) {
            return Err(ForecastError::ForecastingError(
                "Ensemble produced a non-finite value".to_string(),
            ));
        }
        Ok(values)
    }

    /// Percent change between the mean of the first and last windows.
    ///
    /// Series shorter than the window use every available point for both windows.
    pub fn growth_percentage(&self, values: &[f64]) -> Result<f64> {
        if values.is_empty() {
            return Err(ForecastError::ValidationError(
                "Cannot compute growth of an empty forecast".to_string(),
            ));
        }

        let window = self.growth_window.min(values.len());
        let early = &values[..window];
        let late = &values[values.len() - window..];

        let early_mean = early.iter().sum::<f64>() / window as f64;
        let late_mean = late.iter().sum::<f64>() / window as f64;

        if early_mean == 0.0 {
            return Err(ForecastError::DivisionUndefined(
                "Mean of the early forecast window is zero".to_string(),
            ));
        }

        let growth = (late_mean - early_mean) / early_mean * 100.0;
        if !growth.is_finite() {
            return Err(ForecastError::DivisionUndefined(
                "Growth percentage is not finite".to_string(),
            ));
        }
        Ok(growth)
    }

    /// Mean accuracy scaled by the data-quality factor, clamped to [0, 100]
    pub fn confidence(&self, accuracies: [f64; 3]) -> Result<f64> {
        if accuracies.iter().any(|a| !a.is_finite()) {
            return Err(ForecastError::ValidationError(
                "Model accuracies must be finite".to_string(),
            ));
        }
        let average = accuracies.iter().sum::<f64>() / accuracies.len() as f64;
        Ok((average / 100.0 * self.data_quality * 100.0).clamp(0.0, 100.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_weights_sum_to_one() {
        assert_relative_eq!(ENSEMBLE_WEIGHTS.iter().sum::<f64>(), 1.0);
        assert!(ENSEMBLE_WEIGHTS[0] > ENSEMBLE_WEIGHTS[1]);
        assert_eq!(ENSEMBLE_WEIGHTS[1], ENSEMBLE_WEIGHTS[2]);
    }

    #[test]
    fn test_combine_weights_each_step() {
        let ensembler = ForecastEnsembler::new();
        let values = ensembler
            .combine([&[100.0, 200.0], &[50.0, 50.0], &[0.0, 100.0]])
            .unwrap();
        assert_relative_eq!(values[0], 55.0);
        assert_relative_eq!(values[1], 125.0);
    }

    #[test]
    fn test_growth_uses_first_and_last_week() {
        let ensembler = ForecastEnsembler::new();
        let mut values = vec![100.0; 7];
        values.extend(vec![0.0; 16]);
        values.extend(vec![110.0; 7]);
        assert_relative_eq!(ensembler.growth_percentage(&values).unwrap(), 10.0);
    }

    #[test]
    fn test_confidence_scaling_and_clamp() {
        let ensembler = ForecastEnsembler::new();
        assert_relative_eq!(ensembler.confidence([90.0, 80.0, 85.0]).unwrap(), 78.2);
        assert_relative_eq!(ensembler.confidence([-50.0, -20.0, 10.0]).unwrap(), 0.0);
        assert_relative_eq!(ensembler.confidence([200.0, 150.0, 150.0]).unwrap(), 100.0);
    }
}
