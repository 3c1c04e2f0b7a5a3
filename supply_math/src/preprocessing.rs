//! Feature scaling

use crate::stats::{column, mean, population_std};
use crate::{check_matrix, check_row, Result};
use serde::{Deserialize, Serialize};

/// Standardises features by removing the mean and scaling to unit variance.
///
/// Constant features keep a scale of 1.0 so they map to zero instead of dividing by zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    mean: Vec<f64>,
    scale: Vec<f64>,
}

impl StandardScaler {
    /// Learn per-feature mean and scale from a row-major matrix
    pub fn fit(rows: &[Vec<f64>]) -> Result<Self> {
        let width = check_matrix(rows)?;

        let mut means = Vec::with_capacity(width);
        let mut scales = Vec::with_capacity(width);
        for j in 0..width {
            let values = column(rows, j);
            means.push(mean(&values)?);
            let std = population_std(&values)?;
            scales.push(if std > f64::EPSILON { std } else { 1.0 });
        }

        Ok(Self {
            mean: means,
            scale: scales,
        })
    }

    /// Build a scaler from known parameters
    pub fn from_parameters(mean: Vec<f64>, scale: Vec<f64>) -> Result<Self> {
        if mean.len() != scale.len() || mean.is_empty() {
            return Err(crate::MathError::InvalidInput(
                "Mean and scale must be non-empty and of equal length".to_string(),
            ));
        }
        if scale.iter().any(|s| !s.is_finite() || *s <= 0.0) {
            return Err(crate::MathError::InvalidInput(
                "Scale values must be finite and positive".to_string(),
            ));
        }
        Ok(Self { mean, scale })
    }

    /// Scale a single row
    pub fn transform_row(&self, row: &[f64]) -> Result<Vec<f64>> {
        check_row(row, self.mean.len())?;
        Ok(row
            .iter()
            .zip(self.mean.iter().zip(self.scale.iter()))
            .map(|(x, (m, s))| (x - m) / s)
            .collect())
    }

    /// Scale every row of a matrix
    pub fn transform(&self, rows: &[Vec<f64>]) -> Result<Vec<Vec<f64>>> {
        rows.iter().map(|row| self.transform_row(row)).collect()
    }

    /// Fit on `rows` and return the scaler with the transformed matrix
    pub fn fit_transform(rows: &[Vec<f64>]) -> Result<(Self, Vec<Vec<f64>>)> {
        let scaler = Self::fit(rows)?;
        let scaled = scaler.transform(rows)?;
        Ok((scaler, scaled))
    }

    pub fn mean(&self) -> &[f64] {
        &self.mean
    }

    pub fn scale(&self) -> &[f64] {
        &self.scale
    }

    pub fn n_features(&self) -> usize {
        self.mean.len()
    }
}
