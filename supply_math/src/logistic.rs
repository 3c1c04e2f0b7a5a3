//! Binary logistic regression with L2 regularisation

use crate::regression::solve_linear_system;
use crate::{check_matrix, check_row, MathError, Result};
use serde::{Deserialize, Serialize};

/// Binary classifier minimising `C * log_loss + 0.5 * ||w||^2`.
///
/// The intercept is not penalised. Fitting uses Newton steps, which converge in a
/// handful of iterations on standardised features.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticRegression {
    coefficients: Vec<f64>,
    intercept: f64,
    iterations: usize,
}

/// Fitting options
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LogisticParams {
    /// Inverse regularisation strength
    pub c: f64,
    pub max_iter: usize,
    pub tolerance: f64,
}

impl Default for LogisticParams {
    fn default() -> Self {
        Self {
            c: 1.0,
            max_iter: 100,
            tolerance: 1e-8,
        }
    }
}

fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

impl LogisticRegression {
    /// Fit on a feature matrix and boolean labels
    pub fn fit(x: &[Vec<f64>], y: &[bool], params: LogisticParams) -> Result<Self> {
        let width = check_matrix(x)?;
        if x.len() != y.len() {
            return Err(MathError::InvalidInput(format!(
                "Feature rows ({}) and labels ({}) differ in length",
                x.len(),
                y.len()
            )));
        }
        if y.iter().all(|&l| l) || y.iter().all(|&l| !l) {
            return Err(MathError::InvalidInput(
                "Labels must contain both classes".to_string(),
            ));
        }
        if !(params.c > 0.0) {
            return Err(MathError::InvalidInput(
                "Regularisation parameter C must be positive".to_string(),
            ));
        }

        // theta = [intercept, w_1, ..., w_p]
        let dim = width + 1;
        let mut theta = vec![0.0; dim];
        let mut iterations = 0;

        for _ in 0..params.max_iter {
            iterations += 1;
            let mut gradient = vec![0.0; dim];
            let mut hessian = vec![vec![0.0; dim]; dim];

            for (row, &label) in x.iter().zip(y.iter()) {
                let design: Vec<f64> = std::iter::once(1.0).chain(row.iter().copied()).collect();
                let z: f64 = design.iter().zip(theta.iter()).map(|(a, b)| a * b).sum();
                let p = sigmoid(z);
                let residual = p - if label { 1.0 } else { 0.0 };
                let weight = p * (1.0 - p);

                for i in 0..dim {
                    gradient[i] += params.c * residual * design[i];
                    for j in 0..dim {
                        hessian[i][j] += params.c * weight * design[i] * design[j];
                    }
                }
            }

            for i in 1..dim {
                gradient[i] += theta[i];
                hessian[i][i] += 1.0;
            }
            hessian[0][0] += 1e-10;

            let step = solve_linear_system(hessian, gradient)?;
            let max_step = step.iter().fold(0.0f64, |m, s| m.max(s.abs()));
            for (t, s) in theta.iter_mut().zip(step.iter()) {
                *t -= s;
            }

            if max_step < params.tolerance {
                break;
            }
        }

        Ok(Self {
            intercept: theta[0],
            coefficients: theta[1..].to_vec(),
            iterations,
        })
    }

    /// Probability of the positive class for one row
    pub fn predict_proba_row(&self, row: &[f64]) -> Result<f64> {
        check_row(row, self.coefficients.len())?;
        let z = self.intercept
            + row
                .iter()
                .zip(self.coefficients.iter())
                .map(|(x, w)| x * w)
                .sum::<f64>();
        Ok(sigmoid(z))
    }

    /// Hard prediction with a 0.5 threshold
    pub fn predict_row(&self, row: &[f64]) -> Result<bool> {
        Ok(self.predict_proba_row(row)? >= 0.5)
    }

    /// Share of rows whose hard prediction matches the label
    pub fn score(&self, x: &[Vec<f64>], y: &[bool]) -> Result<f64> {
        if x.len() != y.len() || x.is_empty() {
            return Err(MathError::InvalidInput(
                "Scoring needs equally sized, non-empty rows and labels".to_string(),
            ));
        }
        let mut correct = 0usize;
        for (row, &label) in x.iter().zip(y.iter()) {
            if self.predict_row(row)? == label {
                correct += 1;
            }
        }
        Ok(correct as f64 / x.len() as f64)
    }

    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    pub fn intercept(&self) -> f64 {
        self.intercept
    }

    /// Newton iterations used during fitting
    pub fn iterations(&self) -> usize {
        self.iterations
    }
}
