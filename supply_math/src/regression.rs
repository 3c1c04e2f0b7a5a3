//! Ordinary least squares regression

use crate::{check_matrix, check_row, MathError, Result};
use serde::{Deserialize, Serialize};

/// Small ridge term added to the slope diagonal of the normal equations
const RIDGE: f64 = 1e-9;

/// Multi-feature linear regression fitted by ordinary least squares
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearRegression {
    coefficients: Vec<f64>,
    intercept: f64,
}

impl LinearRegression {
    /// Fit the model to a row-major feature matrix and targets
    pub fn fit(x: &[Vec<f64>], y: &[f64]) -> Result<Self> {
        let width = check_matrix(x)?;
        if x.len() != y.len() {
            return Err(MathError::InvalidInput(format!(
                "Feature rows ({}) and targets ({}) differ in length",
                x.len(),
                y.len()
            )));
        }
        if x.len() < 2 {
            return Err(MathError::InsufficientData(
                "Need at least 2 samples to fit a linear regression".to_string(),
            ));
        }

        // Normal equations over the design [1, x_1, ..., x_p]
        let dim = width + 1;
        let mut xtx = vec![vec![0.0; dim]; dim];
        let mut xty = vec![0.0; dim];

        for (row, &target) in x.iter().zip(y.iter()) {
            let design: Vec<f64> = std::iter::once(1.0).chain(row.iter().copied()).collect();
            for i in 0..dim {
                xty[i] += design[i] * target;
                for j in 0..dim {
                    xtx[i][j] += design[i] * design[j];
                }
            }
        }
        for (i, row) in xtx.iter_mut().enumerate().skip(1) {
            row[i] += RIDGE;
        }

        let beta = solve_linear_system(xtx, xty)?;

        Ok(Self {
            intercept: beta[0],
            coefficients: beta[1..].to_vec(),
        })
    }

    /// Predict the target for one feature row
    pub fn predict_row(&self, row: &[f64]) -> Result<f64> {
        check_row(row, self.coefficients.len())?;
        Ok(self.intercept
            + row
                .iter()
                .zip(self.coefficients.iter())
                .map(|(x, c)| x * c)
                .sum::<f64>())
    }

    /// Predict targets for every row
    pub fn predict(&self, x: &[Vec<f64>]) -> Result<Vec<f64>> {
        x.iter().map(|row| self.predict_row(row)).collect()
    }

    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    pub fn intercept(&self) -> f64 {
        self.intercept
    }
}

/// Solve `a * x = b` by Gaussian elimination with partial pivoting.
pub(crate) fn solve_linear_system(mut a: Vec<Vec<f64>>, mut b: Vec<f64>) -> Result<Vec<f64>> {
    let n = b.len();
    if a.len() != n || a.iter().any(|row| row.len() != n) {
        return Err(MathError::InvalidInput(
            "Linear system must be square and match the right-hand side".to_string(),
        ));
    }

    for col in 0..n {
        let pivot = (col..n)
            .max_by(|&i, &j| a[i][col].abs().total_cmp(&a[j][col].abs()))
            .unwrap_or(col);

        if a[pivot][col].abs() < 1e-12 {
            return Err(MathError::CalculationError(
                "Linear system is singular".to_string(),
            ));
        }

        a.swap(col, pivot);
        b.swap(col, pivot);

        for row in (col + 1)..n {
            let factor = a[row][col] / a[col][col];
            if factor == 0.0 {
                continue;
            }
            for k in col..n {
                a[row][k] -= factor * a[col][k];
            }
            b[row] -= factor * b[col];
        }
    }

    let mut x = vec![0.0; n];
    for row in (0..n).rev() {
        let tail: f64 = ((row + 1)..n).map(|k| a[row][k] * x[k]).sum();
        x[row] = (b[row] - tail) / a[row][row];
    }

    if x.iter().any(|v| !v.is_finite()) {
        return Err(MathError::CalculationError(
            "Linear system produced a non-finite solution".to_string(),
        ));
    }

    Ok(x)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_recovers_exact_plane() {
        // y = 3 + 2*x1 - 0.5*x2
        let x: Vec<Vec<f64>> = (0..20)
            .map(|i| vec![i as f64, ((i * 7) % 5) as f64])
            .collect();
        let y: Vec<f64> = x.iter().map(|r| 3.0 + 2.0 * r[0] - 0.5 * r[1]).collect();

        let model = LinearRegression::fit(&x, &y).unwrap();
        assert_relative_eq!(model.intercept(), 3.0, epsilon = 1e-6);
        assert_relative_eq!(model.coefficients()[0], 2.0, epsilon = 1e-6);
        assert_relative_eq!(model.coefficients()[1], -0.5, epsilon = 1e-6);
        assert_relative_eq!(model.predict_row(&[10.0, 2.0]).unwrap(), 22.0, epsilon = 1e-6);
    }

    #[test]
    fn test_length_mismatch_is_rejected() {
        let x = vec![vec![1.0], vec![2.0]];
        assert!(LinearRegression::fit(&x, &[1.0]).is_err());
    }

    #[test]
    fn test_solve_singular_system() {
        let a = vec![vec![1.0, 2.0], vec![2.0, 4.0]];
        assert!(matches!(
            solve_linear_system(a, vec![1.0, 2.0]),
            Err(MathError::CalculationError(_))
        ));
    }
}
