//! ARIMA models for time series forecasting
//!
//! Only the autoregressive and integrated parts are supported (ARIMA(p, d, 0)).
//! AR coefficients are estimated from the Yule-Walker equations with the
//! Levinson-Durbin recursion, and the differenced series keeps its drift as a
//! constant term.

use crate::stats::mean;
use crate::{MathError, Result};
use serde::{Deserialize, Serialize};

/// Fitted ARIMA(p, d, 0) model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Arima {
    /// AR order (p)
    p: usize,
    /// Differencing order (d)
    d: usize,
    /// Fitted AR coefficients
    ar_coefficients: Vec<f64>,
    /// Constant term of the differenced process
    constant: f64,
    /// Last value of the series at each differencing level, from level 0 upwards
    level_tails: Vec<f64>,
    /// Most recent values of the fully differenced series, oldest first
    recent: Vec<f64>,
}

impl Arima {
    /// Fit ARIMA(p, d, 0) to a series
    pub fn fit(series: &[f64], p: usize, d: usize) -> Result<Self> {
        if d > 2 {
            return Err(MathError::InvalidInput(
                "Differencing order must be <= 2".to_string(),
            ));
        }
        if series.len() < p + d + 2 {
            return Err(MathError::InsufficientData(format!(
                "Insufficient data for ARIMA({},{},0). Need at least {} observations.",
                p,
                d,
                p + d + 2
            )));
        }
        if series.iter().any(|v| !v.is_finite()) {
            return Err(MathError::InvalidInput(
                "Series contains a non-finite value".to_string(),
            ));
        }

        let mut level_tails = Vec::with_capacity(d);
        let mut working = series.to_vec();
        for _ in 0..d {
            level_tails.push(*working.last().unwrap_or(&0.0));
            working = difference(&working);
        }

        let mu = mean(&working)?;
        let centred: Vec<f64> = working.iter().map(|v| v - mu).collect();
        let ar_coefficients = yule_walker(&centred, p);
        let constant = mu * (1.0 - ar_coefficients.iter().sum::<f64>());
        let recent = working[working.len().saturating_sub(p)..].to_vec();

        Ok(Self {
            p,
            d,
            ar_coefficients,
            constant,
            level_tails,
            recent,
        })
    }

    /// Forecast `steps` values past the end of the fitted series
    pub fn forecast(&self, steps: usize) -> Vec<f64> {
        let mut history = self.recent.clone();
        let mut differenced = Vec::with_capacity(steps);

        for _ in 0..steps {
            let mut next = self.constant;
            for (i, coefficient) in self.ar_coefficients.iter().enumerate() {
                if let Some(value) = history.len().checked_sub(i + 1).map(|k| history[k]) {
                    next += coefficient * value;
                }
            }
            history.push(next);
            differenced.push(next);
        }

        // Integrate back up through each differencing level
        let mut result = differenced;
        for &tail in self.level_tails.iter().rev() {
            let mut level = tail;
            for value in result.iter_mut() {
                level += *value;
                *value = level;
            }
        }
        result
    }

    pub fn ar_coefficients(&self) -> &[f64] {
        &self.ar_coefficients
    }

    pub fn constant(&self) -> f64 {
        self.constant
    }

    /// Model order as `(p, d, q)`
    pub fn order(&self) -> (usize, usize, usize) {
        (self.p, self.d, 0)
    }
}

fn difference(data: &[f64]) -> Vec<f64> {
    data.windows(2).map(|w| w[1] - w[0]).collect()
}

/// Solve the Yule-Walker equations for `p` AR coefficients (Levinson-Durbin)
fn yule_walker(centred: &[f64], p: usize) -> Vec<f64> {
    let mut phi = vec![0.0; p];
    if p == 0 {
        return phi;
    }

    let n = centred.len() as f64;
    let autocov: Vec<f64> = (0..=p)
        .map(|lag| {
            centred
                .iter()
                .skip(lag)
                .zip(centred.iter())
                .map(|(a, b)| a * b)
                .sum::<f64>()
                / n
        })
        .collect();

    if autocov[0].abs() < 1e-12 {
        return phi;
    }

    let mut error = autocov[0];
    for k in 0..p {
        let mut acc = autocov[k + 1];
        for j in 0..k {
            acc -= phi[j] * autocov[k - j];
        }
        let reflection = acc / error;

        let previous = phi.clone();
        phi[k] = reflection;
        for j in 0..k {
            phi[j] = previous[j] - reflection * previous[k - 1 - j];
        }

        error *= 1.0 - reflection * reflection;
        if error <= 1e-12 {
            break;
        }
    }

    phi
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_linear_trend_continues() {
        let series: Vec<f64> = (0..50).map(|i| 100.0 + 2.0 * i as f64).collect();
        let model = Arima::fit(&series, 1, 1).unwrap();
        let forecast = model.forecast(3);

        assert_eq!(forecast.len(), 3);
        assert_relative_eq!(forecast[0], 200.0, epsilon = 1e-9);
        assert_relative_eq!(forecast[2], 204.0, epsilon = 1e-9);
    }

    #[test]
    fn test_recovers_ar1_coefficient() {
        use rand::rngs::StdRng;
        use rand::{Rng, SeedableRng};

        // x_t = 0.6 x_{t-1} + e_t
        let mut rng = StdRng::seed_from_u64(11);
        let mut series = vec![0.0];
        for t in 1..2000 {
            let noise: f64 = rng.gen_range(-1.0..1.0);
            series.push(0.6 * series[t - 1] + noise);
        }
        let model = Arima::fit(&series, 1, 0).unwrap();
        assert!((model.ar_coefficients()[0] - 0.6).abs() < 0.1);
        assert_eq!(model.order(), (1, 0, 0));
    }

    #[test]
    fn test_short_series_is_rejected() {
        assert!(Arima::fit(&[1.0, 2.0, 3.0], 5, 1).is_err());
    }

    #[test]
    fn test_constant_series_forecasts_constant() {
        let series = vec![7.0; 20];
        let model = Arima::fit(&series, 2, 1).unwrap();
        assert!(model.forecast(5).iter().all(|v| (v - 7.0).abs() < 1e-12));
    }
}
