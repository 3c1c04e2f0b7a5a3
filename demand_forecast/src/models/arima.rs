//! ARIMA demand model over the raw quantity series

use crate::error::{ForecastError, Result};
use crate::metrics::ARIMA;
use crate::models::DemandModel;
use serde::{Deserialize, Serialize};
use supply_math::Arima;

/// ARIMA(p, d, 0) fitted to the daily quantities
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArimaDemandModel {
    model: Arima,
}

impl ArimaDemandModel {
    pub fn fit(series: &[f64], p: usize, d: usize) -> Result<Self> {
        Ok(Self {
            model: Arima::fit(series, p, d)?,
        })
    }

    /// Model order as `(p, d, q)`
    pub fn order(&self) -> (usize, usize, usize) {
        self.model.order()
    }
}

impl DemandModel for ArimaDemandModel {
    fn forecast(&self, horizon: usize) -> Result<Vec<f64>> {
        let values = self.model.forecast(horizon);
        if values.iter().any(|v| !v.is_finite()) {
            return Err(ForecastError::ForecastingError(
                "ARIMA forecast diverged".to_string(),
            ));
        }
        Ok(values)
    }

    fn name(&self) -> &str {
        ARIMA
    }
}
