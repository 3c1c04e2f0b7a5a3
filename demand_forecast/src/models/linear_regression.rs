//! Linear regression over calendar features

use crate::error::Result;
use crate::metrics::LINEAR_REGRESSION;
use crate::models::{future_features, DemandModel};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use supply_math::LinearRegression;

/// Least squares demand model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearDemandModel {
    regression: LinearRegression,
    /// Last date of the training history; forecasts start the day after
    last_date: NaiveDate,
}

impl LinearDemandModel {
    pub fn fit(x: &[Vec<f64>], y: &[f64], last_date: NaiveDate) -> Result<Self> {
        Ok(Self {
            regression: LinearRegression::fit(x, y)?,
            last_date,
        })
    }

    /// Predict quantities for arbitrary calendar feature rows
    pub fn predict(&self, x: &[Vec<f64>]) -> Result<Vec<f64>> {
        Ok(self.regression.predict(x)?)
    }
}

impl DemandModel for LinearDemandModel {
    fn forecast(&self, horizon: usize) -> Result<Vec<f64>> {
        self.predict(&future_features(self.last_date, horizon)?)
    }

    fn name(&self) -> &str {
        LINEAR_REGRESSION
    }
}
