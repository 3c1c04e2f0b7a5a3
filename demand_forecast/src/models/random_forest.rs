//! Random forest over calendar features

use crate::error::Result;
use crate::metrics::RANDOM_FOREST;
use crate::models::{future_features, DemandModel};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use supply_math::forest::TreeParams;
use supply_math::RandomForestRegressor;

/// Bagged regression tree demand model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForestDemandModel {
    forest: RandomForestRegressor,
    last_date: NaiveDate,
}

impl ForestDemandModel {
    pub fn fit(
        x: &[Vec<f64>],
        y: &[f64],
        last_date: NaiveDate,
        trees: usize,
        seed: u64,
    ) -> Result<Self> {
        Ok(Self {
            forest: RandomForestRegressor::fit(x, y, trees, TreeParams::default(), seed)?,
            last_date,
        })
    }

    pub fn predict(&self, x: &[Vec<f64>]) -> Result<Vec<f64>> {
        Ok(self.forest.predict(x)?)
    }
}

impl DemandModel for ForestDemandModel {
    fn forecast(&self, horizon: usize) -> Result<Vec<f64>> {
        self.predict(&future_features(self.last_date, horizon)?)
    }

    fn name(&self) -> &str {
        RANDOM_FOREST
    }
}
