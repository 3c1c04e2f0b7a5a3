//! Demand forecasting models
//!
//! Three independent forecasters feed the ensemble:
//!
//! - [`LinearDemandModel`]: least squares over calendar features
//! - [`ForestDemandModel`]: random forest over calendar features
//! - [`ArimaDemandModel`]: ARIMA(5, 1, 0) over the quantity series itself

use crate::data::{calendar_features, future_dates, DemandHistory};
use crate::ensemble::{ForecastEnsembler, ForecastResult};
use crate::error::Result;
use crate::metrics::{self, MetricsDocument, ModelMetrics};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use supply_math::stats::train_test_indices;
use tracing::info;

pub mod arima;
pub mod linear_regression;
pub mod random_forest;

pub use arima::ArimaDemandModel;
pub use linear_regression::LinearDemandModel;
pub use random_forest::ForestDemandModel;

/// Trained model able to project demand past the end of its training history
pub trait DemandModel: Debug {
    /// Forecast `horizon` daily values following the training history
    fn forecast(&self, horizon: usize) -> Result<Vec<f64>>;

    /// Name of the model, matching its key in the metrics document
    fn name(&self) -> &str;
}

/// Calendar feature rows for the `horizon` days after `last`
pub(crate) fn future_features(last: NaiveDate, horizon: usize) -> Result<Vec<Vec<f64>>> {
    Ok(future_dates(last, horizon)?
        .into_iter()
        .map(calendar_features)
        .collect())
}

/// Knobs for training the demand models
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingOptions {
    /// Share of the history held out for evaluation
    pub test_ratio: f64,
    /// Seed for the split and the forest
    pub seed: u64,
    /// Number of trees in the random forest
    pub forest_trees: usize,
    /// ARIMA autoregressive order
    pub arima_p: usize,
    /// ARIMA differencing order
    pub arima_d: usize,
    /// Accuracy recorded for the ARIMA model, which is not evaluated on the holdout
    pub arima_accuracy: f64,
}

impl Default for TrainingOptions {
    fn default() -> Self {
        Self {
            test_ratio: 0.2,
            seed: 42,
            forest_trees: supply_math::RandomForestRegressor::DEFAULT_ESTIMATORS,
            arima_p: 5,
            arima_d: 1,
            arima_accuracy: 85.0,
        }
    }
}

/// The three trained demand models
#[derive(Debug, Clone, PartialEq)]
pub struct DemandModelSet {
    pub linear: LinearDemandModel,
    pub forest: ForestDemandModel,
    pub arima: ArimaDemandModel,
}

impl DemandModelSet {
    /// Train all three models and evaluate the feature-based ones on a holdout split
    pub fn train(history: &DemandHistory, options: &TrainingOptions) -> Result<(Self, MetricsDocument)> {
        let x = history.feature_matrix();
        let y = history.quantities();
        let (train_idx, test_idx) = train_test_indices(history.len(), options.test_ratio, options.seed)?;

        let x_train: Vec<Vec<f64>> = train_idx.iter().map(|&i| x[i].clone()).collect();
        let y_train: Vec<f64> = train_idx.iter().map(|&i| y[i]).collect();
        let x_test: Vec<Vec<f64>> = test_idx.iter().map(|&i| x[i].clone()).collect();
        let y_test: Vec<f64> = test_idx.iter().map(|&i| y[i]).collect();

        let mut document = MetricsDocument::new();
        let last_date = history.last_date();

        let linear = LinearDemandModel::fit(&x_train, &y_train, last_date)?;
        let linear_metrics = ModelMetrics::evaluate(&y_test, &linear.predict(&x_test)?)?;
        info!(model = metrics::LINEAR_REGRESSION, %linear_metrics, "trained demand model");
        document.insert(metrics::LINEAR_REGRESSION, linear_metrics);

        let forest = ForestDemandModel::fit(
            &x_train,
            &y_train,
            last_date,
            options.forest_trees,
            options.seed,
        )?;
        let forest_metrics = ModelMetrics::evaluate(&y_test, &forest.predict(&x_test)?)?;
        info!(model = metrics::RANDOM_FOREST, %forest_metrics, "trained demand model");
        document.insert(metrics::RANDOM_FOREST, forest_metrics);

        let arima = ArimaDemandModel::fit(y, options.arima_p, options.arima_d)?;
        info!(model = metrics::ARIMA, order = ?arima.order(), "trained demand model");
        document.insert(metrics::ARIMA, ModelMetrics::accuracy_only(options.arima_accuracy));

        Ok((
            Self {
                linear,
                forest,
                arima,
            },
            document,
        ))
    }

    /// Forecast with every model and combine the results
    pub fn forecast_ensemble(
        &self,
        metrics: &MetricsDocument,
        ensembler: &ForecastEnsembler,
        horizon: usize,
    ) -> Result<ForecastResult> {
        let models: [&dyn DemandModel; 3] = [&self.linear, &self.forest, &self.arima];

        let mut predictions = Vec::with_capacity(models.len());
        let mut accuracies = [0.0; 3];
        for (slot, model) in models.iter().enumerate() {
            predictions.push(model.forecast(horizon)?);
            accuracies[slot] = metrics.accuracy(model.name())?;
        }

        ensembler.ensemble(
            horizon,
            [&predictions[0], &predictions[1], &predictions[2]],
            accuracies,
        )
    }
}
