//! # Demand Forecast
//!
//! Daily demand forecasting for the supply insight engine.
//!
//! ## Features
//!
//! - Daily demand history with calendar features
//! - Three forecasters: linear regression, random forest and ARIMA(5, 1, 0)
//! - Holdout evaluation with MAE, RMSE, R² and accuracy
//! - Confidence-weighted ensemble with growth percentage
//!
//! ## Quick Start
//!
//! ```rust
//! use chrono::NaiveDate;
//! use demand_forecast::{DemandHistory, DemandModelSet, ForecastEnsembler, TrainingOptions};
//!
//! let start = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
//! let history = DemandHistory::synthetic(start, 120, 42)?;
//!
//! let options = TrainingOptions { forest_trees: 10, ..TrainingOptions::default() };
//! let (models, metrics) = DemandModelSet::train(&history, &options)?;
//!
//! let result = models.forecast_ensemble(&metrics, &ForecastEnsembler::new(), 30)?;
//! assert_eq!(result.values.len(), 30);
//! # Ok::<(), demand_forecast::ForecastError>(())
//! ```

pub mod data;
pub mod ensemble;
pub mod error;
pub mod metrics;
pub mod models;

// Re-export commonly used types
pub use crate::data::DemandHistory;
pub use crate::ensemble::{ForecastEnsembler, ForecastResult};
pub use crate::error::{ForecastError, Result};
pub use crate::metrics::{MetricsDocument, ModelMetrics};
pub use crate::models::{DemandModel, DemandModelSet, TrainingOptions};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
