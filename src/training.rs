//! Training data and per-component trainers
//!
//! Observations come from the configured CSV or, when no file is configured, from
//! the seeded synthetic generator. The demand history is built from the CSV's
//! `date` column when present and is otherwise a synthetic year of daily demand.

use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::store::DemandArtifacts;
use chrono::NaiveDate;
use demand_forecast::{DemandHistory, DemandModelSet, MetricsDocument, TrainingOptions};
use risk_scoring::utils::generate_observations;
use risk_scoring::{DensityAnomalyScorer, Observation, RiskClassifier};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::info;

/// Number of synthetic observations generated when no CSV is configured
pub const SYNTHETIC_OBSERVATIONS: usize = 1000;

/// Length of the synthetic demand history in days
pub const SYNTHETIC_HISTORY_DAYS: usize = 365;

/// One CSV row. Missing columns default to 0, `date` is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct ObservationRecord {
    date: Option<NaiveDate>,
    demand: f64,
    quantity: f64,
    delay_days: f64,
    temperature: f64,
    stock_level: f64,
}

impl ObservationRecord {
    fn observation(&self) -> Observation {
        Observation::new(
            self.demand,
            self.quantity,
            self.delay_days,
            self.temperature,
            self.stock_level,
        )
    }
}

/// Observations and demand history every trainer draws from
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingData {
    pub observations: Vec<Observation>,
    pub history: DemandHistory,
}

fn synthetic_start() -> Result<NaiveDate> {
    NaiveDate::from_ymd_opt(2023, 1, 1)
        .ok_or_else(|| EngineError::InvalidInput("Invalid synthetic start date".to_string()))
}

impl TrainingData {
    /// Seeded synthetic observations and a synthetic year of demand
    pub fn synthetic(seed: u64) -> Result<Self> {
        Ok(Self {
            observations: generate_observations(SYNTHETIC_OBSERVATIONS, seed)?,
            history: DemandHistory::synthetic(synthetic_start()?, SYNTHETIC_HISTORY_DAYS, seed)?,
        })
    }

    /// Read observations from a CSV file with a header row
    pub fn from_csv(path: &Path, seed: u64) -> Result<Self> {
        let mut reader = csv::Reader::from_path(path)?;
        let records = reader
            .deserialize()
            .collect::<std::result::Result<Vec<ObservationRecord>, csv::Error>>()?;

        if records.is_empty() {
            return Err(EngineError::InvalidInput(format!(
                "{} contains no observations",
                path.display()
            )));
        }

        // Daily totals of quantity for rows carrying a date
        let mut daily: BTreeMap<NaiveDate, f64> = BTreeMap::new();
        for record in &records {
            if let Some(date) = record.date {
                *daily.entry(date).or_insert(0.0) += record.quantity;
            }
        }

        let history = if daily.is_empty() {
            DemandHistory::synthetic(synthetic_start()?, SYNTHETIC_HISTORY_DAYS, seed)?
        } else {
            let (dates, quantities) = daily.into_iter().unzip();
            DemandHistory::new(dates, quantities)?
        };

        info!(
            path = %path.display(),
            observations = records.len(),
            history_days = history.len(),
            "loaded training data"
        );

        Ok(Self {
            observations: records.iter().map(ObservationRecord::observation).collect(),
            history,
        })
    }

    /// Training data for a configuration
    pub fn load(config: &EngineConfig) -> Result<Self> {
        match &config.data_path {
            Some(path) => Self::from_csv(path, config.seed),
            None => Self::synthetic(config.seed),
        }
    }
}

/// Train the three demand models and evaluate them
pub fn train_demand(data: &TrainingData, seed: u64) -> Result<DemandArtifacts> {
    let options = TrainingOptions {
        seed,
        ..TrainingOptions::default()
    };
    let (models, metrics) = DemandModelSet::train(&data.history, &options)?;
    Ok(DemandArtifacts { models, metrics })
}

/// Train the isolation-forest anomaly scorer
pub fn train_anomaly(data: &TrainingData, seed: u64) -> Result<DensityAnomalyScorer> {
    Ok(DensityAnomalyScorer::train(&data.observations, seed)?)
}

/// Train the risk classifier, returning it with its held-out accuracy
pub fn train_risk(data: &TrainingData, seed: u64) -> Result<(RiskClassifier, f64)> {
    Ok(RiskClassifier::train(&data.observations, seed)?)
}

/// Summary printed by the `train` command
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrainingSummary {
    pub status: &'static str,
    pub observations: usize,
    pub history_days: usize,
    pub metrics: MetricsDocument,
    pub anomaly_offset: f64,
    pub risk_accuracy: f64,
    pub risk_factors: Vec<String>,
}
