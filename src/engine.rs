//! Pipeline over persisted models
//!
//! [`InsightEngine`] owns a [`ModelStore`] and the configuration. Each component
//! is obtained by loading its artifacts; when they are missing the component is
//! trained, persisted and loaded back. The report pipeline runs every stage on one
//! observation and degrades failed stages to safe defaults.

use crate::config::EngineConfig;
use crate::error::Result;
use crate::report::{combined_score, render_report, ForecastSummary, ReportInput};
use crate::store::{ArtifactBackend, DemandArtifacts, ModelStore};
use crate::training::{self, TrainingData, TrainingSummary};
use chrono::{DateTime, Utc};
use demand_forecast::{ForecastEnsembler, ForecastResult, MetricsDocument};
use risk_scoring::{
    AnomalyResult, AnomalyScorer, DensityAnomalyScorer, Observation, RiskClassifier, RiskResult,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{info, warn};

/// Output of the `forecast` command
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastOutput {
    #[serde(flatten)]
    pub result: ForecastResult,
    pub metrics: MetricsDocument,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ForecastOutput {
    /// Empty forecast with zero growth and confidence
    pub fn fallback(error: &dyn fmt::Display) -> Self {
        Self {
            result: ForecastResult {
                values: Vec::new(),
                growth_percentage: 0.0,
                confidence: 0.0,
            },
            metrics: MetricsDocument::new(),
            error: Some(error.to_string()),
        }
    }

    pub fn summary(&self) -> ForecastSummary {
        ForecastSummary {
            forecast: self.result.values.clone(),
            growth_percentage: self.result.growth_percentage,
            confidence: self.result.confidence,
        }
    }
}

/// Observation fields accepted by `generate-report`; absent fields take operating defaults
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct PipelineInput {
    pub demand: Option<f64>,
    pub quantity: Option<f64>,
    pub delay_days: Option<f64>,
    pub temperature: Option<f64>,
    pub stock_level: Option<f64>,
}

impl PipelineInput {
    pub fn observation(&self) -> Observation {
        Observation::new(
            self.demand.unwrap_or(500.0),
            self.quantity.unwrap_or(1000.0),
            self.delay_days.unwrap_or(0.0),
            self.temperature.unwrap_or(25.0),
            self.stock_level.unwrap_or(800.0),
        )
    }
}

/// Output of the `generate-report` command
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InsightReport {
    pub report_text: String,
    /// Rounded to one decimal
    pub combined_score: f64,
    pub demand_forecast: ForecastOutput,
    pub anomaly_status: AnomalyResult,
    pub risk_assessment: RiskResult,
    pub generated_at: DateTime<Utc>,
}

/// Forecasting, scoring and reporting over one model store
pub struct InsightEngine<B> {
    config: EngineConfig,
    store: ModelStore<B>,
    training_data: Option<TrainingData>,
}

impl<B: ArtifactBackend> InsightEngine<B> {
    pub fn new(config: EngineConfig, store: ModelStore<B>) -> Self {
        Self {
            config,
            store,
            training_data: None,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn store(&self) -> &ModelStore<B> {
        &self.store
    }

    fn training_data(&mut self) -> Result<&TrainingData> {
        let data = match self.training_data.take() {
            Some(data) => data,
            None => TrainingData::load(&self.config)?,
        };
        Ok(self.training_data.insert(data))
    }

    /// Train every component and persist the artifacts
    pub fn train_all(&mut self) -> Result<TrainingSummary> {
        let seed = self.config.seed;
        let data = self.training_data()?.clone();

        let demand = training::train_demand(&data, seed)?;
        let anomaly = training::train_anomaly(&data, seed)?;
        let (risk, risk_accuracy) = training::train_risk(&data, seed)?;

        self.store.save_demand(&demand)?;
        self.store.save_anomaly(&anomaly)?;
        self.store.save_risk(&risk)?;
        info!(model_dir = %self.config.model_dir.display(), "persisted all artifacts");

        Ok(TrainingSummary {
            status: "trained",
            observations: data.observations.len(),
            history_days: data.history.len(),
            metrics: demand.metrics,
            anomaly_offset: anomaly.offset(),
            risk_accuracy,
            risk_factors: risk.top_factors(),
        })
    }

    /// Train and persist the demand models
    pub fn train_demand(&mut self) -> Result<()> {
        let seed = self.config.seed;
        let artifacts = training::train_demand(self.training_data()?, seed)?;
        self.store.save_demand(&artifacts)
    }

    /// Train and persist the anomaly scorer
    pub fn train_anomaly(&mut self) -> Result<()> {
        let seed = self.config.seed;
        let scorer = training::train_anomaly(self.training_data()?, seed)?;
        self.store.save_anomaly(&scorer)
    }

    /// Train and persist the risk classifier
    pub fn train_risk(&mut self) -> Result<()> {
        let seed = self.config.seed;
        let (classifier, _) = training::train_risk(self.training_data()?, seed)?;
        self.store.save_risk(&classifier)
    }

    /// Load the demand models, training them first if they were never persisted
    pub fn demand_models(&mut self) -> Result<DemandArtifacts> {
        match self.store.load_demand() {
            Err(e) if e.is_missing_artifact() => {
                info!(error = %e, "training demand models");
                self.train_demand()?;
                self.store.load_demand()
            }
            other => other,
        }
    }

    /// Load the anomaly scorer, training it first if it was never persisted
    pub fn anomaly_scorer(&mut self) -> Result<DensityAnomalyScorer> {
        match self.store.load_anomaly() {
            Err(e) if e.is_missing_artifact() => {
                info!(error = %e, "training anomaly model");
                self.train_anomaly()?;
                self.store.load_anomaly()
            }
            other => other,
        }
    }

    /// Load the risk classifier, training it first if it was never persisted
    pub fn risk_classifier(&mut self) -> Result<RiskClassifier> {
        match self.store.load_risk() {
            Err(e) if e.is_missing_artifact() => {
                info!(error = %e, "training risk model");
                self.train_risk()?;
                self.store.load_risk()
            }
            other => other,
        }
    }

    /// Ensemble demand forecast for `horizon` days
    pub fn forecast(&mut self, horizon: usize) -> Result<ForecastOutput> {
        let DemandArtifacts { models, metrics } = self.demand_models()?;
        let result = models.forecast_ensemble(&metrics, &ForecastEnsembler::new(), horizon)?;
        Ok(ForecastOutput {
            result,
            metrics,
            error: None,
        })
    }

    /// Density anomaly scoring; every failure becomes a fallback result
    pub fn detect(&mut self, observation: &Observation) -> AnomalyResult {
        match self.anomaly_scorer() {
            Ok(scorer) => scorer.score_or_fallback(observation),
            Err(e) => {
                warn!(error = %e, "anomaly model unavailable");
                AnomalyResult::fallback(&e)
            }
        }
    }

    /// Risk assessment; every failure becomes the unknown sentinel
    pub fn assess_risk(&mut self, observation: &Observation) -> RiskResult {
        match self.risk_classifier() {
            Ok(classifier) => classifier.assess_or_unknown(observation),
            Err(e) => {
                warn!(error = %e, "risk model unavailable");
                RiskResult::unknown(&e)
            }
        }
    }

    /// Forecast, detect, assess and render one report
    pub fn generate_report(&mut self, input: &PipelineInput) -> InsightReport {
        let observation = input.observation();
        let horizon = self.config.horizon;

        let forecast = self.forecast(horizon).unwrap_or_else(|e| {
            warn!(error = %e, "forecast degraded to fallback");
            ForecastOutput::fallback(&e)
        });
        let anomaly = self.detect(&observation);
        let risk = self.assess_risk(&observation);

        let report_input = ReportInput::from_results(forecast.summary(), &anomaly, &risk);
        let score = combined_score(
            forecast.result.confidence,
            anomaly.is_anomaly,
            risk.risk_probability,
        );

        InsightReport {
            report_text: render_report(&report_input),
            combined_score: (score * 10.0).round() / 10.0,
            demand_forecast: forecast,
            anomaly_status: anomaly,
            risk_assessment: risk,
            generated_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_pipeline_defaults_only_fill_missing_fields() {
        let input: PipelineInput = serde_json::from_str(r#"{"temperature": 0, "delay_days": 4}"#).unwrap();
        assert_eq!(input.observation(), Observation::new(500.0, 1000.0, 4.0, 0.0, 800.0));
    }

    #[test]
    fn test_forecast_fallback_shape() {
        let json = serde_json::to_value(ForecastOutput::fallback(&"no models")).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "forecast": [],
                "growth_percentage": 0.0,
                "confidence": 0.0,
                "metrics": {},
                "error": "no models"
            })
        );
    }
}
