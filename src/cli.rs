//! Command-line surface of the engine
//!
//! Every subcommand produces exactly one [`Output`]. Handled failures become a
//! `{"error": ...}` object so callers can always parse stdout.

use crate::config::{EngineConfig, DEFAULT_HORIZON, DEFAULT_MODEL_DIR, DEFAULT_SEED};
use crate::engine::{InsightEngine, PipelineInput};
use crate::error::{EngineError, Result};
use crate::report::{render_report, ReportInput};
use crate::store::{ArtifactBackend, ModelStore};
use clap::{Parser, Subcommand};
use risk_scoring::utils::parse_object;
use risk_scoring::{
    assess_fraud, composite_risk_index, AnomalyEvidence, AnomalyScorer, Observation, SubScores,
    ZScoreAnomalyScorer,
};
use serde::Serialize;
use serde_json::{json, Value};
use std::fmt;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "supply_insight", version)]
#[command(about = "Supply chain demand forecasting, anomaly and risk scoring", long_about = None)]
pub struct Cli {
    /// Directory holding trained model artifacts
    #[arg(long, global = true, env = "SUPPLY_INSIGHT_MODEL_DIR", default_value = DEFAULT_MODEL_DIR)]
    pub model_dir: PathBuf,

    /// CSV of observations used for training; synthetic data when absent
    #[arg(long, global = true, env = "SUPPLY_INSIGHT_DATA")]
    pub data: Option<PathBuf>,

    /// Seed for synthetic data, forests and splits
    #[arg(long, global = true, default_value_t = DEFAULT_SEED)]
    pub seed: u64,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Train every model and persist the artifacts
    Train,

    /// Ensemble demand forecast
    Forecast {
        /// Number of days to forecast
        #[arg(long, default_value_t = DEFAULT_HORIZON)]
        days: usize,
    },

    /// Temperature z-score anomaly check
    Anomaly {
        #[arg(allow_negative_numbers = true)]
        temperature: f64,
        #[arg(allow_negative_numbers = true)]
        quantity: f64,
        #[arg(allow_negative_numbers = true)]
        delay: f64,
    },

    /// Isolation-forest anomaly detection on a JSON observation
    Detect {
        /// Observation as JSON; missing fields default to 0
        input: String,
    },

    /// Risk classification of a JSON observation
    Risk {
        /// Observation as JSON; missing fields default to 0
        input: String,
    },

    /// Fraud sub-score from scores on a 0-100 scale
    Fraud {
        #[arg(allow_negative_numbers = true)]
        anomaly_score: f64,
        #[arg(allow_negative_numbers = true)]
        delay_factor: f64,
        #[arg(allow_negative_numbers = true)]
        trust_score: f64,
    },

    /// Supply chain risk index from four sub-scores on a 0-100 scale
    Scri {
        #[arg(allow_negative_numbers = true)]
        fraud: f64,
        #[arg(allow_negative_numbers = true)]
        delay: f64,
        #[arg(allow_negative_numbers = true)]
        temperature: f64,
        #[arg(allow_negative_numbers = true)]
        volatility: f64,
    },

    /// Render the plain-text report from JSON stage results
    Report {
        input: String,
    },

    /// Run forecast, detection and risk on one observation and render the report
    GenerateReport {
        /// Observation as JSON; missing fields take operating defaults
        #[arg(default_value = "{}")]
        input: String,
    },
}

impl Cli {
    pub fn config(&self) -> EngineConfig {
        let config = EngineConfig::new(&self.model_dir).with_seed(self.seed);
        match &self.data {
            Some(path) => config.with_data(path),
            None => config,
        }
    }
}

/// What a command prints
#[derive(Debug, Clone, PartialEq)]
pub enum Output {
    Json(Value),
    Text(String),
}

impl Output {
    pub fn error(message: impl fmt::Display) -> Self {
        Output::Json(json!({ "error": message.to_string() }))
    }

    pub fn json(&self) -> Option<&Value> {
        match self {
            Output::Json(value) => Some(value),
            Output::Text(_) => None,
        }
    }

    fn from_serialize<T: Serialize>(value: &T) -> Result<Self> {
        Ok(Output::Json(serde_json::to_value(value)?))
    }
}

impl fmt::Display for Output {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Output::Json(value) => write!(f, "{}", value),
            Output::Text(text) => f.write_str(text),
        }
    }
}

/// Run a parsed command line against the configured model directory
pub fn run(cli: &Cli) -> Output {
    let config = cli.config();
    let store = ModelStore::open(&config);
    let mut engine = InsightEngine::new(config, store);
    execute(&cli.command, &mut engine)
}

/// Run one command against an engine, converting errors to an error object
pub fn execute<B: ArtifactBackend>(command: &Command, engine: &mut InsightEngine<B>) -> Output {
    dispatch(command, engine).unwrap_or_else(Output::error)
}

fn dispatch<B: ArtifactBackend>(command: &Command, engine: &mut InsightEngine<B>) -> Result<Output> {
    match command {
        Command::Train => Output::from_serialize(&engine.train_all()?),
        Command::Forecast { days } => Output::from_serialize(&engine.forecast(*days)?),
        Command::Anomaly {
            temperature,
            quantity,
            delay,
        } => temperature_anomaly(*temperature, *quantity, *delay),
        Command::Detect { input } => {
            let observation = Observation::from_json(input)?;
            Output::from_serialize(&engine.detect(&observation))
        }
        Command::Risk { input } => {
            let observation = Observation::from_json(input)?;
            Output::from_serialize(&engine.assess_risk(&observation))
        }
        Command::Fraud {
            anomaly_score,
            delay_factor,
            trust_score,
        } => Output::from_serialize(&assess_fraud(*anomaly_score, *delay_factor, *trust_score)?),
        Command::Scri {
            fraud,
            delay,
            temperature,
            volatility,
        } => {
            let scri =
                composite_risk_index(SubScores::new(*fraud, *delay, *temperature, *volatility))?;
            Ok(Output::Json(json!({ "scri": scri })))
        }
        Command::Report { input } => {
            let report: ReportInput = parse_object(input)?;
            Ok(Output::Text(render_report(&report)))
        }
        Command::GenerateReport { input } => {
            let pipeline: PipelineInput = parse_object(input)?;
            Output::from_serialize(&engine.generate_report(&pipeline))
        }
    }
}

/// Scoring failures become a clear result carrying the error
fn temperature_anomaly(temperature: f64, quantity: f64, delay: f64) -> Result<Output> {
    let observation = Observation::new(0.0, quantity, delay, temperature, 0.0);
    let result = ZScoreAnomalyScorer::default().score_or_fallback(&observation);

    match (result.evidence, result.error) {
        (_, Some(error)) => Ok(Output::Json(json!({
            "anomaly_detected": false,
            "probability": 0.0,
            "z_score": 0.0,
            "explanation": "",
            "error": error,
        }))),
        (
            Some(AnomalyEvidence::ZScore {
                z_score,
                probability,
                explanation,
            }),
            None,
        ) => Ok(Output::Json(json!({
            "anomaly_detected": result.is_anomaly,
            "probability": probability,
            "z_score": z_score,
            "explanation": explanation,
        }))),
        _ => Err(EngineError::InvalidInput(
            "Temperature scorer returned no z-score evidence".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use pretty_assertions::assert_eq;

    fn parse(args: &[&str]) -> Cli {
        Cli::parse_from(std::iter::once("supply_insight").chain(args.iter().copied()))
    }

    #[test]
    fn test_global_options_build_config() {
        let cli = parse(&["--model-dir", "/tmp/m", "--seed", "7", "forecast", "--days", "10"]);
        let config = cli.config();
        assert_eq!(config.model_dir, PathBuf::from("/tmp/m"));
        assert_eq!(config.seed, 7);
        assert!(matches!(cli.command, Command::Forecast { days: 10 }));
    }

    #[test]
    fn test_anomaly_command_reports_z_score() {
        let cli = parse(&["anomaly", "36", "1000", "2"]);
        let output = run(&cli);
        let value = output.json().unwrap();

        assert_eq!(value["anomaly_detected"], json!(true));
        assert_relative_eq!(value["z_score"].as_f64().unwrap(), 2.2, epsilon = 1e-9);
        assert_relative_eq!(value["probability"].as_f64().unwrap(), 73.333333, epsilon = 1e-4);
        assert_eq!(
            value["explanation"],
            json!("Temperature exceeded acceptable threshold by 44.0% during transport phase, increasing spoilage risk probability.")
        );
    }

    #[test]
    fn test_anomaly_accepts_negative_temperature() {
        let value = run(&parse(&["anomaly", "-5", "100", "0"])).json().cloned().unwrap();
        assert_eq!(value["anomaly_detected"], json!(true));
        assert_relative_eq!(value["z_score"].as_f64().unwrap(), 6.0);
        assert_relative_eq!(value["probability"].as_f64().unwrap(), 100.0);
    }

    #[test]
    fn test_non_finite_temperature_degrades_to_clear_result() {
        let output = run(&parse(&["anomaly", "inf", "0", "0"]));
        let value = output.json().unwrap();

        assert_eq!(value["anomaly_detected"], json!(false));
        assert_eq!(value["probability"], json!(0.0));
        assert_eq!(value["z_score"], json!(0.0));
        assert_eq!(value["explanation"], json!(""));
        assert!(value["error"].as_str().unwrap().contains("finite"));
    }

    #[test]
    fn test_fraud_and_scri() {
        let fraud = run(&parse(&["fraud", "80", "50", "20"]));
        let value = fraud.json().unwrap();
        assert_relative_eq!(value["fraud_probability"].as_f64().unwrap(), 71.0, epsilon = 1e-9);
        assert_eq!(value["risk_category"], json!("High"));

        let scri = run(&parse(&["scri", "100", "100", "100", "100"]));
        assert_relative_eq!(scri.json().unwrap()["scri"].as_f64().unwrap(), 100.0, epsilon = 1e-9);
    }

    #[test]
    fn test_out_of_range_scri_is_an_error_object() {
        let output = run(&parse(&["scri", "101", "0", "0", "0"]));
        assert!(output.json().unwrap()["error"].is_string());
    }

    #[test]
    fn test_report_renders_text_from_partial_json() {
        let output = run(&parse(&["report", r#"{"risk_level": "HIGH", "risk_probability": 0.8}"#]));
        match output {
            Output::Text(text) => assert!(text.contains("SUPPLY CHAIN INTELLIGENCE REPORT")),
            Output::Json(value) => panic!("expected text, got {}", value),
        }
    }

    #[test]
    fn test_malformed_report_json() {
        let output = run(&parse(&["report", "{oops"]));
        assert!(output.json().unwrap()["error"].is_string());
    }

    #[test]
    fn test_non_object_inputs_are_rejected() {
        for args in [
            ["risk", "[500, 5, 35, 200]"],
            ["detect", "[500, 1000, 2, 24, 650]"],
            ["report", r#"["HIGH", 0.9]"#],
            ["generate-report", "[500]"],
        ] {
            let output = run(&parse(&args));
            let value = output.json().unwrap();
            assert_eq!(
                value,
                &json!({ "error": "Invalid input: Expected a JSON object, got an array" }),
                "{:?}",
                args
            );
        }
    }

    #[test]
    fn test_error_output_display() {
        assert_eq!(Output::error("bad").to_string(), r#"{"error":"bad"}"#);
    }
}
