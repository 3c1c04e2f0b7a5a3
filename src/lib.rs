//! # supply_insight
//!
//! Supply chain decision support built from three crates: `demand_forecast` for the
//! ensemble demand forecast, `risk_scoring` for anomaly, risk, fraud and composite
//! index scores, and `supply_math` for the numerical models underneath. This crate
//! adds configuration, artifact persistence, training, the report renderer and the
//! command-line surface.
//!
//! ## Example
//!
//! ```no_run
//! use supply_insight::{EngineConfig, InsightEngine, MemoryBackend, ModelStore, PipelineInput};
//!
//! let config = EngineConfig::default().with_horizon(14);
//! let mut engine = InsightEngine::new(config, ModelStore::new(MemoryBackend::new()));
//!
//! // Models are trained on first use and kept in memory
//! let report = engine.generate_report(&PipelineInput::default());
//! println!("{}", report.report_text);
//! ```

pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod report;
pub mod store;
pub mod training;

pub use crate::config::{ArtifactKey, ArtifactPaths, EngineConfig};
pub use crate::engine::{ForecastOutput, InsightEngine, InsightReport, PipelineInput};
pub use crate::error::{EngineError, Result};
pub use crate::report::{render_report, ReportInput};
pub use crate::store::{ArtifactBackend, DemandArtifacts, DirectoryBackend, MemoryBackend, ModelStore};
pub use crate::training::{TrainingData, TrainingSummary};
