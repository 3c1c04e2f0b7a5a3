//! Engine configuration and artifact locations

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Default directory holding trained artifacts
pub const DEFAULT_MODEL_DIR: &str = "models";

/// Default forecast horizon in days
pub const DEFAULT_HORIZON: usize = 30;

/// Default seed for every randomised step
pub const DEFAULT_SEED: u64 = 42;

/// Runtime configuration shared by the store, trainers and CLI
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Directory the artifacts are read from and written to
    pub model_dir: PathBuf,
    /// CSV of observations; synthetic data is generated when absent
    pub data_path: Option<PathBuf>,
    pub seed: u64,
    /// Forecast horizon used by the report pipeline
    pub horizon: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            model_dir: PathBuf::from(DEFAULT_MODEL_DIR),
            data_path: None,
            seed: DEFAULT_SEED,
            horizon: DEFAULT_HORIZON,
        }
    }
}

impl EngineConfig {
    pub fn new(model_dir: impl Into<PathBuf>) -> Self {
        Self {
            model_dir: model_dir.into(),
            ..Self::default()
        }
    }

    pub fn with_data(mut self, path: impl Into<PathBuf>) -> Self {
        self.data_path = Some(path.into());
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_horizon(mut self, horizon: usize) -> Self {
        self.horizon = horizon;
        self
    }

    pub fn paths(&self) -> ArtifactPaths {
        ArtifactPaths::new(&self.model_dir)
    }
}

/// Persisted artifacts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ArtifactKey {
    LinearRegression,
    RandomForest,
    Arima,
    Metrics,
    Anomaly,
    Risk,
}

impl ArtifactKey {
    pub const ALL: [ArtifactKey; 6] = [
        ArtifactKey::LinearRegression,
        ArtifactKey::RandomForest,
        ArtifactKey::Arima,
        ArtifactKey::Metrics,
        ArtifactKey::Anomaly,
        ArtifactKey::Risk,
    ];

    pub fn file_name(&self) -> &'static str {
        match self {
            ArtifactKey::LinearRegression => "linear_regression.json",
            ArtifactKey::RandomForest => "random_forest.json",
            ArtifactKey::Arima => "arima_model.json",
            ArtifactKey::Metrics => "metrics.json",
            ArtifactKey::Anomaly => "anomaly_model.json",
            ArtifactKey::Risk => "risk_model.json",
        }
    }
}

impl fmt::Display for ArtifactKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.file_name())
    }
}

/// File locations of every artifact under one model directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    root: PathBuf,
}

impl ArtifactPaths {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path(&self, key: ArtifactKey) -> PathBuf {
        self.root.join(key.file_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.model_dir, PathBuf::from("models"));
        assert_eq!(config.seed, 42);
        assert_eq!(config.horizon, 30);
        assert!(config.data_path.is_none());
    }

    #[test]
    fn test_paths_follow_model_dir() {
        let config = EngineConfig::new("/tmp/insight").with_seed(7);
        let paths = config.paths();

        assert_eq!(
            paths.path(ArtifactKey::Metrics),
            PathBuf::from("/tmp/insight/metrics.json")
        );
        assert_eq!(
            paths.path(ArtifactKey::Arima),
            PathBuf::from("/tmp/insight/arima_model.json")
        );
    }

    #[test]
    fn test_file_names_are_unique() {
        let mut names: Vec<&str> = ArtifactKey::ALL.iter().map(|k| k.file_name()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), ArtifactKey::ALL.len());
    }
}
