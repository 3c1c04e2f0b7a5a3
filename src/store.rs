//! Persistence of trained artifacts
//!
//! [`ModelStore`] serialises each artifact to JSON and hands it to an
//! [`ArtifactBackend`]: a directory on disk for the CLI, or an in-memory map
//! for tests and embedding. Loading never trains; a missing artifact surfaces as
//! [`EngineError::MissingArtifact`] so callers decide whether to train.

use crate::config::{ArtifactKey, ArtifactPaths, EngineConfig};
use crate::error::{EngineError, Result};
use demand_forecast::models::{ArimaDemandModel, ForestDemandModel, LinearDemandModel};
use demand_forecast::{DemandModelSet, MetricsDocument};
use risk_scoring::{DensityAnomalyScorer, RiskClassifier};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use tracing::debug;

/// Storage for serialised artifacts
pub trait ArtifactBackend {
    /// Read an artifact, `None` when it has never been written
    fn read(&self, key: ArtifactKey) -> Result<Option<String>>;

    fn write(&mut self, key: ArtifactKey, contents: &str) -> Result<()>;
}

/// Artifacts stored as files in one directory
#[derive(Debug, Clone)]
pub struct DirectoryBackend {
    paths: ArtifactPaths,
}

impl DirectoryBackend {
    pub fn new(paths: ArtifactPaths) -> Self {
        Self { paths }
    }
}

impl ArtifactBackend for DirectoryBackend {
    fn read(&self, key: ArtifactKey) -> Result<Option<String>> {
        let path = self.paths.path(key);
        match fs::read_to_string(&path) {
            Ok(contents) => {
                debug!(path = %path.display(), bytes = contents.len(), "read artifact");
                Ok(Some(contents))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&mut self, key: ArtifactKey, contents: &str) -> Result<()> {
        fs::create_dir_all(self.paths.root())?;
        let path = self.paths.path(key);
        fs::write(&path, contents)?;
        debug!(path = %path.display(), bytes = contents.len(), "wrote artifact");
        Ok(())
    }
}

/// Artifacts held in memory
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    entries: BTreeMap<ArtifactKey, String>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, key: ArtifactKey) -> bool {
        self.entries.contains_key(&key)
    }
}

impl ArtifactBackend for MemoryBackend {
    fn read(&self, key: ArtifactKey) -> Result<Option<String>> {
        Ok(self.entries.get(&key).cloned())
    }

    fn write(&mut self, key: ArtifactKey, contents: &str) -> Result<()> {
        self.entries.insert(key, contents.to_string());
        Ok(())
    }
}

/// Trained demand models with their accuracy metrics
#[derive(Debug, Clone, PartialEq)]
pub struct DemandArtifacts {
    pub models: DemandModelSet,
    pub metrics: MetricsDocument,
}

/// Typed load and save of every trained artifact
#[derive(Debug, Clone)]
pub struct ModelStore<B> {
    backend: B,
}

impl ModelStore<DirectoryBackend> {
    /// Store rooted at the configured model directory
    pub fn open(config: &EngineConfig) -> Self {
        Self::new(DirectoryBackend::new(config.paths()))
    }
}

impl<B: ArtifactBackend> ModelStore<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    fn load_json<T: DeserializeOwned>(&self, key: ArtifactKey) -> Result<T> {
        let contents = self
            .backend
            .read(key)?
            .ok_or(EngineError::MissingArtifact(key))?;
        Ok(serde_json::from_str(&contents)?)
    }

    fn save_json<T: Serialize>(&mut self, key: ArtifactKey, value: &T) -> Result<()> {
        let contents = serde_json::to_string_pretty(value)?;
        self.backend.write(key, &contents)
    }

    pub fn load_demand(&self) -> Result<DemandArtifacts> {
        let linear: LinearDemandModel = self.load_json(ArtifactKey::LinearRegression)?;
        let forest: ForestDemandModel = self.load_json(ArtifactKey::RandomForest)?;
        let arima: ArimaDemandModel = self.load_json(ArtifactKey::Arima)?;
        let metrics: MetricsDocument = self.load_json(ArtifactKey::Metrics)?;

        Ok(DemandArtifacts {
            models: DemandModelSet {
                linear,
                forest,
                arima,
            },
            metrics,
        })
    }

    pub fn save_demand(&mut self, artifacts: &DemandArtifacts) -> Result<()> {
        self.save_json(ArtifactKey::LinearRegression, &artifacts.models.linear)?;
        self.save_json(ArtifactKey::RandomForest, &artifacts.models.forest)?;
        self.save_json(ArtifactKey::Arima, &artifacts.models.arima)?;
        self.save_json(ArtifactKey::Metrics, &artifacts.metrics)
    }

    pub fn load_anomaly(&self) -> Result<DensityAnomalyScorer> {
        self.load_json(ArtifactKey::Anomaly)
    }

    pub fn save_anomaly(&mut self, scorer: &DensityAnomalyScorer) -> Result<()> {
        self.save_json(ArtifactKey::Anomaly, scorer)
    }

    pub fn load_risk(&self) -> Result<RiskClassifier> {
        self.load_json(ArtifactKey::Risk)
    }

    pub fn save_risk(&mut self, classifier: &RiskClassifier) -> Result<()> {
        self.save_json(ArtifactKey::Risk, classifier)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use risk_scoring::utils::generate_observations;

    #[test]
    fn test_missing_artifact_is_reported() {
        let store = ModelStore::new(MemoryBackend::new());
        let err = store.load_risk().unwrap_err();
        assert!(matches!(err, EngineError::MissingArtifact(ArtifactKey::Risk)));
    }

    #[test]
    fn test_memory_round_trip() {
        let observations = generate_observations(300, 3).unwrap();
        let (classifier, _) = RiskClassifier::train(&observations, 3).unwrap();

        let mut store = ModelStore::new(MemoryBackend::new());
        store.save_risk(&classifier).unwrap();

        assert!(store.backend().contains(ArtifactKey::Risk));
        let restored = store.load_risk().unwrap();
        let observation = observations[0];
        assert_relative_eq!(
            restored.assess(&observation).unwrap().risk_probability,
            classifier.assess(&observation).unwrap().risk_probability,
            epsilon = 1e-9
        );
        assert_eq!(restored.top_factors(), classifier.top_factors());
    }

    #[test]
    fn test_corrupt_artifact_is_a_json_error() {
        let mut backend = MemoryBackend::new();
        backend.write(ArtifactKey::Anomaly, "{not json").unwrap();

        let store = ModelStore::new(backend);
        assert!(matches!(store.load_anomaly(), Err(EngineError::Json(_))));
    }
}
