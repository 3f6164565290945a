//! Lookup of model/scaler artifacts by artifact key.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::info;

use crate::models::lstm_forecaster::LSTMForecaster;
use crate::models::Predictor;
use crate::persistence::{PersistenceError, PersistentArtifact};
use crate::scaler::{Scaler, ScalerArtifact};

/// A model and the scaler fitted alongside it, loaded from the same key.
#[derive(Debug, Clone)]
pub struct ArtifactPair {
    pub key: String,
    pub model: Arc<dyn Predictor>,
    pub scaler: Arc<dyn Scaler>,
}

/// Which artifacts exist for a key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArtifactPresence {
    pub model: bool,
    pub scaler: bool,
}

impl ArtifactPresence {
    pub fn complete(&self) -> bool {
        self.model && self.scaler
    }
}

/// Two parallel artifact namespaces (model-by-key, scaler-by-key).
pub trait ArtifactStore: Send + Sync {
    fn presence(&self, key: &str) -> ArtifactPresence;

    fn load_model(&self, key: &str) -> Result<Arc<dyn Predictor>, PersistenceError>;

    fn load_scaler(&self, key: &str) -> Result<Arc<dyn Scaler>, PersistenceError>;

    /// Load both artifacts for `key`; fails if either one fails.
    fn load_pair(&self, key: &str) -> Result<ArtifactPair, PersistenceError> {
        Ok(ArtifactPair {
            key: key.to_string(),
            model: self.load_model(key)?,
            scaler: self.load_scaler(key)?,
        })
    }
}

/// Artifacts stored as `{dir}/{key}{suffix}` files.
#[derive(Debug, Clone)]
pub struct FsArtifactStore {
    dir: PathBuf,
    model_suffix: String,
    scaler_suffix: String,
}

impl FsArtifactStore {
    pub fn new<P: Into<PathBuf>>(dir: P) -> Self {
        FsArtifactStore {
            dir: dir.into(),
            model_suffix: "_lstm.bin".to_string(),
            scaler_suffix: "_scaler.json".to_string(),
        }
    }

    pub fn with_suffixes(mut self, model_suffix: impl Into<String>, scaler_suffix: impl Into<String>) -> Self {
        self.model_suffix = model_suffix.into();
        self.scaler_suffix = scaler_suffix.into();
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn model_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}{}", key, self.model_suffix))
    }

    pub fn scaler_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}{}", key, self.scaler_suffix))
    }
}

impl ArtifactStore for FsArtifactStore {
    fn presence(&self, key: &str) -> ArtifactPresence {
        ArtifactPresence {
            model: self.model_path(key).is_file(),
            scaler: self.scaler_path(key).is_file(),
        }
    }

    fn load_model(&self, key: &str) -> Result<Arc<dyn Predictor>, PersistenceError> {
        let path = self.model_path(key);
        let (model, metadata) = LSTMForecaster::load(&path)?;
        info!(
            key,
            path = %path.display(),
            model_name = %metadata.model_name,
            layers = model.num_layers,
            hidden = model.hidden_size,
            outputs = model.output_size(),
            "loaded model"
        );
        Ok(Arc::new(model))
    }

    fn load_scaler(&self, key: &str) -> Result<Arc<dyn Scaler>, PersistenceError> {
        let path = self.scaler_path(key);
        let (scaler, _) = ScalerArtifact::load(&path)?;
        info!(key, path = %path.display(), "loaded scaler");
        Ok(Arc::new(scaler))
    }
}

/// Artifacts held in memory, for embedding pre-built models and for tests.
#[derive(Debug, Default)]
pub struct MemoryArtifactStore {
    models: RwLock<HashMap<String, Arc<dyn Predictor>>>,
    scalers: RwLock<HashMap<String, Arc<dyn Scaler>>>,
}

impl MemoryArtifactStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_model(&self, key: impl Into<String>, model: Arc<dyn Predictor>) {
        self.models.write().insert(key.into(), model);
    }

    pub fn insert_scaler(&self, key: impl Into<String>, scaler: Arc<dyn Scaler>) {
        self.scalers.write().insert(key.into(), scaler);
    }

    pub fn insert_pair(&self, key: impl Into<String>, model: Arc<dyn Predictor>, scaler: Arc<dyn Scaler>) {
        let key = key.into();
        self.insert_model(key.clone(), model);
        self.insert_scaler(key, scaler);
    }
}

fn not_found(kind: &str, key: &str) -> PersistenceError {
    PersistenceError::IoError(std::io::Error::new(
        std::io::ErrorKind::NotFound,
        format!("no {} stored for key {}", kind, key),
    ))
}

impl ArtifactStore for MemoryArtifactStore {
    fn presence(&self, key: &str) -> ArtifactPresence {
        ArtifactPresence {
            model: self.models.read().contains_key(key),
            scaler: self.scalers.read().contains_key(key),
        }
    }

    fn load_model(&self, key: &str) -> Result<Arc<dyn Predictor>, PersistenceError> {
        self.models.read().get(key).cloned().ok_or_else(|| not_found("model", key))
    }

    fn load_scaler(&self, key: &str) -> Result<Arc<dyn Scaler>, PersistenceError> {
        self.scalers.read().get(key).cloned().ok_or_else(|| not_found("scaler", key))
    }
}
