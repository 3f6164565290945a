//! Explicit configuration for the resolver and prediction engine.
//!
//! Everything the pipeline needs is carried in [`ForecastConfig`] and handed
//! to the engine at construction time. The file format is JSON:
//!
//! ```json
//! {
//!   "dataset_path": "data/Rain_data.csv",
//!   "artifact_dir": "model",
//!   "similarity_threshold": 0.6,
//!   "window_length": 5,
//!   "cache_artifacts": true
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;

/// Minimum similarity for a fuzzy region match.
pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.6;

/// Number of trailing annual values fed to the model.
pub const DEFAULT_WINDOW_LENGTH: usize = 5;

/// Column names of the historical dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetColumns {
    pub region: String,
    pub year: String,
    pub value: String,
}

impl Default for DatasetColumns {
    fn default() -> Self {
        DatasetColumns {
            region: "SUBDIVISION".to_string(),
            year: "YEAR".to_string(),
            value: "ANNUAL".to_string(),
        }
    }
}

/// Resolver and engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastConfig {
    /// CSV file with one row per (region, year)
    pub dataset_path: PathBuf,

    /// Directory holding `{key}{model_suffix}` and `{key}{scaler_suffix}` files
    pub artifact_dir: PathBuf,

    pub similarity_threshold: f64,

    pub window_length: usize,

    /// Keep loaded model/scaler pairs in memory between requests
    pub cache_artifacts: bool,

    pub model_suffix: String,

    pub scaler_suffix: String,

    pub columns: DatasetColumns,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        ForecastConfig {
            dataset_path: PathBuf::from("data/Rain_data.csv"),
            artifact_dir: PathBuf::from("model"),
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
            window_length: DEFAULT_WINDOW_LENGTH,
            cache_artifacts: true,
            model_suffix: "_lstm.bin".to_string(),
            scaler_suffix: "_scaler.json".to_string(),
            columns: DatasetColumns::default(),
        }
    }
}

impl ForecastConfig {
    /// Load a JSON config file. Missing fields take their defaults.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        let config: ForecastConfig = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_dataset_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.dataset_path = path.into();
        self
    }

    pub fn with_artifact_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.artifact_dir = dir.into();
        self
    }

    pub fn with_similarity_threshold(mut self, threshold: f64) -> Self {
        self.similarity_threshold = threshold;
        self
    }

    pub fn with_window_length(mut self, window_length: usize) -> Self {
        self.window_length = window_length;
        self
    }

    pub fn with_cache(mut self, enabled: bool) -> Self {
        self.cache_artifacts = enabled;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.similarity_threshold) {
            return Err(ConfigError::InvalidThreshold(self.similarity_threshold));
        }
        if self.window_length == 0 {
            return Err(ConfigError::ZeroWindow);
        }
        Ok(())
    }
}
