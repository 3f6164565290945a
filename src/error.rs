//! Error types for region resolution, dataset loading and prediction.
//!
//! [`ForecastError`] is the only error a prediction request can produce. It
//! always names the region (or the raw input, when nothing matched) so a
//! boundary layer can build a response without parsing messages.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::persistence::PersistenceError;

/// Stable, serializable discriminant of a [`ForecastError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    RegionNotFound,
    ArtifactMissing,
    InsufficientHistory,
    InferenceFailed,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::RegionNotFound => "region_not_found",
            ErrorKind::ArtifactMissing => "artifact_missing",
            ErrorKind::InsufficientHistory => "insufficient_history",
            ErrorKind::InferenceFailed => "inference_failed",
        }
    }

    /// HTTP status a boundary layer would typically map this kind to.
    pub fn status_code(self) -> u16 {
        match self {
            ErrorKind::RegionNotFound | ErrorKind::ArtifactMissing => 404,
            ErrorKind::InsufficientHistory => 422,
            ErrorKind::InferenceFailed => 500,
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure of a single prediction request.
#[derive(Debug, Error)]
pub enum ForecastError {
    #[error("region '{input}' not found")]
    RegionNotFound { input: String },

    #[error("model or scaler not found for region {region} (artifact key {key})")]
    ArtifactMissing {
        region: String,
        key: String,
        model_present: bool,
        scaler_present: bool,
    },

    #[error("not enough data for prediction in {region}: {available} of {required} years available")]
    InsufficientHistory {
        region: String,
        required: usize,
        available: usize,
    },

    #[error("inference failed for region {region}: {source}")]
    InferenceFailed {
        region: String,
        #[source]
        source: InferenceError,
    },
}

impl ForecastError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ForecastError::RegionNotFound { .. } => ErrorKind::RegionNotFound,
            ForecastError::ArtifactMissing { .. } => ErrorKind::ArtifactMissing,
            ForecastError::InsufficientHistory { .. } => ErrorKind::InsufficientHistory,
            ForecastError::InferenceFailed { .. } => ErrorKind::InferenceFailed,
        }
    }

    /// Canonical region the failure refers to, or the raw input for
    /// `RegionNotFound`.
    pub fn region(&self) -> &str {
        match self {
            ForecastError::RegionNotFound { input } => input,
            ForecastError::ArtifactMissing { region, .. }
            | ForecastError::InsufficientHistory { region, .. }
            | ForecastError::InferenceFailed { region, .. } => region,
        }
    }
}

/// Failure inside the opaque model or scaler.
#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("failed to load artifact: {0}")]
    Load(#[from] PersistenceError),

    #[error("expected tensor shape {expected:?}, got {actual:?}")]
    ShapeMismatch {
        expected: Vec<usize>,
        actual: Vec<usize>,
    },

    #[error("scaler was fitted on {expected} features, got {actual}")]
    FeatureMismatch { expected: usize, actual: usize },

    #[error("model produced a non-finite value")]
    NonFinite,
}

/// Failure while reading the historical dataset.
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("failed to read dataset: {0}")]
    Io(#[from] std::io::Error),

    #[error("dataset is empty")]
    Empty,

    #[error("dataset has no '{column}' column")]
    MissingColumn { column: String },

    #[error("line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("duplicate record for {region} in {year}")]
    DuplicateYear { region: String, year: i32 },
}

/// Invalid or unreadable configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("similarity threshold must be within [0, 1], got {0}")]
    InvalidThreshold(f64),

    #[error("window length must be at least 1")]
    ZeroWindow,
}

/// The catalog cannot be mapped onto artifact keys one-to-one.
#[derive(Debug, Error)]
pub enum ResolverError {
    #[error("regions '{first}' and '{second}' both map to artifact key '{key}'")]
    KeyCollision {
        key: String,
        first: String,
        second: String,
    },
}

/// Failure while assembling a [`crate::engine::PredictionEngine`].
#[derive(Debug, Error)]
pub enum SetupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Dataset(#[from] DatasetError),

    #[error(transparent)]
    Resolver(#[from] ResolverError),
}
