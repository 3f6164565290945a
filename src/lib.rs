//! # Rainfall Forecast
//!
//! Serves next-year rainfall predictions from pre-trained per-region LSTM
//! models.
//!
//! ## Pipeline
//!
//! - **Resolver**: free-text region → normalized, fuzzy-matched canonical
//!   region from the historical dataset → artifact key
//! - **Engine**: trailing 5-year window → scaler → `(1, 5, 1)` tensor → model
//!   → inverse scaler → value rounded to 2 decimals
//! - **Artifacts**: model and scaler pairs looked up by key, optionally cached
//!
//! ## Quick Start
//!
//! ```no_run
//! use rainfall_forecast::{ForecastConfig, PredictionEngine};
//!
//! let config = ForecastConfig::default()
//!     .with_dataset_path("data/Rain_data.csv")
//!     .with_artifact_dir("model");
//! let engine = PredictionEngine::from_config(&config)?;
//!
//! let prediction = engine.predict("haryana delhi and chandigarh")?;
//! println!("{}: {} mm", prediction.region, prediction.value);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod utils;
pub mod error;
pub mod config;
pub mod dataset;
pub mod matcher;
pub mod resolver;
pub mod scaler;
pub mod layers;
pub mod models;
pub mod persistence;
pub mod store;
pub mod cache;
pub mod engine;
pub mod api;
pub mod map;

// Re-export commonly used items
pub use config::{DatasetColumns, ForecastConfig};
pub use dataset::{HistoricalDataset, RegionRecord};
pub use engine::{Prediction, PredictionEngine};
pub use error::{ErrorKind, ForecastError, InferenceError, SetupError};
pub use models::lstm_forecaster::LSTMForecaster;
pub use models::Predictor;
pub use persistence::{ModelMetadata, ModelPersistence, PersistenceError, PersistentArtifact, ScalerMetadata};
pub use resolver::{artifact_key, normalize, ArtifactResolver, Resolution};
pub use scaler::{MinMaxScaler, Scaler, ScalerArtifact, StandardScaler};
pub use store::{ArtifactStore, FsArtifactStore, MemoryArtifactStore};
