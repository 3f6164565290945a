use ndarray::{Array1, Axis};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use tracing::{debug, debug_span, info};

use crate::cache::ArtifactCache;
use crate::config::ForecastConfig;
use crate::dataset::HistoricalDataset;
use crate::error::{ForecastError, InferenceError, SetupError};
use crate::resolver::{ArtifactResolver, Resolution};
use crate::store::{ArtifactPair, ArtifactStore, FsArtifactStore};
use crate::utils::round_to;

/// Decimal places of every returned prediction
pub const PREDICTION_DECIMALS: i32 = 2;

/// One forecast in physical units (mm)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    /// Canonical region the value was computed for
    pub region: String,
    pub value: f64,
}

/// Resolves region text and runs the window → scale → model → inverse-scale
/// pipeline against historical data and stored artifacts.
///
/// The engine holds no mutable state apart from the optional artifact cache,
/// so a single instance can serve concurrent requests.
pub struct PredictionEngine {
    dataset: HistoricalDataset,
    resolver: ArtifactResolver,
    store: Arc<dyn ArtifactStore>,
    cache: Option<ArtifactCache>,
    window_length: usize,
}

impl PredictionEngine {
    /// Assemble an engine over an already loaded dataset and any store.
    pub fn new(
        dataset: HistoricalDataset,
        store: Arc<dyn ArtifactStore>,
        config: &ForecastConfig,
    ) -> Result<Self, SetupError> {
        config.validate()?;
        let resolver = ArtifactResolver::new(dataset.catalog(), config.similarity_threshold)?;

        Ok(PredictionEngine {
            dataset,
            resolver,
            store,
            cache: config.cache_artifacts.then(ArtifactCache::new),
            window_length: config.window_length,
        })
    }

    /// Load the CSV dataset and use the artifact directory named in `config`.
    pub fn from_config(config: &ForecastConfig) -> Result<Self, SetupError> {
        config.validate()?;
        let dataset = HistoricalDataset::from_csv(&config.dataset_path, &config.columns)?;
        let store = FsArtifactStore::new(&config.artifact_dir)
            .with_suffixes(config.model_suffix.clone(), config.scaler_suffix.clone());
        Self::new(dataset, Arc::new(store), config)
    }

    pub fn dataset(&self) -> &HistoricalDataset {
        &self.dataset
    }

    pub fn resolver(&self) -> &ArtifactResolver {
        &self.resolver
    }

    pub fn window_length(&self) -> usize {
        self.window_length
    }

    pub fn cached_artifacts(&self) -> usize {
        self.cache.as_ref().map_or(0, ArtifactCache::len)
    }

    /// Forecast the next annual value for the region `region_text` names.
    pub fn predict(&self, region_text: &str) -> Result<Prediction, ForecastError> {
        let resolution = self.resolver.resolve(region_text)?;
        self.predict_resolved(&resolution)
    }

    /// Forecast for an already resolved region.
    pub fn predict_resolved(&self, resolution: &Resolution) -> Result<Prediction, ForecastError> {
        let span = debug_span!("predict", region = %resolution.region, key = %resolution.key);
        let _guard = span.enter();

        let region = &resolution.region;
        let failed = |source: InferenceError| ForecastError::InferenceFailed {
            region: region.clone(),
            source,
        };

        // short histories fail before any artifact is touched
        let window = self
            .dataset
            .trailing_window(region, self.window_length)
            .ok_or_else(|| ForecastError::InsufficientHistory {
                region: region.clone(),
                required: self.window_length,
                available: self.dataset.history(region).len(),
            })?;

        let pair = self.artifacts(resolution)?;

        // (window, 1 feature) for the scaler, then (1 batch, window, 1 feature)
        let column = Array1::from(window).insert_axis(Axis(1));
        let scaled = pair.scaler.transform(&column).map_err(failed)?;
        let tensor = scaled.insert_axis(Axis(0));

        let output = pair.model.predict(&tensor).map_err(failed)?;
        if output.shape() != [1, 1] {
            return Err(failed(InferenceError::ShapeMismatch {
                expected: vec![1, 1],
                actual: output.shape().to_vec(),
            }));
        }
        if !output[[0, 0]].is_finite() {
            return Err(failed(InferenceError::NonFinite));
        }

        let restored = pair.scaler.inverse_transform(&output).map_err(failed)?;
        // rounding can overflow values near f64::MAX
        let value = round_to(restored[[0, 0]], PREDICTION_DECIMALS);
        if !value.is_finite() {
            return Err(failed(InferenceError::NonFinite));
        }

        info!(region = %region, value, "prediction");
        Ok(Prediction {
            region: region.clone(),
            value,
        })
    }

    /// The model/scaler pair for the resolved key, from cache or store.
    fn artifacts(&self, resolution: &Resolution) -> Result<Arc<ArtifactPair>, ForecastError> {
        let key = &resolution.key;

        if let Some(pair) = self.cache.as_ref().and_then(|cache| cache.get(key)) {
            debug!(key = %key, "artifact cache hit");
            return Ok(pair);
        }

        let presence = self.store.presence(key);
        if !presence.complete() {
            return Err(ForecastError::ArtifactMissing {
                region: resolution.region.clone(),
                key: key.clone(),
                model_present: presence.model,
                scaler_present: presence.scaler,
            });
        }

        let pair = self
            .store
            .load_pair(key)
            .map_err(|err| ForecastError::InferenceFailed {
                region: resolution.region.clone(),
                source: InferenceError::Load(err),
            })?;

        Ok(match &self.cache {
            Some(cache) => cache.insert(pair),
            None => Arc::new(pair),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::RegionRecord;
    use crate::models::Predictor;
    use crate::scaler::MinMaxScaler;
    use crate::store::MemoryArtifactStore;
    use ndarray::{Array2, Array3};

    /// Returns the mean of its scaled inputs
    #[derive(Debug)]
    struct MeanModel;

    impl Predictor for MeanModel {
        fn predict(&self, input: &Array3<f64>) -> Result<Array2<f64>, InferenceError> {
            let mean = input.mean().unwrap_or(0.0);
            Ok(Array2::from_elem((1, 1), mean))
        }
    }

    /// Returns a fixed tensor, whatever the input
    #[derive(Debug)]
    struct FixedModel(Array2<f64>);

    impl Predictor for FixedModel {
        fn predict(&self, _input: &Array3<f64>) -> Result<Array2<f64>, InferenceError> {
            Ok(self.0.clone())
        }
    }

    fn identity() -> Arc<MinMaxScaler> {
        Arc::new(MinMaxScaler::new((0.0, 1.0), vec![0.0], vec![1.0]))
    }

    fn engine_with(store: MemoryArtifactStore) -> PredictionEngine {
        let mut records: Vec<RegionRecord> = [700.1, 650.3, 800.7, 720.4, 690.9]
            .iter()
            .enumerate()
            .map(|(i, &v)| RegionRecord::new("Haryana Delhi & Chandigarh", 2011 + i as i32, v))
            .collect();
        records.push(RegionRecord::new("Kerala", 2014, 3000.0));
        records.push(RegionRecord::new("Kerala", 2015, 3100.0));

        let dataset = HistoricalDataset::from_records(records).unwrap();
        PredictionEngine::new(dataset, Arc::new(store), &ForecastConfig::default()).unwrap()
    }

    #[test]
    fn test_predict_mean_of_window() {
        let store = MemoryArtifactStore::new();
        store.insert_pair("HARYANA_DELHI_&_CHANDIGARH", Arc::new(MeanModel), identity());
        let engine = engine_with(store);

        let prediction = engine.predict("haryana delhi and chandigarh").unwrap();
        assert_eq!(prediction.region, "HARYANA DELHI & CHANDIGARH");
        assert_eq!(prediction.value, 712.48);
        assert_eq!(engine.cached_artifacts(), 1);
        assert_eq!(engine.window_length(), 5);
    }

    #[test]
    fn test_short_history_wins_over_missing_artifacts() {
        let engine = engine_with(MemoryArtifactStore::new());
        let err = engine.predict("kerala").unwrap_err();
        assert!(matches!(
            err,
            ForecastError::InsufficientHistory { ref region, required, available: 2 }
                if region == "KERALA" && required == engine.window_length()
        ));
    }

    #[test]
    fn test_missing_scaler_only() {
        let store = MemoryArtifactStore::new();
        store.insert_model("HARYANA_DELHI_&_CHANDIGARH", Arc::new(MeanModel));
        let engine = engine_with(store);

        let err = engine.predict("HARYANA DELHI & CHANDIGARH").unwrap_err();
        assert!(matches!(
            err,
            ForecastError::ArtifactMissing { model_present: true, scaler_present: false, .. }
        ));
        assert_eq!(engine.cached_artifacts(), 0);
    }

    #[test]
    fn test_unexpected_output_shape() {
        let store = MemoryArtifactStore::new();
        store.insert_pair(
            "HARYANA_DELHI_&_CHANDIGARH",
            Arc::new(FixedModel(Array2::zeros((1, 2)))),
            identity(),
        );
        let engine = engine_with(store);

        let err = engine.predict("haryana delhi & chandigarh").unwrap_err();
        assert!(matches!(
            err,
            ForecastError::InferenceFailed { source: InferenceError::ShapeMismatch { .. }, .. }
        ));
    }

    #[test]
    fn test_non_finite_output() {
        let store = MemoryArtifactStore::new();
        store.insert_pair(
            "HARYANA_DELHI_&_CHANDIGARH",
            Arc::new(FixedModel(Array2::from_elem((1, 1), f64::NAN))),
            identity(),
        );
        let engine = engine_with(store);

        let err = engine.predict("haryana delhi & chandigarh").unwrap_err();
        assert!(matches!(
            err,
            ForecastError::InferenceFailed { source: InferenceError::NonFinite, .. }
        ));
    }

    #[test]
    fn test_overflow_while_rounding_is_non_finite() {
        let store = MemoryArtifactStore::new();
        store.insert_pair(
            "HARYANA_DELHI_&_CHANDIGARH",
            Arc::new(FixedModel(Array2::from_elem((1, 1), 1e307))),
            identity(),
        );
        let engine = engine_with(store);

        let err = engine.predict("haryana delhi & chandigarh").unwrap_err();
        assert!(matches!(
            err,
            ForecastError::InferenceFailed { source: InferenceError::NonFinite, .. }
        ));
    }

    #[test]
    fn test_scaler_applied_both_ways() {
        // model sees scaled values; output 0.5 maps back to the middle of [600, 800]
        let store = MemoryArtifactStore::new();
        store.insert_pair(
            "HARYANA_DELHI_&_CHANDIGARH",
            Arc::new(FixedModel(Array2::from_elem((1, 1), 0.5))),
            Arc::new(MinMaxScaler::new((0.0, 1.0), vec![600.0], vec![800.0])),
        );
        let engine = engine_with(store);

        assert_eq!(engine.predict("haryana delhi & chandigarh").unwrap().value, 700.0);
    }

    #[test]
    fn test_not_found() {
        let engine = engine_with(MemoryArtifactStore::new());
        assert!(matches!(
            engine.predict("ATLANTIS"),
            Err(ForecastError::RegionNotFound { .. })
        ));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let dataset = HistoricalDataset::default();
        let config = ForecastConfig::default().with_window_length(0);
        let result = PredictionEngine::new(dataset, Arc::new(MemoryArtifactStore::new()), &config);
        assert!(matches!(result, Err(SetupError::Config(_))));
    }
}
