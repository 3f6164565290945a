//! Batch predictions for map visualizations.
//!
//! Coordinates come from outside the dataset; this module only pairs them
//! with predictions and writes the records a map renderer consumes.

use serde::{Deserialize, Serialize};
use std::path::Path;

use tracing::{info, warn};

use crate::engine::PredictionEngine;
use crate::error::ErrorKind;
use crate::persistence::{ModelPersistence, PersistenceError};

/// Where to place a region on the map
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionCoordinates {
    #[serde(alias = "subdivision")]
    pub region: String,
    pub latitude: f64,
    pub longitude: f64,
}

/// One map marker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapRecord {
    pub region: String,
    pub latitude: f64,
    pub longitude: f64,
    pub predicted_value: f64,
}

/// A region that could not be placed on the map
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapFailure {
    pub region: String,
    pub kind: ErrorKind,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MapReport {
    pub records: Vec<MapRecord>,
    pub failures: Vec<MapFailure>,
}

impl MapReport {
    /// Write only the records, as a pretty JSON array.
    pub fn write_json<P: AsRef<Path>>(&self, path: P) -> Result<(), PersistenceError> {
        ModelPersistence::save_to_json(&self.records, path)
    }
}

/// Load a JSON array of [`RegionCoordinates`].
pub fn load_coordinates<P: AsRef<Path>>(path: P) -> Result<Vec<RegionCoordinates>, PersistenceError> {
    ModelPersistence::load_from_json(path)
}

/// Predict every region in `coordinates`. Failed regions are reported, never
/// given a placeholder value.
pub fn build_map_records(engine: &PredictionEngine, coordinates: &[RegionCoordinates]) -> MapReport {
    let mut report = MapReport::default();

    for place in coordinates {
        match engine.predict(&place.region) {
            Ok(prediction) => report.records.push(MapRecord {
                region: prediction.region,
                latitude: place.latitude,
                longitude: place.longitude,
                predicted_value: prediction.value,
            }),
            Err(err) => {
                warn!(region = %place.region, kind = %err.kind(), error = %err, "skipping region on map");
                report.failures.push(MapFailure {
                    region: place.region.clone(),
                    kind: err.kind(),
                    message: err.to_string(),
                });
            }
        }
    }

    info!(
        records = report.records.len(),
        failures = report.failures.len(),
        "built map records"
    );
    report
}
