use ndarray::{Array2, Dimension};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use thiserror::Error;

use crate::layers::linear::LinearLayer;
use crate::layers::lstm_cell::LSTMCell;
use crate::models::lstm_forecaster::LSTMForecaster;
use crate::scaler::ScalerArtifact;

/// Serializable version of Array2<f64> for persistence
#[derive(Serialize, Deserialize)]
struct SerializableArray2 {
    data: Vec<f64>,
    shape: (usize, usize),
}

impl From<&Array2<f64>> for SerializableArray2 {
    fn from(array: &Array2<f64>) -> Self {
        Self {
            data: array.iter().cloned().collect(),
            shape: array.raw_dim().into_pattern(),
        }
    }
}

impl TryFrom<SerializableArray2> for Array2<f64> {
    type Error = PersistenceError;

    fn try_from(array: SerializableArray2) -> Result<Self, Self::Error> {
        Array2::from_shape_vec(array.shape, array.data)
            .map_err(|err| PersistenceError::SerializationError(format!("malformed array: {}", err)))
    }
}

/// Serializable LSTM cell parameters
#[derive(Serialize, Deserialize)]
pub struct SerializableLSTMCell {
    w_ih: SerializableArray2,
    w_hh: SerializableArray2,
    b_ih: SerializableArray2,
    b_hh: SerializableArray2,
}

impl From<&LSTMCell> for SerializableLSTMCell {
    fn from(cell: &LSTMCell) -> Self {
        Self {
            w_ih: (&cell.w_ih).into(),
            w_hh: (&cell.w_hh).into(),
            b_ih: (&cell.b_ih).into(),
            b_hh: (&cell.b_hh).into(),
        }
    }
}

impl TryFrom<SerializableLSTMCell> for LSTMCell {
    type Error = PersistenceError;

    fn try_from(cell: SerializableLSTMCell) -> Result<Self, Self::Error> {
        LSTMCell::from_weights(
            cell.w_ih.try_into()?,
            cell.w_hh.try_into()?,
            cell.b_ih.try_into()?,
            cell.b_hh.try_into()?,
        )
        .map_err(|err| PersistenceError::SerializationError(err.to_string()))
    }
}

/// Serializable dense layer parameters
#[derive(Serialize, Deserialize)]
pub struct SerializableLinear {
    weight: SerializableArray2,
    bias: SerializableArray2,
}

impl From<&LinearLayer> for SerializableLinear {
    fn from(layer: &LinearLayer) -> Self {
        Self {
            weight: (&layer.weight).into(),
            bias: (&layer.bias).into(),
        }
    }
}

impl TryFrom<SerializableLinear> for LinearLayer {
    type Error = PersistenceError;

    fn try_from(layer: SerializableLinear) -> Result<Self, Self::Error> {
        LinearLayer::from_weights(layer.weight.try_into()?, layer.bias.try_into()?)
            .map_err(|err| PersistenceError::SerializationError(err.to_string()))
    }
}

/// Serializable forecaster
#[derive(Serialize, Deserialize)]
pub struct SerializableForecaster {
    cells: Vec<SerializableLSTMCell>,
    head: SerializableLinear,
}

impl From<&LSTMForecaster> for SerializableForecaster {
    fn from(model: &LSTMForecaster) -> Self {
        Self {
            cells: model.cells().iter().map(|cell| cell.into()).collect(),
            head: model.head().into(),
        }
    }
}

impl TryFrom<SerializableForecaster> for LSTMForecaster {
    type Error = PersistenceError;

    fn try_from(model: SerializableForecaster) -> Result<Self, Self::Error> {
        let cells = model
            .cells
            .into_iter()
            .map(LSTMCell::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        let head = LinearLayer::try_from(model.head)?;
        LSTMForecaster::from_parts(cells, head)
            .map_err(|err| PersistenceError::SerializationError(err.to_string()))
    }
}

/// Model metadata recorded when the artifact was exported
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ModelMetadata {
    pub model_name: String,
    pub version: String,
    pub created_at: String,
    pub input_size: usize,
    pub hidden_size: usize,
    pub num_layers: usize,
    pub window_length: usize,
    pub description: Option<String>,
}

impl ModelMetadata {
    /// Metadata describing `model`, stamped with the crate version and now
    pub fn for_model(model: &LSTMForecaster, model_name: impl Into<String>, window_length: usize) -> Self {
        ModelMetadata {
            model_name: model_name.into(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            created_at: chrono::Utc::now().to_rfc3339(),
            input_size: model.input_size,
            hidden_size: model.hidden_size,
            num_layers: model.num_layers,
            window_length,
            description: None,
        }
    }
}

/// Scaler metadata recorded when the artifact was exported
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ScalerMetadata {
    pub region: String,
    pub version: String,
    pub created_at: String,
    pub description: Option<String>,
}

impl ScalerMetadata {
    pub fn for_region(region: impl Into<String>) -> Self {
        ScalerMetadata {
            region: region.into(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            created_at: chrono::Utc::now().to_rfc3339(),
            description: None,
        }
    }
}

/// Complete saved model including network and metadata
#[derive(Serialize, Deserialize)]
pub struct SavedModel {
    pub network: SerializableForecaster,
    pub metadata: ModelMetadata,
}

/// Complete saved scaler including metadata
#[derive(Serialize, Deserialize)]
pub struct SavedScaler {
    pub scaler: ScalerArtifact,
    pub metadata: ScalerMetadata,
}

/// Errors that can occur during artifact persistence operations
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<serde_json::Error> for PersistenceError {
    fn from(error: serde_json::Error) -> Self {
        PersistenceError::SerializationError(error.to_string())
    }
}

impl From<bincode::Error> for PersistenceError {
    fn from(error: bincode::Error) -> Self {
        PersistenceError::SerializationError(error.to_string())
    }
}

/// Artifact persistence operations
pub struct ModelPersistence;

impl ModelPersistence {
    /// Save to JSON format (human-readable)
    pub fn save_to_json<T: Serialize, P: AsRef<Path>>(artifact: &T, path: P) -> Result<(), PersistenceError> {
        let json = serde_json::to_string_pretty(artifact)?;
        let mut file = File::create(path)?;
        file.write_all(json.as_bytes())?;
        Ok(())
    }

    /// Load from JSON format
    pub fn load_from_json<T: DeserializeOwned, P: AsRef<Path>>(path: P) -> Result<T, PersistenceError> {
        let mut file = File::open(path)?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;
        let artifact = serde_json::from_str(&contents)?;
        Ok(artifact)
    }

    /// Save to binary format (compact and fast)
    pub fn save_to_binary<T: Serialize, P: AsRef<Path>>(artifact: &T, path: P) -> Result<(), PersistenceError> {
        let encoded = bincode::serialize(artifact)?;
        let mut file = File::create(path)?;
        file.write_all(&encoded)?;
        Ok(())
    }

    /// Load from binary format
    pub fn load_from_binary<T: DeserializeOwned, P: AsRef<Path>>(path: P) -> Result<T, PersistenceError> {
        let mut file = File::open(path)?;
        let mut contents = Vec::new();
        file.read_to_end(&mut contents)?;
        let artifact = bincode::deserialize(&contents)?;
        Ok(artifact)
    }

    /// Save with the format picked from the extension (`json`, else binary)
    pub fn save<T: Serialize, P: AsRef<Path>>(artifact: &T, path: P) -> Result<(), PersistenceError> {
        if is_json(path.as_ref()) {
            Self::save_to_json(artifact, path)
        } else {
            Self::save_to_binary(artifact, path)
        }
    }

    /// Load with the format picked from the extension (`json`, else binary)
    pub fn load<T: DeserializeOwned, P: AsRef<Path>>(path: P) -> Result<T, PersistenceError> {
        if is_json(path.as_ref()) {
            Self::load_from_json(path)
        } else {
            Self::load_from_binary(path)
        }
    }
}

fn is_json(path: &Path) -> bool {
    matches!(path.extension().and_then(|s| s.to_str()), Some("json"))
}

/// Convenience trait for saving/loading an artifact with its metadata
pub trait PersistentArtifact: Sized {
    type Metadata;

    /// Save to file (format determined by file extension)
    fn save<P: AsRef<Path>>(&self, path: P, metadata: Self::Metadata) -> Result<(), PersistenceError>;

    /// Load from file (format determined by file extension)
    fn load<P: AsRef<Path>>(path: P) -> Result<(Self, Self::Metadata), PersistenceError>;
}

impl PersistentArtifact for LSTMForecaster {
    type Metadata = ModelMetadata;

    fn save<P: AsRef<Path>>(&self, path: P, metadata: ModelMetadata) -> Result<(), PersistenceError> {
        let saved = SavedModel {
            network: self.into(),
            metadata,
        };
        ModelPersistence::save(&saved, path)
    }

    fn load<P: AsRef<Path>>(path: P) -> Result<(Self, ModelMetadata), PersistenceError> {
        let saved: SavedModel = ModelPersistence::load(path)?;
        Ok((saved.network.try_into()?, saved.metadata))
    }
}

impl PersistentArtifact for ScalerArtifact {
    type Metadata = ScalerMetadata;

    fn save<P: AsRef<Path>>(&self, path: P, metadata: ScalerMetadata) -> Result<(), PersistenceError> {
        let saved = SavedScaler {
            scaler: self.clone(),
            metadata,
        };
        ModelPersistence::save(&saved, path)
    }

    fn load<P: AsRef<Path>>(path: P) -> Result<(Self, ScalerMetadata), PersistenceError> {
        let saved: SavedScaler = ModelPersistence::load(path)?;
        saved
            .scaler
            .validate()
            .map_err(|err| PersistenceError::SerializationError(format!("invalid scaler parameters: {}", err)))?;
        Ok((saved.scaler, saved.metadata))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_array_round_trip() {
        let array = Array2::from_shape_vec((2, 3), vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
        let serializable = SerializableArray2::from(&array);
        let restored: Array2<f64> = serializable.try_into().unwrap();
        assert_eq!(restored, array);
    }

    #[test]
    fn test_malformed_array_is_an_error() {
        let broken = SerializableArray2 {
            data: vec![1.0, 2.0, 3.0],
            shape: (2, 2),
        };
        let result: Result<Array2<f64>, _> = broken.try_into();
        assert!(matches!(result, Err(PersistenceError::SerializationError(_))));
    }

    #[test]
    fn test_extension_detection() {
        assert!(is_json(Path::new("KERALA_scaler.json")));
        assert!(!is_json(Path::new("KERALA_lstm.bin")));
        assert!(!is_json(Path::new("KERALA_lstm")));
    }
}
