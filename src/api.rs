//! Request and response bodies for an HTTP (or any message) boundary.
//!
//! The boundary layer itself lives outside this crate; these types fix the
//! JSON shape and the error-kind mapping so it never has to parse messages.

use serde::{Deserialize, Serialize};

use crate::engine::{Prediction, PredictionEngine};
use crate::error::{ErrorKind, ForecastError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRequest {
    #[serde(alias = "subdivision", default)]
    pub region: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResponse {
    pub region: String,
    pub predicted_value: f64,
}

impl From<Prediction> for PredictionResponse {
    fn from(prediction: Prediction) -> Self {
        PredictionResponse {
            region: prediction.region,
            predicted_value: prediction.value,
        }
    }
}

/// Structured error body: `{ "kind": ..., "message": ..., "region": ... }`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub kind: ErrorKind,
    pub message: String,
    pub region: String,
}

impl ErrorBody {
    pub fn status_code(&self) -> u16 {
        self.kind.status_code()
    }
}

impl From<&ForecastError> for ErrorBody {
    fn from(err: &ForecastError) -> Self {
        ErrorBody {
            kind: err.kind(),
            message: err.to_string(),
            region: err.region().to_string(),
        }
    }
}

impl From<ForecastError> for ErrorBody {
    fn from(err: ForecastError) -> Self {
        ErrorBody::from(&err)
    }
}

/// Run one request through the engine.
pub fn respond(engine: &PredictionEngine, request: &PredictionRequest) -> Result<PredictionResponse, ErrorBody> {
    engine
        .predict(&request.region)
        .map(PredictionResponse::from)
        .map_err(ErrorBody::from)
}
