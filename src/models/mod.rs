use ndarray::{Array2, Array3};
use std::fmt;

use crate::error::InferenceError;

/// Module for the stacked LSTM forecaster.
pub mod lstm_forecaster;

/// A trained forecasting model treated as a black box.
///
/// Input is `(batch, timesteps, features)`, output is `(batch, outputs)`.
/// The prediction engine always passes a single window `(1, window, 1)` and
/// expects `(1, 1)` back. Implementations must not mutate themselves during
/// prediction so one loaded instance can serve concurrent requests.
pub trait Predictor: Send + Sync + fmt::Debug {
    fn predict(&self, input: &Array3<f64>) -> Result<Array2<f64>, InferenceError>;
}
