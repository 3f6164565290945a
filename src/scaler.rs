use ndarray::{Array2, Axis};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::InferenceError;

/// Fitted, invertible per-feature transform between physical units and the
/// range a model was trained on.
///
/// Inputs are `(n_samples, n_features)` arrays. Implementations are immutable
/// once fitted, so one instance can be shared across threads.
pub trait Scaler: Send + Sync + fmt::Debug {
    fn n_features(&self) -> usize;

    fn transform(&self, values: &Array2<f64>) -> Result<Array2<f64>, InferenceError>;

    fn inverse_transform(&self, values: &Array2<f64>) -> Result<Array2<f64>, InferenceError>;
}

fn check_features(expected: usize, values: &Array2<f64>) -> Result<(), InferenceError> {
    let actual = values.ncols();
    if actual != expected {
        return Err(InferenceError::FeatureMismatch { expected, actual });
    }
    Ok(())
}

/// Every fitted parameter vector must cover the same features.
fn check_parameters(expected: usize, params: &[&[f64]]) -> Result<(), InferenceError> {
    match params.iter().find(|p| p.len() != expected) {
        Some(p) => Err(InferenceError::FeatureMismatch {
            expected,
            actual: p.len(),
        }),
        None => Ok(()),
    }
}

/// Apply `f(feature_index, value)` to every element.
fn map_columns<F>(values: &Array2<f64>, f: F) -> Array2<f64>
where
    F: Fn(usize, f64) -> f64,
{
    let mut out = values.to_owned();
    for (j, mut column) in out.axis_iter_mut(Axis(1)).enumerate() {
        column.mapv_inplace(|x| f(j, x));
    }
    out
}

/// Linear map of each feature's fitted `[data_min, data_max]` onto
/// `feature_range`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MinMaxScaler {
    pub feature_range: (f64, f64),
    pub data_min: Vec<f64>,
    pub data_max: Vec<f64>,
}

impl MinMaxScaler {
    pub fn new(feature_range: (f64, f64), data_min: Vec<f64>, data_max: Vec<f64>) -> Self {
        MinMaxScaler {
            feature_range,
            data_min,
            data_max,
        }
    }

    /// Fit on `(n_samples, n_features)` training values. `None` without rows.
    pub fn fit(values: &Array2<f64>, feature_range: (f64, f64)) -> Option<Self> {
        if values.nrows() == 0 {
            return None;
        }
        let data_min = values
            .axis_iter(Axis(1))
            .map(|col| col.fold(f64::INFINITY, |acc, &x| acc.min(x)))
            .collect();
        let data_max = values
            .axis_iter(Axis(1))
            .map(|col| col.fold(f64::NEG_INFINITY, |acc, &x| acc.max(x)))
            .collect();
        Some(Self::new(feature_range, data_min, data_max))
    }

    /// Fails when `data_max` does not cover the same features as `data_min`.
    pub fn validate(&self) -> Result<(), InferenceError> {
        check_parameters(self.data_min.len(), &[self.data_max.as_slice()])
    }

    fn scale(&self, feature: usize) -> f64 {
        let range = self.data_max[feature] - self.data_min[feature];
        // constant features map onto the lower bound
        let range = if range == 0.0 { 1.0 } else { range };
        (self.feature_range.1 - self.feature_range.0) / range
    }

    fn offset(&self, feature: usize) -> f64 {
        self.feature_range.0 - self.data_min[feature] * self.scale(feature)
    }
}

impl Scaler for MinMaxScaler {
    fn n_features(&self) -> usize {
        self.data_min.len()
    }

    fn transform(&self, values: &Array2<f64>) -> Result<Array2<f64>, InferenceError> {
        self.validate()?;
        check_features(self.n_features(), values)?;
        Ok(map_columns(values, |j, x| x * self.scale(j) + self.offset(j)))
    }

    fn inverse_transform(&self, values: &Array2<f64>) -> Result<Array2<f64>, InferenceError> {
        self.validate()?;
        check_features(self.n_features(), values)?;
        Ok(map_columns(values, |j, x| (x - self.offset(j)) / self.scale(j)))
    }
}

/// Standardization to zero mean and unit variance per feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    pub mean: Vec<f64>,
    pub std: Vec<f64>,
}

impl StandardScaler {
    pub fn new(mean: Vec<f64>, std: Vec<f64>) -> Self {
        StandardScaler { mean, std }
    }

    /// Fit on `(n_samples, n_features)` training values using the population
    /// standard deviation. `None` without rows.
    pub fn fit(values: &Array2<f64>) -> Option<Self> {
        let mean = values.mean_axis(Axis(0))?;
        let std = values.std_axis(Axis(0), 0.0);
        Some(Self::new(mean.to_vec(), std.to_vec()))
    }

    pub fn validate(&self) -> Result<(), InferenceError> {
        check_parameters(self.mean.len(), &[self.std.as_slice()])
    }

    fn std_for(&self, feature: usize) -> f64 {
        let std = self.std[feature];
        if std == 0.0 {
            1.0
        } else {
            std
        }
    }
}

impl Scaler for StandardScaler {
    fn n_features(&self) -> usize {
        self.mean.len()
    }

    fn transform(&self, values: &Array2<f64>) -> Result<Array2<f64>, InferenceError> {
        self.validate()?;
        check_features(self.n_features(), values)?;
        Ok(map_columns(values, |j, x| (x - self.mean[j]) / self.std_for(j)))
    }

    fn inverse_transform(&self, values: &Array2<f64>) -> Result<Array2<f64>, InferenceError> {
        self.validate()?;
        check_features(self.n_features(), values)?;
        Ok(map_columns(values, |j, x| x * self.std_for(j) + self.mean[j]))
    }
}

/// Persisted scaler of any supported kind
///
/// Externally tagged (`{"min_max": {...}}`) so the binary format can decode it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScalerArtifact {
    MinMax(MinMaxScaler),
    Standard(StandardScaler),
}

impl ScalerArtifact {
    /// Check the fitted parameters agree on the feature count.
    pub fn validate(&self) -> Result<(), InferenceError> {
        match self {
            ScalerArtifact::MinMax(scaler) => scaler.validate(),
            ScalerArtifact::Standard(scaler) => scaler.validate(),
        }
    }

    fn inner(&self) -> &dyn Scaler {
        match self {
            ScalerArtifact::MinMax(scaler) => scaler,
            ScalerArtifact::Standard(scaler) => scaler,
        }
    }
}

impl From<MinMaxScaler> for ScalerArtifact {
    fn from(scaler: MinMaxScaler) -> Self {
        ScalerArtifact::MinMax(scaler)
    }
}

impl From<StandardScaler> for ScalerArtifact {
    fn from(scaler: StandardScaler) -> Self {
        ScalerArtifact::Standard(scaler)
    }
}

impl Scaler for ScalerArtifact {
    fn n_features(&self) -> usize {
        self.inner().n_features()
    }

    fn transform(&self, values: &Array2<f64>) -> Result<Array2<f64>, InferenceError> {
        self.inner().transform(values)
    }

    fn inverse_transform(&self, values: &Array2<f64>) -> Result<Array2<f64>, InferenceError> {
        self.inner().inverse_transform(values)
    }
}
