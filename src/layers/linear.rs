use ndarray::Array2;
use ndarray_rand::rand_distr::Uniform;
use ndarray_rand::RandomExt;

use crate::error::InferenceError;

/// A fully connected (dense) layer
///
/// Performs `output = weight · input + bias` where weight has shape
/// (output_size, input_size), bias has shape (output_size, 1) and input is
/// (input_size, batch_size).
#[derive(Clone, Debug)]
pub struct LinearLayer {
    pub weight: Array2<f64>,     // (output_size, input_size)
    pub bias: Array2<f64>,       // (output_size, 1)
    pub input_size: usize,
    pub output_size: usize,
}

impl LinearLayer {
    /// Create a new linear layer with Xavier/Glorot uniform initialization
    pub fn new(input_size: usize, output_size: usize) -> Self {
        let range = (2.0 / (input_size + output_size) as f64).sqrt();

        Self {
            weight: Array2::random((output_size, input_size), Uniform::new(-range, range)),
            bias: Array2::zeros((output_size, 1)),
            input_size,
            output_size,
        }
    }

    /// Create a new linear layer with zero initialization
    pub fn new_zeros(input_size: usize, output_size: usize) -> Self {
        Self {
            weight: Array2::zeros((output_size, input_size)),
            bias: Array2::zeros((output_size, 1)),
            input_size,
            output_size,
        }
    }

    /// Create a layer from trained weights
    pub fn from_weights(weight: Array2<f64>, bias: Array2<f64>) -> Result<Self, InferenceError> {
        let (output_size, input_size) = weight.dim();
        if bias.shape() != [output_size, 1] {
            return Err(InferenceError::ShapeMismatch {
                expected: vec![output_size, 1],
                actual: bias.shape().to_vec(),
            });
        }

        Ok(Self {
            weight,
            bias,
            input_size,
            output_size,
        })
    }

    /// Forward pass: (input_size, batch) -> (output_size, batch)
    pub fn forward(&self, input: &Array2<f64>) -> Result<Array2<f64>, InferenceError> {
        if input.nrows() != self.input_size {
            return Err(InferenceError::ShapeMismatch {
                expected: vec![self.input_size, input.ncols()],
                actual: input.shape().to_vec(),
            });
        }

        // bias broadcasts across the batch columns
        Ok(&self.weight.dot(input) + &self.bias)
    }

    pub fn num_parameters(&self) -> usize {
        self.weight.len() + self.bias.len()
    }

    pub fn dimensions(&self) -> (usize, usize) {
        (self.input_size, self.output_size)
    }
}
