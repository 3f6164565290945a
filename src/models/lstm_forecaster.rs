use ndarray::{s, Array2, Array3};

use crate::error::InferenceError;
use crate::layers::linear::LinearLayer;
use crate::layers::lstm_cell::LSTMCell;
use crate::models::Predictor;

/// Stacked LSTM followed by a dense head
///
/// Layer i+1 consumes the hidden state of layer i at every timestep. After
/// the last timestep the top layer's hidden state goes through the dense
/// head, giving one row of `output_size` values per batch entry.
#[derive(Clone, Debug)]
pub struct LSTMForecaster {
    cells: Vec<LSTMCell>,
    head: LinearLayer,
    pub input_size: usize,
    pub hidden_size: usize,
    pub num_layers: usize,
}

impl LSTMForecaster {
    /// Creates a randomly initialized forecaster
    ///
    /// First layer accepts `input_size` features, subsequent layers accept
    /// `hidden_size` values from the previous layer.
    pub fn new(input_size: usize, hidden_size: usize, num_layers: usize, output_size: usize) -> Self {
        let cells = (0..num_layers)
            .map(|i| {
                let layer_input_size = if i == 0 { input_size } else { hidden_size };
                LSTMCell::new(layer_input_size, hidden_size)
            })
            .collect();

        LSTMForecaster {
            cells,
            head: LinearLayer::new(hidden_size, output_size),
            input_size,
            hidden_size,
            num_layers,
        }
    }

    /// Assembles a forecaster from trained parts (used for deserialization)
    pub fn from_parts(cells: Vec<LSTMCell>, head: LinearLayer) -> Result<Self, InferenceError> {
        let first = cells.first().ok_or(InferenceError::ShapeMismatch {
            expected: vec![1],
            actual: vec![0],
        })?;
        let input_size = first.input_size;
        let hidden_size = first.hidden_size;

        for (i, cell) in cells.iter().enumerate() {
            let layer_input_size = if i == 0 { input_size } else { hidden_size };
            if cell.input_size != layer_input_size || cell.hidden_size != hidden_size {
                return Err(InferenceError::ShapeMismatch {
                    expected: vec![hidden_size, layer_input_size],
                    actual: vec![cell.hidden_size, cell.input_size],
                });
            }
        }
        if head.input_size != hidden_size {
            return Err(InferenceError::ShapeMismatch {
                expected: vec![head.output_size, hidden_size],
                actual: vec![head.output_size, head.input_size],
            });
        }

        Ok(LSTMForecaster {
            num_layers: cells.len(),
            cells,
            head,
            input_size,
            hidden_size,
        })
    }

    /// Get reference to the cells (used for serialization)
    pub fn cells(&self) -> &[LSTMCell] {
        &self.cells
    }

    pub fn head(&self) -> &LinearLayer {
        &self.head
    }

    pub fn output_size(&self) -> usize {
        self.head.output_size
    }

    pub fn num_parameters(&self) -> usize {
        self.cells.iter().map(LSTMCell::num_parameters).sum::<usize>() + self.head.num_parameters()
    }

    /// Run a sequence of `(input_size, batch)` steps through every layer and
    /// return the top layer's final hidden state `(hidden_size, batch)`.
    pub fn forward_sequence(&self, sequence: &[Array2<f64>]) -> Array2<f64> {
        let batch = sequence.first().map(|x| x.ncols()).unwrap_or(1);
        let mut hx = vec![Array2::zeros((self.hidden_size, batch)); self.num_layers];
        let mut cx = vec![Array2::zeros((self.hidden_size, batch)); self.num_layers];

        for input in sequence {
            let mut current = input.clone();
            for (layer, cell) in self.cells.iter().enumerate() {
                let (hy, cy) = cell.forward(&current, &hx[layer], &cx[layer]);
                current = hy.clone();
                hx[layer] = hy;
                cx[layer] = cy;
            }
        }

        hx.pop().unwrap_or_else(|| Array2::zeros((self.hidden_size, batch)))
    }
}

impl Predictor for LSTMForecaster {
    fn predict(&self, input: &Array3<f64>) -> Result<Array2<f64>, InferenceError> {
        let (batch, steps, features) = input.dim();
        if features != self.input_size || steps == 0 || batch == 0 {
            return Err(InferenceError::ShapeMismatch {
                expected: vec![batch.max(1), steps.max(1), self.input_size],
                actual: input.shape().to_vec(),
            });
        }

        // (batch, features) slices transposed to the cells' (features, batch)
        let sequence: Vec<Array2<f64>> = (0..steps)
            .map(|t| input.slice(s![.., t, ..]).t().to_owned())
            .collect();

        let hidden = self.forward_sequence(&sequence);
        let output = self.head.forward(&hidden)?;
        Ok(output.reversed_axes())
    }
}
