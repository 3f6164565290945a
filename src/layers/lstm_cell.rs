use ndarray::{s, Array2};
use ndarray_rand::rand_distr::Uniform;
use ndarray_rand::RandomExt;

use crate::error::InferenceError;
use crate::utils::{sigmoid, tanh};

/// Inference-only LSTM cell
///
/// Implements the standard LSTM equations on column-major batches
/// (`(features, batch)`):
/// - i_t = σ(W_xi * x_t + W_hi * h_t-1 + b_i)
/// - f_t = σ(W_xf * x_t + W_hf * h_t-1 + b_f)
/// - g_t = tanh(W_xg * x_t + W_hg * h_t-1 + b_g)
/// - o_t = σ(W_xo * x_t + W_ho * h_t-1 + b_o)
/// - c_t = f_t ⊙ c_t-1 + i_t ⊙ g_t
/// - h_t = o_t ⊙ tanh(c_t)
#[derive(Clone, Debug)]
pub struct LSTMCell {
    pub w_ih: Array2<f64>,  // input-to-hidden weights (4*hidden_size, input_size)
    pub w_hh: Array2<f64>,  // hidden-to-hidden weights (4*hidden_size, hidden_size)
    pub b_ih: Array2<f64>,  // input-to-hidden bias (4*hidden_size, 1)
    pub b_hh: Array2<f64>,  // hidden-to-hidden bias (4*hidden_size, 1)
    pub input_size: usize,
    pub hidden_size: usize,
}

impl LSTMCell {
    /// Creates a cell with uniform(-0.1, 0.1) weights and zero biases
    pub fn new(input_size: usize, hidden_size: usize) -> Self {
        let dist = Uniform::new(-0.1, 0.1);

        LSTMCell {
            w_ih: Array2::random((4 * hidden_size, input_size), dist),
            w_hh: Array2::random((4 * hidden_size, hidden_size), dist),
            b_ih: Array2::zeros((4 * hidden_size, 1)),
            b_hh: Array2::zeros((4 * hidden_size, 1)),
            input_size,
            hidden_size,
        }
    }

    /// Builds a cell from trained weights, checking that the shapes agree
    pub fn from_weights(
        w_ih: Array2<f64>,
        w_hh: Array2<f64>,
        b_ih: Array2<f64>,
        b_hh: Array2<f64>,
    ) -> Result<Self, InferenceError> {
        let (gates, input_size) = w_ih.dim();
        if gates == 0 || gates % 4 != 0 {
            return Err(InferenceError::ShapeMismatch {
                expected: vec![4, input_size],
                actual: w_ih.shape().to_vec(),
            });
        }
        let hidden_size = gates / 4;

        let check_shape = |array: &Array2<f64>, shape: [usize; 2]| {
            if array.shape() == shape {
                Ok(())
            } else {
                Err(InferenceError::ShapeMismatch {
                    expected: shape.to_vec(),
                    actual: array.shape().to_vec(),
                })
            }
        };
        check_shape(&w_hh, [gates, hidden_size])?;
        check_shape(&b_ih, [gates, 1])?;
        check_shape(&b_hh, [gates, 1])?;

        Ok(LSTMCell {
            w_ih,
            w_hh,
            b_ih,
            b_hh,
            input_size,
            hidden_size,
        })
    }

    /// One timestep. Returns `(h_t, c_t)`, each `(hidden_size, batch)`.
    pub fn forward(&self, input: &Array2<f64>, hx: &Array2<f64>, cx: &Array2<f64>) -> (Array2<f64>, Array2<f64>) {
        let h = self.hidden_size;

        // All gates at once: [input_gate, forget_gate, cell_gate, output_gate]
        let gates = &self.w_ih.dot(input) + &self.b_ih + &self.w_hh.dot(hx) + &self.b_hh;

        let input_gate = gates.slice(s![0..h, ..]).map(|&x| sigmoid(x));
        let forget_gate = gates.slice(s![h..2 * h, ..]).map(|&x| sigmoid(x));
        let cell_gate = gates.slice(s![2 * h..3 * h, ..]).map(|&x| tanh(x));
        let output_gate = gates.slice(s![3 * h..4 * h, ..]).map(|&x| sigmoid(x));

        let cy = &forget_gate * cx + &input_gate * &cell_gate;
        let hy = &output_gate * &cy.map(|&x| tanh(x));

        (hy, cy)
    }

    pub fn num_parameters(&self) -> usize {
        self.w_ih.len() + self.w_hh.len() + self.b_ih.len() + self.b_hh.len()
    }
}
