/// Inference-only LSTM cell.
pub mod lstm_cell;

/// Dense output layer.
pub mod linear;
