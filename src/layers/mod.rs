/// Batched LSTM cell with backpropagation support.
pub mod lstm_cell;

/// Fully connected layer.
pub mod dense;
