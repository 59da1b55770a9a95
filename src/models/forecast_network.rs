use ndarray::{s, Array1, Array2, Array3};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{ForecastError, Result};
use crate::layers::dense::{DenseCache, DenseGradients, DenseLayer};
use crate::layers::lstm_cell::{LSTMCell, LSTMCellCache, LSTMCellGradients};
use crate::optimizers::Optimizer;
use crate::utils::Activation;

/// Number of input features per timestep: humidity and light
pub const FEATURE_COUNT: usize = 2;

/// Layer sizes of a [`ForecastNetwork`]
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct NetworkArchitecture {
    pub input_size: usize,
    pub recurrent_units: usize,
    pub dense_units: usize,
}

impl Default for NetworkArchitecture {
    fn default() -> Self {
        NetworkArchitecture {
            input_size: FEATURE_COUNT,
            recurrent_units: 64,
            dense_units: 32,
        }
    }
}

/// Cached activations of a full forward pass over a batch of windows
#[derive(Clone, Debug)]
pub struct ForecastNetworkCache {
    pub steps: Vec<LSTMCellCache>,
    pub hidden: DenseCache,
    pub output: DenseCache,
}

#[derive(Clone, Debug)]
pub struct ForecastNetworkGradients {
    pub recurrent: LSTMCellGradients,
    pub hidden: DenseGradients,
    pub output: DenseGradients,
}

/// Sequence-to-one regressor: LSTM (ReLU) → Dense (ReLU) → Dense (linear, 1 unit)
///
/// Only the hidden state after the last timestep feeds the dense head. Inputs
/// are batches shaped (batch, timesteps, features).
#[derive(Clone, Debug)]
pub struct ForecastNetwork {
    pub recurrent: LSTMCell,
    pub hidden: DenseLayer,
    pub output: DenseLayer,
}

impl ForecastNetwork {
    pub fn new<R: Rng + ?Sized>(architecture: &NetworkArchitecture, rng: &mut R) -> Self {
        let recurrent = LSTMCell::new(
            architecture.input_size,
            architecture.recurrent_units,
            Activation::Relu,
            rng,
        );
        let hidden = DenseLayer::new(architecture.recurrent_units, architecture.dense_units, Activation::Relu, rng);
        let output = DenseLayer::new(architecture.dense_units, 1, Activation::Linear, rng);

        ForecastNetwork {
            recurrent,
            hidden,
            output,
        }
    }

    /// Assembles a network from deserialized layers, checking they connect
    pub fn from_layers(recurrent: LSTMCell, hidden: DenseLayer, output: DenseLayer) -> Result<Self> {
        if hidden.input_size != recurrent.hidden_size {
            return Err(ForecastError::ShapeMismatch {
                expected: format!("dense input of {}", recurrent.hidden_size),
                found: hidden.input_size.to_string(),
            });
        }
        if output.input_size != hidden.output_size || output.output_size != 1 {
            return Err(ForecastError::ShapeMismatch {
                expected: format!("output layer {} -> 1", hidden.output_size),
                found: format!("{} -> {}", output.input_size, output.output_size),
            });
        }

        Ok(ForecastNetwork {
            recurrent,
            hidden,
            output,
        })
    }

    pub fn architecture(&self) -> NetworkArchitecture {
        NetworkArchitecture {
            input_size: self.recurrent.input_size,
            recurrent_units: self.recurrent.hidden_size,
            dense_units: self.hidden.output_size,
        }
    }

    pub fn num_parameters(&self) -> usize {
        self.recurrent.num_parameters() + self.hidden.num_parameters() + self.output.num_parameters()
    }

    /// Layer-by-layer description in the spirit of a model summary table
    pub fn summary(&self) -> String {
        let arch = self.architecture();
        let mut lines = vec![
            format!(
                "lstm   ({} -> {}, {})  params: {}",
                arch.input_size,
                arch.recurrent_units,
                self.recurrent.activation.name(),
                self.recurrent.num_parameters()
            ),
            format!(
                "dense  ({} -> {}, {})  params: {}",
                self.hidden.input_size,
                self.hidden.output_size,
                self.hidden.activation.name(),
                self.hidden.num_parameters()
            ),
            format!(
                "dense  ({} -> {}, {})  params: {}",
                self.output.input_size,
                self.output.output_size,
                self.output.activation.name(),
                self.output.num_parameters()
            ),
        ];
        lines.push(format!("total params: {}", self.num_parameters()));
        lines.join("\n")
    }

    /// Checks a (batch, timesteps, features) tensor against the input layer
    pub fn check_input(&self, inputs: &Array3<f64>) -> Result<()> {
        let (_, _, features) = inputs.dim();
        if features != self.recurrent.input_size {
            return Err(ForecastError::ShapeMismatch {
                expected: format!("(batch, timesteps, {})", self.recurrent.input_size),
                found: format!("{:?}", inputs.shape()),
            });
        }
        Ok(())
    }

    /// Predicts one temperature per window in the batch
    pub fn predict(&self, inputs: &Array3<f64>) -> Result<Array1<f64>> {
        self.check_input(inputs)?;
        let (output, _) = self.forward_with_cache(inputs);
        Ok(output.row(0).to_owned())
    }

    /// Forward pass returning outputs shaped (1, batch); callers check shapes first
    pub fn forward_with_cache(&self, inputs: &Array3<f64>) -> (Array2<f64>, ForecastNetworkCache) {
        let (batch, timesteps, _) = inputs.dim();
        let units = self.recurrent.hidden_size;

        let mut hx = Array2::zeros((units, batch));
        let mut cx = Array2::zeros((units, batch));
        let mut steps = Vec::with_capacity(timesteps);

        for t in 0..timesteps {
            // (batch, features) → (features, batch)
            let x_t = inputs.slice(s![.., t, ..]).t().to_owned();
            let (new_hx, new_cx, cache) = self.recurrent.forward_with_cache(&x_t, &hx, &cx);
            steps.push(cache);
            hx = new_hx;
            cx = new_cx;
        }

        let (hidden_out, hidden) = self.hidden.forward_with_cache(&hx);
        let (prediction, output) = self.output.forward_with_cache(&hidden_out);

        (prediction, ForecastNetworkCache { steps, hidden, output })
    }

    /// Backpropagation through the dense head and then through time
    pub fn backward(&self, d_output: &Array2<f64>, cache: &ForecastNetworkCache) -> ForecastNetworkGradients {
        let (output, d_hidden_out) = self.output.backward(d_output, &cache.output);
        let (hidden, d_last_state) = self.hidden.backward(&d_hidden_out, &cache.hidden);

        let mut recurrent = self.recurrent.zero_gradients();
        let mut dh = d_last_state;
        let mut dc = Array2::zeros(dh.raw_dim());

        for step in cache.steps.iter().rev() {
            let (step_gradients, _dx, dhx, dcx) = self.recurrent.backward(&dh, &dc, step);
            recurrent.accumulate(&step_gradients);
            dh = dhx;
            dc = dcx;
        }

        ForecastNetworkGradients {
            recurrent,
            hidden,
            output,
        }
    }

    pub fn update_parameters<O: Optimizer>(&mut self, gradients: &ForecastNetworkGradients, optimizer: &mut O) {
        self.recurrent.update_parameters(&gradients.recurrent, optimizer, "lstm");
        self.hidden.update_parameters(&gradients.hidden, optimizer, "dense_hidden");
        self.output.update_parameters(&gradients.output, optimizer, "dense_output");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::arr3;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn small_network(seed: u64) -> ForecastNetwork {
        let mut rng = StdRng::seed_from_u64(seed);
        let arch = NetworkArchitecture {
            input_size: 2,
            recurrent_units: 6,
            dense_units: 4,
        };
        ForecastNetwork::new(&arch, &mut rng)
    }

    #[test]
    fn test_default_architecture() {
        let arch = NetworkArchitecture::default();
        assert_eq!(arch.input_size, 2);
        assert_eq!(arch.recurrent_units, 64);
        assert_eq!(arch.dense_units, 32);

        let mut rng = StdRng::seed_from_u64(0);
        let network = ForecastNetwork::new(&arch, &mut rng);
        // 4*64*(2+64) + 2*4*64 lstm, 64*32+32 dense, 32+1 output
        assert_eq!(network.num_parameters(), 4 * 64 * 66 + 2 * 256 + 64 * 32 + 32 + 33);
    }

    #[test]
    fn test_predict_one_value_per_window() {
        let network = small_network(3);
        let inputs = arr3(&[
            [[0.0, 0.1], [0.5, 0.4], [1.0, 0.9]],
            [[0.2, 0.3], [0.4, 0.6], [0.1, 0.0]],
        ]);

        let predictions = network.predict(&inputs).unwrap();
        assert_eq!(predictions.len(), 2);
    }

    #[test]
    fn test_predict_rejects_wrong_feature_count() {
        let network = small_network(3);
        let inputs = Array3::zeros((1, 3, 5));
        assert!(matches!(
            network.predict(&inputs),
            Err(ForecastError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn test_same_seed_same_network() {
        let a = small_network(11);
        let b = small_network(11);
        assert_eq!(a.recurrent.w_ih, b.recurrent.w_ih);
        assert_eq!(a.output.weight, b.output.weight);
    }

    #[test]
    fn test_gradients_match_finite_difference() {
        let mut network = small_network(5);
        // Switch the recurrent layer to tanh so the check avoids ReLU kinks
        network.recurrent.activation = Activation::Tanh;
        network.hidden.activation = Activation::Tanh;

        let inputs = arr3(&[[[0.3, 0.8], [0.6, 0.1]], [[0.9, 0.2], [0.4, 0.5]]]);
        let loss = |net: &ForecastNetwork| net.forward_with_cache(&inputs).0.sum();

        let (output, cache) = network.forward_with_cache(&inputs);
        let gradients = network.backward(&Array2::ones(output.raw_dim()), &cache);

        let eps = 1e-6;
        for &(row, col) in &[(0, 0), (7, 1), (13, 0), (20, 1)] {
            let mut plus = network.clone();
            plus.recurrent.w_ih[[row, col]] += eps;
            let mut minus = network.clone();
            minus.recurrent.w_ih[[row, col]] -= eps;

            let numeric = (loss(&plus) - loss(&minus)) / (2.0 * eps);
            let analytic = gradients.recurrent.w_ih[[row, col]];
            assert!(
                (numeric - analytic).abs() < 1e-5,
                "w_ih[{},{}]: numeric {} vs analytic {}",
                row,
                col,
                numeric,
                analytic
            );
        }

        for &(row, col) in &[(0, 0), (5, 2), (10, 5)] {
            let mut plus = network.clone();
            plus.recurrent.w_hh[[row, col]] += eps;
            let mut minus = network.clone();
            minus.recurrent.w_hh[[row, col]] -= eps;

            let numeric = (loss(&plus) - loss(&minus)) / (2.0 * eps);
            let analytic = gradients.recurrent.w_hh[[row, col]];
            assert!((numeric - analytic).abs() < 1e-5, "w_hh[{},{}]", row, col);
        }
    }
}
