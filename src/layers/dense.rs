use ndarray::{Array2, Axis};
use ndarray_rand::RandomExt;
use rand::Rng;
use rand_distr::Uniform;

use crate::optimizers::Optimizer;
use crate::utils::Activation;

/// Holds gradients for dense layer parameters during backpropagation
#[derive(Clone, Debug)]
pub struct DenseGradients {
    pub weight: Array2<f64>,
    pub bias: Array2<f64>,
}

/// Values a dense forward pass keeps for the matching backward pass
#[derive(Clone, Debug)]
pub struct DenseCache {
    pub input: Array2<f64>,
    pub pre_activation: Array2<f64>,
}

/// A fully connected layer followed by an element-wise activation
///
/// Performs `output = φ(weight · input + bias)` where weight has shape
/// (output_size, input_size), bias (output_size, 1) and input (input_size, batch).
#[derive(Clone, Debug)]
pub struct DenseLayer {
    pub weight: Array2<f64>,
    pub bias: Array2<f64>,
    pub input_size: usize,
    pub output_size: usize,
    pub activation: Activation,
}

impl DenseLayer {
    /// Create a new dense layer with Glorot-uniform weights and zero bias
    pub fn new<R: Rng + ?Sized>(input_size: usize, output_size: usize, activation: Activation, rng: &mut R) -> Self {
        let limit = (6.0 / (input_size + output_size) as f64).sqrt();
        let weight = Array2::random_using((output_size, input_size), Uniform::new_inclusive(-limit, limit), rng);
        let bias = Array2::zeros((output_size, 1));

        Self {
            weight,
            bias,
            input_size,
            output_size,
            activation,
        }
    }

    /// Create a layer from existing parameters
    ///
    /// Returns `None` when the bias is not shaped (output_size, 1).
    pub fn from_weights(weight: Array2<f64>, bias: Array2<f64>, activation: Activation) -> Option<Self> {
        let (output_size, input_size) = weight.dim();
        if bias.shape() != [output_size, 1] {
            return None;
        }

        Some(Self {
            weight,
            bias,
            input_size,
            output_size,
            activation,
        })
    }

    pub fn forward(&self, input: &Array2<f64>) -> Array2<f64> {
        self.forward_with_cache(input).0
    }

    /// Forward pass returning the cache needed by [`DenseLayer::backward`]
    pub fn forward_with_cache(&self, input: &Array2<f64>) -> (Array2<f64>, DenseCache) {
        let pre_activation = self.weight.dot(input) + &self.bias;
        let activation = self.activation;
        let output = pre_activation.mapv(|x| activation.apply(x));

        let cache = DenseCache {
            input: input.clone(),
            pre_activation,
        };
        (output, cache)
    }

    /// Backward pass given the gradient w.r.t. the activated output
    ///
    /// Returns (parameter_gradients, input_gradient).
    pub fn backward(&self, grad_output: &Array2<f64>, cache: &DenseCache) -> (DenseGradients, Array2<f64>) {
        let activation = self.activation;
        let grad_pre = grad_output * &cache.pre_activation.mapv(|x| activation.derivative(x));

        let gradients = DenseGradients {
            weight: grad_pre.dot(&cache.input.t()),
            bias: grad_pre.sum_axis(Axis(1)).insert_axis(Axis(1)),
        };
        let input_grad = self.weight.t().dot(&grad_pre);

        (gradients, input_grad)
    }

    /// Update parameters using the provided optimizer
    pub fn update_parameters<O: Optimizer>(&mut self, gradients: &DenseGradients, optimizer: &mut O, prefix: &str) {
        optimizer.update(&format!("{}_weight", prefix), &mut self.weight, &gradients.weight);
        optimizer.update(&format!("{}_bias", prefix), &mut self.bias, &gradients.bias);
    }

    /// Get the number of parameters in this layer
    pub fn num_parameters(&self) -> usize {
        self.weight.len() + self.bias.len()
    }
}
