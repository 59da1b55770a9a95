use ndarray::{Array1, Array2, Array3, Axis};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::time::Instant;

use crate::error::{ForecastError, Result};
use crate::loss::{LossFunction, MAELoss, MSELoss};
use crate::models::forecast_network::{ForecastNetwork, ForecastNetworkGradients};
use crate::optimizers::{Adam, Optimizer};

/// Configuration for training hyperparameters
#[derive(Debug, Clone)]
pub struct TrainingConfig {
    pub epochs: usize,
    pub batch_size: usize,
    pub print_every: usize,
    pub clip_gradient: Option<f64>,
    /// Seed for the per-epoch shuffle of the training order
    pub seed: u64,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        TrainingConfig {
            epochs: 50,
            batch_size: 4,
            print_every: 10,
            clip_gradient: Some(5.0),
            seed: 42,
        }
    }
}

/// Training metrics tracked during training
#[derive(Debug, Clone)]
pub struct TrainingMetrics {
    pub epoch: usize,
    pub train_loss: f64,
    pub train_mae: f64,
    pub validation_loss: Option<f64>,
    pub validation_mae: Option<f64>,
    pub time_elapsed: f64,
}

/// Loss and mean absolute error over a dataset
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Evaluation {
    pub loss: f64,
    pub mae: f64,
}

/// Mini-batch trainer for [`ForecastNetwork`] with configurable loss and optimizer
pub struct ForecastTrainer<L: LossFunction, O: Optimizer> {
    pub network: ForecastNetwork,
    pub loss_function: L,
    pub optimizer: O,
    pub config: TrainingConfig,
    pub metrics_history: Vec<TrainingMetrics>,
}

impl<L: LossFunction, O: Optimizer> ForecastTrainer<L, O> {
    pub fn new(network: ForecastNetwork, loss_function: L, optimizer: O) -> Self {
        ForecastTrainer {
            network,
            loss_function,
            optimizer,
            config: TrainingConfig::default(),
            metrics_history: Vec::new(),
        }
    }

    pub fn with_config(mut self, config: TrainingConfig) -> Self {
        self.config = config;
        self
    }

    /// One optimizer step on a batch of windows; returns the batch loss
    pub fn train_batch(&mut self, inputs: &Array3<f64>, targets: &Array1<f64>) -> f64 {
        let (predictions, cache) = self.network.forward_with_cache(inputs);
        let targets = targets.view().insert_axis(Axis(0)).to_owned();

        let loss = self.loss_function.compute_loss(&predictions, &targets);
        let d_output = self.loss_function.compute_gradient(&predictions, &targets);
        let mut gradients = self.network.backward(&d_output, &cache);

        if let Some(clip_value) = self.config.clip_gradient {
            clip_gradients(&mut gradients, clip_value);
        }

        self.network.update_parameters(&gradients, &mut self.optimizer);
        loss
    }

    /// Train for the configured epochs with optional validation data
    pub fn fit(
        &mut self,
        inputs: &Array3<f64>,
        targets: &Array1<f64>,
        validation: Option<(&Array3<f64>, &Array1<f64>)>,
    ) -> Result<()> {
        self.network.check_input(inputs)?;
        let samples = inputs.len_of(Axis(0));
        if samples != targets.len() {
            return Err(ForecastError::ShapeMismatch {
                expected: format!("{} targets", samples),
                found: targets.len().to_string(),
            });
        }
        if samples == 0 {
            return Err(ForecastError::InsufficientData {
                context: "training",
                required: 1,
                available: 0,
            });
        }
        if let Some((val_inputs, _)) = validation {
            self.network.check_input(val_inputs)?;
        }

        let batch_size = self.config.batch_size.max(1);
        let print_every = self.config.print_every.max(1);
        let mut rng = StdRng::seed_from_u64(self.config.seed);
        let mut order: Vec<usize> = (0..samples).collect();

        tracing::info!(
            epochs = self.config.epochs,
            batch_size,
            samples,
            "starting training"
        );

        for epoch in 0..self.config.epochs {
            let start_time = Instant::now();
            order.shuffle(&mut rng);

            let mut weighted_loss = 0.0;
            for chunk in order.chunks(batch_size) {
                let batch_inputs = inputs.select(Axis(0), chunk);
                let batch_targets = targets.select(Axis(0), chunk);
                weighted_loss += self.train_batch(&batch_inputs, &batch_targets) * chunk.len() as f64;
            }

            let train_mae = self.evaluate(inputs, targets).mae;
            let (validation_loss, validation_mae) = match validation {
                Some((val_inputs, val_targets)) => {
                    let eval = self.evaluate(val_inputs, val_targets);
                    (Some(eval.loss), Some(eval.mae))
                }
                None => (None, None),
            };

            let metrics = TrainingMetrics {
                epoch,
                train_loss: weighted_loss / samples as f64,
                train_mae,
                validation_loss,
                validation_mae,
                time_elapsed: start_time.elapsed().as_secs_f64(),
            };

            if epoch % print_every == 0 || epoch + 1 == self.config.epochs {
                tracing::info!(
                    epoch = metrics.epoch + 1,
                    loss = metrics.train_loss,
                    mae = metrics.train_mae,
                    val_loss = ?metrics.validation_loss,
                    val_mae = ?metrics.validation_mae,
                    secs = metrics.time_elapsed,
                    "epoch finished"
                );
            } else {
                tracing::debug!(epoch = metrics.epoch + 1, loss = metrics.train_loss, "epoch finished");
            }

            self.metrics_history.push(metrics);
        }

        tracing::info!("training completed");
        Ok(())
    }

    /// Loss (as configured) and mean absolute error over a dataset
    pub fn evaluate(&self, inputs: &Array3<f64>, targets: &Array1<f64>) -> Evaluation {
        if targets.is_empty() {
            return Evaluation { loss: 0.0, mae: 0.0 };
        }

        let (predictions, _) = self.network.forward_with_cache(inputs);
        let targets = targets.view().insert_axis(Axis(0)).to_owned();

        Evaluation {
            loss: self.loss_function.compute_loss(&predictions, &targets),
            mae: MAELoss.compute_loss(&predictions, &targets),
        }
    }

    pub fn predict(&self, inputs: &Array3<f64>) -> Result<Array1<f64>> {
        self.network.predict(inputs)
    }

    pub fn get_latest_metrics(&self) -> Option<&TrainingMetrics> {
        self.metrics_history.last()
    }

    pub fn get_metrics_history(&self) -> &[TrainingMetrics] {
        &self.metrics_history
    }

    pub fn into_network(self) -> ForecastNetwork {
        self.network
    }
}

/// Clip every gradient matrix to a maximum Frobenius norm
fn clip_gradients(gradients: &mut ForecastNetworkGradients, max_norm: f64) {
    for matrix in gradients.recurrent.matrices_mut() {
        clip_gradient_matrix(matrix, max_norm);
    }
    for matrix in [
        &mut gradients.hidden.weight,
        &mut gradients.hidden.bias,
        &mut gradients.output.weight,
        &mut gradients.output.bias,
    ] {
        clip_gradient_matrix(matrix, max_norm);
    }
}

fn clip_gradient_matrix(matrix: &mut Array2<f64>, max_norm: f64) {
    let norm = matrix.iter().map(|x| x * x).sum::<f64>().sqrt();
    if norm > max_norm {
        let scale = max_norm / norm;
        matrix.mapv_inplace(|x| x * scale);
    }
}

/// Create the standard trainer: MSE loss with an Adam optimizer
pub fn create_forecast_trainer(
    network: ForecastNetwork,
    learning_rate: f64,
    config: TrainingConfig,
) -> ForecastTrainer<MSELoss, Adam> {
    ForecastTrainer::new(network, MSELoss, Adam::new(learning_rate)).with_config(config)
}
