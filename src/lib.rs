//! # Sensor Forecast
//!
//! Hourly temperature forecasting from humidity and light sensor logs, built
//! on a batched LSTM trained with full backpropagation through time.
//!
//! ## Core Components
//!
//! - **Data**: JSON/CSV ingestion, hourly aggregation, windowing and a seeded
//!   train/test split with an explicit short-data policy
//! - **Scaler**: min-max scaling fit on the training split and persisted next
//!   to the model
//! - **Network**: LSTM(64, ReLU) → Dense(32, ReLU) → Dense(1)
//! - **Training**: mini-batch Adam with MSE loss, MAE metric and gradient clipping
//! - **Pipeline**: the `forecast-train` and `forecast-predict` entry points
//!
//! ## Quick Start
//!
//! ```rust
//! use rand::rngs::StdRng;
//! use rand::SeedableRng;
//! use sensor_forecast::models::forecast_network::{ForecastNetwork, NetworkArchitecture};
//! use sensor_forecast::training::{create_forecast_trainer, TrainingConfig};
//!
//! let mut rng = StdRng::seed_from_u64(42);
//! let network = ForecastNetwork::new(&NetworkArchitecture::default(), &mut rng);
//! let trainer = create_forecast_trainer(network, 0.001, TrainingConfig::default());
//!
//! // Inputs are (windows, timesteps, 2) tensors of scaled humidity and light
//! let window = ndarray::Array3::<f64>::zeros((1, 3, 2));
//! let forecast = trainer.predict(&window).unwrap();
//! assert_eq!(forecast.len(), 1);
//! ```

pub mod config;
pub mod data;
pub mod error;
pub mod evaluation;
pub mod layers;
pub mod logging;
pub mod loss;
pub mod metrics;
pub mod models;
pub mod optimizers;
pub mod persistence;
pub mod pipeline;
pub mod scaler;
pub mod training;
pub mod utils;

// Re-export commonly used items
pub use config::Config;
pub use error::{ForecastError, Result};
pub use evaluation::EvaluationReport;
pub use layers::dense::DenseLayer;
pub use layers::lstm_cell::LSTMCell;
pub use loss::{MAELoss, MSELoss};
pub use models::forecast_network::{ForecastNetwork, NetworkArchitecture};
pub use optimizers::Adam;
pub use persistence::{ModelMetadata, ModelPersistence, PersistenceError, PersistentModel};
pub use scaler::ScalerParams;
pub use training::{ForecastTrainer, TrainingConfig};

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array3;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_library_integration() {
        let arch = NetworkArchitecture {
            input_size: 2,
            recurrent_units: 3,
            dense_units: 2,
        };
        let network = ForecastNetwork::new(&arch, &mut StdRng::seed_from_u64(1));
        let inputs = Array3::from_elem((4, 3, 2), 0.5);

        let predictions = network.predict(&inputs).unwrap();
        assert_eq!(predictions.len(), 4);
        // identical windows give identical forecasts
        assert!(predictions.iter().all(|p| (p - predictions[0]).abs() < 1e-12));
    }
}
