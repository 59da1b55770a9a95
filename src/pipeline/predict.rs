use std::fs;

use ndarray::Array2;

use crate::config::Config;
use crate::data::{aggregate_hourly, latest_window, load_records, stack_windows, Window};
use crate::error::{ForecastError, Result};
use crate::pipeline::load_network;
use crate::scaler::ScalerParams;
use crate::utils::round_to;

/// Forecast for the hour following the latest window
#[derive(Debug, Clone)]
pub struct Prediction {
    pub sequence_length: usize,
    /// Unscaled input window
    pub window: Window,
    /// Window after min-max scaling, as fed to the network
    pub scaled: Array2<f64>,
    /// Raw network output
    pub value: f64,
    /// Output rounded to two decimals, as written to the result file
    pub rounded: f64,
}

/// Predict the next-hour temperature and write it to the result file
///
/// The model and scaler are loaded before any data is read; if either fails
/// the result file is left untouched and a [`ForecastError::ModelLoad`] is
/// returned.
pub fn run_prediction(config: &Config) -> Result<Prediction> {
    let (network, metadata) = load_network(&config.model_path)?;

    let scaler_path = config.scaler_path();
    let scaler = ScalerParams::load(&scaler_path).map_err(|source| ForecastError::ModelLoad {
        path: scaler_path.clone(),
        source,
    })?;

    let sequence_length = metadata.sequence_length;
    if sequence_length != config.sequence_length {
        tracing::warn!(
            model = sequence_length,
            configured = config.sequence_length,
            "sequence length recorded in the model differs from the configuration, using the model's"
        );
    }

    let records = load_records(&config.prediction_input)?;
    let series = aggregate_hourly(&records)?;
    let window = latest_window(&series, sequence_length)?;
    let scaled = scaler.transform(&window.features);

    let inputs = stack_windows([&Window {
        hours: window.hours.clone(),
        features: scaled.clone(),
    }])?;
    tracing::debug!(shape = ?inputs.shape(), last_hour = ?window.last_hour(), "prediction input");

    let value = network.predict(&inputs)?[0];
    let rounded = round_to(value, 2);

    fs::write(&config.result_path, format!("{:.2}\n", value))
        .map_err(|e| ForecastError::io(&config.result_path, e))?;
    tracing::info!(path = %config.result_path.display(), value = rounded, "saved prediction");

    Ok(Prediction {
        sequence_length,
        window,
        scaled,
        value,
        rounded,
    })
}
