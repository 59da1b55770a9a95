//! Configuration loader for the training and prediction entry points.
//!
//! Every value has a default matching the conventional file layout
//! (`datos.csv`, `datos_convertidos.csv`, `model.bin`, `predicho.txt`) and can
//! be overridden through environment variables, optionally primed from a
//! `.env` file by the caller.
use std::env;
use std::path::PathBuf;

use crate::data::split::ShortDataPolicy;
use crate::error::{ForecastError, Result};
use crate::models::forecast_network::{NetworkArchitecture, FEATURE_COUNT};
use crate::scaler::ScalerParams;
use crate::training::TrainingConfig;

/// Parse an optional variable through `FromStr`, falling back to a default.
macro_rules! parse_var {
    ($lookup:expr, $var_name:expr, $ty:ty, $default:expr) => {
        match $lookup($var_name) {
            Some(raw) => raw
                .trim()
                .parse::<$ty>()
                .map_err(|e| ForecastError::Config(format!("invalid {} '{}': {}", $var_name, raw, e)))?,
            None => $default,
        }
    };
}

/// Read an optional path variable.
macro_rules! path_var {
    ($lookup:expr, $var_name:expr, $default:expr) => {
        $lookup($var_name).map(PathBuf::from).unwrap_or_else(|| PathBuf::from($default))
    };
}

/// Strongly typed pipeline configuration.
///
/// The default model file is `model.bin` in place of the original
/// `model.h5`: weights are stored with bincode (or JSON for a `.json`
/// path), not HDF5.
///
/// A single `sequence_length` is shared by training and prediction; the
/// predictor prefers the length recorded in the model and warns on mismatch.
#[derive(Debug, Clone)]
pub struct Config {
    // ---
    /// Raw sensor log (JSON array/object or CSV).
    pub input_path: PathBuf,

    /// Flattened CSV written by training.
    pub artifact_path: PathBuf,

    /// Sensor data read by the predictor.
    pub prediction_input: PathBuf,

    /// Persisted model; the scaler sidecar lives next to it.
    pub model_path: PathBuf,

    /// File receiving the rounded forecast.
    pub result_path: PathBuf,

    pub sequence_length: usize,
    pub short_data_policy: ShortDataPolicy,
    pub epochs: usize,
    pub batch_size: usize,
    pub learning_rate: f64,
    pub test_fraction: f64,
    pub seed: u64,
    pub recurrent_units: usize,
    pub dense_units: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            input_path: PathBuf::from("datos.csv"),
            artifact_path: PathBuf::from("datos_convertidos.csv"),
            prediction_input: PathBuf::from("datos_convertidos.csv"),
            model_path: PathBuf::from("model.bin"),
            result_path: PathBuf::from("predicho.txt"),
            sequence_length: 3,
            short_data_policy: ShortDataPolicy::Fail,
            epochs: 50,
            batch_size: 4,
            learning_rate: 0.001,
            test_fraction: 0.2,
            seed: 42,
            recurrent_units: 64,
            dense_units: 32,
        }
    }
}

/// Load configuration from environment variables with defaults.
///
/// Optional:
/// - `FORECAST_INPUT`, `FORECAST_ARTIFACT`, `FORECAST_PREDICT_INPUT`,
///   `FORECAST_MODEL`, `FORECAST_RESULT` – file locations
/// - `FORECAST_SEQ_LEN` (default: 3), `FORECAST_SHORT_DATA` (`fail` | `shrink`)
/// - `FORECAST_EPOCHS` (50), `FORECAST_BATCH_SIZE` (4),
///   `FORECAST_LEARNING_RATE` (0.001), `FORECAST_TEST_FRACTION` (0.2),
///   `FORECAST_SEED` (42)
/// - `FORECAST_RECURRENT_UNITS` (64), `FORECAST_DENSE_UNITS` (32)
///
/// Returns an error if any variable is present but invalid.
pub fn load_from_env() -> Result<Config> {
    load_with(|name| env::var(name).ok())
}

/// Same as [`load_from_env`] with an explicit variable lookup.
pub fn load_with<F>(lookup: F) -> Result<Config>
where
    F: Fn(&str) -> Option<String>,
{
    // ---
    let defaults = Config::default();
    let artifact_path = path_var!(lookup, "FORECAST_ARTIFACT", &defaults.artifact_path);
    let prediction_input = lookup("FORECAST_PREDICT_INPUT")
        .map(PathBuf::from)
        .unwrap_or_else(|| artifact_path.clone());

    let config = Config {
        input_path: path_var!(lookup, "FORECAST_INPUT", &defaults.input_path),
        artifact_path,
        prediction_input,
        model_path: path_var!(lookup, "FORECAST_MODEL", &defaults.model_path),
        result_path: path_var!(lookup, "FORECAST_RESULT", &defaults.result_path),
        sequence_length: parse_var!(lookup, "FORECAST_SEQ_LEN", usize, defaults.sequence_length),
        short_data_policy: parse_var!(lookup, "FORECAST_SHORT_DATA", ShortDataPolicy, defaults.short_data_policy),
        epochs: parse_var!(lookup, "FORECAST_EPOCHS", usize, defaults.epochs),
        batch_size: parse_var!(lookup, "FORECAST_BATCH_SIZE", usize, defaults.batch_size),
        learning_rate: parse_var!(lookup, "FORECAST_LEARNING_RATE", f64, defaults.learning_rate),
        test_fraction: parse_var!(lookup, "FORECAST_TEST_FRACTION", f64, defaults.test_fraction),
        seed: parse_var!(lookup, "FORECAST_SEED", u64, defaults.seed),
        recurrent_units: parse_var!(lookup, "FORECAST_RECURRENT_UNITS", usize, defaults.recurrent_units),
        dense_units: parse_var!(lookup, "FORECAST_DENSE_UNITS", usize, defaults.dense_units),
    };

    config.validate()?;
    Ok(config)
}

impl Config {
    /// Reject values the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        let fail = |msg: &str| Err(ForecastError::Config(msg.to_string()));

        if self.sequence_length == 0 {
            return fail("FORECAST_SEQ_LEN must be at least 1");
        }
        if self.batch_size == 0 {
            return fail("FORECAST_BATCH_SIZE must be at least 1");
        }
        if self.epochs == 0 {
            return fail("FORECAST_EPOCHS must be at least 1");
        }
        if !(self.test_fraction > 0.0 && self.test_fraction < 1.0) {
            return fail("FORECAST_TEST_FRACTION must lie strictly between 0 and 1");
        }
        if !(self.learning_rate > 0.0 && self.learning_rate.is_finite()) {
            return fail("FORECAST_LEARNING_RATE must be positive");
        }
        if self.recurrent_units == 0 || self.dense_units == 0 {
            return fail("layer sizes must be at least 1");
        }
        Ok(())
    }

    pub fn scaler_path(&self) -> PathBuf {
        ScalerParams::sidecar_path(&self.model_path)
    }

    pub fn architecture(&self) -> NetworkArchitecture {
        NetworkArchitecture {
            input_size: FEATURE_COUNT,
            recurrent_units: self.recurrent_units,
            dense_units: self.dense_units,
        }
    }

    pub fn training_config(&self) -> TrainingConfig {
        TrainingConfig {
            epochs: self.epochs,
            batch_size: self.batch_size,
            seed: self.seed,
            ..TrainingConfig::default()
        }
    }

    /// Log the loaded configuration for debugging purposes.
    pub fn log_config(&self) {
        // ---
        tracing::info!("Configuration loaded:");
        tracing::info!("  FORECAST_INPUT          : {}", self.input_path.display());
        tracing::info!("  FORECAST_ARTIFACT       : {}", self.artifact_path.display());
        tracing::info!("  FORECAST_PREDICT_INPUT  : {}", self.prediction_input.display());
        tracing::info!("  FORECAST_MODEL          : {}", self.model_path.display());
        tracing::info!("  FORECAST_RESULT         : {}", self.result_path.display());
        tracing::info!("  FORECAST_SEQ_LEN        : {}", self.sequence_length);
        tracing::info!("  FORECAST_SHORT_DATA     : {:?}", self.short_data_policy);
        tracing::info!("  FORECAST_EPOCHS         : {}", self.epochs);
        tracing::info!("  FORECAST_BATCH_SIZE     : {}", self.batch_size);
        tracing::info!("  FORECAST_LEARNING_RATE  : {}", self.learning_rate);
        tracing::info!("  FORECAST_TEST_FRACTION  : {}", self.test_fraction);
        tracing::info!("  FORECAST_SEED           : {}", self.seed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = load_with(|_| None).unwrap();
        assert_eq!(config.input_path, PathBuf::from("datos.csv"));
        assert_eq!(config.prediction_input, PathBuf::from("datos_convertidos.csv"));
        assert_eq!(config.model_path, PathBuf::from("model.bin"));
        assert_eq!(config.scaler_path(), PathBuf::from("model.scaler.json"));
        assert_eq!(config.sequence_length, 3);
        assert_eq!(config.epochs, 50);
        assert_eq!(config.batch_size, 4);
        assert_eq!(config.seed, 42);
        assert_eq!(config.short_data_policy, ShortDataPolicy::Fail);
        assert_eq!(config.architecture(), NetworkArchitecture::default());
    }

    #[test]
    fn test_prediction_input_follows_artifact() {
        let config = load_with(lookup_from(&[("FORECAST_ARTIFACT", "/tmp/flat.csv")])).unwrap();
        assert_eq!(config.prediction_input, PathBuf::from("/tmp/flat.csv"));

        let config = load_with(lookup_from(&[
            ("FORECAST_ARTIFACT", "/tmp/flat.csv"),
            ("FORECAST_PREDICT_INPUT", "/tmp/raw.json"),
        ]))
        .unwrap();
        assert_eq!(config.prediction_input, PathBuf::from("/tmp/raw.json"));
    }

    #[test]
    fn test_overrides() {
        let config = load_with(lookup_from(&[
            ("FORECAST_SEQ_LEN", "2"),
            ("FORECAST_SHORT_DATA", "shrink"),
            ("FORECAST_EPOCHS", " 5 "),
            ("FORECAST_MODEL", "out/model.json"),
        ]))
        .unwrap();
        assert_eq!(config.sequence_length, 2);
        assert_eq!(config.short_data_policy, ShortDataPolicy::Shrink);
        assert_eq!(config.epochs, 5);
        assert_eq!(config.scaler_path(), PathBuf::from("out/model.scaler.json"));
    }

    #[test]
    fn test_invalid_values() {
        assert!(matches!(
            load_with(lookup_from(&[("FORECAST_EPOCHS", "many")])),
            Err(ForecastError::Config(_))
        ));
        assert!(load_with(lookup_from(&[("FORECAST_SEQ_LEN", "0")])).is_err());
        assert!(load_with(lookup_from(&[("FORECAST_TEST_FRACTION", "1.0")])).is_err());
        assert!(load_with(lookup_from(&[("FORECAST_SHORT_DATA", "maybe")])).is_err());
    }
}
