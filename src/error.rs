use std::path::PathBuf;

use thiserror::Error;

use crate::persistence::PersistenceError;

/// Result alias used throughout the forecasting pipeline
pub type Result<T> = std::result::Result<T, ForecastError>;

/// Errors raised by the ingestion, training and prediction stages
#[derive(Debug, Error)]
pub enum ForecastError {
    /// Reading or writing a pipeline file failed
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Sensor input could not be decoded or is missing a required field
    #[error("failed to parse sensor input {path}: {reason}")]
    InputParse { path: PathBuf, reason: String },

    /// A record carries a timestamp none of the accepted formats match
    #[error("invalid timestamp '{value}' in record {record}")]
    InvalidTimestamp { record: usize, value: String },

    /// The flattened CSV artifact could not be written
    #[error("failed to write CSV artifact {path}: {source}")]
    Artifact {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// The persisted model or its scaler sidecar is missing, unreadable or incompatible
    #[error("{path}: {source}")]
    ModelLoad {
        path: PathBuf,
        #[source]
        source: PersistenceError,
    },

    #[error("failed to save model to {path}: {source}")]
    ModelSave {
        path: PathBuf,
        #[source]
        source: PersistenceError,
    },

    /// Too few hourly aggregates or samples for the requested operation
    #[error("insufficient data for {context}: need at least {required}, found {available}")]
    InsufficientData {
        context: &'static str,
        required: usize,
        available: usize,
    },

    #[error("input shape mismatch: expected {expected}, found {found}")]
    ShapeMismatch { expected: String, found: String },

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl ForecastError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ForecastError::Io {
            path: path.into(),
            source,
        }
    }

    /// True for failures the predictor reports as a model loading problem
    pub fn is_model_load(&self) -> bool {
        matches!(self, ForecastError::ModelLoad { .. })
    }
}
