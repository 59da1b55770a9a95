//! End-to-end training and prediction runs driven by a [`Config`](crate::config::Config).

/// Ingest, window, scale, fit, persist and evaluate.
pub mod train;

/// Forecast the next hour from the latest window.
pub mod predict;

use std::path::Path;

use crate::error::{ForecastError, Result};
use crate::models::forecast_network::{ForecastNetwork, FEATURE_COUNT};
use crate::persistence::{ModelMetadata, PersistenceError, PersistentModel};

pub use predict::{run_prediction, Prediction};
pub use train::{run_training, TrainingOutcome};

/// Load a persisted network and check it still takes (humidity, light) input
pub(crate) fn load_network(path: &Path) -> Result<(ForecastNetwork, ModelMetadata)> {
    let model_load = |source: PersistenceError| ForecastError::ModelLoad {
        path: path.to_path_buf(),
        source,
    };

    let (network, metadata) = ForecastNetwork::load(path).map_err(model_load)?;
    if network.architecture().input_size != FEATURE_COUNT {
        return Err(model_load(PersistenceError::Incompatible(format!(
            "network expects {} input features, pipeline provides {}",
            network.architecture().input_size,
            FEATURE_COUNT
        ))));
    }

    tracing::info!(
        path = %path.display(),
        epochs = metadata.total_epochs,
        sequence_length = metadata.sequence_length,
        description = metadata.description.as_deref().unwrap_or("-"),
        "loaded model"
    );
    Ok((network, metadata))
}
