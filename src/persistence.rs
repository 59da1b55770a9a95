use ndarray::{Array2, Dimension};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use thiserror::Error;

use crate::layers::dense::DenseLayer;
use crate::layers::lstm_cell::LSTMCell;
use crate::models::forecast_network::{ForecastNetwork, NetworkArchitecture};
use crate::utils::Activation;

/// Errors that can occur during model persistence operations
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    SerializationError(String),
    #[error("Incompatible model: {0}")]
    Incompatible(String),
}

impl From<serde_json::Error> for PersistenceError {
    fn from(error: serde_json::Error) -> Self {
        PersistenceError::SerializationError(error.to_string())
    }
}

impl From<bincode::Error> for PersistenceError {
    fn from(error: bincode::Error) -> Self {
        PersistenceError::SerializationError(error.to_string())
    }
}

/// Serializable version of Array2<f64> for persistence
#[derive(Serialize, Deserialize)]
struct SerializableArray2 {
    data: Vec<f64>,
    shape: (usize, usize),
}

impl From<&Array2<f64>> for SerializableArray2 {
    fn from(array: &Array2<f64>) -> Self {
        Self {
            data: array.iter().cloned().collect(),
            shape: array.raw_dim().into_pattern(),
        }
    }
}

impl TryFrom<SerializableArray2> for Array2<f64> {
    type Error = PersistenceError;

    fn try_from(array: SerializableArray2) -> Result<Self, Self::Error> {
        Array2::from_shape_vec(array.shape, array.data)
            .map_err(|e| PersistenceError::Incompatible(format!("matrix data does not fit its shape: {}", e)))
    }
}

fn expect_shape(name: &str, array: &Array2<f64>, rows: usize, cols: usize) -> Result<(), PersistenceError> {
    if array.dim() != (rows, cols) {
        return Err(PersistenceError::Incompatible(format!(
            "{} has shape {:?}, expected ({}, {})",
            name,
            array.dim(),
            rows,
            cols
        )));
    }
    Ok(())
}

/// Serializable LSTM cell parameters
#[derive(Serialize, Deserialize)]
pub struct SerializableLSTMCell {
    w_ih: SerializableArray2,
    w_hh: SerializableArray2,
    b_ih: SerializableArray2,
    b_hh: SerializableArray2,
    input_size: usize,
    hidden_size: usize,
    activation: Activation,
}

impl From<&LSTMCell> for SerializableLSTMCell {
    fn from(cell: &LSTMCell) -> Self {
        Self {
            w_ih: (&cell.w_ih).into(),
            w_hh: (&cell.w_hh).into(),
            b_ih: (&cell.b_ih).into(),
            b_hh: (&cell.b_hh).into(),
            input_size: cell.input_size,
            hidden_size: cell.hidden_size,
            activation: cell.activation,
        }
    }
}

impl TryFrom<SerializableLSTMCell> for LSTMCell {
    type Error = PersistenceError;

    fn try_from(cell: SerializableLSTMCell) -> Result<Self, Self::Error> {
        let gate_rows = 4 * cell.hidden_size;
        let w_ih: Array2<f64> = cell.w_ih.try_into()?;
        let w_hh: Array2<f64> = cell.w_hh.try_into()?;
        let b_ih: Array2<f64> = cell.b_ih.try_into()?;
        let b_hh: Array2<f64> = cell.b_hh.try_into()?;

        expect_shape("lstm w_ih", &w_ih, gate_rows, cell.input_size)?;
        expect_shape("lstm w_hh", &w_hh, gate_rows, cell.hidden_size)?;
        expect_shape("lstm b_ih", &b_ih, gate_rows, 1)?;
        expect_shape("lstm b_hh", &b_hh, gate_rows, 1)?;

        Ok(LSTMCell {
            w_ih,
            w_hh,
            b_ih,
            b_hh,
            input_size: cell.input_size,
            hidden_size: cell.hidden_size,
            activation: cell.activation,
        })
    }
}

/// Serializable dense layer parameters
#[derive(Serialize, Deserialize)]
pub struct SerializableDenseLayer {
    weight: SerializableArray2,
    bias: SerializableArray2,
    activation: Activation,
}

impl From<&DenseLayer> for SerializableDenseLayer {
    fn from(layer: &DenseLayer) -> Self {
        Self {
            weight: (&layer.weight).into(),
            bias: (&layer.bias).into(),
            activation: layer.activation,
        }
    }
}

impl TryFrom<SerializableDenseLayer> for DenseLayer {
    type Error = PersistenceError;

    fn try_from(layer: SerializableDenseLayer) -> Result<Self, Self::Error> {
        let weight: Array2<f64> = layer.weight.try_into()?;
        let bias: Array2<f64> = layer.bias.try_into()?;
        DenseLayer::from_weights(weight, bias, layer.activation)
            .ok_or_else(|| PersistenceError::Incompatible("dense bias does not match its weights".to_string()))
    }
}

/// Serializable forecast network
#[derive(Serialize, Deserialize)]
pub struct SerializableForecastNetwork {
    recurrent: SerializableLSTMCell,
    hidden: SerializableDenseLayer,
    output: SerializableDenseLayer,
}

impl From<&ForecastNetwork> for SerializableForecastNetwork {
    fn from(network: &ForecastNetwork) -> Self {
        Self {
            recurrent: (&network.recurrent).into(),
            hidden: (&network.hidden).into(),
            output: (&network.output).into(),
        }
    }
}

impl TryFrom<SerializableForecastNetwork> for ForecastNetwork {
    type Error = PersistenceError;

    fn try_from(network: SerializableForecastNetwork) -> Result<Self, Self::Error> {
        ForecastNetwork::from_layers(
            network.recurrent.try_into()?,
            network.hidden.try_into()?,
            network.output.try_into()?,
        )
        .map_err(|e| PersistenceError::Incompatible(e.to_string()))
    }
}

/// Model metadata for tracking training information
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ModelMetadata {
    pub model_name: String,
    pub version: String,
    pub created_at: String,
    pub updated_at: String,
    /// Timesteps per window the network was last trained with
    pub sequence_length: usize,
    pub architecture: NetworkArchitecture,
    /// Epochs accumulated over every training run, including fine-tuning
    pub total_epochs: usize,
    pub final_loss: Option<f64>,
    pub description: Option<String>,
}

impl ModelMetadata {
    /// Metadata for a freshly created network
    pub fn new(model_name: impl Into<String>, network: &ForecastNetwork, sequence_length: usize) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        ModelMetadata {
            model_name: model_name.into(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            created_at: now.clone(),
            updated_at: now,
            sequence_length,
            architecture: network.architecture(),
            total_epochs: 0,
            final_loss: None,
            description: Some(format!(
                "next-hour temperature from {} hourly (humidity, light) steps, {} parameters",
                sequence_length,
                network.num_parameters()
            )),
        }
    }

    /// Record another completed training run
    pub fn record_training(&mut self, sequence_length: usize, epochs: usize, final_loss: Option<f64>) {
        self.version = env!("CARGO_PKG_VERSION").to_string();
        self.updated_at = chrono::Utc::now().to_rfc3339();
        self.sequence_length = sequence_length;
        self.total_epochs += epochs;
        self.final_loss = final_loss;
    }
}

/// Complete saved model including network and metadata
#[derive(Serialize, Deserialize)]
pub struct SavedModel {
    pub network: SerializableForecastNetwork,
    pub metadata: ModelMetadata,
}

/// Model persistence operations
pub struct ModelPersistence;

impl ModelPersistence {
    /// Save model to JSON format (human-readable)
    pub fn save_to_json<P: AsRef<Path>>(model: &SavedModel, path: P) -> Result<(), PersistenceError> {
        let json = serde_json::to_string_pretty(model)?;
        let mut file = File::create(path)?;
        file.write_all(json.as_bytes())?;
        Ok(())
    }

    /// Load model from JSON format
    pub fn load_from_json<P: AsRef<Path>>(path: P) -> Result<SavedModel, PersistenceError> {
        let mut file = File::open(path)?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;
        let model = serde_json::from_str(&contents)?;
        Ok(model)
    }

    /// Save model to binary format (compact and fast)
    pub fn save_to_binary<P: AsRef<Path>>(model: &SavedModel, path: P) -> Result<(), PersistenceError> {
        let encoded = bincode::serialize(model)?;
        let mut file = File::create(path)?;
        file.write_all(&encoded)?;
        Ok(())
    }

    /// Load model from binary format
    pub fn load_from_binary<P: AsRef<Path>>(path: P) -> Result<SavedModel, PersistenceError> {
        let mut file = File::open(path)?;
        let mut contents = Vec::new();
        file.read_to_end(&mut contents)?;
        let model = bincode::deserialize(&contents)?;
        Ok(model)
    }
}

fn is_json(path: &Path) -> bool {
    path.extension().and_then(|s| s.to_str()) == Some("json")
}

/// Convenience trait for easy model saving/loading
pub trait PersistentModel {
    /// Save model to file (JSON for a `.json` extension, binary otherwise)
    fn save<P: AsRef<Path>>(&self, path: P, metadata: &ModelMetadata) -> Result<(), PersistenceError>;

    /// Load model from file (JSON for a `.json` extension, binary otherwise)
    fn load<P: AsRef<Path>>(path: P) -> Result<(Self, ModelMetadata), PersistenceError>
    where
        Self: Sized;
}

impl PersistentModel for ForecastNetwork {
    fn save<P: AsRef<Path>>(&self, path: P, metadata: &ModelMetadata) -> Result<(), PersistenceError> {
        let saved_model = SavedModel {
            network: self.into(),
            metadata: metadata.clone(),
        };

        if is_json(path.as_ref()) {
            ModelPersistence::save_to_json(&saved_model, path)
        } else {
            ModelPersistence::save_to_binary(&saved_model, path)
        }
    }

    fn load<P: AsRef<Path>>(path: P) -> Result<(Self, ModelMetadata), PersistenceError> {
        let saved_model = if is_json(path.as_ref()) {
            ModelPersistence::load_from_json(path)?
        } else {
            ModelPersistence::load_from_binary(path)?
        };

        let network: ForecastNetwork = saved_model.network.try_into()?;
        if network.architecture() != saved_model.metadata.architecture {
            return Err(PersistenceError::Incompatible(format!(
                "metadata describes {:?} but weights are {:?}",
                saved_model.metadata.architecture,
                network.architecture()
            )));
        }
        Ok((network, saved_model.metadata))
    }
}
