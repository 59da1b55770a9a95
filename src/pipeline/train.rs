use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::config::Config;
use crate::data::{aggregate_hourly, load_records, prepare_samples, samples_to_tensors, write_flattened_csv};
use crate::error::{ForecastError, Result};
use crate::evaluation::{evaluate_model, EvaluationReport};
use crate::models::forecast_network::ForecastNetwork;
use crate::persistence::{ModelMetadata, PersistentModel};
use crate::pipeline::load_network;
use crate::scaler::ScalerParams;
use crate::training::{create_forecast_trainer, TrainingMetrics};

/// Everything a training run produced besides the files it wrote
#[derive(Debug, Clone)]
pub struct TrainingOutcome {
    /// Sequence length the windows were built with (may be shorter than configured)
    pub sequence_length: usize,
    pub train_samples: usize,
    pub test_samples: usize,
    /// True when an existing model was loaded and fine-tuned
    pub fine_tuned: bool,
    pub scaler: ScalerParams,
    pub metadata: ModelMetadata,
    pub history: Vec<TrainingMetrics>,
    pub report: EvaluationReport,
}

/// Load the model at the configured path, or build a fresh one
fn load_or_create(config: &Config, sequence_length: usize) -> Result<(ForecastNetwork, ModelMetadata, bool)> {
    if config.model_path.exists() {
        tracing::info!(path = %config.model_path.display(), "loading existing model for fine-tuning");
        let (network, metadata) = load_network(&config.model_path)?;
        if network.architecture() != config.architecture() {
            tracing::warn!(
                saved = ?network.architecture(),
                configured = ?config.architecture(),
                "saved layer sizes differ from the configuration, keeping the saved ones"
            );
        }
        return Ok((network, metadata, true));
    }

    tracing::info!(path = %config.model_path.display(), "no existing model found, creating a new one");
    let mut rng = StdRng::seed_from_u64(config.seed);
    let network = ForecastNetwork::new(&config.architecture(), &mut rng);
    for line in network.summary().lines() {
        tracing::info!("{}", line);
    }
    let metadata = ModelMetadata::new("sensor-forecast", &network, sequence_length);
    Ok((network, metadata, false))
}

/// Run the full training pipeline
///
/// Reads the raw sensor log, writes the flattened CSV artifact, windows the
/// hourly means, fits the scaler on the training split, trains (or
/// fine-tunes) the network, persists model and scaler, and evaluates on the
/// held-out split.
pub fn run_training(config: &Config) -> Result<TrainingOutcome> {
    config.validate()?;

    let records = load_records(&config.input_path)?;
    write_flattened_csv(&records, &config.artifact_path)?;

    let series = aggregate_hourly(&records)?;
    let prepared = prepare_samples(
        &series,
        config.sequence_length,
        config.short_data_policy,
        config.test_fraction,
        config.seed,
    )?;
    let sequence_length = prepared.sequence_length;

    let (train_inputs, train_targets) = samples_to_tensors(&prepared.train)?;
    let (test_inputs, test_targets) = samples_to_tensors(&prepared.test)?;
    tracing::info!(
        train_shape = ?train_inputs.shape(),
        test_shape = ?test_inputs.shape(),
        "built training tensors"
    );

    let scaler = ScalerParams::fit_windows(&train_inputs)?;
    tracing::info!(
        humidity = ?(scaler.min_humidity, scaler.max_humidity),
        light = ?(scaler.min_light, scaler.max_light),
        "fitted scaler on the training split"
    );
    let train_inputs = scaler.transform_windows(&train_inputs);
    let test_inputs = scaler.transform_windows(&test_inputs);

    let (network, mut metadata, fine_tuned) = load_or_create(config, sequence_length)?;

    let mut trainer = create_forecast_trainer(network, config.learning_rate, config.training_config());
    tracing::info!(
        learning_rate = trainer.optimizer.learning_rate(),
        fine_tuned,
        "optimizer ready"
    );
    trainer.fit(&train_inputs, &train_targets, Some((&test_inputs, &test_targets)))?;

    let report = evaluate_model(&trainer, &test_inputs, &test_targets)?;
    let final_loss = trainer.get_latest_metrics().map(|m| m.train_loss);
    let history = trainer.get_metrics_history().to_vec();
    let network = trainer.into_network();

    // Sidecar first: a model file is never paired with stale scaler bounds
    let scaler_path = config.scaler_path();
    scaler.save(&scaler_path).map_err(|source| ForecastError::ModelSave {
        path: scaler_path.clone(),
        source,
    })?;

    metadata.record_training(sequence_length, config.epochs, final_loss);
    network
        .save(&config.model_path, &metadata)
        .map_err(|source| ForecastError::ModelSave {
            path: config.model_path.clone(),
            source,
        })?;
    tracing::info!(
        model = %config.model_path.display(),
        scaler = %scaler_path.display(),
        "saved model"
    );

    Ok(TrainingOutcome {
        sequence_length,
        train_samples: prepared.train.len(),
        test_samples: prepared.test.len(),
        fine_tuned,
        scaler,
        metadata,
        history,
        report,
    })
}
