//! Train (or fine-tune) the temperature forecaster from the configured sensor log.
//!
//! Writes the flattened CSV artifact, the model file and its scaler sidecar,
//! then prints the held-out metrics. Configuration comes from `FORECAST_*`
//! environment variables, optionally read from a `.env` file.
use anyhow::{Context, Result};
use dotenvy::dotenv;

use sensor_forecast::config;
use sensor_forecast::logging::init_tracing;
use sensor_forecast::pipeline::run_training;

fn main() -> Result<()> {
    // ---
    dotenv().ok();
    init_tracing();

    let cfg = config::load_from_env()?;
    cfg.log_config();

    let outcome = run_training(&cfg).context("training failed")?;

    println!("Archivo CSV creado: {}", cfg.artifact_path.display());
    println!(
        "Training windows: {} train / {} test, sequence length {}",
        outcome.train_samples, outcome.test_samples, outcome.sequence_length
    );
    println!("Modelo guardado en {}.", cfg.model_path.display());
    println!();
    print!("{}", outcome.report);
    println!();

    Ok(())
}
