//! Forecast the next-hour temperature with the persisted model.
//!
//! Reads the latest window from the configured prediction input, prints the
//! forecast and writes it with two decimals to the result file. A model that
//! cannot be loaded is reported as `Error al cargar el modelo: <reason>` on
//! stdout with exit status 1, leaving the result file untouched.
use std::process;

use anyhow::Result;
use dotenvy::dotenv;

use sensor_forecast::config;
use sensor_forecast::logging::init_tracing;
use sensor_forecast::pipeline::run_prediction;

fn format_series(values: impl Iterator<Item = f64>) -> String {
    let values: Vec<String> = values.map(|v| format!("{:.2}", v)).collect();
    format!("[{}]", values.join(", "))
}

/// Render the scaled (timesteps, 2) window as nested rows
fn format_window(window: &ndarray::Array2<f64>) -> String {
    let rows: Vec<String> = window
        .rows()
        .into_iter()
        .map(|row| format_series(row.iter().copied()))
        .collect();
    format!("[{}]", rows.join(", "))
}

fn main() -> Result<()> {
    // ---
    dotenv().ok();
    init_tracing();

    let cfg = config::load_from_env()?;
    cfg.log_config();

    let prediction = match run_prediction(&cfg) {
        Ok(prediction) => prediction,
        Err(e) if e.is_model_load() => {
            println!("Error al cargar el modelo: {}", e);
            process::exit(1);
        }
        Err(e) => return Err(e.into()),
    };

    let features = &prediction.window.features;
    println!(
        "Últimos {} valores de humedad: {}",
        prediction.sequence_length,
        format_series(features.column(0).iter().copied())
    );
    println!(
        "Últimos {} valores de luz: {}",
        prediction.sequence_length,
        format_series(features.column(1).iter().copied())
    );
    println!("Datos de entrada para el modelo: {}", format_window(&prediction.scaled));
    println!("Predicción de la temperatura: {:.2}", prediction.value);
    println!("Predicción guardada en '{}'", cfg.result_path.display());

    Ok(())
}
