use std::fs;
use std::process::Command;

use tempfile::tempdir;

fn predict_command(dir: &std::path::Path) -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_forecast-predict"));
    command
        .current_dir(dir)
        .env_remove("RUST_LOG")
        .env("FORECAST_LOG_LEVEL", "error")
        .env("FORECAST_MODEL", dir.join("model.bin"))
        .env("FORECAST_PREDICT_INPUT", dir.join("datos_convertidos.csv"))
        .env("FORECAST_RESULT", dir.join("predicho.txt"));
    command
}

#[test]
fn test_missing_model_exits_with_status_one() {
    let dir = tempdir().unwrap();
    let result_path = dir.path().join("predicho.txt");
    fs::write(&result_path, "23.45\n").unwrap();

    let output = predict_command(dir.path()).output().unwrap();
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert_eq!(output.status.code(), Some(1));
    assert!(stdout.contains("Error al cargar el modelo"), "stdout: {}", stdout);
    assert_eq!(fs::read_to_string(&result_path).unwrap(), "23.45\n");
}

#[test]
fn test_corrupt_model_exits_with_status_one() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("model.bin"), b"\x00\x01broken").unwrap();

    let output = predict_command(dir.path()).output().unwrap();
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert_eq!(output.status.code(), Some(1));
    assert!(stdout.starts_with("Error al cargar el modelo: "), "stdout: {}", stdout);
    assert!(!dir.path().join("predicho.txt").exists());
}

#[test]
fn test_train_then_predict_binaries() {
    let dir = tempdir().unwrap();
    let mut log = String::from("timestamp,temperature,humidity,light\n");
    for h in 0..12 {
        log.push_str(&format!("2024-05-24T{:02}:10:00Z,{},{},{}\n", h, 20 + h % 3, 40 + h % 5, 300 + 10 * h));
    }
    fs::write(dir.path().join("datos.csv"), log).unwrap();

    let train = Command::new(env!("CARGO_BIN_EXE_forecast-train"))
        .current_dir(dir.path())
        .env_remove("RUST_LOG")
        .env("FORECAST_LOG_LEVEL", "error")
        .env("FORECAST_INPUT", dir.path().join("datos.csv"))
        .env("FORECAST_ARTIFACT", dir.path().join("datos_convertidos.csv"))
        .env("FORECAST_MODEL", dir.path().join("model.bin"))
        .env("FORECAST_EPOCHS", "2")
        .env("FORECAST_RECURRENT_UNITS", "4")
        .env("FORECAST_DENSE_UNITS", "3")
        .output()
        .unwrap();
    let train_stdout = String::from_utf8_lossy(&train.stdout);
    assert!(train.status.success(), "stdout: {}", train_stdout);
    assert!(train_stdout.contains("Valores Reales:"));
    assert!(train_stdout.contains("Predicciones:"));

    let output = predict_command(dir.path()).output().unwrap();
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success(), "stdout: {}", stdout);
    assert!(stdout.contains("Datos de entrada para el modelo: [["), "stdout: {}", stdout);
    assert!(stdout.contains("Predicción de la temperatura: "));
    assert!(dir.path().join("predicho.txt").exists());
}
