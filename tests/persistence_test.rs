use ndarray::Array3;
use rand::rngs::StdRng;
use rand::SeedableRng;
use sensor_forecast::{
    persistence::{ModelMetadata, PersistenceError, PersistentModel},
    ForecastNetwork, NetworkArchitecture, ScalerParams,
};
use tempfile::tempdir;

fn small_network(seed: u64) -> ForecastNetwork {
    let arch = NetworkArchitecture {
        input_size: 2,
        recurrent_units: 5,
        dense_units: 4,
    };
    ForecastNetwork::new(&arch, &mut StdRng::seed_from_u64(seed))
}

fn probe_inputs() -> Array3<f64> {
    Array3::from_shape_fn((3, 3, 2), |(i, t, f)| 0.1 * (i as f64) + 0.2 * (t as f64) - 0.3 * (f as f64))
}

#[test]
fn test_metadata_for_new_network() {
    let network = small_network(1);
    let metadata = ModelMetadata::new("test_model", &network, 3);

    assert_eq!(metadata.model_name, "test_model");
    assert_eq!(metadata.sequence_length, 3);
    assert_eq!(metadata.architecture, network.architecture());
    assert_eq!(metadata.total_epochs, 0);
    assert_eq!(metadata.final_loss, None);

    let description = metadata.description.unwrap();
    assert!(description.contains("3 hourly"));
    assert!(description.contains(&format!("{} parameters", network.num_parameters())));
}

#[test]
fn test_record_training_accumulates_epochs() {
    let network = small_network(1);
    let mut metadata = ModelMetadata::new("test_model", &network, 3);
    metadata.record_training(3, 50, Some(0.4));
    metadata.record_training(2, 50, Some(0.2));

    assert_eq!(metadata.total_epochs, 100);
    assert_eq!(metadata.sequence_length, 2);
    assert_eq!(metadata.final_loss, Some(0.2));
}

#[test]
fn test_network_save_load_json() {
    let dir = tempdir().unwrap();
    let file_path = dir.path().join("test_model.json");

    let network = small_network(7);
    let before = network.predict(&probe_inputs()).unwrap();
    let metadata = ModelMetadata::new("test_json_model", &network, 3);

    network.save(&file_path, &metadata).unwrap();
    assert!(file_path.exists());

    let (loaded, loaded_metadata) = ForecastNetwork::load(&file_path).unwrap();
    let after = loaded.predict(&probe_inputs()).unwrap();

    assert_eq!(loaded_metadata, metadata);
    for (a, b) in before.iter().zip(after.iter()) {
        assert!((a - b).abs() < 1e-10);
    }
}

#[test]
fn test_network_save_load_binary() {
    let dir = tempdir().unwrap();
    let file_path = dir.path().join("model.bin");

    let network = small_network(11);
    let before = network.predict(&probe_inputs()).unwrap();
    network
        .save(&file_path, &ModelMetadata::new("test_binary_model", &network, 3))
        .unwrap();

    // Binary files are not JSON
    let bytes = std::fs::read(&file_path).unwrap();
    assert!(serde_json::from_slice::<serde_json::Value>(&bytes).is_err());

    let (loaded, metadata) = ForecastNetwork::load(&file_path).unwrap();
    let after = loaded.predict(&probe_inputs()).unwrap();

    assert_eq!(metadata.architecture, network.architecture());
    for (a, b) in before.iter().zip(after.iter()) {
        assert!((a - b).abs() < 1e-10);
    }
}

#[test]
fn test_corrupt_model_file() {
    let dir = tempdir().unwrap();
    let file_path = dir.path().join("model.bin");
    std::fs::write(&file_path, b"garbage bytes").unwrap();

    assert!(matches!(
        ForecastNetwork::load(&file_path),
        Err(PersistenceError::SerializationError(_))
    ));
}

#[test]
fn test_missing_model_file() {
    let dir = tempdir().unwrap();
    assert!(matches!(
        ForecastNetwork::load(dir.path().join("absent.bin")),
        Err(PersistenceError::IoError(_))
    ));
}

#[test]
fn test_scaler_sidecar_round_trip() {
    let dir = tempdir().unwrap();
    let model_path = dir.path().join("model.bin");
    let sidecar = ScalerParams::sidecar_path(&model_path);
    assert_eq!(sidecar, dir.path().join("model.scaler.json"));

    let params = ScalerParams {
        min_humidity: 38.5,
        max_humidity: 61.0,
        min_light: 120.0,
        max_light: 880.0,
    };
    params.save(&sidecar).unwrap();
    assert_eq!(ScalerParams::load(&sidecar).unwrap(), params);
}
