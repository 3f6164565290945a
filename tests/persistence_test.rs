use ndarray::{arr2, Array3};
use rainfall_forecast::{
    persistence::{ModelMetadata, ModelPersistence, PersistenceError, PersistentArtifact, SavedModel, ScalerMetadata},
    LSTMForecaster, MinMaxScaler, Predictor, Scaler, ScalerArtifact, StandardScaler,
};
use tempfile::tempdir;

fn window() -> Array3<f64> {
    Array3::from_shape_vec((1, 5, 1), vec![0.1, 0.4, 0.35, 0.8, 0.55]).unwrap()
}

#[test]
fn test_model_metadata_creation() {
    let model = LSTMForecaster::new(1, 16, 2, 1);
    let metadata = ModelMetadata::for_model(&model, "KERALA", 5);

    assert_eq!(metadata.model_name, "KERALA");
    assert_eq!(metadata.version, env!("CARGO_PKG_VERSION"));
    assert_eq!(metadata.input_size, 1);
    assert_eq!(metadata.hidden_size, 16);
    assert_eq!(metadata.num_layers, 2);
    assert_eq!(metadata.window_length, 5);
    assert!(chrono::DateTime::parse_from_rfc3339(&metadata.created_at).is_ok());
}

#[test]
fn test_forecaster_save_load_json() {
    let dir = tempdir().unwrap();
    let file_path = dir.path().join("KERALA_lstm.json");

    let model = LSTMForecaster::new(1, 4, 2, 1);
    let output_before = model.predict(&window()).unwrap();

    let metadata = ModelMetadata {
        description: Some("Test JSON persistence".to_string()),
        ..ModelMetadata::for_model(&model, "KERALA", 5)
    };
    model.save(&file_path, metadata.clone()).unwrap();
    assert!(file_path.exists());

    let (loaded, loaded_metadata) = LSTMForecaster::load(&file_path).unwrap();
    assert_eq!(loaded_metadata, metadata);
    assert_eq!(loaded.input_size, 1);
    assert_eq!(loaded.hidden_size, 4);
    assert_eq!(loaded.num_layers, 2);

    let output_after = loaded.predict(&window()).unwrap();
    let diff = (&output_before - &output_after).mapv(|x| x.abs()).sum();
    assert!(diff < 1e-10, "Loaded model output differs from original");
}

#[test]
fn test_forecaster_save_load_binary() {
    let dir = tempdir().unwrap();
    let file_path = dir.path().join("PUNJAB_lstm.bin");

    let model = LSTMForecaster::new(1, 3, 1, 1);
    let output_before = model.predict(&window()).unwrap();

    model
        .save(&file_path, ModelMetadata::for_model(&model, "PUNJAB", 5))
        .unwrap();

    let (loaded, loaded_metadata) = LSTMForecaster::load(&file_path).unwrap();
    assert_eq!(loaded_metadata.model_name, "PUNJAB");

    // bincode keeps every bit of the weights
    assert_eq!(loaded.predict(&window()).unwrap(), output_before);
}

#[test]
fn test_scaler_save_load() {
    let dir = tempdir().unwrap();
    let values = arr2(&[[700.1], [650.3], [800.7]]);

    for (name, scaler) in [
        ("minmax_scaler.json", ScalerArtifact::from(MinMaxScaler::fit(&values, (0.0, 1.0)).unwrap())),
        ("standard_scaler.bin", ScalerArtifact::from(StandardScaler::fit(&values).unwrap())),
    ] {
        let path = dir.path().join(name);
        scaler.save(&path, ScalerMetadata::for_region("KERALA")).unwrap();

        let (loaded, metadata) = ScalerArtifact::load(&path).unwrap();
        assert_eq!(loaded, scaler);
        assert_eq!(metadata.region, "KERALA");
        assert_eq!(loaded.transform(&values).unwrap(), scaler.transform(&values).unwrap());
    }
}

#[test]
fn test_file_extension_detection() {
    let dir = tempdir().unwrap();
    let model = LSTMForecaster::new(1, 2, 1, 1);
    let metadata = ModelMetadata::for_model(&model, "extension_test", 5);

    let json_path = dir.path().join("model.json");
    model.save(&json_path, metadata.clone()).unwrap();
    let text = std::fs::read_to_string(&json_path).unwrap();
    assert!(text.contains("\"model_name\": \"extension_test\""));

    // anything that is not .json is binary
    let bin_path = dir.path().join("model.xyz");
    model.save(&bin_path, metadata).unwrap();
    let raw: SavedModel = ModelPersistence::load_from_binary(&bin_path).unwrap();
    assert_eq!(raw.metadata.model_name, "extension_test");
    assert!(ModelPersistence::load_from_json::<SavedModel, _>(&bin_path).is_err());
}

#[test]
fn test_error_handling() {
    let result = LSTMForecaster::load("/non/existent/path.json");
    assert!(matches!(result, Err(PersistenceError::IoError(_))));

    let model = LSTMForecaster::new(1, 1, 1, 1);
    let metadata = ModelMetadata::for_model(&model, "error_test", 5);
    let result = model.save("/invalid/path/that/does/not/exist.json", metadata);
    assert!(result.is_err());

    let dir = tempdir().unwrap();
    let garbage = dir.path().join("garbage.json");
    std::fs::write(&garbage, "{\"network\": 1}").unwrap();
    assert!(matches!(
        LSTMForecaster::load(&garbage),
        Err(PersistenceError::SerializationError(_))
    ));
}

#[test]
fn test_scaler_with_mismatched_parameters_is_rejected() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("KERALA_scaler.json");
    std::fs::write(
        &path,
        r#"{
            "scaler": {"min_max": {"feature_range": [0.0, 1.0], "data_min": [0.0], "data_max": []}},
            "metadata": {"region": "KERALA", "version": "1.0", "created_at": "2024-01-01T00:00:00Z", "description": null}
        }"#,
    )
    .unwrap();

    match ScalerArtifact::load(&path) {
        Err(PersistenceError::SerializationError(message)) => {
            assert!(message.contains("invalid scaler parameters"), "{}", message)
        }
        other => panic!("expected a serialization error, got {:?}", other.map(|(s, _)| s)),
    }
}
