mod common;

use ndarray::Array2;
use petal_classifiers::artifacts::{ArtifactBundle, ArtifactPaths};
use petal_classifiers::config::DescriptorConfig;
use petal_classifiers::data_handling::load_dataset;
use petal_classifiers::descriptors::{build_descriptor, DescriptorKind};
use petal_classifiers::preprocessing::transform_all;
use petal_classifiers::report::write_training_report;
use petal_classifiers::trainer::run_training;
use petal_classifiers::PetalError;

use common::{small_pipeline_config, write_uniform_dataset, BLUE, RED};

#[test]
fn two_uniform_classes_train_both_descriptors() {
    let dir = tempfile::tempdir().unwrap();
    let dataset = write_uniform_dataset(&dir.path().join("dataset"), &[("class_001", RED), ("class_002", BLUE)], 10);
    let models = dir.path().join("models");
    let config = small_pipeline_config();

    let outcomes = run_training(&dataset, &models, &config).unwrap();
    assert_eq!(outcomes.len(), 2);
    assert_eq!(outcomes[0].name, "hog");
    assert_eq!(outcomes[1].name, "lab");

    for outcome in &outcomes {
        assert_eq!(outcome.n_train + outcome.n_test, 20);
        assert_eq!(outcome.n_test, 4);
        assert!(!outcome.evaluation.report.classes.is_empty());
        assert!(!outcome.evaluation.report.to_string().is_empty());
        assert!(outcome.paths.all_exist());
        assert_eq!(outcome.paths, ArtifactPaths::new(&models, &outcome.name));
    }

    let mut files: Vec<String> = std::fs::read_dir(&models)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    files.sort();
    assert_eq!(
        files,
        vec![
            "hog_encoder.bin",
            "hog_scaler.bin",
            "lab_encoder.bin",
            "lab_scaler.bin",
            "svm_hog_model.bin",
            "svm_lab_model.bin",
        ]
    );

    // colour alone separates the classes
    assert!(outcomes[1].evaluation.accuracy > 0.99);

    let report = write_training_report(&outcomes[1], &config, &models).unwrap();
    let html = std::fs::read_to_string(report).unwrap();
    assert!(html.contains("LAB"));
    assert!(html.contains("class_002"));
}

#[test]
fn persisted_bundle_predicts_identically() {
    let dir = tempfile::tempdir().unwrap();
    let dataset = write_uniform_dataset(&dir.path().join("dataset"), &[("rose", RED), ("bluebell", BLUE)], 8);
    let models = dir.path().join("models");
    let mut config = small_pipeline_config();
    config.descriptors = vec![DescriptorKind::Lab];

    let outcome = run_training(&dataset, &models, &config).unwrap().remove(0);
    let descriptor = build_descriptor(DescriptorKind::Lab, &config.descriptor).unwrap();
    let reloaded = ArtifactBundle::load(&models, "lab", &descriptor.signature()).unwrap();

    assert_eq!(reloaded.encoder, outcome.bundle.encoder);
    assert_eq!(reloaded.scaler, outcome.bundle.scaler);

    let data = load_dataset(&dataset, config.descriptor.image_size).unwrap();
    let features: Array2<f64> = descriptor.extract_batch(&data.images).unwrap();
    let scaled = transform_all(&features, &reloaded.scaler).unwrap();
    assert_eq!(
        reloaded.model.predict(&scaled).unwrap(),
        outcome.bundle.model.predict(&scaled).unwrap()
    );
    assert_eq!(
        reloaded.model.predict_proba(&scaled).unwrap(),
        outcome.bundle.model.predict_proba(&scaled).unwrap()
    );
}

#[test]
fn bundle_from_other_configuration_is_incompatible() {
    let dir = tempfile::tempdir().unwrap();
    let dataset = write_uniform_dataset(&dir.path().join("dataset"), &[("rose", RED), ("bluebell", BLUE)], 6);
    let models = dir.path().join("models");
    let mut config = small_pipeline_config();
    config.descriptors = vec![DescriptorKind::Lab];
    run_training(&dataset, &models, &config).unwrap();

    let other = DescriptorConfig {
        image_size: (64, 64),
        ..DescriptorConfig::default()
    };
    let signature = build_descriptor(DescriptorKind::Lab, &other).unwrap().signature();
    let err = ArtifactBundle::load(&models, "lab", &signature).unwrap_err();
    assert!(matches!(err, PetalError::IncompatibleArtifact { .. }));
}

#[test]
fn single_class_dataset_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let dataset = write_uniform_dataset(&dir.path().join("dataset"), &[("rose", RED)], 5);
    let models = dir.path().join("models");

    let err = run_training(&dataset, &models, &small_pipeline_config()).unwrap_err();
    assert!(matches!(err, PetalError::TooFewClasses(1)));
    assert!(!models.exists());
}
