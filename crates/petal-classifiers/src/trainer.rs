//! Fitting one artifact bundle per descriptor and evaluating it on a
//! held-out split.
use std::path::{Path, PathBuf};
use std::time::Instant;

use ndarray::{Array2, Axis};

use crate::artifacts::{ArtifactBundle, ArtifactPaths};
use crate::config::{PipelineConfig, TrainConfig};
use crate::data_handling::{load_dataset, train_test_split, LabeledImages};
use crate::descriptors::{build_descriptor, DescriptorSignature};
use crate::error::{PetalError, Result};
use crate::models::SVMClassifier;
use crate::preprocessing::{fit_transform, LabelEncoder};
use crate::stats::{evaluate, Evaluation};

/// Result of training one descriptor.
#[derive(Debug, Clone)]
pub struct TrainingOutcome {
    pub name: String,
    pub bundle: ArtifactBundle,
    pub evaluation: Evaluation,
    pub paths: ArtifactPaths,
    pub n_train: usize,
    pub n_test: usize,
}

/// Everything `fit_bundle` produces before anything touches the disk.
#[derive(Debug, Clone)]
pub struct FittedBundle {
    pub bundle: ArtifactBundle,
    pub evaluation: Evaluation,
    pub n_train: usize,
    pub n_test: usize,
}

/// Encode labels, standardise features, split, fit the SVM on the training
/// partition and evaluate it on the test partition.
pub fn fit_bundle<S: AsRef<str>>(
    features: &Array2<f64>,
    labels: &[S],
    signature: DescriptorSignature,
    config: &TrainConfig,
) -> Result<FittedBundle> {
    config.validate()?;
    if features.nrows() != labels.len() {
        return Err(PetalError::ShapeMismatch {
            what: "labels per feature row",
            expected: features.nrows(),
            found: labels.len(),
        });
    }
    if features.nrows() == 0 {
        return Err(PetalError::InsufficientSamples("no samples to train on".to_string()));
    }
    if features.ncols() != signature.feature_len {
        return Err(PetalError::ShapeMismatch {
            what: "feature width",
            expected: signature.feature_len,
            found: features.ncols(),
        });
    }

    let encoder = LabelEncoder::fit(labels);
    if encoder.n_classes() < 2 {
        return Err(PetalError::TooFewClasses(encoder.n_classes()));
    }
    let y = encoder.transform(labels)?;
    let (scaler, scaled) = fit_transform(features)?;

    let (train_idx, test_idx) = train_test_split(y.len(), config.split.test_ratio, config.split.seed)?;
    let x_train = scaled.select(Axis(0), &train_idx);
    let x_test = scaled.select(Axis(0), &test_idx);
    let y_train: Vec<usize> = train_idx.iter().map(|&i| y[i]).collect();
    let y_test: Vec<usize> = test_idx.iter().map(|&i| y[i]).collect();

    let mut seen = vec![false; encoder.n_classes()];
    for &c in &y_train {
        seen[c] = true;
    }
    let absent: Vec<&str> = seen
        .iter()
        .enumerate()
        .filter(|(_, &s)| !s)
        .map(|(c, _)| encoder.classes()[c].as_str())
        .collect();
    if !absent.is_empty() {
        return Err(PetalError::InsufficientSamples(format!(
            "classes missing from the training partition: {}",
            absent.join(", ")
        )));
    }

    log::info!(
        "Training SVM on {} samples ({} held out, {} classes, {} features)",
        y_train.len(),
        y_test.len(),
        encoder.n_classes(),
        features.ncols()
    );
    let mut model = SVMClassifier::new(config.model.clone());
    model.fit(&x_train, &y_train, encoder.n_classes())?;

    let y_pred = model.predict(&x_test)?;
    let evaluation = evaluate(&y_test, &y_pred, encoder.classes())?;

    Ok(FittedBundle {
        bundle: ArtifactBundle {
            signature,
            model,
            encoder,
            scaler,
        },
        evaluation,
        n_train: y_train.len(),
        n_test: y_test.len(),
    })
}

/// Fit, evaluate and persist the bundle for one descriptor as
/// `<models_dir>/svm_<name>_model.bin` and friends. Nothing is written when
/// any step before saving fails.
pub fn train_descriptor<S: AsRef<str>, P: AsRef<Path>>(
    features: &Array2<f64>,
    labels: &[S],
    signature: DescriptorSignature,
    name: &str,
    config: &TrainConfig,
    models_dir: P,
) -> Result<TrainingOutcome> {
    let fitted = fit_bundle(features, labels, signature, config)?;

    log::info!(
        "[{}] accuracy on {} held-out samples: {:.4}",
        name,
        fitted.n_test,
        fitted.evaluation.accuracy
    );
    log::info!("[{}] classification report:\n{}", name, fitted.evaluation.report);
    log::debug!("[{}] confusion matrix:\n{}", name, fitted.evaluation.confusion);

    let paths = fitted.bundle.save(models_dir, name)?;
    log::info!("[{}] model saved to {}", name, paths.model.display());

    Ok(TrainingOutcome {
        name: name.to_string(),
        bundle: fitted.bundle,
        evaluation: fitted.evaluation,
        paths,
        n_train: fitted.n_train,
        n_test: fitted.n_test,
    })
}

/// Load the dataset once and train every configured descriptor in order.
/// The first failure aborts the run.
pub fn run_training<P: AsRef<Path>, Q: AsRef<Path>>(
    dataset_dir: P,
    models_dir: Q,
    config: &PipelineConfig,
) -> Result<Vec<TrainingOutcome>> {
    config.validate()?;
    let dataset_dir = dataset_dir.as_ref();
    let models_dir: PathBuf = models_dir.as_ref().to_path_buf();

    let start = Instant::now();
    let dataset = load_dataset(dataset_dir, config.descriptor.image_size)?;
    log_dataset(&dataset, dataset_dir);
    log::info!("Dataset loaded in {:.2}s", start.elapsed().as_secs_f32());

    let mut outcomes = Vec::with_capacity(config.descriptors.len());
    for &kind in &config.descriptors {
        let descriptor = build_descriptor(kind, &config.descriptor)?;
        log::info!("Extracting {} features from {} images", kind, dataset.len());
        let start = Instant::now();
        let features = descriptor.extract_batch(&dataset.images)?;
        log::info!(
            "{} features extracted in {:.2}s, dimension {}",
            kind,
            start.elapsed().as_secs_f32(),
            features.ncols()
        );

        let outcome = train_descriptor(
            &features,
            &dataset.labels,
            descriptor.signature(),
            kind.name(),
            &config.train,
            &models_dir,
        )?;
        outcomes.push(outcome);
    }
    Ok(outcomes)
}

fn log_dataset(dataset: &LabeledImages, root: &Path) {
    let counts = dataset.class_counts();
    log::info!(
        "Loaded {} images from {} classes under {}",
        dataset.len(),
        counts.len(),
        root.display()
    );
    for (label, count) in &counts {
        log::debug!("  {}: {}", label, count);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LabConfig;
    use crate::descriptors::{DescriptorKind, DescriptorParams};
    use ndarray::Array2;

    fn signature(width: usize) -> DescriptorSignature {
        DescriptorSignature {
            kind: DescriptorKind::Lab,
            image_size: (8, 8),
            params: DescriptorParams::Lab(LabConfig::default()),
            feature_len: width,
        }
    }

    fn two_clusters(per_class: usize) -> (Array2<f64>, Vec<String>) {
        let mut rows = Vec::new();
        let mut labels = Vec::new();
        for i in 0..per_class {
            let jitter = i as f64 * 0.05;
            rows.extend_from_slice(&[jitter, 1.0 - jitter]);
            labels.push("daisy".to_string());
            rows.extend_from_slice(&[10.0 + jitter, -3.0 + jitter]);
            labels.push("rose".to_string());
        }
        let x = Array2::from_shape_vec((2 * per_class, 2), rows).unwrap();
        (x, labels)
    }

    #[test]
    fn fit_bundle_learns_separable_clusters() {
        let (x, labels) = two_clusters(10);
        let fitted = fit_bundle(&x, &labels, signature(2), &TrainConfig::default()).unwrap();
        assert_eq!(fitted.n_test, 4);
        assert_eq!(fitted.n_train, 16);
        assert_eq!(fitted.bundle.encoder.classes(), &["daisy", "rose"]);
        assert!(fitted.evaluation.accuracy > 0.99);
    }

    #[test]
    fn single_class_is_rejected() {
        let x = Array2::zeros((4, 2));
        let labels = vec!["daisy"; 4];
        let err = fit_bundle(&x, &labels, signature(2), &TrainConfig::default()).unwrap_err();
        assert!(matches!(err, PetalError::TooFewClasses(1)));
    }

    #[test]
    fn mismatched_rows_and_labels_are_rejected() {
        let x = Array2::zeros((3, 2));
        let err = fit_bundle(&x, &["a", "b"], signature(2), &TrainConfig::default()).unwrap_err();
        assert!(matches!(err, PetalError::ShapeMismatch { .. }));
    }

    #[test]
    fn nothing_is_written_on_failure() {
        let dir = tempfile::tempdir().unwrap();
        let models = dir.path().join("models");
        let x = Array2::zeros((4, 2));
        let labels = vec!["daisy"; 4];
        assert!(train_descriptor(&x, &labels, signature(2), "lab", &TrainConfig::default(), &models).is_err());
        assert!(!models.exists());
    }
}
