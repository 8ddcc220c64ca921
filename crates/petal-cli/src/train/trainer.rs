use anyhow::{Context, Result};

use petal_classifiers::report::write_training_report;
use petal_classifiers::trainer::{run_training as train_pipeline, TrainingOutcome};

use crate::util::write_bytes_to_file;

use super::input::TrainCliConfig;

pub fn run_training(config: &TrainCliConfig) -> Result<Vec<TrainingOutcome>> {
    log::info!(
        "[Petal::Train] Dataset: {:?}, models: {:?}, descriptors: {:?}",
        config.dataset_dir,
        config.models_dir,
        config.pipeline.descriptors
    );

    let outcomes = train_pipeline(&config.dataset_dir, &config.models_dir, &config.pipeline)
        .with_context(|| format!("Training on {:?} failed", config.dataset_dir))?;

    for outcome in &outcomes {
        println!(
            "{}: accuracy {:.4} on {} held-out images ({} classes) -> {}",
            outcome.bundle.signature.kind,
            outcome.evaluation.accuracy,
            outcome.n_test,
            outcome.bundle.encoder.n_classes(),
            outcome.paths.model.display()
        );
        if config.write_report {
            let path = write_training_report(outcome, config, &config.models_dir)?;
            log::info!("[Petal::Train] Report written to {}", path.display());
        }
    }

    // Save configuration to JSON file
    let path = config.models_dir.join("training_config.json");
    let bytes = serde_json::to_vec_pretty(config)?;
    write_bytes_to_file(&path, &bytes)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    log::info!("[Petal::Train] Configuration saved to {}", path.display());

    Ok(outcomes)
}
