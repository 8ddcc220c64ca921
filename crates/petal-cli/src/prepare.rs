use anyhow::{Context, Result};
use clap::ArgMatches;
use std::path::PathBuf;

use petal_classifiers::prepare::{prepare_dataset, PrepareConfig, PrepareSummary};

use crate::load_or_default;
use crate::util::{read_json_value, validate_directory};

pub fn config_from_arguments(config_path: Option<&PathBuf>, matches: &ArgMatches) -> Result<PrepareConfig> {
    let mut config = PrepareConfig::default();

    if let Some(path) = config_path {
        let partial = read_json_value(path)?;
        load_or_default!(partial, config, images_dir);
        load_or_default!(partial, config, labels_file);
        load_or_default!(partial, config, output_dir);
        load_or_default!(partial, config, num_classes);
        load_or_default!(partial, config, image_prefix);
        load_or_default!(partial, config, image_extension);
    }

    // Apply CLI overrides
    if let Some(images_dir) = matches.get_one::<PathBuf>("images_dir") {
        config.images_dir = images_dir.clone();
    }
    if let Some(labels_file) = matches.get_one::<PathBuf>("labels_file") {
        config.labels_file = labels_file.clone();
    }
    if let Some(output_dir) = matches.get_one::<PathBuf>("output_dir") {
        config.output_dir = output_dir.clone();
    }
    if let Some(num_classes) = matches.get_one::<usize>("num_classes") {
        config.num_classes = *num_classes;
    }

    validate_directory(&config.images_dir)?;
    Ok(config)
}

pub fn run_prepare(config: &PrepareConfig) -> Result<PrepareSummary> {
    log::info!(
        "[Petal::Prepare] {:?} + {:?} -> {:?}",
        config.images_dir,
        config.labels_file,
        config.output_dir
    );
    let summary = prepare_dataset(config)
        .with_context(|| format!("Failed to prepare dataset from {:?}", config.images_dir))?;
    println!(
        "Dataset reorganized by class in {}: {} images copied, {} missing, {} class directories",
        config.output_dir.display(),
        summary.copied,
        summary.missing,
        summary.classes_created
    );
    Ok(summary)
}
