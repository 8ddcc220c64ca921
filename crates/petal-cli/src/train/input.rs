use anyhow::{Context, Result};
use clap::ArgMatches;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;

use petal_classifiers::config::{Kernel, PipelineConfig};
use petal_classifiers::descriptors::DescriptorKind;

use crate::load_or_default;
use crate::util::{read_json_value, validate_directory};

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct TrainCliConfig {
    pub version: String,
    pub dataset_dir: PathBuf,
    pub models_dir: PathBuf,
    /// Write `<name>_report.html` per descriptor next to the models.
    pub write_report: bool,
    pub pipeline: PipelineConfig,
}

impl Default for TrainCliConfig {
    fn default() -> Self {
        TrainCliConfig {
            version: clap::crate_version!().to_string(),
            dataset_dir: PathBuf::from("data/dataset"),
            models_dir: PathBuf::from("models"),
            write_report: true,
            pipeline: PipelineConfig::default(),
        }
    }
}

impl TrainCliConfig {
    pub fn from_arguments(config_path: Option<&PathBuf>, matches: &ArgMatches) -> Result<Self> {
        let mut config = TrainCliConfig::default();

        if let Some(path) = config_path {
            let partial = read_json_value(path)?;
            load_or_default!(partial, config, dataset_dir);
            load_or_default!(partial, config, models_dir);
            load_or_default!(partial, config, write_report);
            if let Some(pipeline) = partial.get("pipeline") {
                config.pipeline = serde_json::from_value(pipeline.clone())
                    .with_context(|| format!("Invalid 'pipeline' section in {:?}", path))?;
            }
        }

        // Apply CLI overrides
        if let Some(dataset_dir) = matches.get_one::<PathBuf>("dataset_dir") {
            config.dataset_dir = dataset_dir.clone();
        }
        if let Some(models_dir) = matches.get_one::<PathBuf>("models_dir") {
            config.models_dir = models_dir.clone();
        }
        if let Some(names) = matches.get_many::<String>("descriptor") {
            config.pipeline.descriptors = names
                .map(|n| DescriptorKind::from_str(n))
                .collect::<Result<Vec<_>, _>>()?;
        }
        if let Some(kernel) = matches.get_one::<String>("kernel") {
            config.pipeline.train.model.kernel = Kernel::from_str(kernel).map_err(anyhow::Error::msg)?;
        }
        if let Some(seed) = matches.get_one::<u64>("seed") {
            config.pipeline.train.split.seed = *seed;
        }
        if let Some(ratio) = matches.get_one::<f64>("test_ratio") {
            config.pipeline.train.split.test_ratio = *ratio;
        }
        if matches.get_flag("no_report") {
            config.write_report = false;
        }

        validate_directory(&config.dataset_dir)
            .context("The dataset directory must hold one subdirectory per class")?;
        config.pipeline.validate()?;
        Ok(config)
    }
}
