use anyhow::{Context, Result};
use clap::ArgMatches;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;

use petal_classifiers::config::DescriptorConfig;
use petal_classifiers::descriptors::DescriptorKind;

use crate::load_or_default;
use crate::util::read_json_value;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ClassifyCliConfig {
    pub version: String,
    pub models_dir: PathBuf,
    /// Chosen from the loaded bundles when unset.
    pub descriptor: Option<DescriptorKind>,
    /// Number of classes listed under the prediction.
    pub top_k: usize,
    /// Must match the configuration the models were trained with.
    pub descriptor_config: DescriptorConfig,
}

impl Default for ClassifyCliConfig {
    fn default() -> Self {
        ClassifyCliConfig {
            version: clap::crate_version!().to_string(),
            models_dir: PathBuf::from("models"),
            descriptor: None,
            top_k: 3,
            descriptor_config: DescriptorConfig::default(),
        }
    }
}

impl ClassifyCliConfig {
    /// Accepts either its own JSON layout or a `training_config.json`
    /// written by `petal train`, whose `pipeline.descriptor` section is
    /// reused so both sides agree on the feature space.
    pub fn from_arguments(config_path: Option<&PathBuf>, matches: &ArgMatches) -> Result<Self> {
        let mut config = ClassifyCliConfig::default();

        if let Some(path) = config_path {
            let partial = read_json_value(path)?;
            load_or_default!(partial, config, models_dir);
            load_or_default!(partial, config, descriptor);
            load_or_default!(partial, config, top_k);
            load_or_default!(partial, config, descriptor_config);
            if let Some(descriptor) = partial.get("pipeline").and_then(|p| p.get("descriptor")) {
                config.descriptor_config = serde_json::from_value(descriptor.clone())
                    .with_context(|| format!("Invalid 'pipeline.descriptor' section in {:?}", path))?;
            }
        }

        // Apply CLI overrides
        if let Some(models_dir) = matches.get_one::<PathBuf>("models_dir") {
            config.models_dir = models_dir.clone();
        }
        if let Ok(Some(descriptor)) = matches.try_get_one::<String>("descriptor") {
            config.descriptor = Some(DescriptorKind::from_str(descriptor)?);
        }
        if let Ok(Some(top_k)) = matches.try_get_one::<usize>("top_k") {
            config.top_k = *top_k;
        }

        config.descriptor_config.validate()?;
        Ok(config)
    }
}
