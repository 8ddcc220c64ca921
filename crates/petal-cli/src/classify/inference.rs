use anyhow::Result;
use std::path::Path;

use petal_classifiers::inference::{ArtifactRegistry, Prediction};
use petal_classifiers::PetalError;

use crate::util::validate_image_file;

use super::input::ClassifyCliConfig;

/// Load every usable bundle. Refuses to continue when none loads, since
/// nothing could be classified.
pub fn load_registry(config: &ClassifyCliConfig) -> Result<ArtifactRegistry> {
    let (registry, failures) = ArtifactRegistry::load(&config.models_dir, &config.descriptor_config)?;
    for failure in &failures {
        log::error!("[Petal::Classify] {}", failure);
    }
    if registry.is_empty() {
        return Err(PetalError::NoArtifacts(config.models_dir.clone()).into());
    }
    log::info!(
        "[Petal::Classify] Available models: {}",
        registry
            .available()
            .iter()
            .map(|k| k.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    );
    Ok(registry)
}

pub fn run_classify(config: &ClassifyCliConfig, image: &Path) -> Result<Prediction> {
    validate_image_file(image)?;
    let registry = load_registry(config)?;
    let descriptor = match config.descriptor {
        Some(kind) => kind,
        None => registry
            .default_descriptor()
            .ok_or_else(|| PetalError::NoArtifacts(config.models_dir.clone()))?,
    };
    let prediction = registry.classify_path(image, descriptor)?;
    println!("{}", format_prediction(&prediction, config.top_k));
    Ok(prediction)
}

pub fn format_prediction(prediction: &Prediction, top_k: usize) -> String {
    let mut out = format!(
        "Model: {} | Classes: {}\n{}",
        prediction.descriptor,
        prediction.n_classes(),
        prediction
    );
    if top_k > 1 {
        for (label, p) in prediction.probabilities.iter().take(top_k) {
            out.push_str(&format!("\n  {:<20} {:.3}", label, p));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use petal_classifiers::descriptors::DescriptorKind;

    #[test]
    fn prediction_lists_model_class_count_and_top_classes() {
        let prediction = Prediction {
            descriptor: DescriptorKind::Hog,
            label: "rose".to_string(),
            confidence: 0.7,
            probabilities: vec![
                ("rose".to_string(), 0.7),
                ("tulip".to_string(), 0.2),
                ("daisy".to_string(), 0.1),
            ],
        };
        let out = format_prediction(&prediction, 2);
        let mut lines = out.lines();
        assert_eq!(lines.next(), Some("Model: HOG | Classes: 3"));
        assert_eq!(lines.next(), Some("Prediction: rose"));
        assert!(out.contains("tulip"));
        assert!(!out.contains("daisy"));
    }
}
