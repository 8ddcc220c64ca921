//! Best-effort loading of trained bundles and single-image classification.
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use image::RgbImage;
use ndarray::Array2;
use serde::Serialize;

use crate::artifacts::{ArtifactBundle, ArtifactPaths};
use crate::config::DescriptorConfig;
use crate::data_handling::load_image;
use crate::descriptors::{build_descriptor, DescriptorKind, FeatureDescriptor};
use crate::error::{PetalError, Result};
use crate::models::svm::argmax;
use crate::preprocessing::transform_all;

/// Outcome of classifying one image.
#[derive(Debug, Clone, Serialize)]
pub struct Prediction {
    pub descriptor: DescriptorKind,
    pub label: String,
    pub confidence: f64,
    /// Every class with its probability, most probable first.
    pub probabilities: Vec<(String, f64)>,
}

impl Prediction {
    pub fn n_classes(&self) -> usize {
        self.probabilities.len()
    }
}

impl fmt::Display for Prediction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "Prediction: {}", self.label)?;
        write!(
            f,
            "Confidence: {:.3} ({:.1}%)",
            self.confidence,
            self.confidence * 100.0
        )
    }
}

/// A bundle that exists on disk but could not be used.
#[derive(Debug)]
pub struct ArtifactLoadFailure {
    pub descriptor: DescriptorKind,
    pub error: PetalError,
}

impl fmt::Display for ArtifactLoadFailure {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} model could not be loaded: {}", self.descriptor, self.error)
    }
}

struct LoadedDescriptor {
    descriptor: Box<dyn FeatureDescriptor>,
    bundle: ArtifactBundle,
}

/// Descriptors with a usable bundle, keyed by kind.
pub struct ArtifactRegistry {
    models_dir: PathBuf,
    image_size: (u32, u32),
    entries: BTreeMap<DescriptorKind, LoadedDescriptor>,
}

impl fmt::Debug for ArtifactRegistry {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("ArtifactRegistry")
            .field("models_dir", &self.models_dir)
            .field("available", &self.available())
            .finish()
    }
}

impl ArtifactRegistry {
    /// Try every known descriptor. Bundles with missing files are skipped
    /// with a warning and bundles that fail to load are returned as
    /// failures; neither stops the others from loading.
    pub fn load<P: AsRef<Path>>(
        models_dir: P,
        config: &DescriptorConfig,
    ) -> Result<(Self, Vec<ArtifactLoadFailure>)> {
        let models_dir = models_dir.as_ref();
        if !models_dir.is_dir() {
            return Err(PetalError::ModelsDirMissing(models_dir.to_path_buf()));
        }

        let mut entries = BTreeMap::new();
        let mut failures = Vec::new();
        for kind in DescriptorKind::ALL {
            let paths = ArtifactPaths::new(models_dir, kind.name());
            let missing = paths.missing();
            if !missing.is_empty() {
                log::warn!(
                    "{} model skipped, missing: {}",
                    kind,
                    missing
                        .iter()
                        .map(|p| p.display().to_string())
                        .collect::<Vec<_>>()
                        .join(", ")
                );
                continue;
            }

            let loaded = build_descriptor(kind, config).and_then(|descriptor| {
                let bundle = ArtifactBundle::load(models_dir, kind.name(), &descriptor.signature())?;
                Ok(LoadedDescriptor { descriptor, bundle })
            });
            match loaded {
                Ok(entry) => {
                    log::info!(
                        "{} model loaded ({} classes)",
                        kind,
                        entry.bundle.encoder.n_classes()
                    );
                    entries.insert(kind, entry);
                }
                Err(error) => {
                    let failure = ArtifactLoadFailure { descriptor: kind, error };
                    log::warn!("{}", failure);
                    failures.push(failure);
                }
            }
        }

        Ok((
            Self {
                models_dir: models_dir.to_path_buf(),
                image_size: config.image_size,
                entries,
            },
            failures,
        ))
    }

    pub fn models_dir(&self) -> &Path {
        &self.models_dir
    }

    pub fn image_size(&self) -> (u32, u32) {
        self.image_size
    }

    pub fn available(&self) -> Vec<DescriptorKind> {
        self.entries.keys().copied().collect()
    }

    pub fn is_available(&self, kind: DescriptorKind) -> bool {
        self.entries.contains_key(&kind)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// LAB when it loaded, otherwise the first available descriptor.
    pub fn default_descriptor(&self) -> Option<DescriptorKind> {
        if self.is_available(DescriptorKind::Lab) {
            Some(DescriptorKind::Lab)
        } else {
            self.entries.keys().next().copied()
        }
    }

    pub fn get(&self, kind: DescriptorKind) -> Result<&ArtifactBundle> {
        self.entry(kind).map(|e| &e.bundle)
    }

    fn entry(&self, kind: DescriptorKind) -> Result<&LoadedDescriptor> {
        self.entries
            .get(&kind)
            .ok_or(PetalError::DescriptorUnavailable(kind))
    }

    /// Extract, standardise and classify `image` with the bundle of `kind`.
    pub fn classify(&self, image: &RgbImage, kind: DescriptorKind) -> Result<Prediction> {
        let entry = self.entry(kind)?;
        let features = entry.descriptor.extract(image)?;
        let row = Array2::from_shape_vec((1, features.len()), features)
            .map_err(|e| PetalError::Descriptor(e.to_string()))?;
        let scaled = transform_all(&row, &entry.bundle.scaler)?;
        let proba = entry.bundle.model.predict_proba(&scaled)?;
        let proba = proba.row(0);

        let best = argmax(proba.iter());
        let encoder = &entry.bundle.encoder;
        let mut probabilities = proba
            .iter()
            .enumerate()
            .map(|(code, &p)| Ok((encoder.decode(code)?.to_string(), p)))
            .collect::<Result<Vec<_>>>()?;
        probabilities.sort_by(|a, b| b.1.total_cmp(&a.1));

        let prediction = Prediction {
            descriptor: kind,
            label: encoder.decode(best)?.to_string(),
            confidence: proba[best],
            probabilities,
        };
        log::debug!(
            "{} prediction: {} ({:.3})",
            kind,
            prediction.label,
            prediction.confidence
        );
        Ok(prediction)
    }

    /// Load `path` (common raster formats only) and classify it.
    pub fn classify_path<P: AsRef<Path>>(&self, path: P, kind: DescriptorKind) -> Result<Prediction> {
        self.entry(kind)?;
        let image = load_image(path, self.image_size)?;
        self.classify(&image, kind)
    }
}
