//! Interactive classification session: pick a descriptor, load an image,
//! classify it.
//!
//! A failed operation leaves the session in the state it was in before the
//! call; the error is kept for display until the next successful operation.
use std::path::{Path, PathBuf};

use image::RgbImage;

use crate::data_handling::load_image;
use crate::descriptors::DescriptorKind;
use crate::error::{PetalError, Result};
use crate::inference::{ArtifactRegistry, Prediction};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    ImageLoaded,
    Classified,
}

#[derive(Debug)]
pub struct ClassifierSession {
    registry: ArtifactRegistry,
    descriptor: DescriptorKind,
    image: Option<(PathBuf, RgbImage)>,
    prediction: Option<Prediction>,
    last_error: Option<String>,
}

impl ClassifierSession {
    /// Start a session over `registry`. Fails when no bundle is loaded, as
    /// there would be nothing to classify with.
    pub fn new(registry: ArtifactRegistry) -> Result<Self> {
        let Some(descriptor) = registry.default_descriptor() else {
            return Err(PetalError::NoArtifacts(registry.models_dir().to_path_buf()));
        };
        Ok(Self {
            registry,
            descriptor,
            image: None,
            prediction: None,
            last_error: None,
        })
    }

    pub fn state(&self) -> SessionState {
        match (&self.image, &self.prediction) {
            (None, _) => SessionState::Idle,
            (Some(_), None) => SessionState::ImageLoaded,
            (Some(_), Some(_)) => SessionState::Classified,
        }
    }

    pub fn registry(&self) -> &ArtifactRegistry {
        &self.registry
    }

    pub fn descriptor(&self) -> DescriptorKind {
        self.descriptor
    }

    pub fn image_path(&self) -> Option<&Path> {
        self.image.as_ref().map(|(p, _)| p.as_path())
    }

    pub fn prediction(&self) -> Option<&Prediction> {
        self.prediction.as_ref()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    fn record<T>(&mut self, result: Result<T>) -> Result<T> {
        match &result {
            Ok(_) => self.last_error = None,
            Err(e) => {
                log::warn!("{}", e);
                self.last_error = Some(e.to_string());
            }
        }
        result
    }

    /// Switch descriptor. A previous prediction is dropped since it was made
    /// with the old one; the loaded image is kept.
    pub fn select_descriptor(&mut self, kind: DescriptorKind) -> Result<()> {
        let result = if self.registry.is_available(kind) {
            Ok(())
        } else {
            Err(PetalError::DescriptorUnavailable(kind))
        };
        self.record(result)?;
        if self.descriptor != kind {
            self.descriptor = kind;
            self.prediction = None;
        }
        Ok(())
    }

    pub fn open_image<P: AsRef<Path>>(&mut self, path: P) -> Result<SessionState> {
        let path = path.as_ref();
        let loaded = load_image(path, self.registry.image_size());
        let image = self.record(loaded)?;
        log::info!("Image loaded: {}", path.display());
        self.image = Some((path.to_path_buf(), image));
        self.prediction = None;
        Ok(self.state())
    }

    pub fn classify(&mut self) -> Result<&Prediction> {
        let result = match &self.image {
            Some((_, image)) => self.registry.classify(image, self.descriptor),
            None => Err(PetalError::NoImageLoaded),
        };
        let prediction = self.record(result)?;
        Ok(self.prediction.insert(prediction))
    }

    pub fn open_and_classify<P: AsRef<Path>>(&mut self, path: P) -> Result<&Prediction> {
        self.open_image(path)?;
        self.classify()
    }
}
