//! On-disk layout of a trained descriptor bundle.
//!
//! Every bundle is three bincode files in the models directory:
//! `svm_<name>_model.bin`, `<name>_encoder.bin` and `<name>_scaler.bin`.
//! Each file starts with a format version; the model file also records the
//! descriptor signature the classifier was trained on.
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::descriptors::DescriptorSignature;
use crate::error::{PetalError, Result};
use crate::models::SVMClassifier;
use crate::preprocessing::{LabelEncoder, Scaler};

pub const ARTIFACT_FORMAT_VERSION: u32 = 1;

/// File locations of one bundle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub model: PathBuf,
    pub encoder: PathBuf,
    pub scaler: PathBuf,
}

impl ArtifactPaths {
    pub fn new<P: AsRef<Path>>(dir: P, name: &str) -> Self {
        let dir = dir.as_ref();
        Self {
            model: dir.join(format!("svm_{}_model.bin", name)),
            encoder: dir.join(format!("{}_encoder.bin", name)),
            scaler: dir.join(format!("{}_scaler.bin", name)),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &PathBuf> {
        [&self.model, &self.encoder, &self.scaler].into_iter()
    }

    pub fn all_exist(&self) -> bool {
        self.iter().all(|p| p.is_file())
    }

    pub fn missing(&self) -> Vec<&PathBuf> {
        self.iter().filter(|p| !p.is_file()).collect()
    }
}

#[derive(Serialize, Deserialize)]
struct ModelArtifact {
    format_version: u32,
    signature: DescriptorSignature,
    model: SVMClassifier,
}

#[derive(Serialize, Deserialize)]
struct EncoderArtifact {
    format_version: u32,
    encoder: LabelEncoder,
}

#[derive(Serialize, Deserialize)]
struct ScalerArtifact {
    format_version: u32,
    scaler: Scaler,
}

/// A fitted classifier together with the transforms it expects its input to
/// have gone through.
#[derive(Debug, Clone)]
pub struct ArtifactBundle {
    pub signature: DescriptorSignature,
    pub model: SVMClassifier,
    pub encoder: LabelEncoder,
    pub scaler: Scaler,
}

impl ArtifactBundle {
    /// Write the three files, creating `dir` if needed.
    pub fn save<P: AsRef<Path>>(&self, dir: P, name: &str) -> Result<ArtifactPaths> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir).map_err(|e| PetalError::io(dir, e))?;
        let paths = ArtifactPaths::new(dir, name);

        write_bincode(
            &paths.model,
            &ModelArtifact {
                format_version: ARTIFACT_FORMAT_VERSION,
                signature: self.signature.clone(),
                model: self.model.clone(),
            },
        )?;
        write_bincode(
            &paths.encoder,
            &EncoderArtifact {
                format_version: ARTIFACT_FORMAT_VERSION,
                encoder: self.encoder.clone(),
            },
        )?;
        write_bincode(
            &paths.scaler,
            &ScalerArtifact {
                format_version: ARTIFACT_FORMAT_VERSION,
                scaler: self.scaler.clone(),
            },
        )?;
        log::debug!("Saved artifacts for '{}' to {}", name, dir.display());
        Ok(paths)
    }

    /// Read a bundle back and check that it was produced for `expected`.
    pub fn load<P: AsRef<Path>>(dir: P, name: &str, expected: &DescriptorSignature) -> Result<Self> {
        let paths = ArtifactPaths::new(dir, name);

        let model: ModelArtifact = read_bincode(&paths.model)?;
        check_version(&paths.model, model.format_version)?;
        if &model.signature != expected {
            return Err(PetalError::IncompatibleArtifact {
                path: paths.model.clone(),
                reason: format!(
                    "trained with {:?}, current configuration expects {:?}",
                    model.signature, expected
                ),
            });
        }

        let encoder: EncoderArtifact = read_bincode(&paths.encoder)?;
        check_version(&paths.encoder, encoder.format_version)?;
        let scaler: ScalerArtifact = read_bincode(&paths.scaler)?;
        check_version(&paths.scaler, scaler.format_version)?;

        let bundle = ArtifactBundle {
            signature: model.signature,
            model: model.model,
            encoder: encoder.encoder,
            scaler: scaler.scaler,
        };
        bundle.check_consistency(&paths)?;
        Ok(bundle)
    }

    fn check_consistency(&self, paths: &ArtifactPaths) -> Result<()> {
        let width = self.signature.feature_len;
        if self.scaler.n_features() != width || self.scaler.std.len() != width {
            return Err(PetalError::IncompatibleArtifact {
                path: paths.scaler.clone(),
                reason: format!(
                    "scaler covers {} features, descriptor produces {}",
                    self.scaler.n_features(),
                    width
                ),
            });
        }
        if !self.model.is_fitted() || self.model.n_features() != width {
            return Err(PetalError::IncompatibleArtifact {
                path: paths.model.clone(),
                reason: format!(
                    "classifier expects {} features, descriptor produces {}",
                    self.model.n_features(),
                    width
                ),
            });
        }
        if self.model.n_classes() != self.encoder.n_classes() {
            return Err(PetalError::IncompatibleArtifact {
                path: paths.encoder.clone(),
                reason: format!(
                    "encoder knows {} classes, classifier has {}",
                    self.encoder.n_classes(),
                    self.model.n_classes()
                ),
            });
        }
        Ok(())
    }
}

fn check_version(path: &Path, found: u32) -> Result<()> {
    if found != ARTIFACT_FORMAT_VERSION {
        return Err(PetalError::IncompatibleArtifact {
            path: path.to_path_buf(),
            reason: format!(
                "format version {} (supported: {})",
                found, ARTIFACT_FORMAT_VERSION
            ),
        });
    }
    Ok(())
}

fn write_bincode<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let file = File::create(path).map_err(|e| PetalError::io(path, e))?;
    let mut writer = BufWriter::new(file);
    bincode::serialize_into(&mut writer, value).map_err(|source| PetalError::Serialization {
        path: path.to_path_buf(),
        source,
    })?;
    writer.flush().map_err(|e| PetalError::io(path, e))
}

fn read_bincode<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let file = File::open(path).map_err(|e| PetalError::io(path, e))?;
    bincode::deserialize_from(BufReader::new(file)).map_err(|source| PetalError::Serialization {
        path: path.to_path_buf(),
        source,
    })
}
