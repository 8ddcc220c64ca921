use std::error::Error;
use std::fmt;
use std::io;
use std::path::PathBuf;

use crate::descriptors::DescriptorKind;

/// Errors raised while loading images, extracting features, training or
/// classifying.
#[derive(Debug)]
pub enum PetalError {
    Io { path: PathBuf, source: io::Error },
    ImageDecode { path: PathBuf, source: image::ImageError },
    UnsupportedImageFormat(PathBuf),
    EmptyDataset(PathBuf),
    ShapeMismatch {
        what: &'static str,
        expected: usize,
        found: usize,
    },
    TooFewClasses(usize),
    InsufficientSamples(String),
    UnknownLabel(String),
    UnknownClassCode(usize),
    UnknownDescriptor(String),
    DescriptorUnavailable(DescriptorKind),
    ModelsDirMissing(PathBuf),
    NoArtifacts(PathBuf),
    IncompatibleArtifact { path: PathBuf, reason: String },
    Serialization { path: PathBuf, source: bincode::Error },
    NotFitted,
    NoImageLoaded,
    Svm(String),
    Descriptor(String),
    InvalidConfig(String),
    LabelIndex { path: PathBuf, reason: String },
}

pub type Result<T> = std::result::Result<T, PetalError>;

impl PetalError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        PetalError::Io {
            path: path.into(),
            source,
        }
    }
}

impl fmt::Display for PetalError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            PetalError::Io { path, source } => write!(f, "I/O error on {}: {}", path.display(), source),
            PetalError::ImageDecode { path, source } => {
                write!(f, "Image could not be loaded from {}: {}", path.display(), source)
            }
            PetalError::UnsupportedImageFormat(path) => write!(
                f,
                "Unsupported image file {} (expected one of: jpg, jpeg, png, bmp, tif, tiff)",
                path.display()
            ),
            PetalError::EmptyDataset(path) => {
                write!(f, "No decodable images found under {}", path.display())
            }
            PetalError::ShapeMismatch { what, expected, found } => {
                write!(f, "Shape mismatch in {}: expected {}, found {}", what, expected, found)
            }
            PetalError::TooFewClasses(n) => {
                write!(f, "At least two distinct classes are required, found {}", n)
            }
            PetalError::InsufficientSamples(msg) => write!(f, "Insufficient samples: {}", msg),
            PetalError::UnknownLabel(label) => write!(f, "Label '{}' was not seen at fit time", label),
            PetalError::UnknownClassCode(code) => write!(f, "Class code {} is out of range", code),
            PetalError::UnknownDescriptor(name) => {
                write!(f, "Unknown descriptor '{}'. Valid options are: hog, lab", name)
            }
            PetalError::DescriptorUnavailable(kind) => write!(f, "Model {} not available", kind),
            PetalError::ModelsDirMissing(path) => write!(
                f,
                "'{}' folder not found. Make sure you have trained the models first.",
                path.display()
            ),
            PetalError::NoArtifacts(path) => write!(
                f,
                "Models could not be loaded from '{}'. Make sure you have trained the models first.",
                path.display()
            ),
            PetalError::IncompatibleArtifact { path, reason } => {
                write!(f, "Incompatible artifact {}: {}", path.display(), reason)
            }
            PetalError::Serialization { path, source } => {
                write!(f, "Failed to (de)serialize {}: {}", path.display(), source)
            }
            PetalError::NotFitted => write!(f, "Model has not been fitted"),
            PetalError::NoImageLoaded => write!(f, "No image loaded"),
            PetalError::Svm(msg) => write!(f, "SVM training failed: {}", msg),
            PetalError::Descriptor(msg) => write!(f, "Feature extraction failed: {}", msg),
            PetalError::InvalidConfig(msg) => write!(f, "Invalid configuration: {}", msg),
            PetalError::LabelIndex { path, reason } => {
                write!(f, "Invalid label index file {}: {}", path.display(), reason)
            }
        }
    }
}

impl Error for PetalError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            PetalError::Io { source, .. } => Some(source),
            PetalError::ImageDecode { source, .. } => Some(source),
            PetalError::Serialization { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}
