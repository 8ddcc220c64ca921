//! petal-classifiers: hand-crafted image descriptors and SVM classifiers.
//!
//! The crate loads a directory-per-class image dataset, extracts HOG and
//! LAB colour feature vectors, trains one multi-class SVM per descriptor and
//! persists it with its label encoder and feature scaler. The same
//! descriptor configuration drives inference, where bundles are loaded best
//! effort and single images are classified through an [`inference::ArtifactRegistry`]
//! or an interactive [`session::ClassifierSession`].
pub mod artifacts;
pub mod config;
pub mod data_handling;
pub mod descriptors;
pub mod error;
pub mod inference;
pub mod models;
pub mod prepare;
pub mod preprocessing;
pub mod report;
pub mod session;
pub mod stats;
pub mod trainer;

pub use error::{PetalError, Result};
