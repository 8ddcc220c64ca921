//! Feature descriptors mapping an image to a fixed-length vector.
use std::fmt;
use std::str::FromStr;

use image::RgbImage;
use ndarray::Array2;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::{HogConfig, LabConfig};
use crate::error::{PetalError, Result};

pub mod factory;
pub mod hog;
pub mod lab;

pub use factory::build_descriptor;
pub use hog::HogDescriptor;
pub use lab::LabDescriptor;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DescriptorKind {
    Hog,
    Lab,
}

impl DescriptorKind {
    pub const ALL: [DescriptorKind; 2] = [DescriptorKind::Hog, DescriptorKind::Lab];

    /// Lower-case name used in artifact file names.
    pub fn name(&self) -> &'static str {
        match self {
            DescriptorKind::Hog => "hog",
            DescriptorKind::Lab => "lab",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            DescriptorKind::Hog => "HOG",
            DescriptorKind::Lab => "LAB",
        }
    }
}

impl fmt::Display for DescriptorKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for DescriptorKind {
    type Err = PetalError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "hog" => Ok(DescriptorKind::Hog),
            "lab" => Ok(DescriptorKind::Lab),
            _ => Err(PetalError::UnknownDescriptor(s.to_string())),
        }
    }
}

/// Descriptor-specific parameters recorded alongside trained models.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DescriptorParams {
    Hog(HogConfig),
    Lab(LabConfig),
}

/// Identifies exactly which feature space a vector lives in. Two artifacts
/// are interchangeable only if their signatures are equal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DescriptorSignature {
    pub kind: DescriptorKind,
    pub image_size: (u32, u32),
    pub params: DescriptorParams,
    pub feature_len: usize,
}

pub trait FeatureDescriptor: Send + Sync {
    fn kind(&self) -> DescriptorKind;

    /// Length of every vector returned by `extract`.
    fn feature_len(&self) -> usize;

    fn signature(&self) -> DescriptorSignature;

    /// Extract the feature vector of one image. Images that are not at the
    /// configured size are resized first.
    fn extract(&self, image: &RgbImage) -> Result<Vec<f64>>;

    /// Extract one row per image. Rows keep the order of `images`.
    fn extract_batch(&self, images: &[RgbImage]) -> Result<Array2<f64>> {
        let len = self.feature_len();
        let rows = images
            .par_iter()
            .map(|img| self.extract(img))
            .collect::<Result<Vec<Vec<f64>>>>()?;

        let mut flat = Vec::with_capacity(rows.len() * len);
        for row in &rows {
            if row.len() != len {
                return Err(PetalError::ShapeMismatch {
                    what: "descriptor output",
                    expected: len,
                    found: row.len(),
                });
            }
            flat.extend_from_slice(row);
        }
        Array2::from_shape_vec((rows.len(), len), flat).map_err(|e| PetalError::Descriptor(e.to_string()))
    }
}
