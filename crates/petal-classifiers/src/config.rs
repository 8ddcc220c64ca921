use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::descriptors::DescriptorKind;
use crate::error::{PetalError, Result};

/// Canonical resolution every image is resized to before feature extraction.
pub const DEFAULT_IMAGE_SIZE: (u32, u32) = (128, 128);

/// Kernel used by the support vector machines.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum Kernel {
    Linear,
    /// `exp(-|x - y|^2 / eps)`. When `eps` is `None` it is derived from the
    /// training matrix as `n_features * var(x)`.
    Gaussian { eps: Option<f64> },
    Polynomial { constant: f64, degree: f64 },
}

impl Default for Kernel {
    fn default() -> Self {
        Kernel::Gaussian { eps: None }
    }
}

impl FromStr for Kernel {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "linear" => Ok(Kernel::Linear),
            "gauss" | "gaussian" | "rbf" => Ok(Kernel::Gaussian { eps: None }),
            "poly" | "polynomial" => Ok(Kernel::Polynomial {
                constant: 1.0,
                degree: 3.0,
            }),
            _ => Err(format!(
                "Unsupported kernel type: {}. Valid options are: linear, gauss, poly",
                s
            )),
        }
    }
}

/// Hyper-parameters of the SVM classifier.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ModelConfig {
    /// Stopping tolerance of the SMO solver.
    pub eps: f64,
    /// Penalty weights for the positive and negative side of every
    /// class-vs-rest machine.
    pub c: (f64, f64),
    pub kernel: Kernel,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            eps: 1e-3,
            c: (1.0, 1.0),
            kernel: Kernel::default(),
        }
    }
}

impl ModelConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.eps > 0.0) {
            return Err(PetalError::InvalidConfig(format!(
                "model.eps must be positive, got {}",
                self.eps
            )));
        }
        if !(self.c.0 > 0.0 && self.c.1 > 0.0) {
            return Err(PetalError::InvalidConfig(format!(
                "model.c weights must be positive, got {:?}",
                self.c
            )));
        }
        if let Kernel::Gaussian { eps: Some(eps) } = self.kernel {
            if !(eps > 0.0) {
                return Err(PetalError::InvalidConfig(format!(
                    "gaussian kernel eps must be positive, got {}",
                    eps
                )));
            }
        }
        Ok(())
    }
}

/// Histogram-of-oriented-gradients geometry.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(default)]
pub struct HogConfig {
    pub orientations: usize,
    /// Signed gradients span 0..360 degrees, unsigned 0..180.
    pub signed: bool,
    pub cell_side: usize,
    /// Block side, in cells.
    pub block_side: usize,
    /// Block stride, in cells.
    pub block_stride: usize,
}

impl Default for HogConfig {
    fn default() -> Self {
        Self {
            orientations: 9,
            signed: false,
            cell_side: 8,
            block_side: 2,
            block_stride: 1,
        }
    }
}

/// LAB colour statistics and histogram settings.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(default)]
pub struct LabConfig {
    /// Histogram bins per channel over the 8-bit range [0, 255].
    pub bins: usize,
}

impl Default for LabConfig {
    fn default() -> Self {
        Self { bins: 32 }
    }
}

/// Everything that determines the shape and meaning of a feature vector.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct DescriptorConfig {
    pub image_size: (u32, u32),
    pub hog: HogConfig,
    pub lab: LabConfig,
}

impl Default for DescriptorConfig {
    fn default() -> Self {
        Self {
            image_size: DEFAULT_IMAGE_SIZE,
            hog: HogConfig::default(),
            lab: LabConfig::default(),
        }
    }
}

impl DescriptorConfig {
    pub fn validate(&self) -> Result<()> {
        let (w, h) = self.image_size;
        if w == 0 || h == 0 {
            return Err(PetalError::InvalidConfig(format!(
                "image_size must be non-zero, got {}x{}",
                w, h
            )));
        }
        if self.lab.bins == 0 {
            return Err(PetalError::InvalidConfig("lab.bins must be at least 1".to_string()));
        }
        let hog = &self.hog;
        if hog.orientations == 0 || hog.cell_side == 0 || hog.block_side == 0 || hog.block_stride == 0 {
            return Err(PetalError::InvalidConfig(format!(
                "hog parameters must be non-zero, got {:?}",
                hog
            )));
        }
        Ok(())
    }
}

/// Train/test partitioning.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct SplitConfig {
    /// Fraction of samples held out for evaluation.
    pub test_ratio: f64,
    pub seed: u64,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            test_ratio: 0.2,
            seed: 42,
        }
    }
}

impl SplitConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.test_ratio > 0.0 && self.test_ratio < 1.0) {
            return Err(PetalError::InvalidConfig(format!(
                "split.test_ratio must be in (0, 1), got {}",
                self.test_ratio
            )));
        }
        Ok(())
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Default)]
#[serde(default)]
pub struct TrainConfig {
    pub split: SplitConfig,
    pub model: ModelConfig,
}

impl TrainConfig {
    pub fn validate(&self) -> Result<()> {
        self.split.validate()?;
        self.model.validate()
    }
}

/// Central configuration shared by the training and inference paths.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct PipelineConfig {
    pub descriptor: DescriptorConfig,
    pub train: TrainConfig,
    /// Descriptors trained by the pipeline, in order.
    pub descriptors: Vec<DescriptorKind>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            descriptor: DescriptorConfig::default(),
            train: TrainConfig::default(),
            descriptors: DescriptorKind::ALL.to_vec(),
        }
    }
}

impl PipelineConfig {
    pub fn validate(&self) -> Result<()> {
        self.descriptor.validate()?;
        self.train.validate()?;
        if self.descriptors.is_empty() {
            return Err(PetalError::InvalidConfig(
                "at least one descriptor must be enabled".to_string(),
            ));
        }
        Ok(())
    }
}
