use image::{imageops, RgbImage};
use imageproc::hog::{hog, HogOptions, HogSpec};

use crate::config::HogConfig;
use crate::data_handling::resize_to;
use crate::descriptors::{DescriptorKind, DescriptorParams, DescriptorSignature, FeatureDescriptor};
use crate::error::{PetalError, Result};

/// Histogram of oriented gradients over the grayscale image.
#[derive(Debug, Clone)]
pub struct HogDescriptor {
    image_size: (u32, u32),
    config: HogConfig,
    feature_len: usize,
}

impl HogDescriptor {
    /// Fails if the cell/block geometry does not tile `image_size`.
    pub fn new(image_size: (u32, u32), config: HogConfig) -> Result<Self> {
        let spec = HogSpec::from_options(image_size.0, image_size.1, options(&config))
            .map_err(|e| PetalError::InvalidConfig(format!("HOG geometry: {}", e)))?;
        Ok(Self {
            image_size,
            config,
            feature_len: spec.descriptor_length(),
        })
    }
}

fn options(config: &HogConfig) -> HogOptions {
    HogOptions::new(
        config.orientations,
        config.signed,
        config.cell_side,
        config.block_side,
        config.block_stride,
    )
}

impl FeatureDescriptor for HogDescriptor {
    fn kind(&self) -> DescriptorKind {
        DescriptorKind::Hog
    }

    fn feature_len(&self) -> usize {
        self.feature_len
    }

    fn signature(&self) -> DescriptorSignature {
        DescriptorSignature {
            kind: DescriptorKind::Hog,
            image_size: self.image_size,
            params: DescriptorParams::Hog(self.config),
            feature_len: self.feature_len,
        }
    }

    fn extract(&self, image: &RgbImage) -> Result<Vec<f64>> {
        let resized = resize_to(image, self.image_size);
        let gray = imageops::grayscale(&resized);
        let features = hog(&gray, options(&self.config)).map_err(PetalError::Descriptor)?;
        // Blocks without any gradient energy carry no orientation.
        Ok(features
            .into_iter()
            .map(|v| if v.is_finite() { f64::from(v) } else { 0.0 })
            .collect())
    }
}
