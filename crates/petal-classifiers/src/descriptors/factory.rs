use crate::config::DescriptorConfig;
use crate::descriptors::{DescriptorKind, FeatureDescriptor, HogDescriptor, LabDescriptor};
use crate::error::Result;

/// Build a boxed descriptor of the given kind from the shared configuration.
/// Training and inference both go through here so the two paths cannot
/// drift apart.
pub fn build_descriptor(
    kind: DescriptorKind,
    config: &DescriptorConfig,
) -> Result<Box<dyn FeatureDescriptor>> {
    config.validate()?;
    let descriptor: Box<dyn FeatureDescriptor> = match kind {
        DescriptorKind::Hog => Box::new(HogDescriptor::new(config.image_size, config.hog)?),
        DescriptorKind::Lab => Box::new(LabDescriptor::new(config.image_size, config.lab)),
    };
    Ok(descriptor)
}
