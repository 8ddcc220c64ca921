mod common;

use image::{DynamicImage, RgbImage};
use petal_classifiers::config::DescriptorConfig;
use petal_classifiers::descriptors::{build_descriptor, DescriptorKind};

use common::{striped_image, uniform_image, BLUE, GREEN, RED};

#[test]
fn descriptors_are_deterministic() {
    let config = DescriptorConfig::default();
    let img = striped_image(GREEN, true, 1, 128);
    for kind in DescriptorKind::ALL {
        let d = build_descriptor(kind, &config).unwrap();
        assert_eq!(d.extract(&img).unwrap(), d.extract(&img).unwrap(), "{}", kind);
    }
}

#[test]
fn dimensionality_is_constant_across_inputs() {
    let config = DescriptorConfig::default();
    let gray_as_rgb: RgbImage = DynamicImage::ImageLuma8(image::GrayImage::from_fn(50, 70, |x, y| {
        image::Luma([((x + y) % 256) as u8])
    }))
    .to_rgb8();
    let inputs = [
        uniform_image(RED, 0, 128),
        striped_image(BLUE, false, 3, 300),
        gray_as_rgb,
    ];

    let expected = [(DescriptorKind::Hog, 8100), (DescriptorKind::Lab, 102)];
    for (kind, len) in expected {
        let d = build_descriptor(kind, &config).unwrap();
        assert_eq!(d.feature_len(), len);
        for img in &inputs {
            assert_eq!(d.extract(img).unwrap().len(), len, "{}", kind);
        }
    }
}

#[test]
fn hog_separates_stripe_orientation() {
    let config = DescriptorConfig {
        image_size: (64, 64),
        ..DescriptorConfig::default()
    };
    let d = build_descriptor(DescriptorKind::Hog, &config).unwrap();
    let v = d.extract(&striped_image(RED, true, 0, 64)).unwrap();
    let h = d.extract(&striped_image(RED, false, 0, 64)).unwrap();
    assert_ne!(v, h);
    assert!(v.iter().any(|&x| x > 0.0));
}

#[test]
fn lab_statistics_reflect_colour() {
    let d = build_descriptor(DescriptorKind::Lab, &DescriptorConfig::default()).unwrap();
    let red = d.extract(&uniform_image(RED, 0, 64)).unwrap();
    let blue = d.extract(&uniform_image(BLUE, 0, 64)).unwrap();
    // a* mean: red is far on the positive side
    assert!(red[2] > 128.0 + 40.0);
    // b* mean: blue is on the negative side
    assert!(blue[4] < 128.0 - 40.0);
    // uniform images have zero spread
    assert_eq!(red[1], 0.0);
    assert_eq!(red[3], 0.0);
    assert_eq!(red[5], 0.0);
}

#[test]
fn batch_extraction_preserves_order() {
    let config = DescriptorConfig {
        image_size: (32, 32),
        ..DescriptorConfig::default()
    };
    let d = build_descriptor(DescriptorKind::Lab, &config).unwrap();
    let images: Vec<RgbImage> = (0..6)
        .map(|i| uniform_image(if i % 2 == 0 { RED } else { BLUE }, i, 32))
        .collect();
    let batch = d.extract_batch(&images).unwrap();
    assert_eq!(batch.dim(), (6, 102));
    for (i, img) in images.iter().enumerate() {
        assert_eq!(batch.row(i).to_vec(), d.extract(img).unwrap());
    }
}
