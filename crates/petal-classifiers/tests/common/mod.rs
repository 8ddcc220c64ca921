#![allow(dead_code)]
use std::fs;
use std::path::{Path, PathBuf};

use image::{Rgb, RgbImage};
use petal_classifiers::config::{DescriptorConfig, PipelineConfig};

pub const RED: [u8; 3] = [200, 30, 30];
pub const BLUE: [u8; 3] = [30, 40, 210];
pub const GREEN: [u8; 3] = [40, 180, 50];

/// Small images keep the SVM fits fast.
pub fn small_pipeline_config() -> PipelineConfig {
    PipelineConfig {
        descriptor: DescriptorConfig {
            image_size: (32, 32),
            ..DescriptorConfig::default()
        },
        ..PipelineConfig::default()
    }
}

/// Uniform image whose shade drifts slightly with `i`.
pub fn uniform_image(colour: [u8; 3], i: u32, size: u32) -> RgbImage {
    let shift = (i % 5) as u8 * 3;
    RgbImage::from_pixel(
        size,
        size,
        Rgb([
            colour[0].saturating_add(shift),
            colour[1].saturating_sub(shift),
            colour[2].saturating_add(shift / 2),
        ]),
    )
}

/// Stripes along x (`vertical`) or y, with a per-image phase.
pub fn striped_image(colour: [u8; 3], vertical: bool, i: u32, size: u32) -> RgbImage {
    RgbImage::from_fn(size, size, |x, y| {
        let t = if vertical { x } else { y } + i;
        if (t / 4) % 2 == 0 {
            Rgb(colour)
        } else {
            Rgb([colour[0] / 4, colour[1] / 4, colour[2] / 4])
        }
    })
}

/// Write `per_class` uniform PNGs for every `(label, colour)`.
pub fn write_uniform_dataset(root: &Path, classes: &[(&str, [u8; 3])], per_class: u32) -> PathBuf {
    for (label, colour) in classes {
        let dir = root.join(label);
        fs::create_dir_all(&dir).unwrap();
        for i in 0..per_class {
            uniform_image(*colour, i, 40)
                .save(dir.join(format!("img_{:03}.png", i)))
                .unwrap();
        }
    }
    root.to_path_buf()
}
