//! Loading labelled image datasets and splitting them for training.
//!
//! A dataset is a root directory with one subdirectory per class; every
//! decodable file inside a class directory becomes one sample labelled with
//! the directory name.
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use image::imageops::FilterType;
use image::{ImageReader, RgbImage};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::error::{PetalError, Result};

/// Raster formats accepted for single-image classification.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "tif", "tiff"];

/// Decoded images with their class labels, index-aligned.
#[derive(Debug, Clone, Default)]
pub struct LabeledImages {
    pub images: Vec<RgbImage>,
    pub labels: Vec<String>,
}

impl LabeledImages {
    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    /// Number of samples per class, ordered by label.
    pub fn class_counts(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for label in &self.labels {
            *counts.entry(label.clone()).or_insert(0) += 1;
        }
        counts
    }

    pub fn num_classes(&self) -> usize {
        self.class_counts().len()
    }
}

/// Load every image below `root`, resized to `size`.
///
/// Files that cannot be decoded and class directories that cannot be listed
/// are skipped with a warning. Fails if `root` cannot be listed or if no
/// image could be decoded at all.
pub fn load_dataset<P: AsRef<Path>>(root: P, size: (u32, u32)) -> Result<LabeledImages> {
    let root = root.as_ref();
    let mut dataset = LabeledImages::default();

    for class_dir in sorted_entries(root)? {
        if !class_dir.is_dir() {
            continue;
        }
        let Some(label) = class_dir.file_name().and_then(|n| n.to_str()).map(str::to_string) else {
            log::warn!("Skipping class directory with non UTF-8 name: {:?}", class_dir);
            continue;
        };

        let files = match sorted_entries(&class_dir) {
            Ok(files) => files,
            Err(e) => {
                log::warn!("Skipping class '{}': {}", label, e);
                continue;
            }
        };

        let mut loaded = 0usize;
        for file in files {
            if !file.is_file() {
                continue;
            }
            match decode_image(&file, size) {
                Ok(img) => {
                    dataset.images.push(img);
                    dataset.labels.push(label.clone());
                    loaded += 1;
                }
                Err(e) => log::warn!("Skipping {}: {}", file.display(), e),
            }
        }
        log::debug!("Loaded {} images for class '{}'", loaded, label);
    }

    if dataset.is_empty() {
        return Err(PetalError::EmptyDataset(root.to_path_buf()));
    }
    Ok(dataset)
}

/// Decode any raster file the `image` crate recognises (format guessed from
/// content) and resize it to `size`.
pub fn decode_image<P: AsRef<Path>>(path: P, size: (u32, u32)) -> Result<RgbImage> {
    let path = path.as_ref();
    let reader = ImageReader::open(path)
        .and_then(|r| r.with_guessed_format())
        .map_err(|e| PetalError::io(path, e))?;
    let img = reader.decode().map_err(|source| PetalError::ImageDecode {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(resize_to(&img.to_rgb8(), size))
}

/// Single-image path used at inference time: restricted to the common
/// raster extensions, then decoded and resized.
pub fn load_image<P: AsRef<Path>>(path: P, size: (u32, u32)) -> Result<RgbImage> {
    let path = path.as_ref();
    if !is_supported_image(path) {
        return Err(PetalError::UnsupportedImageFormat(path.to_path_buf()));
    }
    decode_image(path, size)
}

pub fn is_supported_image<P: AsRef<Path>>(path: P) -> bool {
    path.as_ref()
        .extension()
        .and_then(|s| s.to_str())
        .map(|ext| SUPPORTED_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Resize with bilinear filtering; images already at `size` are copied as is.
pub fn resize_to(img: &RgbImage, size: (u32, u32)) -> RgbImage {
    if img.dimensions() == size {
        return img.clone();
    }
    image::imageops::resize(img, size.0, size.1, FilterType::Triangle)
}

/// Shuffle `0..n` with a seeded RNG and split it into (train, test) index
/// sets. The test partition holds `ceil(n * test_ratio)` samples.
pub fn train_test_split(n: usize, test_ratio: f64, seed: u64) -> Result<(Vec<usize>, Vec<usize>)> {
    if !(test_ratio > 0.0 && test_ratio < 1.0) {
        return Err(PetalError::InvalidConfig(format!(
            "test_ratio must be in (0, 1), got {}",
            test_ratio
        )));
    }
    let n_test = ((n as f64) * test_ratio).ceil() as usize;
    if n_test == 0 || n_test >= n {
        return Err(PetalError::InsufficientSamples(format!(
            "{} samples cannot be split with test_ratio {} (train and test partitions must both be non-empty)",
            n, test_ratio
        )));
    }

    let mut indices: Vec<usize> = (0..n).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let train = indices.split_off(n_test);
    Ok((train, indices))
}

fn sorted_entries(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut entries = fs::read_dir(dir)
        .map_err(|e| PetalError::io(dir, e))?
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry.path()),
            Err(e) => {
                log::warn!("Failed to read an entry of {}: {}", dir.display(), e);
                None
            }
        })
        .collect::<Vec<_>>();
    entries.sort();
    Ok(entries)
}
