//! Reorganise a flat, sequentially numbered image collection into the
//! one-directory-per-class layout read by `load_dataset`.
use std::fs::{self, File};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{PetalError, Result};

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct PrepareConfig {
    /// Directory holding `image_00001.jpg`, `image_00002.jpg`, ...
    pub images_dir: PathBuf,
    /// One class id per image, in image order.
    pub labels_file: PathBuf,
    pub output_dir: PathBuf,
    pub num_classes: usize,
    pub image_prefix: String,
    pub image_extension: String,
}

impl Default for PrepareConfig {
    fn default() -> Self {
        Self {
            images_dir: PathBuf::from("data/flowers"),
            labels_file: PathBuf::from("data/labels/imagelabels.csv"),
            output_dir: PathBuf::from("data/dataset"),
            num_classes: 102,
            image_prefix: "image_".to_string(),
            image_extension: "jpg".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PrepareSummary {
    pub copied: usize,
    pub missing: usize,
    pub classes_created: usize,
}

pub fn class_dir_name(class_id: usize) -> String {
    format!("class_{:03}", class_id)
}

/// File name of the image at 1-based `index`.
pub fn image_file_name(prefix: &str, index: usize, extension: &str) -> String {
    format!("{}{:05}.{}", prefix, index, extension)
}

#[derive(Deserialize)]
#[serde(untagged)]
enum JsonLabels {
    Flat(Vec<f64>),
    Nested(Vec<Vec<f64>>),
}

/// Read class ids in order. `.json` files hold an array (optionally nested
/// one level, as exported from matrix formats); anything else is read as
/// delimited text where every whitespace-separated token is one id.
pub fn read_label_index<P: AsRef<Path>>(path: P) -> Result<Vec<usize>> {
    let path = path.as_ref();
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default();

    let values = if extension == "json" {
        read_json_labels(path)?
    } else {
        read_text_labels(path, if extension == "tsv" { b'\t' } else { b',' })?
    };

    if values.is_empty() {
        return Err(PetalError::LabelIndex {
            path: path.to_path_buf(),
            reason: "no labels found".to_string(),
        });
    }
    values
        .into_iter()
        .enumerate()
        .map(|(i, v)| to_class_id(path, i, v))
        .collect()
}

fn read_json_labels(path: &Path) -> Result<Vec<f64>> {
    let file = File::open(path).map_err(|e| PetalError::io(path, e))?;
    let labels: JsonLabels = serde_json::from_reader(file).map_err(|e| PetalError::LabelIndex {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    Ok(match labels {
        JsonLabels::Flat(v) => v,
        JsonLabels::Nested(v) => v.into_iter().flatten().collect(),
    })
}

fn read_text_labels(path: &Path, delimiter: u8) -> Result<Vec<f64>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter)
        .from_path(path)
        .map_err(|e| PetalError::LabelIndex {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

    let mut values = Vec::new();
    for (line, record) in reader.records().enumerate() {
        let record = record.map_err(|e| PetalError::LabelIndex {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        for token in record.iter().flat_map(str::split_whitespace) {
            let value = token.parse::<f64>().map_err(|_| PetalError::LabelIndex {
                path: path.to_path_buf(),
                reason: format!("'{}' on record {} is not a number", token, line + 1),
            })?;
            values.push(value);
        }
    }
    Ok(values)
}

fn to_class_id(path: &Path, index: usize, value: f64) -> Result<usize> {
    if value.fract() != 0.0 || value < 0.0 || !value.is_finite() {
        return Err(PetalError::LabelIndex {
            path: path.to_path_buf(),
            reason: format!("label #{} is not a class id: {}", index + 1, value),
        });
    }
    Ok(value as usize)
}

/// Copy `images_dir/<prefix><i:05>.<ext>` into
/// `output_dir/class_<label:03>/` for every label `i` of the index.
///
/// Labels outside `1..=num_classes` fail the run before anything is copied.
/// Missing source images are skipped with a warning and counted.
pub fn prepare_dataset(config: &PrepareConfig) -> Result<PrepareSummary> {
    if config.num_classes == 0 {
        return Err(PetalError::InvalidConfig("num_classes must be at least 1".to_string()));
    }
    let labels = read_label_index(&config.labels_file)?;
    log::info!(
        "Read {} labels from {}",
        labels.len(),
        config.labels_file.display()
    );

    if let Some((i, &bad)) = labels
        .iter()
        .enumerate()
        .find(|(_, &l)| l == 0 || l > config.num_classes)
    {
        return Err(PetalError::LabelIndex {
            path: config.labels_file.clone(),
            reason: format!(
                "label #{} is {}, expected 1..={}",
                i + 1,
                bad,
                config.num_classes
            ),
        });
    }

    let output = &config.output_dir;
    for class_id in 1..=config.num_classes {
        let dir = output.join(class_dir_name(class_id));
        fs::create_dir_all(&dir).map_err(|e| PetalError::io(&dir, e))?;
    }

    let mut summary = PrepareSummary {
        classes_created: config.num_classes,
        ..PrepareSummary::default()
    };
    for (i, &label) in labels.iter().enumerate() {
        let name = image_file_name(&config.image_prefix, i + 1, &config.image_extension);
        let src = config.images_dir.join(&name);
        if !src.is_file() {
            log::warn!("Image not found: {}", src.display());
            summary.missing += 1;
            continue;
        }
        let dst = output.join(class_dir_name(label)).join(&name);
        fs::copy(&src, &dst).map_err(|e| PetalError::io(&src, e))?;
        log::trace!("{} -> {}", src.display(), dst.display());
        summary.copied += 1;
    }

    log::info!(
        "Dataset reorganized by class in {} ({} copied, {} missing)",
        output.display(),
        summary.copied,
        summary.missing
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_zero_padded() {
        assert_eq!(class_dir_name(7), "class_007");
        assert_eq!(class_dir_name(102), "class_102");
        assert_eq!(image_file_name("image_", 1, "jpg"), "image_00001.jpg");
    }

    #[test]
    fn reads_text_and_json_label_files() {
        let dir = tempfile::tempdir().unwrap();

        let csv = dir.path().join("labels.csv");
        fs::write(&csv, "1,2\n3\n").unwrap();
        assert_eq!(read_label_index(&csv).unwrap(), vec![1, 2, 3]);

        let txt = dir.path().join("labels.txt");
        fs::write(&txt, "4 5\n6\n").unwrap();
        assert_eq!(read_label_index(&txt).unwrap(), vec![4, 5, 6]);

        let tsv = dir.path().join("labels.tsv");
        fs::write(&tsv, "7\t8\n").unwrap();
        assert_eq!(read_label_index(&tsv).unwrap(), vec![7, 8]);

        let json = dir.path().join("labels.json");
        fs::write(&json, "[[77, 77, 1]]").unwrap();
        assert_eq!(read_label_index(&json).unwrap(), vec![77, 77, 1]);
    }

    #[test]
    fn rejects_non_integer_labels() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("labels.csv");
        fs::write(&path, "1,2.5\n").unwrap();
        assert!(matches!(read_label_index(&path), Err(PetalError::LabelIndex { .. })));

        fs::write(&path, "1,abc\n").unwrap();
        assert!(matches!(read_label_index(&path), Err(PetalError::LabelIndex { .. })));
    }
}
