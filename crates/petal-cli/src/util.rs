use anyhow::{Context, Result};
use std::{
    fs::{self, File},
    io::Write,
    path::Path,
};

use petal_classifiers::data_handling::is_supported_image;

/// Accept only existing files with one of the common raster extensions.
pub fn validate_image_file(path: &Path) -> Result<()> {
    if !is_supported_image(path) {
        anyhow::bail!(
            "File must be a jpg, jpeg, png, bmp, tif or tiff image: {}",
            path.display()
        );
    }
    if !path.is_file() {
        anyhow::bail!("File does not exist: {}", path.display());
    }
    Ok(())
}

pub fn validate_directory(path: &Path) -> Result<()> {
    if !path.is_dir() {
        anyhow::bail!("Directory does not exist: {}", path.display());
    }
    Ok(())
}

pub fn read_json_value(path: &Path) -> Result<serde_json::Value> {
    let config_json = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;
    serde_json::from_str(&config_json)
        .with_context(|| format!("Failed to parse config file: {:?}", path))
}

pub fn write_bytes_to_file(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let mut file = File::create(path)?;
    file.write_all(bytes)?;
    Ok(())
}

/// Fill the fields of `$config` present in the JSON object `$partial`,
/// keeping (and warning about) the default for invalid values.
#[macro_export]
macro_rules! load_or_default {
    ($partial:expr, $config:ident, $field:ident) => {
        if let Some(val) = $partial.get(stringify!($field)) {
            match serde_json::from_value(val.clone()) {
                Ok(parsed) => $config.$field = parsed,
                Err(e) => log::warn!(
                    "Config invalid value for '{}' ({}), using default: {:?}",
                    stringify!($field),
                    e,
                    $config.$field
                ),
            }
        } else {
            log::debug!(
                "Config missing field '{}', using default: {:?}",
                stringify!($field),
                $config.$field
            );
        }
    };
}
