//! Command-line configuration.
//!
//! ```toml
//! [image]
//! name = "recovery.img"
//!
//! [device]
//! arch = "arm64"
//! ```

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::images::DEFAULT_IMAGE_NAME;

const CONFIG_DIR_NAME: &str = "recovery-image-info";
const CONFIG_FILE_NAME: &str = "config.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub image_name: String,
    pub arch: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            image_name: DEFAULT_IMAGE_NAME.to_string(),
            arch: None,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigToml {
    image: Option<ImageToml>,
    device: Option<DeviceToml>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ImageToml {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct DeviceToml {
    arch: Option<String>,
}

/// Default config location, `<config_dir>/recovery-image-info/config.toml`.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| config_path_in(&dir))
}

fn config_path_in(config_dir: &Path) -> PathBuf {
    config_dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME)
}

/// Load configuration.
///
/// An explicit path must exist. Otherwise the default location is used if a
/// file is there, and built-in defaults if not.
pub fn load_config(explicit: Option<&Path>) -> Result<Config> {
    load_config_with_base(explicit, dirs::config_dir().as_deref())
}

fn load_config_with_base(explicit: Option<&Path>, config_dir: Option<&Path>) -> Result<Config> {
    if let Some(path) = explicit {
        return load_config_file(path);
    }
    match config_dir.map(config_path_in) {
        Some(path) if path.is_file() => load_config_file(&path),
        _ => Ok(Config::default()),
    }
}

pub fn load_config_file(path: &Path) -> Result<Config> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading config '{}'", path.display()))?;
    parse_config(&content).with_context(|| format!("parsing config '{}'", path.display()))
}

pub fn parse_config(content: &str) -> Result<Config> {
    let parsed: ConfigToml = toml::from_str(content)?;
    let mut config = Config::default();

    if let Some(name) = parsed.image.and_then(|image| image.name) {
        let name = name.trim();
        if name.is_empty() {
            bail!("image.name must not be empty");
        }
        if name.contains('/') || name.contains(std::path::MAIN_SEPARATOR) {
            bail!("image.name must be a file name, got '{}'", name);
        }
        config.image_name = name.to_string();
    }

    if let Some(arch) = parsed.device.and_then(|device| device.arch) {
        let arch = arch.trim().to_ascii_lowercase();
        if arch.is_empty() {
            bail!("device.arch must not be empty");
        }
        config.arch = Some(arch);
    }

    Ok(config)
}
