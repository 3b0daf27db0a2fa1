//! Files written by the image unpacker.
//!
//! An unpacked image is a flat directory of `<image>-<suffix>` files, one per
//! header field or payload. [`PROBES`] lists every suffix this crate knows and
//! how it is treated when the file is missing.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::MetadataError;

/// Image name used by recovery unpacks.
pub const DEFAULT_IMAGE_NAME: &str = "recovery.img";

/// Presence flags recorded for payload files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flag {
    Kernel,
    DtImage,
    DtbImage,
    DtboImage,
}

/// Text fields read from header files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Text {
    BaseAddress,
    BoardName,
    Cmdline,
    HeaderVersion,
    RecoverySize,
    Pagesize,
    RamdiskCompression,
    RamdiskOffset,
    TagsOffset,
}

/// How a suffix is probed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Probe {
    /// Only whether the file is a regular file is recorded.
    Presence(Flag),
    /// First line is read; a missing file is an error.
    Required(Text),
    /// First line is read if the path exists, otherwise the fallback is used.
    Defaulted(Text, &'static str),
}

pub const PROBES: &[(&str, Probe)] = &[
    ("zImage", Probe::Presence(Flag::Kernel)),
    ("dt", Probe::Presence(Flag::DtImage)),
    ("dtb", Probe::Presence(Flag::DtbImage)),
    ("dtbo", Probe::Presence(Flag::DtboImage)),
    ("base", Probe::Required(Text::BaseAddress)),
    ("board", Probe::Required(Text::BoardName)),
    ("cmdline", Probe::Required(Text::Cmdline)),
    ("header_version", Probe::Defaulted(Text::HeaderVersion, "0")),
    ("origsize", Probe::Required(Text::RecoverySize)),
    ("pagesize", Probe::Required(Text::Pagesize)),
    ("ramdiskcomp", Probe::Required(Text::RamdiskCompression)),
    ("ramdisk_offset", Probe::Required(Text::RamdiskOffset)),
    ("tags_offset", Probe::Required(Text::TagsOffset)),
];

/// Result of a single probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Flag(Flag, bool),
    Text(Text, String),
}

/// Location of an unpacked image's files.
#[derive(Debug, Clone)]
pub struct ImageSet {
    dir: PathBuf,
    image_name: String,
}

impl ImageSet {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self::with_image_name(dir, DEFAULT_IMAGE_NAME)
    }

    /// Image set for files named `<image_name>-<suffix>`, e.g. `boot.img`.
    pub fn with_image_name(dir: impl Into<PathBuf>, image_name: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            image_name: image_name.into(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn image_name(&self) -> &str {
        &self.image_name
    }

    /// Path of the file holding `suffix`.
    pub fn path(&self, suffix: &str) -> PathBuf {
        self.dir.join(format!("{}-{}", self.image_name, suffix))
    }

    /// Resolve one entry of [`PROBES`].
    pub fn probe(&self, suffix: &str, probe: Probe) -> Result<Value, MetadataError> {
        let path = self.path(suffix);
        let value = match probe {
            Probe::Presence(flag) => Value::Flag(flag, path.is_file()),
            Probe::Required(text) => Value::Text(text, read_first_line(&path)?),
            Probe::Defaulted(text, fallback) => {
                if path.exists() {
                    Value::Text(text, read_first_line(&path)?)
                } else {
                    debug!(path = %path.display(), fallback, "metadata file absent, using fallback");
                    Value::Text(text, fallback.to_string())
                }
            }
        };
        debug!(path = %path.display(), ?value, "probed");
        Ok(value)
    }
}

/// First line of a text file, without its line terminator.
///
/// `\n`, `\r\n` and a bare `\r` all end a line.
pub fn read_first_line(path: &Path) -> Result<String, MetadataError> {
    let content = fs::read_to_string(path).map_err(|source| MetadataError::FileAccess {
        path: path.to_path_buf(),
        source,
    })?;
    if content.is_empty() {
        return Err(MetadataError::EmptyContent {
            path: path.to_path_buf(),
        });
    }
    let first = content.split(['\n', '\r']).next().unwrap_or_default();
    Ok(first.to_string())
}
