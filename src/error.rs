//! Errors raised while reading an extracted image set.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors from reading recovery image metadata.
#[derive(Debug, Error)]
pub enum MetadataError {
    /// A required metadata file is missing or could not be read.
    #[error("cannot read '{}'", .path.display())]
    FileAccess {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// A metadata file exists but has no lines.
    #[error("'{}' is empty", .path.display())]
    EmptyContent { path: PathBuf },
}

impl MetadataError {
    /// Path of the file that caused the error.
    pub fn path(&self) -> &std::path::Path {
        match self {
            MetadataError::FileAccess { path, .. } | MetadataError::EmptyContent { path } => path,
        }
    }
}
