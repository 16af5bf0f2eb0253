//! Metadata file writing.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::metadata::MetadataError;
use crate::metadata::xml::normalize_markup;

/// Metadata filename used when none is configured.
pub const DEFAULT_METADATA_FILENAME: &str = "MODS.xml";

/// Writes normalized metadata files into package directories.
#[derive(Debug, Clone)]
pub struct MetadataEmitter {
    filename: String,
}

impl Default for MetadataEmitter {
    fn default() -> Self {
        Self::new(DEFAULT_METADATA_FILENAME)
    }
}

impl MetadataEmitter {
    /// Creates an emitter that writes `filename` in each directory.
    #[must_use]
    pub fn new(filename: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
        }
    }

    /// The metadata filename.
    #[must_use]
    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// Normalizes `markup` and writes it to `directory/<filename>`.
    ///
    /// # Errors
    ///
    /// Returns [`MetadataError::Malformed`] for markup that cannot be
    /// normalized and [`MetadataError::Io`] when the file cannot be written.
    pub fn write(&self, directory: &Path, markup: &str) -> Result<PathBuf, MetadataError> {
        let normalized = normalize_markup(markup)?;
        let path = directory.join(&self.filename);
        std::fs::write(&path, normalized).map_err(|e| MetadataError::io(&path, e))?;
        debug!(path = %path.display(), "metadata written");
        Ok(path)
    }
}
