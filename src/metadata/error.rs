//! Error types for metadata markup handling.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while reading, normalizing or writing metadata markup.
#[derive(Debug, Error)]
pub enum MetadataError {
    /// The markup is not well-formed.
    #[error("malformed markup: {reason}")]
    Malformed {
        /// What the reader objected to.
        reason: String,
    },

    /// The metadata file could not be written.
    #[error("IO error writing metadata to {path}: {source}")]
    Io {
        /// The file that failed.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },
}

impl MetadataError {
    /// Creates a `Malformed` error from any displayable reader/writer failure.
    pub fn malformed(reason: impl std::fmt::Display) -> Self {
        Self::Malformed {
            reason: reason.to_string(),
        }
    }

    /// Creates an `Io` error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
