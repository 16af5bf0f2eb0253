//! Error types for package assembly.
//!
//! Every variant here is fatal for the run: recoverable page-level problems
//! are logged where they happen and never surface as a `PackageError`.

use std::path::PathBuf;

use thiserror::Error;

use crate::catalog::CatalogError;
use crate::metadata::MetadataError;

/// Structural failures that stop the run.
#[derive(Debug, Error)]
pub enum PackageError {
    /// A local master file did not pass the file getter's path check.
    #[error(
        "local OBJ file {path} for page {page} did not pass the path check\n  Suggestion: verify master file naming for this record"
    )]
    ObjPathRejected {
        /// The rejected local file.
        path: PathBuf,
        /// The page directory name it was expected to match.
        page: String,
    },

    /// Filename-derived page numbering found no trailing digits.
    #[error(
        "filename '{filename}' has no trailing page number\n  Suggestion: master files must end in digits, e.g. 1988-07-13-01.tiff"
    )]
    PageNumberMissing {
        /// The offending file stem.
        filename: String,
    },

    /// A directory of the package could not be created.
    #[error("failed to create directory {path}: {source}")]
    CreateDirectory {
        /// The directory that could not be created.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// Copying or moving a local file into the package failed.
    #[error("failed to copy {from} to {to}: {source}")]
    CopyFile {
        /// Source file.
        from: PathBuf,
        /// Destination inside the package.
        to: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The record's compound descriptor could not be retrieved.
    #[error("failed to fetch compound descriptor for record {record_key}: {source}")]
    Descriptor {
        /// The record whose descriptor failed.
        record_key: String,
        /// The underlying catalog error.
        #[source]
        source: CatalogError,
    },

    /// The record's compound descriptor markup could not be parsed.
    #[error("malformed compound descriptor for record {record_key}: {source}")]
    MalformedDescriptor {
        /// The record whose descriptor failed.
        record_key: String,
        /// The underlying markup error.
        #[source]
        source: MetadataError,
    },

    /// The record-level item info could not be retrieved.
    #[error("failed to fetch item info for record {record_key}: {source}")]
    RecordInfo {
        /// The record whose item info failed.
        record_key: String,
        /// The underlying catalog error.
        #[source]
        source: CatalogError,
    },
}

impl PackageError {
    /// Creates an `ObjPathRejected` error.
    pub fn obj_path_rejected(path: impl Into<PathBuf>, page: impl Into<String>) -> Self {
        Self::ObjPathRejected {
            path: path.into(),
            page: page.into(),
        }
    }

    /// Creates a `PageNumberMissing` error.
    pub fn page_number_missing(filename: impl Into<String>) -> Self {
        Self::PageNumberMissing {
            filename: filename.into(),
        }
    }

    /// Creates a `CreateDirectory` error.
    pub fn create_directory(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::CreateDirectory {
            path: path.into(),
            source,
        }
    }

    /// Creates a `CopyFile` error.
    pub fn copy_file(from: impl Into<PathBuf>, to: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::CopyFile {
            from: from.into(),
            to: to.into(),
            source,
        }
    }
}
