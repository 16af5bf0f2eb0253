//! Splitting an output directory into ingest batch sets.
//!
//! Ingest tools take packages in bounded batches. Every package directory
//! (one that directly holds the metadata file) is moved, in sorted order, into
//! `set_1`, `set_2`, ... created next to the packages.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info};
use walkdir::WalkDir;

/// Packages per set when none is given.
pub const DEFAULT_SET_SIZE: usize = 50;

/// Errors raised while splitting packages into sets.
#[derive(Debug, Error)]
pub enum BatchError {
    /// The set size was zero.
    #[error("set size must be at least 1")]
    InvalidSetSize,

    /// The output directory could not be walked.
    #[error("cannot scan {path}: {source}")]
    Scan {
        /// Directory being scanned.
        path: PathBuf,
        /// The underlying walk error.
        #[source]
        source: walkdir::Error,
    },

    /// A set directory could not be created or a package could not be moved.
    #[error("IO error at {path}: {source}")]
    Io {
        /// Path involved.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: io::Error,
    },
}

impl BatchError {
    fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Outcome of a split.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchSummary {
    /// Number of packages moved.
    pub packages: usize,
    /// Set directories used, in order of first use.
    pub sets: Vec<PathBuf>,
}

/// Finds package directories under `root`, sorted.
///
/// The walk does not descend into a package, so page directories (which
/// also hold a metadata file) are never reported on their own.
///
/// # Errors
///
/// Returns [`BatchError::Scan`] when part of the tree cannot be read.
pub fn find_packages(root: &Path, metadata_filename: &str) -> Result<Vec<PathBuf>, BatchError> {
    let mut packages = Vec::new();
    let mut walker = WalkDir::new(root).min_depth(1).sort_by_file_name().into_iter();
    while let Some(entry) = walker.next() {
        let entry = entry.map_err(|source| BatchError::Scan {
            path: root.to_path_buf(),
            source,
        })?;
        if !entry.file_type().is_dir() {
            continue;
        }
        if entry.path().join(metadata_filename).is_file() {
            packages.push(entry.into_path());
            walker.skip_current_dir();
        }
    }
    packages.sort();
    Ok(packages)
}

/// Moves packages under `root` into sets of `set_size`.
///
/// Each package of the n-th chunk moves into `set_<n>` inside its own parent
/// directory, so packages under different subdirectories stay apart.
///
/// # Errors
///
/// Returns [`BatchError`] for a zero set size, an unreadable tree, or a
/// failed directory creation or move.
pub fn split_into_sets(root: &Path, metadata_filename: &str, set_size: usize) -> Result<BatchSummary, BatchError> {
    if set_size == 0 {
        return Err(BatchError::InvalidSetSize);
    }

    let packages = find_packages(root, metadata_filename)?;
    let mut sets = Vec::new();

    for (index, chunk) in packages.chunks(set_size).enumerate() {
        let set_name = format!("set_{}", index + 1);
        for package in chunk {
            let (Some(parent), Some(name)) = (package.parent(), package.file_name()) else {
                continue;
            };
            let set_dir = parent.join(&set_name);
            if !sets.contains(&set_dir) {
                fs::create_dir_all(&set_dir).map_err(|e| BatchError::io(&set_dir, e))?;
                sets.push(set_dir.clone());
            }
            let target = set_dir.join(name);
            fs::rename(package, &target).map_err(|e| BatchError::io(package, e))?;
            debug!(from = %package.display(), to = %target.display(), "moved package");
        }
        info!(set = %set_name, packages = chunk.len(), "batch set written");
    }

    Ok(BatchSummary {
        packages: packages.len(),
        sets,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn package(root: &Path, name: &str) {
        let dir = root.join(name);
        fs::create_dir_all(dir.join("1")).unwrap();
        fs::write(dir.join("MODS.xml"), b"<mods/>").unwrap();
        fs::write(dir.join("1").join("MODS.xml"), b"<mods/>").unwrap();
    }

    #[test]
    fn test_find_packages_skips_page_directories() {
        let dir = TempDir::new().unwrap();
        package(dir.path(), "1988-07-14");
        package(dir.path(), "1988-07-13");
        fs::create_dir(dir.path().join("empty")).unwrap();

        let found = find_packages(dir.path(), "MODS.xml").unwrap();
        assert_eq!(found, vec![dir.path().join("1988-07-13"), dir.path().join("1988-07-14")]);
    }

    #[test]
    fn test_split_into_sets_chunks_in_order() {
        let dir = TempDir::new().unwrap();
        for name in ["1988-07-13", "1988-07-13.1", "1988-07-14", "1988-07-15", "1988-07-16"] {
            package(dir.path(), name);
        }

        let summary = split_into_sets(dir.path(), "MODS.xml", 2).unwrap();
        assert_eq!(summary.packages, 5);
        assert_eq!(summary.sets.len(), 3);
        assert!(dir.path().join("set_1/1988-07-13/MODS.xml").is_file());
        assert!(dir.path().join("set_1/1988-07-13.1/1/MODS.xml").is_file());
        assert!(dir.path().join("set_2/1988-07-14").is_dir());
        assert!(dir.path().join("set_3/1988-07-16").is_dir());
        assert!(!dir.path().join("1988-07-15").exists());
    }

    #[test]
    fn test_split_keeps_packages_under_their_own_parent() {
        let dir = TempDir::new().unwrap();
        package(&dir.path().join("Bugle"), "1988-07-13");
        package(&dir.path().join("Courier"), "1988-07-13");
        package(&dir.path().join("Courier"), "1988-07-14");

        let summary = split_into_sets(dir.path(), "MODS.xml", 2).unwrap();
        assert_eq!(summary.packages, 3);
        assert!(dir.path().join("Bugle/set_1/1988-07-13/MODS.xml").is_file());
        assert!(dir.path().join("Courier/set_1/1988-07-13/MODS.xml").is_file());
        assert!(dir.path().join("Courier/set_2/1988-07-14/MODS.xml").is_file());
        assert_eq!(
            summary.sets,
            vec![
                dir.path().join("Bugle/set_1"),
                dir.path().join("Courier/set_1"),
                dir.path().join("Courier/set_2"),
            ]
        );
    }

    #[test]
    fn test_split_with_nothing_to_move() {
        let dir = TempDir::new().unwrap();
        let summary = split_into_sets(dir.path(), "MODS.xml", DEFAULT_SET_SIZE).unwrap();
        assert_eq!(summary, BatchSummary { packages: 0, sets: Vec::new() });
    }

    #[test]
    fn test_zero_set_size_is_rejected() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(split_into_sets(dir.path(), "MODS.xml", 0), Err(BatchError::InvalidSetSize)));
    }
}
