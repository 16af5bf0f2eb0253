//! Book master files, grouped by record pointer.
//!
//! Books are staged one directory per record, named by the record's pointer:
//! `books/4521/0001.tiff`, `books/4521/0002.tiff`.

use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};

use super::{FileGetterSettings, LocalFileGetter, collect_master_files};

/// Book master files keyed by record pointer.
#[derive(Debug, Clone, Default)]
pub struct CdmBooksFiles {
    by_record: HashMap<String, Vec<PathBuf>>,
}

impl CdmBooksFiles {
    /// Registry constructor.
    #[must_use]
    pub fn boxed(settings: &FileGetterSettings) -> Box<dyn LocalFileGetter> {
        Box::new(Self::index(settings))
    }

    /// Indexes the configured input directories.
    #[must_use]
    pub fn index(settings: &FileGetterSettings) -> Self {
        Self::from_paths(collect_master_files(settings))
    }

    /// Groups already-collected paths by their nearest all-digit directory.
    #[must_use]
    pub fn from_paths(paths: impl IntoIterator<Item = PathBuf>) -> Self {
        let mut by_record: HashMap<String, Vec<PathBuf>> = HashMap::new();
        for path in paths {
            if let Some(record) = record_pointer_of(&path) {
                by_record.entry(record).or_default().push(path);
            }
        }
        for files in by_record.values_mut() {
            files.sort();
        }
        Self { by_record }
    }
}

fn record_pointer_of(path: &Path) -> Option<String> {
    path.parent()?
        .components()
        .rev()
        .filter_map(|component| match component {
            Component::Normal(segment) => segment.to_str(),
            _ => None,
        })
        .find(|segment| !segment.is_empty() && segment.chars().all(|c| c.is_ascii_digit()))
        .map(ToString::to_string)
}

impl LocalFileGetter for CdmBooksFiles {
    fn local_obj_files(&self, key: &str) -> Vec<PathBuf> {
        self.by_record.get(key).cloned().unwrap_or_default()
    }

    fn check_page_file_path(&self, path: &Path, _page_number: &str) -> bool {
        path.is_file()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_groups_by_nearest_numeric_directory() {
        let getter = CdmBooksFiles::from_paths([
            PathBuf::from("/staging/2019/4521/0002.tiff"),
            PathBuf::from("/staging/2019/4521/0001.tiff"),
            PathBuf::from("/staging/2019/4522/scans/0001.tiff"),
            PathBuf::from("/staging/loose/0001.tiff"),
        ]);
        assert_eq!(
            getter.local_obj_files("4521"),
            vec![
                PathBuf::from("/staging/2019/4521/0001.tiff"),
                PathBuf::from("/staging/2019/4521/0002.tiff"),
            ]
        );
        assert_eq!(getter.local_obj_files("4522").len(), 1);
        // The year directory is never the nearest numeric segment above.
        assert!(getter.local_obj_files("2019").is_empty());
    }

    #[test]
    fn test_file_name_digits_are_not_a_record_pointer() {
        assert_eq!(record_pointer_of(Path::new("/staging/1234.tiff")), None);
    }

    #[test]
    fn test_check_page_file_path_requires_existing_file() {
        let dir = TempDir::new().unwrap();
        let master = dir.path().join("0001.tiff");
        std::fs::write(&master, b"II*").unwrap();

        let getter = CdmBooksFiles::default();
        assert!(getter.check_page_file_path(&master, "7"));
        assert!(!getter.check_page_file_path(&dir.path().join("0002.tiff"), "2"));
        assert!(!getter.check_page_file_path(dir.path(), "1"));
    }
}
