//! Local master-file discovery.
//!
//! A [`LocalFileGetter`] knows where the master images of a record live on
//! local storage and how a master filename relates to its page. Getters index
//! their input directories once at construction.

mod books;
mod newspapers;

use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use walkdir::WalkDir;

pub use books::CdmBooksFiles;
pub use newspapers::CdmNewspapersFiles;

use crate::registry::ComponentRegistry;

/// Extensions indexed when none are configured.
pub const DEFAULT_ALLOWED_EXTENSIONS: [&str; 2] = ["tiff", "tif"];

/// Settings shared by the file getters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileGetterSettings {
    /// Directories searched recursively for master files.
    pub input_directories: Vec<PathBuf>,
    /// Extensions (without dot, case-insensitive) that count as master files.
    pub allowed_extensions: Vec<String>,
}

/// Source of local master files.
pub trait LocalFileGetter: Send + Sync {
    /// Master files for `key`, sorted.
    fn local_obj_files(&self, key: &str) -> Vec<PathBuf>;

    /// Whether `path` is an acceptable master file for page `page_number`.
    fn check_page_file_path(&self, path: &Path, page_number: &str) -> bool;
}

/// Getter for runs where every file comes from the catalog.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoLocalFiles;

impl NoLocalFiles {
    /// Registry constructor.
    #[must_use]
    pub fn boxed(_settings: &FileGetterSettings) -> Box<dyn LocalFileGetter> {
        Box::new(Self)
    }
}

impl LocalFileGetter for NoLocalFiles {
    fn local_obj_files(&self, _key: &str) -> Vec<PathBuf> {
        Vec::new()
    }

    fn check_page_file_path(&self, _path: &Path, _page_number: &str) -> bool {
        false
    }
}

/// Constructor stored in the file getter registry.
pub type FileGetterConstructor = fn(&FileGetterSettings) -> Box<dyn LocalFileGetter>;

/// Registry of file getters keyed by configuration class.
#[must_use]
pub fn file_getter_registry() -> ComponentRegistry<FileGetterConstructor> {
    ComponentRegistry::<FileGetterConstructor>::new("file getter")
        .with("CdmNewspapers", CdmNewspapersFiles::boxed)
        .with("CdmBooks", CdmBooksFiles::boxed)
        .with("None", NoLocalFiles::boxed)
}

/// Walks the input directories for files with an allowed extension.
///
/// Unreadable entries are logged and skipped.
fn collect_master_files(settings: &FileGetterSettings) -> Vec<PathBuf> {
    let allowed: Vec<String> = if settings.allowed_extensions.is_empty() {
        DEFAULT_ALLOWED_EXTENSIONS.iter().map(ToString::to_string).collect()
    } else {
        settings
            .allowed_extensions
            .iter()
            .map(|ext| ext.trim_start_matches('.').to_ascii_lowercase())
            .collect()
    };

    let mut files = Vec::new();
    for directory in &settings.input_directories {
        for entry in WalkDir::new(directory).follow_links(true) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(error) => {
                    warn!(dir = %directory.display(), error = %error, "skipping unreadable input entry");
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            let matches = entry
                .path()
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| allowed.iter().any(|allowed| allowed.eq_ignore_ascii_case(ext)));
            if matches {
                files.push(entry.into_path());
            }
        }
    }
    debug!(count = files.len(), "indexed local master files");
    files
}
