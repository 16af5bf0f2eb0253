//! Newspaper master files, grouped by issue date.
//!
//! Masters are expected to carry the issue date somewhere in their path and
//! the page number at the end of the file stem, e.g.
//! `reel-12/1988-07-13/1988-07-13-002.tiff`.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;

use super::{FileGetterSettings, LocalFileGetter, collect_master_files};
use crate::package::{strip_leading_zeros, trailing_digits};

#[allow(clippy::expect_used)]
static ISSUE_DATE_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d{4}-\d{2}-\d{2}").expect("issue date pattern compiles"));

/// Newspaper master files keyed by `YYYY-MM-DD`.
#[derive(Debug, Clone, Default)]
pub struct CdmNewspapersFiles {
    by_date: HashMap<String, Vec<PathBuf>>,
}

impl CdmNewspapersFiles {
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

    /// Groups already-collected paths by the last date token in each path.
    #[must_use]
    pub fn from_paths(paths: impl IntoIterator<Item = PathBuf>) -> Self {
        let mut by_date: HashMap<String, Vec<PathBuf>> = HashMap::new();
        for path in paths {
            let Some(date) = issue_date_of(&path) else {
                continue;
            };
            by_date.entry(date).or_default().push(path);
        }
        for files in by_date.values_mut() {
            files.sort();
        }
        Self { by_date }
    }
}

fn issue_date_of(path: &Path) -> Option<String> {
    let text = path.to_string_lossy();
    ISSUE_DATE_TOKEN
        .find_iter(&text)
        .last()
        .map(|found| found.as_str().to_string())
}

impl LocalFileGetter for CdmNewspapersFiles {
    fn local_obj_files(&self, key: &str) -> Vec<PathBuf> {
        self.by_date.get(key).cloned().unwrap_or_default()
    }

    fn check_page_file_path(&self, path: &Path, page_number: &str) -> bool {
        let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) else {
            return false;
        };
        trailing_digits(stem).is_some_and(|digits| strip_leading_zeros(digits) == strip_leading_zeros(page_number))
    }
}
