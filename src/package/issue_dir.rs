//! Top-level directory naming and collision handling.

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use super::PackageError;
use super::date::{UNKNOWN_ISSUE_DATE, normalize_issue_date};
use crate::metadata::xml::element_texts;

/// Date element looked up when none is configured.
pub const DEFAULT_ISSUE_DATE_ELEMENT: &str = "dateIssued";

/// Picks the issue date text out of record metadata.
///
/// One matching element: its text. Several: the first carrying
/// `keyDate="yes"`. Otherwise `None`.
#[must_use]
pub fn extract_issue_date(metadata: &str, date_element: &str) -> Option<String> {
    let matches = match element_texts(metadata, date_element) {
        Ok(matches) => matches,
        Err(error) => {
            warn!(error = %error, "record metadata unreadable; issue date unknown");
            return None;
        }
    };
    match matches.as_slice() {
        [] => None,
        [only] => Some(only.text.clone()),
        several => several
            .iter()
            .find(|element| element.attribute("keyDate") == Some("yes"))
            .map(|element| element.text.clone()),
    }
}

/// Directory name for an issue: its normalized date, or `0000-00-00`.
#[must_use]
pub fn issue_directory_name(metadata: &str, date_element: &str) -> String {
    extract_issue_date(metadata, date_element).map_or_else(
        || UNKNOWN_ISSUE_DATE.to_string(),
        |raw| normalize_issue_date(&raw),
    )
}

/// Creates record directories, suffixing names already taken.
///
/// The next suffix for each base path is remembered for the whole run, so a
/// suffix is never handed out twice even when an earlier directory has since
/// been removed.
#[derive(Debug, Default)]
pub struct IssueDirectoryResolver {
    next_suffix: HashMap<PathBuf, u32>,
}

impl IssueDirectoryResolver {
    /// Creates a resolver with no history.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates `parent/name`, or `parent/name.N` for the lowest unused `N`.
    ///
    /// # Errors
    ///
    /// Returns [`PackageError::CreateDirectory`] when creation fails for a
    /// reason other than the directory already existing.
    pub fn create(&mut self, parent: &Path, name: &str, record_key: &str) -> Result<PathBuf, PackageError> {
        fs::create_dir_all(parent).map_err(|e| PackageError::create_directory(parent, e))?;

        let base = parent.join(name);
        let mut suffix = self.next_suffix.get(&base).copied().unwrap_or(0);
        if suffix > 0 {
            info!(record_key, dir = %base.display(), "directory name already used this run; adding suffix");
        }

        loop {
            let candidate = if suffix == 0 {
                base.clone()
            } else {
                parent.join(format!("{name}.{suffix}"))
            };
            match fs::create_dir(&candidate) {
                Ok(()) => {
                    debug!(record_key, dir = %candidate.display(), "created record directory");
                    self.next_suffix.insert(base, suffix + 1);
                    return Ok(candidate);
                }
                Err(error) if error.kind() == ErrorKind::AlreadyExists => {
                    info!(record_key, dir = %candidate.display(), "directory exists; adding suffix");
                    suffix += 1;
                }
                Err(error) => return Err(PackageError::create_directory(candidate, error)),
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_extract_single_date() {
        let mods = "<mods><originInfo><dateIssued>July 13, 1988</dateIssued></originInfo></mods>";
        assert_eq!(extract_issue_date(mods, "dateIssued").as_deref(), Some("July 13, 1988"));
        assert_eq!(issue_directory_name(mods, "dateIssued"), "1988-07-13");
    }

    #[test]
    fn test_extract_prefers_key_date_among_several() {
        let mods = r#"<mods:mods xmlns:mods="http://www.loc.gov/mods/v3">
            <mods:dateIssued>1988</mods:dateIssued>
            <mods:dateIssued keyDate="yes">1988-07-13</mods:dateIssued>
            <mods:dateIssued keyDate="yes">1988-07-14</mods:dateIssued>
        </mods:mods>"#;
        assert_eq!(extract_issue_date(mods, "dateIssued").as_deref(), Some("1988-07-13"));
    }

    #[test]
    fn test_several_dates_without_key_date_use_sentinel() {
        let mods = "<mods><dateIssued>1988</dateIssued><dateIssued>1989</dateIssued></mods>";
        assert_eq!(extract_issue_date(mods, "dateIssued"), None);
        assert_eq!(issue_directory_name(mods, "dateIssued"), UNKNOWN_ISSUE_DATE);
    }

    #[test]
    fn test_missing_date_uses_sentinel() {
        assert_eq!(issue_directory_name("<mods><title>x</title></mods>", "dateIssued"), "0000-00-00");
        assert_eq!(issue_directory_name("not markup <", "dateIssued"), "0000-00-00");
    }

    #[test]
    fn test_configured_date_element() {
        let mods = "<mods><dateCreated>1901-02-03</dateCreated></mods>";
        assert_eq!(issue_directory_name(mods, "dateCreated"), "1901-02-03");
    }

    #[test]
    fn test_collisions_get_increasing_suffixes() {
        let dir = TempDir::new().unwrap();
        let mut resolver = IssueDirectoryResolver::new();

        let first = resolver.create(dir.path(), "1988-07-13", "100").unwrap();
        let second = resolver.create(dir.path(), "1988-07-13", "200").unwrap();
        let third = resolver.create(dir.path(), "1988-07-13", "300").unwrap();

        assert_eq!(first, dir.path().join("1988-07-13"));
        assert_eq!(second, dir.path().join("1988-07-13.1"));
        assert_eq!(third, dir.path().join("1988-07-13.2"));
        assert!(third.is_dir());
    }

    #[test]
    fn test_removed_directory_suffix_is_not_reused() {
        let dir = TempDir::new().unwrap();
        let mut resolver = IssueDirectoryResolver::new();

        resolver.create(dir.path(), "1988-07-13", "100").unwrap();
        let second = resolver.create(dir.path(), "1988-07-13", "200").unwrap();
        std::fs::remove_dir(&second).unwrap();

        let third = resolver.create(dir.path(), "1988-07-13", "300").unwrap();
        assert_eq!(third, dir.path().join("1988-07-13.2"));
    }

    #[test]
    fn test_preexisting_directory_is_never_reused() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("4521")).unwrap();
        std::fs::write(dir.path().join("4521").join("MODS.xml"), b"<mods/>").unwrap();

        let created = IssueDirectoryResolver::new().create(dir.path(), "4521", "4521").unwrap();
        assert_eq!(created, dir.path().join("4521.1"));
        assert!(dir.path().join("4521").join("MODS.xml").exists());
    }

    #[test]
    fn test_creates_missing_output_root() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("out").join("nested");
        let created = IssueDirectoryResolver::new().create(&root, "1988-07-13", "100").unwrap();
        assert!(created.is_dir());
    }
}
