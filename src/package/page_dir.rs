//! Page subdirectory naming.
//!
//! Precedence: serial numbering when configured, then the trailing digits of
//! the local master filename, then the trailing digits of the page title from
//! the compound descriptor.

use std::collections::HashMap;
use std::path::Path;

use tracing::warn;

use super::PackageError;

/// How page directories are numbered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PageNumbering {
    /// Directory name is the 1-based page index.
    Serial,
    /// Directory name comes from the master filename or the page title.
    #[default]
    Derived,
}

/// Everything the namer needs to know about one page.
#[derive(Debug, Clone, Copy)]
pub struct PageNameRequest<'a> {
    /// 1-based position of the page in catalog order.
    pub index: usize,
    /// Local master file for this page, when one exists.
    pub local_path: Option<&'a Path>,
    /// Key into `titles`: the page's `dmrecord`, else its pointer.
    pub page_key: &'a str,
    /// Page pointer to page title, from the compound descriptor.
    pub titles: &'a HashMap<String, String>,
    /// Name resolved for the previous page, if any.
    pub previous: Option<&'a str>,
}

/// Returns the longest run of ASCII digits at the end of `value`.
#[must_use]
pub fn trailing_digits(value: &str) -> Option<&str> {
    let start = value
        .char_indices()
        .rev()
        .take_while(|(_, c)| c.is_ascii_digit())
        .last()
        .map(|(index, _)| index)?;
    Some(&value[start..])
}

/// Strips zero padding; an all-zero string becomes `0`.
#[must_use]
pub fn strip_leading_zeros(value: &str) -> String {
    let stripped = value.trim_start_matches('0');
    if stripped.is_empty() && !value.is_empty() {
        "0".to_string()
    } else {
        stripped.to_string()
    }
}

/// Computes the directory name of one page.
///
/// # Errors
///
/// Returns [`PackageError::PageNumberMissing`] when the local master filename
/// has no trailing digits.
pub fn page_directory_name(numbering: PageNumbering, request: &PageNameRequest<'_>) -> Result<String, PackageError> {
    if numbering == PageNumbering::Serial {
        return Ok(request.index.to_string());
    }

    if let Some(path) = request.local_path {
        let stem = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();
        let digits = trailing_digits(&stem).ok_or_else(|| PackageError::page_number_missing(stem.clone()))?;
        return Ok(strip_leading_zeros(digits));
    }

    let title = request.titles.get(request.page_key).map(String::as_str);
    match title.and_then(trailing_digits) {
        Some(digits) => Ok(strip_leading_zeros(digits)),
        None => {
            warn!(
                page_key = request.page_key,
                title = title.unwrap_or(""),
                previous_page = request.previous.unwrap_or("none"),
                "page title has no page number; using 0"
            );
            Ok("0".to_string())
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn titles() -> HashMap<String, String> {
        HashMap::from([
            ("101".to_string(), "Page 1".to_string()),
            ("102".to_string(), "Page 012".to_string()),
            ("103".to_string(), "Front cover".to_string()),
        ])
    }

    fn request<'a>(
        index: usize,
        local_path: Option<&'a Path>,
        page_key: &'a str,
        titles: &'a HashMap<String, String>,
    ) -> PageNameRequest<'a> {
        PageNameRequest {
            index,
            local_path,
            page_key,
            titles,
            previous: None,
        }
    }

    #[test]
    fn test_trailing_digits() {
        assert_eq!(trailing_digits("issue-001"), Some("001"));
        assert_eq!(trailing_digits("1988-07-13-12"), Some("12"));
        assert_eq!(trailing_digits("42"), Some("42"));
        assert_eq!(trailing_digits("cover"), None);
        assert_eq!(trailing_digits("page-1a"), None);
        assert_eq!(trailing_digits(""), None);
    }

    #[test]
    fn test_strip_leading_zeros() {
        assert_eq!(strip_leading_zeros("001"), "1");
        assert_eq!(strip_leading_zeros("010"), "10");
        assert_eq!(strip_leading_zeros("000"), "0");
        assert_eq!(strip_leading_zeros("7"), "7");
    }

    #[test]
    fn test_serial_numbering_ignores_other_sources() {
        let titles = titles();
        let path = Path::new("/m/1988-07-13-009.tiff");
        let name = page_directory_name(PageNumbering::Serial, &request(3, Some(path), "101", &titles)).unwrap();
        assert_eq!(name, "3");
    }

    #[test]
    fn test_filename_numbering_strips_zeros() {
        let titles = titles();
        let path = Path::new("/m/issue-001.tiff");
        let name = page_directory_name(PageNumbering::Derived, &request(5, Some(path), "102", &titles)).unwrap();
        assert_eq!(name, "1");
    }

    #[test]
    fn test_filename_without_digits_is_fatal() {
        let titles = titles();
        let path = Path::new("/m/frontcover.tiff");
        let err = page_directory_name(PageNumbering::Derived, &request(1, Some(path), "101", &titles)).unwrap_err();
        assert!(matches!(err, PackageError::PageNumberMissing { ref filename } if filename == "frontcover"));
    }

    #[test]
    fn test_metadata_numbering_uses_title_digits() {
        let titles = titles();
        let name = page_directory_name(PageNumbering::Derived, &request(2, None, "102", &titles)).unwrap();
        assert_eq!(name, "12");
    }

    #[test]
    fn test_metadata_numbering_without_digits_falls_back_to_zero() {
        let titles = titles();
        let mut req = request(4, None, "103", &titles);
        req.previous = Some("3");
        assert_eq!(page_directory_name(PageNumbering::Derived, &req).unwrap(), "0");
        assert_eq!(
            page_directory_name(PageNumbering::Derived, &request(4, None, "999", &titles)).unwrap(),
            "0"
        );
    }
}
