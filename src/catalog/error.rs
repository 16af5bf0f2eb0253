//! Error types for the catalog module.
//!
//! Every variant carries the URL or path it concerns, so a logged
//! `CatalogError` is enough to reproduce the failing request by hand.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while talking to the remote catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Network-level error (DNS resolution, connection refused, TLS errors, etc.)
    #[error("network error requesting {url}: {source}")]
    Network {
        /// The URL that failed.
        url: String,
        /// The underlying network error.
        #[source]
        source: reqwest::Error,
    },

    /// Request timed out before completion.
    #[error("timeout requesting {url}")]
    Timeout {
        /// The URL that timed out.
        url: String,
    },

    /// The catalog answered with a non-success status.
    #[error("HTTP {status} requesting {url}")]
    HttpStatus {
        /// The URL that returned an error status.
        url: String,
        /// The HTTP status code.
        status: u16,
    },

    /// The response body could not be interpreted.
    #[error("invalid response from {url}: {reason}")]
    InvalidResponse {
        /// The URL whose response was rejected.
        url: String,
        /// What was wrong with it.
        reason: String,
    },

    /// File system error while storing a downloaded object.
    #[error("IO error writing to {path}: {source}")]
    Io {
        /// The file path where the error occurred.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client: {source}\n  Suggestion: check proxy environment variables")]
    ClientBuild {
        /// The underlying builder error.
        #[source]
        source: reqwest::Error,
    },
}

impl CatalogError {
    /// Creates a network error, promoting reqwest timeouts to [`CatalogError::Timeout`].
    pub fn network(url: impl Into<String>, source: reqwest::Error) -> Self {
        let url = url.into();
        if source.is_timeout() {
            Self::Timeout { url }
        } else {
            Self::Network { url, source }
        }
    }

    /// Creates a timeout error.
    pub fn timeout(url: impl Into<String>) -> Self {
        Self::Timeout { url: url.into() }
    }

    /// Creates an HTTP status error.
    pub fn http_status(url: impl Into<String>, status: u16) -> Self {
        Self::HttpStatus {
            url: url.into(),
            status,
        }
    }

    /// Creates an invalid-response error.
    pub fn invalid_response(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidResponse {
            url: url.into(),
            reason: reason.into(),
        }
    }

    /// Creates an IO error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_error_http_status_display() {
        let error = CatalogError::http_status("https://cdm.example.org/dmwebservices/x", 500);
        let msg = error.to_string();
        assert!(msg.contains("500"), "Expected '500' in: {msg}");
        assert!(msg.contains("https://cdm.example.org/dmwebservices/x"), "Expected URL in: {msg}");
    }

    #[test]
    fn test_catalog_error_timeout_display() {
        let error = CatalogError::timeout("https://cdm.example.org/utils/getfile");
        assert!(error.to_string().contains("timeout"));
    }

    #[test]
    fn test_catalog_error_invalid_response_display() {
        let error = CatalogError::invalid_response("https://cdm.example.org/a", "expected a JSON object");
        let msg = error.to_string();
        assert!(msg.contains("expected a JSON object"), "Expected reason in: {msg}");
    }

    #[test]
    fn test_catalog_error_io_display() {
        let io_error = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let error = CatalogError::io("/tmp/cdm/obj.tmp", io_error);
        assert!(error.to_string().contains("/tmp/cdm/obj.tmp"));
    }
}
