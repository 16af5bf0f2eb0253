//! Error types for configuration loading and validation.

use std::path::PathBuf;

use thiserror::Error;

use crate::registry::UnknownComponent;

/// Errors raised while loading or validating the config file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("cannot read config file {path}: {source}\n  Suggestion: pass the config path with --config")]
    Read {
        /// The config file path.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The config file is not valid TOML for the expected layout.
    #[error("cannot parse config {origin}: {source}")]
    Parse {
        /// Where the config came from.
        origin: String,
        /// The underlying TOML error.
        #[source]
        source: toml::de::Error,
    },

    /// A value is out of range or malformed.
    #[error("Invalid config value for `{field}`: {reason}")]
    Invalid {
        /// Dotted key of the offending value, e.g. `catalog.http_timeout_secs`.
        field: String,
        /// What is wrong with it.
        reason: String,
    },

    /// A `class` value names no registered component.
    #[error("Invalid config value for `{field}`: {source}")]
    Component {
        /// Dotted key of the class value.
        field: String,
        /// The registry lookup failure.
        #[source]
        source: UnknownComponent,
    },
}

impl ConfigError {
    /// Creates a `Read` error.
    pub fn read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Read {
            path: path.into(),
            source,
        }
    }

    /// Creates a `Parse` error.
    pub fn parse(origin: impl Into<String>, source: toml::de::Error) -> Self {
        Self::Parse {
            origin: origin.into(),
            source,
        }
    }

    /// Creates an `Invalid` error.
    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Creates a `Component` error.
    pub fn component(field: impl Into<String>, source: UnknownComponent) -> Self {
        Self::Component {
            field: field.into(),
            source,
        }
    }
}
