//! Configuration file loading and validation.
//!
//! A run is configured by one TOML file:
//!
//! ```toml
//! [writer]
//! class = "CdmNewspapers"
//! output_directory = "/tmp/packages"
//!
//! [catalog]
//! ws_url = "https://server.example.org:81/dmwebservices/index.php?q="
//! utils_url = "https://cdm.example.org/utils/"
//! alias = "nwp"
//!
//! [file_getter]
//! class = "CdmNewspapers"
//! input_directories = ["/mnt/masters"]
//! ```
//!
//! Unknown keys are rejected. [`FileConfig::validate`] checks ranges and
//! component classes so a bad config fails before any network traffic.

mod error;

use std::path::{Path, PathBuf};

use serde::Deserialize;
use url::Url;

pub use error::ConfigError;

use crate::catalog::{CdmClientConfig, DEFAULT_HTTP_TIMEOUT_SECS, FieldNicknames};
use crate::filegetter::{FileGetterSettings, file_getter_registry};
use crate::metadata::{MetadataParserSettings, metadata_parser_registry};
use crate::package::{
    DEFAULT_ISSUE_DATE_ELEMENT, DEFAULT_METADATA_FILENAME, DEFAULT_OBJ_EXTENSION, DatastreamSelection, ObjSettings,
    PageNumbering, WriterSettings, writer_registry,
};

/// Config path used when `--config` is not given.
pub const DEFAULT_CONFIG_FILENAME: &str = "cdm-packager.toml";

const LOG_LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];

/// The whole config file.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    /// `[writer]` section.
    pub writer: WriterSection,
    /// `[catalog]` section.
    pub catalog: CatalogSection,
    /// `[file_getter]` section.
    #[serde(default)]
    pub file_getter: FileGetterSection,
    /// `[metadata_parser]` section.
    #[serde(default)]
    pub metadata_parser: MetadataParserSection,
    /// `[logging]` section.
    #[serde(default)]
    pub logging: LoggingSection,
}

/// `[writer]`: package layout.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WriterSection {
    /// Writer registry key.
    pub class: String,
    /// Root of the written packages.
    pub output_directory: PathBuf,
    /// Metadata filename in every package directory.
    #[serde(default = "default_metadata_filename")]
    pub metadata_filename: String,
    /// Requested datastreams; empty means all.
    #[serde(default)]
    pub datastreams: Vec<String>,
    /// Number pages by position instead of filename or title.
    #[serde(default)]
    pub serial_page_numbering: bool,
    /// Local name of the metadata element carrying the issue date.
    #[serde(default = "default_issue_date_field")]
    pub issue_date_field: String,
    /// Extension of OBJ files copied from local masters.
    #[serde(default = "default_obj_file_extension")]
    pub obj_file_extension: String,
    /// Never derive OBJ from JP2, JPEG or a catalog download.
    #[serde(default)]
    pub skip_obj: bool,
    /// OCR field nickname tried before `full` and `fullte`.
    #[serde(default)]
    pub ocr_nickname: Option<String>,
    /// Metadata elements whose text becomes output subdirectories.
    #[serde(default)]
    pub output_subdirectory_fields: Vec<String>,
}

/// `[catalog]`: CONTENTdm connection.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CatalogSection {
    /// Web services base URL.
    pub ws_url: String,
    /// Utils base URL.
    pub utils_url: String,
    /// Collection alias.
    pub alias: String,
    /// Connect and request timeout in seconds.
    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: u64,
    /// Verify server TLS certificates. Turn off only for self-signed test servers.
    #[serde(default = "default_verify_tls")]
    pub verify_tls: bool,
    /// Directory for downloaded remote objects.
    #[serde(default)]
    pub temp_directory: Option<PathBuf>,
    /// Nickname of the title field.
    #[serde(default = "default_title_field")]
    pub title_field: String,
    /// Nickname of the date field.
    #[serde(default = "default_date_field")]
    pub date_field: String,
}

/// `[file_getter]`: local master files.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileGetterSection {
    /// File getter registry key.
    #[serde(default = "default_file_getter_class")]
    pub class: String,
    /// Directories searched for masters.
    #[serde(default)]
    pub input_directories: Vec<PathBuf>,
    /// Master file extensions.
    #[serde(default)]
    pub allowed_extensions: Vec<String>,
}

impl Default for FileGetterSection {
    fn default() -> Self {
        Self {
            class: default_file_getter_class(),
            input_directories: Vec::new(),
            allowed_extensions: Vec::new(),
        }
    }
}

/// `[metadata_parser]`: metadata rendering.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MetadataParserSection {
    /// Metadata parser registry key.
    #[serde(default = "default_metadata_parser_class")]
    pub class: String,
    /// Public catalog URL for "migrated from" identifiers.
    #[serde(default)]
    pub migrated_from_base_url: Option<String>,
}

impl Default for MetadataParserSection {
    fn default() -> Self {
        Self {
            class: default_metadata_parser_class(),
            migrated_from_base_url: None,
        }
    }
}

/// `[logging]`: log verbosity and destination.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingSection {
    /// Default level when neither `RUST_LOG` nor `-v`/`-q` apply.
    #[serde(default)]
    pub level: Option<String>,
    /// Append logs to this file instead of stderr.
    #[serde(default)]
    pub path_to_log: Option<PathBuf>,
}

fn default_metadata_filename() -> String {
    DEFAULT_METADATA_FILENAME.to_string()
}

fn default_issue_date_field() -> String {
    DEFAULT_ISSUE_DATE_ELEMENT.to_string()
}

fn default_obj_file_extension() -> String {
    DEFAULT_OBJ_EXTENSION.to_string()
}

fn default_http_timeout_secs() -> u64 {
    DEFAULT_HTTP_TIMEOUT_SECS
}

fn default_verify_tls() -> bool {
    true
}

fn default_title_field() -> String {
    "title".to_string()
}

fn default_date_field() -> String {
    "date".to_string()
}

fn default_file_getter_class() -> String {
    "None".to_string()
}

fn default_metadata_parser_class() -> String {
    "CdmToMods".to_string()
}

impl FileConfig {
    /// Reads, parses and validates a config file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the file is unreadable, malformed or invalid.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|e| ConfigError::read(path, e))?;
        let config: Self =
            toml::from_str(&raw).map_err(|e| ConfigError::parse(path.display().to_string(), e))?;
        config.validate()?;
        Ok(config)
    }

    /// Parses and validates config text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the text is malformed or invalid.
    pub fn parse_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(raw).map_err(|e| ConfigError::parse("<inline>", e))?;
        config.validate()?;
        Ok(config)
    }

    /// Checks ranges, URLs and component classes.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        writer_registry()
            .get(&self.writer.class)
            .map_err(|e| ConfigError::component("writer.class", e))?;
        file_getter_registry()
            .get(&self.file_getter.class)
            .map_err(|e| ConfigError::component("file_getter.class", e))?;
        metadata_parser_registry()
            .get(&self.metadata_parser.class)
            .map_err(|e| ConfigError::component("metadata_parser.class", e))?;

        DatastreamSelection::parse(&self.writer.datastreams)
            .map_err(|e| ConfigError::invalid("writer.datastreams", e.to_string()))?;

        if self.writer.output_directory.as_os_str().is_empty() {
            return Err(ConfigError::invalid("writer.output_directory", "must not be empty"));
        }
        validate_file_name("writer.metadata_filename", &self.writer.metadata_filename)?;
        validate_extension("writer.obj_file_extension", &self.writer.obj_file_extension)?;
        if self.writer.issue_date_field.trim().is_empty() {
            return Err(ConfigError::invalid("writer.issue_date_field", "must not be empty"));
        }

        validate_url("catalog.ws_url", &self.catalog.ws_url)?;
        validate_url("catalog.utils_url", &self.catalog.utils_url)?;
        if self.catalog.alias.trim_matches('/').trim().is_empty() {
            return Err(ConfigError::invalid("catalog.alias", "must not be empty"));
        }
        let timeout = self.catalog.http_timeout_secs;
        if !(1..=3600).contains(&timeout) {
            return Err(ConfigError::invalid(
                "catalog.http_timeout_secs",
                format!("{timeout}. Expected range: 1..=3600"),
            ));
        }

        if let Some(base) = &self.metadata_parser.migrated_from_base_url {
            validate_url("metadata_parser.migrated_from_base_url", base)?;
        }

        if let Some(level) = &self.logging.level
            && !LOG_LEVELS.contains(&level.to_ascii_lowercase().as_str())
        {
            return Err(ConfigError::invalid(
                "logging.level",
                format!("{level}. Expected one of: {}", LOG_LEVELS.join(", ")),
            ));
        }

        Ok(())
    }

    /// Requested datastreams.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] for an unknown datastream name.
    pub fn datastreams(&self) -> Result<DatastreamSelection, ConfigError> {
        DatastreamSelection::parse(&self.writer.datastreams)
            .map_err(|e| ConfigError::invalid("writer.datastreams", e.to_string()))
    }

    /// Writer settings.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] for an unknown datastream name.
    pub fn writer_settings(&self) -> Result<WriterSettings, ConfigError> {
        let writer = &self.writer;
        Ok(WriterSettings {
            output_directory: writer.output_directory.clone(),
            datastreams: self.datastreams()?,
            numbering: if writer.serial_page_numbering {
                PageNumbering::Serial
            } else {
                PageNumbering::Derived
            },
            issue_date_element: writer.issue_date_field.clone(),
            obj: ObjSettings {
                extension: writer.obj_file_extension.trim_start_matches('.').to_string(),
                skip_obj: writer.skip_obj,
            },
            output_subdirectory_fields: writer.output_subdirectory_fields.clone(),
            metadata_filename: writer.metadata_filename.clone(),
        })
    }

    /// Catalog client settings.
    #[must_use]
    pub fn client_config(&self) -> CdmClientConfig {
        let catalog = &self.catalog;
        let mut nicknames = FieldNicknames {
            title: catalog.title_field.clone(),
            date: catalog.date_field.clone(),
            ..FieldNicknames::default()
        };
        if let Some(ocr) = self.writer.ocr_nickname.as_deref().filter(|n| !n.trim().is_empty()) {
            nicknames = nicknames.with_preferred_ocr(ocr.trim());
        }
        let mut config = CdmClientConfig::new(&catalog.ws_url, &catalog.utils_url, &catalog.alias);
        config.timeout_secs = catalog.http_timeout_secs;
        config.verify_tls = catalog.verify_tls;
        if let Some(temp) = &catalog.temp_directory {
            config.temp_directory.clone_from(temp);
        }
        config.nicknames = nicknames;
        config
    }

    /// File getter settings.
    #[must_use]
    pub fn file_getter_settings(&self) -> FileGetterSettings {
        FileGetterSettings {
            input_directories: self.file_getter.input_directories.clone(),
            allowed_extensions: self.file_getter.allowed_extensions.clone(),
        }
    }

    /// Metadata parser settings.
    #[must_use]
    pub fn metadata_parser_settings(&self) -> MetadataParserSettings {
        MetadataParserSettings {
            alias: self.catalog.alias.clone(),
            migrated_from_base_url: self.metadata_parser.migrated_from_base_url.clone(),
        }
    }
}

fn validate_url(field: &str, value: &str) -> Result<(), ConfigError> {
    let parsed = Url::parse(value).map_err(|e| ConfigError::invalid(field, format!("{value}: {e}")))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ConfigError::invalid(field, format!("{value}. Expected an http or https URL")));
    }
    Ok(())
}

fn validate_file_name(field: &str, value: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() || value.contains(['/', '\\']) || value == "." || value == ".." {
        return Err(ConfigError::invalid(field, format!("'{value}'. Expected a bare file name")));
    }
    Ok(())
}

fn validate_extension(field: &str, value: &str) -> Result<(), ConfigError> {
    let extension = value.trim_start_matches('.');
    if extension.is_empty() || !extension.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(ConfigError::invalid(field, format!("'{value}'. Expected letters and digits only")));
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
[writer]
class = "CdmNewspapers"
output_directory = "/tmp/packages"

[catalog]
ws_url = "https://server.example.org:81/dmwebservices/index.php?q="
utils_url = "https://cdm.example.org/utils/"
alias = "/nwp"
"#;

    fn with(extra: &str) -> String {
        format!("{MINIMAL}\n{extra}")
    }

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config = FileConfig::parse_str(MINIMAL).unwrap();
        assert_eq!(config.writer.metadata_filename, "MODS.xml");
        assert_eq!(config.writer.issue_date_field, "dateIssued");
        assert_eq!(config.writer.obj_file_extension, "tiff");
        assert_eq!(config.catalog.http_timeout_secs, 60);
        assert_eq!(config.file_getter.class, "None");
        assert_eq!(config.metadata_parser.class, "CdmToMods");
        assert!(config.datastreams().unwrap().is_unrestricted());
    }

    #[test]
    fn test_unknown_key_is_rejected() {
        let err = FileConfig::parse_str(&MINIMAL.replace("alias = \"/nwp\"", "alias = \"/nwp\"\nalais = \"x\"")).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }), "got: {err}");
    }

    #[test]
    fn test_unknown_writer_class_is_rejected() {
        let err = FileConfig::parse_str(&MINIMAL.replace("CdmNewspapers", "CdmPostcards")).unwrap_err();
        assert!(matches!(err, ConfigError::Component { ref field, .. } if field == "writer.class"));
        assert!(err.to_string().contains("CdmPostcards"));
    }

    #[test]
    fn test_unknown_file_getter_class_is_rejected() {
        let err = FileConfig::parse_str(&with("[file_getter]\nclass = \"Sftp\"")).unwrap_err();
        assert!(matches!(err, ConfigError::Component { ref field, .. } if field == "file_getter.class"));
    }

    #[test]
    fn test_unknown_datastream_is_rejected() {
        let config = MINIMAL.replace(
            "output_directory = \"/tmp/packages\"",
            "output_directory = \"/tmp/packages\"\ndatastreams = [\"OBJ\", \"PDF\"]",
        );
        let err = FileConfig::parse_str(&config).unwrap_err();
        assert!(err.to_string().contains("PDF"), "got: {err}");
    }

    #[test]
    fn test_timeout_range() {
        let config = with("").replace("alias = \"/nwp\"", "alias = \"/nwp\"\nhttp_timeout_secs = 0");
        let err = FileConfig::parse_str(&config).unwrap_err();
        assert!(err.to_string().contains("catalog.http_timeout_secs"), "got: {err}");
    }

    #[test]
    fn test_invalid_url_is_rejected() {
        let err = FileConfig::parse_str(&MINIMAL.replace("https://cdm.example.org/utils/", "cdm.example.org")).unwrap_err();
        assert!(err.to_string().contains("catalog.utils_url"), "got: {err}");
    }

    #[test]
    fn test_log_level_is_checked() {
        assert!(FileConfig::parse_str(&with("[logging]\nlevel = \"DEBUG\"")).is_ok());
        assert!(FileConfig::parse_str(&with("[logging]\nlevel = \"loud\"")).is_err());
    }

    #[test]
    fn test_metadata_filename_must_be_bare() {
        let config = MINIMAL.replace(
            "output_directory = \"/tmp/packages\"",
            "output_directory = \"/tmp/packages\"\nmetadata_filename = \"../MODS.xml\"",
        );
        assert!(FileConfig::parse_str(&config).is_err());
    }

    #[test]
    fn test_writer_settings_conversion() {
        let config = MINIMAL.replace(
            "output_directory = \"/tmp/packages\"",
            "output_directory = \"/tmp/packages\"\ndatastreams = [\"obj\", \"MODS\"]\nserial_page_numbering = true\nobj_file_extension = \".tif\"\nskip_obj = true",
        );
        let settings = FileConfig::parse_str(&config).unwrap().writer_settings().unwrap();
        assert_eq!(settings.numbering, PageNumbering::Serial);
        assert_eq!(settings.obj.extension, "tif");
        assert!(settings.obj.skip_obj);
        assert!(!settings.datastreams.is_unrestricted());
    }

    #[test]
    fn test_client_config_prefers_configured_ocr_nickname() {
        let config = MINIMAL.replace(
            "output_directory = \"/tmp/packages\"",
            "output_directory = \"/tmp/packages\"\nocr_nickname = \"transc\"",
        );
        let client = FileConfig::parse_str(&config).unwrap().client_config();
        assert_eq!(client.nicknames.ocr, vec!["transc", "full", "fullte"]);
        assert_eq!(client.alias, "/nwp");
        assert_eq!(client.timeout_secs, 60);
        assert!(client.verify_tls);
    }

    #[test]
    fn test_verify_tls_can_be_disabled() {
        let config = with("").replace("alias = \"/nwp\"", "alias = \"/nwp\"\nverify_tls = false");
        let config = FileConfig::parse_str(&config).unwrap();
        assert!(!config.catalog.verify_tls);
        assert!(!config.client_config().verify_tls);
    }

    #[test]
    fn test_load_reports_missing_file() {
        let err = FileConfig::load(Path::new("/nonexistent/cdm-packager.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
