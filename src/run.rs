//! Run driver: record keys in, packages out.

use tracing::{info, instrument, warn};

use crate::catalog::{CatalogSource, CompoundDescriptor, ItemLookup};
use crate::config::{ConfigError, FileConfig};
use crate::filegetter::{LocalFileGetter, file_getter_registry};
use crate::metadata::{MetadataParser, metadata_parser_registry};
use crate::package::{PackageError, PackageReport, PackageWriter, Record, WriterProfile, writer_registry};

/// Components selected by the config file's `class` values.
pub struct Components {
    /// Package layout.
    pub profile: WriterProfile,
    /// Local master files.
    pub files: Box<dyn LocalFileGetter>,
    /// Metadata renderer.
    pub metadata: Box<dyn MetadataParser>,
}

impl Components {
    /// Looks up and constructs every configured component.
    ///
    /// File getters index their input directories here.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Component`] for an unregistered class.
    pub fn from_config(config: &FileConfig) -> Result<Self, ConfigError> {
        let profile = *writer_registry()
            .get(&config.writer.class)
            .map_err(|e| ConfigError::component("writer.class", e))?;

        let getters = file_getter_registry();
        let build_files = getters
            .get(&config.file_getter.class)
            .map_err(|e| ConfigError::component("file_getter.class", e))?;
        let files = build_files(&config.file_getter_settings());

        let parsers = metadata_parser_registry();
        let build_metadata = parsers
            .get(&config.metadata_parser.class)
            .map_err(|e| ConfigError::component("metadata_parser.class", e))?;
        let metadata = build_metadata(&config.metadata_parser_settings());

        Ok(Self {
            profile,
            files,
            metadata,
        })
    }
}

/// Totals for a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Records whose package was written.
    pub written: usize,
    /// Records the catalog does not know.
    pub not_found: usize,
    /// Records skipped because their metadata could not be rendered.
    pub skipped: usize,
    /// One report per written record.
    pub reports: Vec<PackageReport>,
}

/// Writes a package for every record key, in order.
///
/// `on_record` is called with each key once it has been handled.
///
/// # Errors
///
/// Returns the first fatal [`PackageError`]; packages written before it stay
/// on disk.
#[instrument(skip_all)]
pub async fn write_records<I, S>(
    writer: &mut PackageWriter<'_>,
    catalog: &dyn CatalogSource,
    metadata: &dyn MetadataParser,
    record_keys: I,
    mut on_record: impl FnMut(&str),
) -> Result<RunSummary, PackageError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut summary = RunSummary::default();

    for key in record_keys {
        let record_key = key.as_ref().trim();
        if record_key.is_empty() {
            continue;
        }

        let info = match catalog.fetch_item_info(record_key).await {
            Ok(ItemLookup::Found(info)) => info,
            Ok(ItemLookup::NotFound) => {
                warn!(record_key, "record not found in catalog; skipping");
                summary.not_found += 1;
                on_record(record_key);
                continue;
            }
            Err(source) => {
                return Err(PackageError::RecordInfo {
                    record_key: record_key.to_string(),
                    source,
                });
            }
        };

        let markup = catalog
            .compound_descriptor(record_key)
            .await
            .map_err(|source| PackageError::Descriptor {
                record_key: record_key.to_string(),
                source,
            })?;
        let descriptor = CompoundDescriptor::parse(&markup).map_err(|source| PackageError::MalformedDescriptor {
            record_key: record_key.to_string(),
            source,
        })?;

        let record_metadata = match metadata.record_markup(record_key, &info) {
            Ok(markup) => markup,
            Err(error) => {
                warn!(record_key, error = %error, "cannot render record metadata; skipping");
                summary.skipped += 1;
                on_record(record_key);
                continue;
            }
        };

        let record = Record {
            record_key: record_key.to_string(),
            metadata: record_metadata,
            pages: descriptor.pointers(),
            titles: descriptor.title_map(),
        };
        let report = writer.write_record(&record).await?;
        info!(record_key, dir = %report.directory.display(), pages = report.pages.len(), "package written");
        summary.written += 1;
        summary.reports.push(report);
        on_record(record_key);
    }

    Ok(summary)
}
