//! Package assembly for one record at a time.
//!
//! [`PackageWriter::write_record`] creates the record directory, writes the
//! record metadata, then walks the pages in catalog order. Each page gets a
//! numbered subdirectory and whichever datastreams are selected and
//! obtainable.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument, warn};

use super::datastream::{Datastream, DatastreamSelection};
use super::emitter::MetadataEmitter;
use super::issue_dir::{DEFAULT_ISSUE_DATE_ELEMENT, IssueDirectoryResolver, issue_directory_name};
use super::obj::{ObjOutcome, ObjRequest, ObjSettings, acquire_obj};
use super::page_dir::{PageNameRequest, PageNumbering, page_directory_name};
use super::{PackageError, Record};
use crate::catalog::{CatalogSource, ItemInfo, ItemLookup};
use crate::filegetter::LocalFileGetter;
use crate::metadata::MetadataParser;
use crate::metadata::xml::element_texts;
use crate::registry::ComponentRegistry;

/// Package layout rules, selected by the writer `class`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriterProfile {
    /// Issues named by date, pages numbered from filenames or titles.
    Newspapers,
    /// Books named by record key, pages numbered serially.
    Books,
}

impl WriterProfile {
    /// Whether packages of this profile ever carry `kind`.
    #[must_use]
    pub fn supports(self, kind: Datastream) -> bool {
        match self {
            Self::Newspapers => true,
            Self::Books => matches!(kind, Datastream::Obj | Datastream::Mods),
        }
    }
}

/// Registry of writer profiles keyed by configuration class.
#[must_use]
pub fn writer_registry() -> ComponentRegistry<WriterProfile> {
    ComponentRegistry::<WriterProfile>::new("writer")
        .with("CdmNewspapers", WriterProfile::Newspapers)
        .with("CdmBooks", WriterProfile::Books)
}

/// Writer settings for a run.
#[derive(Debug, Clone)]
pub struct WriterSettings {
    /// Root under which record directories are created.
    pub output_directory: PathBuf,
    /// Requested datastreams.
    pub datastreams: DatastreamSelection,
    /// Page numbering; books are always serial.
    pub numbering: PageNumbering,
    /// Local name of the metadata element holding the issue date.
    pub issue_date_element: String,
    /// OBJ acquisition behaviour.
    pub obj: ObjSettings,
    /// Metadata elements whose text becomes output subdirectories.
    pub output_subdirectory_fields: Vec<String>,
    /// Name of the metadata file in each directory.
    pub metadata_filename: String,
}

impl WriterSettings {
    /// Settings with every default, writing under `output_directory`.
    pub fn new(output_directory: impl Into<PathBuf>) -> Self {
        Self {
            output_directory: output_directory.into(),
            datastreams: DatastreamSelection::all(),
            numbering: PageNumbering::Derived,
            issue_date_element: DEFAULT_ISSUE_DATE_ELEMENT.to_string(),
            obj: ObjSettings::default(),
            output_subdirectory_fields: Vec::new(),
            metadata_filename: super::DEFAULT_METADATA_FILENAME.to_string(),
        }
    }
}

/// What happened to one page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageStatus {
    /// The page directory was populated with these datastreams.
    Written(Vec<Datastream>),
    /// The catalog had no such page; its directory is empty.
    NotFound,
    /// The name repeated an earlier page; nothing was written.
    Duplicate,
}

/// Per-page result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageReport {
    /// Catalog pointer of the page.
    pub pointer: String,
    /// Resolved page directory name.
    pub name: String,
    /// Outcome.
    pub status: PageStatus,
}

/// Result of writing one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageReport {
    /// The record written.
    pub record_key: String,
    /// The record directory created.
    pub directory: PathBuf,
    /// Pages in catalog order.
    pub pages: Vec<PageReport>,
}

/// Writes record packages.
pub struct PackageWriter<'a> {
    profile: WriterProfile,
    settings: WriterSettings,
    catalog: &'a dyn CatalogSource,
    files: &'a dyn LocalFileGetter,
    metadata: &'a dyn MetadataParser,
    emitter: MetadataEmitter,
    directories: IssueDirectoryResolver,
}

/// Per-page state threaded through the datastream steps.
struct PageContext<'r> {
    index: usize,
    pointer: &'r str,
    name: String,
    dir: PathBuf,
    issue_dir: &'r Path,
    local_path: Option<&'r Path>,
}

impl<'a> PackageWriter<'a> {
    /// Creates a writer over the given collaborators.
    pub fn new(
        profile: WriterProfile,
        mut settings: WriterSettings,
        catalog: &'a dyn CatalogSource,
        files: &'a dyn LocalFileGetter,
        metadata: &'a dyn MetadataParser,
    ) -> Self {
        if profile == WriterProfile::Books {
            settings.numbering = PageNumbering::Serial;
        }
        let emitter = MetadataEmitter::new(settings.metadata_filename.clone());
        Self {
            profile,
            settings,
            catalog,
            files,
            metadata,
            emitter,
            directories: IssueDirectoryResolver::new(),
        }
    }

    /// The profile this writer applies.
    #[must_use]
    pub fn profile(&self) -> WriterProfile {
        self.profile
    }

    fn selected(&self, kind: Datastream) -> bool {
        self.profile.supports(kind) && self.settings.datastreams.is_requested(kind)
    }

    /// Output root for a record, extended by the configured subdirectory fields.
    fn output_root(&self, metadata: &str) -> PathBuf {
        let mut root = self.settings.output_directory.clone();
        for field in &self.settings.output_subdirectory_fields {
            let matches = match element_texts(metadata, field) {
                Ok(matches) => matches,
                Err(error) => {
                    warn!(field = %field, error = %error, "cannot read subdirectory field");
                    continue;
                }
            };
            for element in matches {
                let segment: String = element
                    .text
                    .chars()
                    .filter(|c| c.is_alphanumeric() || *c == '_')
                    .collect();
                if !segment.is_empty() {
                    root.push(segment);
                }
            }
        }
        root
    }

    /// Writes the package for one record.
    ///
    /// # Errors
    ///
    /// Returns [`PackageError`] for failures that must stop the run: the
    /// record or a page directory cannot be created, a local master is
    /// rejected or cannot be copied, or a filename carries no page number.
    #[instrument(skip(self, record), fields(record_key = %record.record_key, pages = record.pages.len()))]
    pub async fn write_record(&mut self, record: &Record) -> Result<PackageReport, PackageError> {
        let root = self.output_root(&record.metadata);
        let name = match self.profile {
            WriterProfile::Newspapers => issue_directory_name(&record.metadata, &self.settings.issue_date_element),
            WriterProfile::Books => record.record_key.clone(),
        };
        let issue_dir = self.directories.create(&root, &name, &record.record_key)?;
        info!(dir = %issue_dir.display(), "writing package");

        if let Err(error) = self.emitter.write(&issue_dir, &record.metadata) {
            warn!(dir = %issue_dir.display(), error = %error, "failed to write record metadata");
        }

        let local_files = if self.selected(Datastream::Obj) {
            let key = match self.profile {
                WriterProfile::Newspapers => name.as_str(),
                WriterProfile::Books => record.record_key.as_str(),
            };
            let mut files = self.files.local_obj_files(key);
            files.sort();
            files
        } else {
            Vec::new()
        };
        debug!(count = local_files.len(), "local master files");

        let mut pages = Vec::with_capacity(record.pages.len());
        let mut seen_names = HashSet::new();
        let mut previous: Option<String> = None;

        for (offset, pointer) in record.pages.iter().enumerate() {
            let index = offset + 1;
            let info = self.page_info(pointer).await;
            let page_key = info
                .as_ref()
                .and_then(|info| info.dmrecord.as_deref())
                .unwrap_or(pointer);
            let local_path = local_files.get(offset).map(PathBuf::as_path);

            let name = page_directory_name(
                self.settings.numbering,
                &PageNameRequest {
                    index,
                    local_path,
                    page_key,
                    titles: &record.titles,
                    previous: previous.as_deref(),
                },
            )?;
            previous = Some(name.clone());

            if !seen_names.insert(name.clone()) {
                warn!(pointer = %pointer, page = %name, "page directory name repeats an earlier page; skipping page");
                pages.push(PageReport {
                    pointer: pointer.clone(),
                    name,
                    status: PageStatus::Duplicate,
                });
                continue;
            }

            let dir = issue_dir.join(&name);
            std::fs::create_dir_all(&dir).map_err(|e| PackageError::create_directory(&dir, e))?;

            let status = match info {
                Some(info) => {
                    let page = PageContext {
                        index,
                        pointer,
                        name: name.clone(),
                        dir,
                        issue_dir: &issue_dir,
                        local_path,
                    };
                    PageStatus::Written(self.write_page(&page, &info).await?)
                }
                None => {
                    info!(pointer = %pointer, page = %name, "page not found in catalog; directory left empty");
                    PageStatus::NotFound
                }
            };
            pages.push(PageReport {
                pointer: pointer.clone(),
                name,
                status,
            });
        }

        Ok(PackageReport {
            record_key: record.record_key.clone(),
            directory: issue_dir,
            pages,
        })
    }

    /// Item info for a page; lookup failures read as "not found".
    async fn page_info(&self, pointer: &str) -> Option<ItemInfo> {
        match self.catalog.fetch_item_info(pointer).await {
            Ok(ItemLookup::Found(info)) => Some(info),
            Ok(ItemLookup::NotFound) => None,
            Err(error) => {
                warn!(pointer, error = %error, "failed to fetch page item info");
                None
            }
        }
    }

    fn page_title(&self, page: &PageContext<'_>, info: &ItemInfo) -> String {
        match self.profile {
            WriterProfile::Books => format!("Page {}", page.index),
            WriterProfile::Newspapers => match info.page.as_deref().map(str::trim).filter(|p| !p.is_empty()) {
                Some(label) if is_numeric_label(label) => format!("Page {label}"),
                Some(label) => label.to_string(),
                None => format!("Page {}", page.name),
            },
        }
    }

    async fn write_page(&self, page: &PageContext<'_>, info: &ItemInfo) -> Result<Vec<Datastream>, PackageError> {
        let mut written = Vec::new();

        if self.selected(Datastream::Ocr) {
            match info.ocr_text.as_deref() {
                Some(text) => {
                    if write_datastream(&page.dir, Datastream::Ocr, text.as_bytes()).is_some() {
                        written.push(Datastream::Ocr);
                    }
                }
                None => warn!(pointer = %page.pointer, "OCR was expected but no OCR field was found"),
            }
        }

        let mut jp2_written = None;
        if self.selected(Datastream::Jp2) {
            match self.catalog.child_file_content(page.pointer, info).await {
                Ok(bytes) => {
                    jp2_written = write_datastream(&page.dir, Datastream::Jp2, &bytes);
                    if jp2_written.is_some() {
                        written.push(Datastream::Jp2);
                    }
                }
                Err(error) => warn!(pointer = %page.pointer, error = %error, "failed to fetch JP2"),
            }
        }

        if self.selected(Datastream::Tn) {
            match self.catalog.thumbnail(page.pointer).await {
                Ok(bytes) => {
                    if let Some(path) = write_datastream(&page.dir, Datastream::Tn, &bytes) {
                        written.push(Datastream::Tn);
                        if page.index == 1 {
                            let issue_thumbnail = page.issue_dir.join("TN.jpg");
                            if let Err(error) = std::fs::copy(&path, &issue_thumbnail) {
                                warn!(path = %issue_thumbnail.display(), error = %error, "failed to write record thumbnail");
                            }
                        }
                    }
                }
                Err(error) => warn!(pointer = %page.pointer, error = %error, "failed to fetch thumbnail"),
            }
        }

        let mut jpeg_written = None;
        if self.selected(Datastream::Jpeg) {
            match self.catalog.preview_image(page.pointer).await {
                Ok(bytes) => {
                    jpeg_written = write_datastream(&page.dir, Datastream::Jpeg, &bytes);
                    if jpeg_written.is_some() {
                        written.push(Datastream::Jpeg);
                    }
                }
                Err(error) => warn!(pointer = %page.pointer, error = %error, "failed to fetch preview JPEG"),
            }
        }

        let request = ObjRequest {
            page_dir: &page.dir,
            page_name: &page.name,
            local_path: page.local_path,
            jp2_written: jp2_written.as_deref(),
            jpeg_written: jpeg_written.as_deref(),
            pointer: page.pointer,
            info,
        };
        let outcome = acquire_obj(
            &request,
            &self.settings.obj,
            self.selected(Datastream::Obj),
            self.files,
            self.catalog,
        )
        .await?;
        if matches!(outcome, ObjOutcome::Written { .. }) {
            written.push(Datastream::Obj);
        }

        if self.selected(Datastream::Mods) {
            let title = self.page_title(page, info);
            let emitted = self
                .metadata
                .page_markup(page.pointer, &title)
                .and_then(|markup| self.emitter.write(&page.dir, &markup));
            match emitted {
                Ok(_) => written.push(Datastream::Mods),
                Err(error) => warn!(pointer = %page.pointer, error = %error, "failed to write page metadata"),
            }
        }

        Ok(written)
    }
}

/// Decimal number with optional sign, fraction and exponent (`3`, `-2.5`, `1e3`).
fn is_numeric_label(label: &str) -> bool {
    let unsigned = label.strip_prefix(['+', '-']).unwrap_or(label);
    let (mantissa, exponent) = match unsigned.split_once(['e', 'E']) {
        Some((mantissa, exponent)) => (mantissa, Some(exponent)),
        None => (unsigned, None),
    };
    let (whole, fraction) = mantissa.split_once('.').unwrap_or((mantissa, ""));
    let digits_only = |part: &str| part.chars().all(|c| c.is_ascii_digit());
    let mantissa_ok = !(whole.is_empty() && fraction.is_empty()) && digits_only(whole) && digits_only(fraction);
    let exponent_ok = exponent.is_none_or(|exp| {
        let exp = exp.strip_prefix(['+', '-']).unwrap_or(exp);
        !exp.is_empty() && digits_only(exp)
    });
    mantissa_ok && exponent_ok
}

/// Writes a fixed-name datastream file; failures are logged.
fn write_datastream(dir: &Path, kind: Datastream, bytes: &[u8]) -> Option<PathBuf> {
    let filename = kind.fixed_filename()?;
    let path = dir.join(filename);
    match std::fs::write(&path, bytes) {
        Ok(()) => Some(path),
        Err(error) => {
            warn!(path = %path.display(), error = %error, "failed to write {kind}");
            None
        }
    }
}
