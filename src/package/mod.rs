//! Package assembly engine.
//!
//! Turns one catalog record into a directory tree ready for batch ingest:
//!
//! ```text
//! <output>[/<subdirs>]/<issue>[.<n>]/MODS.xml
//! <output>[/<subdirs>]/<issue>[.<n>]/TN.jpg
//! <output>[/<subdirs>]/<issue>[.<n>]/<page>/{MODS.xml,OBJ.<ext>,OCR.txt,JP2.jp2,TN.jpg,JPEG.jpg}
//! ```
//!
//! - [`DatastreamSelection`] - which artifact kinds a run produces
//! - [`IssueDirectoryResolver`] - record directory naming with collision suffixes
//! - [`page_directory_name`] - page directory numbering
//! - [`acquire_obj`] - master image fallback chain
//! - [`MetadataEmitter`] - normalized metadata files
//! - [`PackageWriter`] - sequences the above over the pages of a record

mod datastream;
mod date;
mod emitter;
mod error;
mod issue_dir;
mod obj;
mod page_dir;
mod writer;

use std::collections::HashMap;

pub use datastream::{Datastream, DatastreamSelection, UnknownDatastream};
pub use date::{UNKNOWN_ISSUE_DATE, normalize_issue_date};
pub use emitter::{DEFAULT_METADATA_FILENAME, MetadataEmitter};
pub use error::PackageError;
pub use issue_dir::{DEFAULT_ISSUE_DATE_ELEMENT, IssueDirectoryResolver, extract_issue_date, issue_directory_name};
pub use obj::{
    DEFAULT_OBJ_EXTENSION, FALLBACK_OBJ_EXTENSION, ObjOutcome, ObjRequest, ObjSettings, ObjSource, acquire_obj,
};
pub use page_dir::{PageNameRequest, PageNumbering, page_directory_name, strip_leading_zeros, trailing_digits};
pub use writer::{
    PackageReport, PackageWriter, PageReport, PageStatus, WriterProfile, WriterSettings, writer_registry,
};

/// One catalog record, fetched once and read-only afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// Stable catalog key of the record.
    pub record_key: String,
    /// Rendered record-level metadata markup.
    pub metadata: String,
    /// Child page pointers in catalog order.
    pub pages: Vec<String>,
    /// Page pointer to page title.
    pub titles: HashMap<String, String>,
}
