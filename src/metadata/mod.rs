//! Metadata rendering and markup helpers.
//!
//! - [`MetadataParser`] - renders record and page metadata markup
//! - [`CdmToMods`] - minimal MODS from CONTENTdm item info
//! - [`xml`] - local-name element lookup and markup normalization

mod error;
mod mods;
pub mod xml;

pub use error::MetadataError;
pub use mods::CdmToMods;

use crate::catalog::ItemInfo;
use crate::registry::ComponentRegistry;

/// Settings shared by metadata parsers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetadataParserSettings {
    /// Collection alias.
    pub alias: String,
    /// Public catalog base URL for "migrated from" identifiers.
    pub migrated_from_base_url: Option<String>,
}

/// Renders descriptive metadata markup.
pub trait MetadataParser: Send + Sync {
    /// Markup for a whole record.
    ///
    /// # Errors
    ///
    /// Returns [`MetadataError`] when the markup cannot be produced.
    fn record_markup(&self, record_key: &str, info: &ItemInfo) -> Result<String, MetadataError>;

    /// Markup for one page.
    ///
    /// # Errors
    ///
    /// Returns [`MetadataError`] when the markup cannot be produced.
    fn page_markup(&self, pointer: &str, title: &str) -> Result<String, MetadataError>;
}

/// Constructor stored in the metadata parser registry.
pub type MetadataParserConstructor = fn(&MetadataParserSettings) -> Box<dyn MetadataParser>;

/// Registry of metadata parsers keyed by configuration class.
#[must_use]
pub fn metadata_parser_registry() -> ComponentRegistry<MetadataParserConstructor> {
    ComponentRegistry::<MetadataParserConstructor>::new("metadata parser").with("CdmToMods", CdmToMods::boxed)
}
