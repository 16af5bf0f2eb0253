//! Remote catalog access.
//!
//! [`CatalogSource`] is the seam between the package writer and the catalog.
//! [`CdmClient`] implements it against the CONTENTdm web services API; tests
//! substitute an in-memory implementation.

mod client;
mod descriptor;
mod error;
mod http_client;
mod item;

use std::path::{Path, PathBuf};

use async_trait::async_trait;

pub use client::{CdmClient, CdmClientConfig, ImageDimensions, PREVIEW_TARGET_WIDTH, THUMBNAIL_TARGET_WIDTH};
pub use descriptor::{CompoundDescriptor, DescriptorPage};
pub use error::CatalogError;
pub use http_client::{DEFAULT_HTTP_TIMEOUT_SECS, build_catalog_http_client, catalog_user_agent};
pub use item::{DEFAULT_OCR_NICKNAMES, FieldNicknames, ItemInfo, ItemLookup, NOT_FOUND_CODE};

/// A remote object downloaded to a temporary file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteObject {
    /// Where the bytes were stored.
    pub temp_path: PathBuf,
    /// Filename the catalog uses for the object, used to infer its extension.
    pub filename: String,
}

impl RemoteObject {
    /// Extension of the catalog filename, when it has a non-empty one.
    #[must_use]
    pub fn extension(&self) -> Option<&str> {
        Path::new(&self.filename)
            .extension()
            .and_then(|ext| ext.to_str())
            .filter(|ext| !ext.is_empty())
    }
}

/// Read access to the catalog that hosts records and their pages.
///
/// All methods are awaited one at a time by the writer.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Fetches the item info of a record or page.
    async fn fetch_item_info(&self, pointer: &str) -> Result<ItemLookup, CatalogError>;

    /// Fetches the raw compound-object descriptor markup of a record.
    async fn compound_descriptor(&self, record_key: &str) -> Result<String, CatalogError>;

    /// Fetches the file attached to a page (the JP2 for most newspapers).
    async fn child_file_content(&self, pointer: &str, info: &ItemInfo) -> Result<Vec<u8>, CatalogError>;

    /// Fetches a thumbnail-sized JPEG of a page.
    async fn thumbnail(&self, pointer: &str) -> Result<Vec<u8>, CatalogError>;

    /// Fetches a preview-sized JPEG of a page.
    async fn preview_image(&self, pointer: &str) -> Result<Vec<u8>, CatalogError>;

    /// Downloads a page's master object to a temporary file.
    async fn download_remote_object(
        &self,
        pointer: &str,
        info: &ItemInfo,
    ) -> Result<RemoteObject, CatalogError>;
}
