//! CONTENTdm web services client.
//!
//! Two base URLs are involved: the web services API (`dmwebservices`) for
//! item info and descriptors, and the utils endpoints of the public site for
//! files and scaled images.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::Client;
use serde_json::Value;
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, instrument};

use super::http_client::{DEFAULT_HTTP_TIMEOUT_SECS, build_catalog_http_client};
use super::{CatalogError, CatalogSource, FieldNicknames, ItemInfo, ItemLookup, RemoteObject};

/// Width in pixels of rendered thumbnails.
pub const THUMBNAIL_TARGET_WIDTH: u32 = 200;

/// Width in pixels of rendered preview images.
pub const PREVIEW_TARGET_WIDTH: u32 = 800;

/// Connection settings for [`CdmClient`].
#[derive(Debug, Clone)]
pub struct CdmClientConfig {
    /// Web services base URL, e.g. `https://server.example.org:81/dmwebservices/index.php?q=`.
    pub ws_url: String,
    /// Utils base URL, e.g. `https://cdm.example.org/utils/`.
    pub utils_url: String,
    /// Collection alias, with or without surrounding slashes.
    pub alias: String,
    /// Connect and request timeout.
    pub timeout_secs: u64,
    /// Reject invalid TLS certificates.
    pub verify_tls: bool,
    /// Directory for downloaded remote objects.
    pub temp_directory: PathBuf,
    /// Field nickname mapping for item info.
    pub nicknames: FieldNicknames,
}

impl CdmClientConfig {
    /// Creates a config with default timeout, nicknames and the system temp directory.
    pub fn new(ws_url: impl Into<String>, utils_url: impl Into<String>, alias: impl Into<String>) -> Self {
        Self {
            ws_url: ws_url.into(),
            utils_url: utils_url.into(),
            alias: alias.into(),
            timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
            verify_tls: true,
            temp_directory: std::env::temp_dir(),
            nicknames: FieldNicknames::default(),
        }
    }
}

/// Pixel dimensions reported by `dmGetImageInfo`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageDimensions {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl ImageDimensions {
    /// Scale percentage and resulting height for a render `target_width` pixels wide.
    #[must_use]
    pub fn scale_to_width(self, target_width: u32) -> (f64, u32) {
        let scale = f64::from(target_width) / f64::from(self.width) * 100.0;
        let height = (f64::from(self.height) * scale / 100.0).round();
        // Bounded by the source height times the target/width ratio.
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let height = height.max(0.0) as u32;
        (scale, height)
    }
}

/// [`CatalogSource`] backed by the CONTENTdm HTTP API.
#[derive(Debug, Clone)]
pub struct CdmClient {
    client: Client,
    ws_url: String,
    utils_url: String,
    alias: String,
    temp_directory: PathBuf,
    nicknames: FieldNicknames,
}

impl CdmClient {
    /// Creates a client from connection settings.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::ClientBuild`] when the HTTP client cannot be constructed.
    pub fn new(config: CdmClientConfig) -> Result<Self, CatalogError> {
        let client = build_catalog_http_client(config.timeout_secs, config.verify_tls)?;
        Ok(Self::with_http_client(client, config))
    }

    /// Creates a client around an existing HTTP client.
    #[must_use]
    pub fn with_http_client(client: Client, config: CdmClientConfig) -> Self {
        Self {
            client,
            ws_url: config.ws_url,
            utils_url: with_trailing_slash(config.utils_url),
            alias: config.alias.trim_matches('/').to_string(),
            temp_directory: config.temp_directory,
            nicknames: config.nicknames,
        }
    }

    fn item_info_url(&self, pointer: &str) -> String {
        format!("{}dmGetItemInfo/{}/{pointer}/json", self.ws_url, self.alias)
    }

    fn descriptor_url(&self, pointer: &str) -> String {
        format!("{}dmGetCompoundObjectInfo/{}/{pointer}/xml", self.ws_url, self.alias)
    }

    fn image_info_url(&self, pointer: &str) -> String {
        format!("{}dmGetImageInfo/{}/{pointer}/json", self.ws_url, self.alias)
    }

    fn file_url(&self, pointer: &str, find: &str) -> String {
        format!(
            "{}getfile/collection/{}/id/{pointer}/filename/{}",
            self.utils_url,
            self.alias,
            urlencoding::encode(find)
        )
    }

    fn thumbnail_url(&self, pointer: &str) -> String {
        format!("{}getthumbnail/collection/{}/id/{pointer}", self.utils_url, self.alias)
    }

    fn scaled_image_url(&self, pointer: &str, dimensions: ImageDimensions, target_width: u32) -> String {
        let (scale, height) = dimensions.scale_to_width(target_width);
        format!(
            "{}ajaxhelper/?CISOROOT={}&CISOPTR={pointer}&action=2&DMSCALE={scale:.4}&DMWIDTH={target_width}&DMHEIGHT={height}",
            self.utils_url, self.alias
        )
    }

    async fn get(&self, url: &str) -> Result<reqwest::Response, CatalogError> {
        debug!(url, "catalog request");
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| CatalogError::network(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(CatalogError::http_status(url, status.as_u16()));
        }
        Ok(response)
    }

    async fn get_bytes(&self, url: &str) -> Result<Vec<u8>, CatalogError> {
        let response = self.get(url).await?;
        let bytes = response.bytes().await.map_err(|e| CatalogError::network(url, e))?;
        Ok(bytes.to_vec())
    }

    async fn get_json(&self, url: &str) -> Result<Value, CatalogError> {
        let bytes = self.get_bytes(url).await?;
        serde_json::from_slice(&bytes)
            .map_err(|e| CatalogError::invalid_response(url, format!("invalid JSON: {e}")))
    }

    /// Fetches the pixel dimensions of a page image.
    ///
    /// Returns `Ok(None)` when the catalog reports no usable width and height.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError`] when the request itself fails.
    #[instrument(skip(self), fields(pointer = %pointer))]
    pub async fn image_dimensions(&self, pointer: &str) -> Result<Option<ImageDimensions>, CatalogError> {
        let url = self.image_info_url(pointer);
        let value = self.get_json(&url).await?;
        let dimension = |name: &str| {
            value.get(name).and_then(|field| match field {
                Value::Number(number) => number.as_u64().and_then(|n| u32::try_from(n).ok()),
                Value::String(text) => text.trim().parse().ok(),
                _ => None,
            })
        };
        Ok(match (dimension("width"), dimension("height")) {
            (Some(width), Some(height)) if width > 0 && height > 0 => Some(ImageDimensions { width, height }),
            _ => None,
        })
    }

    /// Dimensions, with lookup failures degraded to "unknown".
    async fn known_dimensions(&self, pointer: &str) -> Option<ImageDimensions> {
        match self.image_dimensions(pointer).await {
            Ok(dimensions) => dimensions,
            Err(error) => {
                debug!(pointer, error = %error, "image info unavailable");
                None
            }
        }
    }
}

#[async_trait]
impl CatalogSource for CdmClient {
    #[instrument(skip(self), fields(pointer = %pointer))]
    async fn fetch_item_info(&self, pointer: &str) -> Result<ItemLookup, CatalogError> {
        let url = self.item_info_url(pointer);
        let value = self.get_json(&url).await?;
        ItemInfo::from_json(&value, &self.nicknames)
            .ok_or_else(|| CatalogError::invalid_response(&url, "expected a JSON object"))
    }

    #[instrument(skip(self), fields(record_key = %record_key))]
    async fn compound_descriptor(&self, record_key: &str) -> Result<String, CatalogError> {
        let url = self.descriptor_url(record_key);
        let bytes = self.get_bytes(&url).await?;
        String::from_utf8(bytes).map_err(|e| CatalogError::invalid_response(&url, format!("descriptor is not UTF-8: {e}")))
    }

    #[instrument(skip(self, info), fields(pointer = %pointer))]
    async fn child_file_content(&self, pointer: &str, info: &ItemInfo) -> Result<Vec<u8>, CatalogError> {
        let find = info
            .find
            .as_deref()
            .ok_or_else(|| CatalogError::invalid_response(self.item_info_url(pointer), "item has no 'find' filename"))?;
        self.get_bytes(&self.file_url(pointer, find)).await
    }

    #[instrument(skip(self), fields(pointer = %pointer))]
    async fn thumbnail(&self, pointer: &str) -> Result<Vec<u8>, CatalogError> {
        let url = match self.known_dimensions(pointer).await {
            Some(dimensions) => self.scaled_image_url(pointer, dimensions, THUMBNAIL_TARGET_WIDTH),
            None => self.thumbnail_url(pointer),
        };
        self.get_bytes(&url).await
    }

    #[instrument(skip(self), fields(pointer = %pointer))]
    async fn preview_image(&self, pointer: &str) -> Result<Vec<u8>, CatalogError> {
        let dimensions = self.known_dimensions(pointer).await.ok_or_else(|| {
            CatalogError::invalid_response(self.image_info_url(pointer), "image dimensions unavailable")
        })?;
        self.get_bytes(&self.scaled_image_url(pointer, dimensions, PREVIEW_TARGET_WIDTH))
            .await
    }

    #[instrument(skip(self, info), fields(pointer = %pointer))]
    async fn download_remote_object(&self, pointer: &str, info: &ItemInfo) -> Result<RemoteObject, CatalogError> {
        let find = info
            .find
            .as_deref()
            .ok_or_else(|| CatalogError::invalid_response(self.item_info_url(pointer), "item has no 'find' filename"))?;
        let url = self.file_url(pointer, find);

        tokio::fs::create_dir_all(&self.temp_directory)
            .await
            .map_err(|e| CatalogError::io(&self.temp_directory, e))?;
        let temp_path = self
            .temp_directory
            .join(format!("cdm-packager-{}-{pointer}.tmp", self.alias));

        let response = self.get(&url).await?;
        let mut file = File::create(&temp_path)
            .await
            .map_err(|e| CatalogError::io(&temp_path, e))?;

        let streamed = stream_to_file(&mut file, response, &url, &temp_path).await;
        if streamed.is_err() {
            debug!(path = %temp_path.display(), "cleaning up partial file after error");
            let _ = tokio::fs::remove_file(&temp_path).await;
        }
        let bytes = streamed?;
        debug!(path = %temp_path.display(), bytes, "remote object downloaded");

        Ok(RemoteObject {
            temp_path,
            filename: find.to_string(),
        })
    }
}

async fn stream_to_file(
    file: &mut File,
    response: reqwest::Response,
    url: &str,
    path: &Path,
) -> Result<u64, CatalogError> {
    let mut writer = BufWriter::new(file);
    let mut stream = response.bytes_stream();
    let mut bytes_written: u64 = 0;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| CatalogError::network(url, e))?;
        writer
            .write_all(&chunk)
            .await
            .map_err(|e| CatalogError::io(path, e))?;
        bytes_written += chunk.len() as u64;
    }

    writer.flush().await.map_err(|e| CatalogError::io(path, e))?;
    Ok(bytes_written)
}

fn with_trailing_slash(mut url: String) -> String {
    if !url.ends_with('/') {
        url.push('/');
    }
    url
}
