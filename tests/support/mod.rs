//! Shared fixtures for the packaging integration tests.
//!
//! [`FakeCatalog`] serves canned records and pages and records every call so
//! tests can assert which fallbacks ran.

#![allow(dead_code)]

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

use async_trait::async_trait;
use cdm_packager::catalog::{CatalogError, CatalogSource, ItemInfo, ItemLookup, RemoteObject};

/// In-memory catalog.
#[derive(Default)]
pub struct FakeCatalog {
    pub items: HashMap<String, ItemInfo>,
    pub descriptors: HashMap<String, String>,
    /// When false, child file requests fail with a 404.
    pub serve_child_files: bool,
    /// Directory remote objects are "downloaded" into.
    pub download_dir: Option<PathBuf>,
    calls: Mutex<Vec<String>>,
}

impl FakeCatalog {
    pub fn new() -> Self {
        Self {
            serve_child_files: true,
            ..Self::default()
        }
    }

    /// Adds a record with the given pages, each titled `Page <n>`.
    pub fn with_record(mut self, key: &str, date: Option<&str>, pages: &[&str]) -> Self {
        self.items.insert(
            key.to_string(),
            ItemInfo {
                dmrecord: Some(key.to_string()),
                title: Some("The Daily Bugle".to_string()),
                date: date.map(ToString::to_string),
                ..ItemInfo::default()
            },
        );
        let nodes: String = pages
            .iter()
            .enumerate()
            .map(|(i, ptr)| format!("<page><pagetitle>Page {}</pagetitle><pageptr>{ptr}</pageptr></page>", i + 1))
            .collect();
        self.descriptors
            .insert(key.to_string(), format!("<cpd><type>Document</type>{nodes}</cpd>"));
        self
    }

    /// Adds a page the catalog knows.
    pub fn with_page(mut self, pointer: &str, label: &str) -> Self {
        self.items.insert(
            pointer.to_string(),
            ItemInfo {
                dmrecord: Some(pointer.to_string()),
                title: Some(format!("Page {label}")),
                page: Some(label.to_string()),
                find: Some(format!("{pointer}.jp2")),
                ocr_text: Some(format!("text of page {label}")),
                ..ItemInfo::default()
            },
        );
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn called(&self, prefix: &str) -> bool {
        self.calls().iter().any(|call| call.starts_with(prefix))
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    fn not_found(pointer: &str) -> CatalogError {
        CatalogError::http_status(format!("fake://{pointer}"), 404)
    }
}

#[async_trait]
impl CatalogSource for FakeCatalog {
    async fn fetch_item_info(&self, pointer: &str) -> Result<ItemLookup, CatalogError> {
        self.record(format!("info:{pointer}"));
        Ok(self
            .items
            .get(pointer)
            .cloned()
            .map_or(ItemLookup::NotFound, ItemLookup::Found))
    }

    async fn compound_descriptor(&self, record_key: &str) -> Result<String, CatalogError> {
        self.record(format!("descriptor:{record_key}"));
        self.descriptors
            .get(record_key)
            .cloned()
            .ok_or_else(|| Self::not_found(record_key))
    }

    async fn child_file_content(&self, pointer: &str, _info: &ItemInfo) -> Result<Vec<u8>, CatalogError> {
        self.record(format!("child:{pointer}"));
        if self.serve_child_files {
            Ok(format!("jp2 {pointer}").into_bytes())
        } else {
            Err(Self::not_found(pointer))
        }
    }

    async fn thumbnail(&self, pointer: &str) -> Result<Vec<u8>, CatalogError> {
        self.record(format!("thumbnail:{pointer}"));
        Ok(format!("tn {pointer}").into_bytes())
    }

    async fn preview_image(&self, pointer: &str) -> Result<Vec<u8>, CatalogError> {
        self.record(format!("preview:{pointer}"));
        Ok(format!("jpeg {pointer}").into_bytes())
    }

    async fn download_remote_object(&self, pointer: &str, _info: &ItemInfo) -> Result<RemoteObject, CatalogError> {
        self.record(format!("download:{pointer}"));
        let dir = self.download_dir.clone().ok_or_else(|| Self::not_found(pointer))?;
        let temp_path = dir.join(format!("{pointer}.tmp"));
        std::fs::write(&temp_path, format!("master {pointer}")).map_err(|e| CatalogError::io(&temp_path, e))?;
        Ok(RemoteObject {
            temp_path,
            filename: format!("{pointer}.tif"),
        })
    }
}
