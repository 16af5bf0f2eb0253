//! CONTENTdm batch packager
//!
//! Pulls digitized newspaper issues and books out of a CONTENTdm catalog and
//! lays them out on disk as batch-ingest packages: one directory per record,
//! one sub-directory per page, each holding metadata plus the selected image
//! and text datastreams.
//!
//! # Architecture
//!
//! - [`catalog`] - the catalog seam and its CONTENTdm HTTP implementation
//! - [`filegetter`] - locating local master images for a record
//! - [`metadata`] - rendering record and page metadata markup
//! - [`package`] - the package assembly engine
//! - [`run`] - wiring configured components over a list of record keys
//! - [`batch`] - splitting finished packages into ingest sets
//! - [`config`] - the TOML config file
//! - [`registry`] - named component lookup used by the config

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod batch;
pub mod catalog;
pub mod config;
pub mod filegetter;
pub mod metadata;
pub mod package;
pub mod registry;
pub mod run;

// Re-export commonly used types
pub use batch::{BatchError, BatchSummary, DEFAULT_SET_SIZE, split_into_sets};
pub use catalog::{CatalogError, CatalogSource, CdmClient, CdmClientConfig, ItemInfo, ItemLookup};
pub use config::{ConfigError, DEFAULT_CONFIG_FILENAME, FileConfig};
pub use filegetter::{FileGetterSettings, LocalFileGetter};
pub use metadata::{MetadataError, MetadataParser, MetadataParserSettings};
pub use package::{
    Datastream, DatastreamSelection, PackageError, PackageReport, PackageWriter, Record, WriterProfile,
    WriterSettings,
};
pub use registry::{ComponentRegistry, UnknownComponent};
pub use run::{Components, RunSummary, write_records};
