//! FHIR resource ingestion into tabular CSV objects.
//!
//! This crate pulls Patient, Encounter, Condition and Observation resources from a
//! FHIR server, flattens each resource kind into a fixed-schema table and publishes
//! every table as a CSV object into a bucket.
//!
//! # Components
//!
//! - [`ResourceFetcher`] - Follows `next` links of search Bundles and accumulates entries
//! - [`transform`] - Pure per-kind mapping from Bundle entries to a [`Table`]
//! - [`CsvWriter`] - Serializes a [`Table`] to CSV text
//! - [`StoragePublisher`] - Uploads CSV text as a named object into an [`ObjectStore`]
//! - [`Pipeline`] - Runs fetch → transform → publish for each resource kind in turn
//!
//! The network and storage seams are traits ([`FhirTransport`] and
//! [`object_store::ObjectStore`]) so that both can be replaced by in-memory fakes.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use octofhir_ingest::{FhirClient, IngestConfig, Pipeline, ResourceFetcher, StoragePublisher};
//!
//! let cfg = IngestConfig::default();
//! let client = Arc::new(FhirClient::new(None)?);
//! let fetcher = ResourceFetcher::new(client, &cfg.server)?;
//! let store = octofhir_ingest::build_object_store(&cfg.storage)?;
//! let publisher = StoragePublisher::new(store, cfg.storage.bucket.clone());
//!
//! let report = Pipeline::new(fetcher, publisher, cfg.run_plan(), cfg.server.page_size)
//!     .run()
//!     .await?;
//! ```
//!
//! [`ObjectStore`]: object_store::ObjectStore

mod bundle;
mod client;
mod column;
pub mod config;
mod fetcher;
pub mod field;
pub mod output;
mod pipeline;
mod publisher;
mod resource;
mod storage;
mod table;
pub mod transform;

pub use bundle::{Bundle, BundleLink};
pub use client::{AuthHeader, FhirClient, FhirTransport, Page};
pub use column::{ColumnInfo, ColumnType};
pub use config::IngestConfig;
pub use fetcher::{FetchResult, ResourceFetcher, StopReason};
pub use output::CsvWriter;
pub use pipeline::{Pipeline, ResourceReport, RunReport};
pub use publisher::{PublishedObject, StoragePublisher};
pub use resource::ResourceKind;
pub use storage::build_object_store;
pub use table::{FlatRecord, Table};
pub use transform::transform;

use thiserror::Error;

/// Errors that can occur while ingesting FHIR resources.
#[derive(Debug, Error)]
pub enum Error {
    /// The HTTP request could not be sent or its body could not be read.
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    /// A response body or resource could not be decoded.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A server base URL or pagination link is not a valid URL.
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// The object store rejected an operation.
    #[error("Storage error: {0}")]
    Storage(#[from] object_store::Error),

    /// An object name cannot be used as a storage path.
    #[error("Invalid object name: {0}")]
    ObjectName(#[from] object_store::path::Error),

    /// A table could not be serialized to CSV.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Configuration could not be loaded or failed validation.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Filesystem error while preparing a local store.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<::config::ConfigError> for Error {
    fn from(err: ::config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

/// Result type alias using the crate's Error type.
pub type Result<T> = std::result::Result<T, Error>;
