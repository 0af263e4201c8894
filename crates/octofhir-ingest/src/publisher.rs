//! Upload of extracted tables as CSV objects.

use std::sync::Arc;

use object_store::path::Path;
use object_store::{ObjectStore, PutPayload};

use crate::Result;
use crate::output::CsvWriter;
use crate::table::Table;

/// Describes an object written by [`StoragePublisher::publish`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedObject {
    pub bucket: String,
    pub object_name: String,
    pub rows: usize,
    pub bytes: usize,
    pub e_tag: Option<String>,
}

/// Serializes tables to CSV and writes them into one bucket.
///
/// Every publish fully replaces the object of the same name.
pub struct StoragePublisher {
    store: Arc<dyn ObjectStore>,
    bucket: String,
    writer: CsvWriter,
}

impl StoragePublisher {
    /// `bucket` names the container `store` is bound to; it is used for reporting.
    pub fn new(store: Arc<dyn ObjectStore>, bucket: impl Into<String>) -> Self {
        Self {
            store,
            bucket: bucket.into(),
            writer: CsvWriter::new(),
        }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Write `table` as CSV under `object_name`, overwriting any existing object.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is not a valid object path, serialization
    /// fails, or the store rejects the upload. Nothing is retried.
    pub async fn publish(&self, table: &Table, object_name: &str) -> Result<PublishedObject> {
        let location = Path::parse(object_name)?;
        let body = self.writer.to_bytes(table)?;
        let bytes = body.len();

        let result = self.store.put(&location, PutPayload::from(body)).await?;

        tracing::info!(
            resource_type = %table.resource,
            bucket = %self.bucket,
            object = %location,
            rows = table.row_count(),
            bytes,
            "Uploaded CSV object"
        );

        Ok(PublishedObject {
            bucket: self.bucket.clone(),
            object_name: location.to_string(),
            rows: table.row_count(),
            bytes,
            e_tag: result.e_tag,
        })
    }
}
