//! Construction of the object store tables are published into.

use std::path::PathBuf;
use std::sync::Arc;

use object_store::ClientOptions;
use object_store::ObjectStore;
use object_store::gcp::GoogleCloudStorageBuilder;
use object_store::local::LocalFileSystem;
use object_store::memory::InMemory;

use crate::Result;
use crate::config::{StorageBackend, StorageSettings};

/// Build the store for the configured backend, bound to `settings.bucket`.
///
/// # Errors
///
/// Returns an error if GCS credentials cannot be resolved or the local
/// directory cannot be created.
pub fn build_object_store(settings: &StorageSettings) -> Result<Arc<dyn ObjectStore>> {
    let store: Arc<dyn ObjectStore> = match settings.backend {
        StorageBackend::Gcs => {
            let mut builder = GoogleCloudStorageBuilder::from_env()
                .with_bucket_name(&settings.bucket)
                .with_client_options(
                    ClientOptions::new().with_content_type_for_suffix("csv", "text/csv"),
                );
            if let Some(path) = &settings.service_account_path {
                builder = builder.with_service_account_path(path);
            }
            Arc::new(builder.build()?)
        }
        StorageBackend::Local => {
            let root = PathBuf::from(&settings.local_root).join(&settings.bucket);
            std::fs::create_dir_all(&root)?;
            Arc::new(LocalFileSystem::new_with_prefix(&root)?)
        }
        StorageBackend::Memory => Arc::new(InMemory::new()),
    };

    tracing::debug!(
        backend = %settings.backend,
        bucket = %settings.bucket,
        "Object store ready"
    );

    Ok(store)
}
