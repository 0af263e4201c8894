use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use octofhir_ingest::ResourceKind;
use octofhir_ingest::config::{IngestConfig, StorageBackend};

#[derive(Parser)]
#[command(name = "octofhir-ingest")]
#[command(about = "Extract FHIR resources into CSV tables and publish them to object storage")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file (TOML). Defaults to octofhir-ingest.toml when present
    #[arg(short, long, global = true, env = "OCTOFHIR_INGEST_CONFIG")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fetch, flatten and publish every selected resource type
    Run(RunArgs),
    /// Show the columns produced for each resource type
    Schema(SchemaArgs),
}

#[derive(Clone, Copy, ValueEnum)]
pub enum StorageArg {
    /// Google Cloud Storage
    Gcs,
    /// Local directory
    Local,
    /// In-memory dry run
    Memory,
}

impl From<StorageArg> for StorageBackend {
    fn from(arg: StorageArg) -> Self {
        match arg {
            StorageArg::Gcs => StorageBackend::Gcs,
            StorageArg::Local => StorageBackend::Local,
            StorageArg::Memory => StorageBackend::Memory,
        }
    }
}

#[derive(clap::Args, Default)]
pub struct RunArgs {
    /// FHIR server base URL
    #[arg(short, long, env = "FHIR_SERVER_URL")]
    pub server: Option<String>,
    /// Entries requested per page (_count)
    #[arg(long)]
    pub page_size: Option<u32>,
    /// Stop after this many pages per resource type
    #[arg(long)]
    pub max_pages: Option<usize>,
    /// Where CSV objects are written
    #[arg(long, value_enum)]
    pub storage: Option<StorageArg>,
    /// Destination bucket
    #[arg(short, long, env = "GCS_BUCKET_NAME")]
    pub bucket: Option<String>,
    /// Root directory for the local storage backend
    #[arg(long)]
    pub output_dir: Option<String>,
    /// Google service account key file
    #[arg(long, env = "SERVICE_ACCOUNT_FILE")]
    pub service_account: Option<String>,
    /// Resource type to process; repeat to select several (default: all)
    #[arg(short, long = "resource", value_parser = parse_resource)]
    pub resources: Vec<ResourceKind>,
}

impl RunArgs {
    /// Overlay command-line values onto the loaded configuration.
    pub fn apply_to(&self, cfg: &mut IngestConfig) {
        if let Some(server) = &self.server {
            cfg.server.base_url = server.clone();
        }
        if let Some(page_size) = self.page_size {
            cfg.server.page_size = page_size;
        }
        if self.max_pages.is_some() {
            cfg.server.max_pages = self.max_pages;
        }
        if let Some(storage) = self.storage {
            cfg.storage.backend = storage.into();
        }
        if let Some(bucket) = &self.bucket {
            cfg.storage.bucket = bucket.clone();
        }
        if let Some(dir) = &self.output_dir {
            cfg.storage.local_root = dir.clone();
        }
        if let Some(path) = &self.service_account {
            cfg.storage.service_account_path = Some(path.clone());
        }
        if !self.resources.is_empty() {
            cfg.run.resources = self.resources.clone();
        }
    }
}

#[derive(clap::Args)]
pub struct SchemaArgs {
    /// Only show this resource type
    #[arg(short, long = "resource", value_parser = parse_resource)]
    pub resource: Option<ResourceKind>,
}

fn parse_resource(s: &str) -> Result<ResourceKind, String> {
    ResourceKind::parse(s).map_err(|e| e.to_string())
}
