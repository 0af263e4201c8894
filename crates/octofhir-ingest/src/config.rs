use serde::{Deserialize, Serialize};
use url::Url;

use crate::client::AuthHeader;
use crate::resource::ResourceKind;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct IngestConfig {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub storage: StorageSettings,
    /// Object name per resource kind
    #[serde(default)]
    pub objects: ObjectNames,
    #[serde(default)]
    pub run: RunSettings,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl IngestConfig {
    pub fn validate(&self) -> Result<(), String> {
        // Server validations
        Url::parse(&self.server.base_url)
            .map_err(|e| format!("server.base_url is not a valid URL: {e}"))?;
        if self.server.page_size == 0 {
            return Err("server.page_size must be > 0".into());
        }
        if self.server.max_pages == Some(0) {
            return Err("server.max_pages must be > 0 when set".into());
        }
        if let Some(auth) = &self.server.auth {
            auth.validate()?;
        }
        // Storage validations
        if self.storage.bucket.trim().is_empty() {
            return Err("storage.bucket must not be empty".into());
        }
        if self.storage.backend == StorageBackend::Local
            && self.storage.local_root.trim().is_empty()
        {
            return Err("storage.local_root must not be empty for the local backend".into());
        }
        // Object names
        let mut seen = Vec::new();
        for kind in ResourceKind::ALL {
            let name = self.objects.name_for(kind);
            if name.trim().is_empty() {
                return Err(format!("objects.{} must not be empty", kind.as_str().to_lowercase()));
            }
            if seen.contains(&name) {
                return Err(format!("objects: '{name}' is used for more than one resource type"));
            }
            seen.push(name);
        }
        // Run selection
        if self.run.resources.is_empty() {
            return Err("run.resources must name at least one resource type".into());
        }
        for (i, kind) in self.run.resources.iter().enumerate() {
            if self.run.resources[..i].contains(kind) {
                return Err(format!("run.resources lists {kind} more than once"));
            }
        }
        // Logging validation
        let lvl = self.logging.level.to_ascii_lowercase();
        let valid_levels = ["trace", "debug", "info", "warn", "error", "off"];
        if !valid_levels.contains(&lvl.as_str()) {
            return Err(format!("logging.level must be one of {valid_levels:?}"));
        }
        Ok(())
    }

    /// Resource kinds to process, with the object name each is published under.
    pub fn run_plan(&self) -> Vec<(ResourceKind, String)> {
        self.run
            .resources
            .iter()
            .map(|kind| (*kind, self.objects.name_for(*kind).to_string()))
            .collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Value of the `_count` search parameter
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    /// Append `_format=json` to the first search request
    #[serde(default = "default_true")]
    pub include_format_param: bool,
    /// Stop after this many pages per resource type. Unlimited when unset.
    #[serde(default)]
    pub max_pages: Option<usize>,
    #[serde(default)]
    pub auth: Option<AuthSettings>,
}

fn default_base_url() -> String {
    "https://hapi.fhir.org/baseR4".into()
}
fn default_page_size() -> u32 {
    100
}
fn default_true() -> bool {
    true
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            page_size: default_page_size(),
            include_format_param: true,
            max_pages: None,
            auth: None,
        }
    }
}

/// Credentials sent to the FHIR server
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum AuthSettings {
    Basic { username: String, password: String },
    Bearer { token: String },
}

impl AuthSettings {
    fn validate(&self) -> Result<(), String> {
        match self {
            Self::Basic { username, .. } if username.is_empty() => {
                Err("server.auth.username must not be empty".into())
            }
            Self::Bearer { token } if token.is_empty() => {
                Err("server.auth.token must not be empty".into())
            }
            _ => Ok(()),
        }
    }

    pub fn to_auth_header(&self) -> AuthHeader {
        match self {
            Self::Basic { username, password } => AuthHeader::Basic {
                username: username.clone(),
                password: password.clone(),
            },
            Self::Bearer { token } => AuthHeader::Bearer {
                token: token.clone(),
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Google Cloud Storage
    #[default]
    Gcs,
    /// Directory `<local_root>/<bucket>` on the local filesystem
    Local,
    /// Process memory; nothing is persisted
    Memory,
}

impl std::fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageBackend::Gcs => write!(f, "gcs"),
            StorageBackend::Local => write!(f, "local"),
            StorageBackend::Memory => write!(f, "memory"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageSettings {
    #[serde(default)]
    pub backend: StorageBackend,
    #[serde(default = "default_bucket")]
    pub bucket: String,
    /// Service account key file for GCS. Falls back to the standard Google
    /// environment variables when unset.
    #[serde(default)]
    pub service_account_path: Option<String>,
    #[serde(default = "default_local_root")]
    pub local_root: String,
}

fn default_bucket() -> String {
    "fhir001".into()
}
fn default_local_root() -> String {
    "./out".into()
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            bucket: default_bucket(),
            service_account_path: None,
            local_root: default_local_root(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectNames {
    #[serde(default = "default_patient_object")]
    pub patient: String,
    #[serde(default = "default_encounter_object")]
    pub encounter: String,
    #[serde(default = "default_condition_object")]
    pub condition: String,
    #[serde(default = "default_observation_object")]
    pub observation: String,
}

fn default_patient_object() -> String {
    ResourceKind::Patient.default_object_name().into()
}
fn default_encounter_object() -> String {
    ResourceKind::Encounter.default_object_name().into()
}
fn default_condition_object() -> String {
    ResourceKind::Condition.default_object_name().into()
}
fn default_observation_object() -> String {
    ResourceKind::Observation.default_object_name().into()
}

impl ObjectNames {
    pub fn name_for(&self, kind: ResourceKind) -> &str {
        match kind {
            ResourceKind::Patient => &self.patient,
            ResourceKind::Encounter => &self.encounter,
            ResourceKind::Condition => &self.condition,
            ResourceKind::Observation => &self.observation,
        }
    }
}

impl Default for ObjectNames {
    fn default() -> Self {
        Self {
            patient: default_patient_object(),
            encounter: default_encounter_object(),
            condition: default_condition_object(),
            observation: default_observation_object(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSettings {
    /// Resource types to process, in order
    #[serde(default = "default_resources")]
    pub resources: Vec<ResourceKind>,
}

fn default_resources() -> Vec<ResourceKind> {
    ResourceKind::ALL.to_vec()
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            resources: default_resources(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}
fn default_log_level() -> String {
    "info".into()
}
impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

pub mod loader {
    use super::IngestConfig;
    use config::{Config, Environment, File};
    use std::path::{Path, PathBuf};

    pub const DEFAULT_CONFIG_FILE: &str = "octofhir-ingest.toml";

    /// Load configuration from an optional TOML file plus environment overrides,
    /// e.g. `OCTOFHIR_INGEST__SERVER__PAGE_SIZE=50`. List keys take comma separated
    /// values: `OCTOFHIR_INGEST__RUN__RESOURCES=Patient,Condition`.
    pub fn load_config(path: Option<&Path>) -> crate::Result<IngestConfig> {
        let mut builder = Config::builder();
        match path {
            Some(p) => {
                // An explicitly named file must exist
                builder = builder.add_source(File::from(p.to_path_buf()).required(true));
            }
            None => {
                let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    builder = builder.add_source(File::from(default_path));
                }
            }
        }
        builder = builder.add_source(
            Environment::with_prefix("OCTOFHIR_INGEST")
                .try_parsing(true)
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("run.resources"),
        );
        let merged: IngestConfig = builder.build()?.try_deserialize()?;
        merged.validate().map_err(crate::Error::Config)?;
        Ok(merged)
    }
}
