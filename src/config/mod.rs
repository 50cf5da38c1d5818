pub mod runtime;
pub use runtime::apply_env_overrides;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use crate::integration::IntegrationName;

pub const DEFAULT_CHUNK_SIZE: u32 = 1500;
pub const DEFAULT_OVERLAP_SIZE: u32 = 20;
pub const DEFAULT_MAX_FILE_SIZE: u64 = 20_000_000;
pub const DEFAULT_MAX_FILES_COUNT: u32 = 10;

/// Backend environment. Selects the API base URL unless `api_url` overrides it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Environment {
    #[default]
    Production,
    Development,
    Local,
}

impl Environment {
    pub fn base_url(&self) -> &'static str {
        match self {
            Environment::Production => "https://api.carbon.ai",
            Environment::Development => "https://api.dev.carbon.ai",
            Environment::Local => "http://localhost:8000",
        }
    }
}

impl std::str::FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "PRODUCTION" => Ok(Environment::Production),
            "DEVELOPMENT" => Ok(Environment::Development),
            "LOCAL" => Ok(Environment::Local),
            other => Err(format!("unknown environment '{}'", other)),
        }
    }
}

/// Where the wizard starts when the modal opens.
///
/// Unrecognised identities are kept as `Unknown` so the resolver can report
/// them instead of failing the whole configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EntryPoint {
    IntegrationList,
    Integration(IntegrationName),
    Unknown(String),
}

impl From<String> for EntryPoint {
    fn from(value: String) -> Self {
        if value == "INTEGRATION_LIST" {
            return EntryPoint::IntegrationList;
        }
        match value.parse::<IntegrationName>() {
            Ok(name) => EntryPoint::Integration(name),
            Err(_) => EntryPoint::Unknown(value),
        }
    }
}

impl From<EntryPoint> for String {
    fn from(value: EntryPoint) -> Self {
        match value {
            EntryPoint::IntegrationList => "INTEGRATION_LIST".to_string(),
            EntryPoint::Integration(name) => name.as_str().to_string(),
            EntryPoint::Unknown(raw) => raw,
        }
    }
}

/// Embedding model requested for ingested content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EmbeddingModel {
    #[default]
    Openai,
    AzureOpenai,
    AzureAdaLarge256,
    AzureAdaLarge1024,
    AzureAdaLarge3072,
    AzureAdaSmall512,
    AzureAdaSmall1536,
    CohereMultilingualV3,
    VertexMultimodal,
    OpenaiAdaLarge256,
    OpenaiAdaLarge1024,
    OpenaiAdaLarge3072,
    OpenaiAdaSmall512,
    OpenaiAdaSmall1536,
}

/// A file extension the upload flow accepts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileType {
    pub extension: String,
}

/// Processing options forwarded verbatim to the backend.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FileSyncConfig {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub auto_synced_source_types: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sync_attachments: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detect_audio_language: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub split_rows: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generate_chunks_only: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip_file_processing: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store_file_only: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parsed_text_format: Option<String>,
}

/// Host-supplied options for one integration. Every field is optional; a
/// present field overrides both the host-wide value and the catalog default.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IntegrationOptions {
    pub id: IntegrationName,
    #[serde(default)]
    pub chunk_size: Option<u32>,
    #[serde(default)]
    pub overlap_size: Option<u32>,
    #[serde(default)]
    pub max_file_size: Option<u64>,
    #[serde(default)]
    pub max_files_count: Option<u32>,
    #[serde(default)]
    pub allow_multiple_files: Option<bool>,
    #[serde(default)]
    pub allowed_file_types: Option<Vec<FileType>>,
    #[serde(default)]
    pub skip_embedding_generation: Option<bool>,
    #[serde(default)]
    pub enable_auto_sync: Option<bool>,
    #[serde(default)]
    pub generate_sparse_vectors: Option<bool>,
    #[serde(default)]
    pub prepend_filename_to_chunks: Option<bool>,
    #[serde(default)]
    pub max_items_per_chunk: Option<u32>,
    #[serde(default)]
    pub sync_files_on_connection: Option<bool>,
    #[serde(default)]
    pub sync_source_items: Option<bool>,
    #[serde(default)]
    pub set_page_as_boundary: Option<bool>,
    #[serde(default)]
    pub use_ocr: Option<bool>,
    #[serde(default)]
    pub parse_pdf_tables_with_ocr: Option<bool>,
    #[serde(default)]
    pub send_deletion_webhooks: Option<bool>,
    #[serde(default)]
    pub incremental_sync: Option<bool>,
    #[serde(default)]
    pub show_files_tab: Option<bool>,
    #[serde(default)]
    pub embedding_model: Option<EmbeddingModel>,
    #[serde(default)]
    pub file_sync_config: Option<FileSyncConfig>,
}

impl IntegrationOptions {
    pub fn new(id: IntegrationName) -> Self {
        Self {
            id,
            ..Default::default()
        }
    }
}

/// Behaviour knobs of the connect flow itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectSettings {
    /// How long the success banner stays up before the flow closes.
    #[serde(default = "default_success_close_delay_ms")]
    pub success_close_delay_ms: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_success_close_delay_ms() -> u64 {
    3000
}

fn default_user_agent() -> String {
    format!("carbon-connect/{}", env!("CARGO_PKG_VERSION"))
}

impl ConnectSettings {
    pub fn success_close_delay(&self) -> Duration {
        Duration::from_millis(self.success_close_delay_ms)
    }
}

impl Default for ConnectSettings {
    fn default() -> Self {
        Self {
            success_close_delay_ms: default_success_close_delay_ms(),
            user_agent: default_user_agent(),
        }
    }
}

/// Complete host configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostConfig {
    #[serde(default)]
    pub org_name: String,
    #[serde(default)]
    pub brand_icon: String,
    #[serde(default)]
    pub environment: Environment,
    /// Overrides the environment's base URL when set.
    #[serde(default)]
    pub api_url: Option<String>,
    #[serde(default)]
    pub entry_point: Option<EntryPoint>,
    #[serde(default = "default_enabled_integrations")]
    pub enabled_integrations: Vec<IntegrationOptions>,
    /// Unset falls through to the catalog default, then 1500.
    #[serde(default)]
    pub chunk_size: Option<u32>,
    /// Unset falls through to the catalog default, then 20.
    #[serde(default)]
    pub overlap_size: Option<u32>,
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,
    #[serde(default)]
    pub allow_multiple_files: bool,
    #[serde(default)]
    pub open: bool,
    #[serde(default)]
    pub always_open: bool,
    #[serde(default)]
    pub use_request_ids: bool,
    #[serde(default)]
    pub use_ocr: bool,
    #[serde(default)]
    pub parse_pdf_tables_with_ocr: bool,
    #[serde(default)]
    pub embedding_model: EmbeddingModel,
    #[serde(default)]
    pub generate_sparse_vectors: bool,
    #[serde(default)]
    pub prepend_filename_to_chunks: bool,
    #[serde(default)]
    pub max_items_per_chunk: Option<u32>,
    #[serde(default)]
    pub set_page_as_boundary: bool,
    #[serde(default)]
    pub send_deletion_webhooks: bool,
    #[serde(default = "default_true")]
    pub show_files_tab: bool,
    #[serde(default)]
    pub tags: BTreeMap<String, serde_json::Value>,
    #[serde(default)]
    pub file_sync_config: Option<FileSyncConfig>,
    #[serde(default)]
    pub connect: ConnectSettings,
}

fn default_true() -> bool {
    true
}

fn default_max_file_size() -> u64 {
    DEFAULT_MAX_FILE_SIZE
}

fn default_enabled_integrations() -> Vec<IntegrationOptions> {
    vec![IntegrationOptions {
        id: IntegrationName::LocalFiles,
        chunk_size: Some(100),
        overlap_size: Some(10),
        max_file_size: Some(DEFAULT_MAX_FILE_SIZE),
        allow_multiple_files: Some(true),
        skip_embedding_generation: Some(false),
        set_page_as_boundary: Some(false),
        send_deletion_webhooks: Some(false),
        allowed_file_types: Some(
            ["csv", "txt", "pdf"]
                .iter()
                .map(|ext| FileType {
                    extension: ext.to_string(),
                })
                .collect(),
        ),
        ..IntegrationOptions::new(IntegrationName::LocalFiles)
    }]
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            org_name: String::new(),
            brand_icon: String::new(),
            environment: Environment::default(),
            api_url: None,
            entry_point: None,
            enabled_integrations: default_enabled_integrations(),
            chunk_size: None,
            overlap_size: None,
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            allow_multiple_files: false,
            open: false,
            always_open: false,
            use_request_ids: false,
            use_ocr: false,
            parse_pdf_tables_with_ocr: false,
            embedding_model: EmbeddingModel::default(),
            generate_sparse_vectors: false,
            prepend_filename_to_chunks: false,
            max_items_per_chunk: None,
            set_page_as_boundary: false,
            send_deletion_webhooks: false,
            show_files_tab: true,
            tags: BTreeMap::new(),
            file_sync_config: None,
            connect: ConnectSettings::default(),
        }
    }
}

impl HostConfig {
    /// Base URL for backend requests, without a trailing slash.
    pub fn base_url(&self) -> String {
        match self.api_url.as_deref().map(str::trim) {
            Some(url) if !url.is_empty() => url.trim_end_matches('/').to_string(),
            _ => self.environment.base_url().to_string(),
        }
    }

    /// Host options for one integration (first entry wins on duplicates).
    pub fn options_for(&self, id: IntegrationName) -> Option<&IntegrationOptions> {
        self.enabled_integrations.iter().find(|o| o.id == id)
    }
}

/// Load configuration from TOML file
pub fn load_config(path: &Path) -> Result<HostConfig> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    toml::from_str(&contents)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}
