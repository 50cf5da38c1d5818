//! Configuration resolver - Merges host options over catalog defaults.
//!
//! For every catalog entry that is active and listed in the host's
//! `enabled_integrations`, produces one [`ProcessedIntegration`] carrying the
//! effective configuration. Precedence on every overlapping key:
//!
//! ```text
//! host per-integration  >  host global  >  catalog default  >  hardcoded default
//! ```
//!
//! Numeric limits are the exception: they take the most restrictive value
//! over all sources that set one.
//!
//! Configuration mistakes are collected as [`ConfigError`]s and logged. They
//! never fail resolution.

#[cfg(test)]
mod tests;

use std::collections::BTreeMap;
use std::fmt;
use tracing::{error, info, warn};

use crate::config::{
    EmbeddingModel, EntryPoint, FileSyncConfig, HostConfig, IntegrationOptions,
    DEFAULT_CHUNK_SIZE, DEFAULT_MAX_FILES_COUNT, DEFAULT_MAX_FILE_SIZE, DEFAULT_OVERLAP_SIZE,
};
use crate::integration::{IntegrationDescriptor, IntegrationName};
use crate::session::CustomLimits;

/// Configuration problems found while resolving. Logged, never thrown.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Entry point does not name any catalog integration.
    UnknownEntryPoint(String),
    /// Entry point is in the catalog but not enabled (or inactive).
    EntryPointNotEnabled(IntegrationName),
    /// Host enabled an integration the catalog does not carry.
    MissingCatalogEntry(IntegrationName),
    /// Host enabled an integration the catalog marks inactive.
    IntegrationInactive(IntegrationName),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::UnknownEntryPoint(raw) => write!(
                f,
                "Invalid entry point '{}'. Make sure that right integration id is passed.",
                raw
            ),
            ConfigError::EntryPointNotEnabled(id) => write!(
                f,
                "Entry point {} is not enabled. Make sure it is enabled through enabled_integrations.",
                id
            ),
            ConfigError::MissingCatalogEntry(id) => {
                write!(f, "integration {} has no catalog entry", id)
            }
            ConfigError::IntegrationInactive(id) => {
                write!(f, "integration {} is not active and will not be offered", id)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Effective configuration for one integration after merging.
#[derive(Debug, Clone, PartialEq)]
pub struct EffectiveIntegrationConfig {
    pub chunk_size: u32,
    pub overlap_size: u32,
    /// Host and catalog limit, before organization limits are applied.
    pub max_file_size: u64,
    pub max_files_count: u32,
    pub allow_multiple_files: bool,
    /// Lowercase extensions without the dot. Empty accepts anything.
    pub allowed_extensions: Vec<String>,
    pub skip_embedding_generation: bool,
    pub enable_auto_sync: bool,
    pub generate_sparse_vectors: bool,
    pub prepend_filename_to_chunks: bool,
    pub max_items_per_chunk: Option<u32>,
    pub sync_files_on_connection: bool,
    pub sync_source_items: bool,
    pub set_page_as_boundary: bool,
    pub use_ocr: bool,
    pub parse_pdf_tables_with_ocr: bool,
    pub send_deletion_webhooks: bool,
    pub incremental_sync: bool,
    pub show_files_tab: bool,
    pub embedding_model: EmbeddingModel,
    pub file_sync_config: Option<FileSyncConfig>,
    pub tags: BTreeMap<String, serde_json::Value>,
}

/// A catalog entry the host enabled, with its merged configuration.
#[derive(Debug, Clone)]
pub struct ProcessedIntegration {
    pub descriptor: &'static IntegrationDescriptor,
    /// The host entry this was built from, kept for limit resolution.
    pub options: IntegrationOptions,
    pub config: EffectiveIntegrationConfig,
}

impl ProcessedIntegration {
    pub fn id(&self) -> IntegrationName {
        self.descriptor.id
    }

    pub fn name(&self) -> &'static str {
        self.descriptor.name
    }
}

/// Output of [`resolve`].
#[derive(Debug, Clone, Default)]
pub struct Resolution {
    /// In catalog order.
    pub integrations: Vec<ProcessedIntegration>,
    /// Deep-link target. `None` opens the integration list.
    pub entry: Option<IntegrationName>,
    pub errors: Vec<ConfigError>,
}

impl Resolution {
    pub fn get(&self, id: IntegrationName) -> Option<&ProcessedIntegration> {
        self.integrations.iter().find(|p| p.id() == id)
    }

    pub fn is_enabled(&self, id: IntegrationName) -> bool {
        self.get(id).is_some()
    }

    /// The resolved entry-point integration, if any.
    pub fn entry_integration(&self) -> Option<&ProcessedIntegration> {
        self.entry.and_then(|id| self.get(id))
    }
}

/// Resolve `host` against `catalog`.
pub fn resolve(catalog: &'static [IntegrationDescriptor], host: &HostConfig) -> Resolution {
    let mut errors = Vec::new();

    for options in &host.enabled_integrations {
        match catalog.iter().find(|d| d.id == options.id) {
            None => errors.push(ConfigError::MissingCatalogEntry(options.id)),
            Some(d) if !d.active => errors.push(ConfigError::IntegrationInactive(options.id)),
            Some(_) => {}
        }
    }

    let integrations: Vec<ProcessedIntegration> = catalog
        .iter()
        .filter(|d| d.active)
        .filter_map(|descriptor| {
            host.options_for(descriptor.id).map(|options| ProcessedIntegration {
                descriptor,
                options: options.clone(),
                config: effective_config(descriptor, options, host),
            })
        })
        .collect();

    let entry = match &host.entry_point {
        None | Some(EntryPoint::IntegrationList) => None,
        Some(EntryPoint::Unknown(raw)) => {
            errors.push(ConfigError::UnknownEntryPoint(raw.clone()));
            None
        }
        Some(EntryPoint::Integration(id)) => {
            if integrations.iter().any(|p| p.id() == *id) {
                Some(*id)
            } else if catalog.iter().any(|d| d.id == *id) {
                errors.push(ConfigError::EntryPointNotEnabled(*id));
                None
            } else {
                errors.push(ConfigError::UnknownEntryPoint(id.to_string()));
                None
            }
        }
    };

    for e in &errors {
        match e {
            ConfigError::IntegrationInactive(_) => warn!(error = %e, "Configuration warning"),
            _ => error!(error = %e, "Configuration error"),
        }
    }
    info!(
        enabled = integrations.len(),
        entry = ?entry,
        errors = errors.len(),
        "Resolved integrations"
    );

    Resolution {
        integrations,
        entry,
        errors,
    }
}

fn effective_config(
    descriptor: &IntegrationDescriptor,
    options: &IntegrationOptions,
    host: &HostConfig,
) -> EffectiveIntegrationConfig {
    let caps = descriptor.capabilities;
    let defaults = descriptor.defaults;

    let allow_multiple_files = options
        .allow_multiple_files
        .unwrap_or(host.allow_multiple_files);
    let max_files_count = most_restrictive(&[options.max_files_count, defaults.max_files_count])
        .unwrap_or(DEFAULT_MAX_FILES_COUNT);

    EffectiveIntegrationConfig {
        chunk_size: options
            .chunk_size
            .or(host.chunk_size)
            .or(defaults.chunk_size)
            .unwrap_or(DEFAULT_CHUNK_SIZE),
        overlap_size: options
            .overlap_size
            .or(host.overlap_size)
            .or(defaults.overlap_size)
            .unwrap_or(DEFAULT_OVERLAP_SIZE),
        max_file_size: most_restrictive(&[
            options.max_file_size,
            Some(host.max_file_size),
            defaults.max_file_size,
        ])
        .unwrap_or(DEFAULT_MAX_FILE_SIZE),
        max_files_count: if allow_multiple_files { max_files_count } else { 1 },
        allow_multiple_files,
        allowed_extensions: options
            .allowed_file_types
            .as_deref()
            .unwrap_or_default()
            .iter()
            .map(|t| normalize_extension(&t.extension))
            .filter(|e| !e.is_empty())
            .collect(),
        skip_embedding_generation: options.skip_embedding_generation.unwrap_or(false),
        enable_auto_sync: options.enable_auto_sync.unwrap_or(false),
        generate_sparse_vectors: caps.sparse_vectors
            && options
                .generate_sparse_vectors
                .unwrap_or(host.generate_sparse_vectors),
        prepend_filename_to_chunks: options
            .prepend_filename_to_chunks
            .unwrap_or(host.prepend_filename_to_chunks),
        max_items_per_chunk: options.max_items_per_chunk.or(host.max_items_per_chunk),
        sync_files_on_connection: options.sync_files_on_connection.unwrap_or(true),
        sync_source_items: options.sync_source_items.unwrap_or(true),
        set_page_as_boundary: options
            .set_page_as_boundary
            .unwrap_or(host.set_page_as_boundary),
        use_ocr: caps.ocr && options.use_ocr.unwrap_or(host.use_ocr),
        parse_pdf_tables_with_ocr: caps.ocr
            && options
                .parse_pdf_tables_with_ocr
                .unwrap_or(host.parse_pdf_tables_with_ocr),
        send_deletion_webhooks: options
            .send_deletion_webhooks
            .unwrap_or(host.send_deletion_webhooks),
        incremental_sync: options.incremental_sync.unwrap_or(false),
        show_files_tab: options.show_files_tab.unwrap_or(host.show_files_tab),
        embedding_model: options.embedding_model.unwrap_or(host.embedding_model),
        file_sync_config: options
            .file_sync_config
            .clone()
            .or_else(|| host.file_sync_config.clone()),
        tags: host.tags.clone(),
    }
}

/// Limits that apply to a file selection.
#[derive(Debug, Clone, PartialEq)]
pub struct FileLimits {
    pub max_file_size: u64,
    pub max_files_count: u32,
    pub allow_multiple_files: bool,
    pub allowed_extensions: Vec<String>,
}

/// File limits for `integration`, folding in organization limits when loaded.
///
/// Every source that sets a limit is consulted and the smallest wins. An
/// organization that has not loaded yet imposes nothing.
pub fn file_limits(
    integration: &ProcessedIntegration,
    host: &HostConfig,
    org: Option<&CustomLimits>,
) -> FileLimits {
    let options = &integration.options;
    let defaults = integration.descriptor.defaults;
    let org = org.copied().unwrap_or_default();

    let max_file_size = most_restrictive(&[
        org.file_size_limit,
        options.max_file_size,
        Some(host.max_file_size),
        defaults.max_file_size,
    ])
    .unwrap_or(DEFAULT_MAX_FILE_SIZE);

    let allow_multiple_files = integration.config.allow_multiple_files;
    let max_files_count = if allow_multiple_files {
        most_restrictive(&[
            org.max_files_count,
            options.max_files_count,
            defaults.max_files_count,
        ])
        .unwrap_or(DEFAULT_MAX_FILES_COUNT)
    } else {
        1
    };

    FileLimits {
        max_file_size,
        max_files_count,
        allow_multiple_files,
        allowed_extensions: integration.config.allowed_extensions.clone(),
    }
}

/// Smallest of the values that are set.
pub fn most_restrictive<T: Ord + Copy>(sources: &[Option<T>]) -> Option<T> {
    sources.iter().flatten().copied().min()
}

fn normalize_extension(raw: &str) -> String {
    raw.trim().trim_start_matches('.').to_ascii_lowercase()
}
