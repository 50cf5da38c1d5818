//! Integration catalog - Static registry of known data sources.
//!
//! Each [`IntegrationDescriptor`] describes one third-party source: how it is
//! displayed, which wizard flow it uses, which backend endpoint it connects
//! through, the credentials its form requires and the default limits it
//! brings. Descriptors are `'static` and never change after process start.

mod catalog;

pub use catalog::{catalog, descriptor};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identity of an integration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IntegrationName {
    #[default]
    LocalFiles,
    Notion,
    WebScraper,
    GoogleDrive,
    Intercom,
    Dropbox,
    Onedrive,
    Box,
    Zendesk,
    Sharepoint,
    Confluence,
    Gmail,
    Freshdesk,
    Salesforce,
    Github,
    Slack,
    Guru,
    Servicenow,
}

impl IntegrationName {
    /// Wire identifier (e.g. "GURU", "LOCAL_FILES").
    pub fn as_str(&self) -> &'static str {
        match self {
            IntegrationName::LocalFiles => "LOCAL_FILES",
            IntegrationName::Notion => "NOTION",
            IntegrationName::WebScraper => "WEB_SCRAPER",
            IntegrationName::GoogleDrive => "GOOGLE_DRIVE",
            IntegrationName::Intercom => "INTERCOM",
            IntegrationName::Dropbox => "DROPBOX",
            IntegrationName::Onedrive => "ONEDRIVE",
            IntegrationName::Box => "BOX",
            IntegrationName::Zendesk => "ZENDESK",
            IntegrationName::Sharepoint => "SHAREPOINT",
            IntegrationName::Confluence => "CONFLUENCE",
            IntegrationName::Gmail => "GMAIL",
            IntegrationName::Freshdesk => "FRESHDESK",
            IntegrationName::Salesforce => "SALESFORCE",
            IntegrationName::Github => "GITHUB",
            IntegrationName::Slack => "SLACK",
            IntegrationName::Guru => "GURU",
            IntegrationName::Servicenow => "SERVICENOW",
        }
    }

    /// All known identities, in catalog order.
    pub fn all() -> &'static [IntegrationName] {
        &[
            IntegrationName::LocalFiles,
            IntegrationName::Notion,
            IntegrationName::WebScraper,
            IntegrationName::GoogleDrive,
            IntegrationName::Intercom,
            IntegrationName::Dropbox,
            IntegrationName::Onedrive,
            IntegrationName::Box,
            IntegrationName::Zendesk,
            IntegrationName::Sharepoint,
            IntegrationName::Confluence,
            IntegrationName::Gmail,
            IntegrationName::Freshdesk,
            IntegrationName::Salesforce,
            IntegrationName::Github,
            IntegrationName::Slack,
            IntegrationName::Guru,
            IntegrationName::Servicenow,
        ]
    }
}

impl fmt::Display for IntegrationName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IntegrationName {
    type Err = UnknownIntegration;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_uppercase().replace('-', "_");
        IntegrationName::all()
            .iter()
            .copied()
            .find(|name| name.as_str() == wanted)
            .ok_or_else(|| UnknownIntegration(s.to_string()))
    }
}

/// Returned when a string does not name any integration.
#[derive(Debug, Clone, PartialEq)]
pub struct UnknownIntegration(pub String);

impl fmt::Display for UnknownIntegration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown integration '{}'", self.0)
    }
}

impl std::error::Error for UnknownIntegration {}

/// Which wizard flow an integration runs through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowKind {
    /// Credential form, then a confirmation banner (Guru, Freshdesk).
    Credentials,
    /// Credential form, then a file/repository selector (GitHub).
    FilePicker,
    /// Local file upload wizard.
    Upload,
    /// Redirect to a third-party OAuth consent page.
    OAuth,
}

/// A credential the connect form must collect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CredentialField {
    /// Key used in the connect request body.
    pub key: &'static str,
    /// Banner shown when the field is left empty.
    pub missing_message: &'static str,
}

/// Capability flags surfaced to the renderer and the resolver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Capabilities {
    pub file_picker: bool,
    pub ocr: bool,
    pub sparse_vectors: bool,
}

/// Catalog default limits. `None` defers to the host or the hardcoded default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DefaultLimits {
    pub chunk_size: Option<u32>,
    pub overlap_size: Option<u32>,
    pub max_file_size: Option<u64>,
    pub max_files_count: Option<u32>,
}

/// Static catalog entry for one integration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntegrationDescriptor {
    pub id: IntegrationName,
    pub name: &'static str,
    pub description: &'static str,
    pub logo: &'static str,
    /// Source type used by the backend (and as the request-id key).
    pub data_source_type: &'static str,
    /// Inactive entries are never offered, even when a host enables them.
    pub active: bool,
    pub flow: FlowKind,
    /// Path segment under `/integrations/` for credential connects.
    pub endpoint: Option<&'static str>,
    pub credentials: &'static [CredentialField],
    pub capabilities: Capabilities,
    pub defaults: DefaultLimits,
}
