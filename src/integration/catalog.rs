//! Built-in integration descriptors.
//!
//! Order matters: resolved integrations are presented in catalog order.

use super::{
    Capabilities, CredentialField, DefaultLimits, FlowKind, IntegrationDescriptor, IntegrationName,
};

const NO_CREDENTIALS: &[CredentialField] = &[];

const GURU_CREDENTIALS: &[CredentialField] = &[
    CredentialField {
        key: "username",
        missing_message: "Please enter your Guru username",
    },
    CredentialField {
        key: "access_token",
        missing_message: "Please enter your access token.",
    },
];

const GITHUB_CREDENTIALS: &[CredentialField] = &[
    CredentialField {
        key: "username",
        missing_message: "Please enter your Github username.",
    },
    CredentialField {
        key: "access_token",
        missing_message: "Please enter your access token.",
    },
];

const FRESHDESK_CREDENTIALS: &[CredentialField] = &[
    CredentialField {
        key: "domain",
        missing_message: "Please enter your Freshdesk domain.",
    },
    CredentialField {
        key: "api_key",
        missing_message: "Please enter your API key.",
    },
];

const DOCUMENT_CAPABILITIES: Capabilities = Capabilities {
    file_picker: true,
    ocr: true,
    sparse_vectors: true,
};

const TEXT_CAPABILITIES: Capabilities = Capabilities {
    file_picker: false,
    ocr: false,
    sparse_vectors: true,
};

const fn oauth(
    id: IntegrationName,
    name: &'static str,
    description: &'static str,
    logo: &'static str,
    data_source_type: &'static str,
    active: bool,
    capabilities: Capabilities,
) -> IntegrationDescriptor {
    IntegrationDescriptor {
        id,
        name,
        description,
        logo,
        data_source_type,
        active,
        flow: FlowKind::OAuth,
        endpoint: None,
        credentials: NO_CREDENTIALS,
        capabilities,
        defaults: DefaultLimits {
            chunk_size: None,
            overlap_size: None,
            max_file_size: None,
            max_files_count: None,
        },
    }
}

static CATALOG: &[IntegrationDescriptor] = &[
    IntegrationDescriptor {
        id: IntegrationName::LocalFiles,
        name: "File Upload",
        description: "Upload files from your computer",
        logo: "logos/local_files.svg",
        data_source_type: "LOCAL_FILES",
        active: true,
        flow: FlowKind::Upload,
        endpoint: None,
        credentials: NO_CREDENTIALS,
        capabilities: DOCUMENT_CAPABILITIES,
        defaults: DefaultLimits {
            chunk_size: None,
            overlap_size: None,
            max_file_size: Some(20_000_000),
            max_files_count: Some(10),
        },
    },
    oauth(
        IntegrationName::Notion,
        "Notion",
        "Connect your Notion accounts",
        "logos/notion.svg",
        "NOTION",
        true,
        TEXT_CAPABILITIES,
    ),
    IntegrationDescriptor {
        id: IntegrationName::WebScraper,
        name: "Web Scraper",
        description: "Scrape content from any website",
        logo: "logos/web_scraper.svg",
        data_source_type: "WEB_SCRAPE",
        active: false,
        flow: FlowKind::Credentials,
        endpoint: Some("web_scrape"),
        credentials: &[CredentialField {
            key: "url",
            missing_message: "Please enter at least one URL.",
        }],
        capabilities: TEXT_CAPABILITIES,
        defaults: DefaultLimits {
            chunk_size: None,
            overlap_size: None,
            max_file_size: None,
            max_files_count: None,
        },
    },
    oauth(
        IntegrationName::GoogleDrive,
        "Google Drive",
        "Connect your Google Drive accounts",
        "logos/google_drive.svg",
        "GOOGLE_DRIVE",
        true,
        DOCUMENT_CAPABILITIES,
    ),
    oauth(
        IntegrationName::Intercom,
        "Intercom",
        "Connect your Intercom accounts",
        "logos/intercom.svg",
        "INTERCOM",
        true,
        TEXT_CAPABILITIES,
    ),
    oauth(
        IntegrationName::Dropbox,
        "Dropbox",
        "Connect your Dropbox accounts",
        "logos/dropbox.svg",
        "DROPBOX",
        true,
        DOCUMENT_CAPABILITIES,
    ),
    oauth(
        IntegrationName::Onedrive,
        "OneDrive",
        "Connect your OneDrive accounts",
        "logos/onedrive.svg",
        "ONEDRIVE",
        true,
        DOCUMENT_CAPABILITIES,
    ),
    oauth(
        IntegrationName::Box,
        "Box",
        "Connect your Box accounts",
        "logos/box.svg",
        "BOX",
        true,
        DOCUMENT_CAPABILITIES,
    ),
    oauth(
        IntegrationName::Zendesk,
        "Zendesk",
        "Connect your Zendesk accounts",
        "logos/zendesk.svg",
        "ZENDESK",
        true,
        TEXT_CAPABILITIES,
    ),
    oauth(
        IntegrationName::Sharepoint,
        "Sharepoint",
        "Connect your Sharepoint accounts",
        "logos/sharepoint.svg",
        "SHAREPOINT",
        true,
        DOCUMENT_CAPABILITIES,
    ),
    oauth(
        IntegrationName::Confluence,
        "Confluence",
        "Connect your Confluence accounts",
        "logos/confluence.svg",
        "CONFLUENCE",
        true,
        TEXT_CAPABILITIES,
    ),
    oauth(
        IntegrationName::Gmail,
        "Gmail",
        "Connect your Gmail accounts",
        "logos/gmail.svg",
        "GMAIL",
        true,
        TEXT_CAPABILITIES,
    ),
    IntegrationDescriptor {
        id: IntegrationName::Freshdesk,
        name: "Freshdesk",
        description: "Connect your Freshdesk accounts",
        logo: "logos/freshdesk.svg",
        data_source_type: "FRESHDESK",
        active: true,
        flow: FlowKind::Credentials,
        endpoint: Some("freshdesk"),
        credentials: FRESHDESK_CREDENTIALS,
        capabilities: TEXT_CAPABILITIES,
        defaults: DefaultLimits {
            chunk_size: None,
            overlap_size: None,
            max_file_size: None,
            max_files_count: None,
        },
    },
    oauth(
        IntegrationName::Salesforce,
        "Salesforce",
        "Connect your Salesforce accounts",
        "logos/salesforce.svg",
        "SALESFORCE",
        false,
        TEXT_CAPABILITIES,
    ),
    IntegrationDescriptor {
        id: IntegrationName::Github,
        name: "Github",
        description: "Connect your Github repositories",
        logo: "logos/github.svg",
        data_source_type: "GITHUB",
        active: true,
        flow: FlowKind::FilePicker,
        endpoint: Some("github"),
        credentials: GITHUB_CREDENTIALS,
        capabilities: Capabilities {
            file_picker: true,
            ocr: false,
            sparse_vectors: true,
        },
        defaults: DefaultLimits {
            chunk_size: None,
            overlap_size: None,
            max_file_size: None,
            max_files_count: None,
        },
    },
    oauth(
        IntegrationName::Slack,
        "Slack",
        "Connect your Slack workspaces",
        "logos/slack.svg",
        "SLACK",
        true,
        TEXT_CAPABILITIES,
    ),
    IntegrationDescriptor {
        id: IntegrationName::Guru,
        name: "Guru",
        description: "Connect your Guru accounts",
        logo: "logos/guru.svg",
        data_source_type: "GURU",
        active: true,
        flow: FlowKind::Credentials,
        endpoint: Some("guru"),
        credentials: GURU_CREDENTIALS,
        capabilities: TEXT_CAPABILITIES,
        defaults: DefaultLimits {
            chunk_size: None,
            overlap_size: None,
            max_file_size: None,
            max_files_count: None,
        },
    },
    oauth(
        IntegrationName::Servicenow,
        "ServiceNow",
        "Connect your ServiceNow instances",
        "logos/servicenow.svg",
        "SERVICENOW",
        false,
        TEXT_CAPABILITIES,
    ),
];

/// Returns every known descriptor, active or not, in catalog order.
pub fn catalog() -> &'static [IntegrationDescriptor] {
    CATALOG
}

/// Looks up one descriptor by identity.
pub fn descriptor(id: IntegrationName) -> Option<&'static IntegrationDescriptor> {
    CATALOG.iter().find(|d| d.id == id)
}
