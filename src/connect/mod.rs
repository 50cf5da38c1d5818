//! Connect operation - Credential validation, the authenticated POST and
//! normalisation of its single outcome.
//!
//! Callers drive the sequence:
//!
//! 1. [`validate_credentials`]: local check, no network, no host callback
//! 2. host `on_success` with `INITIATE`
//! 3. [`execute`]: `POST {base}/integrations/{endpoint}`
//! 4. map the [`ConnectOutcome`] to a banner and at most one host event

mod payload;

#[cfg(test)]
mod tests;

pub use payload::connect_payload;

use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use tracing::{error, info, warn};

use crate::events::{Banner, HostEvent};
use crate::integration::IntegrationDescriptor;
use crate::resolver::ProcessedIntegration;
use crate::session::{FetchRequest, FetchResponse, Session};

/// A required credential was empty.
#[derive(Debug, Clone, PartialEq)]
pub struct CredentialError {
    pub field: &'static str,
    pub message: &'static str,
}

impl fmt::Display for CredentialError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message)
    }
}

impl std::error::Error for CredentialError {}

/// Check every required field is present and non-blank.
///
/// Returns the trimmed values of the required fields. Fields the descriptor
/// does not declare are dropped.
pub fn validate_credentials(
    descriptor: &IntegrationDescriptor,
    credentials: &BTreeMap<String, String>,
) -> Result<BTreeMap<String, String>, CredentialError> {
    let mut accepted = BTreeMap::new();
    for field in descriptor.credentials {
        let value = credentials
            .get(field.key)
            .map(|v| v.trim())
            .unwrap_or_default();
        if value.is_empty() {
            return Err(CredentialError {
                field: field.key,
                message: field.missing_message,
            });
        }
        accepted.insert(field.key.to_string(), value.to_string());
    }
    Ok(accepted)
}

/// Result of one connect attempt. Exactly one per attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum ConnectOutcome {
    /// Backend accepted the connection (status 200).
    Connected { status: u16, data: Value },
    /// Backend answered with an error status.
    Rejected { status: u16, message: String },
    /// No usable response.
    Unreachable { message: String },
}

impl ConnectOutcome {
    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectOutcome::Connected { .. })
    }

    /// Banner for the active flow.
    pub fn banner(&self, integration_name: &str) -> Banner {
        match self {
            ConnectOutcome::Connected { .. } => Banner::success(success_message(integration_name)),
            ConnectOutcome::Rejected { message, .. } | ConnectOutcome::Unreachable { message } => {
                Banner::error(message.clone())
            }
        }
    }

    /// Host error event, for the failure outcomes only.
    pub fn host_error(&self, integration: &ProcessedIntegration) -> Option<HostEvent> {
        match self {
            ConnectOutcome::Connected { .. } => None,
            ConnectOutcome::Rejected { status, message } => {
                Some(HostEvent::error(integration.id(), *status, message))
            }
            ConnectOutcome::Unreachable { message } => {
                Some(HostEvent::error(integration.id(), 400, message))
            }
        }
    }
}

pub fn success_message(integration_name: &str) -> String {
    format!(
        "{} sync initiated, you will be redirected shortly!",
        integration_name
    )
}

/// Message used whenever the backend gave nothing usable.
pub fn generic_failure_message(integration_name: &str) -> String {
    format!(
        "Error connecting your {} account. Please try again.",
        integration_name
    )
}

/// Send the connect request for a credential-based integration.
///
/// `credentials` must already be validated.
pub async fn execute(
    session: &Session,
    integration: &ProcessedIntegration,
    credentials: &BTreeMap<String, String>,
    request_id: Option<&str>,
) -> ConnectOutcome {
    let name = integration.name();
    let Some(endpoint) = integration.descriptor.endpoint else {
        error!(integration = %integration.id(), "Integration has no connect endpoint");
        return ConnectOutcome::Unreachable {
            message: generic_failure_message(name),
        };
    };

    let url = format!("{}/integrations/{}", session.base_url(), endpoint);
    let body = connect_payload(integration, credentials, request_id);
    info!(integration = %integration.id(), request_id = ?request_id, "Connecting integration");

    let response = session
        .authenticated_fetch(&FetchRequest::post_json(&url, body))
        .await;
    classify(&url, name, response)
}

/// Ask the backend for the consent URL of an OAuth integration.
///
/// On success the `Connected` data carries `oauth_url`.
pub async fn request_oauth_url(
    session: &Session,
    integration: &ProcessedIntegration,
    request_id: Option<&str>,
) -> ConnectOutcome {
    let url = format!("{}/integrations/oauth_url", session.base_url());
    let mut body = connect_payload(integration, &BTreeMap::new(), request_id);
    if let Value::Object(map) = &mut body {
        map.insert(
            "service".to_string(),
            Value::String(integration.descriptor.data_source_type.to_string()),
        );
    }
    info!(integration = %integration.id(), "Requesting OAuth URL");

    let response = session
        .authenticated_fetch(&FetchRequest::post_json(&url, body))
        .await;
    match classify(&url, integration.name(), response) {
        ConnectOutcome::Connected { status, data } => {
            if data.get("oauth_url").and_then(Value::as_str).is_some() {
                ConnectOutcome::Connected { status, data }
            } else {
                error!(url = %url, "OAuth response without oauth_url");
                ConnectOutcome::Unreachable {
                    message: generic_failure_message(integration.name()),
                }
            }
        }
        other => other,
    }
}

fn classify(url: &str, name: &str, response: Option<FetchResponse>) -> ConnectOutcome {
    let Some(response) = response else {
        return ConnectOutcome::Unreachable {
            message: generic_failure_message(name),
        };
    };

    let data = match response.json::<Value>() {
        Ok(data) => data,
        Err(e) => {
            error!(url, status = %response.status, error = %e, "Unreadable connect response");
            return ConnectOutcome::Unreachable {
                message: generic_failure_message(name),
            };
        }
    };

    if response.status.as_u16() == 200 {
        return ConnectOutcome::Connected { status: 200, data };
    }

    let message = data
        .get("detail")
        .and_then(Value::as_str)
        .filter(|d| !d.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| generic_failure_message(name));
    warn!(url, status = %response.status, message = %message, "Connect rejected");
    ConnectOutcome::Rejected {
        status: response.status.as_u16(),
        message,
    }
}
