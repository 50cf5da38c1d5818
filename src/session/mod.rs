//! Connection session - access token, authenticated requests and request IDs.
//!
//! One [`Session`] exists per mounted provider. It is the only owner of the
//! access token and the request-id correlation table; every mutation goes
//! through its methods.
//!
//! # Token refresh
//!
//! ```text
//! request ──► 401? ──no──► response
//!               │
//!              yes, fetcher configured, first attempt
//!               │
//!          fetch_token() ─► store token ─► retry once ─► response (even if 401)
//! ```
//!
//! Transport failures never propagate: they are logged with the URL and
//! surface as `None`, which callers treat as a failure distinct from an
//! error response.

mod request_id;
mod white_label;


pub use request_id::{generate_request_id, REQUEST_ID_ALPHABET, REQUEST_ID_LENGTH};
pub use white_label::{CustomLimits, WhiteLabeling};

use async_trait::async_trait;
use dashmap::DashMap;
use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tracing::{debug, error, info, warn};

/// Token returned by the host's credential-refresh callback.
#[derive(Debug, Clone, Deserialize)]
pub struct AccessToken {
    pub access_token: String,
}

/// Host-supplied source of access tokens.
#[async_trait]
pub trait TokenFetcher: Send + Sync {
    async fn fetch_token(&self) -> anyhow::Result<AccessToken>;
}

/// Body of an outgoing request. Kept in owned form so a retry can rebuild it.
#[derive(Debug, Clone)]
pub enum RequestBody {
    Empty,
    Json(serde_json::Value),
    File { file_name: String, bytes: Vec<u8> },
}

/// A request that can be sent more than once.
#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub method: Method,
    pub url: String,
    pub query: Vec<(String, String)>,
    pub body: RequestBody,
}

impl FetchRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: Method::GET,
            url: url.into(),
            query: Vec::new(),
            body: RequestBody::Empty,
        }
    }

    pub fn post_json(url: impl Into<String>, body: serde_json::Value) -> Self {
        Self {
            method: Method::POST,
            url: url.into(),
            query: Vec::new(),
            body: RequestBody::Json(body),
        }
    }

    pub fn upload(url: impl Into<String>, file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            method: Method::POST,
            url: url.into(),
            query: Vec::new(),
            body: RequestBody::File {
                file_name: file_name.into(),
                bytes,
            },
        }
    }

    pub fn with_query(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }
}

/// A fully read response.
#[derive(Debug, Clone)]
pub struct FetchResponse {
    pub status: StatusCode,
    pub body: String,
}

impl FetchResponse {
    pub fn json<T: DeserializeOwned>(&self) -> serde_json::Result<T> {
        serde_json::from_str(&self.body)
    }
}

/// Progress of the session-start token and white-labeling load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadState {
    Idle,
    Loading,
    Ready,
    Failed,
}

/// Per-provider connection session.
pub struct Session {
    http_client: Client,
    base_url: String,
    access_token: RwLock<Option<String>>,
    token_fetcher: Option<Arc<dyn TokenFetcher>>,
    request_ids: DashMap<String, String>,
    white_labeling: RwLock<Option<WhiteLabeling>>,
    load_state: RwLock<LoadState>,
}

impl Session {
    /// Create a session against `base_url` (no trailing slash).
    pub fn new(
        base_url: impl Into<String>,
        token_fetcher: Option<Arc<dyn TokenFetcher>>,
        user_agent: &str,
    ) -> Self {
        let http_client = match Client::builder().user_agent(user_agent).build() {
            Ok(client) => client,
            Err(e) => {
                warn!(user_agent, error = %e, "HTTP client rejected settings, using defaults");
                Client::new()
            }
        };
        Self {
            http_client,
            base_url: base_url.into(),
            access_token: RwLock::new(None),
            token_fetcher,
            request_ids: DashMap::new(),
            white_labeling: RwLock::new(None),
            load_state: RwLock::new(LoadState::Idle),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn access_token(&self) -> Option<String> {
        self.access_token
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Replace the stored token. Empty strings clear it.
    pub fn set_access_token(&self, token: Option<String>) {
        let token = token.filter(|t| !t.is_empty());
        *self.access_token.write().unwrap_or_else(|e| e.into_inner()) = token;
    }

    pub fn white_labeling(&self) -> Option<WhiteLabeling> {
        self.white_labeling
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn load_state(&self) -> LoadState {
        *self.load_state.read().unwrap_or_else(|e| e.into_inner())
    }

    fn set_load_state(&self, state: LoadState) {
        *self.load_state.write().unwrap_or_else(|e| e.into_inner()) = state;
    }

    /// Generate a request ID for `data_source_type` and remember it.
    ///
    /// Replaces any earlier ID for the same source.
    pub fn issue_request_id(&self, data_source_type: &str) -> String {
        let id = generate_request_id(REQUEST_ID_LENGTH);
        self.request_ids
            .insert(data_source_type.to_string(), id.clone());
        debug!(data_source_type, request_id = %id, "Issued request id");
        id
    }

    pub fn request_id(&self, data_source_type: &str) -> Option<String> {
        self.request_ids
            .get(data_source_type)
            .map(|entry| entry.value().clone())
    }

    /// Snapshot of the request-id table.
    pub fn request_ids(&self) -> HashMap<String, String> {
        self.request_ids
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect()
    }

    /// Send `request` with the current token, refreshing once on 401.
    ///
    /// Returns `None` on transport failure (including a failed refresh).
    pub async fn authenticated_fetch(&self, request: &FetchRequest) -> Option<FetchResponse> {
        let token = self.access_token();
        let response = match self.send(request, token.as_deref()).await {
            Ok(response) => response,
            Err(e) => {
                error!(url = %request.url, error = %e, "Error in authenticated fetch");
                return None;
            }
        };

        if response.status != StatusCode::UNAUTHORIZED {
            return Some(response);
        }
        let Some(fetcher) = &self.token_fetcher else {
            return Some(response);
        };

        info!(url = %request.url, "Access token rejected, refreshing");
        let refreshed = match fetcher.fetch_token().await {
            Ok(token) => token.access_token,
            Err(e) => {
                error!(url = %request.url, error = %e, "Token refresh failed");
                return None;
            }
        };
        self.set_access_token(Some(refreshed));

        // Single retry: a second 401 is returned as-is.
        let token = self.access_token();
        match self.send(request, token.as_deref()).await {
            Ok(response) => {
                if response.status == StatusCode::UNAUTHORIZED {
                    warn!(url = %request.url, "Refreshed token rejected, giving up");
                }
                Some(response)
            }
            Err(e) => {
                error!(url = %request.url, error = %e, "Error in authenticated fetch");
                None
            }
        }
    }

    async fn send(
        &self,
        request: &FetchRequest,
        token: Option<&str>,
    ) -> Result<FetchResponse, reqwest::Error> {
        let mut builder = self
            .http_client
            .request(request.method.clone(), &request.url);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(token) = token {
            builder = builder.header("Authorization", format!("Token {}", token));
        }
        builder = match &request.body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => builder.json(value),
            RequestBody::File { file_name, bytes } => {
                let part =
                    reqwest::multipart::Part::bytes(bytes.clone()).file_name(file_name.clone());
                builder.multipart(reqwest::multipart::Form::new().part("file", part))
            }
        };

        debug!(method = %request.method, url = %request.url, "Sending request");
        let response = builder.send().await?;
        let status = response.status();
        let body = response.text().await?;
        Ok(FetchResponse { status, body })
    }

    /// Session start: obtain a token, then load white-labeling data.
    ///
    /// Failures are logged and reflected in [`Session::load_state`]; they never
    /// block configuration resolution.
    pub async fn fetch_tokens(&self) -> LoadState {
        self.set_load_state(LoadState::Loading);

        if let Some(fetcher) = &self.token_fetcher {
            match fetcher.fetch_token().await {
                Ok(token) => self.set_access_token(Some(token.access_token)),
                Err(e) => {
                    error!(error = %e, "Error fetching access token");
                    self.set_access_token(None);
                    self.set_load_state(LoadState::Failed);
                    return LoadState::Failed;
                }
            }
        }

        let url = format!("{}/auth/v1/white_labeling", self.base_url);
        let state = match self.authenticated_fetch(&FetchRequest::get(&url)).await {
            Some(response) if response.status.is_success() => {
                match response.json::<WhiteLabeling>() {
                    Ok(data) => {
                        info!(
                            file_size_limit = ?data.custom_limits.file_size_limit,
                            "White-labeling data loaded"
                        );
                        *self
                            .white_labeling
                            .write()
                            .unwrap_or_else(|e| e.into_inner()) = Some(data);
                        LoadState::Ready
                    }
                    Err(e) => {
                        error!(url = %url, error = %e, "Malformed white-labeling response");
                        LoadState::Failed
                    }
                }
            }
            Some(response) => {
                warn!(url = %url, status = %response.status, "White-labeling request rejected");
                LoadState::Failed
            }
            None => LoadState::Failed,
        };
        self.set_load_state(state);
        state
    }
}
