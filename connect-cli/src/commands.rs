use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use carbon_connect::connect::ConnectOutcome;
use carbon_connect::events::TracingSink;
use carbon_connect::integration::IntegrationName;
use carbon_connect::session::{AccessToken, LoadState, TokenFetcher};
use carbon_connect::upload::{SelectedFile, SimulatedUploader};
use carbon_connect::{CarbonProvider, HostConfig, SubmitOutcome};
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

/// Reads the access token from `CARBON_ACCESS_TOKEN` on every refresh.
struct EnvTokenFetcher;

#[async_trait]
impl TokenFetcher for EnvTokenFetcher {
    async fn fetch_token(&self) -> Result<AccessToken> {
        let access_token = std::env::var("CARBON_ACCESS_TOKEN")
            .context("CARBON_ACCESS_TOKEN is required to talk to the backend")?;
        Ok(AccessToken { access_token })
    }
}

fn mount(host: HostConfig) -> CarbonProvider {
    CarbonProvider::new(
        host,
        Some(Arc::new(EnvTokenFetcher)),
        Some(Arc::new(TracingSink)),
    )
}

async fn mount_and_initialize(host: HostConfig) -> CarbonProvider {
    let provider = mount(host);
    if provider.initialize().await == LoadState::Failed {
        warn!("Session start failed, continuing without organization limits");
    }
    provider
}

fn parse_integration(raw: &str) -> Result<IntegrationName> {
    raw.parse::<IntegrationName>()
        .map_err(|e| anyhow!("{}", e))
}

fn parse_field(raw: &str) -> Result<(&str, &str)> {
    raw.split_once('=')
        .with_context(|| format!("Expected KEY=VALUE, got '{}'", raw))
}

pub fn integrations(host: HostConfig, json: bool) -> Result<()> {
    let provider = mount(host);
    let resolution = provider.resolution();

    if json {
        let list: Vec<_> = resolution
            .integrations
            .iter()
            .map(|p| {
                json!({
                    "id": p.id(),
                    "name": p.name(),
                    "chunk_size": p.config.chunk_size,
                    "chunk_overlap": p.config.overlap_size,
                    "max_file_size": p.config.max_file_size,
                })
            })
            .collect();
        let errors: Vec<_> = resolution.errors.iter().map(|e| e.to_string()).collect();
        println!(
            "{}",
            serde_json::to_string_pretty(&json!({ "integrations": list, "errors": errors }))?
        );
        return Ok(());
    }

    for p in &resolution.integrations {
        println!(
            "{:<14} {:<14} chunk={} overlap={}",
            p.id(),
            p.name(),
            p.config.chunk_size,
            p.config.overlap_size
        );
    }
    for e in &resolution.errors {
        println!("warning: {}", e);
    }
    Ok(())
}

pub async fn connect(host: HostConfig, integration: &str, fields: &[String]) -> Result<()> {
    let id = parse_integration(integration)?;
    let provider = mount_and_initialize(host).await;
    provider.open_integration(id)?;
    for raw in fields {
        let (key, value) = parse_field(raw)?;
        provider.set_credential(key, value);
    }

    match provider.submit_credentials().await? {
        SubmitOutcome::Invalid(e) => bail!("{}", e),
        SubmitOutcome::Finished(outcome) | SubmitOutcome::Stale(outcome) => match outcome {
            ConnectOutcome::Connected { data, .. } => {
                info!(integration = %id, "Connected");
                println!("{}", serde_json::to_string_pretty(&data)?);
                Ok(())
            }
            ConnectOutcome::Rejected { status, message } => {
                bail!("{} (status {})", message, status)
            }
            ConnectOutcome::Unreachable { message } => bail!("{}", message),
        },
    }
}

pub async fn oauth(host: HostConfig, integration: &str) -> Result<()> {
    let id = parse_integration(integration)?;
    let provider = mount_and_initialize(host).await;
    provider.open_integration(id)?;

    match provider.launch_oauth().await? {
        ConnectOutcome::Connected { .. } => {
            let url = provider
                .snapshot()
                .oauth_url
                .context("Backend returned no OAuth URL")?;
            println!("{}", url);
            Ok(())
        }
        ConnectOutcome::Rejected { message, .. } | ConnectOutcome::Unreachable { message } => {
            bail!("{}", message)
        }
    }
}

pub async fn upload(host: HostConfig, paths: &[PathBuf], dry_run: bool) -> Result<()> {
    let mut provider = mount_and_initialize(host).await;
    if dry_run {
        provider = provider.with_uploader(Arc::new(SimulatedUploader::default()));
    }
    provider.open_integration(IntegrationName::LocalFiles)?;

    let mut files = Vec::with_capacity(paths.len());
    for path in paths {
        files.push(SelectedFile::from_path(path).await?);
    }
    provider.select_files(files)?;

    let report = provider.upload_selected().await?;

    for data in &report.uploaded {
        println!("{}", data);
    }
    for (name, message) in &report.failed {
        eprintln!("{}: {}", name, message);
    }
    if !report.failed.is_empty() {
        bail!("{} file(s) failed to upload", report.failed.len());
    }
    Ok(())
}
