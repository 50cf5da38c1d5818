use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use futures::future::join_all;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::{SelectedFile, UploadTracker};
use crate::resolver::EffectiveIntegrationConfig;
use crate::session::{FetchRequest, Session};

/// Transport for one file of a batch.
#[async_trait]
pub trait Uploader: Send + Sync {
    /// Upload `file`, the `index`-th of its batch. Returns the backend's
    /// description of the stored file.
    async fn upload(
        &self,
        index: usize,
        file: &SelectedFile,
        config: &EffectiveIntegrationConfig,
    ) -> Result<Value>;
}

/// Completes file `i` after `(i + 1) * per_file_delay` without any I/O.
#[derive(Debug, Clone)]
pub struct SimulatedUploader {
    pub per_file_delay: Duration,
}

impl Default for SimulatedUploader {
    fn default() -> Self {
        Self {
            per_file_delay: Duration::from_millis(1000),
        }
    }
}

#[async_trait]
impl Uploader for SimulatedUploader {
    async fn upload(
        &self,
        index: usize,
        file: &SelectedFile,
        _config: &EffectiveIntegrationConfig,
    ) -> Result<Value> {
        let delay = self.per_file_delay * (index as u32 + 1);
        tokio::time::sleep(delay).await;
        Ok(json!({ "name": file.name, "size": file.size }))
    }
}

/// Uploads through `POST {base}/uploadfile` as a multipart `file` part.
pub struct ApiUploader {
    session: Arc<Session>,
}

impl ApiUploader {
    pub fn new(session: Arc<Session>) -> Self {
        Self { session }
    }
}

#[async_trait]
impl Uploader for ApiUploader {
    async fn upload(
        &self,
        _index: usize,
        file: &SelectedFile,
        config: &EffectiveIntegrationConfig,
    ) -> Result<Value> {
        let path = file
            .path
            .as_deref()
            .with_context(|| format!("No local path for {}", file.name))?;
        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;

        let mut request = FetchRequest::upload(
            format!("{}/uploadfile", self.session.base_url()),
            file.name.clone(),
            bytes,
        )
        .with_query("chunk_size", config.chunk_size)
        .with_query("chunk_overlap", config.overlap_size)
        .with_query("skip_embedding_generation", config.skip_embedding_generation)
        .with_query("set_page_as_boundary", config.set_page_as_boundary)
        .with_query("embedding_model", embedding_model_param(config))
        .with_query("use_ocr", config.use_ocr)
        .with_query("generate_sparse_vectors", config.generate_sparse_vectors)
        .with_query("prepend_filename_to_chunks", config.prepend_filename_to_chunks)
        .with_query("parse_pdf_tables_with_ocr", config.parse_pdf_tables_with_ocr);
        if let Some(max) = config.max_items_per_chunk {
            request = request.with_query("max_items_per_chunk", max);
        }

        let Some(response) = self.session.authenticated_fetch(&request).await else {
            bail!("Error uploading {}. Please try again.", file.name);
        };
        if !response.status.is_success() {
            let detail = response
                .json::<Value>()
                .ok()
                .and_then(|v| v.get("detail").and_then(Value::as_str).map(str::to_string))
                .unwrap_or_else(|| format!("upload failed with status {}", response.status));
            bail!("{}", detail);
        }
        response
            .json::<Value>()
            .with_context(|| format!("Malformed upload response for {}", file.name))
    }
}

fn embedding_model_param(config: &EffectiveIntegrationConfig) -> String {
    serde_json::to_value(config.embedding_model)
        .ok()
        .and_then(|v| v.as_str().map(str::to_string))
        .unwrap_or_default()
}

/// Outcome of one batch.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub uploaded: Vec<Value>,
    /// `(file name, message)` for every file that failed.
    pub failed: Vec<(String, String)>,
}

/// Upload `files` concurrently, marking each in `tracker` as it finishes.
///
/// The caller starts the batch on `tracker` first. A failed file still counts
/// as finished so the batch always completes.
pub async fn run_batch(
    uploader: &dyn Uploader,
    files: &[SelectedFile],
    config: &EffectiveIntegrationConfig,
    tracker: &UploadTracker,
) -> BatchReport {
    info!(files = files.len(), "Starting upload batch");

    let tasks = files.iter().enumerate().map(|(index, file)| async move {
        let result = uploader.upload(index, file, config).await;
        let progress = tracker.mark_complete(index);
        debug!(file = %file.name, progress, "File finished");
        (file, result)
    });

    let mut report = BatchReport::default();
    for (file, result) in join_all(tasks).await {
        match result {
            Ok(data) => report.uploaded.push(data),
            Err(e) => {
                warn!(file = %file.name, error = %e, "Upload failed");
                report.failed.push((file.name.clone(), e.to_string()));
            }
        }
    }
    info!(
        uploaded = report.uploaded.len(),
        failed = report.failed.len(),
        "Upload batch finished"
    );
    report
}
