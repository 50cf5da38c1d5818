use serde_json::{json, Map, Value};
use std::collections::BTreeMap;

use crate::resolver::ProcessedIntegration;

/// JSON body of a connect request: credentials, the resolved processing
/// options and the optional request id.
pub fn connect_payload(
    integration: &ProcessedIntegration,
    credentials: &BTreeMap<String, String>,
    request_id: Option<&str>,
) -> Value {
    let config = &integration.config;
    let mut body = Map::new();

    for (key, value) in credentials {
        body.insert(key.clone(), Value::String(value.clone()));
    }

    body.insert("chunk_size".into(), json!(config.chunk_size));
    body.insert("chunk_overlap".into(), json!(config.overlap_size));
    body.insert(
        "skip_embedding_generation".into(),
        json!(config.skip_embedding_generation),
    );
    body.insert("embedding_model".into(), json!(config.embedding_model));
    body.insert(
        "generate_sparse_vectors".into(),
        json!(config.generate_sparse_vectors),
    );
    body.insert(
        "prepend_filename_to_chunks".into(),
        json!(config.prepend_filename_to_chunks),
    );
    body.insert(
        "sync_files_on_connection".into(),
        json!(config.sync_files_on_connection),
    );
    body.insert("sync_source_items".into(), json!(config.sync_source_items));
    body.insert("set_page_as_boundary".into(), json!(config.set_page_as_boundary));
    body.insert("use_ocr".into(), json!(config.use_ocr));
    body.insert(
        "parse_pdf_tables_with_ocr".into(),
        json!(config.parse_pdf_tables_with_ocr),
    );
    body.insert("enable_auto_sync".into(), json!(config.enable_auto_sync));
    body.insert("incremental_sync".into(), json!(config.incremental_sync));
    body.insert(
        "send_deletion_webhooks".into(),
        json!(config.send_deletion_webhooks),
    );

    if let Some(max) = config.max_items_per_chunk {
        body.insert("max_items_per_chunk".into(), json!(max));
    }
    if !config.tags.is_empty() {
        body.insert("tags".into(), json!(config.tags));
    }
    if let Some(file_sync_config) = &config.file_sync_config {
        body.insert("file_sync_config".into(), json!(file_sync_config));
    }
    if let Some(id) = request_id {
        body.insert("request_id".into(), json!(id));
    }

    Value::Object(body)
}
