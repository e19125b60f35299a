//! One-shot loader for the static graph description.
//!
//! The loader keeps the last document that validated. A failed load or
//! reload records an error message but never replaces or clears that
//! document, so presentation code can keep drawing the previous graph
//! while showing the error. Failures are not retried automatically.

use std::sync::Arc;

use activity_types::GraphData;
use tracing::{error, info};

use crate::error::GraphLoadError;

/// Keys that must be present (and non-null) at the top level.
const REQUIRED_KEYS: [&str; 3] = ["nodes", "edges", "metadata"];

/// Validate and decode a graph description document.
///
/// # Errors
///
/// Returns [`GraphLoadError::Validation`] if any of `nodes`, `edges`, or
/// `metadata` is missing, and [`GraphLoadError::Parse`] if the bytes are not
/// JSON or do not match the schema.
pub fn parse_graph_document(bytes: &[u8]) -> Result<GraphData, GraphLoadError> {
    let value: serde_json::Value = serde_json::from_slice(bytes)
        .map_err(|e| GraphLoadError::Parse(format!("graph data is not JSON: {e}")))?;

    let missing: Vec<&str> = REQUIRED_KEYS
        .iter()
        .copied()
        .filter(|key| value.get(key).is_none_or(serde_json::Value::is_null))
        .collect();
    if !missing.is_empty() {
        return Err(GraphLoadError::Validation(format!(
            "invalid graph data structure: missing {}",
            missing.join(", ")
        )));
    }

    serde_json::from_value(value)
        .map_err(|e| GraphLoadError::Parse(format!("graph data does not match schema: {e}")))
}

/// Fetches the graph description and remembers the last good copy.
#[derive(Debug, Default)]
pub struct GraphLoader {
    client: reqwest::Client,
    url: Option<String>,
    data: Option<Arc<GraphData>>,
    last_error: Option<String>,
}

impl GraphLoader {
    /// Create a loader with nothing loaded yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the document at `url` and make it the known-good state.
    ///
    /// `http://` and `https://` URLs are fetched; anything else is read as
    /// a local file path (an optional `file://` prefix is stripped).
    pub async fn load(&mut self, url: impl Into<String>) -> Result<Arc<GraphData>, GraphLoadError> {
        let url = url.into();
        self.url = Some(url.clone());
        self.fetch(&url).await
    }

    /// Fetch the most recently requested URL again.
    pub async fn reload(&mut self) -> Result<Arc<GraphData>, GraphLoadError> {
        let Some(url) = self.url.clone() else {
            return Err(GraphLoadError::Validation(String::from(
                "no graph data URL has been loaded",
            )));
        };
        self.fetch(&url).await
    }

    /// The last document that loaded successfully.
    pub fn data(&self) -> Option<Arc<GraphData>> {
        self.data.clone()
    }

    /// Message of the most recent failure, cleared by the next success.
    pub fn error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    async fn fetch(&mut self, url: &str) -> Result<Arc<GraphData>, GraphLoadError> {
        let result = match read_document(&self.client, url).await {
            Ok(bytes) => parse_graph_document(&bytes),
            Err(e) => Err(e),
        };

        match result {
            Ok(data) => {
                info!(
                    url = url,
                    nodes = data.nodes.len(),
                    edges = data.edges.len(),
                    project = %data.metadata.project_name,
                    "graph data loaded"
                );
                let data = Arc::new(data);
                self.data = Some(Arc::clone(&data));
                self.last_error = None;
                Ok(data)
            }
            Err(e) => {
                error!(url = url, error = %e, "error loading graph data");
                self.last_error = Some(e.to_string());
                Err(e)
            }
        }
    }
}

/// Read the raw document from the network or the filesystem.
async fn read_document(client: &reqwest::Client, url: &str) -> Result<Vec<u8>, GraphLoadError> {
    if url.starts_with("http://") || url.starts_with("https://") {
        let response = client
            .get(url)
            .send()
            .await
            .map_err(|e| GraphLoadError::Request(format!("request to {url} failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(GraphLoadError::Validation(format!(
                "failed to load data: {status}"
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| GraphLoadError::Request(format!("failed to read body from {url}: {e}")))?;
        Ok(bytes.to_vec())
    } else {
        let path = url.strip_prefix("file://").unwrap_or(url);
        tokio::fs::read(path)
            .await
            .map_err(|e| GraphLoadError::Request(format!("failed to read {path}: {e}")))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const VALID: &str = r#"{
        "nodes": [{ "id": "agent:planner", "type": "agent", "name": "planner" }],
        "edges": [],
        "metadata": {
            "agentCount": 1,
            "skillCount": 0,
            "projectName": "vault",
            "generatedAt": "2025-01-01T00:00:00"
        }
    }"#;

    fn temp_file(contents: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!("graph-{}.json", uuid::Uuid::new_v4()));
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn missing_metadata_is_a_validation_error() {
        let err = parse_graph_document(br#"{ "nodes": [], "edges": [] }"#).unwrap_err();
        assert!(matches!(err, GraphLoadError::Validation(msg) if msg.contains("metadata")));
    }

    #[test]
    fn null_keys_count_as_missing() {
        let err = parse_graph_document(br#"{ "nodes": null, "edges": [], "metadata": {} }"#)
            .unwrap_err();
        assert!(matches!(err, GraphLoadError::Validation(msg) if msg.contains("nodes")));
    }

    #[test]
    fn non_json_and_non_object_bodies() {
        assert!(matches!(
            parse_graph_document(b"<html>"),
            Err(GraphLoadError::Parse(_))
        ));
        assert!(matches!(
            parse_graph_document(b"[]"),
            Err(GraphLoadError::Validation(_))
        ));
    }

    #[test]
    fn valid_document_parses() {
        let data = parse_graph_document(VALID.as_bytes()).unwrap();
        assert_eq!(data.metadata.agent_count, 1);
        assert!(data.node("agent:planner").is_some());
    }

    #[tokio::test]
    async fn failed_reload_keeps_last_good_document() {
        let path = temp_file(VALID);
        let mut loader = GraphLoader::new();
        let first = loader.load(path.to_string_lossy()).await.unwrap();
        assert!(loader.error().is_none());

        std::fs::write(&path, r#"{ "nodes": [], "edges": [] }"#).unwrap();
        let err = loader.reload().await.unwrap_err();
        assert!(matches!(err, GraphLoadError::Validation(_)));
        assert!(loader.error().is_some_and(|msg| msg.contains("metadata")));

        let kept = loader.data().unwrap();
        assert!(Arc::ptr_eq(&first, &kept));

        std::fs::write(&path, VALID).unwrap();
        loader.reload().await.unwrap();
        assert!(loader.error().is_none());

        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn missing_file_is_a_request_error() {
        let mut loader = GraphLoader::new();
        let err = loader
            .load("file:///definitely/not/here/graph-data.json")
            .await
            .unwrap_err();
        assert!(matches!(err, GraphLoadError::Request(_)));
        assert!(loader.data().is_none());
    }

    #[tokio::test]
    async fn reload_before_load_fails() {
        let mut loader = GraphLoader::new();
        assert!(matches!(
            loader.reload().await,
            Err(GraphLoadError::Validation(_))
        ));
    }
}
