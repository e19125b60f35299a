//! Plain HTTP endpoint handlers for the feed server.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/` | Minimal HTML status page |
//! | `GET` | `/health` | Liveness plus the tailed log path |
//! | `GET` | `/events` | Activity stream (see [`crate::events`]) |

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::response::{Html, IntoResponse};
use serde::Serialize;

use crate::error::FeedError;
use crate::state::FeedState;

/// Body of `GET /health`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    /// Always `"ok"` while the server is answering.
    pub status: &'static str,
    /// The activity log being tailed.
    pub log_file: String,
    /// Whether that file currently exists.
    pub log_exists: bool,
}

/// Report liveness and the state of the activity log.
///
/// A missing log is reported as `log_exists: false`. Any other failure to
/// check the path (permissions, a file where a directory should be) is a
/// server error.
pub async fn health(
    State(state): State<Arc<FeedState>>,
) -> Result<Json<HealthResponse>, FeedError> {
    let log_exists = tokio::fs::try_exists(&state.log_file).await?;

    Ok(Json(HealthResponse {
        status: "ok",
        log_file: state.log_file.display().to_string(),
        log_exists,
    }))
}

/// Serve a minimal HTML page listing the endpoints.
pub async fn index(State(state): State<Arc<FeedState>>) -> impl IntoResponse {
    let log_file = state.log_file.display();
    let subscribers = state.tx.receiver_count();

    Html(format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <title>Activity Feed</title>
    <style>
        body {{
            background: #0d1117;
            color: #c9d1d9;
            font-family: 'Cascadia Code', 'Fira Code', 'Consolas', monospace;
            padding: 2rem;
            max-width: 800px;
            margin: 0 auto;
        }}
        h1 {{ color: #58a6ff; }}
        a {{ color: #58a6ff; text-decoration: none; }}
        ul {{ list-style: none; padding: 0; }}
        li::before {{ content: "GET "; color: #7ee787; font-weight: bold; }}
        .status {{ color: #3fb950; font-weight: bold; }}
    </style>
</head>
<body>
    <h1>Activity Feed</h1>
    <p>Status: <span class="status">RUNNING</span></p>
    <p>Log: <code>{log_file}</code></p>
    <p>Subscribers: {subscribers}</p>
    <ul>
        <li><a href="/events">/events</a> -- Live activity stream (text/event-stream)</li>
        <li><a href="/health">/health</a> -- Health check</li>
    </ul>
</body>
</html>"#
    ))
}
