//! Error types for the activity feed server and recorder.
//!
//! [`FeedError`] unifies all failure modes into a single enum that can be
//! converted into an Axum HTTP response via its
//! [`IntoResponse`](axum::response::IntoResponse) implementation.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Errors that can occur in the feed server or the recorder.
#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    /// Reading or writing the activity log failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A serialization or deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Failed to bind to the network address.
    #[error("bind error: {0}")]
    Bind(String),

    /// The server encountered a fatal error while serving.
    #[error("serve error: {0}")]
    Serve(String),

    /// Configuration is invalid.
    #[error("config error: {0}")]
    Config(String),
}

impl IntoResponse for FeedError {
    fn into_response(self) -> Response {
        // No endpoint takes client input, so every failure is the server's.
        let status = StatusCode::INTERNAL_SERVER_ERROR;

        let body = serde_json::json!({
            "error": self.to_string(),
            "status": status.as_u16(),
        });

        (status, axum::Json(body)).into_response()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn errors_render_as_json() {
        let response = FeedError::Serve(String::from("boom")).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let bytes = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["status"], 500);
        assert_eq!(json["error"], "serve error: boom");
    }

    #[test]
    fn every_error_is_a_server_error() {
        let errors = [
            FeedError::Io(std::io::Error::other("disk")),
            FeedError::Bind(String::from("in use")),
            FeedError::Config(String::from("bad port")),
        ];
        for error in errors {
            assert_eq!(
                error.into_response().status(),
                StatusCode::INTERNAL_SERVER_ERROR
            );
        }
    }
}
