//! Error types for the activity feed client.
//!
//! Uses `thiserror` for typed errors. None of these escape the connection
//! manager: feed errors end in a `Retrying` status and malformed payloads
//! end in a log line. Graph loader errors are returned to the caller and
//! also kept on the loader as its error state.

use std::time::Duration;

/// Errors raised while talking to the activity feed.
#[derive(Debug, thiserror::Error)]
pub enum StreamError {
    /// The request could not be sent or the body could not be read.
    #[error("transport error: {0}")]
    Transport(String),

    /// The feed answered with a non-success HTTP status.
    #[error("feed returned HTTP {0}")]
    Status(u16),

    /// The server ended the stream.
    #[error("feed closed the stream")]
    Closed,

    /// No `connected` message arrived in time.
    #[error("no handshake within {0:?}")]
    HandshakeTimeout(Duration),

    /// An `activity` payload was not a valid event.
    #[error("malformed activity payload: {0}")]
    Decode(#[from] serde_json::Error),

    /// Configuration is invalid.
    #[error("config error: {0}")]
    Config(String),
}

/// Errors raised while loading the static graph description.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GraphLoadError {
    /// The document could not be fetched or read.
    #[error("request failed: {0}")]
    Request(String),

    /// The response was not successful, or a required key is missing.
    #[error("validation failed: {0}")]
    Validation(String),

    /// The body is not JSON or does not match the graph schema.
    #[error("parse failed: {0}")]
    Parse(String),
}
