//! Shared application state for the feed server.
//!
//! [`FeedState`] holds the broadcast channel that the log tailer publishes
//! raw activity lines on, and the path of the log being tailed.

use std::path::PathBuf;

use tokio::sync::broadcast;

/// Capacity of the broadcast channel for activity lines.
///
/// If a subscriber falls behind by more than this many lines it will
/// receive a [`broadcast::error::RecvError::Lagged`] and skip to the
/// newest line.
const BROADCAST_CAPACITY: usize = 256;

/// Shared state for the Axum application.
///
/// Wrapped in [`Arc`](std::sync::Arc) and injected via Axum's `State`
/// extractor.
#[derive(Debug, Clone)]
pub struct FeedState {
    /// Broadcast sender for activity lines.
    pub tx: broadcast::Sender<String>,
    /// The activity log being tailed.
    pub log_file: PathBuf,
}

impl FeedState {
    /// Create a state for the given log file with no subscribers.
    pub fn new(log_file: impl Into<PathBuf>) -> Self {
        let (tx, _) = broadcast::channel(BROADCAST_CAPACITY);
        Self {
            tx,
            log_file: log_file.into(),
        }
    }

    /// Subscribe to activity lines.
    pub fn subscribe(&self) -> broadcast::Receiver<String> {
        self.tx.subscribe()
    }

    /// Publish one activity line to all connected clients.
    ///
    /// Returns the number of receivers that received the line, or 0 if no
    /// clients are connected (this is not an error).
    pub fn publish(&self, line: String) -> usize {
        self.tx.send(line).unwrap_or(0)
    }
}
