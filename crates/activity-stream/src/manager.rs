//! Connection manager: one long-lived feed subscription and its recovery.
//!
//! [`ConnectionManager::start`] spawns a single task that owns the open
//! stream and, after a failure, the reconnect timer. That task is also the
//! only place events are reduced into the [`ActivityStore`], so every event
//! is applied completely before the next one is read.
//!
//! # Lifecycle
//!
//! ```text
//! Disconnected --start--> Connecting --"connected"--> Connected
//!                             ^   |                       |
//!                             |   +---- error / close ----+
//!                             |               v
//!                             +--- delay --- Retrying
//! ```
//!
//! Every failure is treated as transient and retried after the same fixed
//! delay, forever. [`ConnectionManager::stop`] (or dropping the manager)
//! tears down the connection and any pending timer from any state.

use std::sync::Arc;
use std::time::Duration;

use activity_core::ActivityStore;
use activity_types::ActivityEvent;
use futures::StreamExt;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::error::StreamError;
use crate::transport::{FeedMessage, FeedTransport};

/// Message shown while a reconnect is pending.
pub const RETRY_MESSAGE: &str = "Connection lost. Retrying...";

/// Longest payload excerpt written to the log for a malformed message.
const MAX_LOGGED_PAYLOAD: usize = 200;

/// Timing policy for the manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ManagerConfig {
    /// Fixed delay between a failure and the next connection attempt.
    pub reconnect_delay: Duration,
    /// Deadline for connecting and receiving the `connected` handshake.
    /// `None` waits indefinitely.
    pub handshake_timeout: Option<Duration>,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            reconnect_delay: Duration::from_millis(3000),
            handshake_timeout: Some(Duration::from_secs(10)),
        }
    }
}

/// Decode one `activity` payload.
pub fn decode_event(data: &str) -> Result<ActivityEvent, StreamError> {
    Ok(serde_json::from_str(data)?)
}

/// Owner of the feed subscription.
pub struct ConnectionManager<T: FeedTransport> {
    transport: Arc<T>,
    store: Arc<ActivityStore>,
    config: ManagerConfig,
    running: Option<Running>,
}

/// Handles to the spawned subscription task.
struct Running {
    shutdown: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

impl<T: FeedTransport> ConnectionManager<T> {
    /// Create a stopped manager that will publish into `store`.
    pub fn new(transport: T, store: Arc<ActivityStore>, config: ManagerConfig) -> Self {
        Self {
            transport: Arc::new(transport),
            store,
            config,
            running: None,
        }
    }

    /// The store this manager writes to.
    pub const fn store(&self) -> &Arc<ActivityStore> {
        &self.store
    }

    /// Whether the subscription task is alive.
    pub fn is_running(&self) -> bool {
        self.running.as_ref().is_some_and(|r| !r.task.is_finished())
    }

    /// Begin subscribing. A no-op while already running.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start(&mut self) {
        if self.is_running() {
            debug!("activity feed already running, start ignored");
            return;
        }

        self.store.mark_connecting();
        let (shutdown, shutdown_rx) = oneshot::channel();
        let session = Subscription {
            transport: Arc::clone(&self.transport),
            store: Arc::clone(&self.store),
            config: self.config,
        };
        let task = tokio::spawn(session.run(shutdown_rx));
        self.running = Some(Running { shutdown, task });
    }

    /// Close the connection, cancel any pending reconnect, and wait for the
    /// subscription task to exit. Safe to call in any state.
    pub async fn stop(&mut self) {
        if let Some(Running { shutdown, task }) = self.running.take() {
            if shutdown.send(()).is_err() {
                debug!("activity feed task already exited");
            }
            if let Err(e) = task.await {
                if e.is_panic() {
                    error!(error = %e, "activity feed task panicked");
                }
            }
        }
        self.store.mark_disconnected();
        info!(url = %self.transport.endpoint(), "activity feed stopped");
    }
}

/// Dropping a running manager signals shutdown and aborts the task.
///
/// Status is best effort here: on a multi-threaded runtime a poll that is
/// already executing may still publish one last status after
/// `Disconnected`. Call [`ConnectionManager::stop`] for an exact final state.
impl<T: FeedTransport> Drop for ConnectionManager<T> {
    fn drop(&mut self) {
        if let Some(Running { shutdown, task }) = self.running.take() {
            if shutdown.send(()).is_err() {
                debug!("activity feed task already exited");
            }
            task.abort();
            self.store.mark_disconnected();
        }
    }
}

impl<T: FeedTransport> std::fmt::Debug for ConnectionManager<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionManager")
            .field("endpoint", &self.transport.endpoint())
            .field("config", &self.config)
            .field("running", &self.is_running())
            .finish()
    }
}

/// State moved into the subscription task.
struct Subscription<T: FeedTransport> {
    transport: Arc<T>,
    store: Arc<ActivityStore>,
    config: ManagerConfig,
}

impl<T: FeedTransport> Subscription<T> {
    /// Connect, consume, and reconnect until shut down.
    ///
    /// The shutdown receiver also fires if the manager is dropped, since the
    /// sender goes with it.
    async fn run(self, mut shutdown: oneshot::Receiver<()>) {
        let endpoint = self.transport.endpoint().to_owned();
        loop {
            self.store.mark_connecting();
            info!(url = %endpoint, "connecting to activity feed");

            let failure = tokio::select! {
                biased;
                _ = &mut shutdown => break,
                failure = self.consume() => failure,
            };

            // The stream was dropped with `consume`; exactly one timer is
            // pending from here until it fires or shutdown wins.
            self.store.mark_retrying(RETRY_MESSAGE);
            warn!(
                url = %endpoint,
                error = %failure,
                delay_ms = u64::try_from(self.config.reconnect_delay.as_millis()).unwrap_or(u64::MAX),
                "activity feed connection lost, scheduling reconnect"
            );

            tokio::select! {
                biased;
                _ = &mut shutdown => break,
                () = tokio::time::sleep(self.config.reconnect_delay) => {}
            }
        }
        debug!(url = %endpoint, "activity feed task exiting");
    }

    /// Run one connection until it fails, returning the reason.
    ///
    /// The handshake deadline starts before the connect, so a transport
    /// that never answers fails the same way as one that never says
    /// `connected`.
    async fn consume(&self) -> StreamError {
        let timeout = self.config.handshake_timeout;
        let handshake = async move {
            match timeout {
                Some(limit) => tokio::time::sleep(limit).await,
                None => std::future::pending::<()>().await,
            }
        };
        tokio::pin!(handshake);

        let mut stream = tokio::select! {
            result = self.transport.connect() => match result {
                Ok(stream) => stream,
                Err(e) => return e,
            },
            () = &mut handshake => {
                return StreamError::HandshakeTimeout(timeout.unwrap_or_default());
            }
        };
        let mut connected = false;

        loop {
            tokio::select! {
                message = stream.next() => match message {
                    Some(Ok(FeedMessage::Connected)) => {
                        connected = true;
                        self.store.mark_connected();
                        info!(url = %self.transport.endpoint(), "activity stream connected");
                    }
                    Some(Ok(FeedMessage::Activity(data))) => self.handle_activity(&data),
                    Some(Ok(FeedMessage::Other { event })) => {
                        debug!(event = %event, "ignoring feed message");
                    }
                    Some(Err(e)) => return e,
                    None => return StreamError::Closed,
                },
                () = &mut handshake, if !connected => {
                    return StreamError::HandshakeTimeout(timeout.unwrap_or_default());
                }
            }
        }
    }

    /// Decode and reduce one payload; malformed payloads are logged and
    /// dropped without touching the state.
    fn handle_activity(&self, data: &str) {
        match decode_event(data) {
            Ok(event) => {
                debug!(
                    event = ?event.kind,
                    node = %event.identity(),
                    id = %event.id,
                    "activity event received"
                );
                self.store.apply(event);
            }
            Err(e) => {
                let excerpt: String = data.chars().take(MAX_LOGGED_PAYLOAD).collect();
                warn!(error = %e, payload = %excerpt, "failed to parse activity event, skipping");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_accepts_wire_payload() {
        let event = decode_event(
            r#"{"ts":5,"event":"end","type":"skill","name":"pdf","id":"ab12cd34"}"#,
        );
        assert!(event.is_ok_and(|e| e.name == "pdf" && e.timestamp == 5));
    }

    #[test]
    fn decode_rejects_non_json_and_wrong_shape() {
        assert!(matches!(decode_event("not json"), Err(StreamError::Decode(_))));
        assert!(matches!(
            decode_event(r#"{"ts":"yesterday","event":"start","type":"agent","name":"a","id":"1"}"#),
            Err(StreamError::Decode(_))
        ));
        assert!(matches!(decode_event("[]"), Err(StreamError::Decode(_))));
    }

    #[test]
    fn default_policy_is_fixed_three_seconds() {
        let config = ManagerConfig::default();
        assert_eq!(config.reconnect_delay, Duration::from_millis(3000));
        assert_eq!(config.handshake_timeout, Some(Duration::from_secs(10)));
    }
}
