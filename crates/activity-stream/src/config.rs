//! Configuration for the activity monitor.
//!
//! All configuration is loaded from environment variables. Every value has
//! a default that matches a local setup where the feed server runs next to
//! the dashboard, so an empty environment is a valid configuration.

use std::time::Duration;

use crate::error::StreamError;
use crate::manager::ManagerConfig;

/// Default event feed endpoint.
pub const DEFAULT_FEED_URL: &str = "http://localhost:3001/events";

/// Default location of the graph description document.
pub const DEFAULT_GRAPH_DATA_URL: &str = "./data/graph-data.json";

/// Complete monitor configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorConfig {
    /// SSE endpoint of the activity feed.
    pub feed_url: String,
    /// URL or file path of the graph description.
    pub graph_data_url: String,
    /// Fixed delay between a lost connection and the next attempt.
    pub reconnect_delay: Duration,
    /// How long to wait for the `connected` handshake. `None` waits forever.
    pub handshake_timeout: Option<Duration>,
    /// Emit JSON log lines instead of human-readable text.
    pub json_logs: bool,
}

impl MonitorConfig {
    /// Load configuration from environment variables.
    ///
    /// Optional variables:
    /// - `ACTIVITY_FEED_URL` -- feed endpoint (default `http://localhost:3001/events`)
    /// - `GRAPH_DATA_URL` -- graph description URL or path (default `./data/graph-data.json`)
    /// - `RECONNECT_DELAY_MS` -- reconnect delay in milliseconds (default 3000)
    /// - `HANDSHAKE_TIMEOUT_MS` -- handshake deadline in milliseconds, `0` disables (default 10000)
    /// - `LOG_FORMAT` -- `json` or `text` (default `text`)
    pub fn from_env() -> Result<Self, StreamError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, StreamError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let feed_url = lookup("ACTIVITY_FEED_URL").unwrap_or_else(|| DEFAULT_FEED_URL.to_owned());
        let graph_data_url =
            lookup("GRAPH_DATA_URL").unwrap_or_else(|| DEFAULT_GRAPH_DATA_URL.to_owned());

        let reconnect_delay_ms = parse_millis(&lookup, "RECONNECT_DELAY_MS", 3000)?;
        let handshake_timeout_ms = parse_millis(&lookup, "HANDSHAKE_TIMEOUT_MS", 10_000)?;

        let json_logs = match lookup("LOG_FORMAT").as_deref() {
            None | Some("text") => false,
            Some("json") => true,
            Some(other) => {
                return Err(StreamError::Config(format!(
                    "invalid LOG_FORMAT: {other} (expected text or json)"
                )));
            }
        };

        Ok(Self {
            feed_url,
            graph_data_url,
            reconnect_delay: Duration::from_millis(reconnect_delay_ms),
            handshake_timeout: (handshake_timeout_ms > 0)
                .then(|| Duration::from_millis(handshake_timeout_ms)),
            json_logs,
        })
    }

    /// The subset of settings the connection manager needs.
    pub const fn manager_config(&self) -> ManagerConfig {
        ManagerConfig {
            reconnect_delay: self.reconnect_delay,
            handshake_timeout: self.handshake_timeout,
        }
    }
}

/// Parse an optional millisecond value, falling back to `default`.
fn parse_millis<F>(lookup: &F, name: &str, default: u64) -> Result<u64, StreamError>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(name).map_or(Ok(default), |raw| {
        raw.trim()
            .parse()
            .map_err(|e| StreamError::Config(format!("invalid {name}: {e}")))
    })
}
