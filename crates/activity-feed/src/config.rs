//! Configuration for the feed server and the recorder hook.
//!
//! Everything is read from environment variables with defaults that match
//! a local setup, so an empty environment is valid. The project root comes
//! from `CLAUDE_PROJECT_DIR`, which the hook host sets for every hook it
//! runs.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::FeedError;

/// Default port of the feed server.
pub const DEFAULT_PORT: u16 = 3001;

/// Default tail polling interval in milliseconds.
pub const DEFAULT_POLL_MS: u64 = 250;

/// Directory under the project root that holds the activity files.
const STATE_DIR: &str = ".claude";

/// Paths derived from the project root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectPaths {
    /// The JSON-lines activity log.
    pub log_file: PathBuf,
    /// Map of `"<kind>:<name>"` to the id of the running invocation.
    pub ids_file: PathBuf,
}

impl ProjectPaths {
    /// Paths under `root/.claude`.
    pub fn new(root: &Path) -> Self {
        let dir = root.join(STATE_DIR);
        Self {
            log_file: dir.join("stream.jsonl"),
            ids_file: dir.join(".activity_ids.json"),
        }
    }

    /// Resolve the project root from `CLAUDE_PROJECT_DIR` (default `.`).
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let root = lookup("CLAUDE_PROJECT_DIR")
            .filter(|dir| !dir.is_empty())
            .unwrap_or_else(|| String::from("."));
        Self::new(Path::new(&root))
    }

    /// Resolve from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }
}

/// Feed server configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedConfig {
    /// Host address to bind to.
    pub host: String,
    /// TCP port to listen on.
    pub port: u16,
    /// Activity log to tail.
    pub log_file: PathBuf,
    /// How often the tailer checks the log for new lines.
    pub poll_interval: Duration,
    /// Emit JSON log lines instead of human-readable text.
    pub json_logs: bool,
}

impl FeedConfig {
    /// Load configuration from environment variables.
    ///
    /// Optional variables:
    /// - `FEED_HOST` -- bind address (default `0.0.0.0`)
    /// - `FEED_PORT` -- port (default 3001)
    /// - `ACTIVITY_LOG_FILE` -- log to tail (default `<CLAUDE_PROJECT_DIR>/.claude/stream.jsonl`)
    /// - `TAIL_POLL_MS` -- polling interval in milliseconds (default 250)
    /// - `LOG_FORMAT` -- `json` or `text` (default `text`)
    pub fn from_env() -> Result<Self, FeedError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, FeedError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = lookup("FEED_HOST").unwrap_or_else(|| String::from("0.0.0.0"));

        let port = match lookup("FEED_PORT") {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .map_err(|e| FeedError::Config(format!("invalid FEED_PORT: {e}")))?,
            None => DEFAULT_PORT,
        };

        let log_file = match lookup("ACTIVITY_LOG_FILE") {
            Some(path) => PathBuf::from(path),
            None => ProjectPaths::from_lookup(&lookup).log_file,
        };

        let poll_ms = match lookup("TAIL_POLL_MS") {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .map_err(|e| FeedError::Config(format!("invalid TAIL_POLL_MS: {e}")))?,
            None => DEFAULT_POLL_MS,
        };
        if poll_ms == 0 {
            return Err(FeedError::Config(String::from(
                "TAIL_POLL_MS must be greater than zero",
            )));
        }

        Ok(Self {
            host,
            port,
            log_file,
            poll_interval: Duration::from_millis(poll_ms),
            json_logs: json_logs(&lookup)?,
        })
    }
}

/// Parse `LOG_FORMAT` (`text` or `json`, default `text`).
pub fn json_logs<F>(lookup: &F) -> Result<bool, FeedError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup("LOG_FORMAT").as_deref() {
        None | Some("text") => Ok(false),
        Some("json") => Ok(true),
        Some(other) => Err(FeedError::Config(format!(
            "invalid LOG_FORMAT: {other} (expected text or json)"
        ))),
    }
}
