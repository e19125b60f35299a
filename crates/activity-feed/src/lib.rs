//! Producer side of the agent/skill activity visualizer.
//!
//! This crate provides:
//!
//! - **Recorder** ([`record`]) used by the `activity-log` hook binary to
//!   append `start`/`end` events for subagent and skill calls to a
//!   JSON-lines log under the project's `.claude` directory
//! - **Feed server** (`activity-feed` binary) that tails that log and
//!   pushes each new line to every subscriber over server-sent events
//!
//! # Architecture
//!
//! ```text
//! hook --> activity-log --> .claude/stream.jsonl --> LogTailer --> broadcast --> GET /events
//! ```
//!
//! A single tailer task reads the log; each `/events` client holds its own
//! broadcast receiver, so a slow client never slows the others down.

pub mod config;
pub mod error;
pub mod events;
pub mod handlers;
pub mod record;
pub mod router;
pub mod server;
pub mod state;
pub mod tail;

// Re-export primary types for convenience.
pub use config::{FeedConfig, ProjectPaths};
pub use error::FeedError;
pub use record::{HookInput, Recorder};
pub use router::build_router;
pub use server::{serve, start_server};
pub use state::FeedState;
pub use tail::{LogTailer, spawn_tailer};
