//! Client side of the agent/skill activity visualizer.
//!
//! This crate keeps a live view of which agents and skills are running by
//! subscribing to the activity feed, and loads the static graph those
//! agents and skills are drawn on.
//!
//! # Architecture
//!
//! ```text
//! HTTP (text/event-stream) --> SseDecoder --> ConnectionManager --> ActivityStore
//!                                                  |                     |
//!                                          reconnect timer        snapshots / watch
//! ```
//!
//! The [`ConnectionManager`] is the only writer of the store while it runs.
//! Readers take immutable snapshots via [`activity_core::ActivityStore`].

pub mod config;
pub mod error;
pub mod graph;
pub mod manager;
pub mod sse;
pub mod transport;

pub use config::MonitorConfig;
pub use error::{GraphLoadError, StreamError};
pub use graph::{GraphLoader, parse_graph_document};
pub use manager::{ConnectionManager, ManagerConfig, RETRY_MESSAGE, decode_event};
pub use sse::{SseDecoder, SseFrame};
pub use transport::{FeedMessage, FeedStream, FeedTransport, HttpFeed};
