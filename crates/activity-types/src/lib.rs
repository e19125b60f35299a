//! Shared type definitions for the agent/skill activity visualizer.
//!
//! This crate is the single source of truth for the types that cross a
//! process boundary: the lifecycle events pushed over the activity feed and
//! the static graph description. Types defined here flow downstream to
//! `TypeScript` via `ts-rs` for the dashboard.
//!
//! # Modules
//!
//! - [`event`] -- Lifecycle events, entity kinds, and node identities
//! - [`graph`] -- Nodes, edges, and metadata of the graph description

pub mod event;
pub mod graph;

// Re-export all public types at crate root for convenience.
pub use event::{ActivityEvent, EntityKind, EventKind, NodeIdentity};
pub use graph::{EdgeType, GraphData, GraphEdge, GraphMetadata, GraphNode};
