//! Lifecycle events emitted by the runner for agent and skill invocations.
//!
//! Each [`ActivityEvent`] records one start or end transition of one named
//! entity. The wire format is the JSON object pushed on the `activity`
//! channel of the event feed:
//!
//! ```json
//! { "ts": 1700000000000, "event": "start", "type": "agent",
//!   "name": "planner", "id": "3f9a1c22", "parent": "b81d00e4" }
//! ```

use serde::{Deserialize, Serialize};
use ts_rs::TS;

// ---------------------------------------------------------------------------
// Enumerations
// ---------------------------------------------------------------------------

/// Which side of an invocation an event marks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export, export_to = "bindings/")]
pub enum EventKind {
    /// The invocation began.
    Start,
    /// The invocation finished.
    End,
}

/// The class of entity an event refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export, export_to = "bindings/")]
pub enum EntityKind {
    /// A sub-agent launched through the `Task` tool.
    Agent,
    /// A skill launched through the `Skill` tool (slash commands included).
    Skill,
}

impl EntityKind {
    /// The lowercase wire name (`agent` / `skill`).
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Agent => "agent",
            Self::Skill => "skill",
        }
    }
}

impl core::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Event record
// ---------------------------------------------------------------------------

/// One lifecycle transition of one invocation.
///
/// Events are immutable once decoded. The timestamp is assigned by the
/// producer and is carried through without validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ActivityEvent {
    /// Milliseconds since the Unix epoch.
    #[serde(rename = "ts")]
    #[ts(type = "number")]
    pub timestamp: u64,
    /// Start or end.
    #[serde(rename = "event")]
    pub kind: EventKind,
    /// Agent or skill.
    #[serde(rename = "type")]
    pub entity_kind: EntityKind,
    /// Human-readable entity name.
    pub name: String,
    /// Identifier unique to this invocation.
    pub id: String,
    /// Invocation id of the caller, when known.
    #[serde(rename = "parent")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub parent_id: Option<String>,
}

impl ActivityEvent {
    /// The identity of the entity this event belongs to.
    pub fn identity(&self) -> NodeIdentity {
        NodeIdentity::new(self.entity_kind, self.name.clone())
    }
}

// ---------------------------------------------------------------------------
// Node identity
// ---------------------------------------------------------------------------

/// The `(kind, name)` pair identifying an entity independent of any single
/// invocation.
///
/// Its display form is `kind:name`, the same string the graph description
/// uses for node ids.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct NodeIdentity {
    /// Agent or skill.
    pub kind: EntityKind,
    /// Entity name.
    pub name: String,
}

impl NodeIdentity {
    /// Build an identity from its parts.
    pub fn new(kind: EntityKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
        }
    }

    /// Shorthand for an agent identity.
    pub fn agent(name: impl Into<String>) -> Self {
        Self::new(EntityKind::Agent, name)
    }

    /// Shorthand for a skill identity.
    pub fn skill(name: impl Into<String>) -> Self {
        Self::new(EntityKind::Skill, name)
    }
}

impl core::fmt::Display for NodeIdentity {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}:{}", self.kind, self.name)
    }
}
