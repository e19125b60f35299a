//! Static graph description of agents, skills, and their relationships.
//!
//! The document is generated offline by scanning the project's `.claude/`
//! folder and served as a plain JSON file. Node ids use the same
//! `kind:name` form as [`NodeIdentity`](crate::NodeIdentity), which is how
//! presentation code lines up live activity with graph nodes.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::event::EntityKind;

/// The whole graph description document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct GraphData {
    /// Agent and skill nodes.
    pub nodes: Vec<GraphNode>,
    /// Directed relationships between nodes.
    pub edges: Vec<GraphEdge>,
    /// Summary counts and provenance.
    pub metadata: GraphMetadata,
}

/// A single agent or skill in the graph.
///
/// Only `id`, `type` and `name` are required. The scanner omits fields that
/// do not apply to a node's kind, so everything else defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct GraphNode {
    /// `kind:name` identifier.
    pub id: String,
    /// Agent or skill.
    #[serde(rename = "type")]
    pub node_type: EntityKind,
    /// Display name.
    pub name: String,
    /// Free-form description from the definition's front matter.
    #[serde(default)]
    pub description: String,
    /// Finer classification, e.g. `command` for slash commands.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub subtype: Option<String>,
    /// Definition file path relative to the project root.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub file_path: Option<String>,
    /// Tools an agent is allowed to use.
    #[serde(default)]
    pub tools: Vec<String>,
    /// Model an agent is pinned to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub model: Option<String>,
    /// Sub-agents an agent declares.
    #[serde(default)]
    pub subagents: Vec<String>,
    /// Skills an agent declares.
    #[serde(default)]
    pub skills: Vec<String>,
    /// Trigger phrases a skill documents.
    #[serde(default)]
    pub triggers: Vec<String>,
    /// Whether a skill ships a `scripts/` folder.
    #[serde(default)]
    pub has_scripts: bool,
    /// Whether a skill ships a `webapp/` folder.
    #[serde(default)]
    pub has_webapp: bool,
    /// Leading excerpt of an agent's system prompt.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub system_prompt: Option<String>,
    /// Argument hint for slash commands.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub argument_hint: Option<String>,
}

/// How two nodes relate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export, export_to = "bindings/")]
pub enum EdgeType {
    /// Agent invokes a sub-agent.
    Calls,
    /// Agent uses a skill.
    Uses,
}

/// A directed relationship between two node ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct GraphEdge {
    /// Id of the calling node.
    pub source: String,
    /// Id of the called node.
    pub target: String,
    /// Relationship kind.
    #[serde(rename = "type")]
    pub edge_type: EdgeType,
}

/// Provenance and summary counts for a graph document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct GraphMetadata {
    /// Number of agent nodes.
    pub agent_count: u32,
    /// Number of skill nodes (commands excluded).
    pub skill_count: u32,
    /// Name of the scanned project directory.
    pub project_name: String,
    /// When the document was generated (ISO 8601, as written by the scanner).
    pub generated_at: String,
    /// Absolute path of the scanned project.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub project_path: Option<String>,
    /// Number of slash command nodes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub command_count: Option<u32>,
    /// Number of edges.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub edge_count: Option<u32>,
}

impl GraphData {
    /// Look up a node by its `kind:name` id.
    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.nodes.iter().find(|n| n.id == id)
    }
}
