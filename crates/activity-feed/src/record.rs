//! Hook-side writer of the activity log.
//!
//! The hook host runs the recorder before and after every tool call and
//! pipes the call description to it on stdin. Only subagent (`Task`) and
//! skill (`Skill`) calls become activity events; everything else is
//! ignored.
//!
//! A tool's pre and post hooks run in separate processes, so the id of a
//! running invocation is parked in a small JSON file keyed by
//! `"<kind>:<name>"` until its end event picks it up.

use std::collections::BTreeMap;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;

use activity_types::{ActivityEvent, EntityKind, EventKind, NodeIdentity};
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::config::ProjectPaths;
use crate::error::FeedError;

/// Size above which the log is truncated before the next append.
pub const MAX_LOG_BYTES: u64 = 1_000_000;

/// Number of trailing lines kept when the log is truncated.
pub const KEEP_LINES: usize = 1000;

/// Length of a generated invocation id.
const ID_LEN: usize = 8;

/// The subset of a hook payload the recorder reads.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HookInput {
    /// `PreToolUse` or `PostToolUse` for the hooks we record.
    #[serde(default)]
    pub hook_event_name: String,
    /// `Task` or `Skill` for the tools we record.
    #[serde(default)]
    pub tool_name: String,
    /// Tool arguments.
    #[serde(default)]
    pub tool_input: Option<ToolInput>,
}

/// Tool arguments that name the agent or skill.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ToolInput {
    /// Agent name of a `Task` call.
    #[serde(default)]
    pub subagent_type: Option<String>,
    /// Skill name of a `Skill` call.
    #[serde(default)]
    pub skill: Option<String>,
}

impl HookInput {
    /// The transition and entity this hook describes, if it is one we record.
    pub fn activity(&self) -> Option<(EventKind, NodeIdentity)> {
        let kind = match self.hook_event_name.as_str() {
            "PreToolUse" => EventKind::Start,
            "PostToolUse" => EventKind::End,
            _ => return None,
        };
        let input = self.tool_input.as_ref()?;
        let (entity, name) = match self.tool_name.as_str() {
            "Task" => (EntityKind::Agent, input.subagent_type.as_deref()),
            "Skill" => (EntityKind::Skill, input.skill.as_deref()),
            _ => return None,
        };
        let name = name.map(str::trim).filter(|n| !n.is_empty())?;
        Some((kind, NodeIdentity::new(entity, name)))
    }
}

/// Appends activity events for one project.
#[derive(Debug, Clone)]
pub struct Recorder {
    paths: ProjectPaths,
}

impl Recorder {
    /// Create a recorder writing under the given paths.
    pub const fn new(paths: ProjectPaths) -> Self {
        Self { paths }
    }

    /// Record one hook invocation.
    ///
    /// Returns the appended event, or `None` when the hook is not one we
    /// record.
    ///
    /// # Errors
    ///
    /// Returns an error if the log or the id file cannot be written.
    pub fn record(
        &self,
        input: &HookInput,
        timestamp: u64,
    ) -> Result<Option<ActivityEvent>, FeedError> {
        let Some((kind, identity)) = input.activity() else {
            debug!(
                hook = %input.hook_event_name,
                tool = %input.tool_name,
                "hook not recorded"
            );
            return Ok(None);
        };

        for file in [&self.paths.log_file, &self.paths.ids_file] {
            if let Some(dir) = file.parent().filter(|d| !d.as_os_str().is_empty()) {
                fs::create_dir_all(dir)?;
            }
        }

        let mut ids = load_ids(&self.paths.ids_file);
        let key = identity.to_string();
        let id = match kind {
            EventKind::Start => {
                let id = new_invocation_id();
                ids.insert(key, id.clone());
                id
            }
            EventKind::End => ids.remove(&key).unwrap_or_else(new_invocation_id),
        };
        save_ids(&self.paths.ids_file, &ids)?;

        let event = ActivityEvent {
            timestamp,
            kind,
            entity_kind: identity.kind,
            name: identity.name,
            id,
            parent_id: None,
        };

        if truncate_log(&self.paths.log_file, MAX_LOG_BYTES, KEEP_LINES)? {
            info!(path = %self.paths.log_file.display(), keep = KEEP_LINES, "activity log truncated");
        }
        append_event(&self.paths.log_file, &event)?;
        Ok(Some(event))
    }
}

/// Current time in milliseconds since the Unix epoch.
pub fn now_millis() -> u64 {
    u64::try_from(chrono::Utc::now().timestamp_millis()).unwrap_or(0)
}

/// First eight hex characters of a random UUID.
pub fn new_invocation_id() -> String {
    uuid::Uuid::new_v4()
        .simple()
        .to_string()
        .chars()
        .take(ID_LEN)
        .collect()
}

/// Load the id map, treating a missing or unreadable file as empty.
fn load_ids(path: &Path) -> BTreeMap<String, String> {
    let Ok(raw) = fs::read(path) else {
        return BTreeMap::new();
    };
    serde_json::from_slice(&raw).unwrap_or_else(|e| {
        warn!(path = %path.display(), error = %e, "ignoring unreadable activity id file");
        BTreeMap::new()
    })
}

fn save_ids(path: &Path, ids: &BTreeMap<String, String>) -> Result<(), FeedError> {
    fs::write(path, serde_json::to_vec_pretty(ids)?)?;
    Ok(())
}

/// Keep only the last `keep_lines` lines once the log exceeds `max_bytes`.
///
/// Returns whether the file was rewritten.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or rewritten.
pub fn truncate_log(path: &Path, max_bytes: u64, keep_lines: usize) -> Result<bool, FeedError> {
    let len = match fs::metadata(path) {
        Ok(meta) => meta.len(),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(false),
        Err(e) => return Err(e.into()),
    };
    if len <= max_bytes {
        return Ok(false);
    }

    let raw = fs::read(path)?;
    let text = String::from_utf8_lossy(&raw);
    let total = text.lines().count();
    let mut kept = text
        .lines()
        .skip(total.saturating_sub(keep_lines))
        .collect::<Vec<_>>()
        .join("\n");
    if !kept.is_empty() {
        kept.push('\n');
    }
    fs::write(path, kept)?;
    Ok(true)
}

fn append_event(path: &Path, event: &ActivityEvent) -> Result<(), FeedError> {
    let mut line = serde_json::to_string(event)?;
    line.push('\n');
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    file.write_all(line.as_bytes())?;
    Ok(())
}
