//! The observable activity state and its building blocks.
//!
//! [`ActivityState`] is what presentation code reads: which entities are
//! running right now, the most recent lifecycle events, and the health of
//! the feed connection. It is rebuilt (copy-on-write) on every change and
//! handed out as an immutable snapshot.

use std::collections::btree_map::{self, BTreeMap};
use std::collections::VecDeque;

use activity_types::{ActivityEvent, NodeIdentity};
use serde::{Serialize, Serializer};

/// Maximum number of events retained in a [`HistoryBuffer`].
pub const HISTORY_CAPACITY: usize = 100;

// ---------------------------------------------------------------------------
// Active set
// ---------------------------------------------------------------------------

/// Reference-counted set of entities with at least one running invocation.
///
/// Every stored count is at least 1. An identity is removed as soon as its
/// count drops to zero, so `contains` and "count > 0" always agree.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActiveSet {
    counts: BTreeMap<NodeIdentity, u32>,
}

impl ActiveSet {
    /// Create an empty set.
    pub const fn new() -> Self {
        Self {
            counts: BTreeMap::new(),
        }
    }

    /// Record one more running invocation of `identity`.
    ///
    /// Returns the new count.
    pub fn increment(&mut self, identity: NodeIdentity) -> u32 {
        let count = self.counts.entry(identity).or_insert(0);
        *count = count.saturating_add(1);
        *count
    }

    /// Record one finished invocation of `identity`, flooring at zero.
    ///
    /// An end without a matching start (for example one that arrives right
    /// after a reconnect) leaves the set untouched. Returns the new count.
    pub fn decrement(&mut self, identity: &NodeIdentity) -> u32 {
        let Some(count) = self.counts.get_mut(identity) else {
            return 0;
        };
        *count = count.saturating_sub(1);
        let remaining = *count;
        if remaining == 0 {
            self.counts.remove(identity);
        }
        remaining
    }

    /// Number of running invocations of `identity` (zero when absent).
    pub fn count(&self, identity: &NodeIdentity) -> u32 {
        self.counts.get(identity).copied().unwrap_or(0)
    }

    /// Whether `identity` has at least one running invocation.
    pub fn is_active(&self, identity: &NodeIdentity) -> bool {
        self.counts.contains_key(identity)
    }

    /// Number of distinct active identities.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    /// Whether nothing is active.
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Iterate over active identities and their counts, ordered by kind and
    /// then name.
    pub fn iter(&self) -> btree_map::Iter<'_, NodeIdentity, u32> {
        self.counts.iter()
    }

    /// Forget every identity.
    pub fn clear(&mut self) {
        self.counts.clear();
    }
}

impl<'a> IntoIterator for &'a ActiveSet {
    type Item = (&'a NodeIdentity, &'a u32);
    type IntoIter = btree_map::Iter<'a, NodeIdentity, u32>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Serialized as `{ "agent:planner": 2, "skill:pdf": 1 }`.
impl Serialize for ActiveSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.counts.iter().map(|(id, n)| (id.to_string(), n)))
    }
}

// ---------------------------------------------------------------------------
// History buffer
// ---------------------------------------------------------------------------

/// The most recent events in arrival order, oldest first.
///
/// Holds at most [`HISTORY_CAPACITY`] entries; pushing onto a full buffer
/// evicts exactly the oldest one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct HistoryBuffer {
    events: VecDeque<ActivityEvent>,
}

impl HistoryBuffer {
    /// Create an empty buffer.
    pub fn new() -> Self {
        Self {
            events: VecDeque::with_capacity(HISTORY_CAPACITY),
        }
    }

    /// Append an event, returning the evicted one if the buffer was full.
    pub fn push(&mut self, event: ActivityEvent) -> Option<ActivityEvent> {
        let evicted = if self.events.len() >= HISTORY_CAPACITY {
            self.events.pop_front()
        } else {
            None
        };
        self.events.push_back(event);
        evicted
    }

    /// Number of retained events.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Iterate oldest to newest.
    pub fn iter(&self) -> std::collections::vec_deque::Iter<'_, ActivityEvent> {
        self.events.iter()
    }

    /// The most recently appended event.
    pub fn latest(&self) -> Option<&ActivityEvent> {
        self.events.back()
    }

    /// Drop every retained event.
    pub fn clear(&mut self) {
        self.events.clear();
    }
}

impl<'a> IntoIterator for &'a HistoryBuffer {
    type Item = &'a ActivityEvent;
    type IntoIter = std::collections::vec_deque::Iter<'a, ActivityEvent>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

// ---------------------------------------------------------------------------
// Connection status
// ---------------------------------------------------------------------------

/// Health of the feed subscription.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    /// Not subscribed (initial state, and after `stop`).
    #[default]
    Disconnected,
    /// A connection attempt is in flight; the handshake has not arrived yet.
    Connecting,
    /// Handshake received; events are flowing.
    Connected,
    /// The connection dropped and a reconnect is scheduled.
    Retrying,
}

impl ConnectionStatus {
    /// Whether events can currently be received.
    pub const fn is_connected(self) -> bool {
        matches!(self, Self::Connected)
    }
}

impl core::fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let s = match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Retrying => "retrying",
        };
        f.write_str(s)
    }
}

// ---------------------------------------------------------------------------
// Activity state
// ---------------------------------------------------------------------------

/// Everything presentation code needs to render live activity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ActivityState {
    /// Entities with running invocations.
    pub active: ActiveSet,
    /// Recent lifecycle events, oldest first.
    pub history: HistoryBuffer,
    /// Feed connection health.
    pub status: ConnectionStatus,
    /// User-facing description of the last connection problem.
    pub last_error: Option<String>,
}

impl ActivityState {
    /// An empty, disconnected state.
    pub fn new() -> Self {
        Self::default()
    }
}
