//! Shared accessor for the latest [`ActivityState`].
//!
//! The store publishes snapshots through a [`tokio::sync::watch`] channel.
//! Each write swaps in a new `Arc<ActivityState>` (cloning the previous
//! state only if a reader still holds it), so a snapshot handed out is never
//! mutated and a reader can never observe a half-applied event.
//!
//! The connection manager is the only writer of events and status. The two
//! `clear_*` resets are for presentation code.

use std::sync::Arc;

use activity_types::ActivityEvent;
use tokio::sync::watch;
use tracing::debug;

use crate::state::{ActivityState, ConnectionStatus};

/// Holder of the current activity snapshot.
#[derive(Debug)]
pub struct ActivityStore {
    tx: watch::Sender<Arc<ActivityState>>,
}

impl ActivityStore {
    /// Create a store holding an empty, disconnected state.
    pub fn new() -> Self {
        let (tx, _) = watch::channel(Arc::new(ActivityState::new()));
        Self { tx }
    }

    /// The latest snapshot.
    pub fn snapshot(&self) -> Arc<ActivityState> {
        Arc::clone(&self.tx.borrow())
    }

    /// Subscribe to changes.
    ///
    /// The receiver always yields the newest snapshot; a slow reader skips
    /// intermediate states instead of slowing the writer down. Dropping the
    /// receiver unsubscribes.
    pub fn subscribe(&self) -> watch::Receiver<Arc<ActivityState>> {
        self.tx.subscribe()
    }

    /// Fold one decoded event into the state.
    pub fn apply(&self, event: ActivityEvent) {
        self.tx.send_modify(|state| Arc::make_mut(state).apply(event));
    }

    /// Enter [`ConnectionStatus::Connecting`]. The last error is kept so a
    /// retry indicator stays visible until the handshake succeeds.
    pub fn mark_connecting(&self) {
        self.set_status(ConnectionStatus::Connecting, None);
    }

    /// Enter [`ConnectionStatus::Connected`] and clear the last error.
    pub fn mark_connected(&self) {
        self.set_status(ConnectionStatus::Connected, Some(None));
    }

    /// Enter [`ConnectionStatus::Retrying`] with a user-facing message.
    pub fn mark_retrying(&self, message: impl Into<String>) {
        self.set_status(ConnectionStatus::Retrying, Some(Some(message.into())));
    }

    /// Enter [`ConnectionStatus::Disconnected`].
    pub fn mark_disconnected(&self) {
        self.set_status(ConnectionStatus::Disconnected, None);
    }

    /// Empty the history buffer. Active entities and status are untouched.
    pub fn clear_history(&self) {
        self.tx.send_if_modified(|state| {
            if state.history.is_empty() {
                return false;
            }
            Arc::make_mut(state).history.clear();
            true
        });
        debug!("activity history cleared");
    }

    /// Empty the active set.
    ///
    /// This is a display reset only. It says nothing about whether the
    /// entities have actually finished; a later `end` for one of them is
    /// floored at zero as usual.
    pub fn clear_active(&self) {
        self.tx.send_if_modified(|state| {
            if state.active.is_empty() {
                return false;
            }
            Arc::make_mut(state).active.clear();
            true
        });
        debug!("active set cleared");
    }

    /// Update status and, when `error` is `Some`, replace the last error.
    ///
    /// Subscribers are only notified if something actually changed.
    fn set_status(&self, status: ConnectionStatus, error: Option<Option<String>>) {
        self.tx.send_if_modified(|state| {
            let error_changed = error.as_ref().is_some_and(|e| *e != state.last_error);
            if state.status == status && !error_changed {
                return false;
            }
            let next = Arc::make_mut(state);
            next.status = status;
            if let Some(e) = error {
                next.last_error = e;
            }
            true
        });
    }
}

impl Default for ActivityStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use activity_types::{EntityKind, EventKind, NodeIdentity};

    use super::*;

    fn start(name: &str) -> ActivityEvent {
        ActivityEvent {
            timestamp: 1,
            kind: EventKind::Start,
            entity_kind: EntityKind::Agent,
            name: name.to_owned(),
            id: format!("{name}-1"),
            parent_id: None,
        }
    }

    #[test]
    fn snapshots_are_not_mutated_by_later_writes() {
        let store = ActivityStore::new();
        store.apply(start("a"));
        let before = store.snapshot();

        store.apply(start("b"));
        store.clear_history();

        assert_eq!(before.active.len(), 1);
        assert_eq!(before.history.len(), 1);
        let after = store.snapshot();
        assert_eq!(after.active.len(), 2);
        assert!(after.history.is_empty());
    }

    #[test]
    fn clear_history_keeps_active_and_status() {
        let store = ActivityStore::new();
        store.mark_connected();
        store.apply(start("a"));
        store.clear_history();

        let snap = store.snapshot();
        assert!(snap.history.is_empty());
        assert!(snap.active.is_active(&NodeIdentity::agent("a")));
        assert_eq!(snap.status, ConnectionStatus::Connected);
    }

    #[test]
    fn clear_active_keeps_history_and_status() {
        let store = ActivityStore::new();
        store.mark_retrying("Connection lost. Retrying...");
        store.apply(start("a"));
        store.clear_active();

        let snap = store.snapshot();
        assert!(snap.active.is_empty());
        assert_eq!(snap.history.len(), 1);
        assert_eq!(snap.status, ConnectionStatus::Retrying);
        assert_eq!(snap.last_error.as_deref(), Some("Connection lost. Retrying..."));
    }

    #[test]
    fn connecting_keeps_error_and_connected_clears_it() {
        let store = ActivityStore::new();
        store.mark_retrying("Connection lost. Retrying...");
        store.mark_connecting();
        assert_eq!(store.snapshot().status, ConnectionStatus::Connecting);
        assert!(store.snapshot().last_error.is_some());

        store.mark_connected();
        assert_eq!(store.snapshot().status, ConnectionStatus::Connected);
        assert!(store.snapshot().last_error.is_none());
    }

    #[tokio::test]
    async fn subscribers_see_each_write() {
        let store = ActivityStore::new();
        let mut rx = store.subscribe();

        store.mark_connecting();
        assert!(rx.changed().await.is_ok());
        assert_eq!(rx.borrow_and_update().status, ConnectionStatus::Connecting);

        store.apply(start("a"));
        assert!(rx.changed().await.is_ok());
        assert_eq!(rx.borrow_and_update().history.len(), 1);
    }

    #[tokio::test]
    async fn unchanged_status_does_not_notify() {
        let store = ActivityStore::new();
        let mut rx = store.subscribe();
        store.mark_disconnected();
        assert!(!rx.has_changed().unwrap_or(true));

        store.clear_active();
        store.clear_history();
        assert!(!rx.has_changed().unwrap_or(true));
    }
}
