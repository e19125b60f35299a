//! State reducer: folds one lifecycle event into the activity state.
//!
//! The reducer is deterministic and free of side effects. It trusts arrival
//! order and performs no deduplication by invocation id; concurrent
//! invocations of the same entity are handled by the reference count in
//! [`ActiveSet`](crate::state::ActiveSet), not by tracking ids.

use activity_types::{ActivityEvent, EventKind};

use crate::state::ActivityState;

/// Produce the state that results from applying `event` to `state`.
pub fn reduce(mut state: ActivityState, event: ActivityEvent) -> ActivityState {
    state.apply(event);
    state
}

impl ActivityState {
    /// Apply one event in place.
    ///
    /// A start increments the entity's active count, an end decrements it
    /// (never below zero), and the event is appended to the history with
    /// FIFO eviction. Connection status and last error are untouched.
    pub fn apply(&mut self, event: ActivityEvent) {
        let identity = event.identity();
        match event.kind {
            EventKind::Start => {
                self.active.increment(identity);
            }
            EventKind::End => {
                self.active.decrement(&identity);
            }
        }
        self.history.push(event);
    }
}
