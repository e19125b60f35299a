//! Live activity state for the agent/skill visualizer.
//!
//! This crate turns a stream of lifecycle events into the snapshot that the
//! graph view renders: which agents and skills are running, what happened
//! recently, and whether the feed is healthy. It knows nothing about the
//! network; the connection manager in `activity-stream` drives it.
//!
//! # Modules
//!
//! - [`state`] -- [`ActiveSet`], [`HistoryBuffer`], [`ConnectionStatus`], and
//!   the combined [`ActivityState`].
//! - [`reducer`] -- The pure event-to-state transition.
//! - [`store`] -- [`ActivityStore`], the copy-on-write snapshot accessor.
//!
//! [`ActiveSet`]: state::ActiveSet
//! [`HistoryBuffer`]: state::HistoryBuffer
//! [`ConnectionStatus`]: state::ConnectionStatus
//! [`ActivityState`]: state::ActivityState
//! [`ActivityStore`]: store::ActivityStore

pub mod reducer;
pub mod state;
pub mod store;

pub use reducer::reduce;
pub use state::{ActiveSet, ActivityState, ConnectionStatus, HistoryBuffer, HISTORY_CAPACITY};
pub use store::ActivityStore;
