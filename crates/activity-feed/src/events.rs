//! Server-sent events endpoint for the live activity feed.
//!
//! Clients connect to `GET /events`. The first frame is always
//! `event: connected`; every activity line the tailer publishes follows as
//! an `event: activity` frame whose data is the raw JSON line. The handler
//! uses a [`broadcast::Receiver`] so all connected clients see the same
//! stream.
//!
//! If a client falls behind, lagged lines are skipped and the client
//! resumes from the most recent line without being disconnected.

use std::convert::Infallible;
use std::sync::Arc;

use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::{self, Stream, StreamExt};
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tracing::debug;

use crate::state::FeedState;

/// Payload of the handshake frame.
pub const CONNECTED_PAYLOAD: &str = r#"{"status":"connected"}"#;

/// Stream activity lines to the client.
///
/// # Route
///
/// `GET /events`
pub async fn events(
    State(state): State<Arc<FeedState>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    debug!("activity feed client connected");

    // Subscribe before the handshake goes out so nothing published after
    // the client sees `connected` can be missed.
    let rx = state.subscribe();
    let handshake = Event::default().event("connected").data(CONNECTED_PAYLOAD);

    let stream = stream::once(async move { Ok(handshake) }).chain(activity_frames(rx));
    Sse::new(stream).keep_alive(KeepAlive::default())
}

/// Turn broadcast lines into `activity` frames, skipping over lag.
fn activity_frames(
    rx: broadcast::Receiver<String>,
) -> impl Stream<Item = Result<Event, Infallible>> {
    stream::unfold(rx, |mut rx| async move {
        loop {
            match rx.recv().await {
                Ok(line) => {
                    let frame = Event::default().event("activity").data(line);
                    return Some((Ok(frame), rx));
                }
                Err(RecvError::Lagged(skipped)) => {
                    debug!(skipped, "activity feed client lagged, skipping ahead");
                }
                Err(RecvError::Closed) => {
                    debug!("broadcast channel closed, ending activity feed");
                    return None;
                }
            }
        }
    })
}
