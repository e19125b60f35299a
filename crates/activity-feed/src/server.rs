//! Feed server lifecycle management.
//!
//! [`start_server`] opens the activity log, spawns the tailer, binds the
//! configured address, and serves until the process is terminated.
//! [`serve`] is the same minus configuration, for callers that bring their
//! own listener.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::info;

use crate::config::FeedConfig;
use crate::error::FeedError;
use crate::router::build_router;
use crate::state::FeedState;
use crate::tail::{LogTailer, spawn_tailer};

/// Start the feed server.
///
/// # Errors
///
/// Returns an error if the log cannot be opened, the TCP listener cannot
/// bind, or the server encounters a fatal I/O error.
pub async fn start_server(config: &FeedConfig) -> Result<(), FeedError> {
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .map_err(|e| FeedError::Bind(format!("invalid address: {e}")))?;

    let state = Arc::new(FeedState::new(config.log_file.clone()));
    let tailer = LogTailer::at_end(config.log_file.clone()).await?;
    let tail_task = spawn_tailer(tailer, Arc::clone(&state), config.poll_interval);

    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| FeedError::Bind(format!("bind failed on {addr}: {e}")))?;

    info!(%addr, log_file = %config.log_file.display(), "activity feed listening");

    let result = serve(listener, state).await;
    tail_task.abort();
    result
}

/// Serve the router on an already bound listener.
///
/// # Errors
///
/// Returns [`FeedError::Serve`] if the server encounters a fatal I/O error.
pub async fn serve(listener: TcpListener, state: Arc<FeedState>) -> Result<(), FeedError> {
    axum::serve(listener, build_router(state))
        .await
        .map_err(|e| FeedError::Serve(e.to_string()))
}
