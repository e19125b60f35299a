//! Activity feed server entry point.
//!
//! Tails the project's activity log and serves it as a server-sent event
//! stream on `GET /events`.

use activity_feed::{FeedConfig, start_server};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Application entry point.
///
/// Initializes logging, loads configuration from environment variables,
/// then serves until `Ctrl-C`.
///
/// # Errors
///
/// Returns an error if configuration is invalid or the server cannot start.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = FeedConfig::from_env()?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if config.json_logs {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    }

    info!(
        host = %config.host,
        port = config.port,
        log_file = %config.log_file.display(),
        poll_ms = u64::try_from(config.poll_interval.as_millis()).unwrap_or(u64::MAX),
        "activity-feed starting"
    );

    // Open SSE streams never finish on their own, so shutdown does not wait
    // for them.
    tokio::select! {
        result = start_server(&config) => {
            if let Err(e) = &result {
                error!(error = %e, "activity feed exited with error");
            }
            result?;
        }
        result = tokio::signal::ctrl_c() => {
            result?;
            info!("shutting down");
        }
    }

    Ok(())
}
