//! Headless activity monitor.
//!
//! Loads the graph description, subscribes to the activity feed, and logs
//! every change to the connection status or the set of active nodes until
//! interrupted.

use std::sync::Arc;

use activity_core::{ActivityState, ActivityStore};
use activity_stream::{ConnectionManager, GraphLoader, HttpFeed, MonitorConfig};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Application entry point.
///
/// # Errors
///
/// Returns an error if configuration is invalid.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = MonitorConfig::from_env()?;

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
        feed_url = %config.feed_url,
        graph_data_url = %config.graph_data_url,
        reconnect_delay_ms = u64::try_from(config.reconnect_delay.as_millis()).unwrap_or(u64::MAX),
        "activity-monitor starting"
    );

    // A missing graph is not fatal; activity is still tracked.
    let mut graph = GraphLoader::new();
    if let Ok(data) = graph.load(config.graph_data_url.clone()).await {
        info!(
            agents = data.metadata.agent_count,
            skills = data.metadata.skill_count,
            "graph ready"
        );
    }

    let store = Arc::new(ActivityStore::new());
    let mut updates = store.subscribe();
    let mut manager = ConnectionManager::new(
        HttpFeed::new(config.feed_url.clone()),
        Arc::clone(&store),
        config.manager_config(),
    );
    manager.start();

    let mut last = store.snapshot();
    loop {
        tokio::select! {
            result = tokio::signal::ctrl_c() => {
                if let Err(e) = result {
                    warn!(error = %e, "failed to listen for shutdown signal");
                }
                break;
            }
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let current = Arc::clone(&updates.borrow_and_update());
                report(&last, &current);
                last = current;
            }
        }
    }

    info!("shutting down");
    manager.stop().await;
    Ok(())
}

/// Log what differs between two snapshots.
fn report(previous: &ActivityState, current: &ActivityState) {
    if previous.status != current.status {
        info!(
            status = %current.status,
            error = current.last_error.as_deref().unwrap_or(""),
            "connection status changed"
        );
    }
    if previous.active != current.active {
        let active: Vec<String> = current
            .active
            .iter()
            .map(|(node, count)| format!("{node}x{count}"))
            .collect();
        info!(active = ?active, "active nodes changed");
    }
    if let Some(event) = current.history.latest() {
        if previous.history.latest() != Some(event) {
            info!(
                event = ?event.kind,
                node = %event.identity(),
                id = %event.id,
                history = current.history.len(),
                "activity"
            );
        }
    }
}
