//! Hook that records subagent and skill activity.
//!
//! Reads one hook payload from stdin and appends the matching `start` or
//! `end` event to `<CLAUDE_PROJECT_DIR>/.claude/stream.jsonl`. The hook
//! always exits successfully so it can never block the tool it observes;
//! problems are reported on stderr.

use std::io::Read;

use activity_feed::record::now_millis;
use activity_feed::{HookInput, ProjectPaths, Recorder};
use anyhow::Context;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_target(true)
        .init();

    if let Err(e) = run() {
        warn!(error = ?e, "activity not recorded");
    }
}

fn run() -> anyhow::Result<()> {
    let mut raw = String::new();
    std::io::stdin()
        .read_to_string(&mut raw)
        .context("failed to read hook input")?;

    let input: HookInput = match serde_json::from_str(&raw) {
        Ok(input) => input,
        Err(e) => {
            debug!(error = %e, "hook input is not a JSON object, ignoring");
            return Ok(());
        }
    };

    let paths = ProjectPaths::from_env();
    let recorder = Recorder::new(paths.clone());
    let recorded = recorder
        .record(&input, now_millis())
        .with_context(|| format!("failed to write {}", paths.log_file.display()))?;

    if let Some(event) = recorded {
        debug!(
            event = ?event.kind,
            node = %event.identity(),
            id = %event.id,
            "activity recorded"
        );
    }
    Ok(())
}
