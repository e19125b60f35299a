//! Follower for the JSON-lines activity log.
//!
//! [`LogTailer`] starts at the end of the file, so history that was written
//! before the server started is never replayed. Each poll reads whatever
//! has been appended since, holds back a trailing partial line until its
//! newline arrives, and drops lines that are not valid JSON. If the file
//! shrinks (the recorder truncates it when it grows too large), reading
//! resumes from the new end.

use std::io::SeekFrom;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::error::FeedError;
use crate::state::FeedState;

/// Incremental reader over an append-only log file.
#[derive(Debug)]
pub struct LogTailer {
    path: PathBuf,
    offset: u64,
    partial: Vec<u8>,
}

impl LogTailer {
    /// Open `path` positioned at its current end, creating the file (and
    /// its parent directories) if it does not exist yet.
    pub async fn at_end(path: impl Into<PathBuf>) -> Result<Self, FeedError> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?;
        let offset = file.metadata().await?.len();
        info!(path = %path.display(), offset, "tailing activity log");

        Ok(Self {
            path,
            offset,
            partial: Vec::new(),
        })
    }

    /// The file being followed.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the complete JSON lines appended since the last poll.
    pub async fn poll(&mut self) -> Result<Vec<String>, FeedError> {
        let len = match tokio::fs::metadata(&self.path).await {
            Ok(meta) => meta.len(),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                // A recreated file is all new content.
                self.reset(0);
                return Ok(Vec::new());
            }
            Err(e) => return Err(e.into()),
        };

        if len < self.offset {
            debug!(path = %self.path.display(), from = self.offset, to = len, "activity log truncated");
            self.reset(len);
            return Ok(Vec::new());
        }
        if len == self.offset {
            return Ok(Vec::new());
        }

        let mut file = File::open(&self.path).await?;
        file.seek(SeekFrom::Start(self.offset)).await?;
        let mut buf = Vec::new();
        file.take(len.saturating_sub(self.offset))
            .read_to_end(&mut buf)
            .await?;
        self.offset = self
            .offset
            .saturating_add(u64::try_from(buf.len()).unwrap_or(u64::MAX));
        self.partial.extend_from_slice(&buf);

        Ok(self.take_complete_lines())
    }

    fn reset(&mut self, offset: u64) {
        self.offset = offset;
        self.partial.clear();
    }

    fn take_complete_lines(&mut self) -> Vec<String> {
        let Some(last_newline) = self.partial.iter().rposition(|&b| b == b'\n') else {
            return Vec::new();
        };
        let rest = self.partial.split_off(last_newline.saturating_add(1));
        let complete = std::mem::replace(&mut self.partial, rest);

        String::from_utf8_lossy(&complete)
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .filter(|line| {
                let valid = serde_json::from_str::<serde_json::Value>(line).is_ok();
                if !valid {
                    warn!(line = %line, "skipping non-JSON activity log line");
                }
                valid
            })
            .map(str::to_owned)
            .collect()
    }
}

/// Spawn the single tailer task that feeds every `/events` client.
///
/// The task runs until it is aborted.
pub fn spawn_tailer(
    mut tailer: LogTailer,
    state: Arc<FeedState>,
    poll_interval: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            match tailer.poll().await {
                Ok(lines) => {
                    for line in lines {
                        let receivers = state.publish(line);
                        debug!(receivers, "activity line published");
                    }
                }
                Err(e) => {
                    warn!(error = %e, path = %tailer.path().display(), "failed to read activity log");
                }
            }
        }
    })
}
