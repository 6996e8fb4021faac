//! Snapshot file handling for the server process.
//!
//! Pending downloads are restored from the snapshot at startup, written back
//! on a fixed period, and written one last time on shutdown.

use chrono::{DateTime, Utc};
use pdfmerge::persist::{RestoreReport, Snapshot};
use pdfmerge::{InMemoryStore, PersistError};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

/// Load the snapshot at `path` into `store`.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn restore(
    store: &InMemoryStore,
    path: &Path,
    now: DateTime<Utc>,
) -> Result<RestoreReport, PersistError> {
    let report = Snapshot::load(path)?.restore_into(store, now);
    info!(
        op = "snapshot.restore",
        path = %path.display(),
        restored = report.restored,
        expired = report.expired,
        skipped = report.skipped,
        "Restored pending downloads"
    );
    Ok(report)
}

/// Capture `store` and write it to `path` off the async runtime.
pub async fn save(store: Arc<InMemoryStore>, path: PathBuf) -> Result<usize, PersistError> {
    let target = path.clone();
    let result = tokio::task::spawn_blocking(move || {
        let snapshot = Snapshot::capture(&*store);
        snapshot.save(&target).map(|()| snapshot.len())
    })
    .await;

    result.unwrap_or_else(|e| {
        Err(PersistError::Io {
            path,
            source: std::io::Error::other(e),
        })
    })
}

/// Periodic snapshot writer.
pub struct SnapshotTask;

impl SnapshotTask {
    /// Spawn a task that writes `store` to `path` every `interval`, and once
    /// more when shut down.
    pub fn spawn(store: Arc<InMemoryStore>, path: PathBuf, interval: Duration) -> SnapshotHandle {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let task = tokio::spawn(snapshot_loop(store, path, interval, shutdown_rx));

        SnapshotHandle { shutdown_tx, task }
    }
}

/// Handle to a running [`SnapshotTask`].
pub struct SnapshotHandle {
    shutdown_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl SnapshotHandle {
    /// Stop the task after a final write and wait for it.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(true);
        if let Err(e) = self.task.await {
            warn!(op = "snapshot.shutdown", error = %e, "Snapshot task failed");
        }
    }
}

async fn snapshot_loop(
    store: Arc<InMemoryStore>,
    path: PathBuf,
    interval: Duration,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval(interval.max(Duration::from_secs(1)));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                write_logged(&store, &path, "snapshot.periodic").await;
            }
            changed = shutdown_rx.changed() => {
                if changed.is_err() || *shutdown_rx.borrow() {
                    break;
                }
            }
        }
    }

    write_logged(&store, &path, "snapshot.final").await;
}

async fn write_logged(store: &Arc<InMemoryStore>, path: &Path, op: &'static str) {
    match save(Arc::clone(store), path.to_path_buf()).await {
        Ok(artifacts) => debug!(op, artifacts, path = %path.display(), "Snapshot written"),
        Err(e) => warn!(op, error = %e, "Snapshot write failed"),
    }
}
