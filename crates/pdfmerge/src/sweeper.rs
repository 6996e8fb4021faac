//! Expired artifact removal.
//!
//! Two triggers share one rule (remove everything with `expires_at <= now`):
//!
//! - [`SweepGate`] runs a sweep opportunistically from request handling, at
//!   most once per interval no matter how many requests race for it.
//! - [`Sweeper`] runs a background task that sweeps on a fixed period, so
//!   memory is reclaimed on an idle service too.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use crate::clock::Clock;
use crate::store::ArtifactStore;

/// Rate limiter for request-driven sweeps.
#[derive(Debug)]
pub struct SweepGate {
    interval_ms: i64,
    last_sweep_ms: AtomicI64,
}

impl SweepGate {
    /// Create a gate whose first sweep is due one `interval` after `now`.
    pub fn new(interval: Duration, now: DateTime<Utc>) -> Self {
        Self {
            interval_ms: i64::try_from(interval.as_millis()).unwrap_or(i64::MAX),
            last_sweep_ms: AtomicI64::new(now.timestamp_millis()),
        }
    }

    /// Claim the right to sweep at `now`.
    ///
    /// Returns `true` for exactly one caller per elapsed interval.
    pub fn try_claim(&self, now: DateTime<Utc>) -> bool {
        let now_ms = now.timestamp_millis();
        let last = self.last_sweep_ms.load(Ordering::Acquire);

        if now_ms.saturating_sub(last) < self.interval_ms {
            return false;
        }

        self.last_sweep_ms
            .compare_exchange(last, now_ms, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Sweep `store` if the interval has elapsed; returns the removal count
    /// when a sweep ran.
    pub fn maybe_sweep<S: ArtifactStore + ?Sized>(
        &self,
        store: &S,
        now: DateTime<Utc>,
    ) -> Option<usize> {
        if !self.try_claim(now) {
            return None;
        }

        let removed = store.sweep(now);
        if removed > 0 {
            info!(op = "sweep.request", removed, "Swept expired artifacts");
        } else {
            debug!(op = "sweep.request", "Nothing to sweep");
        }
        Some(removed)
    }
}

/// Periodic background sweeper.
pub struct Sweeper;

impl Sweeper {
    /// Spawn a task that sweeps `store` every `interval`.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn spawn<S>(store: Arc<S>, clock: Arc<dyn Clock>, interval: Duration) -> SweeperHandle
    where
        S: ArtifactStore + ?Sized + 'static,
    {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let task = tokio::spawn(sweep_loop(store, clock, interval, shutdown_rx));

        SweeperHandle { shutdown_tx, task }
    }
}

/// Handle to a running [`Sweeper`] task.
pub struct SweeperHandle {
    shutdown_tx: watch::Sender<bool>,
    task: JoinHandle<usize>,
}

impl SweeperHandle {
    /// Stop the sweeper and wait for it; returns the total artifacts removed.
    pub async fn shutdown(self) -> usize {
        // ignore send error: the task may already have exited
        let _ = self.shutdown_tx.send(true);
        self.task.await.unwrap_or(0)
    }
}

async fn sweep_loop<S>(
    store: Arc<S>,
    clock: Arc<dyn Clock>,
    interval: Duration,
    mut shutdown_rx: watch::Receiver<bool>,
) -> usize
where
    S: ArtifactStore + ?Sized,
{
    let mut ticker = tokio::time::interval(interval.max(Duration::from_millis(1)));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately
    ticker.tick().await;

    let mut total = 0;
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let removed = store.sweep(clock.now());
                total += removed;
                if removed > 0 {
                    info!(op = "sweep.periodic", removed, remaining = store.len(), "Swept expired artifacts");
                }
            }
            changed = shutdown_rx.changed() => {
                if changed.is_err() || *shutdown_rx.borrow() {
                    debug!(op = "sweep.shutdown", total, "Sweeper stopping");
                    break;
                }
            }
        }
    }

    total
}
