//! Periodic refresh scheduling

use lictrack_config::{MAX_REFRESH_INTERVAL_SECS, SyncSettings};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::SyncEngine;

#[derive(Debug, Default)]
struct SchedulerStats {
    cycles_completed: AtomicU64,
    cycles_failed: AtomicU64,
    ticks_skipped: AtomicU64,
}

/// Drives `refresh_all` on a fixed period.
///
/// Cycles never overlap: a tick that arrives while a cycle is still
/// running (scheduled or manual) is skipped and counted, not queued.
pub struct Scheduler;

impl Scheduler {
    /// Start the refresh loop on the current runtime.
    ///
    /// With `refresh_on_start` the first cycle starts now; otherwise after one
    /// full `refresh_interval`.
    pub fn spawn(engine: Arc<SyncEngine>, settings: &SyncSettings) -> SchedulerHandle {
        let max_period = Duration::from_secs(MAX_REFRESH_INTERVAL_SECS);
        let period = if settings.refresh_interval > max_period {
            warn!(
                requested_secs = settings.refresh_interval.as_secs(),
                max_secs = MAX_REFRESH_INTERVAL_SECS,
                "Refresh interval too long, clamping"
            );
            max_period
        } else {
            settings.refresh_interval
        };
        let run_immediately = settings.refresh_on_start;
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let stats = Arc::new(SchedulerStats::default());

        let task = tokio::spawn(run_loop(engine, period, run_immediately, shutdown_rx, stats.clone()));

        info!(
            period_secs = period.as_secs(),
            run_immediately, "Refresh scheduler started"
        );

        SchedulerHandle {
            shutdown_tx,
            task,
            stats,
        }
    }
}

async fn run_loop(
    engine: Arc<SyncEngine>,
    period: Duration,
    run_immediately: bool,
    mut shutdown: watch::Receiver<bool>,
    stats: Arc<SchedulerStats>,
) {
    let start = if run_immediately {
        Instant::now()
    } else {
        Instant::now() + period
    };
    let mut interval = tokio::time::interval_at(start, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let mut in_flight: Option<JoinHandle<()>> = None;

    loop {
        tokio::select! {
            _ = interval.tick() => {
                if in_flight.as_ref().is_some_and(|h| !h.is_finished()) {
                    stats.ticks_skipped.fetch_add(1, Ordering::SeqCst);
                    debug!("Previous refresh cycle still running, skipping tick");
                    continue;
                }
                in_flight = Some(tokio::spawn(run_cycle(engine.clone(), stats.clone())));
            }
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    debug!("Refresh scheduler shutting down");
                    break;
                }
            }
        }
    }

    // Let an in-flight cycle finish so the cache is not left half-written
    if let Some(handle) = in_flight
        && let Err(e) = handle.await
    {
        error!(error = %e, "Refresh cycle task panicked");
    }

    info!("Refresh scheduler stopped");
}

async fn run_cycle(engine: Arc<SyncEngine>, stats: Arc<SchedulerStats>) {
    match engine.try_refresh_all().await {
        Some(Ok(report)) => {
            stats.cycles_completed.fetch_add(1, Ordering::SeqCst);
            debug!(cycle = %report.cycle_id, failed = report.failed(), "Scheduled refresh finished");
        }
        Some(Err(e)) => {
            stats.cycles_failed.fetch_add(1, Ordering::SeqCst);
            warn!(error = %e, "Scheduled refresh failed");
        }
        None => {
            // A manual refresh_all holds the cycle
            stats.ticks_skipped.fetch_add(1, Ordering::SeqCst);
            debug!("Refresh cycle already running, skipping tick");
        }
    }
}

/// Control handle for a running [`Scheduler`]
pub struct SchedulerHandle {
    shutdown_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
    stats: Arc<SchedulerStats>,
}

impl SchedulerHandle {
    pub fn cycles_completed(&self) -> u64 {
        self.stats.cycles_completed.load(Ordering::SeqCst)
    }

    pub fn cycles_failed(&self) -> u64 {
        self.stats.cycles_failed.load(Ordering::SeqCst)
    }

    /// Ticks dropped because a cycle was still running
    pub fn ticks_skipped(&self) -> u64 {
        self.stats.ticks_skipped.load(Ordering::SeqCst)
    }

    /// Stop firing new cycles and wait for any in-flight one to finish
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(true);
        if let Err(e) = self.task.await {
            error!(error = %e, "Refresh scheduler task panicked");
        }
    }
}
