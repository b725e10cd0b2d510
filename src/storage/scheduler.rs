//! Background Job Scheduler
//!
//! This module implements the periodic trigger that drives a store's purge
//! and export jobs. A [`Scheduler`] owns one Tokio task that wakes up once per
//! interval and hands the job to the blocking thread pool.
//!
//! ## Design
//!
//! The scheduler loop:
//! 1. Waits for the next tick or a shutdown signal
//! 2. Dispatches the job with `spawn_blocking`, without waiting for it
//! 3. Goes back to waiting
//!
//! Because runs are never awaited, a slow run cannot delay the next tick.
//! A tick that fires while the previous run is still going starts another
//! run; the job itself is expected to reject overlapping runs (the store's
//! purge and export jobs do so through their single-flight locks).
//!
//! ## Shutdown
//!
//! Stopping the scheduler (explicitly or by dropping the handle) stops new
//! ticks. Runs that were already dispatched finish on their own.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, trace};

/// A handle to a running periodic job.
///
/// When this handle is dropped, the job stops being scheduled.
#[derive(Debug)]
pub struct Scheduler {
    /// Job name, for logs
    name: &'static str,

    /// Sender to signal shutdown
    shutdown_tx: watch::Sender<bool>,
}

impl Scheduler {
    /// Starts running `job` once every `interval`, beginning one interval from now.
    ///
    /// Must be called from within a Tokio runtime.
    ///
    /// # Panics
    ///
    /// Panics if `interval` is zero.
    ///
    /// # Example
    ///
    /// ```ignore
    /// use csvdb::storage::Scheduler;
    /// use std::time::Duration;
    ///
    /// let scheduler = Scheduler::start("heartbeat", Duration::from_secs(1), || {
    ///     println!("tick");
    /// });
    ///
    /// // Job runs in the background...
    ///
    /// // Dropping the scheduler stops it
    /// drop(scheduler);
    /// ```
    pub fn start<F>(name: &'static str, interval: Duration, job: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        assert!(!interval.is_zero(), "scheduler interval must be non-zero");

        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        tokio::spawn(scheduler_loop(name, interval, Arc::new(job), shutdown_rx));

        debug!(job = name, interval_ms = interval.as_millis(), "Scheduler started");

        Self { name, shutdown_tx }
    }

    /// Stops scheduling new runs.
    ///
    /// This is called automatically when the handle is dropped.
    pub fn stop(&self) {
        if self.shutdown_tx.send(true).is_ok() {
            debug!(job = self.name, "Scheduler stopped");
        }
    }

    /// The job name given to [`Scheduler::start`].
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

/// The main scheduler loop.
async fn scheduler_loop<F>(
    name: &'static str,
    interval: Duration,
    job: Arc<F>,
    mut shutdown_rx: watch::Receiver<bool>,
) where
    F: Fn() + Send + Sync + 'static,
{
    let mut ticker = time::interval_at(Instant::now() + interval, interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        // Wait for the next tick or shutdown signal
        tokio::select! {
            _ = ticker.tick() => {}
            result = shutdown_rx.changed() => {
                if result.is_err() || *shutdown_rx.borrow() {
                    trace!(job = name, "Scheduler received shutdown signal");
                    return;
                }
                continue;
            }
        }

        trace!(job = name, "Dispatching scheduled run");
        let job = Arc::clone(&job);
        // Not awaited: the next tick must not depend on this run finishing
        drop(tokio::task::spawn_blocking(move || job()));
    }
}
