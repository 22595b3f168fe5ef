//! Heartbeat scheduling
//!
//! A `HeartbeatTask` owns a scheduler loop that fires a tick every
//! `interval`, starting one interval after spawn. Each tick runs as its own
//! task, so a slow tick never delays the next one.
//!
//! Cancelling aborts the scheduler loop synchronously: no tick starts after
//! `cancel()` returns. A tick already running is left to complete.

use std::future::Future;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

/// Cancellable recurring heartbeat
#[derive(Debug)]
pub struct HeartbeatTask {
    scheduler: JoinHandle<()>,
    interval: Duration,
}

impl HeartbeatTask {
    /// Start the scheduler; `tick` produces the work for each firing
    pub fn spawn<F, Fut>(interval: Duration, tick: F) -> Self
    where
        F: Fn() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let scheduler = tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                tokio::spawn(tick());
            }
        });

        Self {
            scheduler,
            interval,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Whether the scheduler loop is still alive
    pub fn is_live(&self) -> bool {
        !self.scheduler.is_finished()
    }

    /// Stop scheduling ticks
    pub fn cancel(self) {
        // Drop aborts the scheduler
    }
}

impl Drop for HeartbeatTask {
    fn drop(&mut self) {
        self.scheduler.abort();
    }
}
