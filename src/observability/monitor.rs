//! Background connection monitor.
//!
//! # Responsibilities
//! - Periodically report the active-connection count
//! - Refresh the connection gauge
//!
//! Runs detached for the life of the runtime. Stopping the server does not
//! stop it, and request handling never waits on it.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};

use crate::net::connection::ConnectionTracker;
use crate::observability::metrics;

pub struct ConnectionMonitor {
    tracker: ConnectionTracker,
    interval: Duration,
}

impl ConnectionMonitor {
    pub fn new(tracker: ConnectionTracker, interval: Duration) -> Self {
        Self { tracker, interval }
    }

    /// Spawn the monitor as a detached task.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    pub async fn run(self) {
        tracing::info!(interval = ?self.interval, "Connection monitor starting");

        let mut ticker = time::interval_at(time::Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            let active = self.tracker.active_count();
            metrics::record_active_connections(active);
            tracing::info!(active_connections = active, "Connection report");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn monitor_runs_independently() {
        let tracker = ConnectionTracker::new();
        let _guard = tracker.track();

        let handle = ConnectionMonitor::new(tracker.clone(), Duration::from_millis(10)).spawn();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!handle.is_finished());
        assert_eq!(tracker.active_count(), 1);

        handle.abort();
    }
}
