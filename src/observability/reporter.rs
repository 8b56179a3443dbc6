//! Periodic tree reports.
//!
//! Logs every tracker snapshot as a JSON line at a fixed interval so a
//! running process can be inspected without any export surface.

use std::time::Duration;

use tokio::sync::broadcast;
use tokio::time;

use crate::tree::registry::TrackerTree;

pub struct TreeReporter {
    tree: TrackerTree,
    interval: Duration,
}

impl TreeReporter {
    pub fn new(tree: TrackerTree, interval: Duration) -> Self {
        Self { tree, interval }
    }

    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        if self.interval.is_zero() {
            tracing::info!("Tree reporter disabled");
            return;
        }

        tracing::info!(interval_secs = self.interval.as_secs(), "Tree reporter starting");
        let mut ticker = time::interval(self.interval);
        // First tick fires immediately; skip it so reports start one interval in.
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.report().await;
                }
                _ = shutdown.recv() => {
                    tracing::info!("Tree reporter received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }

    async fn report(&self) {
        let snapshots = self.tree.snapshot_all().await;
        tracing::info!(trackers = snapshots.len(), "Tracker tree report");
        for snapshot in snapshots {
            match serde_json::to_string(&snapshot) {
                Ok(line) => tracing::info!(target: "tracker_tree::report", "{}", line),
                Err(e) => tracing::warn!(tracker = %snapshot.path, error = %e, "Failed to encode snapshot"),
            }
        }
    }
}
