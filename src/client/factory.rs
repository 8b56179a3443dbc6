//! Tracker client factory: the single entry point for binding to the tree.

use crate::client::counter::CounterTrackerClient;
use crate::client::handle::TrackerClient;
use crate::client::log::LogTrackerClient;
use crate::error::TrackerResult;
use crate::tree::kind::TrackerKind;
use crate::tree::path::TrackerPath;
use crate::tree::registry::TrackerTree;

/// Hands out tracker clients bound to one tree.
#[derive(Debug, Clone)]
pub struct TrackerClientFactory {
    tree: TrackerTree,
}

impl TrackerClientFactory {
    pub fn new(tree: TrackerTree) -> Self {
        Self { tree }
    }

    pub fn tree(&self) -> &TrackerTree {
        &self.tree
    }

    /// Bind to the tracker at `path`, creating a Generic tracker if none exists.
    pub fn locate(&self, path: &str) -> TrackerResult<TrackerClient> {
        self.locate_as(path, TrackerKind::Generic)
    }

    /// Bind to the counter tracker at `path`.
    pub fn locate_counter(&self, path: &str) -> TrackerResult<CounterTrackerClient> {
        self.locate_as(path, TrackerKind::Counter)
            .map(CounterTrackerClient::new)
    }

    /// Bind to the log tracker at `path`.
    pub fn locate_log(&self, path: &str) -> TrackerResult<LogTrackerClient> {
        self.locate_as(path, TrackerKind::Log).map(LogTrackerClient::new)
    }

    pub fn locate_as(&self, path: &str, kind: TrackerKind) -> TrackerResult<TrackerClient> {
        let path = TrackerPath::parse(path)?;
        self.locate_path(&path, kind)
    }

    /// Bind to an already-parsed path.
    pub fn locate_path(&self, path: &TrackerPath, kind: TrackerKind) -> TrackerResult<TrackerClient> {
        let node = self.tree.resolve_or_create(path, kind, true)?;
        tracing::trace!(tracker = %path, id = %node.id(), kind = %node.kind(), "Tracker client bound");
        Ok(TrackerClient::bound(node, self.tree.downgrade()))
    }
}
