//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use tracker_tree::config::TreeConfig;
use tracker_tree::observability::{LogSink, NullSink};
use tracker_tree::tree::{LogLevel, TokioHost, TrackerPath};
use tracker_tree::{TrackerClientFactory, TrackerTree};

/// Sink that keeps every entry in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    entries: Mutex<Vec<(LogLevel, String, String)>>,
}

impl MemorySink {
    pub fn entries(&self) -> Vec<(LogLevel, String, String)> {
        self.entries.lock().unwrap().clone()
    }
}

impl LogSink for MemorySink {
    fn write(&self, level: LogLevel, path: &TrackerPath, message: &str) {
        self.entries
            .lock()
            .unwrap()
            .push((level, path.to_string(), message.to_string()));
    }
}

/// Factory over a fresh tree with default settings.
pub fn factory() -> TrackerClientFactory {
    factory_with(TreeConfig::default(), Arc::new(NullSink))
}

pub fn factory_with(config: TreeConfig, sink: Arc<dyn LogSink>) -> TrackerClientFactory {
    let tree = TrackerTree::new(config, Arc::new(TokioHost::current()), sink);
    TrackerClientFactory::new(tree)
}

pub fn path(raw: &str) -> TrackerPath {
    raw.parse().unwrap()
}
