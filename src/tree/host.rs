//! Concurrency host for node loops.
//!
//! The registry never spawns directly; it hands each node's loop to a
//! [`NodeHost`]. Embedders that run their own executor can supply one.

use std::fmt;

use futures_util::future::BoxFuture;
use tokio::runtime::Handle;

use crate::tree::path::TrackerPath;

/// Hosts one processing loop per tracker node.
pub trait NodeHost: Send + Sync + fmt::Debug {
    /// Run `task` until completion. Must not block the caller.
    fn spawn(&self, path: &TrackerPath, task: BoxFuture<'static, ()>);
}

/// Spawns node loops onto a tokio runtime.
#[derive(Debug, Clone)]
pub struct TokioHost {
    handle: Handle,
}

impl TokioHost {
    pub fn new(handle: Handle) -> Self {
        Self { handle }
    }

    /// Host bound to the runtime of the calling context.
    ///
    /// # Panics
    /// Panics when called outside a tokio runtime.
    pub fn current() -> Self {
        Self::new(Handle::current())
    }
}

impl NodeHost for TokioHost {
    fn spawn(&self, path: &TrackerPath, task: BoxFuture<'static, ()>) {
        tracing::trace!(tracker = %path, "Spawning tracker loop");
        self.handle.spawn(task);
    }
}
