//! Generic tracker client handle.
//!
//! # Responsibilities
//! - Represent one binding to a tracker node
//! - Enforce the handle lifecycle (Open → Detached | Shutdown)
//! - Reject updates that do not match the node kind before enqueueing them
//!
//! # Design Decisions
//! - Lifecycle state is an atomic so a handle can be shared behind `Arc`
//! - Every send is fire-and-forget; a node that already retired is logged and
//!   counted, never reported to the caller
//! - Closing enqueues the `Unbind` and then releases the binding in the
//!   registry, so the last close makes the path unaddressable before it returns
//! - Dropping an open handle detaches it

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Weak;

use crate::error::{TrackerError, TrackerResult};
use crate::observability::metrics;
use crate::tree::kind::{LogLevel, TrackerKind};
use crate::tree::message::{LogRecord, TrackerMessage, TrackerSnapshot, UnbindIntent};
use crate::tree::node::NodeRef;
use crate::tree::path::TrackerPath;
use crate::tree::registry::RegistryInner;

/// Lifecycle state of a handle.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientState {
    Open = 0,
    Detached = 1,
    Shutdown = 2,
}

impl From<u8> for ClientState {
    fn from(val: u8) -> Self {
        match val {
            1 => ClientState::Detached,
            2 => ClientState::Shutdown,
            _ => ClientState::Open,
        }
    }
}

/// A caller's binding to a tracker in the tree.
#[derive(Debug)]
pub struct TrackerClient {
    node: NodeRef,
    registry: Weak<RegistryInner>,
    state: AtomicU8,
}

impl TrackerClient {
    /// Wrap a node whose slot already counts this binding.
    pub(crate) fn bound(node: NodeRef, registry: Weak<RegistryInner>) -> Self {
        Self {
            node,
            registry,
            state: AtomicU8::new(ClientState::Open as u8),
        }
    }

    pub fn path(&self) -> &TrackerPath {
        self.node.path()
    }

    /// Kind of the bound node. A Generic node may later be specialized.
    pub fn kind(&self) -> TrackerKind {
        self.node.kind()
    }

    pub fn state(&self) -> ClientState {
        ClientState::from(self.state.load(Ordering::Acquire))
    }

    pub fn is_closed(&self) -> bool {
        self.state() != ClientState::Open
    }

    /// Add `amount` (positive or negative) to a counter tracker.
    pub fn bump(&self, amount: i64) -> TrackerResult<()> {
        self.ensure_open()?;
        self.ensure_kind(TrackerKind::Counter)?;
        self.deliver(TrackerMessage::Bump(amount));
        Ok(())
    }

    /// Send an entry to a log tracker.
    pub fn log(&self, level: LogLevel, message: impl Into<String>) -> TrackerResult<()> {
        self.ensure_open()?;
        self.ensure_kind(TrackerKind::Log)?;
        self.deliver(TrackerMessage::Log(LogRecord::new(level, message)));
        Ok(())
    }

    pub fn info(&self, message: impl Into<String>) -> TrackerResult<()> {
        self.log(LogLevel::Info, message)
    }

    pub fn warning(&self, message: impl Into<String>) -> TrackerResult<()> {
        self.log(LogLevel::Warning, message)
    }

    pub fn error(&self, message: impl Into<String>) -> TrackerResult<()> {
        self.log(LogLevel::Error, message)
    }

    /// End this binding, leaving the tracker for other bindings.
    ///
    /// If this was the last binding the tracker still leaves the tree; the
    /// node only counts bindings and does not tell detach from shutdown.
    pub fn detach(&self) -> TrackerResult<()> {
        self.close(ClientState::Detached, UnbindIntent::Detach)
    }

    /// End this binding, expecting the tracker to leave the tree once no
    /// binding remains.
    pub fn shutdown(&self) -> TrackerResult<()> {
        self.close(ClientState::Shutdown, UnbindIntent::Shutdown)
    }

    /// Current state of the bound tracker.
    pub async fn snapshot(&self) -> TrackerResult<TrackerSnapshot> {
        self.ensure_open()?;
        self.node.snapshot().await
    }

    fn close(&self, next: ClientState, intent: UnbindIntent) -> TrackerResult<()> {
        self.state
            .compare_exchange(
                ClientState::Open as u8,
                next as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .map_err(|_| TrackerError::ClientClosed(self.path().clone()))?;

        tracing::trace!(tracker = %self.path(), intent = intent.as_str(), "Closing tracker client");
        self.deliver(TrackerMessage::Unbind(intent));
        if let Some(registry) = self.registry.upgrade() {
            registry.release_binding(self.path(), self.node.id());
        }
        Ok(())
    }

    fn ensure_open(&self) -> TrackerResult<()> {
        if self.is_closed() {
            return Err(TrackerError::ClientClosed(self.path().clone()));
        }
        Ok(())
    }

    fn ensure_kind(&self, expected: TrackerKind) -> TrackerResult<()> {
        let actual = self.kind();
        if actual != expected {
            metrics::record_type_mismatch();
            return Err(TrackerError::TypeMismatch {
                path: self.path().clone(),
                expected,
                actual,
            });
        }
        Ok(())
    }

    fn deliver(&self, msg: TrackerMessage) {
        let label = msg.label();
        if let Err(e) = self.node.send(msg) {
            metrics::record_detached_message();
            tracing::debug!(tracker = %self.path(), message = label, error = %e, "Dropped message for removed tracker");
        }
    }
}

impl Drop for TrackerClient {
    fn drop(&mut self) {
        if !self.is_closed() {
            tracing::trace!(tracker = %self.path(), "Tracker client dropped while open, detaching");
            let _ = self.detach();
        }
    }
}
