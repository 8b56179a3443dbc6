//! Tracker node: one sequential processing loop per tree path.
//!
//! # Responsibilities
//! - Own the node's accumulated state (counter value, log history, children)
//! - Apply mailbox messages one at a time, in arrival order
//! - Stop once the registry evicts its slot
//!
//! # Lifetime
//! ```text
//! registry slot inserted → spawn loop
//!     → Bind / Unbind / Bump / Log / Adopt / Release / Snapshot ...
//! registry slot removed  → Evict → close mailbox, drop leftovers, stop
//! ```
//!
//! # Design Decisions
//! - Whether a path is still addressable is decided by the registry under
//!   the slot's shard lock; the loop only learns the outcome through `Evict`
//! - The loop keeps its own binding count from applied `Bind`/`Unbind`
//!   messages, which is what snapshots report
//! - Only the kind is shared with handles, so they can reject mismatched
//!   updates synchronously
//! - The loop also ends when every sender is gone, so a dropped tree does
//!   not leak tasks

use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use uuid::Uuid;

use crate::config::schema::TreeConfig;
use crate::error::{TrackerError, TrackerResult};
use crate::observability::metrics;
use crate::observability::sink::LogSink;
use crate::tree::kind::TrackerKind;
use crate::tree::message::{LogRecord, TrackerMessage, TrackerSnapshot};
use crate::tree::path::TrackerPath;

/// Cloneable reference to one node incarnation.
#[derive(Debug, Clone)]
pub(crate) struct NodeRef {
    id: Uuid,
    path: TrackerPath,
    kind: Arc<AtomicU8>,
    tx: mpsc::UnboundedSender<TrackerMessage>,
}

impl NodeRef {
    pub(crate) fn id(&self) -> Uuid {
        self.id
    }

    pub(crate) fn path(&self) -> &TrackerPath {
        &self.path
    }

    pub(crate) fn kind(&self) -> TrackerKind {
        TrackerKind::from(self.kind.load(Ordering::Acquire))
    }

    /// True once the node loop has closed its mailbox.
    pub(crate) fn is_stopped(&self) -> bool {
        self.tx.is_closed()
    }

    /// Reconcile a requested kind with the node's kind.
    ///
    /// A Generic node is specialized at most once; two concrete kinds never mix.
    pub(crate) fn claim_kind(&self, requested: TrackerKind) -> TrackerResult<TrackerKind> {
        if requested == TrackerKind::Generic {
            return Ok(self.kind());
        }
        match self.kind.compare_exchange(
            TrackerKind::Generic as u8,
            requested as u8,
            Ordering::AcqRel,
            Ordering::Acquire,
        ) {
            Ok(_) => {
                tracing::debug!(tracker = %self.path, kind = %requested, "Tracker specialized");
                Ok(requested)
            }
            Err(current) if current == requested as u8 => Ok(requested),
            Err(current) => Err(TrackerError::TypeMismatch {
                path: self.path.clone(),
                expected: requested,
                actual: TrackerKind::from(current),
            }),
        }
    }

    pub(crate) fn send(&self, msg: TrackerMessage) -> TrackerResult<()> {
        self.tx
            .send(msg)
            .map_err(|_| TrackerError::Detached(self.path.clone()))
    }

    /// Ask the node loop for its current state.
    pub(crate) async fn snapshot(&self) -> TrackerResult<TrackerSnapshot> {
        let (reply, rx) = oneshot::channel();
        self.send(TrackerMessage::Snapshot(reply))?;
        rx.await.map_err(|_| TrackerError::Detached(self.path.clone()))
    }
}

/// The node loop and its private state.
pub(crate) struct TrackerNode {
    id: Uuid,
    path: TrackerPath,
    kind: Arc<AtomicU8>,
    rx: mpsc::UnboundedReceiver<TrackerMessage>,
    sink: Arc<dyn LogSink>,

    history_capacity: usize,
    forward_to_sink: bool,

    bindings: usize,
    value: i64,
    history: VecDeque<LogRecord>,
    children: BTreeMap<TrackerPath, Uuid>,
    processed: u64,
}

impl TrackerNode {
    /// Build a node and the reference handed out to the registry.
    ///
    /// `id` is reused when a stopped loop is respawned in place.
    pub(crate) fn new(
        path: TrackerPath,
        kind: TrackerKind,
        id: Option<Uuid>,
        sink: Arc<dyn LogSink>,
        config: &TreeConfig,
    ) -> (NodeRef, TrackerNode) {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = id.unwrap_or_else(Uuid::new_v4);
        let kind = Arc::new(AtomicU8::new(kind as u8));

        let node_ref = NodeRef {
            id,
            path: path.clone(),
            kind: kind.clone(),
            tx,
        };
        let node = TrackerNode {
            id,
            path,
            kind,
            rx,
            sink,
            history_capacity: config.history_capacity,
            forward_to_sink: config.forward_to_sink,
            bindings: 0,
            value: 0,
            history: VecDeque::with_capacity(config.history_capacity.min(1024)),
            children: BTreeMap::new(),
            processed: 0,
        };
        (node_ref, node)
    }

    fn kind(&self) -> TrackerKind {
        TrackerKind::from(self.kind.load(Ordering::Acquire))
    }

    /// Run until evicted or until every sender is dropped.
    pub(crate) async fn run(mut self) {
        while let Some(msg) = self.rx.recv().await {
            let evicted = matches!(msg, TrackerMessage::Evict);
            self.apply(msg);
            if evicted {
                break;
            }
        }

        self.rx.close();
        let mut dropped = 0usize;
        while self.rx.try_recv().is_ok() {
            metrics::record_detached_message();
            dropped += 1;
        }

        metrics::record_node_stopped();
        tracing::debug!(
            tracker = %self.path,
            id = %self.id,
            processed = self.processed,
            dropped,
            "Tracker stopped"
        );
    }

    fn apply(&mut self, msg: TrackerMessage) {
        metrics::record_message(msg.label());
        self.processed += 1;

        match msg {
            TrackerMessage::Bind => {
                self.bindings += 1;
                tracing::trace!(tracker = %self.path, bindings = self.bindings, "Bind");
            }
            TrackerMessage::Unbind(intent) => {
                metrics::record_unbind(intent.as_str());
                if self.bindings == 0 {
                    tracing::warn!(tracker = %self.path, intent = intent.as_str(), "Unbind on tracker with no bindings");
                    return;
                }
                self.bindings -= 1;
                tracing::trace!(tracker = %self.path, bindings = self.bindings, intent = intent.as_str(), "Unbind");
            }
            TrackerMessage::Bump(amount) => match self.kind() {
                TrackerKind::Counter => self.value = self.value.saturating_add(amount),
                actual => self.ignore("bump", actual),
            },
            TrackerMessage::Log(record) => match self.kind() {
                TrackerKind::Log => self.record(record),
                actual => self.ignore("log", actual),
            },
            TrackerMessage::Adopt(child, id) => {
                self.children.insert(child, id);
            }
            TrackerMessage::Release(child, id) => {
                if self.children.get(&child) == Some(&id) {
                    self.children.remove(&child);
                }
            }
            TrackerMessage::Evict => {}
            TrackerMessage::Snapshot(reply) => {
                let _ = reply.send(self.snapshot());
            }
        }
    }

    fn record(&mut self, record: LogRecord) {
        if self.forward_to_sink {
            self.sink.write(record.level, &self.path, &record.message);
        }
        if self.history_capacity == 0 {
            return;
        }
        if self.history.len() >= self.history_capacity {
            self.history.pop_front();
        }
        self.history.push_back(record);
    }

    // Handles check the kind before enqueueing and kinds never return to
    // Generic, so only a crate-internal sender can get here.
    fn ignore(&self, operation: &'static str, actual: TrackerKind) {
        tracing::warn!(tracker = %self.path, operation, kind = %actual, "Update ignored, tracker kind mismatch");
    }

    fn snapshot(&self) -> TrackerSnapshot {
        TrackerSnapshot {
            id: self.id,
            path: self.path.clone(),
            kind: self.kind(),
            bindings: self.bindings,
            value: self.value,
            recent: self.history.iter().cloned().collect(),
            children: self.children.keys().cloned().collect(),
            messages_processed: self.processed,
        }
    }
}
