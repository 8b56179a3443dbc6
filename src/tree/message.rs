//! Messages accepted by a tracker node, and the snapshots it produces.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;
use uuid::Uuid;

use crate::tree::kind::{LogLevel, TrackerKind};
use crate::tree::path::TrackerPath;

/// Why a binding ended. Both intents decrement the binding count alike.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnbindIntent {
    Detach,
    Shutdown,
}

impl UnbindIntent {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnbindIntent::Detach => "detach",
            UnbindIntent::Shutdown => "shutdown",
        }
    }
}

/// A single log tracker entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogRecord {
    pub level: LogLevel,
    pub message: String,
    /// Milliseconds since the Unix epoch at which the client sent the entry.
    pub timestamp_ms: u64,
}

impl LogRecord {
    pub fn new(level: LogLevel, message: impl Into<String>) -> Self {
        let timestamp_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64;
        Self {
            level,
            message: message.into(),
            timestamp_ms,
        }
    }
}

/// Point-in-time view of a node, answered by the node's own loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackerSnapshot {
    pub id: Uuid,
    pub path: TrackerPath,
    pub kind: TrackerKind,
    pub bindings: usize,
    pub value: i64,
    pub recent: Vec<LogRecord>,
    pub children: Vec<TrackerPath>,
    pub messages_processed: u64,
}

/// Mailbox message.
#[derive(Debug)]
pub(crate) enum TrackerMessage {
    Bind,
    Unbind(UnbindIntent),
    Bump(i64),
    Log(LogRecord),
    /// A child incarnation now hangs under this node.
    Adopt(TrackerPath, Uuid),
    /// The child incarnation left the registry. Ignored for a newer incarnation.
    Release(TrackerPath, Uuid),
    /// The slot was removed from the registry; stop after this message.
    Evict,
    Snapshot(oneshot::Sender<TrackerSnapshot>),
}

impl TrackerMessage {
    /// Label used for metrics.
    pub(crate) fn label(&self) -> &'static str {
        match self {
            TrackerMessage::Bind => "bind",
            TrackerMessage::Unbind(_) => "unbind",
            TrackerMessage::Bump(_) => "bump",
            TrackerMessage::Log(_) => "log",
            TrackerMessage::Adopt(..) => "adopt",
            TrackerMessage::Release(..) => "release",
            TrackerMessage::Evict => "evict",
            TrackerMessage::Snapshot(_) => "snapshot",
        }
    }
}
