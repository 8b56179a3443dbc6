//! Error taxonomy for the tracker tree.
//!
//! # Propagation
//! - Usage errors (bad path, closed handle, kind mismatch) are returned
//!   synchronously to the caller and never retried.
//! - `Detached` marks a message that reached a node after it retired. Handles
//!   swallow it for updates (logged and counted) and only surface it from
//!   reads such as `snapshot()`.

use thiserror::Error;

use crate::tree::kind::TrackerKind;
use crate::tree::path::{PathError, TrackerPath};

/// Errors produced by the tracker tree and its clients.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TrackerError {
    /// The path string could not be parsed or exceeds the configured depth.
    #[error("invalid tracker path: {0}")]
    InvalidPath(#[from] PathError),

    /// The operation does not match the kind of the bound tracker.
    #[error("tracker at {path} is a {actual} tracker, operation requires {expected}")]
    TypeMismatch {
        path: TrackerPath,
        expected: TrackerKind,
        actual: TrackerKind,
    },

    /// The handle has already been detached or shut down.
    #[error("tracker client for {0} is closed")]
    ClientClosed(TrackerPath),

    /// The node retired before the message was delivered.
    #[error("tracker at {0} has been removed from the tree")]
    Detached(TrackerPath),

    /// The tree has been shut down and accepts no new bindings.
    #[error("tracker tree is shut down")]
    TreeClosed,
}

/// Result type for tracker operations.
pub type TrackerResult<T> = Result<T, TrackerError>;
