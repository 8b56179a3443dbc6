//! Tracker tree: a path-addressed registry of live counters and logs.
//!
//! Applications bind to trackers by path, report bumps or log entries, and
//! detach or shut down when done. Each tracker is a node with its own
//! sequential loop; the tree maps paths to nodes.

pub mod client;
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod observability;
pub mod tree;

pub use client::{CounterTrackerClient, LogTrackerClient, TrackerClient, TrackerClientFactory};
pub use config::TrackerConfig;
pub use error::{TrackerError, TrackerResult};
pub use tree::{LogLevel, TrackerKind, TrackerPath, TrackerSnapshot, TrackerTree};
