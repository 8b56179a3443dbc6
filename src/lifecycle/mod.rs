//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (main.rs):
//!     Load config → Init logging/metrics → Build tree → Start reporter
//!
//! Shutdown:
//!     signals.rs (SIGINT/SIGTERM)
//!     → Shutdown::trigger() → reporter and demo tasks exit
//!     → TrackerTree::shutdown() → registry drained, Evict to every node
//! ```

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
