//! Tracker tree subsystem.
//!
//! # Data Flow
//! ```text
//! path.rs      parse "a/b/c" → TrackerPath
//! registry.rs  attach "/", "a", "a/b" (Generic, pinned by the next level)
//!              attach "a/b/c" + Bind → NodeRef
//!              last binding released → evict slot → Evict
//!              last child of an unbound ancestor evicted → evict it too
//! node.rs      one loop per path applies Bind/Unbind/Bump/Log in order
//!              Evict → stop
//! host.rs      where node loops run
//! ```
//!
//! # Design Decisions
//! - The path → slot map is the only state shared across callers, and
//!   addressability is decided there
//! - Node state is touched only by the node's own loop

pub mod host;
pub mod kind;
pub mod message;
pub(crate) mod node;
pub mod path;
pub mod registry;

pub use host::{NodeHost, TokioHost};
pub use kind::{LogLevel, TrackerKind};
pub use message::{LogRecord, TrackerSnapshot, UnbindIntent};
pub use path::{PathError, TrackerPath};
pub use registry::TrackerTree;
