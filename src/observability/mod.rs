//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Tree and clients produce:
//!     → logging.rs (structured tracing events)
//!     → metrics.rs (node, message and binding counters)
//!     → sink.rs    (log tracker entries, forwarded by log nodes)
//!
//! reporter.rs periodically logs every tracker snapshot.
//! ```

pub mod logging;
pub mod metrics;
pub mod reporter;
pub mod sink;

pub use sink::{LogSink, NullSink, TracingSink};
