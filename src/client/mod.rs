//! Tracker clients.
//!
//! # Data Flow
//! ```text
//! TrackerClientFactory::locate(path)
//!     → TrackerTree::resolve_or_create (binding counted, Bind enqueued)
//!     → TrackerClient (Open)
//!
//! bump / info / warning / error → kind check → node mailbox
//! detach / shutdown             → Unbind      → node mailbox
//!                               → release binding (evict at zero) → handle closed
//! ```
//!
//! # Design Decisions
//! - One handle per binding; handles are not `Clone`
//! - Typed facades deref to the generic handle

pub mod counter;
pub mod factory;
pub mod handle;
pub mod log;

pub use counter::CounterTrackerClient;
pub use factory::TrackerClientFactory;
pub use handle::{ClientState, TrackerClient};
pub use log::LogTrackerClient;
