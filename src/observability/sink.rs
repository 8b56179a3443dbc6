//! External sinks for log tracker entries.
//!
//! Log nodes keep a bounded history of their own; a sink is where entries go
//! when they must outlive that history (log collector, stdout, test buffer).

use std::fmt;

use crate::tree::kind::LogLevel;
use crate::tree::path::TrackerPath;

/// Append-only destination for log tracker entries.
pub trait LogSink: Send + Sync + fmt::Debug {
    fn write(&self, level: LogLevel, path: &TrackerPath, message: &str);
}

/// Forwards entries as `tracing` events carrying the tracker path.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn write(&self, level: LogLevel, path: &TrackerPath, message: &str) {
        match level {
            LogLevel::Info => tracing::info!(tracker = %path, "{}", message),
            LogLevel::Warning => tracing::warn!(tracker = %path, "{}", message),
            LogLevel::Error => tracing::error!(tracker = %path, "{}", message),
        }
    }
}

/// Discards every entry.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl LogSink for NullSink {
    fn write(&self, _level: LogLevel, _path: &TrackerPath, _message: &str) {}
}
