//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from TOML files. Every
//! field has a default so an empty file is a valid configuration.

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct TrackerConfig {
    /// Tracker tree behavior.
    pub tree: TreeConfig,

    /// Logging, metrics and reporting.
    pub observability: ObservabilityConfig,
}

/// Tracker tree settings.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct TreeConfig {
    /// Log entries retained per log tracker (0 keeps none).
    pub history_capacity: usize,

    /// Forward log tracker entries to the external sink.
    pub forward_to_sink: bool,

    /// Maximum number of path segments accepted by `locate`.
    pub max_depth: usize,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            history_capacity: 100,
            forward_to_sink: true,
            max_depth: 32,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,

    /// Seconds between tree snapshot reports (0 disables).
    pub report_interval_secs: u64,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
            report_interval_secs: 0,
        }
    }
}
