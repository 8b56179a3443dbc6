//! Tracker kinds and log levels.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Kind of a tracker node.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackerKind {
    /// Untyped node; implicit ancestors start here.
    Generic = 0,
    Counter = 1,
    Log = 2,
}

impl From<u8> for TrackerKind {
    fn from(val: u8) -> Self {
        match val {
            1 => TrackerKind::Counter,
            2 => TrackerKind::Log,
            _ => TrackerKind::Generic,
        }
    }
}

impl TrackerKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrackerKind::Generic => "generic",
            TrackerKind::Counter => "counter",
            TrackerKind::Log => "log",
        }
    }
}

impl fmt::Display for TrackerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Severity of a log tracker entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Warning,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Info => "info",
            LogLevel::Warning => "warning",
            LogLevel::Error => "error",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_from_u8() {
        assert_eq!(TrackerKind::from(TrackerKind::Counter as u8), TrackerKind::Counter);
        assert_eq!(TrackerKind::from(TrackerKind::Log as u8), TrackerKind::Log);
        assert_eq!(TrackerKind::from(42), TrackerKind::Generic);
    }

    #[test]
    fn test_serde_lowercase() {
        assert_eq!(serde_json::to_string(&TrackerKind::Counter).unwrap(), "\"counter\"");
        assert_eq!(serde_json::to_string(&LogLevel::Warning).unwrap(), "\"warning\"");
    }
}
