//! Hierarchical tracker paths.
//!
//! # Responsibilities
//! - Parse slash-delimited identifiers into validated segment sequences
//! - Derive parent, child and ancestor paths
//! - Provide structural equality and hashing for registry keys
//!
//! # Design Decisions
//! - Root is the empty sequence; it cannot be parsed, so it is never bound
//! - No normalization: leading/trailing slashes are empty segments and rejected
//! - Segments restricted to a conservative ASCII set

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Reasons a path string is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    #[error("path is empty")]
    Empty,

    #[error("segment {index} is empty")]
    EmptySegment { index: usize },

    #[error("segment {segment:?} is reserved")]
    ReservedSegment { segment: String },

    #[error("segment {segment:?} contains disallowed character {ch:?}")]
    InvalidCharacter { segment: String, ch: char },

    #[error("path depth {depth} exceeds maximum {max}")]
    TooDeep { depth: usize, max: usize },
}

/// An immutable, slash-delimited tracker path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct TrackerPath {
    segments: Vec<String>,
}

impl TrackerPath {
    /// The root of the tree.
    pub fn root() -> Self {
        Self::default()
    }

    /// Parse a path such as `metrics/logins`.
    pub fn parse(raw: &str) -> Result<Self, PathError> {
        if raw.is_empty() {
            return Err(PathError::Empty);
        }

        let segments = raw
            .split('/')
            .enumerate()
            .map(|(index, segment)| validate_segment(index, segment).map(|_| segment.to_string()))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { segments })
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Number of segments (root is 0).
    pub fn depth(&self) -> usize {
        self.segments.len()
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Last segment, `None` for root.
    pub fn name(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    pub fn parent(&self) -> Option<TrackerPath> {
        if self.is_root() {
            return None;
        }
        Some(Self {
            segments: self.segments[..self.segments.len() - 1].to_vec(),
        })
    }

    /// Extend this path by one validated segment.
    pub fn child(&self, segment: &str) -> Result<TrackerPath, PathError> {
        validate_segment(self.depth(), segment)?;
        let mut segments = self.segments.clone();
        segments.push(segment.to_string());
        Ok(Self { segments })
    }

    /// Every proper ancestor, root first.
    pub fn ancestors(&self) -> impl Iterator<Item = TrackerPath> + '_ {
        (0..self.segments.len()).map(move |len| Self {
            segments: self.segments[..len].to_vec(),
        })
    }

    /// True if `other` lies strictly below this path.
    pub fn is_ancestor_of(&self, other: &TrackerPath) -> bool {
        other.segments.len() > self.segments.len() && other.segments.starts_with(&self.segments)
    }
}

fn validate_segment(index: usize, segment: &str) -> Result<(), PathError> {
    if segment.is_empty() {
        return Err(PathError::EmptySegment { index });
    }
    if segment == "." || segment == ".." {
        return Err(PathError::ReservedSegment {
            segment: segment.to_string(),
        });
    }
    if let Some(ch) = segment.chars().find(|c| !is_segment_char(*c)) {
        return Err(PathError::InvalidCharacter {
            segment: segment.to_string(),
            ch,
        });
    }
    Ok(())
}

fn is_segment_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | ':' | '@')
}

impl fmt::Display for TrackerPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_root() {
            return f.write_str("/");
        }
        f.write_str(&self.segments.join("/"))
    }
}

impl FromStr for TrackerPath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for TrackerPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TrackerPath {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        if raw == "/" {
            return Ok(Self::root());
        }
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_display() {
        let path = TrackerPath::parse("metrics/logins").unwrap();
        assert_eq!(path.depth(), 2);
        assert_eq!(path.name(), Some("logins"));
        assert_eq!(path.to_string(), "metrics/logins");
        assert_eq!(TrackerPath::root().to_string(), "/");
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert_eq!(TrackerPath::parse(""), Err(PathError::Empty));
        assert_eq!(TrackerPath::parse("/a"), Err(PathError::EmptySegment { index: 0 }));
        assert_eq!(TrackerPath::parse("a/"), Err(PathError::EmptySegment { index: 1 }));
        assert!(matches!(
            TrackerPath::parse("a/../b"),
            Err(PathError::ReservedSegment { .. })
        ));
        assert!(matches!(
            TrackerPath::parse("a b"),
            Err(PathError::InvalidCharacter { ch: ' ', .. })
        ));
    }

    #[test]
    fn test_parent_and_child() {
        let path = TrackerPath::parse("a/b/c").unwrap();
        let parent = path.parent().unwrap();
        assert_eq!(parent.to_string(), "a/b");
        assert_eq!(parent.child("c").unwrap(), path);
        assert!(parent.child("bad/segment").is_err());

        let top = TrackerPath::parse("a").unwrap();
        assert_eq!(top.parent(), Some(TrackerPath::root()));
        assert_eq!(TrackerPath::root().parent(), None);
    }

    #[test]
    fn test_ancestors_root_first() {
        let path = TrackerPath::parse("a/b/c").unwrap();
        let ancestors: Vec<String> = path.ancestors().map(|p| p.to_string()).collect();
        assert_eq!(ancestors, vec!["/", "a", "a/b"]);

        assert!(TrackerPath::root().is_ancestor_of(&path));
        assert!(!path.is_ancestor_of(&path));
    }

    #[test]
    fn test_equality_is_structural() {
        let a = TrackerPath::parse("x/y").unwrap();
        let b = TrackerPath::root().child("x").unwrap().child("y").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_serde_as_string() {
        let path = TrackerPath::parse("svc/web-1").unwrap();
        let json = serde_json::to_string(&path).unwrap();
        assert_eq!(json, "\"svc/web-1\"");
        let decoded: TrackerPath = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, path);
    }
}
