//! Validated store paths.
//!
//! Paths are slash-separated keys from the root of the tree, e.g.
//! `games/{id}/players/0/online`. Leading, trailing and repeated slashes are
//! ignored. Keys may not contain `.`, `#`, `$`, `[` or `]`.

use crate::error::StoreError;

/// Characters that may not appear in a key.
const FORBIDDEN: &[char] = &['.', '#', '$', '[', ']'];

/// Check a single key.
pub(crate) fn validate_key(key: &str) -> Result<(), &'static str> {
    if key.is_empty() {
        Err("empty key")
    } else if key.contains(FORBIDDEN) {
        Err("key contains one of . # $ [ ]")
    } else if key.chars().any(char::is_control) {
        Err("key contains a control character")
    } else {
        Ok(())
    }
}

/// A location in the store tree.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DbPath {
    segments: Vec<String>,
}

impl DbPath {
    /// The root of the tree.
    pub const fn root() -> Self {
        Self {
            segments: Vec::new(),
        }
    }

    /// Parse a slash-separated path.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidPath`] if any key is forbidden.
    pub fn parse(path: &str) -> Result<Self, StoreError> {
        let mut segments = Vec::new();
        for segment in path.split('/').filter(|s| !s.is_empty()) {
            validate_key(segment).map_err(|reason| StoreError::InvalidPath {
                path: path.to_owned(),
                reason,
            })?;
            segments.push(segment.to_owned());
        }
        Ok(Self { segments })
    }

    /// Keys from the root down.
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// The last key, or `None` at the root.
    pub fn key(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    /// Whether this is the root.
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// The enclosing path, or `None` at the root.
    pub fn parent(&self) -> Option<Self> {
        let (_, init) = self.segments.split_last()?;
        Some(Self {
            segments: init.to_vec(),
        })
    }

    /// A direct child of this path.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidPath`] if `key` is forbidden.
    pub fn child(&self, key: &str) -> Result<Self, StoreError> {
        validate_key(key).map_err(|reason| StoreError::InvalidPath {
            path: key.to_owned(),
            reason,
        })?;
        Ok(self.join_unchecked(key))
    }

    /// Child for a key that already lives in the tree.
    pub(crate) fn join_unchecked(&self, key: &str) -> Self {
        let mut segments = self.segments.clone();
        segments.push(key.to_owned());
        Self { segments }
    }

    /// Whether `self` is `other` or one of its ancestors.
    pub fn contains(&self, other: &Self) -> bool {
        other.segments.starts_with(&self.segments)
    }

    /// Whether a write at one path can change the value at the other.
    pub fn overlaps(&self, other: &Self) -> bool {
        self.contains(other) || other.contains(self)
    }
}

impl core::fmt::Display for DbPath {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "/{}", self.segments.join("/"))
    }
}

impl core::str::FromStr for DbPath {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
