//! Listener event kinds.

use serde_json::Value;

use crate::path::DbPath;
use crate::snapshot::Snapshot;
use crate::tree;

/// Which changes a listener is notified about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// The whole value at the path, once on attach and after every change.
    Value,
    /// A child appeared. Existing children are reported on attach.
    ChildAdded,
    /// A child's value changed.
    ChildChanged,
    /// A child disappeared; the snapshot carries its last value.
    ChildRemoved,
}

impl EventKind {
    /// Snapshots delivered when a listener attaches to `current`.
    pub(crate) fn initial(self, path: &DbPath, current: &Value) -> Vec<Snapshot> {
        match self {
            Self::Value => vec![Snapshot::new(path.clone(), current.clone())],
            Self::ChildAdded => self.diff(path, &Value::Null, current),
            Self::ChildChanged | Self::ChildRemoved => Vec::new(),
        }
    }

    /// Snapshots delivered when the value at `path` goes from `old` to `new`.
    pub(crate) fn diff(self, path: &DbPath, old: &Value, new: &Value) -> Vec<Snapshot> {
        if old == new {
            return Vec::new();
        }
        match self {
            Self::Value => vec![Snapshot::new(path.clone(), new.clone())],
            Self::ChildAdded => tree::children(new)
                .filter(|(key, _)| !has_child(old, key))
                .map(|(key, value)| Snapshot::new(path.join_unchecked(key), value.clone()))
                .collect(),
            Self::ChildRemoved => tree::children(old)
                .filter(|(key, _)| !has_child(new, key))
                .map(|(key, value)| Snapshot::new(path.join_unchecked(key), value.clone()))
                .collect(),
            Self::ChildChanged => tree::children(new)
                .filter(|(key, value)| {
                    old.as_object()
                        .and_then(|map| map.get(key.as_str()))
                        .is_some_and(|before| before != *value)
                })
                .map(|(key, value)| Snapshot::new(path.join_unchecked(key), value.clone()))
                .collect(),
        }
    }
}

fn has_child(value: &Value, key: &str) -> bool {
    value.as_object().is_some_and(|map| map.contains_key(key))
}

impl core::fmt::Display for EventKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(match self {
            Self::Value => "value",
            Self::ChildAdded => "child_added",
            Self::ChildChanged => "child_changed",
            Self::ChildRemoved => "child_removed",
        })
    }
}
