//! Point-in-time reads delivered to callers.

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::StoreError;
use crate::path::DbPath;
use crate::tree;

/// The value at a path at the moment an event fired or a read resolved.
///
/// An absent location is a snapshot whose value is `null`.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    path: DbPath,
    value: Value,
}

impl Snapshot {
    /// Create a snapshot.
    pub const fn new(path: DbPath, value: Value) -> Self {
        Self { path, value }
    }

    /// Where the value was read.
    pub const fn path(&self) -> &DbPath {
        &self.path
    }

    /// The last key of the path; `None` for the root.
    pub fn key(&self) -> Option<&str> {
        self.path.key()
    }

    /// The raw value (`null` when absent).
    pub const fn value(&self) -> &Value {
        &self.value
    }

    /// Take the raw value.
    pub fn into_value(self) -> Value {
        self.value
    }

    /// Whether anything is stored at the path.
    pub fn exists(&self) -> bool {
        !self.value.is_null()
    }

    /// Decode the value, `None` when absent.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Decode`] if the value does not match `T`.
    pub fn val<T: DeserializeOwned>(&self) -> Result<Option<T>, StoreError> {
        if self.value.is_null() {
            return Ok(None);
        }
        T::deserialize(&self.value)
            .map(Some)
            .map_err(|source| StoreError::Decode {
                path: self.path.clone(),
                source,
            })
    }

    /// Snapshots of the direct children, in key order.
    pub fn children(&self) -> impl Iterator<Item = Self> + '_ {
        tree::children(&self.value)
            .map(|(key, value)| Self::new(self.path.join_unchecked(key), value.clone()))
    }

    /// Snapshot of one direct child (absent if it does not exist).
    pub fn child(&self, key: &str) -> Self {
        let value = self
            .value
            .as_object()
            .and_then(|map| map.get(key))
            .cloned()
            .unwrap_or(Value::Null);
        Self::new(self.path.join_unchecked(key), value)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn decodes_typed_values() {
        let snap = Snapshot::new(DbPath::root(), json!(42));
        assert_eq!(snap.val::<u32>().ok().flatten(), Some(42));
        assert!(snap.val::<String>().is_err());
        let absent = Snapshot::new(DbPath::root(), Value::Null);
        assert_eq!(absent.val::<u32>().ok().flatten(), None);
    }

    #[test]
    fn children_are_key_ordered() {
        let snap = Snapshot::new(
            DbPath::parse("goban").unwrap_or_default(),
            json!({"b": 2, "a": 1}),
        );
        let keys: Vec<String> = snap
            .children()
            .filter_map(|c| c.key().map(str::to_owned))
            .collect();
        assert_eq!(keys, ["a", "b"]);
        assert_eq!(snap.child("a").value(), &json!(1));
        assert!(!snap.child("z").exists());
    }
}
