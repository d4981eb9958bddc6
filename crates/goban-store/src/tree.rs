//! Operations on the JSON tree held by the backend.
//!
//! `null` and empty objects are never stored: writing either removes the
//! location, and removing the last child of an object removes the object.
//! Arrays are stored as objects keyed by index.

use serde_json::{Map, Value};

use crate::error::StoreError;
use crate::path::{DbPath, validate_key};

/// Bring a written value into stored form.
pub(crate) fn normalize(value: Value) -> Result<Value, StoreError> {
    match value {
        Value::Array(items) => normalize(Value::Object(
            items
                .into_iter()
                .enumerate()
                .map(|(i, v)| (i.to_string(), v))
                .collect(),
        )),
        Value::Object(map) => {
            let mut out = Map::new();
            for (key, child) in map {
                validate_key(&key).map_err(|_reason| StoreError::InvalidKey(key.clone()))?;
                let child = normalize(child)?;
                if !child.is_null() {
                    out.insert(key, child);
                }
            }
            if out.is_empty() {
                Ok(Value::Null)
            } else {
                Ok(Value::Object(out))
            }
        }
        other => Ok(other),
    }
}

/// The value stored at `path`, if any.
pub(crate) fn get<'a>(root: &'a Value, path: &DbPath) -> Option<&'a Value> {
    let mut node = root;
    for segment in path.segments() {
        node = node.as_object()?.get(segment)?;
    }
    if node.is_null() { None } else { Some(node) }
}

/// A copy of the value at `path`, `Null` when absent.
pub(crate) fn value_at(root: &Value, path: &DbPath) -> Value {
    get(root, path).cloned().unwrap_or(Value::Null)
}

/// Replace the value at `path`. `value` must already be normalized; `Null`
/// removes the location and prunes emptied parents.
pub(crate) fn set(root: &mut Value, path: &DbPath, value: Value) {
    set_in(root, path.segments(), value);
}

fn set_in(node: &mut Value, segments: &[String], value: Value) {
    let Some((head, rest)) = segments.split_first() else {
        *node = value;
        return;
    };
    if !node.is_object() {
        if value.is_null() {
            return;
        }
        *node = Value::Object(Map::new());
    }
    let Value::Object(map) = node else {
        return;
    };
    let child = map.entry(head.clone()).or_insert(Value::Null);
    set_in(child, rest, value);
    if child.is_null() {
        map.remove(head.as_str());
    }
    if map.is_empty() {
        *node = Value::Null;
    }
}

/// Direct children of a node; empty for leaves and absent nodes.
pub(crate) fn children(value: &Value) -> impl Iterator<Item = (&String, &Value)> {
    value.as_object().into_iter().flat_map(|map| map.iter())
}
