//! Key-ordered limits on listened children.
//!
//! Children are ordered by key. Push keys are time-ordered, so
//! `limit_to_last(n)` on a pushed list yields the `n` newest entries.

use serde_json::{Map, Value};

/// A key-ordered window over a node's children.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Query {
    limit_to_first: Option<usize>,
    limit_to_last: Option<usize>,
}

impl Query {
    /// No limits: the full value.
    pub const fn all() -> Self {
        Self {
            limit_to_first: None,
            limit_to_last: None,
        }
    }

    /// Keep only the first `n` children by key.
    pub const fn limit_to_first(mut self, n: usize) -> Self {
        self.limit_to_first = Some(n);
        self
    }

    /// Keep only the last `n` children by key.
    pub const fn limit_to_last(mut self, n: usize) -> Self {
        self.limit_to_last = Some(n);
        self
    }

    /// Whether the query leaves values untouched.
    pub const fn is_unbounded(&self) -> bool {
        self.limit_to_first.is_none() && self.limit_to_last.is_none()
    }

    /// The windowed view of `value`. Leaves pass through unchanged.
    pub(crate) fn apply(&self, value: Value) -> Value {
        if self.is_unbounded() {
            return value;
        }
        let Value::Object(map) = value else {
            return value;
        };
        let len = map.len();
        let skip = self
            .limit_to_last
            .map_or(0, |n| len.saturating_sub(n));
        let take = self.limit_to_first.unwrap_or(len);
        let windowed: Map<String, Value> = map.into_iter().skip(skip).take(take).collect();
        if windowed.is_empty() {
            Value::Null
        } else {
            Value::Object(windowed)
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn last_n_by_key() {
        let games = json!({"a": 1, "b": 2, "c": 3, "d": 4});
        assert_eq!(Query::all().limit_to_last(2).apply(games.clone()), json!({"c": 3, "d": 4}));
        assert_eq!(Query::all().limit_to_first(1).apply(games.clone()), json!({"a": 1}));
        assert_eq!(Query::all().limit_to_last(10).apply(games.clone()), games);
    }

    #[test]
    fn zero_limit_is_absent() {
        assert_eq!(Query::all().limit_to_last(0).apply(json!({"a": 1})), Value::Null);
    }

    #[test]
    fn leaves_pass_through() {
        assert_eq!(Query::all().limit_to_last(1).apply(json!(7)), json!(7));
    }
}
