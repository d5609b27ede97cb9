//! Dotted-path access into value trees (`"data.items"`)

use crate::value::{Map, Value};
use thiserror::Error;

/// Reads and writes nested fields addressed by a separator-joined path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathAccessor {
    separator: String,
}

impl Default for PathAccessor {
    fn default() -> Self {
        PathAccessor::new(".")
    }
}

impl PathAccessor {
    pub fn new(separator: impl Into<String>) -> Self {
        PathAccessor {
            separator: separator.into(),
        }
    }

    pub fn separator(&self) -> &str {
        &self.separator
    }

    /// The value at `path`, or `None` as soon as a segment is missing or the
    /// current value is not a map
    pub fn lookup<'a>(&self, root: &'a Value, path: &str) -> Option<&'a Value> {
        let mut current = root;
        for segment in path.split(self.separator.as_str()) {
            current = current.as_map()?.get(segment)?;
        }
        Some(current)
    }

    /// The value at `path`, or `default` when it can't be reached. A present
    /// `null` is returned as `null`, not replaced by the default.
    pub fn get(&self, root: &Value, path: &str, default: Value) -> Value {
        self.lookup(root, path).cloned().unwrap_or(default)
    }

    /// Store `value` at `path`, creating intermediate maps.
    ///
    /// An intermediate segment holding anything other than a map is replaced by
    /// an empty map, losing its previous value.
    pub fn set(&self, root: &mut Map, path: &str, value: Value) {
        let segments: Vec<&str> = path.split(self.separator.as_str()).collect();
        set_in(root, &segments, value);
    }

    /// Records list of a fetched page body, e.g. `records_at(page, "data.items")`.
    ///
    /// A missing or `null` field means an empty page.
    pub fn records_at<'a>(&self, page: &'a Value, records_field: &str) -> Result<&'a [Value], PageError> {
        match self.lookup(page, records_field) {
            None | Some(Value::Null) => Ok(&[]),
            Some(Value::List(items)) => Ok(items),
            Some(other) => Err(PageError::RecordsNotAList {
                field: records_field.to_string(),
                found: other.kind(),
            }),
        }
    }
}

fn set_in(map: &mut Map, segments: &[&str], value: Value) {
    match segments {
        [] => {}
        [last] => {
            map.insert(last.to_string(), value);
        }
        [head, rest @ ..] => {
            let slot = map
                .entry(head.to_string())
                .or_insert_with(|| Value::Map(Map::new()));
            match slot {
                Value::Map(child) => set_in(child, rest, value),
                other => {
                    let mut child = Map::new();
                    set_in(&mut child, rest, value);
                    *other = Value::Map(child);
                }
            }
        }
    }
}

/// Page body that doesn't have the expected layout
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PageError {
    #[error("records field '{field}' is not a list (found {found})")]
    RecordsNotAList { field: String, found: &'static str },
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn tree() -> Value {
        Value::from(json!({"aa": {"rr": 333, "bb": {"cc": 123, "nn": null, "rrr": 1233}}, "q": 234}))
    }

    #[test]
    fn test_get() {
        let paths = PathAccessor::default();
        let root = tree();

        assert_eq!(paths.get(&root, "aa.bb.cc", Value::Null), Value::Int(123));
        assert_eq!(paths.get(&root, "aa.bb.nn", Value::Int(-1)), Value::Null);
        assert_eq!(paths.get(&root, "aa.bb.cc1", Value::Null), Value::Null);
        assert_eq!(paths.get(&root, "q", Value::Null), Value::Int(234));
        assert_eq!(paths.get(&root, "a", Value::Int(-1)), Value::Int(-1));
        assert_eq!(paths.get(&root, "q.b.c.d", Value::Int(-1)), Value::Int(-1));
        assert_eq!(paths.get(&Value::Null, "a.b", Value::Int(-1)), Value::Int(-1));
    }

    #[test]
    fn test_custom_separator() {
        let paths = PathAccessor::new("/");
        assert_eq!(paths.lookup(&tree(), "aa/rr"), Some(&Value::Int(333)));
        assert_eq!(paths.lookup(&tree(), "aa.rr"), None);
    }

    fn set(initial: serde_json::Value, path: &str, value: i64) -> serde_json::Value {
        let Value::Map(mut map) = Value::from(initial) else {
            panic!("Expected map fixture");
        };
        PathAccessor::default().set(&mut map, path, Value::Int(value));
        Value::Map(map).to_json()
    }

    #[test]
    fn test_set() {
        assert_eq!(set(json!({"a": 123}), "c", 789), json!({"a": 123, "c": 789}));
        assert_eq!(set(json!({"a": 123}), "c.d.e", 789), json!({"a": 123, "c": {"d": {"e": 789}}}));
        assert_eq!(
            set(json!({"c": {"r": 44}}), "c.d.e", 789),
            json!({"c": {"r": 44, "d": {"e": 789}}})
        );
        assert_eq!(
            set(json!({"c": {"r": 44, "d": {"e": 333}}}), "c.d.e", 789),
            json!({"c": {"r": 44, "d": {"e": 789}}})
        );
    }

    #[test]
    fn test_set_overwrites_scalar_intermediate() {
        assert_eq!(
            set(json!({"a": 123, "c": 555}), "c.d.e", 789),
            json!({"a": 123, "c": {"d": {"e": 789}}})
        );
        assert_eq!(
            set(json!({"c": {"d": [1, 2], "k": 1}}), "c.d.e", 789),
            json!({"c": {"d": {"e": 789}, "k": 1}})
        );
    }

    #[test]
    fn test_records_at() {
        let paths = PathAccessor::default();
        let page = Value::from(json!({"data": {"items": [{"id": 1}, {"id": 2}]}, "pageCount": 4}));

        assert_eq!(paths.records_at(&page, "data.items").unwrap().len(), 2);
        assert!(paths.records_at(&page, "data.missing").unwrap().is_empty());

        let err = paths.records_at(&page, "pageCount").unwrap_err();
        assert_eq!(err.to_string(), "records field 'pageCount' is not a list (found int)");
    }
}
