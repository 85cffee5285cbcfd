//! Path-addressed configuration tree.
//!
//! [`ConfigStore`] holds nested key/value mappings and addresses them with
//! `/`-delimited paths such as `theme_colors/dump_string`. Lookups never fail:
//! a path that does not fully resolve yields `None` (or the caller's default).
//! Assignments create intermediate mappings on the way down and replace any
//! scalar that sits where a mapping is needed.
//!
//! Assigning a mapping merges it leaf by leaf, so layering documents
//! (defaults, then theme, then overrides) only ever overrides individual keys,
//! never whole subtrees.

use serde_json::{Map, Value};

/// Separator between path segments.
pub const PATH_SEPARATOR: char = '/';

/// Nested key/value store with path-addressed get/set.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigStore {
    /// Always a `Value::Object`.
    root: Value,
}

impl Default for ConfigStore {
    fn default() -> Self {
        Self {
            root: Value::Object(Map::new()),
        }
    }
}

impl ConfigStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store populated from a mapping, merged key by key.
    pub fn from_mapping(mapping: Map<String, Value>) -> Self {
        let mut store = Self::new();
        store.merge(mapping);
        store
    }

    /// The whole tree as a mapping.
    pub fn root(&self) -> &Map<String, Value> {
        match &self.root {
            Value::Object(map) => map,
            _ => unreachable!("config root is always a mapping"),
        }
    }

    /// Look up a value by path.
    ///
    /// The empty path returns the whole tree. Returns `None` when any segment
    /// is missing or empty, when the walk hits a non-mapping before the path is
    /// exhausted, or when the stored value is `null`.
    pub fn get(&self, path: &str) -> Option<&Value> {
        if path.is_empty() {
            return Some(&self.root);
        }

        let mut node = &self.root;
        for segment in path.split(PATH_SEPARATOR) {
            if segment.is_empty() {
                return None;
            }
            node = node.as_object()?.get(segment)?;
        }

        if node.is_null() { None } else { Some(node) }
    }

    /// Look up a value by path, falling back to `default`.
    pub fn get_or<'a>(&'a self, path: &str, default: &'a Value) -> &'a Value {
        self.get(path).unwrap_or(default)
    }

    /// Look up a scalar and render it as a string.
    ///
    /// Numbers and booleans are stringified; mappings and sequences yield `None`.
    pub fn get_string(&self, path: &str) -> Option<String> {
        match self.get(path)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    /// Look up a non-negative integer, accepting numeric strings.
    pub fn get_usize(&self, path: &str) -> Option<usize> {
        match self.get(path)? {
            Value::Number(n) => n.as_u64().and_then(|v| usize::try_from(v).ok()),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Assign a value at `path`.
    ///
    /// A mapping value is merged: each child is assigned at `path/<key>`
    /// recursively, leaving sibling keys already in the tree untouched. An
    /// empty mapping assigns no leaf, so it only creates the node where
    /// nothing exists yet. Any other value (scalars and sequences) replaces
    /// what was there.
    pub fn set(&mut self, path: &str, value: Value) {
        match value {
            Value::Object(children) => {
                if children.is_empty() {
                    self.ensure_mapping_at(path);
                }
                for (key, child) in children {
                    self.set(&join_path(path, &key), child);
                }
            }
            scalar => self.set_leaf(path, scalar),
        }
    }

    /// Merge a mapping into the root, key by key.
    pub fn merge(&mut self, mapping: Map<String, Value>) {
        for (key, value) in mapping {
            self.set(&key, value);
        }
    }

    fn set_leaf(&mut self, path: &str, value: Value) {
        let segments: Vec<&str> = split_segments(path);
        let Some((last, parents)) = segments.split_last() else {
            log::warn!("Ignoring config assignment to an empty path");
            return;
        };

        let mut node = ensure_mapping(&mut self.root);
        for segment in parents {
            let entry = node
                .entry(segment.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            node = ensure_mapping(entry);
        }
        node.insert(last.to_string(), value);
    }

    fn ensure_mapping_at(&mut self, path: &str) {
        let mut node = ensure_mapping(&mut self.root);
        for segment in split_segments(path) {
            let entry = node.entry(segment.to_string()).or_insert(Value::Null);
            if entry.is_null() {
                *entry = Value::Object(Map::new());
            }
            match entry {
                Value::Object(map) => node = map,
                _ => {
                    log::trace!("Empty mapping at {path:?} leaves existing value in place");
                    return;
                }
            }
        }
    }
}

/// Join a parent path and a child key.
pub fn join_path(parent: &str, key: &str) -> String {
    if parent.is_empty() {
        key.to_string()
    } else {
        format!("{parent}{PATH_SEPARATOR}{key}")
    }
}

fn split_segments(path: &str) -> Vec<&str> {
    path.split(PATH_SEPARATOR)
        .filter(|segment| !segment.is_empty())
        .collect()
}

/// Replace `value` with an empty mapping unless it already is one.
fn ensure_mapping(value: &mut Value) -> &mut Map<String, Value> {
    if !value.is_object() {
        *value = Value::Object(Map::new());
    }
    match value {
        Value::Object(map) => map,
        _ => unreachable!("value was just replaced with a mapping"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn mapping(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            other => panic!("expected mapping, got {other:?}"),
        }
    }

    #[test]
    fn test_set_then_get_round_trip() {
        let mut store = ConfigStore::new();
        store.set("indent", json!(4));
        store.set("a/b/c", json!("deep"));

        assert_eq!(store.get("indent"), Some(&json!(4)));
        assert_eq!(store.get("a/b/c"), Some(&json!("deep")));
        assert!(store.get("a/b").is_some_and(Value::is_object));
    }

    #[test]
    fn test_get_missing_returns_default() {
        let store = ConfigStore::from_mapping(mapping(json!({ "a": { "b": 1 } })));
        let fallback = json!("fallback");

        assert_eq!(store.get("a/x"), None);
        assert_eq!(store.get("nope"), None);
        assert_eq!(store.get_or("a/b/c", &fallback), &fallback);
    }

    #[test]
    fn test_get_through_scalar_returns_none() {
        let store = ConfigStore::from_mapping(mapping(json!({ "a": 5 })));
        assert_eq!(store.get("a/b"), None);
    }

    #[test]
    fn test_get_empty_segment_returns_none() {
        let store = ConfigStore::from_mapping(mapping(json!({ "a": { "b": 1 } })));
        assert_eq!(store.get("a//b"), None);
        assert_eq!(store.get("a/"), None);
    }

    #[test]
    fn test_get_empty_path_returns_whole_tree() {
        let store = ConfigStore::from_mapping(mapping(json!({ "x": 1, "y": { "z": 2 } })));
        assert_eq!(store.get(""), Some(&json!({ "x": 1, "y": { "z": 2 } })));
    }

    #[test]
    fn test_null_reads_as_absent() {
        let mut store = ConfigStore::new();
        store.set("max_depth", Value::Null);
        assert_eq!(store.get("max_depth"), None);
        let fallback = json!(7);
        assert_eq!(store.get_or("max_depth", &fallback), &fallback);
    }

    #[test]
    fn test_set_replaces_scalar_intermediate() {
        let mut store = ConfigStore::from_mapping(mapping(json!({ "a": "scalar" })));
        store.set("a/b", json!(true));
        assert_eq!(store.get("a"), Some(&json!({ "b": true })));
    }

    #[test]
    fn test_set_mapping_merges_key_by_key() {
        let mut store = ConfigStore::from_mapping(mapping(json!({
            "theme_colors": { "dump_int": "077", "dump_null": "244" }
        })));
        store.set("theme_colors", json!({ "dump_int": "160" }));

        assert_eq!(store.get_string("theme_colors/dump_int").as_deref(), Some("160"));
        assert_eq!(store.get_string("theme_colors/dump_null").as_deref(), Some("244"));
    }

    #[test]
    fn test_set_scalar_overwrites_mapping() {
        let mut store = ConfigStore::from_mapping(mapping(json!({ "a": { "b": 1 } })));
        store.set("a", json!(7));
        assert_eq!(store.get("a"), Some(&json!(7)));
    }

    #[test]
    fn test_merge_equals_leaf_sets() {
        let doc = json!({ "k": { "x": 1, "y": { "z": "deep" } }, "flat": false });

        let mut merged = ConfigStore::new();
        merged.merge(mapping(doc));

        let mut by_leaf = ConfigStore::new();
        by_leaf.set("k/x", json!(1));
        by_leaf.set("k/y/z", json!("deep"));
        by_leaf.set("flat", json!(false));

        assert_eq!(merged, by_leaf);
    }

    #[test]
    fn test_merge_is_idempotent() {
        let doc = mapping(json!({ "color": { "red": "0;1" }, "indent": 2 }));
        let mut store = ConfigStore::new();
        store.merge(doc.clone());
        let once = store.clone();
        store.merge(doc);
        assert_eq!(store, once);
    }

    #[test]
    fn test_sequences_are_leaves() {
        let mut store = ConfigStore::new();
        store.set("list", json!([1, 2]));
        store.set("list", json!([3]));
        assert_eq!(store.get("list"), Some(&json!([3])));
    }

    #[test]
    fn test_empty_mapping_creates_node() {
        let mut store = ConfigStore::new();
        store.set("a/b", json!({}));
        assert_eq!(store.get("a/b"), Some(&json!({})));
    }

    #[test]
    fn test_empty_mapping_keeps_existing_scalar() {
        let mut store = ConfigStore::new();
        store.set("theme", json!("light"));
        store.set("theme", json!({}));
        assert_eq!(store.get("theme"), Some(&json!("light")));

        store.set("indent", json!(4));
        store.set("indent/extra", json!({}));
        assert_eq!(store.get("indent"), Some(&json!(4)));
    }

    #[test]
    fn test_typed_getters() {
        let store = ConfigStore::from_mapping(mapping(json!({
            "indent": "4",
            "cap": 10,
            "flag": true
        })));

        assert_eq!(store.get_usize("indent"), Some(4));
        assert_eq!(store.get_usize("cap"), Some(10));
        assert_eq!(store.get_usize("flag"), None);
        assert_eq!(store.get_string("cap").as_deref(), Some("10"));
        assert_eq!(store.get_string("flag").as_deref(), Some("true"));
        assert_eq!(store.get_string("missing"), None);
    }
}
