//! Dotted key-path utilities.
//!
//! A key-path is a dotted string address into a nested settings tree, e.g.
//! `"speech.auto_night_whisper"`. Trees are [`serde_json::Value`] documents
//! whose maps hold scalars, lists, or further maps. Key-paths address map
//! entries only; lists are leaves and are never indexed into.
//!
//! # Example
//!
//! ```
//! use hearth_key_path::{get, set};
//! use serde_json::json;
//!
//! let mut tree = json!({"speech": {"volume": 0.4}});
//!
//! set(&mut tree, "speech.auto_night_whisper", json!(true)).unwrap();
//! assert_eq!(get(&tree, "speech.auto_night_whisper"), Some(&json!(true)));
//! assert_eq!(get(&tree, "speech.volume"), Some(&json!(0.4)));
//! assert_eq!(get(&tree, "presence.mode"), None);
//! ```

use serde_json::{Map, Value};
use thiserror::Error;

/// Split a dotted key-path into its segments.
///
/// The empty string addresses the tree root and yields no segments.
///
/// # Example
///
/// ```
/// use hearth_key_path::parse_key_path;
///
/// assert_eq!(parse_key_path(""), Vec::<String>::new());
/// assert_eq!(parse_key_path("speech"), vec!["speech"]);
/// assert_eq!(parse_key_path("speech.volume"), vec!["speech", "volume"]);
/// ```
pub fn parse_key_path(path: &str) -> Vec<String> {
    if path.is_empty() {
        return Vec::new();
    }
    path.split('.').map(str::to_string).collect()
}

/// Join segments back into a dotted key-path. Inverse of [`parse_key_path`].
pub fn format_key_path(segments: &[String]) -> String {
    segments.join(".")
}

/// Read the value at `path`, or `None` for any absent segment.
///
/// Descending through a scalar or list also yields `None`; this never
/// panics regardless of tree shape.
///
/// # Example
///
/// ```
/// use hearth_key_path::get;
/// use serde_json::json;
///
/// let tree = json!({"presence": {"rooms": ["kitchen", "study"]}});
///
/// assert_eq!(get(&tree, "presence.rooms"), Some(&json!(["kitchen", "study"])));
/// assert_eq!(get(&tree, "presence.away"), None);
/// // Lists are leaves; paths do not index into them.
/// assert_eq!(get(&tree, "presence.rooms.0"), None);
/// ```
pub fn get<'a>(tree: &'a Value, path: &str) -> Option<&'a Value> {
    if path.is_empty() {
        return Some(tree);
    }
    let mut node = tree;
    for segment in path.split('.') {
        node = node.as_object()?.get(segment)?;
    }
    Some(node)
}

/// Mutable counterpart of [`get`].
pub fn get_mut<'a>(tree: &'a mut Value, path: &str) -> Option<&'a mut Value> {
    if path.is_empty() {
        return Some(tree);
    }
    let mut node = tree;
    for segment in path.split('.') {
        node = node.as_object_mut()?.get_mut(segment)?;
    }
    Some(node)
}

/// Write `value` at `path`, materializing empty maps along the way.
///
/// Walks all but the last segment; a missing or `null` intermediate becomes
/// an empty map. An existing intermediate that is a scalar or list is *not*
/// overwritten; the walk stops with [`KeyPathError::NotATree`] naming the
/// offending prefix, and the tree is left as it was up to that point.
///
/// Mutates in place. `set` followed by [`get`] on the same path returns the
/// written value.
///
/// # Example
///
/// ```
/// use hearth_key_path::{get, set, KeyPathError};
/// use serde_json::json;
///
/// let mut tree = json!({});
/// set(&mut tree, "patterns.wake.enabled", json!(true)).unwrap();
/// assert_eq!(tree, json!({"patterns": {"wake": {"enabled": true}}}));
///
/// // A scalar in the way is reported, not destroyed.
/// let mut tree = json!({"patterns": 3});
/// let err = set(&mut tree, "patterns.wake", json!(1)).unwrap_err();
/// assert_eq!(err, KeyPathError::NotATree { prefix: "patterns".into() });
/// assert_eq!(tree, json!({"patterns": 3}));
/// ```
pub fn set(tree: &mut Value, path: &str, value: Value) -> Result<(), KeyPathError> {
    let segments = parse_key_path(path);
    let Some((last, walk)) = segments.split_last() else {
        return Err(KeyPathError::EmptyPath);
    };
    if tree.is_null() {
        *tree = Value::Object(Map::new());
    }
    let mut node = tree;
    for (depth, segment) in walk.iter().enumerate() {
        let map = match node {
            Value::Object(map) => map,
            _ => {
                return Err(KeyPathError::NotATree {
                    prefix: walk[..depth].join("."),
                })
            }
        };
        let entry = map.entry(segment.clone()).or_insert(Value::Null);
        if entry.is_null() {
            *entry = Value::Object(Map::new());
        }
        node = entry;
    }
    match node {
        Value::Object(map) => {
            map.insert(last.clone(), value);
            Ok(())
        }
        _ => Err(KeyPathError::NotATree {
            prefix: walk.join("."),
        }),
    }
}

/// Detach and return the subtree at `path`, or `None` if absent.
pub fn remove(tree: &mut Value, path: &str) -> Option<Value> {
    let segments = parse_key_path(path);
    let (last, walk) = segments.split_last()?;
    let mut node = tree;
    for segment in walk {
        node = node.as_object_mut()?.get_mut(segment)?;
    }
    node.as_object_mut()?.remove(last)
}

/// The parent of a key-path: `"a.b.c"` → `"a.b"`, `"a"` → `""` (the root).
/// The root itself has no parent.
pub fn parent(path: &str) -> Option<&str> {
    if path.is_empty() {
        return None;
    }
    Some(path.rsplit_once('.').map_or("", |(prefix, _)| prefix))
}

/// Whether `child` addresses a node strictly below `parent`.
pub fn is_child(parent: &str, child: &str) -> bool {
    if parent.is_empty() {
        return !child.is_empty();
    }
    child.len() > parent.len()
        && child.starts_with(parent)
        && child.as_bytes()[parent.len()] == b'.'
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum KeyPathError {
    /// The empty path addresses the root, which cannot be assigned.
    #[error("empty key-path")]
    EmptyPath,
    /// An intermediate on the walk is a scalar or list. `prefix` is the
    /// dotted path of the offending node.
    #[error("`{prefix}` is not a tree")]
    NotATree { prefix: String },
}
