//! Dot-notation keys.
//!
//! Overrides given on the command line use flat keys such as `db.primary.host`.
//! [`expand`] turns a flat mapping of such keys into a nested [`ValueTree`], and
//! [`flatten`] is its inverse for trees whose keys contain no dots.

use serde_json::{Map, Value};

use crate::error::{Result, ValuesError};
use crate::merge::{deep_merge, ValueTree};

/// Expands a flat mapping with dot-separated keys into a nested tree.
///
/// Intermediate containers are created as needed. Expansion fails with
/// [`ValuesError::ConflictingPath`] when one key uses a segment as a container
/// and another binds that same segment to a plain value.
///
/// ```rust
/// use imprint_values::dotpath::expand;
/// use serde_json::json;
///
/// let flat = json!({"key1.key2.key3": "string1", "key1.key2.key4": 1000, "key4.key5": "string2"});
/// let nested = expand(flat.as_object().unwrap()).unwrap();
/// assert_eq!(
///     serde_json::Value::Object(nested),
///     json!({"key1": {"key2": {"key3": "string1", "key4": 1000}}, "key4": {"key5": "string2"}})
/// );
/// ```
pub fn expand(flat: &ValueTree) -> Result<ValueTree> {
    let mut result = ValueTree::new();
    for (key, value) in flat {
        insert_path(&mut result, key, value.clone())?;
    }
    Ok(result)
}

/// Sets `value` at the dot-separated `key` inside `tree`.
pub fn insert_path(tree: &mut ValueTree, key: &str, value: Value) -> Result<()> {
    let segments: Vec<&str> = key.split('.').collect();
    if segments.iter().any(|segment| segment.is_empty()) {
        return Err(ValuesError::InvalidKey(key.to_string()));
    }
    let Some((last, parents)) = segments.split_last() else {
        return Err(ValuesError::InvalidKey(key.to_string()));
    };

    let conflict = |depth: usize| ValuesError::ConflictingPath {
        key: key.to_string(),
        segment: segments[..=depth].join("."),
    };

    let mut node = tree;
    for (depth, segment) in parents.iter().enumerate() {
        let entry = node
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        node = match entry {
            Value::Object(map) => map,
            _ => return Err(conflict(depth)),
        };
    }

    if !node.contains_key(*last) {
        node.insert(last.to_string(), value);
        return Ok(());
    }

    match (node.get_mut(*last), value) {
        (Some(Value::Object(existing)), Value::Object(incoming)) => {
            deep_merge(existing, &incoming);
            Ok(())
        }
        _ => Err(conflict(parents.len())),
    }
}

/// Flattens a nested tree into dot-separated keys.
///
/// Empty mappings are kept as leaves so that [`expand`] reproduces them.
pub fn flatten(tree: &ValueTree) -> ValueTree {
    let mut flat = ValueTree::new();
    flatten_into(&mut flat, None, tree);
    flat
}

fn flatten_into(flat: &mut ValueTree, prefix: Option<&str>, tree: &ValueTree) {
    for (key, value) in tree {
        let path = match prefix {
            Some(prefix) => format!("{prefix}.{key}"),
            None => key.clone(),
        };
        match value {
            Value::Object(child) if !child.is_empty() => flatten_into(flat, Some(&path), child),
            other => {
                flat.insert(path, other.clone());
            }
        }
    }
}
