//! Recursive merging of value trees.
//!
//! A [`ValueTree`] is an insertion-ordered JSON object. Trees are combined with
//! [`deep_merge`], which walks the overlay key by key:
//!
//! - a mapping on both sides is merged recursively, never replaced wholesale
//! - any other overlay value replaces whatever the base held at that key,
//!   including replacing a mapping with a scalar or the other way around
//!
//! Applying [`deep_merge`] over an ordered list of sources is deterministic and
//! right-biased: the last source to set a leaf wins.
//!
//! ```rust
//! use imprint_values::{deep_merge, ValueTree};
//! use serde_json::json;
//!
//! let mut base: ValueTree = serde_json::from_value(json!({"db": {"host": "a", "port": 1}})).unwrap();
//! let overlay: ValueTree = serde_json::from_value(json!({"db": {"port": 2}})).unwrap();
//! deep_merge(&mut base, &overlay);
//! assert_eq!(serde_json::Value::Object(base), json!({"db": {"host": "a", "port": 2}}));
//! ```

use serde_json::{Map, Value};

/// Ordered mapping from string keys to values, as exposed to templates.
pub type ValueTree = Map<String, Value>;

/// Merges `overlay` into `base` in place and returns `base`.
pub fn deep_merge<'a>(base: &'a mut ValueTree, overlay: &ValueTree) -> &'a mut ValueTree {
    for (key, value) in overlay {
        match (base.get_mut(key), value) {
            (Some(Value::Object(existing)), Value::Object(incoming)) => {
                deep_merge(existing, incoming);
            }
            _ => {
                base.insert(key.clone(), value.clone());
            }
        }
    }
    base
}

/// Merges an ordered sequence of trees left to right into a fresh tree.
pub fn merge_all<'a, I>(sources: I) -> ValueTree
where
    I: IntoIterator<Item = &'a ValueTree>,
{
    let mut bundle = ValueTree::new();
    for source in sources {
        deep_merge(&mut bundle, source);
    }
    bundle
}

/// Returns the subtree stored at a dot-separated path, if every segment is a mapping.
///
/// An empty path returns the tree itself.
pub fn subtree<'a>(tree: &'a ValueTree, path: &str) -> Option<&'a ValueTree> {
    if path.is_empty() {
        return Some(tree);
    }
    let mut node = tree;
    for segment in path.split('.') {
        node = node.get(segment)?.as_object()?;
    }
    Some(node)
}
