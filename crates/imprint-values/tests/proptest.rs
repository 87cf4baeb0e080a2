//! Property-based tests for merging and dot-path expansion.

use imprint_values::{deep_merge, expand, flatten, merge_all, ValueTree};
use proptest::prelude::*;
use serde_json::Value;

// ============================================================================
// Strategies
// ============================================================================

fn leaf_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        any::<bool>().prop_map(Value::from),
        any::<i32>().prop_map(Value::from),
        "[a-z ]{0,8}".prop_map(Value::from),
        prop::collection::vec(any::<u8>().prop_map(Value::from), 0..3).prop_map(Value::from),
    ]
}

fn value_strategy() -> impl Strategy<Value = Value> {
    leaf_strategy().prop_recursive(3, 24, 4, |inner| {
        prop::collection::vec(("[a-e]{1,3}", inner), 0..4).prop_map(|entries| {
            let mut map = ValueTree::new();
            for (key, value) in entries {
                map.insert(key, value);
            }
            Value::Object(map)
        })
    })
}

fn tree_strategy() -> impl Strategy<Value = ValueTree> {
    prop::collection::vec(("[a-e]{1,3}", value_strategy()), 0..5).prop_map(|entries| {
        let mut map = ValueTree::new();
        for (key, value) in entries {
            map.insert(key, value);
        }
        map
    })
}

// ============================================================================
// Property tests
// ============================================================================

proptest! {
    /// Batching intermediate merges does not change the result.
    #[test]
    fn sequential_merge_is_batch_independent(
        a in tree_strategy(),
        b in tree_strategy(),
        c in tree_strategy(),
    ) {
        let all_at_once = merge_all([&a, &b, &c]);

        let mut step = ValueTree::new();
        deep_merge(&mut step, &a);
        deep_merge(&mut step, &b);
        deep_merge(&mut step, &c);

        let mut prefix = merge_all([&a, &b]);
        deep_merge(&mut prefix, &c);

        prop_assert_eq!(&all_at_once, &step);
        prop_assert_eq!(&all_at_once, &prefix);
    }

    /// Merging a tree into itself is a no-op.
    #[test]
    fn merge_is_idempotent(a in tree_strategy()) {
        let mut merged = a.clone();
        deep_merge(&mut merged, &a);
        prop_assert_eq!(merged, a);
    }

    /// The last source wins for every leaf it sets.
    #[test]
    fn overlay_leaves_win(a in tree_strategy(), b in tree_strategy()) {
        let merged = merge_all([&a, &b]);
        let flat_merged = flatten(&merged);
        for (key, value) in flatten(&b) {
            let is_empty_map = value.as_object().is_some_and(|m| m.is_empty());
            if !is_empty_map {
                prop_assert_eq!(flat_merged.get(&key), Some(&value));
            }
        }
    }

    /// Flattening then expanding reproduces the tree.
    #[test]
    fn flatten_expand_round_trips(a in tree_strategy()) {
        let flat = flatten(&a);
        let expanded = expand(&flat).unwrap();
        prop_assert_eq!(expanded, a);
    }
}
