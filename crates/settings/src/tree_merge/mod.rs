//! Deep merge of partial settings trees.
//!
//! Tab switches and saves reconstruct only the fragment of the tree the user
//! can currently see; `merge` folds such a fragment back into the canonical
//! tree without disturbing keys the fragment does not mention.

use serde_json::Value;

/// Folds `source` into `target` in place and returns `target`.
///
/// For each key in `source`: if both sides hold a map, the entries merge
/// recursively; anything else (scalars and lists included) replaces the
/// target entry wholesale. Lists are never concatenated. Merging the same
/// source twice is a no-op the second time, and on scalar collisions the
/// source (last writer) wins.
///
/// A non-map `source` (or `target`) replaces the target outright.
pub fn merge<'a>(target: &'a mut Value, source: &Value) -> &'a mut Value {
    if let (Value::Object(dst), Value::Object(src)) = (&mut *target, source) {
        for (key, incoming) in src {
            let recurse = incoming.is_object() && dst.get(key).map_or(false, Value::is_object);
            if recurse {
                if let Some(existing) = dst.get_mut(key) {
                    merge(existing, incoming);
                }
            } else {
                dst.insert(key.clone(), incoming.clone());
            }
        }
    } else {
        *target = source.clone();
    }
    target
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn disjoint_keys_union() {
        let mut target = json!({"a": 1});
        merge(&mut target, &json!({"b": 2}));
        assert_eq!(target, json!({"a": 1, "b": 2}));
    }

    #[test]
    fn nested_maps_merge() {
        let mut target = json!({"speech": {"volume": 0.4, "voice": "nova"}});
        merge(&mut target, &json!({"speech": {"volume": 0.7}}));
        assert_eq!(target, json!({"speech": {"volume": 0.7, "voice": "nova"}}));
    }

    #[test]
    fn scalar_collision_last_writer_wins() {
        let mut target = json!({"a": "old"});
        merge(&mut target, &json!({"a": "new"}));
        assert_eq!(target, json!({"a": "new"}));
    }

    #[test]
    fn lists_replace_wholesale() {
        let mut target = json!({"rooms": ["kitchen", "study"]});
        merge(&mut target, &json!({"rooms": ["bedroom"]}));
        assert_eq!(target, json!({"rooms": ["bedroom"]}));
    }

    #[test]
    fn map_replaces_scalar() {
        let mut target = json!({"a": 5});
        merge(&mut target, &json!({"a": {"b": 1}}));
        assert_eq!(target, json!({"a": {"b": 1}}));
    }

    #[test]
    fn scalar_replaces_map() {
        let mut target = json!({"a": {"b": 1}});
        merge(&mut target, &json!({"a": 5}));
        assert_eq!(target, json!({"a": 5}));
    }

    #[test]
    fn non_map_source_replaces_root() {
        let mut target = json!({"a": 1});
        merge(&mut target, &json!(7));
        assert_eq!(target, json!(7));
    }

    #[test]
    fn idempotent_under_reapplication() {
        let source = json!({"a": {"b": [1, 2]}, "c": "x"});
        let mut once = json!({"a": {"z": true}, "d": 4});
        merge(&mut once, &source);
        let mut twice = once.clone();
        merge(&mut twice, &source);
        assert_eq!(once, twice);
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;
        use serde_json::Map;

        fn leaf() -> impl Strategy<Value = Value> {
            prop_oneof![
                any::<bool>().prop_map(Value::from),
                any::<i32>().prop_map(Value::from),
                "[a-z]{0,8}".prop_map(Value::from),
            ]
        }

        fn tree() -> impl Strategy<Value = Value> {
            leaf().prop_recursive(3, 24, 4, |inner| {
                proptest::collection::btree_map("[a-z]{1,4}", inner, 0..4).prop_map(|entries| {
                    Value::Object(entries.into_iter().collect::<Map<String, Value>>())
                })
            })
        }

        proptest! {
            #[test]
            fn disjoint_merge_keeps_every_key(
                a in proptest::collection::btree_map("a[a-z]{1,4}", leaf(), 0..6),
                b in proptest::collection::btree_map("b[a-z]{1,4}", leaf(), 0..6),
            ) {
                let mut target = Value::Object(a.iter().map(|(k, v)| (k.clone(), v.clone())).collect());
                let source = Value::Object(b.iter().map(|(k, v)| (k.clone(), v.clone())).collect());
                merge(&mut target, &source);
                for (key, value) in &a {
                    prop_assert_eq!(&target[key], value);
                }
                for (key, value) in &b {
                    prop_assert_eq!(&target[key], value);
                }
            }

            #[test]
            fn merge_is_idempotent(mut target in tree(), source in tree()) {
                merge(&mut target, &source);
                let mut again = target.clone();
                merge(&mut again, &source);
                prop_assert_eq!(target, again);
            }
        }
    }
}
