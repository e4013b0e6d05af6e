//! Unit tests for PersistentHashMap.
//!
//! Covers the persistent facade: insert/get/remove round trips, the
//! pointer-identity no-op contract, hash collisions, nested-path updates,
//! and the merge family.

use std::hash::{Hash, Hasher};

use rstest::rstest;
use triemap::{MapError, NestedValue, PersistentHashMap};

// =============================================================================
// Helpers
// =============================================================================

/// A key whose hash is deliberately constant: every instance collides,
/// while `Eq` still distinguishes them.
#[derive(Clone, Debug, PartialEq, Eq)]
struct CollidingKey(u32);

impl Hash for CollidingKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u32(0);
    }
}

/// A value type holding either a number or a nested map.
#[derive(Clone, Debug, PartialEq)]
enum Value {
    Number(i32),
    Map(PersistentHashMap<String, Value>),
}

impl NestedValue<String> for Value {
    fn as_map(&self) -> Option<&PersistentHashMap<String, Value>> {
        match self {
            Self::Map(map) => Some(map),
            Self::Number(_) => None,
        }
    }

    fn from_map(map: PersistentHashMap<String, Value>) -> Self {
        Self::Map(map)
    }
}

fn key(text: &str) -> String {
    text.to_string()
}

fn number_map(entries: &[(&str, i32)]) -> PersistentHashMap<String, i32> {
    entries
        .iter()
        .map(|(name, value)| ((*name).to_string(), *value))
        .collect()
}

// =============================================================================
// Basic Operations
// =============================================================================

#[rstest]
fn test_insert_two_keys_and_get() {
    let map = PersistentHashMap::new().insert(key("a"), 1).insert(key("b"), 2);

    assert_eq!(map.get("a"), Some(&1));
    assert_eq!(map.get("b"), Some(&2));
    assert_eq!(map.len(), 2);
}

#[rstest]
fn test_get_on_empty_map_returns_none() {
    let map: PersistentHashMap<String, i32> = PersistentHashMap::new();
    assert_eq!(map.get("key"), None);
}

#[rstest]
fn test_insert_does_not_modify_original() {
    let map1 = PersistentHashMap::new().insert(key("key"), 1);
    let map2 = map1.insert(key("key2"), 2);

    assert_eq!(map1.len(), 1);
    assert_eq!(map1.get("key2"), None);
    assert_eq!(map2.len(), 2);
    assert_eq!(map2.get("key2"), Some(&2));
}

#[rstest]
fn test_remove_does_not_modify_original() {
    let map1 = PersistentHashMap::new().insert(key("a"), 1).insert(key("b"), 2);
    let map2 = map1.remove("a");

    assert_eq!(map1.len(), 2);
    assert_eq!(map1.get("a"), Some(&1));
    assert_eq!(map2.len(), 1);
    assert_eq!(map2.get("a"), None);
}

#[rstest]
fn test_clear_returns_empty_map() {
    let map = number_map(&[("a", 1), ("b", 2)]);
    assert!(map.clear().is_empty());
    assert_eq!(map.len(), 2);
}

#[rstest]
fn test_large_scale_insert_and_retrieve() {
    const COUNT: i32 = 10_000;

    let map: PersistentHashMap<i32, i32> = (0..COUNT).map(|x| (x, x * 2)).collect();

    for i in 0..COUNT {
        assert_eq!(map.get(&i), Some(&(i * 2)), "Failed to get key {i}");
    }
    for i in COUNT..(COUNT + 100) {
        assert_eq!(map.get(&i), None, "Key {i} should not exist");
    }
}

// =============================================================================
// Pointer-Identity No-ops
// =============================================================================

#[rstest]
fn test_insert_equal_value_returns_receiver() {
    let map = PersistentHashMap::new().insert(key("x"), 1);
    let same = map.insert(key("x"), 1);

    assert!(same.ptr_eq(&map));
}

#[rstest]
fn test_insert_is_idempotent_by_identity() {
    let map = number_map(&[("a", 1), ("b", 2), ("c", 3)]);
    let once = map.insert(key("d"), 4);
    let twice = once.insert(key("d"), 4);

    assert!(twice.ptr_eq(&once));
}

#[rstest]
fn test_remove_absent_key_returns_receiver() {
    let map = number_map(&[("a", 1), ("b", 2)]);
    assert!(map.remove("missing").ptr_eq(&map));
}

#[rstest]
fn test_remove_absent_key_deep_in_trie_returns_receiver() {
    let map: PersistentHashMap<i32, i32> = (0..1000).map(|i| (i, i)).collect();
    assert!(map.remove(&5000).ptr_eq(&map));
}

#[rstest]
fn test_reinserting_present_value_returns_receiver() {
    let map: PersistentHashMap<i32, i32> = (0..100).map(|i| (i, i)).collect();
    for i in 0..100 {
        assert!(map.insert(i, i).ptr_eq(&map));
    }
}

#[rstest]
fn test_delete_all_entries_restores_empty_identity() {
    let empty: PersistentHashMap<String, i32> = PersistentHashMap::new();
    let emptied = empty.insert(key("a"), 1).remove("a");

    assert!(emptied.ptr_eq(&empty));
    assert_eq!(emptied, empty);
}

// =============================================================================
// Hash Collisions
// =============================================================================

#[rstest]
fn test_colliding_keys_are_distinct_entries() {
    let map = PersistentHashMap::new()
        .insert(CollidingKey(1), "one")
        .insert(CollidingKey(2), "two")
        .insert(CollidingKey(3), "three");

    assert_eq!(map.len(), 3);
    assert_eq!(map.get(&CollidingKey(1)), Some(&"one"));
    assert_eq!(map.get(&CollidingKey(2)), Some(&"two"));
    assert_eq!(map.get(&CollidingKey(3)), Some(&"three"));
}

#[rstest]
fn test_removing_one_colliding_key_preserves_the_other() {
    let map = PersistentHashMap::new()
        .insert(CollidingKey(1), 10)
        .insert(CollidingKey(2), 20);
    let removed = map.remove(&CollidingKey(1));

    assert_eq!(removed.len(), 1);
    assert_eq!(removed.get(&CollidingKey(1)), None);
    assert_eq!(removed.get(&CollidingKey(2)), Some(&20));
}

#[rstest]
fn test_overwriting_colliding_key_keeps_length() {
    let map = PersistentHashMap::new()
        .insert(CollidingKey(1), 10)
        .insert(CollidingKey(2), 20)
        .insert(CollidingKey(1), 11);

    assert_eq!(map.len(), 2);
    assert_eq!(map.get(&CollidingKey(1)), Some(&11));
}

#[rstest]
fn test_colliding_keys_drain_back_to_empty() {
    let mut map = PersistentHashMap::new();
    for id in 0..8 {
        map = map.insert(CollidingKey(id), id);
    }
    for id in 0..8 {
        map = map.remove(&CollidingKey(id));
    }

    assert!(map.is_empty());
    assert!(map.ptr_eq(&PersistentHashMap::new()));
}

#[rstest]
fn test_colliding_insert_equal_value_returns_receiver() {
    let map = PersistentHashMap::new()
        .insert(CollidingKey(1), 10)
        .insert(CollidingKey(2), 20);

    assert!(map.insert(CollidingKey(2), 20).ptr_eq(&map));
}

// =============================================================================
// update / update_with
// =============================================================================

#[rstest]
fn test_update_existing_key() {
    let map = PersistentHashMap::new().insert(key("count"), 10);
    let updated = map.update("count", |value| value + 5);

    assert_eq!(updated.map(|m| m.get("count").copied()), Some(Some(15)));
}

#[rstest]
fn test_update_missing_key_returns_none() {
    let map: PersistentHashMap<String, i32> = PersistentHashMap::new();
    assert!(map.update("missing", |value| value + 1).is_none());
}

#[rstest]
fn test_update_with_inserts_updates_and_removes() {
    let map = PersistentHashMap::new().insert(key("count"), 10);

    let updated = map.update_with("count", |current| current.map(|v| v + 1));
    assert_eq!(updated.get("count"), Some(&11));

    let inserted = map.update_with("fresh", |current| current.copied().or(Some(1)));
    assert_eq!(inserted.get("fresh"), Some(&1));

    let removed = map.update_with("count", |_| None);
    assert!(removed.is_empty());

    let untouched = map.update_with("missing", |_| None);
    assert!(untouched.ptr_eq(&map));
}

// =============================================================================
// update_in
// =============================================================================

#[rstest]
fn test_update_in_creates_missing_intermediate_maps() {
    let map: PersistentHashMap<String, Value> = PersistentHashMap::new();
    let updated = map
        .update_in(&[key("a"), key("b")], |current| {
            let base = match current {
                Some(Value::Number(n)) => *n,
                _ => 0,
            };
            Value::Number(base + 1)
        })
        .expect("fresh path is valid");

    let inner = updated.get("a").and_then(Value::as_map).expect("a is a map");
    assert_eq!(inner.get("b"), Some(&Value::Number(1)));
}

#[rstest]
fn test_update_in_applies_to_existing_nested_value() {
    let map = PersistentHashMap::new()
        .update_in(&[key("a"), key("b")], |_| Value::Number(41))
        .expect("fresh path is valid");
    let updated = map
        .update_in(&[key("a"), key("b")], |current| {
            let base = match current {
                Some(Value::Number(n)) => *n,
                _ => 0,
            };
            Value::Number(base + 1)
        })
        .expect("existing path is valid");

    let inner = updated.get("a").and_then(Value::as_map).expect("a is a map");
    assert_eq!(inner.get("b"), Some(&Value::Number(42)));
}

#[rstest]
fn test_update_in_through_non_map_interior_fails() {
    let map = PersistentHashMap::new().insert(key("a"), Value::Number(1));
    let result = map.update_in(&[key("a"), key("b")], |_| Value::Number(2));

    assert_eq!(result.unwrap_err(), MapError::InvalidKeyPath);
}

#[rstest]
fn test_update_in_with_empty_path_replaces_whole_map() {
    let map = PersistentHashMap::new().insert(key("a"), Value::Number(1));
    let replacement = PersistentHashMap::new().insert(key("b"), Value::Number(2));

    let swapped = map
        .update_in(&[], |_| Value::Map(replacement.clone()))
        .expect("map-valued result is valid");
    assert_eq!(swapped, replacement);

    let invalid = map.update_in(&[], |_| Value::Number(9));
    assert_eq!(invalid.unwrap_err(), MapError::InvalidKeyPath);
}

#[rstest]
fn test_update_in_single_key_path_updates_top_level() {
    let map: PersistentHashMap<String, Value> = PersistentHashMap::new();
    let updated = map
        .update_in(&[key("hits")], |current| {
            let base = match current {
                Some(Value::Number(n)) => *n,
                _ => 0,
            };
            Value::Number(base + 1)
        })
        .expect("single-key path is valid");

    assert_eq!(updated.get("hits"), Some(&Value::Number(1)));
}

// =============================================================================
// Merge Family
// =============================================================================

#[rstest]
fn test_merge_last_value_wins() {
    let merged = number_map(&[("a", 1), ("b", 2)]).merge(&number_map(&[("b", 3), ("c", 4)]));

    assert_eq!(merged, number_map(&[("a", 1), ("b", 3), ("c", 4)]));
}

#[rstest]
fn test_merge_with_resolves_conflicts() {
    let merged = number_map(&[("a", 1), ("b", 2)]).merge_with(
        |existing, incoming| existing + incoming,
        &number_map(&[("b", 3), ("c", 4)]),
    );

    assert_eq!(merged, number_map(&[("a", 1), ("b", 5), ("c", 4)]));
}

#[rstest]
fn test_merge_with_identical_map_returns_receiver() {
    let map = number_map(&[("a", 1), ("b", 2)]);
    assert!(map.merge(&map.clone()).ptr_eq(&map));
}

#[rstest]
fn test_merge_with_empty_returns_receiver() {
    let map = number_map(&[("a", 1)]);
    assert!(map.merge(&PersistentHashMap::new()).ptr_eq(&map));
}

#[rstest]
fn test_merge_deep_distributes_into_nested_maps() {
    let left = PersistentHashMap::new().insert(
        key("a"),
        Value::Map(PersistentHashMap::singleton(key("x"), Value::Number(1))),
    );
    let right = PersistentHashMap::new().insert(
        key("a"),
        Value::Map(PersistentHashMap::singleton(key("y"), Value::Number(2))),
    );

    let merged = left.merge_deep(&right);
    let inner = merged.get("a").and_then(Value::as_map).expect("a is a map");

    assert_eq!(inner.get("x"), Some(&Value::Number(1)));
    assert_eq!(inner.get("y"), Some(&Value::Number(2)));
}

#[rstest]
fn test_merge_deep_replaces_at_non_map_leaves() {
    let left = PersistentHashMap::new().insert(key("a"), Value::Number(1));
    let right = PersistentHashMap::new().insert(key("a"), Value::Number(2));

    let merged = left.merge_deep(&right);
    assert_eq!(merged.get("a"), Some(&Value::Number(2)));
}

#[rstest]
fn test_merge_deep_replaces_map_with_leaf_when_sides_disagree() {
    let left = PersistentHashMap::new().insert(
        key("a"),
        Value::Map(PersistentHashMap::singleton(key("x"), Value::Number(1))),
    );
    let right = PersistentHashMap::new().insert(key("a"), Value::Number(7));

    let merged = left.merge_deep(&right);
    assert_eq!(merged.get("a"), Some(&Value::Number(7)));
}

#[rstest]
fn test_merge_deep_with_resolves_leaf_collisions() {
    let left = PersistentHashMap::new().insert(
        key("a"),
        Value::Map(PersistentHashMap::singleton(key("x"), Value::Number(10))),
    );
    let right = PersistentHashMap::new().insert(
        key("a"),
        Value::Map(PersistentHashMap::singleton(key("x"), Value::Number(32))),
    );

    let merged = left.merge_deep_with(
        |existing, incoming| match (existing, incoming) {
            (Value::Number(a), Value::Number(b)) => Value::Number(a + b),
            _ => incoming.clone(),
        },
        &right,
    );

    let inner = merged.get("a").and_then(Value::as_map).expect("a is a map");
    assert_eq!(inner.get("x"), Some(&Value::Number(42)));
}

// =============================================================================
// Iteration
// =============================================================================

#[rstest]
fn test_iteration_yields_every_entry_exactly_once() {
    let map: PersistentHashMap<i32, i32> = (0..500).map(|i| (i, i * 3)).collect();

    let mut seen: Vec<(i32, i32)> = map.iter().map(|(k, v)| (*k, *v)).collect();
    seen.sort_unstable();

    let expected: Vec<(i32, i32)> = (0..500).map(|i| (i, i * 3)).collect();
    assert_eq!(seen, expected);
}

#[rstest]
fn test_keys_and_values_agree_with_iter() {
    let map = number_map(&[("a", 1), ("b", 2), ("c", 3)]);

    assert_eq!(map.keys().count(), 3);
    assert_eq!(map.values().sum::<i32>(), 6);
}

#[rstest]
fn test_iteration_order_is_stable_per_map() {
    let map: PersistentHashMap<i32, i32> = (0..100).map(|i| (i, i)).collect();

    let first: Vec<i32> = map.iter().map(|(k, _)| *k).collect();
    let second: Vec<i32> = map.iter().map(|(k, _)| *k).collect();
    assert_eq!(first, second);
}

#[rstest]
fn test_into_iterator_owns_entries() {
    let map = number_map(&[("a", 1), ("b", 2)]);
    let mut owned: Vec<(String, i32)> = map.into_iter().collect();
    owned.sort();

    assert_eq!(owned, vec![(key("a"), 1), (key("b"), 2)]);
}

// =============================================================================
// Equality
// =============================================================================

#[rstest]
fn test_maps_with_same_entries_are_equal() {
    let map1 = number_map(&[("a", 1), ("b", 2)]);
    let map2 = number_map(&[("b", 2), ("a", 1)]);

    assert_eq!(map1, map2);
}

#[rstest]
fn test_maps_with_different_values_are_not_equal() {
    assert_ne!(number_map(&[("a", 1)]), number_map(&[("a", 2)]));
    assert_ne!(number_map(&[("a", 1)]), number_map(&[("a", 1), ("b", 2)]));
}

// =============================================================================
// Serde Round Trip
// =============================================================================

#[cfg(feature = "serde")]
#[rstest]
fn test_serde_round_trip() {
    let map = number_map(&[("a", 1), ("b", 2), ("c", 3)]);

    let json = serde_json::to_string(&map).expect("serializes");
    let back: PersistentHashMap<String, i32> = serde_json::from_str(&json).expect("deserializes");

    assert_eq!(back, map);
}
