//! Persistent (immutable) hash map based on HAMT.
//!
//! This module provides [`PersistentHashMap`], an immutable hash map
//! that uses structural sharing for efficient operations.
//!
//! # Overview
//!
//! `PersistentHashMap` is based on Hash Array Mapped Trie (HAMT), a data
//! structure that provides efficient immutable operations. It uses a
//! 32-way branching trie where hash bits are used to navigate the tree.
//!
//! - O(log32 N) get (effectively O(1) for practical sizes)
//! - O(log32 N) insert
//! - O(log32 N) remove
//! - O(1) len and `is_empty`
//!
//! All operations return new maps without modifying the original, and
//! structural sharing ensures memory efficiency. An operation that would
//! produce a structurally equal map returns a handle sharing the
//! receiver's root instead, so "did anything change" is a cheap pointer
//! comparison ([`PersistentHashMap::ptr_eq`]).
//!
//! # Examples
//!
//! ```rust
//! use triemap::PersistentHashMap;
//!
//! let map = PersistentHashMap::new()
//!     .insert("one".to_string(), 1)
//!     .insert("two".to_string(), 2)
//!     .insert("three".to_string(), 3);
//!
//! assert_eq!(map.get("one"), Some(&1));
//! assert_eq!(map.get("two"), Some(&2));
//! assert_eq!(map.get("three"), Some(&3));
//!
//! // Structural sharing: the original map is preserved
//! let updated = map.insert("one".to_string(), 100);
//! assert_eq!(map.get("one"), Some(&1));       // Original unchanged
//! assert_eq!(updated.get("one"), Some(&100)); // New version
//! ```
//!
//! # Internal Structure
//!
//! The HAMT uses:
//! - 32-way branching (5 bits of a 32-bit hash per level)
//! - Bitmap-indexed interior nodes with children packed at popcount offsets
//! - Collision nodes for keys whose full hashes coincide
//! - Structural sharing via reference-counted node handles
//! - Owner tokens authorizing in-place edits during a transient batch

use std::borrow::Borrow;
use std::fmt;
use std::hash::Hash;

use crate::ReferenceCounter;
use crate::cursor::Cursor;
use crate::error::MapError;
use crate::hash::hash_of;
use crate::nested::NestedValue;
use crate::node::{Node, Removal};
use crate::transient::TransientHashMap;
use crate::typeclass::{Foldable, TypeConstructor};

// =============================================================================
// PersistentHashMap Definition
// =============================================================================

/// A persistent (immutable) hash map based on HAMT.
///
/// `PersistentHashMap` is an immutable data structure that uses structural
/// sharing to efficiently support functional programming patterns.
///
/// # Time Complexity
///
/// | Operation      | Complexity        |
/// |----------------|-------------------|
/// | `new`          | O(1)              |
/// | `get`          | O(log32 N)        |
/// | `insert`       | O(log32 N)        |
/// | `remove`       | O(log32 N)        |
/// | `contains_key` | O(log32 N)        |
/// | `len`          | O(1)              |
/// | `is_empty`     | O(1)              |
///
/// # Examples
///
/// ```rust
/// use triemap::PersistentHashMap;
///
/// let map = PersistentHashMap::singleton("key".to_string(), 42);
/// assert_eq!(map.get("key"), Some(&42));
/// ```
#[derive(Clone)]
pub struct PersistentHashMap<K, V> {
    /// Root node of the trie; absent for the empty map.
    pub(crate) root: Option<ReferenceCounter<Node<K, V>>>,
    /// Number of entries.
    pub(crate) length: usize,
}

impl<K, V> PersistentHashMap<K, V> {
    /// Creates a new empty map.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use triemap::PersistentHashMap;
    ///
    /// let map: PersistentHashMap<String, i32> = PersistentHashMap::new();
    /// assert!(map.is_empty());
    /// ```
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            root: None,
            length: 0,
        }
    }

    /// Returns the number of entries in the map.
    ///
    /// # Complexity
    ///
    /// O(1)
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.length
    }

    /// Returns `true` if the map contains no entries.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Returns the empty map.
    ///
    /// Equivalent to [`new`](Self::new); provided so a chain of operations
    /// can end in an explicit reset.
    #[inline]
    #[must_use]
    pub const fn clear(&self) -> Self {
        Self::new()
    }

    /// Whether two handles share the same root node.
    ///
    /// Every operation that would produce a structurally equal map returns
    /// a handle for which this holds against the receiver, making
    /// `ptr_eq` a constant-time "did anything change" test.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use triemap::PersistentHashMap;
    ///
    /// let map = PersistentHashMap::new().insert("x".to_string(), 1);
    ///
    /// // Binding an equal value changes nothing
    /// assert!(map.insert("x".to_string(), 1).ptr_eq(&map));
    /// // Removing an absent key changes nothing
    /// assert!(map.remove("missing").ptr_eq(&map));
    /// // A real update produces a distinct root
    /// assert!(!map.insert("x".to_string(), 2).ptr_eq(&map));
    /// ```
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        match (&self.root, &other.root) {
            (None, None) => true,
            (Some(left), Some(right)) => ReferenceCounter::ptr_eq(left, right),
            _ => false,
        }
    }

    /// Walks all entries, visiting them in slot-index order (descending
    /// when `reverse`), until `visit` returns `false`.
    ///
    /// Returns `true` iff the walk completed without short-circuiting.
    /// The order is deterministic for a given trie shape but unrelated to
    /// insertion order or key values; callers must not rely on it across
    /// unrelated maps.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use triemap::PersistentHashMap;
    ///
    /// let map: PersistentHashMap<i32, i32> = (0..10).map(|i| (i, i)).collect();
    ///
    /// let mut seen = 0;
    /// let completed = map.iterate(
    ///     |_, _| {
    ///         seen += 1;
    ///         seen < 5
    ///     },
    ///     false,
    /// );
    /// assert!(!completed);
    /// assert_eq!(seen, 5);
    /// ```
    pub fn iterate<'a, F>(&'a self, mut visit: F, reverse: bool) -> bool
    where
        F: FnMut(&'a K, &'a V) -> bool,
    {
        match &self.root {
            None => true,
            Some(root) => root.for_each_while(reverse, &mut visit),
        }
    }

    /// Returns an iterator over key-value pairs.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use triemap::PersistentHashMap;
    ///
    /// let map = PersistentHashMap::new()
    ///     .insert("a".to_string(), 1)
    ///     .insert("b".to_string(), 2);
    ///
    /// let total: i32 = map.iter().map(|(_, value)| value).sum();
    /// assert_eq!(total, 3);
    /// ```
    #[must_use]
    pub fn iter(&self) -> PersistentHashMapIterator<'_, K, V> {
        let mut entries = Vec::with_capacity(self.length);
        self.iterate(
            |key, value| {
                entries.push((key, value));
                true
            },
            false,
        );
        PersistentHashMapIterator {
            entries,
            current_index: 0,
        }
    }

    /// Returns an iterator over keys.
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.iter().map(|(key, _)| key)
    }

    /// Returns an iterator over values.
    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.iter().map(|(_, value)| value)
    }
}

// =============================================================================
// Lookup
// =============================================================================

impl<K: Hash + Eq, V> PersistentHashMap<K, V> {
    /// Returns a reference to the value corresponding to the key.
    ///
    /// The key may be any borrowed form of the map's key type, but `Hash`
    /// and `Eq` on the borrowed form must match those for the key type.
    ///
    /// # Complexity
    ///
    /// O(log32 N)
    ///
    /// # Examples
    ///
    /// ```rust
    /// use triemap::PersistentHashMap;
    ///
    /// let map = PersistentHashMap::new().insert("hello".to_string(), 42);
    ///
    /// // Can use &str to look up String keys
    /// assert_eq!(map.get("hello"), Some(&42));
    /// assert_eq!(map.get("world"), None);
    /// ```
    #[must_use]
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.get_entry(key).map(|(_, value)| value)
    }

    /// Returns `true` if the map contains a value for the specified key.
    #[must_use]
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.get_entry(key).is_some()
    }

    /// Finds the stored entry for `key`, exposing the stored key.
    fn get_entry<Q>(&self, key: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let root = self.root.as_ref()?;
        root.get_entry(0, hash_of(key), key)
    }
}

// =============================================================================
// Updates
// =============================================================================

impl<K: Clone + Hash + Eq, V: Clone + PartialEq> PersistentHashMap<K, V> {
    /// Creates a map containing a single key-value pair.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use triemap::PersistentHashMap;
    ///
    /// let map = PersistentHashMap::singleton("key".to_string(), 42);
    /// assert_eq!(map.len(), 1);
    /// ```
    #[inline]
    #[must_use]
    pub fn singleton(key: K, value: V) -> Self {
        Self::new().insert(key, value)
    }

    /// Inserts a key-value pair into the map.
    ///
    /// If the map already contains the key, the value is replaced. Binding
    /// a value equal to the existing one returns a handle sharing the
    /// receiver's root ([`ptr_eq`](Self::ptr_eq) holds).
    ///
    /// # Complexity
    ///
    /// O(log32 N)
    ///
    /// # Examples
    ///
    /// ```rust
    /// use triemap::PersistentHashMap;
    ///
    /// let map1 = PersistentHashMap::new().insert("key".to_string(), 1);
    /// let map2 = map1.insert("key".to_string(), 2);
    ///
    /// assert_eq!(map1.get("key"), Some(&1)); // Original unchanged
    /// assert_eq!(map2.get("key"), Some(&2)); // New version
    /// ```
    #[must_use]
    pub fn insert(&self, key: K, value: V) -> Self {
        let hash = hash_of(&key);
        let Some(root) = &self.root else {
            return Self {
                root: Some(ReferenceCounter::new(Node::single_leaf(
                    None, hash, key, value,
                ))),
                length: 1,
            };
        };
        let mut new_root = ReferenceCounter::clone(root);
        let mut did_add = false;
        if Node::insert(&mut new_root, None, 0, hash, key, value, &mut did_add) {
            Self {
                root: Some(new_root),
                length: self.length + usize::from(did_add),
            }
        } else {
            self.clone()
        }
    }

    /// Removes a key from the map.
    ///
    /// Returns a new map without the key; removing an absent key returns a
    /// handle sharing the receiver's root. Removing the last entry returns
    /// the empty map.
    ///
    /// # Complexity
    ///
    /// O(log32 N)
    ///
    /// # Examples
    ///
    /// ```rust
    /// use triemap::PersistentHashMap;
    ///
    /// let map = PersistentHashMap::new()
    ///     .insert("a".to_string(), 1)
    ///     .insert("b".to_string(), 2);
    /// let removed = map.remove("a");
    ///
    /// assert_eq!(map.len(), 2);     // Original unchanged
    /// assert_eq!(removed.len(), 1); // New version
    /// assert_eq!(removed.get("a"), None);
    /// ```
    #[must_use]
    pub fn remove<Q>(&self, key: &Q) -> Self
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let Some(root) = &self.root else {
            return self.clone();
        };
        let mut new_root = ReferenceCounter::clone(root);
        match Node::remove(&mut new_root, None, 0, hash_of(key), key) {
            Removal::Unchanged => self.clone(),
            Removal::Edited => Self {
                root: Some(new_root),
                length: self.length.saturating_sub(1),
            },
            Removal::Emptied => Self::new(),
        }
    }

    /// Updates the value for an existing key using a function.
    ///
    /// Returns `None` if the key doesn't exist.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use triemap::PersistentHashMap;
    ///
    /// let map = PersistentHashMap::new().insert("count".to_string(), 10);
    /// let updated = map.update("count", |value| value + 1);
    ///
    /// assert_eq!(updated.unwrap().get("count"), Some(&11));
    /// ```
    #[must_use]
    pub fn update<Q, F>(&self, key: &Q, function: F) -> Option<Self>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
        F: FnOnce(&V) -> V,
    {
        let (found_key, found_value) = self.get_entry(key)?;
        let new_value = function(found_value);
        Some(self.insert(found_key.clone(), new_value))
    }

    /// Updates or removes a value for a key using an updater function.
    ///
    /// The updater receives `Some(&V)` if the key exists, or `None` if it
    /// doesn't. If the updater returns `Some(V)`, the value is inserted or
    /// updated. If the updater returns `None`, the key is removed (if it
    /// exists).
    ///
    /// # Examples
    ///
    /// ```rust
    /// use triemap::PersistentHashMap;
    ///
    /// let map = PersistentHashMap::new().insert("count".to_string(), 10);
    ///
    /// // Increment existing value
    /// let updated = map.update_with("count", |current| current.map(|v| v + 1));
    /// assert_eq!(updated.get("count"), Some(&11));
    ///
    /// // Insert if not exists
    /// let inserted = map.update_with("other", |current| current.copied().or(Some(100)));
    /// assert_eq!(inserted.get("other"), Some(&100));
    ///
    /// // Remove by returning None
    /// let removed = map.update_with("count", |_| None);
    /// assert_eq!(removed.get("count"), None);
    /// ```
    #[must_use]
    pub fn update_with<Q, F>(&self, key: &Q, updater: F) -> Self
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ToOwned<Owned = K> + ?Sized,
        F: FnOnce(Option<&V>) -> Option<V>,
    {
        let current = self.get_entry(key);
        let new_value = updater(current.map(|(_, value)| value));
        match (current, new_value) {
            (Some((found_key, _)), Some(value)) => {
                let found_key = found_key.clone();
                self.insert(found_key, value)
            }
            (Some(_), None) => self.remove(key),
            (None, Some(value)) => self.insert(key.to_owned(), value),
            (None, None) => self.clone(),
        }
    }

    /// Returns a transient (mutable) view of this map.
    ///
    /// The receiver stays immutable; the transient edits its own nodes in
    /// place and copies shared ones on first touch. See
    /// [`TransientHashMap`].
    #[must_use]
    pub fn transient(&self) -> TransientHashMap<K, V> {
        TransientHashMap::from_map(self)
    }

    /// Runs a batch of mutations through a transient and yields the
    /// resulting persistent map.
    ///
    /// Equivalent to, but much faster than, folding the same operations
    /// over persistent handles. A batch that changes nothing returns a
    /// handle sharing the receiver's root.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use triemap::PersistentHashMap;
    ///
    /// let map: PersistentHashMap<i32, i32> = PersistentHashMap::new();
    /// let filled = map.with_mutations(|transient| {
    ///     for index in 0..100 {
    ///         transient.insert(index, index * 2);
    ///     }
    /// });
    ///
    /// assert_eq!(filled.len(), 100);
    /// assert!(map.is_empty());
    /// ```
    #[must_use]
    pub fn with_mutations<F>(&self, mutate: F) -> Self
    where
        F: FnOnce(&mut TransientHashMap<K, V>),
    {
        let mut transient = self.transient();
        mutate(&mut transient);
        transient.persistent()
    }

    /// Merges two maps, with values from `other` taking precedence on key
    /// conflicts.
    ///
    /// The fold runs inside a single transient batch over the receiver.
    ///
    /// # Complexity
    ///
    /// O(m log32 (n + m)) where `m` is the size of `other`
    ///
    /// # Examples
    ///
    /// ```rust
    /// use triemap::PersistentHashMap;
    ///
    /// let map1 = PersistentHashMap::new()
    ///     .insert("a".to_string(), 1)
    ///     .insert("b".to_string(), 2);
    /// let map2 = PersistentHashMap::new()
    ///     .insert("b".to_string(), 20)
    ///     .insert("c".to_string(), 3);
    ///
    /// let merged = map1.merge(&map2);
    ///
    /// assert_eq!(merged.get("a"), Some(&1));
    /// assert_eq!(merged.get("b"), Some(&20)); // From map2
    /// assert_eq!(merged.get("c"), Some(&3));
    /// ```
    #[must_use]
    pub fn merge(&self, other: &Self) -> Self {
        self.with_mutations(|transient| {
            for (key, value) in other.iter() {
                transient.insert(key.clone(), value.clone());
            }
        })
    }

    /// Merges two maps, resolving key conflicts through `resolve`.
    ///
    /// For a key present in both maps the bound value becomes
    /// `resolve(existing, incoming)`; otherwise the incoming value is
    /// written as-is.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use triemap::PersistentHashMap;
    ///
    /// let map1 = PersistentHashMap::new().insert("hits".to_string(), 3);
    /// let map2 = PersistentHashMap::new().insert("hits".to_string(), 4);
    ///
    /// let merged = map1.merge_with(|existing, incoming| existing + incoming, &map2);
    /// assert_eq!(merged.get("hits"), Some(&7));
    /// ```
    #[must_use]
    pub fn merge_with<F>(&self, mut resolve: F, other: &Self) -> Self
    where
        F: FnMut(&V, &V) -> V,
    {
        self.with_mutations(|transient| {
            for (key, incoming) in other.iter() {
                let merged = match transient.get(key) {
                    Some(existing) => resolve(existing, incoming),
                    None => incoming.clone(),
                };
                transient.insert(key.clone(), merged);
            }
        })
    }
}

// =============================================================================
// Nested Maps: update_in, deep merge, cursors
// =============================================================================

impl<K, V> PersistentHashMap<K, V>
where
    K: Clone + Hash + Eq,
    V: Clone + PartialEq + NestedValue<K>,
{
    /// Updates the value at a nested key path, creating intermediate maps
    /// along the way.
    ///
    /// The updater receives the current value at the end of the path (or
    /// `None` when absent) and returns its replacement. Missing interior
    /// maps are created empty; an interior position occupied by a non-map
    /// value fails with [`MapError::InvalidKeyPath`]. With an empty path
    /// the updater is applied to the receiver itself, viewed as a value,
    /// and must return a map.
    ///
    /// # Errors
    ///
    /// [`MapError::InvalidKeyPath`] when the path crosses a value that is
    /// not a map.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use triemap::{NestedValue, PersistentHashMap};
    ///
    /// #[derive(Clone, PartialEq, Debug)]
    /// enum Value {
    ///     Number(i32),
    ///     Map(PersistentHashMap<String, Value>),
    /// }
    ///
    /// impl NestedValue<String> for Value {
    ///     fn as_map(&self) -> Option<&PersistentHashMap<String, Value>> {
    ///         match self {
    ///             Value::Map(map) => Some(map),
    ///             Value::Number(_) => None,
    ///         }
    ///     }
    ///
    ///     fn from_map(map: PersistentHashMap<String, Value>) -> Self {
    ///         Value::Map(map)
    ///     }
    /// }
    ///
    /// let map: PersistentHashMap<String, Value> = PersistentHashMap::new();
    /// let updated = map
    ///     .update_in(&["a".to_string(), "b".to_string()], |current| {
    ///         let base = match current {
    ///             Some(Value::Number(n)) => *n,
    ///             _ => 0,
    ///         };
    ///         Value::Number(base + 1)
    ///     })
    ///     .unwrap();
    ///
    /// let inner = updated.get("a").and_then(Value::as_map).unwrap();
    /// assert_eq!(inner.get("b"), Some(&Value::Number(1)));
    /// ```
    pub fn update_in<F>(&self, path: &[K], updater: F) -> Result<Self, MapError>
    where
        F: FnOnce(Option<&V>) -> V,
    {
        let Some((key, rest)) = path.split_first() else {
            let updated = updater(Some(&V::from_map(self.clone())));
            return updated
                .as_map()
                .cloned()
                .ok_or(MapError::InvalidKeyPath);
        };
        let new_value = Self::update_nested(self.get(key), rest, updater)?;
        Ok(self.insert(key.clone(), new_value))
    }

    /// Recursive step of [`update_in`](Self::update_in) below the first
    /// path key, operating at the value level.
    fn update_nested<F>(current: Option<&V>, path: &[K], updater: F) -> Result<V, MapError>
    where
        F: FnOnce(Option<&V>) -> V,
    {
        let Some((key, rest)) = path.split_first() else {
            return Ok(updater(current));
        };
        let nested = match current {
            None => Self::new(),
            Some(value) => value.as_map().cloned().ok_or(MapError::InvalidKeyPath)?,
        };
        let new_value = Self::update_nested(nested.get(key), rest, updater)?;
        Ok(V::from_map(nested.insert(key.clone(), new_value)))
    }

    /// Merges two maps recursively: where both sides bind a key to a map,
    /// the nested maps are deep-merged; anywhere else the incoming value
    /// wins.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use triemap::{NestedValue, PersistentHashMap};
    ///
    /// #[derive(Clone, PartialEq, Debug)]
    /// enum Value {
    ///     Number(i32),
    ///     Map(PersistentHashMap<String, Value>),
    /// }
    ///
    /// impl NestedValue<String> for Value {
    ///     fn as_map(&self) -> Option<&PersistentHashMap<String, Value>> {
    ///         match self {
    ///             Value::Map(map) => Some(map),
    ///             Value::Number(_) => None,
    ///         }
    ///     }
    ///
    ///     fn from_map(map: PersistentHashMap<String, Value>) -> Self {
    ///         Value::Map(map)
    ///     }
    /// }
    ///
    /// let left = PersistentHashMap::new().insert(
    ///     "a".to_string(),
    ///     Value::Map(PersistentHashMap::singleton("x".to_string(), Value::Number(1))),
    /// );
    /// let right = PersistentHashMap::new().insert(
    ///     "a".to_string(),
    ///     Value::Map(PersistentHashMap::singleton("y".to_string(), Value::Number(2))),
    /// );
    ///
    /// let merged = left.merge_deep(&right);
    /// let inner = merged.get("a").and_then(Value::as_map).unwrap();
    /// assert_eq!(inner.len(), 2);
    /// ```
    #[must_use]
    pub fn merge_deep(&self, other: &Self) -> Self {
        self.merge_deep_with(|_, incoming| incoming.clone(), other)
    }

    /// Like [`merge_deep`](Self::merge_deep), but non-map collisions are
    /// resolved through `resolve` instead of the incoming value winning.
    #[must_use]
    pub fn merge_deep_with<F>(&self, mut resolve: F, other: &Self) -> Self
    where
        F: FnMut(&V, &V) -> V,
    {
        self.merge_deep_inner(&mut resolve, other)
    }

    // The resolver is a trait object so the nested-map recursion stays at
    // a single instantiation.
    fn merge_deep_inner(&self, resolve: &mut dyn FnMut(&V, &V) -> V, other: &Self) -> Self {
        self.with_mutations(|transient| {
            for (key, incoming) in other.iter() {
                let merged = match transient.get(key) {
                    Some(existing) => Self::merge_values(resolve, existing, incoming),
                    None => incoming.clone(),
                };
                transient.insert(key.clone(), merged);
            }
        })
    }

    fn merge_values(resolve: &mut dyn FnMut(&V, &V) -> V, existing: &V, incoming: &V) -> V {
        match (existing.as_map(), incoming.as_map()) {
            (Some(existing_map), Some(incoming_map)) => {
                V::from_map(existing_map.merge_deep_inner(resolve, incoming_map))
            }
            _ => resolve(existing, incoming),
        }
    }

    /// Returns a [`Cursor`] focused on the value at `path`.
    ///
    /// The cursor holds its own snapshot of the map; updates through the
    /// cursor advance the snapshot and report changes to the cursor's
    /// change callback.
    #[must_use]
    pub fn cursor(&self, path: Vec<K>) -> Cursor<K, V> {
        Cursor::new(self.clone(), path)
    }
}

// =============================================================================
// Iterator Implementation
// =============================================================================

/// An iterator over key-value pairs of a [`PersistentHashMap`].
pub struct PersistentHashMapIterator<'a, K, V> {
    entries: Vec<(&'a K, &'a V)>,
    current_index: usize,
}

impl<'a, K, V> Iterator for PersistentHashMapIterator<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        if self.current_index >= self.entries.len() {
            None
        } else {
            let entry = self.entries[self.current_index];
            self.current_index += 1;
            Some(entry)
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.entries.len().saturating_sub(self.current_index);
        (remaining, Some(remaining))
    }
}

impl<K, V> ExactSizeIterator for PersistentHashMapIterator<'_, K, V> {
    fn len(&self) -> usize {
        self.entries.len().saturating_sub(self.current_index)
    }
}

/// An owning iterator over key-value pairs of a [`PersistentHashMap`].
pub struct PersistentHashMapIntoIterator<K, V> {
    entries: Vec<(K, V)>,
    current_index: usize,
}

impl<K: Clone, V: Clone> Iterator for PersistentHashMapIntoIterator<K, V> {
    type Item = (K, V);

    fn next(&mut self) -> Option<Self::Item> {
        if self.current_index >= self.entries.len() {
            None
        } else {
            let entry = self.entries[self.current_index].clone();
            self.current_index += 1;
            Some(entry)
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.entries.len().saturating_sub(self.current_index);
        (remaining, Some(remaining))
    }
}

impl<K: Clone, V: Clone> ExactSizeIterator for PersistentHashMapIntoIterator<K, V> {
    fn len(&self) -> usize {
        self.entries.len().saturating_sub(self.current_index)
    }
}

// =============================================================================
// Standard Trait Implementations
// =============================================================================

impl<K, V> Default for PersistentHashMap<K, V> {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Clone + Hash + Eq, V: Clone + PartialEq> FromIterator<(K, V)> for PersistentHashMap<K, V> {
    /// Builds the map through a single transient batch.
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        TransientHashMap::new().insert_bulk(iter).persistent()
    }
}

impl<K: Clone, V: Clone> IntoIterator for PersistentHashMap<K, V> {
    type Item = (K, V);
    type IntoIter = PersistentHashMapIntoIterator<K, V>;

    fn into_iter(self) -> Self::IntoIter {
        let mut entries = Vec::with_capacity(self.length);
        self.iterate(
            |key, value| {
                entries.push((key.clone(), value.clone()));
                true
            },
            false,
        );
        PersistentHashMapIntoIterator {
            entries,
            current_index: 0,
        }
    }
}

impl<'a, K, V> IntoIterator for &'a PersistentHashMap<K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = PersistentHashMapIterator<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<K: Hash + Eq, V: PartialEq> PartialEq for PersistentHashMap<K, V> {
    fn eq(&self, other: &Self) -> bool {
        if self.ptr_eq(other) {
            return true;
        }
        if self.length != other.length {
            return false;
        }
        self.iterate(|key, value| other.get(key) == Some(value), false)
    }
}

impl<K: Hash + Eq, V: Eq> Eq for PersistentHashMap<K, V> {}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for PersistentHashMap<K, V> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.debug_map().entries(self.iter()).finish()
    }
}

// =============================================================================
// Type Class Implementations
// =============================================================================

/// `PersistentHashMap` participates in value-level folding with K fixed.
impl<K, V> TypeConstructor for PersistentHashMap<K, V> {
    type Inner = V;
    type WithType<B> = PersistentHashMap<K, B>;
}

impl<K: Clone, V: Clone> Foldable for PersistentHashMap<K, V> {
    fn fold_left<B, F>(self, init: B, mut function: F) -> B
    where
        F: FnMut(B, V) -> B,
    {
        self.into_iter()
            .fold(init, |accumulator, (_, value)| function(accumulator, value))
    }

    fn fold_right<B, F>(self, init: B, mut function: F) -> B
    where
        F: FnMut(V, B) -> B,
    {
        // For unordered collections, fold_right folds the reverse walk.
        let mut entries = Vec::with_capacity(self.length);
        self.iterate(
            |_, value| {
                entries.push(value.clone());
                true
            },
            true,
        );
        entries
            .into_iter()
            .fold(init, |accumulator, value| function(value, accumulator))
    }

    #[inline]
    fn is_empty(&self) -> bool {
        self.length == 0
    }

    #[inline]
    fn length(&self) -> usize {
        self.length
    }
}

// =============================================================================
// Serde Support
// =============================================================================

#[cfg(feature = "serde")]
impl<K, V> serde::Serialize for PersistentHashMap<K, V>
where
    K: serde::Serialize,
    V: serde::Serialize,
{
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeMap;
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (key, value) in self {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

#[cfg(feature = "serde")]
struct PersistentHashMapVisitor<K, V> {
    key_marker: std::marker::PhantomData<K>,
    value_marker: std::marker::PhantomData<V>,
}

#[cfg(feature = "serde")]
impl<K, V> PersistentHashMapVisitor<K, V> {
    const fn new() -> Self {
        Self {
            key_marker: std::marker::PhantomData,
            value_marker: std::marker::PhantomData,
        }
    }
}

#[cfg(feature = "serde")]
impl<'de, K, V> serde::de::Visitor<'de> for PersistentHashMapVisitor<K, V>
where
    K: serde::Deserialize<'de> + Clone + Hash + Eq,
    V: serde::Deserialize<'de> + Clone + PartialEq,
{
    type Value = PersistentHashMap<K, V>;

    fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
        formatter.write_str("a map")
    }

    fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
    where
        A: serde::de::MapAccess<'de>,
    {
        // A transient batch keeps deserialization from path-copying per entry.
        let mut transient = TransientHashMap::new();
        while let Some((key, value)) = access.next_entry()? {
            transient.insert(key, value);
        }
        Ok(transient.persistent())
    }
}

#[cfg(feature = "serde")]
impl<'de, K, V> serde::Deserialize<'de> for PersistentHashMap<K, V>
where
    K: serde::Deserialize<'de> + Clone + Hash + Eq,
    V: serde::Deserialize<'de> + Clone + PartialEq,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        deserializer.deserialize_map(PersistentHashMapVisitor::new())
    }
}

// =============================================================================
// Tests
// =============================================================================
