//! Transient (batched-mutation) view of a persistent hash map.
//!
//! A [`TransientHashMap`] is the owner/batch side of the trie's write
//! protocol. Creating one allocates a fresh owner token; every node the
//! batch touches is either already tagged with that token (and edited in
//! place) or shallow-copied and tagged on first touch. Nodes reachable
//! from previously published persistent maps are therefore never mutated.
//!
//! Calling [`TransientHashMap::persistent`] consumes the transient and
//! drops its token. Interior nodes keep their stale owner tags, but a
//! token is never reused, so no later batch can match them: the returned
//! map is immutable from that point on.
//!
//! # Examples
//!
//! ```rust
//! use triemap::{PersistentHashMap, TransientHashMap};
//!
//! let mut transient = TransientHashMap::new();
//! for index in 0..100 {
//!     transient.insert(index, index * 2);
//! }
//! let map: PersistentHashMap<i32, i32> = transient.persistent();
//!
//! assert_eq!(map.len(), 100);
//! assert_eq!(map.get(&21), Some(&42));
//! ```

use std::borrow::Borrow;
use std::fmt;
use std::hash::Hash;

use crate::ReferenceCounter;
use crate::hash::hash_of;
use crate::map::PersistentHashMap;
use crate::node::{Node, OwnerToken, Removal};

// =============================================================================
// TransientHashMap Definition
// =============================================================================

/// A mutable view of a [`PersistentHashMap`] scoped to a single batch.
///
/// The transient holds an owner token that authorizes in-place edits of
/// nodes created within the batch. It is deliberately not `Clone`: a batch
/// has exactly one handle, and the handle moves into
/// [`persistent`](Self::persistent) when the batch ends.
///
/// Mutation through a transient is not thread-safe; share only the
/// persistent maps it produces.
///
/// # Examples
///
/// ```rust
/// use triemap::PersistentHashMap;
///
/// let base = PersistentHashMap::new().insert("kept".to_string(), 0);
///
/// let mut transient = base.transient();
/// transient.insert("added".to_string(), 1);
/// transient.remove("kept");
/// let result = transient.persistent();
///
/// assert_eq!(base.len(), 1); // The base map never changes
/// assert_eq!(result.len(), 1);
/// assert_eq!(result.get("added"), Some(&1));
/// ```
pub struct TransientHashMap<K, V> {
    root: Option<ReferenceCounter<Node<K, V>>>,
    length: usize,
    owner: OwnerToken,
}

impl<K, V> TransientHashMap<K, V> {
    /// Creates an empty transient map with a fresh owner token.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            root: None,
            length: 0,
            owner: OwnerToken::new(),
        }
    }

    /// Returns the number of entries currently in the batch.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.length
    }

    /// Returns `true` if the batch currently holds no entries.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Removes every entry in place.
    pub fn clear(&mut self) {
        self.root = None;
        self.length = 0;
    }
}

impl<K: Clone + Hash + Eq, V: Clone + PartialEq> TransientHashMap<K, V> {
    /// Clones the handle fields of a persistent map and attaches a fresh
    /// owner token. The map's own nodes stay untouched until first edit.
    pub(crate) fn from_map(map: &PersistentHashMap<K, V>) -> Self {
        Self {
            root: map.root.clone(),
            length: map.length,
            owner: OwnerToken::new(),
        }
    }

    /// Ends the batch, yielding an immutable map.
    ///
    /// The owner token is dropped with the transient; nodes keep their
    /// stale tags, which no future batch can match, so the returned map
    /// (and everything sharing its nodes) is frozen.
    #[must_use]
    pub fn persistent(self) -> PersistentHashMap<K, V> {
        PersistentHashMap {
            root: self.root,
            length: self.length,
        }
    }

    /// Returns a reference to the value corresponding to the key.
    #[must_use]
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let root = self.root.as_ref()?;
        root.get_entry(0, hash_of(key), key)
            .map(|(_, value)| value)
    }

    /// Returns `true` if the batch contains a value for the specified key.
    #[must_use]
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.get(key).is_some()
    }

    /// Inserts a key-value pair, editing owned nodes in place.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use triemap::TransientHashMap;
    ///
    /// let mut transient = TransientHashMap::new();
    /// transient.insert("key".to_string(), 1);
    /// transient.insert("key".to_string(), 2);
    ///
    /// assert_eq!(transient.len(), 1);
    /// assert_eq!(transient.get("key"), Some(&2));
    /// ```
    pub fn insert(&mut self, key: K, value: V) {
        let hash = hash_of(&key);
        match &mut self.root {
            None => {
                self.root = Some(ReferenceCounter::new(Node::single_leaf(
                    Some(self.owner.clone()),
                    hash,
                    key,
                    value,
                )));
                self.length = 1;
            }
            Some(root) => {
                let mut did_add = false;
                Node::insert(root, Some(&self.owner), 0, hash, key, value, &mut did_add);
                if did_add {
                    self.length += 1;
                }
            }
        }
    }

    /// Removes a key, editing owned nodes in place. Absent keys are a
    /// no-op.
    pub fn remove<Q>(&mut self, key: &Q)
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let Some(root) = &mut self.root else {
            return;
        };
        match Node::remove(root, Some(&self.owner), 0, hash_of(key), key) {
            Removal::Unchanged => {}
            Removal::Edited => self.length = self.length.saturating_sub(1),
            Removal::Emptied => {
                self.root = None;
                self.length = 0;
            }
        }
    }

    /// Applies `function` to the value bound to an existing key. Absent
    /// keys are a no-op.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use triemap::TransientHashMap;
    ///
    /// let mut transient = TransientHashMap::new();
    /// transient.insert("count".to_string(), 10);
    /// transient.update_with("count", |value| value + 1);
    ///
    /// assert_eq!(transient.get("count"), Some(&11));
    /// ```
    pub fn update_with<Q, F>(&mut self, key: &Q, function: F)
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
        F: FnOnce(&V) -> V,
    {
        let hash = hash_of(key);
        let (found_key, new_value) = match &self.root {
            Some(root) => match root.get_entry(0, hash, key) {
                Some((found_key, found_value)) => (found_key.clone(), function(found_value)),
                None => return,
            },
            None => return,
        };
        self.insert(found_key, new_value);
    }

    /// Inserts every entry of `entries`, consuming and returning the
    /// transient so bulk loads chain.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use triemap::TransientHashMap;
    ///
    /// let map = TransientHashMap::new()
    ///     .insert_bulk((0..10).map(|i| (i, i)))
    ///     .insert_bulk((10..20).map(|i| (i, i)))
    ///     .persistent();
    ///
    /// assert_eq!(map.len(), 20);
    /// ```
    #[must_use]
    pub fn insert_bulk<I>(mut self, entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
    {
        for (key, value) in entries {
            self.insert(key, value);
        }
        self
    }
}

// =============================================================================
// Standard Trait Implementations
// =============================================================================

impl<K, V> Default for TransientHashMap<K, V> {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Clone + Hash + Eq, V: Clone + PartialEq> Extend<(K, V)> for TransientHashMap<K, V> {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.insert(key, value);
        }
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for TransientHashMap<K, V> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut builder = formatter.debug_map();
        if let Some(root) = &self.root {
            root.for_each_while(false, &mut |key, value| {
                builder.entry(key, value);
                true
            });
        }
        builder.finish()
    }
}

// =============================================================================
// Tests
// =============================================================================
