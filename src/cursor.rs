//! Cursors: a focus on a nested value with change notification.
//!
//! A [`Cursor`] pairs a snapshot of a [`PersistentHashMap`] with a key
//! path into its nested maps. Updates through the cursor run
//! [`PersistentHashMap::update_in`] on the current snapshot, advance the
//! cursor to the result, and notify the registered change callback —
//! but only when the update actually produced a different map
//! (pointer identity on the root, so no-op updates are silent).
//!
//! [`PersistentHashMap::update_in`]: crate::PersistentHashMap::update_in

use std::hash::Hash;

use crate::ReferenceCounter;
use crate::error::MapError;
use crate::map::PersistentHashMap;
use crate::nested::NestedValue;

/// Callback invoked as `(new_map, old_map, path)` after a cursor update
/// that changed the map.
type ChangeCallback<K, V> =
    ReferenceCounter<dyn Fn(&PersistentHashMap<K, V>, &PersistentHashMap<K, V>, &[K])>;

// =============================================================================
// Cursor Definition
// =============================================================================

/// A focus on the value at a nested key path of a map.
///
/// The cursor owns its snapshot: reading goes through the stored map,
/// and updating replaces it. Child cursors share the parent's change
/// callback but carry their own snapshot from the moment of derivation.
///
/// # Examples
///
/// ```rust
/// use std::cell::Cell;
/// use std::rc::Rc;
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
/// let notified = Rc::new(Cell::new(0));
/// let seen = Rc::clone(&notified);
///
/// let map: PersistentHashMap<String, Value> = PersistentHashMap::new();
/// let mut cursor = map
///     .cursor(vec!["profile".to_string(), "visits".to_string()])
///     .on_change(move |_, _, _| seen.set(seen.get() + 1));
///
/// cursor
///     .update(|current| {
///         let base = match current {
///             Some(Value::Number(n)) => *n,
///             _ => 0,
///         };
///         Value::Number(base + 1)
///     })
///     .unwrap();
///
/// assert_eq!(cursor.get(), Some(&Value::Number(1)));
/// assert_eq!(notified.get(), 1);
/// ```
pub struct Cursor<K, V> {
    map: PersistentHashMap<K, V>,
    path: Vec<K>,
    on_change: Option<ChangeCallback<K, V>>,
}

impl<K, V> Cursor<K, V>
where
    K: Clone + Hash + Eq,
    V: Clone + PartialEq + NestedValue<K>,
{
    /// Creates a cursor focused on `path` within `map`, with no change
    /// callback.
    #[must_use]
    pub fn new(map: PersistentHashMap<K, V>, path: Vec<K>) -> Self {
        Self {
            map,
            path,
            on_change: None,
        }
    }

    /// Registers the change callback, replacing any previous one.
    ///
    /// The callback receives `(new_map, old_map, path)` after every update
    /// that changed the map.
    #[must_use]
    pub fn on_change<F>(mut self, callback: F) -> Self
    where
        F: Fn(&PersistentHashMap<K, V>, &PersistentHashMap<K, V>, &[K]) + 'static,
    {
        self.on_change = Some(ReferenceCounter::new(callback));
        self
    }

    /// The cursor's current snapshot of the whole map.
    #[must_use]
    pub const fn map(&self) -> &PersistentHashMap<K, V> {
        &self.map
    }

    /// The key path this cursor focuses on.
    #[must_use]
    pub fn path(&self) -> &[K] {
        &self.path
    }

    /// The value at the focused path, or `None` when the path is empty,
    /// absent, or crosses a non-map value.
    #[must_use]
    pub fn get(&self) -> Option<&V> {
        let (first, rest) = self.path.split_first()?;
        let mut current = self.map.get(first)?;
        for key in rest {
            current = current.as_map()?.get(key)?;
        }
        Some(current)
    }

    /// Derives a child cursor one key deeper, sharing the change callback.
    #[must_use]
    pub fn cursor(&self, key: K) -> Self {
        let mut path = self.path.clone();
        path.push(key);
        Self {
            map: self.map.clone(),
            path,
            on_change: self.on_change.clone(),
        }
    }

    /// Replaces the focused value through `updater` and advances the
    /// snapshot.
    ///
    /// The change callback fires only when the resulting map differs from
    /// the current snapshot.
    ///
    /// # Errors
    ///
    /// [`MapError::InvalidKeyPath`] when the path crosses a value that is
    /// not a map.
    pub fn update<F>(&mut self, updater: F) -> Result<(), MapError>
    where
        F: FnOnce(Option<&V>) -> V,
    {
        let updated = self.map.update_in(&self.path, updater)?;
        if !updated.ptr_eq(&self.map) {
            if let Some(callback) = &self.on_change {
                callback(&updated, &self.map, &self.path);
            }
            self.map = updated;
        }
        Ok(())
    }

    /// Binds the focused path to `value`.
    ///
    /// # Errors
    ///
    /// [`MapError::InvalidKeyPath`] when the path crosses a value that is
    /// not a map.
    pub fn set(&mut self, value: V) -> Result<(), MapError> {
        self.update(|_| value)
    }
}

// =============================================================================
// Tests
// =============================================================================
