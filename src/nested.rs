//! Map-valued values.
//!
//! Nested-path updates ([`PersistentHashMap::update_in`]) and deep merges
//! ([`PersistentHashMap::merge_deep`]) need to ask a value "are you a map?"
//! and to wrap a map back up as a value. [`NestedValue`] is that seam: a
//! value type that can hold nested maps implements it, and the map's
//! recursive operations become available.
//!
//! [`PersistentHashMap::update_in`]: crate::PersistentHashMap::update_in
//! [`PersistentHashMap::merge_deep`]: crate::PersistentHashMap::merge_deep

use crate::PersistentHashMap;

/// A value type that may hold a nested map.
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
/// let map = PersistentHashMap::new()
///     .update_in(&["a".to_string(), "b".to_string()], |_| Value::Number(1))
///     .unwrap();
///
/// let inner = map.get("a").and_then(Value::as_map).unwrap();
/// assert_eq!(inner.get("b"), Some(&Value::Number(1)));
/// ```
pub trait NestedValue<K>: Sized {
    /// The nested map inside this value, if it holds one.
    fn as_map(&self) -> Option<&PersistentHashMap<K, Self>>;

    /// Wraps a map back up as a value.
    fn from_map(map: PersistentHashMap<K, Self>) -> Self;
}
