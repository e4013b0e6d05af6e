//! Error types for map operations.

use thiserror::Error;

/// Errors surfaced by path-based map operations.
///
/// Keys that cannot be hashed do not exist as a runtime failure: every key
/// type must implement `Hash + Eq`, so the only operation that can fail is
/// descending a key path.
///
/// # Examples
///
/// ```rust
/// use triemap::{MapError, NestedValue, PersistentHashMap};
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
/// let map = PersistentHashMap::new().insert("a".to_string(), Value::Number(1));
///
/// // "a" holds a number, so it cannot be descended through.
/// let result = map.update_in(
///     &["a".to_string(), "b".to_string()],
///     |_| Value::Number(2),
/// );
/// assert_eq!(result.unwrap_err(), MapError::InvalidKeyPath);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MapError {
    /// A path-based update descended into a value that is not a map at an
    /// interior path position.
    #[error("update_in with invalid key path")]
    InvalidKeyPath,
}
