//! # triemap
//!
//! A persistent (immutable) hash map built on a Hash Array Mapped Trie
//! (HAMT), with structural sharing, a scoped transient mode for batched
//! in-place mutation, deep merge, nested-path updates, and cursors.
//!
//! ## Overview
//!
//! [`PersistentHashMap`] is an immutable map: every update returns a new
//! map that shares almost all of its interior nodes with the previous one.
//! The trie branches 32 ways per level, consuming five bits of a 32-bit
//! key hash at each step, so operations touch at most seven nodes.
//!
//! - O(log32 N) get, insert, remove (effectively O(1) in practice)
//! - O(1) `len` and `is_empty`
//! - pointer-identity no-ops: an operation that changes nothing returns a
//!   handle sharing the receiver's root, observable via
//!   [`PersistentHashMap::ptr_eq`]
//!
//! ## Transients
//!
//! A [`TransientHashMap`] is a scoped mutable view: nodes created inside
//! the batch carry an owner token and are edited in place, while nodes
//! shared with persistent maps are copied on first touch. The batch yields
//! back a persistent value and every previously published map stays
//! untouched.
//!
//! ## Examples
//!
//! ```rust
//! use triemap::PersistentHashMap;
//!
//! let map = PersistentHashMap::new()
//!     .insert("one".to_string(), 1)
//!     .insert("two".to_string(), 2);
//!
//! // Structural sharing: the original map is preserved
//! let updated = map.insert("one".to_string(), 100);
//! assert_eq!(map.get("one"), Some(&1));       // Original unchanged
//! assert_eq!(updated.get("one"), Some(&100)); // New version
//!
//! // Batched mutation through a transient
//! let large = map.with_mutations(|transient| {
//!     for index in 0..1000 {
//!         transient.insert(format!("key_{index}"), index);
//!     }
//! });
//! assert_eq!(large.len(), 1002);
//! assert_eq!(map.len(), 2);
//! ```
//!
//! ## Feature Flags
//!
//! - `arc`: thread-safe structural sharing (`Arc` instead of `Rc`)
//! - `serde`: `Serialize`/`Deserialize` for the map
//! - `fxhash`, `ahash`: faster hashers in place of std's `DefaultHasher`

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

// =============================================================================
// Reference Counter Type Alias
// =============================================================================

/// Reference-counted handle behind all structural sharing.
///
/// Trie nodes, subtree children, and owner tokens share through this
/// alias: `std::rc::Rc` by default (faster, single-threaded), or
/// `std::sync::Arc` under the `arc` feature so frozen maps can be read
/// from multiple threads.
#[cfg(feature = "arc")]
pub(crate) type ReferenceCounter<T> = std::sync::Arc<T>;

#[cfg(not(feature = "arc"))]
pub(crate) type ReferenceCounter<T> = std::rc::Rc<T>;

mod cursor;
mod error;
mod hash;
mod map;
mod nested;
mod node;
mod transient;
pub mod typeclass;

pub use cursor::Cursor;
pub use error::MapError;
pub use map::PersistentHashMap;
pub use map::PersistentHashMapIntoIterator;
pub use map::PersistentHashMapIterator;
pub use nested::NestedValue;
pub use transient::TransientHashMap;

// =============================================================================
// Tests
// =============================================================================
