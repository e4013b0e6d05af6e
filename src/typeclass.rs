//! Type class traits the map participates in.
//!
//! The map composes with generic sequence consumers through two small
//! traits: [`TypeConstructor`] emulates a higher-kinded type via Generic
//! Associated Types, and [`Foldable`] reduces a structure's elements to a
//! summary value. Together they are the crate's seam for iteration
//! composition — a consumer written against `Foldable` folds a map's
//! values without knowing about tries.
//!
//! # Examples
//!
//! ```rust
//! use triemap::PersistentHashMap;
//! use triemap::typeclass::Foldable;
//!
//! let map: PersistentHashMap<String, i32> =
//!     vec![("a".to_string(), 1), ("b".to_string(), 2)].into_iter().collect();
//!
//! let sum = map.fold_left(0, |accumulator, value| accumulator + value);
//! assert_eq!(sum, 3);
//! ```

// =============================================================================
// TypeConstructor
// =============================================================================

/// A trait representing a type constructor.
///
/// This emulates Higher-Kinded Types using Generic Associated Types,
/// allowing traits like [`Foldable`] to abstract over containers.
///
/// # Associated Types
///
/// - `Inner`: The type parameter the constructor is currently applied to.
/// - `WithType<B>`: The same constructor applied to a different type `B`.
pub trait TypeConstructor {
    /// The inner type that this type constructor is applied to.
    type Inner;

    /// The same type constructor applied to a different type `B`.
    type WithType<B>;
}

// =============================================================================
// Foldable
// =============================================================================

/// A type class for data structures that can be folded to a summary value.
///
/// # Required Methods
///
/// - `fold_left`: Left-associative fold
/// - `fold_right`: Right-associative fold
///
/// The remaining methods have default implementations in terms of
/// `fold_left`.
pub trait Foldable: TypeConstructor {
    /// Folds the structure from left to right with an accumulator.
    ///
    /// This is equivalent to Rust's `Iterator::fold`.
    fn fold_left<B, F>(self, init: B, function: F) -> B
    where
        Self: Sized,
        F: FnMut(B, Self::Inner) -> B;

    /// Folds the structure from right to left with an accumulator.
    fn fold_right<B, F>(self, init: B, function: F) -> B
    where
        Self: Sized,
        F: FnMut(Self::Inner, B) -> B;

    /// Check if the structure has no elements.
    fn is_empty(&self) -> bool;

    /// Count the number of elements.
    fn length(&self) -> usize;

    /// Converts the structure's elements to a `Vec`.
    fn to_list(self) -> Vec<Self::Inner>
    where
        Self: Sized,
    {
        self.fold_left(Vec::new(), |mut accumulator, element| {
            accumulator.push(element);
            accumulator
        })
    }

    /// Check if any element matches a predicate.
    fn exists<P>(self, mut predicate: P) -> bool
    where
        Self: Sized,
        P: FnMut(&Self::Inner) -> bool,
    {
        self.fold_left(false, |found, element| found || predicate(&element))
    }

    /// Check if all elements match a predicate.
    fn for_all<P>(self, mut predicate: P) -> bool
    where
        Self: Sized,
        P: FnMut(&Self::Inner) -> bool,
    {
        self.fold_left(true, |all, element| all && predicate(&element))
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PersistentHashMap;
    use rstest::rstest;

    #[rstest]
    fn test_to_list_collects_all_values() {
        let map: PersistentHashMap<i32, i32> = (0..10).map(|i| (i, i * 2)).collect();

        let mut values = map.to_list();
        values.sort_unstable();
        assert_eq!(values, (0..10).map(|i| i * 2).collect::<Vec<_>>());
    }

    #[rstest]
    fn test_exists_and_for_all() {
        let map: PersistentHashMap<i32, i32> = (0..10).map(|i| (i, i)).collect();

        assert!(map.clone().exists(|value| *value == 7));
        assert!(!map.clone().exists(|value| *value == 42));
        assert!(map.clone().for_all(|value| *value < 10));
        assert!(!map.for_all(|value| *value < 5));
    }

    #[rstest]
    fn test_fold_right_matches_reverse_walk() {
        let map: PersistentHashMap<i32, i32> = (0..5).map(|i| (i, i)).collect();

        let forward: Vec<i32> = map.clone().fold_left(Vec::new(), |mut acc, value| {
            acc.push(value);
            acc
        });
        let mut backward: Vec<i32> = map.fold_right(Vec::new(), |value, mut acc| {
            acc.push(value);
            acc
        });

        backward.reverse();
        assert_eq!(forward, backward);
    }
}
