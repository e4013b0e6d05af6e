//! Hashing contract and level geometry for the trie.
//!
//! The trie consumes a 32-bit hash five bits at a time, giving a 32-way
//! branching factor and a maximum depth of seven levels. Keys are hashed
//! through the configured [`Hasher`]: std's `DefaultHasher` by default, or
//! a faster implementation behind the `fxhash` / `ahash` feature flags.
//! The wide 64-bit output is folded onto 32 bits so both halves of the
//! hash contribute to the slot path.

use std::hash::{Hash, Hasher};

#[cfg(feature = "fxhash")]
use fxhash::FxHasher as SelectedHasher;

#[cfg(all(feature = "ahash", not(feature = "fxhash")))]
use ahash::AHasher as SelectedHasher;

#[cfg(not(any(feature = "fxhash", feature = "ahash")))]
use std::collections::hash_map::DefaultHasher as SelectedHasher;

// =============================================================================
// Constants
// =============================================================================

/// Branching factor (2^5 = 32).
pub(crate) const BRANCHING_FACTOR: usize = 32;

/// Bits of hash consumed per trie level.
pub(crate) const BITS_PER_LEVEL: u32 = 5;

/// Mask extracting one level's slot index from a shifted hash.
pub(crate) const MASK: u32 = (BRANCHING_FACTOR - 1) as u32;

/// Maximum trie depth (32 bits / 5 bits per level, rounded up).
#[allow(dead_code)]
pub(crate) const MAX_DEPTH: usize = 7;

// =============================================================================
// Hash computation
// =============================================================================

/// Computes the 32-bit trie hash of a key.
#[allow(clippy::cast_possible_truncation)] // folding the wide hash is the point
pub(crate) fn hash_of<Q: Hash + ?Sized>(key: &Q) -> u32 {
    let mut hasher = SelectedHasher::default();
    key.hash(&mut hasher);
    let wide = hasher.finish();
    (wide ^ (wide >> 32)) as u32
}

/// Extracts the slot index for `hash` at level shift `shift`.
#[inline]
pub(crate) const fn level_index(hash: u32, shift: u32) -> u32 {
    (hash >> shift) & MASK
}

/// The occupancy bit for `hash` at level shift `shift`.
#[inline]
pub(crate) const fn level_bit(hash: u32, shift: u32) -> u32 {
    1 << level_index(hash, shift)
}

/// Position of `bit`'s slot in a packed children array: the number of
/// occupied slots below it.
#[inline]
pub(crate) const fn bit_position(bitmap: u32, bit: u32) -> usize {
    (bitmap & (bit - 1)).count_ones() as usize
}

// =============================================================================
// Tests
// =============================================================================
