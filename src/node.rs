//! Trie node variants and their edit protocol.
//!
//! The trie has two node kinds, realized as a tagged sum type with
//! match-dispatched operations:
//!
//! - [`Node::Bitmap`]: interior node with a 32-bit occupancy bitmap and a
//!   children array packed densely at popcount offsets. A child is either
//!   an inline leaf entry or a handle to a deeper subtree.
//! - [`Node::Collision`]: terminal node holding every entry whose full
//!   32-bit hash coincides; entries are searched linearly.
//!
//! Every node carries an optional [`OwnerToken`]. Write operations thread
//! the active owner (if any) through the trie: a node tagged with the
//! active owner is edited in place, any other node is replaced by a
//! shallow copy tagged with that owner. Persistent operations pass no
//! owner, so every touched node is copied — the path-copy write protocol.
//! Nodes whose owner is absent, or whose owner belongs to a finished
//! batch, are never mutated again.

use std::borrow::Borrow;
use std::hash::Hash;

use crate::ReferenceCounter;
use crate::hash::{BITS_PER_LEVEL, bit_position, hash_of, level_bit};

// =============================================================================
// Owner token
// =============================================================================

/// Identity-only tag authorizing in-place node edits during a batch.
///
/// Two tokens match only if they are the same allocation, and a fresh
/// token is allocated for every transient handle, so a token from a
/// finished batch can never reappear.
#[derive(Clone, Debug)]
pub(crate) struct OwnerToken(ReferenceCounter<()>);

impl OwnerToken {
    pub(crate) fn new() -> Self {
        Self(ReferenceCounter::new(()))
    }

    pub(crate) fn same(&self, other: &Self) -> bool {
        ReferenceCounter::ptr_eq(&self.0, &other.0)
    }
}

// =============================================================================
// Node definition
// =============================================================================

/// Internal node structure for the trie.
#[derive(Clone)]
pub(crate) enum Node<K, V> {
    /// Bitmap-indexed interior node; children packed at popcount offsets.
    Bitmap {
        owner: Option<OwnerToken>,
        bitmap: u32,
        children: Vec<Child<K, V>>,
    },
    /// All entries whose full hash equals `hash`.
    Collision {
        owner: Option<OwnerToken>,
        hash: u32,
        entries: Vec<(K, V)>,
    },
}

/// A slot in a bitmap node.
#[derive(Clone)]
pub(crate) enum Child<K, V> {
    /// An inline key-value entry.
    Leaf { key: K, value: V },
    /// A handle to a deeper subtree.
    Node(ReferenceCounter<Node<K, V>>),
}

/// Outcome of a delete walking a subtree.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub(crate) enum Removal {
    /// Key absent; the receiver is unchanged.
    Unchanged,
    /// The slot now holds an edited subtree.
    Edited,
    /// The subtree lost its last entry; the parent must splice it out.
    Emptied,
}

// =============================================================================
// Ownership
// =============================================================================

impl<K, V> Node<K, V> {
    fn owner(&self) -> Option<&OwnerToken> {
        match self {
            Self::Bitmap { owner, .. } | Self::Collision { owner, .. } => owner.as_ref(),
        }
    }

    /// Whether the active owner authorizes editing this node in place.
    fn is_owned_by(&self, owner: Option<&OwnerToken>) -> bool {
        match (self.owner(), owner) {
            (Some(tag), Some(token)) => tag.same(token),
            _ => false,
        }
    }
}

impl<K: Clone, V: Clone> Node<K, V> {
    /// Shallow copy carrying the active owner; child handles stay shared.
    fn shallow_copy(&self, owner: Option<OwnerToken>) -> Self {
        match self {
            Self::Bitmap {
                bitmap, children, ..
            } => Self::Bitmap {
                owner,
                bitmap: *bitmap,
                children: children.clone(),
            },
            Self::Collision { hash, entries, .. } => Self::Collision {
                owner,
                hash: *hash,
                entries: entries.clone(),
            },
        }
    }

    /// Returns the editable node behind `slot`: the node itself when the
    /// active owner matches its tag, otherwise a freshly installed shallow
    /// copy tagged with that owner.
    ///
    /// A node owned by the active batch is referenced only through its
    /// parent on the current path, so the in-place branch does not copy.
    fn make_editable<'a>(
        slot: &'a mut ReferenceCounter<Self>,
        owner: Option<&OwnerToken>,
    ) -> &'a mut Self {
        if !slot.is_owned_by(owner) {
            let copy = slot.shallow_copy(owner.cloned());
            *slot = ReferenceCounter::new(copy);
        }
        ReferenceCounter::make_mut(slot)
    }
}

// =============================================================================
// Lookup
// =============================================================================

impl<K, V> Node<K, V> {
    /// Finds the entry bound to `key` in the subtree rooted here.
    pub(crate) fn get_entry<'a, Q>(&'a self, shift: u32, hash: u32, key: &Q) -> Option<(&'a K, &'a V)>
    where
        K: Borrow<Q>,
        Q: Eq + ?Sized,
    {
        match self {
            Self::Bitmap {
                bitmap, children, ..
            } => {
                let bit = level_bit(hash, shift);
                if bitmap & bit == 0 {
                    return None;
                }
                match &children[bit_position(*bitmap, bit)] {
                    Child::Leaf { key: leaf_key, value } => {
                        (leaf_key.borrow() == key).then_some((leaf_key, value))
                    }
                    Child::Node(child) => child.get_entry(shift + BITS_PER_LEVEL, hash, key),
                }
            }
            Self::Collision {
                hash: collision_hash,
                entries,
                ..
            } => {
                if *collision_hash != hash {
                    return None;
                }
                entries
                    .iter()
                    .find(|(entry_key, _)| entry_key.borrow() == key)
                    .map(|(entry_key, value)| (entry_key, value))
            }
        }
    }
}

// =============================================================================
// Insert
// =============================================================================

impl<K: Clone + Hash + Eq, V: Clone + PartialEq> Node<K, V> {
    /// Root node for the first entry of a map.
    pub(crate) fn single_leaf(owner: Option<OwnerToken>, hash: u32, key: K, value: V) -> Self {
        Self::Bitmap {
            owner,
            bitmap: level_bit(hash, 0),
            children: vec![Child::Leaf { key, value }],
        }
    }

    /// Writes `(key, value)` into the subtree behind `slot`.
    ///
    /// Returns `true` when the subtree changed. `did_add` is set by the
    /// deepest successful edit when a new leaf was created (as opposed to
    /// overwriting an existing key), so the facade adjusts its length
    /// exactly once per logical operation. Binding an equal value to an
    /// existing key leaves the slot untouched.
    pub(crate) fn insert(
        slot: &mut ReferenceCounter<Self>,
        owner: Option<&OwnerToken>,
        shift: u32,
        hash: u32,
        key: K,
        value: V,
        did_add: &mut bool,
    ) -> bool {
        match &**slot {
            Self::Collision {
                hash: collision_hash,
                ..
            } if *collision_hash != hash => {
                // A differing hash can only reach a collision node that sits
                // one level below a bitmap slot: wrap it and retry the level.
                let wrapper = Self::Bitmap {
                    owner: owner.cloned(),
                    bitmap: level_bit(*collision_hash, shift),
                    children: vec![Child::Node(ReferenceCounter::clone(slot))],
                };
                *slot = ReferenceCounter::new(wrapper);
                Self::insert(slot, owner, shift, hash, key, value, did_add)
            }
            Self::Collision { entries, .. } => {
                match entries.iter().position(|(entry_key, _)| *entry_key == key) {
                    Some(index) if entries[index].1 == value => false,
                    Some(index) => {
                        if let Self::Collision { entries, .. } = Self::make_editable(slot, owner) {
                            entries[index].1 = value;
                        }
                        true
                    }
                    None => {
                        *did_add = true;
                        if let Self::Collision { entries, .. } = Self::make_editable(slot, owner) {
                            entries.push((key, value));
                        }
                        true
                    }
                }
            }
            Self::Bitmap {
                bitmap, children, ..
            } => {
                let bit = level_bit(hash, shift);
                let position = bit_position(*bitmap, bit);
                if bitmap & bit == 0 {
                    *did_add = true;
                    if let Self::Bitmap {
                        bitmap, children, ..
                    } = Self::make_editable(slot, owner)
                    {
                        *bitmap |= bit;
                        children.insert(position, Child::Leaf { key, value });
                    }
                    return true;
                }
                match &children[position] {
                    Child::Leaf {
                        key: leaf_key,
                        value: leaf_value,
                    } if *leaf_key == key => {
                        if *leaf_value == value {
                            return false;
                        }
                        if let Self::Bitmap { children, .. } = Self::make_editable(slot, owner) {
                            children[position] = Child::Leaf { key, value };
                        }
                        true
                    }
                    Child::Leaf {
                        key: leaf_key,
                        value: leaf_value,
                    } => {
                        // Two distinct keys in one slot: push the old leaf
                        // down into a collision node or a deeper bitmap chain.
                        *did_add = true;
                        let leaf_hash = hash_of(leaf_key);
                        let subtree = if leaf_hash == hash {
                            Self::Collision {
                                owner: owner.cloned(),
                                hash,
                                entries: vec![
                                    (leaf_key.clone(), leaf_value.clone()),
                                    (key, value),
                                ],
                            }
                        } else {
                            Self::join_leaves(
                                owner,
                                shift + BITS_PER_LEVEL,
                                leaf_hash,
                                leaf_key.clone(),
                                leaf_value.clone(),
                                hash,
                                key,
                                value,
                            )
                        };
                        if let Self::Bitmap { children, .. } = Self::make_editable(slot, owner) {
                            children[position] = Child::Node(ReferenceCounter::new(subtree));
                        }
                        true
                    }
                    Child::Node(child) => {
                        if slot.is_owned_by(owner) {
                            let mut changed = false;
                            if let Self::Bitmap { children, .. } = ReferenceCounter::make_mut(slot)
                                && let Child::Node(child_slot) = &mut children[position]
                            {
                                changed = Self::insert(
                                    child_slot,
                                    owner,
                                    shift + BITS_PER_LEVEL,
                                    hash,
                                    key,
                                    value,
                                    did_add,
                                );
                            }
                            changed
                        } else {
                            let mut new_child = ReferenceCounter::clone(child);
                            let changed = Self::insert(
                                &mut new_child,
                                owner,
                                shift + BITS_PER_LEVEL,
                                hash,
                                key,
                                value,
                                did_add,
                            );
                            if changed
                                && let Self::Bitmap { children, .. } =
                                    Self::make_editable(slot, owner)
                            {
                                children[position] = Child::Node(new_child);
                            }
                            changed
                        }
                    }
                }
            }
        }
    }

    /// Builds the subtree holding two leaves with differing hashes,
    /// starting at `shift`: single-slot bitmap nodes chain down while the
    /// two hashes agree on their level index.
    #[allow(clippy::too_many_arguments)]
    fn join_leaves(
        owner: Option<&OwnerToken>,
        shift: u32,
        first_hash: u32,
        first_key: K,
        first_value: V,
        second_hash: u32,
        second_key: K,
        second_value: V,
    ) -> Self {
        let first_bit = level_bit(first_hash, shift);
        let second_bit = level_bit(second_hash, shift);
        if first_bit == second_bit {
            let child = Self::join_leaves(
                owner,
                shift + BITS_PER_LEVEL,
                first_hash,
                first_key,
                first_value,
                second_hash,
                second_key,
                second_value,
            );
            Self::Bitmap {
                owner: owner.cloned(),
                bitmap: first_bit,
                children: vec![Child::Node(ReferenceCounter::new(child))],
            }
        } else {
            let first_leaf = Child::Leaf {
                key: first_key,
                value: first_value,
            };
            let second_leaf = Child::Leaf {
                key: second_key,
                value: second_value,
            };
            let children = if first_bit < second_bit {
                vec![first_leaf, second_leaf]
            } else {
                vec![second_leaf, first_leaf]
            };
            Self::Bitmap {
                owner: owner.cloned(),
                bitmap: first_bit | second_bit,
                children,
            }
        }
    }
}

// =============================================================================
// Remove
// =============================================================================

impl<K: Clone + Eq, V: Clone> Node<K, V> {
    /// Deletes `key` from the subtree behind `slot`.
    pub(crate) fn remove<Q>(
        slot: &mut ReferenceCounter<Self>,
        owner: Option<&OwnerToken>,
        shift: u32,
        hash: u32,
        key: &Q,
    ) -> Removal
    where
        K: Borrow<Q>,
        Q: Eq + ?Sized,
    {
        match &**slot {
            Self::Collision {
                hash: collision_hash,
                ..
            } if *collision_hash != hash => Removal::Unchanged,
            Self::Collision { entries, .. } => {
                let Some(index) = entries
                    .iter()
                    .position(|(entry_key, _)| entry_key.borrow() == key)
                else {
                    return Removal::Unchanged;
                };
                if entries.len() == 1 {
                    return Removal::Emptied;
                }
                if let Self::Collision { entries, .. } = Self::make_editable(slot, owner) {
                    entries.swap_remove(index);
                }
                Removal::Edited
            }
            Self::Bitmap {
                bitmap, children, ..
            } => {
                let bit = level_bit(hash, shift);
                if bitmap & bit == 0 {
                    return Removal::Unchanged;
                }
                let position = bit_position(*bitmap, bit);
                match &children[position] {
                    Child::Leaf { key: leaf_key, .. } => {
                        if leaf_key.borrow() == key {
                            Self::clear_slot(slot, owner, bit, position)
                        } else {
                            Removal::Unchanged
                        }
                    }
                    Child::Node(child) => {
                        if slot.is_owned_by(owner) {
                            let mut removal = Removal::Unchanged;
                            if let Self::Bitmap { children, .. } = ReferenceCounter::make_mut(slot)
                                && let Child::Node(child_slot) = &mut children[position]
                            {
                                removal = Self::remove(
                                    child_slot,
                                    owner,
                                    shift + BITS_PER_LEVEL,
                                    hash,
                                    key,
                                );
                            }
                            match removal {
                                Removal::Emptied => Self::clear_slot(slot, owner, bit, position),
                                other => other,
                            }
                        } else {
                            let mut new_child = ReferenceCounter::clone(child);
                            match Self::remove(&mut new_child, owner, shift + BITS_PER_LEVEL, hash, key)
                            {
                                Removal::Unchanged => Removal::Unchanged,
                                Removal::Edited => {
                                    if let Self::Bitmap { children, .. } =
                                        Self::make_editable(slot, owner)
                                    {
                                        children[position] = Child::Node(new_child);
                                    }
                                    Removal::Edited
                                }
                                Removal::Emptied => Self::clear_slot(slot, owner, bit, position),
                            }
                        }
                    }
                }
            }
        }
    }

    /// Removes one occupied slot from a bitmap node; reports `Emptied`
    /// when the removed slot was the last (the node must never exist with
    /// a zero bitmap).
    fn clear_slot(
        slot: &mut ReferenceCounter<Self>,
        owner: Option<&OwnerToken>,
        bit: u32,
        position: usize,
    ) -> Removal {
        if let Self::Bitmap { bitmap, .. } = &**slot
            && *bitmap == bit
        {
            return Removal::Emptied;
        }
        if let Self::Bitmap {
            bitmap, children, ..
        } = Self::make_editable(slot, owner)
        {
            *bitmap ^= bit;
            children.remove(position);
        }
        Removal::Edited
    }
}

// =============================================================================
// Iteration
// =============================================================================

impl<K, V> Node<K, V> {
    /// Walks the subtree in slot-index order (descending when `reverse`),
    /// visiting collision entries in stored order (reversed when
    /// requested). Returns `false` when `visit` short-circuited.
    pub(crate) fn for_each_while<'a, F>(&'a self, reverse: bool, visit: &mut F) -> bool
    where
        F: FnMut(&'a K, &'a V) -> bool,
    {
        match self {
            Self::Bitmap { children, .. } => {
                if reverse {
                    children
                        .iter()
                        .rev()
                        .all(|child| Self::visit_child(child, reverse, visit))
                } else {
                    children
                        .iter()
                        .all(|child| Self::visit_child(child, reverse, visit))
                }
            }
            Self::Collision { entries, .. } => {
                if reverse {
                    entries.iter().rev().all(|(key, value)| visit(key, value))
                } else {
                    entries.iter().all(|(key, value)| visit(key, value))
                }
            }
        }
    }

    fn visit_child<'a, F>(child: &'a Child<K, V>, reverse: bool, visit: &mut F) -> bool
    where
        F: FnMut(&'a K, &'a V) -> bool,
    {
        match child {
            Child::Leaf { key, value } => visit(key, value),
            Child::Node(node) => node.for_each_while(reverse, visit),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
