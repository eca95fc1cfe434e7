//! Specialized collection types

use slotmap::{new_key_type, SecondaryMap, SlotMap};

new_key_type! {
    /// Stable, generation-tagged handle to a fine sphere
    ///
    /// Survives deletions of other fine spheres; a handle to a deleted sphere
    /// never resolves to a different one.
    pub struct FineKey;
}

/// Slot map that also keeps its live entries in insertion order
///
/// Positional indices are derived from the order vector, so removing an entry
/// shifts the positions of later entries down by one while their keys stay
/// valid.
#[derive(Debug, Clone)]
pub struct OrderedSlotMap<T> {
    slots: SlotMap<FineKey, T>,
    order: Vec<FineKey>,
    positions: SecondaryMap<FineKey, usize>,
}

impl<T> OrderedSlotMap<T> {
    /// Create an empty map
    pub fn new() -> Self {
        Self {
            slots: SlotMap::with_key(),
            order: Vec::new(),
            positions: SecondaryMap::new(),
        }
    }

    /// Number of live entries
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// True when there are no entries
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Append an item and return its key
    pub fn push(&mut self, item: T) -> FineKey {
        let key = self.slots.insert(item);
        self.positions.insert(key, self.order.len());
        self.order.push(key);
        key
    }

    /// Remove the entry at `position`, returning its key and value
    pub fn remove_at(&mut self, position: usize) -> Option<(FineKey, T)> {
        if position >= self.order.len() {
            return None;
        }
        let key = self.order.remove(position);
        self.positions.remove(key);
        for (offset, later) in self.order[position..].iter().enumerate() {
            self.positions.insert(*later, position + offset);
        }
        self.slots.remove(key).map(|item| (key, item))
    }

    /// Key at a position
    pub fn key_at(&self, position: usize) -> Option<FineKey> {
        self.order.get(position).copied()
    }

    /// Position of a key, `None` if the key is stale
    pub fn position_of(&self, key: FineKey) -> Option<usize> {
        self.positions.get(key).copied()
    }

    /// Item at a position
    pub fn get_at(&self, position: usize) -> Option<&T> {
        self.key_at(position).and_then(|key| self.slots.get(key))
    }

    /// Mutable item at a position
    pub fn get_at_mut(&mut self, position: usize) -> Option<&mut T> {
        let key = self.key_at(position)?;
        self.slots.get_mut(key)
    }

    /// Item by key
    pub fn get(&self, key: FineKey) -> Option<&T> {
        self.slots.get(key)
    }

    /// Keys in positional order
    pub fn keys(&self) -> &[FineKey] {
        &self.order
    }

    /// Items in positional order
    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        self.order.iter().filter_map(move |key| self.slots.get(*key))
    }

    /// Mutable items (order unspecified)
    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut T> + '_ {
        self.slots.values_mut()
    }

    /// Remove every entry
    pub fn clear(&mut self) {
        self.slots.clear();
        self.order.clear();
        self.positions.clear();
    }
}

impl<T> Default for OrderedSlotMap<T> {
    fn default() -> Self {
        Self::new()
    }
}
