//! Slab storage for rendered items.
//!
//! Items are addressed by [`ItemId`], which is the slot index. Released slots
//! are recycled, so an id only identifies an item while that item is alive.

use crate::{ApplyError, ItemId};

pub struct ItemArena<I> {
    slots: Vec<Option<I>>,
    free: Vec<usize>,
}

impl<I> Default for ItemArena<I> {
    fn default() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
        }
    }
}

impl<I> ItemArena<I> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, item: I) -> ItemId {
        match self.free.pop() {
            Some(slot) => {
                self.slots[slot] = Some(item);
                ItemId(slot)
            }
            None => {
                self.slots.push(Some(item));
                ItemId(self.slots.len() - 1)
            }
        }
    }

    pub fn get(&self, id: ItemId) -> Option<&I> {
        self.slots.get(id.0).and_then(Option::as_ref)
    }

    pub fn get_mut(&mut self, id: ItemId) -> Result<&mut I, ApplyError> {
        self.slots
            .get_mut(id.0)
            .and_then(Option::as_mut)
            .ok_or(ApplyError::MissingItem { id })
    }

    pub fn remove(&mut self, id: ItemId) -> Option<I> {
        let item = self.slots.get_mut(id.0)?.take()?;
        self.free.push(id.0);
        Some(item)
    }

    pub fn contains(&self, id: ItemId) -> bool {
        self.get(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
