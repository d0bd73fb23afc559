use crate::{ItemId, RenderSurface};

/// Speculative ordering of the rendered items.
///
/// During a pass this reflects the target arrangement, ahead of the surface.
/// Tail pushes and removals are O(1); everything else shifts.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PositionalMirror {
    items: Vec<ItemId>,
}

impl PositionalMirror {
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Rebuilds the mirror from the surface's current contents.
    pub fn capture<S: RenderSurface + ?Sized>(surface: &S) -> Self {
        let items = (0..surface.len())
            .filter_map(|index| surface.get(index))
            .collect();
        Self { items }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<ItemId> {
        self.items.get(index).copied()
    }

    pub fn as_slice(&self) -> &[ItemId] {
        &self.items
    }

    pub fn iter(&self) -> impl Iterator<Item = ItemId> + '_ {
        self.items.iter().copied()
    }

    /// Panics if `index > len`.
    pub fn insert(&mut self, index: usize, item: ItemId) {
        let len = self.items.len();
        assert!(index <= len, "index {index} out of bounds for mirror of length {len}");
        if index == len {
            self.items.push(item);
        } else {
            self.items.insert(index, item);
        }
    }

    /// Panics if `index >= len`.
    pub fn remove(&mut self, index: usize) -> ItemId {
        let len = self.items.len();
        assert!(index < len, "index {index} out of bounds for mirror of length {len}");
        // Removing the last element shifts nothing.
        self.items.remove(index)
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}
