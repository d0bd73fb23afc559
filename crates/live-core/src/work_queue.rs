//! Per-item pending operations and the queue that coalesces them.
//!
//! Every item touched during a pass owns exactly one [`PendingOperation`]. A
//! later edit against the same item appends its [`Effect`]s to the existing
//! list instead of creating a second operation, so each item receives a single
//! ordered sequence of physical changes per flush.

use std::cell::RefCell;
use std::fmt;

use crate::arena::ItemArena;
use crate::collections::map::HashMap;
use crate::{ApplyError, ItemId, RenderSurface, RenderedItem};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    Attach,
    Detach,
    Remove,
    Update,
}

/// One physical step applied to an item during a flush.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect<V> {
    InsertAt { index: usize },
    DetachAt { index: usize },
    Destroy,
    SetValue(V),
    StampIndex { index: usize },
    Refresh,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingOperation<V> {
    pub ordinal: usize,
    pub kind: OperationKind,
    pub effects: Vec<Effect<V>>,
}

pub struct WorkQueue<V> {
    operations: HashMap<ItemId, PendingOperation<V>>, // FUTURE(no_std): replace HashMap with a slab keyed by item slot.
}

impl<V> Default for WorkQueue<V> {
    fn default() -> Self {
        Self {
            operations: HashMap::default(),
        }
    }
}

impl<V> WorkQueue<V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    pub fn get(&self, item: ItemId) -> Option<&PendingOperation<V>> {
        self.operations.get(&item)
    }

    pub fn contains(&self, item: ItemId) -> bool {
        self.operations.contains_key(&item)
    }

    pub fn clear(&mut self) {
        self.operations.clear();
    }

    fn next_ordinal(&self) -> usize {
        self.operations.len() + 1
    }

    /// Queues `effects` for `item`, after anything already queued for it.
    ///
    /// The kind is replaced by `kind`; the ordinal of an existing entry is
    /// kept. Returns the entry's ordinal.
    pub fn enqueue(
        &mut self,
        item: ItemId,
        kind: OperationKind,
        effects: impl IntoIterator<Item = Effect<V>>,
    ) -> usize {
        let ordinal = self.next_ordinal();
        let operation = self
            .operations
            .entry(item)
            .or_insert_with(|| PendingOperation {
                ordinal,
                kind,
                effects: Vec::new(),
            });
        operation.kind = kind;
        operation.effects.extend(effects);
        operation.ordinal
    }

    /// Stamps `index` onto `item` ahead of its queued effects.
    ///
    /// The operation becomes an `Update` either way. An item without queued
    /// work gets a fresh operation that also refreshes it; queued work is
    /// expected to refresh on its own.
    pub fn stamp_index(&mut self, item: ItemId, index: usize) -> usize {
        let ordinal = self.next_ordinal();
        match self.operations.get_mut(&item) {
            Some(operation) => {
                operation.kind = OperationKind::Update;
                operation.effects.insert(0, Effect::StampIndex { index });
                operation.ordinal
            }
            None => {
                self.operations.insert(
                    item,
                    PendingOperation {
                        ordinal,
                        kind: OperationKind::Update,
                        effects: vec![Effect::StampIndex { index }, Effect::Refresh],
                    },
                );
                ordinal
            }
        }
    }

    /// Operations in the order their items were first touched.
    pub fn sorted(&self) -> Vec<(ItemId, &PendingOperation<V>)> {
        let mut entries: Vec<_> = self.operations.iter().map(|(id, op)| (*id, op)).collect();
        entries.sort_by_key(|(_, op)| op.ordinal);
        entries
    }
}

impl<V: fmt::Debug> fmt::Debug for WorkQueue<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.sorted().into_iter().map(|(id, op)| {
                (id, (op.ordinal, op.kind, &op.effects))
            }))
            .finish()
    }
}

/// Applies `effects` to `item`, stopping at the first failure.
pub(crate) fn apply_effects<S, I>(
    surface: &RefCell<S>,
    items: &RefCell<ItemArena<I>>,
    item: ItemId,
    effects: Vec<Effect<I::Value>>,
) -> Result<(), ApplyError>
where
    S: RenderSurface + ?Sized,
    I: RenderedItem,
{
    let mut destroyed = false;
    let result = effects
        .into_iter()
        .try_for_each(|effect| apply_effect(surface, items, item, effect, &mut destroyed));
    if destroyed {
        items.borrow_mut().remove(item);
    }
    result
}

fn apply_effect<S, I>(
    surface: &RefCell<S>,
    items: &RefCell<ItemArena<I>>,
    item: ItemId,
    effect: Effect<I::Value>,
    destroyed: &mut bool,
) -> Result<(), ApplyError>
where
    S: RenderSurface + ?Sized,
    I: RenderedItem,
{
    match effect {
        Effect::InsertAt { index } => surface.borrow_mut().insert(item, index),
        Effect::DetachAt { index } => {
            let mut surface = surface.borrow_mut();
            if surface.get(index) == Some(item) {
                return surface.detach(index).map(|_| ());
            }
            // Earlier work in this flush shifted the item away from `index`.
            let actual = surface
                .position_of(item)
                .ok_or(ApplyError::NotAttached { id: item })?;
            log::debug!("detach {item}: expected at {index}, found at {actual}");
            surface.detach(actual).map(|_| ())
        }
        Effect::Destroy => {
            items.borrow_mut().get_mut(item)?.destroy();
            *destroyed = true;
            Ok(())
        }
        Effect::SetValue(value) => {
            items.borrow_mut().get_mut(item)?.set_value(value);
            Ok(())
        }
        Effect::StampIndex { index } => {
            items.borrow_mut().get_mut(item)?.set_index(index);
            Ok(())
        }
        Effect::Refresh => items
            .borrow_mut()
            .get_mut(item)?
            .refresh()
            .map_err(|source| ApplyError::ItemFailed { id: item, source }),
    }
}

#[cfg(test)]
#[path = "tests/work_queue_tests.rs"]
mod tests;
