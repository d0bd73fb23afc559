#![doc = r"Core pieces of the live collection reconciler."]

pub mod arena;
pub mod collections;
pub mod live_collection;
pub mod mirror;
pub mod platform;
pub mod queued;
pub mod runtime;
pub mod work_queue;

pub use arena::ItemArena;
pub use live_collection::LiveCollection;
pub use mirror::PositionalMirror;
pub use platform::{Clock, Strategy, Work, WorkScheduler};
pub use queued::{LiveCollectionOptions, QueuedLiveCollection};
pub use runtime::{DispatchHandle, DispatchState, ImmediateScheduler, RecordingScheduler};
pub use work_queue::{Effect, OperationKind, PendingOperation, WorkQueue};

use std::fmt;

/// Stable identity of one rendered item.
///
/// Ids are handed out by [`ItemArena`] and stay valid across reordering; two
/// items holding equal values still have distinct ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ItemId(pub(crate) usize);

impl ItemId {
    #[inline]
    pub fn new(raw: usize) -> Self {
        Self(raw)
    }

    #[inline]
    pub fn raw(self) -> usize {
        self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Failure reported by a [`RenderedItem`] primitive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemError(pub String);

impl ItemError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

impl fmt::Display for ItemError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for ItemError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyError {
    OutOfBounds { index: usize, len: usize },
    MissingItem { id: ItemId },
    NotAttached { id: ItemId },
    ItemFailed { id: ItemId, source: ItemError },
}

impl fmt::Display for ApplyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApplyError::OutOfBounds { index, len } => {
                write!(f, "index {index} out of bounds for surface of length {len}")
            }
            ApplyError::MissingItem { id } => write!(f, "item {id} missing"),
            ApplyError::NotAttached { id } => write!(f, "item {id} is not attached"),
            ApplyError::ItemFailed { id, source } => write!(f, "item {id} failed: {source}"),
        }
    }
}

impl std::error::Error for ApplyError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ApplyError::ItemFailed { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// A rendered unit owned by the collection's [`ItemArena`].
///
/// The payload and index are plain fields from the engine's point of view;
/// `refresh` is where an implementation makes pending changes observable.
pub trait RenderedItem {
    type Value;

    fn value(&self) -> &Self::Value;
    fn set_value(&mut self, value: Self::Value);
    fn index(&self) -> usize;
    fn set_index(&mut self, index: usize);
    fn refresh(&mut self) -> Result<(), ItemError> {
        Ok(())
    }
    fn destroy(&mut self) {}
}

/// The physical, ordered container rendered items are attached to.
pub trait RenderSurface {
    fn len(&self) -> usize;
    fn get(&self, index: usize) -> Option<ItemId>;
    fn insert(&mut self, item: ItemId, index: usize) -> Result<(), ApplyError>;
    fn detach(&mut self, index: usize) -> Result<ItemId, ApplyError>;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn position_of(&self, item: ItemId) -> Option<usize> {
        (0..self.len()).find(|&index| self.get(index) == Some(item))
    }
}

/// Builds a new rendered item for `value` destined for `index`.
pub trait ItemFactory<I: RenderedItem> {
    fn create(&mut self, index: usize, value: I::Value) -> I;
}

impl<I, F> ItemFactory<I> for F
where
    I: RenderedItem,
    F: FnMut(usize, I::Value) -> I,
{
    fn create(&mut self, index: usize, value: I::Value) -> I {
        self(index, value)
    }
}

#[derive(Debug, Default, Clone)]
pub struct MemorySurface {
    items: Vec<ItemId>,
}

impl MemorySurface {
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    pub fn items(&self) -> &[ItemId] {
        &self.items
    }

    pub fn dump(&self) -> String {
        let ids: Vec<String> = self.items.iter().map(ItemId::to_string).collect();
        format!("[{}]", ids.join(", "))
    }
}

impl RenderSurface for MemorySurface {
    fn len(&self) -> usize {
        self.items.len()
    }

    fn get(&self, index: usize) -> Option<ItemId> {
        self.items.get(index).copied()
    }

    fn insert(&mut self, item: ItemId, index: usize) -> Result<(), ApplyError> {
        let len = self.items.len();
        if index > len {
            return Err(ApplyError::OutOfBounds { index, len });
        }
        self.items.insert(index, item);
        Ok(())
    }

    fn detach(&mut self, index: usize) -> Result<ItemId, ApplyError> {
        let len = self.items.len();
        if index >= len {
            return Err(ApplyError::OutOfBounds { index, len });
        }
        Ok(self.items.remove(index))
    }

    fn position_of(&self, item: ItemId) -> Option<usize> {
        self.items.iter().position(|candidate| *candidate == item)
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
