//! Work-queue backed [`LiveCollection`].
//!
//! [`QueuedLiveCollection`] keeps a [`PositionalMirror`] of the rendered items
//! and records every edit as effects in a [`WorkQueue`] instead of touching the
//! surface. A pass looks like this:
//!
//! 1. [`reset`](QueuedLiveCollection::reset) captures the surface,
//! 2. a diff calls the [`LiveCollection`] operations,
//! 3. [`update_indexes`](QueuedLiveCollection::update_indexes) stamps positions
//!    if anything moved in the middle of the list,
//! 4. [`exhaust`](QueuedLiveCollection::exhaust) hands one unit of work per
//!    touched item to the scheduler, in the order the items were first touched.

use std::cell::RefCell;
use std::rc::Rc;

use crate::arena::ItemArena;
use crate::live_collection::LiveCollection;
use crate::mirror::PositionalMirror;
use crate::platform::{Strategy, WorkScheduler};
use crate::work_queue::{apply_effects, Effect, OperationKind, PendingOperation, WorkQueue};
use crate::{ItemFactory, ItemId, RenderSurface, RenderedItem};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LiveCollectionOptions {
    /// Strategy every flushed unit is dispatched with.
    pub strategy: Strategy,
    /// Stamp indexes on every pass, not only after interior edits.
    pub force_index_update: bool,
}

pub struct QueuedLiveCollection<S, I, F, P>
where
    I: RenderedItem,
{
    surface: Rc<RefCell<S>>,
    items: Rc<RefCell<ItemArena<I>>>, // FUTURE(no_std): replace Rc with arena-managed storage.
    factory: F,
    scheduler: P,
    options: LiveCollectionOptions,
    mirror: PositionalMirror,
    queue: WorkQueue<I::Value>,
    needs_index_update: bool,
    captured: bool,
}

impl<S, I, F, P> QueuedLiveCollection<S, I, F, P>
where
    S: RenderSurface + 'static,
    I: RenderedItem + 'static,
    I::Value: Clone + 'static,
    F: ItemFactory<I>,
    P: WorkScheduler,
{
    pub fn new(surface: Rc<RefCell<S>>, factory: F, scheduler: P) -> Self {
        Self::with_options(surface, factory, scheduler, LiveCollectionOptions::default())
    }

    pub fn with_options(
        surface: Rc<RefCell<S>>,
        factory: F,
        scheduler: P,
        options: LiveCollectionOptions,
    ) -> Self {
        Self {
            surface,
            items: Rc::new(RefCell::new(ItemArena::new())),
            factory,
            scheduler,
            options,
            mirror: PositionalMirror::new(),
            queue: WorkQueue::new(),
            needs_index_update: false,
            captured: false,
        }
    }

    pub fn options(&self) -> LiveCollectionOptions {
        self.options
    }

    pub fn set_options(&mut self, options: LiveCollectionOptions) {
        self.options = options;
    }

    pub fn surface(&self) -> Rc<RefCell<S>> {
        Rc::clone(&self.surface)
    }

    pub fn items(&self) -> Rc<RefCell<ItemArena<I>>> {
        Rc::clone(&self.items)
    }

    pub fn scheduler(&self) -> &P {
        &self.scheduler
    }

    pub fn mirror(&self) -> &[ItemId] {
        self.mirror.as_slice()
    }

    pub fn needs_index_update(&self) -> bool {
        self.needs_index_update
    }

    pub fn pending(&self, item: ItemId) -> Option<&PendingOperation<I::Value>> {
        self.queue.get(item)
    }

    pub fn pending_len(&self) -> usize {
        self.queue.len()
    }

    pub fn work_queue(&self) -> &WorkQueue<I::Value> {
        &self.queue
    }

    /// Runs `f` against a live item, if it still exists.
    pub fn with_item<R>(&self, item: ItemId, f: impl FnOnce(&I) -> R) -> Option<R> {
        self.items.borrow().get(item).map(f)
    }

    /// Starts a new pass: drops queued work and re-reads the surface.
    ///
    /// Work dispatched by the previous pass may not have run yet; the mirror
    /// reflects whatever the surface holds right now.
    pub fn reset(&mut self) {
        self.queue.clear();
        self.mirror = PositionalMirror::capture(&*self.surface.borrow());
        self.needs_index_update = false;
        self.captured = true;
        log::trace!("reset: captured {} items", self.mirror.len());
    }

    /// Stamps the current position onto every mirrored item when an interior
    /// attach or detach made the stored indexes stale.
    pub fn update_indexes(&mut self) {
        if !self.needs_index_update && !self.options.force_index_update {
            return;
        }
        log::debug!("update_indexes: stamping {} items", self.mirror.len());
        for (index, item) in self.mirror.iter().enumerate() {
            self.queue.stamp_index(item, index);
        }
    }

    /// Dispatches the queued work in ordinal order.
    ///
    /// The queue is left intact; the next [`reset`](Self::reset) clears it.
    pub fn exhaust(&self) -> Vec<P::Token> {
        let operations = self.queue.sorted();
        log::debug!(
            "exhaust: dispatching {} operations as {}",
            operations.len(),
            self.options.strategy.name()
        );
        operations
            .into_iter()
            .map(|(item, operation)| {
                log::trace!(
                    "exec order {} for {item} ({:?})",
                    operation.ordinal,
                    operation.kind
                );
                let surface = Rc::clone(&self.surface);
                let items = Rc::clone(&self.items);
                let effects = operation.effects.clone();
                self.scheduler.dispatch(
                    self.options.strategy,
                    Box::new(move || apply_effects(&*surface, &*items, item, effects)),
                )
            })
            .collect()
    }

    /// `update_indexes` followed by `exhaust`.
    pub fn flush(&mut self) -> Vec<P::Token> {
        self.update_indexes();
        self.exhaust()
    }

    /// Resolves `index` against the mirror. The surface is only consulted
    /// before the first [`reset`](Self::reset) has captured it.
    fn get_view(&self, index: usize) -> ItemId {
        let len = self.mirror.len();
        let found = if self.captured {
            self.mirror.get(index)
        } else {
            self.mirror
                .get(index)
                .or_else(|| self.surface.borrow().get(index))
        };
        found.unwrap_or_else(|| {
            panic!("index {index} out of bounds for collection of length {len}")
        })
    }
}

impl<S, I, F, P> LiveCollection for QueuedLiveCollection<S, I, F, P>
where
    S: RenderSurface + 'static,
    I: RenderedItem + 'static,
    I::Value: Clone + 'static,
    F: ItemFactory<I>,
    P: WorkScheduler,
{
    type Handle = ItemId;
    type Value = I::Value;

    fn length(&self) -> usize {
        self.mirror.len()
    }

    fn at(&self, index: usize) -> Self::Value {
        let item = self.get_view(index);
        self.with_item(item, |item| item.value().clone())
            .unwrap_or_else(|| panic!("item {item} at index {index} was already destroyed"))
    }

    fn attach(&mut self, index: usize, item: ItemId) {
        let len = self.mirror.len();
        assert!(
            index <= len,
            "attach index {index} out of bounds for collection of length {len}"
        );
        self.needs_index_update |= index != len;
        self.mirror.insert(index, item);
        let ordinal = self.queue.enqueue(
            item,
            OperationKind::Attach,
            [Effect::InsertAt { index }, Effect::Refresh],
        );
        log::trace!("attach {item} at {index} (ordinal {ordinal})");
    }

    fn detach(&mut self, index: usize) -> ItemId {
        let len = self.mirror.len();
        assert!(
            index < len,
            "detach index {index} out of bounds for collection of length {len}"
        );
        self.needs_index_update |= index + 1 != len;
        let item = self.mirror.remove(index);
        let ordinal = self
            .queue
            .enqueue(item, OperationKind::Detach, [Effect::DetachAt { index }]);
        log::trace!("detach {item} from {index} (ordinal {ordinal})");
        item
    }

    fn create(&mut self, index: usize, value: Self::Value) -> ItemId {
        let item = self.factory.create(index, value);
        let id = self.items.borrow_mut().insert(item);
        log::trace!("create {id} for index {index}");
        id
    }

    fn destroy(&mut self, item: ItemId) {
        let ordinal = self.queue.enqueue(
            item,
            OperationKind::Remove,
            [Effect::Destroy, Effect::Refresh],
        );
        log::trace!("destroy {item} (ordinal {ordinal})");
    }

    fn update_value(&mut self, index: usize, value: Self::Value) {
        let item = self.get_view(index);
        let ordinal = self.queue.enqueue(
            item,
            OperationKind::Update,
            [Effect::SetValue(value), Effect::Refresh],
        );
        log::trace!("update_value {item} at {index} (ordinal {ordinal})");
    }
}

#[cfg(test)]
#[path = "tests/queued_tests.rs"]
mod tests;
