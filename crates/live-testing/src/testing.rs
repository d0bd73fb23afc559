//! Journaling items, a recording scheduler and a ready-made collection.
//!
//! Everything observable about a flush ends up in a shared [`Journal`], so
//! tests can assert on the exact order in which items were refreshed and
//! destroyed.

use std::cell::RefCell;
use std::rc::Rc;

use live_core::{
    ApplyError, ItemError, ItemFactory, ItemId, LiveCollectionOptions, MemorySurface,
    QueuedLiveCollection, RenderSurface, RenderedItem, WorkScheduler,
};

pub use live_core::RecordingScheduler;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JournalEntry<V> {
    Refreshed { value: V, index: usize },
    Destroyed { value: V },
}

#[derive(Debug)]
pub struct Journal<V> {
    entries: Rc<RefCell<Vec<JournalEntry<V>>>>,
}

impl<V> Clone for Journal<V> {
    fn clone(&self) -> Self {
        Self {
            entries: Rc::clone(&self.entries),
        }
    }
}

impl<V> Default for Journal<V> {
    fn default() -> Self {
        Self {
            entries: Rc::new(RefCell::new(Vec::new())),
        }
    }
}

impl<V: Clone> Journal<V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, entry: JournalEntry<V>) {
        self.entries.borrow_mut().push(entry);
    }

    pub fn entries(&self) -> Vec<JournalEntry<V>> {
        self.entries.borrow().clone()
    }

    /// Returns and clears everything recorded so far.
    pub fn take(&self) -> Vec<JournalEntry<V>> {
        std::mem::take(&mut *self.entries.borrow_mut())
    }

    pub fn refreshed_values(&self) -> Vec<V> {
        self.entries
            .borrow()
            .iter()
            .filter_map(|entry| match entry {
                JournalEntry::Refreshed { value, .. } => Some(value.clone()),
                JournalEntry::Destroyed { .. } => None,
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}

/// Rendered item that writes every refresh and destroy to a [`Journal`].
#[derive(Debug)]
pub struct JournalItem<V> {
    value: V,
    index: usize,
    journal: Journal<V>,
    fail_refresh: bool,
    destroyed: bool,
}

impl<V> JournalItem<V> {
    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    pub fn fail_refresh(&mut self, fail: bool) {
        self.fail_refresh = fail;
    }
}

impl<V: Clone> RenderedItem for JournalItem<V> {
    type Value = V;

    fn value(&self) -> &V {
        &self.value
    }

    fn set_value(&mut self, value: V) {
        self.value = value;
    }

    fn index(&self) -> usize {
        self.index
    }

    fn set_index(&mut self, index: usize) {
        self.index = index;
    }

    fn refresh(&mut self) -> Result<(), ItemError> {
        if self.fail_refresh {
            return Err(ItemError::new(format!(
                "refresh rejected at index {}",
                self.index
            )));
        }
        self.journal.record(JournalEntry::Refreshed {
            value: self.value.clone(),
            index: self.index,
        });
        Ok(())
    }

    fn destroy(&mut self) {
        self.destroyed = true;
        self.journal.record(JournalEntry::Destroyed {
            value: self.value.clone(),
        });
    }
}

/// Builds [`JournalItem`]s sharing one journal.
///
/// Values matching the optional failure predicate produce items whose refresh
/// fails.
pub struct JournalFactory<V> {
    journal: Journal<V>,
    fails: Option<Box<dyn Fn(&V) -> bool>>,
}

impl<V: Clone> JournalFactory<V> {
    pub fn new(journal: Journal<V>) -> Self {
        Self {
            journal,
            fails: None,
        }
    }

    pub fn failing_when(mut self, predicate: impl Fn(&V) -> bool + 'static) -> Self {
        self.fails = Some(Box::new(predicate));
        self
    }
}

impl<V: Clone> ItemFactory<JournalItem<V>> for JournalFactory<V> {
    fn create(&mut self, index: usize, value: V) -> JournalItem<V> {
        let fail_refresh = self.fails.as_ref().is_some_and(|fails| fails(&value));
        JournalItem {
            value,
            index,
            journal: self.journal.clone(),
            fail_refresh,
            destroyed: false,
        }
    }
}

pub type TestCollection<V> =
    QueuedLiveCollection<MemorySurface, JournalItem<V>, JournalFactory<V>, Rc<RecordingScheduler>>;

pub struct Harness<V: Clone + 'static> {
    pub collection: TestCollection<V>,
    pub scheduler: Rc<RecordingScheduler>,
    pub journal: Journal<V>,
}

impl<V: Clone + 'static> Harness<V> {
    pub fn new() -> Self {
        Self::with_factory(JournalFactory::new, LiveCollectionOptions::default())
    }

    pub fn with_options(options: LiveCollectionOptions) -> Self {
        Self::with_factory(JournalFactory::new, options)
    }

    pub fn with_factory(
        factory: impl FnOnce(Journal<V>) -> JournalFactory<V>,
        options: LiveCollectionOptions,
    ) -> Self {
        let journal = Journal::new();
        let scheduler = Rc::new(RecordingScheduler::new());
        let mut collection = QueuedLiveCollection::with_options(
            Rc::new(RefCell::new(MemorySurface::new())),
            factory(journal.clone()),
            Rc::clone(&scheduler),
            options,
        );
        collection.reset();
        Self {
            collection,
            scheduler,
            journal,
        }
    }

    /// Values of the attached items, in surface order.
    pub fn rendered(&self) -> Vec<V> {
        rendered_values(&self.collection)
    }

    /// Flushes the pass, runs every dispatched unit and starts the next pass.
    pub fn finish_pass(&mut self) -> Vec<Result<(), ApplyError>> {
        self.collection.flush();
        let results = self.scheduler.run_all();
        self.collection.reset();
        results
    }
}

impl<V: Clone + 'static> Default for Harness<V> {
    fn default() -> Self {
        Self::new()
    }
}

/// Reads the values currently attached to a collection's surface.
pub fn rendered_values<S, I, F, P>(collection: &QueuedLiveCollection<S, I, F, P>) -> Vec<I::Value>
where
    S: RenderSurface + 'static,
    I: RenderedItem + 'static,
    I::Value: Clone + 'static,
    F: ItemFactory<I>,
    P: WorkScheduler,
{
    attached_ids(&*collection.surface().borrow())
        .into_iter()
        .filter_map(|id| collection.with_item(id, |item| item.value().clone()))
        .collect()
}

pub fn attached_ids<S: RenderSurface + ?Sized>(surface: &S) -> Vec<ItemId> {
    (0..surface.len())
        .filter_map(|index| surface.get(index))
        .collect()
}
