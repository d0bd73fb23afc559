//! Platform abstraction traits for the reconciler's deferred work.
//!
//! The collection never runs its side effects directly. It hands each unit of
//! work to a [`WorkScheduler`] supplied by the host, which decides when and
//! in which context the work executes.

use std::rc::Rc;

use crate::ApplyError;

/// A deferred unit of work produced by a flush.
pub type Work = Box<dyn FnOnce() -> Result<(), ApplyError> + 'static>;

/// Hint passed along with every dispatched unit.
///
/// Schedulers are free to interpret these however they like; the variants are
/// ordered from most to least urgent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum Strategy {
    /// Run inside the dispatch call.
    Native,
    Immediate,
    UserBlocking,
    #[default]
    Normal,
    Low,
    Idle,
}

impl Strategy {
    pub fn name(self) -> &'static str {
        match self {
            Strategy::Native => "native",
            Strategy::Immediate => "immediate",
            Strategy::UserBlocking => "userBlocking",
            Strategy::Normal => "normal",
            Strategy::Low => "low",
            Strategy::Idle => "idle",
        }
    }
}

/// Executes deferred work on behalf of a live collection.
pub trait WorkScheduler {
    /// Token handed back for every dispatched unit.
    type Token;

    /// Accept `work` for execution under `strategy`.
    ///
    /// Units must run in the order they were dispatched when they share a
    /// strategy.
    fn dispatch(&self, strategy: Strategy, work: Work) -> Self::Token;
}

impl<T: WorkScheduler + ?Sized> WorkScheduler for Rc<T> {
    type Token = T::Token;

    fn dispatch(&self, strategy: Strategy, work: Work) -> Self::Token {
        (**self).dispatch(strategy, work)
    }
}

/// Provides timing information for budgeted schedulers.
pub trait Clock {
    /// Instant type produced by this clock implementation.
    type Instant: Copy;

    /// Returns the current instant.
    fn now(&self) -> Self::Instant;

    /// Returns the number of milliseconds elapsed since `since`.
    fn elapsed_millis(&self, since: Self::Instant) -> u64;
}
