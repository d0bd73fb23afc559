use std::cell::RefCell;
use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll, Waker};

use crate::platform::{Strategy, Work, WorkScheduler};
use crate::ApplyError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchState {
    Pending,
    Completed,
    Failed(ApplyError),
    Cancelled,
}

impl DispatchState {
    pub fn is_settled(&self) -> bool {
        !matches!(self, DispatchState::Pending)
    }
}

struct DispatchCell {
    state: RefCell<DispatchState>,
    waker: RefCell<Option<Waker>>,
}

/// Shared completion slot for one dispatched unit of work.
///
/// The scheduler keeps one clone and settles it; the caller may keep another
/// to inspect, cancel or await the outcome.
#[derive(Clone)]
pub struct DispatchHandle {
    inner: Rc<DispatchCell>, // FUTURE(no_std): replace Rc with arena-managed slots.
}

impl DispatchHandle {
    pub fn pending() -> Self {
        Self {
            inner: Rc::new(DispatchCell {
                state: RefCell::new(DispatchState::Pending),
                waker: RefCell::new(None),
            }),
        }
    }

    pub fn settled(result: Result<(), ApplyError>) -> Self {
        let handle = Self::pending();
        handle.complete(result);
        handle
    }

    pub fn state(&self) -> DispatchState {
        self.inner.state.borrow().clone()
    }

    pub fn is_pending(&self) -> bool {
        !self.inner.state.borrow().is_settled()
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(*self.inner.state.borrow(), DispatchState::Cancelled)
    }

    /// Records the outcome of the unit. Ignored once the handle is settled.
    pub fn complete(&self, result: Result<(), ApplyError>) {
        let next = match result {
            Ok(()) => DispatchState::Completed,
            Err(err) => DispatchState::Failed(err),
        };
        self.settle(next);
    }

    /// Cancels a pending unit so its work never runs.
    ///
    /// Returns `false` if the unit already ran or was cancelled before.
    pub fn cancel(&self) -> bool {
        self.settle(DispatchState::Cancelled)
    }

    fn settle(&self, next: DispatchState) -> bool {
        {
            let mut state = self.inner.state.borrow_mut();
            if state.is_settled() {
                return false;
            }
            *state = next;
        }
        if let Some(waker) = self.inner.waker.borrow_mut().take() {
            waker.wake();
        }
        true
    }
}

impl std::fmt::Debug for DispatchHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DispatchHandle")
            .field("state", &*self.inner.state.borrow())
            .finish()
    }
}

impl Future for DispatchHandle {
    type Output = DispatchState;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let state = self.inner.state.borrow();
        if state.is_settled() {
            return Poll::Ready(state.clone());
        }
        *self.inner.waker.borrow_mut() = Some(cx.waker().clone());
        Poll::Pending
    }
}

/// Runs every unit inside `dispatch`, regardless of strategy.
#[derive(Debug, Default, Clone, Copy)]
pub struct ImmediateScheduler;

impl WorkScheduler for ImmediateScheduler {
    type Token = DispatchHandle;

    fn dispatch(&self, strategy: Strategy, work: Work) -> Self::Token {
        let result = work();
        if let Err(err) = &result {
            log::error!("{} work failed: {err}", strategy.name());
        }
        DispatchHandle::settled(result)
    }
}

/// Holds every dispatched unit until the caller decides to run it.
///
/// Units run in dispatch order; cancelled units are dropped unrun.
#[derive(Default)]
pub struct RecordingScheduler {
    queued: RefCell<VecDeque<(Strategy, Work, DispatchHandle)>>,
}

impl RecordingScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.queued.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.queued.borrow().is_empty()
    }

    /// Strategies of the units still waiting, oldest first.
    pub fn strategies(&self) -> Vec<Strategy> {
        self.queued
            .borrow()
            .iter()
            .map(|(strategy, ..)| *strategy)
            .collect()
    }

    /// Runs the oldest unit that has not been cancelled.
    pub fn run_next(&self) -> Option<Result<(), ApplyError>> {
        loop {
            let (_, work, handle) = self.queued.borrow_mut().pop_front()?;
            if handle.is_cancelled() {
                continue;
            }
            let result = work();
            handle.complete(result.clone());
            return Some(result);
        }
    }

    pub fn run_all(&self) -> Vec<Result<(), ApplyError>> {
        std::iter::from_fn(|| self.run_next()).collect()
    }
}

impl WorkScheduler for RecordingScheduler {
    type Token = DispatchHandle;

    fn dispatch(&self, strategy: Strategy, work: Work) -> Self::Token {
        let handle = DispatchHandle::pending();
        self.queued
            .borrow_mut()
            .push_back((strategy, work, handle.clone()));
        handle
    }
}
