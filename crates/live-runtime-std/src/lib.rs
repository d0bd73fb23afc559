//! Standard scheduling services backed by Rust's `std` library.
//!
//! This crate provides concrete implementations of the platform
//! abstraction traits defined in `live-core`. Hosts construct a
//! [`StdScheduler`] (or the [`StdRuntime`] bundle), pass it to a
//! [`live_core::QueuedLiveCollection`] and drain it once per frame.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;
use std::time::Instant;

use live_core::{Clock, DispatchHandle, Strategy, Work, WorkScheduler};

struct QueuedWork {
    strategy: Strategy,
    work: Work,
    handle: DispatchHandle,
}

/// Scheduler that queues deferred work until the host drains it.
///
/// [`Strategy::Native`] work runs inside `dispatch`; everything else is
/// queued in dispatch order and a frame is requested.
pub struct StdScheduler {
    frame_requested: Cell<bool>,
    frame_waker: RefCell<Option<Rc<dyn Fn() + 'static>>>,
    queue: RefCell<VecDeque<QueuedWork>>,
}

impl StdScheduler {
    pub fn new() -> Self {
        Self {
            frame_requested: Cell::new(false),
            frame_waker: RefCell::new(None),
            queue: RefCell::new(VecDeque::new()),
        }
    }

    /// Returns whether a frame has been requested since the last call.
    pub fn take_frame_request(&self) -> bool {
        self.frame_requested.replace(false)
    }

    /// Registers a waker that will be invoked whenever work is queued.
    pub fn set_frame_waker(&self, waker: impl Fn() + 'static) {
        *self.frame_waker.borrow_mut() = Some(Rc::new(waker));
    }

    /// Clears any registered frame waker.
    pub fn clear_frame_waker(&self) {
        *self.frame_waker.borrow_mut() = None;
    }

    pub fn pending_len(&self) -> usize {
        self.queue.borrow().len()
    }

    pub fn has_pending(&self) -> bool {
        !self.queue.borrow().is_empty()
    }

    /// Runs the oldest queued unit that has not been cancelled.
    ///
    /// Returns `false` once the queue is empty.
    pub fn run_next(&self) -> bool {
        loop {
            let Some(next) = self.queue.borrow_mut().pop_front() else {
                return false;
            };
            if next.handle.is_cancelled() {
                log::trace!("skipping cancelled {} work", next.strategy.name());
                continue;
            }
            run(next.strategy, next.work, &next.handle);
            return true;
        }
    }

    /// Runs every queued unit, including ones queued while draining.
    pub fn drain(&self) -> usize {
        let mut ran = 0;
        while self.run_next() {
            ran += 1;
        }
        ran
    }

    /// Runs queued units until `budget_millis` have elapsed on `clock`.
    ///
    /// At least one unit runs per call so a tight budget still makes
    /// progress.
    pub fn drain_within<C: Clock>(&self, clock: &C, budget_millis: u64) -> usize {
        let started = clock.now();
        let mut ran = 0;
        while self.run_next() {
            ran += 1;
            if clock.elapsed_millis(started) >= budget_millis {
                break;
            }
        }
        if self.has_pending() {
            log::debug!(
                "frame budget of {budget_millis}ms spent after {ran} units, {} left",
                self.pending_len()
            );
            self.request_frame();
        }
        ran
    }

    fn request_frame(&self) {
        self.frame_requested.set(true);
        let waker = self.frame_waker.borrow().clone();
        if let Some(waker) = waker {
            waker();
        }
    }
}

fn run(strategy: Strategy, work: Work, handle: &DispatchHandle) {
    let result = work();
    if let Err(err) = &result {
        log::error!("{} work failed: {err}", strategy.name());
    }
    handle.complete(result);
}

impl Default for StdScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for StdScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StdScheduler")
            .field("frame_requested", &self.frame_requested.get())
            .field("pending", &self.pending_len())
            .finish()
    }
}

impl WorkScheduler for StdScheduler {
    type Token = DispatchHandle;

    fn dispatch(&self, strategy: Strategy, work: Work) -> Self::Token {
        let handle = DispatchHandle::pending();
        if strategy == Strategy::Native {
            run(strategy, work, &handle);
            return handle;
        }
        self.queue.borrow_mut().push_back(QueuedWork {
            strategy,
            work,
            handle: handle.clone(),
        });
        self.request_frame();
        handle
    }
}

/// Clock implementation backed by [`std::time`].
#[derive(Debug, Default, Clone)]
pub struct StdClock;

impl Clock for StdClock {
    type Instant = Instant;

    fn now(&self) -> Self::Instant {
        Instant::now()
    }

    fn elapsed_millis(&self, since: Self::Instant) -> u64 {
        since.elapsed().as_millis() as u64
    }
}

/// Convenience container bundling the standard scheduler and clock.
#[derive(Clone)]
pub struct StdRuntime {
    scheduler: Rc<StdScheduler>,
    clock: StdClock,
    frame_budget_millis: Option<u64>,
}

impl StdRuntime {
    /// Creates a runtime that drains everything on each frame.
    pub fn new() -> Self {
        Self {
            scheduler: Rc::new(StdScheduler::new()),
            clock: StdClock,
            frame_budget_millis: None,
        }
    }

    /// Creates a runtime that stops draining once a frame used `millis`.
    pub fn with_frame_budget(millis: u64) -> Self {
        Self {
            frame_budget_millis: Some(millis),
            ..Self::new()
        }
    }

    /// Returns the scheduler to hand to a live collection.
    pub fn scheduler(&self) -> Rc<StdScheduler> {
        Rc::clone(&self.scheduler)
    }

    pub fn clock(&self) -> &StdClock {
        &self.clock
    }

    /// Returns whether a frame was requested since the last poll.
    pub fn take_frame_request(&self) -> bool {
        self.scheduler.take_frame_request()
    }

    /// Runs queued work for one frame, honouring the frame budget.
    pub fn run_frame(&self) -> usize {
        match self.frame_budget_millis {
            Some(budget) => self.scheduler.drain_within(&self.clock, budget),
            None => self.scheduler.drain(),
        }
    }
}

impl fmt::Debug for StdRuntime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StdRuntime")
            .field("scheduler", &self.scheduler)
            .field("frame_budget_millis", &self.frame_budget_millis)
            .finish()
    }
}

impl Default for StdRuntime {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "tests/scheduler_tests.rs"]
mod tests;
