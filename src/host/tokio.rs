//! Wall-clock host backed by tokio timers.
//!
//! Callbacks capture `Rc` state, so they are spawned with
//! [`tokio::task::spawn_local`]: every `TokioHost` call that schedules work must
//! happen inside a [`tokio::task::LocalSet`].
use alloc::boxed::Box;
use alloc::rc::Rc;
use core::cell::{Cell, RefCell};
use std::collections::HashMap;

use ::tokio::task::AbortHandle;
use ::tokio::time::{self, Duration, Instant, MissedTickBehavior};

use super::{Clock, Scheduler};

/// Handle returned by [`TokioHost`] for every scheduled callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TokioTaskId(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Once,
    Repeat,
}

/// Host whose clock reads milliseconds since construction (tokio's clock, so
/// paused test time is honoured). Clones share the task table.
#[derive(Debug, Clone)]
pub struct TokioHost {
    origin: Instant,
    next_id: Rc<Cell<u64>>,
    tasks: Rc<RefCell<HashMap<TokioTaskId, (Kind, AbortHandle)>>>,
}

impl Default for TokioHost {
    fn default() -> Self {
        Self::new()
    }
}

impl TokioHost {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            next_id: Rc::new(Cell::new(0)),
            tasks: Rc::new(RefCell::new(HashMap::new())),
        }
    }

    fn next_id(&self) -> TokioTaskId {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        TokioTaskId(id)
    }

    fn cancel(&self, handle: TokioTaskId, kind: Kind) {
        let mut tasks = self.tasks.borrow_mut();
        if matches!(tasks.get(&handle), Some((k, _)) if *k == kind) {
            if let Some((_, abort)) = tasks.remove(&handle) {
                abort.abort();
            }
        }
    }

    /// Number of callbacks still scheduled.
    pub fn pending(&self) -> usize {
        self.tasks.borrow().len()
    }
}

impl Scheduler for TokioHost {
    type Handle = TokioTaskId;

    fn set_timeout(&self, delay_ms: u32, callback: Box<dyn FnOnce()>) -> TokioTaskId {
        let id = self.next_id();
        let tasks = Rc::clone(&self.tasks);
        // The task may first be polled well after this call returns.
        let deadline = Instant::now() + Duration::from_millis(u64::from(delay_ms));
        let join = ::tokio::task::spawn_local(async move {
            time::sleep_until(deadline).await;
            // Cleared between wake-up and now: the entry is gone, skip.
            if tasks.borrow_mut().remove(&id).is_some() {
                callback();
            }
        });
        self.tasks
            .borrow_mut()
            .insert(id, (Kind::Once, join.abort_handle()));
        id
    }

    fn set_interval(&self, delay_ms: u32, mut callback: Box<dyn FnMut()>) -> TokioTaskId {
        let id = self.next_id();
        let tasks = Rc::clone(&self.tasks);
        // tokio rejects a zero period.
        let period = Duration::from_millis(u64::from(delay_ms.max(1)));
        let first = Instant::now() + period;
        let join = ::tokio::task::spawn_local(async move {
            let mut ticks = time::interval_at(first, period);
            ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticks.tick().await;
                if !tasks.borrow().contains_key(&id) {
                    break;
                }
                callback();
            }
        });
        self.tasks
            .borrow_mut()
            .insert(id, (Kind::Repeat, join.abort_handle()));
        id
    }

    fn clear_timeout(&self, handle: TokioTaskId) {
        self.cancel(handle, Kind::Once);
    }

    fn clear_interval(&self, handle: TokioTaskId) {
        self.cancel(handle, Kind::Repeat);
    }
}

impl Clock for TokioHost {
    fn now_ms(&self) -> u64 {
        self.origin.elapsed().as_millis() as u64
    }
}
