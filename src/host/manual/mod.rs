//! Deterministic host driven by explicit calls to [`ManualHost::advance`].
//!
//! Time only moves when the owner says so, which makes it the natural host for
//! tests and for bare-metal main loops that already own a tick source.
use alloc::boxed::Box;
use alloc::collections::BTreeMap;
use alloc::rc::Rc;
use core::cell::RefCell;
use core::fmt;

use super::{Clock, Scheduler};

//==================================================================================Enums and Structs

/// Handle returned by [`ManualHost`] for every scheduled callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(u64);

enum Callback {
    Once(Box<dyn FnOnce()>),
    Repeat(Box<dyn FnMut()>),
    /// Repeating callback currently executing; it is put back afterwards
    /// unless the interval was cleared meanwhile.
    Running,
}

struct Task {
    due: u64,
    period: Option<u64>,
    callback: Callback,
}

#[derive(Default)]
struct HostState {
    now: u64,
    next_id: u64,
    tasks: BTreeMap<TaskId, Task>,
}

impl HostState {
    fn insert(&mut self, due: u64, period: Option<u64>, callback: Callback) -> TaskId {
        let id = TaskId(self.next_id);
        self.next_id += 1;
        self.tasks.insert(
            id,
            Task {
                due,
                period,
                callback,
            },
        );
        id
    }

    /// Earliest runnable task due no later than `limit`. Ties go to the oldest task.
    fn next_ready(&self, limit: u64) -> Option<TaskId> {
        self.tasks
            .iter()
            .filter(|(_, task)| task.due <= limit && !matches!(task.callback, Callback::Running))
            .min_by_key(|(id, task)| (task.due, **id))
            .map(|(id, _)| *id)
    }
}

/// Puts a repeating callback back in its slot when dropped, including while a
/// panic unwinds out of the callback.
struct Rearm<'a> {
    state: &'a RefCell<HostState>,
    id: TaskId,
    callback: Option<Box<dyn FnMut()>>,
}

impl Drop for Rearm<'_> {
    fn drop(&mut self) {
        let Some(callback) = self.callback.take() else {
            return;
        };
        let Ok(mut state) = self.state.try_borrow_mut() else {
            return;
        };
        // Gone when cleared from inside the callback.
        if let Some(task) = state.tasks.get_mut(&self.id) {
            task.due += task.period.unwrap_or(1);
            task.callback = Callback::Repeat(callback);
        }
    }
}

/// Virtual-time host. Clones share the same clock and task queue.
#[derive(Clone, Default)]
pub struct ManualHost {
    state: Rc<RefCell<HostState>>,
}

impl fmt::Debug for ManualHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("ManualHost")
            .field("now", &state.now)
            .field("pending", &state.tasks.len())
            .finish()
    }
}

impl ManualHost {
    /// Host whose clock reads 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Host whose clock starts at `now_ms`.
    pub fn starting_at(now_ms: u64) -> Self {
        let host = Self::default();
        host.state.borrow_mut().now = now_ms;
        host
    }

    /// Move the clock forward by `millis`, running every callback that falls due,
    /// in due order, with the clock set to each callback's due time while it runs.
    /// Callbacks scheduled from inside a callback run in the same call if they
    /// fall due before the target. Returns the number of callbacks run.
    ///
    /// A panicking callback unwinds out of `advance` and the clock stays at its
    /// due time. A repeating callback that panicked stays scheduled for its next
    /// period, so a caller that catches the panic can keep advancing.
    pub fn advance(&self, millis: u64) -> usize {
        let target = self.state.borrow().now.saturating_add(millis);
        let mut fired = 0;

        loop {
            let (id, callback) = {
                let mut state = self.state.borrow_mut();
                let Some(id) = state.next_ready(target) else {
                    break;
                };
                let Some(task) = state.tasks.get_mut(&id) else {
                    break;
                };
                let due = task.due;
                let callback = core::mem::replace(&mut task.callback, Callback::Running);
                if matches!(callback, Callback::Once(_)) {
                    state.tasks.remove(&id);
                }
                if due > state.now {
                    state.now = due;
                }
                (id, callback)
            };

            match callback {
                Callback::Once(callback) => callback(),
                Callback::Repeat(callback) => {
                    let mut rearm = Rearm {
                        state: &self.state,
                        id,
                        callback: Some(callback),
                    };
                    if let Some(callback) = rearm.callback.as_mut() {
                        callback();
                    }
                }
                Callback::Running => continue,
            }
            fired += 1;
        }

        let mut state = self.state.borrow_mut();
        if target > state.now {
            state.now = target;
        }
        fired
    }

    /// Number of scheduled callbacks (one-shot and repeating).
    pub fn pending(&self) -> usize {
        self.state.borrow().tasks.len()
    }

    /// Due time of the next scheduled callback, if any.
    pub fn next_due(&self) -> Option<u64> {
        self.state.borrow().tasks.values().map(|task| task.due).min()
    }
}

impl Scheduler for ManualHost {
    type Handle = TaskId;

    fn set_timeout(&self, delay_ms: u32, callback: Box<dyn FnOnce()>) -> TaskId {
        let mut state = self.state.borrow_mut();
        let due = state.now + u64::from(delay_ms);
        state.insert(due, None, Callback::Once(callback))
    }

    fn set_interval(&self, delay_ms: u32, callback: Box<dyn FnMut()>) -> TaskId {
        let mut state = self.state.borrow_mut();
        // A zero period would never let `advance` return.
        let period = u64::from(delay_ms.max(1));
        let due = state.now + period;
        state.insert(due, Some(period), Callback::Repeat(callback))
    }

    fn clear_timeout(&self, handle: TaskId) {
        let mut state = self.state.borrow_mut();
        if matches!(state.tasks.get(&handle), Some(task) if task.period.is_none()) {
            state.tasks.remove(&handle);
        }
    }

    fn clear_interval(&self, handle: TaskId) {
        let mut state = self.state.borrow_mut();
        if matches!(state.tasks.get(&handle), Some(task) if task.period.is_some()) {
            state.tasks.remove(&handle);
        }
    }
}

impl Clock for ManualHost {
    fn now_ms(&self) -> u64 {
        self.state.borrow().now
    }
}
