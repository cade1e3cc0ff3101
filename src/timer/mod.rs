//! Repeatable, cancellable timer dispatching `Timer` / `TimerComplete` events.
//!
//! # Run lifecycle
//!
//! ```text
//!   new ──start()──▶ running ──ticks exhausted / stop()──▶ completed
//!    ▲                                                        │
//!    └──────────────────────────reset()───────────────────────┘
//! ```
//!
//! * **Counted mode** (`repeat_count >= 0`): one one-shot host callback at a
//!   time. The next one is scheduled only after the current tick's listeners
//!   returned, so ticks never overlap.
//! * **Infinite mode** (`repeat_count < 0`): a single repeating host callback.
//!   Only [`Timer::stop`] ends the run.
//!
//! `TimerComplete` is dispatched at most once per run. Listeners are invoked with
//! no internal borrow held, so they may call back into the timer (through a
//! [`WeakTimer`]) to stop, reset, restart or edit the listener lists.
use alloc::boxed::Box;
use alloc::rc::{Rc, Weak};
use core::cell::RefCell;
use core::fmt;

use crate::error::TimerError;
use crate::event::TimerEventType;
use crate::host::{Host, Scheduler};
use crate::listener::{dispatch, Listener, ListenerRegistry, Snapshot};

//==================================================================================State

struct TimerState<D, H: Host> {
    delay: u32,
    repeat_count: i32,
    repeat_infinitely: bool,
    current_count: u32,
    running: bool,
    is_completed: bool,
    start_time: Option<u64>,
    timer_id: Option<<H as Scheduler>::Handle>,
    /// Bumped by `reset()`; host callbacks from an older run find a mismatch and bail out.
    generation: u64,
    listeners: ListenerRegistry<D>,
}

impl<D, H: Host> TimerState<D, H> {
    /// True while ticks remain in a counted run.
    fn has_ticks_left(&self) -> bool {
        i64::from(self.current_count) < i64::from(self.repeat_count)
    }

    /// Mark the run completed and hand back the listeners to notify, unless
    /// completion was already dispatched.
    fn take_completion(&mut self) -> Option<Snapshot<D>>
    where
        D: Clone,
    {
        if self.is_completed {
            return None;
        }
        self.is_completed = true;
        Some(self.listeners.snapshot(TimerEventType::TimerComplete))
    }
}

struct Shared<D, H: Host> {
    host: H,
    state: RefCell<TimerState<D, H>>,
}

impl<D: Clone + 'static, H: Host + 'static> Shared<D, H> {
    fn schedule_once(shared: &Rc<Self>, delay: u32, generation: u64) -> <H as Scheduler>::Handle {
        let weak = Rc::downgrade(shared);
        shared.host.set_timeout(
            delay,
            Box::new(move || {
                if let Some(shared) = weak.upgrade() {
                    Shared::counted_tick(&shared, generation);
                }
            }),
        )
    }

    fn schedule_every(shared: &Rc<Self>, delay: u32, generation: u64) -> <H as Scheduler>::Handle {
        let weak = Rc::downgrade(shared);
        shared.host.set_interval(
            delay,
            Box::new(move || {
                if let Some(shared) = weak.upgrade() {
                    Shared::infinite_tick(&shared, generation);
                }
            }),
        )
    }

    /// Snapshot of the `Timer` listeners if the tick belongs to the live run.
    fn tick_listeners(&self, generation: u64) -> Option<Snapshot<D>> {
        let state = self.state.borrow();
        if state.generation != generation || !state.running {
            return None;
        }
        Some(state.listeners.snapshot(TimerEventType::Timer))
    }

    fn counted_tick(shared: &Rc<Self>, generation: u64) {
        let Some(listeners) = shared.tick_listeners(generation) else {
            return;
        };
        dispatch(TimerEventType::Timer, listeners);

        let completion = {
            let mut state = shared.state.borrow_mut();
            // A listener reset the timer: this tick no longer belongs to any run.
            if state.generation != generation {
                return;
            }
            state.current_count += 1;

            #[cfg(feature = "defmt")]
            defmt::trace!(
                "timer tick {}/{}",
                state.current_count,
                state.repeat_count
            );

            if state.has_ticks_left() {
                if state.running {
                    let delay = state.delay;
                    state.timer_id = Some(Shared::schedule_once(shared, delay, generation));
                }
            } else {
                state.running = false;
                state.timer_id = None;

                #[cfg(feature = "defmt")]
                defmt::debug!("timer exhausted after {} ticks", state.current_count);
            }

            if state.running {
                None
            } else {
                state.take_completion()
            }
        };

        if let Some(listeners) = completion {
            dispatch(TimerEventType::TimerComplete, listeners);
        }
    }

    fn infinite_tick(shared: &Rc<Self>, generation: u64) {
        let Some(listeners) = shared.tick_listeners(generation) else {
            return;
        };
        dispatch(TimerEventType::Timer, listeners);

        let mut state = shared.state.borrow_mut();
        if state.generation == generation {
            state.current_count = state.current_count.wrapping_add(1);

            #[cfg(feature = "defmt")]
            defmt::trace!("timer tick {} (infinite)", state.current_count);
        }
    }
}

impl<D, H: Host> Drop for Shared<D, H> {
    fn drop(&mut self) {
        // Nobody can observe this timer any more: cancel silently.
        let state = self.state.get_mut();
        if let Some(handle) = state.timer_id.take() {
            if state.repeat_infinitely {
                self.host.clear_interval(handle);
            } else {
                self.host.clear_timeout(handle);
            }
        }
    }
}

//==================================================================================Timer

/// Timer owning its listener lists and at most one pending host callback.
///
/// `D` is the payload type carried by events; `H` is the host providing delays
/// and the clock. Dropping the timer cancels its pending callback without
/// dispatching anything.
pub struct Timer<D, H: Host> {
    shared: Rc<Shared<D, H>>,
}

/// Non-owning handle to a [`Timer`], meant to be captured by its own listeners.
pub struct WeakTimer<D, H: Host> {
    shared: Weak<Shared<D, H>>,
}

impl<D, H: Host> Clone for WeakTimer<D, H> {
    fn clone(&self) -> Self {
        Self {
            shared: Weak::clone(&self.shared),
        }
    }
}

impl<D, H: Host> WeakTimer<D, H> {
    /// Owning handle, or `None` once the timer has been dropped.
    pub fn upgrade(&self) -> Option<Timer<D, H>> {
        self.shared.upgrade().map(|shared| Timer { shared })
    }
}

impl<D: Clone + 'static, H: Host + 'static> Timer<D, H> {
    /// Build a stopped timer.
    ///
    /// * `delay`: milliseconds between ticks, handed to the host unchanged.
    /// * `repeat_count`: `None` or `Some(0)` fires once, `Some(n > 0)` fires `n`
    ///   times, any negative count repeats until [`Timer::stop`].
    pub fn new(host: H, delay: u32, repeat_count: Option<i32>) -> Self {
        let requested = repeat_count.unwrap_or(0);
        let state = TimerState {
            delay,
            repeat_count: if requested == 0 { 1 } else { requested },
            repeat_infinitely: requested < 0,
            current_count: 0,
            running: false,
            is_completed: false,
            start_time: None,
            timer_id: None,
            generation: 0,
            listeners: ListenerRegistry::new(),
        };
        Self {
            shared: Rc::new(Shared {
                host,
                state: RefCell::new(state),
            }),
        }
    }

    /// Register `listener` for `kind`.
    ///
    /// `data` is delivered inside every event this registration receives.
    /// `insert_to_front` places the listener ahead of those already registered.
    ///
    /// # Errors
    ///
    /// [`TimerError::NullListener`] when `listener` is `None`.
    pub fn add_event_listener(
        &self,
        kind: TimerEventType,
        listener: Option<Listener<D>>,
        data: Option<D>,
        insert_to_front: bool,
    ) -> Result<(), TimerError> {
        let Some(listener) = listener else {
            #[cfg(feature = "defmt")]
            defmt::warn!("rejected null listener for {}", kind);
            return Err(TimerError::NullListener);
        };
        self.shared
            .state
            .borrow_mut()
            .listeners
            .add(kind, listener, data, insert_to_front);
        Ok(())
    }

    /// Remove the first registration of `listener` for `kind`, or every
    /// registration of `kind` when `listener` is `None`.
    pub fn remove_event_listener(&self, kind: TimerEventType, listener: Option<&Listener<D>>) {
        self.shared
            .state
            .borrow_mut()
            .listeners
            .remove(kind, listener);
    }

    /// Begin a run. Does nothing while running or once the run completed
    /// (call [`Timer::reset`] first).
    ///
    /// # Errors
    ///
    /// [`TimerError::NoListenersRegistered`] when neither event type has a listener.
    pub fn start(&self) -> Result<(), TimerError> {
        let mut state = self.shared.state.borrow_mut();
        if state.running || state.is_completed {
            return Ok(());
        }
        if state.listeners.is_empty() {
            #[cfg(feature = "defmt")]
            defmt::warn!("start refused: no listener registered");
            return Err(TimerError::NoListenersRegistered);
        }

        let (delay, generation) = (state.delay, state.generation);
        let handle = if state.repeat_infinitely {
            Shared::schedule_every(&self.shared, delay, generation)
        } else {
            Shared::schedule_once(&self.shared, delay, generation)
        };
        state.timer_id = Some(handle);
        state.start_time = Some(self.shared.host.now_ms());
        state.running = true;

        #[cfg(feature = "defmt")]
        defmt::debug!(
            "timer started: delay={}ms repeat={} infinite={}",
            state.delay,
            state.repeat_count,
            state.repeat_infinitely
        );
        Ok(())
    }

    /// Cancel the pending tick and, unless the run already completed, dispatch
    /// `TimerComplete`. A timer that holds no host callback (never started, or
    /// already exhausted) is left as is.
    pub fn stop(&self) {
        let completion = {
            let mut state = self.shared.state.borrow_mut();
            state.running = false;
            let Some(handle) = state.timer_id.take() else {
                return;
            };
            if state.repeat_infinitely {
                self.shared.host.clear_interval(handle);
            } else {
                self.shared.host.clear_timeout(handle);
            }

            #[cfg(feature = "defmt")]
            defmt::debug!("timer stopped after {} ticks", state.current_count);

            state.take_completion()
        };

        if let Some(listeners) = completion {
            dispatch(TimerEventType::TimerComplete, listeners);
        }
    }

    /// [`Timer::stop`], then return to the pre-run state. Listeners are kept.
    pub fn reset(&self) {
        self.stop();

        let mut state = self.shared.state.borrow_mut();
        state.generation = state.generation.wrapping_add(1);
        state.current_count = 0;
        state.is_completed = false;
        state.start_time = None;

        #[cfg(feature = "defmt")]
        defmt::debug!("timer reset");
    }

    /// Milliseconds since [`Timer::start`], never more than one `delay`.
    ///
    /// The reference point only moves on `start()`, so from the second tick of
    /// a repeating run onwards this reads as a full interval.
    pub fn elapsed_time(&self) -> u32 {
        let state = self.shared.state.borrow();
        let since = self
            .shared
            .host
            .now_ms()
            .saturating_sub(state.start_time.unwrap_or(0));
        since.min(u64::from(state.delay)) as u32
    }

    /// `delay - elapsed_time()`.
    pub fn remaining_time(&self) -> u32 {
        let delay = self.shared.state.borrow().delay;
        delay - self.elapsed_time()
    }
}

impl<D, H: Host> Timer<D, H> {
    /// Non-owning handle for use inside listeners.
    pub fn downgrade(&self) -> WeakTimer<D, H> {
        WeakTimer {
            shared: Rc::downgrade(&self.shared),
        }
    }

    #[inline]
    pub fn delay(&self) -> u32 {
        self.shared.state.borrow().delay
    }

    /// Normalized repeat count (`1` when built with `None` or `Some(0)`).
    #[inline]
    pub fn repeat_count(&self) -> i32 {
        self.shared.state.borrow().repeat_count
    }

    #[inline]
    pub fn repeats_infinitely(&self) -> bool {
        self.shared.state.borrow().repeat_infinitely
    }

    /// `Timer` events dispatched in the current run.
    #[inline]
    pub fn current_count(&self) -> u32 {
        self.shared.state.borrow().current_count
    }

    #[inline]
    pub fn is_running(&self) -> bool {
        self.shared.state.borrow().running
    }

    #[inline]
    pub fn is_completed(&self) -> bool {
        self.shared.state.borrow().is_completed
    }

    /// Host clock reading captured by the last `start()`.
    #[inline]
    pub fn start_time(&self) -> Option<u64> {
        self.shared.state.borrow().start_time
    }

    pub fn listener_count(&self, kind: TimerEventType) -> usize {
        self.shared.state.borrow().listeners.len(kind)
    }
}

impl<D, H: Host> fmt::Debug for Timer<D, H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.shared.state.borrow();
        f.debug_struct("Timer")
            .field("delay", &state.delay)
            .field("repeat_count", &state.repeat_count)
            .field("repeat_infinitely", &state.repeat_infinitely)
            .field("current_count", &state.current_count)
            .field("running", &state.running)
            .field("is_completed", &state.is_completed)
            .field("start_time", &state.start_time)
            .field("timer_id", &state.timer_id)
            .finish()
    }
}
