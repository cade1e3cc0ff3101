//! Host abstraction: the delay primitives and the clock a [`Timer`] runs on.
//!
//! The timer never waits by itself. It asks a [`Scheduler`] to call it back,
//! once or repeatedly, and reads a [`Clock`] for elapsed-time queries. Any
//! event loop that can provide these two capabilities can drive timers:
//!
//! * [`manual::ManualHost`]: virtual time advanced explicitly, `no_std` friendly;
//! * [`tokio::TokioHost`] (feature `tokio`): wall-clock delays on a tokio `LocalSet`.
//!
//! [`Timer`]: crate::timer::Timer
use alloc::boxed::Box;
use core::fmt::Debug;

pub mod manual;
#[cfg(feature = "tokio")]
pub mod tokio;

/// Delay-scheduling facility. Callbacks run on the caller's execution context,
/// one at a time, and never from inside `set_timeout` / `set_interval`.
pub trait Scheduler {
    /// Cancellation handle. Owned exclusively by whoever scheduled the callback.
    type Handle: Copy + Eq + Debug;

    /// Run `callback` once after `delay_ms` milliseconds.
    fn set_timeout(&self, delay_ms: u32, callback: Box<dyn FnOnce()>) -> Self::Handle;

    /// Run `callback` every `delay_ms` milliseconds until cleared.
    fn set_interval(&self, delay_ms: u32, callback: Box<dyn FnMut()>) -> Self::Handle;

    /// Cancel a one-shot callback. Unknown or already-fired handles are ignored.
    fn clear_timeout(&self, handle: Self::Handle);

    /// Cancel a repeating callback. Unknown handles are ignored.
    fn clear_interval(&self, handle: Self::Handle);
}

/// Millisecond time source.
pub trait Clock {
    fn now_ms(&self) -> u64;
}

/// Everything a timer needs from its environment. Cloning must yield a handle to
/// the same underlying host.
pub trait Host: Scheduler + Clock + Clone {}

impl<T: Scheduler + Clock + Clone> Host for T {}
