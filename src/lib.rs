//! `event-timer` library: a repeatable, cancellable timer that notifies ordered
//! listeners with `TIMER` events on every tick and a single `TIMER_COMPLETE`
//! event when the run ends. The crate runs in a `no_std` environment (with
//! `alloc`); the host that actually waits is supplied by the caller.
#![no_std]
//==================================================================================
extern crate alloc;
#[cfg(feature = "tokio")]
extern crate std;
//==================================================================================
/// Misuse errors (missing listener, start without listeners).
pub mod error;
/// Event values delivered to listeners.
pub mod event;
/// Delay-scheduling and clock abstractions, plus the bundled hosts.
pub mod host;
/// Listener handles and the ordered per-type registry.
pub mod listener;
/// The timer state machine.
pub mod timer;
//==================================================================================
pub use error::TimerError;
pub use event::{TimerEvent, TimerEventType};
pub use listener::Listener;
pub use timer::{Timer, WeakTimer};
