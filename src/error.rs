//! Error definitions returned by the timer API.
//! Misuse is reported through these values instead of aborting the caller.
use thiserror_no_std::Error;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
/// Errors raised while configuring or starting a [`Timer`](crate::timer::Timer).
pub enum TimerError {
    /// A registration was attempted without a callback.
    #[error("Listener is null")]
    NullListener,
    /// `start()` was called while neither event type has a listener.
    #[error("No listener registered")]
    NoListenersRegistered,
}
