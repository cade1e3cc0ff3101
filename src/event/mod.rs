//! Timer events: the value handed to every listener on dispatch.
use core::fmt;

//==================================================================================Enums and Structs

/// Kind of event a listener subscribes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TimerEventType {
    /// Fired on every tick.
    Timer,
    /// Fired once when the run is exhausted or stopped.
    TimerComplete,
}

impl TimerEventType {
    /// Wire name used when events are rendered or looked up by string.
    pub const fn as_str(self) -> &'static str {
        match self {
            TimerEventType::Timer => "timer",
            TimerEventType::TimerComplete => "timerComplete",
        }
    }

    /// Resolve a wire name. Unknown names yield `None` so callers can skip them.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "timer" => Some(TimerEventType::Timer),
            "timerComplete" => Some(TimerEventType::TimerComplete),
            _ => None,
        }
    }
}

impl fmt::Display for TimerEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable event value. `data` is the payload given at registration time and
/// is never inspected by the timer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimerEvent<D> {
    kind: TimerEventType,
    data: Option<D>,
}

impl<D> TimerEvent<D> {
    pub const fn new(kind: TimerEventType, data: Option<D>) -> Self {
        Self { kind, data }
    }

    #[inline]
    pub fn kind(&self) -> TimerEventType {
        self.kind
    }

    #[inline]
    pub fn data(&self) -> Option<&D> {
        self.data.as_ref()
    }

    /// Take the payload out of the event.
    pub fn into_data(self) -> Option<D> {
        self.data
    }
}

impl<D: fmt::Display> fmt::Display for TimerEvent<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[TimerEvent type = {} data = ", self.kind)?;
        match &self.data {
            Some(data) => write!(f, "{}]", data),
            None => f.write_str("none]"),
        }
    }
}
