//! Listener handles and the ordered registry the timer dispatches from.
//!
//! A [`Listener`] is a reference-counted callback. Two handles are "the same
//! listener" when they point at the same allocation, which is what
//! [`ListenerRegistry::remove`] matches on: registering one closure twice and
//! removing it once leaves one registration behind.
use alloc::rc::Rc;
use alloc::vec::Vec;
use core::fmt;

use crate::event::{TimerEvent, TimerEventType};

//==================================================================================Listener

/// Shareable callback invoked with every event of the type it was registered for.
pub struct Listener<D> {
    callback: Rc<dyn Fn(&TimerEvent<D>)>,
}

impl<D> Listener<D> {
    pub fn new<F>(callback: F) -> Self
    where
        F: Fn(&TimerEvent<D>) + 'static,
    {
        Self {
            callback: Rc::new(callback),
        }
    }

    /// Identity comparison: true when both handles wrap the same callback allocation.
    #[inline]
    pub fn same_as(&self, other: &Listener<D>) -> bool {
        core::ptr::addr_eq(Rc::as_ptr(&self.callback), Rc::as_ptr(&other.callback))
    }

    #[inline]
    pub(crate) fn call(&self, event: &TimerEvent<D>) {
        (self.callback)(event)
    }
}

impl<D> Clone for Listener<D> {
    fn clone(&self) -> Self {
        Self {
            callback: Rc::clone(&self.callback),
        }
    }
}

impl<D> fmt::Debug for Listener<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listener")
            .field("callback", &Rc::as_ptr(&self.callback))
            .finish()
    }
}

//==================================================================================Registry

/// Ordered copy of one dispatch list, taken before callbacks run.
pub(crate) type Snapshot<D> = Vec<(Listener<D>, Option<D>)>;

/// One registration: a listener plus the payload its events carry.
#[derive(Debug)]
struct Registration<D> {
    listener: Listener<D>,
    data: Option<D>,
}

/// Two ordered lists of registrations, one per [`TimerEventType`].
/// List order is dispatch order.
#[derive(Debug)]
pub struct ListenerRegistry<D> {
    timer: Vec<Registration<D>>,
    complete: Vec<Registration<D>>,
}

impl<D> Default for ListenerRegistry<D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<D> ListenerRegistry<D> {
    pub const fn new() -> Self {
        Self {
            timer: Vec::new(),
            complete: Vec::new(),
        }
    }

    fn list(&self, kind: TimerEventType) -> &Vec<Registration<D>> {
        match kind {
            TimerEventType::Timer => &self.timer,
            TimerEventType::TimerComplete => &self.complete,
        }
    }

    fn list_mut(&mut self, kind: TimerEventType) -> &mut Vec<Registration<D>> {
        match kind {
            TimerEventType::Timer => &mut self.timer,
            TimerEventType::TimerComplete => &mut self.complete,
        }
    }

    /// Register `listener` for `kind`, at the front of the list when
    /// `insert_to_front` is set, at the back otherwise. Duplicates are kept.
    pub fn add(
        &mut self,
        kind: TimerEventType,
        listener: Listener<D>,
        data: Option<D>,
        insert_to_front: bool,
    ) {
        let registration = Registration { listener, data };
        let list = self.list_mut(kind);
        if insert_to_front {
            list.insert(0, registration);
        } else {
            list.push(registration);
        }
    }

    /// Without a listener, drop every registration of `kind`. With one, drop the
    /// first registration of that same listener and stop there.
    pub fn remove(&mut self, kind: TimerEventType, listener: Option<&Listener<D>>) {
        let list = self.list_mut(kind);
        match listener {
            None => list.clear(),
            Some(listener) => {
                if let Some(index) = list.iter().position(|r| r.listener.same_as(listener)) {
                    list.remove(index);
                }
            }
        }
    }

    /// Number of registrations for `kind`.
    pub fn len(&self, kind: TimerEventType) -> usize {
        self.list(kind).len()
    }

    /// True when neither event type has a registration.
    pub fn is_empty(&self) -> bool {
        self.timer.is_empty() && self.complete.is_empty()
    }
}

impl<D: Clone> ListenerRegistry<D> {
    /// Copy of the dispatch list for `kind`, so callbacks can mutate the
    /// registry while a round is in flight.
    pub(crate) fn snapshot(&self, kind: TimerEventType) -> Snapshot<D> {
        self.list(kind)
            .iter()
            .map(|r| (r.listener.clone(), r.data.clone()))
            .collect()
    }
}

/// Invoke every entry of a snapshot in order with a fresh event of `kind`.
/// A panicking listener is not contained.
pub(crate) fn dispatch<D>(kind: TimerEventType, snapshot: Snapshot<D>) {
    for (listener, data) in snapshot {
        let event = TimerEvent::new(kind, data);
        listener.call(&event);
    }
}
