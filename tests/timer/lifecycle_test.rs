mod helpers {
    include!("../helpers/mod.rs");
}

use std::cell::Cell;
use std::rc::Rc;

use event_timer::host::manual::ManualHost;
use event_timer::{Listener, Timer, TimerEvent, TimerEventType};
use helpers::EventRecorder;

#[test]
/// `Timer(100, 3)`: three ticks by 400 ms, completion flagged, then silence.
fn counted_timer_runs_three_times() {
    let host = ManualHost::new();
    let timer = Timer::new(host.clone(), 100, Some(3));

    let counter = Rc::new(Cell::new(0u32));
    let done = Rc::new(Cell::new(false));
    let c = Rc::clone(&counter);
    let d = Rc::clone(&done);
    timer
        .add_event_listener(
            TimerEventType::Timer,
            Some(Listener::new(move |_: &TimerEvent<()>| c.set(c.get() + 1))),
            None,
            false,
        )
        .expect("listener must register");
    timer
        .add_event_listener(
            TimerEventType::TimerComplete,
            Some(Listener::new(move |_: &TimerEvent<()>| d.set(true))),
            None,
            false,
        )
        .expect("listener must register");

    timer.start().expect("start must succeed");
    host.advance(401);
    assert_eq!(counter.get(), 3);
    assert!(done.get());
    assert!(!timer.is_running());

    host.advance(100);
    assert_eq!(counter.get(), 3);
}

#[test]
/// `Timer(50, -1)` stopped after the third tick: three ticks, one completion.
fn infinite_timer_stopped_after_third_tick() {
    let host = ManualHost::new();
    let timer = Timer::new(host.clone(), 50, Some(-1));
    let recorder = EventRecorder::new();
    timer
        .add_event_listener(TimerEventType::Timer, Some(recorder.listener()), None, false)
        .unwrap();
    timer
        .add_event_listener(
            TimerEventType::TimerComplete,
            Some(recorder.listener()),
            None,
            false,
        )
        .unwrap();

    timer.start().unwrap();
    while recorder.ticks() < 3 {
        host.advance(10);
    }
    assert_eq!(recorder.completions(), 0);

    timer.stop();
    assert_eq!(recorder.ticks(), 3);
    assert_eq!(recorder.completions(), 1);

    timer.stop();
    host.advance(1_000);
    assert_eq!(recorder.ticks(), 3);
    assert_eq!(recorder.completions(), 1);
}

#[test]
/// Listener order follows registration, with front insertion taking priority.
fn dispatch_order_and_payloads() {
    let host = ManualHost::new();
    let timer = Timer::new(host.clone(), 20, None);
    let recorder = EventRecorder::new();

    timer
        .add_event_listener(TimerEventType::Timer, Some(recorder.listener()), Some("second"), false)
        .unwrap();
    timer
        .add_event_listener(TimerEventType::Timer, Some(recorder.listener()), Some("third"), false)
        .unwrap();
    timer
        .add_event_listener(TimerEventType::Timer, Some(recorder.listener()), Some("first"), true)
        .unwrap();
    timer
        .add_event_listener(
            TimerEventType::TimerComplete,
            Some(recorder.listener()),
            Some("done"),
            false,
        )
        .unwrap();

    timer.start().unwrap();
    host.advance(20);
    assert_eq!(
        recorder.payloads(),
        vec![Some("first"), Some("second"), Some("third"), Some("done")]
    );
}

#[test]
/// Duplicate registrations survive a targeted removal; a bare removal clears the type.
fn remove_listener_semantics() {
    let host = ManualHost::new();
    let timer = Timer::new(host.clone(), 10, Some(2));
    let recorder = EventRecorder::new();
    let listener = recorder.listener();

    timer
        .add_event_listener(TimerEventType::Timer, Some(listener.clone()), Some("a"), false)
        .unwrap();
    timer
        .add_event_listener(TimerEventType::Timer, Some(listener.clone()), Some("b"), false)
        .unwrap();
    timer.remove_event_listener(TimerEventType::Timer, Some(&listener));
    assert_eq!(timer.listener_count(TimerEventType::Timer), 1);

    timer.start().unwrap();
    host.advance(10);
    assert_eq!(recorder.payloads(), vec![Some("b")]);

    timer.remove_event_listener(TimerEventType::Timer, None);
    assert_eq!(timer.listener_count(TimerEventType::Timer), 0);
    host.advance(10);
    assert_eq!(recorder.ticks(), 1);
}

#[test]
/// The same listeners drive a second, independent run after `reset()`.
fn reset_then_rerun() {
    let host = ManualHost::new();
    let timer = Timer::new(host.clone(), 25, Some(2));
    let recorder = EventRecorder::new();
    timer
        .add_event_listener(TimerEventType::Timer, Some(recorder.listener()), None, false)
        .unwrap();
    timer
        .add_event_listener(
            TimerEventType::TimerComplete,
            Some(recorder.listener()),
            None,
            false,
        )
        .unwrap();

    timer.start().unwrap();
    host.advance(100);
    assert!(timer.is_completed());

    timer.reset();
    timer.start().unwrap();
    assert_eq!(timer.current_count(), 0);
    host.advance(100);
    assert_eq!(recorder.ticks(), 4);
    assert_eq!(recorder.completions(), 2);
}
