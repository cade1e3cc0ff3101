//! # Quickstart Example
//!
//! Minimal walk through event-timer:
//! - Build a host and a counted timer
//! - Register tick / completion listeners
//! - Drive virtual time, stop an infinite timer from its own listener
//!
//! ```bash
//! cargo run --example quickstart
//! ```

use std::cell::Cell;
use std::rc::Rc;

use event_timer::host::manual::ManualHost;
use event_timer::host::Clock;
use event_timer::{Listener, Timer, TimerError, TimerEvent, TimerEventType};

fn main() -> Result<(), TimerError> {
    println!("=== event-timer Quickstart ===\n");

    // ======================================================================
    // 1. A timer firing three times, every 100 ms
    // ======================================================================
    println!("1. Counted timer (100 ms x 3)");

    let host = ManualHost::new();
    let timer = Timer::new(host.clone(), 100, Some(3));

    let clock = host.clone();
    timer.add_event_listener(
        TimerEventType::Timer,
        Some(Listener::new(move |event: &TimerEvent<&'static str>| {
            println!("   t={:>4} ms  {}", clock.now_ms(), event)
        })),
        Some("tick"),
        false,
    )?;
    timer.add_event_listener(
        TimerEventType::TimerComplete,
        Some(Listener::new(|event: &TimerEvent<&'static str>| {
            println!("   completed  {}", event)
        })),
        Some("done"),
        false,
    )?;

    timer.start()?;
    host.advance(150);
    println!(
        "   after 150 ms: elapsed={} ms remaining={} ms",
        timer.elapsed_time(),
        timer.remaining_time()
    );
    host.advance(250);
    println!("   ticks: {}, running: {}\n", timer.current_count(), timer.is_running());

    // ======================================================================
    // 2. An infinite timer stopped from its own listener
    // ======================================================================
    println!("2. Infinite timer (50 ms), stopped on the third tick");

    let forever: Timer<&'static str, _> = Timer::new(host.clone(), 50, Some(-1));
    let ticks = Rc::new(Cell::new(0u32));
    let weak = forever.downgrade();
    let seen = Rc::clone(&ticks);
    forever.add_event_listener(
        TimerEventType::Timer,
        Some(Listener::new(move |_: &TimerEvent<&'static str>| {
            seen.set(seen.get() + 1);
            if seen.get() == 3 {
                if let Some(timer) = weak.upgrade() {
                    timer.stop();
                }
            }
        })),
        None,
        false,
    )?;
    forever.add_event_listener(
        TimerEventType::TimerComplete,
        Some(Listener::new(|_: &TimerEvent<&'static str>| {
            println!("   infinite timer completed")
        })),
        None,
        false,
    )?;

    forever.start()?;
    host.advance(1_000);
    println!("   ticks: {}\n", ticks.get());

    // ======================================================================
    // 3. Misuse is reported as errors
    // ======================================================================
    println!("3. Error reporting");

    let idle: Timer<&'static str, _> = Timer::new(host, 10, None);
    println!("   start without listeners: {:?}", idle.start());
    println!(
        "   null listener: {:?}",
        idle.add_event_listener(TimerEventType::Timer, None, None, false)
    );

    Ok(())
}
