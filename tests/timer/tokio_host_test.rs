mod helpers {
    include!("../helpers/mod.rs");
}

use event_timer::host::tokio::TokioHost;
use event_timer::{Listener, Timer, TimerEvent, TimerEventType};
use helpers::EventRecorder;
use std::cell::Cell;
use std::rc::Rc;
use tokio::task::LocalSet;
use tokio::time::{sleep, Duration};

fn recorded_timer(
    host: &TokioHost,
    delay: u32,
    repeat: Option<i32>,
) -> (Timer<&'static str, TokioHost>, EventRecorder) {
    let timer = Timer::new(host.clone(), delay, repeat);
    let recorder = EventRecorder::new();
    timer
        .add_event_listener(TimerEventType::Timer, Some(recorder.listener()), None, false)
        .expect("listener must register");
    timer
        .add_event_listener(
            TimerEventType::TimerComplete,
            Some(recorder.listener()),
            None,
            false,
        )
        .expect("listener must register");
    (timer, recorder)
}

#[tokio::test(start_paused = true)]
async fn counted_timer_on_tokio() {
    LocalSet::new()
        .run_until(async {
            let host = TokioHost::new();
            let (timer, recorder) = recorded_timer(&host, 100, Some(3));
            timer.start().expect("start must succeed");

            sleep(Duration::from_millis(150)).await;
            assert_eq!(recorder.ticks(), 1);
            assert!(timer.is_running());

            sleep(Duration::from_millis(260)).await;
            assert_eq!(recorder.ticks(), 3);
            assert_eq!(recorder.completions(), 1);
            assert!(!timer.is_running());

            sleep(Duration::from_millis(100)).await;
            assert_eq!(recorder.ticks(), 3);
            assert_eq!(host.pending(), 0);
        })
        .await;
}

#[tokio::test(start_paused = true)]
async fn infinite_timer_on_tokio_until_stop() {
    LocalSet::new()
        .run_until(async {
            let host = TokioHost::new();
            let (timer, recorder) = recorded_timer(&host, 50, Some(-1));
            timer.start().expect("start must succeed");

            sleep(Duration::from_millis(175)).await;
            assert_eq!(recorder.ticks(), 3);
            assert_eq!(recorder.completions(), 0);

            timer.stop();
            assert_eq!(recorder.completions(), 1);
            sleep(Duration::from_millis(500)).await;
            assert_eq!(recorder.ticks(), 3);
            assert_eq!(host.pending(), 0);
        })
        .await;
}

#[tokio::test(start_paused = true)]
async fn elapsed_time_tracks_tokio_clock() {
    LocalSet::new()
        .run_until(async {
            let host = TokioHost::new();
            let (timer, _recorder) = recorded_timer(&host, 200, None);
            timer.start().expect("start must succeed");

            sleep(Duration::from_millis(80)).await;
            assert_eq!(timer.elapsed_time(), 80);
            assert_eq!(timer.remaining_time(), 120);

            sleep(Duration::from_millis(300)).await;
            assert_eq!(timer.elapsed_time(), 200);
            assert_eq!(timer.remaining_time(), 0);
        })
        .await;
}

#[tokio::test(start_paused = true)]
async fn single_tick_due_from_start_not_first_poll() {
    LocalSet::new()
        .run_until(async {
            let host = TokioHost::new();
            let (timer, recorder) = recorded_timer(&host, 100, None);
            timer.start().expect("start must succeed");

            // Clock moves before the scheduled task gets its first poll.
            tokio::time::advance(Duration::from_millis(60)).await;
            sleep(Duration::from_millis(50)).await;
            assert_eq!(timer.remaining_time(), 0);
            assert_eq!(recorder.ticks(), 1);
            assert_eq!(recorder.completions(), 1);
            assert!(!timer.is_running());
            assert_eq!(host.pending(), 0);
        })
        .await;
}

#[tokio::test(start_paused = true)]
async fn interval_due_from_start_not_first_poll() {
    LocalSet::new()
        .run_until(async {
            let host = TokioHost::new();
            let (timer, recorder) = recorded_timer(&host, 50, Some(-1));
            timer.start().expect("start must succeed");

            tokio::time::advance(Duration::from_millis(30)).await;
            sleep(Duration::from_millis(25)).await;
            assert_eq!(recorder.ticks(), 1);

            sleep(Duration::from_millis(50)).await;
            assert_eq!(recorder.ticks(), 2);

            timer.stop();
            assert_eq!(host.pending(), 0);
        })
        .await;
}

#[tokio::test(start_paused = true)]
async fn infinite_timer_stopped_from_listener_on_tokio() {
    LocalSet::new()
        .run_until(async {
            let host = TokioHost::new();
            let (timer, recorder) = recorded_timer(&host, 50, Some(-1));
            let weak = timer.downgrade();
            let seen = Rc::new(Cell::new(0u32));
            let inner = Rc::clone(&seen);
            let stop_on_third = Listener::new(move |_: &TimerEvent<&'static str>| {
                inner.set(inner.get() + 1);
                if inner.get() == 3 {
                    if let Some(timer) = weak.upgrade() {
                        timer.stop();
                    }
                }
            });
            timer
                .add_event_listener(TimerEventType::Timer, Some(stop_on_third), None, false)
                .expect("listener must register");
            timer.start().expect("start must succeed");

            sleep(Duration::from_millis(175)).await;
            assert_eq!(recorder.ticks(), 3);
            assert_eq!(recorder.completions(), 1);
            assert!(!timer.is_running());
            assert!(timer.is_completed());
            assert_eq!(host.pending(), 0);

            sleep(Duration::from_millis(500)).await;
            assert_eq!(recorder.ticks(), 3);
            assert_eq!(seen.get(), 3);
            assert_eq!(recorder.completions(), 1);
        })
        .await;
}

#[tokio::test(start_paused = true)]
async fn infinite_timer_reset_from_listener_on_tokio() {
    LocalSet::new()
        .run_until(async {
            let host = TokioHost::new();
            let (timer, recorder) = recorded_timer(&host, 50, Some(-1));
            let weak = timer.downgrade();
            let seen = Rc::new(Cell::new(0u32));
            let inner = Rc::clone(&seen);
            let reset_on_second = Listener::new(move |_: &TimerEvent<&'static str>| {
                inner.set(inner.get() + 1);
                if inner.get() == 2 {
                    if let Some(timer) = weak.upgrade() {
                        timer.reset();
                    }
                }
            });
            timer
                .add_event_listener(TimerEventType::Timer, Some(reset_on_second), None, false)
                .expect("listener must register");
            timer.start().expect("start must succeed");

            sleep(Duration::from_millis(400)).await;
            assert_eq!(recorder.ticks(), 2);
            assert_eq!(recorder.completions(), 1);
            assert_eq!(timer.current_count(), 0);
            assert!(!timer.is_completed());
            assert!(!timer.is_running());
            assert_eq!(host.pending(), 0);
        })
        .await;
}
