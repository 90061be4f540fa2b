#![allow(clippy::float_cmp)]

use std::cell::Cell;
use std::rc::Rc;

use super::*;

fn counter() -> (Rc<Cell<u32>>, IntervalCallback) {
    let count = Rc::new(Cell::new(0));
    let c = count.clone();
    (count, Box::new(move || c.set(c.get() + 1)))
}

// =============================================================================
// Intervals
// =============================================================================

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn interval_fires_once_per_period() {
    let host = TokioScheduler::new(Duration::from_millis(16));
    let (count, cb) = counter();
    host.set_interval(100.0, cb).expect("interval");
    host.run_for(Duration::from_millis(350)).await;
    assert_eq!(count.get(), 3);
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn cleared_interval_stops_firing() {
    let host = TokioScheduler::new(Duration::from_millis(16));
    let (count, cb) = counter();
    let handle = host.set_interval(10.0, cb).expect("interval");
    host.run_for(Duration::from_millis(25)).await;
    host.clear_interval(handle);
    host.run_for(Duration::from_millis(100)).await;
    assert_eq!(count.get(), 2);
    assert_eq!(host.active_intervals(), 0);
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn callback_may_clear_itself() {
    let host = Rc::new(TokioScheduler::new(Duration::from_millis(16)));
    let slot: Rc<Cell<Option<TimerHandle>>> = Rc::new(Cell::new(None));
    let count = Rc::new(Cell::new(0));
    let (h, s, c) = (host.clone(), slot.clone(), count.clone());
    let handle = host
        .set_interval(
            5.0,
            Box::new(move || {
                c.set(c.get() + 1);
                if let Some(timer) = s.get() {
                    h.clear_interval(timer);
                }
            }),
        )
        .expect("interval");
    slot.set(Some(handle));
    host.run_for(Duration::from_millis(50)).await;
    assert_eq!(count.get(), 1);
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn non_finite_period_is_rejected() {
    let host = TokioScheduler::new(Duration::from_millis(16));
    let (_, cb) = counter();
    let err = host.set_interval(f64::NAN, cb).expect_err("nan");
    assert_eq!(err.error_code(), "E_SCHEDULE_HOST");
}

// =============================================================================
// Frames
// =============================================================================

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn frames_run_on_frame_period() {
    let host = Rc::new(TokioScheduler::new(Duration::from_millis(20)));
    let seen = Rc::new(RefCell::new(Vec::new()));

    fn request(host: &Rc<TokioScheduler>, seen: &Rc<RefCell<Vec<f64>>>) {
        let (h, s) = (host.clone(), seen.clone());
        host.request_frame(Box::new(move || {
            s.borrow_mut().push(h.now());
            request(&h, &s);
        }))
        .expect("frame");
    }
    request(&host, &seen);

    host.run_for(Duration::from_millis(100)).await;
    assert_eq!(*seen.borrow(), vec![20.0, 40.0, 60.0, 80.0, 100.0]);
    assert_eq!(host.frames_run(), 5);
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn idle_frames_are_not_counted() {
    let host = TokioScheduler::new(Duration::from_millis(10));
    host.run_for(Duration::from_millis(100)).await;
    assert_eq!(host.frames_run(), 0);
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn clock_starts_at_zero() {
    let host = TokioScheduler::new(Duration::from_millis(16));
    assert_eq!(host.now(), 0.0);
    tokio::time::advance(Duration::from_millis(250)).await;
    assert_eq!(host.now(), 250.0);
}
