//! Native host: frames and timers on the tokio clock.
//!
//! DESIGN
//! ======
//! The canvas crate asks its host for two primitives: "run this on the next
//! frame" and "run this every N ms until cleared". Callbacks capture `Rc`
//! handles, so they stay on this thread: instead of spawning a task per
//! timer, `TokioScheduler` keeps its own table of frames and intervals and
//! `run_for` drives both from a single loop. Frames tick on a fixed period
//! (there is no display to sync with); intervals fire when their deadline
//! passes, earliest first.
//!
//! Time comes from `tokio::time::Instant`, so a paused test runtime drives
//! the whole session deterministically.

#[cfg(test)]
#[path = "host_test.rs"]
mod host_test;

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::time::Duration;

use joy_canvas::error::ScheduleError;
use joy_canvas::schedule::{FrameCallback, IntervalCallback, Scheduler, TimerHandle};
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, trace};

const MIN_INTERVAL: Duration = Duration::from_millis(1);

struct Interval {
    period: Duration,
    next_due: Instant,
    // Taken out while the callback runs.
    callback: Option<IntervalCallback>,
}

pub struct TokioScheduler {
    origin: Instant,
    frame_period: Duration,
    next_id: Cell<u64>,
    frames: RefCell<Vec<FrameCallback>>,
    intervals: RefCell<BTreeMap<u64, Interval>>,
    frames_run: Cell<u64>,
}

impl TokioScheduler {
    #[must_use]
    pub fn new(frame_period: Duration) -> Self {
        Self {
            origin: Instant::now(),
            frame_period: frame_period.max(MIN_INTERVAL),
            next_id: Cell::new(0),
            frames: RefCell::new(Vec::new()),
            intervals: RefCell::new(BTreeMap::new()),
            frames_run: Cell::new(0),
        }
    }

    /// Drive frames and intervals for `duration`, then return.
    pub async fn run_for(&self, duration: Duration) {
        let deadline = Instant::now() + duration;
        let mut frames = tokio::time::interval_at(Instant::now() + self.frame_period, self.frame_period);
        frames.set_missed_tick_behavior(MissedTickBehavior::Skip);
        debug!(duration_ms = duration.as_millis(), frame_ms = self.frame_period.as_millis(), "host loop started");

        loop {
            let next_timer = self.next_due();
            tokio::select! {
                biased;
                () = sleep_until_due(next_timer) => self.fire_due(Instant::now()),
                _ = frames.tick() => self.run_frame(),
                () = tokio::time::sleep_until(deadline) => break,
            }
        }

        debug!(frames = self.frames_run.get(), "host loop finished");
    }

    /// Frame callbacks run so far.
    #[must_use]
    pub fn frames_run(&self) -> u64 {
        self.frames_run.get()
    }

    #[must_use]
    pub fn active_intervals(&self) -> usize {
        self.intervals.borrow().len()
    }

    fn next_due(&self) -> Option<Instant> {
        self.intervals
            .borrow()
            .values()
            .filter(|interval| interval.callback.is_some())
            .map(|interval| interval.next_due)
            .min()
    }

    fn run_frame(&self) {
        let frames = std::mem::take(&mut *self.frames.borrow_mut());
        if frames.is_empty() {
            return;
        }
        trace!(callbacks = frames.len(), "frame");
        for frame in frames {
            frame();
        }
        self.frames_run.set(self.frames_run.get() + 1);
    }

    fn fire_due(&self, now: Instant) {
        while let Some((id, mut callback)) = self.take_due(now) {
            callback();
            // Gone if the callback cleared its own interval.
            if let Some(interval) = self.intervals.borrow_mut().get_mut(&id) {
                interval.callback = Some(callback);
            }
        }
    }

    fn take_due(&self, now: Instant) -> Option<(u64, IntervalCallback)> {
        let mut intervals = self.intervals.borrow_mut();
        let (id, _) = intervals
            .iter()
            .filter(|(_, interval)| interval.callback.is_some() && interval.next_due <= now)
            .map(|(id, interval)| (*id, interval.next_due))
            .min_by_key(|(id, due)| (*due, *id))?;

        let interval = intervals.get_mut(&id)?;
        interval.next_due += interval.period;
        interval.callback.take().map(|callback| (id, callback))
    }
}

async fn sleep_until_due(due: Option<Instant>) {
    match due {
        Some(due) => tokio::time::sleep_until(due).await,
        None => std::future::pending().await,
    }
}

impl Scheduler for TokioScheduler {
    fn now(&self) -> f64 {
        #[allow(clippy::cast_precision_loss)]
        let micros = self.origin.elapsed().as_micros() as f64;
        micros / 1000.0
    }

    fn request_frame(&self, callback: FrameCallback) -> Result<(), ScheduleError> {
        self.frames
            .try_borrow_mut()
            .map_err(|_| ScheduleError::Host("frame queue busy".into()))?
            .push(callback);
        Ok(())
    }

    fn set_interval(&self, period_ms: f64, callback: IntervalCallback) -> Result<TimerHandle, ScheduleError> {
        if !period_ms.is_finite() {
            return Err(ScheduleError::Host(format!("invalid interval period: {period_ms}")));
        }
        let period = Duration::from_secs_f64(period_ms.max(0.0) / 1000.0).max(MIN_INTERVAL);
        let mut intervals = self
            .intervals
            .try_borrow_mut()
            .map_err(|_| ScheduleError::Host("timer table busy".into()))?;

        let id = self.next_id.get();
        self.next_id.set(id + 1);
        intervals.insert(id, Interval { period, next_due: Instant::now() + period, callback: Some(callback) });
        trace!(id, period_ms = period.as_millis(), "interval installed");
        Ok(TimerHandle(id))
    }

    fn clear_interval(&self, timer: TimerHandle) {
        if let Ok(mut intervals) = self.intervals.try_borrow_mut() {
            intervals.remove(&timer.0);
        }
    }
}
