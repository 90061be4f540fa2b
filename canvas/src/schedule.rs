//! Host scheduling primitives.
//!
//! The engine never reaches for ambient timers: every frame callback and
//! periodic timer goes through a [`Scheduler`] handle that the host passes in
//! explicitly. Two independent sources of work run through it (display
//! frames and actor timers) and they are not synchronized with each other.
//!
//! [`ManualScheduler`] is a deterministic host on a virtual clock. Time moves
//! only when [`ManualScheduler::advance`] is called, and frame callbacks run
//! only on [`ManualScheduler::run_frame`].

#[cfg(test)]
#[path = "schedule_test.rs"]
mod schedule_test;

use std::cell::RefCell;
use std::collections::BTreeMap;

use crate::error::ScheduleError;

/// Shortest interval period a host honors, in milliseconds.
const MIN_INTERVAL_MS: f64 = 1.0;

/// Callback run once on the next display frame.
pub type FrameCallback = Box<dyn FnOnce()>;

/// Callback run every period until cleared.
pub type IntervalCallback = Box<dyn FnMut()>;

/// Identifies an installed periodic timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerHandle(pub u64);

/// Frame and timer primitives provided by the host.
pub trait Scheduler {
    /// Milliseconds on the host clock.
    fn now(&self) -> f64;

    /// Run `callback` once, as soon as appropriate for the next frame.
    ///
    /// # Errors
    ///
    /// Returns [`ScheduleError::Host`] if the host cannot queue the callback.
    fn request_frame(&self, callback: FrameCallback) -> Result<(), ScheduleError>;

    /// Run `callback` every `period_ms` until cleared.
    ///
    /// # Errors
    ///
    /// Returns [`ScheduleError::Host`] if the host cannot install the timer.
    fn set_interval(&self, period_ms: f64, callback: IntervalCallback) -> Result<TimerHandle, ScheduleError>;

    /// Stop a timer. Unknown handles are ignored.
    fn clear_interval(&self, timer: TimerHandle);
}

struct Interval {
    period: f64,
    next_due: f64,
    // Taken out while the callback runs.
    callback: Option<IntervalCallback>,
}

#[derive(Default)]
struct ManualState {
    now: f64,
    next_id: u64,
    frames: Vec<FrameCallback>,
    intervals: BTreeMap<u64, Interval>,
}

/// Virtual-clock scheduler for tests and deterministic hosts.
#[derive(Default)]
pub struct ManualScheduler {
    state: RefCell<ManualState>,
}

impl ManualScheduler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Move the clock forward, firing every interval that falls due on the
    /// way in time order (ties in installation order).
    pub fn advance(&self, ms: f64) {
        let target = self.state.borrow().now + ms.max(0.0);

        while let Some((id, mut callback)) = self.take_due(target) {
            callback();
            let mut state = self.state.borrow_mut();
            // Cleared from inside its own callback: drop it.
            if let Some(interval) = state.intervals.get_mut(&id) {
                interval.callback = Some(callback);
            }
        }

        self.state.borrow_mut().now = target;
    }

    fn take_due(&self, target: f64) -> Option<(u64, IntervalCallback)> {
        let mut state = self.state.borrow_mut();
        let (id, due) = state
            .intervals
            .iter()
            .filter(|(_, interval)| interval.callback.is_some() && interval.next_due <= target)
            .map(|(id, interval)| (*id, interval.next_due))
            .min_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)))?;

        state.now = due;
        let interval = state.intervals.get_mut(&id)?;
        interval.next_due += interval.period;
        interval.callback.take().map(|callback| (id, callback))
    }

    /// Run every frame callback queued so far. Callbacks queued while these
    /// run wait for the next call. Returns how many ran.
    pub fn run_frame(&self) -> usize {
        let frames = std::mem::take(&mut self.state.borrow_mut().frames);
        let count = frames.len();
        for frame in frames {
            frame();
        }
        count
    }

    /// Advance by `ms`, then run one frame.
    pub fn step(&self, ms: f64) -> usize {
        self.advance(ms);
        self.run_frame()
    }

    #[must_use]
    pub fn pending_frames(&self) -> usize {
        self.state.borrow().frames.len()
    }

    #[must_use]
    pub fn active_intervals(&self) -> usize {
        self.state.borrow().intervals.len()
    }
}

impl Scheduler for ManualScheduler {
    fn now(&self) -> f64 {
        self.state.borrow().now
    }

    fn request_frame(&self, callback: FrameCallback) -> Result<(), ScheduleError> {
        self.state
            .try_borrow_mut()
            .map_err(|_| ScheduleError::Host("scheduler busy".into()))?
            .frames
            .push(callback);
        Ok(())
    }

    fn set_interval(&self, period_ms: f64, callback: IntervalCallback) -> Result<TimerHandle, ScheduleError> {
        let mut state = self
            .state
            .try_borrow_mut()
            .map_err(|_| ScheduleError::Host("scheduler busy".into()))?;
        let period = period_ms.max(MIN_INTERVAL_MS);
        let id = state.next_id;
        state.next_id += 1;
        let next_due = state.now + period;
        state.intervals.insert(id, Interval { period, next_due, callback: Some(callback) });
        Ok(TimerHandle(id))
    }

    fn clear_interval(&self, timer: TimerHandle) {
        if let Ok(mut state) = self.state.try_borrow_mut() {
            state.intervals.remove(&timer.0);
        }
    }
}
