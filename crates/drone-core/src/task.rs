//! Cancellable periodic tasks driven by a host frame clock.
//!
//! The host calls into the synth once per display/control frame. Work that
//! should only happen while something is running (parameter smoothing,
//! meters) is gated by a [`PeriodicTask`]: schedule it, poll it every frame,
//! cancel it before tearing down whatever it touches.
//!
//! [`FrameClock`] is a fixed-rate frame source for hosts without a display
//! (tests, the CLI).
//!
//! # Example
//!
//! ```rust
//! use drone_core::{FrameClock, PeriodicTask};
//!
//! let mut clock = FrameClock::new(60.0);
//! let mut task = PeriodicTask::new("smoothing");
//! task.schedule();
//!
//! for _ in 0..3 {
//!     let _frame = clock.next_frame();
//!     if task.poll() {
//!         // do the per-frame work
//!     }
//! }
//! assert_eq!(task.ticks(), 3);
//!
//! task.cancel();
//! assert!(!task.poll());
//! ```

/// Scheduling state of a [`PeriodicTask`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TaskState {
    /// Never scheduled.
    #[default]
    Idle,
    /// Runs on every poll.
    Scheduled,
    /// Was scheduled, then cancelled.
    Cancelled,
}

/// A unit of per-frame work that can be scheduled and cancelled.
#[derive(Debug, Clone)]
pub struct PeriodicTask {
    name: &'static str,
    state: TaskState,
    /// Polls that ran since the last `schedule()`.
    ticks: u64,
    /// Number of times the task has been scheduled.
    generation: u64,
}

impl PeriodicTask {
    /// Creates an idle task.
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            state: TaskState::Idle,
            ticks: 0,
            generation: 0,
        }
    }

    /// Starts (or restarts) the task. The tick counter is reset.
    pub fn schedule(&mut self) {
        self.state = TaskState::Scheduled;
        self.ticks = 0;
        self.generation += 1;
        tracing::debug!("task {} scheduled (generation {})", self.name, self.generation);
    }

    /// Stops the task. Returns `true` if it was scheduled.
    pub fn cancel(&mut self) -> bool {
        let was_scheduled = self.is_scheduled();
        if was_scheduled {
            self.state = TaskState::Cancelled;
            tracing::debug!("task {} cancelled after {} ticks", self.name, self.ticks);
        }
        was_scheduled
    }

    /// Returns `true` (and counts a tick) if the task should run this frame.
    pub fn poll(&mut self) -> bool {
        if self.is_scheduled() {
            self.ticks += 1;
            true
        } else {
            false
        }
    }

    /// Returns `true` while the task is scheduled.
    #[inline]
    pub fn is_scheduled(&self) -> bool {
        self.state == TaskState::Scheduled
    }

    /// Current state.
    #[inline]
    pub fn state(&self) -> TaskState {
        self.state
    }

    /// Task name, for logs.
    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Polls that ran since the last `schedule()`.
    #[inline]
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Number of times the task has been scheduled.
    #[inline]
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// One frame from a [`FrameClock`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Frame {
    /// Frame number, starting at 0.
    pub index: u64,
    /// Time of this frame in seconds since the clock started.
    pub time: f64,
    /// Seconds since the previous frame.
    pub delta: f64,
}

/// Fixed-rate frame source.
#[derive(Debug, Clone)]
pub struct FrameClock {
    rate_hz: f64,
    index: u64,
}

impl FrameClock {
    /// Creates a clock ticking at `rate_hz` frames per second (minimum 1).
    pub fn new(rate_hz: f64) -> Self {
        Self {
            rate_hz: rate_hz.max(1.0),
            index: 0,
        }
    }

    /// Frames per second.
    pub fn rate_hz(&self) -> f64 {
        self.rate_hz
    }

    /// Seconds per frame.
    pub fn period(&self) -> f64 {
        1.0 / self.rate_hz
    }

    /// Produces the next frame.
    pub fn next_frame(&mut self) -> Frame {
        let frame = Frame {
            index: self.index,
            time: self.index as f64 * self.period(),
            delta: self.period(),
        };
        self.index += 1;
        frame
    }

    /// Number of frames produced.
    pub fn frames(&self) -> u64 {
        self.index
    }
}
