#![forbid(unsafe_code)]

//! Release-velocity estimation from pointer samples.
//!
//! [`VelocityEstimator`] keeps a short history of screen-space positions for
//! the tracked pointer and fits a recency-weighted least-squares line through
//! the samples inside a 100ms horizon. The slope of that line is the velocity.
//!
//! # Invariants
//!
//! 1. Fewer than two samples inside the horizon yield zero velocity.
//! 2. A pointer that moved less than [`MIN_MOVEMENT_PX`] over more than
//!    [`ASSUME_STOPPED`] reports zero velocity on that axis.
//! 3. Samples are only ever compared against samples of the same pointer id;
//!    switching pointers restarts the history.
//! 4. After `clear()` the estimator reports zero until new samples arrive.
//!
//! # Failure Modes
//!
//! - Non-monotonic timestamps: samples older than the newest one are still
//!   accepted, but a negative age only widens the fit; no panic.
//! - Non-finite coordinates: the sample is dropped and logged.

use std::time::Duration;

use crate::event::{MotionEvent, PointerId};

/// Ring buffer capacity.
const HISTORY_SIZE: usize = 20;

/// Only samples this recent (relative to the newest) take part in the fit.
const HORIZON: Duration = Duration::from_millis(100);

/// Window after which a pointer that barely moved counts as stopped.
pub const ASSUME_STOPPED: Duration = Duration::from_millis(40);

/// Movement below this over [`ASSUME_STOPPED`] is treated as stationary.
pub const MIN_MOVEMENT_PX: f32 = 2.0;

/// Per-sample weight decay; index 0 is the newest sample.
const DECAY: f32 = 0.95;

// ---------------------------------------------------------------------------
// Velocity
// ---------------------------------------------------------------------------

/// A 2D velocity in pixels per second.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Velocity {
    pub x: f32,
    pub y: f32,
}

impl Velocity {
    /// Zero velocity.
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    /// Create a velocity vector.
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Length of the vector.
    #[inline]
    #[must_use]
    pub fn magnitude(self) -> f32 {
        self.x.hypot(self.y)
    }
}

// ---------------------------------------------------------------------------
// Axis tracker
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
struct Sample {
    time: Duration,
    value: f32,
}

/// One-dimensional tracker over a fixed ring buffer.
#[derive(Debug, Clone)]
struct AxisTracker {
    samples: [Option<Sample>; HISTORY_SIZE],
    index: usize,
}

impl Default for AxisTracker {
    fn default() -> Self {
        Self {
            samples: [None; HISTORY_SIZE],
            index: 0,
        }
    }
}

impl AxisTracker {
    fn push(&mut self, time: Duration, value: f32) {
        self.index = (self.index + 1) % HISTORY_SIZE;
        self.samples[self.index] = Some(Sample { time, value });
    }

    fn clear(&mut self) {
        *self = Self::default();
    }

    /// Velocity in units per second.
    fn velocity(&self) -> f32 {
        let Some(newest) = self.samples[self.index] else {
            return 0.0;
        };

        let mut values = [0.0f32; HISTORY_SIZE];
        let mut times = [0.0f32; HISTORY_SIZE];
        let mut count = 0;
        let mut oldest = newest;
        let mut cursor = self.index;

        while count < HISTORY_SIZE {
            let Some(sample) = self.samples[cursor] else {
                break;
            };
            let age = newest.time.saturating_sub(sample.time);
            if age > HORIZON {
                break;
            }
            oldest = sample;
            values[count] = sample.value;
            // Milliseconds, negative going back in time.
            times[count] = -(age.as_secs_f32() * 1000.0);
            count += 1;
            cursor = cursor.checked_sub(1).unwrap_or(HISTORY_SIZE - 1);
        }

        if count < 2 {
            return 0.0;
        }

        let span = newest.time.saturating_sub(oldest.time);
        if span > ASSUME_STOPPED && (newest.value - oldest.value).abs() < MIN_MOVEMENT_PX {
            return 0.0;
        }

        weighted_slope(&values[..count], &times[..count]) * 1000.0
    }
}

/// Slope of the recency-weighted least-squares line `value = a + b * time`.
fn weighted_slope(values: &[f32], times: &[f32]) -> f32 {
    let mut weight = 1.0f32;
    let (mut sw, mut st, mut sv, mut stt, mut stv) = (0.0f32, 0.0f32, 0.0f32, 0.0f32, 0.0f32);
    for (&v, &t) in values.iter().zip(times) {
        sw += weight;
        st += weight * t;
        sv += weight * v;
        stt += weight * t * t;
        stv += weight * t * v;
        weight *= DECAY;
    }
    let denom = sw * stt - st * st;
    if denom.abs() < f32::EPSILON {
        return 0.0;
    }
    (sw * stv - st * sv) / denom
}

// ---------------------------------------------------------------------------
// VelocityEstimator
// ---------------------------------------------------------------------------

/// Tracks one pointer and estimates its release velocity.
#[derive(Debug, Clone, Default)]
pub struct VelocityEstimator {
    pointer: Option<PointerId>,
    x: AxisTracker,
    y: AxisTracker,
}

impl VelocityEstimator {
    /// Create an empty estimator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a raw screen-space sample for the currently tracked pointer.
    pub fn add_sample(&mut self, time: Duration, x: f32, y: f32) {
        if !x.is_finite() || !y.is_finite() {
            tracing::warn!(target: "shade::touch", x, y, "dropping non-finite velocity sample");
            return;
        }
        self.x.push(time, x);
        self.y.push(time, y);
    }

    /// Record the tracked pointer of `event` in screen coordinates.
    ///
    /// Events that do not contain `pointer` are ignored. A change of tracked
    /// pointer restarts the history so two fingers are never fitted together.
    pub fn add_movement(&mut self, event: &MotionEvent, pointer: PointerId) {
        let Some(index) = event.find_pointer_index(pointer) else {
            return;
        };
        if self.pointer != Some(pointer) {
            self.x.clear();
            self.y.clear();
            self.pointer = Some(pointer);
        }
        let (x, y) = event.raw_position(index);
        self.add_sample(event.event_time, x, y);
    }

    /// Current velocity estimate in px/s.
    #[must_use]
    pub fn velocity(&self) -> Velocity {
        Velocity::new(self.x.velocity(), self.y.velocity())
    }

    /// Forget all samples.
    pub fn clear(&mut self) {
        self.pointer = None;
        self.x.clear();
        self.y.clear();
    }
}
