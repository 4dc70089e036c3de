#![forbid(unsafe_code)]

//! Fixed-duration interpolation between two values.

use std::time::Duration;

use super::{Animation, Interpolator};

/// Interpolates `from -> to` over `duration` along an [`Interpolator`].
///
/// A zero duration completes on construction and reports `to`.
#[derive(Debug, Clone, PartialEq)]
pub struct Tween {
    from: f32,
    to: f32,
    duration: Duration,
    elapsed: Duration,
    interpolator: Interpolator,
    overshoot: Duration,
}

impl Tween {
    /// Create a linear tween.
    #[must_use]
    pub fn new(from: f32, to: f32, duration: Duration) -> Self {
        Self {
            from,
            to,
            duration,
            elapsed: Duration::ZERO,
            interpolator: Interpolator::Linear,
            overshoot: Duration::ZERO,
        }
    }

    /// Set the easing curve (builder pattern).
    #[must_use]
    pub fn with_interpolator(mut self, interpolator: Interpolator) -> Self {
        self.interpolator = interpolator;
        self
    }

    /// Start value.
    #[inline]
    #[must_use]
    pub fn start_value(&self) -> f32 {
        self.from
    }

    /// End value.
    #[inline]
    #[must_use]
    pub fn end_value(&self) -> f32 {
        self.to
    }

    /// Total duration.
    #[inline]
    #[must_use]
    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Time advanced so far, capped at the duration.
    #[inline]
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Easing curve.
    #[inline]
    #[must_use]
    pub fn interpolator(&self) -> Interpolator {
        self.interpolator
    }

    /// Linear time fraction in `[0, 1]`.
    #[must_use]
    pub fn fraction(&self) -> f32 {
        if self.duration.is_zero() {
            return 1.0;
        }
        (self.elapsed.as_secs_f32() / self.duration.as_secs_f32()).clamp(0.0, 1.0)
    }

    /// Interpolated value between `from` and `to`.
    #[must_use]
    pub fn current(&self) -> f32 {
        if self.is_complete() {
            return self.to;
        }
        super::lerp(self.from, self.to, self.value())
    }
}

impl Animation for Tween {
    fn tick(&mut self, dt: Duration) {
        let next = self.elapsed + dt;
        if next >= self.duration {
            self.overshoot = next - self.duration;
            self.elapsed = self.duration;
        } else {
            self.overshoot = Duration::ZERO;
            self.elapsed = next;
        }
    }

    fn is_complete(&self) -> bool {
        self.elapsed >= self.duration
    }

    fn value(&self) -> f32 {
        self.interpolator.transform(self.fraction())
    }

    fn reset(&mut self) {
        self.elapsed = Duration::ZERO;
        self.overshoot = Duration::ZERO;
    }

    fn overshoot(&self) -> Duration {
        self.overshoot
    }
}
