#![forbid(unsafe_code)]

//! Velocity-fitted fling timing.
//!
//! [`FlingProfile`] picks a duration and easing curve so that a fling starts
//! at (roughly) the release velocity and decelerates into its target. Longer
//! travel gets proportionally more time, capped by `max_length`.
//!
//! # Invariants
//!
//! 1. The returned duration never exceeds
//!    `max_length * sqrt(distance / max_distance)`.
//! 2. Slow or zero velocities fall back to the standard curve at the capped
//!    duration rather than dividing by zero.

use std::time::Duration;

use super::{Interpolator, lerp};

/// Start gradient of the deceleration curve at zero speed-up.
const START_GRADIENT: f32 = 0.75;
/// Control-point x2 of the deceleration curve with no speed-up.
const SLOW_IN_X2: f32 = 0.35;
/// Control-point x2 of the deceleration curve at full speed-up.
const SLOW_IN_X2_MAX: f32 = 0.68;

/// Duration and easing for one fling.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlingSpec {
    pub duration: Duration,
    pub interpolator: Interpolator,
}

/// Tuning for a family of flings (opening, closing or dismissing).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlingProfile {
    /// Upper bound for a full-distance fling.
    pub max_length: Duration,
    /// How much faster-than-linear the curve starts for slow releases.
    pub speed_up_factor: f32,
    /// Control point `(x2, y2)` of the deceleration curve.
    pub x2: f32,
    pub y2: f32,
    /// Releases slower than this (px/s) use the standard curve.
    pub min_velocity: f32,
    /// Releases at or above this (px/s) get the steepest start.
    pub high_velocity: f32,
}

impl FlingProfile {
    /// Default slow-velocity threshold in dp/s.
    pub const MIN_VELOCITY_DP: f32 = 250.0;
    /// Default high-velocity threshold in dp/s.
    pub const HIGH_VELOCITY_DP: f32 = 3000.0;

    /// Build a profile whose control point follows the speed-up factor.
    #[must_use]
    pub fn new(max_length: Duration, speed_up_factor: f32, density: f32) -> Self {
        Self {
            max_length,
            speed_up_factor,
            x2: lerp(SLOW_IN_X2, SLOW_IN_X2_MAX, speed_up_factor),
            y2: 1.0,
            min_velocity: Self::MIN_VELOCITY_DP * density,
            high_velocity: Self::HIGH_VELOCITY_DP * density,
        }
    }

    /// Override the curve's second control point (builder pattern).
    #[must_use]
    pub fn with_control_point(mut self, x2: f32, y2: f32) -> Self {
        self.x2 = x2;
        self.y2 = y2;
        self
    }

    /// Fit a fling from `current` to `target` starting at `velocity` px/s.
    ///
    /// `max_distance` is the travel that earns the full `max_length`.
    #[must_use]
    pub fn apply(&self, current: f32, target: f32, velocity: f32, max_distance: f32) -> FlingSpec {
        let diff = (target - current).abs();
        let max_secs = if max_distance > 0.0 {
            self.max_length.as_secs_f32() * (diff / max_distance).sqrt()
        } else {
            self.max_length.as_secs_f32()
        };
        let vel_abs = velocity.abs();
        let velocity_factor = if self.speed_up_factor == 0.0 || self.high_velocity <= 0.0 {
            1.0
        } else {
            (vel_abs / self.high_velocity).min(1.0)
        };
        let start_gradient = lerp(START_GRADIENT, self.y2 / self.x2, velocity_factor);
        let speed_up = self.speed_up_factor * (1.0 - velocity_factor);
        let slow_in = Interpolator::bezier(speed_up, speed_up * start_gradient, self.x2, self.y2);

        let fitted_secs = if vel_abs > 0.0 {
            start_gradient * diff / vel_abs
        } else {
            f32::INFINITY
        };

        let (secs, interpolator) = if fitted_secs <= max_secs {
            (fitted_secs, slow_in)
        } else if vel_abs >= self.min_velocity {
            (max_secs, slow_in)
        } else {
            (max_secs, Interpolator::FAST_OUT_SLOW_IN)
        };

        let secs = if secs.is_finite() { secs.max(0.0) } else { 0.0 };
        FlingSpec {
            duration: Duration::from_secs_f32(secs),
            interpolator,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opening() -> FlingProfile {
        FlingProfile::new(Duration::from_millis(600), 0.6, 1.0)
    }

    #[test]
    fn fast_fling_is_short() {
        let spec = opening().apply(0.0, 1000.0, 9000.0, 1000.0);
        assert!(spec.duration < Duration::from_millis(300), "{:?}", spec.duration);
    }

    #[test]
    fn zero_velocity_uses_standard_curve_at_cap() {
        let spec = opening().apply(0.0, 1000.0, 0.0, 1000.0);
        assert_eq!(spec.interpolator, Interpolator::FAST_OUT_SLOW_IN);
        let ms = spec.duration.as_millis();
        assert!((599..=600).contains(&ms), "{ms}");
    }

    #[test]
    fn short_distance_shortens_cap() {
        let spec = opening().apply(0.0, 250.0, 0.0, 1000.0);
        // sqrt(0.25) * 600ms
        let ms = spec.duration.as_millis();
        assert!((299..=300).contains(&ms), "{ms}");
    }

    #[test]
    fn duration_never_exceeds_cap() {
        let p = opening();
        for v in [1.0, 100.0, 300.0, 1200.0, 5000.0, -800.0] {
            let spec = p.apply(100.0, 900.0, v, 1000.0);
            let cap = 0.6 * (800.0f32 / 1000.0).sqrt();
            assert!(spec.duration.as_secs_f32() <= cap + 1e-3, "v={v}");
        }
    }

    #[test]
    fn zero_distance_is_instant() {
        let spec = opening().apply(500.0, 500.0, 2000.0, 1000.0);
        assert_eq!(spec.duration, Duration::ZERO);
    }

    #[test]
    fn density_scales_thresholds() {
        let p = FlingProfile::new(Duration::from_millis(600), 0.6, 2.0);
        assert_eq!(p.min_velocity, 500.0);
        assert_eq!(p.high_velocity, 6000.0);
    }
}
