#![forbid(unsafe_code)]

//! Frame-driven animation primitives for the shade.
//!
//! Everything here is advanced explicitly by the host frame clock through
//! [`Animation::tick`]; nothing schedules itself.
//!
//! - [`Interpolator`]: monotonic easing curves mapping `[0, 1] -> [0, 1]`
//!   (plus the bounce curve used by the unlock hint).
//! - [`Tween`]: a fixed-duration interpolation between two values.
//! - [`FlingProfile`]: picks duration and curve for a release-velocity fling.
//!
//! # Invariants
//!
//! 1. Every easing maps 0 to 0 and 1 to 1; inputs outside `[0, 1]` are
//!    clamped first.
//! 2. The Material bezier curves are monotonic non-decreasing on `[0, 1]`.

pub mod fling;
pub mod tween;

pub use fling::{FlingProfile, FlingSpec};
pub use tween::Tween;

use std::time::Duration;

/// A frame-driven animation.
pub trait Animation {
    /// Advance by `dt`.
    fn tick(&mut self, dt: Duration);

    /// Whether the animation has reached its end.
    fn is_complete(&self) -> bool;

    /// Eased progress in `[0.0, 1.0]`.
    fn value(&self) -> f32;

    /// Return to the start.
    fn reset(&mut self);

    /// Time carried past the end on the last tick.
    fn overshoot(&self) -> Duration {
        Duration::ZERO
    }
}

/// A plain easing function.
pub type EasingFn = fn(f32) -> f32;

// ---------------------------------------------------------------------------
// Interpolator
// ---------------------------------------------------------------------------

/// Easing curve applied to animation progress.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Interpolator {
    /// Identity.
    #[default]
    Linear,
    /// Cubic bezier through `(0,0)`, `(x1,y1)`, `(x2,y2)`, `(1,1)`.
    CubicBezier { x1: f32, y1: f32, x2: f32, y2: f32 },
    /// Decaying bounce that lands at 1.
    Bounce,
    /// Saturating exponential `1 - e^(-4x)`, used for rubber-banding.
    Saturate,
}

impl Interpolator {
    /// Material standard curve.
    pub const FAST_OUT_SLOW_IN: Self = Self::bezier(0.4, 0.0, 0.2, 1.0);
    /// Material deceleration curve.
    pub const LINEAR_OUT_SLOW_IN: Self = Self::bezier(0.0, 0.0, 0.2, 1.0);
    /// Material acceleration curve.
    pub const FAST_OUT_LINEAR_IN: Self = Self::bezier(0.4, 0.0, 1.0, 1.0);
    /// Curve for canned collapses that dismiss the lock screen.
    pub const PANEL_CLOSE_ACCELERATED: Self = Self::bezier(0.3, 0.0, 0.5, 1.0);

    /// Build a cubic bezier curve.
    #[must_use]
    pub const fn bezier(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self::CubicBezier { x1, y1, x2, y2 }
    }

    /// Apply the curve to a linear fraction.
    #[must_use]
    pub fn transform(self, t: f32) -> f32 {
        match self {
            Self::Linear => linear(t),
            Self::CubicBezier { x1, y1, x2, y2 } => cubic_bezier(x1, y1, x2, y2, t),
            Self::Bounce => bounce(t),
            Self::Saturate => saturate_exp(t),
        }
    }
}

// ---------------------------------------------------------------------------
// Easing functions
// ---------------------------------------------------------------------------

/// Identity easing, clamped.
#[must_use]
pub fn linear(t: f32) -> f32 {
    t.clamp(0.0, 1.0)
}

/// Material standard curve as a plain function.
#[must_use]
pub fn fast_out_slow_in(t: f32) -> f32 {
    Interpolator::FAST_OUT_SLOW_IN.transform(t)
}

/// Rubber-band saturation: fast initial response that flattens toward 1.
#[must_use]
pub fn saturate_exp(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    if t >= 1.0 {
        return 1.0;
    }
    (1.0 - (-4.0 * t).exp()).max(0.0)
}

/// Three-hop bounce landing on 1.
#[must_use]
pub fn bounce(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    if t >= 1.0 {
        return 1.0;
    }
    let t = t * 1.1226;
    let hop = |t: f32| t * t * 8.0;
    if t < 0.3535 {
        hop(t)
    } else if t < 0.7408 {
        hop(t - 0.54719) + 0.7
    } else if t < 0.9644 {
        hop(t - 0.8526) + 0.9
    } else {
        hop(t - 1.0435) + 0.95
    }
}

/// Linear interpolation between `a` and `b`.
#[inline]
#[must_use]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Clamp to `[0, 1]`.
#[inline]
#[must_use]
pub fn saturate(v: f32) -> f32 {
    if v.is_nan() { 0.0 } else { v.clamp(0.0, 1.0) }
}

/// Solve a unit cubic bezier for `y` at the given `x` fraction.
///
/// Newton-Raphson first, bisection when the derivative flattens out.
fn cubic_bezier(x1: f32, y1: f32, x2: f32, y2: f32, fraction: f32) -> f32 {
    if fraction.is_nan() || fraction <= 0.0 {
        return 0.0;
    }
    if fraction >= 1.0 {
        return 1.0;
    }

    let cx = 3.0 * x1;
    let bx = 3.0 * (x2 - x1) - cx;
    let ax = 1.0 - cx - bx;
    let cy = 3.0 * y1;
    let by = 3.0 * (y2 - y1) - cy;
    let ay = 1.0 - cy - by;

    let sample = |a: f32, b: f32, c: f32, t: f32| ((a * t + b) * t + c) * t;
    let slope = |a: f32, b: f32, c: f32, t: f32| (3.0 * a * t + 2.0 * b) * t + c;

    let mut t = fraction;
    let mut solved = false;
    for _ in 0..8 {
        let err = sample(ax, bx, cx, t) - fraction;
        if err.abs() < 1e-6 {
            solved = true;
            break;
        }
        let d = slope(ax, bx, cx, t);
        if d.abs() < 1e-6 {
            break;
        }
        t = (t - err / d).clamp(0.0, 1.0);
    }

    if !solved {
        let (mut lo, mut hi) = (0.0f32, 1.0f32);
        t = fraction;
        for _ in 0..24 {
            let err = sample(ax, bx, cx, t) - fraction;
            if err.abs() < 1e-6 {
                break;
            }
            if err > 0.0 {
                hi = t;
            } else {
                lo = t;
            }
            t = 0.5 * (lo + hi);
        }
    }

    sample(ay, by, cy, t).clamp(0.0, 1.0)
}
