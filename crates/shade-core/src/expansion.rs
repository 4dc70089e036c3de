#![forbid(unsafe_code)]

//! Single source of truth for how far the shade is pulled down.
//!
//! [`ExpansionState`] owns the base height, the derived fraction, the separate
//! overscroll channel and the gesture/animation flags. Every other component
//! reads and writes the panel position through it.
//!
//! # Invariants
//!
//! 1. `0 <= height <= max_travel_distance`.
//! 2. `fraction == height / max_travel_distance` (0 when the max is 0),
//!    always within `[0, 1]`.
//! 3. `0 <= over_expansion <= 2 * overshoot_px`.
//! 4. Setting a height below 1px while `CLOSING` is set stores exactly 0 and
//!    reports [`HeightUpdate::snapped_closed`] so the caller can end its
//!    animator.
//!
//! # Failure Modes
//!
//! - NaN heights are rejected with a warning and leave the state untouched.
//! - A non-finite or negative max travel distance is treated as 0.

use bitflags::bitflags;

use crate::animation::{Interpolator, saturate};

bitflags! {
    /// Gesture and animation flags of the panel.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ExpansionFlags: u8 {
        /// A finger drag is moving the panel.
        const TRACKING          = 0b0000_0001;
        /// A collapse is in progress.
        const CLOSING           = 0b0000_0010;
        /// Expanding bookkeeping was started and not yet finished.
        const EXPANDING         = 0b0000_0100;
        /// A programmatic expand is waiting for its layout pass.
        const INSTANT_EXPANDING = 0b0000_1000;
    }
}

/// Result of a height mutation.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct HeightUpdate {
    /// The height actually stored.
    pub height: f32,
    /// Whether the closing snap to 0 fired.
    pub snapped_closed: bool,
    /// Whether the request was rejected (NaN).
    pub rejected: bool,
}

/// Externally visible expansion snapshot published after every mutation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExpansionChange {
    pub fraction: f32,
    pub expanded: bool,
    pub tracking: bool,
    pub drag_down_amount_px: f32,
}

/// Height bookkeeping for the shade.
#[derive(Debug, Clone)]
pub struct ExpansionState {
    height: f32,
    fraction: f32,
    over_expansion: f32,
    max_travel: f32,
    overshoot_px: f32,
    drag_down_amount: f32,
    last_gestured_over: Option<f32>,
    flags: ExpansionFlags,
}

impl ExpansionState {
    /// A fully collapsed panel with the given overshoot unit.
    #[must_use]
    pub fn new(overshoot_px: f32) -> Self {
        Self {
            height: 0.0,
            fraction: 0.0,
            over_expansion: 0.0,
            max_travel: 0.0,
            overshoot_px: overshoot_px.max(0.0),
            drag_down_amount: 0.0,
            last_gestured_over: None,
            flags: ExpansionFlags::empty(),
        }
    }

    // -- accessors ----------------------------------------------------------

    #[inline]
    #[must_use]
    pub fn height(&self) -> f32 {
        self.height
    }

    #[inline]
    #[must_use]
    pub fn fraction(&self) -> f32 {
        self.fraction
    }

    #[inline]
    #[must_use]
    pub fn over_expansion(&self) -> f32 {
        self.over_expansion
    }

    #[inline]
    #[must_use]
    pub fn max_travel_distance(&self) -> f32 {
        self.max_travel
    }

    #[inline]
    #[must_use]
    pub fn overshoot_px(&self) -> f32 {
        self.overshoot_px
    }

    /// Raw drag position before clamping, as last requested.
    #[inline]
    #[must_use]
    pub fn drag_down_amount(&self) -> f32 {
        self.drag_down_amount
    }

    #[inline]
    #[must_use]
    pub fn flags(&self) -> ExpansionFlags {
        self.flags
    }

    #[inline]
    #[must_use]
    pub fn is_tracking(&self) -> bool {
        self.flags.contains(ExpansionFlags::TRACKING)
    }

    #[inline]
    #[must_use]
    pub fn is_closing(&self) -> bool {
        self.flags.contains(ExpansionFlags::CLOSING)
    }

    #[inline]
    #[must_use]
    pub fn is_expanding(&self) -> bool {
        self.flags.contains(ExpansionFlags::EXPANDING)
    }

    #[inline]
    #[must_use]
    pub fn is_instant_expanding(&self) -> bool {
        self.flags.contains(ExpansionFlags::INSTANT_EXPANDING)
    }

    /// Set or clear a flag.
    pub fn set_flag(&mut self, flag: ExpansionFlags, on: bool) {
        self.flags.set(flag, on);
    }

    // -- predicates ---------------------------------------------------------

    /// Fraction at or below 0.
    #[must_use]
    pub fn is_fully_collapsed(&self) -> bool {
        self.fraction <= 0.0
    }

    /// Height at or beyond the max travel distance.
    #[must_use]
    pub fn is_fully_expanded(&self) -> bool {
        self.height >= self.max_travel
    }

    /// Collapsible by a gesture right now: open, not dragging, not closing.
    #[must_use]
    pub fn can_be_collapsed(&self) -> bool {
        !self.is_fully_collapsed() && !self.is_tracking() && !self.is_closing()
    }

    // -- mutation -----------------------------------------------------------

    /// Store a new base height.
    ///
    /// The value is clamped to `[0, max]`; the raw request is kept as the
    /// drag-down amount.
    pub fn set_height(&mut self, requested: f32) -> HeightUpdate {
        if requested.is_nan() {
            tracing::warn!(
                target: "shade::expansion",
                tracking = self.is_tracking(),
                closing = self.is_closing(),
                "expanded height set to NaN"
            );
            return HeightUpdate {
                height: self.height,
                snapped_closed: false,
                rejected: true,
            };
        }

        let mut height = requested.clamp(0.0, self.max_travel);
        let mut snapped_closed = false;
        if height < 1.0 && height != 0.0 && self.is_closing() {
            height = 0.0;
            snapped_closed = true;
        }

        self.height = height;
        self.drag_down_amount = requested;
        self.recompute_fraction();
        tracing::trace!(
            target: "shade::expansion",
            height,
            fraction = self.fraction,
            "height updated"
        );

        HeightUpdate {
            height,
            snapped_closed,
            rejected: false,
        }
    }

    /// Set the height from a fraction of the max travel distance.
    pub fn set_fraction(&mut self, fraction: f32) -> HeightUpdate {
        self.set_height(self.max_travel * fraction)
    }

    /// Set the overscroll directly (animations), clamped to its bound.
    pub fn set_over_expansion(&mut self, px: f32) {
        self.last_gestured_over = None;
        self.store_over_expansion(px);
    }

    /// Set the overscroll from raw drag travel beyond the max.
    ///
    /// The raw distance saturates over a third of `view_height` and is shaped
    /// by `1 - e^(-4x)`, so the finger meets growing resistance.
    pub fn set_over_expansion_from_gesture(&mut self, raw_over: f32, view_height: f32) {
        if self.last_gestured_over == Some(raw_over) {
            return;
        }
        self.last_gestured_over = Some(raw_over);
        let full_overshoot_at = view_height / 3.0;
        let progress = if full_overshoot_at > 0.0 {
            saturate(raw_over / full_overshoot_at)
        } else {
            0.0
        };
        let shaped = Interpolator::Saturate.transform(progress);
        self.store_over_expansion(shaped * self.overshoot_px * 2.0);
    }

    fn store_over_expansion(&mut self, px: f32) {
        let bound = self.overshoot_px * 2.0;
        self.over_expansion = if px.is_nan() { 0.0 } else { px.clamp(0.0, bound) };
    }

    /// Adopt a new max travel distance, re-clamping height and fraction.
    pub fn set_max_travel_distance(&mut self, max: f32) {
        let max = if max.is_finite() { max.max(0.0) } else { 0.0 };
        if max == self.max_travel {
            return;
        }
        tracing::debug!(
            target: "shade::expansion",
            old = self.max_travel,
            new = max,
            "max travel distance changed"
        );
        self.max_travel = max;
        self.height = self.height.min(max);
        self.recompute_fraction();
    }

    /// Change the overshoot unit; the current overscroll is re-clamped.
    pub fn set_overshoot_px(&mut self, px: f32) {
        self.overshoot_px = px.max(0.0);
        self.store_over_expansion(self.over_expansion);
    }

    fn recompute_fraction(&mut self) {
        self.fraction = if self.max_travel > 0.0 {
            (self.height / self.max_travel).min(1.0)
        } else {
            0.0
        };
    }

    /// Snapshot for listeners.
    #[must_use]
    pub fn change(&self, expanded: bool) -> ExpansionChange {
        ExpansionChange {
            fraction: self.fraction,
            expanded,
            tracking: self.is_tracking(),
            drag_down_amount_px: self.drag_down_amount,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(max: f32) -> ExpansionState {
        let mut s = ExpansionState::new(24.0);
        s.set_max_travel_distance(max);
        s
    }

    #[test]
    fn new_state_is_collapsed() {
        let s = ExpansionState::new(24.0);
        assert!(s.is_fully_collapsed());
        assert_eq!(s.fraction(), 0.0);
        assert!(s.flags().is_empty());
    }

    #[test]
    fn height_is_clamped_and_fraction_derived() {
        let mut s = state(1000.0);
        s.set_height(250.0);
        assert_eq!(s.fraction(), 0.25);
        s.set_height(1500.0);
        assert_eq!(s.height(), 1000.0);
        assert_eq!(s.fraction(), 1.0);
        assert_eq!(s.drag_down_amount(), 1500.0);
        s.set_height(-20.0);
        assert_eq!(s.height(), 0.0);
    }

    #[test]
    fn zero_max_gives_zero_fraction() {
        let mut s = state(0.0);
        s.set_height(100.0);
        assert_eq!(s.fraction(), 0.0);
        assert_eq!(s.height(), 0.0);
    }

    #[test]
    fn fraction_round_trip() {
        let mut s = state(1234.0);
        for f in [0.0, 0.25, 0.5, 1.0] {
            s.set_fraction(f);
            assert!((s.fraction() - f).abs() < 1e-6, "f={f}");
        }
    }

    #[test]
    fn snaps_to_zero_while_closing() {
        let mut s = state(1000.0);
        s.set_flag(ExpansionFlags::CLOSING, true);
        let update = s.set_height(0.6);
        assert!(update.snapped_closed);
        assert_eq!(s.height(), 0.0);
    }

    #[test]
    fn small_height_without_closing_is_kept() {
        let mut s = state(1000.0);
        let update = s.set_height(0.6);
        assert!(!update.snapped_closed);
        assert_eq!(s.height(), 0.6);
    }

    #[test]
    fn nan_is_rejected() {
        let mut s = state(1000.0);
        s.set_height(300.0);
        let update = s.set_height(f32::NAN);
        assert!(update.rejected);
        assert_eq!(s.height(), 300.0);
    }

    #[test]
    fn over_expansion_is_bounded() {
        let mut s = state(1000.0);
        s.set_over_expansion(500.0);
        assert_eq!(s.over_expansion(), 48.0);
        s.set_over_expansion(-5.0);
        assert_eq!(s.over_expansion(), 0.0);
    }

    #[test]
    fn gesture_over_expansion_rubber_bands() {
        let mut s = state(1000.0);
        s.set_over_expansion_from_gesture(100.0, 1200.0);
        let small = s.over_expansion();
        s.set_over_expansion_from_gesture(200.0, 1200.0);
        let larger = s.over_expansion();
        assert!(small > 0.0 && larger > small);
        // Doubling the pull does not double the overscroll.
        assert!(larger < small * 2.0);
        s.set_over_expansion_from_gesture(10_000.0, 1200.0);
        assert!((s.over_expansion() - 48.0).abs() < 1e-3);
    }

    #[test]
    fn shrinking_max_reclamps_height() {
        let mut s = state(1000.0);
        s.set_height(800.0);
        s.set_max_travel_distance(400.0);
        assert_eq!(s.height(), 400.0);
        assert_eq!(s.fraction(), 1.0);
        s.set_max_travel_distance(800.0);
        assert_eq!(s.fraction(), 0.5);
    }

    #[test]
    fn can_be_collapsed_requires_open_and_idle() {
        let mut s = state(1000.0);
        assert!(!s.can_be_collapsed());
        s.set_height(500.0);
        assert!(s.can_be_collapsed());
        s.set_flag(ExpansionFlags::TRACKING, true);
        assert!(!s.can_be_collapsed());
        s.set_flag(ExpansionFlags::TRACKING, false);
        s.set_flag(ExpansionFlags::CLOSING, true);
        assert!(!s.can_be_collapsed());
    }

    #[test]
    fn fully_expanded_at_max() {
        let mut s = state(600.0);
        s.set_fraction(1.0);
        assert!(s.is_fully_expanded());
        let change = s.change(true);
        assert_eq!(change.fraction, 1.0);
        assert!(change.expanded);
        assert!(!change.tracking);
    }
}
