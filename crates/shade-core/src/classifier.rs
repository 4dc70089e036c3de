#![forbid(unsafe_code)]

//! Expand-versus-collapse decisions at the end of a drag.
//!
//! [`GestureClassifier`] turns a [`ReleaseContext`] (release velocity, start
//! and end points, panel fraction, falsing bookkeeping) into a
//! [`Decision`]. Accidental-touch rejection is delegated to a
//! [`FalsingService`] when one is active and falls back to a built-in
//! distance/direction heuristic otherwise.
//!
//! # Decision order
//!
//! 1. Gesture began on the keyguard and the keyguard is fading away or
//!    already gone: collapse.
//! 2. Cancelled gesture: expand on the keyguard, collapse for a bouncer over
//!    a dream, otherwise restore the state the panel had at touch-down.
//! 3. Unlocking disabled: expand.
//! 4. False touch: collapse.
//! 5. Slow release (`|vector velocity| < min`): expand past half way, or
//!    inside the small-expansion allowance window.
//! 6. Otherwise the sign of the vertical velocity decides.
//! 7. A running quick-settings expansion always keeps the panel open
//!    (overrides 3 to 6).
//!
//! # Built-in falsing heuristic
//!
//! Without an active service, a release is false until the gesture has
//! travelled past the falsing threshold. Travel counts in both directions,
//! not only upward, so a deliberate downward pull is accepted. Past the
//! threshold a quick-settings interaction is never false; any other
//! gesture must have pointed upward, either when it crossed the threshold
//! or at release.
//!
//! # Invariants
//!
//! - Classification is pure: the same context and service answers produce
//!   the same decision.

use std::fmt;
use std::time::Duration;

use crate::velocity::Velocity;

// ---------------------------------------------------------------------------
// Falsing service
// ---------------------------------------------------------------------------

/// What the user appeared to be doing, for the falsing service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractionType {
    /// No motion to judge.
    Generic,
    /// Pulling the shade down toward quick settings.
    QuickSettings,
    /// Swiping up on a lock screen that can be dismissed.
    Unlock,
    /// Swiping up toward the bouncer.
    BouncerUnlock,
}

/// Global accidental-touch classifier.
///
/// Every method has an inert default so hosts only override what they track.
pub trait FalsingService {
    /// Whether [`is_false_touch`](Self::is_false_touch) should be trusted.
    fn is_classifier_enabled(&self) -> bool {
        false
    }

    /// Unlocking is disabled entirely; every release expands.
    fn is_unlocking_disabled(&self) -> bool {
        false
    }

    /// Verdict for the gesture that just ended.
    fn is_false_touch(&self, _interaction: InteractionType) -> bool {
        false
    }
}

/// A falsing service that never rejects anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoFalsing;

impl FalsingService for NoFalsing {}

// ---------------------------------------------------------------------------
// Inputs and outputs
// ---------------------------------------------------------------------------

/// How the gesture ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseKind {
    /// Finger lifted.
    Up,
    /// The host cancelled the gesture.
    Cancel,
    /// The engine aborted the gesture itself (second finger on keyguard).
    ForcedCancel,
}

impl ReleaseKind {
    #[inline]
    #[must_use]
    pub fn is_cancel(self) -> bool {
        !matches!(self, Self::Up)
    }
}

/// Everything the classifier looks at when a drag ends.
#[derive(Debug, Clone, PartialEq)]
pub struct ReleaseContext {
    pub kind: ReleaseKind,
    /// Release velocity in px/s; positive `y` pulls the shade open.
    pub velocity: Velocity,
    /// Anchor of the gesture.
    pub start: (f32, f32),
    /// Release point.
    pub end: (f32, f32),
    /// Expansion fraction at release.
    pub fraction: f32,
    /// Time between the gesture's down and the release.
    pub time_since_down: Duration,
    /// A hand-off gesture may open even when barely expanded.
    pub allow_expand_for_small_expansion: bool,
    /// Travel reached the falsing threshold at some point.
    pub touch_above_falsing_threshold: bool,
    /// The gesture pointed upward when the threshold was reached.
    pub upwards_when_threshold_reached: bool,
    /// Keyguard showing now.
    pub on_keyguard: bool,
    /// Keyguard showing at touch-down.
    pub touch_started_on_keyguard: bool,
    pub keyguard_fading_away: bool,
    pub can_dismiss_lock_screen: bool,
    pub bouncer_showing_over_dream: bool,
    /// Panel was fully collapsed at touch-down.
    pub panel_closed_on_down: bool,
    pub qs_expansion_animating: bool,
}

impl Default for ReleaseContext {
    fn default() -> Self {
        Self {
            kind: ReleaseKind::Up,
            velocity: Velocity::ZERO,
            start: (0.0, 0.0),
            end: (0.0, 0.0),
            fraction: 0.0,
            time_since_down: Duration::ZERO,
            allow_expand_for_small_expansion: false,
            touch_above_falsing_threshold: false,
            upwards_when_threshold_reached: false,
            on_keyguard: false,
            touch_started_on_keyguard: false,
            keyguard_fading_away: false,
            can_dismiss_lock_screen: true,
            bouncer_showing_over_dream: false,
            panel_closed_on_down: true,
            qs_expansion_animating: false,
        }
    }
}

impl ReleaseContext {
    /// Vertical travel from the anchor; positive pulls down.
    #[must_use]
    pub fn dy(&self) -> f32 {
        self.end.1 - self.start.1
    }

    /// Horizontal travel from the anchor.
    #[must_use]
    pub fn dx(&self) -> f32 {
        self.end.0 - self.start.0
    }
}

/// Why a decision came out the way it did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecisionReason {
    KeyguardFadingAway,
    CancelOnKeyguard,
    CancelBouncerOverDream,
    CancelRestore,
    UnlockingDisabled,
    FalseTouch,
    Position,
    Velocity,
    QuickSettingsAnimating,
}

impl fmt::Display for DecisionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::KeyguardFadingAway => "keyguard-fading-away",
            Self::CancelOnKeyguard => "cancel-on-keyguard",
            Self::CancelBouncerOverDream => "cancel-bouncer-over-dream",
            Self::CancelRestore => "cancel-restore",
            Self::UnlockingDisabled => "unlocking-disabled",
            Self::FalseTouch => "false-touch",
            Self::Position => "position",
            Self::Velocity => "velocity",
            Self::QuickSettingsAnimating => "qs-animating",
        };
        f.write_str(s)
    }
}

/// Outcome of classifying a release.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    pub expand: bool,
    /// The release was judged accidental (informs fling velocity clamping).
    pub false_touch: bool,
    pub reason: DecisionReason,
}

// ---------------------------------------------------------------------------
// GestureClassifier
// ---------------------------------------------------------------------------

/// Release classifier with the thresholds it needs.
#[derive(Debug, Clone, PartialEq)]
pub struct GestureClassifier {
    /// Releases slower than this (px/s, vector magnitude) decide by position.
    pub min_fling_velocity: f32,
    /// Small-expansion allowance window after a hand-off down.
    pub max_time_to_open: Duration,
}

impl GestureClassifier {
    #[must_use]
    pub fn new(min_fling_velocity: f32, max_time_to_open: Duration) -> Self {
        Self {
            min_fling_velocity,
            max_time_to_open,
        }
    }

    /// Upward and within 45 degrees of vertical.
    #[must_use]
    pub fn is_direction_upwards(start: (f32, f32), end: (f32, f32)) -> bool {
        let dx = end.0 - start.0;
        let dy = end.1 - start.1;
        if dy >= 0.0 {
            return false;
        }
        dy.abs() >= dx.abs()
    }

    /// Interaction type reported to the falsing service.
    #[must_use]
    pub fn interaction_type(ctx: &ReleaseContext) -> InteractionType {
        if ctx.dy() > 0.0 {
            InteractionType::QuickSettings
        } else if ctx.can_dismiss_lock_screen {
            InteractionType::Unlock
        } else {
            InteractionType::BouncerUnlock
        }
    }

    /// Whether the release looks accidental.
    ///
    /// With an active service its verdict is final. Otherwise a gesture is
    /// false until it travels past the falsing threshold; an upward gesture
    /// must also have pointed upward when it got there or at release.
    #[must_use]
    pub fn is_false_touch(
        &self,
        ctx: &ReleaseContext,
        falsing: &dyn FalsingService,
        interaction: InteractionType,
    ) -> bool {
        if falsing.is_classifier_enabled() {
            return falsing.is_false_touch(interaction);
        }
        if !ctx.touch_above_falsing_threshold {
            return true;
        }
        if interaction == InteractionType::QuickSettings {
            return false;
        }
        if ctx.upwards_when_threshold_reached {
            return false;
        }
        !Self::is_direction_upwards(ctx.start, ctx.end)
    }

    /// Position fallback for slow releases.
    #[must_use]
    pub fn should_expand_when_not_flinging(&self, ctx: &ReleaseContext) -> bool {
        if ctx.fraction > 0.5 {
            return true;
        }
        ctx.allow_expand_for_small_expansion && ctx.time_since_down <= self.max_time_to_open
    }

    /// Decide between expanding and collapsing for an ordinary release.
    #[must_use]
    pub fn fling_expands(&self, ctx: &ReleaseContext, falsing: &dyn FalsingService) -> Decision {
        let mut decision = if falsing.is_unlocking_disabled() {
            Decision {
                expand: true,
                false_touch: false,
                reason: DecisionReason::UnlockingDisabled,
            }
        } else if self.is_false_touch(ctx, falsing, Self::interaction_type(ctx)) {
            Decision {
                expand: false,
                false_touch: true,
                reason: DecisionReason::FalseTouch,
            }
        } else if ctx.velocity.magnitude() < self.min_fling_velocity {
            Decision {
                expand: self.should_expand_when_not_flinging(ctx),
                false_touch: false,
                reason: DecisionReason::Position,
            }
        } else {
            Decision {
                expand: ctx.velocity.y > 0.0,
                false_touch: false,
                reason: DecisionReason::Velocity,
            }
        };

        if ctx.qs_expansion_animating {
            decision.expand = true;
            decision.reason = DecisionReason::QuickSettingsAnimating;
        }
        decision
    }

    /// Full release classification including keyguard and cancel overrides.
    #[must_use]
    pub fn classify(&self, ctx: &ReleaseContext, falsing: &dyn FalsingService) -> Decision {
        let overridden = |expand, reason| Decision {
            expand,
            false_touch: false,
            reason,
        };

        let decision = if ctx.keyguard_fading_away
            || (ctx.touch_started_on_keyguard && !ctx.on_keyguard)
        {
            overridden(false, DecisionReason::KeyguardFadingAway)
        } else if ctx.kind.is_cancel() {
            if ctx.on_keyguard {
                overridden(true, DecisionReason::CancelOnKeyguard)
            } else if ctx.bouncer_showing_over_dream {
                overridden(false, DecisionReason::CancelBouncerOverDream)
            } else {
                overridden(!ctx.panel_closed_on_down, DecisionReason::CancelRestore)
            }
        } else {
            self.fling_expands(ctx, falsing)
        };

        tracing::debug!(
            target: "shade::touch",
            expand = decision.expand,
            false_touch = decision.false_touch,
            reason = %decision.reason,
            vy = ctx.velocity.y,
            fraction = ctx.fraction,
            "release classified"
        );
        decision
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Scripted {
        enabled: bool,
        unlocking_disabled: bool,
        verdict: bool,
    }

    impl FalsingService for Scripted {
        fn is_classifier_enabled(&self) -> bool {
            self.enabled
        }
        fn is_unlocking_disabled(&self) -> bool {
            self.unlocking_disabled
        }
        fn is_false_touch(&self, _interaction: InteractionType) -> bool {
            self.verdict
        }
    }

    fn classifier() -> GestureClassifier {
        GestureClassifier::new(250.0, Duration::from_millis(300))
    }

    fn pull_down(dy: f32, vy: f32) -> ReleaseContext {
        ReleaseContext {
            start: (100.0, 0.0),
            end: (100.0, dy),
            velocity: Velocity::new(0.0, vy),
            touch_above_falsing_threshold: dy.abs() >= 50.0,
            fraction: dy / 1000.0,
            ..Default::default()
        }
    }

    #[test]
    fn fast_downward_fling_expands() {
        let d = classifier().classify(&pull_down(300.0, 2000.0), &NoFalsing);
        assert!(d.expand);
        assert_eq!(d.reason, DecisionReason::Velocity);
    }

    #[test]
    fn fast_upward_fling_collapses() {
        let mut ctx = pull_down(-300.0, -2000.0);
        ctx.upwards_when_threshold_reached = true;
        ctx.fraction = 0.7;
        let d = classifier().classify(&ctx, &NoFalsing);
        assert!(!d.expand);
    }

    #[test]
    fn short_touch_is_false_and_collapses() {
        let d = classifier().classify(&pull_down(20.0, 5.0), &NoFalsing);
        assert!(!d.expand);
        assert!(d.false_touch);
        assert_eq!(d.reason, DecisionReason::FalseTouch);
    }

    #[test]
    fn builtin_falsing_counts_travel_in_either_direction() {
        let c = classifier();
        // Downward past the threshold: a quick-settings pull, never false.
        let down = pull_down(80.0, 0.0);
        let kind = GestureClassifier::interaction_type(&down);
        assert_eq!(kind, InteractionType::QuickSettings);
        assert!(!c.is_false_touch(&down, &NoFalsing, kind));

        // Upward past the threshold that ends pointing up is accepted.
        let up = pull_down(-80.0, 0.0);
        let kind = GestureClassifier::interaction_type(&up);
        assert!(!c.is_false_touch(&up, &NoFalsing, kind));

        // Upward past the threshold but drifting sideways at release, and not
        // upward when the threshold was crossed: false.
        let mut drift = pull_down(-60.0, 0.0);
        drift.end = (300.0, -60.0);
        let kind = GestureClassifier::interaction_type(&drift);
        assert!(c.is_false_touch(&drift, &NoFalsing, kind));
    }

    #[test]
    fn slow_release_uses_position() {
        let mut ctx = pull_down(600.0, 10.0);
        ctx.fraction = 0.6;
        assert!(classifier().classify(&ctx, &NoFalsing).expand);
        ctx.fraction = 0.3;
        let d = classifier().classify(&ctx, &NoFalsing);
        assert!(!d.expand);
        assert_eq!(d.reason, DecisionReason::Position);
    }

    #[test]
    fn small_expansion_allowance_window() {
        let mut ctx = pull_down(100.0, 0.0);
        ctx.allow_expand_for_small_expansion = true;
        ctx.time_since_down = Duration::from_millis(250);
        assert!(classifier().classify(&ctx, &NoFalsing).expand);
        ctx.time_since_down = Duration::from_millis(301);
        assert!(!classifier().classify(&ctx, &NoFalsing).expand);
    }

    #[test]
    fn upward_swipe_must_point_upward() {
        // Reached the threshold but ended mostly sideways.
        let ctx = ReleaseContext {
            start: (0.0, 500.0),
            end: (300.0, 400.0),
            velocity: Velocity::new(3000.0, -900.0),
            touch_above_falsing_threshold: true,
            fraction: 0.9,
            ..Default::default()
        };
        let d = classifier().classify(&ctx, &NoFalsing);
        assert!(d.false_touch);
        assert!(!d.expand);
    }

    #[test]
    fn active_service_verdict_wins() {
        let service = Scripted {
            enabled: true,
            unlocking_disabled: false,
            verdict: false,
        };
        // Below the built-in threshold, yet the service says it is real.
        let d = classifier().classify(&pull_down(20.0, 2000.0), &service);
        assert!(!d.false_touch);
        assert!(d.expand);
    }

    #[test]
    fn unlocking_disabled_always_expands() {
        let service = Scripted {
            enabled: false,
            unlocking_disabled: true,
            verdict: true,
        };
        let d = classifier().classify(&pull_down(-300.0, -3000.0), &service);
        assert!(d.expand);
    }

    #[test]
    fn cancel_on_keyguard_expands_regardless_of_velocity() {
        let ctx = ReleaseContext {
            kind: ReleaseKind::Cancel,
            on_keyguard: true,
            touch_started_on_keyguard: true,
            velocity: Velocity::new(0.0, -5000.0),
            ..Default::default()
        };
        let d = classifier().classify(&ctx, &NoFalsing);
        assert!(d.expand);
        assert_eq!(d.reason, DecisionReason::CancelOnKeyguard);
    }

    #[test]
    fn cancel_elsewhere_restores_down_state() {
        let mut ctx = ReleaseContext {
            kind: ReleaseKind::Cancel,
            panel_closed_on_down: true,
            ..Default::default()
        };
        assert!(!classifier().classify(&ctx, &NoFalsing).expand);
        ctx.panel_closed_on_down = false;
        assert!(classifier().classify(&ctx, &NoFalsing).expand);
        ctx.bouncer_showing_over_dream = true;
        assert!(!classifier().classify(&ctx, &NoFalsing).expand);
    }

    #[test]
    fn keyguard_gone_never_expands() {
        let mut ctx = pull_down(400.0, 3000.0);
        ctx.touch_started_on_keyguard = true;
        ctx.on_keyguard = false;
        let d = classifier().classify(&ctx, &NoFalsing);
        assert!(!d.expand);
        assert_eq!(d.reason, DecisionReason::KeyguardFadingAway);
    }

    #[test]
    fn qs_animation_keeps_panel_open() {
        let mut ctx = pull_down(20.0, -10.0);
        ctx.qs_expansion_animating = true;
        let d = classifier().classify(&ctx, &NoFalsing);
        assert!(d.expand);
        assert_eq!(d.reason, DecisionReason::QuickSettingsAnimating);
    }

    #[test]
    fn direction_upwards() {
        assert!(GestureClassifier::is_direction_upwards((0.0, 100.0), (10.0, 0.0)));
        assert!(!GestureClassifier::is_direction_upwards((0.0, 100.0), (200.0, 0.0)));
        assert!(!GestureClassifier::is_direction_upwards((0.0, 0.0), (0.0, 10.0)));
    }
}
