#![forbid(unsafe_code)]

//! Fling, spring-back and unlock-hint animation of the panel height.
//!
//! [`FlingAnimator`] is a small state machine advanced once per frame:
//!
//! ```text
//! Idle --start_fling--> Fling --(overshoot requested)--> SpringBack --> Idle
//!                         \------------------------------------------/
//! Idle --start_hint--> Hint(Pull) --> Hint(Bounce) --> Idle
//! ```
//!
//! It writes height and overscroll straight into the [`ExpansionState`] it is
//! handed and reports lifecycle changes as [`AnimatorEvent`]s, which the
//! owner turns into listener callbacks.
//!
//! # Invariants
//!
//! 1. At most one animation is active. Starting a fling or hint first
//!    cancels the active one and reports its end *before* the new start, so
//!    completion events never interleave.
//! 2. Cancellation is synchronous and leaves height and overscroll at their
//!    last committed values.
//! 3. Each animation's end is reported exactly once, tagged with its
//!    [`AnimationId`].
//! 4. A fling whose target equals the current height with no overscroll does
//!    not animate; it ends immediately as completed.
//!
//! # Failure Modes
//!
//! - A closing fling that crosses below 1px is snapped to 0 by the
//!   expansion state; the animator then completes on the spot instead of
//!   crawling along the tail of a decelerating curve.

use std::fmt;
use std::time::Duration;

use crate::animation::{Animation, FlingProfile, Interpolator, Tween, lerp, saturate};
use crate::config::ShadeConfig;
use crate::expansion::{ExpansionState, HeightUpdate};

// ---------------------------------------------------------------------------
// Requests and tuning
// ---------------------------------------------------------------------------

/// A request to animate the panel to a resting height.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlingRequest {
    /// Resting height in px.
    pub target: f32,
    /// Release velocity in px/s; positive opens.
    pub velocity: f32,
    pub expand: bool,
    /// Divides the duration of zero-velocity collapses.
    pub collapse_speed_up: f32,
    /// The release was judged accidental; negative velocities are dropped
    /// when expanding.
    pub false_touch: bool,
    /// Overrides the duration of collapses.
    pub fixed_duration: Option<Duration>,
}

impl FlingRequest {
    /// Open to `target` at `velocity`.
    #[must_use]
    pub fn expand(target: f32, velocity: f32) -> Self {
        Self {
            target,
            velocity,
            expand: true,
            collapse_speed_up: 1.0,
            false_touch: false,
            fixed_duration: None,
        }
    }

    /// Close to 0 at `velocity`.
    #[must_use]
    pub fn collapse(velocity: f32) -> Self {
        Self {
            target: 0.0,
            velocity,
            expand: false,
            collapse_speed_up: 1.0,
            false_touch: false,
            fixed_duration: None,
        }
    }

    #[must_use]
    pub fn with_speed_up(mut self, factor: f32) -> Self {
        self.collapse_speed_up = factor;
        self
    }

    #[must_use]
    pub fn with_false_touch(mut self, false_touch: bool) -> Self {
        self.false_touch = false_touch;
        self
    }

    #[must_use]
    pub fn with_fixed_duration(mut self, duration: Option<Duration>) -> Self {
        self.fixed_duration = duration;
        self
    }
}

/// Mode-dependent inputs to a fling.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlingEnvironment {
    pub on_keyguard: bool,
    /// Close along the steeper lock-screen dismissing curve.
    pub use_dismissing_animation: bool,
    /// Height of the panel's window; the full-length reference distance.
    pub view_height: f32,
}

/// Timing constants of the animator, derived from [`ShadeConfig`].
#[derive(Debug, Clone, PartialEq)]
pub struct FlingTuning {
    pub opening: FlingProfile,
    pub closing: FlingProfile,
    pub dismissing: FlingProfile,
    pub high_velocity: f32,
    pub max_overshoot_velocity_factor: f32,
    pub spring_out: Duration,
    pub spring_back: Duration,
    pub hint_move: Duration,
    pub hint_bounce: Duration,
    pub hint_distance: f32,
}

impl FlingTuning {
    #[must_use]
    pub fn from_config(config: &ShadeConfig) -> Self {
        Self {
            opening: config.opening_profile(),
            closing: config.closing_profile(),
            dismissing: config.dismissing_profile(),
            high_velocity: config.high_velocity_px(),
            max_overshoot_velocity_factor: config.max_overshoot_velocity_factor,
            spring_out: config.spring_out(),
            spring_back: config.spring_back(),
            hint_move: Duration::from_millis(config.hint_move_ms),
            hint_bounce: Duration::from_millis(config.hint_bounce_ms),
            hint_distance: config.px(config.hint_distance_dp),
        }
    }
}

impl Default for FlingTuning {
    fn default() -> Self {
        Self::from_config(&ShadeConfig::default())
    }
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// Identity of one started animation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AnimationId(u64);

impl fmt::Display for AnimationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The two legs of the unlock hint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HintPhase {
    /// Pull the panel up by the hint distance.
    Pull,
    /// Bounce back to full height.
    Bounce,
}

/// Coarse state for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnimatorPhase {
    Idle,
    Fling,
    SpringBack,
    Hint(HintPhase),
}

/// Lifecycle notifications produced by the animator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AnimatorEvent {
    /// A fling started animating.
    FlingStarted { id: AnimationId, target: f32, duration: Duration },
    /// Height or overscroll was written this frame.
    Frame { height: f32, over_expansion: f32 },
    /// The fling reached its overshoot and is decaying it.
    SpringBackStarted { id: AnimationId },
    /// A fling (including its spring-back) ended.
    FlingEnded { id: AnimationId, cancelled: bool },
    /// An unlock hint leg started.
    HintPhaseStarted { id: AnimationId, phase: HintPhase },
    /// The unlock hint ended.
    HintEnded { id: AnimationId, cancelled: bool },
}

// ---------------------------------------------------------------------------
// FlingAnimator
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
enum Active {
    Fling {
        id: AnimationId,
        tween: Tween,
        /// Overshoot in units of `overshoot_px`.
        overshoot: f32,
        start_over: f32,
        spring_back: bool,
    },
    SpringBack {
        id: AnimationId,
        tween: Tween,
    },
    Hint {
        id: AnimationId,
        phase: HintPhase,
        tween: Tween,
        full_height: f32,
    },
}

/// Drives the panel height between resting positions.
#[derive(Debug, Clone)]
pub struct FlingAnimator {
    tuning: FlingTuning,
    active: Option<Active>,
    next_id: u64,
}

impl Default for FlingAnimator {
    fn default() -> Self {
        Self::new(FlingTuning::default())
    }
}

impl FlingAnimator {
    #[must_use]
    pub fn new(tuning: FlingTuning) -> Self {
        Self {
            tuning,
            active: None,
            next_id: 0,
        }
    }

    #[inline]
    #[must_use]
    pub fn tuning(&self) -> &FlingTuning {
        &self.tuning
    }

    /// Replace the tuning; the active animation keeps its timing.
    pub fn set_tuning(&mut self, tuning: FlingTuning) {
        self.tuning = tuning;
    }

    /// Any animation is active.
    #[inline]
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.active.is_some()
    }

    /// The overshoot decay is active.
    #[must_use]
    pub fn is_spring_back(&self) -> bool {
        matches!(self.active, Some(Active::SpringBack { .. }))
    }

    /// The unlock hint is active.
    #[must_use]
    pub fn is_hint_running(&self) -> bool {
        matches!(self.active, Some(Active::Hint { .. }))
    }

    /// A fling or its spring-back is active.
    #[must_use]
    pub fn is_flinging(&self) -> bool {
        matches!(
            self.active,
            Some(Active::Fling { .. } | Active::SpringBack { .. })
        )
    }

    /// A height animation other than the spring-back is active.
    #[must_use]
    pub fn is_animating_height(&self) -> bool {
        self.is_running() && !self.is_spring_back()
    }

    /// Id of the active animation.
    #[must_use]
    pub fn active_id(&self) -> Option<AnimationId> {
        self.active.as_ref().map(|a| match a {
            Active::Fling { id, .. } | Active::SpringBack { id, .. } | Active::Hint { id, .. } => *id,
        })
    }

    #[must_use]
    pub fn phase(&self) -> AnimatorPhase {
        match &self.active {
            None => AnimatorPhase::Idle,
            Some(Active::Fling { .. }) => AnimatorPhase::Fling,
            Some(Active::SpringBack { .. }) => AnimatorPhase::SpringBack,
            Some(Active::Hint { phase, .. }) => AnimatorPhase::Hint(*phase),
        }
    }

    fn allocate_id(&mut self) -> AnimationId {
        self.next_id += 1;
        AnimationId(self.next_id)
    }

    /// Stop the active animation where it is.
    ///
    /// Returns its end event (empty when idle). Height and overscroll are
    /// left as last written.
    pub fn cancel(&mut self) -> Vec<AnimatorEvent> {
        let Some(active) = self.active.take() else {
            return Vec::new();
        };
        let event = match active {
            Active::Fling { id, .. } | Active::SpringBack { id, .. } => {
                tracing::debug!(target: "shade::fling", %id, "fling cancelled");
                AnimatorEvent::FlingEnded {
                    id,
                    cancelled: true,
                }
            }
            Active::Hint { id, .. } => {
                tracing::debug!(target: "shade::fling", %id, "hint cancelled");
                AnimatorEvent::HintEnded {
                    id,
                    cancelled: true,
                }
            }
        };
        vec![event]
    }

    /// Start a fling, cancelling whatever was active first.
    pub fn start_fling(
        &mut self,
        request: FlingRequest,
        env: FlingEnvironment,
        state: &mut ExpansionState,
    ) -> Vec<AnimatorEvent> {
        let mut events = self.cancel();
        let id = self.allocate_id();
        let height = state.height();
        let over = state.over_expansion();

        if request.target == height && over == 0.0 {
            tracing::debug!(target: "shade::fling", %id, height, "fling already at target");
            state.set_over_expansion(0.0);
            events.push(AnimatorEvent::FlingEnded {
                id,
                cancelled: false,
            });
            return events;
        }

        let overshoot_px = state.overshoot_px();
        let mut velocity = request.velocity;
        let add_overscroll =
            request.expand && !env.on_keyguard && over == 0.0 && velocity >= 0.0;
        let spring_back = add_overscroll || (over != 0.0 && request.expand);
        let mut overshoot = 0.0;
        if add_overscroll {
            let max_at =
                self.tuning.high_velocity * self.tuning.max_overshoot_velocity_factor;
            let speed = if max_at > 0.0 { saturate(velocity / max_at) } else { 1.0 };
            overshoot = lerp(0.2, 1.0, speed);
            if overshoot_px > 0.0 {
                overshoot += over / overshoot_px;
            }
        }

        let (duration, interpolator) = if request.expand {
            if request.false_touch && velocity < 0.0 {
                velocity = 0.0;
            }
            let spec = self.tuning.opening.apply(
                height,
                request.target + overshoot * overshoot_px,
                velocity,
                env.view_height,
            );
            let duration = if velocity == 0.0 {
                self.tuning.spring_out
            } else {
                spec.duration
            };
            (duration, spec.interpolator)
        } else {
            let (mut duration, interpolator) = if env.use_dismissing_animation {
                if velocity == 0.0 {
                    let ratio = if env.view_height > 0.0 {
                        height / env.view_height
                    } else {
                        0.0
                    };
                    (
                        Duration::from_secs_f32((200.0 + ratio * 100.0) / 1000.0),
                        Interpolator::PANEL_CLOSE_ACCELERATED,
                    )
                } else {
                    let spec = self.tuning.dismissing.apply(
                        height,
                        request.target,
                        velocity,
                        env.view_height,
                    );
                    (spec.duration, spec.interpolator)
                }
            } else {
                let spec =
                    self.tuning
                        .closing
                        .apply(height, request.target, velocity, env.view_height);
                (spec.duration, spec.interpolator)
            };
            if velocity == 0.0 && request.collapse_speed_up > 0.0 {
                duration = duration.div_f32(request.collapse_speed_up);
            }
            if let Some(fixed) = request.fixed_duration {
                duration = fixed;
            }
            (duration, interpolator)
        };

        tracing::debug!(
            target: "shade::fling",
            %id,
            from = height,
            target = request.target,
            velocity,
            expand = request.expand,
            overshoot,
            duration_ms = duration.as_millis() as u64,
            "fling started"
        );

        self.active = Some(Active::Fling {
            id,
            tween: Tween::new(height, request.target, duration).with_interpolator(interpolator),
            overshoot,
            start_over: over,
            spring_back,
        });
        events.push(AnimatorEvent::FlingStarted {
            id,
            target: request.target,
            duration,
        });
        events
    }

    /// Start the two-leg unlock hint from the current height.
    ///
    /// Cancels whatever was active first; callers gate on tracking and on an
    /// existing animator themselves.
    pub fn start_hint(&mut self, state: &ExpansionState) -> Vec<AnimatorEvent> {
        let mut events = self.cancel();
        let id = self.allocate_id();
        let full_height = state.max_travel_distance();
        let target = (full_height - self.tuning.hint_distance).max(0.0);
        tracing::debug!(target: "shade::fling", %id, target, "unlock hint started");
        self.active = Some(Active::Hint {
            id,
            phase: HintPhase::Pull,
            tween: Tween::new(state.height(), target, self.tuning.hint_move)
                .with_interpolator(Interpolator::FAST_OUT_SLOW_IN),
            full_height,
        });
        events.push(AnimatorEvent::HintPhaseStarted {
            id,
            phase: HintPhase::Pull,
        });
        events
    }

    /// Advance the active animation by `dt` and write its values into `state`.
    pub fn on_frame(&mut self, dt: Duration, state: &mut ExpansionState) -> Vec<AnimatorEvent> {
        let mut events = Vec::new();
        let Some(active) = self.active.as_mut() else {
            return events;
        };

        let mut snapped = false;
        match active {
            Active::Fling {
                tween,
                overshoot,
                start_over,
                ..
            } => {
                tween.tick(dt);
                snapped = Self::write_fling_frame(tween, *overshoot, *start_over, state)
                    .snapped_closed;
            }
            Active::SpringBack { tween, .. } => {
                tween.tick(dt);
                state.set_over_expansion(tween.current());
            }
            Active::Hint { tween, .. } => {
                tween.tick(dt);
                state.set_height(tween.current());
            }
        }
        events.push(AnimatorEvent::Frame {
            height: state.height(),
            over_expansion: state.over_expansion(),
        });

        let complete = snapped
            || match self.active.as_ref() {
                Some(Active::Fling { tween, .. } | Active::SpringBack { tween, .. } | Active::Hint { tween, .. }) => {
                    tween.is_complete()
                }
                None => false,
            };
        if complete {
            events.extend(self.complete_active(state));
        }
        events
    }

    /// Jump the active animation to its end as if it had completed.
    pub fn end_now(&mut self, state: &mut ExpansionState) -> Vec<AnimatorEvent> {
        let mut events = Vec::new();
        match self.active.as_mut() {
            None => return events,
            Some(Active::Fling {
                tween,
                overshoot,
                start_over,
                ..
            }) => {
                tween.tick(tween.duration());
                Self::write_fling_frame(tween, *overshoot, *start_over, state);
            }
            Some(Active::SpringBack { tween, .. }) => {
                tween.tick(tween.duration());
                state.set_over_expansion(tween.current());
            }
            Some(Active::Hint { tween, .. }) => {
                tween.tick(tween.duration());
                state.set_height(tween.current());
            }
        }
        events.push(AnimatorEvent::Frame {
            height: state.height(),
            over_expansion: state.over_expansion(),
        });
        events.extend(self.complete_active(state));
        events
    }

    fn write_fling_frame(
        tween: &Tween,
        overshoot: f32,
        start_over: f32,
        state: &mut ExpansionState,
    ) -> HeightUpdate {
        if overshoot > 0.0 || (tween.end_value() == 0.0 && start_over != 0.0) {
            let eased = Interpolator::FAST_OUT_SLOW_IN.transform(tween.fraction());
            let over = lerp(start_over, state.overshoot_px() * overshoot, eased);
            state.set_over_expansion(over);
        }
        state.set_height(tween.current())
    }

    /// Transition out of the active animation after it reached its end.
    fn complete_active(&mut self, state: &mut ExpansionState) -> Vec<AnimatorEvent> {
        let Some(active) = self.active.take() else {
            return Vec::new();
        };
        match active {
            Active::Fling {
                id, spring_back, ..
            } => {
                if spring_back && state.over_expansion() != 0.0 {
                    tracing::debug!(
                        target: "shade::fling",
                        %id,
                        over = state.over_expansion(),
                        "spring back started"
                    );
                    self.active = Some(Active::SpringBack {
                        id,
                        tween: Tween::new(state.over_expansion(), 0.0, self.tuning.spring_back)
                            .with_interpolator(Interpolator::FAST_OUT_SLOW_IN),
                    });
                    vec![AnimatorEvent::SpringBackStarted { id }]
                } else {
                    state.set_over_expansion(0.0);
                    tracing::debug!(target: "shade::fling", %id, height = state.height(), "fling ended");
                    vec![AnimatorEvent::FlingEnded {
                        id,
                        cancelled: false,
                    }]
                }
            }
            Active::SpringBack { id, .. } => {
                state.set_over_expansion(0.0);
                tracing::debug!(target: "shade::fling", %id, "spring back ended");
                vec![AnimatorEvent::FlingEnded {
                    id,
                    cancelled: false,
                }]
            }
            Active::Hint {
                id,
                phase: HintPhase::Pull,
                full_height,
                ..
            } => {
                tracing::debug!(target: "shade::fling", %id, "unlock hint bouncing");
                self.active = Some(Active::Hint {
                    id,
                    phase: HintPhase::Bounce,
                    tween: Tween::new(state.height(), full_height, self.tuning.hint_bounce)
                        .with_interpolator(Interpolator::Bounce),
                    full_height,
                });
                vec![AnimatorEvent::HintPhaseStarted {
                    id,
                    phase: HintPhase::Bounce,
                }]
            }
            Active::Hint {
                id,
                phase: HintPhase::Bounce,
                ..
            } => {
                tracing::debug!(target: "shade::fling", %id, "unlock hint ended");
                vec![AnimatorEvent::HintEnded {
                    id,
                    cancelled: false,
                }]
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expansion::ExpansionFlags;

    const FRAME: Duration = Duration::from_millis(16);

    fn env() -> FlingEnvironment {
        FlingEnvironment {
            on_keyguard: false,
            use_dismissing_animation: false,
            view_height: 2000.0,
        }
    }

    fn state_at(height: f32) -> ExpansionState {
        let mut s = ExpansionState::new(24.0);
        s.set_max_travel_distance(1000.0);
        s.set_height(height);
        s
    }

    /// Run frames until the animator goes idle, checking bounds on the way.
    fn settle(anim: &mut FlingAnimator, state: &mut ExpansionState) -> Vec<AnimatorEvent> {
        let mut all = Vec::new();
        for _ in 0..500 {
            if !anim.is_running() {
                break;
            }
            all.extend(anim.on_frame(FRAME, state));
            assert!((0.0..=1.0).contains(&state.fraction()));
            assert!(state.over_expansion() <= 48.0 + 1e-3);
        }
        assert!(!anim.is_running(), "animator never settled");
        all
    }

    fn ended(events: &[AnimatorEvent]) -> Vec<(AnimationId, bool)> {
        events
            .iter()
            .filter_map(|e| match e {
                AnimatorEvent::FlingEnded { id, cancelled } => Some((*id, *cancelled)),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn fling_open_overshoots_then_springs_back() {
        let mut anim = FlingAnimator::default();
        let mut state = state_at(200.0);
        let started = anim.start_fling(FlingRequest::expand(1000.0, 2000.0), env(), &mut state);
        assert!(matches!(started[0], AnimatorEvent::FlingStarted { .. }));

        let mut saw_over = false;
        let mut events = Vec::new();
        for _ in 0..500 {
            if !anim.is_running() {
                break;
            }
            events.extend(anim.on_frame(FRAME, &mut state));
            saw_over |= state.over_expansion() > 0.0;
        }
        assert!(saw_over);
        assert!(events.iter().any(|e| matches!(e, AnimatorEvent::SpringBackStarted { .. })));
        assert_eq!(state.fraction(), 1.0);
        assert_eq!(state.over_expansion(), 0.0);
        assert_eq!(ended(&events).len(), 1);
        assert!(!ended(&events)[0].1);
    }

    #[test]
    fn fling_on_keyguard_has_no_overshoot() {
        let mut anim = FlingAnimator::default();
        let mut state = state_at(200.0);
        let env = FlingEnvironment {
            on_keyguard: true,
            ..env()
        };
        anim.start_fling(FlingRequest::expand(1000.0, 2000.0), env, &mut state);
        let events = settle(&mut anim, &mut state);
        assert!(!events.iter().any(|e| matches!(e, AnimatorEvent::SpringBackStarted { .. })));
        assert_eq!(state.height(), 1000.0);
    }

    #[test]
    fn zero_distance_fling_ends_immediately() {
        let mut anim = FlingAnimator::default();
        let mut state = state_at(0.0);
        let events = anim.start_fling(FlingRequest::collapse(0.0), env(), &mut state);
        assert!(!anim.is_running());
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], AnimatorEvent::FlingEnded { cancelled: false, .. }));
    }

    #[test]
    fn collapse_reaches_zero() {
        let mut anim = FlingAnimator::default();
        let mut state = state_at(700.0);
        state.set_flag(ExpansionFlags::CLOSING, true);
        anim.start_fling(FlingRequest::collapse(-1500.0), env(), &mut state);
        settle(&mut anim, &mut state);
        assert_eq!(state.height(), 0.0);
        assert!(state.is_fully_collapsed());
    }

    #[test]
    fn canned_collapse_respects_speed_up_and_fixed_duration() {
        let mut anim = FlingAnimator::default();
        let mut state = state_at(1000.0);
        let dismissing = FlingEnvironment {
            use_dismissing_animation: true,
            ..env()
        };
        let events = anim.start_fling(
            FlingRequest::collapse(0.0).with_speed_up(2.0),
            dismissing,
            &mut state,
        );
        // (200 + 1000/2000*100)ms / 2
        let AnimatorEvent::FlingStarted { duration, .. } = events[0] else {
            panic!("expected start, got {events:?}");
        };
        assert_eq!(duration.as_millis(), 125);

        let events = anim.start_fling(
            FlingRequest::collapse(0.0).with_fixed_duration(Some(Duration::from_millis(42))),
            env(),
            &mut state,
        );
        // Previous fling is cancelled first.
        assert!(matches!(events[0], AnimatorEvent::FlingEnded { cancelled: true, .. }));
        let AnimatorEvent::FlingStarted { duration, .. } = events[1] else {
            panic!("expected start, got {events:?}");
        };
        assert_eq!(duration, Duration::from_millis(42));
    }

    #[test]
    fn zero_velocity_open_uses_spring_out_duration() {
        let mut anim = FlingAnimator::default();
        let mut state = state_at(100.0);
        let events = anim.start_fling(FlingRequest::expand(1000.0, 0.0), env(), &mut state);
        let AnimatorEvent::FlingStarted { duration, .. } = events[0] else {
            panic!("expected start");
        };
        assert_eq!(duration, Duration::from_millis(350));
    }

    #[test]
    fn cancel_freezes_state_and_reports_once() {
        let mut anim = FlingAnimator::default();
        let mut state = state_at(0.0);
        anim.start_fling(FlingRequest::expand(1000.0, 3000.0), env(), &mut state);
        anim.on_frame(FRAME, &mut state);
        anim.on_frame(FRAME, &mut state);
        let (h, o) = (state.height(), state.over_expansion());

        let events = anim.cancel();
        assert_eq!(ended(&events).len(), 1);
        assert!(ended(&events)[0].1);
        assert!(anim.cancel().is_empty());
        assert!(anim.on_frame(FRAME, &mut state).is_empty());
        assert_eq!(state.height(), h);
        assert_eq!(state.over_expansion(), o);
    }

    #[test]
    fn restarting_reports_old_end_before_new_start() {
        let mut anim = FlingAnimator::default();
        let mut state = state_at(500.0);
        let first = anim.start_fling(FlingRequest::expand(1000.0, 800.0), env(), &mut state);
        let AnimatorEvent::FlingStarted { id: first_id, .. } = first[0] else {
            panic!("expected start");
        };
        let second = anim.start_fling(FlingRequest::collapse(-800.0), env(), &mut state);
        assert_eq!(
            second[0],
            AnimatorEvent::FlingEnded {
                id: first_id,
                cancelled: true
            }
        );
        let AnimatorEvent::FlingStarted { id: second_id, .. } = second[1] else {
            panic!("expected start");
        };
        assert!(second_id > first_id);
    }

    #[test]
    fn end_now_completes_without_spring_back_when_closing() {
        let mut anim = FlingAnimator::default();
        let mut state = state_at(600.0);
        state.set_flag(ExpansionFlags::CLOSING, true);
        let started = anim.start_fling(FlingRequest::collapse(-500.0), env(), &mut state);
        let AnimatorEvent::FlingStarted { id, .. } = started[0] else {
            panic!("expected start");
        };
        let events = anim.end_now(&mut state);
        assert_eq!(state.height(), 0.0);
        assert_eq!(ended(&events), vec![(id, false)]);
    }

    #[test]
    fn hint_pulls_then_bounces_back() {
        let mut anim = FlingAnimator::default();
        let mut state = state_at(1000.0);
        anim.start_hint(&state);
        assert_eq!(anim.phase(), AnimatorPhase::Hint(HintPhase::Pull));

        let mut lowest = f32::MAX;
        let mut events = Vec::new();
        for _ in 0..200 {
            if !anim.is_running() {
                break;
            }
            events.extend(anim.on_frame(FRAME, &mut state));
            lowest = lowest.min(state.height());
        }
        assert!(lowest <= 900.0 + 1.0, "lowest {lowest}");
        assert_eq!(state.height(), 1000.0);
        assert!(events.iter().any(|e| matches!(
            e,
            AnimatorEvent::HintPhaseStarted {
                phase: HintPhase::Bounce,
                ..
            }
        )));
        assert!(events.iter().any(|e| matches!(e, AnimatorEvent::HintEnded { cancelled: false, .. })));
    }

    #[test]
    fn cancelled_hint_reports_hint_end() {
        let mut anim = FlingAnimator::default();
        let state = state_at(1000.0);
        anim.start_hint(&state);
        let events = anim.cancel();
        assert!(matches!(events[0], AnimatorEvent::HintEnded { cancelled: true, .. }));
    }
}
