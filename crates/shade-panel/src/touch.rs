#![forbid(unsafe_code)]

//! Touch arbitration: who owns a gesture and what a drag does to the panel.
//!
//! Events arrive through two entry points, mirroring a view hierarchy:
//! [`PanelController::on_intercept_touch_event`] is asked first and decides
//! whether the panel steals the gesture from its content;
//! [`PanelController::on_touch_event`] handles events the panel owns.
//! Bouncer, heads-up, pulse and quick settings get their turn before the
//! panel's own drag handling.
//!
//! # Gesture lifecycle
//!
//! ```text
//!   Idle --down--> InterceptCandidate --slop--> OwningDrag --up/cancel--> Idle
//!     \                 \
//!      \                 +--claimed by collaborator--> Delegated(owner)
//!       +--------------------------------------------------^
//! ```
//!
//! On release the session's travel, velocity and falsing progress are handed
//! to the [`GestureClassifier`](shade_core::GestureClassifier), which picks
//! the fling direction.

use shade_core::{
    DownEvent, DownEventState, InputSource, InteractionType, MotionAction, MotionEvent,
    ReleaseContext, ReleaseKind, VelocityEstimator,
};

use crate::controller::PanelController;
use crate::session::{DownSnapshot, GestureSession};

/// Collaborator that claimed the current gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TouchOwner {
    Bouncer,
    HeadsUp,
    Pulse,
    QuickSettings,
}

/// Where the current gesture stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ArbiterState {
    /// No gesture in progress.
    #[default]
    Idle,
    /// Down seen; the panel may still steal the gesture.
    InterceptCandidate,
    /// The panel is tracking the finger.
    OwningDrag,
    /// A collaborator handles the gesture.
    Delegated(TouchOwner),
}

/// Touch state of the panel between events.
#[derive(Debug, Clone)]
pub struct TouchArbiter {
    state: ArbiterState,
    pub(crate) session: GestureSession,
    pub(crate) velocity: VelocityEstimator,
    down_events: DownEventState,
    /// `down_time` of the last down the touch path accepted.
    last_touch_down_time: Option<std::time::Duration>,
    /// `event_time` of the last down recorded, so the intercept and touch
    /// paths do not record the same down twice.
    last_recorded_down: Option<std::time::Duration>,
}

impl TouchArbiter {
    pub(crate) fn new(down_events: DownEventState) -> Self {
        Self {
            state: ArbiterState::Idle,
            session: GestureSession::default(),
            velocity: VelocityEstimator::new(),
            down_events,
            last_touch_down_time: None,
            last_recorded_down: None,
        }
    }

    #[inline]
    #[must_use]
    pub fn state(&self) -> ArbiterState {
        self.state
    }

    #[inline]
    #[must_use]
    pub fn session(&self) -> &GestureSession {
        &self.session
    }

    #[inline]
    #[must_use]
    pub fn down_events(&self) -> &DownEventState {
        &self.down_events
    }

    fn delegate(&mut self, owner: TouchOwner) {
        if self.state != ArbiterState::Delegated(owner) {
            tracing::debug!(target: "shade::touch", ?owner, "gesture delegated");
        }
        self.state = ArbiterState::Delegated(owner);
    }

    pub(crate) fn on_tracking_started(&mut self) {
        self.state = ArbiterState::OwningDrag;
    }

    pub(crate) fn on_tracking_stopped(&mut self) {
        if self.state == ArbiterState::OwningDrag {
            self.state = ArbiterState::Idle;
        }
    }

    fn add_movement(&mut self, event: &MotionEvent) {
        let pointer = self
            .session
            .tracking_pointer
            .unwrap_or_else(|| event.pointer_id(0));
        self.velocity.add_movement(event, pointer);
    }
}

fn is_terminal(action: MotionAction) -> bool {
    matches!(action, MotionAction::Up | MotionAction::Cancel)
}

impl PanelController {
    // -----------------------------------------------------------------------
    // Intercept path
    // -----------------------------------------------------------------------

    /// Offer an event before the panel's content sees it.
    ///
    /// Returns `true` when the panel (or a collaborator acting for it) takes
    /// the gesture; later events then go to [`on_touch_event`](Self::on_touch_event).
    pub fn on_intercept_touch_event(&mut self, event: &MotionEvent) -> bool {
        let _span = tracing::debug_span!(
            target: "shade::touch",
            "intercept",
            action = ?event.action,
            t_ms = event.event_time.as_millis() as u64
        )
        .entered();
        self.now = self.now.max(event.event_time);
        let intercepted = self.intercept(event);
        if is_terminal(event.action) {
            self.arbiter.state = ArbiterState::Idle;
        }
        intercepted
    }

    fn intercept(&mut self, event: &MotionEvent) -> bool {
        if self.collab.quick_settings.disallow_touches() {
            tracing::trace!(target: "shade::touch", "quick settings disallow touches");
            return false;
        }
        self.init_down_states(event);

        if self.collab.keyguard.is_bouncer_showing() {
            self.arbiter.delegate(TouchOwner::Bouncer);
            return true;
        }
        if self.collab.content.panels_enabled()
            && !self.collab.content.is_long_press_in_progress()
            && self.collab.heads_up.on_intercept_touch_event(event)
        {
            self.arbiter.delegate(TouchOwner::HeadsUp);
            return true;
        }
        let down = self.arbiter.session.down;
        if !self.collab.quick_settings.should_intercept(down.x, down.y)
            && self.collab.pulse.on_intercept_touch_event(event)
        {
            self.arbiter.delegate(TouchOwner::Pulse);
            return true;
        }
        if !self.is_fully_collapsed() && self.collab.quick_settings.on_intercept(event) {
            self.arbiter.delegate(TouchOwner::QuickSettings);
            return true;
        }

        if self.expansion.is_instant_expanding()
            || !self.notifications_drag_enabled
            || self.touch_disabled
        {
            return false;
        }
        if self.arbiter.session.motion_aborted && event.action != MotionAction::Down {
            return false;
        }

        let (x, y) = self.arbiter.session.tracked_position(event);
        let can_collapse = self.can_collapse_panel_on_touch();

        match event.action {
            MotionAction::Down => {
                let animating_on_down =
                    self.animator.is_running() && !self.animator.is_spring_back();
                self.arbiter.session.animating_on_down = animating_on_down;
                self.arbiter.session.min_expand_height = 0.0;
                if animating_on_down && self.is_closing() && !self.animator.is_hint_running() {
                    // Catch the closing panel mid-flight.
                    self.cancel_height_animator();
                    self.arbiter.session.touch_slop_exceeded = true;
                    self.arbiter.state = ArbiterState::InterceptCandidate;
                    return true;
                }
                if !self.is_tracking() || self.is_fully_collapsed() {
                    self.arbiter.session.anchor(x, y);
                }
                let collapsed = self.is_fully_collapsed();
                let s = &mut self.arbiter.session;
                s.touch_started_in_empty_area = !self.collab.content.is_in_content_bounds(x, y);
                s.touch_slop_exceeded = s.down.touch_slop_exceeded_before_down;
                s.motion_aborted = false;
                s.panel_closed_on_down = collapsed;
                s.collapsed_and_heads_up_on_down = false;
                s.has_layouted_since_down = false;
                s.touch_above_falsing_threshold = false;
                self.update_fling_on_layout = None;
                self.arbiter.add_movement(event);
                if self.arbiter.state != ArbiterState::OwningDrag {
                    self.arbiter.state = ArbiterState::InterceptCandidate;
                }
            }
            MotionAction::PointerUp { .. } => {
                if let Some((nx, ny)) = self.arbiter.session.retarget_on_pointer_up(event) {
                    self.arbiter.session.anchor(nx, ny);
                }
            }
            MotionAction::PointerDown { .. } => {
                if self.mode.is_on_keyguard() {
                    tracing::debug!(target: "shade::touch", "second pointer on keyguard; aborting");
                    self.arbiter.session.motion_aborted = true;
                    self.arbiter.velocity.clear();
                    self.arbiter.state = ArbiterState::Idle;
                }
            }
            MotionAction::Move => {
                let h = self.arbiter.session.travel(y);
                self.arbiter.add_movement(event);
                let s = &self.arbiter.session;
                let open_without_heads_up =
                    s.panel_closed_on_down && !s.collapsed_and_heads_up_on_down;
                if can_collapse
                    || s.touch_started_in_empty_area
                    || s.animating_on_down
                    || open_without_heads_up
                {
                    let slop = self.mode.touch_slop(event);
                    let steep = h.abs() > s.travel_x(x).abs();
                    let past_slop = h < -slop
                        || ((open_without_heads_up || s.animating_on_down) && h.abs() > slop);
                    if past_slop && steep {
                        self.cancel_height_animator();
                        let height = self.expansion.height();
                        self.start_expand_motion(x, y, true, height);
                        return true;
                    }
                }
            }
            MotionAction::Up | MotionAction::Cancel => {
                self.arbiter.velocity.clear();
            }
        }
        false
    }

    // -----------------------------------------------------------------------
    // Touch path
    // -----------------------------------------------------------------------

    /// Handle an event the panel owns. Returns whether it was consumed.
    pub fn on_touch_event(&mut self, event: &MotionEvent) -> bool {
        let _span = tracing::debug_span!(
            target: "shade::touch",
            "touch",
            action = ?event.action,
            t_ms = event.event_time.as_millis() as u64
        )
        .entered();
        self.now = self.now.max(event.event_time);
        let handled = self.touch(event);
        if is_terminal(event.action) {
            self.arbiter.state = ArbiterState::Idle;
        }
        handled
    }

    fn touch(&mut self, event: &MotionEvent) -> bool {
        if event.action == MotionAction::Down {
            if self.arbiter.last_touch_down_time == Some(event.down_time) {
                tracing::warn!(
                    target: "shade::touch",
                    down_time_ms = event.down_time.as_millis() as u64,
                    "duplicate down swallowed"
                );
                return true;
            }
            self.arbiter.last_touch_down_time = Some(event.down_time);
        }

        if self.collab.quick_settings.is_fully_expanded_and_touches_disallowed() {
            return false;
        }
        if self.collab.keyguard.is_bouncer_showing_scrimmed()
            || self.collab.keyguard.is_bouncer_showing_over_dream()
        {
            return false;
        }
        if is_terminal(event.action) {
            self.arbiter.session.blocking_expansion = false;
        }
        if self.arbiter.session.synthesized_down && event.action == MotionAction::Up {
            // Hand-off tap: open the panel.
            self.expand(true);
        }
        self.init_down_states(event);

        let down = self.arbiter.session.down;
        let pulse_should_get_touch = (!self.is_expanding()
            && !self.collab.quick_settings.should_intercept(down.x, down.y))
            || self.collab.pulse.is_expanding();
        if pulse_should_get_touch && self.collab.pulse.on_touch_event(event) {
            self.arbiter.delegate(TouchOwner::Pulse);
            return true;
        }
        if self.mode.params().pulsing {
            return true;
        }

        if down.listen_for_heads_up
            && !self.collab.heads_up.is_tracking_heads_up()
            && !self.collab.content.is_long_press_in_progress()
            && self.collab.heads_up.on_intercept_touch_event(event)
        {
            tracing::trace!(target: "shade::touch", "heads-up claimed the drag");
        }
        let mut handled = self.collab.heads_up.on_touch_event(event);
        if handled {
            self.arbiter.delegate(TouchOwner::HeadsUp);
        }

        let collapsed = self.is_fully_collapsed();
        let animating = self.is_height_animation_running();
        if !self.collab.heads_up.is_tracking_heads_up()
            && self.collab.quick_settings.handle_touch(event, collapsed, animating)
        {
            self.arbiter.delegate(TouchOwner::QuickSettings);
            return true;
        }
        if event.action == MotionAction::Down && collapsed {
            handled = true;
        }

        handled |= self.handle_touch(event);
        !self.mode.params().dozing || handled
    }

    fn handle_touch(&mut self, event: &MotionEvent) -> bool {
        if self.expansion.is_instant_expanding() {
            return false;
        }
        if self.touch_disabled && event.action != MotionAction::Cancel {
            return false;
        }
        if self.arbiter.session.motion_aborted && event.action != MotionAction::Down {
            return false;
        }
        if !self.notifications_drag_enabled {
            if self.is_tracking() {
                self.on_tracking_stopped(true);
            }
            return false;
        }
        if self.is_fully_collapsed() && event.source == InputSource::Mouse {
            if event.action == MotionAction::Up {
                self.expand(true);
            }
            return true;
        }

        let (x, y) = self.arbiter.session.tracked_position(event);
        if matches!(event.action, MotionAction::Down | MotionAction::Move) {
            let wait = self.should_gesture_wait_for_touch_slop();
            self.arbiter.session.gesture_wait_for_touch_slop = wait;
        }

        match event.action {
            MotionAction::Down => {
                let height = self.expansion.height();
                self.start_expand_motion(x, y, false, height);
                let collapsed = self.is_fully_collapsed();
                let pinned = self.collab.heads_up.has_pinned_heads_up();
                let s = &mut self.arbiter.session;
                s.min_expand_height = 0.0;
                s.panel_closed_on_down = collapsed;
                s.has_layouted_since_down = false;
                s.motion_aborted = false;
                s.touch_above_falsing_threshold = false;
                s.collapsed_and_heads_up_on_down = collapsed && pinned;
                self.update_fling_on_layout = None;
                self.arbiter.add_movement(event);

                let animating = self.is_height_animation_running();
                if !self.arbiter.session.gesture_wait_for_touch_slop || animating {
                    self.arbiter.session.touch_slop_exceeded =
                        animating || self.arbiter.session.down.touch_slop_exceeded_before_down;
                    self.cancel_height_animator();
                    self.on_tracking_started();
                } else if self.arbiter.state() != ArbiterState::OwningDrag {
                    self.arbiter.state = ArbiterState::InterceptCandidate;
                }
                if collapsed && !pinned && !self.collab.keyguard.is_bouncer_showing() {
                    tracing::trace!(target: "shade::touch", "opening from collapsed");
                    self.publish_expansion();
                }
            }
            MotionAction::PointerUp { .. } => {
                if let Some((nx, ny)) = self.arbiter.session.retarget_on_pointer_up(event) {
                    let height = self.expansion.height();
                    self.start_expand_motion(nx, ny, true, height);
                    // Re-anchor even while tracking so the panel does not jump.
                    self.arbiter.session.anchor(nx, ny);
                }
            }
            MotionAction::PointerDown { .. } => {
                if self.mode.is_on_keyguard() {
                    tracing::debug!(target: "shade::touch", "second pointer on keyguard; aborting");
                    self.arbiter.session.motion_aborted = true;
                    self.end_motion_event(event, x, y, true);
                    return false;
                }
            }
            MotionAction::Move => {
                self.arbiter.add_movement(event);
                let mut h = self.arbiter.session.travel(y);
                if h.abs() > self.mode.touch_slop(event) {
                    self.arbiter.session.touch_slop_exceeded = true;
                    let s = &self.arbiter.session;
                    if s.gesture_wait_for_touch_slop
                        && !self.is_tracking()
                        && !s.collapsed_and_heads_up_on_down
                    {
                        if s.initial_offset != 0.0 {
                            let height = self.expansion.height();
                            self.start_expand_motion(x, y, false, height);
                            h = 0.0;
                        }
                        self.cancel_height_animator();
                        self.on_tracking_started();
                    }
                }
                let new_height = self.arbiter.session.dragged_height(h);
                let threshold = self
                    .mode
                    .falsing_threshold(self.collab.keyguard.is_wake_up_from_touch());
                self.arbiter.session.note_travel(h, threshold, x, y);

                let s = &self.arbiter.session;
                let may_move = !s.gesture_wait_for_touch_slop || self.is_tracking();
                let blocked =
                    s.blocking_expansion || self.collab.quick_settings.is_tracking_blocked();
                if may_move && !blocked {
                    self.set_expanded_height_internal(new_height);
                }
            }
            MotionAction::Up | MotionAction::Cancel => {
                self.arbiter.add_movement(event);
                self.end_motion_event(event, x, y, false);
            }
        }
        !self.arbiter.session.gesture_wait_for_touch_slop || self.is_tracking()
    }

    fn should_gesture_wait_for_touch_slop(&mut self) -> bool {
        if self.expecting_synthesized_down {
            self.expecting_synthesized_down = false;
            return false;
        }
        self.mode
            .should_gesture_wait_for_touch_slop(self.is_fully_collapsed())
    }

    /// Anchor a drag at `(x, y)` with the panel at `height`.
    ///
    /// With `start_tracking` the drag takes ownership immediately.
    fn start_expand_motion(&mut self, x: f32, y: f32, start_tracking: bool, height: f32) {
        self.arbiter.session.initial_offset = height;
        if !self.is_tracking() || self.is_fully_collapsed() {
            self.arbiter.session.anchor(x, y);
        }
        self.arbiter.session.initial_touch_from_keyguard = self.collab.keyguard.is_showing();
        if start_tracking {
            self.arbiter.session.touch_slop_exceeded = true;
            self.set_expanded_height_internal(height);
            self.on_tracking_started();
        }
    }

    /// Resolve a release: fling one way or the other, or report a click.
    fn end_motion_event(&mut self, event: &MotionEvent, x: f32, y: f32, force_cancel: bool) {
        self.arbiter.session.tracking_pointer = None;
        let slop = self.mode.base_touch_slop();
        let s = &self.arbiter.session;
        let moved = (self.is_tracking() && s.touch_slop_exceeded)
            || s.travel_x(x).abs() > slop
            || s.travel(y).abs() > slop
            || (!self.is_fully_expanded() && !self.is_fully_collapsed())
            || event.action == MotionAction::Cancel
            || force_cancel;

        if moved {
            let velocity = self.arbiter.velocity.velocity();
            let kind = if force_cancel {
                ReleaseKind::ForcedCancel
            } else if event.action == MotionAction::Cancel {
                ReleaseKind::Cancel
            } else {
                ReleaseKind::Up
            };
            let ctx = ReleaseContext {
                kind,
                velocity,
                start: (s.initial_x, s.initial_y),
                end: (x, y),
                fraction: self.expansion.fraction(),
                time_since_down: event.event_time.saturating_sub(s.down.time),
                allow_expand_for_small_expansion: s.down.allow_expand_for_small_expansion,
                touch_above_falsing_threshold: s.touch_above_falsing_threshold,
                upwards_when_threshold_reached: s.upwards_when_threshold_reached,
                on_keyguard: self.collab.keyguard.is_showing(),
                touch_started_on_keyguard: s.initial_touch_from_keyguard,
                keyguard_fading_away: self.collab.keyguard.is_fading_away(),
                can_dismiss_lock_screen: self.collab.keyguard.can_dismiss_lock_screen(),
                bouncer_showing_over_dream: self.collab.keyguard.is_bouncer_showing_over_dream(),
                panel_closed_on_down: s.panel_closed_on_down,
                qs_expansion_animating: self.collab.quick_settings.is_expansion_animating(),
            };
            let decision = self.classifier.classify(&ctx, self.collab.falsing.as_ref());
            let interaction = if velocity.y == 0.0 {
                InteractionType::Generic
            } else {
                shade_core::GestureClassifier::interaction_type(&ctx)
            };
            let false_touch =
                self.classifier
                    .is_false_touch(&ctx, self.collab.falsing.as_ref(), interaction);
            let expand = decision.expand;
            let panel_closed_on_down = s.panel_closed_on_down;
            let has_layouted = s.has_layouted_since_down;

            if self.mode.is_on_keyguard() && self.expansion.fraction() >= 1.0 {
                tracing::debug!(target: "shade::touch", "keyguard fully shown; no fling");
            } else {
                self.fling(velocity.y, expand, 1.0, false_touch);
            }
            self.on_tracking_stopped(expand);
            self.update_fling_on_layout =
                (expand && panel_closed_on_down && !has_layouted).then_some(velocity.y);
        } else if !self.collab.keyguard.is_bouncer_showing()
            && !self.collab.keyguard.is_going_away()
        {
            self.on_empty_space_click(x, y);
            self.on_tracking_stopped(true);
        }
        self.arbiter.velocity.clear();
        self.arbiter.state = ArbiterState::Idle;
    }

    /// Snapshot the panel on a down; clear the hand-off marker otherwise.
    fn init_down_states(&mut self, event: &MotionEvent) {
        if event.action != MotionAction::Down {
            self.arbiter.session.synthesized_down = false;
            return;
        }
        if self.arbiter.last_recorded_down == Some(event.event_time) {
            return;
        }
        self.arbiter.last_recorded_down = Some(event.event_time);

        let (x, y) = event.position(0);
        let collapsed = self.is_fully_collapsed();
        let synthesized = self.expecting_synthesized_down;
        let snapshot = DownSnapshot {
            x,
            y,
            time: event.event_time,
            dozing: self.mode.params().dozing,
            collapsed,
            collapse_on_qqs: self.collab.quick_settings.can_panel_collapse_on_qqs(x, y),
            listen_for_heads_up: collapsed && self.collab.heads_up.has_pinned_heads_up(),
            allow_expand_for_small_expansion: synthesized,
            touch_slop_exceeded_before_down: synthesized,
        };
        self.arbiter.session.begin(snapshot);
        self.arbiter.session.synthesized_down = synthesized;
        self.arbiter.down_events.push(DownEvent {
            time: snapshot.time,
            x,
            y,
            dozing: snapshot.dozing,
            collapsed,
            can_collapse: snapshot.collapse_on_qqs,
            listen_for_heads_up: snapshot.listen_for_heads_up,
            allow_expand_for_small_expansion: synthesized,
            touch_slop_exceeded_before_down: synthesized,
            last_event_synthesized: synthesized,
        });
    }
}
