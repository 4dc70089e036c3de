#![forbid(unsafe_code)]

//! The panel controller: the single owner of the shade's expansion.
//!
//! [`PanelController`] ties the expansion record, the animator, the release
//! classifier, the mode controller and the touch arbiter together. Touches
//! (see [`crate::touch`]), frames, layout passes and programmatic commands
//! all end up as writes through the controller, which then fans the new
//! state out to quick settings and to subscribers.
//!
//! # Invariants
//!
//! 1. At most one height animation is active; starting one cancels the
//!    previous synchronously, before any new frame is produced.
//! 2. Height writes always go through the clamping of
//!    [`ExpansionState::set_height`], so `0 <= height <= max_travel`.
//! 3. Observers see an [`ShadeEvent::ExpansionChanged`] only when the
//!    published snapshot actually changed.
//! 4. No frame callback mutates state after its animation was cancelled.
//!
//! # Failure Modes
//!
//! - A config that fails validation is logged and used as given; every
//!   derived quantity is clamped at its point of use.
//! - An instant expand that never sees a layout pass stays pending; the host
//!   must call [`PanelController::on_layout`] after [`PanelController::expand`].

use std::fmt;
use std::time::Duration;

use shade_core::{
    AnimatorEvent, AnimatorPhase, DownEventState, ExpansionChange, ExpansionFlags,
    ExpansionState, FlingAnimator, FlingEnvironment, FlingRequest, FlingTuning,
    GestureClassifier, ShadeConfig,
};

use crate::collaborators::Collaborators;
use crate::listeners::{Listeners, ShadeEvent, Subscription};
use crate::mode::{BarState, LayoutMetrics, ModeEvent, PanelModeController};
use crate::touch::TouchArbiter;

/// A collapse scheduled for later by [`PanelController::collapse`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct PendingCollapse {
    pub(crate) due: Duration,
    pub(crate) speed_up: f32,
}

/// Owner of the shade's expansion and the entry point for every input.
pub struct PanelController {
    pub(crate) config: ShadeConfig,
    pub(crate) expansion: ExpansionState,
    pub(crate) animator: FlingAnimator,
    pub(crate) classifier: GestureClassifier,
    pub(crate) mode: PanelModeController,
    pub(crate) arbiter: TouchArbiter,
    pub(crate) collab: Collaborators,
    listeners: Listeners,

    /// Latest timestamp seen from an event or a frame.
    pub(crate) now: Duration,
    /// Timestamp of the previous animation frame; `None` until the first
    /// frame of the current animation.
    frame_clock: Option<Duration>,
    pub(crate) pending_collapse: Option<PendingCollapse>,
    animate_after_expanding: bool,
    pub(crate) touch_disabled: bool,
    pub(crate) notifications_drag_enabled: bool,
    /// Velocity of an opening fling that must be restarted after layout.
    pub(crate) update_fling_on_layout: Option<f32>,
    panel_update_when_animator_ends: bool,
    fixed_duration: Option<Duration>,
    pub(crate) expecting_synthesized_down: bool,

    last_change: Option<ExpansionChange>,
    last_over: f32,
    last_visible: bool,
}

impl fmt::Debug for PanelController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PanelController")
            .field("expansion", &self.expansion)
            .field("phase", &self.animator.phase())
            .field("bar_state", &self.mode.bar_state())
            .field("arbiter", &self.arbiter.state())
            .finish_non_exhaustive()
    }
}

impl PanelController {
    /// Build a controller from `config` and the host's collaborators.
    pub fn new(config: ShadeConfig, collaborators: Collaborators) -> Self {
        let problems = config.validate();
        if !problems.is_empty() {
            tracing::warn!(
                target: "shade::controller",
                problems = ?problems,
                "shade config failed validation; using it as given"
            );
        }
        let expansion = ExpansionState::new(config.overshoot_px());
        let animator = FlingAnimator::new(FlingTuning::from_config(&config));
        let classifier = GestureClassifier::new(
            config.min_velocity_px(),
            config.max_time_to_open_from_launcher(),
        );
        let mode = PanelModeController::new(&config);
        let arbiter = TouchArbiter::new(DownEventState::new(config.down_event_capacity));
        Self {
            config,
            expansion,
            animator,
            classifier,
            mode,
            arbiter,
            collab: collaborators,
            listeners: Listeners::new(),
            now: Duration::ZERO,
            frame_clock: None,
            pending_collapse: None,
            animate_after_expanding: false,
            touch_disabled: false,
            notifications_drag_enabled: true,
            update_fling_on_layout: None,
            panel_update_when_animator_ends: false,
            fixed_duration: None,
            expecting_synthesized_down: false,
            last_change: None,
            last_over: 0.0,
            last_visible: false,
        }
    }

    /// Register an observer. It stays registered while the guard lives.
    pub fn subscribe(&self, callback: impl Fn(&ShadeEvent) + 'static) -> Subscription {
        self.listeners.subscribe(callback)
    }

    pub(crate) fn emit(&self, event: ShadeEvent) {
        self.listeners.emit(&event);
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    #[inline]
    #[must_use]
    pub fn config(&self) -> &ShadeConfig {
        &self.config
    }

    #[inline]
    #[must_use]
    pub fn expansion(&self) -> &ExpansionState {
        &self.expansion
    }

    #[inline]
    #[must_use]
    pub fn mode(&self) -> &PanelModeController {
        &self.mode
    }

    #[inline]
    #[must_use]
    pub fn arbiter(&self) -> &TouchArbiter {
        &self.arbiter
    }

    /// Latest timestamp seen from an event or a frame.
    #[inline]
    #[must_use]
    pub fn now(&self) -> Duration {
        self.now
    }

    #[inline]
    #[must_use]
    pub fn expanded_height(&self) -> f32 {
        self.expansion.height()
    }

    #[inline]
    #[must_use]
    pub fn expanded_fraction(&self) -> f32 {
        self.expansion.fraction()
    }

    #[inline]
    #[must_use]
    pub fn over_expansion(&self) -> f32 {
        self.expansion.over_expansion()
    }

    #[inline]
    #[must_use]
    pub fn is_tracking(&self) -> bool {
        self.expansion.is_tracking()
    }

    #[inline]
    #[must_use]
    pub fn is_fully_collapsed(&self) -> bool {
        self.expansion.is_fully_collapsed()
    }

    #[inline]
    #[must_use]
    pub fn is_fully_expanded(&self) -> bool {
        self.expansion.is_fully_expanded()
    }

    #[inline]
    #[must_use]
    pub fn is_expanding(&self) -> bool {
        self.expansion.is_expanding()
    }

    #[inline]
    #[must_use]
    pub fn is_closing(&self) -> bool {
        self.expansion.is_closing()
    }

    #[inline]
    #[must_use]
    pub fn is_flinging(&self) -> bool {
        self.animator.is_flinging()
    }

    #[inline]
    #[must_use]
    pub fn is_unlock_hint_running(&self) -> bool {
        self.animator.is_hint_running()
    }

    #[inline]
    #[must_use]
    pub fn animator_phase(&self) -> AnimatorPhase {
        self.animator.phase()
    }

    /// A fling or drag-driven animation (not a hint or spring-back) runs.
    #[must_use]
    pub fn is_height_animation_running(&self) -> bool {
        self.animator.is_running() && !self.animator.is_hint_running() && !self.animator.is_spring_back()
    }

    /// Whether the panel counts as expanded for observers.
    #[must_use]
    pub fn is_expanded(&self) -> bool {
        self.expansion.fraction() > 0.0
            || self.expansion.is_instant_expanding()
            || self.collab.heads_up.has_pinned_heads_up()
            || self.expansion.is_tracking()
            || (self.animator.is_running() && !self.animator.is_spring_back())
    }

    /// Whether the panel window needs to be visible.
    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.is_expanded()
            || self.collab.heads_up.has_pinned_heads_up()
            || self.collab.keyguard.is_bouncer_showing()
    }

    #[must_use]
    pub fn can_panel_be_collapsed(&self) -> bool {
        self.expansion.can_be_collapsed()
    }

    /// Whether an upward drag on the current content may collapse the panel.
    #[must_use]
    pub fn can_collapse_panel_on_touch(&self) -> bool {
        let params = self.mode.params();
        if !params.qs_expanded && params.bar_state == BarState::Keyguard {
            return true;
        }
        if self.collab.content.is_scrolled_to_bottom() {
            return true;
        }
        !params.split_shade && (params.qs_expanded || self.arbiter.session.down.collapse_on_qqs)
    }

    /// The dismissing curve applies on the lock screen and shade-locked.
    #[must_use]
    pub fn should_use_dismissing_animation(&self) -> bool {
        self.mode.bar_state() != BarState::Shade
            && (self.collab.keyguard.can_dismiss_lock_screen() || !self.expansion.is_tracking())
    }

    /// Multi-line state dump for bug reports.
    #[must_use]
    pub fn dump(&self) -> String {
        self.to_string()
    }

    // -----------------------------------------------------------------------
    // Height writes and fan-out
    // -----------------------------------------------------------------------

    pub(crate) fn view_height(&self) -> f32 {
        let view = self.mode.layout().view_height;
        if view > 0.0 { view } else { self.expansion.max_travel_distance() }
    }

    pub(crate) fn refresh_max_travel(&mut self) {
        let max = self.mode.max_travel_distance(
            self.expansion.is_expanding(),
            self.collab.heads_up.is_tracking_heads_up(),
        );
        self.expansion.set_max_travel_distance(max);
    }

    /// Set the panel height in px. Values are clamped to `[0, max]`.
    pub fn set_expanded_height(&mut self, height: f32) {
        self.set_expanded_height_internal(height);
    }

    /// Set the panel height as a fraction of the max travel distance.
    pub fn set_expanded_fraction(&mut self, fraction: f32) {
        self.refresh_max_travel();
        let height = self.expansion.max_travel_distance() * fraction;
        self.set_expanded_height_internal(height);
    }

    pub(crate) fn set_expanded_height_internal(&mut self, height: f32) {
        self.refresh_max_travel();
        if !self.animator.is_running() && self.expansion.is_tracking() {
            let over = (height - self.expansion.max_travel_distance()).max(0.0);
            let view_height = self.view_height();
            self.expansion.set_over_expansion_from_gesture(over, view_height);
        }
        let update = self.expansion.set_height(height);
        if update.snapped_closed && self.animator.is_running() {
            let events = self.animator.end_now(&mut self.expansion);
            self.handle_animator_events(events);
        }
        self.publish_expansion();
    }

    /// Push the current state to quick settings and subscribers.
    pub(crate) fn publish_expansion(&mut self) {
        let change = self.expansion.change(self.is_expanded());
        if self.last_change != Some(change) {
            self.last_change = Some(change);
            self.collab
                .quick_settings
                .set_shade_expansion(self.expansion.height(), change.fraction);
            self.emit(ShadeEvent::ExpansionChanged(change));
        }

        let over = self.expansion.over_expansion();
        if over != self.last_over {
            self.last_over = over;
            self.emit(ShadeEvent::OverExpansionChanged(over));
        }

        let visible = self.is_visible();
        if visible != self.last_visible {
            self.last_visible = visible;
            self.emit(ShadeEvent::VisibilityChanged(visible));
        }
    }

    // -----------------------------------------------------------------------
    // Expanding / closing bookkeeping
    // -----------------------------------------------------------------------

    pub(crate) fn set_closing(&mut self, closing: bool) {
        if self.expansion.is_closing() != closing {
            self.expansion.set_flag(ExpansionFlags::CLOSING, closing);
            self.emit(ShadeEvent::CollapsingChanged(closing));
        }
    }

    pub(crate) fn end_closing(&mut self) {
        if self.expansion.is_closing() {
            self.set_closing(false);
            self.emit(ShadeEvent::ClosingFinished);
        }
    }

    pub(crate) fn notify_expanding_started(&mut self) {
        if self.expansion.is_expanding() {
            return;
        }
        self.expansion.set_flag(ExpansionFlags::EXPANDING, true);
        let qs_fully_expanded = self.collab.quick_settings.is_fully_expanded();
        self.mode.on_expanding_started(self.collab.quick_settings.is_expanded());
        self.collab.quick_settings.on_expanding_started(qs_fully_expanded);
        self.emit(ShadeEvent::ExpandingStarted);
    }

    pub(crate) fn notify_expanding_finished(&mut self) {
        self.end_closing();
        if self.expansion.is_expanding() {
            self.expansion.set_flag(ExpansionFlags::EXPANDING, false);
            self.emit(ShadeEvent::ExpandingFinished);
        }
        // The stretched heads-up travel only lasts for one expansion.
        if self.mode.dispatch(ModeEvent::ExpandingFromHeadsUp(false)) {
            self.refresh_max_travel();
            self.publish_expansion();
        }
    }

    pub(crate) fn set_expand_immediate(&mut self) {
        self.collab.quick_settings.set_expand_immediate(true);
        self.mode.dispatch(ModeEvent::QsExpandImmediateChanged(true));
    }

    /// A drag took ownership of the height.
    pub(crate) fn on_tracking_started(&mut self) {
        self.end_closing();
        self.expansion.set_flag(ExpansionFlags::TRACKING, true);
        self.arbiter.on_tracking_started();
        tracing::debug!(
            target: "shade::touch",
            height = self.expansion.height(),
            "tracking started"
        );
        self.emit(ShadeEvent::TrackingStarted);
        self.notify_expanding_started();
        self.publish_expansion();
        if self.collab.quick_settings.is_fully_expanded() {
            self.set_expand_immediate();
        }
        self.pending_collapse = None;
    }

    pub(crate) fn on_tracking_stopped(&mut self, expand: bool) {
        self.expansion.set_flag(ExpansionFlags::TRACKING, false);
        self.arbiter.on_tracking_stopped();
        self.publish_expansion();
        self.emit(ShadeEvent::TrackingStopped { expand });
    }

    // -----------------------------------------------------------------------
    // Animation
    // -----------------------------------------------------------------------

    /// Cancel the running height animation, if any, and end closing.
    pub(crate) fn cancel_height_animator(&mut self) {
        self.retire_animator();
        self.panel_update_when_animator_ends = false;
        self.end_closing();
    }

    /// Cancel the running animation and run its end bookkeeping now.
    ///
    /// A deferred max-height update stays pending for the next animation.
    fn retire_animator(&mut self) {
        if !self.animator.is_running() {
            return;
        }
        let update_pending = std::mem::take(&mut self.panel_update_when_animator_ends);
        let events = self.animator.cancel();
        self.handle_animator_events(events);
        self.panel_update_when_animator_ends = update_pending;
    }

    /// Stop every animation and any scheduled collapse.
    pub fn abort_animations(&mut self) {
        self.cancel_height_animator();
        self.pending_collapse = None;
    }

    /// Fling to fully open (`expand`) or closed.
    pub(crate) fn fling(&mut self, velocity: f32, expand: bool, speed_up: f32, false_touch: bool) {
        // The previous animation ends before this one captures its start.
        self.retire_animator();
        if !expand {
            self.set_closing(true);
        }
        self.refresh_max_travel();
        let target = if expand {
            self.expansion.max_travel_distance()
        } else {
            0.0
        };
        self.fling_to_height(velocity, expand, target, speed_up, false_touch);
    }

    fn fling_to_height(
        &mut self,
        velocity: f32,
        expand: bool,
        target: f32,
        speed_up: f32,
        false_touch: bool,
    ) {
        self.collab.heads_up.notify_fling(!expand);
        let env = FlingEnvironment {
            on_keyguard: self.mode.is_on_keyguard(),
            use_dismissing_animation: self.should_use_dismissing_animation(),
            view_height: self.view_height(),
        };
        let request = FlingRequest {
            target,
            velocity,
            expand,
            collapse_speed_up: speed_up,
            false_touch,
            fixed_duration: self.fixed_duration,
        };
        let events = self.animator.start_fling(request, env, &mut self.expansion);
        self.frame_clock = None;
        if self.animator.is_running() {
            self.emit(ShadeEvent::FlingStarted { expand, target });
        }
        self.handle_animator_events(events);
    }

    fn handle_animator_events(&mut self, events: Vec<AnimatorEvent>) {
        for event in events {
            match event {
                AnimatorEvent::FlingEnded { cancelled, .. } => {
                    // No overshoot survives a fling, finished or not.
                    self.expansion.set_over_expansion(0.0);
                    if !cancelled {
                        self.notify_expanding_finished();
                    }
                    self.after_animator_ended();
                }
                AnimatorEvent::HintEnded { .. } => {
                    self.notify_expanding_finished();
                    self.emit(ShadeEvent::UnlockHintFinished);
                    self.after_animator_ended();
                }
                AnimatorEvent::FlingStarted { .. }
                | AnimatorEvent::Frame { .. }
                | AnimatorEvent::SpringBackStarted { .. }
                | AnimatorEvent::HintPhaseStarted { .. } => {}
            }
        }
        self.publish_expansion();
    }

    fn after_animator_ended(&mut self) {
        if !self.animator.is_running() && self.panel_update_when_animator_ends {
            self.panel_update_when_animator_ends = false;
            self.update_expanded_height_to_max_height();
        }
    }

    /// Advance animations and scheduled work to `now`.
    pub fn on_frame(&mut self, now: Duration) {
        self.now = self.now.max(now);
        if let Some(pending) = self.pending_collapse {
            if self.now >= pending.due {
                self.pending_collapse = None;
                self.fling(0.0, false, pending.speed_up, false);
            }
        }
        if !self.animator.is_running() {
            self.frame_clock = None;
            return;
        }
        let dt = match self.frame_clock {
            Some(previous) => self.now.saturating_sub(previous),
            None => Duration::ZERO,
        };
        self.frame_clock = Some(self.now);
        let events = self.animator.on_frame(dt, &mut self.expansion);
        self.handle_animator_events(events);
    }

    // -----------------------------------------------------------------------
    // Layout and mode
    // -----------------------------------------------------------------------

    /// Apply an external mode change.
    pub fn on_mode_event(&mut self, event: ModeEvent) {
        if let ModeEvent::Layout(metrics) = event {
            self.on_layout(metrics);
            return;
        }
        if self.mode.dispatch(event) {
            self.refresh_max_travel();
            self.publish_expansion();
        }
    }

    /// A layout pass measured new heights.
    pub fn on_layout(&mut self, metrics: LayoutMetrics) {
        self.mode.dispatch(ModeEvent::Layout(metrics));
        self.refresh_max_travel();
        self.update_expanded_height_to_max_height();
        self.arbiter.session.has_layouted_since_down = true;

        if let Some(velocity) = self.update_fling_on_layout.take() {
            tracing::debug!(
                target: "shade::controller",
                velocity,
                "restarting opening fling after layout"
            );
            self.abort_animations();
            self.fling(velocity, true, 1.0, false);
        }

        if self.expansion.is_instant_expanding() {
            if self.animate_after_expanding {
                self.notify_expanding_started();
                self.fling(0.0, true, 1.0, false);
            } else {
                self.set_expanded_fraction(1.0);
            }
            self.expansion.set_flag(ExpansionFlags::INSTANT_EXPANDING, false);
        }
        self.publish_expansion();
    }

    /// Follow a changed max travel distance while the panel rests open.
    fn update_expanded_height_to_max_height(&mut self) {
        let max = self.expansion.max_travel_distance();
        if self.expansion.is_fully_collapsed() || max == self.expansion.height() {
            return;
        }
        if self.expansion.is_tracking()
            && !(self.arbiter.session.blocking_expansion
                || self.collab.quick_settings.is_tracking_blocked())
        {
            return;
        }
        if self.animator.is_running() && !self.animator.is_spring_back() {
            self.panel_update_when_animator_ends = true;
            return;
        }
        self.set_expanded_height_internal(max);
    }

    /// The heads-up being dragged started at `height` px.
    pub fn set_heads_up_dragging_starting_height(&mut self, height: f32) {
        self.on_mode_event(ModeEvent::HeadsUpStartHeight(height));
    }

    /// Lower bound on the fraction while a heads-up is dragged.
    #[must_use]
    pub fn heads_up_min_fraction(&self) -> f32 {
        self.mode.heads_up_min_fraction(
            self.expansion.is_expanding(),
            self.collab.heads_up.is_tracking_heads_up(),
        )
    }

    // -----------------------------------------------------------------------
    // Commands
    // -----------------------------------------------------------------------

    /// Collapse the panel.
    ///
    /// `delayed` schedules the fling after the configured collapse delay;
    /// `speed_up` shortens a zero-velocity collapse.
    pub fn collapse(&mut self, delayed: bool, speed_up: f32) {
        if !self.can_panel_be_collapsed() {
            tracing::trace!(target: "shade::controller", "collapse ignored");
            return;
        }
        if self.collab.quick_settings.is_expanded() {
            self.set_expand_immediate();
        }
        self.cancel_height_animator();
        self.notify_expanding_started();
        self.set_closing(true);
        if delayed {
            let due = self.now + self.config.collapse_delay();
            tracing::debug!(target: "shade::controller", ?due, "collapse scheduled");
            self.pending_collapse = Some(PendingCollapse { due, speed_up });
        } else {
            self.fling(0.0, false, speed_up, false);
        }
    }

    /// Collapse using exactly `duration` for the animation.
    pub fn collapse_with_duration(&mut self, duration: Duration) {
        self.fixed_duration = Some(duration);
        self.collapse(false, 1.0);
        self.fixed_duration = None;
    }

    /// Expand the panel, animated or instantly, on the next layout pass.
    pub fn expand(&mut self, animate: bool) {
        if !self.is_fully_collapsed() && !self.is_closing() {
            return;
        }
        tracing::debug!(target: "shade::controller", animate, "instant expand requested");
        self.expansion.set_flag(ExpansionFlags::INSTANT_EXPANDING, true);
        self.animate_after_expanding = animate;
        self.update_fling_on_layout = None;
        self.abort_animations();
        if self.expansion.is_tracking() {
            self.on_tracking_stopped(true);
        }
        if self.expansion.is_expanding() {
            self.notify_expanding_finished();
        }
        self.publish_expansion();
    }

    /// Expand with quick settings open.
    pub fn expand_with_qs(&mut self) {
        if self.collab.quick_settings.is_expansion_enabled() {
            self.set_expand_immediate();
        }
        if self.mode.params().split_shade && self.mode.is_on_keyguard() {
            self.emit(ShadeEvent::RequestBarState(BarState::ShadeLocked));
        } else if self.is_fully_collapsed() {
            self.expand(true);
        } else {
            self.collab.quick_settings.fling_expand();
        }
    }

    /// Expand showing notifications, closing quick settings if open.
    pub fn expand_to_notifications(&mut self) {
        let split = self.mode.params().split_shade;
        if split && (self.is_fully_expanded() || self.is_expanding()) {
            return;
        }
        if self.collab.quick_settings.is_expanded() {
            self.collab.quick_settings.fling_collapse();
        } else {
            self.expand(true);
        }
    }

    /// Jump to collapsed without animating.
    pub fn instant_collapse(&mut self) {
        self.abort_animations();
        self.set_expanded_fraction(0.0);
        if self.expansion.is_expanding() {
            self.notify_expanding_finished();
        }
        if self.expansion.is_instant_expanding() {
            self.expansion.set_flag(ExpansionFlags::INSTANT_EXPANDING, false);
            self.publish_expansion();
        }
    }

    /// Disable touches and animations, stopping whatever is in progress.
    pub fn set_touch_and_animation_disabled(&mut self, disabled: bool) {
        self.touch_disabled = disabled;
        if disabled {
            self.cancel_height_animator();
            if self.expansion.is_tracking() {
                self.on_tracking_stopped(true);
            }
            self.notify_expanding_finished();
        }
    }

    /// Allow or forbid dragging the panel by its notifications.
    pub fn set_notifications_drag_enabled(&mut self, enabled: bool) {
        self.notifications_drag_enabled = enabled;
    }

    /// Freeze height updates until the current touch ends.
    pub fn block_expansion_for_current_touch(&mut self, reason: &str) {
        tracing::debug!(target: "shade::touch", reason, "expansion blocked for current touch");
        self.arbiter.session.blocking_expansion = true;
    }

    /// Keep the dragged height at or above `height` px for the rest of the
    /// current gesture. Every down resets the floor to 0.
    pub fn set_min_expand_height(&mut self, height: f32) {
        self.arbiter.session.min_expand_height = if height.is_finite() {
            height.max(0.0)
        } else {
            0.0
        };
    }

    /// Pull the panel down a little and bounce it back.
    pub fn start_unlock_hint_animation(&mut self) {
        if self.collab.power.is_power_save_mode() || self.mode.params().dozing {
            self.emit(ShadeEvent::UnlockHintStarted);
            self.emit(ShadeEvent::UnlockHintFinished);
            return;
        }
        if self.animator.is_running() || self.expansion.is_tracking() {
            return;
        }
        self.notify_expanding_started();
        let events = self.animator.start_hint(&self.expansion);
        self.frame_clock = None;
        self.emit(ShadeEvent::UnlockHintStarted);
        self.handle_animator_events(events);
    }

    /// A focus hand-off is about to deliver a synthesized down.
    pub fn start_waiting_for_open_panel_gesture(&mut self) {
        if !self.is_fully_collapsed() {
            return;
        }
        self.expecting_synthesized_down = true;
        self.on_tracking_started();
    }

    /// The hand-off gesture ended without reaching the panel.
    ///
    /// `velocity` is in px per millisecond; anything above 1 opens the panel
    /// with that speed, slower opens it at rest speed.
    pub fn stop_waiting_for_open_panel_gesture(&mut self, cancel: bool, velocity: f32) {
        if !self.expecting_synthesized_down {
            return;
        }
        self.expecting_synthesized_down = false;
        if cancel {
            self.collapse(false, 1.0);
        } else {
            let velocity = if velocity > 1.0 { 1000.0 * velocity } else { 0.0 };
            self.fling(velocity, true, 1.0, false);
        }
        self.on_tracking_stopped(false);
    }

    /// A tap landed on empty panel space.
    pub(crate) fn on_empty_space_click(&mut self, x: f32, y: f32) {
        if self.animator.is_hint_running() {
            return;
        }
        self.emit(ShadeEvent::EmptySpaceClick { x, y });
        match self.mode.bar_state() {
            BarState::Keyguard => {
                if !self.arbiter.session.down.dozing {
                    self.start_unlock_hint_animation();
                }
            }
            BarState::ShadeLocked => {
                if !self.collab.quick_settings.is_expanded() {
                    self.emit(ShadeEvent::RequestBarState(BarState::Keyguard));
                }
            }
            BarState::Shade => {}
        }
    }

    /// The recent down events, newest last.
    #[must_use]
    pub fn down_events(&self) -> &DownEventState {
        self.arbiter.down_events()
    }
}

impl fmt::Display for PanelController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let e = &self.expansion;
        let s = &self.arbiter.session;
        writeln!(f, "PanelController:")?;
        writeln!(
            f,
            "  height={:.1} fraction={:.3} over={:.1} max_travel={:.1}",
            e.height(),
            e.fraction(),
            e.over_expansion(),
            e.max_travel_distance()
        )?;
        writeln!(
            f,
            "  tracking={} expanding={} closing={} instant_expanding={}",
            e.is_tracking(),
            e.is_expanding(),
            e.is_closing(),
            e.is_instant_expanding()
        )?;
        writeln!(
            f,
            "  animator={:?} active={:?} pending_collapse={:?}",
            self.animator.phase(),
            self.animator.active_id().map(|id| id.to_string()),
            self.pending_collapse.map(|p| p.due)
        )?;
        writeln!(
            f,
            "  bar_state={} dozing={} split_shade={} qs_expanded={}",
            self.mode.bar_state(),
            self.mode.params().dozing,
            self.mode.params().split_shade,
            self.mode.params().qs_expanded
        )?;
        writeln!(
            f,
            "  arbiter={:?} initial=({:.1}, {:.1}) offset={:.1} slop_exceeded={} aborted={}",
            self.arbiter.state(),
            s.initial_x,
            s.initial_y,
            s.initial_offset,
            s.touch_slop_exceeded,
            s.motion_aborted
        )?;
        writeln!(
            f,
            "  touch_disabled={} drag_enabled={} expecting_synthesized_down={}",
            self.touch_disabled, self.notifications_drag_enabled, self.expecting_synthesized_down
        )?;
        write!(f, "{}", self.arbiter.down_events())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{layout, new_controller, settle};

    #[test]
    fn fraction_round_trips_through_height() {
        let mut c = new_controller();
        c.set_expanded_fraction(0.25);
        assert!((c.expanded_fraction() - 0.25).abs() < 1e-6);
        assert!((c.expanded_height() - 300.0).abs() < 1e-3);
    }

    #[test]
    fn collapse_on_collapsed_panel_is_a_no_op() {
        let mut c = new_controller();
        c.collapse(false, 1.0);
        assert!(c.is_fully_collapsed());
        assert!(!c.is_closing());
        assert_eq!(c.animator_phase(), AnimatorPhase::Idle);
    }

    #[test]
    fn collapse_animates_to_zero() {
        let mut c = new_controller();
        c.set_expanded_fraction(1.0);
        c.collapse(false, 1.0);
        assert!(c.is_closing());
        assert!(c.is_flinging());
        settle(&mut c, Duration::from_secs(2));
        assert!(c.is_fully_collapsed());
        assert!(!c.is_closing());
        assert!(!c.is_expanding());
    }

    #[test]
    fn delayed_collapse_waits_for_the_delay() {
        let mut c = new_controller();
        c.set_expanded_fraction(1.0);
        c.collapse(true, 1.0);
        c.on_frame(Duration::from_millis(100));
        assert!(!c.is_flinging());
        assert!(c.is_closing());
        c.on_frame(Duration::from_millis(121));
        assert!(c.is_flinging());
    }

    #[test]
    fn instant_expand_completes_on_layout() {
        let mut c = new_controller();
        c.expand(false);
        assert!(c.is_expanded());
        assert!(c.is_fully_collapsed());
        c.on_layout(layout());
        assert!(c.is_fully_expanded());
        assert!(!c.expansion().is_instant_expanding());
    }

    #[test]
    fn instant_collapse_jumps_to_zero() {
        let mut c = new_controller();
        c.set_expanded_fraction(0.7);
        c.instant_collapse();
        assert!(c.is_fully_collapsed());
        assert!(!c.is_expanded());
    }

    #[test]
    fn layout_growth_follows_when_at_rest_open() {
        let mut c = new_controller();
        c.set_expanded_fraction(1.0);
        c.on_layout(LayoutMetrics {
            panel_height_shade: 1500.0,
            ..layout()
        });
        assert_eq!(c.expanded_height(), 1500.0);
        assert_eq!(c.expanded_fraction(), 1.0);
    }

    #[test]
    fn dump_mentions_state() {
        let mut c = new_controller();
        c.set_expanded_fraction(0.5);
        let dump = c.dump();
        assert!(dump.contains("fraction=0.500"), "{dump}");
        assert!(dump.contains("bar_state=shade"), "{dump}");
    }
}
