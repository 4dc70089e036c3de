#![forbid(unsafe_code)]

//! Mode-dependent parameters: bar state, dozing, split shade, layout.
//!
//! [`PanelModeController`] absorbs external state changes as [`ModeEvent`]s
//! and answers the questions whose answer depends on them: how far the panel
//! travels, how much slop a drag needs, how far an unlock swipe must go.
//!
//! # Invariants
//!
//! - [`max_travel_distance`](PanelModeController::max_travel_distance) is
//!   never negative.
//! - Outside split shade the travel distance equals the max panel height.

use std::fmt;

use shade_core::{Classification, MotionEvent, ShadeConfig};

/// Which surface the status bar is showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BarState {
    /// Unlocked; the panel is pulled over the home screen.
    #[default]
    Shade,
    /// Lock screen; the panel is the lock screen.
    Keyguard,
    /// Shade pulled down over the lock screen.
    ShadeLocked,
}

impl fmt::Display for BarState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Shade => "shade",
            Self::Keyguard => "keyguard",
            Self::ShadeLocked => "shade-locked",
        })
    }
}

/// Heights measured by the host's layout pass, in px.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LayoutMetrics {
    /// Height of the panel's window.
    pub view_height: f32,
    /// Panel height showing notifications only.
    pub panel_height_shade: f32,
    /// Panel height with quick settings expanded.
    pub panel_height_qs_expanded: f32,
    /// Height of collapsed quick settings.
    pub qs_min_expansion_height: f32,
    /// Notifications currently shown in the list.
    pub visible_notification_count: usize,
}

/// External state the panel reacts to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ModeEvent {
    BarStateChanged(BarState),
    DozingChanged(bool),
    SplitShadeChanged(bool),
    QsExpandedChanged(bool),
    /// QS expands along with the next panel expansion.
    QsExpandImmediateChanged(bool),
    PulsingChanged(bool),
    /// A heads-up drag started at this height (px).
    HeadsUpStartHeight(f32),
    /// The panel is expanding because a heads-up was dragged.
    ExpandingFromHeadsUp(bool),
    Layout(LayoutMetrics),
}

/// Current values of everything [`ModeEvent`] can change.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ModeParams {
    pub bar_state: BarState,
    pub dozing: bool,
    pub split_shade: bool,
    pub qs_expanded: bool,
    pub qs_expand_immediate: bool,
    pub pulsing: bool,
    pub heads_up_start_height: f32,
    pub expanding_from_heads_up: bool,
    pub layout: LayoutMetrics,
}

/// Reconfigures thresholds and travel distance as the mode changes.
#[derive(Debug, Clone)]
pub struct PanelModeController {
    params: ModeParams,
    touch_slop: f32,
    ambiguous_slop_multiplier: f32,
    falsing_threshold: f32,
    falsing_threshold_wakeup_factor: f32,
    split_shade_transition: f32,
    heads_up_travel_factor: f32,
    status_bar_min_height: f32,
    /// QS was expanded when the current expansion began.
    qs_expanded_when_expanding_started: bool,
}

impl PanelModeController {
    #[must_use]
    pub fn new(config: &ShadeConfig) -> Self {
        Self {
            params: ModeParams::default(),
            touch_slop: config.touch_slop_px(),
            ambiguous_slop_multiplier: config.ambiguous_slop_multiplier,
            falsing_threshold: config.px(config.falsing_threshold_dp),
            falsing_threshold_wakeup_factor: config.falsing_threshold_wakeup_factor,
            split_shade_transition: config.px(config.split_shade_transition_dp),
            heads_up_travel_factor: config.heads_up_travel_factor,
            status_bar_min_height: config.px(config.status_bar_min_height_dp),
            qs_expanded_when_expanding_started: false,
        }
    }

    #[inline]
    #[must_use]
    pub fn params(&self) -> &ModeParams {
        &self.params
    }

    #[inline]
    #[must_use]
    pub fn bar_state(&self) -> BarState {
        self.params.bar_state
    }

    #[inline]
    #[must_use]
    pub fn is_on_keyguard(&self) -> bool {
        self.params.bar_state == BarState::Keyguard
    }

    #[inline]
    #[must_use]
    pub fn layout(&self) -> &LayoutMetrics {
        &self.params.layout
    }

    /// Apply an external change. Returns whether anything changed.
    pub fn dispatch(&mut self, event: ModeEvent) -> bool {
        let before = self.params;
        let p = &mut self.params;
        match event {
            ModeEvent::BarStateChanged(state) => p.bar_state = state,
            ModeEvent::DozingChanged(dozing) => p.dozing = dozing,
            ModeEvent::SplitShadeChanged(split) => p.split_shade = split,
            ModeEvent::QsExpandedChanged(expanded) => p.qs_expanded = expanded,
            ModeEvent::QsExpandImmediateChanged(immediate) => p.qs_expand_immediate = immediate,
            ModeEvent::PulsingChanged(pulsing) => p.pulsing = pulsing,
            ModeEvent::HeadsUpStartHeight(height) => {
                p.heads_up_start_height = if height.is_finite() { height.max(0.0) } else { 0.0 };
            }
            ModeEvent::ExpandingFromHeadsUp(from) => p.expanding_from_heads_up = from,
            ModeEvent::Layout(metrics) => p.layout = metrics,
        }
        let changed = before != self.params;
        if changed {
            tracing::debug!(
                target: "shade::mode",
                ?event,
                bar_state = %self.params.bar_state,
                "mode changed"
            );
        }
        changed
    }

    /// Remember whether QS was expanded as an expansion starts.
    pub fn on_expanding_started(&mut self, qs_expanded: bool) {
        self.qs_expanded_when_expanding_started = qs_expanded;
    }

    /// Height of the fully open panel.
    #[must_use]
    pub fn max_panel_height(&self, expanding: bool) -> f32 {
        let p = &self.params;
        let mut min = self.status_bar_min_height;
        if p.bar_state != BarState::Keyguard && p.layout.visible_notification_count == 0 {
            min = min.max(p.layout.qs_min_expansion_height);
        }
        let with_qs = p.qs_expand_immediate
            || p.qs_expanded
            || (expanding && self.qs_expanded_when_expanding_started)
            || p.pulsing
            || p.split_shade;
        let height = if with_qs {
            p.layout.panel_height_qs_expanded
        } else {
            p.layout.panel_height_shade
        };
        let height = height.max(min);
        if height <= 0.0 && p.layout.view_height > 0.0 {
            tracing::warn!(
                target: "shade::mode",
                qs_expanded_height = p.layout.panel_height_qs_expanded,
                shade_height = p.layout.panel_height_shade,
                status_bar_min_height = self.status_bar_min_height,
                "max panel height is invalid"
            );
        }
        height.max(0.0)
    }

    /// Distance that maps to a full expansion.
    ///
    /// Split shade on an unlocked device uses a fixed distance so the motion
    /// speed stays constant; a heads-up drag stretches it so nothing becomes
    /// visible at once.
    #[must_use]
    pub fn max_travel_distance(&self, expanding: bool, tracking_heads_up: bool) -> f32 {
        let p = &self.params;
        if p.split_shade && p.bar_state == BarState::Shade {
            if tracking_heads_up || p.expanding_from_heads_up {
                let stretched = self
                    .split_shade_transition
                    .max(p.heads_up_start_height * self.heads_up_travel_factor);
                stretched.min(self.max_panel_height(expanding))
            } else {
                self.split_shade_transition
            }
        } else {
            self.max_panel_height(expanding)
        }
    }

    /// Lower bound on the fraction while a heads-up is dragged.
    #[must_use]
    pub fn heads_up_min_fraction(&self, expanding: bool, tracking_heads_up: bool) -> f32 {
        let start = self.params.heads_up_start_height;
        let distance = if self.params.split_shade {
            let high = start * self.heads_up_travel_factor > self.split_shade_transition;
            if high {
                self.max_travel_distance(expanding, tracking_heads_up)
            } else {
                self.split_shade_transition
            }
        } else {
            self.max_panel_height(expanding)
        };
        if distance > 0.0 { (start / distance).min(1.0) } else { 0.0 }
    }

    /// Slop a drag must exceed, scaled up while the gesture is ambiguous.
    #[must_use]
    pub fn touch_slop(&self, event: &MotionEvent) -> f32 {
        if event.classification == Classification::AmbiguousGesture {
            self.touch_slop * self.ambiguous_slop_multiplier
        } else {
            self.touch_slop
        }
    }

    #[inline]
    #[must_use]
    pub fn base_touch_slop(&self) -> f32 {
        self.touch_slop
    }

    /// Travel an unlock swipe needs before it counts as intentional.
    #[must_use]
    pub fn falsing_threshold(&self, wake_up_from_touch: bool) -> f32 {
        if wake_up_from_touch {
            self.falsing_threshold * self.falsing_threshold_wakeup_factor
        } else {
            self.falsing_threshold
        }
    }

    /// A drag on a collapsed panel or outside the plain shade waits for slop
    /// before moving the panel.
    #[must_use]
    pub fn should_gesture_wait_for_touch_slop(&self, fully_collapsed: bool) -> bool {
        fully_collapsed || self.params.bar_state != BarState::Shade
    }
}
