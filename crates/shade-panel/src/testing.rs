#![forbid(unsafe_code)]

//! Scriptable fakes and gesture helpers.
//!
//! [`FakeHost`] implements every collaborator trait from one shared
//! [`HostScript`]; tests flip its cells to put the host into a state and
//! read them back to see what the panel asked for.

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

use shade_core::{FalsingService, InteractionType, MotionEvent, ShadeConfig};

use crate::collaborators::{
    Collaborators, HeadsUpTouchHelper, KeyguardState, PowerState, PulseExpansion, QuickSettings,
    ShadeContent,
};
use crate::controller::PanelController;
use crate::listeners::{ShadeEvent, Subscription};
use crate::mode::LayoutMetrics;

/// Frame interval used by [`settle`].
pub const FRAME: Duration = Duration::from_millis(16);

/// Host state shared by every fake collaborator.
///
/// Cells default to the inert answer except where the field name says
/// otherwise.
#[derive(Debug, Default)]
pub struct HostScript {
    pub qs_expanded: Cell<bool>,
    pub qs_fully_expanded: Cell<bool>,
    pub qs_disallow_touches: Cell<bool>,
    pub qs_claims_touches: Cell<bool>,
    pub qs_tracking_blocked: Cell<bool>,
    pub qs_expansion_animating: Cell<bool>,
    /// Last `(height, fraction)` pushed to quick settings.
    pub qs_shade_expansion: Cell<Option<(f32, f32)>>,
    pub qs_fling_expand_calls: Cell<usize>,
    pub qs_fling_collapse_calls: Cell<usize>,

    pub heads_up_pinned: Cell<bool>,
    /// `collapse` argument of every fling the heads-up helper heard about.
    pub heads_up_flings: RefCell<Vec<bool>>,

    pub pulse_claims_touches: Cell<bool>,

    pub keyguard_showing: Cell<bool>,
    pub keyguard_fading_away: Cell<bool>,
    pub keyguard_going_away: Cell<bool>,
    pub cannot_dismiss_lock_screen: Cell<bool>,
    pub bouncer_showing: Cell<bool>,
    pub bouncer_scrimmed: Cell<bool>,
    pub bouncer_over_dream: Cell<bool>,

    pub power_save: Cell<bool>,

    /// Touches land outside the notification content.
    pub touches_in_empty_area: Cell<bool>,
    pub scrolled_away_from_bottom: Cell<bool>,

    pub falsing_enabled: Cell<bool>,
    pub falsing_verdict: Cell<bool>,
    pub unlocking_disabled: Cell<bool>,
}

/// Every collaborator, backed by one [`HostScript`].
#[derive(Debug, Clone, Default)]
pub struct FakeHost(pub Rc<HostScript>);

impl FakeHost {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn script(&self) -> &HostScript {
        &self.0
    }

    /// Collaborators that all share this host's script.
    #[must_use]
    pub fn collaborators(&self) -> Collaborators {
        Collaborators {
            quick_settings: Box::new(self.clone()),
            heads_up: Box::new(self.clone()),
            pulse: Box::new(self.clone()),
            keyguard: Box::new(self.clone()),
            power: Box::new(self.clone()),
            content: Box::new(self.clone()),
            falsing: Box::new(self.clone()),
        }
    }
}

impl QuickSettings for FakeHost {
    fn disallow_touches(&self) -> bool {
        self.0.qs_disallow_touches.get()
    }

    fn on_intercept(&mut self, _event: &MotionEvent) -> bool {
        self.0.qs_claims_touches.get()
    }

    fn handle_touch(&mut self, _event: &MotionEvent, _collapsed: bool, _animating: bool) -> bool {
        self.0.qs_claims_touches.get()
    }

    fn is_expanded(&self) -> bool {
        self.0.qs_expanded.get()
    }

    fn is_fully_expanded(&self) -> bool {
        self.0.qs_fully_expanded.get()
    }

    fn is_expansion_animating(&self) -> bool {
        self.0.qs_expansion_animating.get()
    }

    fn is_tracking_blocked(&self) -> bool {
        self.0.qs_tracking_blocked.get()
    }

    fn fling_expand(&mut self) {
        let calls = &self.0.qs_fling_expand_calls;
        calls.set(calls.get() + 1);
    }

    fn fling_collapse(&mut self) {
        let calls = &self.0.qs_fling_collapse_calls;
        calls.set(calls.get() + 1);
    }

    fn set_shade_expansion(&mut self, height: f32, fraction: f32) {
        self.0.qs_shade_expansion.set(Some((height, fraction)));
    }
}

impl HeadsUpTouchHelper for FakeHost {
    fn has_pinned_heads_up(&self) -> bool {
        self.0.heads_up_pinned.get()
    }

    fn notify_fling(&mut self, collapse: bool) {
        self.0.heads_up_flings.borrow_mut().push(collapse);
    }
}

impl PulseExpansion for FakeHost {
    fn on_intercept_touch_event(&mut self, _event: &MotionEvent) -> bool {
        self.0.pulse_claims_touches.get()
    }

    fn on_touch_event(&mut self, _event: &MotionEvent) -> bool {
        self.0.pulse_claims_touches.get()
    }
}

impl KeyguardState for FakeHost {
    fn is_showing(&self) -> bool {
        self.0.keyguard_showing.get()
    }

    fn is_fading_away(&self) -> bool {
        self.0.keyguard_fading_away.get()
    }

    fn is_going_away(&self) -> bool {
        self.0.keyguard_going_away.get()
    }

    fn can_dismiss_lock_screen(&self) -> bool {
        !self.0.cannot_dismiss_lock_screen.get()
    }

    fn is_bouncer_showing(&self) -> bool {
        self.0.bouncer_showing.get()
    }

    fn is_bouncer_showing_scrimmed(&self) -> bool {
        self.0.bouncer_scrimmed.get()
    }

    fn is_bouncer_showing_over_dream(&self) -> bool {
        self.0.bouncer_over_dream.get()
    }
}

impl PowerState for FakeHost {
    fn is_power_save_mode(&self) -> bool {
        self.0.power_save.get()
    }
}

impl ShadeContent for FakeHost {
    fn is_scrolled_to_bottom(&self) -> bool {
        !self.0.scrolled_away_from_bottom.get()
    }

    fn is_in_content_bounds(&self, _x: f32, _y: f32) -> bool {
        !self.0.touches_in_empty_area.get()
    }
}

impl FalsingService for FakeHost {
    fn is_classifier_enabled(&self) -> bool {
        self.0.falsing_enabled.get()
    }

    fn is_unlocking_disabled(&self) -> bool {
        self.0.unlocking_disabled.get()
    }

    fn is_false_touch(&self, _interaction: InteractionType) -> bool {
        self.0.falsing_verdict.get()
    }
}

// ---------------------------------------------------------------------------
// Event recording
// ---------------------------------------------------------------------------

/// Collects every [`ShadeEvent`] a controller emits.
#[derive(Debug)]
pub struct EventRecorder {
    events: Rc<RefCell<Vec<ShadeEvent>>>,
    _subscription: Subscription,
}

impl EventRecorder {
    #[must_use]
    pub fn attach(controller: &PanelController) -> Self {
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&events);
        let subscription = controller.subscribe(move |event| sink.borrow_mut().push(*event));
        Self {
            events,
            _subscription: subscription,
        }
    }

    #[must_use]
    pub fn events(&self) -> Vec<ShadeEvent> {
        self.events.borrow().clone()
    }

    /// Number of recorded events matching `predicate`.
    #[must_use]
    pub fn count(&self, predicate: impl Fn(&ShadeEvent) -> bool) -> usize {
        self.events.borrow().iter().filter(|e| predicate(e)).count()
    }

    pub fn clear(&self) {
        self.events.borrow_mut().clear();
    }
}

// ---------------------------------------------------------------------------
// Controllers and gestures
// ---------------------------------------------------------------------------

/// Phone-sized layout: 1200 px of notifications, 1800 px with QS.
#[must_use]
pub fn layout() -> LayoutMetrics {
    LayoutMetrics {
        view_height: 2000.0,
        panel_height_shade: 1200.0,
        panel_height_qs_expanded: 1800.0,
        qs_min_expansion_height: 300.0,
        visible_notification_count: 3,
    }
}

/// Controller with inert collaborators, laid out with [`layout`].
#[must_use]
pub fn new_controller() -> PanelController {
    controller_with(Collaborators::default())
}

/// Controller with the given collaborators, laid out with [`layout`].
#[must_use]
pub fn controller_with(collaborators: Collaborators) -> PanelController {
    let mut controller = PanelController::new(ShadeConfig::default(), collaborators);
    controller.on_layout(layout());
    controller
}

/// Run frames every [`FRAME`] for `duration` past the controller's clock.
pub fn settle(controller: &mut PanelController, duration: Duration) {
    let end = controller.now() + duration;
    let mut t = controller.now();
    while t < end {
        t += FRAME;
        controller.on_frame(t);
    }
}

/// Vertical drag at `x = 100` from `from_y` to `to_y` between `start` and
/// `end`, delivered through the touch path: down, ten moves, up.
pub fn drag(controller: &mut PanelController, from_y: f32, to_y: f32, start: Duration, end: Duration) {
    send_moves(controller, from_y, to_y, start, end);
    controller.on_touch_event(&MotionEvent::up(100.0, to_y, end).with_down_time(start));
}

/// Down and ten moves of [`drag`], leaving the finger on the screen.
pub fn send_moves(
    controller: &mut PanelController,
    from_y: f32,
    to_y: f32,
    start: Duration,
    end: Duration,
) {
    const STEPS: u32 = 10;
    controller.on_touch_event(&MotionEvent::down(100.0, from_y, start));
    let span = end.saturating_sub(start);
    for step in 1..=STEPS {
        let t = start + span * step / STEPS;
        let y = from_y + (to_y - from_y) * step as f32 / STEPS as f32;
        controller.on_touch_event(&MotionEvent::moved(100.0, y, t).with_down_time(start));
    }
}
