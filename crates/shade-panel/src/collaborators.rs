#![forbid(unsafe_code)]

//! Capability traits for everything the panel consults but does not own.
//!
//! Each trait is narrow and every method has an inert default, so a host
//! implements only what it actually tracks. The controller receives them at
//! construction through [`Collaborators`]; nothing is looked up globally.

use shade_core::{FalsingService, MotionEvent, NoFalsing};

/// The quick-settings region stacked above the notification list.
pub trait QuickSettings {
    /// Panel touches are disallowed entirely (QS customizer, detail view).
    fn disallow_touches(&self) -> bool {
        false
    }

    /// QS is fully expanded and does not let the panel take touches.
    fn is_fully_expanded_and_touches_disallowed(&self) -> bool {
        false
    }

    /// Position hit test: a down at `(x, y)` belongs to QS.
    fn should_intercept(&self, _x: f32, _y: f32) -> bool {
        false
    }

    /// Whether a collapse may start from a down at `(x, y)` on quick-quick settings.
    fn can_panel_collapse_on_qqs(&self, _x: f32, _y: f32) -> bool {
        false
    }

    /// Offer an event for interception; `true` claims the gesture.
    fn on_intercept(&mut self, _event: &MotionEvent) -> bool {
        false
    }

    /// Offer an event for handling; `true` consumes it.
    fn handle_touch(
        &mut self,
        _event: &MotionEvent,
        _panel_fully_collapsed: bool,
        _height_animating: bool,
    ) -> bool {
        false
    }

    fn is_expanded(&self) -> bool {
        false
    }

    fn is_fully_expanded(&self) -> bool {
        false
    }

    /// QS is running its own expansion animation.
    fn is_expansion_animating(&self) -> bool {
        false
    }

    /// QS tracking freezes panel height updates.
    fn is_tracking_blocked(&self) -> bool {
        false
    }

    fn is_expansion_enabled(&self) -> bool {
        true
    }

    /// Expand QS together with the panel on the next expansion.
    fn set_expand_immediate(&mut self, _immediate: bool) {}

    /// Fling QS open from an already open panel.
    fn fling_expand(&mut self) {}

    /// Fling QS closed, leaving the panel open on notifications.
    fn fling_collapse(&mut self) {}

    fn on_expanding_started(&mut self, _qs_fully_expanded: bool) {}

    /// Panel height fan-out.
    fn set_shade_expansion(&mut self, _height: f32, _fraction: f32) {}
}

/// A heads-up notification that can be dragged to open the shade.
pub trait HeadsUpTouchHelper {
    fn has_pinned_heads_up(&self) -> bool {
        false
    }

    fn is_tracking_heads_up(&self) -> bool {
        false
    }

    fn on_intercept_touch_event(&mut self, _event: &MotionEvent) -> bool {
        false
    }

    fn on_touch_event(&mut self, _event: &MotionEvent) -> bool {
        false
    }

    /// A fling started; `collapse` when it closes the panel.
    fn notify_fling(&mut self, _collapse: bool) {}
}

/// Drag-down handling while the device shows the ambient (pulsing) display.
pub trait PulseExpansion {
    fn is_expanding(&self) -> bool {
        false
    }

    fn on_intercept_touch_event(&mut self, _event: &MotionEvent) -> bool {
        false
    }

    fn on_touch_event(&mut self, _event: &MotionEvent) -> bool {
        false
    }
}

/// Lock screen and bouncer state.
pub trait KeyguardState {
    fn is_showing(&self) -> bool {
        false
    }

    fn is_fading_away(&self) -> bool {
        false
    }

    fn is_going_away(&self) -> bool {
        false
    }

    fn can_dismiss_lock_screen(&self) -> bool {
        true
    }

    fn is_bouncer_showing(&self) -> bool {
        false
    }

    fn is_bouncer_showing_scrimmed(&self) -> bool {
        false
    }

    fn is_bouncer_showing_over_dream(&self) -> bool {
        false
    }

    /// The last wake-up was caused by a touch.
    fn is_wake_up_from_touch(&self) -> bool {
        false
    }
}

/// Device power state.
pub trait PowerState {
    fn is_power_save_mode(&self) -> bool {
        false
    }
}

/// The notification list inside the panel.
pub trait ShadeContent {
    /// Scrolled to the bottom, so an upward drag cannot mean "scroll".
    fn is_scrolled_to_bottom(&self) -> bool {
        true
    }

    /// `(x, y)` hits content rather than empty panel space.
    fn is_in_content_bounds(&self, _x: f32, _y: f32) -> bool {
        true
    }

    fn is_long_press_in_progress(&self) -> bool {
        false
    }

    /// Commands from the host allow opening the panel.
    fn panels_enabled(&self) -> bool {
        true
    }
}

/// Inert implementation of every collaborator trait.
#[derive(Debug, Clone, Copy, Default)]
pub struct Inert;

impl QuickSettings for Inert {}
impl HeadsUpTouchHelper for Inert {}
impl PulseExpansion for Inert {}
impl KeyguardState for Inert {}
impl PowerState for Inert {}
impl ShadeContent for Inert {}

/// The full set of collaborators handed to the controller.
pub struct Collaborators {
    pub quick_settings: Box<dyn QuickSettings>,
    pub heads_up: Box<dyn HeadsUpTouchHelper>,
    pub pulse: Box<dyn PulseExpansion>,
    pub keyguard: Box<dyn KeyguardState>,
    pub power: Box<dyn PowerState>,
    pub content: Box<dyn ShadeContent>,
    pub falsing: Box<dyn FalsingService>,
}

impl Default for Collaborators {
    fn default() -> Self {
        Self {
            quick_settings: Box::new(Inert),
            heads_up: Box::new(Inert),
            pulse: Box::new(Inert),
            keyguard: Box::new(Inert),
            power: Box::new(Inert),
            content: Box::new(Inert),
            falsing: Box::new(NoFalsing),
        }
    }
}

impl std::fmt::Debug for Collaborators {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collaborators").finish_non_exhaustive()
    }
}

impl Collaborators {
    #[must_use]
    pub fn with_quick_settings(mut self, qs: impl QuickSettings + 'static) -> Self {
        self.quick_settings = Box::new(qs);
        self
    }

    #[must_use]
    pub fn with_heads_up(mut self, heads_up: impl HeadsUpTouchHelper + 'static) -> Self {
        self.heads_up = Box::new(heads_up);
        self
    }

    #[must_use]
    pub fn with_pulse(mut self, pulse: impl PulseExpansion + 'static) -> Self {
        self.pulse = Box::new(pulse);
        self
    }

    #[must_use]
    pub fn with_keyguard(mut self, keyguard: impl KeyguardState + 'static) -> Self {
        self.keyguard = Box::new(keyguard);
        self
    }

    #[must_use]
    pub fn with_power(mut self, power: impl PowerState + 'static) -> Self {
        self.power = Box::new(power);
        self
    }

    #[must_use]
    pub fn with_content(mut self, content: impl ShadeContent + 'static) -> Self {
        self.content = Box::new(content);
        self
    }

    #[must_use]
    pub fn with_falsing(mut self, falsing: impl FalsingService + 'static) -> Self {
        self.falsing = Box::new(falsing);
        self
    }
}
