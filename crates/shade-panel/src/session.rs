#![forbid(unsafe_code)]

//! Per-gesture bookkeeping.
//!
//! A [`GestureSession`] is reset on every down and records what the touch
//! path needs to remember between events: the anchor point, the height at
//! the anchor, the tracked pointer and the falsing progress. Keeping it in
//! one record means a reset cannot forget a field.

use std::time::Duration;

use shade_core::{GestureClassifier, MotionEvent, PointerId};

/// Snapshot of the panel taken when a down arrives.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DownSnapshot {
    pub x: f32,
    pub y: f32,
    pub time: Duration,
    pub dozing: bool,
    pub collapsed: bool,
    /// A collapse may start on quick-quick settings at this point.
    pub collapse_on_qqs: bool,
    /// Collapsed with a pinned heads-up: the heads-up helper gets first look.
    pub listen_for_heads_up: bool,
    /// Hand-off gesture: a tiny expansion may still open.
    pub allow_expand_for_small_expansion: bool,
    /// Hand-off gesture: the slop counts as already exceeded.
    pub touch_slop_exceeded_before_down: bool,
}

/// State of one drag from down to up or cancel.
#[derive(Debug, Clone, Default)]
pub struct GestureSession {
    pub down: DownSnapshot,
    /// Anchor the travel `h` is measured from.
    pub initial_x: f32,
    pub initial_y: f32,
    /// Panel height when the anchor was set.
    pub initial_offset: f32,
    /// Pointer whose position drives the panel.
    pub tracking_pointer: Option<PointerId>,
    pub touch_slop_exceeded: bool,
    pub touch_above_falsing_threshold: bool,
    pub upwards_when_threshold_reached: bool,
    /// The down was synthesized by a focus hand-off.
    pub synthesized_down: bool,
    pub panel_closed_on_down: bool,
    pub collapsed_and_heads_up_on_down: bool,
    /// A non-spring-back animation was running at the down.
    pub animating_on_down: bool,
    pub touch_started_in_empty_area: bool,
    /// The gesture was aborted; events are ignored until the next down.
    pub motion_aborted: bool,
    /// Lower bound for the dragged height. Reset on every down; hosts raise
    /// it through [`PanelController::set_min_expand_height`](crate::PanelController::set_min_expand_height).
    pub min_expand_height: f32,
    /// The panel moves only once the slop is exceeded.
    pub gesture_wait_for_touch_slop: bool,
    pub has_layouted_since_down: bool,
    /// Keyguard was showing when the anchor was set.
    pub initial_touch_from_keyguard: bool,
    /// Height updates are frozen until the gesture ends.
    pub blocking_expansion: bool,
}

impl GestureSession {
    /// Reset for a new down.
    ///
    /// The anchor and its offset survive: a drag that is already tracking
    /// (a hand-off) keeps measuring from where it started.
    pub fn begin(&mut self, down: DownSnapshot) {
        *self = Self {
            down,
            initial_x: self.initial_x,
            initial_y: self.initial_y,
            initial_offset: self.initial_offset,
            ..Self::default()
        };
    }

    /// Move the anchor to `(x, y)`.
    pub fn anchor(&mut self, x: f32, y: f32) {
        self.initial_x = x;
        self.initial_y = y;
    }

    /// Vertical travel since the anchor; positive pulls the panel open.
    #[inline]
    #[must_use]
    pub fn travel(&self, y: f32) -> f32 {
        y - self.initial_y
    }

    /// Horizontal travel since the anchor.
    #[inline]
    #[must_use]
    pub fn travel_x(&self, x: f32) -> f32 {
        x - self.initial_x
    }

    /// Position of the tracked pointer in `event`.
    ///
    /// When the tracked pointer is absent the first pointer is adopted.
    pub fn tracked_position(&mut self, event: &MotionEvent) -> (f32, f32) {
        let index = self
            .tracking_pointer
            .and_then(|id| event.find_pointer_index(id))
            .unwrap_or_else(|| {
                let id = event.pointer_id(0);
                self.tracking_pointer = Some(id);
                0
            });
        event.position(index)
    }

    /// Handle a pointer lifting while others remain.
    ///
    /// Returns the new tracked position when the lifted pointer was the
    /// tracked one; the caller re-anchors there so the panel does not jump.
    pub fn retarget_on_pointer_up(&mut self, event: &MotionEvent) -> Option<(f32, f32)> {
        let up_pointer = event.pointer_id(event.action_index());
        if self.tracking_pointer != Some(up_pointer) {
            return None;
        }
        let new_index = if event.pointer_id(0) != up_pointer { 0 } else { 1 };
        let pointer = event.pointer(new_index)?;
        self.tracking_pointer = Some(pointer.id);
        tracing::debug!(
            target: "shade::touch",
            from = up_pointer,
            to = pointer.id,
            "tracking pointer reassigned"
        );
        Some((pointer.x, pointer.y))
    }

    /// Record falsing progress for travel `h` at `(x, y)`.
    ///
    /// Travel in either direction counts, unlike a plain upward-only
    /// threshold: a downward drag that opens the panel is not false either.
    /// The direction at that moment is kept for the upward-unlock check.
    pub fn note_travel(&mut self, h: f32, threshold: f32, x: f32, y: f32) {
        if h.abs() >= threshold {
            self.touch_above_falsing_threshold = true;
            self.upwards_when_threshold_reached =
                GestureClassifier::is_direction_upwards((self.initial_x, self.initial_y), (x, y));
        }
    }

    /// Height a drag to travel `h` asks for.
    #[must_use]
    pub fn dragged_height(&self, h: f32) -> f32 {
        (h + self.initial_offset).max(0.0).max(self.min_expand_height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shade_core::{MotionAction, Pointer};

    #[test]
    fn begin_clears_previous_gesture() {
        let mut s = GestureSession::default();
        s.motion_aborted = true;
        s.touch_slop_exceeded = true;
        s.tracking_pointer = Some(3);
        s.begin(DownSnapshot {
            y: 10.0,
            ..DownSnapshot::default()
        });
        assert!(!s.motion_aborted);
        assert!(!s.touch_slop_exceeded);
        assert_eq!(s.tracking_pointer, None);
        assert_eq!(s.down.y, 10.0);
    }

    #[test]
    fn tracked_position_adopts_first_pointer() {
        let mut s = GestureSession::default();
        let event = MotionEvent::new(
            MotionAction::Move,
            vec![Pointer::new(7, 1.0, 2.0), Pointer::new(9, 3.0, 4.0)],
            Duration::ZERO,
        );
        assert_eq!(s.tracked_position(&event), (1.0, 2.0));
        assert_eq!(s.tracking_pointer, Some(7));

        s.tracking_pointer = Some(9);
        assert_eq!(s.tracked_position(&event), (3.0, 4.0));
    }

    #[test]
    fn lifting_tracked_pointer_moves_to_the_other() {
        let mut s = GestureSession {
            tracking_pointer: Some(0),
            ..GestureSession::default()
        };
        let event = MotionEvent::new(
            MotionAction::PointerUp { index: 0 },
            vec![Pointer::new(0, 10.0, 100.0), Pointer::new(1, 50.0, 400.0)],
            Duration::ZERO,
        );
        assert_eq!(s.retarget_on_pointer_up(&event), Some((50.0, 400.0)));
        assert_eq!(s.tracking_pointer, Some(1));

        // Lifting an untracked pointer changes nothing.
        let other = MotionEvent::new(
            MotionAction::PointerUp { index: 0 },
            vec![Pointer::new(0, 10.0, 100.0), Pointer::new(1, 50.0, 400.0)],
            Duration::ZERO,
        );
        assert_eq!(s.retarget_on_pointer_up(&other), None);
    }

    #[test]
    fn falsing_progress_counts_both_directions() {
        let mut s = GestureSession::default();
        s.anchor(0.0, 500.0);
        s.note_travel(-30.0, 50.0, 0.0, 470.0);
        assert!(!s.touch_above_falsing_threshold);
        s.note_travel(-60.0, 50.0, 0.0, 440.0);
        assert!(s.touch_above_falsing_threshold);
        assert!(s.upwards_when_threshold_reached);

        let mut down = GestureSession::default();
        down.anchor(0.0, 100.0);
        down.note_travel(80.0, 50.0, 0.0, 180.0);
        assert!(down.touch_above_falsing_threshold);
        assert!(!down.upwards_when_threshold_reached);
    }

    #[test]
    fn dragged_height_respects_floor() {
        let s = GestureSession {
            initial_offset: 100.0,
            min_expand_height: 40.0,
            ..GestureSession::default()
        };
        assert_eq!(s.dragged_height(50.0), 150.0);
        assert_eq!(s.dragged_height(-90.0), 40.0);
        assert_eq!(s.dragged_height(-500.0), 40.0);
    }
}
