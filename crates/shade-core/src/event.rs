#![forbid(unsafe_code)]

//! Pointer motion events delivered to the shade.
//!
//! [`MotionEvent`] is a host-neutral rendition of a multi-pointer touch
//! sample: the action that produced it, every pointer currently down, and
//! the monotonic timestamps the engine uses for velocity and falsing
//! decisions.
//!
//! # Design Notes
//!
//! - Coordinates are window-local pixels; `raw_offset` converts them to
//!   screen coordinates (the velocity estimator tracks screen coordinates
//!   because the window itself may move during a gesture).
//! - Timestamps are `Duration`s since an arbitrary monotonic origin chosen
//!   by the host. The engine never reads a clock of its own.
//! - `PointerDown` / `PointerUp` carry the index (not the id) of the pointer
//!   that changed, matching how multi-touch hosts report secondary pointers.

use std::time::Duration;

/// Stable identifier of a pointer for the lifetime of a gesture.
pub type PointerId = i32;

/// What happened to produce a [`MotionEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotionAction {
    /// First pointer went down; starts a gesture.
    Down,
    /// One or more pointers moved.
    Move,
    /// Last pointer went up; ends the gesture.
    Up,
    /// The gesture was taken away from this consumer.
    Cancel,
    /// A secondary pointer went down.
    PointerDown {
        /// Index into [`MotionEvent::pointers`] of the new pointer.
        index: usize,
    },
    /// A secondary pointer went up while others remain down.
    PointerUp {
        /// Index into [`MotionEvent::pointers`] of the lifted pointer.
        index: usize,
    },
}

impl MotionAction {
    /// Whether this action terminates the gesture.
    #[inline]
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Up | Self::Cancel)
    }
}

/// Host classification of the gesture in progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Classification {
    /// No classification available.
    #[default]
    None,
    /// The host suspects another gesture (e.g. a pinch) may be starting.
    /// Touch slop is scaled up while this is reported.
    AmbiguousGesture,
    /// A deep press was detected.
    DeepPress,
}

/// Device class that produced the event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputSource {
    /// Finger on a touch screen.
    #[default]
    Touchscreen,
    /// Mouse or trackpad emulating touch.
    Mouse,
}

/// A single pointer sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pointer {
    pub id: PointerId,
    pub x: f32,
    pub y: f32,
}

impl Pointer {
    /// Create a pointer sample.
    #[must_use]
    pub const fn new(id: PointerId, x: f32, y: f32) -> Self {
        Self { id, x, y }
    }
}

/// A multi-pointer motion sample.
#[derive(Debug, Clone, PartialEq)]
pub struct MotionEvent {
    /// The action that produced this sample.
    pub action: MotionAction,
    /// Every pointer currently down, in host order. Never empty for
    /// well-formed events; accessors tolerate an empty list.
    pub pointers: Vec<Pointer>,
    /// When this sample was taken.
    pub event_time: Duration,
    /// When the first pointer of this gesture went down.
    pub down_time: Duration,
    /// Host classification of the gesture.
    pub classification: Classification,
    /// Device class.
    pub source: InputSource,
    /// Window-to-screen offset `(dx, dy)`.
    pub raw_offset: (f32, f32),
}

impl MotionEvent {
    /// Create an event from an action and its pointers.
    #[must_use]
    pub fn new(action: MotionAction, pointers: Vec<Pointer>, event_time: Duration) -> Self {
        Self {
            action,
            pointers,
            event_time,
            down_time: event_time,
            classification: Classification::None,
            source: InputSource::Touchscreen,
            raw_offset: (0.0, 0.0),
        }
    }

    /// Single-pointer `Down` at `(x, y)` with pointer id 0.
    #[must_use]
    pub fn down(x: f32, y: f32, event_time: Duration) -> Self {
        Self::new(MotionAction::Down, vec![Pointer::new(0, x, y)], event_time)
    }

    /// Single-pointer `Move` to `(x, y)` with pointer id 0.
    #[must_use]
    pub fn moved(x: f32, y: f32, event_time: Duration) -> Self {
        Self::new(MotionAction::Move, vec![Pointer::new(0, x, y)], event_time)
    }

    /// Single-pointer `Up` at `(x, y)` with pointer id 0.
    #[must_use]
    pub fn up(x: f32, y: f32, event_time: Duration) -> Self {
        Self::new(MotionAction::Up, vec![Pointer::new(0, x, y)], event_time)
    }

    /// Single-pointer `Cancel` at `(x, y)` with pointer id 0.
    #[must_use]
    pub fn cancel(x: f32, y: f32, event_time: Duration) -> Self {
        Self::new(MotionAction::Cancel, vec![Pointer::new(0, x, y)], event_time)
    }

    /// Set the gesture down time (builder pattern).
    #[must_use]
    pub fn with_down_time(mut self, down_time: Duration) -> Self {
        self.down_time = down_time;
        self
    }

    /// Set the host classification (builder pattern).
    #[must_use]
    pub fn with_classification(mut self, classification: Classification) -> Self {
        self.classification = classification;
        self
    }

    /// Set the input source (builder pattern).
    #[must_use]
    pub fn with_source(mut self, source: InputSource) -> Self {
        self.source = source;
        self
    }

    /// Set the window-to-screen offset (builder pattern).
    #[must_use]
    pub fn with_raw_offset(mut self, dx: f32, dy: f32) -> Self {
        self.raw_offset = (dx, dy);
        self
    }

    /// Number of pointers in this sample.
    #[inline]
    #[must_use]
    pub fn pointer_count(&self) -> usize {
        self.pointers.len()
    }

    /// Index of the pointer with `id`, if it is part of this sample.
    #[must_use]
    pub fn find_pointer_index(&self, id: PointerId) -> Option<usize> {
        self.pointers.iter().position(|p| p.id == id)
    }

    /// Pointer at `index`, if present.
    #[inline]
    #[must_use]
    pub fn pointer(&self, index: usize) -> Option<&Pointer> {
        self.pointers.get(index)
    }

    /// Id of the pointer at `index`, falling back to 0 for malformed events.
    #[must_use]
    pub fn pointer_id(&self, index: usize) -> PointerId {
        self.pointers.get(index).map_or(0, |p| p.id)
    }

    /// Position of the pointer at `index`, falling back to the origin.
    #[must_use]
    pub fn position(&self, index: usize) -> (f32, f32) {
        self.pointers.get(index).map_or((0.0, 0.0), |p| (p.x, p.y))
    }

    /// Screen-space position of the pointer at `index`.
    #[must_use]
    pub fn raw_position(&self, index: usize) -> (f32, f32) {
        let (x, y) = self.position(index);
        (x + self.raw_offset.0, y + self.raw_offset.1)
    }

    /// Index of the pointer that changed for `PointerDown` / `PointerUp`,
    /// 0 otherwise.
    #[must_use]
    pub fn action_index(&self) -> usize {
        match self.action {
            MotionAction::PointerDown { index } | MotionAction::PointerUp { index } => index,
            _ => 0,
        }
    }
}
