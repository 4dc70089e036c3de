#![forbid(unsafe_code)]

//! Outbound notifications and their subscriber registry.
//!
//! The controller reports everything observers care about as a
//! [`ShadeEvent`] and hands it to [`Listeners::emit`]. Subscribers register a
//! callback and receive a [`Subscription`] guard; dropping the guard
//! unsubscribes.
//!
//! # Invariants
//!
//! 1. Subscribers are notified in registration order.
//! 2. A callback is never invoked after its guard was dropped.
//! 3. Dispatch is single-threaded and callbacks cannot reach the controller,
//!    so no callback runs re-entrantly.
//!
//! # Failure Modes
//!
//! - Dead entries linger until the next [`emit`](Listeners::emit) prunes them.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use shade_core::ExpansionChange;

use crate::mode::BarState;

/// Something observers of the panel should know about.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ShadeEvent {
    /// A finger drag took ownership of the panel height.
    TrackingStarted,
    /// The drag ended; `expand` is the resolved direction.
    TrackingStopped { expand: bool },
    /// Expanding bookkeeping began (drag, fling or hint).
    ExpandingStarted,
    /// Expanding bookkeeping finished; the panel is at rest.
    ExpandingFinished,
    /// The collapsing flag changed.
    CollapsingChanged(bool),
    /// A collapse finished or was superseded.
    ClosingFinished,
    /// Height or fraction changed.
    ExpansionChanged(ExpansionChange),
    /// Overscroll beyond the max changed.
    OverExpansionChanged(f32),
    /// Whether the panel window needs to be visible.
    VisibilityChanged(bool),
    /// A fling toward `target` started.
    FlingStarted { expand: bool, target: f32 },
    UnlockHintStarted,
    UnlockHintFinished,
    /// Down and up without a drag on empty panel space.
    EmptySpaceClick { x: f32, y: f32 },
    /// The panel asks the host to switch bar state.
    RequestBarState(BarState),
}

type CallbackRc = Rc<dyn Fn(&ShadeEvent)>;
type CallbackWeak = Weak<dyn Fn(&ShadeEvent)>;

/// Registry of event callbacks.
#[derive(Default)]
pub struct Listeners {
    subscribers: RefCell<Vec<CallbackWeak>>,
}

impl std::fmt::Debug for Listeners {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Listeners")
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

impl Listeners {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `callback`. It stays registered while the guard lives.
    pub fn subscribe(&self, callback: impl Fn(&ShadeEvent) + 'static) -> Subscription {
        let strong: CallbackRc = Rc::new(callback);
        self.subscribers.borrow_mut().push(Rc::downgrade(&strong));
        Subscription {
            _guard: Box::new(strong),
        }
    }

    /// Registered callbacks, including dead ones not yet pruned.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.borrow().len()
    }

    /// Deliver `event` to every live subscriber and prune dead ones.
    pub fn emit(&self, event: &ShadeEvent) {
        let callbacks: Vec<CallbackRc> = {
            let mut subscribers = self.subscribers.borrow_mut();
            subscribers.retain(|w| w.strong_count() > 0);
            subscribers.iter().filter_map(Weak::upgrade).collect()
        };
        for callback in &callbacks {
            callback(event);
        }
    }
}

/// RAII guard for a subscriber callback.
pub struct Subscription {
    _guard: Box<dyn std::any::Any>,
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").finish_non_exhaustive()
    }
}
