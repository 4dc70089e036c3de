#![forbid(unsafe_code)]

//! Panel: touch arbitration, mode control and the controller that owns a
//! pull-down notification shade.
//!
//! # Role in the shade
//! `shade-panel` turns a stream of motion events, frames and layout passes
//! into the shade's expansion. It builds on the state and physics of
//! `shade-core` and talks to the rest of the system only through the
//! capability traits in [`collaborators`].
//!
//! # Primary responsibilities
//! - **PanelController**: single owner of the expansion; expand, collapse,
//!   hint and hand-off commands; frame and layout driving.
//! - **Touch arbitration**: intercept and touch paths, slop, multi-pointer
//!   retargeting, release classification.
//! - **PanelModeController**: bar state, dozing, split shade and layout
//!   dependent thresholds.
//! - **Listeners**: [`ShadeEvent`] fan-out with RAII subscriptions.
//!
//! # Driving the controller
//! The host feeds every input on one thread: motion events through
//! [`PanelController::on_intercept_touch_event`] and
//! [`PanelController::on_touch_event`], frames through
//! [`PanelController::on_frame`], measurements through
//! [`PanelController::on_layout`]. Nothing runs on its own.

pub mod collaborators;
pub mod controller;
pub mod listeners;
pub mod mode;
pub mod session;
pub mod touch;

#[cfg(any(test, feature = "test-helpers"))]
pub mod testing;

pub use collaborators::{
    Collaborators, HeadsUpTouchHelper, Inert, KeyguardState, PowerState, PulseExpansion,
    QuickSettings, ShadeContent,
};
pub use controller::PanelController;
pub use listeners::{Listeners, ShadeEvent, Subscription};
pub use mode::{BarState, LayoutMetrics, ModeEvent, ModeParams, PanelModeController};
pub use session::{DownSnapshot, GestureSession};
pub use touch::{ArbiterState, TouchArbiter, TouchOwner};
