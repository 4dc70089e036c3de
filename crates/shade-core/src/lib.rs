#![forbid(unsafe_code)]

//! Core: expansion state, velocity tracking, fling physics and falsing
//! classification for a pull-down notification shade.
//!
//! # Role in the shade
//! `shade-core` holds the pieces that have no opinion about who owns the
//! panel: pure state, estimators and animation math. The `shade-panel` crate
//! wires them into touch arbitration and mode control.
//!
//! # Primary responsibilities
//! - **ExpansionState**: height, fraction, overscroll and gesture flags.
//! - **VelocityEstimator**: pointer velocity from timestamped samples.
//! - **FlingAnimator**: fling, spring-back and unlock-hint animation.
//! - **GestureClassifier**: decides whether a release opens or closes.
//! - **DownEventState**: bounded history of touch downs for dumps.
//! - **ShadeConfig**: density-independent tuning, optionally file-loaded.
//!
//! # Logging
//! All diagnostics go through `tracing` under the `shade::*` targets
//! (`shade::touch`, `shade::fling`, `shade::expansion`). Nothing here
//! installs a subscriber.

pub mod animation;
pub mod classifier;
pub mod config;
pub mod down_events;
pub mod error;
pub mod event;
pub mod expansion;
pub mod fling;
pub mod velocity;

pub use animation::{Animation, FlingProfile, FlingSpec, Interpolator, Tween};
pub use classifier::{
    Decision, DecisionReason, FalsingService, GestureClassifier, InteractionType, NoFalsing,
    ReleaseContext, ReleaseKind,
};
pub use config::ShadeConfig;
pub use down_events::{DownEvent, DownEventState};
pub use error::{ConfigError, Result};
pub use event::{Classification, InputSource, MotionAction, MotionEvent, Pointer, PointerId};
pub use expansion::{ExpansionChange, ExpansionFlags, ExpansionState, HeightUpdate};
pub use fling::{
    AnimationId, AnimatorEvent, AnimatorPhase, FlingAnimator, FlingEnvironment, FlingRequest,
    FlingTuning, HintPhase,
};
pub use velocity::{Velocity, VelocityEstimator};
