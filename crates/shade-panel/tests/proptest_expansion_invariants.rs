#![forbid(unsafe_code)]

//! Property-based invariant tests for the panel controller.
//!
//! Arbitrary interleavings of touches, frames, commands and layout passes
//! must keep the expansion inside its bounds:
//!
//! 1. `0 <= fraction <= 1`
//! 2. `0 <= height <= max_travel`
//! 3. `0 <= over_expansion <= 2 * overshoot`
//! 4. No value ever becomes NaN
//! 5. Once input stops, frames bring the panel to rest

use std::time::Duration;

use proptest::prelude::*;
use shade_core::MotionEvent;
use shade_panel::testing::{layout, new_controller, settle};
use shade_panel::{LayoutMetrics, PanelController};

// ── Strategies ──────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
enum Op {
    Down(f32),
    Move(f32),
    Up(f32),
    Cancel(f32),
    Frame,
    Collapse { delayed: bool },
    Expand { animate: bool },
    Fraction(f32),
    Layout(f32),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        1 => (0.0f32..2000.0).prop_map(Op::Down),
        4 => (-200.0f32..2400.0).prop_map(Op::Move),
        1 => (0.0f32..2000.0).prop_map(Op::Up),
        1 => (0.0f32..2000.0).prop_map(Op::Cancel),
        3 => Just(Op::Frame),
        1 => any::<bool>().prop_map(|delayed| Op::Collapse { delayed }),
        1 => any::<bool>().prop_map(|animate| Op::Expand { animate }),
        1 => (-0.5f32..1.5).prop_map(Op::Fraction),
        1 => (0.0f32..1900.0).prop_map(Op::Layout),
    ]
}

fn apply(c: &mut PanelController, op: &Op, t: Duration, down: &mut Duration) {
    match *op {
        Op::Down(y) => {
            *down = t;
            c.on_intercept_touch_event(&MotionEvent::down(100.0, y, t));
            c.on_touch_event(&MotionEvent::down(100.0, y, t));
        }
        Op::Move(y) => {
            let event = MotionEvent::moved(100.0, y, t).with_down_time(*down);
            c.on_intercept_touch_event(&event);
            c.on_touch_event(&event);
        }
        Op::Up(y) => {
            c.on_touch_event(&MotionEvent::up(100.0, y, t).with_down_time(*down));
        }
        Op::Cancel(y) => {
            c.on_touch_event(&MotionEvent::cancel(100.0, y, t).with_down_time(*down));
        }
        Op::Frame => c.on_frame(t),
        Op::Collapse { delayed } => c.collapse(delayed, 1.0),
        Op::Expand { animate } => c.expand(animate),
        Op::Fraction(f) => c.set_expanded_fraction(f),
        Op::Layout(shade) => c.on_layout(LayoutMetrics {
            panel_height_shade: shade,
            ..layout()
        }),
    }
}

fn assert_bounds(c: &PanelController) -> Result<(), TestCaseError> {
    let e = c.expansion();
    let bound = 2.0 * e.overshoot_px();
    prop_assert!(!e.fraction().is_nan() && !e.height().is_nan() && !e.over_expansion().is_nan());
    prop_assert!((0.0..=1.0).contains(&e.fraction()), "fraction {}", e.fraction());
    prop_assert!(
        e.height() >= 0.0 && e.height() <= e.max_travel_distance() + 1e-3,
        "height {} max {}",
        e.height(),
        e.max_travel_distance()
    );
    prop_assert!(
        e.over_expansion() >= 0.0 && e.over_expansion() <= bound + 1e-3,
        "over {} bound {}",
        e.over_expansion(),
        bound
    );
    Ok(())
}

// ═══════════════════════════════════════════════════════════════════════
// 1-4. Bounds hold after every step
// ═══════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn expansion_stays_in_bounds(
        ops in prop::collection::vec((op_strategy(), 1u64..40), 1..120),
    ) {
        let mut c = new_controller();
        let mut t = Duration::ZERO;
        let mut down = Duration::ZERO;
        for (op, dt) in &ops {
            t += Duration::from_millis(*dt);
            apply(&mut c, op, t, &mut down);
            assert_bounds(&c)?;
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════
// 5. Everything comes to rest
// ═══════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn panel_comes_to_rest_after_release(
        ops in prop::collection::vec((op_strategy(), 1u64..40), 1..60),
    ) {
        let mut c = new_controller();
        let mut t = Duration::ZERO;
        let mut down = Duration::ZERO;
        for (op, dt) in &ops {
            t += Duration::from_millis(*dt);
            apply(&mut c, op, t, &mut down);
        }
        t += Duration::from_millis(5);
        c.on_touch_event(&MotionEvent::up(100.0, 0.0, t).with_down_time(down));
        c.on_layout(layout());
        settle(&mut c, Duration::from_secs(3));

        prop_assert!(!c.is_flinging());
        prop_assert!(!c.is_unlock_hint_running());
        prop_assert!(!c.is_tracking());
        prop_assert_eq!(c.over_expansion(), 0.0);
        assert_bounds(&c)?;
    }
}
