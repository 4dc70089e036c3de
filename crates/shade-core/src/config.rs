#![forbid(unsafe_code)]

//! Tunable constants for the shade engine.
//!
//! [`ShadeConfig`] gathers every threshold, duration and distance the engine
//! uses. Distances are stored in density-independent pixels (dp) and turned
//! into pixels through [`ShadeConfig::px`], so one file serves every screen.
//!
//! # Loading
//!
//! ```toml
//! # shade.toml
//! density = 2.75
//! touch_slop_dp = 8.0
//! fling_overshoot_dp = 24.0
//! ```
//!
//! ```rust,ignore
//! let config = ShadeConfig::from_toml_file("shade.toml")?;
//! let config = ShadeConfig::from_json_str(json)?;
//! ```
//!
//! # Defaults
//!
//! `ShadeConfig::default()` reproduces the platform panel's stock tuning.

#[cfg(feature = "config")]
use std::path::Path;
use std::time::Duration;

#[cfg(feature = "config")]
use serde::{Deserialize, Serialize};

use crate::animation::FlingProfile;
#[cfg(feature = "config")]
use crate::error::ConfigError;

/// Every tunable of the shade engine.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config", serde(default))]
pub struct ShadeConfig {
    /// Pixels per dp. Default: 1.0.
    pub density: f32,

    /// Movement before a drag is recognised. Default: 8dp.
    pub touch_slop_dp: f32,

    /// Slop multiplier while the host reports an ambiguous gesture. Default: 2.0.
    pub ambiguous_slop_multiplier: f32,

    /// Upward travel that counts as an intentional unlock swipe. Default: 50dp.
    pub falsing_threshold_dp: f32,

    /// Falsing threshold factor after a wake-up caused by touch. Default: 1.5.
    pub falsing_threshold_wakeup_factor: f32,

    /// Releases slower than this fall back to position. Default: 250dp/s.
    pub min_fling_velocity_dp: f32,

    /// Release speed treated as a hard fling. Default: 3000dp/s.
    pub high_fling_velocity_dp: f32,

    /// Fraction of the high velocity that earns the maximum overshoot. Default: 0.5.
    pub max_overshoot_velocity_factor: f32,

    /// Longest opening fling. Default: 600ms.
    pub fling_max_length_ms: u64,

    /// Opening fling speed-up factor. Default: 0.6.
    pub fling_speed_up_factor: f32,

    /// Longest closing fling. Default: 600ms.
    pub closing_max_length_ms: u64,

    /// Closing fling speed-up factor. Default: 0.6.
    pub closing_speed_up_factor: f32,

    /// Longest lock-screen dismissing fling. Default: 500ms.
    pub dismissing_max_length_ms: u64,

    /// Dismissing fling speed-up factor. Default: 0.6.
    pub dismissing_speed_up_factor: f32,

    /// Dismissing curve control point `(x2, y2)`. Default: (0.6, 0.84).
    pub dismissing_control_point: (f32, f32),

    /// Overshoot unit beyond full expansion. Default: 24dp.
    pub fling_overshoot_dp: f32,

    /// Duration of a zero-velocity opening fling. Default: 350ms.
    pub spring_out_ms: u64,

    /// Duration of the overshoot decay. Default: 400ms.
    pub spring_back_ms: u64,

    /// How far the unlock hint pulls the panel up. Default: 100dp.
    pub hint_distance_dp: f32,

    /// First (pull) phase of the unlock hint. Default: 250ms.
    pub hint_move_ms: u64,

    /// Second (bounce) phase of the unlock hint. Default: 450ms.
    pub hint_bounce_ms: u64,

    /// Window after a hand-off down in which a small expansion still opens. Default: 300ms.
    pub max_time_to_open_from_launcher_ms: u64,

    /// Delay of `collapse(delayed = true)`. Default: 120ms.
    pub collapse_delay_ms: u64,

    /// Capacity of the down-event history. Default: 50.
    pub down_event_capacity: usize,

    /// Split-shade travel distance. Default: 242dp.
    pub split_shade_transition_dp: f32,

    /// Factor applied to the heads-up start height for split-shade travel. Default: 2.5.
    pub heads_up_travel_factor: f32,

    /// Minimum height the status bar keeps while collapsed. Default: 0dp.
    pub status_bar_min_height_dp: f32,
}

impl Default for ShadeConfig {
    fn default() -> Self {
        Self {
            density: 1.0,
            touch_slop_dp: 8.0,
            ambiguous_slop_multiplier: 2.0,
            falsing_threshold_dp: 50.0,
            falsing_threshold_wakeup_factor: 1.5,
            min_fling_velocity_dp: FlingProfile::MIN_VELOCITY_DP,
            high_fling_velocity_dp: FlingProfile::HIGH_VELOCITY_DP,
            max_overshoot_velocity_factor: 0.5,
            fling_max_length_ms: 600,
            fling_speed_up_factor: 0.6,
            closing_max_length_ms: 600,
            closing_speed_up_factor: 0.6,
            dismissing_max_length_ms: 500,
            dismissing_speed_up_factor: 0.6,
            dismissing_control_point: (0.6, 0.84),
            fling_overshoot_dp: 24.0,
            spring_out_ms: 350,
            spring_back_ms: 400,
            hint_distance_dp: 100.0,
            hint_move_ms: 250,
            hint_bounce_ms: 450,
            max_time_to_open_from_launcher_ms: 300,
            collapse_delay_ms: 120,
            down_event_capacity: 50,
            split_shade_transition_dp: 242.0,
            heads_up_travel_factor: 2.5,
            status_bar_min_height_dp: 0.0,
        }
    }
}

impl ShadeConfig {
    /// Load from a TOML string.
    #[cfg(feature = "config")]
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    /// Load from a TOML file on disk.
    #[cfg(feature = "config")]
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&content)
    }

    /// Load from a JSON string.
    #[cfg(feature = "config")]
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(s)?)
    }

    /// Load from a JSON file on disk.
    #[cfg(feature = "config")]
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&content)
    }

    /// Load and reject configurations that fail [`validate`](Self::validate).
    #[cfg(feature = "config")]
    pub fn from_toml_str_validated(s: &str) -> Result<Self, ConfigError> {
        Self::from_toml_str(s)?.validated()
    }

    /// Return `self` if valid, otherwise every violation.
    pub fn validated(self) -> crate::error::Result<Self> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(self)
        } else {
            Err(crate::error::ConfigError::Validation(errors))
        }
    }

    /// Validate all parameters are within acceptable ranges.
    ///
    /// Returns a list of validation errors. An empty list means the config
    /// is valid.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        let positive = [
            ("density", self.density),
            ("touch_slop_dp", self.touch_slop_dp),
            ("falsing_threshold_dp", self.falsing_threshold_dp),
            ("min_fling_velocity_dp", self.min_fling_velocity_dp),
            ("fling_overshoot_dp", self.fling_overshoot_dp),
            ("split_shade_transition_dp", self.split_shade_transition_dp),
        ];
        for (name, value) in positive {
            if value.is_nan() || value <= 0.0 {
                errors.push(format!("{name} must be > 0, got {value}"));
            }
        }

        if self.ambiguous_slop_multiplier < 1.0 {
            errors.push(format!(
                "ambiguous_slop_multiplier must be >= 1, got {}",
                self.ambiguous_slop_multiplier
            ));
        }
        if self.falsing_threshold_wakeup_factor < 1.0 {
            errors.push(format!(
                "falsing_threshold_wakeup_factor must be >= 1, got {}",
                self.falsing_threshold_wakeup_factor
            ));
        }
        if self.high_fling_velocity_dp <= self.min_fling_velocity_dp {
            errors.push(format!(
                "high_fling_velocity_dp ({}) must exceed min_fling_velocity_dp ({})",
                self.high_fling_velocity_dp, self.min_fling_velocity_dp
            ));
        }
        if self.max_overshoot_velocity_factor <= 0.0 {
            errors.push(format!(
                "max_overshoot_velocity_factor must be > 0, got {}",
                self.max_overshoot_velocity_factor
            ));
        }

        for (name, factor) in [
            ("fling_speed_up_factor", self.fling_speed_up_factor),
            ("closing_speed_up_factor", self.closing_speed_up_factor),
            ("dismissing_speed_up_factor", self.dismissing_speed_up_factor),
        ] {
            if !(0.0..=1.0).contains(&factor) {
                errors.push(format!("{name} must be in [0, 1], got {factor}"));
            }
        }

        let (x2, y2) = self.dismissing_control_point;
        if x2.is_nan() || x2 <= 0.0 || x2 > 1.0 || !(0.0..=1.0).contains(&y2) {
            errors.push(format!(
                "dismissing_control_point must lie in (0, 1] x [0, 1], got ({x2}, {y2})"
            ));
        }

        for (name, ms) in [
            ("fling_max_length_ms", self.fling_max_length_ms),
            ("closing_max_length_ms", self.closing_max_length_ms),
            ("dismissing_max_length_ms", self.dismissing_max_length_ms),
            ("spring_back_ms", self.spring_back_ms),
        ] {
            if ms == 0 {
                errors.push(format!("{name} must be > 0"));
            }
        }

        if self.down_event_capacity == 0 {
            errors.push("down_event_capacity must be > 0".into());
        }
        if self.hint_distance_dp < 0.0 {
            errors.push(format!(
                "hint_distance_dp must be >= 0, got {}",
                self.hint_distance_dp
            ));
        }
        if self.heads_up_travel_factor < 1.0 {
            errors.push(format!(
                "heads_up_travel_factor must be >= 1, got {}",
                self.heads_up_travel_factor
            ));
        }

        errors
    }

    /// Convert dp to pixels.
    #[inline]
    #[must_use]
    pub fn px(&self, dp: f32) -> f32 {
        dp * self.density
    }

    /// Touch slop in pixels.
    #[must_use]
    pub fn touch_slop_px(&self) -> f32 {
        self.px(self.touch_slop_dp)
    }

    /// Overshoot unit in pixels.
    #[must_use]
    pub fn overshoot_px(&self) -> f32 {
        self.px(self.fling_overshoot_dp)
    }

    /// Hard-fling threshold in px/s.
    #[must_use]
    pub fn high_velocity_px(&self) -> f32 {
        self.px(self.high_fling_velocity_dp)
    }

    /// Slow-release threshold in px/s.
    #[must_use]
    pub fn min_velocity_px(&self) -> f32 {
        self.px(self.min_fling_velocity_dp)
    }

    /// Fling tuning for opening the panel.
    #[must_use]
    pub fn opening_profile(&self) -> FlingProfile {
        self.profile(self.fling_max_length_ms, self.fling_speed_up_factor)
    }

    /// Fling tuning for closing the panel.
    #[must_use]
    pub fn closing_profile(&self) -> FlingProfile {
        self.profile(self.closing_max_length_ms, self.closing_speed_up_factor)
    }

    /// Fling tuning for closes that dismiss the lock screen.
    #[must_use]
    pub fn dismissing_profile(&self) -> FlingProfile {
        let (x2, y2) = self.dismissing_control_point;
        self.profile(self.dismissing_max_length_ms, self.dismissing_speed_up_factor)
            .with_control_point(x2, y2)
    }

    fn profile(&self, max_length_ms: u64, speed_up: f32) -> FlingProfile {
        let mut p = FlingProfile::new(Duration::from_millis(max_length_ms), speed_up, self.density);
        p.min_velocity = self.min_velocity_px();
        p.high_velocity = self.high_velocity_px();
        p
    }

    /// Zero-velocity opening duration.
    #[must_use]
    pub fn spring_out(&self) -> Duration {
        Duration::from_millis(self.spring_out_ms)
    }

    /// Overshoot decay duration.
    #[must_use]
    pub fn spring_back(&self) -> Duration {
        Duration::from_millis(self.spring_back_ms)
    }

    /// Delayed collapse delay.
    #[must_use]
    pub fn collapse_delay(&self) -> Duration {
        Duration::from_millis(self.collapse_delay_ms)
    }

    /// Small-expansion allowance window.
    #[must_use]
    pub fn max_time_to_open_from_launcher(&self) -> Duration {
        Duration::from_millis(self.max_time_to_open_from_launcher_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(ShadeConfig::default().validate().is_empty());
    }

    #[test]
    fn validate_catches_zero_density() {
        let cfg = ShadeConfig {
            density: 0.0,
            ..Default::default()
        };
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.contains("density")), "{errors:?}");
    }

    #[test]
    fn validate_catches_inverted_velocities() {
        let cfg = ShadeConfig {
            high_fling_velocity_dp: 100.0,
            ..Default::default()
        };
        assert!(cfg.validate().iter().any(|e| e.contains("high_fling_velocity_dp")));
    }

    #[test]
    fn validate_catches_bad_speed_up() {
        let cfg = ShadeConfig {
            closing_speed_up_factor: 1.5,
            ..Default::default()
        };
        assert_eq!(cfg.validate().len(), 1);
    }

    #[test]
    fn validate_catches_nan() {
        let cfg = ShadeConfig {
            touch_slop_dp: f32::NAN,
            ..Default::default()
        };
        assert!(!cfg.validate().is_empty());
    }

    #[test]
    fn validated_returns_all_errors() {
        let cfg = ShadeConfig {
            down_event_capacity: 0,
            spring_back_ms: 0,
            ..Default::default()
        };
        let err = cfg.validated().unwrap_err();
        assert_eq!(err.messages().len(), 2);
    }

    #[test]
    fn density_scales_pixels() {
        let cfg = ShadeConfig {
            density: 3.0,
            ..Default::default()
        };
        assert_eq!(cfg.touch_slop_px(), 24.0);
        assert_eq!(cfg.overshoot_px(), 72.0);
        assert_eq!(cfg.opening_profile().high_velocity, 9000.0);
    }

    #[test]
    fn dismissing_profile_uses_control_point() {
        let p = ShadeConfig::default().dismissing_profile();
        assert_eq!((p.x2, p.y2), (0.6, 0.84));
        assert_eq!(p.max_length, Duration::from_millis(500));
    }
}
