#![forbid(unsafe_code)]

//! File and string loading of `ShadeConfig` (requires the `config` feature).

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};

use shade_core::{ConfigError, FlingAnimator, FlingTuning, ShadeConfig};

fn temp_config_path(label: &str, ext: &str) -> PathBuf {
    static COUNTER: AtomicUsize = AtomicUsize::new(0);
    let id = COUNTER.fetch_add(1, Ordering::Relaxed);
    let mut path = std::env::temp_dir();
    path.push(format!(
        "shade_config_{}_{}_{}.{}",
        label,
        std::process::id(),
        id,
        ext
    ));
    path
}

#[test]
fn partial_toml_keeps_defaults_for_missing_fields() {
    let config = ShadeConfig::from_toml_str(
        r#"
        density = 2.0
        touch_slop_dp = 12.0
        "#,
    )
    .expect("valid toml");
    assert_eq!(config.density, 2.0);
    assert_eq!(config.touch_slop_px(), 24.0);
    assert_eq!(config.fling_overshoot_dp, ShadeConfig::default().fling_overshoot_dp);
    assert_eq!(config.overshoot_px(), 48.0);
}

#[test]
fn toml_file_round_trips_through_disk() {
    let path = temp_config_path("toml", "toml");
    std::fs::write(
        &path,
        "density = 3.0\nspring_back_ms = 500\ndismissing_control_point = [0.5, 0.9]\n",
    )
    .expect("write temp config");

    let config = ShadeConfig::from_toml_file(&path).expect("load");
    let _ = std::fs::remove_file(&path);

    assert_eq!(config.density, 3.0);
    assert_eq!(config.spring_back_ms, 500);
    assert_eq!(config.dismissing_control_point, (0.5, 0.9));
    assert!(config.validate().is_empty());
}

#[test]
fn json_file_loads() {
    let path = temp_config_path("json", "json");
    std::fs::write(&path, r#"{ "hint_distance_dp": 80.0, "collapse_delay_ms": 50 }"#)
        .expect("write temp config");

    let config = ShadeConfig::from_json_file(&path).expect("load");
    let _ = std::fs::remove_file(&path);

    assert_eq!(config.hint_distance_dp, 80.0);
    assert_eq!(config.collapse_delay().as_millis(), 50);
}

#[test]
fn missing_file_is_an_io_error() {
    let path = temp_config_path("missing", "toml");
    let err = ShadeConfig::from_toml_file(&path).expect_err("file does not exist");
    assert!(matches!(err, ConfigError::Io(_)), "got {err:?}");
}

#[test]
fn malformed_input_reports_parser_errors() {
    let toml_err = ShadeConfig::from_toml_str("density = [").expect_err("bad toml");
    assert!(matches!(toml_err, ConfigError::Toml(_)));

    let json_err = ShadeConfig::from_json_str("{ density: }").expect_err("bad json");
    assert!(matches!(json_err, ConfigError::Json(_)));
}

#[test]
fn validated_loading_rejects_bad_values() {
    let err = ShadeConfig::from_toml_str_validated(
        r#"
        density = 0.0
        down_event_capacity = 0
        "#,
    )
    .expect_err("invalid values");
    let messages = err.messages();
    assert!(messages.iter().any(|m| m.starts_with("density")));
    assert!(messages.iter().any(|m| m.starts_with("down_event_capacity")));
}

#[test]
fn loaded_config_drives_animator_tuning() {
    let config = ShadeConfig::from_toml_str("density = 2.0\nhint_distance_dp = 50.0").expect("toml");
    let animator = FlingAnimator::new(FlingTuning::from_config(&config));
    assert_eq!(animator.tuning().hint_distance, 100.0);
    assert_eq!(animator.tuning().high_velocity, 6000.0);
}
