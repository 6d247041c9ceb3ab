#![forbid(unsafe_code)]

//! Loading `ScrollConfig` from TOML and JSON files.

use std::io::Write;
use std::time::Duration;

use folio_core::animation::Ease;
use folio_core::config::ConfigError;
use folio_core::{Anchor, Edge, ScrollConfig};
use pretty_assertions::assert_eq;

fn write_temp(suffix: &str, content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(suffix)
        .tempfile()
        .expect("create temp file");
    file.write_all(content.as_bytes()).expect("write temp file");
    file
}

#[test]
fn empty_toml_is_default() {
    let config = ScrollConfig::from_toml_str("").expect("parse");
    assert_eq!(config, ScrollConfig::default());
}

#[test]
fn toml_overrides_merge_with_defaults() {
    let file = write_temp(
        ".toml",
        r#"
[navigation]
header_offset = 64.0
ease = "power3.out"

[spy]
start = "top 25%"

[snap]
gap = 24.0
ease = "back.out(1.7)"
"#,
    );
    let config = ScrollConfig::from_toml_file(file.path()).expect("load");
    assert_eq!(config.navigation.header_offset, 64.0);
    assert_eq!(config.navigation.ease, Ease::Power3Out);
    assert_eq!(config.navigation.duration_ms, 1200);
    assert_eq!(config.spy.start, Anchor::new(Edge::Top, 0.25));
    assert_eq!(config.spy.end.to_string(), "bottom 20%");
    assert_eq!(config.snap.ease, Ease::BackOut(1.7));

    let snap = config.to_snap_config();
    assert_eq!(snap.gap, 24.0);
    assert_eq!(snap.quiet, Duration::from_millis(150));
    assert!(config.validate().is_empty());
}

#[test]
fn json_file_loads() {
    let file = write_temp(
        ".json",
        r#"{"refresh": {"debounce_ms": 250}, "navigation": {"deep_link_settle_ms": 0}}"#,
    );
    let config = ScrollConfig::from_json_file(file.path()).expect("load");
    assert_eq!(config.to_refresh_timings().debounce, Duration::from_millis(250));
    assert_eq!(config.to_navigator_config().deep_link_settle, Duration::ZERO);
}

#[test]
fn json_round_trip_keeps_anchor_and_ease_strings() {
    let json = serde_json::to_string(&ScrollConfig::default()).expect("serialize");
    assert!(json.contains(r#""start":"top 20%""#), "{json}");
    assert!(json.contains(r#""ease":"power2.inOut""#), "{json}");
    let back = ScrollConfig::from_json_str(&json).expect("parse");
    assert_eq!(back, ScrollConfig::default());
}

#[test]
fn bad_anchor_is_a_toml_error() {
    let err = ScrollConfig::from_toml_str("[spy]\nstart = \"sideways 20%\"\n").unwrap_err();
    assert!(matches!(err, ConfigError::Toml(_)), "{err}");
    assert!(err.to_string().starts_with("TOML parse error"));
}

#[test]
fn bad_json_is_a_json_error() {
    let err = ScrollConfig::from_json_str("{").unwrap_err();
    assert!(matches!(err, ConfigError::Json(_)));
    assert!(std::error::Error::source(&err).is_some());
}

#[test]
fn missing_file_is_io_error() {
    let dir = tempfile::tempdir().expect("temp dir");
    let err = ScrollConfig::from_toml_file(dir.path().join("absent.toml")).unwrap_err();
    assert!(matches!(err, ConfigError::Io(_)));
}

#[test]
fn loaded_config_can_fail_validation() {
    let config = ScrollConfig::from_toml_str("[navigation]\nheader_offset = 200.0\n").expect("parse");
    let err = config.validated().unwrap_err();
    let ConfigError::Validation(errors) = err else {
        panic!("expected validation error");
    };
    assert_eq!(errors.len(), 1);
}
