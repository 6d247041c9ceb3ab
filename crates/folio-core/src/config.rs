#![forbid(unsafe_code)]

//! Scroll tuning as data.
//!
//! [`ScrollConfig`] gathers every delay, offset and threshold the
//! coordination layer uses. With the `config` feature it loads from TOML or
//! JSON:
//!
//! ```toml
//! [navigation]
//! header_offset = 64.0
//! ease = "power2.inOut"
//!
//! [spy]
//! start = "top 25%"
//!
//! [snap]
//! gap = 24.0
//! ```
//!
//! ```rust,ignore
//! let config = ScrollConfig::from_toml_file("folio-scroll.toml")?;
//! ```
//!
//! # Defaults
//!
//! `ScrollConfig::default()` reproduces the site's constants: 72 px header,
//! 1.2 s `power2.inOut` navigation, `top 20%` / `bottom 20%` spy band,
//! 100 ms refresh debounce, 150 ms snap quiet period.

#[cfg(feature = "config")]
use std::path::Path;
use std::time::Duration;

#[cfg(feature = "config")]
use serde::{Deserialize, Serialize};

use crate::animation::Ease;
use crate::geometry::{Anchor, Edge};
use crate::navigator::NavigatorConfig;
use crate::refresh::RefreshTimings;
use crate::snap::SnapConfig;
use crate::spy::SpyAnchors;

/// Smallest viewport height the layout supports (landscape phones).
pub const MIN_VIEWPORT_HEIGHT: f64 = 480.0;

// ---------------------------------------------------------------------------
// Top-level ScrollConfig
// ---------------------------------------------------------------------------

/// Every tunable of the scroll layer.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config", serde(default))]
pub struct ScrollConfig {
    pub navigation: NavigationPolicy,
    pub spy: SpyPolicy,
    pub refresh: RefreshPolicy,
    pub snap: SnapPolicy,
}

impl ScrollConfig {
    /// Load from a TOML string.
    #[cfg(feature = "config")]
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(ConfigError::Toml)
    }

    /// Load from a TOML file on disk.
    #[cfg(feature = "config")]
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(ConfigError::Io)?;
        Self::from_toml_str(&content)
    }

    /// Load from a JSON string.
    #[cfg(feature = "config")]
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(s).map_err(ConfigError::Json)
    }

    /// Load from a JSON file on disk.
    #[cfg(feature = "config")]
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(ConfigError::Io)?;
        Self::from_json_str(&content)
    }

    /// Check ranges and cross-field consistency. Empty means valid.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        let nav = &self.navigation;

        if !nav.header_offset.is_finite() || nav.header_offset < 0.0 {
            errors.push(format!(
                "navigation.header_offset must be a non-negative number, got {}",
                nav.header_offset
            ));
        }
        if nav.duration_ms == 0 {
            errors.push("navigation.duration_ms must be > 0".into());
        }

        // A navigation lands the section top `header_offset` below the
        // viewport top; the spy must already count that as inside.
        if self.spy.start.edge != Edge::Top {
            errors.push(format!(
                "spy.start must anchor the section top, got \"{}\"",
                self.spy.start
            ));
        }
        let band = self.spy.start.viewport * MIN_VIEWPORT_HEIGHT;
        if nav.header_offset > band {
            errors.push(format!(
                "navigation.header_offset ({}) exceeds the spy start line ({band} px at a {MIN_VIEWPORT_HEIGHT} px viewport); \
                 navigated sections would not become active",
                nav.header_offset
            ));
        }

        let r = &self.refresh;
        if r.debounce_ms == 0 {
            errors.push("refresh.debounce_ms must be > 0".into());
        }
        if r.font_fallback_ms == 0 {
            errors.push("refresh.font_fallback_ms must be > 0".into());
        }
        if r.mutation_debounce_ms == 0 {
            errors.push("refresh.mutation_debounce_ms must be > 0".into());
        }

        let s = &self.snap;
        if !s.gap.is_finite() || s.gap < 0.0 {
            errors.push(format!("snap.gap must be a non-negative number, got {}", s.gap));
        }
        if !s.tolerance.is_finite() || s.tolerance < 0.0 {
            errors.push(format!(
                "snap.tolerance must be a non-negative number, got {}",
                s.tolerance
            ));
        }
        if s.quiet_ms == 0 {
            errors.push("snap.quiet_ms must be > 0".into());
        }
        if s.mutation_debounce_ms == 0 {
            errors.push("snap.mutation_debounce_ms must be > 0".into());
        }
        if !(s.fling_velocity.is_finite() && s.fling_velocity > 0.0) {
            errors.push(format!(
                "snap.fling_velocity must be a positive number, got {}",
                s.fling_velocity
            ));
        }

        errors
    }

    /// [`ScrollConfig::validate`] as a `Result`.
    pub fn validated(self) -> Result<Self, ConfigError> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(self)
        } else {
            Err(ConfigError::Validation(errors))
        }
    }

    #[must_use]
    pub fn to_navigator_config(&self) -> NavigatorConfig {
        let nav = &self.navigation;
        NavigatorConfig {
            header_offset: nav.header_offset,
            duration: Duration::from_millis(nav.duration_ms),
            ease: nav.ease,
            deep_link_settle: Duration::from_millis(nav.deep_link_settle_ms),
        }
    }

    #[must_use]
    pub fn to_spy_anchors(&self) -> SpyAnchors {
        SpyAnchors {
            start: self.spy.start,
            end: self.spy.end,
        }
    }

    #[must_use]
    pub fn to_refresh_timings(&self) -> RefreshTimings {
        let r = &self.refresh;
        RefreshTimings {
            debounce: Duration::from_millis(r.debounce_ms),
            dom_settle: Duration::from_millis(r.dom_settle_ms),
            font_fallback: Duration::from_millis(r.font_fallback_ms),
            mutation_debounce: Duration::from_millis(r.mutation_debounce_ms),
        }
    }

    #[must_use]
    pub fn to_snap_config(&self) -> SnapConfig {
        let s = &self.snap;
        SnapConfig {
            gap: s.gap,
            quiet: Duration::from_millis(s.quiet_ms),
            duration: Duration::from_millis(s.duration_ms),
            ease: s.ease,
            tolerance: s.tolerance,
            fling_velocity: s.fling_velocity,
        }
    }

    /// Debounce for the card strip's content-mutation watch.
    #[must_use]
    pub fn strip_mutation_debounce(&self) -> Duration {
        Duration::from_millis(self.snap.mutation_debounce_ms)
    }
}

// ---------------------------------------------------------------------------
// Sub-configs
// ---------------------------------------------------------------------------

/// Smooth-scroll navigation.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config", serde(default))]
pub struct NavigationPolicy {
    /// Fixed header height in px. Default: 72.
    pub header_offset: f64,
    /// Default: 1200.
    pub duration_ms: u64,
    /// Default: `power2.inOut`.
    pub ease: Ease,
    /// Wait before honoring the initial hash. Default: 100.
    pub deep_link_settle_ms: u64,
}

impl Default for NavigationPolicy {
    fn default() -> Self {
        let nav = NavigatorConfig::default();
        Self {
            header_offset: nav.header_offset,
            duration_ms: millis(nav.duration),
            ease: nav.ease,
            deep_link_settle_ms: millis(nav.deep_link_settle),
        }
    }
}

/// Active-section band.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config", serde(default))]
pub struct SpyPolicy {
    /// Default: `"top 20%"`.
    pub start: Anchor,
    /// Default: `"bottom 20%"`.
    pub end: Anchor,
}

impl Default for SpyPolicy {
    fn default() -> Self {
        let anchors = SpyAnchors::default();
        Self {
            start: anchors.start,
            end: anchors.end,
        }
    }
}

/// Geometry refresh delays.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config", serde(default))]
pub struct RefreshPolicy {
    /// Default: 100.
    pub debounce_ms: u64,
    /// Wait after a content mutation before measuring. Default: 50.
    pub dom_settle_ms: u64,
    /// Used when the font loading API is missing. Default: 1000.
    pub font_fallback_ms: u64,
    /// Default for content-mutation watches. Default: 200.
    pub mutation_debounce_ms: u64,
}

impl Default for RefreshPolicy {
    fn default() -> Self {
        let t = RefreshTimings::default();
        Self {
            debounce_ms: millis(t.debounce),
            dom_settle_ms: millis(t.dom_settle),
            font_fallback_ms: millis(t.font_fallback),
            mutation_debounce_ms: millis(t.mutation_debounce),
        }
    }
}

/// Card strip snapping.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config", serde(default))]
pub struct SnapPolicy {
    /// Gap between cards in px. Default: 20.
    pub gap: f64,
    /// Default: 150.
    pub quiet_ms: u64,
    /// Default: 300.
    pub duration_ms: u64,
    /// Default: `power2.out`.
    pub ease: Ease,
    /// Default: 10.
    pub tolerance: f64,
    /// Content-mutation watch on the strip. Default: 300.
    pub mutation_debounce_ms: u64,
    /// Release speed in px/s that snaps toward the direction of travel.
    /// Default: 1000.
    pub fling_velocity: f64,
}

impl Default for SnapPolicy {
    fn default() -> Self {
        let s = SnapConfig::default();
        Self {
            gap: s.gap,
            quiet_ms: millis(s.quiet),
            duration_ms: millis(s.duration),
            ease: s.ease,
            tolerance: s.tolerance,
            mutation_debounce_ms: 300,
            fling_velocity: s.fling_velocity,
        }
    }
}

fn millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Errors from loading a [`ScrollConfig`].
#[derive(Debug)]
pub enum ConfigError {
    /// I/O error reading a file.
    Io(std::io::Error),
    /// TOML parse error.
    #[cfg(feature = "config")]
    Toml(toml::de::Error),
    /// JSON parse error.
    #[cfg(feature = "config")]
    Json(serde_json::Error),
    /// Validation errors.
    Validation(Vec<String>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            #[cfg(feature = "config")]
            Self::Toml(e) => write!(f, "TOML parse error: {e}"),
            #[cfg(feature = "config")]
            Self::Json(e) => write!(f, "JSON parse error: {e}"),
            Self::Validation(errors) => write!(f, "invalid scroll config: {}", errors.join("; ")),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            #[cfg(feature = "config")]
            Self::Toml(e) => Some(e),
            #[cfg(feature = "config")]
            Self::Json(e) => Some(e),
            Self::Validation(_) => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
