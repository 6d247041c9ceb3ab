#![forbid(unsafe_code)]

//! Easing curves.
//!
//! Named after the curve strings used in the site's markup (`"power2.out"`,
//! `"back.out(1.7)"`), so configuration can carry them verbatim.
//!
//! # Invariants
//!
//! 1. Every curve maps `0.0 -> 0.0` and `1.0 -> 1.0`.
//! 2. Input is clamped to `0.0..=1.0` before evaluation.

use std::fmt;
use std::str::FromStr;

/// Plain easing function signature.
pub type EasingFn = fn(f32) -> f32;

pub fn linear(t: f32) -> f32 {
    t
}

/// Quadratic ease-in.
pub fn power2_in(t: f32) -> f32 {
    t * t
}

/// Quadratic ease-out.
pub fn power2_out(t: f32) -> f32 {
    1.0 - (1.0 - t) * (1.0 - t)
}

/// Quadratic ease-in-out.
pub fn power2_in_out(t: f32) -> f32 {
    if t < 0.5 {
        2.0 * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
    }
}

/// Cubic ease-out.
pub fn power3_out(t: f32) -> f32 {
    1.0 - (1.0 - t).powi(3)
}

/// Ease-out that overshoots the target by an amount controlled by `s`.
pub fn back_out(t: f32, s: f32) -> f32 {
    let u = t - 1.0;
    u * u * ((s + 1.0) * u + s) + 1.0
}

/// A named easing curve.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(
    feature = "config",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "String", into = "String")
)]
pub enum Ease {
    Linear,
    Power2In,
    Power2Out,
    Power2InOut,
    Power3Out,
    /// Overshooting ease-out with the given overshoot strength.
    BackOut(f32),
}

impl Ease {
    /// Evaluate the curve at `t`.
    #[must_use]
    pub fn apply(self, t: f32) -> f32 {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        match self {
            Self::Linear => linear(t),
            Self::Power2In => power2_in(t),
            Self::Power2Out => power2_out(t),
            Self::Power2InOut => power2_in_out(t),
            Self::Power3Out => power3_out(t),
            Self::BackOut(s) => back_out(t, s),
        }
    }
}

impl Default for Ease {
    fn default() -> Self {
        Self::Power2Out
    }
}

impl fmt::Display for Ease {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Linear => f.write_str("none"),
            Self::Power2In => f.write_str("power2.in"),
            Self::Power2Out => f.write_str("power2.out"),
            Self::Power2InOut => f.write_str("power2.inOut"),
            Self::Power3Out => f.write_str("power3.out"),
            Self::BackOut(s) => write!(f, "back.out({s})"),
        }
    }
}

/// Error from parsing an [`Ease`] name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EaseParseError(String);

impl fmt::Display for EaseParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown ease {:?}", self.0)
    }
}

impl std::error::Error for EaseParseError {}

impl FromStr for Ease {
    type Err = EaseParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        match name {
            "none" | "linear" => return Ok(Self::Linear),
            "power2.in" => return Ok(Self::Power2In),
            "power2.out" | "power2" => return Ok(Self::Power2Out),
            "power2.inOut" => return Ok(Self::Power2InOut),
            "power3.out" | "power3" => return Ok(Self::Power3Out),
            "back.out" => return Ok(Self::BackOut(1.70158)),
            _ => {}
        }
        let strength = name
            .strip_prefix("back.out(")
            .and_then(|rest| rest.strip_suffix(')'))
            .and_then(|arg| arg.trim().parse::<f32>().ok())
            .filter(|s| s.is_finite());
        strength
            .map(Self::BackOut)
            .ok_or_else(|| EaseParseError(s.to_owned()))
    }
}

impl TryFrom<String> for Ease {
    type Error = EaseParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Ease> for String {
    fn from(ease: Ease) -> Self {
        ease.to_string()
    }
}
