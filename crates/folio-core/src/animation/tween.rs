#![forbid(unsafe_code)]

//! Tweens: interpolate between two states over a duration.
//!
//! [`Tween`] interpolates element [`Style`]s (entrance animations).
//! [`ScalarTween`] interpolates one `f64` (window or strip scroll offset) and
//! supports retargeting mid-flight.
//!
//! # Invariants
//!
//! 1. `sample(Duration::ZERO)` is exactly `from`; `sample(duration)` is
//!    exactly `to`, whatever the ease.
//! 2. Elapsed time never exceeds the duration; the excess is reported by
//!    [`Animation::overshoot`].
//!
//! # Failure Modes
//!
//! - Zero duration: clamped to 1ns so progress is well defined.

use std::time::Duration;

use super::{Animation, Ease};

const MIN_DURATION: Duration = Duration::from_nanos(1);

fn clamp_duration(d: Duration) -> Duration {
    if d.is_zero() { MIN_DURATION } else { d }
}

fn progress_of(elapsed: Duration, duration: Duration) -> f32 {
    let t = elapsed.as_secs_f64() / duration.as_secs_f64();
    (t as f32).clamp(0.0, 1.0)
}

// ---------------------------------------------------------------------------
// Style
// ---------------------------------------------------------------------------

/// The animatable inline-style subset: opacity plus a translate/scale
/// transform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Style {
    pub opacity: f32,
    /// Horizontal translation in px.
    pub x: f32,
    /// Vertical translation in px.
    pub y: f32,
    pub scale: f32,
}

impl Style {
    /// Fully visible, untransformed.
    pub const RESTING: Self = Self {
        opacity: 1.0,
        x: 0.0,
        y: 0.0,
        scale: 1.0,
    };

    /// Invisible, untransformed.
    pub const HIDDEN: Self = Self {
        opacity: 0.0,
        ..Self::RESTING
    };

    #[must_use]
    pub const fn with_opacity(mut self, opacity: f32) -> Self {
        self.opacity = opacity;
        self
    }

    #[must_use]
    pub const fn with_x(mut self, x: f32) -> Self {
        self.x = x;
        self
    }

    #[must_use]
    pub const fn with_y(mut self, y: f32) -> Self {
        self.y = y;
        self
    }

    #[must_use]
    pub const fn with_scale(mut self, scale: f32) -> Self {
        self.scale = scale;
        self
    }

    /// Component-wise interpolation. `t` may leave `0..=1` for overshooting
    /// eases; opacity is clamped regardless.
    #[must_use]
    pub fn lerp(a: Self, b: Self, t: f32) -> Self {
        let mix = |from: f32, to: f32| from + (to - from) * t;
        Self {
            opacity: mix(a.opacity, b.opacity).clamp(0.0, 1.0),
            x: mix(a.x, b.x),
            y: mix(a.y, b.y),
            scale: mix(a.scale, b.scale),
        }
    }
}

impl Default for Style {
    fn default() -> Self {
        Self::RESTING
    }
}

// ---------------------------------------------------------------------------
// Style tween
// ---------------------------------------------------------------------------

/// Interpolates a [`Style`] from `from` to `to`.
#[derive(Debug, Clone, PartialEq)]
pub struct Tween {
    from: Style,
    to: Style,
    duration: Duration,
    ease: Ease,
    elapsed: Duration,
    overshoot: Duration,
}

impl Tween {
    #[must_use]
    pub fn new(from: Style, to: Style, duration: Duration, ease: Ease) -> Self {
        Self {
            from,
            to,
            duration: clamp_duration(duration),
            ease,
            elapsed: Duration::ZERO,
            overshoot: Duration::ZERO,
        }
    }

    #[must_use]
    pub fn from_style(&self) -> Style {
        self.from
    }

    #[must_use]
    pub fn to_style(&self) -> Style {
        self.to
    }

    #[must_use]
    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Style at `elapsed` into the tween, independent of internal state.
    #[must_use]
    pub fn sample(&self, elapsed: Duration) -> Style {
        if elapsed.is_zero() {
            return self.from;
        }
        if elapsed >= self.duration {
            return self.to;
        }
        let t = self.ease.apply(progress_of(elapsed, self.duration));
        Style::lerp(self.from, self.to, t)
    }

    /// Style at the current elapsed time.
    #[must_use]
    pub fn style(&self) -> Style {
        self.sample(self.elapsed)
    }
}

impl Animation for Tween {
    fn tick(&mut self, dt: Duration) {
        let next = self.elapsed.saturating_add(dt);
        self.overshoot = next.saturating_sub(self.duration);
        self.elapsed = next.min(self.duration);
    }

    fn is_complete(&self) -> bool {
        self.elapsed >= self.duration
    }

    fn value(&self) -> f32 {
        self.ease.apply(progress_of(self.elapsed, self.duration))
    }

    fn reset(&mut self) {
        self.elapsed = Duration::ZERO;
        self.overshoot = Duration::ZERO;
    }

    fn overshoot(&self) -> Duration {
        self.overshoot
    }
}

// ---------------------------------------------------------------------------
// Scalar tween
// ---------------------------------------------------------------------------

/// Interpolates a scroll offset.
#[derive(Debug, Clone, PartialEq)]
pub struct ScalarTween {
    from: f64,
    to: f64,
    duration: Duration,
    ease: Ease,
    elapsed: Duration,
    overshoot: Duration,
}

impl ScalarTween {
    #[must_use]
    pub fn new(from: f64, to: f64, duration: Duration, ease: Ease) -> Self {
        Self {
            from,
            to,
            duration: clamp_duration(duration),
            ease,
            elapsed: Duration::ZERO,
            overshoot: Duration::ZERO,
        }
    }

    #[must_use]
    pub fn from_value(&self) -> f64 {
        self.from
    }

    /// Destination value.
    #[must_use]
    pub fn target(&self) -> f64 {
        self.to
    }

    /// Interpolated value at the current elapsed time.
    #[must_use]
    pub fn current(&self) -> f64 {
        if self.is_complete() {
            return self.to;
        }
        self.from + (self.to - self.from) * f64::from(self.value())
    }

    /// Restart toward a new destination from `from` (usually the live value).
    pub fn retarget(&mut self, from: f64, to: f64) {
        self.from = from;
        self.to = to;
        self.elapsed = Duration::ZERO;
        self.overshoot = Duration::ZERO;
    }
}

impl Animation for ScalarTween {
    fn tick(&mut self, dt: Duration) {
        let next = self.elapsed.saturating_add(dt);
        self.overshoot = next.saturating_sub(self.duration);
        self.elapsed = next.min(self.duration);
    }

    fn is_complete(&self) -> bool {
        self.elapsed >= self.duration
    }

    fn value(&self) -> f32 {
        self.ease.apply(progress_of(self.elapsed, self.duration))
    }

    fn reset(&mut self) {
        self.elapsed = Duration::ZERO;
        self.overshoot = Duration::ZERO;
    }

    fn overshoot(&self) -> Duration {
        self.overshoot
    }
}
