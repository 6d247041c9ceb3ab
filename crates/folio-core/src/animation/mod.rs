#![forbid(unsafe_code)]

//! Animation primitives: easing curves, styles, tweens, and timelines.
//!
//! Everything here is driven by explicit `tick(dt)` calls; nothing reads a
//! clock. The [`Animation`] trait is the common progress interface shared by
//! [`Tween`], [`ScalarTween`], and [`Timeline`].

pub mod ease;
pub mod timeline;
pub mod tween;

use std::time::Duration;

pub use ease::{Ease, EaseParseError, EasingFn};
pub use timeline::{Direction, PlaybackState, Timeline, stagger_offsets};
pub use tween::{ScalarTween, Style, Tween};

/// A time-driven animation producing a normalized value.
pub trait Animation {
    /// Advance by `dt`.
    fn tick(&mut self, dt: Duration);

    /// Whether the animation has reached its end.
    fn is_complete(&self) -> bool;

    /// Current eased value, normally in `0.0..=1.0` (overshooting eases may
    /// leave that range mid-flight).
    fn value(&self) -> f32;

    /// Return to the initial state.
    fn reset(&mut self);

    /// Time carried past completion by the last `tick`.
    fn overshoot(&self) -> Duration {
        Duration::ZERO
    }
}
