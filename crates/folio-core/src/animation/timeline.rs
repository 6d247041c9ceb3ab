#![forbid(unsafe_code)]

//! Timeline: staggered style tweens over a set of target elements.
//!
//! A [`Timeline`] places one [`Tween`] per target at an offset and plays the
//! whole group forward or in reverse. Toggle actions on scroll triggers map
//! onto the playback controls here (`play`, `reverse`, `restart`, `reset`,
//! `complete`, `pause`).
//!
//! # Usage
//!
//! ```
//! use std::time::Duration;
//! use folio_core::animation::{Ease, Style, Timeline};
//! use folio_core::geometry::ElementId;
//!
//! let cards = [ElementId::new("card-1"), ElementId::new("card-2")];
//! let mut tl = Timeline::staggered(
//!     &cards,
//!     Style::HIDDEN.with_y(30.0),
//!     Style::RESTING,
//!     Duration::from_millis(600),
//!     Ease::Power2Out,
//!     Duration::from_millis(100),
//! );
//! assert_eq!(tl.duration(), Duration::from_millis(700));
//! tl.play();
//! ```
//!
//! # Invariants
//!
//! 1. Events are always sorted by offset (maintained on insertion; equal
//!    offsets keep insertion order).
//! 2. `current_time` stays within `[0, duration]`.
//! 3. `tick()` only moves time in `Playing` state, in the current direction.
//! 4. Styles are a pure function of `current_time`: seeking, reversing, and
//!    replaying always reproduce the same frame for the same time.
//!
//! # Failure Modes
//!
//! - Empty timeline: duration is 1ns and progress is always 1.0.
//! - `play()` at the end or `reverse()` at the start: no-op apart from the
//!   direction change.

use std::time::Duration;

use super::{Animation, Ease, Style, Tween};
use crate::geometry::ElementId;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Playback state of the timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    /// At rest (never played, reset, or reversed back to the start).
    Idle,
    /// Actively playing in the current direction.
    Playing,
    /// Paused; can be resumed.
    Paused,
    /// Reached the end.
    Finished,
}

/// Playback direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Reverse,
}

/// A single tween in the timeline.
#[derive(Debug, Clone)]
struct TimelineEvent {
    /// When this tween starts relative to timeline start.
    offset: Duration,
    target: ElementId,
    tween: Tween,
}

impl TimelineEvent {
    fn style_at(&self, time: Duration) -> Style {
        self.tween.sample(time.saturating_sub(self.offset))
    }
}

/// Evenly spaced start offsets: item `i` starts at `i * stagger`.
#[must_use]
pub fn stagger_offsets(count: usize, stagger: Duration) -> Vec<Duration> {
    (0..count)
        .map(|i| stagger.saturating_mul(u32::try_from(i).unwrap_or(u32::MAX)))
        .collect()
}

/// A group of style tweens played as one unit.
#[derive(Debug, Clone)]
pub struct Timeline {
    events: Vec<TimelineEvent>,
    total_duration: Duration,
    state: PlaybackState,
    direction: Direction,
    current_time: Duration,
}

// ---------------------------------------------------------------------------
// Construction
// ---------------------------------------------------------------------------

impl Timeline {
    /// Create an empty timeline.
    #[must_use]
    pub fn new() -> Self {
        Self {
            events: Vec::new(),
            total_duration: Duration::from_nanos(1),
            state: PlaybackState::Idle,
            direction: Direction::Forward,
            current_time: Duration::ZERO,
        }
    }

    /// Add a tween for `target` at an absolute offset (builder pattern).
    #[must_use]
    pub fn add(mut self, offset: Duration, target: ElementId, tween: Tween) -> Self {
        self.push_event(offset, target, tween);
        self
    }

    /// One tween per target, item `i` delayed by `i * stagger` (DOM order).
    #[must_use]
    pub fn staggered(
        targets: &[ElementId],
        from: Style,
        to: Style,
        duration: Duration,
        ease: Ease,
        stagger: Duration,
    ) -> Self {
        let offsets = stagger_offsets(targets.len(), stagger);
        targets
            .iter()
            .zip(offsets)
            .fold(Self::new(), |tl, (target, offset)| {
                tl.add(offset, target.clone(), Tween::new(from, to, duration, ease))
            })
    }

    /// Insert an event, keeping offset order and recomputing the duration.
    fn push_event(&mut self, offset: Duration, target: ElementId, tween: Tween) {
        let end = offset.saturating_add(tween.duration());
        let pos = self.events.partition_point(|e| e.offset <= offset);
        self.events.insert(
            pos,
            TimelineEvent {
                offset,
                target,
                tween,
            },
        );
        if end > self.total_duration {
            self.total_duration = end;
        }
    }
}

impl Default for Timeline {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Playback control
// ---------------------------------------------------------------------------

impl Timeline {
    /// Play forward from the current position.
    pub fn play(&mut self) {
        self.direction = Direction::Forward;
        self.state = if self.current_time >= self.total_duration {
            PlaybackState::Finished
        } else {
            PlaybackState::Playing
        };
    }

    /// Play backward from the current position toward the start.
    pub fn reverse(&mut self) {
        self.direction = Direction::Reverse;
        self.state = if self.current_time.is_zero() {
            PlaybackState::Idle
        } else {
            PlaybackState::Playing
        };
    }

    /// Jump to the start and play forward.
    pub fn restart(&mut self) {
        self.current_time = Duration::ZERO;
        self.play();
    }

    /// Jump to the start and stop.
    pub fn reset(&mut self) {
        self.current_time = Duration::ZERO;
        self.direction = Direction::Forward;
        self.state = PlaybackState::Idle;
    }

    /// Jump to the end and stop.
    pub fn complete(&mut self) {
        self.current_time = self.total_duration;
        self.direction = Direction::Forward;
        self.state = PlaybackState::Finished;
    }

    /// Pause playback. No-op if not playing.
    pub fn pause(&mut self) {
        if self.state == PlaybackState::Playing {
            self.state = PlaybackState::Paused;
        }
    }

    /// Resume from pause. No-op if not paused.
    pub fn resume(&mut self) {
        if self.state == PlaybackState::Paused {
            self.state = PlaybackState::Playing;
        }
    }

    /// Seek to an absolute time position, clamped to `[0, duration]`.
    ///
    /// An idle or finished timeline becomes paused at the seek point.
    pub fn seek(&mut self, time: Duration) {
        self.current_time = time.min(self.total_duration);
        if matches!(self.state, PlaybackState::Idle | PlaybackState::Finished) {
            self.state = PlaybackState::Paused;
        }
    }

    /// Current progress as a value in [0.0, 1.0].
    #[inline]
    #[must_use]
    pub fn progress(&self) -> f32 {
        if self.events.is_empty() {
            return 1.0;
        }
        let t = self.current_time.as_secs_f64() / self.total_duration.as_secs_f64();
        (t as f32).clamp(0.0, 1.0)
    }

    #[inline]
    #[must_use]
    pub fn state(&self) -> PlaybackState {
        self.state
    }

    #[inline]
    #[must_use]
    pub fn direction(&self) -> Direction {
        self.direction
    }

    #[inline]
    #[must_use]
    pub fn current_time(&self) -> Duration {
        self.current_time
    }

    /// Total duration: the latest `offset + tween duration`.
    #[inline]
    #[must_use]
    pub fn duration(&self) -> Duration {
        self.total_duration
    }

    #[inline]
    #[must_use]
    pub fn event_count(&self) -> usize {
        self.events.len()
    }

    /// Whether playback is in progress.
    #[inline]
    #[must_use]
    pub fn is_playing(&self) -> bool {
        self.state == PlaybackState::Playing
    }

    /// Targets in event order (duplicates possible if added twice).
    pub fn targets(&self) -> impl Iterator<Item = &ElementId> {
        self.events.iter().map(|e| &e.target)
    }

    /// Every target's style at the current time, in event order.
    pub fn styles(&self) -> impl Iterator<Item = (&ElementId, Style)> + '_ {
        let now = self.current_time;
        self.events.iter().map(move |e| (&e.target, e.style_at(now)))
    }

    /// Style of one target at the current time.
    #[must_use]
    pub fn style_of(&self, target: &ElementId) -> Option<Style> {
        self.events
            .iter()
            .find(|e| &e.target == target)
            .map(|e| e.style_at(self.current_time))
    }
}

// ---------------------------------------------------------------------------
// Animation trait implementation
// ---------------------------------------------------------------------------

impl Animation for Timeline {
    fn tick(&mut self, dt: Duration) {
        if self.state != PlaybackState::Playing {
            return;
        }
        match self.direction {
            Direction::Forward => {
                self.current_time = self.current_time.saturating_add(dt);
                if self.current_time >= self.total_duration {
                    self.current_time = self.total_duration;
                    self.state = PlaybackState::Finished;
                }
            }
            Direction::Reverse => {
                self.current_time = self.current_time.saturating_sub(dt);
                if self.current_time.is_zero() {
                    self.state = PlaybackState::Idle;
                }
            }
        }
    }

    fn is_complete(&self) -> bool {
        match self.direction {
            Direction::Forward => self.state == PlaybackState::Finished,
            Direction::Reverse => self.current_time.is_zero() && !self.is_playing(),
        }
    }

    fn value(&self) -> f32 {
        self.progress()
    }

    fn reset(&mut self) {
        Timeline::reset(self);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MS_100: Duration = Duration::from_millis(100);
    const MS_300: Duration = Duration::from_millis(300);
    const MS_600: Duration = Duration::from_millis(600);

    fn ids(n: usize) -> Vec<ElementId> {
        (0..n).map(|i| ElementId::new(format!("card-{i}"))).collect()
    }

    fn cards(n: usize) -> Timeline {
        Timeline::staggered(
            &ids(n),
            Style::HIDDEN.with_y(30.0),
            Style::RESTING,
            MS_600,
            Ease::Power2Out,
            MS_100,
        )
    }

    #[test]
    fn stagger_offsets_are_linear() {
        assert_eq!(
            stagger_offsets(4, MS_100),
            vec![
                Duration::ZERO,
                MS_100,
                Duration::from_millis(200),
                MS_300
            ]
        );
        assert!(stagger_offsets(0, MS_100).is_empty());
    }

    #[test]
    fn duration_covers_last_item() {
        assert_eq!(cards(3).duration(), Duration::from_millis(800));
        assert_eq!(Timeline::new().progress(), 1.0);
    }

    #[test]
    fn new_timeline_renders_from_state() {
        let tl = cards(2);
        for (_, style) in tl.styles() {
            assert_eq!(style, Style::HIDDEN.with_y(30.0));
        }
        assert_eq!(tl.state(), PlaybackState::Idle);
    }

    #[test]
    fn tick_only_when_playing() {
        let mut tl = cards(2);
        tl.tick(MS_100);
        assert_eq!(tl.current_time(), Duration::ZERO);
        tl.play();
        tl.tick(MS_100);
        assert_eq!(tl.current_time(), MS_100);
    }

    #[test]
    fn stagger_delays_later_items() {
        let mut tl = cards(3);
        tl.play();
        tl.tick(MS_100);
        let styles: Vec<_> = tl.styles().map(|(_, s)| s).collect();
        assert!(styles[0].opacity > 0.0);
        assert_eq!(styles[1].opacity, 0.0);
        assert_eq!(styles[2].opacity, 0.0);
    }

    #[test]
    fn play_to_finish() {
        let mut tl = cards(2);
        tl.play();
        tl.tick(Duration::from_secs(2));
        assert_eq!(tl.state(), PlaybackState::Finished);
        assert!(tl.is_complete());
        assert!(tl.styles().all(|(_, s)| s == Style::RESTING));
    }

    #[test]
    fn reverse_returns_to_from_state() {
        let mut tl = cards(2);
        tl.play();
        tl.tick(MS_300);
        tl.reverse();
        assert_eq!(tl.direction(), Direction::Reverse);
        tl.tick(MS_100);
        assert_eq!(tl.current_time(), Duration::from_millis(200));
        tl.tick(Duration::from_secs(1));
        assert_eq!(tl.state(), PlaybackState::Idle);
        assert!(tl.is_complete());
        assert!(tl.styles().all(|(_, s)| s == Style::HIDDEN.with_y(30.0)));
    }

    #[test]
    fn reverse_at_start_is_noop() {
        let mut tl = cards(1);
        tl.reverse();
        assert_eq!(tl.state(), PlaybackState::Idle);
        tl.tick(MS_100);
        assert_eq!(tl.current_time(), Duration::ZERO);
    }

    #[test]
    fn play_at_end_stays_finished() {
        let mut tl = cards(1);
        tl.complete();
        tl.play();
        assert_eq!(tl.state(), PlaybackState::Finished);
    }

    #[test]
    fn restart_and_reset() {
        let mut tl = cards(2);
        tl.complete();
        tl.restart();
        assert_eq!(tl.current_time(), Duration::ZERO);
        assert!(tl.is_playing());
        tl.tick(MS_300);
        tl.reset();
        assert_eq!(tl.state(), PlaybackState::Idle);
        assert_eq!(tl.current_time(), Duration::ZERO);
    }

    #[test]
    fn pause_resume() {
        let mut tl = cards(1);
        tl.play();
        tl.tick(MS_100);
        tl.pause();
        tl.tick(MS_100);
        assert_eq!(tl.current_time(), MS_100);
        tl.resume();
        tl.tick(MS_100);
        assert_eq!(tl.current_time(), Duration::from_millis(200));
    }

    #[test]
    fn seek_is_deterministic() {
        let mut a = cards(3);
        a.play();
        a.tick(Duration::from_millis(450));
        let mut b = cards(3);
        b.seek(Duration::from_millis(450));
        let sa: Vec<_> = a.styles().map(|(_, s)| s).collect();
        let sb: Vec<_> = b.styles().map(|(_, s)| s).collect();
        assert_eq!(sa, sb);
        assert_eq!(b.state(), PlaybackState::Paused);
    }

    #[test]
    fn style_of_finds_target() {
        let tl = cards(2);
        assert!(tl.style_of(&ElementId::new("card-1")).is_some());
        assert!(tl.style_of(&ElementId::new("nope")).is_none());
    }
}
