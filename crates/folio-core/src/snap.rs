#![forbid(unsafe_code)]

//! Horizontal snap scroller for the project card strip.
//!
//! ```text
//!   user scroll          quiet for `snap_quiet`        tween done
//! Idle ─────────► Scrolling ───────────────────► Snapping ─────────► Idle
//!                    ▲   │ (within tolerance) ─────────────────────► Idle
//!                    └───┴─── user scroll during Snapping
//! ```
//!
//! # Invariants
//!
//! 1. The snap target is `round(offset / pitch) * pitch`, clamped to
//!    `[0, (cards - 1) * pitch]`, where `pitch = card_width + gap` and
//!    `card_width` is measured from live layout at the moment of snapping.
//!    A release faster than `fling_velocity` rounds toward the direction of
//!    travel instead.
//! 2. Scroll events that echo a `SetScrollLeft` the scroller just wrote do
//!    not count as user input.
//! 3. The card list changes only through [`HorizontalSnapScroller::apply_mutation`],
//!    which the scene runs inside a refresh-coordinated mutation.
//!
//! # Failure Modes
//!
//! - No cards or unmeasurable first card: the strip settles without
//!   snapping.

use std::time::Duration;

use rand::SeedableRng;
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use tracing::{debug, trace};

use crate::animation::{Animation, Ease, ScalarTween};
use crate::geometry::ElementId;
use crate::host::{HostCommand, LayoutProbe};

/// Scroll events within this distance of our last write are echoes.
const ECHO_EPSILON: f64 = 1.0;

// ---------------------------------------------------------------------------
// Card data
// ---------------------------------------------------------------------------

/// A project card in the strip.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "config", derive(serde::Serialize, serde::Deserialize))]
pub struct Card {
    pub id: String,
    pub title: String,
    pub description: String,
    /// Image URL.
    pub image: String,
    #[cfg_attr(feature = "config", serde(default))]
    pub link: Option<String>,
    pub category: String,
}

impl Card {
    #[must_use]
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: String::new(),
            image: String::new(),
            link: None,
            category: String::new(),
        }
    }

    /// DOM id of the rendered card.
    #[must_use]
    pub fn element_id(&self) -> ElementId {
        ElementId::new(format!("card-{}", self.id))
    }
}

/// A change to the card list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CardMutation {
    Append(Vec<Card>),
    /// Remove the card with this id.
    Remove(String),
    /// New order by card id; ids not listed keep their relative order at the end.
    Reorder(Vec<String>),
    /// Deterministic shuffle with the given seed.
    Shuffle(u64),
}

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

/// Snap tuning.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SnapConfig {
    /// Horizontal gap between cards.
    pub gap: f64,
    /// Idle time after the last scroll event before snapping.
    pub quiet: Duration,
    pub duration: Duration,
    pub ease: Ease,
    /// No tween when already this close to a boundary.
    pub tolerance: f64,
    /// Release speed (px/s) at which the snap follows the direction of
    /// travel instead of the nearest boundary.
    pub fling_velocity: f64,
}

impl Default for SnapConfig {
    fn default() -> Self {
        Self {
            gap: 20.0,
            quiet: Duration::from_millis(150),
            duration: Duration::from_millis(300),
            ease: Ease::Power2Out,
            tolerance: 10.0,
            fling_velocity: 1000.0,
        }
    }
}

/// Observable state of the strip.
#[derive(Debug, Clone, PartialEq)]
pub struct HorizontalScrollState {
    /// Current `scrollLeft`.
    pub offset: f64,
    pub cards: Vec<Card>,
    /// Card width from the last live measurement.
    pub card_width: Option<f64>,
}

/// Coarse phase, for hosts and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapPhase {
    Idle,
    Scrolling,
    Snapping,
}

#[derive(Debug)]
enum Phase {
    Idle,
    Scrolling { quiet_due: Duration },
    Snapping { tween: ScalarTween, last_written: f64 },
}

/// Nearest card boundary to `offset`.
#[must_use]
pub fn snap_target(offset: f64, pitch: f64, card_count: usize) -> f64 {
    if pitch <= 0.0 || card_count == 0 {
        return 0.0;
    }
    let last = (card_count - 1) as f64 * pitch;
    ((offset / pitch).round() * pitch).clamp(0.0, last)
}

/// Like [`snap_target`], but a release at `velocity` (px/s) of at least
/// `fling` in magnitude moves on to the next boundary in that direction.
#[must_use]
pub fn fling_target(offset: f64, pitch: f64, card_count: usize, velocity: f64, fling: f64) -> f64 {
    if pitch <= 0.0 || card_count == 0 {
        return 0.0;
    }
    let index = offset / pitch;
    let index = if velocity >= fling {
        index.ceil()
    } else if velocity <= -fling {
        index.floor()
    } else {
        index.round()
    };
    let last = (card_count - 1) as f64 * pitch;
    (index * pitch).clamp(0.0, last)
}

/// Snap-to-card controller for one horizontally scrolling container.
#[derive(Debug)]
pub struct HorizontalSnapScroller {
    container: ElementId,
    config: SnapConfig,
    state: HorizontalScrollState,
    phase: Phase,
    /// px/s between the last two user scroll events, positive toward later
    /// cards.
    velocity: f64,
    last_sample: Option<(Duration, f64)>,
    snaps: u64,
}

impl HorizontalSnapScroller {
    #[must_use]
    pub fn new(container: ElementId, cards: Vec<Card>, config: SnapConfig) -> Self {
        Self {
            container,
            config,
            state: HorizontalScrollState {
                offset: 0.0,
                cards,
                card_width: None,
            },
            phase: Phase::Idle,
            velocity: 0.0,
            last_sample: None,
            snaps: 0,
        }
    }

    #[must_use]
    pub fn container(&self) -> &ElementId {
        &self.container
    }

    #[must_use]
    pub fn state(&self) -> &HorizontalScrollState {
        &self.state
    }

    #[must_use]
    pub fn cards(&self) -> &[Card] {
        &self.state.cards
    }

    #[must_use]
    pub fn velocity(&self) -> f64 {
        self.velocity
    }

    /// Completed snap tweens.
    #[must_use]
    pub fn snap_count(&self) -> u64 {
        self.snaps
    }

    #[must_use]
    pub fn phase(&self) -> SnapPhase {
        match self.phase {
            Phase::Idle => SnapPhase::Idle,
            Phase::Scrolling { .. } => SnapPhase::Scrolling,
            Phase::Snapping { .. } => SnapPhase::Snapping,
        }
    }

    #[must_use]
    pub fn is_animating(&self) -> bool {
        matches!(self.phase, Phase::Snapping { .. })
    }

    /// A scroll event on the container. Returns `false` for echoes of our
    /// own writes.
    pub fn on_scroll(&mut self, offset: f64, now: Duration) -> bool {
        if let Phase::Snapping { last_written, .. } = self.phase {
            if (offset - last_written).abs() < ECHO_EPSILON {
                self.state.offset = offset;
                return false;
            }
            debug!(
                target: "folio.snap",
                container = %self.container,
                offset,
                "user scroll interrupted snap"
            );
        }
        if let Some((t, x)) = self.last_sample {
            let dt = now.saturating_sub(t).as_secs_f64();
            if dt > 0.0 {
                self.velocity = (offset - x) / dt;
            }
        }
        self.last_sample = Some((now, offset));
        self.state.offset = offset;
        self.phase = Phase::Scrolling {
            quiet_due: now + self.config.quiet,
        };
        true
    }

    #[must_use]
    pub fn next_deadline(&self) -> Option<Duration> {
        match self.phase {
            Phase::Scrolling { quiet_due } => Some(quiet_due),
            _ => None,
        }
    }

    /// Measure the live card pitch (`card_width + gap`).
    pub fn measure_pitch(&mut self, layout: &dyn LayoutProbe) -> Option<f64> {
        let first = self.state.cards.first()?;
        let width = layout.rect(&first.element_id())?.width;
        if width <= 0.0 {
            return None;
        }
        self.state.card_width = Some(width);
        Some(width + self.config.gap)
    }

    /// Largest reachable `scrollLeft`, when the container is mounted.
    /// Targets beyond it would be clamped by the browser and never land.
    fn max_offset(&self, layout: &dyn LayoutProbe, pitch: f64) -> Option<f64> {
        let container = layout.rect(&self.container)?;
        let content = self.state.cards.len() as f64 * pitch - self.config.gap;
        Some((content - container.width).max(0.0))
    }

    /// Start snapping if the quiet period has elapsed.
    pub fn fire_due(&mut self, now: Duration, layout: &dyn LayoutProbe) {
        let Phase::Scrolling { quiet_due } = self.phase else {
            return;
        };
        if quiet_due > now {
            return;
        }
        let velocity = std::mem::take(&mut self.velocity);
        self.last_sample = None;
        let Some(pitch) = self.measure_pitch(layout) else {
            debug!(target: "folio.snap", container = %self.container, "no measurable cards, not snapping");
            self.phase = Phase::Idle;
            return;
        };
        let offset = self.state.offset;
        let mut target = fling_target(
            offset,
            pitch,
            self.state.cards.len(),
            velocity,
            self.config.fling_velocity,
        );
        if let Some(max) = self.max_offset(layout, pitch) {
            target = target.min(max);
        }
        if (offset - target).abs() <= self.config.tolerance {
            trace!(target: "folio.snap", offset, target, "within tolerance");
            self.phase = Phase::Idle;
            return;
        }
        debug!(
            target: "folio.snap",
            container = %self.container,
            offset,
            target,
            pitch,
            velocity,
            "snapping"
        );
        self.phase = Phase::Snapping {
            tween: ScalarTween::new(offset, target, self.config.duration, self.config.ease),
            last_written: offset,
        };
    }

    /// Advance the snap tween, writing `scrollLeft`.
    pub fn tick(&mut self, dt: Duration, out: &mut Vec<HostCommand>) {
        let Phase::Snapping {
            tween,
            last_written,
        } = &mut self.phase
        else {
            return;
        };
        tween.tick(dt);
        let x = tween.current();
        *last_written = x;
        self.state.offset = x;
        out.push(HostCommand::SetScrollLeft {
            element: self.container.clone(),
            x,
        });
        if tween.is_complete() {
            self.phase = Phase::Idle;
            self.snaps += 1;
        }
    }

    /// Apply a card list change. Returns the new card count.
    pub fn apply_mutation(&mut self, mutation: CardMutation) -> usize {
        let cards = &mut self.state.cards;
        match mutation {
            CardMutation::Append(mut more) => cards.append(&mut more),
            CardMutation::Remove(id) => cards.retain(|c| c.id != id),
            CardMutation::Reorder(order) => {
                let rank = |c: &Card| order.iter().position(|id| *id == c.id).unwrap_or(order.len());
                cards.sort_by_key(rank);
            }
            CardMutation::Shuffle(seed) => {
                let mut rng = SmallRng::seed_from_u64(seed);
                cards.shuffle(&mut rng);
            }
        }
        debug!(target: "folio.snap", container = %self.container, cards = cards.len(), "cards mutated");
        cards.len()
    }

    /// Stop any snap in progress.
    pub fn halt(&mut self) {
        self.phase = Phase::Idle;
        self.velocity = 0.0;
        self.last_sample = None;
    }
}
