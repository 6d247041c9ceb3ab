#![forbid(unsafe_code)]

//! Section entrance animations ("reveals").
//!
//! A [`Reveal`] says how a group of elements animates into view when a
//! trigger element scrolls past a threshold. [`register_reveal`] wires one
//! up: it writes the hidden `from` frame, builds a staggered timeline, and
//! registers a trigger whose events map through [`ToggleActions`] onto
//! timeline controls.
//!
//! # Presets
//!
//! | Preset | Motion | Timing |
//! |--------|--------|--------|
//! | [`Reveal::title`] | fade, `y 50 -> 0` | 0.8s `power2.out`, `top 80%` |
//! | [`Reveal::slide_from_left`] | fade, `x -50 -> 0` | 0.8s `power2.out`, `top 80%` |
//! | [`Reveal::slide_from_right`] | fade, `x 50 -> 0` | 0.8s `power2.out`, `top 80%` |
//! | [`Reveal::skill_title`] | fade, `x -50 -> 0` | 0.6s, `top 85%` / `bottom 15%` |
//! | [`Reveal::skill_cards`] | fade, `y 30`, `scale 0.9` | 0.6s `back.out(1.7)`, stagger 0.1s |
//! | [`Reveal::project_cards`] | fade, `y 50`, `scale 0.9` | 0.6s, stagger 0.2s, once |
//! | [`Reveal::social_links`] | fade, `scale 0.5` | 0.6s `back.out(1.7)`, stagger 0.1s |

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use tracing::debug;

use crate::animation::{Ease, Style, Timeline};
use crate::controller::{ContextId, TimelineControl, TimelineController, TimelineId};
use crate::geometry::{Anchor, Edge, ElementId};
use crate::host::{HostCommand, LayoutProbe};
use crate::observer::{ScrollObserver, TriggerEvent, TriggerSpec};

// ---------------------------------------------------------------------------
// Toggle actions
// ---------------------------------------------------------------------------

/// What a timeline does in response to one trigger event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleAction {
    None,
    Play,
    Reverse,
    Restart,
    Reset,
    Complete,
    Pause,
}

impl ToggleAction {
    /// The timeline control this action maps to.
    #[must_use]
    pub const fn control(self) -> Option<TimelineControl> {
        match self {
            Self::None => None,
            Self::Play => Some(TimelineControl::Play),
            Self::Reverse => Some(TimelineControl::Reverse),
            Self::Restart => Some(TimelineControl::Restart),
            Self::Reset => Some(TimelineControl::Reset),
            Self::Complete => Some(TimelineControl::Complete),
            Self::Pause => Some(TimelineControl::Pause),
        }
    }

    fn keyword(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Play => "play",
            Self::Reverse => "reverse",
            Self::Restart => "restart",
            Self::Reset => "reset",
            Self::Complete => "complete",
            Self::Pause => "pause",
        }
    }

    fn parse(word: &str) -> Option<Self> {
        Some(match word {
            "none" => Self::None,
            "play" | "resume" => Self::Play,
            "reverse" => Self::Reverse,
            "restart" => Self::Restart,
            "reset" => Self::Reset,
            "complete" => Self::Complete,
            "pause" => Self::Pause,
            _ => return None,
        })
    }
}

/// Actions for enter, leave, enter-back and leave-back, in that order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToggleActions {
    pub on_enter: ToggleAction,
    pub on_leave: ToggleAction,
    pub on_enter_back: ToggleAction,
    pub on_leave_back: ToggleAction,
}

impl ToggleActions {
    /// `"play none none none"`.
    pub const PLAY_ONCE: Self = Self {
        on_enter: ToggleAction::Play,
        on_leave: ToggleAction::None,
        on_enter_back: ToggleAction::None,
        on_leave_back: ToggleAction::None,
    };

    /// `"play none none reverse"`: plays on the way down, rewinds when
    /// scrolled back above the start.
    pub const REVERSIBLE: Self = Self {
        on_leave_back: ToggleAction::Reverse,
        ..Self::PLAY_ONCE
    };

    #[must_use]
    pub const fn action_for(&self, event: TriggerEvent) -> ToggleAction {
        match event {
            TriggerEvent::Enter => self.on_enter,
            TriggerEvent::Leave => self.on_leave,
            TriggerEvent::EnterBack => self.on_enter_back,
            TriggerEvent::LeaveBack => self.on_leave_back,
        }
    }
}

impl Default for ToggleActions {
    fn default() -> Self {
        Self::REVERSIBLE
    }
}

impl fmt::Display for ToggleActions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {}",
            self.on_enter.keyword(),
            self.on_leave.keyword(),
            self.on_enter_back.keyword(),
            self.on_leave_back.keyword()
        )
    }
}

/// Error from parsing [`ToggleActions`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToggleParseError(String);

impl fmt::Display for ToggleParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid toggle actions {:?}: expected four of none/play/reverse/restart/reset/complete/pause",
            self.0
        )
    }
}

impl std::error::Error for ToggleParseError {}

impl FromStr for ToggleActions {
    type Err = ToggleParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ToggleParseError(s.to_owned());
        let words: Vec<&str> = s.split_whitespace().collect();
        let [enter, leave, enter_back, leave_back] = words.as_slice() else {
            return Err(err());
        };
        let action = |w: &str| ToggleAction::parse(w).ok_or_else(err);
        Ok(Self {
            on_enter: action(*enter)?,
            on_leave: action(*leave)?,
            on_enter_back: action(*enter_back)?,
            on_leave_back: action(*leave_back)?,
        })
    }
}

// ---------------------------------------------------------------------------
// Reveal definitions
// ---------------------------------------------------------------------------

/// How a group of elements animates into view.
#[derive(Debug, Clone, PartialEq)]
pub struct Reveal {
    pub from: Style,
    pub to: Style,
    pub duration: Duration,
    pub ease: Ease,
    pub start: Anchor,
    pub end: Anchor,
    pub toggle: ToggleActions,
    /// Play on first entry only; the trigger is never re-armed.
    pub once: bool,
    /// Delay between successive targets, in DOM order.
    pub stagger: Duration,
}

const TITLE_DURATION: Duration = Duration::from_millis(800);
const ITEM_DURATION: Duration = Duration::from_millis(600);

impl Reveal {
    /// Fade in from `from`, 0.8s `power2.out`, between `top 80%` and
    /// `bottom 20%`, reversing when scrolled back above.
    #[must_use]
    pub fn new(from: Style) -> Self {
        Self {
            from,
            to: Style::RESTING,
            duration: TITLE_DURATION,
            ease: Ease::Power2Out,
            start: Anchor::new(Edge::Top, 0.8),
            end: Anchor::new(Edge::Bottom, 0.2),
            toggle: ToggleActions::REVERSIBLE,
            once: false,
            stagger: Duration::ZERO,
        }
    }

    /// Section heading: slide up.
    #[must_use]
    pub fn title() -> Self {
        Self::new(Style::HIDDEN.with_y(50.0))
    }

    /// Body copy: slide in from the left.
    #[must_use]
    pub fn slide_from_left() -> Self {
        Self::new(Style::HIDDEN.with_x(-50.0))
    }

    /// Side column (work timeline, contact form): slide in from the right.
    #[must_use]
    pub fn slide_from_right() -> Self {
        Self::new(Style::HIDDEN.with_x(50.0))
    }

    /// Skill group headings.
    #[must_use]
    pub fn skill_title() -> Self {
        Self::new(Style::HIDDEN.with_x(-50.0))
            .duration(ITEM_DURATION)
            .start(Anchor::new(Edge::Top, 0.85))
            .end(Anchor::new(Edge::Bottom, 0.15))
    }

    /// Skill cards: pop in with overshoot.
    #[must_use]
    pub fn skill_cards() -> Self {
        Self::new(Style::HIDDEN.with_y(30.0).with_scale(0.9))
            .duration(ITEM_DURATION)
            .ease(Ease::BackOut(1.7))
            .stagger(Duration::from_millis(100))
    }

    /// Project cards: rise in once, never rewound.
    #[must_use]
    pub fn project_cards() -> Self {
        Self::new(Style::HIDDEN.with_y(50.0).with_scale(0.9))
            .duration(ITEM_DURATION)
            .stagger(Duration::from_millis(200))
            .toggle(ToggleActions::PLAY_ONCE)
            .once(true)
    }

    /// Social links under the contact form.
    #[must_use]
    pub fn social_links() -> Self {
        Self::new(Style::HIDDEN.with_scale(0.5))
            .duration(ITEM_DURATION)
            .ease(Ease::BackOut(1.7))
            .stagger(Duration::from_millis(100))
    }

    #[must_use]
    pub fn duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    #[must_use]
    pub fn ease(mut self, ease: Ease) -> Self {
        self.ease = ease;
        self
    }

    #[must_use]
    pub fn start(mut self, anchor: Anchor) -> Self {
        self.start = anchor;
        self
    }

    #[must_use]
    pub fn end(mut self, anchor: Anchor) -> Self {
        self.end = anchor;
        self
    }

    #[must_use]
    pub fn toggle(mut self, toggle: ToggleActions) -> Self {
        self.toggle = toggle;
        self
    }

    #[must_use]
    pub fn once(mut self, once: bool) -> Self {
        self.once = once;
        self
    }

    #[must_use]
    pub fn stagger(mut self, stagger: Duration) -> Self {
        self.stagger = stagger;
        self
    }

    /// The staggered timeline for `targets`.
    #[must_use]
    pub fn timeline(&self, targets: &[ElementId]) -> Timeline {
        Timeline::staggered(
            targets,
            self.from,
            self.to,
            self.duration,
            self.ease,
            self.stagger,
        )
    }
}

/// A reveal bound to concrete elements.
#[derive(Debug, Clone, PartialEq)]
pub struct RevealSpec {
    /// Element whose position drives the trigger.
    pub trigger: ElementId,
    /// Elements that animate, in DOM order.
    pub targets: Vec<ElementId>,
    pub reveal: Reveal,
}

impl RevealSpec {
    #[must_use]
    pub fn new(trigger: impl Into<ElementId>, targets: Vec<ElementId>, reveal: Reveal) -> Self {
        Self {
            trigger: trigger.into(),
            targets,
            reveal,
        }
    }

    /// The element is its own trigger.
    #[must_use]
    pub fn single(element: impl Into<ElementId>, reveal: Reveal) -> Self {
        let element = element.into();
        Self {
            trigger: element.clone(),
            targets: vec![element],
            reveal,
        }
    }
}

/// Wire a reveal into the controller and observer.
///
/// Targets that are not mounted are skipped. Returns `None` (and writes no
/// styles) when the trigger element or every target is missing.
pub fn register_reveal(
    controller: &mut TimelineController,
    observer: &mut ScrollObserver,
    layout: &dyn LayoutProbe,
    context: Option<ContextId>,
    spec: &RevealSpec,
    out: &mut Vec<HostCommand>,
) -> Option<TimelineId> {
    if !layout.contains(&spec.trigger) {
        debug!(
            target: "folio.entrance",
            trigger = %spec.trigger,
            "reveal trigger not mounted, skipping"
        );
        return None;
    }
    let targets: Vec<ElementId> = spec
        .targets
        .iter()
        .filter(|t| layout.contains(t))
        .cloned()
        .collect();
    if targets.is_empty() {
        debug!(target: "folio.entrance", trigger = %spec.trigger, "no mounted reveal targets");
        return None;
    }

    let reveal = &spec.reveal;
    let timeline = controller.add(context, reveal.timeline(&targets), out);
    let queue = controller.queue();
    let toggle = reveal.toggle;
    let trigger_spec = TriggerSpec::new(spec.trigger.clone())
        .start(reveal.start)
        .end(reveal.end)
        .once(reveal.once);
    let handle = observer.create_trigger(
        layout,
        trigger_spec,
        move |event| {
            if let Some(control) = toggle.action_for(event).control() {
                queue.push(timeline, control);
            }
        },
        out,
    )?;
    if let Some(ctx) = context {
        controller.adopt_trigger(ctx, handle);
    }
    debug!(
        target: "folio.entrance",
        trigger = %spec.trigger,
        targets = targets.len(),
        ?timeline,
        "reveal registered"
    );
    Some(timeline)
}
