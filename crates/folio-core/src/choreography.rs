#![forbid(unsafe_code)]

//! Per-section reveal bundles, plus the home intro that plays on load.
//!
//! Element ids follow the page markup:
//!
//! | Section | Element | Reveal |
//! |---------|---------|--------|
//! | home | `home-gallery` | intro: fade up from scale 0.95 |
//! | home | `home-title` | intro: drop in from `y -50` |
//! | home | `home-typewriter`, `home-desc` | intro: slide from left |
//! | home | `home-buttons` | intro: rise with `back.out(1.4)` |
//! | home | `home-social` > `home-social-{name}` | intro: pop in, staggered |
//! | about | `about-title` | title |
//! | about | `about-bio` | slide from left |
//! | about | `skill-title-{n}` | skill title, one trigger each |
//! | about | `about-skills` > `skill-card-{n}` | skill cards, staggered |
//! | about | `about-timeline` | slide from right |
//! | projects | `projects-title` | title |
//! | projects | `projects-grid` > `card-{id}` | project cards, once |
//! | contact | `contact-title` | title |
//! | contact | `contact-content` | slide from left |
//! | contact | `contact-form` | slide from right |
//! | contact | `contact-social` > `social-{name}` | social links, staggered |
//!
//! Each bundle mounts into its own [`AnimationContext`](crate::controller::AnimationContext)
//! scoped to the section element, so reverting the section undoes all of it.
//! The home intro is not scroll driven: [`IntroSequence`] builds one timeline
//! whose steps overlap the way the page's entrance reads, and plays it at once.

use std::time::Duration;

use tracing::debug;

use crate::animation::{Ease, Style, Timeline, Tween, stagger_offsets};
use crate::controller::{ContextId, TimelineControl, TimelineController, TimelineId};
use crate::entrance::{Reveal, RevealSpec, register_reveal};
use crate::geometry::ElementId;
use crate::host::{HostCommand, LayoutProbe};
use crate::observer::ScrollObserver;
use crate::snap::Card;

/// Container whose children are the project cards.
pub const PROJECT_GRID: &str = "projects-grid";

/// The reveals of one section.
#[derive(Debug, Clone, PartialEq)]
pub struct SectionChoreography {
    pub scope: ElementId,
    pub reveals: Vec<RevealSpec>,
}

/// A mounted bundle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountedChoreography {
    pub context: ContextId,
    /// Timelines that registered; unmounted elements are absent.
    pub timelines: Vec<TimelineId>,
}

fn numbered(prefix: &str, count: usize) -> Vec<ElementId> {
    (0..count)
        .map(|n| ElementId::new(format!("{prefix}-{n}")))
        .collect()
}

impl SectionChoreography {
    #[must_use]
    pub fn new(scope: impl Into<ElementId>) -> Self {
        Self {
            scope: scope.into(),
            reveals: Vec::new(),
        }
    }

    #[must_use]
    pub fn with(mut self, reveal: RevealSpec) -> Self {
        self.reveals.push(reveal);
        self
    }

    /// Bio, skill groups, work timeline.
    #[must_use]
    pub fn about(skill_groups: usize, skill_cards: usize) -> Self {
        let mut bundle = Self::new("about")
            .with(RevealSpec::single("about-title", Reveal::title()))
            .with(RevealSpec::single("about-bio", Reveal::slide_from_left()));
        for title in numbered("skill-title", skill_groups) {
            bundle = bundle.with(RevealSpec::single(title, Reveal::skill_title()));
        }
        bundle
            .with(RevealSpec::new(
                "about-skills",
                numbered("skill-card", skill_cards),
                Reveal::skill_cards(),
            ))
            .with(RevealSpec::single("about-timeline", Reveal::slide_from_right()))
    }

    /// Heading only. The card grid loads asynchronously; see
    /// [`SectionChoreography::project_grid`].
    #[must_use]
    pub fn projects() -> Self {
        Self::new("projects").with(RevealSpec::single("projects-title", Reveal::title()))
    }

    /// Staggered reveal for the loaded project cards.
    #[must_use]
    pub fn project_grid(cards: &[Card]) -> RevealSpec {
        RevealSpec::new(
            PROJECT_GRID,
            cards.iter().map(Card::element_id).collect(),
            Reveal::project_cards(),
        )
    }

    /// Intro copy, form, social links.
    #[must_use]
    pub fn contact<S: AsRef<str>>(social: &[S]) -> Self {
        let links = social
            .iter()
            .map(|name| ElementId::new(format!("social-{}", name.as_ref())))
            .collect();
        Self::new("contact")
            .with(RevealSpec::single("contact-title", Reveal::title()))
            .with(RevealSpec::single("contact-content", Reveal::slide_from_left()))
            .with(RevealSpec::single("contact-form", Reveal::slide_from_right()))
            .with(RevealSpec::new("contact-social", links, Reveal::social_links()))
    }

    /// Register every reveal inside a fresh context.
    pub fn mount(
        &self,
        controller: &mut TimelineController,
        observer: &mut ScrollObserver,
        layout: &dyn LayoutProbe,
        out: &mut Vec<HostCommand>,
    ) -> MountedChoreography {
        let context = controller.create_context(self.scope.clone());
        let timelines: Vec<TimelineId> = self
            .reveals
            .iter()
            .filter_map(|spec| register_reveal(controller, observer, layout, Some(context), spec, out))
            .collect();
        debug!(
            target: "folio.choreography",
            scope = %self.scope,
            registered = timelines.len(),
            declared = self.reveals.len(),
            "section choreography mounted"
        );
        MountedChoreography { context, timelines }
    }
}

// ---------------------------------------------------------------------------
// Intro sequence
// ---------------------------------------------------------------------------

/// Where an intro step starts, relative to the end of everything before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position {
    /// Right after the previous steps end.
    End,
    /// This long before the previous steps end (`"-=0.4"`).
    Overlap(Duration),
}

/// One tween (or a staggered group) in an [`IntroSequence`].
#[derive(Debug, Clone, PartialEq)]
pub struct IntroStep {
    pub targets: Vec<ElementId>,
    pub from: Style,
    pub to: Style,
    pub duration: Duration,
    pub ease: Ease,
    pub stagger: Duration,
    pub position: Position,
}

impl IntroStep {
    #[must_use]
    pub fn new(target: impl Into<ElementId>, from: Style, duration: Duration, ease: Ease) -> Self {
        Self {
            targets: vec![target.into()],
            from,
            to: Style::RESTING,
            duration,
            ease,
            stagger: Duration::ZERO,
            position: Position::End,
        }
    }

    #[must_use]
    pub fn overlap(mut self, overlap: Duration) -> Self {
        self.position = Position::Overlap(overlap);
        self
    }

    /// Animate `targets` instead, item `i` delayed by `i * stagger`.
    #[must_use]
    pub fn staggered(mut self, targets: Vec<ElementId>, stagger: Duration) -> Self {
        self.targets = targets;
        self.stagger = stagger;
        self
    }

    /// Length of the step including its stagger.
    #[must_use]
    pub fn span(&self) -> Duration {
        let offsets = stagger_offsets(self.targets.len(), self.stagger);
        offsets.last().copied().unwrap_or_default() + self.duration
    }
}

/// A load-time entrance: sequenced steps played once, in one context.
#[derive(Debug, Clone, PartialEq)]
pub struct IntroSequence {
    pub scope: ElementId,
    pub steps: Vec<IntroStep>,
}

impl IntroSequence {
    #[must_use]
    pub fn new(scope: impl Into<ElementId>) -> Self {
        Self {
            scope: scope.into(),
            steps: Vec::new(),
        }
    }

    #[must_use]
    pub fn then(mut self, step: IntroStep) -> Self {
        self.steps.push(step);
        self
    }

    /// Gallery, heading, typewriter line, blurb, buttons, social links.
    /// Everything eases `power3.out` unless noted.
    #[must_use]
    pub fn home<S: AsRef<str>>(social: &[S]) -> Self {
        let ms = Duration::from_millis;
        let links = social
            .iter()
            .map(|name| ElementId::new(format!("home-social-{}", name.as_ref())))
            .collect();
        Self::new("home")
            .then(IntroStep::new("home-gallery", Style::HIDDEN.with_scale(0.95), ms(1000), Ease::Power3Out))
            .then(IntroStep::new("home-title", Style::HIDDEN.with_y(-50.0), ms(800), Ease::Power3Out).overlap(ms(600)))
            .then(
                IntroStep::new("home-typewriter", Style::HIDDEN.with_x(-50.0), ms(800), Ease::Power3Out)
                    .overlap(ms(400)),
            )
            .then(IntroStep::new("home-desc", Style::HIDDEN.with_x(-50.0), ms(800), Ease::Power3Out).overlap(ms(400)))
            .then(
                IntroStep::new("home-buttons", Style::HIDDEN.with_y(30.0), ms(800), Ease::BackOut(1.4))
                    .overlap(ms(400)),
            )
            .then(
                IntroStep::new("home-social", Style::HIDDEN.with_scale(0.5), ms(600), Ease::Power3Out)
                    .staggered(links, ms(100))
                    .overlap(ms(300)),
            )
    }

    /// Start offset of every step.
    #[must_use]
    pub fn offsets(&self) -> Vec<Duration> {
        let mut end = Duration::ZERO;
        self.steps
            .iter()
            .map(|step| {
                let start = match step.position {
                    Position::End => end,
                    Position::Overlap(overlap) => end.saturating_sub(overlap),
                };
                end = end.max(start + step.span());
                start
            })
            .collect()
    }

    /// The sequence as one timeline. Unmounted targets are left out; the
    /// remaining steps keep their timing.
    #[must_use]
    pub fn timeline(&self, layout: &dyn LayoutProbe) -> Timeline {
        let mut timeline = Timeline::new();
        for (step, start) in self.steps.iter().zip(self.offsets()) {
            let offsets = stagger_offsets(step.targets.len(), step.stagger);
            for (target, delay) in step.targets.iter().zip(offsets) {
                if !layout.contains(target) {
                    continue;
                }
                let tween = Tween::new(step.from, step.to, step.duration, step.ease);
                timeline = timeline.add(start + delay, target.clone(), tween);
            }
        }
        timeline
    }

    /// Write every from-frame and start playing, inside a fresh context.
    pub fn mount(
        &self,
        controller: &mut TimelineController,
        layout: &dyn LayoutProbe,
        out: &mut Vec<HostCommand>,
    ) -> MountedChoreography {
        let context = controller.create_context(self.scope.clone());
        let timeline = self.timeline(layout);
        let mut timelines = Vec::new();
        if timeline.event_count() > 0 {
            let id = controller.add(Some(context), timeline, out);
            controller.control(id, TimelineControl::Play);
            timelines.push(id);
        }
        debug!(
            target: "folio.choreography",
            scope = %self.scope,
            steps = self.steps.len(),
            "intro started"
        );
        MountedChoreography { context, timelines }
    }
}
