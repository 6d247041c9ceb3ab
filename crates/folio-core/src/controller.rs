#![forbid(unsafe_code)]

//! Timeline controller: owns running timelines and their contexts.
//!
//! Trigger handlers never touch timelines directly. They post a
//! [`TimelineControl`] into the [`ControlQueue`] mailbox, and the scene calls
//! [`TimelineController::apply_queued`] once observer dispatch has finished.
//! Styles are written to the host as [`HostCommand::ApplyStyle`] whenever a
//! timeline's frame changes.
//!
//! An [`AnimationContext`] groups the timelines, triggers and styled elements
//! one component created under a DOM scope, so unmounting the component is a
//! single [`TimelineController::revert`].
//!
//! # Invariants
//!
//! 1. A timeline's `from` frame is written as soon as it is added.
//! 2. Controls for killed timelines are dropped silently.
//! 3. Reverting a context kills its timelines, destroys its triggers, clears
//!    every inline style it wrote, and drops the context, so a second revert
//!    is a no-op.

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::rc::Rc;
use std::time::Duration;

use tracing::{debug, trace};

use crate::animation::{Animation, Ease, Style, Timeline, Tween};
use crate::geometry::ElementId;
use crate::host::HostCommand;
use crate::observer::{ScrollObserver, TriggerHandle};

/// Handle to a timeline owned by the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimelineId(u64);

/// Handle to an animation context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContextId(u64);

/// Playback request for a timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimelineControl {
    Play,
    Reverse,
    Restart,
    Reset,
    Complete,
    Pause,
}

/// Shared mailbox for playback requests raised inside trigger handlers.
#[derive(Debug, Clone, Default)]
pub struct ControlQueue(Rc<RefCell<VecDeque<(TimelineId, TimelineControl)>>>);

impl ControlQueue {
    pub fn push(&self, timeline: TimelineId, control: TimelineControl) {
        self.0.borrow_mut().push_back((timeline, control));
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }

    fn drain(&self) -> Vec<(TimelineId, TimelineControl)> {
        self.0.borrow_mut().drain(..).collect()
    }
}

/// Everything one component animated under a DOM scope.
#[derive(Debug)]
pub struct AnimationContext {
    scope: ElementId,
    timelines: Vec<TimelineId>,
    triggers: Vec<TriggerHandle>,
    targets: BTreeSet<ElementId>,
}

impl AnimationContext {
    #[must_use]
    pub fn scope(&self) -> &ElementId {
        &self.scope
    }

    #[must_use]
    pub fn timelines(&self) -> &[TimelineId] {
        &self.timelines
    }

    #[must_use]
    pub fn triggers(&self) -> &[TriggerHandle] {
        &self.triggers
    }

}

#[derive(Debug)]
struct Managed {
    timeline: Timeline,
    /// The current frame has not been written to the host yet.
    dirty: bool,
}

/// Owner of all timelines and contexts.
#[derive(Debug, Default)]
pub struct TimelineController {
    timelines: BTreeMap<TimelineId, Managed>,
    contexts: BTreeMap<ContextId, AnimationContext>,
    queue: ControlQueue,
    next_timeline: u64,
    next_context: u64,
}

impl TimelineController {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A handle to the control mailbox for use inside trigger handlers.
    #[must_use]
    pub fn queue(&self) -> ControlQueue {
        self.queue.clone()
    }

    /// Open a context scoped to `scope`.
    pub fn create_context(&mut self, scope: ElementId) -> ContextId {
        let id = ContextId(self.next_context);
        self.next_context += 1;
        debug!(target: "folio.controller", ?id, %scope, "context created");
        self.contexts.insert(
            id,
            AnimationContext {
                scope,
                timelines: Vec::new(),
                triggers: Vec::new(),
                targets: BTreeSet::new(),
            },
        );
        id
    }

    /// A live context; `None` once reverted.
    #[must_use]
    pub fn context(&self, id: ContextId) -> Option<&AnimationContext> {
        self.contexts.get(&id)
    }

    /// Whether `id` was created here and has since been reverted.
    #[must_use]
    pub fn is_reverted(&self, id: ContextId) -> bool {
        id.0 < self.next_context && !self.contexts.contains_key(&id)
    }

    #[must_use]
    pub fn context_count(&self) -> usize {
        self.contexts.len()
    }

    /// Take ownership of `timeline`, writing its first frame immediately.
    pub fn add(
        &mut self,
        context: Option<ContextId>,
        timeline: Timeline,
        out: &mut Vec<HostCommand>,
    ) -> TimelineId {
        let id = TimelineId(self.next_timeline);
        self.next_timeline += 1;
        for (target, style) in timeline.styles() {
            out.push(HostCommand::ApplyStyle {
                element: target.clone(),
                style,
            });
        }
        if let Some(ctx) = context.and_then(|c| self.contexts.get_mut(&c)) {
            ctx.timelines.push(id);
            ctx.targets.extend(timeline.targets().cloned());
        }
        self.timelines.insert(
            id,
            Managed {
                timeline,
                dirty: false,
            },
        );
        id
    }

    /// Animate one element from `from` to `to` right away.
    pub fn animate(
        &mut self,
        context: Option<ContextId>,
        target: ElementId,
        from: Style,
        to: Style,
        duration: Duration,
        ease: Ease,
        out: &mut Vec<HostCommand>,
    ) -> TimelineId {
        let timeline = Timeline::new().add(Duration::ZERO, target, Tween::new(from, to, duration, ease));
        let id = self.add(context, timeline, out);
        self.control(id, TimelineControl::Play);
        id
    }

    /// Record a trigger as belonging to `context` so revert destroys it.
    pub fn adopt_trigger(&mut self, context: ContextId, trigger: TriggerHandle) {
        if let Some(ctx) = self.contexts.get_mut(&context) {
            ctx.triggers.push(trigger);
        }
    }

    /// Apply a control now. Returns `false` for unknown timelines.
    pub fn control(&mut self, id: TimelineId, control: TimelineControl) -> bool {
        let Some(managed) = self.timelines.get_mut(&id) else {
            return false;
        };
        let tl = &mut managed.timeline;
        match control {
            TimelineControl::Play => tl.play(),
            TimelineControl::Reverse => tl.reverse(),
            TimelineControl::Restart => tl.restart(),
            TimelineControl::Reset => tl.reset(),
            TimelineControl::Complete => tl.complete(),
            TimelineControl::Pause => tl.pause(),
        }
        managed.dirty = true;
        trace!(target: "folio.controller", ?id, ?control, "control applied");
        true
    }

    /// Apply every control posted to the mailbox, in posting order.
    pub fn apply_queued(&mut self) -> usize {
        let pending = self.queue.drain();
        let count = pending.len();
        for (id, control) in pending {
            self.control(id, control);
        }
        count
    }

    /// Advance playing timelines by `dt` and write changed frames.
    pub fn tick(&mut self, dt: Duration, out: &mut Vec<HostCommand>) {
        for managed in self.timelines.values_mut() {
            if managed.timeline.is_playing() {
                managed.timeline.tick(dt);
                managed.dirty = true;
            }
            if std::mem::take(&mut managed.dirty) {
                for (target, style) in managed.timeline.styles() {
                    out.push(HostCommand::ApplyStyle {
                        element: target.clone(),
                        style,
                    });
                }
            }
        }
    }

    /// Drop a timeline without touching its styles.
    pub fn kill(&mut self, id: TimelineId) -> bool {
        self.timelines.remove(&id).is_some()
    }

    /// Kill the context's timelines, destroy its triggers and clear its
    /// inline styles. Returns `false` if already reverted or unknown.
    pub fn revert(
        &mut self,
        context: ContextId,
        observer: &mut ScrollObserver,
        out: &mut Vec<HostCommand>,
    ) -> bool {
        let Some(ctx) = self.contexts.remove(&context) else {
            return false;
        };
        for handle in ctx.triggers {
            observer.destroy(handle, out);
        }
        for id in ctx.timelines {
            self.timelines.remove(&id);
        }
        for element in ctx.targets {
            out.push(HostCommand::ClearStyle { element });
        }
        debug!(target: "folio.controller", ?context, scope = %ctx.scope, "context reverted");
        true
    }

    /// Revert every context.
    pub fn revert_all(&mut self, observer: &mut ScrollObserver, out: &mut Vec<HostCommand>) {
        let ids: Vec<ContextId> = self.contexts.keys().copied().collect();
        for id in ids {
            self.revert(id, observer, out);
        }
    }

    #[must_use]
    pub fn timeline(&self, id: TimelineId) -> Option<&Timeline> {
        self.timelines.get(&id).map(|m| &m.timeline)
    }

    /// Whether any timeline is playing or has an unwritten frame.
    #[must_use]
    pub fn is_animating(&self) -> bool {
        !self.queue.is_empty()
            || self
                .timelines
                .values()
                .any(|m| m.dirty || m.timeline.is_playing())
    }

    #[must_use]
    pub fn timeline_count(&self) -> usize {
        self.timelines.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::PlaybackState;
    use crate::geometry::{Rect, Viewport};
    use crate::host::LayoutProbe;
    use crate::observer::TriggerSpec;

    const MS_100: Duration = Duration::from_millis(100);

    struct OneElement;

    impl LayoutProbe for OneElement {
        fn rect(&self, element: &ElementId) -> Option<Rect> {
            (element.as_str() == "about").then_some(Rect::new(0.0, 1000.0, 1280.0, 800.0))
        }
        fn viewport(&self) -> Viewport {
            Viewport::new(1280.0, 800.0, 4000.0)
        }
        fn pending_images(&self, _scope: Option<&ElementId>) -> Vec<ElementId> {
            Vec::new()
        }
    }

    fn fade(target: &str) -> Timeline {
        Timeline::new().add(
            Duration::ZERO,
            ElementId::new(target),
            Tween::new(Style::HIDDEN, Style::RESTING, Duration::from_millis(200), Ease::Linear),
        )
    }

    fn styles_for<'a>(out: &'a [HostCommand], id: &str) -> Vec<&'a Style> {
        out.iter()
            .filter_map(|c| match c {
                HostCommand::ApplyStyle { element, style } if element.as_str() == id => Some(style),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn add_writes_initial_frame() {
        let mut ctl = TimelineController::new();
        let mut out = Vec::new();
        ctl.add(None, fade("title"), &mut out);
        assert_eq!(styles_for(&out, "title"), vec![&Style::HIDDEN]);
    }

    #[test]
    fn queued_controls_apply_after_drain() {
        let mut ctl = TimelineController::new();
        let mut out = Vec::new();
        let id = ctl.add(None, fade("title"), &mut out);
        let q = ctl.queue();
        q.push(id, TimelineControl::Play);
        assert_eq!(ctl.timeline(id).unwrap().state(), PlaybackState::Idle);
        assert_eq!(ctl.apply_queued(), 1);
        assert!(q.is_empty());
        assert_eq!(ctl.timeline(id).unwrap().state(), PlaybackState::Playing);
    }

    #[test]
    fn tick_writes_frames_until_finished() {
        let mut ctl = TimelineController::new();
        let mut out = Vec::new();
        let id = ctl.add(None, fade("title"), &mut out);
        ctl.control(id, TimelineControl::Play);
        out.clear();
        ctl.tick(MS_100, &mut out);
        ctl.tick(MS_100, &mut out);
        let frames = styles_for(&out, "title");
        assert_eq!(frames.len(), 2);
        assert_eq!(*frames[1], Style::RESTING);
        assert!(!ctl.is_animating());
        out.clear();
        ctl.tick(MS_100, &mut out);
        assert!(out.is_empty());
    }

    #[test]
    fn reset_writes_from_frame_once() {
        let mut ctl = TimelineController::new();
        let mut out = Vec::new();
        let id = ctl.add(None, fade("title"), &mut out);
        ctl.control(id, TimelineControl::Complete);
        ctl.tick(MS_100, &mut out);
        ctl.control(id, TimelineControl::Reset);
        out.clear();
        ctl.tick(MS_100, &mut out);
        assert_eq!(styles_for(&out, "title"), vec![&Style::HIDDEN]);
    }

    #[test]
    fn animate_plays_immediately() {
        let mut ctl = TimelineController::new();
        let mut out = Vec::new();
        let id = ctl.animate(
            None,
            ElementId::new("badge"),
            Style::HIDDEN,
            Style::RESTING,
            MS_100,
            Ease::Power2Out,
            &mut out,
        );
        assert!(ctl.timeline(id).unwrap().is_playing());
    }

    #[test]
    fn unknown_or_killed_timeline_controls_are_dropped() {
        let mut ctl = TimelineController::new();
        let mut out = Vec::new();
        let id = ctl.add(None, fade("x"), &mut out);
        assert!(ctl.kill(id));
        assert!(!ctl.kill(id));
        ctl.queue().push(id, TimelineControl::Play);
        assert_eq!(ctl.apply_queued(), 1);
        assert!(!ctl.control(id, TimelineControl::Play));
    }

    #[test]
    fn revert_is_complete_and_idempotent() {
        let layout = OneElement;
        let mut ctl = TimelineController::new();
        let mut obs = ScrollObserver::new();
        let mut out = Vec::new();
        let ctx = ctl.create_context(ElementId::new("about"));
        let id = ctl.add(Some(ctx), fade("about-title"), &mut out);
        let trigger = obs
            .create_trigger(&layout, TriggerSpec::new("about"), |_| {}, &mut out)
            .unwrap();
        ctl.adopt_trigger(ctx, trigger);
        out.clear();

        assert!(ctl.revert(ctx, &mut obs, &mut out));
        assert!(ctl.timeline(id).is_none());
        assert!(!obs.is_live(trigger));
        assert!(out.contains(&HostCommand::ClearStyle {
            element: ElementId::new("about-title")
        }));
        assert!(out.contains(&HostCommand::DetachDocumentListeners));
        assert!(ctl.is_reverted(ctx));
        assert!(ctl.context(ctx).is_none());
        assert_eq!(ctl.context_count(), 0);

        out.clear();
        assert!(!ctl.revert(ctx, &mut obs, &mut out));
        assert!(out.is_empty());
    }
}
