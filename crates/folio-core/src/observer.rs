#![forbid(unsafe_code)]

//! Scroll position observer: threshold triggers with enter/leave events.
//!
//! Each trigger watches one element between a start and an end [`Anchor`].
//! Geometry is resolved to two scroll offsets when the trigger is created and
//! on every [`ScrollObserver::refresh`]; [`ScrollObserver::update`] then only
//! compares numbers.
//!
//! # Regions and events
//!
//! | From \ To | Before | Active | After |
//! |-----------|--------|--------|-------|
//! | Before | - | `Enter` | `Enter`, `Leave` |
//! | Active | `LeaveBack` | - | `Leave` |
//! | After | `EnterBack`, `LeaveBack` | `EnterBack` | - |
//!
//! # Invariants
//!
//! 1. For every live trigger, `start <= end`.
//! 2. Events from one update are collected before any handler runs, then
//!    dispatched in registration order when scrolling forward and reverse
//!    registration order when scrolling backward.
//! 3. Handlers receive only the event; they cannot reach the observer, so
//!    dispatch never re-enters it.
//! 4. Document listeners are attached while at least one trigger is live and
//!    detached when the last one goes away (attach and detach strictly
//!    alternate).
//! 5. A `once` trigger delivers exactly one `Enter` and is then destroyed.
//!
//! # Failure Modes
//!
//! - Element missing at creation: no trigger, `None` handle.
//! - Element missing at refresh: the trigger is destroyed.
//! - Destroying an unknown or already destroyed handle: returns `false`.

use tracing::{debug, debug_span, trace};

use crate::geometry::{Anchor, Edge, ElementId};
use crate::host::{HostCommand, LayoutProbe};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// A threshold crossing reported to a trigger's handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TriggerEvent {
    /// Scrolling forward past the start.
    Enter,
    /// Scrolling forward past the end.
    Leave,
    /// Scrolling backward past the end.
    EnterBack,
    /// Scrolling backward past the start.
    LeaveBack,
}

impl TriggerEvent {
    /// `Enter` or `EnterBack`.
    #[must_use]
    pub const fn is_entering(self) -> bool {
        matches!(self, Self::Enter | Self::EnterBack)
    }
}

/// Handle to a registered trigger. Never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TriggerHandle(u64);

/// What a trigger watches.
#[derive(Debug, Clone, PartialEq)]
pub struct TriggerSpec {
    pub element: ElementId,
    pub start: Anchor,
    pub end: Anchor,
    /// Fire a single `Enter`, then self-destruct.
    pub once: bool,
}

impl TriggerSpec {
    /// Active while any part of the element is on screen
    /// (`"top bottom"` to `"bottom top"`).
    #[must_use]
    pub fn new(element: impl Into<ElementId>) -> Self {
        Self {
            element: element.into(),
            start: Anchor::new(Edge::Top, 1.0),
            end: Anchor::new(Edge::Bottom, 0.0),
            once: false,
        }
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
    pub fn once(mut self, once: bool) -> Self {
        self.once = once;
        self
    }
}

/// Trigger callback.
pub type TriggerHandler = Box<dyn FnMut(TriggerEvent)>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Region {
    Before,
    Active,
    After,
}

impl Region {
    fn classify(scroll_y: f64, start: f64, end: f64) -> Self {
        if scroll_y < start {
            Self::Before
        } else if scroll_y > end {
            Self::After
        } else {
            Self::Active
        }
    }

    fn transition(self, to: Self) -> &'static [TriggerEvent] {
        use TriggerEvent::{Enter, EnterBack, Leave, LeaveBack};
        match (self, to) {
            (Self::Before, Self::Active) => &[Enter],
            (Self::Before, Self::After) => &[Enter, Leave],
            (Self::Active, Self::After) => &[Leave],
            (Self::Active, Self::Before) => &[LeaveBack],
            (Self::After, Self::Active) => &[EnterBack],
            (Self::After, Self::Before) => &[EnterBack, LeaveBack],
            _ => &[],
        }
    }
}

struct Trigger {
    handle: TriggerHandle,
    spec: TriggerSpec,
    handler: TriggerHandler,
    start_px: f64,
    end_px: f64,
    region: Region,
}

impl std::fmt::Debug for Trigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Trigger")
            .field("handle", &self.handle)
            .field("element", &self.spec.element)
            .field("start_px", &self.start_px)
            .field("end_px", &self.end_px)
            .field("region", &self.region)
            .finish_non_exhaustive()
    }
}

/// Resolve anchors to scroll offsets; `None` if the element is not mounted.
fn resolve(layout: &dyn LayoutProbe, spec: &TriggerSpec) -> Option<(f64, f64)> {
    let rect = layout.rect(&spec.element)?;
    let vh = layout.viewport().height;
    let start = spec.start.scroll_position(&rect, vh);
    let end = spec.end.scroll_position(&rect, vh).max(start);
    Some((start, end))
}

/// Registry of scroll triggers.
#[derive(Debug, Default)]
pub struct ScrollObserver {
    /// Registration order (handles are monotonic, so also sorted by handle).
    triggers: Vec<Trigger>,
    next_handle: u64,
    last_scroll: Option<f64>,
    listeners_attached: bool,
    refresh_count: u64,
    dispatched: u64,
}

// ---------------------------------------------------------------------------
// Registration
// ---------------------------------------------------------------------------

impl ScrollObserver {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a trigger. The new trigger starts in the `Before` region and
    /// is evaluated on the next [`update`](Self::update) or
    /// [`refresh`](Self::refresh).
    pub fn create_trigger(
        &mut self,
        layout: &dyn LayoutProbe,
        spec: TriggerSpec,
        handler: impl FnMut(TriggerEvent) + 'static,
        out: &mut Vec<HostCommand>,
    ) -> Option<TriggerHandle> {
        let Some((start_px, end_px)) = resolve(layout, &spec) else {
            debug!(
                target: "folio.observer",
                element = %spec.element,
                "trigger element not mounted, skipping"
            );
            return None;
        };
        let handle = TriggerHandle(self.next_handle);
        self.next_handle += 1;
        debug!(
            target: "folio.observer",
            ?handle,
            element = %spec.element,
            start_px,
            end_px,
            once = spec.once,
            "trigger created"
        );
        self.triggers.push(Trigger {
            handle,
            spec,
            handler: Box::new(handler),
            start_px,
            end_px,
            region: Region::Before,
        });
        self.sync_listeners(out);
        Some(handle)
    }

    /// Unregister a trigger. Returns whether anything was removed.
    pub fn destroy(&mut self, handle: TriggerHandle, out: &mut Vec<HostCommand>) -> bool {
        let Ok(pos) = self.triggers.binary_search_by_key(&handle, |t| t.handle) else {
            return false;
        };
        self.triggers.remove(pos);
        debug!(target: "folio.observer", ?handle, "trigger destroyed");
        self.sync_listeners(out);
        true
    }

    /// Unregister every trigger.
    pub fn destroy_all(&mut self, out: &mut Vec<HostCommand>) {
        self.triggers.clear();
        self.sync_listeners(out);
    }

    fn sync_listeners(&mut self, out: &mut Vec<HostCommand>) {
        let want = !self.triggers.is_empty();
        if want == self.listeners_attached {
            return;
        }
        self.listeners_attached = want;
        if want {
            out.push(HostCommand::AttachDocumentListeners);
        } else {
            out.push(HostCommand::DetachDocumentListeners);
        }
    }
}

// ---------------------------------------------------------------------------
// Evaluation
// ---------------------------------------------------------------------------

impl ScrollObserver {
    /// Recompute every trigger's geometry from live layout, prune triggers
    /// whose element is gone, then evaluate against the current scroll.
    pub fn refresh(&mut self, layout: &dyn LayoutProbe, out: &mut Vec<HostCommand>) {
        let _span = debug_span!(
            target: "folio.observer",
            "observer.refresh",
            live = self.triggers.len() as u64
        )
        .entered();
        self.refresh_count += 1;
        let before = self.triggers.len();
        self.triggers.retain_mut(|t| match resolve(layout, &t.spec) {
            Some((start, end)) => {
                t.start_px = start;
                t.end_px = end;
                true
            }
            None => false,
        });
        let pruned = before - self.triggers.len();
        if pruned > 0 {
            debug!(target: "folio.observer", pruned, "pruned triggers of unmounted elements");
        }
        self.sync_listeners(out);
        self.update(layout.viewport().scroll_y, out);
    }

    /// Classify every trigger against `scroll_y` and dispatch transitions.
    pub fn update(&mut self, scroll_y: f64, out: &mut Vec<HostCommand>) {
        let backward = self.last_scroll.is_some_and(|last| scroll_y < last);
        self.last_scroll = Some(scroll_y);

        let mut fired: Vec<(usize, &'static [TriggerEvent])> = Vec::new();
        for (idx, t) in self.triggers.iter_mut().enumerate() {
            let region = Region::classify(scroll_y, t.start_px, t.end_px);
            let events = t.region.transition(region);
            t.region = region;
            if !events.is_empty() {
                fired.push((idx, events));
            }
        }
        if fired.is_empty() {
            return;
        }
        if backward {
            fired.reverse();
        }

        let mut spent: Vec<TriggerHandle> = Vec::new();
        for (idx, events) in fired {
            let t = &mut self.triggers[idx];
            for &event in events {
                if t.spec.once && event != TriggerEvent::Enter {
                    continue;
                }
                trace!(
                    target: "folio.observer",
                    handle = ?t.handle,
                    element = %t.spec.element,
                    ?event,
                    scroll_y,
                    "dispatch"
                );
                (t.handler)(event);
                self.dispatched += 1;
                if t.spec.once {
                    spent.push(t.handle);
                    break;
                }
            }
        }
        for handle in spent {
            self.destroy(handle, out);
        }
    }
}

// ---------------------------------------------------------------------------
// Introspection
// ---------------------------------------------------------------------------

impl ScrollObserver {
    /// Number of live triggers.
    #[must_use]
    pub fn live_count(&self) -> usize {
        self.triggers.len()
    }

    /// Number of completed `refresh` calls.
    #[must_use]
    pub fn refresh_count(&self) -> u64 {
        self.refresh_count
    }

    /// Total handler invocations.
    #[must_use]
    pub fn dispatched_count(&self) -> u64 {
        self.dispatched
    }

    #[must_use]
    pub fn listeners_attached(&self) -> bool {
        self.listeners_attached
    }

    #[must_use]
    pub fn is_live(&self, handle: TriggerHandle) -> bool {
        self.triggers
            .binary_search_by_key(&handle, |t| t.handle)
            .is_ok()
    }

    /// Resolved `(start, end)` scroll offsets of a live trigger.
    #[must_use]
    pub fn geometry(&self, handle: TriggerHandle) -> Option<(f64, f64)> {
        self.triggers
            .binary_search_by_key(&handle, |t| t.handle)
            .ok()
            .map(|i| (self.triggers[i].start_px, self.triggers[i].end_px))
    }

    /// Whether a live trigger is currently in its active region.
    #[must_use]
    pub fn is_active(&self, handle: TriggerHandle) -> bool {
        self.triggers
            .binary_search_by_key(&handle, |t| t.handle)
            .is_ok_and(|i| self.triggers[i].region == Region::Active)
    }
}
