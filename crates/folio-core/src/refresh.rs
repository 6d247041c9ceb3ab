#![forbid(unsafe_code)]

//! Refresh coordinator: decides when trigger geometry must be recomputed.
//!
//! Anything that can move content (images decoding, web fonts swapping in,
//! cards being added, containers resizing) funnels through here and ends in
//! a *debounced* refresh request. The coordinator never measures or
//! recomputes anything itself; it raises a flag the scene consumes with
//! [`RefreshCoordinator::take_refresh`].
//!
//! # Invariants
//!
//! 1. At most one debounced refresh is pending; a new request cancels and
//!    replaces it, so a burst of requests yields one refresh `debounce` after
//!    the last request.
//! 2. Every [`PendingOpId`] resolves exactly once, and its resolution always
//!    issues a debounced refresh.
//! 3. A disposed watch never runs its callback again.
//!
//! # Failure Modes
//!
//! - Image error: counts as settled.
//! - Font loading API missing: resolve after `font_fallback`.
//! - Container missing: the image wait covers no images and resolves at once.

use std::collections::BTreeMap;
use std::time::Duration;

use ahash::AHashSet;
use tracing::{debug, trace, warn};

use crate::geometry::ElementId;
use crate::host::{HostCommand, LayoutProbe};
use crate::timer::{TimerId, TimerQueue};

/// Handle to a resize or mutation watch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WatchId(u64);

impl WatchId {
    /// Rebuild a handle from its raw value (host round trips).
    #[must_use]
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

/// Handle to an asynchronous wait that ends in a refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PendingOpId(u64);

/// Progress of a [`PendingOpId`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpStatus {
    Pending,
    Resolved,
    /// Never issued by this coordinator.
    Unknown,
}

/// The debounce token for the single pending refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingRefresh {
    pub timer: TimerId,
    pub due: Duration,
}

/// Delays used by the coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshTimings {
    pub debounce: Duration,
    pub dom_settle: Duration,
    pub font_fallback: Duration,
    pub mutation_debounce: Duration,
}

impl Default for RefreshTimings {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(100),
            dom_settle: Duration::from_millis(50),
            font_fallback: Duration::from_millis(1000),
            mutation_debounce: Duration::from_millis(200),
        }
    }
}

/// Counters for tests and diagnostics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RefreshStats {
    /// Debounced requests received.
    pub requested: u64,
    /// Requests that replaced a still-pending one.
    pub coalesced: u64,
    /// Refreshes handed to the scene (debounced and immediate).
    pub issued: u64,
}

/// Watch callback, run after the refresh request it triggered.
pub type WatchCallback = Box<dyn FnMut()>;

#[derive(Debug)]
enum Task {
    Refresh,
    DomSettle(PendingOpId),
    FontFallback(PendingOpId),
    MutationBurst(WatchId),
}

#[derive(Debug)]
enum Stage {
    SettlingDom { container: Option<ElementId> },
    AwaitingImages { remaining: AHashSet<ElementId> },
    AwaitingFonts { fallback: Option<TimerId> },
}

enum WatchKind {
    Resize,
    Mutation {
        debounce: Duration,
        burst: Option<TimerId>,
    },
}

struct Watch {
    element: ElementId,
    kind: WatchKind,
    callback: Option<WatchCallback>,
}

/// Debounced, asset-aware refresh scheduling.
pub struct RefreshCoordinator {
    timings: RefreshTimings,
    timers: TimerQueue<Task>,
    pending: Option<PendingRefresh>,
    refresh_due: bool,
    ops: BTreeMap<PendingOpId, Stage>,
    newly_resolved: Vec<PendingOpId>,
    watches: BTreeMap<WatchId, Watch>,
    next_op: u64,
    next_watch: u64,
    stats: RefreshStats,
}

impl std::fmt::Debug for RefreshCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefreshCoordinator")
            .field("pending", &self.pending)
            .field("ops", &self.ops.len())
            .field("watches", &self.watches.len())
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}

impl RefreshCoordinator {
    #[must_use]
    pub fn new(timings: RefreshTimings) -> Self {
        Self {
            timings,
            timers: TimerQueue::new(),
            pending: None,
            refresh_due: false,
            ops: BTreeMap::new(),
            newly_resolved: Vec::new(),
            watches: BTreeMap::new(),
            next_op: 0,
            next_watch: 0,
            stats: RefreshStats::default(),
        }
    }

    #[must_use]
    pub fn timings(&self) -> RefreshTimings {
        self.timings
    }

    // -----------------------------------------------------------------------
    // Refresh requests
    // -----------------------------------------------------------------------

    /// Request a refresh `debounce` from `now`, replacing any pending one.
    pub fn refresh_debounced(&mut self, now: Duration) {
        self.stats.requested += 1;
        if let Some(prev) = self.pending.take() {
            self.timers.cancel(prev.timer);
            self.stats.coalesced += 1;
        }
        let due = now + self.timings.debounce;
        let timer = self.timers.schedule(due, Task::Refresh);
        self.pending = Some(PendingRefresh { timer, due });
        trace!(target: "folio.refresh", ?due, "refresh debounced");
    }

    /// Cancel the pending refresh and request one right now.
    pub fn refresh_immediate(&mut self) {
        self.cleanup();
        self.issue();
    }

    /// Cancel the pending debounced refresh, if any.
    pub fn cleanup(&mut self) {
        if let Some(prev) = self.pending.take() {
            self.timers.cancel(prev.timer);
        }
    }

    fn issue(&mut self) {
        self.refresh_due = true;
        self.stats.issued += 1;
    }

    /// Consume the "recompute now" flag.
    pub fn take_refresh(&mut self) -> bool {
        std::mem::take(&mut self.refresh_due)
    }

    #[must_use]
    pub fn pending_refresh(&self) -> Option<PendingRefresh> {
        self.pending
    }

    // -----------------------------------------------------------------------
    // Asynchronous waits
    // -----------------------------------------------------------------------

    fn new_op(&mut self) -> PendingOpId {
        let id = PendingOpId(self.next_op);
        self.next_op += 1;
        id
    }

    /// Callers hold `op` pending: either still in `ops` or just taken out.
    fn resolve(&mut self, op: PendingOpId, now: Duration) {
        self.ops.remove(&op);
        debug!(target: "folio.refresh", ?op, "pending op resolved");
        self.newly_resolved.push(op);
        self.refresh_debounced(now);
    }

    /// Ops resolved since the last call, in resolution order.
    pub fn drain_resolved(&mut self) -> Vec<PendingOpId> {
        std::mem::take(&mut self.newly_resolved)
    }

    /// Ids are issued in order and only leave `ops` by resolving, so any
    /// issued id that is no longer waiting has resolved.
    #[must_use]
    pub fn status(&self, op: PendingOpId) -> OpStatus {
        if self.ops.contains_key(&op) {
            OpStatus::Pending
        } else if op.0 < self.next_op {
            OpStatus::Resolved
        } else {
            OpStatus::Unknown
        }
    }

    fn await_images(
        &mut self,
        op: PendingOpId,
        layout: &dyn LayoutProbe,
        scope: Option<&ElementId>,
        now: Duration,
        out: &mut Vec<HostCommand>,
    ) {
        let images = layout.pending_images(scope);
        if images.is_empty() {
            self.resolve(op, now);
            return;
        }
        debug!(
            target: "folio.refresh",
            ?op,
            count = images.len(),
            "waiting for images"
        );
        out.push(HostCommand::AwaitImages {
            images: images.clone(),
        });
        self.ops.insert(
            op,
            Stage::AwaitingImages {
                remaining: images.into_iter().collect(),
            },
        );
    }

    /// Refresh once every incomplete image in `scope` (or the whole
    /// document) has loaded or failed.
    pub fn refresh_after_images(
        &mut self,
        layout: &dyn LayoutProbe,
        scope: Option<&ElementId>,
        now: Duration,
        out: &mut Vec<HostCommand>,
    ) -> PendingOpId {
        let op = self.new_op();
        self.await_images(op, layout, scope, now, out);
        op
    }

    /// An image reported load or error.
    pub fn image_settled(&mut self, image: &ElementId, now: Duration) {
        let mut done = Vec::new();
        for (op, stage) in &mut self.ops {
            if let Stage::AwaitingImages { remaining } = stage {
                if remaining.remove(image) && remaining.is_empty() {
                    done.push(*op);
                }
            }
        }
        for op in done {
            self.resolve(op, now);
        }
    }

    /// Refresh once web fonts are ready, or after `font_fallback` when the
    /// font loading API is unavailable.
    pub fn refresh_after_fonts(
        &mut self,
        layout: &dyn LayoutProbe,
        now: Duration,
        out: &mut Vec<HostCommand>,
    ) -> PendingOpId {
        let op = self.new_op();
        let fallback = if layout.fonts_api_available() {
            out.push(HostCommand::AwaitFonts);
            None
        } else {
            warn!(
                target: "folio.refresh",
                "font loading API unavailable, falling back to timer"
            );
            Some(
                self.timers
                    .schedule(now + self.timings.font_fallback, Task::FontFallback(op)),
            )
        };
        self.ops.insert(op, Stage::AwaitingFonts { fallback });
        op
    }

    /// `document.fonts.ready` resolved.
    pub fn fonts_ready(&mut self, now: Duration) {
        let waiting: Vec<(PendingOpId, Option<TimerId>)> = self
            .ops
            .iter()
            .filter_map(|(op, stage)| match stage {
                Stage::AwaitingFonts { fallback } => Some((*op, *fallback)),
                _ => None,
            })
            .collect();
        for (op, fallback) in waiting {
            if let Some(timer) = fallback {
                self.timers.cancel(timer);
            }
            self.resolve(op, now);
        }
    }

    /// Run `mutator` (the content change) synchronously, let the DOM settle,
    /// wait for the container's images, then refresh.
    ///
    /// This is the only sanctioned path for changes that move content.
    pub fn refresh_after_dynamic_content<R>(
        &mut self,
        mutator: impl FnOnce() -> R,
        container: Option<ElementId>,
        now: Duration,
    ) -> (PendingOpId, R) {
        let result = mutator();
        let op = self.new_op();
        self.timers
            .schedule(now + self.timings.dom_settle, Task::DomSettle(op));
        debug!(target: "folio.refresh", ?op, ?container, "content mutated, settling");
        self.ops.insert(op, Stage::SettlingDom { container });
        (op, result)
    }

    // -----------------------------------------------------------------------
    // Watches
    // -----------------------------------------------------------------------

    fn new_watch(&mut self, element: ElementId, kind: WatchKind, callback: Option<WatchCallback>) -> WatchId {
        let id = WatchId(self.next_watch);
        self.next_watch += 1;
        self.watches.insert(
            id,
            Watch {
                element,
                kind,
                callback,
            },
        );
        id
    }

    /// Observe size changes of `element`; each change requests a debounced
    /// refresh and then runs `callback`.
    pub fn observe_resize(
        &mut self,
        element: ElementId,
        callback: Option<WatchCallback>,
        out: &mut Vec<HostCommand>,
    ) -> WatchId {
        let id = self.new_watch(element.clone(), WatchKind::Resize, callback);
        out.push(HostCommand::ObserveResize { watch: id, element });
        id
    }

    /// The host's `ResizeObserver` reported a change.
    pub fn resize_observed(&mut self, watch: WatchId, now: Duration) {
        if !self.watches.contains_key(&watch) {
            return;
        }
        self.refresh_debounced(now);
        if let Some(cb) = self.watches.get_mut(&watch).and_then(|w| w.callback.as_mut()) {
            cb();
        }
    }

    /// Observe structural changes of `element`; bursts closer together than
    /// `debounce` (default `mutation_debounce`) coalesce into one refresh
    /// request followed by `callback`.
    pub fn observe_content_mutation(
        &mut self,
        element: ElementId,
        callback: Option<WatchCallback>,
        debounce: Option<Duration>,
        out: &mut Vec<HostCommand>,
    ) -> WatchId {
        let debounce = debounce.unwrap_or(self.timings.mutation_debounce);
        let id = self.new_watch(
            element.clone(),
            WatchKind::Mutation {
                debounce,
                burst: None,
            },
            callback,
        );
        out.push(HostCommand::ObserveMutations { watch: id, element });
        id
    }

    /// The host's `MutationObserver` reported records.
    pub fn mutation_observed(&mut self, watch: WatchId, now: Duration) {
        let Some(Watch {
            kind: WatchKind::Mutation { debounce, burst },
            ..
        }) = self.watches.get_mut(&watch)
        else {
            return;
        };
        if let Some(prev) = burst.take() {
            self.timers.cancel(prev);
        }
        *burst = Some(self.timers.schedule(now + *debounce, Task::MutationBurst(watch)));
    }

    /// Stop a watch. Returns `false` if it was already disposed.
    pub fn dispose_watch(&mut self, watch: WatchId, out: &mut Vec<HostCommand>) -> bool {
        let Some(w) = self.watches.remove(&watch) else {
            return false;
        };
        match w.kind {
            WatchKind::Resize => out.push(HostCommand::UnobserveResize { watch }),
            WatchKind::Mutation { burst, .. } => {
                if let Some(timer) = burst {
                    self.timers.cancel(timer);
                }
                out.push(HostCommand::UnobserveMutations { watch });
            }
        }
        debug!(target: "folio.refresh", ?watch, element = %w.element, "watch disposed");
        true
    }

    #[must_use]
    pub fn watch_count(&self) -> usize {
        self.watches.len()
    }

    // -----------------------------------------------------------------------
    // Time
    // -----------------------------------------------------------------------

    #[must_use]
    pub fn next_deadline(&self) -> Option<Duration> {
        self.timers.next_deadline()
    }

    /// Fire every timer due at or before `now`. Follow-up timers are based
    /// on each timer's own deadline, so catching up late gives the same
    /// result as ticking on time.
    pub fn fire_due(&mut self, now: Duration, layout: &dyn LayoutProbe, out: &mut Vec<HostCommand>) {
        while let Some((_, due, task)) = self.timers.pop_due(now) {
            match task {
                Task::Refresh => {
                    self.pending = None;
                    self.issue();
                }
                Task::DomSettle(op) => match self.ops.remove(&op) {
                    Some(Stage::SettlingDom {
                        container: Some(container),
                    }) => self.await_images(op, layout, Some(&container), due, out),
                    Some(_) => self.resolve(op, due),
                    None => {}
                },
                Task::FontFallback(op) => {
                    if self.ops.contains_key(&op) {
                        debug!(target: "folio.refresh", ?op, "font fallback elapsed");
                        self.resolve(op, due);
                    }
                }
                Task::MutationBurst(watch) => {
                    let Some(w) = self.watches.get_mut(&watch) else {
                        continue;
                    };
                    if let WatchKind::Mutation { burst, .. } = &mut w.kind {
                        *burst = None;
                    }
                    self.refresh_debounced(due);
                    if let Some(cb) = self.watches.get_mut(&watch).and_then(|w| w.callback.as_mut()) {
                        cb();
                    }
                }
            }
        }
    }

    /// Whether a timer is scheduled or a refresh is due. Waits on host
    /// notifications (images, fonts) do not count: the notification itself
    /// wakes the host.
    #[must_use]
    pub fn has_pending_work(&self) -> bool {
        !self.timers.is_empty() || self.refresh_due
    }

    /// Waits still open on images, fonts or a settling DOM.
    #[must_use]
    pub fn pending_ops(&self) -> usize {
        self.ops.len()
    }

    #[must_use]
    pub fn stats(&self) -> RefreshStats {
        self.stats
    }

    /// Cancel everything and dispose every watch.
    pub fn shutdown(&mut self, out: &mut Vec<HostCommand>) {
        let ids: Vec<WatchId> = self.watches.keys().copied().collect();
        for id in ids {
            self.dispose_watch(id, out);
        }
        self.timers.clear();
        self.pending = None;
        self.ops.clear();
        self.refresh_due = false;
        self.newly_resolved.clear();
    }
}

impl Default for RefreshCoordinator {
    fn default() -> Self {
        Self::new(RefreshTimings::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Rect, Viewport};
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    #[derive(Default)]
    struct Doc {
        images: RefCell<Vec<(ElementId, Option<ElementId>)>>,
        no_fonts_api: bool,
    }

    impl LayoutProbe for Doc {
        fn rect(&self, _element: &ElementId) -> Option<Rect> {
            None
        }
        fn viewport(&self) -> Viewport {
            Viewport::new(1280.0, 800.0, 4000.0)
        }
        fn pending_images(&self, scope: Option<&ElementId>) -> Vec<ElementId> {
            self.images
                .borrow()
                .iter()
                .filter(|(_, parent)| scope.is_none() || parent.as_ref() == scope)
                .map(|(id, _)| id.clone())
                .collect()
        }
        fn fonts_api_available(&self) -> bool {
            !self.no_fonts_api
        }
    }

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn run(rc: &mut RefreshCoordinator, doc: &Doc, until: u64) -> u32 {
        let mut refreshes = 0;
        let mut out = Vec::new();
        for t in 0..=until {
            rc.fire_due(ms(t), doc, &mut out);
            if rc.take_refresh() {
                refreshes += 1;
            }
        }
        refreshes
    }

    #[test]
    fn debounce_coalesces_burst() {
        let doc = Doc::default();
        let mut rc = RefreshCoordinator::default();
        for i in 0..10 {
            rc.refresh_debounced(ms(i * 10));
        }
        assert_eq!(rc.pending_refresh().map(|p| p.due), Some(ms(190)));
        let mut out = Vec::new();
        rc.fire_due(ms(189), &doc, &mut out);
        assert!(!rc.take_refresh());
        rc.fire_due(ms(190), &doc, &mut out);
        assert!(rc.take_refresh());
        assert!(!rc.take_refresh());
        assert_eq!(rc.stats().requested, 10);
        assert_eq!(rc.stats().coalesced, 9);
        assert_eq!(rc.stats().issued, 1);
    }

    #[test]
    fn immediate_cancels_pending() {
        let doc = Doc::default();
        let mut rc = RefreshCoordinator::default();
        rc.refresh_debounced(ms(0));
        rc.refresh_immediate();
        assert!(rc.take_refresh());
        assert!(rc.pending_refresh().is_none());
        assert_eq!(run(&mut rc, &doc, 500), 0);
    }

    #[test]
    fn images_none_pending_resolves_at_once() {
        let doc = Doc::default();
        let mut rc = RefreshCoordinator::default();
        let mut out = Vec::new();
        let op = rc.refresh_after_images(&doc, None, ms(0), &mut out);
        assert_eq!(rc.status(op), OpStatus::Resolved);
        assert_eq!(rc.drain_resolved(), vec![op]);
        assert!(out.is_empty());
        assert_eq!(run(&mut rc, &doc, 200), 1);
    }

    #[test]
    fn images_resolve_on_load_or_error() {
        let doc = Doc::default();
        doc.images.borrow_mut().extend([
            (ElementId::new("img-a"), Some(ElementId::new("cards"))),
            (ElementId::new("img-b"), Some(ElementId::new("cards"))),
            (ElementId::new("img-c"), Some(ElementId::new("hero"))),
        ]);
        let mut rc = RefreshCoordinator::default();
        let mut out = Vec::new();
        let scope = ElementId::new("cards");
        let op = rc.refresh_after_images(&doc, Some(&scope), ms(0), &mut out);
        let HostCommand::AwaitImages { images } = &out[0] else {
            panic!("expected AwaitImages, got {out:?}");
        };
        assert_eq!(images.len(), 2);
        assert_eq!(rc.status(op), OpStatus::Pending);

        rc.image_settled(&ElementId::new("img-a"), ms(10));
        rc.image_settled(&ElementId::new("img-c"), ms(10));
        assert_eq!(rc.status(op), OpStatus::Pending);
        // An error is reported through the same path as a load.
        rc.image_settled(&ElementId::new("img-b"), ms(20));
        assert_eq!(rc.status(op), OpStatus::Resolved);
        assert_eq!(rc.pending_refresh().map(|p| p.due), Some(ms(120)));
    }

    #[test]
    fn fonts_fallback_without_api() {
        let doc = Doc {
            no_fonts_api: true,
            ..Doc::default()
        };
        let mut rc = RefreshCoordinator::default();
        let mut out = Vec::new();
        let op = rc.refresh_after_fonts(&doc, ms(0), &mut out);
        assert!(out.is_empty());
        rc.fire_due(ms(999), &doc, &mut out);
        assert_eq!(rc.status(op), OpStatus::Pending);
        rc.fire_due(ms(1000), &doc, &mut out);
        assert_eq!(rc.status(op), OpStatus::Resolved);
        rc.fire_due(ms(1100), &doc, &mut out);
        assert!(rc.take_refresh());
    }

    #[test]
    fn fonts_ready_with_api() {
        let doc = Doc::default();
        let mut rc = RefreshCoordinator::default();
        let mut out = Vec::new();
        let op = rc.refresh_after_fonts(&doc, ms(0), &mut out);
        assert_eq!(out, vec![HostCommand::AwaitFonts]);
        rc.fonts_ready(ms(300));
        assert_eq!(rc.status(op), OpStatus::Resolved);
        assert_eq!(rc.pending_refresh().map(|p| p.due), Some(ms(400)));
    }

    #[test]
    fn dynamic_content_settles_then_waits_for_container_images() {
        let doc = Doc::default();
        let mut rc = RefreshCoordinator::default();
        let mut out = Vec::new();
        let ran = Cell::new(false);
        let (op, value) = rc.refresh_after_dynamic_content(
            || {
                ran.set(true);
                doc.images
                    .borrow_mut()
                    .push((ElementId::new("new-img"), Some(ElementId::new("grid"))));
                7
            },
            Some(ElementId::new("grid")),
            ms(0),
        );
        assert!(ran.get());
        assert_eq!(value, 7);
        rc.fire_due(ms(49), &doc, &mut out);
        assert!(out.is_empty());
        rc.fire_due(ms(50), &doc, &mut out);
        assert_eq!(
            out,
            vec![HostCommand::AwaitImages {
                images: vec![ElementId::new("new-img")]
            }]
        );
        assert_eq!(rc.status(op), OpStatus::Pending);
        rc.image_settled(&ElementId::new("new-img"), ms(80));
        assert_eq!(rc.status(op), OpStatus::Resolved);
    }

    #[test]
    fn dynamic_content_without_container() {
        let doc = Doc::default();
        let mut rc = RefreshCoordinator::default();
        let (op, ()) = rc.refresh_after_dynamic_content(|| {}, None, ms(0));
        assert_eq!(run(&mut rc, &doc, 149), 0);
        assert_eq!(rc.status(op), OpStatus::Resolved);
        assert_eq!(run(&mut rc, &doc, 150), 1);
    }

    #[test]
    fn mutation_bursts_coalesce() {
        let doc = Doc::default();
        let mut rc = RefreshCoordinator::default();
        let mut out = Vec::new();
        let calls = Rc::new(Cell::new(0));
        let c = Rc::clone(&calls);
        let w = rc.observe_content_mutation(
            ElementId::new("strip"),
            Some(Box::new(move || c.set(c.get() + 1))),
            Some(ms(300)),
            &mut out,
        );
        rc.mutation_observed(w, ms(0));
        rc.mutation_observed(w, ms(100));
        rc.mutation_observed(w, ms(200));
        rc.fire_due(ms(499), &doc, &mut out);
        assert_eq!(calls.get(), 0);
        rc.fire_due(ms(500), &doc, &mut out);
        assert_eq!(calls.get(), 1);
        assert_eq!(rc.pending_refresh().map(|p| p.due), Some(ms(600)));
    }

    #[test]
    fn resize_requests_refresh_then_callback() {
        let mut rc = RefreshCoordinator::default();
        let mut out = Vec::new();
        let calls = Rc::new(Cell::new(0));
        let c = Rc::clone(&calls);
        let w = rc.observe_resize(
            ElementId::new("strip"),
            Some(Box::new(move || c.set(c.get() + 1))),
            &mut out,
        );
        assert!(matches!(out[0], HostCommand::ObserveResize { watch, .. } if watch == w));
        rc.resize_observed(w, ms(5));
        assert_eq!(calls.get(), 1);
        assert!(rc.pending_refresh().is_some());
    }

    #[test]
    fn dispose_is_idempotent_and_cancels_burst() {
        let doc = Doc::default();
        let mut rc = RefreshCoordinator::default();
        let mut out = Vec::new();
        let calls = Rc::new(Cell::new(0));
        let c = Rc::clone(&calls);
        let w = rc.observe_content_mutation(
            ElementId::new("strip"),
            Some(Box::new(move || c.set(c.get() + 1))),
            None,
            &mut out,
        );
        rc.mutation_observed(w, ms(0));
        out.clear();
        assert!(rc.dispose_watch(w, &mut out));
        assert!(!rc.dispose_watch(w, &mut out));
        assert_eq!(out, vec![HostCommand::UnobserveMutations { watch: w }]);
        assert_eq!(run(&mut rc, &doc, 1000), 0);
        assert_eq!(calls.get(), 0);
        rc.mutation_observed(w, ms(1000));
        assert!(rc.next_deadline().is_none());
    }

    #[test]
    fn status_stays_resolved_without_bookkeeping() {
        let doc = Doc::default();
        let mut rc = RefreshCoordinator::default();
        let mut out = Vec::new();
        let ops: Vec<_> = (0..50)
            .map(|t| rc.refresh_after_images(&doc, None, ms(t), &mut out))
            .collect();
        assert!(ops.iter().all(|op| rc.status(*op) == OpStatus::Resolved));
        assert_eq!(rc.pending_ops(), 0);
        assert_eq!(rc.status(PendingOpId(50)), OpStatus::Unknown);
    }

    #[test]
    fn awaiting_notifications_is_not_pending_work() {
        let doc = Doc::default();
        doc.images
            .borrow_mut()
            .push((ElementId::new("hero-img"), None));
        let mut rc = RefreshCoordinator::default();
        let mut out = Vec::new();
        let images = rc.refresh_after_images(&doc, None, ms(0), &mut out);
        let fonts = rc.refresh_after_fonts(&doc, ms(0), &mut out);
        assert_eq!(rc.pending_ops(), 2);
        assert!(!rc.has_pending_work());
        assert!(rc.next_deadline().is_none());

        rc.image_settled(&ElementId::new("hero-img"), ms(40));
        assert_eq!(rc.status(images), OpStatus::Resolved);
        assert_eq!(rc.status(fonts), OpStatus::Pending);
        assert!(rc.has_pending_work());
    }

    #[test]
    fn font_fallback_after_ready_is_ignored() {
        let doc = Doc {
            no_fonts_api: true,
            ..Doc::default()
        };
        let mut rc = RefreshCoordinator::default();
        let mut out = Vec::new();
        let op = rc.refresh_after_fonts(&doc, ms(0), &mut out);
        rc.fonts_ready(ms(200));
        assert_eq!(rc.drain_resolved(), vec![op]);
        rc.fire_due(ms(2000), &doc, &mut out);
        assert!(rc.drain_resolved().is_empty());
        assert_eq!(rc.stats().issued, 1);
    }

    #[test]
    fn shutdown_disposes_everything() {
        let mut rc = RefreshCoordinator::default();
        let mut out = Vec::new();
        rc.observe_resize(ElementId::new("a"), None, &mut out);
        rc.observe_content_mutation(ElementId::new("b"), None, None, &mut out);
        rc.refresh_debounced(ms(0));
        out.clear();
        rc.shutdown(&mut out);
        assert_eq!(out.len(), 2);
        assert_eq!(rc.watch_count(), 0);
        assert!(!rc.has_pending_work());
    }
}
