#![forbid(unsafe_code)]

//! The scene: the one object the host talks to.
//!
//! `ScrollScene` owns the observer, the timeline controller, the section spy,
//! the navigator, the refresh coordinator and every mounted card strip,
//! together with the command outbox. The host:
//!
//! 1. forwards browser notifications (`on_*` methods),
//! 2. calls [`ScrollScene::tick`] once per animation frame while
//!    [`ScrollScene::is_busy`] (or at [`ScrollScene::next_deadline`]),
//! 3. drains [`ScrollScene::take_commands`] and applies them in order.
//!
//! After every entry point the scene settles: a requested refresh is run
//! against live layout, reveals waiting on a resolved operation are
//! registered, and timeline controls posted by trigger handlers are applied.
//!
//! # Invariants
//!
//! 1. Trigger handlers never run while the scene is mutating a component;
//!    their effects are queued and applied during settle.
//! 2. Geometry is recomputed only when the refresh coordinator asks for it.
//! 3. [`ScrollScene::unmount`] leaves no live trigger, watch, timer or
//!    timeline behind, and calling it again is a no-op.
//!
//! # Failure Modes
//!
//! - Missing elements make the corresponding mount or navigation a no-op
//!   (`None` / `false`).
//! - Unknown strip, watch or context ids are ignored.

use std::collections::BTreeMap;
use std::time::Duration;

use tracing::{debug, debug_span, trace};

use crate::choreography::{IntroSequence, MountedChoreography, SectionChoreography};
use crate::config::ScrollConfig;
use crate::controller::{ContextId, TimelineController, TimelineId};
use crate::entrance::{RevealSpec, register_reveal};
use crate::geometry::ElementId;
use crate::host::{HostCommand, LayoutProbe};
use crate::navigator::SmoothScrollNavigator;
use crate::observer::ScrollObserver;
use crate::reactive::ObservableView;
use crate::refresh::{OpStatus, PendingOpId, RefreshCoordinator, WatchId};
use crate::section::{SectionId, SectionList};
use crate::snap::{Card, CardMutation, HorizontalSnapScroller};
use crate::spy::SectionSpy;

/// Handle to a mounted card strip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StripId(u64);

#[derive(Debug)]
struct MountedStrip {
    scroller: HorizontalSnapScroller,
    resize: WatchId,
    mutations: WatchId,
}

/// A reveal waiting for an asynchronous load.
#[derive(Debug)]
struct DeferredReveal {
    op: PendingOpId,
    context: Option<ContextId>,
    spec: RevealSpec,
}

/// Scroll coordination for one page.
#[derive(Debug)]
pub struct ScrollScene {
    config: ScrollConfig,
    sections: SectionList,
    observer: ScrollObserver,
    controller: TimelineController,
    spy: Option<SectionSpy>,
    navigator: SmoothScrollNavigator,
    refresh: RefreshCoordinator,
    strips: BTreeMap<StripId, MountedStrip>,
    deferred: Vec<DeferredReveal>,
    outbox: Vec<HostCommand>,
    last_frame: Option<Duration>,
    next_strip: u64,
}

impl ScrollScene {
    #[must_use]
    pub fn new(config: ScrollConfig, sections: SectionList) -> Self {
        Self {
            navigator: SmoothScrollNavigator::new(config.to_navigator_config()),
            refresh: RefreshCoordinator::new(config.to_refresh_timings()),
            config,
            sections,
            observer: ScrollObserver::new(),
            controller: TimelineController::new(),
            spy: None,
            strips: BTreeMap::new(),
            deferred: Vec::new(),
            outbox: Vec::new(),
            last_frame: None,
            next_strip: 0,
        }
    }

    #[must_use]
    pub fn config(&self) -> &ScrollConfig {
        &self.config
    }

    #[must_use]
    pub fn sections(&self) -> &SectionList {
        &self.sections
    }

    // -----------------------------------------------------------------------
    // Sections and navigation
    // -----------------------------------------------------------------------

    /// Mount the section spy and honor the initial `location.hash`.
    ///
    /// Remounting replaces the previous spy.
    pub fn mount_sections(&mut self, layout: &dyn LayoutProbe, hash: Option<&str>, now: Duration) {
        if let Some(mut old) = self.spy.take() {
            old.unmount(&mut self.observer, &mut self.outbox);
        }
        self.spy = Some(SectionSpy::mount(
            &mut self.observer,
            layout,
            &self.sections,
            self.config.to_spy_anchors(),
            &mut self.outbox,
        ));
        if let Some(hash) = hash.filter(|h| !h.is_empty()) {
            let known = self.sections.resolve_hash(hash).is_some();
            if known && self.navigator.begin_deep_link(layout, hash, now) {
                debug!(target: "folio.scene", hash, "deep link scheduled");
            } else {
                debug!(target: "folio.scene", hash, "initial hash ignored");
            }
        }
        self.refresh.refresh_immediate();
        self.settle(layout);
    }

    /// Nav click. Returns `false` if the section is not mounted.
    pub fn navigate_to(&mut self, layout: &dyn LayoutProbe, id: &str) -> bool {
        let started = self.navigator.navigate_to(layout, id, &mut self.outbox);
        self.settle(layout);
        started
    }

    /// Back/forward changed the hash.
    pub fn on_hash_change(&mut self, layout: &dyn LayoutProbe, hash: &str) -> bool {
        if self.sections.resolve_hash(hash).is_none() {
            debug!(target: "folio.scene", hash, "hash change to unknown section ignored");
            return false;
        }
        let started = self.navigator.on_hash_change(layout, hash, &mut self.outbox);
        self.settle(layout);
        started
    }

    /// The window `load` event.
    pub fn on_document_loaded(&mut self, now: Duration) {
        self.navigator.on_document_loaded(now);
        self.refresh.refresh_debounced(now);
    }

    #[must_use]
    pub fn active_section(&self) -> Option<SectionId> {
        self.spy.as_ref().and_then(SectionSpy::active)
    }

    /// Read-only active-section state for navigation UI.
    #[must_use]
    pub fn active_view(&self) -> Option<ObservableView<Option<SectionId>>> {
        self.spy.as_ref().map(SectionSpy::view)
    }

    #[must_use]
    pub fn spy(&self) -> Option<&SectionSpy> {
        self.spy.as_ref()
    }

    // -----------------------------------------------------------------------
    // Browser notifications
    // -----------------------------------------------------------------------

    /// Window scroll event (user or programmatic).
    pub fn on_scroll(&mut self, scroll_y: f64) {
        self.observer.update(scroll_y, &mut self.outbox);
        self.apply_controls();
    }

    pub fn on_viewport_resize(&mut self, now: Duration) {
        self.refresh.refresh_debounced(now);
    }

    /// An awaited image loaded or failed.
    pub fn on_image_settled(&mut self, image: &ElementId, now: Duration) {
        self.refresh.image_settled(image, now);
    }

    pub fn on_fonts_ready(&mut self, now: Duration) {
        self.refresh.fonts_ready(now);
    }

    pub fn on_resize_observed(&mut self, watch: WatchId, now: Duration) {
        self.refresh.resize_observed(watch, now);
    }

    pub fn on_mutation_observed(&mut self, watch: WatchId, now: Duration) {
        self.refresh.mutation_observed(watch, now);
    }

    /// Scroll event on a card strip. Returns `false` for echoes of the
    /// scene's own writes and for unknown strips.
    pub fn on_strip_scroll(&mut self, strip: StripId, offset: f64, now: Duration) -> bool {
        self.strips
            .get_mut(&strip)
            .is_some_and(|s| s.scroller.on_scroll(offset, now))
    }

    // -----------------------------------------------------------------------
    // Time
    // -----------------------------------------------------------------------

    /// Advance to `now`: step tweens, fire due timers, then settle.
    pub fn tick(&mut self, now: Duration, layout: &dyn LayoutProbe) {
        let _span = debug_span!(target: "folio.scene", "scene.tick").entered();
        let dt = self
            .last_frame
            .map_or(Duration::ZERO, |prev| now.saturating_sub(prev));
        self.last_frame = Some(now);
        trace!(target: "folio.scene", ?now, ?dt, "frame");

        self.navigator.tick(dt, &mut self.outbox);
        for strip in self.strips.values_mut() {
            strip.scroller.tick(dt, &mut self.outbox);
        }
        self.controller.tick(dt, &mut self.outbox);

        if self.navigator.fire_due(now, layout, &mut self.outbox) {
            debug!(target: "folio.scene", "deep link navigation started");
        }
        self.refresh.fire_due(now, layout, &mut self.outbox);
        for strip in self.strips.values_mut() {
            strip.scroller.fire_due(now, layout);
        }
        self.settle(layout);

        // The next frame after an idle gap starts from zero elapsed time.
        if !self.is_animating() {
            self.last_frame = None;
        }
    }

    /// Earliest timer deadline across components.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Duration> {
        let strips = self.strips.values().filter_map(|s| s.scroller.next_deadline());
        [self.navigator.next_deadline(), self.refresh.next_deadline()]
            .into_iter()
            .flatten()
            .chain(strips)
            .min()
    }

    fn is_animating(&self) -> bool {
        self.navigator.is_animating()
            || self.controller.is_animating()
            || self.strips.values().any(|s| s.scroller.is_animating())
    }

    /// Whether the host should keep ticking. Waits on host notifications
    /// (document load, images, fonts) are not busy: the host calls back
    /// when they finish.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.is_animating() || self.refresh.has_pending_work() || self.next_deadline().is_some()
    }

    fn apply_controls(&mut self) {
        let applied = self.controller.apply_queued();
        if applied > 0 {
            trace!(target: "folio.scene", applied, "timeline controls applied");
        }
    }

    fn settle(&mut self, layout: &dyn LayoutProbe) {
        if self.refresh.take_refresh() {
            self.observer.refresh(layout, &mut self.outbox);
        }
        let resolved = self.refresh.drain_resolved();
        if !resolved.is_empty() && !self.deferred.is_empty() {
            let (ready, waiting): (Vec<_>, Vec<_>) = std::mem::take(&mut self.deferred)
                .into_iter()
                .partition(|d| resolved.contains(&d.op));
            self.deferred = waiting;
            for reveal in ready {
                self.register_now(layout, reveal.context, &reveal.spec);
            }
        }
        self.apply_controls();
    }

    // -----------------------------------------------------------------------
    // Refresh
    // -----------------------------------------------------------------------

    pub fn refresh_debounced(&mut self, now: Duration) {
        self.refresh.refresh_debounced(now);
    }

    /// Recompute trigger geometry now.
    pub fn refresh_immediate(&mut self, layout: &dyn LayoutProbe) {
        self.refresh.refresh_immediate();
        self.settle(layout);
    }

    /// Run a geometry-affecting content change through the coordinator.
    pub fn refresh_after_dynamic_content<R>(
        &mut self,
        mutator: impl FnOnce() -> R,
        container: Option<ElementId>,
        now: Duration,
    ) -> (PendingOpId, R) {
        self.refresh
            .refresh_after_dynamic_content(mutator, container, now)
    }

    pub fn refresh_after_images(
        &mut self,
        layout: &dyn LayoutProbe,
        scope: Option<&ElementId>,
        now: Duration,
    ) -> PendingOpId {
        let op = self
            .refresh
            .refresh_after_images(layout, scope, now, &mut self.outbox);
        self.settle(layout);
        op
    }

    pub fn refresh_after_fonts(&mut self, layout: &dyn LayoutProbe, now: Duration) -> PendingOpId {
        self.refresh
            .refresh_after_fonts(layout, now, &mut self.outbox)
    }

    #[must_use]
    pub fn op_status(&self, op: PendingOpId) -> OpStatus {
        self.refresh.status(op)
    }

    // -----------------------------------------------------------------------
    // Reveals
    // -----------------------------------------------------------------------

    /// Open an animation context scoped to `scope`.
    pub fn create_context(&mut self, scope: impl Into<ElementId>) -> ContextId {
        self.controller.create_context(scope.into())
    }

    pub fn mount_reveal(
        &mut self,
        layout: &dyn LayoutProbe,
        context: Option<ContextId>,
        spec: &RevealSpec,
    ) -> Option<TimelineId> {
        let id = self.register_now(layout, context, spec);
        self.settle(layout);
        id
    }

    fn register_now(
        &mut self,
        layout: &dyn LayoutProbe,
        context: Option<ContextId>,
        spec: &RevealSpec,
    ) -> Option<TimelineId> {
        if let Some(ctx) = context {
            if self.controller.context(ctx).is_none() {
                debug!(target: "folio.scene", ?ctx, "context gone, reveal dropped");
                return None;
            }
        }
        register_reveal(
            &mut self.controller,
            &mut self.observer,
            layout,
            context,
            spec,
            &mut self.outbox,
        )
    }

    /// Register `spec` once `op` resolves, so its geometry reflects the
    /// loaded content. Registers right away if `op` already resolved.
    pub fn register_after(
        &mut self,
        layout: &dyn LayoutProbe,
        op: PendingOpId,
        context: Option<ContextId>,
        spec: RevealSpec,
    ) {
        if self.refresh.status(op) == OpStatus::Pending {
            debug!(target: "folio.scene", ?op, trigger = %spec.trigger, "reveal deferred");
            self.deferred.push(DeferredReveal { op, context, spec });
        } else {
            self.mount_reveal(layout, context, &spec);
        }
    }

    /// Mount a section bundle in its own context.
    pub fn mount_choreography(
        &mut self,
        layout: &dyn LayoutProbe,
        bundle: &SectionChoreography,
    ) -> MountedChoreography {
        let mounted = bundle.mount(&mut self.controller, &mut self.observer, layout, &mut self.outbox);
        self.settle(layout);
        mounted
    }

    /// Start a load-time intro in its own context.
    pub fn mount_intro(&mut self, layout: &dyn LayoutProbe, intro: &IntroSequence) -> MountedChoreography {
        let mounted = intro.mount(&mut self.controller, layout, &mut self.outbox);
        self.settle(layout);
        mounted
    }

    /// Revert a context. Returns `false` if it was already reverted.
    pub fn revert_context(&mut self, context: ContextId) -> bool {
        self.deferred.retain(|d| d.context != Some(context));
        self.controller
            .revert(context, &mut self.observer, &mut self.outbox)
    }

    // -----------------------------------------------------------------------
    // Card strips
    // -----------------------------------------------------------------------

    /// Mount a horizontally snapping card strip on `container`.
    pub fn mount_strip(&mut self, container: impl Into<ElementId>, cards: Vec<Card>) -> StripId {
        let container = container.into();
        let id = StripId(self.next_strip);
        self.next_strip += 1;
        let resize = self
            .refresh
            .observe_resize(container.clone(), None, &mut self.outbox);
        let mutations = self.refresh.observe_content_mutation(
            container.clone(),
            None,
            Some(self.config.strip_mutation_debounce()),
            &mut self.outbox,
        );
        debug!(target: "folio.scene", ?id, %container, cards = cards.len(), "strip mounted");
        self.strips.insert(
            id,
            MountedStrip {
                scroller: HorizontalSnapScroller::new(container, cards, self.config.to_snap_config()),
                resize,
                mutations,
            },
        );
        id
    }

    #[must_use]
    pub fn strip(&self, id: StripId) -> Option<&HorizontalSnapScroller> {
        self.strips.get(&id).map(|s| &s.scroller)
    }

    /// Change a strip's cards through the refresh coordinator.
    pub fn mutate_cards(
        &mut self,
        strip: StripId,
        mutation: CardMutation,
        now: Duration,
    ) -> Option<PendingOpId> {
        let mounted = self.strips.get_mut(&strip)?;
        let container = mounted.scroller.container().clone();
        let scroller = &mut mounted.scroller;
        let (op, count) = self.refresh.refresh_after_dynamic_content(
            || scroller.apply_mutation(mutation),
            Some(container),
            now,
        );
        debug!(target: "folio.scene", ?strip, ?op, cards = count, "cards mutated");
        Some(op)
    }

    /// Tear down a strip. Returns `false` if it was not mounted.
    pub fn unmount_strip(&mut self, strip: StripId) -> bool {
        let Some(mut mounted) = self.strips.remove(&strip) else {
            return false;
        };
        mounted.scroller.halt();
        self.refresh.dispose_watch(mounted.resize, &mut self.outbox);
        self.refresh.dispose_watch(mounted.mutations, &mut self.outbox);
        debug!(target: "folio.scene", ?strip, "strip unmounted");
        true
    }

    // -----------------------------------------------------------------------
    // Output and teardown
    // -----------------------------------------------------------------------

    /// Drain the command outbox.
    pub fn take_commands(&mut self) -> Vec<HostCommand> {
        std::mem::take(&mut self.outbox)
    }

    /// Tear everything down. Idempotent.
    pub fn unmount(&mut self) {
        if let Some(spy) = self.spy.as_mut() {
            spy.unmount(&mut self.observer, &mut self.outbox);
        }
        self.controller
            .revert_all(&mut self.observer, &mut self.outbox);
        let strips: Vec<StripId> = self.strips.keys().copied().collect();
        for id in strips {
            self.unmount_strip(id);
        }
        self.observer.destroy_all(&mut self.outbox);
        self.navigator.reset();
        self.refresh.shutdown(&mut self.outbox);
        self.deferred.clear();
        self.last_frame = None;
        debug!(target: "folio.scene", "scene unmounted");
    }

    // -----------------------------------------------------------------------
    // Diagnostics
    // -----------------------------------------------------------------------

    #[must_use]
    pub fn observer(&self) -> &ScrollObserver {
        &self.observer
    }

    #[must_use]
    pub fn controller(&self) -> &TimelineController {
        &self.controller
    }

    #[must_use]
    pub fn navigator(&self) -> &SmoothScrollNavigator {
        &self.navigator
    }

    #[must_use]
    pub fn refresh(&self) -> &RefreshCoordinator {
        &self.refresh
    }

    /// Reveals still waiting for their operation.
    #[must_use]
    pub fn deferred_count(&self) -> usize {
        self.deferred.len()
    }
}

impl Default for ScrollScene {
    fn default() -> Self {
        Self::new(ScrollConfig::default(), SectionList::portfolio())
    }
}
