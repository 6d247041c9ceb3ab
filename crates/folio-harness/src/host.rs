#![forbid(unsafe_code)]

//! A simulated browser driving a [`ScrollScene`].
//!
//! `SimHost` plays the part `folio-web` plays in a real page: it applies
//! every [`HostCommand`] to the [`SimDocument`], echoes programmatic scrolls
//! back as scroll events, keeps the hash history, remembers which observers
//! are installed and fires them when the document changes under them.
//!
//! Time only advances through [`SimHost::frame`] and the helpers built on it,
//! in [`FRAME`] steps.
//!
//! # Invariants
//!
//! 1. After every public call the scene's outbox is empty: commands are
//!    applied (and their echoes processed) before returning.
//! 2. Every applied command is appended to the [`CommandLog`] with the frame
//!    time it was applied at.

use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;

use folio_core::animation::Style;
use folio_core::choreography::{IntroSequence, MountedChoreography, SectionChoreography};
use folio_core::controller::{ContextId, TimelineId};
use folio_core::entrance::RevealSpec;
use folio_core::refresh::{PendingOpId, WatchId};
use folio_core::scene::StripId;
use folio_core::snap::{Card, CardMutation};
use folio_core::{ElementId, HostCommand, LayoutProbe, Rect, ScrollConfig, ScrollScene, SectionList};
use tracing::{debug, trace};

use crate::clock::{FRAME, SimClock};
use crate::document::{ImageState, SimDocument};
use crate::log::CommandLog;

/// Upper bound for [`SimHost::run_until_idle`].
const MAX_IDLE_FRAMES: usize = 2_000;

type Snapshot = BTreeMap<ElementId, (Rect, Option<ElementId>)>;

/// Browser stand-in.
#[derive(Debug)]
pub struct SimHost {
    doc: SimDocument,
    scene: ScrollScene,
    clock: SimClock,
    log: CommandLog,
    history: Vec<String>,
    styles: BTreeMap<ElementId, Style>,
    attached: usize,
    detached: usize,
    resize_watches: BTreeMap<WatchId, ElementId>,
    mutation_watches: BTreeMap<WatchId, ElementId>,
    awaiting_images: BTreeSet<ElementId>,
    awaiting_fonts: bool,
    strips: BTreeMap<ElementId, StripId>,
}

impl SimHost {
    #[must_use]
    pub fn new(doc: SimDocument, config: ScrollConfig, sections: SectionList) -> Self {
        Self {
            doc,
            scene: ScrollScene::new(config, sections),
            clock: SimClock::new(),
            log: CommandLog::new(),
            history: Vec::new(),
            styles: BTreeMap::new(),
            attached: 0,
            detached: 0,
            resize_watches: BTreeMap::new(),
            mutation_watches: BTreeMap::new(),
            awaiting_images: BTreeSet::new(),
            awaiting_fonts: false,
            strips: BTreeMap::new(),
        }
    }

    /// The portfolio page with default configuration.
    #[must_use]
    pub fn portfolio() -> Self {
        Self::new(
            SimDocument::portfolio(),
            ScrollConfig::default(),
            SectionList::portfolio(),
        )
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    #[must_use]
    pub fn doc(&self) -> &SimDocument {
        &self.doc
    }

    #[must_use]
    pub fn scene(&self) -> &ScrollScene {
        &self.scene
    }

    #[must_use]
    pub fn log(&self) -> &CommandLog {
        &self.log
    }

    #[must_use]
    pub fn now(&self) -> Duration {
        self.clock.now()
    }

    /// Current `location.hash`, `""` when none.
    #[must_use]
    pub fn hash(&self) -> &str {
        self.history.last().map_or("", String::as_str)
    }

    #[must_use]
    pub fn history(&self) -> &[String] {
        &self.history
    }

    #[must_use]
    pub fn scroll_y(&self) -> f64 {
        self.doc.scroll_y()
    }

    /// Inline style currently written on `element`.
    #[must_use]
    pub fn style_of(&self, element: &str) -> Option<Style> {
        self.styles.get(&ElementId::new(element)).copied()
    }

    /// Whether the shared window listeners are installed.
    #[must_use]
    pub fn listeners_attached(&self) -> bool {
        self.attached > self.detached
    }

    /// Lifetime attach and detach counts.
    #[must_use]
    pub fn listener_transitions(&self) -> (usize, usize) {
        (self.attached, self.detached)
    }

    /// Installed resize and mutation observers.
    #[must_use]
    pub fn watch_count(&self) -> usize {
        self.resize_watches.len() + self.mutation_watches.len()
    }

    #[must_use]
    pub fn awaiting_fonts(&self) -> bool {
        self.awaiting_fonts
    }

    #[must_use]
    pub fn awaiting_images(&self) -> Vec<ElementId> {
        self.awaiting_images.iter().cloned().collect()
    }

    /// Where a section's top currently sits relative to the viewport top.
    #[must_use]
    pub fn viewport_top_of(&self, element: &str) -> Option<f64> {
        self.doc
            .rect(&ElementId::new(element))
            .map(|r| r.top - self.doc.scroll_y())
    }

    /// The active section id as a plain string.
    #[must_use]
    pub fn active(&self) -> Option<String> {
        self.scene.active_section().map(|s| s.as_str().to_owned())
    }

    // -----------------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------------

    /// Load the page with `hash` as the initial `location.hash`.
    pub fn mount(&mut self, hash: Option<&str>) {
        if let Some(hash) = hash.filter(|h| !h.is_empty()) {
            self.history.push(hash.to_owned());
        }
        let now = self.now();
        self.scene.mount_sections(&self.doc, hash, now);
        self.pump();
    }

    /// The window `load` event.
    pub fn document_loaded(&mut self) {
        self.doc.set_ready(true);
        let now = self.now();
        self.scene.on_document_loaded(now);
        self.pump();
    }

    pub fn unmount(&mut self) {
        self.scene.unmount();
        self.pump();
    }

    // -----------------------------------------------------------------------
    // Time
    // -----------------------------------------------------------------------

    /// Advance one animation frame.
    pub fn frame(&mut self) {
        self.clock.advance(FRAME);
        let now = self.now();
        self.scene.tick(now, &self.doc);
        self.pump();
    }

    /// Run frames until at least `span` has elapsed.
    pub fn run_for(&mut self, span: Duration) {
        let end = self.now() + span;
        while self.now() < end {
            self.frame();
        }
    }

    /// Run frames while the scene has work. Returns the frames run.
    pub fn run_until_idle(&mut self) -> usize {
        let mut frames = 0;
        while self.scene.is_busy() && frames < MAX_IDLE_FRAMES {
            self.frame();
            frames += 1;
        }
        frames
    }

    // -----------------------------------------------------------------------
    // User actions
    // -----------------------------------------------------------------------

    /// Wheel or touch scroll to `y`.
    pub fn user_scroll(&mut self, y: f64) {
        let y = self.doc.scroll_to(y);
        trace!(target: "folio.harness", y, "user scroll");
        self.scene.on_scroll(y);
        self.pump();
    }

    /// Click the nav link for section `id`.
    pub fn click_nav(&mut self, id: &str) -> bool {
        let started = self.scene.navigate_to(&self.doc, id);
        self.pump();
        started
    }

    /// Browser back button. Returns whether the scene scrolled.
    pub fn back(&mut self) -> bool {
        if self.history.pop().is_none() {
            return false;
        }
        let hash = self.hash().to_owned();
        let started = self.scene.on_hash_change(&self.doc, &hash);
        self.pump();
        started
    }

    pub fn resize_viewport(&mut self, width: f64, height: f64) {
        self.doc.set_viewport(width, height);
        let now = self.now();
        self.scene.on_viewport_resize(now);
        self.pump();
    }

    /// Finish loading an image, reporting it if the scene awaits it.
    pub fn load_image(&mut self, image: &str, state: ImageState) {
        let id = ElementId::new(image);
        self.doc.settle_image(&id, state);
        if self.awaiting_images.remove(&id) {
            let now = self.now();
            self.scene.on_image_settled(&id, now);
        }
        self.pump();
    }

    /// `document.fonts.ready` resolves.
    pub fn fonts_loaded(&mut self) {
        if std::mem::take(&mut self.awaiting_fonts) {
            let now = self.now();
            self.scene.on_fonts_ready(now);
        }
        self.pump();
    }

    /// Change a block's height, firing any observers it affects.
    pub fn resize_block(&mut self, block: &str, height: f64) {
        let before = self.snapshot();
        self.doc.set_block_height(block, height);
        self.notify_observers(&before);
    }

    /// Change content the sanctioned way: through the scene's refresh
    /// coordinator.
    pub fn refresh_after_dynamic_content<R>(
        &mut self,
        container: Option<&str>,
        mutate: impl FnOnce(&mut SimDocument) -> R,
    ) -> (PendingOpId, R) {
        let before = self.snapshot();
        let now = self.now();
        let doc = &mut self.doc;
        let result = self.scene.refresh_after_dynamic_content(
            || mutate(doc),
            container.map(ElementId::new),
            now,
        );
        self.notify_observers(&before);
        result
    }

    /// Change content behind the scene's back. Trigger geometry goes stale
    /// until something else requests a refresh.
    pub fn mutate_untracked<R>(&mut self, mutate: impl FnOnce(&mut SimDocument) -> R) -> R {
        let before = self.snapshot();
        let result = mutate(&mut self.doc);
        self.notify_observers(&before);
        result
    }

    // -----------------------------------------------------------------------
    // Reveals
    // -----------------------------------------------------------------------

    pub fn create_context(&mut self, scope: &str) -> ContextId {
        self.scene.create_context(scope)
    }

    pub fn mount_reveal(&mut self, context: Option<ContextId>, spec: &RevealSpec) -> Option<TimelineId> {
        let id = self.scene.mount_reveal(&self.doc, context, spec);
        self.pump();
        id
    }

    pub fn register_after(&mut self, op: PendingOpId, context: Option<ContextId>, spec: RevealSpec) {
        self.scene.register_after(&self.doc, op, context, spec);
        self.pump();
    }

    pub fn mount_choreography(&mut self, bundle: &SectionChoreography) -> MountedChoreography {
        let mounted = self.scene.mount_choreography(&self.doc, bundle);
        self.pump();
        mounted
    }

    pub fn mount_intro(&mut self, intro: &IntroSequence) -> MountedChoreography {
        let mounted = self.scene.mount_intro(&self.doc, intro);
        self.pump();
        mounted
    }

    pub fn revert_context(&mut self, context: ContextId) -> bool {
        let reverted = self.scene.revert_context(context);
        self.pump();
        reverted
    }

    pub fn refresh_after_images(&mut self, scope: Option<&str>) -> PendingOpId {
        let now = self.now();
        let scope = scope.map(ElementId::new);
        let op = self.scene.refresh_after_images(&self.doc, scope.as_ref(), now);
        self.pump();
        op
    }

    pub fn refresh_after_fonts(&mut self) -> PendingOpId {
        let now = self.now();
        let op = self.scene.refresh_after_fonts(&self.doc, now);
        self.pump();
        op
    }

    pub fn refresh_debounced(&mut self) {
        let now = self.now();
        self.scene.refresh_debounced(now);
        self.pump();
    }

    // -----------------------------------------------------------------------
    // Card strips
    // -----------------------------------------------------------------------

    /// Render `cards` into the strip element `container` (already laid out
    /// by the document) and attach a snap scroller to it.
    pub fn mount_strip(&mut self, container: &str, cards: Vec<Card>) -> StripId {
        self.doc
            .render_strip(container, cards.iter().map(Card::element_id).collect());
        let id = self.scene.mount_strip(container, cards);
        self.strips.insert(ElementId::new(container), id);
        self.pump();
        id
    }

    #[must_use]
    pub fn strip_id(&self, container: &str) -> Option<StripId> {
        self.strips.get(&ElementId::new(container)).copied()
    }

    /// Mutate a strip's cards and re-render it.
    pub fn mutate_cards(&mut self, container: &str, mutation: CardMutation) -> Option<PendingOpId> {
        let strip = *self.strips.get(&ElementId::new(container))?;
        let before = self.snapshot();
        let now = self.now();
        let op = self.scene.mutate_cards(strip, mutation, now)?;
        if let Some(scroller) = self.scene.strip(strip) {
            let ids = scroller.cards().iter().map(Card::element_id).collect();
            self.doc.render_strip(container, ids);
        }
        self.notify_observers(&before);
        Some(op)
    }

    /// Swipe a strip to `x`.
    pub fn swipe_strip(&mut self, container: &str, x: f64) -> bool {
        let id = ElementId::new(container);
        let (Some(&strip), Some(applied)) = (self.strips.get(&id), self.doc.set_scroll_left(&id, x))
        else {
            return false;
        };
        let now = self.now();
        let accepted = self.scene.on_strip_scroll(strip, applied, now);
        self.pump();
        accepted
    }

    pub fn unmount_strip(&mut self, container: &str) -> bool {
        let Some(strip) = self.strips.remove(&ElementId::new(container)) else {
            return false;
        };
        let removed = self.scene.unmount_strip(strip);
        self.pump();
        removed
    }

    // -----------------------------------------------------------------------
    // Command application
    // -----------------------------------------------------------------------

    /// Apply queued commands until the outbox stays empty.
    fn pump(&mut self) {
        loop {
            let commands = self.scene.take_commands();
            if commands.is_empty() {
                return;
            }
            let at = self.now();
            for command in commands {
                self.apply(&command);
                self.log.push(at, command);
            }
        }
    }

    fn apply(&mut self, command: &HostCommand) {
        let now = self.now();
        match command {
            HostCommand::SetWindowScroll { y } => {
                let y = self.doc.scroll_to(*y);
                self.scene.on_scroll(y);
            }
            HostCommand::SetScrollLeft { element, x } => {
                if let (Some(&strip), Some(applied)) =
                    (self.strips.get(element), self.doc.set_scroll_left(element, *x))
                {
                    self.scene.on_strip_scroll(strip, applied, now);
                }
            }
            HostCommand::PushHash { hash } => self.history.push(hash.clone()),
            HostCommand::ApplyStyle { element, style } => {
                self.styles.insert(element.clone(), *style);
            }
            HostCommand::ClearStyle { element } => {
                self.styles.remove(element);
            }
            HostCommand::AttachDocumentListeners => self.attached += 1,
            HostCommand::DetachDocumentListeners => self.detached += 1,
            HostCommand::ObserveResize { watch, element } => {
                self.resize_watches.insert(*watch, element.clone());
            }
            HostCommand::UnobserveResize { watch } => {
                self.resize_watches.remove(watch);
            }
            HostCommand::ObserveMutations { watch, element } => {
                self.mutation_watches.insert(*watch, element.clone());
            }
            HostCommand::UnobserveMutations { watch } => {
                self.mutation_watches.remove(watch);
            }
            HostCommand::AwaitImages { images } => {
                self.awaiting_images.extend(images.iter().cloned());
            }
            HostCommand::AwaitFonts => self.awaiting_fonts = true,
        }
    }

    fn snapshot(&self) -> Snapshot {
        self.doc
            .elements()
            .map(|(id, rect)| (id.clone(), (*rect, self.doc.block_of(id))))
            .collect()
    }

    /// Fire resize observers whose element changed size and mutation
    /// observers whose block gained, lost or moved an element.
    fn notify_observers(&mut self, before: &Snapshot) {
        let after = self.snapshot();
        let now = self.now();

        let resized: Vec<WatchId> = self
            .resize_watches
            .iter()
            .filter(|(_, element)| {
                let old = before.get(*element).map(|(r, _)| (r.width, r.height));
                let new = after.get(*element).map(|(r, _)| (r.width, r.height));
                old != new
            })
            .map(|(watch, _)| *watch)
            .collect();

        let mut touched: BTreeSet<ElementId> = BTreeSet::new();
        for (id, entry) in before.iter().chain(after.iter()) {
            let changed = before.get(id) != after.get(id);
            if changed {
                if let Some(block) = &entry.1 {
                    touched.insert(block.clone());
                }
            }
        }
        let mutated: Vec<WatchId> = self
            .mutation_watches
            .iter()
            .filter(|(_, element)| {
                let block = after
                    .get(*element)
                    .or_else(|| before.get(*element))
                    .and_then(|(_, b)| b.clone());
                block.is_some_and(|b| touched.contains(&b))
            })
            .map(|(watch, _)| *watch)
            .collect();

        debug!(
            target: "folio.harness",
            resized = resized.len(),
            mutated = mutated.len(),
            "observers fired"
        );
        for watch in resized {
            self.scene.on_resize_observed(watch, now);
        }
        for watch in mutated {
            self.scene.on_mutation_observed(watch, now);
        }
        self.pump();
    }
}
