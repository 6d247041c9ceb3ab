#![forbid(unsafe_code)]
#![cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]

//! Platform-independent runtime wrapping [`ScrollScene`].
//!
//! Shared between the wasm-bindgen exports and the native tests: it turns
//! page-level calls (millisecond timestamps, raw watch ids, container names)
//! into scene calls. No JS types here; layout arrives as a
//! [`LayoutProbe`] on every call that needs it.
//!
//! Events arrive between frames, often after the frame loop has gone idle,
//! so every entry point that schedules work takes the event's own
//! `performance.now()` reading and advances the clock before forwarding.
//!
//! # Invariants
//!
//! 1. Time never runs backwards: stale or non-finite timestamps are ignored.
//! 2. Work scheduled by an event is timed from that event, not from the
//!    last frame.
//! 3. Every strip container maps to at most one mounted [`StripId`].

use std::collections::BTreeMap;
use std::time::Duration;

use folio_core::choreography::{IntroSequence, PROJECT_GRID, SectionChoreography};
use folio_core::config::ConfigError;
use folio_core::redirect::{self, Route};
use folio_core::refresh::WatchId;
use folio_core::scene::StripId;
use folio_core::snap::{Card, CardMutation};
use folio_core::{ElementId, HostCommand, LayoutProbe, ScrollConfig, ScrollScene, SectionList};
use tracing::{debug, warn};

pub(crate) struct RuntimeCore {
    scene: ScrollScene,
    now: Duration,
    strips: BTreeMap<ElementId, StripId>,
}

impl RuntimeCore {
    pub(crate) fn new(config: ScrollConfig) -> Self {
        Self {
            scene: ScrollScene::new(config, SectionList::portfolio()),
            now: Duration::ZERO,
            strips: BTreeMap::new(),
        }
    }

    /// Build from an optional JSON config, validated.
    pub(crate) fn from_config_json(json: Option<&str>) -> Result<Self, ConfigError> {
        let config = match json.filter(|j| !j.trim().is_empty()) {
            Some(json) => ScrollConfig::from_json_str(json)?.validated()?,
            None => ScrollConfig::default(),
        };
        Ok(Self::new(config))
    }

    // -----------------------------------------------------------------------
    // Time
    // -----------------------------------------------------------------------

    /// Advance the clock to `ms` (a `performance.now()` reading).
    pub(crate) fn set_time_ms(&mut self, ms: f64) {
        if !ms.is_finite() || ms < 0.0 {
            warn!(target: "folio.web", ms, "ignoring invalid timestamp");
            return;
        }
        self.now = self.now.max(Duration::from_secs_f64(ms / 1000.0));
    }

    #[cfg_attr(target_arch = "wasm32", allow(dead_code))]
    pub(crate) fn now(&self) -> Duration {
        self.now
    }

    /// One animation frame at the current time.
    pub(crate) fn frame(&mut self, layout: &dyn LayoutProbe) {
        self.scene.tick(self.now, layout);
    }

    /// Whether another `requestAnimationFrame` is needed.
    pub(crate) fn needs_frame(&self) -> bool {
        self.scene.is_busy()
    }

    /// Earliest pending timer, in page milliseconds.
    pub(crate) fn next_deadline_ms(&self) -> Option<f64> {
        self.scene
            .next_deadline()
            .map(|d| d.as_secs_f64() * 1000.0)
    }

    pub(crate) fn take_commands(&mut self) -> Vec<HostCommand> {
        self.scene.take_commands()
    }

    // -----------------------------------------------------------------------
    // Page lifecycle
    // -----------------------------------------------------------------------

    /// Mount the section spy. A legacy `path` with no hash deep-links to its
    /// section. Returns the hash honored, if any.
    pub(crate) fn mount(&mut self, layout: &dyn LayoutProbe, path: &str, hash: &str, now_ms: f64) -> Option<String> {
        self.set_time_ms(now_ms);
        let initial = initial_hash(path, hash);
        debug!(target: "folio.web", path, hash = initial.as_deref(), "mounting page");
        self.scene
            .mount_sections(layout, initial.as_deref(), self.now);
        initial
    }

    /// Play the home intro.
    pub(crate) fn mount_home(&mut self, layout: &dyn LayoutProbe, social: &[String]) {
        self.scene.mount_intro(layout, &IntroSequence::home(social));
    }

    pub(crate) fn mount_about(&mut self, layout: &dyn LayoutProbe, skill_groups: usize, skill_cards: usize) {
        self.scene
            .mount_choreography(layout, &SectionChoreography::about(skill_groups, skill_cards));
    }

    pub(crate) fn mount_projects(&mut self, layout: &dyn LayoutProbe) {
        self.scene
            .mount_choreography(layout, &SectionChoreography::projects());
    }

    pub(crate) fn mount_contact(&mut self, layout: &dyn LayoutProbe, social: &[String]) {
        self.scene
            .mount_choreography(layout, &SectionChoreography::contact(social));
    }

    /// The page rendered the fetched project cards into the grid. Their
    /// reveal registers once the DOM settles and the grid's images load.
    pub(crate) fn projects_rendered(&mut self, layout: &dyn LayoutProbe, cards: &[Card], now_ms: f64) {
        self.set_time_ms(now_ms);
        let grid = ElementId::new(PROJECT_GRID);
        let (op, ()) = self
            .scene
            .refresh_after_dynamic_content(|| (), Some(grid), self.now);
        self.scene
            .register_after(layout, op, None, SectionChoreography::project_grid(cards));
    }

    pub(crate) fn document_loaded(&mut self, now_ms: f64) {
        self.set_time_ms(now_ms);
        self.scene.on_document_loaded(self.now);
    }

    pub(crate) fn unmount(&mut self) {
        self.strips.clear();
        self.scene.unmount();
    }

    // -----------------------------------------------------------------------
    // Navigation and scroll
    // -----------------------------------------------------------------------

    pub(crate) fn navigate(&mut self, layout: &dyn LayoutProbe, id: &str) -> bool {
        self.scene.navigate_to(layout, id)
    }

    pub(crate) fn hash_changed(&mut self, layout: &dyn LayoutProbe, hash: &str) -> bool {
        self.scene.on_hash_change(layout, hash)
    }

    pub(crate) fn scrolled(&mut self, y: f64) {
        self.scene.on_scroll(y);
    }

    pub(crate) fn viewport_resized(&mut self, now_ms: f64) {
        self.set_time_ms(now_ms);
        self.scene.on_viewport_resize(self.now);
    }

    pub(crate) fn active_section(&self) -> Option<String> {
        self.scene
            .active_section()
            .map(|s| s.as_str().to_owned())
    }

    // -----------------------------------------------------------------------
    // Asynchronous loads
    // -----------------------------------------------------------------------

    pub(crate) fn image_settled(&mut self, image: &str, now_ms: f64) {
        self.set_time_ms(now_ms);
        self.scene
            .on_image_settled(&ElementId::new(image), self.now);
    }

    pub(crate) fn fonts_ready(&mut self, now_ms: f64) {
        self.set_time_ms(now_ms);
        self.scene.on_fonts_ready(self.now);
    }

    /// Wait for web fonts, then refresh.
    pub(crate) fn refresh_after_fonts(&mut self, layout: &dyn LayoutProbe, now_ms: f64) {
        self.set_time_ms(now_ms);
        self.scene.refresh_after_fonts(layout, self.now);
    }

    pub(crate) fn resize_observed(&mut self, watch: u64, now_ms: f64) {
        self.set_time_ms(now_ms);
        self.scene
            .on_resize_observed(WatchId::from_raw(watch), self.now);
    }

    pub(crate) fn mutation_observed(&mut self, watch: u64, now_ms: f64) {
        self.set_time_ms(now_ms);
        self.scene
            .on_mutation_observed(WatchId::from_raw(watch), self.now);
    }

    // -----------------------------------------------------------------------
    // Card strips
    // -----------------------------------------------------------------------

    /// Attach a snap scroller to a rendered strip. Remounting a container
    /// replaces its scroller.
    pub(crate) fn mount_strip(&mut self, container: &str, cards: Vec<Card>) {
        self.unmount_strip(container);
        let id = self.scene.mount_strip(container, cards);
        self.strips.insert(ElementId::new(container), id);
    }

    pub(crate) fn unmount_strip(&mut self, container: &str) -> bool {
        self.strips
            .remove(&ElementId::new(container))
            .is_some_and(|id| self.scene.unmount_strip(id))
    }

    pub(crate) fn strip_scrolled(&mut self, container: &str, x: f64, now_ms: f64) -> bool {
        let Some(&id) = self.strips.get(&ElementId::new(container)) else {
            return false;
        };
        self.set_time_ms(now_ms);
        self.scene.on_strip_scroll(id, x, self.now)
    }

    /// Apply `mutation` and return the new card order for the page to render.
    pub(crate) fn mutate_strip(
        &mut self,
        container: &str,
        mutation: CardMutation,
        now_ms: f64,
    ) -> Option<Vec<String>> {
        let id = *self.strips.get(&ElementId::new(container))?;
        self.set_time_ms(now_ms);
        self.scene.mutate_cards(id, mutation, self.now)?;
        self.strip_order(container)
    }

    pub(crate) fn strip_order(&self, container: &str) -> Option<Vec<String>> {
        let id = self.strips.get(&ElementId::new(container))?;
        let scroller = self.scene.strip(*id)?;
        Some(scroller.cards().iter().map(|c| c.id.clone()).collect())
    }
}

/// The hash to honor on load: the real one, else the anchor a legacy path
/// redirects to.
fn initial_hash(path: &str, hash: &str) -> Option<String> {
    if !hash.is_empty() && hash != "#" {
        return Some(hash.to_owned());
    }
    match redirect::resolve(path) {
        Route::Redirect { location, .. } => location
            .split_once('#')
            .map(|(_, fragment)| format!("#{fragment}")),
        Route::Page | Route::NotFound => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_core::snap::SnapPhase;
    use folio_harness::SimDocument;
    use pretty_assertions::assert_eq;

    const FRAME_MS: f64 = 16.0;

    /// Drive frames the way the wasm loop does, applying window scrolls to
    /// `doc` and echoing them back. Returns pushed hashes.
    fn run(core: &mut RuntimeCore, doc: &mut SimDocument, start_ms: f64, frames: usize) -> Vec<String> {
        let mut pushed = Vec::new();
        let mut t = start_ms;
        for _ in 0..frames {
            t += FRAME_MS;
            core.set_time_ms(t);
            core.frame(&*doc);
            for command in core.take_commands() {
                match command {
                    HostCommand::SetWindowScroll { y } => {
                        let y = doc.scroll_to(y);
                        core.scrolled(y);
                    }
                    HostCommand::PushHash { hash } => pushed.push(hash),
                    _ => {}
                }
            }
        }
        pushed
    }

    #[test]
    fn legacy_path_becomes_initial_hash() {
        assert_eq!(initial_hash("/about/team", ""), Some("#about".to_owned()));
        assert_eq!(initial_hash("/project", "#"), Some("#projects".to_owned()));
        assert_eq!(initial_hash("/about", "#contact"), Some("#contact".to_owned()));
        assert_eq!(initial_hash("/", ""), None);
        assert_eq!(initial_hash("/missing", ""), None);
    }

    #[test]
    fn config_json_is_validated() {
        assert!(RuntimeCore::from_config_json(None).is_ok());
        assert!(RuntimeCore::from_config_json(Some("  ")).is_ok());
        assert!(RuntimeCore::from_config_json(Some("{")).is_err());
    }

    #[test]
    fn time_is_monotonic() {
        let mut core = RuntimeCore::new(ScrollConfig::default());
        core.set_time_ms(500.0);
        core.set_time_ms(200.0);
        core.set_time_ms(f64::NAN);
        core.set_time_ms(-1.0);
        assert_eq!(core.now(), Duration::from_millis(500));
    }

    #[test]
    fn mount_attaches_listeners_and_activates_home() {
        let doc = SimDocument::portfolio();
        let mut core = RuntimeCore::new(ScrollConfig::default());
        assert_eq!(core.mount(&doc, "/", "", 0.0), None);
        let commands = core.take_commands();
        assert!(commands.contains(&HostCommand::AttachDocumentListeners));
        assert_eq!(core.active_section().as_deref(), Some("home"));
        assert!(!core.needs_frame());
    }

    #[test]
    fn nav_click_flies_and_pushes_hash() {
        let mut doc = SimDocument::portfolio();
        let mut core = RuntimeCore::new(ScrollConfig::default());
        core.mount(&doc, "/", "", 0.0);
        core.take_commands();

        assert!(core.navigate(&doc, "about"));
        let pushed: Vec<String> = core
            .take_commands()
            .into_iter()
            .filter_map(|c| match c {
                HostCommand::PushHash { hash } => Some(hash),
                _ => None,
            })
            .collect();
        assert_eq!(pushed, vec!["#about".to_owned()]);

        run(&mut core, &mut doc, 0.0, 90);
        assert_eq!(doc.scroll_y(), 828.0);
        assert_eq!(core.active_section().as_deref(), Some("about"));
    }

    #[test]
    fn legacy_path_deep_links_without_push() {
        let mut doc = SimDocument::portfolio();
        let mut core = RuntimeCore::new(ScrollConfig::default());
        assert_eq!(core.mount(&doc, "/contact", "", 0.0), Some("#contact".to_owned()));
        assert!(core.needs_frame());

        let pushed = run(&mut core, &mut doc, 0.0, 120);
        assert!(pushed.is_empty());
        assert_eq!(doc.scroll_y(), 2628.0);
        assert_eq!(core.active_section().as_deref(), Some("contact"));
    }

    #[test]
    fn unknown_strip_calls_are_ignored() {
        let mut core = RuntimeCore::new(ScrollConfig::default());
        assert!(!core.strip_scrolled("nope", 10.0, 0.0));
        assert!(!core.unmount_strip("nope"));
        assert_eq!(core.mutate_strip("nope", CardMutation::Shuffle(1), 0.0), None);
    }

    #[test]
    fn strip_mutation_returns_new_order() {
        let mut core = RuntimeCore::new(ScrollConfig::default());
        let cards = (1..=3).map(|i| Card::new(i.to_string(), format!("Card {i}"))).collect();
        core.mount_strip("featured", cards);
        let order = core
            .mutate_strip("featured", CardMutation::Remove("2".into()), 0.0)
            .unwrap();
        assert_eq!(order, vec!["1".to_owned(), "3".to_owned()]);

        let order = core
            .mutate_strip("featured", CardMutation::Reorder(vec!["3".into()]), 0.0)
            .unwrap();
        assert_eq!(order, vec!["3".to_owned(), "1".to_owned()]);

        assert!(core.unmount_strip("featured"));
        assert_eq!(core.strip_order("featured"), None);
    }

    #[test]
    fn unmount_detaches_and_goes_idle() {
        let doc = SimDocument::portfolio();
        let mut core = RuntimeCore::new(ScrollConfig::default());
        core.mount(&doc, "/", "", 0.0);
        core.mount_about(&doc, 2, 4);
        core.mount_contact(&doc, &["github".to_owned()]);
        core.take_commands();
        core.unmount();
        assert!(core.take_commands().contains(&HostCommand::DetachDocumentListeners));
        assert!(!core.needs_frame());
        assert_eq!(core.strip_order("featured"), None);
    }

    /// Mounted on the portfolio page with frames run until 2.5s, then left
    /// idle: no frame runs again until an event asks for one.
    fn idle_after_load(doc: &mut SimDocument) -> RuntimeCore {
        let mut core = RuntimeCore::new(ScrollConfig::default());
        core.mount(&*doc, "/", "", 0.0);
        run(&mut core, doc, 2484.0, 1);
        assert!(!core.needs_frame());
        core
    }

    #[test]
    fn resize_after_idle_gap_is_debounced_from_the_event() {
        let mut doc = SimDocument::portfolio();
        let mut core = idle_after_load(&mut doc);
        let refreshes = core.scene.observer().refresh_count();

        core.viewport_resized(10_000.0);
        assert_eq!(core.next_deadline_ms(), Some(10_100.0));
        run(&mut core, &mut doc, 10_000.0, 1);
        assert_eq!(core.scene.observer().refresh_count(), refreshes);
        run(&mut core, &mut doc, 10_104.0, 1);
        assert_eq!(core.scene.observer().refresh_count(), refreshes + 1);
    }

    #[test]
    fn deep_link_settles_after_late_mount() {
        let mut doc = SimDocument::portfolio();
        let mut core = RuntimeCore::new(ScrollConfig::default());
        core.mount(&doc, "/", "#contact", 2500.0);
        assert_eq!(core.next_deadline_ms(), Some(2600.0));

        run(&mut core, &mut doc, 2500.0, 1);
        assert_eq!(doc.scroll_y(), 0.0, "no flight inside the settle delay");
        assert!(core.scene.navigator().has_pending_deep_link());

        run(&mut core, &mut doc, 2516.0, 120);
        assert_eq!(doc.scroll_y(), 2628.0);
    }

    #[test]
    fn strip_scroll_after_idle_gap_waits_for_quiet() {
        let mut doc = SimDocument::portfolio();
        let mut core = idle_after_load(&mut doc);
        let cards = (1..=4).map(|i| Card::new(i.to_string(), format!("Card {i}"))).collect();
        core.mount_strip("featured", cards);
        let id = core.strips[&ElementId::new("featured")];

        assert!(core.strip_scrolled("featured", 420.0, 10_000.0));
        assert_eq!(core.next_deadline_ms(), Some(10_150.0));
        run(&mut core, &mut doc, 10_000.0, 1);
        let phase = core.scene.strip(id).map(|s| s.phase());
        assert_eq!(phase, Some(SnapPhase::Scrolling));
    }

    #[test]
    fn home_intro_mounts_into_its_own_context() {
        let doc = SimDocument::portfolio();
        let mut core = RuntimeCore::new(ScrollConfig::default());
        core.mount(&doc, "/", "", 0.0);
        core.mount_home(&doc, &["github".to_owned()]);
        // The simulated page has no intro elements, so nothing animates.
        assert!(!core.needs_frame());
        assert_eq!(core.scene.controller().context_count(), 1);
    }
}
