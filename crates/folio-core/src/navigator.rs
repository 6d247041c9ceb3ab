#![forbid(unsafe_code)]

//! Smooth scroll navigator: programmatic window scrolling to sections.
//!
//! Three entry points share one code path:
//!
//! | Entry | Pushes hash | When |
//! |-------|-------------|------|
//! | [`navigate_to`](SmoothScrollNavigator::navigate_to) | yes | nav click |
//! | deep link ([`begin_deep_link`](SmoothScrollNavigator::begin_deep_link)) | no | initial load with `#id` |
//! | [`on_hash_change`](SmoothScrollNavigator::on_hash_change) | no | back/forward |
//!
//! The navigator only writes `SetWindowScroll` frames. The resulting scroll
//! events reach the observer through the host like any user scroll, so the
//! spy and reveals see programmatic scrolling exactly as they see manual
//! scrolling.
//!
//! # Invariants
//!
//! 1. The landing offset is `target.top - header_offset`, clamped to the
//!    reachable scroll range.
//! 2. At most one flight is in progress; a new navigation replaces it and
//!    starts from the live scroll offset.
//! 3. A pending deep link is dropped when the user navigates explicitly.

use std::time::Duration;

use tracing::debug;

use crate::animation::{Animation, Ease, ScalarTween};
use crate::geometry::ElementId;
use crate::host::{HostCommand, LayoutProbe};
use crate::section::parse_hash;

/// Navigation tuning.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NavigatorConfig {
    /// Height of the fixed header the target must clear.
    pub header_offset: f64,
    pub duration: Duration,
    pub ease: Ease,
    /// Delay before honoring the initial hash.
    pub deep_link_settle: Duration,
}

impl Default for NavigatorConfig {
    fn default() -> Self {
        Self {
            header_offset: 72.0,
            duration: Duration::from_millis(1200),
            ease: Ease::Power2InOut,
            deep_link_settle: Duration::from_millis(100),
        }
    }
}

/// Why a navigation started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationSource {
    Click,
    DeepLink,
    HashChange,
}

#[derive(Debug)]
struct Flight {
    target: ElementId,
    source: NavigationSource,
    tween: ScalarTween,
}

#[derive(Debug, Clone, PartialEq)]
enum DeepLink {
    Idle,
    AwaitingLoad(ElementId),
    Settling { target: ElementId, due: Duration },
}

/// Animated window scrolling with a fixed header offset.
#[derive(Debug)]
pub struct SmoothScrollNavigator {
    config: NavigatorConfig,
    flight: Option<Flight>,
    deep_link: DeepLink,
    landed: Option<ElementId>,
}

impl SmoothScrollNavigator {
    #[must_use]
    pub fn new(config: NavigatorConfig) -> Self {
        Self {
            config,
            flight: None,
            deep_link: DeepLink::Idle,
            landed: None,
        }
    }

    #[must_use]
    pub fn config(&self) -> NavigatorConfig {
        self.config
    }

    /// Landing scroll offset for `target`, if mounted.
    #[must_use]
    pub fn landing_offset(&self, layout: &dyn LayoutProbe, target: &ElementId) -> Option<f64> {
        let rect = layout.rect(target)?;
        Some(
            layout
                .viewport()
                .clamp_scroll(rect.top - self.config.header_offset),
        )
    }

    /// Scroll to the element with id `id`, pushing `#id` to history.
    /// Returns `false` (and does nothing) if it is not mounted.
    pub fn navigate_to(
        &mut self,
        layout: &dyn LayoutProbe,
        id: &str,
        out: &mut Vec<HostCommand>,
    ) -> bool {
        self.deep_link = DeepLink::Idle;
        self.start(layout, ElementId::new(id), NavigationSource::Click, out)
    }

    /// Back/forward moved to `hash`; scroll there without pushing.
    pub fn on_hash_change(
        &mut self,
        layout: &dyn LayoutProbe,
        hash: &str,
        out: &mut Vec<HostCommand>,
    ) -> bool {
        let Some(id) = parse_hash(hash) else {
            return false;
        };
        self.deep_link = DeepLink::Idle;
        self.start(layout, ElementId::new(id), NavigationSource::HashChange, out)
    }

    fn start(
        &mut self,
        layout: &dyn LayoutProbe,
        target: ElementId,
        source: NavigationSource,
        out: &mut Vec<HostCommand>,
    ) -> bool {
        let Some(to) = self.landing_offset(layout, &target) else {
            debug!(target: "folio.navigator", element = %target, ?source, "navigation target not mounted");
            return false;
        };
        if source == NavigationSource::Click {
            out.push(HostCommand::PushHash {
                hash: format!("#{target}"),
            });
        }
        let from = layout.viewport().scroll_y;
        if let Some(prev) = self.flight.take() {
            debug!(
                target: "folio.navigator",
                interrupted = %prev.target,
                element = %target,
                "navigation replaced in flight"
            );
        }
        debug!(target: "folio.navigator", element = %target, ?source, from, to, "navigation started");
        self.landed = None;
        self.flight = Some(Flight {
            target,
            source,
            tween: ScalarTween::new(from, to, self.config.duration, self.config.ease),
        });
        true
    }

    /// Handle the hash present at initial load. Returns whether a deep link
    /// was scheduled (the hash names a mounted element).
    pub fn begin_deep_link(
        &mut self,
        layout: &dyn LayoutProbe,
        hash: &str,
        now: Duration,
    ) -> bool {
        let Some(id) = parse_hash(hash) else {
            return false;
        };
        let target = ElementId::new(id);
        if !layout.contains(&target) {
            debug!(target: "folio.navigator", element = %target, "deep link target not mounted, ignoring");
            return false;
        }
        self.deep_link = if layout.document_ready() {
            DeepLink::Settling {
                target,
                due: now + self.config.deep_link_settle,
            }
        } else {
            DeepLink::AwaitingLoad(target)
        };
        true
    }

    /// The document finished loading.
    pub fn on_document_loaded(&mut self, now: Duration) {
        if let DeepLink::AwaitingLoad(target) = &self.deep_link {
            self.deep_link = DeepLink::Settling {
                target: target.clone(),
                due: now + self.config.deep_link_settle,
            };
        }
    }

    #[must_use]
    pub fn next_deadline(&self) -> Option<Duration> {
        match &self.deep_link {
            DeepLink::Settling { due, .. } => Some(*due),
            _ => None,
        }
    }

    /// Start a settled deep link. Returns whether one fired.
    pub fn fire_due(
        &mut self,
        now: Duration,
        layout: &dyn LayoutProbe,
        out: &mut Vec<HostCommand>,
    ) -> bool {
        let DeepLink::Settling { due, .. } = &self.deep_link else {
            return false;
        };
        if *due > now {
            return false;
        }
        let DeepLink::Settling { target, .. } = std::mem::replace(&mut self.deep_link, DeepLink::Idle)
        else {
            return false;
        };
        self.start(layout, target, NavigationSource::DeepLink, out)
    }

    /// Advance the flight by `dt`, writing the next scroll frame.
    pub fn tick(&mut self, dt: Duration, out: &mut Vec<HostCommand>) {
        let Some(flight) = self.flight.as_mut() else {
            return;
        };
        flight.tween.tick(dt);
        out.push(HostCommand::SetWindowScroll {
            y: flight.tween.current(),
        });
        if flight.tween.is_complete() {
            debug!(
                target: "folio.navigator",
                element = %flight.target,
                source = ?flight.source,
                "navigation landed"
            );
            self.landed = Some(flight.target.clone());
            self.flight = None;
        }
    }

    /// Abort the flight where it is.
    pub fn cancel(&mut self) {
        self.flight = None;
    }

    #[must_use]
    pub fn is_animating(&self) -> bool {
        self.flight.is_some()
    }

    /// Whether a deep link is waiting on load or settle.
    #[must_use]
    pub fn has_pending_deep_link(&self) -> bool {
        self.deep_link != DeepLink::Idle
    }

    /// Element the current flight is heading to.
    #[must_use]
    pub fn target(&self) -> Option<&ElementId> {
        self.flight.as_ref().map(|f| &f.target)
    }

    /// Destination of the current flight.
    #[must_use]
    pub fn destination(&self) -> Option<f64> {
        self.flight.as_ref().map(|f| f.tween.target())
    }

    /// Element the last completed flight landed on.
    #[must_use]
    pub fn landed(&self) -> Option<&ElementId> {
        self.landed.as_ref()
    }

    /// Drop any flight and pending deep link.
    pub fn reset(&mut self) {
        self.flight = None;
        self.deep_link = DeepLink::Idle;
    }
}

impl Default for SmoothScrollNavigator {
    fn default() -> Self {
        Self::new(NavigatorConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Rect, Viewport};
    use std::cell::Cell;
    use std::collections::BTreeMap;

    struct Page {
        rects: BTreeMap<ElementId, Rect>,
        scroll_y: Cell<f64>,
        ready: bool,
    }

    impl Page {
        fn new() -> Self {
            let rects = [("home", 0.0), ("about", 900.0), ("projects", 2000.0), ("contact", 3600.0)]
                .into_iter()
                .map(|(id, top)| (ElementId::new(id), Rect::new(0.0, top, 1280.0, 900.0)))
                .collect();
            Self {
                rects,
                scroll_y: Cell::new(0.0),
                ready: true,
            }
        }

        /// Apply scroll commands the way a browser would.
        fn apply(&self, out: &mut Vec<HostCommand>) {
            for cmd in out.drain(..) {
                if let HostCommand::SetWindowScroll { y } = cmd {
                    self.scroll_y.set(y);
                }
            }
        }
    }

    impl LayoutProbe for Page {
        fn rect(&self, element: &ElementId) -> Option<Rect> {
            self.rects.get(element).copied()
        }
        fn viewport(&self) -> Viewport {
            Viewport {
                scroll_y: self.scroll_y.get(),
                ..Viewport::new(1280.0, 800.0, 4300.0)
            }
        }
        fn pending_images(&self, _scope: Option<&ElementId>) -> Vec<ElementId> {
            Vec::new()
        }
        fn document_ready(&self) -> bool {
            self.ready
        }
    }

    const FRAME: Duration = Duration::from_millis(16);

    fn fly(nav: &mut SmoothScrollNavigator, page: &Page) {
        let mut out = Vec::new();
        while nav.is_animating() {
            nav.tick(FRAME, &mut out);
            page.apply(&mut out);
        }
    }

    #[test]
    fn click_pushes_hash_and_lands_below_header() {
        let page = Page::new();
        let mut nav = SmoothScrollNavigator::default();
        let mut out = Vec::new();
        assert!(nav.navigate_to(&page, "projects", &mut out));
        assert_eq!(
            out,
            vec![HostCommand::PushHash {
                hash: "#projects".into()
            }]
        );
        assert_eq!(nav.destination(), Some(1928.0));
        fly(&mut nav, &page);
        assert_eq!(page.scroll_y.get(), 1928.0);
        assert_eq!(nav.landed().map(ElementId::as_str), Some("projects"));
    }

    #[test]
    fn landing_is_clamped() {
        let page = Page::new();
        let nav = SmoothScrollNavigator::default();
        assert_eq!(nav.landing_offset(&page, &ElementId::new("home")), Some(0.0));
        assert_eq!(
            nav.landing_offset(&page, &ElementId::new("contact")),
            Some(3500.0)
        );
    }

    #[test]
    fn missing_target_is_noop() {
        let page = Page::new();
        let mut nav = SmoothScrollNavigator::default();
        let mut out = Vec::new();
        assert!(!nav.navigate_to(&page, "blog", &mut out));
        assert!(out.is_empty());
        assert!(!nav.is_animating());
    }

    #[test]
    fn second_navigation_wins_from_live_position() {
        let page = Page::new();
        let mut nav = SmoothScrollNavigator::default();
        let mut out = Vec::new();
        nav.navigate_to(&page, "contact", &mut out);
        for _ in 0..20 {
            nav.tick(FRAME, &mut out);
        }
        page.apply(&mut out);
        let midway = page.scroll_y.get();
        assert!(midway > 0.0 && midway < 3500.0);

        nav.navigate_to(&page, "about", &mut out);
        assert_eq!(
            out,
            vec![HostCommand::PushHash {
                hash: "#about".into()
            }]
        );
        out.clear();
        nav.tick(FRAME, &mut out);
        let HostCommand::SetWindowScroll { y } = out[0] else {
            panic!("expected scroll frame");
        };
        assert!((y - midway).abs() < 50.0, "restarts from live offset");
        page.apply(&mut out);
        fly(&mut nav, &page);
        assert_eq!(page.scroll_y.get(), 828.0);
    }

    #[test]
    fn deep_link_waits_settle_and_does_not_push() {
        let page = Page::new();
        let mut nav = SmoothScrollNavigator::default();
        let mut out = Vec::new();
        assert!(nav.begin_deep_link(&page, "#projects", Duration::ZERO));
        assert_eq!(nav.next_deadline(), Some(Duration::from_millis(100)));
        assert!(!nav.fire_due(Duration::from_millis(99), &page, &mut out));
        assert!(nav.fire_due(Duration::from_millis(100), &page, &mut out));
        assert!(out.is_empty());
        fly(&mut nav, &page);
        assert_eq!(page.scroll_y.get(), 1928.0);
    }

    #[test]
    fn deep_link_waits_for_load() {
        let mut page = Page::new();
        page.ready = false;
        let mut nav = SmoothScrollNavigator::default();
        let mut out = Vec::new();
        assert!(nav.begin_deep_link(&page, "#about", Duration::ZERO));
        assert_eq!(nav.next_deadline(), None);
        assert!(!nav.fire_due(Duration::from_secs(5), &page, &mut out));
        nav.on_document_loaded(Duration::from_secs(5));
        assert!(nav.fire_due(Duration::from_millis(5100), &page, &mut out));
    }

    #[test]
    fn unknown_or_empty_hash_ignored() {
        let page = Page::new();
        let mut nav = SmoothScrollNavigator::default();
        assert!(!nav.begin_deep_link(&page, "", Duration::ZERO));
        assert!(!nav.begin_deep_link(&page, "#nope", Duration::ZERO));
        assert!(!nav.has_pending_deep_link());
    }

    #[test]
    fn click_cancels_pending_deep_link() {
        let page = Page::new();
        let mut nav = SmoothScrollNavigator::default();
        let mut out = Vec::new();
        nav.begin_deep_link(&page, "#contact", Duration::ZERO);
        nav.navigate_to(&page, "about", &mut out);
        assert!(!nav.has_pending_deep_link());
        assert!(!nav.fire_due(Duration::from_secs(1), &page, &mut out));
    }

    #[test]
    fn hash_change_scrolls_without_push() {
        let page = Page::new();
        let mut nav = SmoothScrollNavigator::default();
        let mut out = Vec::new();
        assert!(nav.on_hash_change(&page, "#about", &mut out));
        assert!(out.is_empty());
        fly(&mut nav, &page);
        assert_eq!(page.scroll_y.get(), 828.0);
    }
}
