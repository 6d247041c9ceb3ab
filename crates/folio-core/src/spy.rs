#![forbid(unsafe_code)]

//! Section spy: which section the navigation UI highlights.
//!
//! One trigger per section, registered in display order with the same
//! thresholds (`top 20%` to `bottom 20%` by default). `Enter` and
//! `EnterBack` make that section active; leaving does nothing, so the last
//! section to report an entry wins. Adjacent sections can overlap by the
//! anchor margins, and the observer dispatches along the scroll direction,
//! which makes the section scrolled toward the one that ends up active.
//!
//! # Invariants
//!
//! 1. At most one section is active at any time (the state is a single
//!    `Option<SectionId>`).
//! 2. Only trigger dispatch changes the state after mount.
//! 3. After [`SectionSpy::unmount`], no handler changes the state, even if
//!    the observer still held it.

use std::cell::Cell;
use std::rc::{Rc, Weak};

use tracing::debug;

use crate::geometry::{Anchor, Edge};
use crate::host::{HostCommand, LayoutProbe};
use crate::observer::{ScrollObserver, TriggerHandle, TriggerSpec};
use crate::reactive::{Observable, ObservableView, Subscription};
use crate::section::{SectionId, SectionList};

/// Spy thresholds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpyAnchors {
    pub start: Anchor,
    pub end: Anchor,
}

impl Default for SpyAnchors {
    fn default() -> Self {
        Self {
            start: Anchor::new(Edge::Top, 0.2),
            end: Anchor::new(Edge::Bottom, 0.2),
        }
    }
}

struct SpyState {
    active: Observable<Option<SectionId>>,
    alive: Cell<bool>,
}

/// Owns the active-section state and the per-section triggers.
pub struct SectionSpy {
    state: Rc<SpyState>,
    triggers: Vec<TriggerHandle>,
}

impl std::fmt::Debug for SectionSpy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SectionSpy")
            .field("active", &self.state.active.get())
            .field("alive", &self.state.alive.get())
            .field("triggers", &self.triggers.len())
            .finish()
    }
}

impl SectionSpy {
    /// Register one trigger per section. The first section is active
    /// immediately.
    pub fn mount(
        observer: &mut ScrollObserver,
        layout: &dyn LayoutProbe,
        sections: &SectionList,
        anchors: SpyAnchors,
        out: &mut Vec<HostCommand>,
    ) -> Self {
        let initial = sections.first().map(|s| s.id.clone());
        let state = Rc::new(SpyState {
            active: Observable::new(initial),
            alive: Cell::new(true),
        });
        let mut triggers = Vec::with_capacity(sections.len());
        for section in sections.iter() {
            let weak: Weak<SpyState> = Rc::downgrade(&state);
            let id = section.id.clone();
            let spec = TriggerSpec::new(section.anchor.clone())
                .start(anchors.start)
                .end(anchors.end);
            let handle = observer.create_trigger(
                layout,
                spec,
                move |event| {
                    let Some(state) = weak.upgrade() else {
                        return;
                    };
                    if state.alive.get() && event.is_entering() {
                        state.active.set(Some(id.clone()));
                    }
                },
                out,
            );
            match handle {
                Some(h) => triggers.push(h),
                None => debug!(
                    target: "folio.spy",
                    section = %section.id,
                    "section anchor not mounted"
                ),
            }
        }
        debug!(target: "folio.spy", sections = triggers.len(), "spy mounted");
        Self { state, triggers }
    }

    /// Currently active section.
    #[must_use]
    pub fn active(&self) -> Option<SectionId> {
        self.state.active.get()
    }

    /// Read-only handle for navigation UI.
    #[must_use]
    pub fn view(&self) -> ObservableView<Option<SectionId>> {
        self.state.active.view()
    }

    pub fn subscribe(&self, callback: impl Fn(&Option<SectionId>) + 'static) -> Subscription {
        self.state.active.subscribe(callback)
    }

    /// Number of active-section changes so far.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.state.active.version()
    }

    #[must_use]
    pub fn is_mounted(&self) -> bool {
        self.state.alive.get()
    }

    #[must_use]
    pub fn triggers(&self) -> &[TriggerHandle] {
        &self.triggers
    }

    /// Destroy every section trigger. Idempotent.
    pub fn unmount(&mut self, observer: &mut ScrollObserver, out: &mut Vec<HostCommand>) {
        if !self.state.alive.replace(false) {
            return;
        }
        for handle in self.triggers.drain(..) {
            observer.destroy(handle, out);
        }
        debug!(target: "folio.spy", "spy unmounted");
    }
}
