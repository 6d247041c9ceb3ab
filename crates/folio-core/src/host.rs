#![forbid(unsafe_code)]

//! The host contract: layout queries in, effect commands out.
//!
//! The core never touches the DOM. It asks a [`LayoutProbe`] for geometry and
//! asset state, and describes every side effect as a [`HostCommand`] pushed
//! into an outbox (`Vec<HostCommand>`) that the host drains and applies in
//! order after each call.
//!
//! # Failure Modes
//!
//! - An element the probe cannot find is reported as `None`; callers treat
//!   that as "not mounted" and skip the work.

use crate::animation::Style;
use crate::geometry::{ElementId, Rect, Viewport};
use crate::refresh::WatchId;

/// Read-only view of the live document.
pub trait LayoutProbe {
    /// Bounding box of a mounted element in document coordinates.
    fn rect(&self, element: &ElementId) -> Option<Rect>;

    /// Current viewport and scroll offset.
    fn viewport(&self) -> Viewport;

    /// Images that have not finished loading, limited to descendants of
    /// `scope` when given.
    fn pending_images(&self, scope: Option<&ElementId>) -> Vec<ElementId>;

    /// Whether `document.fonts.ready` is available.
    fn fonts_api_available(&self) -> bool {
        true
    }

    /// Whether the document has finished loading.
    fn document_ready(&self) -> bool {
        true
    }

    /// Whether the element is currently mounted.
    fn contains(&self, element: &ElementId) -> bool {
        self.rect(element).is_some()
    }
}

/// A side effect the host must perform.
#[derive(Debug, Clone, PartialEq)]
pub enum HostCommand {
    /// Set the window's vertical scroll offset.
    SetWindowScroll { y: f64 },
    /// Set an element's `scrollLeft`.
    SetScrollLeft { element: ElementId, x: f64 },
    /// Push `hash` (including `#`) onto history without reloading.
    PushHash { hash: String },
    /// Write opacity and transform inline styles.
    ApplyStyle { element: ElementId, style: Style },
    /// Remove inline styles written by [`HostCommand::ApplyStyle`].
    ClearStyle { element: ElementId },
    /// Install the shared window scroll and resize listeners.
    AttachDocumentListeners,
    /// Remove the shared window scroll and resize listeners.
    DetachDocumentListeners,
    /// Start a `ResizeObserver` on the element.
    ObserveResize { watch: WatchId, element: ElementId },
    UnobserveResize { watch: WatchId },
    /// Start a `MutationObserver` (child list, subtree, `class`/`style`
    /// attributes) on the element.
    ObserveMutations { watch: WatchId, element: ElementId },
    UnobserveMutations { watch: WatchId },
    /// Report load or error of each listed image back to the scene.
    AwaitImages { images: Vec<ElementId> },
    /// Report `document.fonts.ready` back to the scene.
    AwaitFonts,
}
