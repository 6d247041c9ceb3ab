#![forbid(unsafe_code)]

//! The live DOM as a [`LayoutProbe`], and the commands Rust applies to it
//! without help from the page's JavaScript.
//!
//! Only compiled on `wasm32` targets.
//!
//! # Failure Modes
//!
//! - Missing `window`/`document` makes [`DomLayout::new`] return `None`.
//! - DOM exceptions while writing are logged and swallowed; the next frame
//!   writes again.

use std::sync::atomic::{AtomicU32, Ordering};

use folio_core::{ElementId, HostCommand, LayoutProbe, Rect, Viewport};
use js_sys::Reflect;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{CssStyleDeclaration, Document, Element, HtmlElement, HtmlImageElement, Window};

use crate::css;

/// Anonymous images get an id so their load can be reported back.
const IMAGE_ID_PREFIX: &str = "folio-img-";

static NEXT_IMAGE_ID: AtomicU32 = AtomicU32::new(1);

pub(crate) struct DomLayout {
    window: Window,
    document: Document,
}

impl DomLayout {
    pub(crate) fn new() -> Option<Self> {
        let window = web_sys::window()?;
        let document = window.document()?;
        Some(Self { window, document })
    }

    pub(crate) fn path(&self) -> String {
        self.window.location().pathname().unwrap_or_default()
    }

    pub(crate) fn hash(&self) -> String {
        self.window.location().hash().unwrap_or_default()
    }

    /// `performance.now()`, the clock `requestAnimationFrame` timestamps use.
    /// Without the Performance API the runtime clock holds at the last frame.
    pub(crate) fn now_ms(&self) -> f64 {
        self.window.performance().map_or(0.0, |p| p.now())
    }

    pub(crate) fn scroll_y(&self) -> f64 {
        self.window.scroll_y().unwrap_or(0.0)
    }

    fn scroll_x(&self) -> f64 {
        self.window.scroll_x().unwrap_or(0.0)
    }

    fn element(&self, id: &ElementId) -> Option<Element> {
        self.document.get_element_by_id(id.as_str())
    }

    /// Current `scrollLeft` of `container`.
    pub(crate) fn scroll_left(&self, container: &str) -> Option<f64> {
        let element = self.document.get_element_by_id(container)?;
        Reflect::get(&element, &JsValue::from_str("scrollLeft"))
            .ok()?
            .as_f64()
    }

    fn inline_style(&self, id: &ElementId) -> Option<CssStyleDeclaration> {
        self.element(id)?
            .dyn_into::<HtmlElement>()
            .ok()
            .map(|element| element.style())
    }

    /// Perform `command` if it needs no JavaScript. Returns `false` for
    /// commands left to the glue.
    pub(crate) fn apply(&self, command: &HostCommand) -> bool {
        match command {
            HostCommand::SetWindowScroll { y } => {
                self.window.scroll_to_with_x_and_y(self.scroll_x(), *y);
            }
            HostCommand::SetScrollLeft { element, x } => {
                if let Some(el) = self.element(element) {
                    report(
                        "scrollLeft",
                        Reflect::set(&el, &JsValue::from_str("scrollLeft"), &JsValue::from_f64(*x))
                            .map(drop),
                    );
                }
            }
            HostCommand::PushHash { hash } => {
                let pushed = self
                    .window
                    .history()
                    .and_then(|h| h.push_state_with_url(&JsValue::NULL, "", Some(hash)));
                report("pushState", pushed);
            }
            HostCommand::ApplyStyle { element, style } => {
                if let Some(decl) = self.inline_style(element) {
                    for (property, value) in css::declarations(style) {
                        report(property, decl.set_property(property, &value));
                    }
                }
            }
            HostCommand::ClearStyle { element } => {
                if let Some(decl) = self.inline_style(element) {
                    for property in css::PROPERTIES {
                        report(property, decl.remove_property(property).map(drop));
                    }
                }
            }
            _ => return false,
        }
        true
    }
}

fn report(what: &str, result: Result<(), JsValue>) {
    if let Err(err) = result {
        tracing::warn!(target: "folio.web", what, error = ?err, "DOM write failed");
    }
}

fn number(value: Result<JsValue, JsValue>) -> f64 {
    value.ok().and_then(|v| v.as_f64()).unwrap_or(0.0)
}

impl LayoutProbe for DomLayout {
    fn rect(&self, element: &ElementId) -> Option<Rect> {
        let client = self.element(element)?.get_bounding_client_rect();
        Some(Rect::new(
            client.left() + self.scroll_x(),
            client.top() + self.scroll_y(),
            client.width(),
            client.height(),
        ))
    }

    fn viewport(&self) -> Viewport {
        let width = number(self.window.inner_width());
        let height = number(self.window.inner_height());
        let document_height = self
            .document
            .document_element()
            .map_or(height, |root| f64::from(root.scroll_height()));
        Viewport {
            scroll_y: self.scroll_y(),
            width,
            height,
            document_height,
        }
    }

    fn pending_images(&self, scope: Option<&ElementId>) -> Vec<ElementId> {
        let root = match scope {
            Some(id) => self.element(id),
            None => self.document.document_element(),
        };
        let Some(list) = root.and_then(|r| r.query_selector_all("img").ok()) else {
            return Vec::new();
        };
        let mut pending = Vec::new();
        for index in 0..list.length() {
            let Some(image) = list
                .item(index)
                .and_then(|node| node.dyn_into::<HtmlImageElement>().ok())
            else {
                continue;
            };
            // `complete` also covers images that failed.
            if image.complete() {
                continue;
            }
            if image.id().is_empty() {
                let n = NEXT_IMAGE_ID.fetch_add(1, Ordering::Relaxed);
                image.set_id(&format!("{IMAGE_ID_PREFIX}{n}"));
            }
            pending.push(ElementId::new(image.id()));
        }
        pending
    }

    fn fonts_api_available(&self) -> bool {
        Reflect::has(&self.document, &JsValue::from_str("fonts")).unwrap_or(false)
    }

    fn document_ready(&self) -> bool {
        Reflect::get(&self.document, &JsValue::from_str("readyState"))
            .ok()
            .and_then(|state| state.as_string())
            .is_some_and(|state| state == "complete")
    }
}
