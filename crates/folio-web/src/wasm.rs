#![forbid(unsafe_code)]

//! `wasm-bindgen` exports for [`FolioRuntime`].
//!
//! Wraps [`super::runtime_core::RuntimeCore`] with JS-friendly types. Every
//! call applies the commands it produced that Rust can apply itself; the rest
//! queue up for [`FolioRuntime::take_glue_commands`].
//!
//! Event methods stamp themselves with `performance.now()`, so work they
//! schedule is timed from the event even when no frame has run for a while.
//! After forwarding an event the glue restarts the frame loop if
//! [`FolioRuntime::needs_frame`] says so.
//!
//! ```js
//! const folio = new FolioRuntime(null);
//! folio.mount();
//! const loop = (t) => {
//!   if (folio.frame(t)) requestAnimationFrame(loop);
//!   handle(JSON.parse(folio.takeGlueCommands()));
//! };
//! window.addEventListener("resize", () => {
//!   folio.resized();
//!   if (folio.needsFrame()) requestAnimationFrame(loop);
//! });
//! ```
//!
//! Only compiled on `wasm32` targets.

use std::sync::Once;

use folio_core::HostCommand;
use folio_core::snap::CardMutation;
use wasm_bindgen::prelude::*;

use super::dom::DomLayout;
use super::runtime_core::RuntimeCore;
use crate::wire;

fn init_logging() {
    static ONCE: Once = Once::new();
    ONCE.call_once(|| {
        console_error_panic_hook::set_once();
        tracing_wasm::set_as_global_default_with_config(
            tracing_wasm::WASMLayerConfigBuilder::new()
                .set_max_level(tracing::Level::INFO)
                .build(),
        );
    });
}

fn js_error(err: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&err.to_string())
}

/// The page's scroll coordination runtime.
#[wasm_bindgen]
pub struct FolioRuntime {
    core: RuntimeCore,
    dom: DomLayout,
    glue: Vec<HostCommand>,
}

#[wasm_bindgen]
impl FolioRuntime {
    /// Create a runtime. `config_json` overrides the default tuning.
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: Option<String>) -> Result<FolioRuntime, JsValue> {
        init_logging();
        let dom = DomLayout::new().ok_or_else(|| js_error("no window or document"))?;
        let core = RuntimeCore::from_config_json(config_json.as_deref()).map_err(js_error)?;
        Ok(Self {
            core,
            dom,
            glue: Vec::new(),
        })
    }

    /// Mount the section spy, honoring `location.hash` or a legacy path.
    pub fn mount(&mut self) -> Option<String> {
        let (path, hash) = (self.dom.path(), self.dom.hash());
        let honored = self.core.mount(&self.dom, &path, &hash, self.dom.now_ms());
        self.flush();
        honored
    }

    /// Play the home intro. `social` names the `home-social-{name}` links.
    #[wasm_bindgen(js_name = mountHome)]
    pub fn mount_home(&mut self, social: Vec<String>) {
        self.core.mount_home(&self.dom, &social);
        self.flush();
    }

    #[wasm_bindgen(js_name = mountAbout)]
    pub fn mount_about(&mut self, skill_groups: u32, skill_cards: u32) {
        self.core
            .mount_about(&self.dom, skill_groups as usize, skill_cards as usize);
        self.flush();
    }

    #[wasm_bindgen(js_name = mountProjects)]
    pub fn mount_projects(&mut self) {
        self.core.mount_projects(&self.dom);
        self.flush();
    }

    #[wasm_bindgen(js_name = mountContact)]
    pub fn mount_contact(&mut self, social: Vec<String>) {
        self.core.mount_contact(&self.dom, &social);
        self.flush();
    }

    /// Project cards (JSON array) were rendered into the grid.
    #[wasm_bindgen(js_name = projectsRendered)]
    pub fn projects_rendered(&mut self, cards_json: &str) -> Result<(), JsValue> {
        let cards = wire::decode_cards(cards_json).map_err(js_error)?;
        self.core
            .projects_rendered(&self.dom, &cards, self.dom.now_ms());
        self.flush();
        Ok(())
    }

    #[wasm_bindgen(js_name = documentLoaded)]
    pub fn document_loaded(&mut self) {
        self.core.document_loaded(self.dom.now_ms());
        self.flush();
    }

    pub fn unmount(&mut self) {
        self.core.unmount();
        self.flush();
    }

    // -- navigation and scroll ----------------------------------------------

    pub fn navigate(&mut self, section: &str) -> bool {
        let started = self.core.navigate(&self.dom, section);
        self.flush();
        started
    }

    /// `hashchange`/`popstate` listener.
    #[wasm_bindgen(js_name = hashChanged)]
    pub fn hash_changed(&mut self) -> bool {
        let hash = self.dom.hash();
        let started = self.core.hash_changed(&self.dom, &hash);
        self.flush();
        started
    }

    /// Window `scroll` listener.
    pub fn scrolled(&mut self) {
        self.core.scrolled(self.dom.scroll_y());
        self.flush();
    }

    /// Window `resize` listener.
    pub fn resized(&mut self) {
        self.core.viewport_resized(self.dom.now_ms());
        self.flush();
    }

    #[wasm_bindgen(js_name = activeSection)]
    pub fn active_section(&self) -> Option<String> {
        self.core.active_section()
    }

    // -- asynchronous loads -------------------------------------------------

    #[wasm_bindgen(js_name = imageSettled)]
    pub fn image_settled(&mut self, image: &str) {
        self.core.image_settled(image, self.dom.now_ms());
        self.flush();
    }

    #[wasm_bindgen(js_name = fontsReady)]
    pub fn fonts_ready(&mut self) {
        self.core.fonts_ready(self.dom.now_ms());
        self.flush();
    }

    #[wasm_bindgen(js_name = refreshAfterFonts)]
    pub fn refresh_after_fonts(&mut self) {
        self.core
            .refresh_after_fonts(&self.dom, self.dom.now_ms());
        self.flush();
    }

    #[wasm_bindgen(js_name = resizeObserved)]
    pub fn resize_observed(&mut self, watch: u32) {
        self.core
            .resize_observed(u64::from(watch), self.dom.now_ms());
        self.flush();
    }

    #[wasm_bindgen(js_name = mutationObserved)]
    pub fn mutation_observed(&mut self, watch: u32) {
        self.core
            .mutation_observed(u64::from(watch), self.dom.now_ms());
        self.flush();
    }

    // -- card strips --------------------------------------------------------

    #[wasm_bindgen(js_name = mountStrip)]
    pub fn mount_strip(&mut self, container: &str, cards_json: &str) -> Result<(), JsValue> {
        let cards = wire::decode_cards(cards_json).map_err(js_error)?;
        self.core.mount_strip(container, cards);
        self.flush();
        Ok(())
    }

    #[wasm_bindgen(js_name = unmountStrip)]
    pub fn unmount_strip(&mut self, container: &str) -> bool {
        let removed = self.core.unmount_strip(container);
        self.flush();
        removed
    }

    /// The strip's `scroll` listener.
    #[wasm_bindgen(js_name = stripScrolled)]
    pub fn strip_scrolled(&mut self, container: &str) -> bool {
        let Some(x) = self.dom.scroll_left(container) else {
            return false;
        };
        let accepted = self.core.strip_scrolled(container, x, self.dom.now_ms());
        self.flush();
        accepted
    }

    /// Shuffle the strip. Returns the new card order as a JSON array of ids.
    #[wasm_bindgen(js_name = shuffleStrip)]
    pub fn shuffle_strip(&mut self, container: &str, seed: u32) -> Option<String> {
        self.mutate_strip(container, CardMutation::Shuffle(u64::from(seed)))
    }

    #[wasm_bindgen(js_name = appendStripCards)]
    pub fn append_strip_cards(&mut self, container: &str, cards_json: &str) -> Result<Option<String>, JsValue> {
        let cards = wire::decode_cards(cards_json).map_err(js_error)?;
        Ok(self.mutate_strip(container, CardMutation::Append(cards)))
    }

    #[wasm_bindgen(js_name = removeStripCard)]
    pub fn remove_strip_card(&mut self, container: &str, card: &str) -> Option<String> {
        self.mutate_strip(container, CardMutation::Remove(card.to_owned()))
    }

    // -- frames -------------------------------------------------------------

    /// Run one animation frame at `now_ms` (the rAF timestamp). Returns
    /// whether another frame is needed.
    pub fn frame(&mut self, now_ms: f64) -> bool {
        self.core.set_time_ms(now_ms);
        self.core.frame(&self.dom);
        self.flush();
        self.core.needs_frame()
    }

    /// Whether the frame loop should be (re)started.
    #[wasm_bindgen(js_name = needsFrame)]
    pub fn needs_frame(&self) -> bool {
        self.core.needs_frame()
    }

    /// Earliest pending timer in page milliseconds, for an idle `setTimeout`.
    #[wasm_bindgen(js_name = nextDeadline)]
    pub fn next_deadline(&self) -> Option<f64> {
        self.core.next_deadline_ms()
    }

    /// Drain the commands the page must perform, as a JSON array.
    #[wasm_bindgen(js_name = takeGlueCommands)]
    pub fn take_glue_commands(&mut self) -> String {
        let batch = wire::encode_for_glue(&self.glue);
        self.glue.clear();
        batch
    }
}

impl FolioRuntime {
    fn mutate_strip(&mut self, container: &str, mutation: CardMutation) -> Option<String> {
        let order = self
            .core
            .mutate_strip(container, mutation, self.dom.now_ms());
        self.flush();
        order.map(|ids| serde_json::Value::from(ids).to_string())
    }

    fn flush(&mut self) {
        for command in self.core.take_commands() {
            if !self.dom.apply(&command) {
                self.glue.push(command);
            }
        }
    }
}
