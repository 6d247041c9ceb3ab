#![no_main]

use std::time::Duration;

use arbitrary::Arbitrary;
use folio_core::{
    ElementId, HostCommand, LayoutProbe, Rect, ScrollConfig, ScrollScene, SectionList, Viewport,
};
use libfuzzer_sys::fuzz_target;

const SECTIONS: [(&str, f64, f64); 4] = [
    ("home", 0.0, 900.0),
    ("about", 900.0, 1400.0),
    ("projects", 2300.0, 400.0),
    ("contact", 2700.0, 1000.0),
];
const DOCUMENT_HEIGHT: f64 = 3700.0;
const VIEWPORT_HEIGHT: f64 = 800.0;
const TARGETS: [&str; 5] = ["home", "about", "projects", "contact", "missing"];

#[derive(Debug, Arbitrary)]
enum Op {
    Scroll(u16),
    Navigate(u8),
    HashChange(u8),
    Tick(u8),
    Resize,
    Refresh,
    Loaded,
    Unmount,
    Remount,
}

struct Page {
    scroll_y: f64,
}

impl LayoutProbe for Page {
    fn rect(&self, element: &ElementId) -> Option<Rect> {
        SECTIONS
            .iter()
            .find(|(id, ..)| *id == element.as_str())
            .map(|&(_, top, height)| Rect::new(0.0, top, 1280.0, height))
    }

    fn viewport(&self) -> Viewport {
        Viewport {
            scroll_y: self.scroll_y,
            ..Viewport::new(1280.0, VIEWPORT_HEIGHT, DOCUMENT_HEIGHT)
        }
    }

    fn pending_images(&self, _scope: Option<&ElementId>) -> Vec<ElementId> {
        Vec::new()
    }
}

fuzz_target!(|ops: Vec<Op>| {
    if ops.len() > 256 {
        return;
    }
    let max_scroll = DOCUMENT_HEIGHT - VIEWPORT_HEIGHT;
    let sections = SectionList::portfolio();
    let mut page = Page { scroll_y: 0.0 };
    let mut scene = ScrollScene::new(ScrollConfig::default(), sections.clone());
    let mut now = Duration::ZERO;
    scene.mount_sections(&page, None, now);

    for op in ops {
        let target = |i: u8| TARGETS[usize::from(i) % TARGETS.len()];
        match op {
            Op::Scroll(y) => {
                page.scroll_y = f64::from(y).min(max_scroll);
                scene.on_scroll(page.scroll_y);
            }
            Op::Navigate(i) => {
                scene.navigate_to(&page, target(i));
            }
            Op::HashChange(i) => {
                scene.on_hash_change(&page, &format!("#{}", target(i)));
            }
            Op::Tick(ms) => {
                now += Duration::from_millis(u64::from(ms));
                scene.tick(now, &page);
            }
            Op::Resize => scene.on_viewport_resize(now),
            Op::Refresh => scene.refresh_debounced(now),
            Op::Loaded => scene.on_document_loaded(now),
            Op::Unmount => scene.unmount(),
            Op::Remount => scene.mount_sections(&page, Some("#about"), now),
        }

        for command in scene.take_commands() {
            if let HostCommand::SetWindowScroll { y } = command {
                assert!(
                    y.is_finite() && (-0.5..=max_scroll + 0.5).contains(&y),
                    "scroll target out of range: {y}"
                );
                page.scroll_y = y;
                scene.on_scroll(y);
            }
        }
        if let Some(active) = scene.active_section() {
            assert!(sections.get(active.as_str()).is_some(), "unknown active {active}");
        }
    }
});
