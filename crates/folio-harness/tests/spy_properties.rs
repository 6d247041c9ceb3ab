#![forbid(unsafe_code)]

//! Property tests for the active-section highlight.

use folio_harness::SimHost;
use proptest::prelude::*;

/// `(id, top, bottom)` of the portfolio sections.
const SECTIONS: [(&str, f64, f64); 4] = [
    ("home", 0.0, 900.0),
    ("about", 900.0, 2300.0),
    ("projects", 2300.0, 2700.0),
    ("contact", 2700.0, 3700.0),
];

/// 20% of the 800px viewport.
const MARGIN: f64 = 160.0;

fn band(id: &str) -> (f64, f64) {
    SECTIONS
        .iter()
        .find(|(s, _, _)| *s == id)
        .map(|(_, top, bottom)| (top - MARGIN, bottom - MARGIN))
        .unwrap_or((f64::NAN, f64::NAN))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// After any sequence of scrolls exactly one section is active, and the
    /// scroll position lies inside that section's band.
    #[test]
    fn active_section_contains_scroll(positions in prop::collection::vec(0.0f64..=2900.0, 1..24)) {
        let mut host = SimHost::portfolio();
        host.mount(None);
        for y in positions {
            host.user_scroll(y);
            let active = host.active();
            prop_assert!(active.is_some());
            let (start, end) = band(active.as_deref().unwrap_or_default());
            prop_assert!(
                start <= y && y <= end,
                "y={} active={:?} band=({}, {})", y, active, start, end
            );
        }
    }

    /// Navigation always ends with the target highlighted and its top
    /// exactly one header below the viewport top.
    #[test]
    fn navigation_lands_on_target(from in 0.0f64..=2900.0, target in 0usize..4) {
        let (id, top, _) = SECTIONS[target];
        let mut host = SimHost::portfolio();
        host.mount(None);
        host.user_scroll(from);
        prop_assert!(host.click_nav(id));
        host.run_until_idle();
        let active = host.active();
        prop_assert_eq!(active.as_deref(), Some(id));
        let expected = if top < 72.0 { top } else { 72.0 };
        prop_assert_eq!(host.viewport_top_of(id), Some(expected));
        prop_assert_eq!(host.hash(), format!("#{id}"));
    }
}
