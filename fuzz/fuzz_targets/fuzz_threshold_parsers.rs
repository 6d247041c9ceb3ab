#![no_main]

use folio_core::Anchor;
use folio_core::animation::Ease;
use folio_core::entrance::ToggleActions;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    if text.len() > 256 {
        return;
    }

    if let Ok(anchor) = text.parse::<Anchor>() {
        assert!((0.0..=1.0).contains(&anchor.viewport), "fraction escaped 0..=1");
        let again: Anchor = anchor
            .to_string()
            .parse()
            .unwrap_or_else(|e| panic!("display of {anchor:?} does not parse: {e}"));
        assert_eq!(again.edge, anchor.edge);
        assert!((again.viewport - anchor.viewport).abs() < 1e-4);
    }

    if let Ok(toggle) = text.parse::<ToggleActions>() {
        assert_eq!(toggle.to_string().parse::<ToggleActions>().ok(), Some(toggle));
    }

    if let Ok(ease) = text.parse::<Ease>() {
        assert_eq!(ease.to_string().parse::<Ease>().ok(), Some(ease));
        for step in 0u8..=10 {
            let y = ease.apply(f32::from(step) / 10.0);
            assert!(y.is_finite(), "{ease} produced {y}");
        }
    }
});
