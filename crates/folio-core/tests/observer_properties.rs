#![forbid(unsafe_code)]

//! Property tests for trigger region transitions.

use std::cell::RefCell;
use std::rc::Rc;

use folio_core::{ElementId, LayoutProbe, Rect, ScrollObserver, TriggerEvent, TriggerSpec, Viewport};
use proptest::prelude::*;

/// One 1000px section at 1000px; 800px viewport. The default spec is active
/// from 200 (`top bottom`) to 2000 (`bottom top`).
struct OneSection;

impl LayoutProbe for OneSection {
    fn rect(&self, element: &ElementId) -> Option<Rect> {
        (element.as_str() == "about").then_some(Rect::new(0.0, 1000.0, 1280.0, 1000.0))
    }
    fn viewport(&self) -> Viewport {
        Viewport::new(1280.0, 800.0, 4000.0)
    }
    fn pending_images(&self, _scope: Option<&ElementId>) -> Vec<ElementId> {
        Vec::new()
    }
}

const START: f64 = 200.0;
const END: f64 = 2000.0;

fn recorded(once: bool) -> (ScrollObserver, Rc<RefCell<Vec<TriggerEvent>>>) {
    let log = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&log);
    let mut observer = ScrollObserver::new();
    let mut out = Vec::new();
    observer.create_trigger(
        &OneSection,
        TriggerSpec::new("about").once(once),
        move |event| sink.borrow_mut().push(event),
        &mut out,
    );
    (observer, log)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    /// Events alternate between entering and leaving, and after every
    /// update the trigger is inside exactly when the scroll is in its range.
    #[test]
    fn events_alternate_and_track_range(positions in prop::collection::vec(0.0f64..=3200.0, 1..40)) {
        let (mut observer, log) = recorded(false);
        let mut out = Vec::new();
        let mut inside = false;
        for y in positions {
            let seen = log.borrow().len();
            observer.update(y, &mut out);
            for event in &log.borrow()[seen..] {
                prop_assert_ne!(event.is_entering(), inside, "{:?} at y={}", event, y);
                inside = event.is_entering();
            }
            prop_assert_eq!(inside, (START..=END).contains(&y), "y={}", y);
        }
    }

    /// A `once` trigger fires a single `Enter` and then unregisters.
    #[test]
    fn once_fires_at_most_one_enter(positions in prop::collection::vec(0.0f64..=3200.0, 1..40)) {
        let (mut observer, log) = recorded(true);
        let mut out = Vec::new();
        let mut reached = false;
        for y in positions {
            reached |= y >= START;
            observer.update(y, &mut out);
        }
        let expected = if reached { vec![TriggerEvent::Enter] } else { Vec::new() };
        prop_assert_eq!(&*log.borrow(), &expected);
        prop_assert_eq!(observer.live_count(), usize::from(!reached));
    }
}
