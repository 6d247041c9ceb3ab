#![forbid(unsafe_code)]

//! Horizontal card strip: snapping to card boundaries through the full host
//! loop, and card mutations routed through the refresh coordinator.

use std::time::Duration;

use folio_core::{ElementId, LayoutProbe};
use folio_core::refresh::OpStatus;
use folio_core::scene::StripId;
use folio_core::snap::{Card, CardMutation, SnapPhase};
use folio_harness::SimHost;
use pretty_assertions::assert_eq;

const STRIP: &str = "featured";

/// Strip of six 280px cards (pitch 300 with the 20px gap) on the contact
/// section. Reachable scrollLeft is 0..=500.
fn host_with_strip() -> SimHost {
    let mut host = SimHost::portfolio();
    host.mount(None);
    host.mutate_untracked(|doc| {
        doc.add_strip("contact", STRIP, 750.0, (280.0, 200.0), 20.0);
    });
    let cards = (1..=6).map(|i| Card::new(i.to_string(), format!("Card {i}"))).collect();
    host.mount_strip(STRIP, cards);
    host
}

fn scroll_left(host: &SimHost) -> Option<f64> {
    host.doc().scroll_left(&ElementId::new(STRIP))
}

#[test]
fn release_between_cards_snaps_to_nearest() {
    let mut host = host_with_strip();
    assert!(host.swipe_strip(STRIP, 420.0));
    host.run_until_idle();
    assert_eq!(scroll_left(&host), Some(300.0));

    let strip = host.scene().strip(strip_id(&host)).unwrap();
    assert_eq!(strip.phase(), SnapPhase::Idle);
    assert_eq!(strip.snap_count(), 1);
}

#[test]
fn snap_waits_for_scroll_to_go_quiet() {
    let mut host = host_with_strip();
    host.swipe_strip(STRIP, 100.0);
    host.run_for(Duration::from_millis(96));
    host.swipe_strip(STRIP, 200.0);
    host.run_for(Duration::from_millis(96));
    // Still inside the quiet window of the second swipe.
    assert_eq!(scroll_left(&host), Some(200.0));
    host.run_until_idle();
    assert_eq!(scroll_left(&host), Some(300.0));
}

#[test]
fn release_near_a_card_does_not_animate() {
    let mut host = host_with_strip();
    host.swipe_strip(STRIP, 605.0);
    // Clamped to the last reachable offset.
    assert_eq!(scroll_left(&host), Some(500.0));
    host.swipe_strip(STRIP, 295.0);
    host.run_until_idle();
    assert_eq!(scroll_left(&host), Some(295.0));
    let id = strip_id(&host);
    assert_eq!(host.scene().strip(id).unwrap().snap_count(), 0);
}

#[test]
fn card_mutations_refresh_after_settling() {
    let mut host = host_with_strip();
    let refreshes = host.scene().observer().refresh_count();
    let extra = vec![Card::new("7", "Card 7"), Card::new("8", "Card 8")];
    let op = host.mutate_cards(STRIP, CardMutation::Append(extra)).unwrap();
    assert_eq!(host.scene().op_status(op), OpStatus::Pending);
    host.run_until_idle();
    assert_eq!(host.scene().op_status(op), OpStatus::Resolved);
    assert!(host.scene().observer().refresh_count() > refreshes);

    let id = strip_id(&host);
    assert_eq!(host.scene().strip(id).unwrap().cards().len(), 8);
    assert!(host.doc().rect(&ElementId::new("card-8")).is_some());

    host.mutate_cards(STRIP, CardMutation::Remove("1".into()));
    host.run_until_idle();
    assert!(host.doc().rect(&ElementId::new("card-1")).is_none());
}

#[test]
fn shuffle_is_deterministic_per_seed() {
    let order = |seed| {
        let mut host = host_with_strip();
        host.mutate_cards(STRIP, CardMutation::Shuffle(seed));
        let id = strip_id(&host);
        host.scene()
            .strip(id)
            .unwrap()
            .cards()
            .iter()
            .map(|c| c.id.clone())
            .collect::<Vec<_>>()
    };
    assert_eq!(order(11), order(11));
    assert_eq!(order(11).len(), 6);
}

#[test]
fn unmounting_strip_disposes_observers() {
    let mut host = host_with_strip();
    assert_eq!(host.watch_count(), 2);
    assert!(host.unmount_strip(STRIP));
    assert_eq!(host.watch_count(), 0);
    assert!(!host.unmount_strip(STRIP));
    assert!(!host.swipe_strip(STRIP, 100.0));
}

fn strip_id(host: &SimHost) -> StripId {
    host.strip_id(STRIP).unwrap()
}
