#![forbid(unsafe_code)]

//! Mount/unmount bookkeeping: shared listeners, contexts and teardown.

use folio_core::HostCommand;
use folio_core::Rect;
use folio_core::animation::Style;
use folio_core::choreography::{IntroSequence, SectionChoreography};
use folio_core::entrance::{Reveal, RevealSpec};
use folio_core::snap::Card;
use folio_harness::SimHost;
use pretty_assertions::assert_eq;

fn mounted_page() -> SimHost {
    let mut host = SimHost::portfolio();
    host.mount(None);
    host.mount_choreography(&SectionChoreography::about(0, 0));
    host.mount_choreography(&SectionChoreography::projects());
    host.mount_choreography(&SectionChoreography::contact::<&str>(&[]));
    host
}

#[test]
fn listeners_attach_once_for_many_triggers() {
    let host = mounted_page();
    assert!(host.scene().observer().live_count() > 4);
    assert_eq!(host.listener_transitions(), (1, 0));
    assert_eq!(host.log().count(|c| *c == HostCommand::AttachDocumentListeners), 1);
}

#[test]
fn reverting_every_context_keeps_spy_listeners() {
    let mut host = SimHost::portfolio();
    host.mount(None);
    let about = host.mount_choreography(&SectionChoreography::about(0, 0));
    assert!(host.style_of("about-title").is_some());

    assert!(host.revert_context(about.context));
    assert!(!host.revert_context(about.context));
    assert!(host.listeners_attached());
    assert_eq!(host.style_of("about-title"), None);
    assert_eq!(host.scene().observer().live_count(), 4);
}

#[test]
fn reveal_in_reverted_context_is_dropped() {
    let mut host = SimHost::portfolio();
    host.mount(None);
    let ctx = host.create_context("about");
    host.revert_context(ctx);
    let spec = RevealSpec::single("about-title", Reveal::title());
    assert_eq!(host.mount_reveal(Some(ctx), &spec), None);
    assert_eq!(host.style_of("about-title"), None);
}

#[test]
fn unmount_releases_everything_and_is_idempotent() {
    let mut host = mounted_page();
    host.mutate_untracked(|doc| {
        doc.add_strip("contact", "featured", 750.0, (280.0, 200.0), 20.0);
    });
    host.mount_strip("featured", vec![Card::new("1", "One"), Card::new("2", "Two")]);
    host.click_nav("contact");
    host.refresh_debounced();
    assert!(host.scene().is_busy());

    host.unmount();
    assert!(!host.listeners_attached());
    assert_eq!(host.listener_transitions(), (1, 1));
    assert_eq!(host.watch_count(), 0);
    assert_eq!(host.scene().observer().live_count(), 0);
    assert_eq!(host.scene().controller().timeline_count(), 0);
    assert!(!host.scene().is_busy());
    assert!(host.style_of("about-title").is_none());

    let logged = host.log().len();
    host.unmount();
    assert_eq!(host.log().len(), logged);
    assert_eq!(host.listener_transitions(), (1, 1));
}

#[test]
fn remount_after_unmount_attaches_again() {
    let mut host = mounted_page();
    host.unmount();
    host.mount(None);
    assert!(host.listeners_attached());
    assert_eq!(host.listener_transitions(), (2, 1));
    assert_eq!(host.active().as_deref(), Some("home"));
}

#[test]
fn home_intro_plays_without_scrolling_and_reverts() {
    let mut host = SimHost::portfolio();
    host.mutate_untracked(|doc| {
        doc.add_child("home", "home-gallery", Rect::new(640.0, 100.0, 560.0, 560.0))
            .add_child("home", "home-title", Rect::new(80.0, 200.0, 500.0, 60.0))
            .add_child("home", "home-buttons", Rect::new(80.0, 480.0, 400.0, 50.0));
    });
    host.mount(None);
    let intro = host.mount_intro(&IntroSequence::home(&["github"]));
    assert_eq!(host.style_of("home-title"), Some(Style::HIDDEN.with_y(-50.0)));
    assert_eq!(host.scene().observer().live_count(), 4, "no scroll triggers");

    host.run_until_idle();
    assert_eq!(host.scroll_y(), 0.0);
    assert_eq!(host.style_of("home-gallery"), Some(Style::RESTING));
    assert_eq!(host.style_of("home-buttons"), Some(Style::RESTING));
    assert_eq!(host.style_of("home-desc"), None);

    assert!(host.revert_context(intro.context));
    assert_eq!(host.style_of("home-title"), None);
}
