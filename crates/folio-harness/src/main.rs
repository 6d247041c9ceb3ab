#![forbid(unsafe_code)]

//! `folio-tour`: run a scripted visit of the portfolio page against the
//! simulated browser and print every host command as JSONL, followed by the
//! run digest.
//!
//! ```sh
//! RUST_LOG=folio=debug folio-tour            # JSONL on stdout, logs on stderr
//! folio-tour --digest                        # digest only
//! ```

use std::io::{self, Write};
use std::time::Duration;

use folio_core::choreography::SectionChoreography;
use folio_core::snap::{Card, CardMutation};
use folio_harness::{ImageState, SimHost};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

fn main() -> io::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "folio=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let digest_only = std::env::args().skip(1).any(|a| a == "--digest");
    let host = tour();
    let mut stdout = io::stdout().lock();
    if !digest_only {
        stdout.write_all(host.log().to_jsonl().as_bytes())?;
    }
    writeln!(stdout, "{}", host.log().digest())?;
    tracing::info!(
        target: "folio.harness",
        commands = host.log().len(),
        hash = host.hash(),
        "tour finished"
    );
    Ok(())
}

fn tour() -> SimHost {
    let mut host = SimHost::portfolio();
    host.mount(Some("#projects"));
    host.mount_choreography(&SectionChoreography::about(2, 4));
    host.mount_choreography(&SectionChoreography::projects());
    host.mount_choreography(&SectionChoreography::contact(&["github", "linkedin"]));
    host.document_loaded();
    host.run_until_idle();

    // Project cards arrive after a fetch.
    let cards: Vec<Card> = (1..=6)
        .map(|i| Card::new(i.to_string(), format!("Project {i}")))
        .collect();
    let ids: Vec<_> = cards.iter().map(Card::element_id).collect();
    let (op, _) = host.refresh_after_dynamic_content(Some("projects-grid"), |doc| {
        let count = doc.append_to_grid("projects-grid", &ids);
        for id in &ids {
            doc.add_image(&format!("{id}-img"), id.as_str(), ImageState::Loading);
        }
        count
    });
    host.register_after(op, None, SectionChoreography::project_grid(&cards));
    host.run_for(Duration::from_millis(100));
    for id in &ids {
        host.load_image(&format!("{id}-img"), ImageState::Loaded);
    }
    host.run_until_idle();

    host.click_nav("contact");
    host.run_until_idle();
    host.click_nav("about");
    host.run_until_idle();
    host.back();
    host.run_until_idle();

    // Horizontal strip on the contact section.
    host.mutate_untracked(|doc| {
        doc.add_strip("contact", "featured", 750.0, (280.0, 200.0), 20.0);
    });
    let featured = (1..=6)
        .map(|i| Card::new(format!("featured-{i}"), format!("Featured {i}")))
        .collect();
    host.mount_strip("featured", featured);
    host.swipe_strip("featured", 420.0);
    host.run_until_idle();
    host.mutate_cards("featured", CardMutation::Shuffle(7));
    host.run_until_idle();

    host.user_scroll(0.0);
    host.unmount();
    host
}
