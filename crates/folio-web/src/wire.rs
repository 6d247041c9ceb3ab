#![forbid(unsafe_code)]

//! JSON exchanged with the page's JavaScript glue.
//!
//! Outbound: the [`HostCommand`]s Rust cannot carry out through `web-sys`
//! alone, as `{"kind": ..., ...}` objects. Inbound: card lists rendered by the
//! page.
//!
//! # Failure Modes
//!
//! - Malformed card JSON is reported as [`serde_json::Error`]; the runtime
//!   ignores the call and logs a warning.

use folio_core::HostCommand;
use folio_core::snap::Card;
use serde_json::{Value, json};

/// Whether the glue has to perform `command`.
///
/// Scrolls, hash pushes and inline styles are applied by Rust directly.
#[must_use]
pub fn needs_glue(command: &HostCommand) -> bool {
    matches!(
        command,
        HostCommand::AttachDocumentListeners
            | HostCommand::DetachDocumentListeners
            | HostCommand::ObserveResize { .. }
            | HostCommand::UnobserveResize { .. }
            | HostCommand::ObserveMutations { .. }
            | HostCommand::UnobserveMutations { .. }
            | HostCommand::AwaitImages { .. }
            | HostCommand::AwaitFonts
    )
}

/// Wire form of a command.
#[must_use]
pub fn encode(command: &HostCommand) -> Value {
    match command {
        HostCommand::SetWindowScroll { y } => json!({ "kind": "scroll", "y": y }),
        HostCommand::SetScrollLeft { element, x } => {
            json!({ "kind": "scroll_left", "element": element.as_str(), "x": x })
        }
        HostCommand::PushHash { hash } => json!({ "kind": "push_hash", "hash": hash }),
        HostCommand::ApplyStyle { element, style } => json!({
            "kind": "style",
            "element": element.as_str(),
            "opacity": crate::css::opacity(style),
            "transform": crate::css::transform(style),
        }),
        HostCommand::ClearStyle { element } => {
            json!({ "kind": "clear_style", "element": element.as_str() })
        }
        HostCommand::AttachDocumentListeners => json!({ "kind": "attach_listeners" }),
        HostCommand::DetachDocumentListeners => json!({ "kind": "detach_listeners" }),
        HostCommand::ObserveResize { watch, element } => json!({
            "kind": "observe_resize",
            "watch": watch.raw(),
            "element": element.as_str(),
        }),
        HostCommand::UnobserveResize { watch } => {
            json!({ "kind": "unobserve_resize", "watch": watch.raw() })
        }
        HostCommand::ObserveMutations { watch, element } => json!({
            "kind": "observe_mutations",
            "watch": watch.raw(),
            "element": element.as_str(),
        }),
        HostCommand::UnobserveMutations { watch } => {
            json!({ "kind": "unobserve_mutations", "watch": watch.raw() })
        }
        HostCommand::AwaitImages { images } => json!({
            "kind": "await_images",
            "images": images.iter().map(|i| i.as_str()).collect::<Vec<_>>(),
        }),
        HostCommand::AwaitFonts => json!({ "kind": "await_fonts" }),
    }
}

/// Encode the glue's share of `commands` as a JSON array string.
#[must_use]
pub fn encode_for_glue(commands: &[HostCommand]) -> String {
    let batch: Vec<Value> = commands
        .iter()
        .filter(|c| needs_glue(c))
        .map(encode)
        .collect();
    Value::Array(batch).to_string()
}

/// Parse a card list posted by the page.
pub fn decode_cards(json: &str) -> Result<Vec<Card>, serde_json::Error> {
    serde_json::from_str(json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_core::ElementId;
    use folio_core::animation::Style;
    use folio_core::refresh::WatchId;
    use pretty_assertions::assert_eq;

    #[test]
    fn glue_batch_skips_direct_commands() {
        let commands = vec![
            HostCommand::SetWindowScroll { y: 828.0 },
            HostCommand::AttachDocumentListeners,
            HostCommand::PushHash {
                hash: "#about".into(),
            },
            HostCommand::ObserveResize {
                watch: WatchId::from_raw(3),
                element: ElementId::new("featured"),
            },
            HostCommand::AwaitImages {
                images: vec![ElementId::new("card-1-img")],
            },
        ];
        assert_eq!(
            encode_for_glue(&commands),
            r#"[{"kind":"attach_listeners"},{"element":"featured","kind":"observe_resize","watch":3},{"images":["card-1-img"],"kind":"await_images"}]"#
        );
    }

    #[test]
    fn style_command_carries_css_values() {
        let command = HostCommand::ApplyStyle {
            element: ElementId::new("about-title"),
            style: Style {
                opacity: 0.0,
                x: 0.0,
                y: 50.0,
                scale: 1.0,
            },
        };
        assert_eq!(
            encode(&command),
            json!({
                "kind": "style",
                "element": "about-title",
                "opacity": "0",
                "transform": "translate(0px, 50px)",
            })
        );
        assert!(!needs_glue(&command));
    }

    #[test]
    fn cards_decode_with_optional_link() {
        let cards = decode_cards(
            r#"[{"id":"1","title":"Folio","description":"Site","image":"/a.png","category":"web"},
                {"id":"2","title":"Tour","description":"","image":"","link":"https://example.org","category":"cli"}]"#,
        )
        .unwrap();
        assert_eq!(cards.len(), 2);
        assert_eq!(cards[0].link, None);
        assert_eq!(cards[1].link.as_deref(), Some("https://example.org"));
        assert_eq!(cards[1].element_id(), ElementId::new("card-2"));
    }

    #[test]
    fn malformed_cards_are_an_error() {
        assert!(decode_cards(r#"[{"id":1}]"#).is_err());
        assert!(decode_cards("not json").is_err());
    }
}
