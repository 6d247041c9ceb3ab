#![forbid(unsafe_code)]

//! Recorded host commands, as JSONL and as a stable digest.
//!
//! Two runs of the same script must produce byte-identical logs; the digest
//! (`blake3:<hex>`) is what determinism tests compare.

use std::time::Duration;

use folio_core::HostCommand;
use serde_json::{Value, json};

/// One applied command and the frame time it was applied at.
#[derive(Debug, Clone, PartialEq)]
pub struct LogEntry {
    pub at: Duration,
    pub command: HostCommand,
}

/// Append-only record of everything the scene asked the host to do.
#[derive(Debug, Default, Clone)]
pub struct CommandLog {
    entries: Vec<LogEntry>,
}

impl CommandLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, at: Duration, command: HostCommand) {
        self.entries.push(LogEntry { at, command });
    }

    #[must_use]
    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Count entries matching `pred`.
    pub fn count(&self, pred: impl Fn(&HostCommand) -> bool) -> usize {
        self.entries.iter().filter(|e| pred(&e.command)).count()
    }

    /// Every hash pushed onto history, in order.
    #[must_use]
    pub fn pushed_hashes(&self) -> Vec<&str> {
        self.entries
            .iter()
            .filter_map(|e| match &e.command {
                HostCommand::PushHash { hash } => Some(hash.as_str()),
                _ => None,
            })
            .collect()
    }

    /// One JSON object per line.
    #[must_use]
    pub fn to_jsonl(&self) -> String {
        let mut out = String::new();
        for (seq, entry) in self.entries.iter().enumerate() {
            let mut line = command_json(&entry.command);
            if let Value::Object(map) = &mut line {
                map.insert("seq".into(), json!(seq));
                map.insert("at_ms".into(), json!(entry.at.as_millis() as u64));
            }
            out.push_str(&line.to_string());
            out.push('\n');
        }
        out
    }

    /// `blake3:<hex>` over the JSONL rendering.
    #[must_use]
    pub fn digest(&self) -> String {
        let hash = blake3::hash(self.to_jsonl().as_bytes());
        format!("blake3:{}", hash.to_hex())
    }
}

/// Scroll offsets are rounded to 1/100 px so float noise cannot leak into
/// the digest.
fn px(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

fn command_json(command: &HostCommand) -> Value {
    match command {
        HostCommand::SetWindowScroll { y } => json!({"cmd": "scroll", "y": px(*y)}),
        HostCommand::SetScrollLeft { element, x } => {
            json!({"cmd": "scroll_left", "element": element.as_str(), "x": px(*x)})
        }
        HostCommand::PushHash { hash } => json!({"cmd": "push_hash", "hash": hash}),
        HostCommand::ApplyStyle { element, style } => json!({
            "cmd": "style",
            "element": element.as_str(),
            "opacity": px(f64::from(style.opacity)),
            "x": px(f64::from(style.x)),
            "y": px(f64::from(style.y)),
            "scale": px(f64::from(style.scale)),
        }),
        HostCommand::ClearStyle { element } => {
            json!({"cmd": "clear_style", "element": element.as_str()})
        }
        HostCommand::AttachDocumentListeners => json!({"cmd": "attach_listeners"}),
        HostCommand::DetachDocumentListeners => json!({"cmd": "detach_listeners"}),
        HostCommand::ObserveResize { watch, element } => {
            json!({"cmd": "observe_resize", "watch": watch.raw(), "element": element.as_str()})
        }
        HostCommand::UnobserveResize { watch } => {
            json!({"cmd": "unobserve_resize", "watch": watch.raw()})
        }
        HostCommand::ObserveMutations { watch, element } => {
            json!({"cmd": "observe_mutations", "watch": watch.raw(), "element": element.as_str()})
        }
        HostCommand::UnobserveMutations { watch } => {
            json!({"cmd": "unobserve_mutations", "watch": watch.raw()})
        }
        HostCommand::AwaitImages { images } => json!({
            "cmd": "await_images",
            "images": images.iter().map(|i| i.as_str()).collect::<Vec<_>>(),
        }),
        HostCommand::AwaitFonts => json!({"cmd": "await_fonts"}),
    }
}
