#![forbid(unsafe_code)]

//! Simulated browser for exercising `folio-core` end to end.
//!
//! - [`SimDocument`]: stacked-block layout answering [`folio_core::LayoutProbe`].
//! - [`SimHost`]: applies host commands, echoes scrolls, keeps hash history
//!   and fires resize/mutation observers.
//! - [`CommandLog`]: every applied command as JSONL plus a `blake3:` digest.
//! - [`SimClock`]: time that only moves in explicit frames.

pub mod clock;
pub mod document;
pub mod host;
pub mod log;

pub use clock::{FRAME, SimClock};
pub use document::{ImageState, SimDocument};
pub use host::SimHost;
pub use log::{CommandLog, LogEntry};
