#![forbid(unsafe_code)]

//! Browser host for `folio-core`.
//!
//! The page's JavaScript glue owns event listeners and observers; this crate
//! owns everything else. `FolioRuntime` (wasm32 only) reads layout straight
//! from the DOM, feeds browser notifications to the scene, writes styles and
//! scroll positions itself, and hands back the commands only the glue can
//! perform (listener and observer installation, image and font waits) as
//! JSON built by [`wire`].
//!
//! [`css`] and [`wire`] are platform independent and tested natively.

pub mod css;
pub mod wire;

#[cfg(any(target_arch = "wasm32", test))]
mod runtime_core;

#[cfg(target_arch = "wasm32")]
mod dom;
#[cfg(target_arch = "wasm32")]
mod wasm;

#[cfg(target_arch = "wasm32")]
pub use wasm::FolioRuntime;
