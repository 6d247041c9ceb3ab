#![forbid(unsafe_code)]

//! Core: scroll-synchronized animation coordination for the folio site.
//!
//! # Role in folio
//! `folio-core` owns every decision the page makes about scroll: which
//! section is active, when an entrance animation plays, where a navigation
//! click lands, when trigger geometry must be recomputed, and where the card
//! strip snaps.
//!
//! # Primary responsibilities
//! - **ScrollObserver**: scroll-threshold triggers with enter/leave events.
//! - **TimelineController**: tweens, staggered timelines, revertible contexts.
//! - **SectionSpy**: the active-section observable consumed by navigation UI.
//! - **SmoothScrollNavigator**: header-offset scrolling, hash push, deep links.
//! - **RefreshCoordinator**: debounced geometry refresh after async DOM changes.
//! - **HorizontalSnapScroller**: snap-to-card state machine for the card strip.
//! - **ScrollScene**: the orchestrator the host talks to.
//!
//! # How it fits in the system
//! The crate is host-driven. The embedding environment answers layout
//! queries through [`host::LayoutProbe`], delivers browser notifications to
//! [`scene::ScrollScene`], advances time explicitly, and applies the
//! [`host::HostCommand`]s the scene emits. `folio-web` is the browser host;
//! `folio-harness` is a simulated one for tests.

pub mod animation;
pub mod choreography;
pub mod config;
pub mod controller;
pub mod entrance;
pub mod geometry;
pub mod host;
pub mod navigator;
pub mod observer;
pub mod reactive;
pub mod redirect;
pub mod refresh;
pub mod scene;
pub mod section;
pub mod snap;
pub mod spy;
pub mod timer;

pub use config::ScrollConfig;
pub use geometry::{Anchor, Edge, ElementId, Rect, Viewport};
pub use host::{HostCommand, LayoutProbe};
pub use observer::{ScrollObserver, TriggerEvent, TriggerHandle, TriggerSpec};
pub use scene::ScrollScene;
pub use section::{SectionId, SectionList};
