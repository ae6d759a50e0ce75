#![forbid(unsafe_code)]

//! Host-driven interaction layer for chart annotation cards.
//!
//! # Role in chartnotes
//! `chartnotes-web` sits between a browser (or any event-loop host) and
//! `chartnotes-core`. The host forwards pointer callbacks, frame callbacks,
//! and lifecycle events into [`CardOverlay`]; each call returns an
//! [`OverlayDispatch`] whose [`HostCommand`]s the host applies in order.
//!
//! Nothing here touches a DOM, a timer, or a clock. Timestamps arrive with
//! pointer samples and scheduling is expressed as commands, so every
//! interaction sequence replays deterministically in tests.

mod click_guard;
pub mod command;
pub mod frame;
pub mod overlay;

pub use command::{FrameToken, HostCommand};
pub use frame::FrameScheduler;
pub use overlay::{
    CardOverlay, IgnoredReason, InteractionState, OverlayDispatch, OverlayLogEntry,
    OverlayOutcome, OverlayPhase, PointerSample,
};
