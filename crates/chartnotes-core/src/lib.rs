#![forbid(unsafe_code)]

//! Core: anchor resolution, hit testing, and render snapshots for chart
//! annotation cards.
//!
//! # Role in chartnotes
//! `chartnotes-core` is platform-neutral. It owns the message records and
//! their store, turns a logical (time, value) anchor into a screen position,
//! decides which card sits under a point, and assembles the per-frame list of
//! drawables. Pointer handling lives in `chartnotes-web`, which drives these
//! pieces from host events.
//!
//! # Primary responsibilities
//! - **MessageStore**: insertion-ordered records with change notification.
//! - **AnchorResolver**: fixed or draggable positioning.
//! - **HitTester**: the single definition of a card's bounds.
//! - **build_snapshot**: drawables for the external renderer.
//! - **OverlayOptions**: validated configuration and partial patches.

pub mod coords;
pub mod geometry;
pub mod hit_test;
pub mod message;
pub mod options;
pub mod resolver;
pub mod snapshot;
pub mod store;

pub use coords::{ChartCoordinates, LinearCoordinates};
pub use geometry::{CardBox, PixelOffset, ScreenPoint};
pub use hit_test::{HitTester, card_bounds};
pub use message::{Anchor, Message, MessageId};
pub use options::{
    CardLayout, ClickSuppression, DragEndPolicy, OptionsError, OptionsPatch, OverlayOptions,
    PositioningMode,
};
pub use resolver::{AnchorResolver, DraggableResolver, ResolvedPoint};
pub use snapshot::{
    CardRenderer, CardSnapshot, CardStyle, RenderSnapshot, SnapshotContext, build_snapshot,
};
pub use store::{MessageStore, StoreChange, StoreChangeKind, Subscription};
