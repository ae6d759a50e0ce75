#![forbid(unsafe_code)]

//! Per-frame render snapshot.
//!
//! [`build_snapshot`] resolves every message to a [`CardSnapshot`] that the
//! external renderer draws. It never draws anything itself.

use crate::coords::ChartCoordinates;
use crate::geometry::{CardBox, ScreenPoint};
use crate::hit_test::card_bounds;
use crate::message::{Message, MessageId};
use crate::options::CardLayout;
use crate::resolver::{AnchorResolver, base_position};
use crate::store::MessageStore;

/// Style hints carried to the renderer. Palette and icon lookup by source
/// platform happen on the renderer side.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CardStyle {
    /// Message-level accent color override.
    pub accent: Option<String>,
    pub padding: f64,
    pub line_height: f64,
}

/// One drawable card.
#[derive(Debug, Clone, PartialEq)]
pub struct CardSnapshot {
    pub message: Message,
    /// Top-left corner of the card as displayed (anchor plus any drag offset).
    pub position: ScreenPoint,
    /// Undisplaced anchor point for the connector line.
    pub anchor: Option<ScreenPoint>,
    pub bounds: CardBox,
    pub hovered: bool,
    pub dragging: bool,
    pub style: CardStyle,
}

impl CardSnapshot {
    /// Whether a connector should be drawn from the card to its data point.
    #[must_use]
    pub fn has_connector(&self) -> bool {
        self.anchor.is_some_and(|anchor| anchor != self.position)
    }
}

/// Ordered drawables for one frame.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RenderSnapshot {
    pub cards: Vec<CardSnapshot>,
}

impl RenderSnapshot {
    #[must_use]
    pub fn card(&self, id: &MessageId) -> Option<&CardSnapshot> {
        self.cards.iter().find(|card| &card.message.id == id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }
}

/// Drawing side of the host.
pub trait CardRenderer {
    fn render(&mut self, snapshot: &RenderSnapshot);
}

/// Interaction state the snapshot needs to flag cards.
#[derive(Debug, Clone, Copy, Default)]
pub struct SnapshotContext<'a> {
    pub hovered: Option<&'a MessageId>,
    pub dragging: Option<&'a MessageId>,
    pub visible: bool,
}

/// Resolve every displayable message in store order.
#[must_use]
pub fn build_snapshot(
    store: &MessageStore,
    resolver: &AnchorResolver,
    coords: &impl ChartCoordinates,
    layout: &CardLayout,
    context: SnapshotContext<'_>,
) -> RenderSnapshot {
    if !context.visible {
        return RenderSnapshot::default();
    }
    let cards = store
        .iter()
        .filter_map(|message| {
            let bounds = card_bounds(message, resolver, coords, layout)?;
            Some(CardSnapshot {
                position: bounds.origin(),
                anchor: base_position(message, coords).point(),
                bounds,
                hovered: context.hovered == Some(&message.id),
                dragging: context.dragging == Some(&message.id),
                style: CardStyle {
                    accent: message.color.clone(),
                    padding: layout.padding,
                    line_height: layout.line_height,
                },
                message: message.clone(),
            })
        })
        .collect();
    RenderSnapshot { cards }
}
