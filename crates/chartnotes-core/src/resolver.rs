#![forbid(unsafe_code)]

//! Anchor resolution: logical (time, value) anchor to screen position.
//!
//! [`AnchorResolver`] has one variant per [`PositioningMode`]:
//!
//! - **Fixed**: stateless; returns the host conversion unmodified.
//! - **Draggable**: host conversion plus an accumulated per-message
//!   [`PixelOffset`]. Returns nothing unless both base coordinates resolve.
//!
//! # Invariants
//!
//! 1. Offsets exist only inside the draggable variant; switching modes
//!    replaces the resolver and drops them.
//! 2. An offset is created by the first `continue_drag` for a message and is
//!    removed only by [`DraggableResolver::reset_offset`],
//!    [`DraggableResolver::clear_offsets`], or a committed drag.
//! 3. `end_drag` never moves a card.
//! 4. A drag continues from the offset in effect when it began, so repeated
//!    drags accumulate instead of jumping back to the anchor.

use std::collections::HashMap;

use tracing::trace;

use crate::coords::ChartCoordinates;
use crate::geometry::{PixelOffset, ScreenPoint};
use crate::message::{Anchor, Message, MessageId};
use crate::options::PositioningMode;

/// Resolver output; either coordinate may be missing when out of range.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ResolvedPoint {
    pub x: Option<f64>,
    pub y: Option<f64>,
}

impl ResolvedPoint {
    pub const NONE: Self = Self { x: None, y: None };

    /// Both coordinates, or `None` if either is missing.
    #[must_use]
    pub fn point(self) -> Option<ScreenPoint> {
        Some(ScreenPoint::new(self.x?, self.y?))
    }
}

impl From<ScreenPoint> for ResolvedPoint {
    fn from(point: ScreenPoint) -> Self {
        Self {
            x: Some(point.x),
            y: Some(point.y),
        }
    }
}

/// Host conversion of the undisplaced anchor.
#[must_use]
pub fn base_position(message: &Message, coords: &impl ChartCoordinates) -> ResolvedPoint {
    ResolvedPoint {
        x: coords.time_to_x(message.anchor.time),
        y: coords.value_to_y(message.anchor.value),
    }
}

#[derive(Debug, Clone, PartialEq)]
struct DragOrigin {
    id: MessageId,
    pointer_start: ScreenPoint,
    initial_offset: PixelOffset,
}

/// Resolver state for draggable positioning.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DraggableResolver {
    offsets: HashMap<MessageId, PixelOffset>,
    origin: Option<DragOrigin>,
}

impl DraggableResolver {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Base position plus the message's offset.
    #[must_use]
    pub fn resolve(&self, message: &Message, coords: &impl ChartCoordinates) -> ResolvedPoint {
        let Some(base) = base_position(message, coords).point() else {
            return ResolvedPoint::NONE;
        };
        let offset = self.offset(&message.id).unwrap_or(PixelOffset::ZERO);
        base.offset_by(offset).into()
    }

    /// Record where the pointer went down and the offset in effect.
    pub fn begin_drag(&mut self, message: &Message, pointer: ScreenPoint) {
        let initial_offset = self.offset(&message.id).unwrap_or(PixelOffset::ZERO);
        trace!(id = %message.id, x = pointer.x, y = pointer.y, "resolver drag origin recorded");
        self.origin = Some(DragOrigin {
            id: message.id.clone(),
            pointer_start: pointer,
            initial_offset,
        });
    }

    /// Set the offset to `initial + (pointer - start)`.
    ///
    /// Returns the new offset, or `None` when no drag of this message began.
    pub fn continue_drag(&mut self, message: &Message, pointer: ScreenPoint) -> Option<PixelOffset> {
        let origin = self.origin.as_ref().filter(|origin| origin.id == message.id)?;
        let offset = origin
            .initial_offset
            .plus(pointer.delta_from(origin.pointer_start));
        self.offsets.insert(message.id.clone(), offset);
        Some(offset)
    }

    /// Forget the drag origin. Coordinates and anchor are left alone.
    ///
    /// Returns the offset retained for the message.
    pub fn end_drag(&mut self, message: &Message) -> Option<PixelOffset> {
        if self
            .origin
            .as_ref()
            .is_some_and(|origin| origin.id == message.id)
        {
            self.origin = None;
        }
        self.offset(&message.id)
    }

    /// Convert the displayed position back to data coordinates.
    ///
    /// On success rewrites `message.anchor`, drops the offset, and returns
    /// the new anchor. If either inverse conversion fails nothing changes.
    pub fn commit_to_anchor(
        &mut self,
        message: &mut Message,
        coords: &impl ChartCoordinates,
    ) -> Option<Anchor> {
        let displayed = self.resolve(message, coords).point()?;
        let time = coords.x_to_time(displayed.x)?;
        let value = coords.y_to_value(displayed.y)?;
        let anchor = Anchor::new(time, value);
        message.anchor = anchor;
        self.offsets.remove(&message.id);
        Some(anchor)
    }

    /// Drop one message's offset so its card returns to the anchor.
    pub fn reset_offset(&mut self, id: &MessageId) -> Option<PixelOffset> {
        self.offsets.remove(id)
    }

    pub fn clear_offsets(&mut self) {
        self.offsets.clear();
    }

    #[must_use]
    pub fn offset(&self, id: &MessageId) -> Option<PixelOffset> {
        self.offsets.get(id).copied()
    }

    #[must_use]
    pub fn offset_count(&self) -> usize {
        self.offsets.len()
    }

    /// Message whose drag origin is currently recorded.
    #[must_use]
    pub fn dragging(&self) -> Option<&MessageId> {
        self.origin.as_ref().map(|origin| &origin.id)
    }
}

/// Active positioning strategy.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum AnchorResolver {
    #[default]
    Fixed,
    Draggable(DraggableResolver),
}

impl AnchorResolver {
    /// Fresh resolver for a mode.
    #[must_use]
    pub fn for_mode(mode: PositioningMode) -> Self {
        match mode {
            PositioningMode::Fixed => Self::Fixed,
            PositioningMode::Draggable => Self::Draggable(DraggableResolver::new()),
        }
    }

    #[must_use]
    pub const fn mode(&self) -> PositioningMode {
        match self {
            Self::Fixed => PositioningMode::Fixed,
            Self::Draggable(_) => PositioningMode::Draggable,
        }
    }

    /// Displayed position of a message.
    #[must_use]
    pub fn resolve(&self, message: &Message, coords: &impl ChartCoordinates) -> ResolvedPoint {
        match self {
            Self::Fixed => base_position(message, coords),
            Self::Draggable(draggable) => draggable.resolve(message, coords),
        }
    }

    /// Displayed position with both coordinates present.
    #[must_use]
    pub fn resolve_point(
        &self,
        message: &Message,
        coords: &impl ChartCoordinates,
    ) -> Option<ScreenPoint> {
        self.resolve(message, coords).point()
    }

    #[must_use]
    pub fn as_draggable(&self) -> Option<&DraggableResolver> {
        match self {
            Self::Fixed => None,
            Self::Draggable(draggable) => Some(draggable),
        }
    }

    pub fn as_draggable_mut(&mut self) -> Option<&mut DraggableResolver> {
        match self {
            Self::Fixed => None,
            Self::Draggable(draggable) => Some(draggable),
        }
    }

    /// Offset for a message; always `None` in fixed mode.
    #[must_use]
    pub fn offset(&self, id: &MessageId) -> Option<PixelOffset> {
        self.as_draggable().and_then(|draggable| draggable.offset(id))
    }
}
