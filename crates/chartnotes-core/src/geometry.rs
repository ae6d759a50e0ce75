#![forbid(unsafe_code)]

//! Geometric primitives in chart surface pixels.
//!
//! Coordinates are `f64` pixels with the origin at the top-left corner of the
//! chart surface, matching what the host's time/value conversions return.

use serde::{Deserialize, Serialize};

/// A point on the chart surface.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ScreenPoint {
    pub x: f64,
    pub y: f64,
}

impl ScreenPoint {
    /// Create a new point.
    #[inline]
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point.
    #[inline]
    #[must_use]
    pub fn distance(self, other: ScreenPoint) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }

    /// Displacement from `origin` to `self`.
    #[inline]
    #[must_use]
    pub fn delta_from(self, origin: ScreenPoint) -> PixelOffset {
        PixelOffset::new(self.x - origin.x, self.y - origin.y)
    }

    /// Translate by an offset.
    #[inline]
    #[must_use]
    pub fn offset_by(self, offset: PixelOffset) -> ScreenPoint {
        ScreenPoint::new(self.x + offset.dx, self.y + offset.dy)
    }
}

/// Accumulated on-screen displacement applied on top of a resolved anchor.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PixelOffset {
    pub dx: f64,
    pub dy: f64,
}

impl PixelOffset {
    pub const ZERO: Self = Self { dx: 0.0, dy: 0.0 };

    #[inline]
    #[must_use]
    pub const fn new(dx: f64, dy: f64) -> Self {
        Self { dx, dy }
    }

    /// Componentwise sum.
    #[inline]
    #[must_use]
    pub fn plus(self, other: PixelOffset) -> PixelOffset {
        PixelOffset::new(self.dx + other.dx, self.dy + other.dy)
    }

    #[inline]
    #[must_use]
    pub fn is_zero(self) -> bool {
        self.dx == 0.0 && self.dy == 0.0
    }
}

/// Axis-aligned card bounds used for hit testing and drawing.
///
/// Unlike cell rectangles, both edges are inclusive: a point exactly on the
/// right or bottom border is inside the card.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CardBox {
    /// Left edge.
    pub x: f64,
    /// Top edge.
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl CardBox {
    #[inline]
    #[must_use]
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Box whose top-left corner sits at `origin`.
    #[inline]
    #[must_use]
    pub const fn at(origin: ScreenPoint, width: f64, height: f64) -> Self {
        Self::new(origin.x, origin.y, width, height)
    }

    #[inline]
    #[must_use]
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    #[inline]
    #[must_use]
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    #[inline]
    #[must_use]
    pub const fn origin(&self) -> ScreenPoint {
        ScreenPoint::new(self.x, self.y)
    }

    /// Check whether a point lies within `[x, x+width] × [y, y+height]`.
    #[inline]
    #[must_use]
    pub fn contains(&self, point: ScreenPoint) -> bool {
        point.x >= self.x
            && point.x <= self.right()
            && point.y >= self.y
            && point.y <= self.bottom()
    }
}
