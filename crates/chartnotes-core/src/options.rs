#![forbid(unsafe_code)]

//! Overlay configuration.
//!
//! [`OverlayOptions`] is the full, validated configuration. [`OptionsPatch`]
//! carries a partial update where every field is optional; merging a patch
//! never touches fields it leaves unset.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::geometry::{CardBox, ScreenPoint};

/// Default drag start threshold in pixels.
pub const DEFAULT_DRAG_THRESHOLD: f64 = 5.0;
/// Default card width in pixels.
pub const DEFAULT_CARD_WIDTH: f64 = 260.0;
/// Default card padding in pixels.
pub const DEFAULT_CARD_PADDING: f64 = 12.0;
/// Default height of one text line in pixels.
pub const DEFAULT_LINE_HEIGHT: f64 = 18.0;
/// Number of fixed text lines on a card (header, body, footer).
pub const CARD_TEXT_LINES: u32 = 3;

/// How card positions are resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PositioningMode {
    /// Cards sit exactly on their anchor.
    #[default]
    Fixed,
    /// Cards can be nudged by dragging; nudges accumulate as pixel offsets.
    Draggable,
}

/// What happens to a card's logical anchor when a drag completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DragEndPolicy {
    /// Keep the pixel offset and leave the (time, value) anchor untouched.
    #[default]
    RetainOffset,
    /// Convert the displayed position back to (time, value) and drop the
    /// offset. Falls back to retaining the offset when the host cannot
    /// invert the position.
    CommitAnchor,
}

/// How a click produced by the same physical release as a drag is swallowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClickSuppression {
    /// Flag cleared on the host's next zero-delay tick after release.
    #[default]
    DeferredReset,
    /// Clicks within `millis` of the last confirmed drag end are swallowed.
    Window { millis: u64 },
}

impl ClickSuppression {
    /// Window length for [`ClickSuppression::Window`].
    #[must_use]
    pub const fn window(&self) -> Option<Duration> {
        match self {
            Self::DeferredReset => None,
            Self::Window { millis } => Some(Duration::from_millis(*millis)),
        }
    }
}

/// Fixed card geometry shared by hit testing and rendering.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CardLayout {
    pub width: f64,
    pub padding: f64,
    pub line_height: f64,
}

impl CardLayout {
    /// Card height: padding on both sides plus three text lines.
    #[must_use]
    pub fn height(&self) -> f64 {
        2.0 * self.padding + f64::from(CARD_TEXT_LINES) * self.line_height
    }

    /// Bounds of a card whose top-left corner sits at `origin`.
    #[must_use]
    pub fn bounds_at(&self, origin: ScreenPoint) -> CardBox {
        CardBox::at(origin, self.width, self.height())
    }
}

impl Default for CardLayout {
    fn default() -> Self {
        Self {
            width: DEFAULT_CARD_WIDTH,
            padding: DEFAULT_CARD_PADDING,
            line_height: DEFAULT_LINE_HEIGHT,
        }
    }
}

/// Configuration rejected by [`OverlayOptions::validate`] or the JSON loader.
#[derive(Debug, Error)]
pub enum OptionsError {
    #[error("card width must be finite and positive, got {0}")]
    InvalidCardWidth(f64),
    #[error("card padding must be finite and non-negative, got {0}")]
    InvalidPadding(f64),
    #[error("line height must be finite and positive, got {0}")]
    InvalidLineHeight(f64),
    #[error("drag threshold must be finite and non-negative, got {0}")]
    InvalidDragThreshold(f64),
    #[error("failed to parse overlay options JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Complete overlay configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayOptions {
    pub positioning: PositioningMode,
    pub card_width: f64,
    pub padding: f64,
    pub line_height: f64,
    /// Minimum pointer travel (Euclidean, pixels) before a press becomes a drag.
    pub drag_threshold: f64,
    pub drag_end: DragEndPolicy,
    pub click_suppression: ClickSuppression,
    /// When false no cards are hit-tested or rendered.
    pub visible: bool,
}

impl Default for OverlayOptions {
    fn default() -> Self {
        Self {
            positioning: PositioningMode::default(),
            card_width: DEFAULT_CARD_WIDTH,
            padding: DEFAULT_CARD_PADDING,
            line_height: DEFAULT_LINE_HEIGHT,
            drag_threshold: DEFAULT_DRAG_THRESHOLD,
            drag_end: DragEndPolicy::default(),
            click_suppression: ClickSuppression::default(),
            visible: true,
        }
    }
}

impl OverlayOptions {
    /// Parse and validate options from JSON. Missing fields take defaults.
    pub fn from_json_str(raw: &str) -> Result<Self, OptionsError> {
        let options: Self = serde_json::from_str(raw)?;
        options.validate()?;
        Ok(options)
    }

    /// Check geometry and threshold values.
    pub fn validate(&self) -> Result<(), OptionsError> {
        if !self.card_width.is_finite() || self.card_width <= 0.0 {
            return Err(OptionsError::InvalidCardWidth(self.card_width));
        }
        if !self.padding.is_finite() || self.padding < 0.0 {
            return Err(OptionsError::InvalidPadding(self.padding));
        }
        if !self.line_height.is_finite() || self.line_height <= 0.0 {
            return Err(OptionsError::InvalidLineHeight(self.line_height));
        }
        if !self.drag_threshold.is_finite() || self.drag_threshold < 0.0 {
            return Err(OptionsError::InvalidDragThreshold(self.drag_threshold));
        }
        Ok(())
    }

    #[must_use]
    pub fn layout(&self) -> CardLayout {
        CardLayout {
            width: self.card_width,
            padding: self.padding,
            line_height: self.line_height,
        }
    }

    /// Merge a patch into a copy of these options and validate the result.
    pub fn merged(&self, patch: &OptionsPatch) -> Result<Self, OptionsError> {
        let mut next = *self;
        if let Some(positioning) = patch.positioning {
            next.positioning = positioning;
        }
        if let Some(card_width) = patch.card_width {
            next.card_width = card_width;
        }
        if let Some(padding) = patch.padding {
            next.padding = padding;
        }
        if let Some(line_height) = patch.line_height {
            next.line_height = line_height;
        }
        if let Some(drag_threshold) = patch.drag_threshold {
            next.drag_threshold = drag_threshold;
        }
        if let Some(drag_end) = patch.drag_end {
            next.drag_end = drag_end;
        }
        if let Some(click_suppression) = patch.click_suppression {
            next.click_suppression = click_suppression;
        }
        if let Some(visible) = patch.visible {
            next.visible = visible;
        }
        next.validate()?;
        Ok(next)
    }
}

/// Partial options update.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OptionsPatch {
    pub positioning: Option<PositioningMode>,
    pub card_width: Option<f64>,
    pub padding: Option<f64>,
    pub line_height: Option<f64>,
    pub drag_threshold: Option<f64>,
    pub drag_end: Option<DragEndPolicy>,
    pub click_suppression: Option<ClickSuppression>,
    pub visible: Option<bool>,
}

impl OptionsPatch {
    #[must_use]
    pub fn positioning(mode: PositioningMode) -> Self {
        Self {
            positioning: Some(mode),
            ..Self::default()
        }
    }

    pub fn from_json_str(raw: &str) -> Result<Self, OptionsError> {
        Ok(serde_json::from_str(raw)?)
    }
}
