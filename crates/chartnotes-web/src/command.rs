#![forbid(unsafe_code)]

//! Commands the overlay hands back to its JS/chart host.
//!
//! The overlay never touches the DOM or the chart directly. Every side effect
//! is returned as a [`HostCommand`] and the host applies them in order.

/// Identifies one requested animation frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FrameToken(u64);

impl FrameToken {
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

/// Host side effect emitted by an overlay dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostCommand {
    /// Subscribe document-level pointer move/up listeners.
    AttachGlobalListeners,
    /// Remove the document-level listeners added by `AttachGlobalListeners`.
    DetachGlobalListeners,
    /// Toggle the chart's own drag-to-pan/scroll handling.
    SetPanEnabled(bool),
    /// Call `animation_frame(token)` on the next display refresh.
    RequestFrame(FrameToken),
    /// Drop a previously requested frame callback.
    CancelFrame(FrameToken),
    /// Call `deferred_tick()` on the next event-loop turn (zero-delay timer).
    ScheduleDeferredReset,
    /// Ask the chart to repaint; the host batches this into its paint cycle.
    MarkDirty,
    /// Open an outbound link.
    OpenUrl(String),
}

impl HostCommand {
    #[must_use]
    pub const fn is_listener_command(&self) -> bool {
        matches!(
            self,
            Self::AttachGlobalListeners | Self::DetachGlobalListeners
        )
    }
}
