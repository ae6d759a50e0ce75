#![forbid(unsafe_code)]

//! Redraw coalescing aligned to animation frames.
//!
//! Any number of redraw requests between two display refreshes collapse into
//! one pending frame. A new request replaces the pending one (cancel plus
//! request), so at most one frame callback is ever outstanding.

use tracing::trace;

use crate::command::{FrameToken, HostCommand};

#[derive(Debug, Clone, Default)]
pub struct FrameScheduler {
    next_token: u64,
    pending: Option<FrameToken>,
    requested: u64,
    fired: u64,
}

impl FrameScheduler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule a redraw, replacing any pending one.
    pub fn request(&mut self, out: &mut Vec<HostCommand>) -> FrameToken {
        if let Some(previous) = self.pending.take() {
            out.push(HostCommand::CancelFrame(previous));
        }
        self.next_token = self.next_token.saturating_add(1);
        let token = FrameToken::new(self.next_token);
        self.pending = Some(token);
        self.requested += 1;
        out.push(HostCommand::RequestFrame(token));
        token
    }

    /// Host delivered a frame. Returns true only for the pending token.
    pub fn fire(&mut self, token: FrameToken) -> bool {
        if self.pending != Some(token) {
            trace!(token = token.get(), "stale frame dropped");
            return false;
        }
        self.pending = None;
        self.fired += 1;
        true
    }

    /// Cancel the pending frame, if any.
    pub fn cancel(&mut self, out: &mut Vec<HostCommand>) -> Option<FrameToken> {
        let token = self.pending.take()?;
        out.push(HostCommand::CancelFrame(token));
        Some(token)
    }

    #[must_use]
    pub const fn pending(&self) -> Option<FrameToken> {
        self.pending
    }

    /// Total `request` calls.
    #[must_use]
    pub const fn requested(&self) -> u64 {
        self.requested
    }

    /// Frames that actually fired.
    #[must_use]
    pub const fn fired(&self) -> u64 {
        self.fired
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rapid_requests_leave_one_pending_frame() {
        let mut frames = FrameScheduler::new();
        let mut out = Vec::new();
        let first = frames.request(&mut out);
        let second = frames.request(&mut out);
        let third = frames.request(&mut out);
        assert_eq!(frames.pending(), Some(third));
        assert_eq!(
            out,
            vec![
                HostCommand::RequestFrame(first),
                HostCommand::CancelFrame(first),
                HostCommand::RequestFrame(second),
                HostCommand::CancelFrame(second),
                HostCommand::RequestFrame(third),
            ]
        );
        assert!(!frames.fire(first));
        assert!(frames.fire(third));
        assert_eq!(frames.pending(), None);
        assert_eq!(frames.fired(), 1);
        assert_eq!(frames.requested(), 3);
    }

    #[test]
    fn cancel_is_idempotent() {
        let mut frames = FrameScheduler::new();
        let mut out = Vec::new();
        let token = frames.request(&mut out);
        out.clear();
        assert_eq!(frames.cancel(&mut out), Some(token));
        assert_eq!(frames.cancel(&mut out), None);
        assert_eq!(out, vec![HostCommand::CancelFrame(token)]);
        assert!(!frames.fire(token));
    }
}
