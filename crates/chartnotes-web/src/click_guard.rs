#![forbid(unsafe_code)]

//! Click-after-drag suppression.
//!
//! Hosts deliver `click` after `mouseup` for the same physical release. With
//! [`ClickSuppression::DeferredReset`] the guard stays armed until the host
//! runs the zero-delay tick it was asked to schedule, so the click handler
//! still sees it. With [`ClickSuppression::Window`] the guard compares host
//! timestamps instead and needs no deferred tick.

use std::time::Duration;

use chartnotes_core::ClickSuppression;

use crate::command::HostCommand;

#[derive(Debug, Clone, Default)]
pub(crate) struct ClickGuard {
    policy: ClickSuppression,
    armed: bool,
    last_drag_end: Option<Duration>,
}

impl ClickGuard {
    pub(crate) fn new(policy: ClickSuppression) -> Self {
        Self {
            policy,
            armed: false,
            last_drag_end: None,
        }
    }

    /// A confirmed drag just ended at host time `now`.
    pub(crate) fn arm(&mut self, now: Duration, out: &mut Vec<HostCommand>) {
        match self.policy {
            ClickSuppression::DeferredReset => {
                if !self.armed {
                    out.push(HostCommand::ScheduleDeferredReset);
                }
                self.armed = true;
            }
            ClickSuppression::Window { .. } => {
                self.last_drag_end = Some(now);
            }
        }
    }

    /// Zero-delay tick ran. Returns whether the guard was armed.
    pub(crate) fn clear_deferred(&mut self) -> bool {
        std::mem::take(&mut self.armed)
    }

    pub(crate) fn suppresses(&self, now: Duration) -> bool {
        match self.policy.window() {
            None => self.armed,
            Some(window) => self
                .last_drag_end
                .and_then(|end| now.checked_sub(end))
                .is_some_and(|elapsed| elapsed <= window),
        }
    }

    pub(crate) fn set_policy(&mut self, policy: ClickSuppression) {
        if self.policy != policy {
            *self = Self::new(policy);
        }
    }

    pub(crate) fn reset(&mut self) {
        self.armed = false;
        self.last_drag_end = None;
    }
}
