#![forbid(unsafe_code)]

//! Host-driven pointer interaction engine for annotation cards.
//!
//! [`CardOverlay`] owns the message store and the active anchor resolver and
//! turns host pointer callbacks into state transitions plus
//! [`HostCommand`]s the host applies.
//!
//! # State Machine
//!
//! - **Idle**: no drag record.
//! - **PotentialDrag**: pointer went down on a card in draggable mode; it has
//!   not yet travelled `drag_threshold` pixels.
//! - **Dragging**: threshold crossed; every global move continues the drag and
//!   schedules one coalesced frame.
//!
//! # Invariants
//!
//! 1. At most one drag record exists.
//! 2. Global listeners are attached exactly while a drag record exists, and
//!    every attach is paired with one detach. Release is idempotent and runs
//!    on pointer-up, forced mode switch, and detach.
//! 3. A confirmed drag arms the click guard, so the click produced by the same
//!    release never opens a URL.
//! 4. While a confirmed drag is active the hovered id equals the dragged id.
//! 5. A mode switch mid-drag synthesizes a release before the resolver is
//!    replaced; no listener outlives the resolver it was acquired for.
//! 6. After `detach` no listener is attached and no frame is pending.
//!
//! # Failure Modes
//!
//! Nothing here fails. Inputs that do not apply are reported as
//! [`OverlayOutcome::Ignored`] with a reason in the dispatch log.

use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

use chartnotes_core::{
    AnchorResolver, CardRenderer, ChartCoordinates, DragEndPolicy, HitTester, Message, MessageId,
    MessageStore, OptionsError, OptionsPatch, OverlayOptions, PixelOffset, PositioningMode,
    RenderSnapshot, ScreenPoint, SnapshotContext, StoreChange, Subscription, build_snapshot,
};
use tracing::{debug, trace};

use crate::click_guard::ClickGuard;
use crate::command::{FrameToken, HostCommand};
use crate::frame::FrameScheduler;

/// Pointer position plus host monotonic timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PointerSample {
    pub position: ScreenPoint,
    pub time: Duration,
}

impl PointerSample {
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self {
            position: ScreenPoint::new(x, y),
            time: Duration::ZERO,
        }
    }

    #[must_use]
    pub const fn at(x: f64, y: f64, time: Duration) -> Self {
        Self {
            position: ScreenPoint::new(x, y),
            time,
        }
    }
}

/// Drag lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractionState {
    Idle,
    PotentialDrag,
    Dragging,
}

/// Lifecycle phase recorded for one overlay dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayPhase {
    Attach,
    Detach,
    PointerDown,
    PointerMove,
    PointerUp,
    Click,
    Hover,
    AnimationFrame,
    DeferredTick,
    ModeSwitch,
    OptionsApplied,
    StoreMutation,
    OffsetReset,
}

/// Why an input was ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoredReason {
    Detached,
    AlreadyAttached,
    PositioningFixed,
    /// Nothing under the pointer; cards whose anchor is out of the visible
    /// range are never hit.
    NoCardHit,
    DragAlreadyActive,
    NoActiveDrag,
    ListenersNotAttached,
    StaleFrame,
    ClickSuppressed,
    MissingUrl,
    NothingDeferred,
    ModeUnchanged,
    UnknownMessage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayOutcome {
    Handled,
    Ignored(IgnoredReason),
}

/// Structured record of one dispatch.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayLogEntry {
    pub phase: OverlayPhase,
    pub message_id: Option<MessageId>,
    pub position: Option<ScreenPoint>,
    /// Interaction state after the dispatch.
    pub state: InteractionState,
    pub outcome: OverlayOutcome,
}

/// Result of one host callback.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayDispatch {
    pub commands: Vec<HostCommand>,
    pub log: OverlayLogEntry,
}

impl OverlayDispatch {
    #[must_use]
    pub fn is_handled(&self) -> bool {
        self.log.outcome == OverlayOutcome::Handled
    }

    #[must_use]
    pub fn ignored_reason(&self) -> Option<IgnoredReason> {
        match self.log.outcome {
            OverlayOutcome::Handled => None,
            OverlayOutcome::Ignored(reason) => Some(reason),
        }
    }

    #[must_use]
    pub fn contains(&self, command: &HostCommand) -> bool {
        self.commands.contains(command)
    }

    /// URL opened by this dispatch, if any.
    #[must_use]
    pub fn opened_url(&self) -> Option<&str> {
        self.commands.iter().find_map(|command| match command {
            HostCommand::OpenUrl(url) => Some(url.as_str()),
            _ => None,
        })
    }
}

/// What ended a drag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReleaseCause {
    PointerUp,
    ModeSwitch,
    Detach,
}

#[derive(Debug, Clone, PartialEq)]
struct DragRecord {
    id: MessageId,
    message: Message,
    start: ScreenPoint,
    last: PointerSample,
    confirmed: bool,
}

/// Single handle for the document-level move/up listeners.
#[derive(Debug, Default)]
struct GlobalListeners {
    attached: bool,
}

impl GlobalListeners {
    fn acquire(&mut self, out: &mut Vec<HostCommand>) {
        if !self.attached {
            self.attached = true;
            out.push(HostCommand::AttachGlobalListeners);
        }
    }

    fn release(&mut self, out: &mut Vec<HostCommand>) -> bool {
        if !self.attached {
            return false;
        }
        self.attached = false;
        out.push(HostCommand::DetachGlobalListeners);
        true
    }
}

/// Tracks whether chart pan/scroll is currently disabled by us.
#[derive(Debug, Default)]
struct PanLock {
    held: bool,
}

impl PanLock {
    fn acquire(&mut self, out: &mut Vec<HostCommand>) {
        if !self.held {
            self.held = true;
            out.push(HostCommand::SetPanEnabled(false));
        }
    }

    fn release(&mut self, out: &mut Vec<HostCommand>) {
        if self.held {
            self.held = false;
            out.push(HostCommand::SetPanEnabled(true));
        }
    }
}

/// Annotation card overlay.
pub struct CardOverlay {
    options: OverlayOptions,
    store: MessageStore,
    resolver: AnchorResolver,
    drag: Option<DragRecord>,
    hovered: Option<MessageId>,
    listeners: GlobalListeners,
    pan: PanLock,
    frames: FrameScheduler,
    click_guard: ClickGuard,
    attached: bool,
    store_dirty: Rc<Cell<bool>>,
    _store_subscription: Subscription,
}

impl std::fmt::Debug for CardOverlay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CardOverlay")
            .field("mode", &self.resolver.mode())
            .field("state", &self.interaction_state())
            .field("messages", &self.store.len())
            .field("hovered", &self.hovered)
            .field("attached", &self.attached)
            .field("listeners_attached", &self.listeners.attached)
            .field("pending_frame", &self.frames.pending())
            .finish()
    }
}

impl CardOverlay {
    /// Construct an overlay with validated options. It starts detached.
    pub fn new(options: OverlayOptions) -> Result<Self, OptionsError> {
        options.validate()?;
        let mut store = MessageStore::new();
        let store_dirty = Rc::new(Cell::new(false));
        let flag = Rc::clone(&store_dirty);
        let subscription = store.subscribe(move |_change| flag.set(true));
        Ok(Self {
            options,
            store,
            resolver: AnchorResolver::for_mode(options.positioning),
            drag: None,
            hovered: None,
            listeners: GlobalListeners::default(),
            pan: PanLock::default(),
            frames: FrameScheduler::new(),
            click_guard: ClickGuard::new(options.click_suppression),
            attached: false,
            store_dirty,
            _store_subscription: subscription,
        })
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    #[must_use]
    pub const fn options(&self) -> &OverlayOptions {
        &self.options
    }

    #[must_use]
    pub const fn positioning_mode(&self) -> PositioningMode {
        self.resolver.mode()
    }

    #[must_use]
    pub const fn resolver(&self) -> &AnchorResolver {
        &self.resolver
    }

    #[must_use]
    pub const fn store(&self) -> &MessageStore {
        &self.store
    }

    #[must_use]
    pub fn interaction_state(&self) -> InteractionState {
        match &self.drag {
            None => InteractionState::Idle,
            Some(drag) if drag.confirmed => InteractionState::Dragging,
            Some(_) => InteractionState::PotentialDrag,
        }
    }

    #[must_use]
    pub fn hovered_id(&self) -> Option<&MessageId> {
        self.hovered.as_ref()
    }

    /// Message with an open drag record, confirmed or not.
    #[must_use]
    pub fn drag_target(&self) -> Option<&MessageId> {
        self.drag.as_ref().map(|drag| &drag.id)
    }

    #[must_use]
    pub fn is_dragging(&self) -> bool {
        self.drag.as_ref().is_some_and(|drag| drag.confirmed)
    }

    #[must_use]
    pub const fn is_attached(&self) -> bool {
        self.attached
    }

    #[must_use]
    pub const fn global_listeners_attached(&self) -> bool {
        self.listeners.attached
    }

    #[must_use]
    pub const fn pan_disabled(&self) -> bool {
        self.pan.held
    }

    #[must_use]
    pub const fn pending_frame(&self) -> Option<FrameToken> {
        self.frames.pending()
    }

    #[must_use]
    pub const fn frames(&self) -> &FrameScheduler {
        &self.frames
    }

    /// Whether a click at host time `now` would be swallowed.
    #[must_use]
    pub fn click_suppressed(&self, now: Duration) -> bool {
        self.click_guard.suppresses(now)
    }

    #[must_use]
    pub fn offset_of(&self, id: &MessageId) -> Option<PixelOffset> {
        self.resolver.offset(id)
    }

    // -----------------------------------------------------------------------
    // Surface lifecycle
    // -----------------------------------------------------------------------

    /// The card surface was added to the chart.
    pub fn attach(&mut self) -> OverlayDispatch {
        let mut out = Vec::new();
        if self.attached {
            return self.finish(
                OverlayPhase::Attach,
                None,
                None,
                OverlayOutcome::Ignored(IgnoredReason::AlreadyAttached),
                out,
            );
        }
        self.attached = true;
        self.store_dirty.set(false);
        self.mark_dirty(&mut out);
        debug!(messages = self.store.len(), "overlay attached");
        self.finish(OverlayPhase::Attach, None, None, OverlayOutcome::Handled, out)
    }

    /// The card surface is being removed. Safe in any state.
    ///
    /// Global listeners go first so nothing can call back into a torn-down
    /// overlay, even if the pointer-up never arrives. A drag in flight is
    /// then released at its last pointer sample, store write-back included.
    pub fn detach(&mut self, coords: &impl ChartCoordinates) -> OverlayDispatch {
        let mut out = Vec::new();
        self.listeners.release(&mut out);
        self.frames.cancel(&mut out);
        let released = self.release_drag(ReleaseCause::Detach, coords, &mut out);
        if let Some(id) = &released {
            debug!(%id, "drag released by detach");
        }
        self.pan.release(&mut out);
        self.hovered = None;
        self.click_guard.reset();
        self.store_dirty.set(false);
        let was_attached = std::mem::replace(&mut self.attached, false);
        debug!(was_attached, commands = out.len(), "overlay detached");
        let outcome = if was_attached || released.is_some() {
            OverlayOutcome::Handled
        } else {
            OverlayOutcome::Ignored(IgnoredReason::Detached)
        };
        self.finish(
            OverlayPhase::Detach,
            released,
            None,
            outcome,
            out,
        )
    }

    // -----------------------------------------------------------------------
    // Surface-scoped pointer input
    // -----------------------------------------------------------------------

    /// Pointer pressed over the chart surface.
    pub fn surface_pointer_down(
        &mut self,
        sample: PointerSample,
        coords: &impl ChartCoordinates,
    ) -> OverlayDispatch {
        let out = Vec::new();
        let position = Some(sample.position);
        let refusal = if !self.attached {
            Some(IgnoredReason::Detached)
        } else if self.resolver.mode() != PositioningMode::Draggable {
            Some(IgnoredReason::PositioningFixed)
        } else if self.drag.is_some() {
            Some(IgnoredReason::DragAlreadyActive)
        } else {
            None
        };
        if let Some(reason) = refusal {
            return self.finish(
                OverlayPhase::PointerDown,
                None,
                position,
                OverlayOutcome::Ignored(reason),
                out,
            );
        }

        let Some(message) = self.hit(sample.position, coords).cloned() else {
            return self.finish(
                OverlayPhase::PointerDown,
                None,
                position,
                OverlayOutcome::Ignored(IgnoredReason::NoCardHit),
                out,
            );
        };
        self.arm_drag(message, sample, out)
    }

    /// Pointer click over the chart surface.
    pub fn surface_click(
        &mut self,
        sample: PointerSample,
        coords: &impl ChartCoordinates,
    ) -> OverlayDispatch {
        let mut out = Vec::new();
        let position = Some(sample.position);
        if !self.attached {
            return self.finish(
                OverlayPhase::Click,
                None,
                position,
                OverlayOutcome::Ignored(IgnoredReason::Detached),
                out,
            );
        }
        if self.click_guard.suppresses(sample.time) {
            trace!("click swallowed after drag");
            return self.finish(
                OverlayPhase::Click,
                None,
                position,
                OverlayOutcome::Ignored(IgnoredReason::ClickSuppressed),
                out,
            );
        }
        let Some(message) = self.hit(sample.position, coords) else {
            return self.finish(
                OverlayPhase::Click,
                None,
                position,
                OverlayOutcome::Ignored(IgnoredReason::NoCardHit),
                out,
            );
        };
        let (id, url) = (message.id.clone(), message.url.clone());
        if url.is_empty() {
            return self.finish(
                OverlayPhase::Click,
                Some(id),
                position,
                OverlayOutcome::Ignored(IgnoredReason::MissingUrl),
                out,
            );
        }
        out.push(HostCommand::OpenUrl(url));
        debug!(%id, "card link opened");
        self.finish(
            OverlayPhase::Click,
            Some(id),
            position,
            OverlayOutcome::Handled,
            out,
        )
    }

    /// Pointer moved over the chart surface (no button requirement).
    pub fn surface_hover(
        &mut self,
        sample: PointerSample,
        coords: &impl ChartCoordinates,
    ) -> OverlayDispatch {
        let mut out = Vec::new();
        let position = Some(sample.position);
        if !self.attached {
            return self.finish(
                OverlayPhase::Hover,
                None,
                position,
                OverlayOutcome::Ignored(IgnoredReason::Detached),
                out,
            );
        }
        let next = match &self.drag {
            Some(drag) if drag.confirmed => Some(drag.id.clone()),
            _ => self
                .hit(sample.position, coords)
                .map(|message| message.id.clone()),
        };
        if next != self.hovered {
            trace!(from = ?self.hovered, to = ?next, "hover changed");
            self.hovered = next.clone();
            self.mark_dirty(&mut out);
        }
        self.finish(
            OverlayPhase::Hover,
            next,
            position,
            OverlayOutcome::Handled,
            out,
        )
    }

    // -----------------------------------------------------------------------
    // Global (document-level) pointer input
    // -----------------------------------------------------------------------

    /// Pointer moved anywhere in the viewport while global listeners are on.
    pub fn global_pointer_move(&mut self, sample: PointerSample) -> OverlayDispatch {
        let mut out = Vec::new();
        let position = Some(sample.position);
        if !self.listeners.attached {
            return self.finish(
                OverlayPhase::PointerMove,
                None,
                position,
                OverlayOutcome::Ignored(IgnoredReason::ListenersNotAttached),
                out,
            );
        }
        let threshold = self.options.drag_threshold;
        let Some(drag) = self.drag.as_mut() else {
            return self.finish(
                OverlayPhase::PointerMove,
                None,
                position,
                OverlayOutcome::Ignored(IgnoredReason::NoActiveDrag),
                out,
            );
        };
        drag.last = sample;
        if !drag.confirmed && drag.start.distance(sample.position) >= threshold {
            drag.confirmed = true;
            debug!(id = %drag.id, x = sample.position.x, y = sample.position.y, "drag confirmed");
            self.hovered = Some(drag.id.clone());
        }
        let id = drag.id.clone();
        if drag.confirmed {
            if let Some(draggable) = self.resolver.as_draggable_mut() {
                let offset = draggable.continue_drag(&drag.message, sample.position);
                trace!(%id, ?offset, "drag moved");
            }
            self.frames.request(&mut out);
        }
        self.finish(
            OverlayPhase::PointerMove,
            Some(id),
            position,
            OverlayOutcome::Handled,
            out,
        )
    }

    /// Pointer released anywhere in the viewport.
    pub fn global_pointer_up(
        &mut self,
        sample: PointerSample,
        coords: &impl ChartCoordinates,
    ) -> OverlayDispatch {
        let mut out = Vec::new();
        let position = Some(sample.position);
        if !self.listeners.attached {
            return self.finish(
                OverlayPhase::PointerUp,
                None,
                position,
                OverlayOutcome::Ignored(IgnoredReason::ListenersNotAttached),
                out,
            );
        }
        if let Some(drag) = self.drag.as_mut() {
            drag.last = sample;
        }
        match self.release_drag(ReleaseCause::PointerUp, coords, &mut out) {
            Some(id) => self.finish(
                OverlayPhase::PointerUp,
                Some(id),
                position,
                OverlayOutcome::Handled,
                out,
            ),
            None => self.finish(
                OverlayPhase::PointerUp,
                None,
                position,
                OverlayOutcome::Ignored(IgnoredReason::NoActiveDrag),
                out,
            ),
        }
    }

    // -----------------------------------------------------------------------
    // Scheduled callbacks
    // -----------------------------------------------------------------------

    /// The host's animation frame for `token` arrived.
    pub fn animation_frame(&mut self, token: FrameToken) -> OverlayDispatch {
        let mut out = Vec::new();
        let outcome = if self.frames.fire(token) {
            self.mark_dirty(&mut out);
            OverlayOutcome::Handled
        } else {
            OverlayOutcome::Ignored(IgnoredReason::StaleFrame)
        };
        self.finish(OverlayPhase::AnimationFrame, None, None, outcome, out)
    }

    /// The zero-delay tick requested by `ScheduleDeferredReset` ran.
    pub fn deferred_tick(&mut self) -> OverlayDispatch {
        let outcome = if self.click_guard.clear_deferred() {
            OverlayOutcome::Handled
        } else {
            OverlayOutcome::Ignored(IgnoredReason::NothingDeferred)
        };
        self.finish(OverlayPhase::DeferredTick, None, None, outcome, Vec::new())
    }

    // -----------------------------------------------------------------------
    // Configuration
    // -----------------------------------------------------------------------

    /// Switch positioning mode. A drag in flight is released first at its
    /// last known pointer position.
    pub fn set_positioning_mode(
        &mut self,
        mode: PositioningMode,
        coords: &impl ChartCoordinates,
    ) -> OverlayDispatch {
        let mut out = Vec::new();
        if mode == self.resolver.mode() {
            return self.finish(
                OverlayPhase::ModeSwitch,
                None,
                None,
                OverlayOutcome::Ignored(IgnoredReason::ModeUnchanged),
                out,
            );
        }
        let released = self.switch_mode(mode, coords, &mut out);
        self.finish(
            OverlayPhase::ModeSwitch,
            released,
            None,
            OverlayOutcome::Handled,
            out,
        )
    }

    /// Merge a partial configuration. Invalid patches change nothing.
    pub fn apply_options(
        &mut self,
        patch: &OptionsPatch,
        coords: &impl ChartCoordinates,
    ) -> Result<OverlayDispatch, OptionsError> {
        let next = self.options.merged(patch)?;
        let mut out = Vec::new();
        // A forced release below must see the patched drag-end policy.
        self.click_guard.set_policy(next.click_suppression);
        self.options = next;
        let released = if next.positioning == self.resolver.mode() {
            None
        } else {
            self.switch_mode(next.positioning, coords, &mut out)
        };
        self.mark_dirty(&mut out);
        debug!(?patch, "overlay options applied");
        Ok(self.finish(
            OverlayPhase::OptionsApplied,
            released,
            None,
            OverlayOutcome::Handled,
            out,
        ))
    }

    // -----------------------------------------------------------------------
    // Messages
    // -----------------------------------------------------------------------

    /// Add a message, or replace the record with the same id.
    pub fn add_message(&mut self, message: Message) -> OverlayDispatch {
        let id = message.id.clone();
        self.store.add(message);
        self.finish(
            OverlayPhase::StoreMutation,
            Some(id),
            None,
            OverlayOutcome::Handled,
            Vec::new(),
        )
    }

    /// Remove a message. Removing the card being dragged is allowed; the
    /// drag keeps running and its final write-back becomes a no-op.
    pub fn remove_message(&mut self, id: &MessageId) -> OverlayDispatch {
        let mut out = Vec::new();
        let outcome = match self.store.remove(id) {
            Some(_) => {
                if self.hovered.as_ref() == Some(id) && !self.is_dragging() {
                    self.hovered = None;
                }
                OverlayOutcome::Handled
            }
            None => OverlayOutcome::Ignored(IgnoredReason::UnknownMessage),
        };
        if outcome == OverlayOutcome::Handled {
            self.mark_dirty(&mut out);
        }
        self.finish(
            OverlayPhase::StoreMutation,
            Some(id.clone()),
            None,
            outcome,
            out,
        )
    }

    /// Replace an existing message. Unknown ids are ignored.
    pub fn update_message(&mut self, message: Message) -> OverlayDispatch {
        let id = message.id.clone();
        let outcome = if self.store.update(message) {
            OverlayOutcome::Handled
        } else {
            OverlayOutcome::Ignored(IgnoredReason::UnknownMessage)
        };
        self.finish(
            OverlayPhase::StoreMutation,
            Some(id),
            None,
            outcome,
            Vec::new(),
        )
    }

    /// Drop every message. Offsets survive and reapply if ids come back.
    pub fn clear_messages(&mut self) -> OverlayDispatch {
        self.store.clear();
        if !self.is_dragging() {
            self.hovered = None;
        }
        self.finish(
            OverlayPhase::StoreMutation,
            None,
            None,
            OverlayOutcome::Handled,
            Vec::new(),
        )
    }

    /// Snapshot of all messages in insertion order.
    #[must_use]
    pub fn list_messages(&self) -> Vec<Message> {
        self.store.list()
    }

    #[must_use]
    pub fn message(&self, id: &MessageId) -> Option<&Message> {
        self.store.get(id)
    }

    /// Observe store changes (including drag write-backs).
    pub fn subscribe_messages(
        &mut self,
        callback: impl Fn(&StoreChange) + 'static,
    ) -> Subscription {
        self.store.subscribe(callback)
    }

    // -----------------------------------------------------------------------
    // Offsets
    // -----------------------------------------------------------------------

    /// Return one card to its anchor. No-op outside draggable mode.
    pub fn reset_offset(&mut self, id: &MessageId) -> OverlayDispatch {
        let mut out = Vec::new();
        let removed = self
            .resolver
            .as_draggable_mut()
            .and_then(|draggable| draggable.reset_offset(id));
        let outcome = if removed.is_some() {
            self.mark_dirty(&mut out);
            OverlayOutcome::Handled
        } else {
            OverlayOutcome::Ignored(IgnoredReason::UnknownMessage)
        };
        self.finish(
            OverlayPhase::OffsetReset,
            Some(id.clone()),
            None,
            outcome,
            out,
        )
    }

    /// Return every card to its anchor.
    pub fn clear_offsets(&mut self) -> OverlayDispatch {
        let mut out = Vec::new();
        let outcome = match self.resolver.as_draggable_mut() {
            Some(draggable) => {
                draggable.clear_offsets();
                self.mark_dirty(&mut out);
                OverlayOutcome::Handled
            }
            None => OverlayOutcome::Ignored(IgnoredReason::PositioningFixed),
        };
        self.finish(OverlayPhase::OffsetReset, None, None, outcome, out)
    }

    // -----------------------------------------------------------------------
    // Rendering
    // -----------------------------------------------------------------------

    /// Drawables for the current frame.
    #[must_use]
    pub fn snapshot(&self, coords: &impl ChartCoordinates) -> RenderSnapshot {
        build_snapshot(
            &self.store,
            &self.resolver,
            coords,
            &self.options.layout(),
            SnapshotContext {
                hovered: self.hovered.as_ref(),
                dragging: self
                    .drag
                    .as_ref()
                    .filter(|drag| drag.confirmed)
                    .map(|drag| &drag.id),
                visible: self.options.visible,
            },
        )
    }

    /// Build the snapshot and hand it to `renderer`.
    pub fn render(&self, coords: &impl ChartCoordinates, renderer: &mut impl CardRenderer) {
        let snapshot = self.snapshot(coords);
        trace!(cards = snapshot.len(), "rendering overlay");
        renderer.render(&snapshot);
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    fn hit(&self, point: ScreenPoint, coords: &impl ChartCoordinates) -> Option<&Message> {
        if !self.options.visible {
            return None;
        }
        HitTester::new(&self.resolver, coords, self.options.layout())
            .message_at(self.store.iter(), point)
    }

    fn arm_drag(
        &mut self,
        message: Message,
        sample: PointerSample,
        mut out: Vec<HostCommand>,
    ) -> OverlayDispatch {
        self.pan.acquire(&mut out);
        if let Some(draggable) = self.resolver.as_draggable_mut() {
            draggable.begin_drag(&message, sample.position);
        }
        let id = message.id.clone();
        self.drag = Some(DragRecord {
            id: id.clone(),
            message,
            start: sample.position,
            last: sample,
            confirmed: false,
        });
        self.listeners.acquire(&mut out);
        debug!(%id, x = sample.position.x, y = sample.position.y, "drag armed");
        self.finish(
            OverlayPhase::PointerDown,
            Some(id),
            Some(sample.position),
            OverlayOutcome::Handled,
            out,
        )
    }

    /// Normal up-transition. Returns the released message id.
    fn release_drag(
        &mut self,
        cause: ReleaseCause,
        coords: &impl ChartCoordinates,
        out: &mut Vec<HostCommand>,
    ) -> Option<MessageId> {
        let drag = self.drag.take()?;
        if let Some(draggable) = self.resolver.as_draggable_mut() {
            let retained = draggable.end_drag(&drag.message);
            if drag.confirmed {
                let mut record = self
                    .store
                    .get(&drag.id)
                    .cloned()
                    .unwrap_or_else(|| drag.message.clone());
                if self.options.drag_end == DragEndPolicy::CommitAnchor
                    && let Some(anchor) = draggable.commit_to_anchor(&mut record, coords)
                {
                    debug!(id = %drag.id, time = anchor.time, value = anchor.value, "drag committed to anchor");
                }
                let written = self.store.update(record);
                debug!(id = %drag.id, ?retained, written, ?cause, "drag finished");
            }
        }
        // No click can follow a detach, so the guard stays disarmed.
        if drag.confirmed && cause != ReleaseCause::Detach {
            self.click_guard.arm(drag.last.time, out);
        }
        self.pan.release(out);
        self.listeners.release(out);
        Some(drag.id)
    }

    fn switch_mode(
        &mut self,
        mode: PositioningMode,
        coords: &impl ChartCoordinates,
        out: &mut Vec<HostCommand>,
    ) -> Option<MessageId> {
        let released = if self.drag.is_some() {
            let released = self.release_drag(ReleaseCause::ModeSwitch, coords, out);
            debug!(id = ?released, "forced release before mode switch");
            released
        } else {
            None
        };
        debug!(from = ?self.resolver.mode(), to = ?mode, "positioning mode switched");
        self.resolver = AnchorResolver::for_mode(mode);
        self.options.positioning = mode;
        self.mark_dirty(out);
        released
    }

    fn mark_dirty(&self, out: &mut Vec<HostCommand>) {
        if self.attached && !out.contains(&HostCommand::MarkDirty) {
            out.push(HostCommand::MarkDirty);
        }
    }

    fn finish(
        &mut self,
        phase: OverlayPhase,
        message_id: Option<MessageId>,
        position: Option<ScreenPoint>,
        outcome: OverlayOutcome,
        mut commands: Vec<HostCommand>,
    ) -> OverlayDispatch {
        if self.store_dirty.replace(false) {
            self.mark_dirty(&mut commands);
        }
        let log = OverlayLogEntry {
            phase,
            message_id,
            position,
            state: self.interaction_state(),
            outcome,
        };
        trace!(?phase, ?outcome, commands = commands.len(), "overlay dispatch");
        OverlayDispatch { commands, log }
    }
}
