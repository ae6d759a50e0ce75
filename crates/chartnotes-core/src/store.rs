#![forbid(unsafe_code)]

//! Identifier-keyed message collection with change notification.
//!
//! # Design
//!
//! [`MessageStore`] keeps messages in insertion order (the order hit testing
//! and rendering walk them) and fires exactly one [`StoreChange`] per
//! mutating call. Consumers treat a change as "rebuild your derived view",
//! not as a diff to apply.
//!
//! Subscribers are held as weak references. Dropping the [`Subscription`]
//! guard unsubscribes; dead entries are pruned lazily on the next notify.
//!
//! # Invariants
//!
//! 1. Message ids are unique within the store.
//! 2. `version` increments by exactly 1 per notification.
//! 3. `update`/`remove` on an unknown id are no-ops and do not notify.
//! 4. Subscribers are notified in registration order.

use std::any::Any;
use std::rc::{Rc, Weak};

use tracing::trace;

use crate::message::{Message, MessageId};

type CallbackRc = Rc<dyn Fn(&StoreChange)>;
type CallbackWeak = Weak<dyn Fn(&StoreChange)>;

/// What a mutating call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreChangeKind {
    Added,
    /// An `add` with an id already present replaced the record in place.
    Replaced,
    Updated,
    Removed,
    Cleared,
}

/// Notification delivered to store subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreChange {
    pub kind: StoreChangeKind,
    /// Affected message; `None` for [`StoreChangeKind::Cleared`].
    pub id: Option<MessageId>,
    /// Store version after the change.
    pub version: u64,
}

/// RAII guard for a store subscription.
///
/// The callback stays registered while the guard lives.
#[must_use = "dropping the subscription unsubscribes immediately"]
pub struct Subscription {
    _guard: Box<dyn Any>,
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").finish_non_exhaustive()
    }
}

/// Insertion-ordered message collection.
#[derive(Default)]
pub struct MessageStore {
    messages: Vec<Message>,
    version: u64,
    subscribers: Vec<CallbackWeak>,
}

impl std::fmt::Debug for MessageStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageStore")
            .field("len", &self.messages.len())
            .field("version", &self.version)
            .field("subscriber_count", &self.subscribers.len())
            .finish()
    }
}

impl MessageStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a message at the end, or replace an existing record with the
    /// same id in place (keeping its position).
    pub fn add(&mut self, message: Message) {
        let id = message.id.clone();
        let kind = match self.position(&id) {
            Some(index) => {
                self.messages[index] = message;
                StoreChangeKind::Replaced
            }
            None => {
                self.messages.push(message);
                StoreChangeKind::Added
            }
        };
        self.notify(kind, Some(id));
    }

    /// Remove a message. Returns the removed record, if any.
    pub fn remove(&mut self, id: &MessageId) -> Option<Message> {
        let index = self.position(id)?;
        let removed = self.messages.remove(index);
        self.notify(StoreChangeKind::Removed, Some(id.clone()));
        Some(removed)
    }

    /// Replace the record with `message.id`. Unknown ids are ignored.
    ///
    /// Notifies even when the new record equals the old one, so listeners
    /// observe write-backs such as a completed drag.
    pub fn update(&mut self, message: Message) -> bool {
        let Some(index) = self.position(&message.id) else {
            trace!(id = %message.id, "store update ignored: unknown id");
            return false;
        };
        let id = message.id.clone();
        self.messages[index] = message;
        self.notify(StoreChangeKind::Updated, Some(id));
        true
    }

    /// Remove every message. Notifies only if the store was non-empty.
    pub fn clear(&mut self) {
        if self.messages.is_empty() {
            return;
        }
        self.messages.clear();
        self.notify(StoreChangeKind::Cleared, None);
    }

    #[must_use]
    pub fn get(&self, id: &MessageId) -> Option<&Message> {
        self.messages.iter().find(|message| &message.id == id)
    }

    #[must_use]
    pub fn contains(&self, id: &MessageId) -> bool {
        self.position(id).is_some()
    }

    /// Snapshot of all messages in insertion order.
    #[must_use]
    pub fn list(&self) -> Vec<Message> {
        self.messages.clone()
    }

    /// Borrowing iterator in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Message> + '_ {
        self.messages.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Number of notifications fired so far.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Register a change callback.
    pub fn subscribe(&mut self, callback: impl Fn(&StoreChange) + 'static) -> Subscription {
        let strong: CallbackRc = Rc::new(callback);
        self.subscribers.push(Rc::downgrade(&strong));
        Subscription {
            _guard: Box::new(strong),
        }
    }

    /// Registered subscribers, including dead ones not yet pruned.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    fn position(&self, id: &MessageId) -> Option<usize> {
        self.messages.iter().position(|message| &message.id == id)
    }

    fn notify(&mut self, kind: StoreChangeKind, id: Option<MessageId>) {
        self.version += 1;
        self.subscribers.retain(|weak| weak.strong_count() > 0);
        let callbacks: Vec<CallbackRc> = self
            .subscribers
            .iter()
            .filter_map(Weak::upgrade)
            .collect();
        let change = StoreChange {
            kind,
            id,
            version: self.version,
        };
        trace!(
            kind = ?change.kind,
            version = change.version,
            subscribers = callbacks.len(),
            "store changed"
        );
        for callback in callbacks {
            callback(&change);
        }
    }
}
