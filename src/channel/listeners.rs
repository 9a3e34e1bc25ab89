//! Message listener registry.
//!
//! Listeners are kept in a map keyed by [`ListenerId`]. Dispatch takes a
//! snapshot of the map first, so a listener may register or remove
//! listeners (or call back into the channel) while being invoked.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use tracing::{debug, error, trace};

use crate::identifiers::ListenerId;
use crate::protocol::Message;

// ============================================================================
// Types
// ============================================================================

/// Message listener callback.
///
/// Called once per inbound message. A panic inside a listener is caught
/// and logged; the other listeners still receive the message.
pub type Listener = Arc<dyn Fn(&Message) + Send + Sync>;

// ============================================================================
// ListenerRegistry
// ============================================================================

/// Set of registered listeners.
#[derive(Default)]
pub(crate) struct ListenerRegistry {
    listeners: RwLock<FxHashMap<ListenerId, Listener>>,
}

impl ListenerRegistry {
    /// Registers a listener and returns its id.
    pub(crate) fn insert(&self, listener: Listener) -> ListenerId {
        let id = ListenerId::generate();
        self.listeners.write().insert(id, listener);
        debug!(listener = %id, "Listener registered");
        id
    }

    /// Removes a listener. Returns `false` if it was not registered.
    pub(crate) fn remove(&self, id: ListenerId) -> bool {
        let removed = self.listeners.write().remove(&id).is_some();
        if removed {
            debug!(listener = %id, "Listener removed");
        }
        removed
    }

    /// Returns the number of registered listeners.
    pub(crate) fn len(&self) -> usize {
        self.listeners.read().len()
    }

    /// Delivers a message to every registered listener.
    ///
    /// Returns the number of listeners that panicked.
    pub(crate) fn dispatch(&self, message: &Message) -> usize {
        let snapshot: Vec<(ListenerId, Listener)> = self
            .listeners
            .read()
            .iter()
            .map(|(id, listener)| (*id, Arc::clone(listener)))
            .collect();

        let mut failures = 0;
        for (id, listener) in snapshot {
            if catch_unwind(AssertUnwindSafe(|| listener(message))).is_err() {
                failures += 1;
                error!(
                    listener = %id,
                    message_type = message.message_type(),
                    "Message listener panicked"
                );
            }
        }

        trace!(message_type = message.message_type(), failures, "Message dispatched");
        failures
    }
}

impl fmt::Debug for ListenerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerRegistry")
            .field("len", &self.len())
            .finish()
    }
}

// ============================================================================
// Subscription
// ============================================================================

/// Handle returned by [`NotificationChannel::on_message`](crate::NotificationChannel::on_message).
///
/// Dropping the handle does not remove the listener; call
/// [`unsubscribe`](Self::unsubscribe).
pub struct Subscription {
    id: ListenerId,
    registry: Weak<ListenerRegistry>,
    active: AtomicBool,
}

impl Subscription {
    pub(crate) fn new(id: ListenerId, registry: &Arc<ListenerRegistry>) -> Self {
        Self {
            id,
            registry: Arc::downgrade(registry),
            active: AtomicBool::new(true),
        }
    }

    /// Returns the listener id.
    #[inline]
    #[must_use]
    pub fn id(&self) -> ListenerId {
        self.id
    }

    /// Returns `true` until [`unsubscribe`](Self::unsubscribe) has run.
    #[inline]
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Removes the listener.
    ///
    /// Returns `true` only for the call that actually removed it; later
    /// calls are no-ops.
    pub fn unsubscribe(&self) -> bool {
        if !self.active.swap(false, Ordering::AcqRel) {
            return false;
        }

        self.registry
            .upgrade()
            .is_some_and(|registry| registry.remove(self.id))
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("active", &self.is_active())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
