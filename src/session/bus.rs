//! In-process fan-out of inbound messages to one-shot listeners.
//!
//! Listeners are keyed by the discriminator (`name`) they wait for. A
//! dispatch fires and removes every listener registered under the message's
//! name, oldest first, and leaves all other keys untouched.

// ============================================================================
// Imports
// ============================================================================

use std::collections::VecDeque;
use std::fmt;

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use tracing::trace;

use crate::protocol::InboundMessage;

// ============================================================================
// Types
// ============================================================================

/// One-shot listener callback.
pub type Listener = Box<dyn FnOnce(InboundMessage) + Send>;

/// Identifies a registered listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "listener-{}", self.0)
    }
}

/// A registered listener.
struct Entry {
    id: ListenerId,
    listener: Listener,
}

/// Listener table.
#[derive(Default)]
struct Registry {
    /// Next identifier to hand out.
    next_id: u64,
    /// Listeners by name, in registration order.
    by_name: FxHashMap<String, VecDeque<Entry>>,
    /// Name of every registered listener.
    names: FxHashMap<ListenerId, String>,
}

// ============================================================================
// MessageBus
// ============================================================================

/// Distributes inbound messages to one-shot listeners.
#[derive(Default)]
pub struct MessageBus {
    registry: Mutex<Registry>,
}

impl fmt::Debug for MessageBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MessageBus")
            .field("pending", &self.pending_count())
            .finish()
    }
}

impl MessageBus {
    /// Creates an empty bus.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a one-shot listener for messages named `name`.
    pub fn register(&self, name: impl Into<String>, listener: Listener) -> ListenerId {
        let name = name.into();
        let mut registry = self.registry.lock();

        let id = ListenerId(registry.next_id);
        registry.next_id += 1;

        registry.names.insert(id, name.clone());
        registry
            .by_name
            .entry(name)
            .or_default()
            .push_back(Entry { id, listener });

        trace!(%id, "Listener registered");
        id
    }

    /// Fires and removes every listener registered for `message.name()`.
    ///
    /// Listeners run in registration order after the bus lock is released,
    /// so they may register new listeners. Returns the number fired.
    pub fn dispatch(&self, message: &InboundMessage) -> usize {
        let fired = {
            let mut registry = self.registry.lock();
            let Some(entries) = registry.by_name.remove(message.name()) else {
                return 0;
            };
            for entry in &entries {
                registry.names.remove(&entry.id);
            }
            entries
        };

        let count = fired.len();
        for entry in fired {
            (entry.listener)(message.clone());
        }

        trace!(name = message.name(), count, "Message dispatched");
        count
    }

    /// Removes a listener without firing it.
    ///
    /// Returns `false` if it already fired or was removed.
    pub fn remove(&self, id: ListenerId) -> bool {
        let mut registry = self.registry.lock();

        let Some(name) = registry.names.remove(&id) else {
            return false;
        };

        if let Some(entries) = registry.by_name.get_mut(&name) {
            entries.retain(|entry| entry.id != id);
            if entries.is_empty() {
                registry.by_name.remove(&name);
            }
        }

        trace!(%id, "Listener removed");
        true
    }

    /// Drops every listener without firing it. Returns the number dropped.
    pub fn clear(&self) -> usize {
        let dropped = {
            let mut registry = self.registry.lock();
            registry.names.clear();
            std::mem::take(&mut registry.by_name)
        };
        dropped.values().map(VecDeque::len).sum()
    }

    /// Returns the number of registered listeners.
    #[inline]
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.registry.lock().names.len()
    }

    /// Returns the number of listeners waiting for `name`.
    #[inline]
    #[must_use]
    pub fn pending_for(&self, name: &str) -> usize {
        self.registry
            .lock()
            .by_name
            .get(name)
            .map_or(0, VecDeque::len)
    }
}

// ============================================================================
// Tests
// ============================================================================
