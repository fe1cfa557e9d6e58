//! Change observation for external reactivity adapters.
//!
//! Backends notify subscribed observers after each mutation. The query
//! engine never subscribes; observers exist so UI bindings and devtools
//! can react to writes without the core knowing about them.

use parking_lot::RwLock;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tessera_core::EntityId;

/// A mutation that has just been applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    /// A table was created or reset.
    Registered {
        /// Entity name
        entity: String,
    },
    /// A record was inserted or overwritten.
    Upserted {
        /// Entity name
        entity: String,
        /// Record id
        id: EntityId,
    },
    /// One field of a record was patched.
    Patched {
        /// Entity name
        entity: String,
        /// Record id
        id: EntityId,
        /// Patched field
        field: String,
    },
    /// A record was removed.
    Removed {
        /// Entity name
        entity: String,
        /// Record id
        id: EntityId,
    },
    /// The whole data set was replaced.
    Replaced,
}

impl StoreEvent {
    /// Entity touched by this event, if it names one.
    pub fn entity(&self) -> Option<&str> {
        match self {
            StoreEvent::Registered { entity }
            | StoreEvent::Upserted { entity, .. }
            | StoreEvent::Patched { entity, .. }
            | StoreEvent::Removed { entity, .. } => Some(entity),
            StoreEvent::Replaced => None,
        }
    }
}

/// Receives [`StoreEvent`]s after they are applied.
pub trait StoreObserver: Send + Sync {
    /// Called once per applied mutation, on the writing thread.
    fn on_change(&self, event: &StoreEvent);
}

impl<F> StoreObserver for F
where
    F: Fn(&StoreEvent) + Send + Sync,
{
    fn on_change(&self, event: &StoreEvent) {
        self(event)
    }
}

/// Handle returned by `subscribe`, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Subscriber list shared by backend implementations.
#[derive(Default)]
pub struct Observers {
    next_id: AtomicU64,
    subscribers: RwLock<Vec<(SubscriptionId, Arc<dyn StoreObserver>)>>,
}

impl Observers {
    /// Create an empty subscriber list
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an observer.
    pub fn subscribe(&self, observer: Arc<dyn StoreObserver>) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.subscribers.write().push((id, observer));
        id
    }

    /// Remove an observer. Returns false if it was not subscribed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subscribers = self.subscribers.write();
        let before = subscribers.len();
        subscribers.retain(|(sid, _)| *sid != id);
        subscribers.len() != before
    }

    /// Number of subscribed observers
    pub fn len(&self) -> usize {
        self.subscribers.read().len()
    }

    /// Check if no observer is subscribed
    pub fn is_empty(&self) -> bool {
        self.subscribers.read().is_empty()
    }

    /// Deliver `event` to every observer.
    ///
    /// The list is cloned first so observers may subscribe or unsubscribe
    /// from inside the callback.
    pub fn notify(&self, event: &StoreEvent) {
        let subscribers: Vec<Arc<dyn StoreObserver>> = self
            .subscribers
            .read()
            .iter()
            .map(|(_, observer)| Arc::clone(observer))
            .collect();
        for observer in subscribers {
            observer.on_change(event);
        }
    }
}

impl fmt::Debug for Observers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observers")
            .field("subscribers", &self.len())
            .finish()
    }
}
