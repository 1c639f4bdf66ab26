//! Observer registry for state snapshots.
//!
//! Subscribers receive the full `AppState` (never deltas) after every
//! mutation, in mutation order. Registration replays the current snapshot,
//! including the full audit log, to the new subscriber.

use std::fmt;
use std::sync::Arc;

use crate::domain::AppState;

/// Snapshot callback
pub type Subscriber = Arc<dyn Fn(&AppState) + Send + Sync>;

/// Handle returned by registration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriberId(u64);

impl fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "subscriber-{}", self.0)
    }
}

/// Ordered set of registered callbacks
#[derive(Default)]
pub struct SubscriberRegistry {
    next_id: u64,
    subscribers: Vec<(SubscriberId, Subscriber)>,
}

impl fmt::Debug for SubscriberRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubscriberRegistry")
            .field("count", &self.subscribers.len())
            .finish()
    }
}

impl SubscriberRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a callback and replay `current` to it
    pub fn register(&mut self, subscriber: Subscriber, current: &AppState) -> SubscriberId {
        let id = SubscriberId(self.next_id);
        self.next_id += 1;

        subscriber(current);
        self.subscribers.push((id, subscriber));
        id
    }

    /// Remove a callback; returns false if it was already gone
    pub fn unregister(&mut self, id: SubscriberId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(sid, _)| *sid != id);
        self.subscribers.len() != before
    }

    /// Deliver a snapshot to every subscriber in registration order
    pub fn publish(&self, state: &AppState) {
        for (_, subscriber) in &self.subscribers {
            subscriber(state);
        }
    }

    pub fn len(&self) -> usize {
        self.subscribers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }
}
