//! # Observer Lists
//!
//! Unkeyed variant of the registry for process-level signals such as gap
//! detection. Every registered observer receives each event exactly once.

use std::fmt;

use crate::registry::{Disposer, SubscriptionRegistry};

/// Handle that removes one observer.
pub type ObserverHandle = Disposer;

/// Ordered list of observers for events of type `E`.
pub struct ObserverList<E> {
    registry: SubscriptionRegistry<(), E>,
}

impl<E: 'static> ObserverList<E> {
    /// Create an empty list.
    #[must_use]
    pub fn new() -> Self {
        Self {
            registry: SubscriptionRegistry::new(),
        }
    }

    /// Add an observer. Observers are notified in registration order.
    pub fn register<F>(&self, observer: F) -> ObserverHandle
    where
        F: Fn(&E) + Send + Sync + 'static,
    {
        self.registry.subscribe((), observer)
    }

    /// Deliver `event` to every observer. Returns how many were called.
    pub fn notify(&self, event: &E) -> usize {
        self.registry.dispatch(&(), event)
    }

    /// Number of registered observers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.registry.handler_count(&())
    }

    /// True when nobody is observing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove every observer.
    pub fn clear(&self) {
        self.registry.clear();
    }
}

impl<E: 'static> Default for ObserverList<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> Clone for ObserverList<E> {
    fn clone(&self) -> Self {
        Self {
            registry: self.registry.clone(),
        }
    }
}

impl<E: 'static> fmt::Debug for ObserverList<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObserverList")
            .field("observers", &self.len())
            .finish()
    }
}
