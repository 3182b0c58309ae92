//! # Subscription Registry
//!
//! Keyed, ordered handler lists with snapshot dispatch.

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::{Mutex, RwLock};
use tracing::debug;

/// A subscriber callback.
pub type Handler<M> = Arc<dyn Fn(&M) + Send + Sync>;

/// Unique id of one registration. Never reused within a registry.
pub type SubscriberId = u64;

struct Entry<M> {
    id: SubscriberId,
    handler: Handler<M>,
}

struct RegistryInner<K, M> {
    /// Handlers by key, in registration order.
    handlers: RwLock<HashMap<K, Vec<Entry<M>>>>,
    /// Counter for generating subscriber ids.
    next_id: AtomicU64,
}

impl<K: Eq + Hash + fmt::Debug, M> RegistryInner<K, M> {
    fn remove(&self, key: &K, id: SubscriberId) -> bool {
        let mut handlers = self.handlers.write();
        let Some(entries) = handlers.get_mut(key) else {
            return false;
        };
        let before = entries.len();
        entries.retain(|e| e.id != id);
        let removed = entries.len() != before;
        if removed {
            debug!(key = ?key, subscriber = id, "Subscription disposed");
        }
        removed
    }
}

/// Per-key ordered list of handlers.
///
/// Cloning yields another handle to the same registry.
pub struct SubscriptionRegistry<K, M> {
    inner: Arc<RegistryInner<K, M>>,
}

impl<K, M> Clone for SubscriptionRegistry<K, M> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<K, M> SubscriptionRegistry<K, M>
where
    K: Eq + Hash + Clone + fmt::Debug + Send + Sync + 'static,
    M: 'static,
{
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RegistryInner {
                handlers: RwLock::new(HashMap::new()),
                next_id: AtomicU64::new(1),
            }),
        }
    }

    /// Register `handler` for `key`.
    ///
    /// Returns the disposer that removes exactly this registration.
    pub fn subscribe<F>(&self, key: K, handler: F) -> Disposer
    where
        F: Fn(&M) + Send + Sync + 'static,
    {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        self.inner
            .handlers
            .write()
            .entry(key.clone())
            .or_default()
            .push(Entry {
                id,
                handler: Arc::new(handler),
            });

        debug!(key = ?key, subscriber = id, "Subscription created");

        let weak: Weak<RegistryInner<K, M>> = Arc::downgrade(&self.inner);
        Disposer::new(id, move || {
            if let Some(inner) = weak.upgrade() {
                inner.remove(&key, id);
            }
        })
    }

    /// Invoke every handler registered for `key` with `message`.
    ///
    /// Returns the number of handlers invoked.
    pub fn dispatch(&self, key: &K, message: &M) -> usize {
        let snapshot: Vec<Handler<M>> = {
            let handlers = self.inner.handlers.read();
            match handlers.get(key) {
                Some(entries) => entries.iter().map(|e| e.handler.clone()).collect(),
                None => return 0,
            }
        };

        for handler in &snapshot {
            handler(message);
        }
        snapshot.len()
    }

    /// Number of handlers currently registered for `key`.
    #[must_use]
    pub fn handler_count(&self, key: &K) -> usize {
        self.inner.handlers.read().get(key).map_or(0, Vec::len)
    }

    /// Number of handlers across all keys.
    #[must_use]
    pub fn total_handlers(&self) -> usize {
        self.inner.handlers.read().values().map(Vec::len).sum()
    }

    /// Drop every registration. Outstanding disposers become no-ops.
    pub fn clear(&self) {
        let removed = {
            let mut handlers = self.inner.handlers.write();
            let count = handlers.values().map(Vec::len).sum::<usize>();
            handlers.clear();
            count
        };
        debug!(removed, "Subscription registry cleared");
    }
}

impl<K, M> Default for SubscriptionRegistry<K, M>
where
    K: Eq + Hash + Clone + fmt::Debug + Send + Sync + 'static,
    M: 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

/// Opaque handle that removes one registration.
///
/// Dropping a disposer does NOT unsubscribe; call [`Disposer::dispose`].
pub struct Disposer {
    id: SubscriberId,
    action: Mutex<Option<Box<dyn FnOnce() + Send>>>,
}

impl Disposer {
    fn new(id: SubscriberId, action: impl FnOnce() + Send + 'static) -> Self {
        Self {
            id,
            action: Mutex::new(Some(Box::new(action))),
        }
    }

    /// Id of the registration this disposer controls.
    #[must_use]
    pub fn id(&self) -> SubscriberId {
        self.id
    }

    /// Remove the registration. Subsequent calls do nothing.
    pub fn dispose(&self) {
        let action = self.action.lock().take();
        if let Some(action) = action {
            action();
        }
    }

    /// Whether `dispose` has already been called.
    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.action.lock().is_none()
    }
}

impl fmt::Debug for Disposer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Disposer")
            .field("id", &self.id)
            .field("disposed", &self.is_disposed())
            .finish()
    }
}
