//! Change listeners for the cart store.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};

type Listener = Arc<dyn Fn() + Send + Sync>;

/// Registry of zero-argument change listeners.
///
/// Listeners are invoked in registration order, outside the registry lock,
/// so a listener may subscribe, unsubscribe or read the store.
#[derive(Default)]
pub(crate) struct Subscribers {
    next_id: AtomicU64,
    listeners: Mutex<Vec<(u64, Listener)>>,
}

impl Subscribers {
    pub(crate) fn subscribe(self: &Arc<Self>, listener: Listener) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((id, listener));
        Subscription {
            id,
            registry: Arc::downgrade(self),
        }
    }

    fn unsubscribe(&self, id: u64) -> bool {
        let mut listeners = self.listeners.lock().unwrap_or_else(PoisonError::into_inner);
        let before = listeners.len();
        listeners.retain(|(listener_id, _)| *listener_id != id);
        listeners.len() != before
    }

    pub(crate) fn notify(&self) {
        let snapshot: Vec<Listener> = self
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();
        for listener in snapshot {
            listener();
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

/// Handle returned by [`CartStore::subscribe`](super::CartStore::subscribe).
///
/// Dropping the handle does not unsubscribe; call [`Subscription::unsubscribe`].
#[derive(Debug, Clone)]
pub struct Subscription {
    id: u64,
    registry: Weak<Subscribers>,
}

impl Subscription {
    /// Remove exactly this listener.
    ///
    /// Idempotent: returns `true` only for the call that removed it, and is
    /// harmless after the store has been dropped.
    pub fn unsubscribe(&self) -> bool {
        self.registry
            .upgrade()
            .is_some_and(|registry| registry.unsubscribe(self.id))
    }
}

impl std::fmt::Debug for Subscribers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscribers")
            .field("listeners", &self.len())
            .finish_non_exhaustive()
    }
}
