//! The cart store: sole owner and mutator of the session's cart.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use rust_decimal::Decimal;
use souk_core::{ProductId, ProductSnapshot};
use tokio::sync::watch;
use tracing::{debug, error, info, instrument, warn};

use super::subscribers::{Subscribers, Subscription};
use super::{CartError, CartState, CartSummary, LineItem};
use crate::error::add_breadcrumb;
use crate::storage::{CART_STORAGE_KEY, StorageArea};

/// Shared handle to the cart.
///
/// Cloning is cheap; every clone sees the same cart. Each mutation runs
/// under one lock: the next state is computed on a copy, written to storage,
/// swapped in and published to watchers, and only then are listeners told.
/// A failed write leaves the previous state in place and returns
/// [`CartError::Storage`]; a change whose total would overflow is refused
/// with [`CartError::TotalOverflow`] before anything is written.
///
/// Unit prices are taken from the caller's [`ProductSnapshot`] as-is and
/// never re-validated against the catalog.
#[derive(Clone)]
pub struct CartStore {
    inner: Arc<CartStoreInner>,
}

struct CartStoreInner {
    storage: Arc<dyn StorageArea>,
    state: Mutex<CartState>,
    subscribers: Arc<Subscribers>,
    summary: watch::Sender<CartSummary>,
}

impl CartStore {
    /// Build a store over `storage`, restoring any previously persisted cart.
    ///
    /// Missing, unreadable or malformed data yields an empty cart.
    #[must_use]
    pub fn load(storage: Arc<dyn StorageArea>) -> Self {
        let state = match storage.get_item(CART_STORAGE_KEY) {
            Ok(Some(blob)) => CartState::from_json(&blob).unwrap_or_else(|e| {
                warn!(error = %e, "Discarding malformed persisted cart");
                CartState::new()
            }),
            Ok(None) => CartState::new(),
            Err(e) => {
                warn!(error = %e, "Failed to read persisted cart, starting empty");
                CartState::new()
            }
        };

        debug!(lines = state.len(), item_count = state.item_count(), "Cart loaded");

        let (summary, _) = watch::channel(state.summary());
        Self {
            inner: Arc::new(CartStoreInner {
                storage,
                state: Mutex::new(state),
                subscribers: Arc::new(Subscribers::default()),
                summary,
            }),
        }
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Add `quantity` units of `product`.
    ///
    /// Increments the existing line for the product or appends a new one.
    /// A zero quantity is ignored without touching storage.
    ///
    /// # Errors
    ///
    /// Returns `CartError` if the updated cart could not be persisted.
    #[instrument(skip(self, product), fields(product_id = %product.id))]
    pub fn add_item(&self, product: &ProductSnapshot, quantity: u32) -> Result<(), CartError> {
        self.commit(|state| state.add(product, quantity))?;
        add_breadcrumb(
            "cart",
            "Added item",
            Some(&[("product_id", product.id.as_str())]),
        );
        Ok(())
    }

    /// Remove the line for `product_id`.
    ///
    /// Removing an absent product is not an error; the cart is still
    /// persisted and listeners still run.
    ///
    /// # Errors
    ///
    /// Returns `CartError` if the cart could not be persisted.
    #[instrument(skip(self, product_id), fields(product_id = %product_id))]
    pub fn remove_item(&self, product_id: &ProductId) -> Result<(), CartError> {
        self.commit(|state| {
            state.remove(product_id);
            true
        })?;
        add_breadcrumb(
            "cart",
            "Removed item",
            Some(&[("product_id", product_id.as_str())]),
        );
        Ok(())
    }

    /// Set the absolute quantity of a line.
    ///
    /// Zero or negative behaves exactly like [`remove_item`](Self::remove_item).
    /// Updating a product that is not in the cart does nothing.
    ///
    /// # Errors
    ///
    /// Returns `CartError` if the updated cart could not be persisted.
    #[instrument(skip(self, product_id), fields(product_id = %product_id))]
    pub fn update_quantity(&self, product_id: &ProductId, quantity: i64) -> Result<(), CartError> {
        if quantity <= 0 {
            return self.remove_item(product_id);
        }
        self.commit(|state| {
            if state.get(product_id).is_none() {
                return false;
            }
            state.set_quantity(product_id, quantity);
            true
        })
    }

    /// Empty the cart (after a successful checkout, for instance).
    ///
    /// # Errors
    ///
    /// Returns `CartError` if the empty cart could not be persisted.
    #[instrument(skip(self))]
    pub fn clear(&self) -> Result<(), CartError> {
        self.commit(|state| {
            state.clear();
            true
        })?;
        add_breadcrumb("cart", "Cleared cart", None);
        Ok(())
    }

    /// Fold another cart's lines into this one with add semantics.
    ///
    /// All lines land in one write and one notification.
    ///
    /// # Errors
    ///
    /// Returns `CartError` if the merged cart could not be persisted.
    #[instrument(skip(self, lines), fields(lines = lines.len()))]
    pub fn merge_items(&self, lines: Vec<LineItem>) -> Result<(), CartError> {
        self.commit(|state| state.merge(lines))
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Independent copy of the current lines, in insertion order.
    #[must_use]
    pub fn items(&self) -> Vec<LineItem> {
        self.lock_state().items().to_vec()
    }

    /// Sum of all quantities.
    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.lock_state().item_count()
    }

    /// Sum of `price × quantity` over all lines.
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.lock_state().total()
    }

    /// Item count and total computed under one lock.
    #[must_use]
    pub fn summary(&self) -> CartSummary {
        self.lock_state().summary()
    }

    /// Copy of the whole cart, for reads that must agree with each other.
    #[must_use]
    pub fn snapshot(&self) -> CartState {
        self.lock_state().clone()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock_state().is_empty()
    }

    // =========================================================================
    // Change notification
    // =========================================================================

    /// Register a listener invoked synchronously after every mutation.
    ///
    /// Listeners run after the new state is persisted and visible, on the
    /// thread that performed the mutation, and may read the store.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.inner.subscribers.subscribe(Arc::new(listener))
    }

    /// Stream of summaries for async consumers.
    ///
    /// The receiver starts at the current summary and sees every committed
    /// change (intermediate values may be skipped by slow readers).
    #[must_use]
    pub fn watch_summary(&self) -> watch::Receiver<CartSummary> {
        self.inner.summary.subscribe()
    }

    /// Number of registered listeners.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.inner.subscribers.len()
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn lock_state(&self) -> MutexGuard<'_, CartState> {
        self.inner.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Apply `apply` to a copy of the state and, if it reports a change,
    /// persist and publish it.
    ///
    /// The watch channel is updated while the state lock is held so it
    /// always ends on the last committed state.
    fn commit<F>(&self, apply: F) -> Result<(), CartError>
    where
        F: FnOnce(&mut CartState) -> bool,
    {
        let summary = {
            let mut state = self.lock_state();
            let mut next = state.clone();
            if !apply(&mut next) {
                return Ok(());
            }

            let Some(summary) = next.checked_summary() else {
                warn!("Refusing cart change, total would overflow");
                return Err(CartError::TotalOverflow);
            };

            let blob = next.to_json()?;
            if let Err(e) = self.inner.storage.set_item(CART_STORAGE_KEY, &blob) {
                error!(error = %e, "Failed to persist cart, keeping previous state");
                return Err(CartError::Storage(e));
            }

            *state = next;
            self.inner.summary.send_replace(summary);
            summary
        };

        info!(
            item_count = summary.item_count,
            total = %summary.total,
            "Cart updated"
        );

        self.inner.subscribers.notify();
        Ok(())
    }
}

impl std::fmt::Debug for CartStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartStore")
            .field("state", &*self.lock_state())
            .field("subscribers", &self.inner.subscribers)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use souk_core::Price;

    use super::*;
    use crate::storage::{MemoryStorage, StorageError};

    fn shirt() -> ProductSnapshot {
        ProductSnapshot {
            id: ProductId::new("1"),
            title: "Shirt".to_string(),
            price: Price::from_units(10),
            image: "x".to_string(),
        }
    }

    fn product(id: &str, units: i64) -> ProductSnapshot {
        ProductSnapshot {
            id: ProductId::new(id),
            title: format!("Product {id}"),
            price: Price::from_units(units),
            image: String::new(),
        }
    }

    fn store() -> (CartStore, MemoryStorage) {
        let storage = MemoryStorage::new();
        (CartStore::load(Arc::new(storage.clone())), storage)
    }

    fn counter(store: &CartStore) -> (Arc<AtomicUsize>, Subscription) {
        let hits = Arc::new(AtomicUsize::new(0));
        let sub = {
            let hits = Arc::clone(&hits);
            store.subscribe(move || {
                hits.fetch_add(1, Ordering::SeqCst);
            })
        };
        (hits, sub)
    }

    /// Storage whose writes always fail.
    struct ReadOnlyStorage(MemoryStorage);

    impl StorageArea for ReadOnlyStorage {
        fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
            self.0.get_item(key)
        }

        fn set_item(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
            Err(StorageError::Unavailable("quota exceeded".to_string()))
        }

        fn remove_item(&self, key: &str) -> Result<(), StorageError> {
            self.0.remove_item(key)
        }
    }

    #[test]
    fn test_shirt_scenario() {
        let (cart, _) = store();

        cart.add_item(&shirt(), 2).unwrap();
        assert_eq!(cart.item_count(), 2);
        assert_eq!(cart.total(), Decimal::from(20));

        cart.add_item(&shirt(), 1).unwrap();
        assert_eq!(cart.items()[0].quantity, 3);
        assert_eq!(cart.total(), Decimal::from(30));

        cart.update_quantity(&ProductId::new("1"), 0).unwrap();
        assert!(cart.items().is_empty());
        assert_eq!(cart.item_count(), 0);
    }

    #[test]
    fn test_update_to_zero_or_negative_equals_remove() {
        for quantity in [0, -5] {
            let (updated, _) = store();
            let (removed, _) = store();
            for cart in [&updated, &removed] {
                cart.add_item(&product("1", 3), 2).unwrap();
                cart.add_item(&product("2", 4), 1).unwrap();
            }

            updated.update_quantity(&ProductId::new("1"), quantity).unwrap();
            removed.remove_item(&ProductId::new("1")).unwrap();

            assert_eq!(updated.items(), removed.items());
            assert!(updated.items().iter().all(|i| i.product_id.as_str() != "1"));
        }
    }

    #[test]
    fn test_remove_absent_leaves_state_unchanged() {
        let (cart, _) = store();
        cart.add_item(&product("1", 3), 2).unwrap();
        let before = cart.items();

        cart.remove_item(&ProductId::new("nope")).unwrap();
        assert_eq!(cart.items(), before);
    }

    #[test]
    fn test_remove_absent_still_persists_and_notifies() {
        let (cart, storage) = store();
        let (hits, _sub) = counter(&cart);

        cart.remove_item(&ProductId::new("nope")).unwrap();

        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(storage.get_item(CART_STORAGE_KEY).unwrap().as_deref(), Some("[]"));
    }

    #[test]
    fn test_update_absent_is_silent() {
        let (cart, storage) = store();
        let (hits, _sub) = counter(&cart);

        cart.update_quantity(&ProductId::new("nope"), 3).unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 0);
        assert!(storage.get_item(CART_STORAGE_KEY).unwrap().is_none());
    }

    #[test]
    fn test_items_is_a_snapshot() {
        let (cart, _) = store();
        cart.add_item(&product("1", 3), 1).unwrap();

        let mut items = cart.items();
        items[0].quantity = 100;
        items.clear();

        assert_eq!(cart.items().len(), 1);
        assert_eq!(cart.item_count(), 1);
    }

    #[test]
    fn test_persistence_round_trip() {
        let storage = MemoryStorage::new();
        let first = CartStore::load(Arc::new(storage.clone()));
        first.add_item(&shirt(), 2).unwrap();
        first.add_item(&product("7", 4), 1).unwrap();

        let second = CartStore::load(Arc::new(storage));
        assert_eq!(second.items(), first.items());
        assert_eq!(second.total(), Decimal::from(24));
    }

    #[test]
    fn test_negative_price_survives_reload() {
        let storage = MemoryStorage::new();
        let first = CartStore::load(Arc::new(storage.clone()));
        first.add_item(&product("1", 10), 2).unwrap();
        first.add_item(&product("coupon", -5), 1).unwrap();

        let second = CartStore::load(Arc::new(storage));
        assert_eq!(second.items(), first.items());
        assert_eq!(second.total(), Decimal::from(15));
    }

    #[test]
    fn test_oversized_persisted_cart_loads() {
        let storage = MemoryStorage::new();
        storage
            .set_item(
                CART_STORAGE_KEY,
                r#"[{"productId":"1","title":"A","price":5e28,"quantity":1,"image":""},
                    {"productId":"2","title":"B","price":5e28,"quantity":1,"image":""}]"#,
            )
            .unwrap();

        let cart = CartStore::load(Arc::new(storage));
        assert_eq!(cart.item_count(), 1);
        assert_eq!(cart.watch_summary().borrow().item_count, 1);
    }

    #[test]
    fn test_overflowing_add_is_refused() {
        let (cart, storage) = store();
        let (hits, _sub) = counter(&cart);
        let yacht = ProductSnapshot {
            id: ProductId::new("yacht"),
            title: "Yacht".to_string(),
            price: Price::new(Decimal::from_i128_with_scale(5 * 10_i128.pow(28), 0)),
            image: String::new(),
        };

        cart.add_item(&yacht, 1).unwrap();
        let persisted = storage.get_item(CART_STORAGE_KEY).unwrap();

        let err = cart.add_item(&yacht, 1).unwrap_err();
        assert!(matches!(err, CartError::TotalOverflow));
        assert!(err.is_user_error());

        assert_eq!(cart.item_count(), 1);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(storage.get_item(CART_STORAGE_KEY).unwrap(), persisted);

        let reloaded = CartStore::load(Arc::new(storage));
        assert_eq!(reloaded.items(), cart.items());
    }

    #[test]
    fn test_malformed_storage_starts_empty() {
        for blob in ["not json", "{}", "[1,2,3]", ""] {
            let storage = MemoryStorage::new();
            storage.set_item(CART_STORAGE_KEY, blob).unwrap();
            let cart = CartStore::load(Arc::new(storage));
            assert!(cart.is_empty(), "blob {blob:?} should load as empty");
        }
    }

    #[test]
    fn test_listeners_and_unsubscribe() {
        let (cart, _) = store();
        let (first_hits, first) = counter(&cart);
        let (second_hits, _second) = counter(&cart);

        cart.add_item(&shirt(), 1).unwrap();
        assert_eq!(first_hits.load(Ordering::SeqCst), 1);
        assert_eq!(second_hits.load(Ordering::SeqCst), 1);

        assert!(first.unsubscribe());
        assert!(!first.unsubscribe());

        cart.add_item(&shirt(), 1).unwrap();
        assert_eq!(first_hits.load(Ordering::SeqCst), 1);
        assert_eq!(second_hits.load(Ordering::SeqCst), 2);
        assert_eq!(cart.listener_count(), 1);
    }

    #[test]
    fn test_listener_sees_persisted_state() {
        let storage = MemoryStorage::new();
        let cart = CartStore::load(Arc::new(storage.clone()));
        let observed = Arc::new(Mutex::new(Vec::new()));

        let _sub = {
            let cart_handle = cart.clone();
            let observed = Arc::clone(&observed);
            cart.subscribe(move || {
                let persisted = storage.get_item(CART_STORAGE_KEY).unwrap().unwrap();
                let restored = CartState::from_json(&persisted).unwrap();
                observed
                    .lock()
                    .unwrap()
                    .push((cart_handle.item_count(), restored.item_count()));
            })
        };

        cart.add_item(&shirt(), 2).unwrap();
        cart.clear().unwrap();

        assert_eq!(*observed.lock().unwrap(), vec![(2, 2), (0, 0)]);
    }

    #[test]
    fn test_add_zero_does_not_notify() {
        let (cart, storage) = store();
        let (hits, _sub) = counter(&cart);

        cart.add_item(&shirt(), 0).unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 0);
        assert!(storage.is_empty());
    }

    #[test]
    fn test_write_failure_keeps_previous_state() {
        let backing = MemoryStorage::new();
        backing
            .set_item(
                CART_STORAGE_KEY,
                r#"[{"productId":"1","title":"Shirt","price":10,"quantity":1,"image":"x"}]"#,
            )
            .unwrap();
        let cart = CartStore::load(Arc::new(ReadOnlyStorage(backing.clone())));
        let (hits, _sub) = counter(&cart);

        let err = cart.add_item(&shirt(), 5).unwrap_err();
        assert!(matches!(err, CartError::Storage(StorageError::Unavailable(_))));
        assert!(cart.clear().is_err());

        assert_eq!(cart.item_count(), 1);
        assert_eq!(hits.load(Ordering::SeqCst), 0);
        let persisted = CartState::from_json(&backing.get_item(CART_STORAGE_KEY).unwrap().unwrap())
            .unwrap();
        assert_eq!(persisted.items(), cart.items().as_slice());
    }

    #[test]
    fn test_merge_items_notifies_once() {
        let (cart, _) = store();
        cart.add_item(&shirt(), 1).unwrap();
        let (hits, _sub) = counter(&cart);

        cart.merge_items(vec![
            LineItem::new(&shirt(), 2),
            LineItem::new(&product("2", 5), 2),
        ])
        .unwrap();

        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(cart.item_count(), 5);
        assert_eq!(cart.total(), Decimal::from(40));
    }

    #[test]
    fn test_clones_share_state() {
        let (cart, _) = store();
        let other = cart.clone();
        other.add_item(&shirt(), 4).unwrap();
        assert_eq!(cart.item_count(), 4);
    }

    #[test]
    fn test_watch_summary_ends_on_last_commit_across_threads() {
        let (cart, _) = store();
        let rx = cart.watch_summary();

        let handles: Vec<_> = (0..8)
            .map(|n| {
                let cart = cart.clone();
                std::thread::spawn(move || {
                    for _ in 0..25 {
                        cart.add_item(&product(&n.to_string(), 1), 1).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(*rx.borrow(), cart.summary());
        assert_eq!(cart.item_count(), 200);
    }

    #[tokio::test]
    async fn test_watch_summary_tracks_commits() {
        let (cart, _) = store();
        let mut rx = cart.watch_summary();
        assert_eq!(*rx.borrow(), CartSummary::default());

        cart.add_item(&shirt(), 3).unwrap();
        rx.changed().await.unwrap();
        assert_eq!(
            *rx.borrow_and_update(),
            CartSummary {
                item_count: 3,
                total: Decimal::from(30),
            }
        );
    }
}
