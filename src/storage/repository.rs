//! Cart, order and setup repositories over a [`KeyValueStore`].
//!
//! Persistence is best effort: read and parse failures fall back to an empty
//! value, write failures are logged and absorbed.

use std::future::Future;
use std::sync::Arc;

use crate::domain::aggregates::{Cart, CartItem, Order};
use crate::domain::catalog::PharmacySetup;
use crate::domain::value_objects::{OrderNumber, StorageScope};

use super::{KeyValueStore, StorageError};

pub trait CartRepository: Send + Sync {
    /// Hydrates the cart for `scope`; missing or corrupt data is an empty cart.
    fn load(&self, scope: &StorageScope) -> impl Future<Output = Cart> + Send;
    /// Writes a non-empty cart, or deletes the key for an empty one.
    fn save(&self, scope: &StorageScope, cart: &Cart) -> impl Future<Output = ()> + Send;
    fn clear(&self, scope: &StorageScope) -> impl Future<Output = ()> + Send;
}

pub trait OrderRepository: Send + Sync {
    fn save(&self, order: &Order) -> impl Future<Output = ()> + Send;
    fn find(&self, order_number: &OrderNumber) -> impl Future<Output = Option<Order>> + Send;
    /// Whether anything occupies the order's key. Unreadable records and read failures count as taken.
    fn exists(&self, order_number: &OrderNumber) -> impl Future<Output = bool> + Send;
}

pub trait SetupRepository: Send + Sync {
    fn load(&self, template: &str) -> impl Future<Output = Option<PharmacySetup>> + Send;
    fn save(&self, template: &str, setup: &PharmacySetup) -> impl Future<Output = Result<(), StorageError>> + Send;
}

async fn read_json<S: KeyValueStore, T: serde::de::DeserializeOwned>(store: &S, key: &str) -> Option<T> {
    let raw = match store.get(key).await {
        Ok(raw) => raw?,
        Err(e) => {
            tracing::warn!(key, error = %e, "storage read failed");
            return None;
        }
    };
    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(key, error = %e, "discarding unreadable record");
            None
        }
    }
}

async fn write_json<S: KeyValueStore, T: serde::Serialize + Sync>(store: &S, key: &str, value: &T) {
    let raw = match serde_json::to_string(value) {
        Ok(raw) => raw,
        Err(e) => {
            tracing::warn!(key, error = %e, "failed to serialize record");
            return;
        }
    };
    if let Err(e) = store.set(key, &raw).await {
        tracing::warn!(key, error = %e, "storage write failed");
    }
}

async fn remove_key<S: KeyValueStore>(store: &S, key: &str) {
    if let Err(e) = store.remove(key).await {
        tracing::warn!(key, error = %e, "storage delete failed");
    }
}

/// Order persistence: writes the order under its own key, then clears the scope's cart.
pub async fn place_order<O: OrderRepository, C: CartRepository>(orders: &O, carts: &C, scope: &StorageScope, order: &Order) {
    orders.save(order).await;
    carts.clear(scope).await;
    tracing::info!(order_number = %order.order_number(), scope = %scope, total = %order.total(), "order placed");
}

pub struct StoredCarts<S> { store: Arc<S> }

impl<S> StoredCarts<S> {
    pub fn new(store: Arc<S>) -> Self { Self { store } }
}

impl<S> Clone for StoredCarts<S> {
    fn clone(&self) -> Self { Self { store: Arc::clone(&self.store) } }
}

impl<S: KeyValueStore> CartRepository for StoredCarts<S> {
    async fn load(&self, scope: &StorageScope) -> Cart {
        let items: Vec<CartItem> = read_json(self.store.as_ref(), &scope.cart_key()).await.unwrap_or_default();
        Cart::from_items(items)
    }

    async fn save(&self, scope: &StorageScope, cart: &Cart) {
        let key = scope.cart_key();
        if cart.is_empty() {
            remove_key(self.store.as_ref(), &key).await;
        } else {
            write_json(self.store.as_ref(), &key, &cart.items()).await;
        }
    }

    async fn clear(&self, scope: &StorageScope) {
        remove_key(self.store.as_ref(), &scope.cart_key()).await;
    }
}

pub struct StoredOrders<S> { store: Arc<S> }

impl<S> StoredOrders<S> {
    pub fn new(store: Arc<S>) -> Self { Self { store } }
}

impl<S> Clone for StoredOrders<S> {
    fn clone(&self) -> Self { Self { store: Arc::clone(&self.store) } }
}

impl<S: KeyValueStore> OrderRepository for StoredOrders<S> {
    async fn save(&self, order: &Order) {
        write_json(self.store.as_ref(), &order.order_number().storage_key(), order).await;
    }

    async fn find(&self, order_number: &OrderNumber) -> Option<Order> {
        read_json(self.store.as_ref(), &order_number.storage_key()).await
    }

    async fn exists(&self, order_number: &OrderNumber) -> bool {
        let key = order_number.storage_key();
        match self.store.get(&key).await {
            Ok(raw) => raw.is_some(),
            Err(e) => {
                tracing::warn!(key, error = %e, "storage read failed, treating order number as taken");
                true
            }
        }
    }
}

pub struct StoredSetups<S> { store: Arc<S> }

impl<S> StoredSetups<S> {
    pub fn new(store: Arc<S>) -> Self { Self { store } }
}

impl<S> Clone for StoredSetups<S> {
    fn clone(&self) -> Self { Self { store: Arc::clone(&self.store) } }
}

impl<S: KeyValueStore> SetupRepository for StoredSetups<S> {
    async fn load(&self, template: &str) -> Option<PharmacySetup> {
        read_json(self.store.as_ref(), &StorageScope::live(template).setup_key()).await
    }

    async fn save(&self, template: &str, setup: &PharmacySetup) -> Result<(), StorageError> {
        let raw = serde_json::to_string(setup).map_err(|e| StorageError::Unavailable(e.to_string()))?;
        self.store.set(&StorageScope::live(template).setup_key(), &raw).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregates::{PaymentSummary, Product};
    use crate::storage::MemoryStore;
    use chrono::Utc;

    fn scope() -> StorageScope { StorageScope::live("pharmacy3") }

    #[tokio::test]
    async fn test_cart_round_trip() {
        let store = Arc::new(MemoryStore::new());
        let carts = StoredCarts::new(Arc::clone(&store));
        let mut cart = Cart::new();
        cart.add_to_cart(&Product::new("d1", "Paracetamol 500mg", "Pain Relief", "$4.99"));
        cart.add_to_cart(&Product::new("d3", "Vitamin C 1000mg", "Vitamins", "$9.99"));
        cart.add_to_cart(&Product::new("d1", "Paracetamol 500mg", "Pain Relief", "$4.99"));
        carts.save(&scope(), &cart).await;

        let loaded = carts.load(&scope()).await;
        let pairs = |c: &Cart| c.items().iter().map(|i| (i.product_id().clone(), i.quantity)).collect::<Vec<_>>();
        assert_eq!(pairs(&loaded), pairs(&cart));
    }

    #[tokio::test]
    async fn test_empty_cart_removes_key() {
        let store = Arc::new(MemoryStore::new());
        let carts = StoredCarts::new(Arc::clone(&store));
        let mut cart = Cart::new();
        cart.add_to_cart(&Product::new("d1", "Paracetamol 500mg", "Pain Relief", "$4.99"));
        carts.save(&scope(), &cart).await;
        assert!(store.contains_key("cart:pharmacy3"));
        cart.update_quantity(&"d1".into(), -1);
        carts.save(&scope(), &cart).await;
        assert!(!store.contains_key("cart:pharmacy3"));
    }

    #[tokio::test]
    async fn test_corrupt_cart_hydrates_empty() {
        let store = Arc::new(MemoryStore::new());
        store.set("cart:pharmacy3", "{not json").await.unwrap();
        store.set("cart:pharmacy3:demo", "[]").await.unwrap();
        let carts = StoredCarts::new(Arc::clone(&store));
        assert!(carts.load(&scope()).await.is_empty());
        assert!(carts.load(&StorageScope::demo("pharmacy3")).await.is_empty());
    }

    #[tokio::test]
    async fn test_scopes_are_isolated() {
        let store = Arc::new(MemoryStore::new());
        let carts = StoredCarts::new(Arc::clone(&store));
        let mut cart = Cart::new();
        cart.add_to_cart(&Product::new("d1", "Paracetamol 500mg", "Pain Relief", "$4.99"));
        carts.save(&StorageScope::demo("pharmacy3"), &cart).await;
        assert!(carts.load(&scope()).await.is_empty());
        assert_eq!(carts.load(&StorageScope::demo("pharmacy3")).await.item_count(), 1);
    }

    #[tokio::test]
    async fn test_browser_written_cart_hydrates() {
        let store = Arc::new(MemoryStore::new());
        let raw = r#"[{"product":{"id":"user-0","name":"Zinc","category":"General","price":"$2.00","inStock":true},"quantity":2}]"#;
        store.set("cart:pharmacy3", raw).await.unwrap();
        let cart = StoredCarts::new(Arc::clone(&store)).load(&scope()).await;
        assert_eq!(cart.item_count(), 2);
    }

    #[tokio::test]
    async fn test_orders_are_keyed_by_number() {
        let store = Arc::new(MemoryStore::new());
        let orders = StoredOrders::new(Arc::clone(&store));
        let mut cart = Cart::new();
        cart.add_to_cart(&Product::new("d1", "Paracetamol 500mg", "Pain Relief", "$4.99"));
        let order = Order::place(OrderNumber::parse("ORD3-12345678"), &cart, Default::default(), PaymentSummary::Cash, Utc::now());
        orders.save(&order).await;
        assert!(store.contains_key("order:ORD3-12345678"));
        let found = orders.find(order.order_number()).await.unwrap();
        assert_eq!(found.id(), order.id());
        assert!(orders.find(&OrderNumber::parse("ORD3-00000000")).await.is_none());
    }

    struct Unreachable;

    impl KeyValueStore for Unreachable {
        async fn get(&self, _key: &str) -> Result<Option<String>, StorageError> { Err(StorageError::Unavailable("offline".into())) }
        async fn set(&self, _key: &str, _value: &str) -> Result<(), StorageError> { Err(StorageError::Unavailable("offline".into())) }
        async fn remove(&self, _key: &str) -> Result<(), StorageError> { Err(StorageError::Unavailable("offline".into())) }
    }

    #[tokio::test]
    async fn test_unreadable_order_key_counts_as_taken() {
        let store = Arc::new(MemoryStore::new());
        store.set("order:ORD3-00000007", "{truncated").await.unwrap();
        let orders = StoredOrders::new(Arc::clone(&store));
        assert!(orders.find(&OrderNumber::parse("ORD3-00000007")).await.is_none());
        assert!(orders.exists(&OrderNumber::parse("ORD3-00000007")).await);
        assert!(!orders.exists(&OrderNumber::parse("ORD3-00000008")).await);

        let offline = StoredOrders::new(Arc::new(Unreachable));
        assert!(offline.exists(&OrderNumber::parse("ORD3-00000008")).await);
    }

    #[tokio::test]
    async fn test_place_order_clears_cart() {
        let store = Arc::new(MemoryStore::new());
        let (carts, orders) = (StoredCarts::new(Arc::clone(&store)), StoredOrders::new(Arc::clone(&store)));
        let mut cart = Cart::new();
        cart.add_to_cart(&Product::new("d1", "Paracetamol 500mg", "Pain Relief", "$4.99"));
        carts.save(&scope(), &cart).await;
        let order = Order::place(OrderNumber::parse("ORD3-00000042"), &cart, Default::default(), PaymentSummary::Cash, Utc::now());
        place_order(&orders, &carts, &scope(), &order).await;
        assert_eq!(store.keys(), vec!["order:ORD3-00000042".to_string()]);
    }

    #[tokio::test]
    async fn test_setup_round_trip() {
        let store = Arc::new(MemoryStore::new());
        let setups = StoredSetups::new(Arc::clone(&store));
        assert!(setups.load("pharmacy3").await.is_none());
        let setup = PharmacySetup { phone: Some("+1 555 0100".into()), ..Default::default() };
        setups.save("pharmacy3", &setup).await.unwrap();
        assert_eq!(setups.load("pharmacy3").await, Some(setup));
    }
}
