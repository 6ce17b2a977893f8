//! Storefront service: the browse view's catalog and cart operations, and the
//! entry point into checkout.

use std::sync::Arc;
use std::time::Duration;

use crate::checkout::{AlwaysSucceeds, CheckoutSession, PaymentGateway};
use crate::clock::{Clock, SystemClock};
use crate::domain::aggregates::{Cart, Order, Product};
use crate::domain::catalog::{Catalog, PharmacySetup};
use crate::domain::value_objects::{OrderNumber, ProductId, StorageScope};
use crate::storage::{CartRepository, KeyValueStore, OrderRepository, SetupRepository, StorageError, StoredCarts, StoredOrders, StoredSetups};

pub const DEFAULT_ORDER_PREFIX: &str = "ORD3";

#[derive(Clone, Debug)]
pub struct CheckoutSettings {
    pub order_prefix: String,
    pub payment_latency: Duration,
}

impl Default for CheckoutSettings {
    fn default() -> Self {
        Self { order_prefix: DEFAULT_ORDER_PREFIX.to_string(), payment_latency: AlwaysSucceeds::DEFAULT_LATENCY }
    }
}

pub type Checkout<S, G, K> = CheckoutSession<StoredCarts<S>, StoredOrders<S>, G, K>;

pub struct Storefront<S, G = AlwaysSucceeds, K = SystemClock> {
    carts: StoredCarts<S>,
    orders: StoredOrders<S>,
    setups: StoredSetups<S>,
    gateway: G,
    clock: K,
    order_prefix: String,
}

impl<S: KeyValueStore> Storefront<S> {
    pub fn new(store: Arc<S>, settings: CheckoutSettings) -> Self {
        Self {
            carts: StoredCarts::new(Arc::clone(&store)),
            orders: StoredOrders::new(Arc::clone(&store)),
            setups: StoredSetups::new(store),
            gateway: AlwaysSucceeds::new(settings.payment_latency),
            clock: SystemClock,
            order_prefix: settings.order_prefix,
        }
    }
}

impl<S, G, K> Storefront<S, G, K>
where
    S: KeyValueStore,
    G: PaymentGateway + Clone,
    K: Clock + Clone,
{
    pub fn with_gateway<G2: PaymentGateway + Clone>(self, gateway: G2) -> Storefront<S, G2, K> {
        Storefront { carts: self.carts, orders: self.orders, setups: self.setups, gateway, clock: self.clock, order_prefix: self.order_prefix }
    }

    pub fn with_clock<K2: Clock + Clone>(self, clock: K2) -> Storefront<S, G, K2> {
        Storefront { carts: self.carts, orders: self.orders, setups: self.setups, gateway: self.gateway, clock, order_prefix: self.order_prefix }
    }

    /// Demo scopes sell the fixture catalog; live scopes read the business's setup.
    pub async fn catalog(&self, scope: &StorageScope) -> Catalog {
        if scope.is_demo() { return Catalog::demo(); }
        Catalog::from_setup(self.setups.load(scope.template()).await.as_ref())
    }

    pub async fn list_products(&self, scope: &StorageScope) -> Vec<Product> { self.catalog(scope).await.into_products() }

    /// The home page's short product strip.
    pub async fn featured(&self, scope: &StorageScope, limit: usize) -> Vec<Product> {
        self.catalog(scope).await.featured(limit).to_vec()
    }

    pub async fn get_cart(&self, scope: &StorageScope) -> Cart { self.carts.load(scope).await }

    pub async fn add_to_cart(&self, scope: &StorageScope, product: &Product) -> Cart {
        let mut cart = self.carts.load(scope).await;
        if cart.add_to_cart(product) {
            self.carts.save(scope, &cart).await;
        }
        for event in cart.take_events() { tracing::debug!(scope = %scope, ?event, "cart changed"); }
        cart
    }

    pub async fn update_quantity(&self, scope: &StorageScope, product_id: &ProductId, delta: i64) -> Cart {
        let mut cart = self.carts.load(scope).await;
        if cart.update_quantity(product_id, delta) {
            self.carts.save(scope, &cart).await;
        }
        for event in cart.take_events() { tracing::debug!(scope = %scope, ?event, "cart changed"); }
        cart
    }

    /// Opens the checkout view for `scope`.
    pub async fn checkout(&self, scope: &StorageScope) -> Checkout<S, G, K> {
        CheckoutSession::open(scope.clone(), self.carts.clone(), self.orders.clone(), self.gateway.clone(), self.clock.clone(), self.order_prefix.clone()).await
    }

    pub async fn order(&self, order_number: &OrderNumber) -> Option<Order> { self.orders.find(order_number).await }

    pub async fn setup(&self, template: &str) -> Option<PharmacySetup> { self.setups.load(template).await }

    pub async fn save_setup(&self, template: &str, setup: &PharmacySetup) -> Result<(), StorageError> {
        self.setups.save(template, setup).await?;
        tracing::info!(template, products = setup.products.as_ref().map_or(0, Vec::len), "pharmacy setup saved");
        Ok(())
    }
}
