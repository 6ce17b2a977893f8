//! JSON HTTP surface for the storefront template pages.
//!
//! `?demo=1` (or `?demo=true`) selects the template's demo scope on every
//! template route.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError};

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, patch, post, put},
    Json, Router,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, OwnedMutexGuard};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::checkout::{CardInfo, CheckoutError, CheckoutEvent};
use crate::domain::aggregates::{Cart, CartItem, DeliveryInfo, Order, Product};
use crate::domain::catalog::PharmacySetup;
use crate::domain::events::DomainEvent;
use crate::domain::value_objects::{OrderNumber, ProductId, StorageScope};
use crate::storage::KeyValueStore;
use crate::storefront::Storefront;
use crate::StorefrontError;

pub struct AppState<S> {
    pub storefront: Arc<Storefront<S>>,
    pub nats: Option<async_nats::Client>,
    cart_locks: ScopeLocks,
}

impl<S> AppState<S> {
    pub fn new(storefront: Storefront<S>, nats: Option<async_nats::Client>) -> Self {
        Self { storefront: Arc::new(storefront), nats, cart_locks: ScopeLocks::default() }
    }
}

impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self { storefront: Arc::clone(&self.storefront), nats: self.nats.clone(), cart_locks: self.cart_locks.clone() }
    }
}

/// Serializes cart read-modify-write cycles per storage scope within this process.
#[derive(Clone, Default)]
struct ScopeLocks {
    locks: Arc<std::sync::Mutex<HashMap<StorageScope, Arc<Mutex<()>>>>>,
}

impl ScopeLocks {
    async fn lock(&self, scope: &StorageScope) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            Arc::clone(locks.entry(scope.clone()).or_default())
        };
        lock.lock_owned().await
    }
}

pub fn router<S: KeyValueStore + 'static>(state: AppState<S>) -> Router {
    Router::new()
        .route("/health", get(|| async { Json(serde_json::json!({"status": "healthy", "service": "medify-storefront"})) }))
        .route("/api/v1/templates/:template/products", get(list_products::<S>))
        .route("/api/v1/templates/:template/setup", put(save_setup::<S>))
        .route("/api/v1/templates/:template/cart", get(get_cart::<S>))
        .route("/api/v1/templates/:template/cart/items", post(add_to_cart::<S>))
        .route("/api/v1/templates/:template/cart/items/:product_id", patch(update_quantity::<S>))
        .route("/api/v1/templates/:template/checkout", post(checkout::<S>))
        .route("/api/v1/templates/:template/checkout/items/:product_id", patch(checkout_update_quantity::<S>))
        .route("/api/v1/orders/:order_number", get(get_order::<S>))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[derive(Debug, Default, Deserialize)]
pub struct ScopeParams { pub demo: Option<String> }

impl ScopeParams {
    fn scope(&self, template: String) -> StorageScope {
        let demo = matches!(self.demo.as_deref(), Some("1" | "true"));
        StorageScope::new(template, demo)
    }
}

#[derive(Debug, Serialize)]
pub struct ProductList { pub data: Vec<Product>, pub total: usize }

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartView {
    pub items: Vec<CartItem>,
    pub item_count: u32,
    pub subtotal: Decimal,
    pub total: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect: Option<String>,
}

impl From<&Cart> for CartView {
    fn from(cart: &Cart) -> Self {
        Self { items: cart.items().to_vec(), item_count: cart.item_count(), subtotal: cart.subtotal(), total: cart.total(), redirect: None }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddToCartRequest { pub product_id: ProductId }

#[derive(Debug, Deserialize)]
pub struct UpdateQuantityRequest { pub delta: i64 }

#[derive(Debug, Deserialize)]
pub struct CheckoutRequest { pub delivery: DeliveryInfo, pub card: Option<CardInfo> }

impl IntoResponse for StorefrontError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::ProductNotFound(_) | Self::OrderNotFound(_) => StatusCode::NOT_FOUND,
            Self::Checkout(CheckoutError::EmptyCart | CheckoutError::AlreadyPlaced | CheckoutError::InProgress) => StatusCode::CONFLICT,
            Self::Checkout(CheckoutError::InvalidDelivery(_) | CheckoutError::InvalidCard(_)) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Checkout(CheckoutError::Payment(_)) => StatusCode::PAYMENT_REQUIRED,
            Self::Storage(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        (status, Json(serde_json::json!({"error": self.to_string()}))).into_response()
    }
}

fn browse_path(scope: &StorageScope) -> String {
    let path = format!("/templates/{}/medications", scope.template());
    if scope.is_demo() { format!("{path}?demo=1") } else { path }
}

async fn list_products<S: KeyValueStore + 'static>(State(s): State<AppState<S>>, Path(template): Path<String>, Query(p): Query<ScopeParams>) -> Json<ProductList> {
    let data = s.storefront.list_products(&p.scope(template)).await;
    Json(ProductList { total: data.len(), data })
}

async fn save_setup<S: KeyValueStore + 'static>(State(s): State<AppState<S>>, Path(template): Path<String>, Json(setup): Json<PharmacySetup>) -> Result<StatusCode, StorefrontError> {
    s.storefront.save_setup(&template, &setup).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn get_cart<S: KeyValueStore + 'static>(State(s): State<AppState<S>>, Path(template): Path<String>, Query(p): Query<ScopeParams>) -> Json<CartView> {
    Json(CartView::from(&s.storefront.get_cart(&p.scope(template)).await))
}

async fn add_to_cart<S: KeyValueStore + 'static>(State(s): State<AppState<S>>, Path(template): Path<String>, Query(p): Query<ScopeParams>, Json(r): Json<AddToCartRequest>) -> Result<Json<CartView>, StorefrontError> {
    let scope = p.scope(template);
    let catalog = s.storefront.catalog(&scope).await;
    let product = catalog.find(&r.product_id).ok_or_else(|| StorefrontError::ProductNotFound(r.product_id.to_string()))?;
    let _guard = s.cart_locks.lock(&scope).await;
    Ok(Json(CartView::from(&s.storefront.add_to_cart(&scope, product).await)))
}

async fn update_quantity<S: KeyValueStore + 'static>(State(s): State<AppState<S>>, Path((template, product_id)): Path<(String, String)>, Query(p): Query<ScopeParams>, Json(r): Json<UpdateQuantityRequest>) -> Json<CartView> {
    let scope = p.scope(template);
    let _guard = s.cart_locks.lock(&scope).await;
    Json(CartView::from(&s.storefront.update_quantity(&scope, &ProductId::new(product_id), r.delta).await))
}

async fn checkout_update_quantity<S: KeyValueStore + 'static>(State(s): State<AppState<S>>, Path((template, product_id)): Path<(String, String)>, Query(p): Query<ScopeParams>, Json(r): Json<UpdateQuantityRequest>) -> Json<CartView> {
    let scope = p.scope(template);
    let _guard = s.cart_locks.lock(&scope).await;
    let mut session = s.storefront.checkout(&scope).await;
    session.update_quantity(&ProductId::new(product_id), r.delta).await;
    let mut view = CartView::from(session.cart());
    if session.take_events().contains(&CheckoutEvent::ReturnToBrowse) {
        view.redirect = Some(browse_path(&scope));
    }
    Json(view)
}

async fn checkout<S: KeyValueStore + 'static>(State(s): State<AppState<S>>, Path(template): Path<String>, Query(p): Query<ScopeParams>, Json(r): Json<CheckoutRequest>) -> Result<(StatusCode, Json<Order>), StorefrontError> {
    // Detached so a dropped connection cannot abandon a submission mid-payment.
    let order = tokio::spawn(submit_checkout(s, p.scope(template), r))
        .await
        .map_err(|e| StorefrontError::Internal(format!("checkout task failed: {e}")))??;
    Ok((StatusCode::CREATED, Json(order)))
}

async fn submit_checkout<S: KeyValueStore + 'static>(s: AppState<S>, scope: StorageScope, r: CheckoutRequest) -> Result<Order, StorefrontError> {
    let mut session = {
        let _guard = s.cart_locks.lock(&scope).await;
        s.storefront.checkout(&scope).await
    };
    let pending = session.begin_submit(r.delivery, r.card)?;
    let authorized = session.authorize(pending).await?;
    let mut order = {
        let _guard = s.cart_locks.lock(&scope).await;
        session.place(authorized).await
    };
    publish_order_events(s.nats.as_ref(), &mut order).await;
    Ok(order)
}

async fn publish_order_events(nats: Option<&async_nats::Client>, order: &mut Order) {
    let Some(nats) = nats else { return };
    for event in order.take_events() {
        let DomainEvent::Order(event) = event else { continue };
        match serde_json::to_vec(&event) {
            Ok(payload) => {
                if let Err(e) = nats.publish(event.subject().to_string(), payload.into()).await {
                    tracing::warn!(error = %e, order_number = %order.order_number(), "failed to publish order event");
                }
            }
            Err(e) => tracing::warn!(error = %e, "failed to encode order event"),
        }
    }
}

async fn get_order<S: KeyValueStore + 'static>(State(s): State<AppState<S>>, Path(order_number): Path<String>) -> Result<Json<Order>, StorefrontError> {
    let number = OrderNumber::parse(order_number);
    s.storefront.order(&number).await.map(Json).ok_or_else(|| StorefrontError::OrderNotFound(number.to_string()))
}
