//! Medify pharmacy storefront
//!
//! Cart and checkout core for the generated pharmacy storefront template.
//!
//! ## Features
//! - Product catalog from demo fixtures or the business's setup record
//! - Storage-backed cart scoped per template and demo/live mode
//! - Checkout with card validation and a pluggable payment gateway
//! - Write-once order persistence
//! - JSON HTTP service over the same operations

pub mod checkout;
pub mod clock;
pub mod config;
pub mod domain;
pub mod http;
pub mod storage;
pub mod storefront;

use thiserror::Error;

pub use checkout::{CardInfo, CheckoutError, CheckoutSession, CheckoutState};
pub use domain::aggregates::{Cart, CartItem, DeliveryInfo, Order, PaymentSummary, Product};
pub use domain::value_objects::{OrderNumber, ProductId, StorageScope};
pub use storefront::Storefront;

// =============================================================================
// Error Types
// =============================================================================

#[derive(Error, Debug)]
pub enum StorefrontError {
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    #[error("Order not found: {0}")]
    OrderNotFound(String),

    #[error(transparent)]
    Checkout(#[from] CheckoutError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, StorefrontError>;
