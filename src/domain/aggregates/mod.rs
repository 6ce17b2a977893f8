//! Aggregates module
pub mod product;
pub mod order;
pub mod cart;

pub use product::Product;
pub use order::{DeliveryInfo, DeliveryMethod, Order, PaymentMethod, PaymentSummary};
pub use cart::{Cart, CartItem};
