//! Domain events
use crate::domain::value_objects::{OrderNumber, ProductId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DomainEvent {
    Cart(CartEvent),
    Order(OrderEvent),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CartEvent {
    ItemAdded { product_id: ProductId, quantity: u32 },
    QuantityChanged { product_id: ProductId, quantity: u32 },
    ItemRemoved { product_id: ProductId },
    /// The last item left the cart through a quantity change.
    Emptied,
}

/// Published to the message bus; carries no payment details.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OrderEvent {
    Placed { order_number: OrderNumber, total: Decimal, item_count: u32, placed_at: DateTime<Utc> },
}

impl OrderEvent {
    pub fn subject(&self) -> &'static str {
        match self { Self::Placed { .. } => "storefront.orders.placed" }
    }
}
