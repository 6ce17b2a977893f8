//! Order Aggregate

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};
use crate::domain::aggregates::{Cart, CartItem};
use crate::domain::events::{DomainEvent, OrderEvent};
use crate::domain::value_objects::OrderNumber;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryMethod { Pickup, #[default] Delivery }

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod { #[default] Cash, Card }

/// Contact, address and method choices collected by the checkout form.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryInfo {
    #[validate(length(min = 1, message = "Full name is required"), custom = "not_blank")]
    pub full_name: String,
    #[validate(email(message = "A valid email is required"))]
    pub email: String,
    #[validate(length(min = 1, message = "Phone is required"), custom = "not_blank")]
    pub phone: String,
    #[validate(length(min = 1, message = "Address is required"), custom = "not_blank")]
    pub address: String,
    #[validate(length(min = 1, message = "City is required"), custom = "not_blank")]
    pub city: String,
    #[validate(length(min = 1, message = "State is required"), custom = "not_blank")]
    pub state: String,
    #[validate(length(min = 1, message = "ZIP code is required"), custom = "not_blank")]
    pub zip_code: String,
    #[serde(default)]
    pub delivery_method: DeliveryMethod,
    #[serde(default)]
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub special_instructions: String,
}

fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() { Err(ValidationError::new("blank")) } else { Ok(()) }
}

/// What an order remembers about how it was paid. Card orders keep the last four digits only.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "lowercase")]
pub enum PaymentSummary {
    Cash,
    Card { last4: String },
}

impl PaymentSummary {
    pub fn method(&self) -> PaymentMethod {
        match self { Self::Cash => PaymentMethod::Cash, Self::Card { .. } => PaymentMethod::Card }
    }
}

/// A placed order. Immutable once created.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    id: Uuid,
    order_number: OrderNumber,
    items: Vec<CartItem>,
    delivery_info: DeliveryInfo,
    payment: PaymentSummary,
    total: Decimal,
    placed_at: DateTime<Utc>,
    #[serde(skip)]
    events: Vec<DomainEvent>,
}

impl Order {
    /// Snapshots the cart at submission time.
    pub fn place(order_number: OrderNumber, cart: &Cart, delivery_info: DeliveryInfo, payment: PaymentSummary, placed_at: DateTime<Utc>) -> Self {
        let total = cart.total();
        let mut order = Self {
            id: Uuid::now_v7(), order_number: order_number.clone(), items: cart.items().to_vec(),
            delivery_info, payment, total, placed_at, events: vec![],
        };
        order.raise_event(DomainEvent::Order(OrderEvent::Placed { order_number, total, item_count: cart.item_count(), placed_at }));
        order
    }

    pub fn id(&self) -> Uuid { self.id }
    pub fn order_number(&self) -> &OrderNumber { &self.order_number }
    pub fn items(&self) -> &[CartItem] { &self.items }
    pub fn delivery_info(&self) -> &DeliveryInfo { &self.delivery_info }
    pub fn payment(&self) -> &PaymentSummary { &self.payment }
    pub fn total(&self) -> Decimal { self.total }
    pub fn placed_at(&self) -> DateTime<Utc> { self.placed_at }

    pub fn take_events(&mut self) -> Vec<DomainEvent> { std::mem::take(&mut self.events) }
    fn raise_event(&mut self, e: DomainEvent) { self.events.push(e); }
}
