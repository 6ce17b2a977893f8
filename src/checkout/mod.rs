//! Checkout form controller.
//!
//! A [`CheckoutSession`] is one visit to the checkout view: it hydrates the
//! scope's cart on open, lets the shopper adjust quantities, and turns a valid
//! submission into exactly one persisted [`Order`].
//!
//! ```text
//! Empty <-> Idle --submit--> Submitting --gateway ok--> Placed
//! ```

pub mod card;
pub mod payment;

use rust_decimal::Decimal;
use thiserror::Error;
use validator::{Validate, ValidationErrors};

use crate::clock::Clock;
use crate::domain::aggregates::{Cart, DeliveryInfo, Order, PaymentMethod, PaymentSummary};
use crate::domain::events::{CartEvent, DomainEvent};
use crate::domain::value_objects::{OrderNumber, ProductId, StorageScope};
use crate::storage::{place_order, CartRepository, OrderRepository};

pub use card::{CardField, CardInfo, CardValidationError};
pub use payment::{AlwaysSucceeds, PaymentError, PaymentGateway, PaymentRequest};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CheckoutState {
    /// Cart is empty and nothing has been ordered yet.
    Empty,
    Idle,
    Submitting,
    Placed,
}

/// Navigation intents for the view, drained with [`CheckoutSession::take_events`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CheckoutEvent {
    /// The last item was removed; send the shopper back to browsing.
    ReturnToBrowse,
    OrderPlaced(OrderNumber),
}

#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("Your cart is empty")]
    EmptyCart,

    #[error("This order has already been placed")]
    AlreadyPlaced,

    #[error("An order is already being submitted")]
    InProgress,

    #[error("Please complete your delivery details: {0}")]
    InvalidDelivery(#[from] ValidationErrors),

    #[error(transparent)]
    InvalidCard(#[from] CardValidationError),

    #[error(transparent)]
    Payment(#[from] PaymentError),
}

const MAX_ORDER_NUMBER_ATTEMPTS: i64 = 1000;

/// A validated submission waiting on the payment gateway.
pub struct PendingOrder {
    delivery: DeliveryInfo,
    payment: PaymentSummary,
    card: Option<CardInfo>,
}

/// A submission the gateway has approved; only placing the order remains.
pub struct AuthorizedOrder {
    delivery: DeliveryInfo,
    payment: PaymentSummary,
}

#[derive(Clone, Debug)]
enum Phase {
    Open,
    Submitting,
    Placed(OrderNumber),
}

pub struct CheckoutSession<C, O, G, K> {
    scope: StorageScope,
    cart: Cart,
    carts: C,
    orders: O,
    gateway: G,
    clock: K,
    order_prefix: String,
    phase: Phase,
    events: Vec<CheckoutEvent>,
}

impl<C, O, G, K> CheckoutSession<C, O, G, K>
where
    C: CartRepository,
    O: OrderRepository,
    G: PaymentGateway,
    K: Clock,
{
    /// Mounts the checkout view: hydrates the scope's cart from storage.
    pub async fn open(scope: StorageScope, carts: C, orders: O, gateway: G, clock: K, order_prefix: impl Into<String>) -> Self {
        let cart = carts.load(&scope).await;
        Self { scope, cart, carts, orders, gateway, clock, order_prefix: order_prefix.into(), phase: Phase::Open, events: vec![] }
    }

    pub fn state(&self) -> CheckoutState {
        match self.phase {
            Phase::Placed(_) => CheckoutState::Placed,
            Phase::Submitting => CheckoutState::Submitting,
            Phase::Open if self.cart.is_empty() => CheckoutState::Empty,
            Phase::Open => CheckoutState::Idle,
        }
    }

    pub fn scope(&self) -> &StorageScope { &self.scope }
    pub fn cart(&self) -> &Cart { &self.cart }
    pub fn subtotal(&self) -> Decimal { self.cart.subtotal() }
    pub fn total(&self) -> Decimal { self.cart.total() }
    pub fn order_number(&self) -> Option<&OrderNumber> {
        match &self.phase { Phase::Placed(n) => Some(n), _ => None }
    }

    /// Quantity stepper on the order summary. Emptying the cart queues
    /// [`CheckoutEvent::ReturnToBrowse`].
    pub async fn update_quantity(&mut self, product_id: &ProductId, delta: i64) {
        if !matches!(self.phase, Phase::Open) { return; }
        if !self.cart.update_quantity(product_id, delta) { return; }
        self.carts.save(&self.scope, &self.cart).await;
        for event in self.cart.take_events() {
            tracing::debug!(scope = %self.scope, ?event, "checkout cart changed");
            if event == DomainEvent::Cart(CartEvent::Emptied) {
                self.events.push(CheckoutEvent::ReturnToBrowse);
            }
        }
    }

    /// Validates the form, runs the payment gateway and places the order.
    ///
    /// Validation failures leave the session untouched. Card details are only
    /// read for card payments and only their last four digits are kept.
    pub async fn submit(&mut self, delivery: DeliveryInfo, card: Option<CardInfo>) -> Result<Order, CheckoutError> {
        let pending = self.begin_submit(delivery, card)?;
        let authorized = self.authorize(pending).await?;
        Ok(self.place(authorized).await)
    }

    /// Validates the submission and moves the session to `Submitting`.
    pub fn begin_submit(&mut self, delivery: DeliveryInfo, card: Option<CardInfo>) -> Result<PendingOrder, CheckoutError> {
        match self.state() {
            CheckoutState::Empty => return Err(CheckoutError::EmptyCart),
            CheckoutState::Placed => return Err(CheckoutError::AlreadyPlaced),
            CheckoutState::Submitting => return Err(CheckoutError::InProgress),
            CheckoutState::Idle => {}
        }

        delivery.validate()?;
        let (payment, card) = match delivery.payment_method {
            PaymentMethod::Cash => (PaymentSummary::Cash, None),
            PaymentMethod::Card => {
                let card = card.ok_or_else(|| CardValidationError {
                    fields: vec![CardField::CardholderName, CardField::Number, CardField::Expiry, CardField::Cvc],
                })?;
                card.validate()?;
                (PaymentSummary::Card { last4: card.last4() }, Some(card))
            }
        };

        self.phase = Phase::Submitting;
        Ok(PendingOrder { delivery, payment, card })
    }

    /// Runs the payment gateway. A refusal returns the session to `Idle`.
    pub async fn authorize(&mut self, pending: PendingOrder) -> Result<AuthorizedOrder, CheckoutError> {
        let request = PaymentRequest { amount: self.cart.total(), method: pending.delivery.payment_method, card: pending.card.as_ref() };
        if let Err(e) = self.gateway.authorize(&request).await {
            tracing::warn!(scope = %self.scope, error = %e, "payment not authorized");
            self.phase = Phase::Open;
            return Err(e.into());
        }
        Ok(AuthorizedOrder { delivery: pending.delivery, payment: pending.payment })
    }

    /// Persists the order and clears the scope's cart. Cannot fail once payment is authorized.
    pub async fn place(&mut self, authorized: AuthorizedOrder) -> Order {
        let now = self.clock.now();
        let mut number = OrderNumber::generate(&self.order_prefix, now);
        let mut bump = 0;
        // Order records are write-once; step past numbers already taken.
        while self.orders.exists(&number).await {
            bump += 1;
            if bump > MAX_ORDER_NUMBER_ATTEMPTS {
                tracing::error!(scope = %self.scope, order_number = %number, "no free order number found");
                break;
            }
            number = OrderNumber::generate(&self.order_prefix, now + chrono::Duration::milliseconds(bump));
        }
        let order = Order::place(number, &self.cart, authorized.delivery, authorized.payment, now);
        place_order(&self.orders, &self.carts, &self.scope, &order).await;
        self.cart.clear();
        self.phase = Phase::Placed(order.order_number().clone());
        self.events.push(CheckoutEvent::OrderPlaced(order.order_number().clone()));
        order
    }

    pub fn take_events(&mut self) -> Vec<CheckoutEvent> { std::mem::take(&mut self.events) }
}
