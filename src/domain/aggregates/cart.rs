//! Cart Aggregate

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use crate::domain::aggregates::Product;
use crate::domain::events::{CartEvent, DomainEvent};
use crate::domain::value_objects::ProductId;

/// One cart line. `quantity` is always at least 1.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub product: Product,
    pub quantity: u32,
}

impl CartItem {
    pub fn product_id(&self) -> &ProductId { self.product.id() }
    pub fn line_total(&self) -> Decimal { self.product.unit_price() * Decimal::from(self.quantity) }
}

/// Quantity-by-product state for one storage scope.
#[derive(Clone, Debug, Default)]
pub struct Cart {
    items: Vec<CartItem>,
    events: Vec<DomainEvent>,
}

impl Cart {
    pub fn new() -> Self { Self::default() }

    /// Rebuilds a cart from persisted lines, dropping zero quantities and merging duplicate ids.
    pub fn from_items(items: Vec<CartItem>) -> Self {
        let mut cart = Self::new();
        for item in items.into_iter().filter(|i| i.quantity > 0) {
            match cart.items.iter_mut().find(|i| i.product_id() == item.product_id()) {
                Some(existing) => existing.quantity = existing.quantity.saturating_add(item.quantity),
                None => cart.items.push(item),
            }
        }
        cart
    }

    pub fn items(&self) -> &[CartItem] { &self.items }
    pub fn is_empty(&self) -> bool { self.items.is_empty() }
    pub fn line_count(&self) -> usize { self.items.len() }
    /// Total units across all lines, as shown on the cart badge.
    pub fn item_count(&self) -> u32 { self.items.iter().fold(0u32, |n, i| n.saturating_add(i.quantity)) }
    pub fn quantity_of(&self, product_id: &ProductId) -> u32 {
        self.items.iter().find(|i| i.product_id() == product_id).map_or(0, |i| i.quantity)
    }

    pub fn subtotal(&self) -> Decimal { self.items.iter().map(CartItem::line_total).sum() }
    /// No tax or shipping lines: the total is the subtotal.
    pub fn total(&self) -> Decimal { self.subtotal() }

    /// Returns whether the cart changed; out-of-stock products are ignored.
    pub fn add_to_cart(&mut self, product: &Product) -> bool {
        if !product.is_in_stock() { return false; }
        let quantity = match self.items.iter_mut().find(|i| i.product_id() == product.id()) {
            Some(existing) => { existing.quantity = existing.quantity.saturating_add(1); existing.quantity }
            None => { self.items.push(CartItem { product: product.clone(), quantity: 1 }); 1 }
        };
        self.raise_event(DomainEvent::Cart(CartEvent::ItemAdded { product_id: product.id().clone(), quantity }));
        true
    }

    /// Applies `delta` to a line; a result of zero or less removes the line.
    /// Returns whether the cart changed.
    pub fn update_quantity(&mut self, product_id: &ProductId, delta: i64) -> bool {
        let Some(pos) = self.items.iter().position(|i| i.product_id() == product_id) else { return false; };
        let new_quantity = i64::from(self.items[pos].quantity).saturating_add(delta);
        if new_quantity <= 0 {
            self.items.remove(pos);
            self.raise_event(DomainEvent::Cart(CartEvent::ItemRemoved { product_id: product_id.clone() }));
            if self.items.is_empty() { self.raise_event(DomainEvent::Cart(CartEvent::Emptied)); }
        } else {
            let quantity = u32::try_from(new_quantity).unwrap_or(u32::MAX);
            self.items[pos].quantity = quantity;
            self.raise_event(DomainEvent::Cart(CartEvent::QuantityChanged { product_id: product_id.clone(), quantity }));
        }
        true
    }

    pub fn clear(&mut self) { self.items.clear(); }

    pub fn take_events(&mut self) -> Vec<DomainEvent> { std::mem::take(&mut self.events) }
    fn raise_event(&mut self, e: DomainEvent) { self.events.push(e); }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paracetamol() -> Product { Product::new("d1", "Paracetamol 500mg", "Pain Relief", "$4.99") }
    fn vitamin_c() -> Product { Product::new("d3", "Vitamin C 1000mg", "Vitamins", "$9.99") }

    #[test]
    fn test_cart_operations() {
        let mut cart = Cart::new();
        assert!(cart.add_to_cart(&paracetamol()));
        assert!(cart.add_to_cart(&paracetamol()));
        assert!(cart.add_to_cart(&vitamin_c()));
        assert_eq!(cart.line_count(), 2);
        assert_eq!(cart.item_count(), 3);
        assert_eq!(cart.quantity_of(paracetamol().id()), 2); // Merged
    }

    #[test]
    fn test_totals() {
        let mut cart = Cart::new();
        for _ in 0..3 { cart.add_to_cart(&paracetamol()); }
        assert_eq!(cart.subtotal(), Decimal::new(1497, 2));
        assert_eq!(cart.total(), Decimal::new(1497, 2));
    }

    #[test]
    fn test_unparsable_price_counts_as_zero() {
        let mut cart = Cart::new();
        cart.add_to_cart(&Product::new("x", "Mystery", "General", "call us"));
        cart.add_to_cart(&vitamin_c());
        assert_eq!(cart.total(), Decimal::new(999, 2));
    }

    #[test]
    fn test_out_of_stock_is_ignored() {
        let mut cart = Cart::new();
        assert!(!cart.add_to_cart(&paracetamol().with_stock(false)));
        assert!(cart.is_empty());
        assert!(cart.take_events().is_empty());
    }

    #[test]
    fn test_decrement_to_zero_removes_line() {
        let mut cart = Cart::new();
        cart.add_to_cart(&paracetamol());
        cart.add_to_cart(&paracetamol());
        cart.take_events();
        assert!(cart.update_quantity(paracetamol().id(), -2));
        assert!(cart.is_empty());
        assert_eq!(cart.take_events(), vec![
            DomainEvent::Cart(CartEvent::ItemRemoved { product_id: paracetamol().id().clone() }),
            DomainEvent::Cart(CartEvent::Emptied),
        ]);
    }

    #[test]
    fn test_overshooting_decrement_removes_line() {
        let mut cart = Cart::new();
        cart.add_to_cart(&paracetamol());
        cart.add_to_cart(&vitamin_c());
        cart.update_quantity(paracetamol().id(), -5);
        assert_eq!(cart.line_count(), 1);
        assert!(!cart.take_events().contains(&DomainEvent::Cart(CartEvent::Emptied)));
    }

    #[test]
    fn test_update_unknown_product_is_noop() {
        let mut cart = Cart::new();
        cart.add_to_cart(&paracetamol());
        assert!(!cart.update_quantity(&ProductId::new("nope"), 1));
        assert_eq!(cart.item_count(), 1);
    }

    #[test]
    fn test_quantities_stay_positive() {
        let mut cart = Cart::new();
        let deltas = [1, -1, 3, -2, 0, -7, 2, 5, -4, -1, -1, 1];
        for (step, delta) in deltas.iter().enumerate() {
            if step % 3 == 0 { cart.add_to_cart(&paracetamol()); }
            cart.update_quantity(paracetamol().id(), *delta);
            cart.update_quantity(vitamin_c().id(), *delta);
            assert!(cart.items().iter().all(|i| i.quantity >= 1));
        }
    }

    #[test]
    fn test_extreme_deltas_saturate() {
        let mut cart = Cart::new();
        cart.add_to_cart(&paracetamol());
        cart.add_to_cart(&vitamin_c());
        assert!(cart.update_quantity(paracetamol().id(), i64::MAX));
        assert_eq!(cart.quantity_of(paracetamol().id()), u32::MAX);
        assert!(cart.update_quantity(vitamin_c().id(), i64::MAX));
        assert_eq!(cart.item_count(), u32::MAX);

        assert!(cart.update_quantity(paracetamol().id(), i64::MIN));
        assert_eq!(cart.quantity_of(paracetamol().id()), 0);
        assert_eq!(cart.line_count(), 1);
    }

    #[test]
    fn test_from_items_normalizes() {
        let cart = Cart::from_items(vec![
            CartItem { product: paracetamol(), quantity: 1 },
            CartItem { product: vitamin_c(), quantity: 0 },
            CartItem { product: paracetamol(), quantity: 2 },
        ]);
        assert_eq!(cart.line_count(), 1);
        assert_eq!(cart.quantity_of(paracetamol().id()), 3);
    }
}
