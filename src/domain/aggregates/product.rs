//! Product Aggregate

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use crate::domain::value_objects::{parse_price, ProductId};

/// A sellable catalog entry as the storefront renders it.
///
/// Serialized in the camelCase layout the browser storefront writes, so carts
/// saved by either side hydrate into the same records.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    id: ProductId,
    name: String,
    category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    price: String,
    in_stock: bool,
}

impl Product {
    pub fn new(id: impl Into<ProductId>, name: impl Into<String>, category: impl Into<String>, price: impl Into<String>) -> Self {
        Self { id: id.into(), name: name.into(), category: category.into(), description: None, price: price.into(), in_stock: true }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self { self.description = Some(description.into()); self }
    pub fn with_stock(mut self, in_stock: bool) -> Self { self.in_stock = in_stock; self }

    pub fn id(&self) -> &ProductId { &self.id }
    pub fn name(&self) -> &str { &self.name }
    pub fn category(&self) -> &str { &self.category }
    pub fn description(&self) -> Option<&str> { self.description.as_deref() }
    /// Display price exactly as configured, e.g. `"$4.99"`.
    pub fn price(&self) -> &str { &self.price }
    pub fn unit_price(&self) -> Decimal { parse_price(&self.price) }
    pub fn is_in_stock(&self) -> bool { self.in_stock }
}
