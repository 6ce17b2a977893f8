//! Product catalog adapter.
//!
//! Normalizes either the demo fixtures or a business's configured product list
//! into the [`Product`] records the storefront renders and sells against.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::domain::aggregates::Product;
use crate::domain::value_objects::ProductId;

const DEFAULT_CATEGORY: &str = "General";
const DEFAULT_PRICE: &str = "$0.00";

/// Business setup record written by the dashboard's pharmacy setup wizard.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PharmacySetup {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default)]
    pub products: Option<Vec<ProductEntry>>,
}

/// One product as the business typed it in; every field but the name is optional.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductEntry {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub in_stock: Option<bool>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Catalog {
    products: Vec<Product>,
}

impl Catalog {
    /// Fixture catalog shown by template previews.
    pub fn demo() -> Self {
        let products = [
            ("d1", "Paracetamol 500mg", "Pain Relief", "Tablets for everyday pain relief.", "$4.99"),
            ("d2", "Ibuprofen 200mg", "Pain Relief", "Anti-inflammatory pain reliever.", "$6.49"),
            ("d3", "Vitamin C 1000mg", "Vitamins", "Immune system support.", "$9.99"),
            ("d4", "Allergy Relief 24h", "Allergy", "Non-drowsy allergy tablets.", "$13.99"),
            ("d5", "Saline Nasal Spray", "Cold & Flu", "Gentle nasal spray.", "$3.99"),
        ]
        .into_iter()
        .map(|(id, name, category, description, price)| Product::new(id, name, category, price).with_description(description))
        .collect();
        Self { products }
    }

    /// Normalizes a business's configured entries. Missing setup yields an empty catalog.
    pub fn from_setup(setup: Option<&PharmacySetup>) -> Self {
        let entries = setup.and_then(|s| s.products.as_deref()).unwrap_or_default();
        let mut seen: HashMap<ProductId, usize> = HashMap::new();
        let products = entries
            .iter()
            .filter(|entry| !entry.name.trim().is_empty())
            .map(|entry| {
                let category = non_blank(entry.category.as_deref()).unwrap_or(DEFAULT_CATEGORY);
                let price = non_blank(entry.price.as_deref()).unwrap_or(DEFAULT_PRICE);
                let base = ProductId::content_stable(&entry.name, category);
                let occurrence = seen.entry(base.clone()).or_insert(0);
                *occurrence += 1;
                let mut product = Product::new(base.with_occurrence(*occurrence), entry.name.clone(), category, price)
                    .with_stock(entry.in_stock != Some(false));
                if let Some(description) = &entry.description {
                    product = product.with_description(description.clone());
                }
                product
            })
            .collect();
        Self { products }
    }

    pub fn products(&self) -> &[Product] { &self.products }
    pub fn len(&self) -> usize { self.products.len() }
    pub fn is_empty(&self) -> bool { self.products.is_empty() }
    pub fn find(&self, id: &ProductId) -> Option<&Product> { self.products.iter().find(|p| p.id() == id) }
    pub fn featured(&self, limit: usize) -> &[Product] { &self.products[..limit.min(self.products.len())] }
    pub fn into_products(self) -> Vec<Product> { self.products }
}

fn non_blank(value: Option<&str>) -> Option<&str> { value.filter(|v| !v.trim().is_empty()) }

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(name: &str) -> ProductEntry { ProductEntry { name: name.into(), ..Default::default() } }

    fn setup(products: Vec<ProductEntry>) -> PharmacySetup { PharmacySetup { products: Some(products), ..Default::default() } }

    #[test]
    fn test_demo_fixtures() {
        let catalog = Catalog::demo();
        assert_eq!(catalog.len(), 5);
        assert_eq!(catalog.products()[0].id().as_str(), "d1");
        assert_eq!(catalog.featured(3).len(), 3);
    }

    #[test]
    fn test_defaults_and_filtering() {
        let catalog = Catalog::from_setup(Some(&setup(vec![
            entry("Aspirin"),
            entry("   "),
            ProductEntry { name: "Zinc".into(), category: Some("Vitamins".into()), price: Some("$2.50".into()), in_stock: Some(false), ..Default::default() },
        ])));
        assert_eq!(catalog.len(), 2);
        let aspirin = &catalog.products()[0];
        assert_eq!(aspirin.category(), "General");
        assert_eq!(aspirin.price(), "$0.00");
        assert!(aspirin.is_in_stock());
        let zinc = &catalog.products()[1];
        assert_eq!(zinc.category(), "Vitamins");
        assert!(!zinc.is_in_stock());
    }

    #[test]
    fn test_missing_setup_is_empty() {
        assert!(Catalog::from_setup(None).is_empty());
        assert!(Catalog::from_setup(Some(&PharmacySetup::default())).is_empty());
        assert_eq!(Catalog::from_setup(None).featured(3).len(), 0);
    }

    #[test]
    fn test_ids_survive_reordering() {
        let first = Catalog::from_setup(Some(&setup(vec![entry("Aspirin"), entry("Zinc")])));
        let second = Catalog::from_setup(Some(&setup(vec![entry("Zinc"), entry("Aspirin")])));
        let aspirin_id = first.products()[0].id().clone();
        assert_eq!(second.find(&aspirin_id).map(Product::name), Some("Aspirin"));
    }

    #[test]
    fn test_duplicate_entries_get_distinct_ids() {
        let catalog = Catalog::from_setup(Some(&setup(vec![entry("Aspirin"), entry("Aspirin")])));
        assert_ne!(catalog.products()[0].id(), catalog.products()[1].id());
        assert!(catalog.products()[1].id().as_str().ends_with("-2"));
    }
}
