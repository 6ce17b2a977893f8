//! Storefront domain: catalog, cart and order types.
pub mod aggregates;
pub mod catalog;
pub mod events;
pub mod value_objects;
