//! HTTP handlers, one module per resource.

pub mod discounts;
pub mod health;
pub mod products;
pub mod purchases;
pub mod transactions;
