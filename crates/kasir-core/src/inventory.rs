//! # Inventory Guard
//!
//! Stock sufficiency rules for a cart, checked against one bulk snapshot of
//! the products involved.
//!
//! ```text
//! cart lines ──► merge_quantities ──► [(product_id, total qty)]
//!                                            │
//!                      products snapshot ───►│ check_availability
//!                                            ▼
//!                    Ok(()) or the first ProductNotFound / InsufficientStock
//! ```
//!
//! This module only decides. The decrement itself is a conditional storage
//! update in kasir-db that repeats the `stock >= qty` condition, so a
//! concurrent checkout that sold the stock in between is still caught.

use std::collections::HashMap;

use crate::error::{CoreError, CoreResult};
use crate::types::{CheckoutItem, Product};

/// Total requested quantity per product, in order of first appearance.
///
/// A product listed on two lines is checked and decremented once for the
/// combined quantity.
pub fn merge_quantities(items: &[CheckoutItem]) -> Vec<(i64, i64)> {
    let mut merged: Vec<(i64, i64)> = Vec::with_capacity(items.len());
    for item in items {
        match merged.iter_mut().find(|(id, _)| *id == item.product_id) {
            Some((_, quantity)) => *quantity += item.quantity,
            None => merged.push((item.product_id, item.quantity)),
        }
    }
    merged
}

/// Validates every demanded product before anything is mutated.
///
/// Missing products are reported before shortages, so a cart with a stale
/// product id is rejected as such even if another line is also short.
pub fn check_availability(
    demand: &[(i64, i64)],
    products: &HashMap<i64, Product>,
) -> CoreResult<()> {
    if let Some((missing, _)) = demand.iter().find(|(id, _)| !products.contains_key(id)) {
        return Err(CoreError::ProductNotFound(*missing));
    }

    for (product_id, requested) in demand {
        let Some(product) = products.get(product_id) else {
            return Err(CoreError::ProductNotFound(*product_id));
        };
        if !product.has_stock_for(*requested) {
            return Err(CoreError::InsufficientStock {
                product_id: *product_id,
                name: product.name.clone(),
                available: product.stock,
                requested: *requested,
            });
        }
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
