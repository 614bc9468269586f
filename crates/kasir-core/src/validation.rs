//! # Validation Module
//!
//! Input checks that run before any storage access.
//!
//! ## Validation Layers
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Layer 1: HTTP (kasir-api)                                             │
//! │  ├── JSON shape, decimal amounts → Money                               │
//! │  └── acting user header                                                │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  ├── empty cart, non-positive quantities                               │
//! │  └── purchase item completeness                                        │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Settlement / SQLite                                          │
//! │  ├── stock, discounts (inside the transaction)                         │
//! │  └── CHECK (stock >= 0), foreign keys                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::types::{CheckoutRequest, PurchaseItemRequest, PurchaseRequest};
use crate::{MAX_CART_LINES, MAX_ITEM_QUANTITY};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

const MAX_NAME_LEN: usize = 200;

// =============================================================================
// Checkout
// =============================================================================

/// Rejects carts that must never reach storage.
///
/// ## Rules
/// - at least one line (`EmptyCart`)
/// - every quantity > 0 (`InvalidQuantity`)
/// - at most `MAX_CART_LINES` lines, each at most `MAX_ITEM_QUANTITY`
/// - payment, when given, not negative
pub fn validate_checkout(request: &CheckoutRequest) -> CoreResult<()> {
    if request.items.is_empty() {
        return Err(CoreError::EmptyCart);
    }

    if request.items.len() > MAX_CART_LINES {
        return Err(ValidationError::OutOfRange {
            field: "items".to_string(),
            min: 1,
            max: MAX_CART_LINES as i64,
        }
        .into());
    }

    for item in &request.items {
        if item.quantity <= 0 {
            return Err(CoreError::InvalidQuantity {
                product_id: item.product_id,
                quantity: item.quantity,
            });
        }
        if item.quantity > MAX_ITEM_QUANTITY {
            return Err(ValidationError::OutOfRange {
                field: "quantity".to_string(),
                min: 1,
                max: MAX_ITEM_QUANTITY,
            }
            .into());
        }
    }

    if let Some(payment) = request.payment {
        validate_non_negative("payment_amount", payment)?;
    }

    Ok(())
}

// =============================================================================
// Purchases
// =============================================================================

/// Validates a restocking purchase.
///
/// ## Rules
/// - at least one item
/// - quantity > 0 and buy price ≥ 0 on every item
/// - items without `product_id` need a name and a sell price > 0
/// - every subtotal, and their sum, fits in minor units
pub fn validate_purchase(request: &PurchaseRequest) -> ValidationResult<()> {
    if request.items.is_empty() {
        return Err(ValidationError::Required {
            field: "items".to_string(),
        });
    }

    let mut total = Money::zero();
    for (index, item) in request.items.iter().enumerate() {
        validate_purchase_item(index, item)?;

        let overflow = || ValidationError::AmountOverflow {
            field: format!("items[{index}].buy_price"),
        };
        let subtotal = item
            .buy_price
            .checked_multiply_quantity(item.quantity)
            .ok_or_else(overflow)?;
        total = total.checked_add(subtotal).ok_or_else(overflow)?;
    }

    if let Some(supplier) = &request.supplier_name {
        validate_max_len("supplier_name", supplier)?;
    }

    Ok(())
}

fn validate_purchase_item(index: usize, item: &PurchaseItemRequest) -> ValidationResult<()> {
    let field = |name: &str| format!("items[{index}].{name}");

    if item.quantity <= 0 {
        return Err(ValidationError::MustBePositive {
            field: field("quantity"),
        });
    }
    if item.quantity > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: field("quantity"),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }
    validate_non_negative(&field("buy_price"), item.buy_price)?;

    if item.product_id.is_none() {
        let name = item.product_name.as_deref().unwrap_or_default();
        validate_product_name(&field("product_name"), name)?;

        match item.sell_price {
            Some(price) if price.is_positive() => {}
            _ => {
                return Err(ValidationError::MustBePositive {
                    field: field("sell_price"),
                })
            }
        }
    }

    Ok(())
}

// =============================================================================
// Field Validators
// =============================================================================

/// Non-empty after trimming, at most 200 characters.
///
/// ```rust
/// use kasir_core::validation::validate_product_name;
///
/// assert!(validate_product_name("name", "Indomie goreng").is_ok());
/// assert!(validate_product_name("name", "   ").is_err());
/// ```
pub fn validate_product_name(field: &str, name: &str) -> ValidationResult<()> {
    if name.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }
    validate_max_len(field, name)
}

fn validate_max_len(field: &str, value: &str) -> ValidationResult<()> {
    if value.trim().chars().count() > MAX_NAME_LEN {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_NAME_LEN,
        });
    }
    Ok(())
}

pub fn validate_non_negative(field: &str, amount: Money) -> ValidationResult<()> {
    if amount.is_negative() {
        return Err(ValidationError::MustNotBeNegative {
            field: field.to_string(),
        });
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CheckoutItem;

    fn checkout(items: &[(i64, i64)]) -> CheckoutRequest {
        CheckoutRequest {
            items: items
                .iter()
                .map(|&(product_id, quantity)| CheckoutItem {
                    product_id,
                    quantity,
                })
                .collect(),
            ..Default::default()
        }
    }

    fn new_product_item(name: Option<&str>, sell_price: Option<i64>) -> PurchaseItemRequest {
        PurchaseItemRequest {
            product_id: None,
            product_name: name.map(str::to_string),
            quantity: 12,
            buy_price: Money::from_cents(250_000),
            sell_price: sell_price.map(Money::from_cents),
            category_id: None,
        }
    }

    #[test]
    fn test_empty_cart() {
        assert!(matches!(
            validate_checkout(&checkout(&[])),
            Err(CoreError::EmptyCart)
        ));
    }

    #[test]
    fn test_non_positive_quantity() {
        assert!(matches!(
            validate_checkout(&checkout(&[(1, 2), (2, 0)])),
            Err(CoreError::InvalidQuantity {
                product_id: 2,
                quantity: 0
            })
        ));
        assert!(matches!(
            validate_checkout(&checkout(&[(3, -1)])),
            Err(CoreError::InvalidQuantity { .. })
        ));
        assert!(validate_checkout(&checkout(&[(1, 1)])).is_ok());
    }

    #[test]
    fn test_quantity_upper_bound() {
        assert!(matches!(
            validate_checkout(&checkout(&[(1, MAX_ITEM_QUANTITY + 1)])),
            Err(CoreError::Validation(ValidationError::OutOfRange { .. }))
        ));
    }

    #[test]
    fn test_negative_payment() {
        let mut request = checkout(&[(1, 1)]);
        request.payment = Some(Money::from_cents(-1));
        assert!(matches!(
            validate_checkout(&request),
            Err(CoreError::Validation(ValidationError::MustNotBeNegative { .. }))
        ));
    }

    #[test]
    fn test_purchase_requires_items() {
        assert!(validate_purchase(&PurchaseRequest::default()).is_err());
    }

    #[test]
    fn test_new_product_needs_name_and_sell_price() {
        let ok = PurchaseRequest {
            items: vec![new_product_item(Some("Teh Botol"), Some(400_000))],
            ..Default::default()
        };
        assert!(validate_purchase(&ok).is_ok());

        let nameless = PurchaseRequest {
            items: vec![new_product_item(None, Some(400_000))],
            ..Default::default()
        };
        let err = validate_purchase(&nameless).unwrap_err();
        assert_eq!(err.to_string(), "items[0].product_name is required");

        let free = PurchaseRequest {
            items: vec![new_product_item(Some("Teh Botol"), Some(0))],
            ..Default::default()
        };
        assert_eq!(
            validate_purchase(&free).unwrap_err().to_string(),
            "items[0].sell_price must be positive"
        );
    }

    #[test]
    fn test_restock_item_rules() {
        let restock = |quantity: i64, buy: i64| PurchaseRequest {
            items: vec![PurchaseItemRequest {
                product_id: Some(1),
                product_name: None,
                quantity,
                buy_price: Money::from_cents(buy),
                sell_price: None,
                category_id: None,
            }],
            ..Default::default()
        };

        assert!(validate_purchase(&restock(5, 0)).is_ok());
        assert!(validate_purchase(&restock(0, 100)).is_err());
        assert!(validate_purchase(&restock(5, -100)).is_err());

        assert_eq!(
            validate_purchase(&restock(2, i64::MAX / 2 + 1)).unwrap_err().to_string(),
            "items[0].buy_price is too large"
        );
        assert!(validate_purchase(&restock(1, i64::MAX)).is_ok());
    }
}
