//! # Error Types
//!
//! Domain-specific error types for kasir-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  kasir-core errors (this file)                                         │
//! │  ├── CoreError        - Business rule violations                       │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  kasir-db errors (separate crate)                                      │
//! │  └── DbError          - Storage failures, wraps CoreError raised       │
//! │                         inside the checkout transaction                │
//! │                                                                         │
//! │  kasir-api errors (app)                                                │
//! │  └── ApiError         - What the cashier client sees                   │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → ApiError → Client       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every variant carries the ids and amounts the client needs to react
//! (remove an item, pick another discount) without parsing the message.

use thiserror::Error;

use crate::money::Money;

// =============================================================================
// Core Error
// =============================================================================

/// Business rule violations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The cart has no items.
    #[error("Cart is empty")]
    EmptyCart,

    /// A cart line has a quantity of zero or less.
    #[error("Invalid quantity {quantity} for product {product_id}")]
    InvalidQuantity { product_id: i64, quantity: i64 },

    /// A cart line references a product id that does not exist.
    #[error("Product not found: {0}")]
    ProductNotFound(i64),

    /// Insufficient stock to complete the checkout.
    ///
    /// ## User Workflow
    /// ```text
    /// Checkout [{product_id: 1, quantity: 5}]
    ///      │
    ///      ▼
    /// Check stock: available=3
    ///      │
    ///      ▼
    /// InsufficientStock { product_id: 1, available: 3, requested: 5 }
    ///      │
    ///      ▼
    /// Whole checkout rejected, nothing decremented
    /// ```
    #[error("Insufficient stock for {name} (id {product_id}): available {available}, requested {requested}")]
    InsufficientStock {
        product_id: i64,
        name: String,
        available: i64,
        requested: i64,
    },

    /// The selected global discount id does not exist.
    #[error("Discount not found: {0}")]
    DiscountNotFound(i64),

    /// The selected discount is scoped to a product or category and is
    /// applied automatically; it cannot be chosen at checkout.
    #[error("Discount {0} is a product/category discount and cannot be selected at checkout")]
    DiscountNotGlobal(i64),

    /// The selected discount is switched off.
    #[error("Discount {0} is not active")]
    DiscountInactive(i64),

    /// The selected discount is outside its validity window.
    #[error("Discount {0} is expired or not yet valid")]
    DiscountExpired(i64),

    /// The order total after item discounts is below the discount minimum.
    #[error("Discount {discount_id} requires a minimum order of {minimum}, order total is {order_total}")]
    MinimumOrderNotMet {
        discount_id: i64,
        minimum: Money,
        order_total: Money,
    },

    /// Transaction id does not exist.
    #[error("Transaction not found: {0}")]
    TransactionNotFound(i64),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// True for lookups that failed because the id does not exist.
    ///
    /// Only a missing transaction on the detail view is a "not found"
    /// in HTTP terms; a missing product or discount inside a checkout
    /// is a rejected request.
    pub fn is_not_found(&self) -> bool {
        matches!(self, CoreError::TransactionNotFound(_))
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These occur before any storage access.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// An amount derived from this field no longer fits in minor units.
    #[error("{field} is too large")]
    AmountOverflow { field: String },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    MustNotBeNegative { field: String },

    /// Invalid format (e.g., invalid date, too many decimals).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
