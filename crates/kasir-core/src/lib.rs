//! # kasir-core: Pure Settlement Logic for Kasir
//!
//! Everything the checkout engine decides, as pure functions with zero I/O.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Kasir Architecture                             │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 Cashier client (JSON over HTTP)                  │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    kasir-api (axum)                             │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    kasir-db (SQLite)                            │   │
//! │  │   BEGIN → bulk reads → ★ settlement ★ → stock/rows → COMMIT     │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ kasir-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌─────────┐ ┌─────────┐ ┌───────────┐ ┌────────────┐        │   │
//! │  │   │  money  │ │ pricing │ │ inventory │ │ settlement │        │   │
//! │  │   └─────────┘ └─────────┘ └───────────┘ └────────────┘        │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO CLOCK • PURE FUNCTIONS             │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`money`] - Integer minor-unit money
//! - [`types`] - Domain types (Product, Discount, Transaction, ...)
//! - [`pricing`] - Item discount selection and line pricing
//! - [`inventory`] - Stock sufficiency checks
//! - [`settlement`] - Order totals, global discount, change
//! - [`validation`] - Input rules checked before storage access
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use kasir_core::money::Money;
//! use kasir_core::pricing::discount_amount;
//! use kasir_core::types::DiscountKind;
//!
//! let price = Money::from_major(3_500);
//! let off = discount_amount(DiscountKind::Percentage, 1_000, price); // 10%
//! assert_eq!(price - off, Money::from_major(3_150));
//! ```

pub mod error;
pub mod inventory;
pub mod money;
pub mod pricing;
pub mod settlement;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use settlement::Settlement;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum lines in one checkout.
pub const MAX_CART_LINES: usize = 500;

/// Maximum quantity on a single line.
///
/// Keeps price × quantity far from i64 overflow.
pub const MAX_ITEM_QUANTITY: i64 = 1_000_000;

/// Shown for line items whose product has since been deleted.
pub const DELETED_PRODUCT_LABEL: &str = "(deleted product)";
