//! # Domain Types
//!
//! Core domain types used throughout Kasir.
//!
//! ## Type Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌──────────────────────┐  │
//! │  │    Product      │   │    Discount     │   │    Transaction       │  │
//! │  │  ─────────────  │   │  ─────────────  │   │  ──────────────────  │  │
//! │  │  price_cents    │   │  kind / value   │   │  total_amount_cents  │  │
//! │  │  cost_price?    │   │  product_id?    │   │  discount_id?        │  │
//! │  │  stock ≥ 0      │   │  category_id?   │   │  discount_amount     │  │
//! │  │  category_id?   │   │  [start, end]   │   │  payment / change    │  │
//! │  └─────────────────┘   └─────────────────┘   └──────────┬───────────┘  │
//! │                                                         │ 1..n          │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌──────────▼───────────┐  │
//! │  │ CheckoutRequest │   │ PurchaseRequest │   │  TransactionDetail   │  │
//! │  │  (ephemeral)    │   │  (restocking)   │   │  unit price (gross)  │  │
//! │  └─────────────────┘   └─────────────────┘   │  subtotal (net)      │  │
//! │                                              │  cost snapshot       │  │
//! │                                              └──────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Amount Columns
//! Persisted amounts are `i64` minor units with a `_cents` suffix; each
//! struct exposes [`Money`] accessors over them. Absent values (no cost
//! price, no discount, no scope) are `Option`, never a zero sentinel.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;

// =============================================================================
// Discount Kind
// =============================================================================

/// How a discount's `value` is interpreted.
///
/// `value` is always stored in hundredths:
/// - `Percentage`: basis points, 1000 = 10%
/// - `Fixed`: minor units, 500000 = Rp 5.000
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "UPPERCASE"))]
#[serde(rename_all = "UPPERCASE")]
#[ts(export)]
pub enum DiscountKind {
    Percentage,
    Fixed,
}

// =============================================================================
// Category
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Product
// =============================================================================

/// A product available for sale.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Product {
    pub id: i64,

    /// Display name shown to cashier and on receipt.
    pub name: String,

    /// Sell price in minor units.
    pub price_cents: i64,

    /// Acquisition cost ("harga beli") in minor units, when known.
    pub cost_price_cents: Option<i64>,

    /// Units on hand. Never negative.
    pub stock: i64,

    pub category_id: Option<i64>,

    /// Opaque id of the user who created the product.
    pub created_by: Option<String>,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Product {
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    #[inline]
    pub fn cost_price(&self) -> Option<Money> {
        self.cost_price_cents.map(Money::from_cents)
    }

    /// Cost to snapshot into a sale line.
    ///
    /// Falls back to the sell price when the cost is unknown, which books
    /// the line at zero profit.
    #[inline]
    pub fn cost_snapshot(&self) -> Money {
        self.cost_price().unwrap_or_else(|| self.price())
    }

    /// Profit per unit at current prices, when the cost is known.
    pub fn unit_profit(&self) -> Option<Money> {
        self.cost_price().map(|cost| self.price() - cost)
    }

    /// Margin in percent of the sell price, for display only.
    ///
    /// `None` when the cost is unknown or the sell price is zero.
    pub fn margin(&self) -> Option<f64> {
        let cost = self.cost_price_cents?;
        if self.price_cents <= 0 {
            return None;
        }
        Some((self.price_cents - cost) as f64 / self.price_cents as f64 * 100.0)
    }

    #[inline]
    pub fn has_stock_for(&self, quantity: i64) -> bool {
        self.stock >= quantity
    }
}

// =============================================================================
// Discount
// =============================================================================

/// What a discount applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscountScope {
    /// Auto-applied to one product.
    Product(i64),
    /// Auto-applied to every product in a category.
    Category(i64),
    /// Unscoped; chosen by id at checkout, applied to the order total.
    Global,
}

/// A promotional discount.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Discount {
    pub id: i64,
    pub name: String,
    pub kind: DiscountKind,

    /// Basis points for `Percentage`, minor units for `Fixed`.
    pub value: i64,

    /// Order total (after item discounts) required before a global
    /// discount may be used.
    pub min_order_cents: i64,

    pub product_id: Option<i64>,
    pub category_id: Option<i64>,

    #[ts(as = "String")]
    pub start_date: DateTime<Utc>,
    #[ts(as = "String")]
    pub end_date: DateTime<Utc>,

    pub is_active: bool,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Discount {
    /// Product scope wins if a row somehow carries both ids.
    pub fn scope(&self) -> DiscountScope {
        match (self.product_id, self.category_id) {
            (Some(product_id), _) => DiscountScope::Product(product_id),
            (None, Some(category_id)) => DiscountScope::Category(category_id),
            (None, None) => DiscountScope::Global,
        }
    }

    #[inline]
    pub fn is_global(&self) -> bool {
        self.scope() == DiscountScope::Global
    }

    /// Inclusive validity window check.
    #[inline]
    pub fn is_within_window(&self, now: DateTime<Utc>) -> bool {
        self.start_date <= now && now <= self.end_date
    }

    /// Active flag set and `now` inside `[start_date, end_date]`.
    #[inline]
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        self.is_active && self.is_within_window(now)
    }

    #[inline]
    pub fn min_order(&self) -> Money {
        Money::from_cents(self.min_order_cents)
    }
}

// =============================================================================
// Transaction
// =============================================================================

/// A committed sale. Immutable once written.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Transaction {
    pub id: i64,

    /// Net total after item and global discounts.
    pub total_amount_cents: i64,

    /// The global discount used, if any.
    pub discount_id: Option<i64>,

    /// Item discounts plus the global discount.
    pub discount_amount_cents: i64,

    /// Amount tendered; zero when none was supplied.
    pub payment_amount_cents: i64,

    pub change_amount_cents: i64,

    /// Opaque id of the cashier who performed the checkout.
    pub cashier_id: Option<String>,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    /// Σ quantity over the line items (computed on read).
    pub total_items: i64,

    /// total_amount − Σ(cost snapshot × quantity) (computed on read).
    pub profit_cents: i64,
}

impl Transaction {
    #[inline]
    pub fn total_amount(&self) -> Money {
        Money::from_cents(self.total_amount_cents)
    }

    #[inline]
    pub fn discount_amount(&self) -> Money {
        Money::from_cents(self.discount_amount_cents)
    }

    #[inline]
    pub fn profit(&self) -> Money {
        Money::from_cents(self.profit_cents)
    }
}

/// A line item of a committed transaction.
///
/// Price and cost are snapshots taken at checkout, so later catalog edits
/// never change historical totals or profit.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct TransactionDetail {
    pub id: i64,
    pub transaction_id: i64,

    /// `None` once the product has been deleted.
    pub product_id: Option<i64>,

    /// Current product name, or a placeholder for deleted products.
    pub product_name: String,

    pub quantity: i64,

    /// Gross unit price before discount.
    pub unit_price_cents: i64,

    /// Net line total: (unit price − unit discount) × quantity.
    pub subtotal_cents: i64,

    /// Unit cost at the time of sale.
    pub cost_price_cents: i64,

    pub discount_kind: Option<DiscountKind>,
    pub discount_value: Option<i64>,

    /// Line discount total: unit discount × quantity.
    pub discount_amount_cents: Option<i64>,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl TransactionDetail {
    #[inline]
    pub fn subtotal(&self) -> Money {
        Money::from_cents(self.subtotal_cents)
    }

    /// unit price × quantity.
    #[inline]
    pub fn gross(&self) -> Money {
        Money::from_cents(self.unit_price_cents).multiply_quantity(self.quantity)
    }

    #[inline]
    pub fn cost_total(&self) -> Money {
        Money::from_cents(self.cost_price_cents).multiply_quantity(self.quantity)
    }
}

/// Header plus ordered line items, as returned by checkout and detail reads.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TransactionWithDetails {
    #[serde(flatten)]
    pub transaction: Transaction,
    pub details: Vec<TransactionDetail>,
}

// =============================================================================
// Checkout Request
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CheckoutItem {
    pub product_id: i64,
    pub quantity: i64,
}

/// Ephemeral checkout input. Not persisted as-is.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CheckoutRequest {
    pub items: Vec<CheckoutItem>,

    /// Optional global discount chosen by the cashier.
    pub discount_id: Option<i64>,

    /// Amount tendered, if the cashier entered one.
    pub payment: Option<Money>,
}

// =============================================================================
// Purchases (Restocking)
// =============================================================================

/// One line of a restocking purchase.
///
/// With `product_id` the existing product is restocked. Without it,
/// `product_name` and `sell_price` describe a product to create (or to
/// restock, if one with that name already exists).
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PurchaseItemRequest {
    pub product_id: Option<i64>,
    pub product_name: Option<String>,
    pub quantity: i64,
    pub buy_price: Money,
    pub sell_price: Option<Money>,
    pub category_id: Option<i64>,
}

impl PurchaseItemRequest {
    /// quantity × buy price.
    #[inline]
    pub fn subtotal(&self) -> Money {
        self.buy_price.multiply_quantity(self.quantity)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PurchaseRequest {
    pub supplier_name: Option<String>,
    pub notes: Option<String>,
    pub items: Vec<PurchaseItemRequest>,
}

impl PurchaseRequest {
    pub fn total_amount(&self) -> Money {
        self.items.iter().map(PurchaseItemRequest::subtotal).sum()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Purchase {
    pub id: i64,
    pub supplier_name: Option<String>,
    pub total_amount_cents: i64,
    pub notes: Option<String>,
    pub created_by: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    /// Σ quantity over the items (computed on read).
    pub total_items: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct PurchaseItem {
    pub id: i64,
    pub purchase_id: i64,
    pub product_id: Option<i64>,
    /// Product name at the time of purchase (frozen).
    pub product_name: String,
    pub quantity: i64,
    pub buy_price_cents: i64,
    pub sell_price_cents: Option<i64>,
    pub category_id: Option<i64>,
    pub subtotal_cents: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PurchaseWithItems {
    #[serde(flatten)]
    pub purchase: Purchase,
    pub items: Vec<PurchaseItem>,
}

// =============================================================================
// Unit Tests
// =============================================================================
