//! # Pricing & Discount Resolver
//!
//! Determines, for one cart line, which item discount applies and what the
//! line costs after it. Pure: no storage, no clock.
//!
//! ## Resolution Order
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Cart line: product 12 (category 3), qty 2, price 10000                 │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Active product discount for 12? ──yes──► use it                        │
//! │       │ no                                                              │
//! │       ▼                                                                 │
//! │  Active category discount for 3? ──yes──► use it                        │
//! │       │ no                                                              │
//! │       ▼                                                                 │
//! │  No item discount                                                       │
//! │                                                                         │
//! │  unit discount = clamp(price × bps/10000 | fixed, 0, price)             │
//! │  subtotal      = (price − unit discount) × qty                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The discount is computed per unit and then multiplied, so line totals
//! always reconcile exactly with the stored unit price and subtotal.

use chrono::{DateTime, Utc};
use std::collections::HashMap;

use crate::money::Money;
use crate::types::{Discount, DiscountKind, DiscountScope, Product};

// =============================================================================
// Discount Amount
// =============================================================================

/// Amount a discount takes off `base`, clamped to `[0, base]`.
///
/// ```rust
/// use kasir_core::money::Money;
/// use kasir_core::pricing::discount_amount;
/// use kasir_core::types::DiscountKind;
///
/// let price = Money::from_cents(10_000);
/// assert_eq!(discount_amount(DiscountKind::Percentage, 1500, price).cents(), 1_500);
/// assert_eq!(discount_amount(DiscountKind::Fixed, 25_000, price), price);
/// ```
pub fn discount_amount(kind: DiscountKind, value: i64, base: Money) -> Money {
    let raw = match kind {
        DiscountKind::Percentage => base.percentage(value),
        DiscountKind::Fixed => Money::from_cents(value),
    };
    raw.clamp_to(base)
}

// =============================================================================
// Discount Selection
// =============================================================================

/// Tie-break between two discounts competing at the same scope.
///
/// The higher `value` wins. Percentage and fixed values share one scale
/// (hundredths), so this compares the raw numbers across kinds exactly as
/// stored. Equal values fall back to the lower id so the choice is stable.
pub fn outranks(candidate: &Discount, incumbent: &Discount) -> bool {
    candidate.value > incumbent.value
        || (candidate.value == incumbent.value && candidate.id < incumbent.id)
}

/// The item-scoped discounts usable at one instant, indexed for lookup.
///
/// Built once per checkout from a single bulk fetch; resolving a line is
/// then two map lookups.
#[derive(Debug, Clone, Default)]
pub struct DiscountBook {
    by_product: HashMap<i64, Discount>,
    by_category: HashMap<i64, Discount>,
}

impl DiscountBook {
    /// Indexes `discounts`, keeping only those active at `now` and the best
    /// candidate per product and per category. Global discounts are ignored.
    pub fn new(discounts: impl IntoIterator<Item = Discount>, now: DateTime<Utc>) -> Self {
        let mut book = DiscountBook::default();

        for discount in discounts {
            if !discount.is_active_at(now) {
                continue;
            }
            let slot = match discount.scope() {
                DiscountScope::Product(id) => book.by_product.entry(id),
                DiscountScope::Category(id) => book.by_category.entry(id),
                DiscountScope::Global => continue,
            };
            match slot {
                std::collections::hash_map::Entry::Occupied(mut held) => {
                    if outranks(&discount, held.get()) {
                        held.insert(discount);
                    }
                }
                std::collections::hash_map::Entry::Vacant(empty) => {
                    empty.insert(discount);
                }
            }
        }

        book
    }

    /// Product-scoped discount first, then category-scoped.
    pub fn resolve(&self, product_id: i64, category_id: Option<i64>) -> Option<&Discount> {
        self.by_product
            .get(&product_id)
            .or_else(|| category_id.and_then(|id| self.by_category.get(&id)))
    }
}

// =============================================================================
// Line Pricing
// =============================================================================

/// The item discount recorded on a line, for the audit trail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppliedDiscount {
    pub discount_id: i64,
    pub kind: DiscountKind,
    pub value: i64,
    pub unit_amount: Money,
    /// unit amount × quantity.
    pub line_amount: Money,
}

/// A fully priced cart line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinePricing {
    pub product_id: i64,
    pub quantity: i64,
    /// Gross unit price snapshot.
    pub unit_price: Money,
    pub unit_discount: Money,
    pub discount: Option<AppliedDiscount>,
    /// (unit price − unit discount) × quantity.
    pub subtotal: Money,
    /// Unit cost snapshot (sell price when the cost is unknown).
    pub unit_cost: Money,
}

impl LinePricing {
    /// unit price × quantity.
    #[inline]
    pub fn gross(&self) -> Money {
        self.unit_price.multiply_quantity(self.quantity)
    }

    /// unit discount × quantity.
    #[inline]
    pub fn discount_total(&self) -> Money {
        self.unit_discount.multiply_quantity(self.quantity)
    }

    #[inline]
    pub fn cost_total(&self) -> Money {
        self.unit_cost.multiply_quantity(self.quantity)
    }
}

/// Prices one line against an already-resolved item discount.
pub fn price_line(product: &Product, quantity: i64, discount: Option<&Discount>) -> LinePricing {
    let unit_price = product.price();

    let applied = discount.map(|d| {
        let unit_amount = discount_amount(d.kind, d.value, unit_price);
        AppliedDiscount {
            discount_id: d.id,
            kind: d.kind,
            value: d.value,
            unit_amount,
            line_amount: unit_amount.multiply_quantity(quantity),
        }
    });
    let unit_discount = applied.map(|a| a.unit_amount).unwrap_or_default();

    LinePricing {
        product_id: product.id,
        quantity,
        unit_price,
        unit_discount,
        discount: applied,
        subtotal: (unit_price - unit_discount).multiply_quantity(quantity),
        unit_cost: product.cost_snapshot(),
    }
}

/// Resolves the item discount from `book` and prices the line.
pub fn price_with_book(product: &Product, quantity: i64, book: &DiscountBook) -> LinePricing {
    price_line(product, quantity, book.resolve(product.id, product.category_id))
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-03-01T10:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn product(id: i64, price: i64, category_id: Option<i64>) -> Product {
        Product {
            id,
            name: format!("P{id}"),
            price_cents: price,
            cost_price_cents: None,
            stock: 10,
            category_id,
            created_by: None,
            created_at: now(),
        }
    }

    fn discount(
        id: i64,
        kind: DiscountKind,
        value: i64,
        product_id: Option<i64>,
        category_id: Option<i64>,
    ) -> Discount {
        Discount {
            id,
            name: format!("D{id}"),
            kind,
            value,
            min_order_cents: 0,
            product_id,
            category_id,
            start_date: now() - Duration::days(7),
            end_date: now() + Duration::days(7),
            is_active: true,
            created_at: now(),
        }
    }

    #[test]
    fn test_percentage_and_fixed_amounts() {
        let price = Money::from_cents(350_000);
        assert_eq!(
            discount_amount(DiscountKind::Percentage, 1000, price).cents(),
            35_000
        );
        assert_eq!(
            discount_amount(DiscountKind::Fixed, 50_000, price).cents(),
            50_000
        );
    }

    #[test]
    fn test_discount_never_exceeds_base() {
        let price = Money::from_cents(1_000);
        for (kind, value) in [
            (DiscountKind::Percentage, 15_000),
            (DiscountKind::Percentage, 10_000),
            (DiscountKind::Fixed, 1_001),
            (DiscountKind::Fixed, i64::MAX / 2),
        ] {
            let amount = discount_amount(kind, value, price);
            assert!(amount <= price, "{kind:?} {value} gave {amount}");
            assert!(!amount.is_negative());
        }
        assert_eq!(discount_amount(DiscountKind::Fixed, 500, Money::zero()), Money::zero());
    }

    #[test]
    fn test_product_scope_beats_category_scope() {
        let book = DiscountBook::new(
            vec![
                discount(1, DiscountKind::Percentage, 5000, None, Some(3)),
                discount(2, DiscountKind::Percentage, 1000, Some(12), None),
            ],
            now(),
        );
        assert_eq!(book.resolve(12, Some(3)).map(|d| d.id), Some(2));
        // Another product in the same category gets the category discount
        assert_eq!(book.resolve(13, Some(3)).map(|d| d.id), Some(1));
        assert!(book.resolve(14, None).is_none());
    }

    #[test]
    fn test_highest_value_wins_within_scope() {
        let book = DiscountBook::new(
            vec![
                discount(1, DiscountKind::Fixed, 20_000, Some(5), None),
                discount(2, DiscountKind::Percentage, 30_000, Some(5), None),
                discount(3, DiscountKind::Fixed, 25_000, Some(5), None),
            ],
            now(),
        );
        assert_eq!(book.resolve(5, None).map(|d| d.id), Some(2));
    }

    #[test]
    fn test_equal_values_prefer_lower_id() {
        let book = DiscountBook::new(
            vec![
                discount(9, DiscountKind::Fixed, 1_000, None, Some(1)),
                discount(4, DiscountKind::Fixed, 1_000, None, Some(1)),
            ],
            now(),
        );
        assert_eq!(book.resolve(77, Some(1)).map(|d| d.id), Some(4));
    }

    #[test]
    fn test_inactive_and_out_of_window_are_skipped() {
        let mut expired = discount(1, DiscountKind::Fixed, 9_000, Some(5), None);
        expired.end_date = now() - Duration::seconds(1);
        let mut switched_off = discount(2, DiscountKind::Fixed, 8_000, Some(5), None);
        switched_off.is_active = false;
        let fallback = discount(3, DiscountKind::Fixed, 100, None, Some(1));
        let global = discount(4, DiscountKind::Fixed, 99_999, None, None);

        let book = DiscountBook::new(vec![expired, switched_off, fallback, global], now());
        assert_eq!(book.resolve(5, Some(1)).map(|d| d.id), Some(3));
        assert!(book.resolve(5, None).is_none());
    }

    #[test]
    fn test_price_line_without_discount() {
        let mut p = product(1, 1_000_000, None);
        p.cost_price_cents = Some(600_000);
        let line = price_with_book(&p, 2, &DiscountBook::default());

        assert_eq!(line.subtotal.cents(), 2_000_000);
        assert_eq!(line.gross(), line.subtotal);
        assert_eq!(line.discount_total(), Money::zero());
        assert_eq!(line.cost_total().cents(), 1_200_000);
        assert!(line.discount.is_none());
    }

    #[test]
    fn test_price_line_with_percentage_discount() {
        let p = product(1, 350_000, Some(2));
        let d = discount(8, DiscountKind::Percentage, 1000, None, Some(2));
        let line = price_line(&p, 3, Some(&d));

        assert_eq!(line.unit_discount.cents(), 35_000);
        assert_eq!(line.subtotal.cents(), 315_000 * 3);
        assert_eq!(line.gross() - line.discount_total(), line.subtotal);

        let applied = line.discount.unwrap();
        assert_eq!(applied.discount_id, 8);
        assert_eq!(applied.line_amount.cents(), 105_000);
        // No cost price: snapshot falls back to the sell price
        assert_eq!(line.unit_cost, line.unit_price);
    }

    #[test]
    fn test_fixed_discount_larger_than_price_makes_line_free() {
        let p = product(1, 300_000, None);
        let d = discount(8, DiscountKind::Fixed, 500_000, Some(1), None);
        let line = price_line(&p, 4, Some(&d));

        assert_eq!(line.unit_discount, line.unit_price);
        assert_eq!(line.subtotal, Money::zero());
    }
}
