//! # Settlement Computation
//!
//! Turns a validated cart plus one snapshot of products and discounts into
//! the exact figures a transaction is written with.
//!
//! ## Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  1. merge + check_availability    (Inventory Guard, all lines first)    │
//! │  2. price every line              (Discount Resolver)                   │
//! │        order_total   = Σ subtotal                                       │
//! │        item_discount = Σ unit discount × qty                            │
//! │  3. global discount (optional)                                          │
//! │        must exist, be unscoped, active, in window                       │
//! │        order_total ≥ min_order                                          │
//! │        amount = clamp(pct | fixed, 0, order_total)                      │
//! │  4. total_amount    = order_total − global  (floor 0)                   │
//! │     discount_amount = item_discount + global                            │
//! │  5. change = max(0, payment − total_amount), 0 without payment          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Underpayment is accepted: change is simply zero.
//!
//! kasir-db runs this inside the storage transaction, between the bulk
//! reads and the writes.

use chrono::{DateTime, Utc};
use std::collections::HashMap;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::inventory::{check_availability, merge_quantities};
use crate::money::Money;
use crate::pricing::{discount_amount, price_with_book, DiscountBook, LinePricing};
use crate::types::{CheckoutRequest, Discount, Product};

/// The order-level discount as applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppliedGlobalDiscount {
    pub discount_id: i64,
    pub amount: Money,
}

/// Every figure of a checkout, before persistence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settlement {
    /// One entry per request line, in request order.
    pub lines: Vec<LinePricing>,
    /// Stock to take per product (lines for the same product merged).
    pub stock_demand: Vec<(i64, i64)>,
    /// Σ line subtotals, after item discounts.
    pub order_total: Money,
    pub item_discount_total: Money,
    pub global_discount: Option<AppliedGlobalDiscount>,
    pub total_amount: Money,
    pub discount_amount: Money,
    pub payment_amount: Money,
    pub change_amount: Money,
}

impl Settlement {
    /// Computes the settlement.
    ///
    /// ## Arguments
    /// * `request` - cart already passed through `validate_checkout`
    /// * `products` - bulk snapshot of every referenced product
    /// * `book` - item discounts active at `now`
    /// * `global` - the row found for `request.discount_id`, if any
    pub fn compute(
        request: &CheckoutRequest,
        products: &HashMap<i64, Product>,
        book: &DiscountBook,
        global: Option<&Discount>,
        now: DateTime<Utc>,
    ) -> CoreResult<Settlement> {
        if request.items.is_empty() {
            return Err(CoreError::EmptyCart);
        }

        let stock_demand = merge_quantities(&request.items);
        check_availability(&stock_demand, products)?;
        check_amount_bounds(request, products)?;

        let mut lines = Vec::with_capacity(request.items.len());
        let mut order_total = Money::zero();
        let mut item_discount_total = Money::zero();

        for item in &request.items {
            let product = products
                .get(&item.product_id)
                .ok_or(CoreError::ProductNotFound(item.product_id))?;
            let line = price_with_book(product, item.quantity, book);
            order_total += line.subtotal;
            item_discount_total += line.discount_total();
            lines.push(line);
        }

        let global_discount = match request.discount_id {
            Some(id) => Some(apply_global_discount(id, global, order_total, now)?),
            None => None,
        };
        let global_amount = global_discount.map(|g| g.amount).unwrap_or_default();

        let total_amount = order_total.saturating_sub_floor(global_amount);
        let payment_amount = request.payment.unwrap_or_default();
        let change_amount = match request.payment {
            Some(payment) => payment.saturating_sub_floor(total_amount),
            None => Money::zero(),
        };

        Ok(Settlement {
            lines,
            stock_demand,
            order_total,
            item_discount_total,
            global_discount,
            total_amount,
            discount_amount: item_discount_total + global_amount,
            payment_amount,
            change_amount,
        })
    }

    /// Σ quantity.
    pub fn total_items(&self) -> i64 {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    /// Σ unit price × quantity, before any discount.
    pub fn gross_total(&self) -> Money {
        self.lines.iter().map(LinePricing::gross).sum()
    }

    /// total_amount − Σ cost snapshot × quantity.
    pub fn profit(&self) -> Money {
        self.total_amount - self.lines.iter().map(LinePricing::cost_total).sum::<Money>()
    }

    pub fn global_discount_id(&self) -> Option<i64> {
        self.global_discount.map(|g| g.discount_id)
    }
}

/// Rejects carts whose gross or cost sum does not fit in i64.
///
/// Every other figure is bounded by these two: discounts never exceed the
/// price they apply to and percentages are computed in i128.
fn check_amount_bounds(
    request: &CheckoutRequest,
    products: &HashMap<i64, Product>,
) -> CoreResult<()> {
    let overflow = || ValidationError::AmountOverflow {
        field: "items".to_string(),
    };
    let mut gross = Money::zero();
    let mut cost = Money::zero();

    for item in &request.items {
        let product = products
            .get(&item.product_id)
            .ok_or(CoreError::ProductNotFound(item.product_id))?;
        let line_gross = product
            .price()
            .checked_multiply_quantity(item.quantity)
            .ok_or_else(overflow)?;
        let line_cost = product
            .cost_snapshot()
            .checked_multiply_quantity(item.quantity)
            .ok_or_else(overflow)?;
        gross = gross.checked_add(line_gross).ok_or_else(overflow)?;
        cost = cost.checked_add(line_cost).ok_or_else(overflow)?;
    }

    Ok(())
}

/// Checks a cashier-selected discount and computes its amount.
///
/// ## Rejections
/// - no row with that id → `DiscountNotFound`
/// - row scoped to a product or category → `DiscountNotGlobal`
/// - active flag off → `DiscountInactive`
/// - `now` outside `[start_date, end_date]` → `DiscountExpired`
/// - `order_total` below `min_order` → `MinimumOrderNotMet`
pub fn apply_global_discount(
    requested_id: i64,
    found: Option<&Discount>,
    order_total: Money,
    now: DateTime<Utc>,
) -> CoreResult<AppliedGlobalDiscount> {
    let discount = found
        .filter(|d| d.id == requested_id)
        .ok_or(CoreError::DiscountNotFound(requested_id))?;

    if !discount.is_global() {
        return Err(CoreError::DiscountNotGlobal(discount.id));
    }
    if !discount.is_active {
        return Err(CoreError::DiscountInactive(discount.id));
    }
    if !discount.is_within_window(now) {
        return Err(CoreError::DiscountExpired(discount.id));
    }
    if order_total < discount.min_order() {
        return Err(CoreError::MinimumOrderNotMet {
            discount_id: discount.id,
            minimum: discount.min_order(),
            order_total,
        });
    }

    Ok(AppliedGlobalDiscount {
        discount_id: discount.id,
        amount: discount_amount(discount.kind, discount.value, order_total),
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CheckoutItem, DiscountKind};
    use chrono::Duration;

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-03-01T10:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn catalog(rows: &[(i64, i64, Option<i64>, i64, Option<i64>)]) -> HashMap<i64, Product> {
        rows.iter()
            .map(|&(id, price, cost, stock, category_id)| {
                (
                    id,
                    Product {
                        id,
                        name: format!("P{id}"),
                        price_cents: price,
                        cost_price_cents: cost,
                        stock,
                        category_id,
                        created_by: None,
                        created_at: now(),
                    },
                )
            })
            .collect()
    }

    fn discount(
        id: i64,
        kind: DiscountKind,
        value: i64,
        min_order: i64,
        product_id: Option<i64>,
        category_id: Option<i64>,
    ) -> Discount {
        Discount {
            id,
            name: format!("D{id}"),
            kind,
            value,
            min_order_cents: min_order,
            product_id,
            category_id,
            start_date: now() - Duration::days(1),
            end_date: now() + Duration::days(1),
            is_active: true,
            created_at: now(),
        }
    }

    fn cart(items: &[(i64, i64)], discount_id: Option<i64>, payment: Option<i64>) -> CheckoutRequest {
        CheckoutRequest {
            items: items
                .iter()
                .map(|&(product_id, quantity)| CheckoutItem {
                    product_id,
                    quantity,
                })
                .collect(),
            discount_id,
            payment: payment.map(Money::from_cents),
        }
    }

    #[test]
    fn test_single_line_no_discount() {
        let products = catalog(&[(1, 3_500, None, 10, None)]);
        let s = Settlement::compute(
            &cart(&[(1, 2)], None, None),
            &products,
            &DiscountBook::default(),
            None,
            now(),
        )
        .unwrap();

        assert_eq!(s.total_amount.cents(), 7_000);
        assert_eq!(s.discount_amount, Money::zero());
        assert_eq!(s.change_amount, Money::zero());
        assert_eq!(s.stock_demand, vec![(1, 2)]);
        assert_eq!(s.total_items(), 2);
    }

    #[test]
    fn test_price_times_quantity_past_i64_is_rejected() {
        let products = catalog(&[(1, 10_000_000_000_000_000, None, 5_000, None)]);
        let request = cart(&[(1, 1_000)], None, None);
        crate::validation::validate_checkout(&request).unwrap();

        let err = Settlement::compute(&request, &products, &DiscountBook::default(), None, now())
            .unwrap_err();
        assert!(matches!(
            err,
            CoreError::Validation(ValidationError::AmountOverflow { .. })
        ));
    }

    #[test]
    fn test_cart_sum_past_i64_is_rejected() {
        // Each line fits on its own, the order total does not.
        let half = i64::MAX / 2 + 1;
        let products = catalog(&[(1, half, None, 10, None), (2, half, None, 10, None)]);
        let err = Settlement::compute(
            &cart(&[(1, 1), (2, 1)], None, None),
            &products,
            &DiscountBook::default(),
            None,
            now(),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            CoreError::Validation(ValidationError::AmountOverflow { .. })
        ));

        // Largest total that still fits settles normally.
        let products = catalog(&[(1, i64::MAX, Some(0), 10, None)]);
        let s = Settlement::compute(
            &cart(&[(1, 1)], None, None),
            &products,
            &DiscountBook::default(),
            None,
            now(),
        )
        .unwrap();
        assert_eq!(s.total_amount.cents(), i64::MAX);
    }

    #[test]
    fn test_profit_from_cost_snapshot() {
        let products = catalog(&[(1, 10_000, Some(6_000), 10, None)]);
        let s = Settlement::compute(
            &cart(&[(1, 2)], None, None),
            &products,
            &DiscountBook::default(),
            None,
            now(),
        )
        .unwrap();

        assert_eq!(s.total_amount.cents(), 20_000);
        assert_eq!(s.profit().cents(), 8_000);
    }

    #[test]
    fn test_change_and_underpayment() {
        let products = catalog(&[(1, 16_000, None, 10, None)]);
        let book = DiscountBook::default();

        let paid = Settlement::compute(&cart(&[(1, 2)], None, Some(50_000)), &products, &book, None, now())
            .unwrap();
        assert_eq!(paid.total_amount.cents(), 32_000);
        assert_eq!(paid.change_amount.cents(), 18_000);
        assert_eq!(paid.payment_amount.cents(), 50_000);

        let short = Settlement::compute(&cart(&[(1, 2)], None, Some(20_000)), &products, &book, None, now())
            .unwrap();
        assert_eq!(short.change_amount, Money::zero());
        assert_eq!(short.payment_amount.cents(), 20_000);
    }

    #[test]
    fn test_item_and_global_discounts_reconcile() {
        // P1 has 10% off via its category, P2 has Rp 5 fixed off
        let products = catalog(&[
            (1, 10_000, Some(7_000), 10, Some(3)),
            (2, 2_000, None, 10, None),
        ]);
        let book = DiscountBook::new(
            vec![
                discount(10, DiscountKind::Percentage, 1_000, 0, None, Some(3)),
                discount(11, DiscountKind::Fixed, 500, 0, Some(2), None),
            ],
            now(),
        );
        let global = discount(20, DiscountKind::Percentage, 500, 15_000, None, None);

        let s = Settlement::compute(
            &cart(&[(1, 2), (2, 3)], Some(20), Some(30_000)),
            &products,
            &book,
            Some(&global),
            now(),
        )
        .unwrap();

        // Lines: 9000×2 = 18000, 1500×3 = 4500
        assert_eq!(s.order_total.cents(), 22_500);
        assert_eq!(s.item_discount_total.cents(), 2_000 + 1_500);
        // 5% of 22500 = 1125
        assert_eq!(s.global_discount.unwrap().amount.cents(), 1_125);
        assert_eq!(s.total_amount.cents(), 21_375);
        assert_eq!(s.discount_amount.cents(), 3_500 + 1_125);
        assert_eq!(s.total_amount + s.discount_amount, s.gross_total());
        assert_eq!(s.change_amount.cents(), 8_625);
        assert_eq!(s.global_discount_id(), Some(20));
    }

    #[test]
    fn test_global_discount_clamped_to_order_total() {
        let products = catalog(&[(1, 1_000, None, 10, None)]);
        let global = discount(5, DiscountKind::Fixed, 5_000, 0, None, None);
        let s = Settlement::compute(
            &cart(&[(1, 1)], Some(5), None),
            &products,
            &DiscountBook::default(),
            Some(&global),
            now(),
        )
        .unwrap();

        assert_eq!(s.global_discount.unwrap().amount.cents(), 1_000);
        assert_eq!(s.total_amount, Money::zero());
        assert!(s.discount_amount <= s.gross_total());
    }

    #[test]
    fn test_scoped_discount_cannot_be_selected() {
        let scoped = discount(5, DiscountKind::Fixed, 100, 0, Some(1), None);
        let err = apply_global_discount(5, Some(&scoped), Money::from_cents(10_000), now()).unwrap_err();
        assert!(matches!(err, CoreError::DiscountNotGlobal(5)));

        let by_category = discount(6, DiscountKind::Fixed, 100, 0, None, Some(2));
        let err =
            apply_global_discount(6, Some(&by_category), Money::from_cents(10_000), now()).unwrap_err();
        assert!(matches!(err, CoreError::DiscountNotGlobal(6)));
    }

    #[test]
    fn test_global_discount_rejections() {
        let total = Money::from_cents(10_000);

        assert!(matches!(
            apply_global_discount(1, None, total, now()),
            Err(CoreError::DiscountNotFound(1))
        ));

        let mut off = discount(2, DiscountKind::Fixed, 100, 0, None, None);
        off.is_active = false;
        assert!(matches!(
            apply_global_discount(2, Some(&off), total, now()),
            Err(CoreError::DiscountInactive(2))
        ));

        let mut expired = discount(3, DiscountKind::Fixed, 100, 0, None, None);
        expired.end_date = now() - Duration::minutes(1);
        assert!(matches!(
            apply_global_discount(3, Some(&expired), total, now()),
            Err(CoreError::DiscountExpired(3))
        ));

        let minimum = discount(4, DiscountKind::Fixed, 100, 10_001, None, None);
        assert!(matches!(
            apply_global_discount(4, Some(&minimum), total, now()),
            Err(CoreError::MinimumOrderNotMet { discount_id: 4, .. })
        ));
    }

    #[test]
    fn test_minimum_order_uses_total_after_item_discounts() {
        // Gross 10000, item discount brings it to 9000; minimum is 9500
        let products = catalog(&[(1, 10_000, None, 10, None)]);
        let book = DiscountBook::new(
            vec![discount(1, DiscountKind::Fixed, 1_000, 0, Some(1), None)],
            now(),
        );
        let global = discount(2, DiscountKind::Fixed, 500, 9_500, None, None);

        let err = Settlement::compute(&cart(&[(1, 1)], Some(2), None), &products, &book, Some(&global), now())
            .unwrap_err();
        assert!(matches!(err, CoreError::MinimumOrderNotMet { .. }));
    }

    #[test]
    fn test_stock_failure_on_last_line_rejects_whole_cart() {
        let products = catalog(&[(1, 100, None, 10, None), (2, 100, None, 1, None)]);
        let err = Settlement::compute(
            &cart(&[(1, 1), (1, 1), (2, 2)], None, None),
            &products,
            &DiscountBook::default(),
            None,
            now(),
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::InsufficientStock { product_id: 2, .. }));
    }
}
