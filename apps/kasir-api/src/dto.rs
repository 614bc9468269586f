//! # Wire Types
//!
//! JSON request and response bodies. Amounts travel as plain numbers in
//! major units (`3500`, `18000.5`) and are converted to and from
//! [`Money`] here, so nothing below this module sees a decimal.
//!
//! Discount `value` is stored in hundredths for both kinds, which makes
//! the wire value `stored / 100` in either case: percent for
//! `PERCENTAGE`, major units for `FIXED`.

use chrono::{DateTime, NaiveDate, Utc};
use kasir_core::validation::ValidationResult;
use kasir_core::{
    CheckoutItem, CheckoutRequest, Discount, DiscountKind, Money, Product, Purchase,
    PurchaseItem, PurchaseItemRequest, PurchaseRequest, PurchaseWithItems, Transaction,
    TransactionDetail, TransactionWithDetails,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

fn amount(cents: i64) -> Decimal {
    Money::from_cents(cents).to_decimal()
}

fn hundredths(value: i64) -> Decimal {
    Decimal::new(value, 2).normalize()
}

// =============================================================================
// Requests
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct CheckoutBody {
    #[serde(default)]
    pub items: Vec<CheckoutItem>,
    pub discount_id: Option<i64>,
    pub payment_amount: Option<Decimal>,
}

impl CheckoutBody {
    pub fn into_request(self) -> ValidationResult<CheckoutRequest> {
        let payment = self
            .payment_amount
            .map(|value| Money::from_decimal("payment_amount", value))
            .transpose()?;

        Ok(CheckoutRequest {
            items: self.items,
            discount_id: self.discount_id,
            payment,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct PurchaseItemBody {
    pub product_id: Option<i64>,
    pub product_name: Option<String>,
    pub quantity: i64,
    pub buy_price: Decimal,
    pub sell_price: Option<Decimal>,
    pub category_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct PurchaseBody {
    pub supplier_name: Option<String>,
    pub notes: Option<String>,
    #[serde(default)]
    pub items: Vec<PurchaseItemBody>,
}

impl PurchaseBody {
    pub fn into_request(self) -> ValidationResult<PurchaseRequest> {
        let items = self
            .items
            .into_iter()
            .enumerate()
            .map(|(i, item)| {
                let buy_price = Money::from_decimal(&format!("items[{i}].buy_price"), item.buy_price)?;
                let sell_price = item
                    .sell_price
                    .map(|value| Money::from_decimal(&format!("items[{i}].sell_price"), value))
                    .transpose()?;

                Ok(PurchaseItemRequest {
                    product_id: item.product_id,
                    product_name: item.product_name,
                    quantity: item.quantity,
                    buy_price,
                    sell_price,
                    category_id: item.category_id,
                })
            })
            .collect::<ValidationResult<Vec<_>>>()?;

        Ok(PurchaseRequest {
            supplier_name: self.supplier_name,
            notes: self.notes,
            items,
        })
    }
}

/// `?start_date=2026-03-01&end_date=2026-03-31&timezone=Asia/Jakarta`
#[derive(Debug, Default, Deserialize)]
pub struct TransactionListParams {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub timezone: Option<String>,
}

// =============================================================================
// Responses
// =============================================================================

#[derive(Debug, Serialize)]
pub struct ProductResponse {
    pub id: i64,
    pub name: String,
    pub price: Decimal,
    pub cost_price: Option<Decimal>,
    pub stock: i64,
    pub category_id: Option<i64>,
    /// Percent of the sell price, when the cost is known.
    pub margin: Option<f64>,
    pub created_by: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<Product> for ProductResponse {
    fn from(p: Product) -> Self {
        ProductResponse {
            margin: p.margin(),
            id: p.id,
            price: amount(p.price_cents),
            cost_price: p.cost_price_cents.map(amount),
            stock: p.stock,
            category_id: p.category_id,
            created_by: p.created_by,
            created_at: p.created_at,
            name: p.name,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DiscountResponse {
    pub id: i64,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: DiscountKind,
    pub value: Decimal,
    pub min_order_amount: Decimal,
    pub product_id: Option<i64>,
    pub category_id: Option<i64>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub is_active: bool,
}

impl From<Discount> for DiscountResponse {
    fn from(d: Discount) -> Self {
        DiscountResponse {
            id: d.id,
            name: d.name,
            kind: d.kind,
            value: hundredths(d.value),
            min_order_amount: amount(d.min_order_cents),
            product_id: d.product_id,
            category_id: d.category_id,
            start_date: d.start_date,
            end_date: d.end_date,
            is_active: d.is_active,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TransactionResponse {
    pub id: i64,
    pub total_amount: Decimal,
    pub discount_id: Option<i64>,
    pub discount_amount: Decimal,
    pub payment_amount: Decimal,
    pub change_amount: Decimal,
    pub cashier_id: Option<String>,
    pub total_items: i64,
    pub profit: Decimal,
    pub created_at: DateTime<Utc>,
}

impl From<Transaction> for TransactionResponse {
    fn from(t: Transaction) -> Self {
        TransactionResponse {
            id: t.id,
            total_amount: amount(t.total_amount_cents),
            discount_id: t.discount_id,
            discount_amount: amount(t.discount_amount_cents),
            payment_amount: amount(t.payment_amount_cents),
            change_amount: amount(t.change_amount_cents),
            cashier_id: t.cashier_id,
            total_items: t.total_items,
            profit: amount(t.profit_cents),
            created_at: t.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LineDiscountResponse {
    #[serde(rename = "type")]
    pub kind: DiscountKind,
    pub value: Decimal,
    pub amount: Decimal,
}

#[derive(Debug, Serialize)]
pub struct TransactionDetailResponse {
    pub id: i64,
    pub product_id: Option<i64>,
    pub product_name: String,
    pub quantity: i64,
    pub unit_price: Decimal,
    pub subtotal: Decimal,
    pub cost_price: Decimal,
    pub discount: Option<LineDiscountResponse>,
}

impl From<TransactionDetail> for TransactionDetailResponse {
    fn from(d: TransactionDetail) -> Self {
        let discount = match (d.discount_kind, d.discount_value) {
            (Some(kind), Some(value)) => Some(LineDiscountResponse {
                kind,
                value: hundredths(value),
                amount: amount(d.discount_amount_cents.unwrap_or(0)),
            }),
            _ => None,
        };

        TransactionDetailResponse {
            id: d.id,
            product_id: d.product_id,
            product_name: d.product_name,
            quantity: d.quantity,
            unit_price: amount(d.unit_price_cents),
            subtotal: amount(d.subtotal_cents),
            cost_price: amount(d.cost_price_cents),
            discount,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TransactionWithDetailsResponse {
    #[serde(flatten)]
    pub transaction: TransactionResponse,
    pub details: Vec<TransactionDetailResponse>,
}

impl From<TransactionWithDetails> for TransactionWithDetailsResponse {
    fn from(t: TransactionWithDetails) -> Self {
        TransactionWithDetailsResponse {
            transaction: t.transaction.into(),
            details: t.details.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PurchaseResponse {
    pub id: i64,
    pub supplier_name: Option<String>,
    pub total_amount: Decimal,
    pub notes: Option<String>,
    pub created_by: Option<String>,
    pub total_items: i64,
    pub created_at: DateTime<Utc>,
}

impl From<Purchase> for PurchaseResponse {
    fn from(p: Purchase) -> Self {
        PurchaseResponse {
            id: p.id,
            supplier_name: p.supplier_name,
            total_amount: amount(p.total_amount_cents),
            notes: p.notes,
            created_by: p.created_by,
            total_items: p.total_items,
            created_at: p.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PurchaseItemResponse {
    pub id: i64,
    pub product_id: Option<i64>,
    pub product_name: String,
    pub quantity: i64,
    pub buy_price: Decimal,
    pub sell_price: Option<Decimal>,
    pub category_id: Option<i64>,
    pub subtotal: Decimal,
}

impl From<PurchaseItem> for PurchaseItemResponse {
    fn from(i: PurchaseItem) -> Self {
        PurchaseItemResponse {
            id: i.id,
            product_id: i.product_id,
            product_name: i.product_name,
            quantity: i.quantity,
            buy_price: amount(i.buy_price_cents),
            sell_price: i.sell_price_cents.map(amount),
            category_id: i.category_id,
            subtotal: amount(i.subtotal_cents),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PurchaseWithItemsResponse {
    #[serde(flatten)]
    pub purchase: PurchaseResponse,
    pub items: Vec<PurchaseItemResponse>,
}

impl From<PurchaseWithItems> for PurchaseWithItemsResponse {
    fn from(p: PurchaseWithItems) -> Self {
        PurchaseWithItemsResponse {
            purchase: p.purchase.into(),
            items: p.items.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
    pub database: &'static str,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checkout_body_converts_payment() {
        let body: CheckoutBody = serde_json::from_str(
            r#"{"items":[{"product_id":1,"quantity":2}],"payment_amount":18000.5}"#,
        )
        .unwrap();

        let request = body.into_request().unwrap();
        assert_eq!(request.items.len(), 1);
        assert_eq!(request.payment, Some(Money::from_cents(1_800_050)));
        assert_eq!(request.discount_id, None);
    }

    #[test]
    fn test_checkout_body_rejects_sub_cent_payment() {
        let body: CheckoutBody =
            serde_json::from_str(r#"{"items":[],"payment_amount":10.005}"#).unwrap();

        let err = body.into_request().unwrap_err();
        assert!(err.to_string().starts_with("payment_amount"));
    }

    #[test]
    fn test_purchase_body_names_failing_item() {
        let body: PurchaseBody = serde_json::from_str(
            r#"{"items":[{"product_id":1,"quantity":1,"buy_price":100},
                         {"product_id":2,"quantity":1,"buy_price":0.001}]}"#,
        )
        .unwrap();

        let err = body.into_request().unwrap_err();
        assert!(err.to_string().starts_with("items[1].buy_price"));
    }

    #[test]
    fn test_discount_value_is_human_scale() {
        assert_eq!(hundredths(1_000), Decimal::from(10));
        assert_eq!(hundredths(500_000), Decimal::from(5_000));
        assert_eq!(hundredths(1_250), Decimal::new(125, 1));
    }
}
