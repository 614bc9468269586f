//! # Transaction Repository
//!
//! The checkout boundary and the read side of sales history.
//!
//! ## Checkout
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  validate_checkout(request)                  no storage access yet      │
//! │       │                                                                 │
//! │  BEGIN IMMEDIATE ───────────────────────────────────────────────────┐   │
//! │  │  1. products   ← one SELECT ... WHERE id IN (cart ids)           │   │
//! │  │  2. discounts  ← one SELECT for cart products + their categories │   │
//! │  │     global     ← SELECT by id (only if the cashier picked one)   │   │
//! │  │  3. Settlement::compute   (stock check, pricing, totals, change) │   │
//! │  │  4. conditional bulk stock decrement, verified by row count      │   │
//! │  │  5. INSERT header, INSERT all lines                              │   │
//! │  │  6. read back header + lines                                     │   │
//! │  COMMIT ────────────────────────────────────────────────────────────┘   │
//! │                                                                         │
//! │  Any Err between BEGIN and COMMIT rolls everything back.               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Query Layer
//! Headers are returned newest first with `total_items` and `profit_cents`
//! aggregated from the stored line snapshots, never from the live catalog.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use tracing::{debug, error, info, warn};

use crate::error::{DbError, DbResult};
use crate::repository::{discount, product, BEGIN_WRITE};
use kasir_core::inventory::check_availability;
use kasir_core::pricing::DiscountBook;
use kasir_core::validation::validate_checkout;
use kasir_core::{
    CheckoutRequest, CoreError, Settlement, Transaction, TransactionDetail,
    TransactionWithDetails, ValidationError, DELETED_PRODUCT_LABEL,
};

const HEADER_SELECT: &str = r#"
    SELECT
        t.id,
        t.total_amount_cents,
        t.discount_id,
        t.discount_amount_cents,
        t.payment_amount_cents,
        t.change_amount_cents,
        t.cashier_id,
        t.created_at,
        COALESCE(SUM(td.quantity), 0) AS total_items,
        t.total_amount_cents - COALESCE(SUM(td.cost_price_cents * td.quantity), 0) AS profit_cents
    FROM transactions t
    LEFT JOIN transaction_details td ON td.transaction_id = t.id
"#;

// =============================================================================
// Date Range
// =============================================================================

/// Half-open instant range `[start, end)` for history filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DateRange {
    /// Whole local days `start_date..=end_date` in `tz`.
    ///
    /// Runs from local midnight of `start_date` up to (excluding) local
    /// midnight after `end_date`. The timezone only moves the boundaries;
    /// stored instants are UTC.
    ///
    /// ## Example
    /// ```rust
    /// use chrono::{NaiveDate, FixedOffset, TimeZone, Utc};
    /// use kasir_db::DateRange;
    ///
    /// let wib = FixedOffset::east_opt(7 * 3600).unwrap();
    /// let day = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
    /// let range = DateRange::local_days(day, day, &wib).unwrap();
    ///
    /// assert_eq!(range.start, Utc.with_ymd_and_hms(2026, 2, 28, 17, 0, 0).unwrap());
    /// assert_eq!(range.end, Utc.with_ymd_and_hms(2026, 3, 1, 17, 0, 0).unwrap());
    /// ```
    pub fn local_days<Tz: TimeZone>(
        start_date: NaiveDate,
        end_date: NaiveDate,
        tz: &Tz,
    ) -> Result<Self, ValidationError> {
        if end_date < start_date {
            return Err(ValidationError::InvalidFormat {
                field: "end_date".to_string(),
                reason: "must not be before start_date".to_string(),
            });
        }

        let next_day = end_date
            .succ_opt()
            .ok_or_else(|| ValidationError::InvalidFormat {
                field: "end_date".to_string(),
                reason: "out of range".to_string(),
            })?;

        Ok(DateRange {
            start: local_midnight(start_date, tz, "start_date")?,
            end: local_midnight(next_day, tz, "end_date")?,
        })
    }
}

/// First instant of `date` in `tz`. A DST gap at midnight moves it to the
/// first hour that exists.
fn local_midnight<Tz: TimeZone>(
    date: NaiveDate,
    tz: &Tz,
    field: &str,
) -> Result<DateTime<Utc>, ValidationError> {
    let midnight = date.and_time(NaiveTime::MIN);
    tz.from_local_datetime(&midnight)
        .earliest()
        .or_else(|| tz.from_local_datetime(&(midnight + Duration::hours(1))).earliest())
        .map(|local| local.with_timezone(&Utc))
        .ok_or_else(|| ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: "no local midnight in this timezone".to_string(),
        })
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for checkout and transaction history.
#[derive(Debug, Clone)]
pub struct TransactionRepository {
    pool: SqlitePool,
}

impl TransactionRepository {
    pub fn new(pool: SqlitePool) -> Self {
        TransactionRepository { pool }
    }

    /// Settles a cart into a committed transaction.
    ///
    /// `cashier_id` is the acting user, stored as-is on the header.
    ///
    /// ## Errors
    /// * `DbError::Domain` - empty cart, bad quantity, unknown product,
    ///   insufficient stock, unusable discount, minimum order not met
    /// * any other variant - storage failure; nothing was persisted
    pub async fn checkout(
        &self,
        request: &CheckoutRequest,
        cashier_id: Option<&str>,
    ) -> DbResult<TransactionWithDetails> {
        self.checkout_at(request, cashier_id, Utc::now()).await
    }

    /// [`checkout`](Self::checkout) with an explicit clock, used to decide
    /// discount windows and stamp `created_at`.
    pub async fn checkout_at(
        &self,
        request: &CheckoutRequest,
        cashier_id: Option<&str>,
        now: DateTime<Utc>,
    ) -> DbResult<TransactionWithDetails> {
        validate_checkout(request)?;

        let mut tx = self
            .pool
            .begin_with(BEGIN_WRITE)
            .await
            .map_err(|e| storage_failure("begin", e.into()))?;

        match settle(&mut tx, request, cashier_id, now).await {
            Ok(created) => {
                tx.commit().await.map_err(|e| {
                    error!(step = "commit", error = %e, "Checkout failed");
                    DbError::TransactionFailed(e.to_string())
                })?;

                info!(
                    id = created.transaction.id,
                    total_cents = created.transaction.total_amount_cents,
                    items = created.transaction.total_items,
                    cashier = ?cashier_id,
                    "Checkout committed"
                );
                Ok(created)
            }
            Err(err) => {
                if let Err(rollback) = tx.rollback().await {
                    error!(error = %rollback, "Rollback failed");
                }
                if let DbError::Domain(rule) = &err {
                    warn!(reason = %rule, "Checkout rejected");
                }
                Err(err)
            }
        }
    }

    /// Every transaction, newest first.
    pub async fn get_all(&self) -> DbResult<Vec<Transaction>> {
        let sql = format!("{HEADER_SELECT} GROUP BY t.id ORDER BY t.created_at DESC, t.id DESC");
        let transactions = sqlx::query_as::<_, Transaction>(&sql)
            .fetch_all(&self.pool)
            .await?;

        debug!(count = transactions.len(), "Listed transactions");
        Ok(transactions)
    }

    /// Transactions created within `range`, newest first.
    pub async fn get_by_date_range(&self, range: DateRange) -> DbResult<Vec<Transaction>> {
        let sql = format!(
            "{HEADER_SELECT} WHERE t.created_at >= ?1 AND t.created_at < ?2 \
             GROUP BY t.id ORDER BY t.created_at DESC, t.id DESC"
        );
        let transactions = sqlx::query_as::<_, Transaction>(&sql)
            .bind(range.start)
            .bind(range.end)
            .fetch_all(&self.pool)
            .await?;

        debug!(
            start = %range.start,
            end = %range.end,
            count = transactions.len(),
            "Listed transactions in range"
        );
        Ok(transactions)
    }

    /// Header plus lines.
    ///
    /// Fails with `CoreError::TransactionNotFound` for an unknown id.
    pub async fn get_by_id(&self, id: i64) -> DbResult<TransactionWithDetails> {
        let mut conn = self.pool.acquire().await?;
        fetch_with_details(&mut conn, id)
            .await?
            .ok_or_else(|| CoreError::TransactionNotFound(id).into())
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM transactions")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

// =============================================================================
// Settlement (inside the storage transaction)
// =============================================================================

async fn settle(
    conn: &mut SqliteConnection,
    request: &CheckoutRequest,
    cashier_id: Option<&str>,
    now: DateTime<Utc>,
) -> DbResult<TransactionWithDetails> {
    let mut product_ids: Vec<i64> = request.items.iter().map(|i| i.product_id).collect();
    product_ids.sort_unstable();
    product_ids.dedup();

    let products = product::fetch_many(conn, &product_ids)
        .await
        .map_err(|e| storage_failure("fetch products", e))?;

    let mut category_ids: Vec<i64> = products.values().filter_map(|p| p.category_id).collect();
    category_ids.sort_unstable();
    category_ids.dedup();

    let scoped = discount::fetch_item_scoped(conn, &product_ids, &category_ids, now)
        .await
        .map_err(|e| storage_failure("fetch item discounts", e))?;
    let book = DiscountBook::new(scoped, now);

    let global = match request.discount_id {
        Some(id) => discount::fetch_by_id(conn, id)
            .await
            .map_err(|e| storage_failure("fetch global discount", e))?,
        None => None,
    };

    let settlement = Settlement::compute(request, &products, &book, global.as_ref(), now)?;

    let touched = product::decrement_stock(conn, &settlement.stock_demand)
        .await
        .map_err(|e| storage_failure("decrement stock", e))?;
    if touched != settlement.stock_demand.len() as u64 {
        // Stock moved after our read. Report the shortage as of now.
        let ids: Vec<i64> = settlement.stock_demand.iter().map(|(id, _)| *id).collect();
        let current = product::fetch_many(conn, &ids).await?;
        check_availability(&settlement.stock_demand, &current)?;
        return Err(storage_failure(
            "decrement stock",
            DbError::TransactionFailed(format!(
                "stock update touched {touched} of {} products",
                settlement.stock_demand.len()
            )),
        ));
    }

    let id = insert_header(conn, &settlement, cashier_id, now)
        .await
        .map_err(|e| storage_failure("insert header", e))?;
    insert_details(conn, id, &settlement, now)
        .await
        .map_err(|e| storage_failure("insert details", e))?;

    debug!(
        id,
        lines = settlement.lines.len(),
        total_cents = settlement.total_amount.cents(),
        discount_cents = settlement.discount_amount.cents(),
        "Settlement written"
    );

    fetch_with_details(conn, id)
        .await?
        .ok_or_else(|| DbError::not_found("Transaction", id))
}

async fn insert_header(
    conn: &mut SqliteConnection,
    settlement: &Settlement,
    cashier_id: Option<&str>,
    now: DateTime<Utc>,
) -> DbResult<i64> {
    let result = sqlx::query(
        r#"
        INSERT INTO transactions (
            total_amount_cents, discount_id, discount_amount_cents,
            payment_amount_cents, change_amount_cents, cashier_id, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        "#,
    )
    .bind(settlement.total_amount.cents())
    .bind(settlement.global_discount_id())
    .bind(settlement.discount_amount.cents())
    .bind(settlement.payment_amount.cents())
    .bind(settlement.change_amount.cents())
    .bind(cashier_id)
    .bind(now)
    .execute(&mut *conn)
    .await?;

    Ok(result.last_insert_rowid())
}

/// All lines in one multi-row INSERT.
async fn insert_details(
    conn: &mut SqliteConnection,
    transaction_id: i64,
    settlement: &Settlement,
    now: DateTime<Utc>,
) -> DbResult<()> {
    let mut qb = QueryBuilder::<Sqlite>::new(
        "INSERT INTO transaction_details (\
            transaction_id, product_id, quantity, unit_price_cents, subtotal_cents, \
            cost_price_cents, discount_kind, discount_value, discount_amount_cents, created_at) ",
    );
    qb.push_values(&settlement.lines, |mut row, line| {
        row.push_bind(transaction_id)
            .push_bind(line.product_id)
            .push_bind(line.quantity)
            .push_bind(line.unit_price.cents())
            .push_bind(line.subtotal.cents())
            .push_bind(line.unit_cost.cents())
            .push_bind(line.discount.map(|d| d.kind))
            .push_bind(line.discount.map(|d| d.value))
            .push_bind(line.discount.map(|d| d.line_amount.cents()))
            .push_bind(now);
    });

    qb.build().execute(&mut *conn).await?;
    Ok(())
}

// =============================================================================
// Reads
// =============================================================================

async fn fetch_with_details(
    conn: &mut SqliteConnection,
    id: i64,
) -> DbResult<Option<TransactionWithDetails>> {
    let sql = format!("{HEADER_SELECT} WHERE t.id = ?1 GROUP BY t.id");
    let Some(transaction) = sqlx::query_as::<_, Transaction>(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
    else {
        return Ok(None);
    };

    let details = sqlx::query_as::<_, TransactionDetail>(
        r#"
        SELECT
            td.id,
            td.transaction_id,
            td.product_id,
            COALESCE(p.name, ?1) AS product_name,
            td.quantity,
            td.unit_price_cents,
            td.subtotal_cents,
            td.cost_price_cents,
            td.discount_kind,
            td.discount_value,
            td.discount_amount_cents,
            td.created_at
        FROM transaction_details td
        LEFT JOIN products p ON p.id = td.product_id
        WHERE td.transaction_id = ?2
        ORDER BY td.id
        "#,
    )
    .bind(DELETED_PRODUCT_LABEL)
    .bind(id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(Some(TransactionWithDetails {
        transaction,
        details,
    }))
}

/// Logs a storage failure with the step it happened in.
fn storage_failure(step: &'static str, err: DbError) -> DbError {
    error!(step, error = %err, "Checkout storage step failed");
    err
}
