//! # Discount Repository
//!
//! Discount rows are read-only at checkout time. Two read paths exist:
//!
//! ```text
//! fetch_item_scoped  ← checkout, one query for every product/category in the cart
//! fetch_by_id        ← checkout, the global discount the cashier picked
//! list_selectable    ← cashier screen, globals that can be picked right now
//! ```

use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use kasir_core::{Discount, DiscountKind, Money};

const DISCOUNT_COLUMNS: &str = "id, name, kind, value, min_order_cents, product_id, category_id, \
     start_date, end_date, is_active, created_at";

/// Input for a new discount.
///
/// `value` is basis points for `Percentage` and minor units for `Fixed`.
#[derive(Debug, Clone)]
pub struct NewDiscount {
    pub name: String,
    pub kind: DiscountKind,
    pub value: i64,
    pub min_order: Money,
    pub product_id: Option<i64>,
    pub category_id: Option<i64>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub is_active: bool,
}

impl NewDiscount {
    /// An active, unscoped discount valid over `[start_date, end_date]`.
    pub fn global(
        name: impl Into<String>,
        kind: DiscountKind,
        value: i64,
        start_date: DateTime<Utc>,
        end_date: DateTime<Utc>,
    ) -> Self {
        NewDiscount {
            name: name.into(),
            kind,
            value,
            min_order: Money::zero(),
            product_id: None,
            category_id: None,
            start_date,
            end_date,
            is_active: true,
        }
    }

    pub fn for_product(mut self, product_id: i64) -> Self {
        self.product_id = Some(product_id);
        self.category_id = None;
        self
    }

    pub fn for_category(mut self, category_id: i64) -> Self {
        self.category_id = Some(category_id);
        self.product_id = None;
        self
    }

    pub fn min_order(mut self, min_order: Money) -> Self {
        self.min_order = min_order;
        self
    }

    pub fn inactive(mut self) -> Self {
        self.is_active = false;
        self
    }
}

#[derive(Debug, Clone)]
pub struct DiscountRepository {
    pool: SqlitePool,
}

impl DiscountRepository {
    pub fn new(pool: SqlitePool) -> Self {
        DiscountRepository { pool }
    }

    pub async fn insert(&self, discount: &NewDiscount) -> DbResult<Discount> {
        debug!(name = %discount.name, kind = ?discount.kind, value = discount.value, "Inserting discount");

        let result = sqlx::query(
            r#"
            INSERT INTO discounts (
                name, kind, value, min_order_cents,
                product_id, category_id, start_date, end_date,
                is_active, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(discount.name.trim())
        .bind(discount.kind)
        .bind(discount.value)
        .bind(discount.min_order.cents())
        .bind(discount.product_id)
        .bind(discount.category_id)
        .bind(discount.start_date)
        .bind(discount.end_date)
        .bind(discount.is_active)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_rowid();
        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Discount", id))
    }

    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<Discount>> {
        let mut conn = self.pool.acquire().await?;
        fetch_by_id(&mut conn, id).await
    }

    /// Globals a cashier may pick at `now`: unscoped, active, in window.
    ///
    /// Ordered by minimum order ascending, so the easiest to qualify for
    /// come first.
    pub async fn list_selectable(&self, now: DateTime<Utc>) -> DbResult<Vec<Discount>> {
        let sql = format!(
            r#"
            SELECT {DISCOUNT_COLUMNS}
            FROM discounts
            WHERE product_id IS NULL
              AND category_id IS NULL
              AND is_active = 1
              AND start_date <= ?1
              AND end_date >= ?1
            ORDER BY min_order_cents ASC, id ASC
            "#
        );
        let discounts = sqlx::query_as::<_, Discount>(&sql)
            .bind(now)
            .fetch_all(&self.pool)
            .await?;

        Ok(discounts)
    }
}

// =============================================================================
// Connection-level helpers (usable inside a transaction)
// =============================================================================

pub(crate) async fn fetch_by_id(conn: &mut SqliteConnection, id: i64) -> DbResult<Option<Discount>> {
    let sql = format!("SELECT {DISCOUNT_COLUMNS} FROM discounts WHERE id = ?1");
    let discount = sqlx::query_as::<_, Discount>(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

    Ok(discount)
}

/// Every active, in-window discount scoped to one of `product_ids` or
/// `category_ids`, in a single query.
///
/// Choosing between candidates is not done here: `kasir_core::pricing::DiscountBook`
/// owns the priority rules.
pub(crate) async fn fetch_item_scoped(
    conn: &mut SqliteConnection,
    product_ids: &[i64],
    category_ids: &[i64],
    now: DateTime<Utc>,
) -> DbResult<Vec<Discount>> {
    if product_ids.is_empty() && category_ids.is_empty() {
        return Ok(Vec::new());
    }

    let mut qb = QueryBuilder::<Sqlite>::new(format!(
        "SELECT {DISCOUNT_COLUMNS} FROM discounts WHERE is_active = 1 AND start_date <= "
    ));
    qb.push_bind(now).push(" AND end_date >= ").push_bind(now).push(" AND (");

    push_in_list(&mut qb, "product_id", product_ids);
    qb.push(" OR ");
    push_in_list(&mut qb, "category_id", category_ids);
    qb.push(")");

    let discounts = qb.build_query_as::<Discount>().fetch_all(&mut *conn).await?;

    debug!(count = discounts.len(), "Fetched item-scoped discounts");
    Ok(discounts)
}

/// `column IN (?, ?, ...)`, or a false predicate for an empty list.
fn push_in_list(qb: &mut QueryBuilder<'_, Sqlite>, column: &str, ids: &[i64]) {
    if ids.is_empty() {
        qb.push("0");
        return;
    }

    qb.push(column).push(" IN (");
    let mut separated = qb.separated(", ");
    for id in ids {
        separated.push_bind(*id);
    }
    separated.push_unseparated(")");
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::product::NewProduct;
    use crate::{Database, DbConfig};
    use chrono::Duration;

    async fn setup() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    fn window(now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
        (now - Duration::days(1), now + Duration::days(1))
    }

    #[tokio::test]
    async fn test_insert_round_trip() {
        let db = setup().await;
        let now = Utc::now();
        let (start, end) = window(now);

        let created = db
            .discounts()
            .insert(
                &NewDiscount::global("Gajian", DiscountKind::Percentage, 1_000, start, end)
                    .min_order(Money::from_major(50_000)),
            )
            .await
            .unwrap();

        let loaded = db.discounts().get_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(loaded.kind, DiscountKind::Percentage);
        assert_eq!(loaded.value, 1_000);
        assert_eq!(loaded.min_order(), Money::from_major(50_000));
        assert!(loaded.is_global());
        assert!(loaded.is_active_at(now));
    }

    #[tokio::test]
    async fn test_both_scopes_rejected_by_schema() {
        let db = setup().await;
        let now = Utc::now();
        let (start, end) = window(now);
        let product = db
            .products()
            .insert(&NewProduct::new("A", Money::from_major(1_000), 1))
            .await
            .unwrap();
        let category = db.categories().insert("Snack", None).await.unwrap();

        let mut both = NewDiscount::global("Both", DiscountKind::Fixed, 100, start, end);
        both.product_id = Some(product.id);
        both.category_id = Some(category.id);

        assert!(matches!(
            db.discounts().insert(&both).await,
            Err(DbError::CheckViolation { .. })
        ));
    }

    #[tokio::test]
    async fn test_list_selectable_only_returns_usable_globals() {
        let db = setup().await;
        let now = Utc::now();
        let (start, end) = window(now);
        let product = db
            .products()
            .insert(&NewProduct::new("A", Money::from_major(1_000), 1))
            .await
            .unwrap();
        let repo = db.discounts();

        let big = repo
            .insert(
                &NewDiscount::global("Big", DiscountKind::Fixed, 1_000_000, start, end)
                    .min_order(Money::from_major(100_000)),
            )
            .await
            .unwrap();
        let small = repo
            .insert(&NewDiscount::global("Small", DiscountKind::Percentage, 500, start, end))
            .await
            .unwrap();
        repo.insert(&NewDiscount::global("Off", DiscountKind::Fixed, 100, start, end).inactive())
            .await
            .unwrap();
        repo.insert(&NewDiscount::global(
            "Expired",
            DiscountKind::Fixed,
            100,
            now - Duration::days(10),
            now - Duration::days(5),
        ))
        .await
        .unwrap();
        repo.insert(
            &NewDiscount::global("Scoped", DiscountKind::Fixed, 100, start, end)
                .for_product(product.id),
        )
        .await
        .unwrap();

        let ids: Vec<i64> = repo
            .list_selectable(now)
            .await
            .unwrap()
            .into_iter()
            .map(|d| d.id)
            .collect();
        assert_eq!(ids, vec![small.id, big.id]);
    }

    #[tokio::test]
    async fn test_fetch_item_scoped_filters_scope_and_window() {
        let db = setup().await;
        let now = Utc::now();
        let (start, end) = window(now);
        let category = db.categories().insert("Minuman", None).await.unwrap();
        let in_cart = db
            .products()
            .insert(&NewProduct::new("A", Money::from_major(1_000), 1).category(category.id))
            .await
            .unwrap();
        let elsewhere = db
            .products()
            .insert(&NewProduct::new("B", Money::from_major(1_000), 1))
            .await
            .unwrap();
        let repo = db.discounts();

        let by_product = repo
            .insert(&NewDiscount::global("P", DiscountKind::Fixed, 100, start, end).for_product(in_cart.id))
            .await
            .unwrap();
        let by_category = repo
            .insert(&NewDiscount::global("C", DiscountKind::Fixed, 100, start, end).for_category(category.id))
            .await
            .unwrap();
        repo.insert(&NewDiscount::global("Other", DiscountKind::Fixed, 100, start, end).for_product(elsewhere.id))
            .await
            .unwrap();
        repo.insert(&NewDiscount::global("Global", DiscountKind::Fixed, 100, start, end))
            .await
            .unwrap();
        repo.insert(
            &NewDiscount::global("Off", DiscountKind::Fixed, 100, start, end)
                .for_product(in_cart.id)
                .inactive(),
        )
        .await
        .unwrap();

        let mut conn = db.pool().acquire().await.unwrap();
        let mut ids: Vec<i64> = fetch_item_scoped(&mut conn, &[in_cart.id], &[category.id], now)
            .await
            .unwrap()
            .into_iter()
            .map(|d| d.id)
            .collect();
        ids.sort();

        assert_eq!(ids, vec![by_product.id, by_category.id]);
    }
}
