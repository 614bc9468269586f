//! # Product Repository
//!
//! Database operations for products.
//!
//! ## Key Operations
//! - Single and bulk reads (`get_by_id`, `fetch_many`)
//! - Insert and delete (catalog maintenance, seed data, tests)
//! - Conditional bulk stock decrement used by checkout
//!
//! ## Stock Decrement
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  demand = [(1, 2), (7, 5)]                                             │
//! │                                                                         │
//! │  UPDATE products                                                       │
//! │  SET stock = stock - CASE id WHEN 1 THEN 2 WHEN 7 THEN 5 END           │
//! │  WHERE (id = 1 AND stock >= 2) OR (id = 7 AND stock >= 5)              │
//! │                                                                         │
//! │  rows_affected == 2 → every product had enough                         │
//! │  rows_affected <  2 → someone sold it first; caller rolls back         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The stock condition is repeated in the UPDATE itself, so the check and
//! the decrement are one statement even when another checkout committed
//! between this transaction's read and its write.

use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use std::collections::HashMap;
use tracing::debug;

use crate::error::{DbError, DbResult};
use kasir_core::{Money, Product};

pub(crate) const PRODUCT_COLUMNS: &str =
    "id, name, price_cents, cost_price_cents, stock, category_id, created_by, created_at";

/// Input for a new catalog entry.
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub price: Money,
    pub cost_price: Option<Money>,
    pub stock: i64,
    pub category_id: Option<i64>,
    pub created_by: Option<String>,
}

impl NewProduct {
    /// A product with a sell price and opening stock, nothing else.
    pub fn new(name: impl Into<String>, price: Money, stock: i64) -> Self {
        NewProduct {
            name: name.into(),
            price,
            cost_price: None,
            stock,
            category_id: None,
            created_by: None,
        }
    }

    pub fn cost_price(mut self, cost: Money) -> Self {
        self.cost_price = Some(cost);
        self
    }

    pub fn category(mut self, category_id: i64) -> Self {
        self.category_id = Some(category_id);
        self
    }
}

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let product = db.products().get_by_id(1).await?;
/// let created = db.products().insert(&NewProduct::new("Aqua 600ml", Money::from_major(3_500), 48)).await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<Product>> {
        let mut conn = self.pool.acquire().await?;
        fetch_one(&mut conn, id).await
    }

    /// Bulk read keyed by id; unknown ids are simply absent from the map.
    pub async fn get_many(&self, ids: &[i64]) -> DbResult<HashMap<i64, Product>> {
        let mut conn = self.pool.acquire().await?;
        fetch_many(&mut conn, ids).await
    }

    /// All products, alphabetically.
    pub async fn list(&self) -> DbResult<Vec<Product>> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products ORDER BY name, id");
        let products = sqlx::query_as::<_, Product>(&sql)
            .fetch_all(&self.pool)
            .await?;

        Ok(products)
    }

    pub async fn insert(&self, product: &NewProduct) -> DbResult<Product> {
        let mut conn = self.pool.acquire().await?;
        let id = insert_with(&mut conn, product).await?;
        fetch_one(&mut conn, id)
            .await?
            .ok_or_else(|| DbError::not_found("Product", id))
    }

    /// Deletes a product.
    ///
    /// Historical transaction lines keep their snapshots; their `product_id`
    /// becomes NULL and reads show a placeholder name.
    pub async fn delete(&self, id: i64) -> DbResult<()> {
        debug!(id, "Deleting product");

        let result = sqlx::query("DELETE FROM products WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Current stock, for diagnostics and tests.
    pub async fn stock(&self, id: i64) -> DbResult<Option<i64>> {
        let stock = sqlx::query_scalar::<_, i64>("SELECT stock FROM products WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(stock)
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

// =============================================================================
// Connection-level helpers (usable inside a transaction)
// =============================================================================

pub(crate) async fn fetch_one(conn: &mut SqliteConnection, id: i64) -> DbResult<Option<Product>> {
    let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1");
    let product = sqlx::query_as::<_, Product>(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

    Ok(product)
}

/// One `SELECT ... WHERE id IN (...)` for every id.
pub(crate) async fn fetch_many(
    conn: &mut SqliteConnection,
    ids: &[i64],
) -> DbResult<HashMap<i64, Product>> {
    if ids.is_empty() {
        return Ok(HashMap::new());
    }

    let mut qb = QueryBuilder::<Sqlite>::new(format!(
        "SELECT {PRODUCT_COLUMNS} FROM products WHERE id IN ("
    ));
    let mut separated = qb.separated(", ");
    for id in ids {
        separated.push_bind(*id);
    }
    separated.push_unseparated(")");

    let products = qb.build_query_as::<Product>().fetch_all(&mut *conn).await?;

    debug!(requested = ids.len(), found = products.len(), "Fetched products");
    Ok(products.into_iter().map(|p| (p.id, p)).collect())
}

pub(crate) async fn fetch_by_name(
    conn: &mut SqliteConnection,
    name: &str,
) -> DbResult<Option<Product>> {
    let sql = format!(
        "SELECT {PRODUCT_COLUMNS} FROM products WHERE name = ?1 COLLATE NOCASE ORDER BY id LIMIT 1"
    );
    let product = sqlx::query_as::<_, Product>(&sql)
        .bind(name.trim())
        .fetch_optional(&mut *conn)
        .await?;

    Ok(product)
}

pub(crate) async fn insert_with(conn: &mut SqliteConnection, product: &NewProduct) -> DbResult<i64> {
    debug!(name = %product.name, "Inserting product");

    let result = sqlx::query(
        r#"
        INSERT INTO products (
            name, price_cents, cost_price_cents, stock,
            category_id, created_by, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        "#,
    )
    .bind(product.name.trim())
    .bind(product.price.cents())
    .bind(product.cost_price.map(|c| c.cents()))
    .bind(product.stock)
    .bind(product.category_id)
    .bind(product.created_by.as_deref())
    .bind(Utc::now())
    .execute(&mut *conn)
    .await?;

    Ok(result.last_insert_rowid())
}

/// Takes `quantity` from every product in `demand` with one conditional UPDATE.
///
/// Returns the number of products that had enough stock and were
/// decremented. Anything below `demand.len()` means the caller must roll
/// back.
pub(crate) async fn decrement_stock(
    conn: &mut SqliteConnection,
    demand: &[(i64, i64)],
) -> DbResult<u64> {
    if demand.is_empty() {
        return Ok(0);
    }

    let mut qb = QueryBuilder::<Sqlite>::new("UPDATE products SET stock = stock - CASE id");
    for (product_id, quantity) in demand {
        qb.push(" WHEN ")
            .push_bind(*product_id)
            .push(" THEN ")
            .push_bind(*quantity);
    }
    qb.push(" END WHERE ");
    for (index, (product_id, quantity)) in demand.iter().enumerate() {
        if index > 0 {
            qb.push(" OR ");
        }
        qb.push("(id = ")
            .push_bind(*product_id)
            .push(" AND stock >= ")
            .push_bind(*quantity)
            .push(")");
    }

    let result = qb.build().execute(&mut *conn).await?;
    Ok(result.rows_affected())
}

/// Adds stock and records the latest buy price as the cost.
pub(crate) async fn restock(
    conn: &mut SqliteConnection,
    id: i64,
    quantity: i64,
    cost_price: Money,
) -> DbResult<()> {
    let result = sqlx::query(
        "UPDATE products SET stock = stock + ?2, cost_price_cents = ?3 WHERE id = ?1",
    )
    .bind(id)
    .bind(quantity)
    .bind(cost_price.cents())
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found("Product", id));
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};

    async fn setup() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let db = setup().await;
        let created = db
            .products()
            .insert(&NewProduct::new("Aqua 600ml", Money::from_major(3_500), 48).cost_price(Money::from_major(2_800)))
            .await
            .unwrap();

        let loaded = db.products().get_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(loaded.name, "Aqua 600ml");
        assert_eq!(loaded.price(), Money::from_major(3_500));
        assert_eq!(loaded.cost_price(), Some(Money::from_major(2_800)));
        assert_eq!(loaded.stock, 48);
        assert_eq!(db.products().count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_get_many_skips_unknown_ids() {
        let db = setup().await;
        let a = db.products().insert(&NewProduct::new("A", Money::from_major(1_000), 1)).await.unwrap();
        let b = db.products().insert(&NewProduct::new("B", Money::from_major(2_000), 1)).await.unwrap();

        let found = db.products().get_many(&[a.id, b.id, 999]).await.unwrap();
        assert_eq!(found.len(), 2);
        assert!(found.contains_key(&a.id));
        assert!(!found.contains_key(&999));
    }

    #[tokio::test]
    async fn test_decrement_is_all_or_nothing_per_row() {
        let db = setup().await;
        let a = db.products().insert(&NewProduct::new("A", Money::from_major(1_000), 5)).await.unwrap();
        let b = db.products().insert(&NewProduct::new("B", Money::from_major(1_000), 1)).await.unwrap();

        let mut conn = db.pool().acquire().await.unwrap();
        let touched = decrement_stock(&mut conn, &[(a.id, 2), (b.id, 3)]).await.unwrap();
        drop(conn);

        // Only A qualified; the caller sees 1 < 2 and would roll back.
        assert_eq!(touched, 1);
        assert_eq!(db.products().stock(a.id).await.unwrap(), Some(3));
        assert_eq!(db.products().stock(b.id).await.unwrap(), Some(1));
    }

    #[tokio::test]
    async fn test_negative_stock_rejected_by_schema() {
        let db = setup().await;
        let a = db.products().insert(&NewProduct::new("A", Money::from_major(1_000), 1)).await.unwrap();

        let err = sqlx::query("UPDATE products SET stock = -1 WHERE id = ?1")
            .bind(a.id)
            .execute(db.pool())
            .await
            .map_err(DbError::from)
            .unwrap_err();

        assert!(matches!(err, DbError::CheckViolation { .. }));
    }

    #[tokio::test]
    async fn test_delete() {
        let db = setup().await;
        let a = db.products().insert(&NewProduct::new("A", Money::from_major(1_000), 1)).await.unwrap();

        db.products().delete(a.id).await.unwrap();
        assert!(db.products().get_by_id(a.id).await.unwrap().is_none());
        assert!(matches!(
            db.products().delete(a.id).await,
            Err(DbError::NotFound { .. })
        ));
    }
}
