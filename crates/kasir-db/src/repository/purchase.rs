//! # Purchase Repository
//!
//! Restocking: every purchase adds stock and records the buy price as the
//! product's new cost, all in one storage transaction.
//!
//! ## Item Resolution
//! ```text
//! item.product_id = Some(id) ──► product must exist ──► stock += qty, cost = buy_price
//!
//! item.product_id = None
//!      │
//!      ├── product with the same name exists ──► restock it (as above)
//!      └── otherwise ──► INSERT product (price = sell_price, cost = buy_price,
//!                                        stock = qty, created_by = acting user)
//! ```

use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use tracing::{debug, error, info};

use crate::error::{DbError, DbResult};
use crate::repository::product::{self, NewProduct};
use crate::repository::BEGIN_WRITE;
use kasir_core::validation::validate_purchase;
use kasir_core::{
    CoreError, Money, Purchase, PurchaseItem, PurchaseItemRequest, PurchaseRequest,
    PurchaseWithItems,
};

const PURCHASE_SELECT: &str = r#"
    SELECT
        p.id,
        p.supplier_name,
        p.total_amount_cents,
        p.notes,
        p.created_by,
        p.created_at,
        COALESCE(SUM(pi.quantity), 0) AS total_items
    FROM purchases p
    LEFT JOIN purchase_items pi ON pi.purchase_id = p.id
"#;

/// A request item after its product has been resolved or created.
struct ResolvedItem<'a> {
    request: &'a PurchaseItemRequest,
    product_id: i64,
    product_name: String,
}

#[derive(Debug, Clone)]
pub struct PurchaseRepository {
    pool: SqlitePool,
}

impl PurchaseRepository {
    pub fn new(pool: SqlitePool) -> Self {
        PurchaseRepository { pool }
    }

    /// Records a purchase and applies its stock and cost changes.
    pub async fn create(
        &self,
        request: &PurchaseRequest,
        created_by: Option<&str>,
    ) -> DbResult<PurchaseWithItems> {
        validate_purchase(request).map_err(CoreError::from)?;

        let now = Utc::now();
        let mut tx = self.pool.begin_with(BEGIN_WRITE).await?;

        match record(&mut tx, request, created_by, now).await {
            Ok(created) => {
                tx.commit()
                    .await
                    .map_err(|e| DbError::TransactionFailed(e.to_string()))?;
                info!(
                    id = created.purchase.id,
                    total_cents = created.purchase.total_amount_cents,
                    items = created.items.len(),
                    "Purchase recorded"
                );
                Ok(created)
            }
            Err(err) => {
                if let Err(rollback) = tx.rollback().await {
                    error!(error = %rollback, "Rollback failed");
                }
                Err(err)
            }
        }
    }

    /// All purchases, newest first, with total item counts.
    pub async fn list(&self) -> DbResult<Vec<Purchase>> {
        let sql = format!("{PURCHASE_SELECT} GROUP BY p.id ORDER BY p.created_at DESC, p.id DESC");
        let purchases = sqlx::query_as::<_, Purchase>(&sql)
            .fetch_all(&self.pool)
            .await?;

        Ok(purchases)
    }

    pub async fn get_by_id(&self, id: i64) -> DbResult<PurchaseWithItems> {
        let mut conn = self.pool.acquire().await?;
        fetch_with_items(&mut conn, id)
            .await?
            .ok_or_else(|| DbError::not_found("Purchase", id))
    }
}

async fn record(
    conn: &mut SqliteConnection,
    request: &PurchaseRequest,
    created_by: Option<&str>,
    now: DateTime<Utc>,
) -> DbResult<PurchaseWithItems> {
    let mut resolved = Vec::with_capacity(request.items.len());
    for item in &request.items {
        resolved.push(resolve_item(conn, item, created_by).await?);
    }

    let result = sqlx::query(
        r#"
        INSERT INTO purchases (supplier_name, total_amount_cents, notes, created_by, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5)
        "#,
    )
    .bind(request.supplier_name.as_deref().map(str::trim))
    .bind(request.total_amount().cents())
    .bind(request.notes.as_deref())
    .bind(created_by)
    .bind(now)
    .execute(&mut *conn)
    .await?;
    let purchase_id = result.last_insert_rowid();

    let mut qb = QueryBuilder::<Sqlite>::new(
        "INSERT INTO purchase_items (\
            purchase_id, product_id, product_name, quantity, buy_price_cents, \
            sell_price_cents, category_id, subtotal_cents, created_at) ",
    );
    qb.push_values(&resolved, |mut row, item| {
        row.push_bind(purchase_id)
            .push_bind(item.product_id)
            .push_bind(item.product_name.clone())
            .push_bind(item.request.quantity)
            .push_bind(item.request.buy_price.cents())
            .push_bind(item.request.sell_price.map(|p| p.cents()))
            .push_bind(item.request.category_id)
            .push_bind(item.request.subtotal().cents())
            .push_bind(now);
    });
    qb.build().execute(&mut *conn).await?;

    fetch_with_items(conn, purchase_id)
        .await?
        .ok_or_else(|| DbError::not_found("Purchase", purchase_id))
}

async fn resolve_item<'a>(
    conn: &mut SqliteConnection,
    item: &'a PurchaseItemRequest,
    created_by: Option<&str>,
) -> DbResult<ResolvedItem<'a>> {
    let existing = match (item.product_id, item.product_name.as_deref()) {
        (Some(id), _) => Some(
            product::fetch_one(conn, id)
                .await?
                .ok_or(CoreError::ProductNotFound(id))?,
        ),
        (None, Some(name)) => product::fetch_by_name(conn, name).await?,
        (None, None) => None,
    };

    if let Some(found) = existing {
        product::restock(conn, found.id, item.quantity, item.buy_price).await?;
        debug!(id = found.id, name = %found.name, quantity = item.quantity, "Restocked product");
        return Ok(ResolvedItem {
            request: item,
            product_id: found.id,
            product_name: found.name,
        });
    }

    // validate_purchase guarantees both for items without a product id.
    let name = item.product_name.clone().unwrap_or_default();
    let new_product = NewProduct {
        name: name.trim().to_string(),
        price: item.sell_price.unwrap_or_else(Money::zero),
        cost_price: Some(item.buy_price),
        stock: item.quantity,
        category_id: item.category_id,
        created_by: created_by.map(str::to_string),
    };
    let id = product::insert_with(conn, &new_product).await?;
    debug!(id, name = %new_product.name, quantity = item.quantity, "Created product from purchase");

    Ok(ResolvedItem {
        request: item,
        product_id: id,
        product_name: new_product.name,
    })
}

async fn fetch_with_items(
    conn: &mut SqliteConnection,
    id: i64,
) -> DbResult<Option<PurchaseWithItems>> {
    let sql = format!("{PURCHASE_SELECT} WHERE p.id = ?1 GROUP BY p.id");
    let Some(purchase) = sqlx::query_as::<_, Purchase>(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
    else {
        return Ok(None);
    };

    let items = sqlx::query_as::<_, PurchaseItem>(
        r#"
        SELECT id, purchase_id, product_id, product_name, quantity, buy_price_cents,
               sell_price_cents, category_id, subtotal_cents, created_at
        FROM purchase_items
        WHERE purchase_id = ?1
        ORDER BY id
        "#,
    )
    .bind(id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(Some(PurchaseWithItems { purchase, items }))
}

// =============================================================================
// Unit Tests
// =============================================================================
