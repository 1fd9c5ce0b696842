//! # Item Repository
//!
//! Database operations for the item master.
//!
//! ## Stock Receipt Flow
//! ```text
//! GrnDraft::confirm (tally-core)
//!       │  GrnReceipt { updated: Vec<Item>, .. }
//!       ▼
//! ItemRepository::apply_stock_receipt
//!       │  BEGIN
//!       │  UPDATE items SET stock_qty, cost_cents, supplier  (per item)
//!       │  COMMIT
//!       ▼
//! rows written
//! ```
//!
//! Either every updated item is written or none are.

use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info, warn};

use crate::error::{DbError, DbResult};
use crate::repository::ensure_id;
use tally_core::{Item, Money};

#[derive(Debug, sqlx::FromRow)]
struct ItemRow {
    id: String,
    sku: String,
    name: String,
    description: String,
    category: String,
    stock_qty: i64,
    unit: String,
    cost_cents: i64,
    price_cents: i64,
    image_url: Option<String>,
    supplier: Option<String>,
}

impl From<ItemRow> for Item {
    fn from(row: ItemRow) -> Self {
        Item {
            id: row.id,
            sku: row.sku,
            name: row.name,
            description: row.description,
            category: row.category,
            stock_qty: row.stock_qty,
            unit: row.unit,
            cost: Money::from_cents(row.cost_cents),
            price: Money::from_cents(row.price_cents),
            image_url: row.image_url,
            supplier: row.supplier,
        }
    }
}

const SELECT_ITEMS: &str = r#"
    SELECT
        id, sku, name, description, category, stock_qty, unit,
        cost_cents, price_cents, image_url, supplier
    FROM items
"#;

/// Repository for item database operations.
#[derive(Debug, Clone)]
pub struct ItemRepository {
    pool: SqlitePool,
}

impl ItemRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ItemRepository { pool }
    }

    pub async fn list(&self) -> DbResult<Vec<Item>> {
        let rows = sqlx::query_as::<_, ItemRow>(&format!("{SELECT_ITEMS} ORDER BY rowid"))
            .fetch_all(&self.pool)
            .await?;

        debug!(count = rows.len(), "Listed items");
        Ok(rows.into_iter().map(Item::from).collect())
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Item>> {
        let row = sqlx::query_as::<_, ItemRow>(&format!("{SELECT_ITEMS} WHERE id = ?1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Item::from))
    }

    pub async fn get_by_sku(&self, sku: &str) -> DbResult<Option<Item>> {
        let row = sqlx::query_as::<_, ItemRow>(&format!("{SELECT_ITEMS} WHERE sku = ?1"))
            .bind(sku)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Item::from))
    }

    /// Inserts an item.
    ///
    /// ## Errors
    /// * `DbError::UniqueViolation` - the SKU is already taken
    pub async fn insert(&self, item: &Item) -> DbResult<Item> {
        let mut conn = self.pool.acquire().await?;
        insert_item(&mut *conn, item).await
    }

    pub async fn update(&self, item: &Item) -> DbResult<()> {
        debug!(id = %item.id, sku = %item.sku, "Updating item");

        let result = sqlx::query(
            r#"
            UPDATE items SET
                sku = ?2,
                name = ?3,
                description = ?4,
                category = ?5,
                stock_qty = ?6,
                unit = ?7,
                cost_cents = ?8,
                price_cents = ?9,
                image_url = ?10,
                supplier = ?11
            WHERE id = ?1
            "#,
        )
        .bind(&item.id)
        .bind(&item.sku)
        .bind(&item.name)
        .bind(&item.description)
        .bind(&item.category)
        .bind(item.stock_qty)
        .bind(&item.unit)
        .bind(item.cost.cents())
        .bind(item.price.cents())
        .bind(&item.image_url)
        .bind(&item.supplier)
        .execute(&self.pool)
        .await
        .map_err(|e| sku_conflict(e, &item.sku))?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Item", &item.id));
        }

        Ok(())
    }

    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting item");

        let result = sqlx::query("DELETE FROM items WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Item", id));
        }

        Ok(())
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM items")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    /// Writes the stock, cost and supplier of every item a confirmed GRN
    /// touched, in one transaction.
    ///
    /// Items deleted since the GRN was confirmed are logged and skipped.
    /// Returns the number of rows written.
    pub async fn apply_stock_receipt(&self, items: &[Item]) -> DbResult<usize> {
        debug!(count = items.len(), "Applying stock receipt");

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        let mut written = 0;
        for item in items {
            let result = sqlx::query(
                r#"
                UPDATE items SET
                    stock_qty = ?2,
                    cost_cents = ?3,
                    supplier = ?4
                WHERE id = ?1
                "#,
            )
            .bind(&item.id)
            .bind(item.stock_qty)
            .bind(item.cost.cents())
            .bind(&item.supplier)
            .execute(&mut *tx)
            .await?;

            if result.rows_affected() == 0 {
                warn!(id = %item.id, sku = %item.sku, "Stock receipt skipped missing item");
            } else {
                written += 1;
            }
        }

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        info!(written, "Stock receipt committed");
        Ok(written)
    }
}

pub(crate) async fn insert_item(conn: &mut SqliteConnection, item: &Item) -> DbResult<Item> {
    let item = Item {
        id: ensure_id(&item.id),
        ..item.clone()
    };
    debug!(id = %item.id, sku = %item.sku, "Inserting item");

    sqlx::query(
        r#"
        INSERT INTO items (
            id, sku, name, description, category, stock_qty, unit,
            cost_cents, price_cents, image_url, supplier
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
        "#,
    )
    .bind(&item.id)
    .bind(&item.sku)
    .bind(&item.name)
    .bind(&item.description)
    .bind(&item.category)
    .bind(item.stock_qty)
    .bind(&item.unit)
    .bind(item.cost.cents())
    .bind(item.price.cents())
    .bind(&item.image_url)
    .bind(&item.supplier)
    .execute(&mut *conn)
    .await
    .map_err(|e| sku_conflict(e, &item.sku))?;

    Ok(item)
}

/// Attaches the offending SKU to a unique violation.
fn sku_conflict(err: sqlx::Error, sku: &str) -> DbError {
    match DbError::from(err) {
        DbError::UniqueViolation { .. } => DbError::duplicate("sku", sku),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use crate::pool::{Database, DbConfig};
    use crate::DbError;
    use tally_core::fixtures::seed_items;
    use tally_core::{Item, Money};

    async fn seeded() -> Database {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        for item in seed_items() {
            db.items().insert(&item).await.unwrap();
        }
        db
    }

    #[tokio::test]
    async fn test_insert_and_lookup() {
        let db = seeded().await;

        let mouse = db.items().get_by_sku("HW-MSE-002").await.unwrap().unwrap();
        assert_eq!(mouse.id, "item_2");
        assert_eq!(mouse.price, Money::from_major(3_500));
        assert_eq!(mouse.supplier.as_deref(), Some("Global Electronics Ltd"));

        let service = db.items().get_by_id("item_4").await.unwrap().unwrap();
        assert_eq!(service.supplier, None);
        assert_eq!(db.items().count().await.unwrap(), 5);
    }

    #[tokio::test]
    async fn test_duplicate_sku_rejected() {
        let db = seeded().await;

        let clash = Item::new("HW-LPT-001", "Another Laptop");
        let err = db.items().insert(&clash).await.unwrap_err();
        match err {
            DbError::UniqueViolation { field, value } => {
                assert_eq!(field, "sku");
                assert_eq!(value, "HW-LPT-001");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_apply_stock_receipt() {
        let db = seeded().await;
        let mut laptop = db.items().get_by_id("item_1").await.unwrap().unwrap();
        laptop.stock_qty = 30;
        laptop.cost = Money::from_major(100);

        let written = db.items().apply_stock_receipt(&[laptop]).await.unwrap();
        assert_eq!(written, 1);

        let stored = db.items().get_by_id("item_1").await.unwrap().unwrap();
        assert_eq!(stored.stock_qty, 30);
        assert_eq!(stored.cost, Money::from_major(100));
        assert_eq!(stored.price, Money::from_major(155_000));
    }

    #[tokio::test]
    async fn test_apply_stock_receipt_skips_missing_item() {
        let db = seeded().await;
        let mut paper = db.items().get_by_id("item_3").await.unwrap().unwrap();
        paper.stock_qty = 520;
        let mut ghost = Item::new("GH-OST-001", "Ghost");
        ghost.id = "item_99".to_string();

        let written = db.items().apply_stock_receipt(&[ghost, paper]).await.unwrap();
        assert_eq!(written, 1);
        assert_eq!(
            db.items().get_by_id("item_3").await.unwrap().unwrap().stock_qty,
            520
        );
    }

    #[tokio::test]
    async fn test_delete_missing_item() {
        let db = seeded().await;
        db.items().delete("item_5").await.unwrap();

        let err = db.items().delete("item_5").await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }
}
