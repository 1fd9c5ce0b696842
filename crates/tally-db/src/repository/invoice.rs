//! # Invoice Repository
//!
//! Database operations for invoices and their line items.
//!
//! ## Storage Layout
//! ```text
//! ┌──────────────────────┐        ┌──────────────────────────┐
//! │ invoices             │ 1    * │ invoice_items            │
//! │  id (PK)             │◄───────│  invoice_id (FK, CASCADE)│
//! │  invoice_number (UQ) │        │  line_no                 │
//! │  totals in cents     │        │  rate_cents / *_bps      │
//! └──────────────────────┘        └──────────────────────────┘
//! ```
//!
//! Header and lines are always written in the same transaction. Lists come
//! back newest first, matching the order the POS shows them in.

use std::collections::HashMap;

use chrono::NaiveDate;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::repository::ensure_id;
use tally_core::{Invoice, InvoiceLineItem, InvoiceStatus, Money, Rate};

#[derive(Debug, sqlx::FromRow)]
struct InvoiceRow {
    id: String,
    invoice_number: String,
    customer_id: String,
    customer_name: String,
    date: NaiveDate,
    due_date: NaiveDate,
    status: InvoiceStatus,
    sub_total_cents: i64,
    total_tax_cents: i64,
    total_discount_cents: i64,
    grand_total_cents: i64,
    balance_due_cents: i64,
}

impl InvoiceRow {
    fn into_invoice(self, items: Vec<InvoiceLineItem>) -> Invoice {
        Invoice {
            id: self.id,
            invoice_number: self.invoice_number,
            customer_id: self.customer_id,
            customer_name: self.customer_name,
            date: self.date,
            due_date: self.due_date,
            status: self.status,
            items,
            sub_total: Money::from_cents(self.sub_total_cents),
            total_tax: Money::from_cents(self.total_tax_cents),
            total_discount: Money::from_cents(self.total_discount_cents),
            grand_total: Money::from_cents(self.grand_total_cents),
            balance_due: Money::from_cents(self.balance_due_cents),
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct LineRow {
    invoice_id: String,
    item_id: String,
    name: String,
    quantity: i64,
    rate_cents: i64,
    discount_bps: i64,
    tax_bps: i64,
    amount_cents: i64,
}

impl TryFrom<LineRow> for InvoiceLineItem {
    type Error = DbError;

    fn try_from(row: LineRow) -> Result<Self, Self::Error> {
        Ok(InvoiceLineItem {
            item_id: row.item_id,
            name: row.name,
            quantity: row.quantity,
            rate: Money::from_cents(row.rate_cents),
            discount_percent: bps(row.discount_bps)?,
            tax_percent: bps(row.tax_bps)?,
            amount: Money::from_cents(row.amount_cents),
        })
    }
}

fn bps(value: i64) -> DbResult<Rate> {
    u32::try_from(value)
        .map(Rate::from_bps)
        .map_err(|_| DbError::Serialization(format!("rate out of range: {value} bps")))
}

const SELECT_INVOICES: &str = r#"
    SELECT
        id, invoice_number, customer_id, customer_name, date, due_date, status,
        sub_total_cents, total_tax_cents, total_discount_cents,
        grand_total_cents, balance_due_cents
    FROM invoices
"#;

const SELECT_LINES: &str = r#"
    SELECT
        invoice_id, item_id, name, quantity, rate_cents,
        discount_bps, tax_bps, amount_cents
    FROM invoice_items
"#;

/// Repository for invoice database operations.
#[derive(Debug, Clone)]
pub struct InvoiceRepository {
    pool: SqlitePool,
}

impl InvoiceRepository {
    pub fn new(pool: SqlitePool) -> Self {
        InvoiceRepository { pool }
    }

    /// All invoices, newest first, with their lines.
    pub async fn list(&self) -> DbResult<Vec<Invoice>> {
        let headers =
            sqlx::query_as::<_, InvoiceRow>(&format!("{SELECT_INVOICES} ORDER BY rowid DESC"))
                .fetch_all(&self.pool)
                .await?;

        let rows = sqlx::query_as::<_, LineRow>(&format!(
            "{SELECT_LINES} ORDER BY invoice_id, line_no"
        ))
        .fetch_all(&self.pool)
        .await?;

        let mut lines: HashMap<String, Vec<InvoiceLineItem>> = HashMap::new();
        for row in rows {
            let invoice_id = row.invoice_id.clone();
            lines
                .entry(invoice_id)
                .or_default()
                .push(InvoiceLineItem::try_from(row)?);
        }

        debug!(count = headers.len(), "Listed invoices");
        Ok(headers
            .into_iter()
            .map(|header| {
                let items = lines.remove(&header.id).unwrap_or_default();
                header.into_invoice(items)
            })
            .collect())
    }

    /// Invoices raised against one customer, newest first.
    pub async fn list_for_customer(&self, customer_id: &str) -> DbResult<Vec<Invoice>> {
        let headers = sqlx::query_as::<_, InvoiceRow>(&format!(
            "{SELECT_INVOICES} WHERE customer_id = ?1 ORDER BY rowid DESC"
        ))
        .bind(customer_id)
        .fetch_all(&self.pool)
        .await?;

        let mut invoices = Vec::with_capacity(headers.len());
        for header in headers {
            let items = self.lines(&header.id).await?;
            invoices.push(header.into_invoice(items));
        }

        debug!(customer_id = %customer_id, count = invoices.len(), "Listed customer invoices");
        Ok(invoices)
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Invoice>> {
        let header = sqlx::query_as::<_, InvoiceRow>(&format!("{SELECT_INVOICES} WHERE id = ?1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        match header {
            Some(header) => {
                let items = self.lines(&header.id).await?;
                Ok(Some(header.into_invoice(items)))
            }
            None => Ok(None),
        }
    }

    pub async fn get_by_number(&self, invoice_number: &str) -> DbResult<Option<Invoice>> {
        let header = sqlx::query_as::<_, InvoiceRow>(&format!(
            "{SELECT_INVOICES} WHERE invoice_number = ?1"
        ))
        .bind(invoice_number)
        .fetch_optional(&self.pool)
        .await?;

        match header {
            Some(header) => {
                let items = self.lines(&header.id).await?;
                Ok(Some(header.into_invoice(items)))
            }
            None => Ok(None),
        }
    }

    async fn lines(&self, invoice_id: &str) -> DbResult<Vec<InvoiceLineItem>> {
        let rows = sqlx::query_as::<_, LineRow>(&format!(
            "{SELECT_LINES} WHERE invoice_id = ?1 ORDER BY line_no"
        ))
        .bind(invoice_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(InvoiceLineItem::try_from).collect()
    }

    /// Inserts an invoice header and its lines in one transaction.
    ///
    /// ## Errors
    /// * `DbError::UniqueViolation` - the invoice number is already taken
    pub async fn insert(&self, invoice: &Invoice) -> DbResult<Invoice> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        let saved = insert_invoice(&mut *tx, invoice).await?;

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        Ok(saved)
    }

    /// Rewrites an invoice header and replaces its lines.
    ///
    /// The row keeps its position in the list.
    pub async fn update(&self, invoice: &Invoice) -> DbResult<()> {
        debug!(id = %invoice.id, status = ?invoice.status, "Updating invoice");

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        let result = sqlx::query(
            r#"
            UPDATE invoices SET
                invoice_number = ?2,
                customer_id = ?3,
                customer_name = ?4,
                date = ?5,
                due_date = ?6,
                status = ?7,
                sub_total_cents = ?8,
                total_tax_cents = ?9,
                total_discount_cents = ?10,
                grand_total_cents = ?11,
                balance_due_cents = ?12
            WHERE id = ?1
            "#,
        )
        .bind(&invoice.id)
        .bind(&invoice.invoice_number)
        .bind(&invoice.customer_id)
        .bind(&invoice.customer_name)
        .bind(invoice.date)
        .bind(invoice.due_date)
        .bind(invoice.status)
        .bind(invoice.sub_total.cents())
        .bind(invoice.total_tax.cents())
        .bind(invoice.total_discount.cents())
        .bind(invoice.grand_total.cents())
        .bind(invoice.balance_due.cents())
        .execute(&mut *tx)
        .await
        .map_err(|e| number_conflict(e, &invoice.invoice_number))?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Invoice", &invoice.id));
        }

        sqlx::query("DELETE FROM invoice_items WHERE invoice_id = ?1")
            .bind(&invoice.id)
            .execute(&mut *tx)
            .await?;
        insert_lines(&mut *tx, &invoice.id, &invoice.items).await?;

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        Ok(())
    }

    /// Deletes an invoice. Its lines go with it.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting invoice");

        let result = sqlx::query("DELETE FROM invoices WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Invoice", id));
        }

        Ok(())
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM invoices")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

/// Writes a header and its lines on an open connection (no transaction of
/// its own).
pub(crate) async fn insert_invoice(
    conn: &mut SqliteConnection,
    invoice: &Invoice,
) -> DbResult<Invoice> {
    let invoice = Invoice {
        id: ensure_id(&invoice.id),
        ..invoice.clone()
    };
    debug!(
        id = %invoice.id,
        invoice_number = %invoice.invoice_number,
        lines = invoice.items.len(),
        "Inserting invoice"
    );

    sqlx::query(
        r#"
        INSERT INTO invoices (
            id, invoice_number, customer_id, customer_name, date, due_date, status,
            sub_total_cents, total_tax_cents, total_discount_cents,
            grand_total_cents, balance_due_cents
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
        "#,
    )
    .bind(&invoice.id)
    .bind(&invoice.invoice_number)
    .bind(&invoice.customer_id)
    .bind(&invoice.customer_name)
    .bind(invoice.date)
    .bind(invoice.due_date)
    .bind(invoice.status)
    .bind(invoice.sub_total.cents())
    .bind(invoice.total_tax.cents())
    .bind(invoice.total_discount.cents())
    .bind(invoice.grand_total.cents())
    .bind(invoice.balance_due.cents())
    .execute(&mut *conn)
    .await
    .map_err(|e| number_conflict(e, &invoice.invoice_number))?;

    insert_lines(conn, &invoice.id, &invoice.items).await?;

    Ok(invoice)
}

async fn insert_lines(
    conn: &mut SqliteConnection,
    invoice_id: &str,
    items: &[InvoiceLineItem],
) -> DbResult<()> {
    for (line_no, line) in items.iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO invoice_items (
                invoice_id, line_no, item_id, name, quantity,
                rate_cents, discount_bps, tax_bps, amount_cents
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(invoice_id)
        .bind(line_no as i64)
        .bind(&line.item_id)
        .bind(&line.name)
        .bind(line.quantity)
        .bind(line.rate.cents())
        .bind(i64::from(line.discount_percent.bps()))
        .bind(i64::from(line.tax_percent.bps()))
        .bind(line.amount.cents())
        .execute(&mut *conn)
        .await?;
    }

    Ok(())
}

fn number_conflict(err: sqlx::Error, invoice_number: &str) -> DbError {
    match DbError::from(err) {
        DbError::UniqueViolation { .. } => DbError::duplicate("invoice_number", invoice_number),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use crate::pool::{Database, DbConfig};
    use crate::DbError;
    use tally_core::fixtures::seed_invoices;
    use tally_core::{InvoiceStatus, Money, Rate};

    async fn seeded() -> Database {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        // Reverse insertion so the listing matches fixture order.
        for invoice in seed_invoices().iter().rev() {
            db.invoices().insert(invoice).await.unwrap();
        }
        db
    }

    #[tokio::test]
    async fn test_list_newest_first_with_lines() {
        let db = seeded().await;

        let listed = db.invoices().list().await.unwrap();
        assert_eq!(listed, seed_invoices());
        assert_eq!(listed[0].items.len(), 2);
    }

    #[tokio::test]
    async fn test_fractional_totals_survive() {
        let db = seeded().await;

        let inv = db.invoices().get_by_id("inv_3").await.unwrap().unwrap();
        assert_eq!(inv.total_tax, Money::from_cents(593_750));
        assert_eq!(inv.grand_total, Money::from_cents(6_234_375));
        assert_eq!(inv.items[0].discount_percent, Rate::from_bps(500));
    }

    #[tokio::test]
    async fn test_get_by_number_and_customer() {
        let db = seeded().await;

        let inv = db.invoices().get_by_number("INV-2025-005").await.unwrap().unwrap();
        assert_eq!(inv.id, "inv_5");

        let for_customer = db.invoices().list_for_customer(&inv.customer_id).await.unwrap();
        assert!(for_customer.iter().all(|i| i.customer_id == inv.customer_id));
        assert!(for_customer.iter().any(|i| i.id == "inv_5"));
    }

    #[tokio::test]
    async fn test_update_replaces_lines() {
        let db = seeded().await;
        let mut inv = db.invoices().get_by_id("inv_1").await.unwrap().unwrap();
        inv.items.truncate(1);
        inv.status = InvoiceStatus::Overdue;

        db.invoices().update(&inv).await.unwrap();

        let stored = db.invoices().get_by_id("inv_1").await.unwrap().unwrap();
        assert_eq!(stored.items.len(), 1);
        assert_eq!(stored.status, InvoiceStatus::Overdue);
        // Position in the list is unchanged.
        let listed = db.invoices().list().await.unwrap();
        assert_eq!(listed[0].id, "inv_1");
    }

    #[tokio::test]
    async fn test_delete_cascades_lines() {
        let db = seeded().await;
        db.invoices().delete("inv_1").await.unwrap();

        let orphans: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM invoice_items WHERE invoice_id = 'inv_1'")
                .fetch_one(db.pool())
                .await
                .unwrap();
        assert_eq!(orphans, 0);
        assert_eq!(db.invoices().count().await.unwrap(), 4);
    }

    #[tokio::test]
    async fn test_duplicate_number_rejected() {
        let db = seeded().await;
        let mut clash = seed_invoices().remove(0);
        clash.id = String::new();

        let err = db.invoices().insert(&clash).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
        assert_eq!(db.invoices().count().await.unwrap(), 5);
    }
}
