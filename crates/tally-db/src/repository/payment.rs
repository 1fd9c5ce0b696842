//! # Payment Repository
//!
//! Database operations for payments received.
//!
//! `invoice_numbers` is stored as a JSON array in a TEXT column; the
//! referenced invoices are not joined or checked.

use chrono::NaiveDate;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::repository::ensure_id;
use tally_core::{Money, Payment, PaymentMode, PaymentStatus};

#[derive(Debug, sqlx::FromRow)]
struct PaymentRow {
    id: String,
    date: NaiveDate,
    payment_number: String,
    reference_number: String,
    customer_name: String,
    invoice_numbers: String,
    mode: PaymentMode,
    amount_cents: i64,
    unused_amount_cents: i64,
    status: PaymentStatus,
}

impl TryFrom<PaymentRow> for Payment {
    type Error = DbError;

    fn try_from(row: PaymentRow) -> Result<Self, Self::Error> {
        Ok(Payment {
            id: row.id,
            date: row.date,
            payment_number: row.payment_number,
            reference_number: row.reference_number,
            customer_name: row.customer_name,
            invoice_numbers: serde_json::from_str(&row.invoice_numbers)?,
            mode: row.mode,
            amount: Money::from_cents(row.amount_cents),
            unused_amount: Money::from_cents(row.unused_amount_cents),
            status: row.status,
        })
    }
}

const SELECT_PAYMENTS: &str = r#"
    SELECT
        id, date, payment_number, reference_number, customer_name,
        invoice_numbers, mode, amount_cents, unused_amount_cents, status
    FROM payments
"#;

/// Repository for payment database operations.
#[derive(Debug, Clone)]
pub struct PaymentRepository {
    pool: SqlitePool,
}

impl PaymentRepository {
    pub fn new(pool: SqlitePool) -> Self {
        PaymentRepository { pool }
    }

    pub async fn list(&self) -> DbResult<Vec<Payment>> {
        let rows = sqlx::query_as::<_, PaymentRow>(&format!("{SELECT_PAYMENTS} ORDER BY rowid"))
            .fetch_all(&self.pool)
            .await?;

        debug!(count = rows.len(), "Listed payments");
        rows.into_iter().map(Payment::try_from).collect()
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Payment>> {
        let row = sqlx::query_as::<_, PaymentRow>(&format!("{SELECT_PAYMENTS} WHERE id = ?1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(Payment::try_from).transpose()
    }

    /// Payments made by a customer, matched on the recorded name.
    pub async fn list_for_customer(&self, customer_name: &str) -> DbResult<Vec<Payment>> {
        let rows = sqlx::query_as::<_, PaymentRow>(&format!(
            "{SELECT_PAYMENTS} WHERE customer_name = ?1 ORDER BY rowid"
        ))
        .bind(customer_name)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Payment::try_from).collect()
    }

    /// Inserts a payment.
    ///
    /// ## Errors
    /// * `DbError::UniqueViolation` - the payment number is already taken
    pub async fn insert(&self, payment: &Payment) -> DbResult<Payment> {
        let mut conn = self.pool.acquire().await?;
        insert_payment(&mut *conn, payment).await
    }

    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting payment");

        let result = sqlx::query("DELETE FROM payments WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Payment", id));
        }

        Ok(())
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM payments")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

pub(crate) async fn insert_payment(
    conn: &mut SqliteConnection,
    payment: &Payment,
) -> DbResult<Payment> {
    let payment = Payment {
        id: ensure_id(&payment.id),
        ..payment.clone()
    };
    debug!(
        id = %payment.id,
        payment_number = %payment.payment_number,
        amount = payment.amount.cents(),
        "Inserting payment"
    );

    let invoice_numbers = serde_json::to_string(&payment.invoice_numbers)?;

    sqlx::query(
        r#"
        INSERT INTO payments (
            id, date, payment_number, reference_number, customer_name,
            invoice_numbers, mode, amount_cents, unused_amount_cents, status
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
        "#,
    )
    .bind(&payment.id)
    .bind(payment.date)
    .bind(&payment.payment_number)
    .bind(&payment.reference_number)
    .bind(&payment.customer_name)
    .bind(invoice_numbers)
    .bind(payment.mode)
    .bind(payment.amount.cents())
    .bind(payment.unused_amount.cents())
    .bind(payment.status)
    .execute(&mut *conn)
    .await
    .map_err(|e| match DbError::from(e) {
        DbError::UniqueViolation { .. } => {
            DbError::duplicate("payment_number", &payment.payment_number)
        }
        other => other,
    })?;

    Ok(payment)
}

#[cfg(test)]
mod tests {
    use crate::pool::{Database, DbConfig};
    use crate::DbError;
    use tally_core::fixtures::seed_payments;
    use tally_core::{Money, PaymentMode};

    async fn seeded() -> Database {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        for payment in seed_payments() {
            db.payments().insert(&payment).await.unwrap();
        }
        db
    }

    #[tokio::test]
    async fn test_list_round_trips_invoice_numbers() {
        let db = seeded().await;

        let listed = db.payments().list().await.unwrap();
        assert_eq!(listed, seed_payments());

        let first = &listed[0];
        assert_eq!(first.invoice_numbers, ["INV-2025-001"]);
        assert_eq!(first.mode, PaymentMode::BankTransfer);
        assert_eq!(first.amount, Money::from_major(348_700));
    }

    #[tokio::test]
    async fn test_list_for_customer() {
        let db = seeded().await;

        let alex = db.payments().list_for_customer("Alex Johnson").await.unwrap();
        assert!(!alex.is_empty());
        assert!(alex.iter().all(|p| p.customer_name == "Alex Johnson"));
    }

    #[tokio::test]
    async fn test_corrupt_invoice_numbers_is_serialization_error() {
        let db = seeded().await;
        sqlx::query("UPDATE payments SET invoice_numbers = 'oops' WHERE id = 'pay_1'")
            .execute(db.pool())
            .await
            .unwrap();

        let err = db.payments().get_by_id("pay_1").await.unwrap_err();
        assert!(matches!(err, DbError::Serialization(_)));
    }

    #[tokio::test]
    async fn test_duplicate_number_and_delete() {
        let db = seeded().await;
        let mut clash = seed_payments().remove(0);
        clash.id = String::new();

        let err = db.payments().insert(&clash).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));

        db.payments().delete("pay_1").await.unwrap();
        assert!(db.payments().get_by_id("pay_1").await.unwrap().is_none());
    }
}
