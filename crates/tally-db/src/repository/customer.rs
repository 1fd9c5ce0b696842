//! # Customer Repository
//!
//! Database operations for customers.

use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::repository::ensure_id;
use tally_core::{Customer, CustomerStatus, CustomerType, Money, PaymentTerms};

#[derive(Debug, sqlx::FromRow)]
struct CustomerRow {
    id: String,
    salutation: Option<String>,
    first_name: Option<String>,
    last_name: Option<String>,
    name: String,
    company_name: Option<String>,
    email: String,
    phone: String,
    mobile: Option<String>,
    currency: String,
    website: Option<String>,
    receivables_cents: i64,
    unused_credits_cents: i64,
    customer_type: CustomerType,
    status: CustomerStatus,
    remarks: Option<String>,
    payment_terms: PaymentTerms,
}

impl From<CustomerRow> for Customer {
    fn from(row: CustomerRow) -> Self {
        Customer {
            id: row.id,
            salutation: row.salutation,
            first_name: row.first_name,
            last_name: row.last_name,
            name: row.name,
            company_name: row.company_name,
            email: row.email,
            phone: row.phone,
            mobile: row.mobile,
            currency: row.currency,
            website: row.website,
            receivables: Money::from_cents(row.receivables_cents),
            unused_credits: Money::from_cents(row.unused_credits_cents),
            customer_type: row.customer_type,
            status: row.status,
            remarks: row.remarks,
            payment_terms: row.payment_terms,
        }
    }
}

const SELECT_CUSTOMERS: &str = r#"
    SELECT
        id, salutation, first_name, last_name, name, company_name,
        email, phone, mobile, currency, website,
        receivables_cents, unused_credits_cents,
        customer_type, status, remarks, payment_terms
    FROM customers
"#;

/// Repository for customer database operations.
#[derive(Debug, Clone)]
pub struct CustomerRepository {
    pool: SqlitePool,
}

impl CustomerRepository {
    pub fn new(pool: SqlitePool) -> Self {
        CustomerRepository { pool }
    }

    /// All customers in insertion order.
    pub async fn list(&self) -> DbResult<Vec<Customer>> {
        let rows = sqlx::query_as::<_, CustomerRow>(&format!("{SELECT_CUSTOMERS} ORDER BY rowid"))
            .fetch_all(&self.pool)
            .await?;

        debug!(count = rows.len(), "Listed customers");
        Ok(rows.into_iter().map(Customer::from).collect())
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Customer>> {
        let row = sqlx::query_as::<_, CustomerRow>(&format!("{SELECT_CUSTOMERS} WHERE id = ?1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Customer::from))
    }

    /// Inserts a customer. A blank id is replaced with a new UUID.
    pub async fn insert(&self, customer: &Customer) -> DbResult<Customer> {
        let mut conn = self.pool.acquire().await?;
        insert_customer(&mut *conn, customer).await
    }

    pub async fn update(&self, customer: &Customer) -> DbResult<()> {
        debug!(id = %customer.id, "Updating customer");

        let result = sqlx::query(
            r#"
            UPDATE customers SET
                salutation = ?2,
                first_name = ?3,
                last_name = ?4,
                name = ?5,
                company_name = ?6,
                email = ?7,
                phone = ?8,
                mobile = ?9,
                currency = ?10,
                website = ?11,
                receivables_cents = ?12,
                unused_credits_cents = ?13,
                customer_type = ?14,
                status = ?15,
                remarks = ?16,
                payment_terms = ?17
            WHERE id = ?1
            "#,
        )
        .bind(&customer.id)
        .bind(&customer.salutation)
        .bind(&customer.first_name)
        .bind(&customer.last_name)
        .bind(&customer.name)
        .bind(&customer.company_name)
        .bind(&customer.email)
        .bind(&customer.phone)
        .bind(&customer.mobile)
        .bind(&customer.currency)
        .bind(&customer.website)
        .bind(customer.receivables.cents())
        .bind(customer.unused_credits.cents())
        .bind(customer.customer_type)
        .bind(customer.status)
        .bind(&customer.remarks)
        .bind(customer.payment_terms)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Customer", &customer.id));
        }

        Ok(())
    }

    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting customer");

        let result = sqlx::query("DELETE FROM customers WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Customer", id));
        }

        Ok(())
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM customers")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

pub(crate) async fn insert_customer(
    conn: &mut SqliteConnection,
    customer: &Customer,
) -> DbResult<Customer> {
    let customer = Customer {
        id: ensure_id(&customer.id),
        ..customer.clone()
    };
    debug!(id = %customer.id, name = %customer.name, "Inserting customer");

    sqlx::query(
        r#"
        INSERT INTO customers (
            id, salutation, first_name, last_name, name, company_name,
            email, phone, mobile, currency, website,
            receivables_cents, unused_credits_cents,
            customer_type, status, remarks, payment_terms
        ) VALUES (
            ?1, ?2, ?3, ?4, ?5, ?6,
            ?7, ?8, ?9, ?10, ?11,
            ?12, ?13,
            ?14, ?15, ?16, ?17
        )
        "#,
    )
    .bind(&customer.id)
    .bind(&customer.salutation)
    .bind(&customer.first_name)
    .bind(&customer.last_name)
    .bind(&customer.name)
    .bind(&customer.company_name)
    .bind(&customer.email)
    .bind(&customer.phone)
    .bind(&customer.mobile)
    .bind(&customer.currency)
    .bind(&customer.website)
    .bind(customer.receivables.cents())
    .bind(customer.unused_credits.cents())
    .bind(customer.customer_type)
    .bind(customer.status)
    .bind(&customer.remarks)
    .bind(customer.payment_terms)
    .execute(&mut *conn)
    .await?;

    Ok(customer)
}
