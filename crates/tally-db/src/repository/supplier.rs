//! # Supplier Repository
//!
//! Database operations for suppliers.

use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::repository::ensure_id;
use tally_core::Supplier;

#[derive(Debug, sqlx::FromRow)]
struct SupplierRow {
    id: String,
    name: String,
    contact_person: String,
    address: String,
    phone: String,
    mobile: String,
    email: String,
}

impl From<SupplierRow> for Supplier {
    fn from(row: SupplierRow) -> Self {
        Supplier {
            id: row.id,
            name: row.name,
            contact_person: row.contact_person,
            address: row.address,
            phone: row.phone,
            mobile: row.mobile,
            email: row.email,
        }
    }
}

/// Repository for supplier database operations.
#[derive(Debug, Clone)]
pub struct SupplierRepository {
    pool: SqlitePool,
}

impl SupplierRepository {
    pub fn new(pool: SqlitePool) -> Self {
        SupplierRepository { pool }
    }

    pub async fn list(&self) -> DbResult<Vec<Supplier>> {
        let rows = sqlx::query_as::<_, SupplierRow>(
            r#"
            SELECT id, name, contact_person, address, phone, mobile, email
            FROM suppliers
            ORDER BY rowid
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        debug!(count = rows.len(), "Listed suppliers");
        Ok(rows.into_iter().map(Supplier::from).collect())
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Supplier>> {
        let row = sqlx::query_as::<_, SupplierRow>(
            r#"
            SELECT id, name, contact_person, address, phone, mobile, email
            FROM suppliers
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Supplier::from))
    }

    pub async fn insert(&self, supplier: &Supplier) -> DbResult<Supplier> {
        let mut conn = self.pool.acquire().await?;
        insert_supplier(&mut *conn, supplier).await
    }

    pub async fn update(&self, supplier: &Supplier) -> DbResult<()> {
        debug!(id = %supplier.id, "Updating supplier");

        let result = sqlx::query(
            r#"
            UPDATE suppliers SET
                name = ?2,
                contact_person = ?3,
                address = ?4,
                phone = ?5,
                mobile = ?6,
                email = ?7
            WHERE id = ?1
            "#,
        )
        .bind(&supplier.id)
        .bind(&supplier.name)
        .bind(&supplier.contact_person)
        .bind(&supplier.address)
        .bind(&supplier.phone)
        .bind(&supplier.mobile)
        .bind(&supplier.email)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Supplier", &supplier.id));
        }

        Ok(())
    }

    /// Deletes a supplier. Items naming it keep their supplier text.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting supplier");

        let result = sqlx::query("DELETE FROM suppliers WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Supplier", id));
        }

        Ok(())
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM suppliers")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

pub(crate) async fn insert_supplier(
    conn: &mut SqliteConnection,
    supplier: &Supplier,
) -> DbResult<Supplier> {
    let supplier = Supplier {
        id: ensure_id(&supplier.id),
        ..supplier.clone()
    };
    debug!(id = %supplier.id, name = %supplier.name, "Inserting supplier");

    sqlx::query(
        r#"
        INSERT INTO suppliers (id, name, contact_person, address, phone, mobile, email)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        "#,
    )
    .bind(&supplier.id)
    .bind(&supplier.name)
    .bind(&supplier.contact_person)
    .bind(&supplier.address)
    .bind(&supplier.phone)
    .bind(&supplier.mobile)
    .bind(&supplier.email)
    .execute(&mut *conn)
    .await?;

    Ok(supplier)
}
