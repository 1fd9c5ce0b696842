//! # Database Pool Management
//!
//! Connection pool creation and whole-store load/replace for SQLite.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Database Connection Pool                           │
//! │                                                                         │
//! │  App / seed startup                                                    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  DbConfig::new(path) ← Configure pool settings                         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Database::new(config).await ← Create pool + run migrations            │
//! │       │                                                                 │
//! │       ├──► db.load_all()      → StoreSnapshot → EntityStore            │
//! │       ├──► db.items() / db.invoices() / ...  (single-entity writes)    │
//! │       └──► db.replace_all(&store.snapshot())  (one transaction)        │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## WAL Mode
//! File databases run in WAL mode so readers don't block the writer.
//! In-memory databases use a single connection and keep their journal in
//! memory; closing that connection drops the data.

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::migrations;
use crate::repository::customer::{insert_customer, CustomerRepository};
use crate::repository::invoice::{insert_invoice, InvoiceRepository};
use crate::repository::item::{insert_item, ItemRepository};
use crate::repository::payment::{insert_payment, PaymentRepository};
use crate::repository::supplier::{insert_supplier, SupplierRepository};
use tally_core::StoreSnapshot;

const IN_MEMORY: &str = ":memory:";

// =============================================================================
// Configuration
// =============================================================================

/// Database configuration.
///
/// ## Example
/// ```rust,ignore
/// let config = DbConfig::new("./tally.db")
///     .max_connections(5)
///     .min_connections(1);
/// ```
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// Path to the SQLite database file, or `:memory:`.
    pub database_path: PathBuf,

    /// Maximum number of connections in the pool.
    /// Default: 5
    pub max_connections: u32,

    /// Minimum number of connections to keep alive.
    /// Default: 1
    pub min_connections: u32,

    /// Connection timeout duration.
    /// Default: 30 seconds
    pub connect_timeout: Duration,

    /// Idle timeout before closing a connection. `None` keeps connections
    /// open for the life of the pool.
    /// Default: 10 minutes
    pub idle_timeout: Option<Duration>,

    /// Whether to run migrations on connect.
    /// Default: true
    pub run_migrations: bool,
}

impl DbConfig {
    /// Creates a configuration for a file database. The file is created if
    /// it doesn't exist.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        DbConfig {
            database_path: path.into(),
            max_connections: 5,
            min_connections: 1,
            connect_timeout: Duration::from_secs(30),
            idle_timeout: Some(Duration::from_secs(600)),
            run_migrations: true,
        }
    }

    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    pub fn min_connections(mut self, min: u32) -> Self {
        self.min_connections = min;
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn run_migrations(mut self, run: bool) -> Self {
        self.run_migrations = run;
        self
    }

    /// Creates an isolated in-memory database configuration (for tests).
    ///
    /// Each in-memory connection is its own database, so the pool holds
    /// exactly one connection and never lets it idle out.
    pub fn in_memory() -> Self {
        DbConfig {
            database_path: PathBuf::from(IN_MEMORY),
            max_connections: 1,
            min_connections: 1,
            connect_timeout: Duration::from_secs(5),
            idle_timeout: None,
            run_migrations: true,
        }
    }

    pub fn is_in_memory(&self) -> bool {
        self.database_path.as_os_str() == IN_MEMORY
    }

    fn connect_options(&self) -> DbResult<SqliteConnectOptions> {
        let options = if self.is_in_memory() {
            SqliteConnectOptions::from_str("sqlite::memory:")
                .map_err(|e| DbError::ConnectionFailed(e.to_string()))?
                .journal_mode(SqliteJournalMode::Memory)
        } else {
            // mode=rwc creates the file if it doesn't exist
            let connect_url = format!("sqlite://{}?mode=rwc", self.database_path.display());
            SqliteConnectOptions::from_str(&connect_url)
                .map_err(|e| DbError::ConnectionFailed(e.to_string()))?
                .journal_mode(SqliteJournalMode::Wal)
                .create_if_missing(true)
        };

        Ok(options
            .synchronous(SqliteSynchronous::Normal)
            // Off by default in SQLite; invoice lines cascade on delete.
            .foreign_keys(true))
    }
}

// =============================================================================
// Database
// =============================================================================

/// Main database handle providing repository access.
///
/// Cheap to clone; clones share the pool.
///
/// ## Usage
/// ```rust,ignore
/// let db = Database::new(DbConfig::new("./tally.db")).await?;
/// let mut store = EntityStore::from_snapshot(db.load_all().await?, LedgerConfig::from_env());
///
/// let receipt = draft.confirm(&mut store, &mut selection)?;
/// db.items().apply_stock_receipt(&receipt.updated).await?;
/// ```
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Creates the connection pool and runs migrations (if enabled).
    ///
    /// ## Returns
    /// * `Ok(Database)` - Ready-to-use database handle
    /// * `Err(DbError)` - Connection or migration failed
    pub async fn new(config: DbConfig) -> DbResult<Self> {
        info!(
            path = %config.database_path.display(),
            in_memory = config.is_in_memory(),
            "Initializing database connection"
        );

        let connect_options = config.connect_options()?;
        debug!("Connection options configured");

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(config.connect_timeout)
            .idle_timeout(config.idle_timeout)
            .max_lifetime(if config.is_in_memory() {
                None
            } else {
                Some(Duration::from_secs(30 * 60))
            })
            .connect_with(connect_options)
            .await
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?;

        info!(
            max_connections = config.max_connections,
            "Database pool created"
        );

        let db = Database { pool };

        if config.run_migrations {
            db.run_migrations().await?;
        }

        Ok(db)
    }

    /// Applies all pending migrations. Idempotent.
    ///
    /// Called by `new()` when `run_migrations` is set.
    pub async fn run_migrations(&self) -> DbResult<()> {
        info!("Running database migrations");
        migrations::run_migrations(&self.pool).await?;
        info!("Migrations complete");
        Ok(())
    }

    /// Returns a reference to the connection pool.
    ///
    /// For queries not covered by repositories.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn customers(&self) -> CustomerRepository {
        CustomerRepository::new(self.pool.clone())
    }

    pub fn suppliers(&self) -> SupplierRepository {
        SupplierRepository::new(self.pool.clone())
    }

    pub fn items(&self) -> ItemRepository {
        ItemRepository::new(self.pool.clone())
    }

    pub fn invoices(&self) -> InvoiceRepository {
        InvoiceRepository::new(self.pool.clone())
    }

    pub fn payments(&self) -> PaymentRepository {
        PaymentRepository::new(self.pool.clone())
    }

    /// Reads every collection into a snapshot the entity store can be
    /// built from. Invoices come back newest first, everything else in
    /// insertion order.
    pub async fn load_all(&self) -> DbResult<StoreSnapshot> {
        let snapshot = StoreSnapshot {
            customers: self.customers().list().await?,
            items: self.items().list().await?,
            suppliers: self.suppliers().list().await?,
            invoices: self.invoices().list().await?,
            payments: self.payments().list().await?,
        };

        info!(
            customers = snapshot.customers.len(),
            items = snapshot.items.len(),
            suppliers = snapshot.suppliers.len(),
            invoices = snapshot.invoices.len(),
            payments = snapshot.payments.len(),
            "Loaded store snapshot"
        );

        Ok(snapshot)
    }

    /// Replaces the whole database content with `snapshot`, in one
    /// transaction. On error nothing is changed.
    ///
    /// A following [`Database::load_all`] returns the same snapshot.
    pub async fn replace_all(&self, snapshot: &StoreSnapshot) -> DbResult<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        for table in ["invoice_items", "invoices", "payments", "items", "suppliers", "customers"] {
            sqlx::query(&format!("DELETE FROM {table}"))
                .execute(&mut *tx)
                .await?;
        }

        for customer in &snapshot.customers {
            insert_customer(&mut *tx, customer).await?;
        }
        for supplier in &snapshot.suppliers {
            insert_supplier(&mut *tx, supplier).await?;
        }
        for item in &snapshot.items {
            insert_item(&mut *tx, item).await?;
        }
        // Listed newest first, so the first invoice must get the highest rowid.
        for invoice in snapshot.invoices.iter().rev() {
            insert_invoice(&mut *tx, invoice).await?;
        }
        for payment in &snapshot.payments {
            insert_payment(&mut *tx, payment).await?;
        }

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        info!(
            customers = snapshot.customers.len(),
            items = snapshot.items.len(),
            invoices = snapshot.invoices.len(),
            "Replaced store contents"
        );
        Ok(())
    }

    /// `true` when no customer, item, supplier, invoice or payment exists.
    pub async fn is_empty(&self) -> DbResult<bool> {
        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT
                (SELECT COUNT(*) FROM customers) +
                (SELECT COUNT(*) FROM items) +
                (SELECT COUNT(*) FROM suppliers) +
                (SELECT COUNT(*) FROM invoices) +
                (SELECT COUNT(*) FROM payments)
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(total == 0)
    }

    /// Closes the pool. Repository calls fail afterwards.
    pub async fn close(&self) {
        info!("Closing database connection pool");
        self.pool.close().await;
    }

    pub async fn health_check(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use tally_core::fixtures::seed_snapshot;
    use tally_core::{EntityStore, GrnDraft, InvoiceDraft, ItemSelection, LedgerConfig, Money};

    async fn db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    #[tokio::test]
    async fn test_in_memory_database() {
        let db = db().await;

        assert!(db.health_check().await);
        assert!(db.is_empty().await.unwrap());
    }

    #[test]
    fn test_config_builder() {
        let config = DbConfig::new("/tmp/tally.db")
            .max_connections(10)
            .min_connections(2);

        assert_eq!(config.max_connections, 10);
        assert_eq!(config.min_connections, 2);
        assert!(!config.is_in_memory());
        assert!(DbConfig::in_memory().is_in_memory());
    }

    #[tokio::test]
    async fn test_seed_snapshot_round_trip() {
        let db = db().await;
        db.replace_all(&seed_snapshot()).await.unwrap();

        assert!(!db.is_empty().await.unwrap());
        assert_eq!(db.load_all().await.unwrap(), seed_snapshot());
    }

    #[tokio::test]
    async fn test_replace_all_overwrites() {
        let db = db().await;
        db.replace_all(&seed_snapshot()).await.unwrap();

        let mut smaller = seed_snapshot();
        smaller.invoices.truncate(2);
        smaller.payments.clear();
        db.replace_all(&smaller).await.unwrap();

        let loaded = db.load_all().await.unwrap();
        assert_eq!(loaded, smaller);
        assert_eq!(db.invoices().count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_replace_all_rolls_back_on_conflict() {
        let db = db().await;
        db.replace_all(&seed_snapshot()).await.unwrap();

        let mut broken = seed_snapshot();
        let mut twin = broken.items[0].clone();
        twin.id = "item_twin".to_string();
        broken.items.push(twin);

        let err = db.replace_all(&broken).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
        assert_eq!(db.load_all().await.unwrap(), seed_snapshot());
    }

    #[tokio::test]
    async fn test_new_invoice_listed_first_after_save() {
        let db = db().await;
        db.replace_all(&seed_snapshot()).await.unwrap();

        let snapshot = db.load_all().await.unwrap();
        let mut store = EntityStore::from_snapshot(snapshot, LedgerConfig::default());
        let date = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
        let mut draft = InvoiceDraft::new(date);
        let mouse = store.item("item_2").unwrap().clone();
        draft.cart.add_item(&mouse).unwrap();
        let number = store.hold(&draft).unwrap().invoice_number.clone();

        db.replace_all(&store.snapshot()).await.unwrap();

        let loaded = db.load_all().await.unwrap();
        assert_eq!(loaded.invoices[0].invoice_number, number);
        assert_eq!(loaded, store.snapshot());
    }

    #[tokio::test]
    async fn test_confirmed_grn_persists_stock() {
        let db = db().await;
        db.replace_all(&seed_snapshot()).await.unwrap();

        let snapshot = db.load_all().await.unwrap();
        let mut store = EntityStore::from_snapshot(snapshot, LedgerConfig::default());
        let mut selection = ItemSelection::new();
        let laptop = store.item("item_1").unwrap().clone();

        let mut draft = GrnDraft::new(NaiveDate::from_ymd_opt(2025, 3, 1).unwrap());
        let mut input = draft.line_input_for(&laptop);
        input.quantity = 5;
        input.unit_cost = Money::from_major(100);
        draft.add_line(store.items(), input).unwrap();

        let receipt = draft.confirm(&mut store, &mut selection).unwrap();
        let written = db.items().apply_stock_receipt(&receipt.updated).await.unwrap();
        assert_eq!(written, 1);

        let stored = db.items().get_by_id("item_1").await.unwrap().unwrap();
        assert_eq!(stored.stock_qty, 30);
        assert_eq!(stored.cost, Money::from_major(100));
        assert_eq!(db.load_all().await.unwrap(), store.snapshot());
    }
}
