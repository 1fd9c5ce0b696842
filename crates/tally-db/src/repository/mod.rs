//! # Repository Module
//!
//! Database repository implementations for Tally.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern                                   │
//! │                                                                         │
//! │  Caller                                                                │
//! │       │  db.items().apply_stock_receipt(&receipt.updated)              │
//! │       ▼                                                                 │
//! │  ItemRepository                                                        │
//! │  ├── list(&self)                                                       │
//! │  ├── get_by_id(&self, id)                                              │
//! │  ├── insert(&self, item)                                               │
//! │  ├── update(&self, item)                                               │
//! │  ├── delete(&self, id)                                                 │
//! │  └── apply_stock_receipt(&self, items)   ← one transaction             │
//! │       │                                                                 │
//! │       ▼  SQL                                                            │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Each repository keeps a `*Row` struct that mirrors the table and converts
//! into the domain type. Insert helpers that take a `&mut SqliteConnection`
//! are shared with [`crate::Database::replace_all`], which runs them inside a
//! single transaction.
//!
//! ## Available Repositories
//!
//! - [`CustomerRepository`](customer::CustomerRepository)
//! - [`SupplierRepository`](supplier::SupplierRepository)
//! - [`ItemRepository`](item::ItemRepository)
//! - [`InvoiceRepository`](invoice::InvoiceRepository)
//! - [`PaymentRepository`](payment::PaymentRepository)

pub mod customer;
pub mod invoice;
pub mod item;
pub mod payment;
pub mod supplier;

use uuid::Uuid;

/// Fills a blank id with a fresh UUID v4.
pub(crate) fn ensure_id(id: &str) -> String {
    if id.trim().is_empty() {
        Uuid::new_v4().to_string()
    } else {
        id.to_string()
    }
}
