//! # tally-core: Pure Business Logic for Tally
//!
//! This crate holds the ledger rules of the business back office: invoice
//! totals, receivables aging, goods-received-note (GRN) stock intake and
//! the in-memory entity store those rules mutate. It has zero I/O
//! dependencies; persistence lives in `tally-db`.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Tally Architecture                             │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    Any UI / API surface                         │   │
//! │  │   Dashboard ── Invoices/POS ── Inventory/GRN ── Payments        │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ store commands                         │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    tally-core (THIS CRATE)                      │   │
//! │  │   EntityStore • Cart/Totals • GrnDraft • Aging • Queries        │   │
//! │  │   NO I/O • NO DATABASE • NO CLOCK • PURE FUNCTIONS              │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    tally-db (Database Layer)                    │   │
//! │  │              SQLite load_all, repositories, seed                │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Customer, Item, Invoice, Payment, ...)
//! - [`money`] - Money type with integer arithmetic
//! - [`error`] - Domain error types
//! - [`validation`] - Required-field and numeric checks
//! - [`config`] - Ledger configuration (currency, tax and discount rates)
//! - [`totals`] - POS cart and invoice totals calculator
//! - [`aging`] - Receivables aging buckets and dashboard counts
//! - [`grn`] - Goods received note drafting and confirmation
//! - [`store`] - The entity store and its commands
//! - [`query`] - Search, sort and selection rules
//! - [`fixtures`] - Seed dataset
//!
//! ## Example Usage
//!
//! ```rust
//! use tally_core::money::Money;
//! use tally_core::types::Rate;
//!
//! let subtotal = Money::from_cents(100_000); // 1,000.00
//! let tax = subtotal.calculate_tax(Rate::from_bps(1000)); // 10%
//! assert_eq!(tax.cents(), 10_000);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod aging;
pub mod config;
pub mod error;
pub mod fixtures;
pub mod grn;
pub mod money;
pub mod query;
pub mod store;
pub mod totals;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use aging::{InvoiceStats, ReceivablesAging};
pub use config::LedgerConfig;
pub use error::{CoreError, CoreResult, ValidationError};
pub use grn::{GrnDraft, GrnLineInput, GrnLineItem, GrnReceipt, GrnRejected};
pub use money::Money;
pub use query::{ItemSelection, Selection, SortDirection};
pub use store::{CompletedSale, EntityStore, StoreSnapshot};
pub use totals::{Cart, InvoiceDraft, InvoiceTotals, Tender};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Customer id recorded on invoices raised without a registered customer.
pub const WALK_IN_CUSTOMER_ID: &str = "0";

/// Display name recorded on invoices raised without a registered customer.
pub const WALK_IN_CUSTOMER_NAME: &str = "Walk-in Customer";

/// Currency assigned to customers that do not specify one.
pub const DEFAULT_CURRENCY: &str = "LKR";

/// Category filter value that matches every item.
pub const CATEGORY_ALL: &str = "All";

/// Item categories offered by the inventory and POS screens.
pub const CATEGORIES: &[&str] = &[
    CATEGORY_ALL,
    "Electronics",
    "Stationery",
    "Beverage",
    "Services",
    "Furniture",
];

/// Largest quantity accepted on a single cart or GRN line.
pub const MAX_ITEM_QUANTITY: i64 = 99_999;

/// Lowest quantity a cart line can be decremented to.
///
/// Going below this requires removing the line explicitly.
pub const MIN_CART_QUANTITY: i64 = 1;
