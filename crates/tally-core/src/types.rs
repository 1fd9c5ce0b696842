//! # Domain Types
//!
//! Core domain types used throughout Tally.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Customer     │   │     Invoice     │   │    Payment      │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id             │◄──│  customer_id    │   │  payment_number │       │
//! │  │  name           │   │  invoice_number │◄──│  invoice_numbers│       │
//! │  │  receivables    │   │  items[]        │   │  amount         │       │
//! │  │  payment_terms  │   │  balance_due    │   │  unused_amount  │       │
//! │  └─────────────────┘   └────────┬────────┘   └─────────────────┘       │
//! │                                 │ item_id                               │
//! │  ┌─────────────────┐   ┌────────▼────────┐                             │
//! │  │    Supplier     │   │      Item       │                             │
//! │  │  ─────────────  │   │  ─────────────  │                             │
//! │  │  name ◄─────────┼───│  supplier       │                             │
//! │  │  contact_person │   │  stock_qty/cost │ ◄── GRN confirmation        │
//! │  └─────────────────┘   └─────────────────┘                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Items reference suppliers by display name, invoices reference customers
//! by id and carry a name snapshot, payments reference invoices by number.
//! None of these references are enforced.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;

// =============================================================================
// Rate
// =============================================================================

/// A percentage represented in basis points (bps).
///
/// 1 basis point = 0.01%, so 1000 bps = 10% and 500 bps = 5%.
/// Used for the flat invoice tax and discount and for per-line percents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Rate(u32);

impl Rate {
    /// Creates a rate from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        Rate(bps)
    }

    /// Creates a rate from a percentage (for convenience).
    pub fn from_percentage(pct: f64) -> Self {
        Rate((pct * 100.0).round() as u32)
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a percentage (for display only).
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Zero rate.
    #[inline]
    pub const fn zero() -> Self {
        Rate(0)
    }

    /// Checks if the rate is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl Default for Rate {
    fn default() -> Self {
        Rate::zero()
    }
}

// =============================================================================
// Customer
// =============================================================================

/// Whether a customer is a company or a private person.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[ts(export)]
pub enum CustomerType {
    #[default]
    Business,
    Individual,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[ts(export)]
pub enum CustomerStatus {
    #[default]
    Active,
    Inactive,
}

/// Payment terms agreed with a customer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[ts(export)]
pub enum PaymentTerms {
    #[default]
    #[serde(rename = "Due on Receipt")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "Due on Receipt"))]
    DueOnReceipt,
    #[serde(rename = "Net 15")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "Net 15"))]
    Net15,
    #[serde(rename = "Net 30")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "Net 30"))]
    Net30,
    #[serde(rename = "Net 45")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "Net 45"))]
    Net45,
    #[serde(rename = "Net 60")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "Net 60"))]
    Net60,
}

/// A customer that invoices are raised against.
///
/// `receivables` and `unused_credits` are stored figures. They are not
/// recomputed from the invoice ledger; see
/// [`crate::aging::reconcile_receivables`] for the comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Customer {
    /// Empty until the store assigns one on insert.
    pub id: String,
    pub salutation: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    /// Display name (required).
    pub name: String,
    pub company_name: Option<String>,
    pub email: String,
    /// Work phone.
    pub phone: String,
    pub mobile: Option<String>,
    pub currency: String,
    pub website: Option<String>,
    pub receivables: Money,
    pub unused_credits: Money,
    #[serde(rename = "type")]
    pub customer_type: CustomerType,
    pub status: CustomerStatus,
    pub remarks: Option<String>,
    pub payment_terms: PaymentTerms,
}

impl Customer {
    /// Creates a customer with the given display name and default settings.
    pub fn new(name: impl Into<String>, customer_type: CustomerType) -> Self {
        Customer {
            id: String::new(),
            salutation: None,
            first_name: None,
            last_name: None,
            name: name.into(),
            company_name: None,
            email: String::new(),
            phone: String::new(),
            mobile: None,
            currency: crate::DEFAULT_CURRENCY.to_string(),
            website: None,
            receivables: Money::zero(),
            unused_credits: Money::zero(),
            customer_type,
            status: CustomerStatus::Active,
            remarks: None,
            payment_terms: PaymentTerms::DueOnReceipt,
        }
    }

    /// Returns an unsaved copy named "<name> (Copy)".
    pub fn duplicate(&self) -> Customer {
        Customer {
            id: String::new(),
            name: format!("{} (Copy)", self.name),
            ..self.clone()
        }
    }
}

// =============================================================================
// Supplier
// =============================================================================

/// A vendor goods are received from.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Supplier {
    pub id: String,
    /// Required.
    pub name: String,
    pub contact_person: String,
    pub address: String,
    pub phone: String,
    pub mobile: String,
    pub email: String,
}

// =============================================================================
// Item
// =============================================================================

/// An entry in the item master.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Item {
    pub id: String,
    /// Stock Keeping Unit (required).
    pub sku: String,
    /// Required.
    pub name: String,
    pub description: String,
    pub category: String,
    /// Units on hand. Only GRN confirmation and explicit saves change it.
    pub stock_qty: i64,
    /// Unit of measure ("Unit", "Pack", "Kg", ...).
    pub unit: String,
    /// Last received unit cost.
    pub cost: Money,
    /// Selling price.
    pub price: Money,
    pub image_url: Option<String>,
    /// Supplier display name.
    pub supplier: Option<String>,
}

impl Item {
    /// Creates an item with no stock, zero cost and price.
    pub fn new(sku: impl Into<String>, name: impl Into<String>) -> Self {
        Item {
            id: String::new(),
            sku: sku.into(),
            name: name.into(),
            description: String::new(),
            category: "Beverage".to_string(),
            stock_qty: 0,
            unit: "Unit".to_string(),
            cost: Money::zero(),
            price: Money::zero(),
            image_url: None,
            supplier: None,
        }
    }

    /// Returns an unsaved copy with "(Copy)" / "-COPY" suffixes.
    pub fn duplicate(&self) -> Item {
        Item {
            id: String::new(),
            name: format!("{} (Copy)", self.name),
            sku: format!("{}-COPY", self.sku),
            ..self.clone()
        }
    }
}

// =============================================================================
// Invoice Status
// =============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "UPPERCASE"))]
#[serde(rename_all = "UPPERCASE")]
#[ts(export)]
pub enum InvoiceStatus {
    /// Held at the POS, not yet issued.
    #[default]
    Draft,
    /// Issued and awaiting payment.
    Pending,
    /// Past its due date.
    Overdue,
    /// Fully paid.
    Paid,
}

// =============================================================================
// Invoice Line Item
// =============================================================================

/// A line on an invoice (and in the POS cart).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct InvoiceLineItem {
    pub item_id: String,
    /// Item name at time of sale (frozen).
    pub name: String,
    pub quantity: i64,
    /// Unit price at time of sale (frozen).
    pub rate: Money,
    pub discount_percent: Rate,
    pub tax_percent: Rate,
    /// `quantity × rate`.
    pub amount: Money,
}

impl InvoiceLineItem {
    /// A single unit of `item` at its selling price.
    pub fn for_item(item: &Item) -> Self {
        InvoiceLineItem {
            item_id: item.id.clone(),
            name: item.name.clone(),
            quantity: 1,
            rate: item.price,
            discount_percent: Rate::zero(),
            tax_percent: Rate::zero(),
            amount: item.price,
        }
    }

    /// Sets the quantity and re-derives `amount`. The line is unchanged if
    /// the amount overflows.
    pub fn set_quantity(&mut self, quantity: i64) -> CoreResult<()> {
        self.amount = self
            .rate
            .checked_multiply_quantity(quantity)
            .ok_or_else(|| CoreError::Overflow(format!("amount for {}", self.name)))?;
        self.quantity = quantity;
        Ok(())
    }
}

// =============================================================================
// Invoice
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Invoice {
    pub id: String,
    /// Business identifier, e.g. `INV-2025-005`.
    pub invoice_number: String,
    pub customer_id: String,
    /// Customer name at time of invoicing (frozen).
    pub customer_name: String,
    #[ts(as = "String")]
    pub date: NaiveDate,
    #[ts(as = "String")]
    pub due_date: NaiveDate,
    pub status: InvoiceStatus,
    pub items: Vec<InvoiceLineItem>,
    pub sub_total: Money,
    pub total_tax: Money,
    pub total_discount: Money,
    /// `sub_total + total_tax − total_discount`.
    pub grand_total: Money,
    pub balance_due: Money,
}

impl Invoice {
    #[inline]
    pub fn is_paid(&self) -> bool {
        self.status == InvoiceStatus::Paid
    }

    /// Total units across all lines.
    pub fn total_quantity(&self) -> i64 {
        self.items.iter().map(|line| line.quantity).sum()
    }
}

// =============================================================================
// Payment
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[ts(export)]
pub enum PaymentMode {
    #[serde(rename = "Bank Transfer")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "Bank Transfer"))]
    BankTransfer,
    Cash,
    Cheque,
    #[serde(rename = "Credit Card")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "Credit Card"))]
    CreditCard,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "UPPERCASE"))]
#[serde(rename_all = "UPPERCASE")]
#[ts(export)]
pub enum PaymentStatus {
    #[default]
    Paid,
    Partial,
    Void,
}

/// A payment received from a customer.
///
/// `invoice_numbers` is informational: the amount is not allocated against
/// invoice balances.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Payment {
    pub id: String,
    #[ts(as = "String")]
    pub date: NaiveDate,
    pub payment_number: String,
    /// Bank transaction, cheque or card reference.
    pub reference_number: String,
    pub customer_name: String,
    pub invoice_numbers: Vec<String>,
    pub mode: PaymentMode,
    pub amount: Money,
    /// Part of the amount not applied to any invoice (advance / credit).
    pub unused_amount: Money,
    pub status: PaymentStatus,
}

impl Payment {
    /// The amount shown against each referenced invoice: an even split.
    ///
    /// Returns `None` for payments that reference no invoice.
    pub fn allocation_per_invoice(&self) -> Option<Money> {
        self.amount.split_evenly(self.invoice_numbers.len())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_from_bps() {
        let rate = Rate::from_bps(1000);
        assert_eq!(rate.bps(), 1000);
        assert!((rate.percentage() - 10.0).abs() < 0.001);
    }

    #[test]
    fn test_rate_from_percentage() {
        assert_eq!(Rate::from_percentage(5.0).bps(), 500);
    }

    #[test]
    fn test_invoice_status_default() {
        assert_eq!(InvoiceStatus::default(), InvoiceStatus::Draft);
    }

    #[test]
    fn test_enum_wire_names() {
        assert_eq!(
            serde_json::to_string(&InvoiceStatus::Overdue).unwrap(),
            "\"OVERDUE\""
        );
        assert_eq!(
            serde_json::to_string(&PaymentTerms::Net30).unwrap(),
            "\"Net 30\""
        );
        assert_eq!(
            serde_json::to_string(&PaymentMode::BankTransfer).unwrap(),
            "\"Bank Transfer\""
        );
    }

    #[test]
    fn test_line_quantity_recomputes_amount() {
        let mut item = Item::new("HW-MSE-002", "Wireless Mouse");
        item.price = Money::from_major(3500);

        let mut line = InvoiceLineItem::for_item(&item);
        assert_eq!(line.amount, Money::from_major(3500));

        line.set_quantity(3).unwrap();
        assert_eq!(line.amount, Money::from_major(10_500));

        assert!(matches!(line.set_quantity(i64::MAX), Err(CoreError::Overflow(_))));
        assert_eq!(line.quantity, 3);
        assert_eq!(line.amount, Money::from_major(10_500));
    }

    #[test]
    fn test_duplicate_clears_id_and_marks_copy() {
        let mut item = Item::new("OFF-PPR-001", "A4 Paper Ream");
        item.id = "item_3".to_string();
        let copy = item.duplicate();
        assert!(copy.id.is_empty());
        assert_eq!(copy.name, "A4 Paper Ream (Copy)");
        assert_eq!(copy.sku, "OFF-PPR-001-COPY");

        let mut customer = Customer::new("Alex Johnson", CustomerType::Individual);
        customer.id = "cust_3".to_string();
        let copy = customer.duplicate();
        assert!(copy.id.is_empty());
        assert_eq!(copy.name, "Alex Johnson (Copy)");
    }

    #[test]
    fn test_payment_allocation() {
        let payment = Payment {
            id: "pay_x".to_string(),
            date: NaiveDate::from_ymd_opt(2025, 2, 22).unwrap(),
            payment_number: "PAY-100".to_string(),
            reference_number: "CASH".to_string(),
            customer_name: "TechFlow Solutions".to_string(),
            invoice_numbers: vec!["INV-2025-001".to_string(), "INV-2025-005".to_string()],
            mode: PaymentMode::Cash,
            amount: Money::from_major(20_000),
            unused_amount: Money::zero(),
            status: PaymentStatus::Paid,
        };
        assert_eq!(payment.allocation_per_invoice(), Some(Money::from_major(10_000)));

        let advance = Payment {
            invoice_numbers: Vec::new(),
            ..payment
        };
        assert_eq!(advance.allocation_per_invoice(), None);
    }
}
