//! # POS Cart and Invoice Totals
//!
//! One pure function derives invoice totals from cart lines. The cart
//! display and the invoice that gets saved both go through it, so shown and
//! persisted totals cannot drift apart.
//!
//! ## Cart Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Cart Operations                                      │
//! │                                                                         │
//! │  Click item ─────────► add_item() ─────────► qty + 1 (or new line)     │
//! │  − / + buttons ──────► update_quantity() ──► qty = max(1, qty + Δ)     │
//! │  Trash icon ─────────► remove_item() ──────► line removed              │
//! │                                                                         │
//! │  Every change re-derives line.amount = qty × rate                      │
//! │                                                                         │
//! │  InvoiceTotals::compute(lines, config)                                 │
//! │    sub_total      = Σ amount                                           │
//! │    total_tax      = sub_total × tax_rate       (10%)                   │
//! │    total_discount = sub_total × discount_rate  (5%)                    │
//! │    grand_total    = sub_total + total_tax − total_discount             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::config::LedgerConfig;
use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{Customer, Invoice, InvoiceLineItem, InvoiceStatus, Item};
use crate::validation::validate_quantity;
use crate::{MIN_CART_QUANTITY, WALK_IN_CUSTOMER_ID};

/// Largest cart subtotal. Tax at up to 100% still fits in an `i64`.
pub const MAX_SUB_TOTAL: Money = Money::from_cents(i64::MAX / 2);

// =============================================================================
// Invoice Totals
// =============================================================================

/// Derived invoice amounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceTotals {
    pub sub_total: Money,
    pub total_tax: Money,
    pub total_discount: Money,
    pub grand_total: Money,
}

impl InvoiceTotals {
    /// Computes totals for a set of lines with the configured flat rates.
    ///
    /// ```rust
    /// use tally_core::config::LedgerConfig;
    /// use tally_core::money::Money;
    /// use tally_core::totals::InvoiceTotals;
    /// use tally_core::types::{InvoiceLineItem, Rate};
    ///
    /// let line = InvoiceLineItem {
    ///     item_id: "item_4".into(),
    ///     name: "Web Design Basic".into(),
    ///     quantity: 1,
    ///     rate: Money::from_major(1000),
    ///     discount_percent: Rate::zero(),
    ///     tax_percent: Rate::zero(),
    ///     amount: Money::from_major(1000),
    /// };
    /// let totals = InvoiceTotals::compute(&[line], &LedgerConfig::default());
    /// assert_eq!(totals.grand_total, Money::from_major(1050));
    /// ```
    pub fn compute(lines: &[InvoiceLineItem], config: &LedgerConfig) -> Self {
        let sub_total: Money = lines.iter().map(|line| line.amount).sum();
        let total_tax = sub_total.percentage(config.tax_rate);
        let total_discount = sub_total.percentage(config.discount_rate);

        InvoiceTotals {
            sub_total,
            total_tax,
            total_discount,
            grand_total: sub_total + total_tax - total_discount,
        }
    }

    /// Balance left after finalizing with `status`: zero when paid,
    /// otherwise the grand total.
    pub fn balance_due(&self, status: InvoiceStatus) -> Money {
        if status == InvoiceStatus::Paid {
            Money::zero()
        } else {
            self.grand_total
        }
    }
}

// =============================================================================
// Cart
// =============================================================================

/// The POS cart.
///
/// ## Invariants
/// - Lines are unique by `item_id` (adding the same item increments quantity)
/// - Quantity never drops below [`MIN_CART_QUANTITY`] through decrements
///   and never exceeds [`MAX_ITEM_QUANTITY`](crate::MAX_ITEM_QUANTITY)
/// - The subtotal never exceeds [`MAX_SUB_TOTAL`]
/// - `amount == quantity × rate` on every line
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Cart {
    lines: Vec<InvoiceLineItem>,
}

impl Cart {
    /// Creates a new empty cart.
    pub fn new() -> Self {
        Cart { lines: Vec::new() }
    }

    /// Loads the lines of an existing invoice for editing.
    pub fn from_lines(lines: Vec<InvoiceLineItem>) -> Self {
        Cart { lines }
    }

    /// Adds one unit of `item`, or increments the existing line.
    pub fn add_item(&mut self, item: &Item) -> CoreResult<()> {
        if let Some(index) = self.lines.iter().position(|l| l.item_id == item.id) {
            let quantity = self.lines[index].quantity.saturating_add(1);
            return self.set_line_quantity(index, quantity);
        }

        let line = InvoiceLineItem::for_item(item);
        self.check_sub_total(None, line.amount)?;
        self.lines.push(line);
        Ok(())
    }

    /// Changes a line's quantity by `delta`, clamped at the minimum.
    ///
    /// # Errors
    /// - `NotInCart` if no line has `item_id`
    /// - `Validation` if the new quantity exceeds [`MAX_ITEM_QUANTITY`](crate::MAX_ITEM_QUANTITY)
    /// - `Overflow` if the subtotal would exceed its ceiling
    ///
    /// The cart is unchanged on error.
    pub fn update_quantity(&mut self, item_id: &str, delta: i64) -> CoreResult<()> {
        let index = self
            .lines
            .iter()
            .position(|l| l.item_id == item_id)
            .ok_or_else(|| CoreError::NotInCart(item_id.to_string()))?;

        let quantity = self.lines[index]
            .quantity
            .saturating_add(delta)
            .max(MIN_CART_QUANTITY);
        self.set_line_quantity(index, quantity)
    }

    fn set_line_quantity(&mut self, index: usize, quantity: i64) -> CoreResult<()> {
        validate_quantity(quantity)?;

        let mut line = self.lines[index].clone();
        line.set_quantity(quantity)?;
        self.check_sub_total(Some(index), line.amount)?;

        self.lines[index] = line;
        Ok(())
    }

    /// Checks that the lines, with `replaced` swapped for `amount`, stay
    /// under [`MAX_SUB_TOTAL`].
    fn check_sub_total(&self, replaced: Option<usize>, amount: Money) -> CoreResult<()> {
        self.lines
            .iter()
            .enumerate()
            .filter(|(i, _)| Some(*i) != replaced)
            .try_fold(amount, |acc, (_, line)| acc.checked_add(line.amount))
            .filter(|sub_total| *sub_total <= MAX_SUB_TOTAL)
            .map(|_| ())
            .ok_or_else(|| CoreError::Overflow("cart subtotal".to_string()))
    }

    /// Removes a line by item id.
    pub fn remove_item(&mut self, item_id: &str) -> CoreResult<()> {
        let initial_len = self.lines.len();
        self.lines.retain(|l| l.item_id != item_id);

        if self.lines.len() == initial_len {
            Err(CoreError::NotInCart(item_id.to_string()))
        } else {
            Ok(())
        }
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    pub fn lines(&self) -> &[InvoiceLineItem] {
        &self.lines
    }

    pub fn line(&self, item_id: &str) -> Option<&InvoiceLineItem> {
        self.lines.iter().find(|l| l.item_id == item_id)
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Number of distinct lines.
    pub fn item_count(&self) -> usize {
        self.lines.len()
    }

    /// Units across all lines (the "N Items" badge).
    pub fn total_quantity(&self) -> i64 {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    pub fn totals(&self, config: &LedgerConfig) -> InvoiceTotals {
        InvoiceTotals::compute(&self.lines, config)
    }
}

// =============================================================================
// Tender
// =============================================================================

/// How the customer settles at the POS.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "method")]
pub enum Tender {
    /// Cash handed over; must cover the grand total.
    Cash { received: Money },
    /// Card on an external terminal.
    Card,
}

impl Tender {
    /// Change to return. Zero for card payments.
    pub fn change_due(&self, grand_total: Money) -> Money {
        match self {
            Tender::Cash { received } => (*received - grand_total).clamp_non_negative(),
            Tender::Card => Money::zero(),
        }
    }

    /// What is still owed when cash falls short. Zero once covered, and
    /// always zero for card payments.
    pub fn amount_short(&self, grand_total: Money) -> Money {
        match self {
            Tender::Cash { received } => (grand_total - *received).clamp_non_negative(),
            Tender::Card => Money::zero(),
        }
    }

    /// Whether the tender covers `grand_total`.
    pub fn is_sufficient(&self, grand_total: Money) -> bool {
        match self {
            Tender::Cash { received } => *received >= grand_total,
            Tender::Card => true,
        }
    }
}

// =============================================================================
// Invoice Draft
// =============================================================================

/// Customer reference captured on an invoice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerRef {
    pub id: String,
    pub name: String,
}

impl From<&Customer> for CustomerRef {
    fn from(customer: &Customer) -> Self {
        CustomerRef {
            id: customer.id.clone(),
            name: customer.name.clone(),
        }
    }
}

/// An invoice being authored at the POS: new, or an existing one reopened.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceDraft {
    /// Id of the invoice being edited; `None` for a new invoice.
    pub invoice_id: Option<String>,
    /// `None` bills the walk-in customer.
    pub customer: Option<CustomerRef>,
    pub date: NaiveDate,
    /// `None` falls back to the invoice date.
    pub due_date: Option<NaiveDate>,
    pub cart: Cart,
}

impl InvoiceDraft {
    /// A new, empty invoice dated `date`.
    pub fn new(date: NaiveDate) -> Self {
        InvoiceDraft {
            invoice_id: None,
            customer: None,
            date,
            due_date: None,
            cart: Cart::new(),
        }
    }

    /// Reopens an invoice. `customer` is the resolved customer record, if
    /// it still exists.
    pub fn edit(invoice: &Invoice, customer: Option<&Customer>) -> Self {
        InvoiceDraft {
            invoice_id: Some(invoice.id.clone()),
            customer: customer.map(CustomerRef::from),
            date: invoice.date,
            due_date: Some(invoice.due_date),
            cart: Cart::from_lines(invoice.items.clone()),
        }
    }

    pub fn select_customer(&mut self, customer: &Customer) {
        self.customer = Some(CustomerRef::from(customer));
    }

    pub fn clear_customer(&mut self) {
        self.customer = None;
    }

    pub fn totals(&self, config: &LedgerConfig) -> InvoiceTotals {
        self.cart.totals(config)
    }

    /// Builds the invoice record for `status`.
    ///
    /// `id` and `invoice_number` are assigned by the store.
    pub fn build(
        &self,
        id: String,
        invoice_number: String,
        status: InvoiceStatus,
        config: &LedgerConfig,
    ) -> Invoice {
        let totals = self.totals(config);
        let (customer_id, customer_name) = match &self.customer {
            Some(c) => (c.id.clone(), c.name.clone()),
            None => (
                WALK_IN_CUSTOMER_ID.to_string(),
                config.walk_in_customer_name.clone(),
            ),
        };

        Invoice {
            id,
            invoice_number,
            customer_id,
            customer_name,
            date: self.date,
            due_date: self.due_date.unwrap_or(self.date),
            status,
            items: self.cart.lines().to_vec(),
            sub_total: totals.sub_total,
            total_tax: totals.total_tax,
            total_discount: totals.total_discount,
            grand_total: totals.grand_total,
            balance_due: totals.balance_due(status),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MAX_ITEM_QUANTITY;

    fn test_item(id: &str, price: Money) -> Item {
        let mut item = Item::new(format!("SKU-{}", id), format!("Item {}", id));
        item.id = id.to_string();
        item.price = price;
        item
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_totals_flat_rates() {
        let mut cart = Cart::new();
        cart.add_item(&test_item("1", Money::from_major(1000))).unwrap();

        let totals = cart.totals(&LedgerConfig::default());
        assert_eq!(totals.sub_total, Money::from_major(1000));
        assert_eq!(totals.total_tax, Money::from_major(100));
        assert_eq!(totals.total_discount, Money::from_major(50));
        assert_eq!(totals.grand_total, Money::from_major(1050));
    }

    #[test]
    fn test_totals_empty_cart() {
        let totals = Cart::new().totals(&LedgerConfig::default());
        assert_eq!(totals, InvoiceTotals::default());
    }

    #[test]
    fn test_add_same_item_increments_quantity() {
        let mut cart = Cart::new();
        let item = test_item("1", Money::from_major(3500));

        cart.add_item(&item).unwrap();
        cart.add_item(&item).unwrap();

        assert_eq!(cart.item_count(), 1);
        assert_eq!(cart.total_quantity(), 2);
        assert_eq!(cart.lines()[0].amount, Money::from_major(7000));
    }

    #[test]
    fn test_decrement_clamped_at_one() {
        let mut cart = Cart::new();
        let item = test_item("1", Money::from_major(100));
        cart.add_item(&item).unwrap();

        cart.update_quantity("1", -1).unwrap();
        assert_eq!(cart.line("1").unwrap().quantity, 1);

        cart.update_quantity("1", -5).unwrap();
        assert_eq!(cart.line("1").unwrap().quantity, 1);
        assert_eq!(cart.line("1").unwrap().amount, Money::from_major(100));
    }

    #[test]
    fn test_increment_recomputes_amount() {
        let mut cart = Cart::new();
        cart.add_item(&test_item("1", Money::from_major(1250))).unwrap();
        cart.update_quantity("1", 4).unwrap();

        let line = cart.line("1").unwrap();
        assert_eq!(line.quantity, 5);
        assert_eq!(line.amount, Money::from_major(6250));
    }

    #[test]
    fn test_update_unknown_line() {
        let mut cart = Cart::new();
        assert!(matches!(
            cart.update_quantity("nope", 1),
            Err(CoreError::NotInCart(_))
        ));
    }

    #[test]
    fn test_remove_item() {
        let mut cart = Cart::new();
        cart.add_item(&test_item("1", Money::from_major(10))).unwrap();
        cart.add_item(&test_item("2", Money::from_major(20))).unwrap();

        cart.remove_item("1").unwrap();
        assert_eq!(cart.item_count(), 1);
        assert!(cart.remove_item("1").is_err());
    }

    #[test]
    fn test_balance_due_by_status() {
        let mut cart = Cart::new();
        cart.add_item(&test_item("1", Money::from_major(1000))).unwrap();
        let totals = cart.totals(&LedgerConfig::default());

        assert_eq!(totals.balance_due(InvoiceStatus::Paid), Money::zero());
        assert_eq!(totals.balance_due(InvoiceStatus::Draft), Money::from_major(1050));
    }

    #[test]
    fn test_cash_tender() {
        let total = Money::from_major(1050);
        let cash = Tender::Cash {
            received: Money::from_major(1100),
        };
        assert!(cash.is_sufficient(total));
        assert_eq!(cash.change_due(total), Money::from_major(50));

        let short = Tender::Cash {
            received: Money::from_major(1000),
        };
        assert!(!short.is_sufficient(total));
        assert_eq!(short.change_due(total), Money::zero());
        assert_eq!(short.amount_short(total), Money::from_major(50));
        assert_eq!(cash.amount_short(total), Money::zero());

        assert!(Tender::Card.is_sufficient(total));
        assert_eq!(Tender::Card.amount_short(total), Money::zero());
    }

    #[test]
    fn test_quantity_above_limit_rejected() {
        let mut cart = Cart::new();
        cart.add_item(&test_item("1", Money::from_major(3500))).unwrap();

        assert!(matches!(
            cart.update_quantity("1", i64::MAX),
            Err(CoreError::Validation(_))
        ));
        assert_eq!(cart.line("1").unwrap().quantity, 1);

        cart.update_quantity("1", MAX_ITEM_QUANTITY - 1).unwrap();
        assert_eq!(cart.line("1").unwrap().quantity, MAX_ITEM_QUANTITY);
        assert!(cart.add_item(&test_item("1", Money::from_major(3500))).is_err());
        assert_eq!(cart.line("1").unwrap().quantity, MAX_ITEM_QUANTITY);

        // Large negative steps still clamp at the minimum.
        cart.update_quantity("1", i64::MIN).unwrap();
        assert_eq!(cart.line("1").unwrap().quantity, 1);
    }

    #[test]
    fn test_subtotal_ceiling_rejects_change() {
        let mut cart = Cart::new();
        let big = test_item("1", Money::from_cents(i64::MAX / 4));
        cart.add_item(&big).unwrap();
        cart.add_item(&big).unwrap();

        assert!(matches!(cart.add_item(&big), Err(CoreError::Overflow(_))));
        assert!(matches!(
            cart.add_item(&test_item("2", Money::from_cents(i64::MAX / 4))),
            Err(CoreError::Overflow(_))
        ));
        assert!(matches!(cart.update_quantity("1", 5), Err(CoreError::Overflow(_))));
        assert_eq!(cart.total_quantity(), 2);
        assert_eq!(cart.item_count(), 1);

        // Totals stay computable at the ceiling.
        let totals = cart.totals(&LedgerConfig::default());
        assert!(totals.grand_total.is_positive());
    }

    #[test]
    fn test_build_walk_in_invoice_defaults_due_date() {
        let mut draft = InvoiceDraft::new(date(2025, 3, 1));
        draft.cart.add_item(&test_item("1", Money::from_major(1000))).unwrap();

        let invoice = draft.build(
            "inv_x".to_string(),
            "INV-2025-006".to_string(),
            InvoiceStatus::Draft,
            &LedgerConfig::default(),
        );

        assert_eq!(invoice.customer_id, WALK_IN_CUSTOMER_ID);
        assert_eq!(invoice.customer_name, "Walk-in Customer");
        assert_eq!(invoice.due_date, date(2025, 3, 1));
        assert_eq!(invoice.grand_total, Money::from_major(1050));
        assert_eq!(invoice.balance_due, Money::from_major(1050));
        assert_eq!(
            invoice.grand_total,
            invoice.sub_total + invoice.total_tax - invoice.total_discount
        );
    }
}
