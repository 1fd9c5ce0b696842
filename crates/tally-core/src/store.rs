//! # Entity Store
//!
//! In-memory owner of every collection. All mutations go through the named
//! commands below. A rejected command returns an error and leaves the store
//! as it was.
//!
//! ## Commands
//! ```text
//! ┌──────────────┬──────────────────────────────────────────────────────────┐
//! │ Customers    │ add_customer, update_customer, customer_invoices         │
//! │ Items        │ add_item, update_item, delete_item, item                 │
//! │ Suppliers    │ add_supplier, update_supplier, delete_supplier           │
//! │ Invoices     │ save_invoice, hold, complete_payment, open_invoice,      │
//! │              │ invoice, next_invoice_number                             │
//! │ Payments     │ add_payment, payments                                    │
//! │ GRN          │ apply_stock_receipt (via GrnDraft::confirm)              │
//! └──────────────┴──────────────────────────────────────────────────────────┘
//! ```
//!
//! New entities saved with a blank id get a UUID v4. New invoices go to the
//! front of the list; everything else is appended.

use chrono::Datelike;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::LedgerConfig;
use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::totals::{InvoiceDraft, Tender};
use crate::types::{Customer, Invoice, InvoiceStatus, Item, Payment, Supplier};
use crate::validation::{validate_name, validate_non_negative, validate_required, validate_sku};

/// Every collection, as loaded from or written to storage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreSnapshot {
    pub customers: Vec<Customer>,
    pub items: Vec<Item>,
    pub suppliers: Vec<Supplier>,
    pub invoices: Vec<Invoice>,
    pub payments: Vec<Payment>,
}

/// Result of settling a sale at the POS.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletedSale {
    pub invoice: Invoice,
    pub change_due: Money,
}

#[derive(Debug, Clone)]
pub struct EntityStore {
    customers: Vec<Customer>,
    items: Vec<Item>,
    suppliers: Vec<Supplier>,
    invoices: Vec<Invoice>,
    payments: Vec<Payment>,
    config: LedgerConfig,
}

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

fn assign_id(id: &mut String) {
    if id.trim().is_empty() {
        *id = new_id();
    }
}

fn duplicate(field: &str, value: &str) -> CoreError {
    ValidationError::Duplicate {
        field: field.to_string(),
        value: value.to_string(),
    }
    .into()
}

/// Rejects an explicit id that is already taken. Blank ids are assigned
/// later and never clash.
fn ensure_new_id<'a>(id: &str, mut existing: impl Iterator<Item = &'a str>) -> CoreResult<()> {
    if !id.trim().is_empty() && existing.any(|e| e == id) {
        return Err(duplicate("id", id));
    }
    Ok(())
}

/// Next number after the highest `<prefix>NNN` in `numbers`, zero-padded to
/// three digits. Sequences that cannot be incremented are ignored.
fn next_in_sequence<'a>(prefix: &str, numbers: impl Iterator<Item = &'a str>) -> String {
    let next = numbers
        .filter_map(|n| n.strip_prefix(prefix))
        .filter_map(|seq| seq.parse::<u32>().ok()?.checked_add(1))
        .max()
        .unwrap_or(1);

    format!("{}{:03}", prefix, next)
}

impl EntityStore {
    pub fn new(config: LedgerConfig) -> Self {
        Self::from_snapshot(StoreSnapshot::default(), config)
    }

    pub fn from_snapshot(snapshot: StoreSnapshot, config: LedgerConfig) -> Self {
        EntityStore {
            customers: snapshot.customers,
            items: snapshot.items,
            suppliers: snapshot.suppliers,
            invoices: snapshot.invoices,
            payments: snapshot.payments,
            config,
        }
    }

    pub fn snapshot(&self) -> StoreSnapshot {
        StoreSnapshot {
            customers: self.customers.clone(),
            items: self.items.clone(),
            suppliers: self.suppliers.clone(),
            invoices: self.invoices.clone(),
            payments: self.payments.clone(),
        }
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    // =========================================================================
    // Customers
    // =========================================================================

    pub fn customers(&self) -> &[Customer] {
        &self.customers
    }

    pub fn customer(&self, id: &str) -> Option<&Customer> {
        self.customers.iter().find(|c| c.id == id)
    }

    /// Adds a customer. A blank id is assigned.
    ///
    /// # Errors
    /// - `Validation` if the name is blank or the id is already taken
    pub fn add_customer(&mut self, mut customer: Customer) -> CoreResult<&Customer> {
        validate_name("name", &customer.name)?;
        ensure_new_id(&customer.id, self.customers.iter().map(|c| c.id.as_str()))?;
        assign_id(&mut customer.id);

        self.customers.push(customer);
        Ok(&self.customers[self.customers.len() - 1])
    }

    pub fn update_customer(&mut self, customer: Customer) -> CoreResult<()> {
        validate_name("name", &customer.name)?;

        let slot = self
            .customers
            .iter_mut()
            .find(|c| c.id == customer.id)
            .ok_or_else(|| CoreError::CustomerNotFound(customer.id.clone()))?;
        *slot = customer;
        Ok(())
    }

    /// Invoices raised against a customer, in list order.
    pub fn customer_invoices(&self, customer_id: &str) -> Vec<&Invoice> {
        self.invoices
            .iter()
            .filter(|inv| inv.customer_id == customer_id)
            .collect()
    }

    // =========================================================================
    // Items
    // =========================================================================

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn item(&self, id: &str) -> Option<&Item> {
        self.items.iter().find(|i| i.id == id)
    }

    /// Field checks plus SKU uniqueness against every other item.
    fn validate_item(&self, item: &Item) -> CoreResult<()> {
        validate_name("name", &item.name)?;
        validate_sku(&item.sku)?;
        validate_non_negative("cost", item.cost)?;
        validate_non_negative("price", item.price)?;

        if self
            .items
            .iter()
            .any(|other| other.sku == item.sku && other.id != item.id)
        {
            return Err(duplicate("sku", &item.sku));
        }
        Ok(())
    }

    /// Adds an item. A blank id is assigned.
    ///
    /// # Errors
    /// - `Validation` if a field is invalid, or the id or SKU is taken
    pub fn add_item(&mut self, mut item: Item) -> CoreResult<&Item> {
        self.validate_item(&item)?;
        ensure_new_id(&item.id, self.items.iter().map(|i| i.id.as_str()))?;
        assign_id(&mut item.id);

        self.items.push(item);
        Ok(&self.items[self.items.len() - 1])
    }

    pub fn update_item(&mut self, item: Item) -> CoreResult<()> {
        self.validate_item(&item)?;

        let slot = self
            .items
            .iter_mut()
            .find(|i| i.id == item.id)
            .ok_or_else(|| CoreError::ItemNotFound(item.id.clone()))?;
        *slot = item;
        Ok(())
    }

    /// Removes an item. Invoice lines keep their name snapshot.
    pub fn delete_item(&mut self, id: &str) -> CoreResult<Item> {
        let pos = self
            .items
            .iter()
            .position(|i| i.id == id)
            .ok_or_else(|| CoreError::ItemNotFound(id.to_string()))?;
        Ok(self.items.remove(pos))
    }

    /// Replaces the stored copies of `updated` in one pass. Unknown ids are
    /// ignored.
    pub(crate) fn apply_stock_receipt(&mut self, updated: &[Item]) {
        for item in self.items.iter_mut() {
            if let Some(new) = updated.iter().find(|u| u.id == item.id) {
                *item = new.clone();
            }
        }
    }

    // =========================================================================
    // Suppliers
    // =========================================================================

    pub fn suppliers(&self) -> &[Supplier] {
        &self.suppliers
    }

    pub fn supplier(&self, id: &str) -> Option<&Supplier> {
        self.suppliers.iter().find(|s| s.id == id)
    }

    pub fn add_supplier(&mut self, mut supplier: Supplier) -> CoreResult<&Supplier> {
        validate_name("name", &supplier.name)?;
        ensure_new_id(&supplier.id, self.suppliers.iter().map(|s| s.id.as_str()))?;
        assign_id(&mut supplier.id);

        self.suppliers.push(supplier);
        Ok(&self.suppliers[self.suppliers.len() - 1])
    }

    pub fn update_supplier(&mut self, supplier: Supplier) -> CoreResult<()> {
        validate_name("name", &supplier.name)?;

        let slot = self
            .suppliers
            .iter_mut()
            .find(|s| s.id == supplier.id)
            .ok_or_else(|| CoreError::SupplierNotFound(supplier.id.clone()))?;
        *slot = supplier;
        Ok(())
    }

    /// Removes a supplier. Items keep the supplier name they carry.
    pub fn delete_supplier(&mut self, id: &str) -> CoreResult<Supplier> {
        let pos = self
            .suppliers
            .iter()
            .position(|s| s.id == id)
            .ok_or_else(|| CoreError::SupplierNotFound(id.to_string()))?;
        Ok(self.suppliers.remove(pos))
    }

    // =========================================================================
    // Invoices
    // =========================================================================

    pub fn invoices(&self) -> &[Invoice] {
        &self.invoices
    }

    pub fn invoice(&self, id: &str) -> Option<&Invoice> {
        self.invoices.iter().find(|inv| inv.id == id)
    }

    /// Next free number in the `INV-<year>-NNN` sequence.
    ///
    /// ```rust
    /// use tally_core::{EntityStore, LedgerConfig};
    ///
    /// let store = EntityStore::new(LedgerConfig::default());
    /// assert_eq!(store.next_invoice_number(2025), "INV-2025-001");
    /// ```
    pub fn next_invoice_number(&self, year: i32) -> String {
        next_in_sequence(
            &format!("INV-{}-", year),
            self.invoices.iter().map(|inv| inv.invoice_number.as_str()),
        )
    }

    /// Builds the invoice from `draft` and stores it.
    ///
    /// A new draft gets a fresh id and number and goes to the front of the
    /// list. An edited draft keeps the invoice's id and number and replaces
    /// it in place.
    pub fn save_invoice(
        &mut self,
        draft: &InvoiceDraft,
        status: InvoiceStatus,
    ) -> CoreResult<&Invoice> {
        match &draft.invoice_id {
            Some(id) => {
                let pos = self
                    .invoices
                    .iter()
                    .position(|inv| &inv.id == id)
                    .ok_or_else(|| CoreError::InvoiceNotFound(id.clone()))?;

                let number = self.invoices[pos].invoice_number.clone();
                self.invoices[pos] = draft.build(id.clone(), number, status, &self.config);
                Ok(&self.invoices[pos])
            }
            None => {
                let number = self.next_invoice_number(draft.date.year());
                let invoice = draft.build(new_id(), number, status, &self.config);
                self.invoices.insert(0, invoice);
                Ok(&self.invoices[0])
            }
        }
    }

    /// Saves the draft as DRAFT. An empty cart is allowed.
    pub fn hold(&mut self, draft: &InvoiceDraft) -> CoreResult<&Invoice> {
        self.save_invoice(draft, InvoiceStatus::Draft)
    }

    /// Settles the sale and saves it as PAID.
    ///
    /// # Errors
    /// - `EmptyCart` if there is nothing to sell
    /// - `InsufficientTender` if cash received is below the grand total
    pub fn complete_payment(
        &mut self,
        draft: &InvoiceDraft,
        tender: Tender,
    ) -> CoreResult<CompletedSale> {
        if draft.cart.is_empty() {
            return Err(CoreError::EmptyCart);
        }

        let grand_total = draft.totals(&self.config).grand_total;
        if !tender.is_sufficient(grand_total) {
            let received = match tender {
                Tender::Cash { received } => received,
                Tender::Card => grand_total,
            };
            return Err(CoreError::InsufficientTender {
                required: grand_total,
                received,
            });
        }

        let invoice = self.save_invoice(draft, InvoiceStatus::Paid)?.clone();
        Ok(CompletedSale {
            invoice,
            change_due: tender.change_due(grand_total),
        })
    }

    /// Reopens a stored invoice at the POS.
    pub fn open_invoice(&self, id: &str) -> CoreResult<InvoiceDraft> {
        let invoice = self
            .invoice(id)
            .ok_or_else(|| CoreError::InvoiceNotFound(id.to_string()))?;
        Ok(InvoiceDraft::edit(invoice, self.customer(&invoice.customer_id)))
    }

    // =========================================================================
    // Payments
    // =========================================================================

    pub fn payments(&self) -> &[Payment] {
        &self.payments
    }

    /// Next free number in the `PAY-NNN` sequence.
    pub fn next_payment_number(&self) -> String {
        next_in_sequence(
            "PAY-",
            self.payments.iter().map(|p| p.payment_number.as_str()),
        )
    }

    /// Records a payment. A blank payment number is assigned from the
    /// sequence; an explicit one must not be taken.
    pub fn add_payment(&mut self, mut payment: Payment) -> CoreResult<&Payment> {
        validate_required("customer_name", &payment.customer_name)?;
        validate_non_negative("amount", payment.amount)?;
        validate_non_negative("unused_amount", payment.unused_amount)?;
        if payment.unused_amount > payment.amount {
            return Err(ValidationError::OutOfRange {
                field: "unused_amount".to_string(),
                min: 0,
                max: payment.amount.cents(),
            }
            .into());
        }

        ensure_new_id(&payment.id, self.payments.iter().map(|p| p.id.as_str()))?;
        let number = payment.payment_number.as_str();
        if !number.trim().is_empty() && self.payments.iter().any(|p| p.payment_number == number) {
            return Err(duplicate("payment_number", number));
        }

        assign_id(&mut payment.id);
        if payment.payment_number.trim().is_empty() {
            payment.payment_number = self.next_payment_number();
        }

        self.payments.push(payment);
        Ok(&self.payments[self.payments.len() - 1])
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
