//! # List Queries
//!
//! Filter and sort rules for the list screens, plus the detail-pane
//! selection that follows them.
//!
//! ```text
//! entities ──► filter (category / search) ──► sort (key, direction) ──► Vec<&T>
//!                                                                          │
//!                                     Selection::retain_within ◄───────────┘
//! ```
//!
//! Text search is case-insensitive except for payment and invoice numbers on
//! the payments screen, which match exactly as typed.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::types::{Customer, Invoice, Item, Payment, Supplier};
use crate::CATEGORY_ALL;

// =============================================================================
// Sorting Primitives
// =============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    }
}

/// Entities addressable by a stable id.
pub trait Keyed {
    fn key(&self) -> &str;
}

impl Keyed for Item {
    fn key(&self) -> &str {
        &self.id
    }
}

impl Keyed for Customer {
    fn key(&self) -> &str {
        &self.id
    }
}

impl Keyed for Supplier {
    fn key(&self) -> &str {
        &self.id
    }
}

impl Keyed for Invoice {
    fn key(&self) -> &str {
        &self.id
    }
}

impl Keyed for Payment {
    fn key(&self) -> &str {
        &self.id
    }
}

fn contains_ci(haystack: &str, needle_lower: &str) -> bool {
    haystack.to_lowercase().contains(needle_lower)
}

fn cmp_ci(a: &str, b: &str) -> Ordering {
    a.to_lowercase().cmp(&b.to_lowercase())
}

// =============================================================================
// Items
// =============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ItemSortKey {
    #[default]
    Name,
    Sku,
    Price,
    StockQty,
}

/// Inventory list query: category tab, search box and sort menu.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemQuery {
    /// [`CATEGORY_ALL`] matches every category.
    pub category: String,
    /// Matched against name and sku.
    pub search: String,
    pub sort: ItemSortKey,
    pub direction: SortDirection,
}

impl Default for ItemQuery {
    fn default() -> Self {
        ItemQuery {
            category: CATEGORY_ALL.to_string(),
            search: String::new(),
            sort: ItemSortKey::Name,
            direction: SortDirection::Asc,
        }
    }
}

impl ItemQuery {
    pub fn matches(&self, item: &Item) -> bool {
        let in_category = self.category == CATEGORY_ALL || item.category == self.category;
        let needle = self.search.to_lowercase();
        in_category && (contains_ci(&item.name, &needle) || contains_ci(&item.sku, &needle))
    }

    pub fn apply<'a>(&self, items: &'a [Item]) -> Vec<&'a Item> {
        let mut result: Vec<&Item> = items.iter().filter(|i| self.matches(i)).collect();

        result.sort_by(|a, b| {
            let ordering = match self.sort {
                ItemSortKey::Name => cmp_ci(&a.name, &b.name),
                ItemSortKey::Sku => cmp_ci(&a.sku, &b.sku),
                ItemSortKey::Price => a.price.cmp(&b.price),
                ItemSortKey::StockQty => a.stock_qty.cmp(&b.stock_qty),
            };
            self.direction.apply(ordering)
        });

        result
    }
}

// =============================================================================
// Invoices
// =============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum InvoiceSortKey {
    #[default]
    Date,
    InvoiceNumber,
}

/// Invoice list query. Newest first by default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceQuery {
    /// Matched against invoice number and customer name.
    pub search: String,
    pub sort: InvoiceSortKey,
    pub direction: SortDirection,
}

impl Default for InvoiceQuery {
    fn default() -> Self {
        InvoiceQuery {
            search: String::new(),
            sort: InvoiceSortKey::Date,
            direction: SortDirection::Desc,
        }
    }
}

impl InvoiceQuery {
    pub fn matches(&self, invoice: &Invoice) -> bool {
        let needle = self.search.to_lowercase();
        contains_ci(&invoice.invoice_number, &needle)
            || contains_ci(&invoice.customer_name, &needle)
    }

    pub fn apply<'a>(&self, invoices: &'a [Invoice]) -> Vec<&'a Invoice> {
        let mut result: Vec<&Invoice> = invoices.iter().filter(|i| self.matches(i)).collect();

        result.sort_by(|a, b| {
            let ordering = match self.sort {
                InvoiceSortKey::Date => a.date.cmp(&b.date),
                InvoiceSortKey::InvoiceNumber => cmp_ci(&a.invoice_number, &b.invoice_number)
                    .then_with(|| a.invoice_number.cmp(&b.invoice_number)),
            };
            self.direction.apply(ordering)
        });

        result
    }
}

// =============================================================================
// Customers
// =============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CustomerSortKey {
    #[default]
    Name,
    CompanyName,
    Email,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerQuery {
    /// Matched against display name and company name.
    pub search: String,
    pub sort: CustomerSortKey,
    pub direction: SortDirection,
}

impl CustomerQuery {
    pub fn matches(&self, customer: &Customer) -> bool {
        let needle = self.search.to_lowercase();
        contains_ci(&customer.name, &needle)
            || contains_ci(customer.company_name.as_deref().unwrap_or_default(), &needle)
    }

    pub fn apply<'a>(&self, customers: &'a [Customer]) -> Vec<&'a Customer> {
        let mut result: Vec<&Customer> = customers.iter().filter(|c| self.matches(c)).collect();

        result.sort_by(|a, b| {
            let ordering = match self.sort {
                CustomerSortKey::Name => cmp_ci(&a.name, &b.name),
                CustomerSortKey::CompanyName => cmp_ci(
                    a.company_name.as_deref().unwrap_or_default(),
                    b.company_name.as_deref().unwrap_or_default(),
                ),
                CustomerSortKey::Email => cmp_ci(&a.email, &b.email),
            };
            self.direction.apply(ordering)
        });

        result
    }
}

// =============================================================================
// Suppliers and Payments
// =============================================================================

/// Matches name or contact person, case-insensitively.
pub fn filter_suppliers<'a>(suppliers: &'a [Supplier], search: &str) -> Vec<&'a Supplier> {
    let needle = search.to_lowercase();
    suppliers
        .iter()
        .filter(|s| contains_ci(&s.name, &needle) || contains_ci(&s.contact_person, &needle))
        .collect()
}

/// Matches customer name case-insensitively, or payment number / any
/// referenced invoice number exactly as typed.
pub fn filter_payments<'a>(payments: &'a [Payment], search: &str) -> Vec<&'a Payment> {
    let needle = search.to_lowercase();
    payments
        .iter()
        .filter(|p| {
            contains_ci(&p.customer_name, &needle)
                || p.payment_number.contains(search)
                || p.invoice_numbers.iter().any(|n| n.contains(search))
        })
        .collect()
}

// =============================================================================
// Selection
// =============================================================================

/// The entity shown in a detail pane.
///
/// Holds a copy, so it must be refreshed when the stored entity changes and
/// dropped when the entity leaves the visible list.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection<T> {
    selected: Option<T>,
}

pub type ItemSelection = Selection<Item>;

impl<T> Default for Selection<T> {
    fn default() -> Self {
        Selection { selected: None }
    }
}

impl<T: Keyed + Clone> Selection<T> {
    pub fn new() -> Self {
        Selection::default()
    }

    pub fn select(&mut self, entity: &T) {
        self.selected = Some(entity.clone());
    }

    pub fn clear(&mut self) {
        self.selected = None;
    }

    pub fn get(&self) -> Option<&T> {
        self.selected.as_ref()
    }

    pub fn is_selected(&self, id: &str) -> bool {
        self.selected.as_ref().is_some_and(|s| s.key() == id)
    }

    /// Drops the selection unless it is among `visible`.
    pub fn retain_within<'a, I>(&mut self, visible: I)
    where
        I: IntoIterator<Item = &'a T>,
        T: 'a,
    {
        let Some(selected) = &self.selected else {
            return;
        };
        let key = selected.key();
        if !visible.into_iter().any(|v| v.key() == key) {
            self.selected = None;
        }
    }

    /// Replaces the cached copy if `updated` is the selected entity.
    pub fn refresh(&mut self, updated: &T) {
        if self.is_selected(updated.key()) {
            self.selected = Some(updated.clone());
        }
    }

    /// Drops the selection if it refers to a deleted entity.
    pub fn forget(&mut self, id: &str) {
        if self.is_selected(id) {
            self.selected = None;
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::seed_snapshot;

    fn numbers(list: &[&Invoice]) -> Vec<String> {
        list.iter().map(|i| i.invoice_number.clone()).collect()
    }

    #[test]
    fn test_item_category_and_search() {
        let items = seed_snapshot().items;

        let query = ItemQuery {
            category: "Electronics".to_string(),
            ..ItemQuery::default()
        };
        assert_eq!(query.apply(&items).len(), 2);

        let query = ItemQuery {
            search: "off-ppr".to_string(),
            ..ItemQuery::default()
        };
        let result = query.apply(&items);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].id, "item_3");

        assert_eq!(ItemQuery::default().apply(&items).len(), items.len());
    }

    #[test]
    fn test_item_sorting() {
        let items = seed_snapshot().items;

        let by_name = ItemQuery::default().apply(&items);
        assert_eq!(by_name[0].name, "A4 Paper Ream");

        let by_price_desc = ItemQuery {
            sort: ItemSortKey::Price,
            direction: SortDirection::Desc,
            ..ItemQuery::default()
        }
        .apply(&items);
        assert_eq!(by_price_desc[0].id, "item_1");

        let by_stock = ItemQuery {
            sort: ItemSortKey::StockQty,
            ..ItemQuery::default()
        }
        .apply(&items);
        assert_eq!(by_stock[0].stock_qty, 25);
        assert_eq!(by_stock[by_stock.len() - 1].stock_qty, 999);
    }

    #[test]
    fn test_invoice_default_newest_first() {
        let invoices = seed_snapshot().invoices;
        let result = InvoiceQuery::default().apply(&invoices);
        assert_eq!(
            numbers(&result),
            vec!["INV-2025-005", "INV-2025-004", "INV-2025-003", "INV-2025-002", "INV-2025-001"]
        );

        let query = InvoiceQuery {
            search: "techflow".to_string(),
            sort: InvoiceSortKey::InvoiceNumber,
            direction: SortDirection::Asc,
        };
        assert_eq!(
            numbers(&query.apply(&invoices)),
            vec!["INV-2025-001", "INV-2025-005"]
        );
    }

    #[test]
    fn test_customer_search_company_name() {
        let customers = seed_snapshot().customers;
        let query = CustomerQuery {
            search: "ltd".to_string(),
            ..CustomerQuery::default()
        };
        let result = query.apply(&customers);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].name, "Apex Construction");

        let by_email = CustomerQuery {
            sort: CustomerSortKey::Email,
            ..CustomerQuery::default()
        }
        .apply(&customers);
        assert_eq!(by_email[0].email, "accounts@apexconst.com");
    }

    #[test]
    fn test_supplier_search_contact_person() {
        let suppliers = seed_snapshot().suppliers;
        let result = filter_suppliers(&suppliers, "linda");
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].name, "Office Depot Wholesale");
    }

    #[test]
    fn test_payment_number_search_is_case_sensitive() {
        let payments = seed_snapshot().payments;

        assert_eq!(filter_payments(&payments, "PAY-003").len(), 1);
        assert_eq!(filter_payments(&payments, "pay-003").len(), 0);
        // Two payments reference INV-2025-001.
        assert_eq!(filter_payments(&payments, "INV-2025-001").len(), 2);
        assert_eq!(filter_payments(&payments, "alex").len(), 1);
    }

    #[test]
    fn test_selection_cleared_when_filtered_out() {
        let items = seed_snapshot().items;
        let mut selection = ItemSelection::new();
        selection.select(&items[0]);

        let electronics = ItemQuery {
            category: "Electronics".to_string(),
            ..ItemQuery::default()
        };
        selection.retain_within(electronics.apply(&items));
        assert!(selection.is_selected("item_1"));

        let stationery = ItemQuery {
            category: "Stationery".to_string(),
            ..ItemQuery::default()
        };
        selection.retain_within(stationery.apply(&items));
        assert!(selection.get().is_none());
    }

    #[test]
    fn test_selection_refresh_and_forget() {
        let items = seed_snapshot().items;
        let mut selection = ItemSelection::new();
        selection.select(&items[1]);

        let mut updated = items[1].clone();
        updated.stock_qty += 10;
        selection.refresh(&updated);
        assert_eq!(selection.get().unwrap().stock_qty, 160);

        // Refreshing with another item leaves it alone.
        selection.refresh(&items[0]);
        assert_eq!(selection.get().unwrap().id, "item_2");

        selection.forget("item_2");
        assert!(selection.get().is_none());
    }
}
