//! # Goods Received Note
//!
//! Stock intake from a supplier.
//!
//! ## Lifecycle
//! ```text
//!   GrnDraft::new(date)
//!         │
//!         ▼
//!   ┌───────────┐  add_line / remove_line / set_supplier
//!   │ Authoring │◄──────────────────────────────┐
//!   └─────┬─────┘───────────────────────────────┘
//!         │ confirm(store, selection)
//!         ├──── no lines ──► Err(GrnRejected { draft, EmptyGoodsReceipt })
//!         ▼
//!   ┌───────────┐
//!   │ Confirmed │  GrnReceipt { updated, skipped }
//!   └───────────┘
//! ```
//!
//! For every line, confirmation applies to the referenced item:
//! - `stock_qty += quantity`
//! - `cost = unit_cost` (last received cost, not averaged)
//! - `supplier = draft supplier`, when the draft names one
//!
//! Lines for the same item accumulate. All item updates reach the store in
//! one batch.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::query::ItemSelection;
use crate::store::EntityStore;
use crate::types::Item;
use crate::validation::{validate_non_negative, validate_quantity};

// =============================================================================
// Lines
// =============================================================================

/// The line entry form, before it is added to the draft.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GrnLineInput {
    pub item_id: String,
    pub quantity: i64,
    pub unit_cost: Money,
    /// Flat amount off the line, not a percentage.
    pub discount: Money,
}

impl Default for GrnLineInput {
    fn default() -> Self {
        GrnLineInput {
            item_id: String::new(),
            quantity: 1,
            unit_cost: Money::zero(),
            discount: Money::zero(),
        }
    }
}

/// A received line. Name and sku are captured when the line is added.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GrnLineItem {
    pub item_id: String,
    pub name: String,
    pub sku: String,
    pub quantity: i64,
    pub unit_cost: Money,
    pub discount: Money,
    /// `max(0, quantity × unit_cost − discount)`.
    pub total: Money,
}

impl GrnLineItem {
    fn from_input(item: &Item, input: &GrnLineInput) -> CoreResult<Self> {
        let gross = input
            .unit_cost
            .checked_multiply_quantity(input.quantity)
            .ok_or_else(|| CoreError::Overflow(format!("line total for {}", item.sku)))?;

        Ok(GrnLineItem {
            item_id: item.id.clone(),
            name: item.name.clone(),
            sku: item.sku.clone(),
            quantity: input.quantity,
            unit_cost: input.unit_cost,
            discount: input.discount,
            total: (gross - input.discount).clamp_non_negative(),
        })
    }
}

// =============================================================================
// Draft
// =============================================================================

/// A goods received note being authored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GrnDraft {
    pub date: NaiveDate,
    supplier: Option<String>,
    lines: Vec<GrnLineItem>,
}

impl GrnDraft {
    pub fn new(date: NaiveDate) -> Self {
        GrnDraft {
            date,
            supplier: None,
            lines: Vec::new(),
        }
    }

    pub fn supplier(&self) -> Option<&str> {
        self.supplier.as_deref()
    }

    /// Blank names clear the supplier.
    pub fn set_supplier(&mut self, supplier: Option<String>) {
        self.supplier = supplier.filter(|s| !s.trim().is_empty());
    }

    /// Starts a line for `item`, pre-filled with its current cost.
    ///
    /// If the draft has no supplier yet, it adopts the item's supplier.
    pub fn line_input_for(&mut self, item: &Item) -> GrnLineInput {
        if self.supplier.is_none() {
            self.set_supplier(item.supplier.clone());
        }

        GrnLineInput {
            item_id: item.id.clone(),
            unit_cost: item.cost,
            ..GrnLineInput::default()
        }
    }

    /// Appends a line for an item in `items`.
    ///
    /// # Errors
    /// - `Validation` if the item id is blank, the quantity is outside
    ///   `1..=MAX_ITEM_QUANTITY`, or cost/discount are negative
    /// - `ItemNotFound` if `items` has no such item
    /// - `Overflow` if the line or grand total does not fit
    ///
    /// The draft is unchanged on error.
    pub fn add_line(&mut self, items: &[Item], input: GrnLineInput) -> CoreResult<&GrnLineItem> {
        if input.item_id.trim().is_empty() {
            return Err(ValidationError::Required {
                field: "item".to_string(),
            }
            .into());
        }
        validate_quantity(input.quantity)?;
        validate_non_negative("unit_cost", input.unit_cost)?;
        validate_non_negative("discount", input.discount)?;

        let item = items
            .iter()
            .find(|i| i.id == input.item_id)
            .ok_or_else(|| CoreError::ItemNotFound(input.item_id.clone()))?;

        let line = GrnLineItem::from_input(item, &input)?;
        if self.grand_total().checked_add(line.total).is_none() {
            return Err(CoreError::Overflow("goods received note total".to_string()));
        }

        self.lines.push(line);
        Ok(&self.lines[self.lines.len() - 1])
    }

    /// Removes the line at `index`.
    pub fn remove_line(&mut self, index: usize) -> CoreResult<GrnLineItem> {
        if index >= self.lines.len() {
            return Err(CoreError::LineIndexOutOfRange {
                index,
                len: self.lines.len(),
            });
        }
        Ok(self.lines.remove(index))
    }

    pub fn lines(&self) -> &[GrnLineItem] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn grand_total(&self) -> Money {
        self.lines.iter().map(|l| l.total).sum()
    }

    /// Receives the stock into `store` and refreshes `selection`.
    ///
    /// Lines whose item was deleted after the line was added are skipped and
    /// listed in [`GrnReceipt::skipped`]. A stock level that would overflow
    /// rejects the whole note and leaves the store untouched.
    pub fn confirm(
        self,
        store: &mut EntityStore,
        selection: &mut ItemSelection,
    ) -> Result<GrnReceipt, GrnRejected> {
        let (updated, skipped) = match self.receive(store) {
            Ok(received) => received,
            Err(error) => return Err(GrnRejected { draft: self, error }),
        };

        store.apply_stock_receipt(&updated);
        for item in &updated {
            selection.refresh(item);
        }

        let grand_total = self.grand_total();
        Ok(GrnReceipt {
            date: self.date,
            supplier: self.supplier,
            lines: self.lines,
            grand_total,
            updated,
            skipped,
        })
    }

    /// Works out the items after intake without touching the store.
    fn receive(&self, store: &EntityStore) -> CoreResult<(Vec<Item>, Vec<GrnLineItem>)> {
        if self.lines.is_empty() {
            return Err(CoreError::EmptyGoodsReceipt);
        }

        let mut updated: Vec<Item> = Vec::new();
        let mut skipped: Vec<GrnLineItem> = Vec::new();

        for line in &self.lines {
            let pos = match updated.iter().position(|i| i.id == line.item_id) {
                Some(pos) => pos,
                None => match store.item(&line.item_id) {
                    Some(item) => {
                        updated.push(item.clone());
                        updated.len() - 1
                    }
                    None => {
                        skipped.push(line.clone());
                        continue;
                    }
                },
            };

            let item = &mut updated[pos];
            item.stock_qty = item
                .stock_qty
                .checked_add(line.quantity)
                .ok_or_else(|| CoreError::Overflow(format!("stock of {}", item.sku)))?;
            item.cost = line.unit_cost;
            if let Some(supplier) = &self.supplier {
                item.supplier = Some(supplier.clone());
            }
        }

        Ok((updated, skipped))
    }
}

// =============================================================================
// Outcome
// =============================================================================

/// A confirmed goods received note.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GrnReceipt {
    pub date: NaiveDate,
    pub supplier: Option<String>,
    pub lines: Vec<GrnLineItem>,
    pub grand_total: Money,
    /// Items after the intake, one per distinct item received.
    pub updated: Vec<Item>,
    /// Lines whose item no longer exists.
    pub skipped: Vec<GrnLineItem>,
}

/// Confirmation refused. The draft comes back untouched.
#[derive(Debug, Error)]
#[error("{error}")]
pub struct GrnRejected {
    pub draft: GrnDraft,
    pub error: CoreError,
}

// =============================================================================
// Unit Tests
// =============================================================================
