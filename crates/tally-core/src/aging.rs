//! # Receivables Aging
//!
//! Buckets the outstanding balance of every unpaid invoice by how many days
//! it is past due, as shown on the dashboard's "Total Receivables" widget.
//!
//! ## Bucketing
//! ```text
//! days_past_due = ceil((now − due_date@00:00 UTC) / 1 day)
//!
//!   ≤ 0   │ 1 ─ 15 │ 16 ─ 30 │ 31 ─ 45 │  > 45
//! ────────┼────────┼─────────┼─────────┼────────
//! current │   B1   │   B2    │   B3    │   B4
//! ```
//!
//! `now` is always a parameter; this module never reads the clock. Because
//! `now` carries a time of day, an invoice due today counts as 1 day overdue
//! as soon as the due date has started.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::money::Money;
use crate::types::{Customer, Invoice, InvoiceStatus};

const MILLIS_PER_DAY: i64 = 86_400_000;

// =============================================================================
// Buckets
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgingBucket {
    /// Not yet due.
    Current,
    Overdue1To15,
    Overdue16To30,
    Overdue31To45,
    OverdueAbove45,
}

impl AgingBucket {
    /// All buckets from youngest to oldest.
    pub const ALL: [AgingBucket; 5] = [
        AgingBucket::Current,
        AgingBucket::Overdue1To15,
        AgingBucket::Overdue16To30,
        AgingBucket::Overdue31To45,
        AgingBucket::OverdueAbove45,
    ];

    pub fn for_days_past_due(days: i64) -> Self {
        match days {
            d if d <= 0 => AgingBucket::Current,
            1..=15 => AgingBucket::Overdue1To15,
            16..=30 => AgingBucket::Overdue16To30,
            31..=45 => AgingBucket::Overdue31To45,
            _ => AgingBucket::OverdueAbove45,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            AgingBucket::Current => "Current",
            AgingBucket::Overdue1To15 => "1-15 Days",
            AgingBucket::Overdue16To30 => "16-30 Days",
            AgingBucket::Overdue31To45 => "31-45 Days",
            AgingBucket::OverdueAbove45 => "Above 45 days",
        }
    }
}

/// Whole days `now` is past `due`, rounded up.
///
/// ```rust
/// use chrono::{NaiveDate, TimeZone, Utc};
/// use tally_core::aging::days_past_due;
///
/// let due = NaiveDate::from_ymd_opt(2025, 3, 20).unwrap();
/// assert_eq!(days_past_due(due, Utc.with_ymd_and_hms(2025, 3, 20, 0, 0, 0).unwrap()), 0);
/// assert_eq!(days_past_due(due, Utc.with_ymd_and_hms(2025, 3, 20, 9, 0, 0).unwrap()), 1);
/// assert_eq!(days_past_due(due, Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap()), -18);
/// ```
pub fn days_past_due(due: NaiveDate, now: DateTime<Utc>) -> i64 {
    let due_start = due.and_time(NaiveTime::MIN).and_utc();
    let millis = (now - due_start).num_milliseconds();
    -((-millis).div_euclid(MILLIS_PER_DAY))
}

// =============================================================================
// Receivables Aging
// =============================================================================

/// Outstanding balances bucketed by age.
///
/// ## Invariant
/// `current + overdue_1_15 + overdue_16_30 + overdue_31_45 +
/// overdue_above_45 == total`, exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceivablesAging {
    pub current: Money,
    pub overdue_1_15: Money,
    pub overdue_16_30: Money,
    pub overdue_31_45: Money,
    pub overdue_above_45: Money,
    pub total: Money,
}

impl ReceivablesAging {
    /// Ages the balance due of every invoice whose status is not PAID.
    pub fn compute<'a, I>(invoices: I, now: DateTime<Utc>) -> Self
    where
        I: IntoIterator<Item = &'a Invoice>,
    {
        let mut aging = ReceivablesAging::default();

        for invoice in invoices.into_iter().filter(|inv| !inv.is_paid()) {
            let bucket = AgingBucket::for_days_past_due(days_past_due(invoice.due_date, now));
            *aging.bucket_mut(bucket) += invoice.balance_due;
            aging.total += invoice.balance_due;
        }

        aging
    }

    pub fn bucket(&self, bucket: AgingBucket) -> Money {
        match bucket {
            AgingBucket::Current => self.current,
            AgingBucket::Overdue1To15 => self.overdue_1_15,
            AgingBucket::Overdue16To30 => self.overdue_16_30,
            AgingBucket::Overdue31To45 => self.overdue_31_45,
            AgingBucket::OverdueAbove45 => self.overdue_above_45,
        }
    }

    fn bucket_mut(&mut self, bucket: AgingBucket) -> &mut Money {
        match bucket {
            AgingBucket::Current => &mut self.current,
            AgingBucket::Overdue1To15 => &mut self.overdue_1_15,
            AgingBucket::Overdue16To30 => &mut self.overdue_16_30,
            AgingBucket::Overdue31To45 => &mut self.overdue_31_45,
            AgingBucket::OverdueAbove45 => &mut self.overdue_above_45,
        }
    }

    /// Sum of the five buckets. Always equals `total`.
    pub fn bucket_sum(&self) -> Money {
        AgingBucket::ALL.iter().map(|b| self.bucket(*b)).sum()
    }
}

// =============================================================================
// Dashboard Counts
// =============================================================================

/// Invoice counts by status for the dashboard tiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceStats {
    pub total: usize,
    pub draft: usize,
    pub pending: usize,
    pub overdue: usize,
    pub paid: usize,
}

impl InvoiceStats {
    pub fn compute<'a, I>(invoices: I) -> Self
    where
        I: IntoIterator<Item = &'a Invoice>,
    {
        invoices
            .into_iter()
            .fold(InvoiceStats::default(), |mut stats, invoice| {
                stats.total += 1;
                match invoice.status {
                    InvoiceStatus::Draft => stats.draft += 1,
                    InvoiceStatus::Pending => stats.pending += 1,
                    InvoiceStatus::Overdue => stats.overdue += 1,
                    InvoiceStatus::Paid => stats.paid += 1,
                }
                stats
            })
    }
}

// =============================================================================
// Ledger Reconciliation
// =============================================================================

/// Stored customer receivables next to what the invoice ledger says.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceivablesReconciliation {
    pub customer_id: String,
    pub customer_name: String,
    /// `Customer::receivables` as stored.
    pub stored: Money,
    /// Σ balance due of the customer's unpaid invoices.
    pub ledger: Money,
}

impl ReceivablesReconciliation {
    /// `stored − ledger`.
    pub fn difference(&self) -> Money {
        self.stored - self.ledger
    }

    pub fn is_balanced(&self) -> bool {
        self.stored == self.ledger
    }
}

/// Σ balance due of the unpaid invoices raised against `customer_id`.
pub fn customer_ledger_balance(invoices: &[Invoice], customer_id: &str) -> Money {
    invoices
        .iter()
        .filter(|inv| inv.customer_id == customer_id && !inv.is_paid())
        .map(|inv| inv.balance_due)
        .sum()
}

/// Compares each customer's stored receivables with the invoice ledger.
///
/// Read-only: stored figures are reported, never overwritten.
pub fn reconcile_receivables(
    customers: &[Customer],
    invoices: &[Invoice],
) -> Vec<ReceivablesReconciliation> {
    let mut ledger: HashMap<&str, Money> = HashMap::new();
    for invoice in invoices.iter().filter(|inv| !inv.is_paid()) {
        *ledger.entry(invoice.customer_id.as_str()).or_default() += invoice.balance_due;
    }

    customers
        .iter()
        .map(|customer| ReceivablesReconciliation {
            customer_id: customer.id.clone(),
            customer_name: customer.name.clone(),
            stored: customer.receivables,
            ledger: ledger.get(customer.id.as_str()).copied().unwrap_or_default(),
        })
        .collect()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::seed_snapshot;
    use chrono::TimeZone;
    use proptest::prelude::*;

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    fn invoice_due(due: NaiveDate, balance: Money, status: InvoiceStatus) -> Invoice {
        Invoice {
            id: "inv".to_string(),
            invoice_number: "INV-T".to_string(),
            customer_id: "cust".to_string(),
            customer_name: "Test".to_string(),
            date: due,
            due_date: due,
            status,
            items: Vec::new(),
            sub_total: balance,
            total_tax: Money::zero(),
            total_discount: Money::zero(),
            grand_total: balance,
            balance_due: balance,
        }
    }

    #[test]
    fn test_bucket_boundaries() {
        assert_eq!(AgingBucket::for_days_past_due(-3), AgingBucket::Current);
        assert_eq!(AgingBucket::for_days_past_due(0), AgingBucket::Current);
        assert_eq!(AgingBucket::for_days_past_due(1), AgingBucket::Overdue1To15);
        assert_eq!(AgingBucket::for_days_past_due(15), AgingBucket::Overdue1To15);
        assert_eq!(AgingBucket::for_days_past_due(16), AgingBucket::Overdue16To30);
        assert_eq!(AgingBucket::for_days_past_due(30), AgingBucket::Overdue16To30);
        assert_eq!(AgingBucket::for_days_past_due(31), AgingBucket::Overdue31To45);
        assert_eq!(AgingBucket::for_days_past_due(45), AgingBucket::Overdue31To45);
        assert_eq!(AgingBucket::for_days_past_due(46), AgingBucket::OverdueAbove45);
    }

    #[test]
    fn test_days_past_due_rounds_up_partial_days() {
        let due = NaiveDate::from_ymd_opt(2025, 2, 25).unwrap();
        assert_eq!(days_past_due(due, at(2025, 3, 1, 9)), 5);
        assert_eq!(days_past_due(due, at(2025, 2, 26, 0)), 1);
        assert_eq!(days_past_due(due, at(2025, 2, 24, 23)), 0);
    }

    #[test]
    fn test_seed_aging_before_inv_5_due() {
        let snapshot = seed_snapshot();
        let aging = ReceivablesAging::compute(&snapshot.invoices, at(2025, 3, 1, 9));

        // INV-2025-005 (due 2025-03-20) is not yet due
        assert_eq!(aging.current, Money::from_major(15_000));
        // INV-2025-003 (due 2025-02-25): 5 days
        assert_eq!(aging.overdue_1_15, Money::from_major_minor(62_343, 75));
        // INV-2025-002 (due 2025-02-01): 29 days
        assert_eq!(aging.overdue_16_30, Money::from_major(55_000));
        assert_eq!(aging.overdue_31_45, Money::zero());
        assert_eq!(aging.overdue_above_45, Money::zero());
        assert_eq!(aging.total, Money::from_major_minor(132_343, 75));
        assert_eq!(aging.bucket_sum(), aging.total);
    }

    #[test]
    fn test_seed_inv_5_on_and_after_due_date() {
        let snapshot = seed_snapshot();
        let inv_5: Vec<Invoice> = snapshot
            .invoices
            .into_iter()
            .filter(|inv| inv.invoice_number == "INV-2025-005")
            .collect();
        assert_eq!(inv_5[0].grand_total, Money::from_major(31_500));

        let at_midnight = ReceivablesAging::compute(&inv_5, at(2025, 3, 20, 0));
        assert_eq!(at_midnight.current, Money::from_major(15_000));

        let mid_morning = ReceivablesAging::compute(&inv_5, at(2025, 3, 20, 10));
        assert_eq!(mid_morning.overdue_1_15, Money::from_major(15_000));

        let much_later = ReceivablesAging::compute(&inv_5, at(2025, 5, 10, 12));
        assert_eq!(much_later.overdue_above_45, Money::from_major(15_000));
    }

    #[test]
    fn test_paid_invoices_excluded() {
        let due = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        let invoices = vec![
            invoice_due(due, Money::from_major(100), InvoiceStatus::Paid),
            invoice_due(due, Money::from_major(40), InvoiceStatus::Draft),
        ];
        let aging = ReceivablesAging::compute(&invoices, at(2025, 1, 10, 0));
        assert_eq!(aging.total, Money::from_major(40));
        assert_eq!(aging.overdue_1_15, Money::from_major(40));
    }

    #[test]
    fn test_invoice_stats() {
        let stats = InvoiceStats::compute(&seed_snapshot().invoices);
        assert_eq!(stats.total, 5);
        assert_eq!(stats.paid, 2);
        assert_eq!(stats.pending, 2);
        assert_eq!(stats.overdue, 1);
        assert_eq!(stats.draft, 0);
    }

    #[test]
    fn test_reconciliation_reports_without_mutating() {
        let snapshot = seed_snapshot();
        let report = reconcile_receivables(&snapshot.customers, &snapshot.invoices);

        let techflow = report.iter().find(|r| r.customer_id == "cust_1").unwrap();
        assert_eq!(techflow.stored, Money::from_major(150_000));
        assert_eq!(techflow.ledger, Money::from_major(15_000));
        assert_eq!(techflow.difference(), Money::from_major(135_000));
        assert!(!techflow.is_balanced());

        let alex = report.iter().find(|r| r.customer_id == "cust_3").unwrap();
        assert!(alex.is_balanced());

        assert_eq!(
            customer_ledger_balance(&snapshot.invoices, "cust_4"),
            Money::from_major_minor(62_343, 75)
        );
    }

    proptest! {
        #[test]
        fn prop_bucket_sum_equals_total(
            entries in prop::collection::vec((-120i64..120, 0i64..10_000_000, any::<bool>()), 0..40),
            hour in 0u32..24,
        ) {
            let now = at(2025, 6, 1, hour);
            let invoices: Vec<Invoice> = entries
                .iter()
                .map(|(offset, cents, paid)| {
                    let due = now.date_naive() + chrono::Duration::days(*offset);
                    let status = if *paid { InvoiceStatus::Paid } else { InvoiceStatus::Pending };
                    invoice_due(due, Money::from_cents(*cents), status)
                })
                .collect();

            let aging = ReceivablesAging::compute(&invoices, now);
            prop_assert_eq!(aging.bucket_sum(), aging.total);

            let unpaid: Money = invoices.iter().filter(|i| !i.is_paid()).map(|i| i.balance_due).sum();
            prop_assert_eq!(aging.total, unpaid);
        }
    }
}
