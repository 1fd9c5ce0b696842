//! # Seed Dataset
//!
//! The demo back office: four customers, three suppliers, five items, five
//! invoices for early 2025 and seven payments. Used by the `seed` binary and
//! throughout the tests.

use chrono::NaiveDate;

use crate::money::Money;
use crate::store::StoreSnapshot;
use crate::types::{
    Customer, CustomerStatus, CustomerType, Invoice, InvoiceLineItem, InvoiceStatus, Item,
    Payment, PaymentMode, PaymentStatus, PaymentTerms, Rate, Supplier,
};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    // Literal calendar dates below are all valid.
    NaiveDate::from_ymd_opt(y, m, d).unwrap_or_default()
}

fn opt(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}

/// Builds the full seed snapshot.
pub fn seed_snapshot() -> StoreSnapshot {
    StoreSnapshot {
        customers: seed_customers(),
        items: seed_items(),
        suppliers: seed_suppliers(),
        invoices: seed_invoices(),
        payments: seed_payments(),
    }
}

// =============================================================================
// Customers
// =============================================================================

#[allow(clippy::too_many_arguments)]
fn customer(
    id: &str,
    name: &str,
    (salutation, first, last): (&str, &str, &str),
    company: &str,
    email: &str,
    (phone, mobile): (&str, &str),
    currency: &str,
    customer_type: CustomerType,
    receivables: Money,
    unused_credits: Money,
    payment_terms: PaymentTerms,
) -> Customer {
    Customer {
        id: id.to_string(),
        salutation: opt(salutation),
        first_name: opt(first),
        last_name: opt(last),
        name: name.to_string(),
        company_name: opt(company),
        email: email.to_string(),
        phone: phone.to_string(),
        mobile: opt(mobile),
        currency: currency.to_string(),
        website: None,
        receivables,
        unused_credits,
        customer_type,
        status: CustomerStatus::Active,
        remarks: None,
        payment_terms,
    }
}

pub fn seed_customers() -> Vec<Customer> {
    vec![
        customer(
            "cust_1",
            "TechFlow Solutions",
            ("Mr.", "David", "Miller"),
            "TechFlow Solutions",
            "david@techflow.com",
            ("+1 555-0101", "+1 555-0102"),
            "LKR",
            CustomerType::Business,
            Money::from_major(150_000),
            Money::from_major(5_000),
            PaymentTerms::Net30,
        ),
        customer(
            "cust_2",
            "GreenLeaf Organics",
            ("Ms.", "Sarah", "Connor"),
            "GreenLeaf Organics",
            "sarah@greenleaf.com",
            ("+1 555-0201", ""),
            "USD",
            CustomerType::Business,
            Money::from_major(45_000),
            Money::zero(),
            PaymentTerms::DueOnReceipt,
        ),
        customer(
            "cust_3",
            "Alex Johnson",
            ("Mr.", "Alex", "Johnson"),
            "",
            "alex.j@email.com",
            ("+1 555-0301", "+1 555-0302"),
            "LKR",
            CustomerType::Individual,
            Money::zero(),
            Money::zero(),
            PaymentTerms::DueOnReceipt,
        ),
        customer(
            "cust_4",
            "Apex Construction",
            ("Mr.", "Robert", "Stone"),
            "Apex Construction Ltd",
            "accounts@apexconst.com",
            ("+1 555-0401", ""),
            "LKR",
            CustomerType::Business,
            Money::from_major(250_000),
            Money::from_major(12_000),
            PaymentTerms::Net15,
        ),
    ]
}

// =============================================================================
// Suppliers
// =============================================================================

fn supplier(
    id: &str,
    name: &str,
    contact_person: &str,
    address: &str,
    (phone, mobile): (&str, &str),
    email: &str,
) -> Supplier {
    Supplier {
        id: id.to_string(),
        name: name.to_string(),
        contact_person: contact_person.to_string(),
        address: address.to_string(),
        phone: phone.to_string(),
        mobile: mobile.to_string(),
        email: email.to_string(),
    }
}

pub fn seed_suppliers() -> Vec<Supplier> {
    vec![
        supplier(
            "supp_1",
            "Global Electronics Ltd",
            "James Wu",
            "45 Tech Park, Silicon Valley",
            ("+1 888-0001", "+1 888-0002"),
            "sales@globalelectronics.com",
        ),
        supplier(
            "supp_2",
            "Office Depot Wholesale",
            "Linda Martinez",
            "100 Main St, Business City",
            ("+1 888-1111", ""),
            "support@officedepot.com",
        ),
        supplier(
            "supp_3",
            "Fresh Harvest Co",
            "Tom Baker",
            "22 Farm Road, Countryside",
            ("+1 888-2222", "+1 888-2223"),
            "orders@freshharvest.com",
        ),
    ]
}

// =============================================================================
// Items
// =============================================================================

#[allow(clippy::too_many_arguments)]
fn item(
    id: &str,
    sku: &str,
    name: &str,
    description: &str,
    category: &str,
    (stock_qty, unit): (i64, &str),
    (cost, price): (i64, i64),
    supplier: &str,
) -> Item {
    Item {
        id: id.to_string(),
        sku: sku.to_string(),
        name: name.to_string(),
        description: description.to_string(),
        category: category.to_string(),
        stock_qty,
        unit: unit.to_string(),
        cost: Money::from_major(cost),
        price: Money::from_major(price),
        image_url: None,
        supplier: opt(supplier),
    }
}

pub fn seed_items() -> Vec<Item> {
    vec![
        item(
            "item_1",
            "HW-LPT-001",
            "ProBook Laptop 15\"",
            "High performance laptop for professionals",
            "Electronics",
            (25, "Unit"),
            (120_000, 155_000),
            "Global Electronics Ltd",
        ),
        item(
            "item_2",
            "HW-MSE-002",
            "Wireless Mouse",
            "Ergonomic wireless optical mouse",
            "Electronics",
            (150, "Unit"),
            (1_500, 3_500),
            "Global Electronics Ltd",
        ),
        item(
            "item_3",
            "OFF-PPR-001",
            "A4 Paper Ream",
            "500 sheets, 80gsm white paper",
            "Stationery",
            (500, "Pack"),
            (850, 1_250),
            "Office Depot Wholesale",
        ),
        item(
            "item_4",
            "SVC-WEB-001",
            "Web Design Basic",
            "5 Page Static Website Design",
            "Services",
            (999, "Hour"),
            (0, 50_000),
            "",
        ),
        item(
            "item_5",
            "FD-COF-001",
            "Premium Coffee Beans",
            "1kg bag of Arabica beans",
            "Beverage",
            (40, "Kg"),
            (3_500, 5_800),
            "Fresh Harvest Co",
        ),
    ]
}

// =============================================================================
// Invoices
// =============================================================================

fn line(item_id: &str, name: &str, quantity: i64, rate: i64, discount_bps: u32, amount: Money) -> InvoiceLineItem {
    InvoiceLineItem {
        item_id: item_id.to_string(),
        name: name.to_string(),
        quantity,
        rate: Money::from_major(rate),
        discount_percent: Rate::from_bps(discount_bps),
        tax_percent: Rate::zero(),
        amount,
    }
}

pub fn seed_invoices() -> Vec<Invoice> {
    vec![
        Invoice {
            id: "inv_1".to_string(),
            invoice_number: "INV-2025-001".to_string(),
            customer_id: "cust_1".to_string(),
            customer_name: "TechFlow Solutions".to_string(),
            date: date(2025, 1, 15),
            due_date: date(2025, 2, 15),
            status: InvoiceStatus::Paid,
            items: vec![
                line("item_1", "ProBook Laptop 15\"", 2, 155_000, 0, Money::from_major(310_000)),
                line("item_2", "Wireless Mouse", 2, 3_500, 0, Money::from_major(7_000)),
            ],
            sub_total: Money::from_major(317_000),
            total_tax: Money::from_major(31_700),
            total_discount: Money::zero(),
            grand_total: Money::from_major(348_700),
            balance_due: Money::zero(),
        },
        Invoice {
            id: "inv_2".to_string(),
            invoice_number: "INV-2025-002".to_string(),
            customer_id: "cust_2".to_string(),
            customer_name: "GreenLeaf Organics".to_string(),
            date: date(2025, 2, 1),
            due_date: date(2025, 2, 1),
            status: InvoiceStatus::Overdue,
            items: vec![line("item_4", "Web Design Basic", 1, 50_000, 0, Money::from_major(50_000))],
            sub_total: Money::from_major(50_000),
            total_tax: Money::from_major(5_000),
            total_discount: Money::zero(),
            grand_total: Money::from_major(55_000),
            balance_due: Money::from_major(55_000),
        },
        Invoice {
            id: "inv_3".to_string(),
            invoice_number: "INV-2025-003".to_string(),
            customer_id: "cust_4".to_string(),
            customer_name: "Apex Construction".to_string(),
            date: date(2025, 2, 10),
            due_date: date(2025, 2, 25),
            status: InvoiceStatus::Pending,
            items: vec![line("item_3", "A4 Paper Ream", 50, 1_250, 500, Money::from_major(59_375))],
            sub_total: Money::from_major(59_375),
            total_tax: Money::from_major_minor(5_937, 50),
            total_discount: Money::from_major_minor(2_968, 75),
            grand_total: Money::from_major_minor(62_343, 75),
            balance_due: Money::from_major_minor(62_343, 75),
        },
        Invoice {
            id: "inv_4".to_string(),
            invoice_number: "INV-2025-004".to_string(),
            customer_id: "cust_3".to_string(),
            customer_name: "Alex Johnson".to_string(),
            date: date(2025, 2, 12),
            due_date: date(2025, 2, 12),
            status: InvoiceStatus::Paid,
            items: vec![line("item_5", "Premium Coffee Beans", 2, 5_800, 0, Money::from_major(11_600))],
            sub_total: Money::from_major(11_600),
            total_tax: Money::from_major(1_160),
            total_discount: Money::zero(),
            grand_total: Money::from_major(12_760),
            balance_due: Money::zero(),
        },
        Invoice {
            id: "inv_5".to_string(),
            invoice_number: "INV-2025-005".to_string(),
            customer_id: "cust_1".to_string(),
            customer_name: "TechFlow Solutions".to_string(),
            date: date(2025, 2, 20),
            due_date: date(2025, 3, 20),
            status: InvoiceStatus::Pending,
            items: vec![line("item_2", "Wireless Mouse", 10, 3_500, 1000, Money::from_major(31_500))],
            sub_total: Money::from_major(31_500),
            total_tax: Money::from_major(3_150),
            total_discount: Money::from_major(3_150),
            grand_total: Money::from_major(31_500),
            // Partially paid (PAY-003).
            balance_due: Money::from_major(15_000),
        },
    ]
}

// =============================================================================
// Payments
// =============================================================================

#[allow(clippy::too_many_arguments)]
fn payment(
    id: &str,
    date: NaiveDate,
    payment_number: &str,
    reference_number: &str,
    customer_name: &str,
    invoice_numbers: &[&str],
    mode: PaymentMode,
    (amount, unused_amount): (i64, i64),
) -> Payment {
    Payment {
        id: id.to_string(),
        date,
        payment_number: payment_number.to_string(),
        reference_number: reference_number.to_string(),
        customer_name: customer_name.to_string(),
        invoice_numbers: invoice_numbers.iter().map(|n| n.to_string()).collect(),
        mode,
        amount: Money::from_major(amount),
        unused_amount: Money::from_major(unused_amount),
        status: PaymentStatus::Paid,
    }
}

pub fn seed_payments() -> Vec<Payment> {
    vec![
        payment(
            "pay_1",
            date(2025, 1, 20),
            "PAY-001",
            "TRX-998877",
            "TechFlow Solutions",
            &["INV-2025-001"],
            PaymentMode::BankTransfer,
            (348_700, 0),
        ),
        payment(
            "pay_2",
            date(2025, 2, 12),
            "PAY-002",
            "CASH",
            "Alex Johnson",
            &["INV-2025-004"],
            PaymentMode::Cash,
            (12_760, 0),
        ),
        payment(
            "pay_3",
            date(2025, 2, 22),
            "PAY-003",
            "CHQ-45561",
            "TechFlow Solutions",
            &["INV-2025-005"],
            PaymentMode::Cheque,
            (16_500, 0),
        ),
        payment(
            "pay_4",
            date(2025, 2, 15),
            "PAY-004",
            "TRX-112233",
            "Apex Construction",
            &[],
            PaymentMode::BankTransfer,
            (50_000, 50_000),
        ),
        payment(
            "pay_5",
            date(2025, 2, 18),
            "PAY-005",
            "CASH",
            "Local Customer",
            &[],
            PaymentMode::Cash,
            (2_500, 0),
        ),
        payment(
            "pay_6",
            date(2025, 2, 25),
            "PAY-006",
            "TRX-445566",
            "TechFlow Solutions",
            &["INV-2025-001"],
            PaymentMode::BankTransfer,
            (10_000, 10_000),
        ),
        payment(
            "pay_7",
            date(2025, 2, 26),
            "PAY-007",
            "CARD-1234",
            "Walk-in Customer",
            &[],
            PaymentMode::CreditCard,
            (15_400, 0),
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_counts() {
        let snapshot = seed_snapshot();
        assert_eq!(snapshot.customers.len(), 4);
        assert_eq!(snapshot.suppliers.len(), 3);
        assert_eq!(snapshot.items.len(), 5);
        assert_eq!(snapshot.invoices.len(), 5);
        assert_eq!(snapshot.payments.len(), 7);
    }

    #[test]
    fn test_seed_invoice_totals_consistent() {
        for invoice in seed_invoices() {
            assert_eq!(
                invoice.grand_total,
                invoice.sub_total + invoice.total_tax - invoice.total_discount,
                "{}",
                invoice.invoice_number
            );
        }
    }

    #[test]
    fn test_seed_fractional_amounts() {
        let inv_3 = &seed_invoices()[2];
        assert_eq!(inv_3.total_tax.cents(), 593_750);
        assert_eq!(inv_3.total_discount.cents(), 296_875);
        assert_eq!(inv_3.balance_due.cents(), 6_234_375);
    }
}
