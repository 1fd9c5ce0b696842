//! # Seed Data Loader
//!
//! Loads the demo dataset into a database and prints the dashboard figures
//! computed from it.
//!
//! ## Usage
//! ```bash
//! # Seed ./tally_dev.db (skipped if it already has data)
//! cargo run -p tally-db --bin seed
//!
//! # Overwrite whatever is there
//! cargo run -p tally-db --bin seed -- --force
//!
//! # Specify database path
//! cargo run -p tally-db --bin seed -- --db ./data/tally.db
//! ```
//!
//! ## Dataset
//! 4 customers, 3 suppliers, 5 items, 5 invoices and 7 payments. Amounts are
//! in LKR unless `TALLY_CURRENCY` says otherwise.

use chrono::Utc;
use std::env;
use tracing_subscriber::EnvFilter;

use tally_core::aging::{reconcile_receivables, AgingBucket};
use tally_core::fixtures::seed_snapshot;
use tally_core::{EntityStore, InvoiceStats, LedgerConfig, ReceivablesAging};
use tally_db::{Database, DbConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./tally_dev.db");
    let mut force = false;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--force" | "-f" => force = true,
            "--help" | "-h" => {
                println!("Tally Seed Data Loader");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./tally_dev.db)");
                println!("  -f, --force        Replace existing data");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            other => eprintln!("Ignoring unknown argument: {other}"),
        }
        i += 1;
    }

    println!("🌱 Tally Seed Data Loader");
    println!("=========================");
    println!("Database: {}", db_path);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    if db.is_empty().await? || force {
        let snapshot = seed_snapshot();
        db.replace_all(&snapshot).await?;
        println!(
            "✓ Seeded {} customers, {} suppliers, {} items, {} invoices, {} payments",
            snapshot.customers.len(),
            snapshot.suppliers.len(),
            snapshot.items.len(),
            snapshot.invoices.len(),
            snapshot.payments.len()
        );
    } else {
        println!("⚠ Database already has data");
        println!("  Skipping seed to avoid overwriting it.");
        println!("  Pass --force to replace it.");
    }

    let store = EntityStore::from_snapshot(db.load_all().await?, LedgerConfig::from_env());
    let config = store.config();
    let now = Utc::now();

    println!();
    println!("Receivables aging ({})", now.format("%Y-%m-%d %H:%M UTC"));
    let aging = ReceivablesAging::compute(store.invoices(), now);
    for bucket in AgingBucket::ALL {
        println!(
            "  {:<16} {:>20}",
            bucket.label(),
            config.format_currency(aging.bucket(bucket))
        );
    }
    println!("  {:<16} {:>20}", "Total", config.format_currency(aging.total));

    let stats = InvoiceStats::compute(store.invoices());
    println!();
    println!(
        "Invoices: {} total, {} draft, {} pending, {} overdue, {} paid",
        stats.total, stats.draft, stats.pending, stats.overdue, stats.paid
    );

    let mismatched: Vec<_> = reconcile_receivables(store.customers(), store.invoices())
        .into_iter()
        .filter(|r| !r.is_balanced())
        .collect();
    if !mismatched.is_empty() {
        println!();
        println!("Stored receivables differing from the invoice ledger:");
        for row in mismatched {
            println!(
                "  {:<24} stored {:>18}  ledger {:>18}",
                row.customer_name,
                config.format_currency(row.stored),
                config.format_currency(row.ledger)
            );
        }
    }

    db.close().await;

    println!();
    println!("✓ Seed complete!");

    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tally=debug,sqlx=warn"));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}
