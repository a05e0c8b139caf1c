//! # Seed Data Generator
//!
//! Populates the ledger with sample data for development.
//!
//! ## Usage
//! ```bash
//! # Generate 500 expenses (default)
//! cargo run -p outlay-db --bin seed
//!
//! # Generate custom amount
//! cargo run -p outlay-db --bin seed -- --count 2000
//!
//! # Specify database path
//! cargo run -p outlay-db --bin seed -- --db ./data/outlay.db
//! ```
//!
//! ## Generated Data
//! Creates a realistic ledger spread over the trailing twelve months:
//! - Expenses across the starter categories with plausible vendors
//! - Two trips with a handful of travel expenses attached
//! - An overall budget plus per-category budgets for the current month
//!
//! Generation is deterministic (index arithmetic, no RNG), so repeated
//! runs against fresh databases produce identical ledgers.

use chrono::{Datelike, Duration, Utc};
use std::env;

use outlay_core::{calendar, NewBudget, NewExpense, NewTrip};
use outlay_db::{Database, DbConfig};

/// Vendors per starter category name. Unknown categories fall back to the
/// first entry's vendor list.
const VENDORS: &[(&str, &[&str])] = &[
    (
        "Food & Dining",
        &[
            "Blue Bottle Coffee",
            "Chipotle",
            "Whole Foods",
            "Shake Shack",
            "Sweetgreen",
            "Trader Joe's",
        ],
    ),
    (
        "Transport",
        &["Uber", "Lyft", "Shell", "BART", "Chevron", "City Parking"],
    ),
    (
        "Shopping",
        &["Amazon", "Target", "Uniqlo", "REI", "Best Buy", "IKEA"],
    ),
    (
        "Entertainment",
        &["AMC Theatres", "Steam", "Spotify", "Netflix", "Ticketmaster"],
    ),
    (
        "Bills & Utilities",
        &["PG&E", "Comcast", "T-Mobile", "Water District"],
    ),
    (
        "Health",
        &["CVS Pharmacy", "Walgreens", "24 Hour Fitness", "Kaiser"],
    ),
    (
        "Travel",
        &["United Airlines", "Marriott", "Airbnb", "Hertz", "JR East"],
    ),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .init();

    // Parse command line arguments
    let args: Vec<String> = env::args().collect();

    let mut count: usize = 500;
    let mut db_path = String::from("./outlay_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--count" | "-c" => {
                if i + 1 < args.len() {
                    count = args[i + 1].parse().unwrap_or(500);
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Outlay Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --count <N>    Number of expenses to generate (default: 500)");
                println!("  -d, --db <PATH>    Database file path (default: ./outlay_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Outlay Seed Data Generator");
    println!("=============================");
    println!("Database: {}", db_path);
    println!("Expenses: {}", count);
    println!();

    // Connect; migrations and first-run category seeding happen here
    let db = Database::new(DbConfig::new(&db_path)).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.expenses().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} expenses", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    let categories = db.categories().list().await?;
    let today = Utc::now().date_naive();

    // Two trips, one past and one ongoing
    println!();
    println!("Creating trips...");
    let past_trip = db
        .trips()
        .create(NewTrip {
            name: "Tokyo Spring".to_string(),
            description: Some("Cherry blossom season".to_string()),
            start_date: Some(today - Duration::days(160)),
            end_date: Some(today - Duration::days(148)),
        })
        .await?;
    let open_trip = db
        .trips()
        .create(NewTrip {
            name: "Pacific Coast Drive".to_string(),
            description: None,
            start_date: Some(today - Duration::days(9)),
            end_date: None,
        })
        .await?;
    println!("  Created 2 trips");

    // Expenses over the trailing year
    println!();
    println!("Generating expenses...");

    let mut generated = 0;
    let start = std::time::Instant::now();

    for idx in 0..count {
        let category = &categories[idx % categories.len()];
        let vendors = VENDORS
            .iter()
            .find(|(name, _)| *name == category.name)
            .map(|(_, v)| *v)
            .unwrap_or(VENDORS[0].1);
        let vendor = vendors[idx % vendors.len()];

        // Spread over ~365 days, cents $1.50 - $121.49
        let date = today - Duration::days((idx * 7 % 365) as i64);
        let amount_cents = 150 + ((idx * 37) % 12000) as i64;

        // Every 11th expense joins a trip
        let trip_id = match idx % 11 {
            0 => Some(past_trip.id),
            5 => Some(open_trip.id),
            _ => None,
        };

        db.expenses()
            .create(NewExpense {
                amount_cents,
                date,
                category_id: Some(category.id),
                trip_id,
                vendor: vendor.to_string(),
                location: String::new(),
                notes: None,
                receipt_path: None,
            })
            .await?;

        generated += 1;
        if generated % 100 == 0 {
            println!("  Generated {} expenses...", generated);
        }
    }

    let elapsed = start.elapsed();
    println!();
    println!("✓ Generated {} expenses in {:?}", generated, elapsed);

    // Budgets for the current month
    println!();
    println!("Creating budgets...");

    db.budgets()
        .create(NewBudget {
            amount_cents: 250000,
            month: today.month(),
            year: today.year(),
            category_id: None,
        })
        .await?;
    let mut budget_count = 1;
    for (idx, category) in categories.iter().take(4).enumerate() {
        db.budgets()
            .create(NewBudget {
                amount_cents: 20000 + (idx as i64) * 15000,
                month: today.month(),
                year: today.year(),
                category_id: Some(category.id),
            })
            .await?;
        budget_count += 1;
    }
    println!("  Created {} budgets", budget_count);

    // Sanity-check a report against the seeded data
    println!();
    println!("Verifying reports...");
    let trend = db.reports().monthly_trend(3).await?;
    for bucket in &trend {
        println!("  {}/{}: {}", bucket.month, bucket.year, bucket.total());
    }
    let (first, last) =
        calendar::month_bounds(today.year(), today.month()).expect("current month is valid");
    let breakdown = db.reports().category_breakdown(first, last).await?;
    println!("  Breakdown rows this month: {}", breakdown.len());

    println!();
    println!("✓ Seed complete!");

    Ok(())
}
