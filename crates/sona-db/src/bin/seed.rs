//! # Rate Card Seeder
//!
//! Bootstraps a database with the default metal rate card so billing can
//! start before the operator has entered the day's rates.
//!
//! ## Usage
//! ```bash
//! # Seed the default database
//! cargo run -p sona-db --bin seed
//!
//! # Specify database path
//! cargo run -p sona-db --bin seed -- --db ./data/sona.db
//! ```
//!
//! Seeding is idempotent: (metal, purity) pairs already on record are left
//! untouched, so re-running after the shop has adjusted rates is safe.
//! Seeding never runs implicitly on pool open; this binary is the only
//! place defaults enter a database.

use std::env;

use tracing_subscriber::EnvFilter;

use sona_core::MetalType;
use sona_db::{Database, DbConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Honour RUST_LOG when set; default keeps migration progress visible
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,sona_db=debug,sqlx=warn"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    // Parse command line arguments
    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./sona_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Sona POS Rate Card Seeder");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./sona_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Sona POS Rate Card Seeder");
    println!("============================");
    println!("Database: {}", db_path);
    println!();

    // Connect to database
    let config = DbConfig::new(&db_path);
    let db = Database::new(config).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");
    println!();

    let inserted = db.rates().seed_defaults().await?;
    let rates = db.rates().list().await?;

    if inserted == 0 {
        println!("⚠ All default (metal, purity) pairs already on record");
        println!("  Existing rates were left untouched.");
    } else {
        println!(
            "✓ Seeded {} default rates ({} pairs on record)",
            inserted,
            rates.len()
        );
    }

    println!();
    println!("Rate card:");
    for rate in &rates {
        println!(
            "  {:<14} {:<8} {:>14} per {}",
            rate.metal_type.to_string(),
            rate.purity,
            rate.rate().to_string(),
            rate_unit(rate.metal_type),
        );
    }

    println!();
    println!("✓ Seed complete!");

    Ok(())
}

/// Unit label for the rate listing.
fn rate_unit(metal_type: MetalType) -> &'static str {
    match metal_type {
        MetalType::Diamond => "carat",
        _ => "gram",
    }
}
