//! # Seed Data Generator
//!
//! Populates the database with campaigns and coupons for development.
//!
//! ## Usage
//! ```bash
//! # Seed with defaults
//! cargo run -p bazaar-db --bin seed
//!
//! # Specify database path and seller count
//! cargo run -p bazaar-db --bin seed -- --db ./bazaar_dev.db --sellers 20
//! ```
//!
//! ## Generated Data
//! - One percent and one fixed campaign per seller, staggered windows
//! - A handful of coupons covering every coupon kind
//! - Zero-balance wallets for the demo sellers

use chrono::{Duration, Utc};
use std::env;
use uuid::Uuid;

use bazaar_core::{Campaign, CampaignKind, Category, Coupon, CouponKind};
use bazaar_db::{Database, DbConfig};

/// Categories cycled across the generated campaigns.
const CAMPAIGN_CATEGORIES: &[Category] = &[
    Category::Electronics,
    Category::Fashion,
    Category::HomeGarden,
    Category::Sports,
    Category::Books,
    Category::Collectibles,
];

/// Demo coupons: (code, kind, value, min_subtotal_cents, max_discount_cents).
const COUPONS: &[(&str, CouponKind, i64, i64, Option<i64>)] = &[
    ("WELCOME10", CouponKind::OrderPercent, 1000, 0, Some(2000)),
    ("FIVEOFF", CouponKind::OrderFixed, 500, 0, None),
    ("TECH15", CouponKind::TypePercent, 1500, 0, Some(5000)),
    ("BOOKWORM", CouponKind::TypeFixed, 300, 0, None),
    ("BIGSPENDER", CouponKind::ThresholdPercent, 2000, 50000, Some(10000)),
    ("FREESHIP", CouponKind::ThresholdFixed, 1000, 10000, None),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut sellers: usize = 10;
    let mut db_path = String::from("./bazaar_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--sellers" | "-s" => {
                if i + 1 < args.len() {
                    sellers = args[i + 1].parse().unwrap_or(10);
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
                println!("Bazaar Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -s, --sellers <N>  Number of demo sellers (default: 10)");
                println!("  -d, --db <PATH>    Database file path (default: ./bazaar_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .init();

    println!("🌱 Bazaar Seed Data Generator");
    println!("=============================");
    println!("Database: {}", db_path);
    println!("Sellers:  {}", sellers);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    // Idempotence check: an existing demo coupon means we already seeded.
    if db.coupons().find_by_code(COUPONS[0].0).await?.is_some() {
        println!("⚠ Database already seeded.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    println!();
    println!("Generating campaigns...");

    let now = Utc::now();
    let mut campaigns = 0;

    for n in 0..sellers {
        let seller_id = format!("seller-{:03}", n + 1);
        db.wallets().ensure_wallet(&seller_id).await?;

        // Live percent campaign scoped to one category.
        let percent = Campaign {
            id: Uuid::new_v4().to_string(),
            seller_id: seller_id.clone(),
            kind: CampaignKind::Percent,
            value: 500 + ((n as i64 * 250) % 2000), // 5% - 25% in bps
            starts_at: now - Duration::days(1),
            ends_at: now + Duration::days(14),
            is_active: true,
            listing_ids: vec![],
            categories: vec![CAMPAIGN_CATEGORIES[n % CAMPAIGN_CATEGORIES.len()]],
            apply_to_future_listings: n % 3 == 0,
            created_at: now,
        };
        db.campaigns().insert(&percent).await?;

        // Blanket fixed campaign starting next week.
        let fixed = Campaign {
            id: Uuid::new_v4().to_string(),
            seller_id,
            kind: CampaignKind::Fixed,
            value: 100 + ((n as i64 * 75) % 900), // $1.00 - $9.99 off
            starts_at: now + Duration::days(7),
            ends_at: now + Duration::days(21),
            is_active: true,
            listing_ids: vec![],
            categories: vec![],
            apply_to_future_listings: false,
            created_at: now,
        };
        db.campaigns().insert(&fixed).await?;

        campaigns += 2;
    }

    println!("✓ Generated {} campaigns", campaigns);

    println!();
    println!("Generating coupons...");

    for (code, kind, value, min_subtotal, max_discount) in COUPONS {
        let categories = if kind.is_category_scoped() {
            vec![if *code == "BOOKWORM" {
                Category::Books
            } else {
                Category::Electronics
            }]
        } else {
            vec![]
        };

        let coupon = Coupon {
            id: Uuid::new_v4().to_string(),
            code: code.to_string(),
            kind: *kind,
            value: *value,
            min_subtotal_cents: *min_subtotal,
            max_discount_cents: *max_discount,
            categories,
            usage_limit: Some(1000),
            used_count: 0,
            per_user_limit: Some(3),
            starts_at: now - Duration::days(1),
            ends_at: now + Duration::days(30),
            is_active: true,
        };
        db.coupons().insert(&coupon).await?;
        println!("  {}", code);
    }

    println!();
    println!("✓ Seed complete!");

    Ok(())
}
