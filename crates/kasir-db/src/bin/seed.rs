//! # Seed Data Generator
//!
//! Populates the database with a small warung catalog for development.
//!
//! ## Usage
//! ```bash
//! cargo run -p kasir-db --bin seed
//!
//! # Specify database path
//! cargo run -p kasir-db --bin seed -- --db ./data/kasir.db
//! ```
//!
//! ## Generated Data
//! - Categories: Minuman, Makanan, Sembako
//! - Products with and without a known cost price
//! - One product-scoped, one category-scoped and two global discounts,
//!   valid for 30 days from now

use std::env;

use anyhow::Context;
use chrono::{Duration, Utc};
use kasir_core::{DiscountKind, Money};
use kasir_db::{Database, DbConfig, NewDiscount, NewProduct};

/// (category, [(name, price, cost, stock)]), prices in rupiah.
const CATALOG: &[(&str, &[(&str, i64, Option<i64>, i64)])] = &[
    (
        "Minuman",
        &[
            ("Aqua 600ml", 3_500, Some(2_400), 120),
            ("Teh Botol Sosro", 4_500, Some(3_200), 80),
            ("Kopi Kapal Api Sachet", 2_000, Some(1_500), 200),
            ("Es Teh Manis", 5_000, None, 50),
        ],
    ),
    (
        "Makanan",
        &[
            ("Indomie Goreng", 3_500, Some(2_800), 150),
            ("Roti Tawar Sari Roti", 15_000, Some(12_000), 20),
            ("Chitato 68g", 11_000, Some(8_500), 40),
            ("Gorengan", 2_000, None, 60),
        ],
    ),
    (
        "Sembako",
        &[
            ("Beras 5kg", 75_000, Some(68_000), 25),
            ("Gula Pasir 1kg", 16_000, Some(14_000), 40),
            ("Minyak Goreng 1L", 18_000, Some(16_500), 30),
            ("Telur 1kg", 28_000, Some(25_000), 15),
        ],
    ),
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn,kasir_db=info")),
        )
        .init();

    let args: Vec<String> = env::args().collect();
    let mut db_path = String::from("./kasir_dev.db");

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
                println!("Kasir Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./kasir_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Kasir Seed Data Generator");
    println!("============================");
    println!("Database: {}", db_path);
    println!();

    let db = Database::new(DbConfig::new(&db_path))
        .await
        .with_context(|| format!("opening {db_path}"))?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.products().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} products", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    let mut first_product = None;
    let mut drinks = None;
    let mut generated = 0;

    for (category_name, products) in CATALOG {
        let category = db
            .categories()
            .insert(category_name, None)
            .await
            .with_context(|| format!("inserting category {category_name}"))?;
        if *category_name == "Minuman" {
            drinks = Some(category.id);
        }

        for (name, price, cost, stock) in products.iter() {
            let mut product = NewProduct::new(*name, Money::from_major(*price), *stock)
                .category(category.id);
            if let Some(cost) = cost {
                product = product.cost_price(Money::from_major(*cost));
            }

            let inserted = db
                .products()
                .insert(&product)
                .await
                .with_context(|| format!("inserting product {name}"))?;
            first_product.get_or_insert(inserted.id);
            generated += 1;
        }
    }

    println!("✓ Generated {} products", generated);

    let start = Utc::now() - Duration::hours(1);
    let end = start + Duration::days(30);
    let mut discounts = vec![
        NewDiscount::global("Gajian 10%", DiscountKind::Percentage, 1_000, start, end)
            .min_order(Money::from_major(100_000)),
        NewDiscount::global(
            "Potongan Rp5.000",
            DiscountKind::Fixed,
            Money::from_major(5_000).cents(),
            start,
            end,
        )
        .min_order(Money::from_major(50_000)),
    ];
    if let Some(product_id) = first_product {
        discounts.push(
            NewDiscount::global(
                "Promo Aqua Rp500",
                DiscountKind::Fixed,
                Money::from_major(500).cents(),
                start,
                end,
            )
            .for_product(product_id),
        );
    }
    if let Some(category_id) = drinks {
        discounts.push(
            NewDiscount::global("Minuman 5%", DiscountKind::Percentage, 500, start, end)
                .for_category(category_id),
        );
    }

    for discount in &discounts {
        db.discounts()
            .insert(discount)
            .await
            .with_context(|| format!("inserting discount {}", discount.name))?;
    }

    println!("✓ Generated {} discounts", discounts.len());

    let selectable = db.discounts().list_selectable(Utc::now()).await?;
    println!("  Selectable at checkout: {}", selectable.len());

    db.close().await;

    println!();
    println!("✓ Seed complete!");

    Ok(())
}
