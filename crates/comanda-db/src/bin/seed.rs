//! # Seed Data Generator
//!
//! Creates a demo restaurant with a small menu for development.
//!
//! ## Usage
//! ```bash
//! cargo run -p comanda-db --bin seed
//!
//! # Specify database path and restaurant e-mail
//! cargo run -p comanda-db --bin seed -- --db ./data/comanda.db --email demo@example.com
//! ```
//!
//! Prints the restaurant id and every product id, ready to be used in a
//! sale request.

use chrono::Utc;
use comanda_core::Product;
use comanda_db::repository::product::generate_product_id;
use comanda_db::{Database, DbConfig, DbError, NewTenant};
use std::env;

/// Menu sections with (name, price in cents, active).
const MENU: &[(&str, &[(&str, i64, bool)])] = &[
    (
        "Hamburguesas",
        &[
            ("Hamburguesa clásica", 1000, true),
            ("Hamburguesa doble", 1450, true),
            ("Hamburguesa de pollo", 1150, true),
            ("Hamburguesa BBQ", 1300, false),
        ],
    ),
    (
        "Tacos",
        &[
            ("Taco al pastor", 250, true),
            ("Taco de suadero", 250, true),
            ("Gringa", 650, true),
        ],
    ),
    (
        "Bebidas",
        &[
            ("Refresco", 350, true),
            ("Agua de jamaica", 300, true),
            ("Café americano", 400, true),
            ("Cerveza", 550, true),
        ],
    ),
    (
        "Postres",
        &[("Flan napolitano", 450, true), ("Pastel de chocolate", 600, true)],
    ),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./comanda.db");
    let mut email = String::from("demo@comanda.local");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--email" | "-e" => {
                if i + 1 < args.len() {
                    email = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Comanda Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>       Database file path (default: ./comanda.db)");
                println!("  -e, --email <EMAIL>   Restaurant e-mail (default: demo@comanda.local)");
                println!("  -h, --help            Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Comanda Seed Data Generator");
    println!("==============================");
    println!("Database: {}", db_path);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;
    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let tenant = match db
        .tenants()
        .insert(&NewTenant {
            name: "La Esquina".to_string(),
            email: email.clone(),
            phone: Some("555-0100".to_string()),
            address: Some("Av. Reforma 123, CDMX".to_string()),
            tax_id: Some("ESQ010101AAA".to_string()),
            logo_url: None,
        })
        .await
    {
        Ok(tenant) => tenant,
        Err(DbError::UniqueViolation { .. }) => {
            println!("⚠ A restaurant with e-mail {} already exists", email);
            println!("  Skipping seed to avoid duplicates.");
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    println!("✓ Restaurant: {} ({})", tenant.name, tenant.id);
    println!();

    let products = db.products();
    let mut generated = 0;

    for (sort_order, (category, items)) in (1i64..).zip(MENU) {
        let category_id = products.insert_category(&tenant.id, category, sort_order).await?;
        println!("{}", category);

        for (name, price_cents, is_active) in items.iter() {
            let now = Utc::now();
            let product = Product {
                id: generate_product_id(),
                tenant_id: tenant.id.clone(),
                category_id: Some(category_id.clone()),
                name: name.to_string(),
                description: None,
                price_cents: *price_cents,
                image_url: None,
                is_active: *is_active,
                created_at: now,
                updated_at: now,
            };

            if let Err(e) = products.insert(&product).await {
                eprintln!("Failed to insert {}: {}", product.name, e);
                continue;
            }

            let marker = if *is_active { "" } else { " (inactive)" };
            println!(
                "  {} {:<24} {}{}",
                product.id,
                product.name,
                product.price(),
                marker
            );
            generated += 1;
        }
    }

    println!();
    println!("✓ Seed complete: {} products", generated);
    println!("  tenant_id = {}", tenant.id);

    Ok(())
}
