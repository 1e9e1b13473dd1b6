//! Seed data script - populates the database with a demo catalog and purchase orders
//!
//! Run with: cargo run --bin seed-data
//!
//! This creates:
//! - 3 parent items with 8 catalog items
//! - 3 purchase orders with line items, one flagged for the WMS

use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set, TransactionTrait};
use tracing::info;

use procurement_api::{
    config, db,
    entities::{item, parent_item, purchase_order, purchase_order_line_item},
};

const CATALOG: &[(&str, &[(&str, &str)])] = &[
    (
        "Shipping Boxes",
        &[
            ("Small box 8x6x4", "BOX-S"),
            ("Medium box 12x10x8", "BOX-M"),
            ("Large box 18x14x12", "BOX-L"),
        ],
    ),
    (
        "Packing Supplies",
        &[
            ("Packing tape 48mm", "TAPE-48"),
            ("Bubble wrap roll", "WRAP-BUB"),
            ("Void fill paper", "FILL-PAP"),
        ],
    ),
    (
        "Labels",
        &[("Thermal label 4x6", "LBL-4X6"), ("Fragile sticker", "LBL-FRAG")],
    ),
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cfg = config::load_config()?;
    config::init_tracing(cfg.log_level(), cfg.log_json);

    info!("=== Procurement API Seed Data ===");

    let conn = db::establish_connection_from_app_config(&cfg).await?;
    db::run_migrations(&conn).await?;

    info!("Creating catalog...");
    let items = create_catalog(&conn).await?;
    info!("  Created {} items", items.len());

    info!("Creating purchase orders...");
    let orders = create_purchase_orders(&conn, &items).await?;
    info!("  Created {} purchase orders", orders);

    info!("=== Seed Data Complete ===");
    info!("Try these API calls:");
    info!("  curl http://localhost:{}/api/parent-items", cfg.port);
    info!("  curl http://localhost:{}/api/purchase-orders", cfg.port);
    info!("Or explore interactively at: http://localhost:{}/swagger-ui", cfg.port);

    Ok(())
}

async fn create_catalog(conn: &DatabaseConnection) -> anyhow::Result<Vec<item::Model>> {
    let now = Utc::now();
    let txn = conn.begin().await?;
    let mut created = Vec::new();

    for (parent_name, entries) in CATALOG {
        let parent = parent_item::ActiveModel {
            name: Set(parent_name.to_string()),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        for (name, sku) in entries.iter() {
            let saved = item::ActiveModel {
                parent_item_id: Set(parent.id),
                name: Set(name.to_string()),
                sku: Set(sku.to_string()),
                created_at: Set(now),
                updated_at: Set(now),
                ..Default::default()
            }
            .insert(&txn)
            .await?;
            created.push(saved);
        }
    }

    txn.commit().await?;
    Ok(created)
}

async fn create_purchase_orders(
    conn: &DatabaseConnection,
    items: &[item::Model],
) -> anyhow::Result<usize> {
    let now = Utc::now();
    let today = now.date_naive();

    let orders: [(&str, i64, bool, &[(usize, i32, Decimal)]); 3] = [
        (
            "Uline",
            7,
            false,
            &[(0, 500, dec!(0.42)), (1, 300, dec!(0.68)), (3, 48, dec!(2.15))],
        ),
        ("Packaging Corp", 3, true, &[(2, 120, dec!(1.35)), (4, 10, dec!(24.90))]),
        ("LabelWorks", 14, false, &[(6, 20, dec!(18.00)), (7, 1000, dec!(0.03))]),
    ];

    let txn = conn.begin().await?;
    for (vendor, lead_days, create_in_wms, lines) in orders.iter() {
        let order = purchase_order::ActiveModel {
            vendor_name: Set(vendor.to_string()),
            order_date: Set(today),
            expected_delivery_date: Set(today + Duration::days(*lead_days)),
            create_in_wms: Set(*create_in_wms),
            wms_purchase_order_id: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        for (index, quantity, unit_cost) in lines.iter() {
            let Some(catalog_item) = items.get(*index) else {
                continue;
            };
            purchase_order_line_item::ActiveModel {
                purchase_order_id: Set(order.id),
                item_id: Set(catalog_item.id),
                quantity: Set(*quantity),
                unit_cost: Set(*unit_cost),
                created_at: Set(now),
                updated_at: Set(now),
                ..Default::default()
            }
            .insert(&txn)
            .await?;
        }
    }
    txn.commit().await?;

    Ok(orders.len())
}
