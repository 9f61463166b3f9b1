//! Seeds a development database with demo users, products, and a combo.
//!
//! ```bash
//! FIXCEL_DB=./fixcel.db cargo run --bin seed
//! ```

use fixcel_core::{ComboItem, Money, Role};
use fixcel_db::repository::combo::new_combo;
use fixcel_db::repository::product::new_product;
use fixcel_db::repository::user::new_user;
use fixcel_db::{Database, DbConfig};
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let path = std::env::var("FIXCEL_DB").unwrap_or_else(|_| "./fixcel.db".to_string());
    info!(path = %path, "seeding development database");

    let db = Database::new(DbConfig::new(&path)).await?;

    let existing = db.products().count().await?;
    if existing > 0 {
        info!(products = existing, "database already seeded; nothing to do");
        return Ok(());
    }

    let admin = new_user("Admin", Role::Administrator);
    db.users().insert(&admin).await?;
    let seller = new_user("Ana", Role::Seller);
    db.users().insert(&seller).await?;
    info!(admin = %admin.id, seller = %seller.id, "users created");

    let cable = db
        .products()
        .insert(&new_product(
            "Cable USB-C 1m",
            "cat-accessories",
            Money::from_cents(500),
            Money::from_cents(1200),
            40,
        ))
        .await?;
    let charger = db
        .products()
        .insert(&new_product(
            "Cargador 20W",
            "cat-accessories",
            Money::from_cents(2500),
            Money::from_cents(5500),
            15,
        ))
        .await?;
    let case = db
        .products()
        .insert(&new_product(
            "Funda silicona",
            "cat-accessories",
            Money::from_cents(800),
            Money::from_cents(2000),
            25,
        ))
        .await?;

    let combo = new_combo(
        "Kit carga completa",
        Money::from_cents(6000),
        vec![
            ComboItem {
                product_id: cable.id.clone(),
                quantity: 1,
            },
            ComboItem {
                product_id: charger.id.clone(),
                quantity: 1,
            },
        ],
    );
    db.combos().insert(&combo).await?;

    info!(
        products = db.products().count().await?,
        combo = %combo.id,
        case = %case.id,
        "seed complete"
    );
    Ok(())
}
