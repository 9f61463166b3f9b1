//! # Combo Repository
//!
//! Read access and catalog inserts for combos (fixed product bundles).
//!
//! Combos are read-only from the engine's perspective: at sale time they
//! are expanded into flat product decrements, never mutated.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::DbResult;
use fixcel_core::{Combo, ComboItem, Money};

/// Combo header row, joined with its items on fetch.
#[derive(Debug, sqlx::FromRow)]
struct ComboRow {
    id: String,
    name: String,
    sell_price: Money,
    created_at: chrono::DateTime<Utc>,
}

/// Repository for combo database operations.
#[derive(Debug, Clone)]
pub struct ComboRepository {
    pool: SqlitePool,
}

impl ComboRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ComboRepository { pool }
    }

    /// Gets a combo with its ordered items.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Combo>> {
        let row = sqlx::query_as::<_, ComboRow>(
            "SELECT id, name, sell_price, created_at FROM combos WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let items = sqlx::query_as::<_, ComboItem>(
            "SELECT product_id, quantity FROM combo_items WHERE combo_id = ?1 ORDER BY position",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        Ok(Some(Combo {
            id: row.id,
            name: row.name,
            sell_price: row.sell_price,
            items,
            created_at: row.created_at,
        }))
    }

    /// Inserts a combo and its items in one transaction.
    pub async fn insert(&self, combo: &Combo) -> DbResult<()> {
        debug!(id = %combo.id, name = %combo.name, items = combo.items.len(), "Inserting combo");

        let mut tx = self.pool.begin().await?;

        sqlx::query("INSERT INTO combos (id, name, sell_price, created_at) VALUES (?1, ?2, ?3, ?4)")
            .bind(&combo.id)
            .bind(&combo.name)
            .bind(combo.sell_price)
            .bind(combo.created_at)
            .execute(&mut *tx)
            .await?;

        for (position, item) in combo.items.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO combo_items (combo_id, product_id, quantity, position)
                VALUES (?1, ?2, ?3, ?4)
                "#,
            )
            .bind(&combo.id)
            .bind(&item.product_id)
            .bind(item.quantity)
            .bind(position as i64)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }
}

/// Builds a combo with a fresh id and timestamp.
pub fn new_combo(name: impl Into<String>, sell_price: Money, items: Vec<ComboItem>) -> Combo {
    Combo {
        id: Uuid::new_v4().to_string(),
        name: name.into(),
        sell_price,
        items,
        created_at: Utc::now(),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use crate::repository::product::new_product;

    #[tokio::test]
    async fn test_insert_and_get_preserves_item_order() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let p1 = db
            .products()
            .insert(&new_product("A", "cat-1", Money::from_cents(100), Money::from_cents(200), 5))
            .await
            .unwrap();
        let p2 = db
            .products()
            .insert(&new_product("B", "cat-1", Money::from_cents(300), Money::from_cents(400), 5))
            .await
            .unwrap();

        let combo = new_combo(
            "Starter kit",
            Money::from_cents(550),
            vec![
                ComboItem {
                    product_id: p1.id.clone(),
                    quantity: 2,
                },
                ComboItem {
                    product_id: p2.id.clone(),
                    quantity: 1,
                },
            ],
        );
        db.combos().insert(&combo).await.unwrap();

        let fetched = db.combos().get_by_id(&combo.id).await.unwrap().unwrap();
        assert_eq!(fetched.name, "Starter kit");
        assert_eq!(fetched.items.len(), 2);
        assert_eq!(fetched.items[0].product_id, p1.id);
        assert_eq!(fetched.items[0].quantity, 2);
        assert_eq!(fetched.items[1].product_id, p2.id);
    }

    #[tokio::test]
    async fn test_missing_combo_is_none() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        assert!(db.combos().get_by_id("nope").await.unwrap().is_none());
    }
}
