//! # Product Repository
//!
//! Read access and catalog inserts for products.
//!
//! Stock is deliberately absent from this API: the only mutation path for
//! `products.stock` is the reservation primitive in [`super::stock`].

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::DbResult;
use crate::sequence::{self, PRODUCT_COUNTER};
use fixcel_core::Product;

const PRODUCT_COLUMNS: &str =
    "id, name, category_id, barcode, internal_code, cost, sell_price, stock, created_at, updated_at";

/// Repository for product database operations.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Gets a product by its ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Lists products ordered by name.
    pub async fn list(&self, limit: i64) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products ORDER BY name LIMIT ?1"
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Inserts a new product.
    ///
    /// When `internal_code` is absent, one is assigned from the `"product"`
    /// sequence counter so every catalog entry ends up with a unique
    /// human-readable code.
    pub async fn insert(&self, product: &Product) -> DbResult<Product> {
        debug!(id = %product.id, name = %product.name, "Inserting product");

        let mut product = product.clone();
        if product.internal_code.is_none() {
            let seq = sequence::next_sequence(&self.pool, PRODUCT_COUNTER).await?;
            product.internal_code = Some(format!("P-{seq:06}"));
        }

        sqlx::query(
            r#"
            INSERT INTO products (
                id, name, category_id, barcode, internal_code,
                cost, sell_price, stock, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(&product.category_id)
        .bind(&product.barcode)
        .bind(&product.internal_code)
        .bind(product.cost)
        .bind(product.sell_price)
        .bind(product.stock)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(product)
    }

    /// Counts products (for diagnostics and the seed binary).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

/// Helper to generate a new product ID.
pub fn generate_product_id() -> String {
    Uuid::new_v4().to_string()
}

/// Builds a product with fresh id and timestamps. Convenience for seeding
/// and tests; catalog management proper lives outside this crate.
pub fn new_product(
    name: impl Into<String>,
    category_id: impl Into<String>,
    cost: fixcel_core::Money,
    sell_price: fixcel_core::Money,
    stock: i64,
) -> Product {
    let now = Utc::now();
    Product {
        id: generate_product_id(),
        name: name.into(),
        category_id: category_id.into(),
        barcode: None,
        internal_code: None,
        cost,
        sell_price,
        stock,
        created_at: now,
        updated_at: now,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use fixcel_core::Money;

    #[tokio::test]
    async fn test_insert_and_get() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.products();

        let product = new_product("Cable USB-C", "cat-1", Money::from_cents(500), Money::from_cents(1200), 10);
        let inserted = repo.insert(&product).await.unwrap();

        let fetched = repo.get_by_id(&product.id).await.unwrap().unwrap();
        assert_eq!(fetched.name, "Cable USB-C");
        assert_eq!(fetched.stock, 10);
        assert_eq!(fetched.cost, Money::from_cents(500));
        assert_eq!(fetched.internal_code, inserted.internal_code);
    }

    #[tokio::test]
    async fn test_internal_code_assigned_from_counter() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.products();

        let a = repo
            .insert(&new_product("A", "cat-1", Money::zero(), Money::zero(), 0))
            .await
            .unwrap();
        let b = repo
            .insert(&new_product("B", "cat-1", Money::zero(), Money::zero(), 0))
            .await
            .unwrap();

        assert_eq!(a.internal_code.as_deref(), Some("P-000001"));
        assert_eq!(b.internal_code.as_deref(), Some("P-000002"));
    }

    #[tokio::test]
    async fn test_explicit_internal_code_preserved() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.products();

        let mut product = new_product("A", "cat-1", Money::zero(), Money::zero(), 0);
        product.internal_code = Some("LEGACY-42".to_string());

        let inserted = repo.insert(&product).await.unwrap();
        assert_eq!(inserted.internal_code.as_deref(), Some("LEGACY-42"));
    }

    #[tokio::test]
    async fn test_missing_product_is_none() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.products();

        assert!(repo.get_by_id("nope").await.unwrap().is_none());
    }
}
