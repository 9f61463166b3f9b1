//! # Stock Reservation Primitive
//!
//! The ONLY sanctioned way to mutate `products.stock`.
//!
//! ## The Conditional Decrement
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │  ❌ WRONG: read-then-write (lost-update race)                       │
//! │     let stock = SELECT stock ...;                                   │
//! │     if stock >= qty { UPDATE products SET stock = stock - qty }     │
//! │                                                                     │
//! │  ✅ CORRECT: one guarded statement                                  │
//! │     UPDATE products SET stock = stock - ?qty                        │
//! │     WHERE id = ?id AND stock >= ?qty                                │
//! │                                                                     │
//! │  rows_affected == 1  → reservation succeeded                        │
//! │  rows_affected == 0  → shortfall (or unknown product)               │
//! │                                                                     │
//! │  Two concurrent sales of the same product serialize on this         │
//! │  statement; stock can never go negative.                            │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every function takes a generic executor so it runs identically on the
//! pool (sequential fallback path) and inside an open transaction
//! (all-or-nothing path). Compensation lives here too, so the sale and
//! loss commit paths share the exact same rollback semantics.

use chrono::Utc;
use fixcel_core::Money;
use sqlx::{Sqlite, SqlitePool};
use tracing::{debug, error};

use crate::error::DbResult;

/// Attempts to reserve `quantity` units of a product.
///
/// Returns `Ok(true)` when the decrement was applied, `Ok(false)` when the
/// guard did not match (insufficient stock, or no such product).
pub async fn try_decrement<'e, E>(executor: E, product_id: &str, quantity: i64) -> DbResult<bool>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query(
        r#"
        UPDATE products
        SET stock = stock - ?2, updated_at = ?3
        WHERE id = ?1 AND stock >= ?2
        "#,
    )
    .bind(product_id)
    .bind(quantity)
    .bind(Utc::now())
    .execute(executor)
    .await?;

    let reserved = result.rows_affected() == 1;
    debug!(product_id, quantity, reserved, "stock reservation attempt");
    Ok(reserved)
}

/// Reverses a reservation by re-incrementing stock.
pub async fn increment<'e, E>(executor: E, product_id: &str, quantity: i64) -> DbResult<()>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        r#"
        UPDATE products
        SET stock = stock + ?2, updated_at = ?3
        WHERE id = ?1
        "#,
    )
    .bind(product_id)
    .bind(quantity)
    .bind(Utc::now())
    .execute(executor)
    .await?;

    Ok(())
}

/// Best-effort compensation: undoes every already-applied decrement after a
/// partial failure on the sequential fallback path.
///
/// Compensation errors are logged, never propagated: the caller is already
/// reporting the original failure, and a half-reverted state with a log
/// trail beats masking the root cause.
pub async fn compensate(pool: &SqlitePool, applied: &[(String, i64)]) {
    for (product_id, quantity) in applied {
        if let Err(e) = increment(pool, product_id, *quantity).await {
            error!(
                product_id = %product_id,
                quantity,
                error = %e,
                "compensation failed; stock left decremented"
            );
        }
    }
}

/// Reads the current cost of a product.
///
/// Used to snapshot `cost_lost` at the moment of a successful write-off
/// decrement (same snapshot discipline as sale lines).
pub async fn cost_snapshot<'e, E>(executor: E, product_id: &str) -> DbResult<Money>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let cost: Money = sqlx::query_scalar("SELECT cost FROM products WHERE id = ?1")
        .bind(product_id)
        .fetch_one(executor)
        .await?;

    Ok(cost)
}
