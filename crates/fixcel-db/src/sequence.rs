//! # Sequence Generator
//!
//! Process-wide monotonic counters, one row per counter name.
//!
//! ## Why A Table And Not An AtomicU64?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │  Instance A ──┐                                                     │
//! │               ├──► counters table ──► unique, monotonic seq         │
//! │  Instance B ──┘        (atomic upsert + RETURNING)                  │
//! │                                                                     │
//! │  In-process counters would hand out duplicate invoice numbers the   │
//! │  moment a second instance (or a restart) enters the picture.        │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The increment is a single statement, so it is atomic standalone AND can
//! participate in the engine's reservation transaction: invoice-number
//! assignment and stock decrements commit or abort together.

use sqlx::Sqlite;

use crate::error::DbResult;

/// Counter feeding sale invoice numbers.
pub const SALE_COUNTER: &str = "sale";

/// Counter feeding internal product codes.
pub const PRODUCT_COUNTER: &str = "product";

/// Atomically increments and returns the counter value for `name`,
/// creating the counter at 1 if absent.
///
/// Callable on the pool (standalone) or on an open transaction (so the
/// assignment aborts together with the rest of the commit).
pub async fn next_sequence<'e, E>(executor: E, name: &str) -> DbResult<i64>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let seq: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO counters (name, seq) VALUES (?1, 1)
        ON CONFLICT (name) DO UPDATE SET seq = seq + 1
        RETURNING seq
        "#,
    )
    .bind(name)
    .fetch_one(executor)
    .await?;

    Ok(seq)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    #[tokio::test]
    async fn test_counter_starts_at_one() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let first = next_sequence(db.pool(), "sale").await.unwrap();
        assert_eq!(first, 1);
    }

    #[tokio::test]
    async fn test_counter_is_monotonic() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let mut previous = 0;
        for _ in 0..10 {
            let seq = next_sequence(db.pool(), "sale").await.unwrap();
            assert_eq!(seq, previous + 1);
            previous = seq;
        }
    }

    #[tokio::test]
    async fn test_counters_are_independent_per_name() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        assert_eq!(next_sequence(db.pool(), "sale").await.unwrap(), 1);
        assert_eq!(next_sequence(db.pool(), "sale").await.unwrap(), 2);
        assert_eq!(next_sequence(db.pool(), "product").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_increments_never_duplicate() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let mut handles = Vec::new();
        for _ in 0..16 {
            let db = db.clone();
            handles.push(tokio::spawn(async move {
                next_sequence(db.pool(), "sale").await.unwrap()
            }));
        }

        let mut seen = std::collections::HashSet::new();
        for handle in handles {
            let seq = handle.await.unwrap();
            assert!(seen.insert(seq), "duplicate sequence value {seq}");
        }
        assert_eq!(seen.len(), 16);
    }
}
