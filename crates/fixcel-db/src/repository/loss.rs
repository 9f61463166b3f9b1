//! # Loss Repository
//!
//! Read access to loss/warranty write-offs, plus the insert used by the
//! engine. Records are immutable once committed, like sales.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{Sqlite, SqliteConnection, SqlitePool};

use crate::error::DbResult;
use crate::repository::sale::{business_day_end, business_day_start, clamp_limit};
use fixcel_core::LossRecord;

/// Filter criteria for listing loss records.
///
/// Date filters use the same GMT-3 business-day expansion as sale listing,
/// so the two reports agree on what "a day" means.
#[derive(Debug, Clone, Default)]
pub struct LossFilter {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    /// Restrict to write-offs of a single product.
    pub product_id: Option<String>,
    /// Page size; defaults to 50, clamped to 1..=200.
    pub limit: Option<i64>,
}

/// Repository for loss record reads.
#[derive(Debug, Clone)]
pub struct LossRepository {
    pool: SqlitePool,
}

impl LossRepository {
    pub fn new(pool: SqlitePool) -> Self {
        LossRepository { pool }
    }

    /// Gets a loss record by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<LossRecord>> {
        let record = sqlx::query_as::<_, LossRecord>(
            r#"
            SELECT id, product_id, reporter_id, quantity, reason, cost_lost, created_at
            FROM loss_records WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    /// Lists loss records matching the filter, newest first.
    pub async fn list(&self, filter: &LossFilter) -> DbResult<Vec<LossRecord>> {
        let mut qb = sqlx::QueryBuilder::<Sqlite>::new(
            "SELECT id, product_id, reporter_id, quantity, reason, cost_lost, created_at \
             FROM loss_records WHERE 1=1",
        );

        if let Some(start) = filter.start {
            qb.push(" AND created_at >= ");
            qb.push_bind(business_day_start(start));
        }
        if let Some(end) = filter.end {
            qb.push(" AND created_at < ");
            qb.push_bind(business_day_end(end));
        }
        if let Some(product_id) = &filter.product_id {
            qb.push(" AND product_id = ");
            qb.push_bind(product_id);
        }

        qb.push(" ORDER BY created_at DESC LIMIT ");
        qb.push_bind(clamp_limit(filter.limit));

        let records: Vec<LossRecord> = qb.build_query_as().fetch_all(&self.pool).await?;
        Ok(records)
    }

    /// Total cost written off in the filter window, in cents.
    pub async fn total_cost_lost(&self, filter: &LossFilter) -> DbResult<i64> {
        let mut qb = sqlx::QueryBuilder::<Sqlite>::new(
            "SELECT COALESCE(SUM(cost_lost), 0) FROM loss_records WHERE 1=1",
        );

        if let Some(start) = filter.start {
            qb.push(" AND created_at >= ");
            qb.push_bind(business_day_start(start));
        }
        if let Some(end) = filter.end {
            qb.push(" AND created_at < ");
            qb.push_bind(business_day_end(end));
        }
        if let Some(product_id) = &filter.product_id {
            qb.push(" AND product_id = ");
            qb.push_bind(product_id);
        }

        let total: i64 = qb.build_query_scalar().fetch_one(&self.pool).await?;
        Ok(total)
    }
}

/// Inserts a loss record on the given connection.
///
/// Same connection discipline as sale insertion: runs inside the engine's
/// reservation transaction, or standalone on the fallback path.
pub(crate) async fn insert_loss(conn: &mut SqliteConnection, record: &LossRecord) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO loss_records (
            id, product_id, reporter_id, quantity, reason, cost_lost, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        "#,
    )
    .bind(&record.id)
    .bind(&record.product_id)
    .bind(&record.reporter_id)
    .bind(record.quantity)
    .bind(&record.reason)
    .bind(record.cost_lost)
    .bind(record.created_at)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Builds a loss record ready for insertion.
pub(crate) fn new_loss_record(
    product_id: String,
    reporter_id: Option<String>,
    quantity: i64,
    reason: String,
    cost_lost: fixcel_core::Money,
    created_at: DateTime<Utc>,
) -> LossRecord {
    LossRecord {
        id: uuid::Uuid::new_v4().to_string(),
        product_id,
        reporter_id,
        quantity,
        reason,
        cost_lost,
        created_at,
    }
}
