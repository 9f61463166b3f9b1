//! # Sale Repository
//!
//! Read access to committed sales, plus the transactional insert used by
//! the engine. Sales are immutable: there is no update or delete here.
//!
//! ## Date Filters
//! The store operates on GMT-3 local days, so a filter date expands to the
//! UTC window of that local day:
//! ```text
//! start = 2025-03-10  →  created_at >= 2025-03-10 03:00:00 UTC
//! end   = 2025-03-10  →  created_at <  2025-03-11 03:00:00 UTC
//! ```
//! The end bound is exclusive of the next local day's start, so a single
//! date used as both start and end selects exactly one business day.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use sqlx::{Sqlite, SqliteConnection, SqlitePool};

use crate::error::DbResult;
use fixcel_core::{ComboLine, Money, PaymentMethod, Sale, SaleLine};

/// Hours between UTC and the store's local business day (GMT-3).
const BUSINESS_DAY_UTC_LAG_HOURS: i64 = 3;

const SALE_COLUMNS: &str = "id, invoice_number, seller_id, total_before_discount, discount, \
     total_sale, total_cost, net_profit, payment_method, created_at";

/// The UTC instant at which the given local business day starts.
pub(crate) fn business_day_start(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc() + Duration::hours(BUSINESS_DAY_UTC_LAG_HOURS)
}

/// Exclusive UTC upper bound for a filter ending on the given local day.
pub(crate) fn business_day_end(date: NaiveDate) -> DateTime<Utc> {
    business_day_start(date) + Duration::hours(24)
}

/// Clamps a requested page size into the allowed window.
pub(crate) fn clamp_limit(limit: Option<i64>) -> i64 {
    limit.unwrap_or(50).clamp(1, 200)
}

/// Filter criteria for listing sales.
#[derive(Debug, Clone, Default)]
pub struct SaleFilter {
    /// First local business day to include.
    pub start: Option<NaiveDate>,
    /// Last local business day to include.
    pub end: Option<NaiveDate>,
    /// Restrict to a single seller.
    pub seller_id: Option<String>,
    /// Page size; defaults to 50, clamped to 1..=200.
    pub limit: Option<i64>,
}

/// Scalar sale row; lines are fetched separately and assembled.
#[derive(Debug, sqlx::FromRow)]
struct SaleRow {
    id: String,
    invoice_number: i64,
    seller_id: String,
    total_before_discount: Money,
    discount: Money,
    total_sale: Money,
    total_cost: Money,
    net_profit: Money,
    payment_method: PaymentMethod,
    created_at: DateTime<Utc>,
}

/// Repository for sale reads.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Gets a sale with its lines, or `None`.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Sale>> {
        let row = sqlx::query_as::<_, SaleRow>(&format!(
            "SELECT {SALE_COLUMNS} FROM sales WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(self.assemble(row).await?)),
            None => Ok(None),
        }
    }

    /// Lists sales matching the filter, newest first.
    pub async fn list(&self, filter: &SaleFilter) -> DbResult<Vec<Sale>> {
        let mut qb = sqlx::QueryBuilder::<Sqlite>::new(format!(
            "SELECT {SALE_COLUMNS} FROM sales WHERE 1=1"
        ));

        if let Some(start) = filter.start {
            qb.push(" AND created_at >= ");
            qb.push_bind(business_day_start(start));
        }
        if let Some(end) = filter.end {
            qb.push(" AND created_at < ");
            qb.push_bind(business_day_end(end));
        }
        if let Some(seller_id) = &filter.seller_id {
            qb.push(" AND seller_id = ");
            qb.push_bind(seller_id);
        }

        qb.push(" ORDER BY created_at DESC, invoice_number DESC LIMIT ");
        qb.push_bind(clamp_limit(filter.limit));

        let rows: Vec<SaleRow> = qb.build_query_as().fetch_all(&self.pool).await?;

        let mut sales = Vec::with_capacity(rows.len());
        for row in rows {
            sales.push(self.assemble(row).await?);
        }
        Ok(sales)
    }

    async fn assemble(&self, row: SaleRow) -> DbResult<Sale> {
        let lines = sqlx::query_as::<_, SaleLine>(
            r#"
            SELECT product_id, quantity, sell_price_at_sale, cost_at_sale
            FROM sale_lines WHERE sale_id = ?1 ORDER BY position
            "#,
        )
        .bind(&row.id)
        .fetch_all(&self.pool)
        .await?;

        let combo_lines = sqlx::query_as::<_, ComboLine>(
            r#"
            SELECT combo_id, quantity, sell_price_at_sale, cost_at_sale
            FROM sale_combo_lines WHERE sale_id = ?1 ORDER BY position
            "#,
        )
        .bind(&row.id)
        .fetch_all(&self.pool)
        .await?;

        Ok(Sale {
            id: row.id,
            invoice_number: row.invoice_number,
            seller_id: row.seller_id,
            lines,
            combo_lines,
            total_before_discount: row.total_before_discount,
            discount: row.discount,
            total_sale: row.total_sale,
            total_cost: row.total_cost,
            net_profit: row.net_profit,
            payment_method: row.payment_method,
            created_at: row.created_at,
        })
    }
}

/// Inserts a fully-built sale and its lines on the given connection.
///
/// Takes a raw connection so the engine can run it inside an open
/// reservation transaction or, on the fallback path, on a pool connection
/// after the decrements already succeeded.
pub(crate) async fn insert_sale(conn: &mut SqliteConnection, sale: &Sale) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO sales (
            id, invoice_number, seller_id, total_before_discount, discount,
            total_sale, total_cost, net_profit, payment_method, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
        "#,
    )
    .bind(&sale.id)
    .bind(sale.invoice_number)
    .bind(&sale.seller_id)
    .bind(sale.total_before_discount)
    .bind(sale.discount)
    .bind(sale.total_sale)
    .bind(sale.total_cost)
    .bind(sale.net_profit)
    .bind(sale.payment_method)
    .bind(sale.created_at)
    .execute(&mut *conn)
    .await?;

    for (position, line) in sale.lines.iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO sale_lines (
                sale_id, position, product_id, quantity,
                sell_price_at_sale, cost_at_sale
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&sale.id)
        .bind(position as i64)
        .bind(&line.product_id)
        .bind(line.quantity)
        .bind(line.sell_price_at_sale)
        .bind(line.cost_at_sale)
        .execute(&mut *conn)
        .await?;
    }

    for (position, line) in sale.combo_lines.iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO sale_combo_lines (
                sale_id, position, combo_id, quantity,
                sell_price_at_sale, cost_at_sale
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&sale.id)
        .bind(position as i64)
        .bind(&line.combo_id)
        .bind(line.quantity)
        .bind(line.sell_price_at_sale)
        .bind(line.cost_at_sale)
        .execute(&mut *conn)
        .await?;
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
