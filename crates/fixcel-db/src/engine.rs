//! # Sale Transaction Engine
//!
//! Turns a validated cart into a committed, immutable sale (or a loss
//! write-off) with atomic stock reservation and a monotonic invoice number.
//!
//! ## Commit Protocol
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │  register_sale(caller, request)                                     │
//! │       │                                                             │
//! │       ├─ validate shape (empty cart, quantities, line count)        │
//! │       ├─ resolve seller / products / combos                         │
//! │       ├─ price with historical snapshots → decrement map            │
//! │       ├─ pre-check stock (fast, advisory)                           │
//! │       │                                                             │
//! │       ▼                                                             │
//! │  ┌─ PRIMARY: single transaction ────────────────────────────────┐   │
//! │  │  for each (product, qty): guarded UPDATE ... stock >= qty    │   │
//! │  │  invoice ← counters upsert (same tx)                         │   │
//! │  │  INSERT sale + lines                                         │   │
//! │  │  COMMIT                                                      │   │
//! │  └──────────────────────────────────────────────────────────────┘   │
//! │       │ guard miss → ROLLBACK → InsufficientStock (no fallback)     │
//! │       │ infra error → warn + FALLBACK                               │
//! │       ▼                                                             │
//! │  ┌─ FALLBACK: sequential decrements + compensation ─────────────┐   │
//! │  │  apply guarded UPDATEs one by one, remembering each success  │   │
//! │  │  any failure → re-increment everything applied, then fail    │   │
//! │  └──────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The fallback exists for environments where the transactional path is
//! degraded; a plain out-of-stock guard miss is a business outcome and
//! never triggers it.

use std::collections::HashMap;

use chrono::Utc;
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::repository::combo::ComboRepository;
use crate::repository::loss::{insert_loss, new_loss_record};
use crate::repository::product::ProductRepository;
use crate::repository::sale::insert_sale;
use crate::repository::stock;
use crate::repository::user::UserRepository;
use crate::sequence::{self, SALE_COUNTER};
use fixcel_core::{
    price_sale, validate_loss_request, validate_sale_request, Caller, LossRecord, LossRequest,
    PaymentMethod, PricedSale, Product, ResolvedComboLine, Role, Sale, SaleRequest,
    ValidationError,
};

// =============================================================================
// Errors
// =============================================================================

/// Caller-facing errors of the sale engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The request failed shape validation before touching the database.
    #[error("Invalid request: {0}")]
    InvalidRequest(#[from] ValidationError),

    /// A referenced entity does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// A stock guard failed; nothing was committed.
    #[error("Insufficient stock for '{name}': requested {requested}, available {available}")]
    InsufficientStock {
        product_id: String,
        name: String,
        requested: i64,
        available: i64,
    },

    /// Database-level failure after both commit paths were exhausted.
    #[error("Infrastructure error: {0}")]
    Infrastructure(#[from] DbError),
}

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Internal outcome of a commit attempt. Shortfalls are routed to the
/// business error, infrastructure failures to the fallback path.
#[derive(Debug)]
enum TxFailure {
    Shortfall { product_id: String, requested: i64 },
    Infra(DbError),
}

impl From<DbError> for TxFailure {
    fn from(e: DbError) -> Self {
        TxFailure::Infra(e)
    }
}

// =============================================================================
// Engine
// =============================================================================

/// The sale transaction engine.
///
/// Cheap to clone; holds only a pool handle. All commit-path writes funnel
/// through here so stock decrements, invoice assignment, and record
/// insertion always share a fate.
#[derive(Debug, Clone)]
pub struct SaleEngine {
    pool: SqlitePool,
}

impl SaleEngine {
    pub fn new(pool: SqlitePool) -> Self {
        SaleEngine { pool }
    }

    // -------------------------------------------------------------------------
    // Sale registration
    // -------------------------------------------------------------------------

    /// Registers a sale: validates, resolves, prices, reserves stock, and
    /// commits the immutable record with a fresh invoice number.
    #[instrument(skip(self, request), fields(caller = %caller.id))]
    pub async fn register_sale(&self, caller: &Caller, request: SaleRequest) -> EngineResult<Sale> {
        validate_sale_request(&request)?;

        let seller_id = self.resolve_seller(caller, request.seller_id.as_deref()).await?;
        let payment_method = PaymentMethod::parse_lenient(&request.payment_method);

        // Resolve every referenced product and combo up front; pricing and
        // snapshots work on these fetched rows.
        let mut catalog: HashMap<String, Product> = HashMap::new();

        let mut product_lines = Vec::with_capacity(request.products.len());
        for line in &request.products {
            let product = self.resolve_product(&mut catalog, &line.product_id).await?;
            product_lines.push((product, line.quantity));
        }

        let combos = ComboRepository::new(self.pool.clone());
        let mut combo_lines = Vec::with_capacity(request.combos.len());
        for line in &request.combos {
            let combo = combos
                .get_by_id(&line.combo_id)
                .await?
                .ok_or_else(|| EngineError::NotFound {
                    entity: "combo",
                    id: line.combo_id.clone(),
                })?;

            let mut item_products = Vec::with_capacity(combo.items.len());
            for item in &combo.items {
                item_products.push(self.resolve_product(&mut catalog, &item.product_id).await?);
            }

            combo_lines.push(ResolvedComboLine {
                combo,
                item_products,
                quantity: line.quantity,
            });
        }

        let priced = price_sale(&product_lines, &combo_lines, request.discount_cents);

        // Advisory pre-check against the rows we just fetched. Catches the
        // common shortfall before opening a transaction; the guarded UPDATE
        // remains the authoritative check.
        self.precheck_stock(&catalog, &priced)?;

        let sale = match self
            .commit_sale_transactional(&seller_id, payment_method, &priced)
            .await
        {
            Ok(sale) => sale,
            Err(TxFailure::Shortfall {
                product_id,
                requested,
            }) => {
                return Err(self.shortfall_error(&product_id, requested).await);
            }
            Err(TxFailure::Infra(e)) => {
                warn!(error = %e, "transactional commit failed; using sequential fallback");
                self.commit_sale_fallback(&seller_id, payment_method, &priced)
                    .await?
            }
        };

        info!(
            sale_id = %sale.id,
            invoice = sale.invoice_number,
            total_cents = sale.total_sale.cents(),
            "sale committed"
        );
        Ok(sale)
    }

    /// All-or-nothing commit path: decrements, invoice assignment, and the
    /// sale insert commit or abort together.
    async fn commit_sale_transactional(
        &self,
        seller_id: &str,
        payment_method: PaymentMethod,
        priced: &PricedSale,
    ) -> Result<Sale, TxFailure> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| TxFailure::Infra(DbError::TransactionFailed(e.to_string())))?;

        for (product_id, quantity) in &priced.decrements {
            let reserved = stock::try_decrement(&mut *tx, product_id, *quantity).await?;
            if !reserved {
                // Explicit rollback so the guard miss surfaces as a clean
                // business outcome, not a dangling transaction.
                tx.rollback()
                    .await
                    .map_err(|e| TxFailure::Infra(DbError::TransactionFailed(e.to_string())))?;
                return Err(TxFailure::Shortfall {
                    product_id: product_id.clone(),
                    requested: *quantity,
                });
            }
        }

        let invoice_number = sequence::next_sequence(&mut *tx, SALE_COUNTER).await?;
        let sale = build_sale(seller_id, payment_method, priced, invoice_number);
        insert_sale(&mut tx, &sale).await?;

        tx.commit()
            .await
            .map_err(|e| TxFailure::Infra(DbError::TransactionFailed(e.to_string())))?;
        Ok(sale)
    }

    /// Sequential fallback: guarded decrements one by one, with manual
    /// compensation of everything already applied on any failure.
    async fn commit_sale_fallback(
        &self,
        seller_id: &str,
        payment_method: PaymentMethod,
        priced: &PricedSale,
    ) -> EngineResult<Sale> {
        let mut applied: Vec<(String, i64)> = Vec::with_capacity(priced.decrements.len());

        for (product_id, quantity) in &priced.decrements {
            match stock::try_decrement(&self.pool, product_id, *quantity).await {
                Ok(true) => applied.push((product_id.clone(), *quantity)),
                Ok(false) => {
                    stock::compensate(&self.pool, &applied).await;
                    return Err(self.shortfall_error(product_id, *quantity).await);
                }
                Err(e) => {
                    stock::compensate(&self.pool, &applied).await;
                    return Err(e.into());
                }
            }
        }

        let invoice_number = match sequence::next_sequence(&self.pool, SALE_COUNTER).await {
            Ok(n) => n,
            Err(e) => {
                stock::compensate(&self.pool, &applied).await;
                return Err(e.into());
            }
        };

        let sale = build_sale(seller_id, payment_method, priced, invoice_number);

        let insert_result = async {
            let mut conn = self.pool.acquire().await?;
            insert_sale(&mut conn, &sale).await
        }
        .await;

        if let Err(e) = insert_result {
            stock::compensate(&self.pool, &applied).await;
            return Err(e.into());
        }

        Ok(sale)
    }

    // -------------------------------------------------------------------------
    // Loss registration
    // -------------------------------------------------------------------------

    /// Registers a warranty/loss write-off against a single product.
    ///
    /// Same reservation protocol as a sale, single-product: the decrement,
    /// the cost snapshot, and the record commit together. The reporter is
    /// always the caller; the request body cannot claim someone else.
    #[instrument(skip(self, request), fields(caller = %caller.id))]
    pub async fn register_loss(
        &self,
        caller: &Caller,
        request: LossRequest,
    ) -> EngineResult<LossRecord> {
        validate_loss_request(&request)?;

        let products = ProductRepository::new(self.pool.clone());
        let product = products
            .get_by_id(&request.product_id)
            .await?
            .ok_or_else(|| EngineError::NotFound {
                entity: "product",
                id: request.product_id.clone(),
            })?;

        if product.stock < request.quantity {
            return Err(EngineError::InsufficientStock {
                product_id: product.id,
                name: product.name,
                requested: request.quantity,
                available: product.stock,
            });
        }

        let record = match self.commit_loss_transactional(caller, &request).await {
            Ok(record) => record,
            Err(TxFailure::Shortfall {
                product_id,
                requested,
            }) => {
                return Err(self.shortfall_error(&product_id, requested).await);
            }
            Err(TxFailure::Infra(e)) => {
                warn!(error = %e, "transactional write-off failed; using sequential fallback");
                self.commit_loss_fallback(caller, &request).await?
            }
        };

        info!(
            loss_id = %record.id,
            product_id = %record.product_id,
            cost_lost_cents = record.cost_lost.cents(),
            "loss committed"
        );
        Ok(record)
    }

    async fn commit_loss_transactional(
        &self,
        caller: &Caller,
        request: &LossRequest,
    ) -> Result<LossRecord, TxFailure> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| TxFailure::Infra(DbError::TransactionFailed(e.to_string())))?;

        let reserved = stock::try_decrement(&mut *tx, &request.product_id, request.quantity).await?;
        if !reserved {
            tx.rollback()
                .await
                .map_err(|e| TxFailure::Infra(DbError::TransactionFailed(e.to_string())))?;
            return Err(TxFailure::Shortfall {
                product_id: request.product_id.clone(),
                requested: request.quantity,
            });
        }

        // Snapshot AFTER the successful decrement, inside the same tx: the
        // cost we record is the cost at the moment the units left stock.
        let cost = stock::cost_snapshot(&mut *tx, &request.product_id).await?;
        let record = new_loss_record(
            request.product_id.clone(),
            Some(caller.id.clone()),
            request.quantity,
            request.reason.clone(),
            cost * request.quantity,
            Utc::now(),
        );
        insert_loss(&mut tx, &record).await?;

        tx.commit()
            .await
            .map_err(|e| TxFailure::Infra(DbError::TransactionFailed(e.to_string())))?;
        Ok(record)
    }

    async fn commit_loss_fallback(
        &self,
        caller: &Caller,
        request: &LossRequest,
    ) -> EngineResult<LossRecord> {
        let reserved = stock::try_decrement(&self.pool, &request.product_id, request.quantity).await?;
        if !reserved {
            return Err(self.shortfall_error(&request.product_id, request.quantity).await);
        }
        let applied = vec![(request.product_id.clone(), request.quantity)];

        let commit_result = async {
            let cost = stock::cost_snapshot(&self.pool, &request.product_id).await?;
            let record = new_loss_record(
                request.product_id.clone(),
                Some(caller.id.clone()),
                request.quantity,
                request.reason.clone(),
                cost * request.quantity,
                Utc::now(),
            );

            let mut conn = self.pool.acquire().await?;
            insert_loss(&mut conn, &record).await?;
            DbResult::Ok(record)
        }
        .await;

        match commit_result {
            Ok(record) => Ok(record),
            Err(e) => {
                stock::compensate(&self.pool, &applied).await;
                Err(e.into())
            }
        }
    }

    // -------------------------------------------------------------------------
    // Resolution helpers
    // -------------------------------------------------------------------------

    /// Determines who the sale is recorded under. Administrators may record
    /// on behalf of another seller; everyone else sells as themselves, and
    /// any override they send is silently ignored.
    async fn resolve_seller(&self, caller: &Caller, requested: Option<&str>) -> EngineResult<String> {
        let seller_id = match (caller.role, requested) {
            (Role::Administrator, Some(id)) if !id.is_empty() => id.to_string(),
            _ => caller.id.clone(),
        };

        let users = UserRepository::new(self.pool.clone());
        users
            .get_by_id(&seller_id)
            .await?
            .ok_or(EngineError::NotFound {
                entity: "seller",
                id: seller_id.clone(),
            })?;

        Ok(seller_id)
    }

    /// Fetches a product once and caches it for the rest of the request.
    async fn resolve_product(
        &self,
        catalog: &mut HashMap<String, Product>,
        product_id: &str,
    ) -> EngineResult<Product> {
        if let Some(product) = catalog.get(product_id) {
            return Ok(product.clone());
        }

        let products = ProductRepository::new(self.pool.clone());
        let product = products
            .get_by_id(product_id)
            .await?
            .ok_or_else(|| EngineError::NotFound {
                entity: "product",
                id: product_id.to_string(),
            })?;

        catalog.insert(product_id.to_string(), product.clone());
        Ok(product)
    }

    /// Advisory shortfall check against the fetched catalog rows.
    fn precheck_stock(
        &self,
        catalog: &HashMap<String, Product>,
        priced: &PricedSale,
    ) -> EngineResult<()> {
        for (product_id, quantity) in &priced.decrements {
            if let Some(product) = catalog.get(product_id) {
                if product.stock < *quantity {
                    return Err(EngineError::InsufficientStock {
                        product_id: product.id.clone(),
                        name: product.name.clone(),
                        requested: *quantity,
                        available: product.stock,
                    });
                }
            }
        }
        Ok(())
    }

    /// Builds the caller-facing shortfall error by re-reading the product
    /// for its name and current availability.
    async fn shortfall_error(&self, product_id: &str, requested: i64) -> EngineError {
        let products = ProductRepository::new(self.pool.clone());
        match products.get_by_id(product_id).await {
            Ok(Some(product)) => EngineError::InsufficientStock {
                product_id: product.id,
                name: product.name,
                requested,
                available: product.stock,
            },
            Ok(None) => EngineError::NotFound {
                entity: "product",
                id: product_id.to_string(),
            },
            Err(e) => EngineError::Infrastructure(e),
        }
    }
}

/// Materializes the priced cart into a committed sale record.
fn build_sale(
    seller_id: &str,
    payment_method: PaymentMethod,
    priced: &PricedSale,
    invoice_number: i64,
) -> Sale {
    Sale {
        id: Uuid::new_v4().to_string(),
        invoice_number,
        seller_id: seller_id.to_string(),
        lines: priced.lines.clone(),
        combo_lines: priced.combo_lines.clone(),
        total_before_discount: priced.total_before_discount,
        discount: priced.discount,
        total_sale: priced.total_sale,
        total_cost: priced.total_cost,
        net_profit: priced.net_profit,
        payment_method,
        created_at: Utc::now(),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
