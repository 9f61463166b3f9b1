//! # Domain Types
//!
//! Core domain types used throughout FIXCEL POS.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                │
//! │                                                                     │
//! │  ┌───────────────┐   ┌────────────────┐   ┌────────────────┐       │
//! │  │   Product     │   │     Combo      │   │      Sale      │       │
//! │  │ ────────────  │   │ ─────────────  │   │ ─────────────  │       │
//! │  │ id (UUID)     │   │ id (UUID)      │   │ id (UUID)      │       │
//! │  │ cost          │   │ items[]        │   │ invoice_number │       │
//! │  │ sell_price    │   │ sell_price     │   │ lines[]        │       │
//! │  │ stock         │   └────────────────┘   │ combo_lines[]  │       │
//! │  └───────────────┘                        │ totals ...     │       │
//! │                                           └────────────────┘       │
//! │  ┌───────────────┐   ┌────────────────┐   ┌────────────────┐       │
//! │  │  LossRecord   │   │ PaymentMethod  │   │     Role       │       │
//! │  │ ────────────  │   │ ─────────────  │   │ ─────────────  │       │
//! │  │ quantity      │   │ Cash (default) │   │ Administrator  │       │
//! │  │ reason        │   │ Card           │   │ Seller         │       │
//! │  │ cost_lost     │   │ Transfer/Other │   └────────────────┘       │
//! │  └───────────────┘   └────────────────┘                            │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Snapshot Pattern
//! `SaleLine` and `ComboLine` freeze sell price and cost at the moment of
//! sale. Later catalog price changes never rewrite committed history.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::money::Money;

/// A flattened reservation plan: product id → total quantity to decrement.
///
/// A product appearing both standalone and inside a combo accumulates a
/// single combined decrement. `BTreeMap` keeps iteration order stable, so
/// reservations are applied in a deterministic order on every path.
pub type DecrementMap = BTreeMap<String, i64>;

// =============================================================================
// Product
// =============================================================================

/// A product available for sale.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Display name.
    pub name: String,

    /// Category reference (category management is out of scope here).
    pub category_id: String,

    /// Barcode (EAN-13, UPC-A, etc.).
    pub barcode: Option<String>,

    /// Internal store code, unique when present. Assigned from the
    /// `"product"` sequence counter when missing on insert.
    pub internal_code: Option<String>,

    /// Purchase cost in cents.
    pub cost: Money,

    /// Sell price in cents.
    pub sell_price: Money,

    /// Current stock level. Never negative: the only mutation path is the
    /// conditional decrement (and its compensating increment).
    pub stock: i64,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Combo
// =============================================================================

/// One constituent of a combo: a product and how many units the bundle
/// contains.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct ComboItem {
    pub product_id: String,
    pub quantity: i64,
}

/// A fixed bundle of products sold at a single price.
///
/// Read-only to the sale engine; expanded into flat product decrements at
/// sale time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Combo {
    pub id: String,
    pub name: String,
    /// Fixed bundle price (not the sum of item prices).
    pub sell_price: Money,
    /// Ordered list of constituents.
    pub items: Vec<ComboItem>,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Payment Method
// =============================================================================

/// How the customer paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Physical cash payment.
    Cash,
    /// Card payment on external terminal.
    Card,
    /// Bank transfer.
    Transfer,
    /// Anything else (store credit, barter, ...).
    Other,
}

impl PaymentMethod {
    /// Parses a payment method leniently: unrecognized input falls back to
    /// `Cash` instead of failing.
    ///
    /// This mirrors the historical behavior of the store's API and is kept
    /// for backward compatibility with existing clients.
    pub fn parse_lenient(input: &str) -> Self {
        match input.trim().to_ascii_lowercase().as_str() {
            "card" => PaymentMethod::Card,
            "transfer" => PaymentMethod::Transfer,
            "other" => PaymentMethod::Other,
            _ => PaymentMethod::Cash,
        }
    }

    /// Canonical lowercase name, matching the database representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Card => "card",
            PaymentMethod::Transfer => "transfer",
            PaymentMethod::Other => "other",
        }
    }
}

impl Default for PaymentMethod {
    fn default() -> Self {
        PaymentMethod::Cash
    }
}

// =============================================================================
// Users & Callers
// =============================================================================

/// User role, as resolved by the external identity collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Full access, may register sales on behalf of another seller.
    Administrator,
    /// Restricted to registering their own sales.
    Seller,
}

/// A user known to the store (seller or administrator).
///
/// User management itself is out of scope; the engine only resolves ids.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct User {
    pub id: String,
    pub name: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

/// The authenticated caller of an engine operation, as resolved by the
/// external auth gate. The engine trusts this identity: seller and reporter
/// ids are derived from it unless an Administrator explicitly overrides the
/// seller.
#[derive(Debug, Clone)]
pub struct Caller {
    pub id: String,
    pub role: Role,
}

impl Caller {
    pub fn new(id: impl Into<String>, role: Role) -> Self {
        Caller {
            id: id.into(),
            role,
        }
    }
}

// =============================================================================
// Sale
// =============================================================================

/// A product line embedded in a committed sale.
///
/// `sell_price_at_sale` and `cost_at_sale` are historical snapshots, copied
/// from the product at the moment of sale and never recomputed later.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct SaleLine {
    pub product_id: String,
    pub quantity: i64,
    pub sell_price_at_sale: Money,
    pub cost_at_sale: Money,
}

/// A combo line embedded in a committed sale.
///
/// `cost_at_sale` is the sum over the combo's items of
/// `item product cost × item quantity`, computed at sale time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct ComboLine {
    pub combo_id: String,
    pub quantity: i64,
    pub sell_price_at_sale: Money,
    pub cost_at_sale: Money,
}

/// A committed sale. Immutable once persisted.
///
/// ## Invariants
/// - `total_sale == max(0, total_before_discount - discount)`
/// - `net_profit == total_sale - total_cost`
/// - `invoice_number` unique and strictly increasing in assignment order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sale {
    pub id: String,
    /// Human-readable invoice number from the `"sale"` sequence counter.
    pub invoice_number: i64,
    pub seller_id: String,
    pub lines: Vec<SaleLine>,
    pub combo_lines: Vec<ComboLine>,
    pub total_before_discount: Money,
    pub discount: Money,
    pub total_sale: Money,
    pub total_cost: Money,
    pub net_profit: Money,
    pub payment_method: PaymentMethod,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Loss / Warranty
// =============================================================================

/// A warranty or loss write-off against a single product.
///
/// Shares the reservation discipline with `Sale`: the stock decrement and
/// the record are committed together, and `cost_lost` is snapshotted from
/// the product cost at the moment of the decrement.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct LossRecord {
    pub id: String,
    pub product_id: String,
    /// Who reported the loss. Always server-derived from the caller, never
    /// trusted from the request body.
    pub reporter_id: Option<String>,
    pub quantity: i64,
    pub reason: String,
    /// `product cost at write-off time × quantity`.
    pub cost_lost: Money,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Requests
// =============================================================================

/// One requested product line of a sale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductLineRequest {
    pub product_id: String,
    pub quantity: i64,
}

/// One requested combo line of a sale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComboLineRequest {
    pub combo_id: String,
    pub quantity: i64,
}

/// A sale registration request, as submitted by a caller.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SaleRequest {
    /// Explicit seller override. Honored only when the caller is an
    /// Administrator; everyone else sells as themselves.
    pub seller_id: Option<String>,
    pub products: Vec<ProductLineRequest>,
    pub combos: Vec<ComboLineRequest>,
    /// Requested discount in cents. Negative values are clamped to zero.
    pub discount_cents: i64,
    /// Free-form payment method; parsed leniently (unknown → cash).
    pub payment_method: String,
}

/// A loss/warranty registration request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LossRequest {
    pub product_id: String,
    pub quantity: i64,
    /// Why the stock is written off ("factory fault", "broken cable", ...).
    pub reason: String,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payment_method_lenient_parse() {
        assert_eq!(PaymentMethod::parse_lenient("cash"), PaymentMethod::Cash);
        assert_eq!(PaymentMethod::parse_lenient("Card"), PaymentMethod::Card);
        assert_eq!(
            PaymentMethod::parse_lenient(" transfer "),
            PaymentMethod::Transfer
        );
        assert_eq!(PaymentMethod::parse_lenient("other"), PaymentMethod::Other);

        // The documented quirk: anything unknown degrades to cash
        assert_eq!(PaymentMethod::parse_lenient("bitcoin"), PaymentMethod::Cash);
        assert_eq!(PaymentMethod::parse_lenient(""), PaymentMethod::Cash);
    }

    #[test]
    fn test_payment_method_default() {
        assert_eq!(PaymentMethod::default(), PaymentMethod::Cash);
    }

    #[test]
    fn test_payment_method_as_str_round_trip() {
        for method in [
            PaymentMethod::Cash,
            PaymentMethod::Card,
            PaymentMethod::Transfer,
            PaymentMethod::Other,
        ] {
            assert_eq!(PaymentMethod::parse_lenient(method.as_str()), method);
        }
    }
}
