//! # fixcel-core: Pure Business Logic for FIXCEL POS
//!
//! This crate is the **heart** of FIXCEL POS. It contains all business logic
//! as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                      FIXCEL POS Architecture                        │
//! │                                                                     │
//! │  ┌───────────────────────────────────────────────────────────────┐ │
//! │  │                Callers (HTTP layer, CLI, tests)               │ │
//! │  └──────────────────────────────┬────────────────────────────────┘ │
//! │                                 │                                   │
//! │  ┌──────────────────────────────▼────────────────────────────────┐ │
//! │  │              ★ fixcel-core (THIS CRATE) ★                     │ │
//! │  │                                                               │ │
//! │  │  ┌─────────┐  ┌─────────┐  ┌──────────┐  ┌────────────┐      │ │
//! │  │  │  types  │  │  money  │  │ pricing  │  │ validation │      │ │
//! │  │  │ Product │  │  Money  │  │ reducer  │  │   rules    │      │ │
//! │  │  │  Sale   │  │ (cents) │  │ flatten  │  │   checks   │      │ │
//! │  │  └─────────┘  └─────────┘  └──────────┘  └────────────┘      │ │
//! │  │                                                               │ │
//! │  │  NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │ │
//! │  └──────────────────────────────┬────────────────────────────────┘ │
//! │                                 │                                   │
//! │  ┌──────────────────────────────▼────────────────────────────────┐ │
//! │  │                  fixcel-db (Database Layer)                   │ │
//! │  │    SQLite repositories, sale engine, stock reservation        │ │
//! │  └───────────────────────────────────────────────────────────────┘ │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, Combo, Sale, LossRecord, etc.)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`pricing`] - Pure pricing reducer: totals, snapshots, combo flattening
//! - [`validation`] - Fail-fast request validation
//! - [`error`] - Domain error types
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: Every function is deterministic - same input = same output
//! 2. **No I/O**: Database, network, file system access is FORBIDDEN here
//! 3. **Integer Money**: All monetary values are in cents (i64) to avoid float errors
//! 4. **Explicit Errors**: All errors are typed, never strings or panics

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod money;
pub mod pricing;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::ValidationError;
pub use money::Money;
pub use pricing::{price_sale, PricedSale, ResolvedComboLine};
pub use types::*;
pub use validation::{validate_loss_request, validate_sale_request};

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum quantity of a single line in a sale or loss request.
///
/// ## Business Reason
/// Prevents accidental over-ordering (e.g., typing 1000 instead of 10).
/// Can be made configurable per store in future versions.
pub const MAX_LINE_QUANTITY: i64 = 9999;

/// Maximum number of lines (products + combos) in a single sale.
pub const MAX_SALE_LINES: usize = 200;
