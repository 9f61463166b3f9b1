//! # Error Types
//!
//! Domain-specific error types for fixcel-core.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │  ValidationError (this crate)                                       │
//! │       │   fail-fast request checks, no side effects                 │
//! │       ▼                                                             │
//! │  EngineError (fixcel-db)                                            │
//! │       │   InvalidRequest / NotFound / InsufficientStock /           │
//! │       │   Infrastructure — the caller-facing taxonomy               │
//! │       ▼                                                             │
//! │  Caller translates to its transport (HTTP status, CLI message, ...) │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (field names, limits)
//! 3. Errors are enum variants, never bare Strings

use thiserror::Error;

/// Input validation errors.
///
/// These occur before any I/O: a request that fails validation has caused
/// no mutation and can always be corrected and resubmitted.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Value must be positive.
    #[error("{field} must be greater than 0")]
    MustBePositive { field: String },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// A sale needs at least one product line or combo line.
    #[error("at least one product or combo line is required")]
    EmptyCart,

    /// Too many lines in one request.
    #[error("a sale cannot have more than {max} lines")]
    TooManyLines { max: usize },
}

/// Convenience type alias for validation results.
pub type ValidationResult<T> = Result<T, ValidationError>;
