//! # fixcel-db: Persistence & Sale Engine for FIXCEL POS
//!
//! SQLite persistence layer and the sale transaction engine.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                        fixcel-db (THIS CRATE)                       │
//! │                                                                     │
//! │  Database (pool.rs)                                                 │
//! │      │                                                              │
//! │      ├──► repositories ──► products / combos / users (catalog)      │
//! │      │                     sales / losses (immutable history)       │
//! │      │                                                              │
//! │      └──► SaleEngine (engine.rs)                                    │
//! │               │                                                     │
//! │               ├── pricing via fixcel-core (pure, no I/O)            │
//! │               ├── stock reservation (guarded conditional UPDATE)    │
//! │               ├── invoice numbers (atomic counter upsert)           │
//! │               └── tx commit + sequential fallback w/ compensation   │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Key Rules
//!
//! 1. `products.stock` is only ever mutated by the guarded decrement in
//!    [`repository::stock`] (and its compensating increment).
//! 2. Sales and loss records are immutable once committed.
//! 3. Invoice numbers come from the `counters` table, never from memory.

pub mod engine;
pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;
pub mod sequence;

pub use engine::{EngineError, EngineResult, SaleEngine};
pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};
pub use repository::combo::ComboRepository;
pub use repository::loss::{LossFilter, LossRepository};
pub use repository::product::ProductRepository;
pub use repository::sale::{SaleFilter, SaleRepository};
pub use repository::user::UserRepository;
