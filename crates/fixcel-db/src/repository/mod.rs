//! # Repositories
//!
//! Data access, one module per aggregate. Each repository holds a cloned
//! `SqlitePool` handle and exposes async methods returning `DbResult`.
//!
//! Writes that must honor the reservation discipline (sale and loss
//! commits) do NOT go through repository methods on the pool; the engine
//! drives them through [`stock`] and the `pub(crate)` insert helpers so
//! decrement and record always share a fate.

pub mod combo;
pub mod loss;
pub mod product;
pub mod sale;
pub mod stock;
pub mod user;
