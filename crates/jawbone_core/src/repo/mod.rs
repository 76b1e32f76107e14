//! SQLite repositories for the graph core tables.
//!
//! # Responsibility
//! - Own per-table data access for the graph core.
//! - Isolate SQL details from service orchestration.
//!
//! # Invariants
//! - Repositories borrow a `&Connection` and never open transactions, so a
//!   service can compose several of them inside one unit of work.
//! - Repository APIs return semantic errors (`NotFound`, `Conflict`,
//!   `Validation`) in addition to storage errors.

pub mod entity_repo;
pub mod error;
pub mod node_repo;
pub mod note_repo;
pub mod page_repo;
pub mod relationship_repo;
mod sql;
