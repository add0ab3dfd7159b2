//! SQLite-backed row store for Gridbase tables.
//!
//! This crate is intentionally self-contained so it can sit behind an IPC
//! boundary later. It exposes:
//! - SQLite schema creation/migration
//! - The paginated, filtered, sorted, searched page query ([`Store::get_page`])
//! - Single-row and cell mutations (transactional)
//! - The batched bulk row insert engine with partial-failure reporting
//! - View persistence (sorting/filter/hidden-column configs)

mod bulk;
mod fake;
mod predicate;
mod query;
mod schema;
pub mod store;

pub use bulk::{BulkInsertReport, CELL_FLUSH_SIZE, MAX_BULK_ROWS, ROW_BATCH_SIZE};
pub use predicate::Predicate;
pub use store::{Store, StoreError};
