//! `gridbase-model` defines the core data-grid structures shared by the
//! store and sync layers.
//!
//! The crate is intentionally self-contained so it can be reused by:
//! - the SQLite row store (`gridbase-store`)
//! - the client-side fetch/sync engine (`gridbase-sync`)
//! - IPC boundaries via `serde` (JSON-safe schema)

mod column;
mod query;
mod row;
mod table;
mod validate;
mod view;

pub use column::{Column, ColumnKind};
pub use query::{
    FilterOp, FilterRule, PageRequest, RowPage, SearchMatch, SortDirection, SortRule,
};
pub use row::{cell_ref, CellData, RowData};
pub use table::{TableMeta, TableWithViews};
pub use validate::{validate_cell_input, validate_name, InputError, NameError, MAX_NAME_LEN};
pub use view::{ViewConfig, ViewMeta};
