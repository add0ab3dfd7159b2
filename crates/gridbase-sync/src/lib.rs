//! Client-side windowed fetching and optimistic synchronization for
//! Gridbase grids.
//!
//! The pieces compose around an explicit keyed [`QueryCache`] instead of
//! ambient global state:
//! - [`translate_filters`]/[`translate_sorting`] normalize UI-level sort and
//!   filter state into store query rules
//! - [`QueryCache`] holds fetched pages per query key, with
//!   cancel-then-write semantics so stale fetches can't clobber newer
//!   optimistic state
//! - [`PrefetchController`] decides when the virtualized viewport warrants
//!   fetching the next page (threshold + throttle)
//! - [`SyncEngine`] applies optimistic mutations (cell commit, row add,
//!   bulk add) with per-mutation rollback snapshots

mod cache;
mod optimistic;
mod prefetch;
mod translate;
mod view_sync;

pub use cache::{CachedQuery, CellSlot, FetchTicket, QueryCache, QueryKey};
pub use optimistic::{RowAddOutcome, SyncEngine, SyncError};
pub use prefetch::{
    effective_row_count, PrefetchController, PrefetchDecision, PREFETCH_THRESHOLD, SCROLL_THROTTLE,
};
pub use translate::{translate_filters, translate_sorting, UiColumnFilter, UiColumnSort};
pub use view_sync::ViewUpdater;
