use crate::cache::{QueryCache, QueryKey};
use gridbase_model::{
    validate_cell_input, CellData, ColumnKind, InputError, RowData, RowPage,
};
use gridbase_store::{BulkInsertReport, Store, StoreError};
use tracing::{debug, warn};
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    InvalidInput(#[from] InputError),
    #[error("row {0} is not loaded in this query")]
    RowNotLoaded(Uuid),
}

pub type Result<T> = std::result::Result<T, SyncError>;

/// How an optimistic row add reconciled against the committed row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowAddOutcome {
    /// The synthetic row was swapped for the committed one in place.
    Reconciled,
    /// The synthetic row was gone (stream had no pages, or a concurrent
    /// write replaced them); the stream was invalidated and needs a refetch.
    RefetchRequired,
}

/// Applies mutations optimistically against a [`QueryCache`] and commits
/// them to the [`Store`], rolling the cache back when the commit fails.
///
/// Every mutation follows the same shape: capture the narrowest snapshot
/// that covers what it will touch, cancel in-flight fetches for the stream
/// so a racing page can't overwrite the optimistic state, apply, commit,
/// then reconcile or restore.
#[derive(Debug)]
pub struct SyncEngine {
    store: Store,
}

impl SyncEngine {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Commit one cell edit.
    ///
    /// Validation runs first so a rejected value never dirties the cache or
    /// reaches the store. The rollback snapshot is scoped to the one cell
    /// slot; edits to other cells in flight at the same time are untouched
    /// by a failure here.
    pub fn commit_cell(
        &self,
        cache: &mut QueryCache,
        key: &QueryKey,
        row_id: Uuid,
        column_id: Uuid,
        kind: ColumnKind,
        value: Option<&str>,
    ) -> Result<CellData> {
        validate_cell_input(kind, value)?;
        let slot = cache
            .cell_slot(key, row_id, column_id)
            .ok_or(SyncError::RowNotLoaded(row_id))?;

        cache.cancel_in_flight(key);
        cache.set_cell(key, row_id, column_id, value.map(str::to_string));

        match self.store.upsert_cell(row_id, column_id, value) {
            Ok(cell) => {
                cache.adopt_cell(key, row_id, cell.clone());
                Ok(cell)
            }
            Err(err) => {
                warn!(row = %row_id, column = %column_id, %err, "cell commit failed, rolling back");
                cache.restore_cell(key, row_id, column_id, slot);
                Err(err.into())
            }
        }
    }

    /// Add one row, shown immediately as a synthetic row at the end of the
    /// loaded set.
    ///
    /// The synthetic row and the committed row share an id, so on success
    /// the committed row (with its real position and empty cells) replaces
    /// the synthetic one in place. If the replacement target is gone the
    /// stream is invalidated instead and the caller refetches. The table's
    /// row count is re-derived from the loaded pages rather than bumped
    /// blindly, so repeated adds can't drift it.
    pub fn add_row(&self, cache: &mut QueryCache, key: &QueryKey) -> Result<RowAddOutcome> {
        let row_id = Uuid::new_v4();
        let snapshot = cache.snapshot(key);

        cache.cancel_in_flight(key);
        let synthetic = RowData {
            id: row_id,
            table_id: key.table_id,
            position: cache.loaded_row_count(key) as i64,
            cells: Vec::new(),
        };
        let applied = cache.append_row_first_page(key, synthetic);

        match self.store.add_row(key.table_id, row_id) {
            Ok(committed) => {
                if applied && cache.replace_row(key, row_id, committed) {
                    cache.recompute_row_count(key);
                    Ok(RowAddOutcome::Reconciled)
                } else {
                    debug!(table = %key.table_id, row = %row_id, "optimistic row lost, invalidating stream");
                    cache.invalidate(key);
                    let count = self.store.row_count(key.table_id)?;
                    cache.set_row_count(key.table_id, count);
                    Ok(RowAddOutcome::RefetchRequired)
                }
            }
            Err(err) => {
                if applied {
                    cache.restore(key, snapshot);
                }
                Err(err.into())
            }
        }
    }

    /// Bulk-insert synthesized rows.
    ///
    /// The only optimistic effect is the row count: it jumps by the
    /// requested amount so the scrollbar resizes immediately, then settles
    /// on the store's actual count once the insert finishes (bulk inserts
    /// can partially succeed). Loaded pages are invalidated either way,
    /// since committed batches are visible even when a later batch failed.
    pub fn add_bulk_rows(
        &self,
        cache: &mut QueryCache,
        key: &QueryKey,
        count: u64,
    ) -> Result<BulkInsertReport> {
        let previous = cache.row_count(key.table_id);
        let optimistic = previous.unwrap_or(0).saturating_add(count);
        cache.cancel_in_flight(key);
        cache.set_row_count(key.table_id, optimistic);

        let result = self.store.add_bulk_rows(key.table_id, count);
        cache.invalidate(key);

        match result {
            Ok(report) => {
                let actual = self.store.row_count(key.table_id)?;
                cache.set_row_count(key.table_id, actual);
                Ok(report)
            }
            Err(err) => {
                match previous {
                    Some(count) => cache.set_row_count(key.table_id, count),
                    None => {
                        let actual = self.store.row_count(key.table_id)?;
                        cache.set_row_count(key.table_id, actual);
                    }
                }
                Err(err.into())
            }
        }
    }

    /// Fetch the stream's next page (or its first) into the cache.
    ///
    /// Returns the page when it was fetched and accepted, `None` when the
    /// stream is exhausted, a fetch is already in flight, or the page was
    /// discarded because a mutation cancelled the fetch mid-flight.
    pub fn fetch_next_page(
        &self,
        cache: &mut QueryCache,
        key: &QueryKey,
    ) -> Result<Option<RowPage>> {
        if cache.get(key).is_some_and(|query| query.is_exhausted()) {
            return Ok(None);
        }
        let cursor = cache.next_cursor(key);
        let Some(ticket) = cache.begin_fetch(key) else {
            return Ok(None);
        };

        match self.store.get_page(&key.page_request(cursor)) {
            Ok(page) => {
                let accepted = cache.complete_fetch(key, ticket, page.clone());
                Ok(accepted.then_some(page))
            }
            Err(err) => {
                cache.abort_fetch(key, ticket);
                Err(err.into())
            }
        }
    }
}
