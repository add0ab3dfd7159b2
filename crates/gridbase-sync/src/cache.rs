use gridbase_model::{CellData, FilterRule, PageRequest, RowData, RowPage, SortRule};
use std::collections::HashMap;
use uuid::Uuid;

/// Identity of one paginated query stream: everything that affects the
/// result set except the cursor. Two requests with the same key but
/// different cursors are pages of the same stream.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey {
    pub table_id: Uuid,
    pub limit: u64,
    pub filters: Vec<FilterRule>,
    pub sorting: Vec<SortRule>,
    pub search: Option<String>,
}

impl QueryKey {
    /// Plain stream over a table: no filters, no sorting, no search.
    pub fn unfiltered(table_id: Uuid, limit: u64) -> Self {
        Self {
            table_id,
            limit,
            filters: Vec::new(),
            sorting: Vec::new(),
            search: None,
        }
    }

    pub fn is_filtering(&self) -> bool {
        !self.filters.is_empty()
    }

    /// Concrete request for this stream at the given cursor.
    pub fn page_request(&self, cursor: Option<u64>) -> PageRequest {
        PageRequest {
            table_id: self.table_id,
            limit: self.limit,
            cursor,
            filters: self.filters.clone(),
            sorting: self.sorting.clone(),
            search: self.search.clone(),
        }
    }
}

/// Fetched pages of one stream, in fetch order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CachedQuery {
    pub pages: Vec<RowPage>,
}

impl CachedQuery {
    pub fn loaded_rows(&self) -> usize {
        self.pages.iter().map(|page| page.items.len()).sum()
    }

    /// Cursor for the next fetch; `None` when nothing is loaded yet or the
    /// last page was terminal.
    pub fn next_cursor(&self) -> Option<u64> {
        self.pages.last().and_then(|page| page.next_cursor)
    }

    /// True once a page with no follow-up cursor has landed.
    pub fn is_exhausted(&self) -> bool {
        matches!(self.pages.last(), Some(page) if page.next_cursor.is_none())
    }

    /// Filtered total, carried only by a first page fetched with filters.
    pub fn total_filtered_count(&self) -> Option<u64> {
        self.pages.first().and_then(|page| page.total_filtered_count)
    }

    pub fn rows(&self) -> impl Iterator<Item = &RowData> {
        self.pages.iter().flat_map(|page| page.items.iter())
    }

    fn find_row_mut(&mut self, row_id: Uuid) -> Option<&mut RowData> {
        self.pages
            .iter_mut()
            .flat_map(|page| page.items.iter_mut())
            .find(|row| row.id == row_id)
    }
}

/// Prior state of one (row, column) slot, captured before an optimistic
/// cell write so a failed commit can put it back exactly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CellSlot {
    /// Row was loaded but had no cell record for the column.
    Missing,
    Present { id: Uuid, value: Option<String> },
}

/// Proof of a started fetch. [`QueryCache::complete_fetch`] only accepts the
/// page if no cancellation bumped the stream's generation in between.
#[derive(Debug)]
pub struct FetchTicket {
    generation: u64,
}

#[derive(Debug, Default)]
struct Entry {
    query: CachedQuery,
    generation: u64,
    in_flight: bool,
}

/// Keyed page cache with cancel-then-write semantics.
///
/// Optimistic mutations call [`cancel_in_flight`](Self::cancel_in_flight)
/// before touching an entry; any fetch started earlier then completes
/// against a stale generation and its page is discarded instead of
/// overwriting the optimistic state.
///
/// Alongside the pages it tracks one unfiltered row count per table, the
/// number the grid uses to size its scrollbar.
#[derive(Debug, Default)]
pub struct QueryCache {
    entries: HashMap<QueryKey, Entry>,
    row_counts: HashMap<Uuid, u64>,
}

impl QueryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &QueryKey) -> Option<&CachedQuery> {
        self.entries.get(key).map(|entry| &entry.query)
    }

    pub fn loaded_row_count(&self, key: &QueryKey) -> usize {
        self.get(key).map_or(0, CachedQuery::loaded_rows)
    }

    pub fn next_cursor(&self, key: &QueryKey) -> Option<u64> {
        self.get(key).and_then(CachedQuery::next_cursor)
    }

    pub fn fetch_in_flight(&self, key: &QueryKey) -> bool {
        self.entries.get(key).is_some_and(|entry| entry.in_flight)
    }

    /// Deep copy of an entry's pages, for a rollback snapshot. `None` means
    /// the stream has never been fetched.
    pub fn snapshot(&self, key: &QueryKey) -> Option<CachedQuery> {
        self.get(key).cloned()
    }

    /// Put a snapshot back. `None` clears the entry's pages.
    pub fn restore(&mut self, key: &QueryKey, snapshot: Option<CachedQuery>) {
        match snapshot {
            Some(query) => self.entry_mut(key).query = query,
            None => {
                if let Some(entry) = self.entries.get_mut(key) {
                    entry.query = CachedQuery::default();
                }
            }
        }
    }

    /// Invalidate a stream: drop its pages and orphan any in-flight fetch.
    /// The next read sees an empty stream and refetches from the start.
    pub fn invalidate(&mut self, key: &QueryKey) {
        let entry = self.entry_mut(key);
        entry.query = CachedQuery::default();
        entry.generation += 1;
        entry.in_flight = false;
    }

    /// Orphan any in-flight fetch for the stream without touching its pages.
    /// Call before an optimistic write so a racing fetch can't clobber it.
    pub fn cancel_in_flight(&mut self, key: &QueryKey) {
        if let Some(entry) = self.entries.get_mut(key) {
            entry.generation += 1;
            entry.in_flight = false;
        }
    }

    /// Mark a fetch as started. Returns `None` if one is already in flight
    /// for this stream.
    pub fn begin_fetch(&mut self, key: &QueryKey) -> Option<FetchTicket> {
        let entry = self.entry_mut(key);
        if entry.in_flight {
            return None;
        }
        entry.in_flight = true;
        Some(FetchTicket {
            generation: entry.generation,
        })
    }

    /// Append a fetched page, unless the ticket went stale. Returns whether
    /// the page was accepted.
    pub fn complete_fetch(&mut self, key: &QueryKey, ticket: FetchTicket, page: RowPage) -> bool {
        let Some(entry) = self.entries.get_mut(key) else {
            return false;
        };
        if entry.generation != ticket.generation {
            return false;
        }
        entry.in_flight = false;
        entry.query.pages.push(page);
        true
    }

    /// Release the in-flight marker after a failed fetch.
    pub fn abort_fetch(&mut self, key: &QueryKey, ticket: FetchTicket) {
        if let Some(entry) = self.entries.get_mut(key) {
            if entry.generation == ticket.generation {
                entry.in_flight = false;
            }
        }
    }

    /// Prior state of one cell slot. `None` when the row is not loaded in
    /// this stream.
    pub fn cell_slot(&self, key: &QueryKey, row_id: Uuid, column_id: Uuid) -> Option<CellSlot> {
        let query = self.get(key)?;
        let row = query.rows().find(|row| row.id == row_id)?;
        Some(match row.cell(column_id) {
            Some(cell) => CellSlot::Present {
                id: cell.id,
                value: cell.value.clone(),
            },
            None => CellSlot::Missing,
        })
    }

    /// Optimistically write a cell value in place. A row loaded without a
    /// record for the column gets one with a placeholder id, replaced when
    /// the committed cell comes back. Returns false if the row is not loaded.
    pub fn set_cell(
        &mut self,
        key: &QueryKey,
        row_id: Uuid,
        column_id: Uuid,
        value: Option<String>,
    ) -> bool {
        let Some(entry) = self.entries.get_mut(key) else {
            return false;
        };
        let Some(row) = entry.query.find_row_mut(row_id) else {
            return false;
        };
        match row.cell_mut(column_id) {
            Some(cell) => cell.value = value,
            None => row.cells.push(CellData {
                id: Uuid::new_v4(),
                column_id,
                value,
            }),
        }
        true
    }

    /// Replace an optimistic cell with the committed record from the store.
    pub fn adopt_cell(&mut self, key: &QueryKey, row_id: Uuid, cell: CellData) {
        let Some(entry) = self.entries.get_mut(key) else {
            return;
        };
        let Some(row) = entry.query.find_row_mut(row_id) else {
            return;
        };
        match row.cell_mut(cell.column_id) {
            Some(existing) => *existing = cell,
            None => row.cells.push(cell),
        }
    }

    /// Undo one optimistic cell write using its captured slot.
    pub fn restore_cell(&mut self, key: &QueryKey, row_id: Uuid, column_id: Uuid, slot: CellSlot) {
        let Some(entry) = self.entries.get_mut(key) else {
            return;
        };
        let Some(row) = entry.query.find_row_mut(row_id) else {
            return;
        };
        match slot {
            CellSlot::Missing => row.cells.retain(|cell| cell.column_id != column_id),
            CellSlot::Present { id, value } => match row.cell_mut(column_id) {
                Some(cell) => {
                    cell.id = id;
                    cell.value = value;
                }
                None => row.cells.push(CellData {
                    id,
                    column_id,
                    value,
                }),
            },
        }
    }

    /// Append a synthetic row to the first loaded page. Returns false when
    /// the stream has no pages yet, in which case the caller should fall
    /// back to invalidation.
    pub fn append_row_first_page(&mut self, key: &QueryKey, row: RowData) -> bool {
        let Some(entry) = self.entries.get_mut(key) else {
            return false;
        };
        let Some(first) = entry.query.pages.first_mut() else {
            return false;
        };
        first.items.push(row);
        true
    }

    /// Swap a loaded row for its committed counterpart, matched by id.
    /// Returns false if the row is no longer loaded.
    pub fn replace_row(&mut self, key: &QueryKey, row_id: Uuid, row: RowData) -> bool {
        let Some(entry) = self.entries.get_mut(key) else {
            return false;
        };
        match entry.query.find_row_mut(row_id) {
            Some(slot) => {
                *slot = row;
                true
            }
            None => false,
        }
    }

    pub fn row_count(&self, table_id: Uuid) -> Option<u64> {
        self.row_counts.get(&table_id).copied()
    }

    pub fn set_row_count(&mut self, table_id: Uuid, count: u64) {
        self.row_counts.insert(table_id, count);
    }

    /// Re-derive a table's row count from the loaded pages of an unfiltered
    /// stream. Used after reconciling an optimistic row add, where the
    /// loaded set is authoritative and a stale optimistic bump would drift.
    pub fn recompute_row_count(&mut self, key: &QueryKey) -> u64 {
        let count = self.loaded_row_count(key) as u64;
        self.set_row_count(key.table_id, count);
        count
    }

    fn entry_mut(&mut self, key: &QueryKey) -> &mut Entry {
        self.entries.entry(key.clone()).or_default()
    }
}
