use gridbase_model::{CellData, ColumnKind, RowData, RowPage};
use gridbase_store::{Store, StoreError, MAX_BULK_ROWS};
use gridbase_sync::{CellSlot, QueryCache, QueryKey, RowAddOutcome, SyncEngine, SyncError};
use pretty_assertions::assert_eq;
use uuid::Uuid;

struct Fixture {
    engine: SyncEngine,
    cache: QueryCache,
    key: QueryKey,
    column_id: Uuid,
}

/// A table with one text column and `rows` committed rows, first page loaded.
fn loaded(rows: &[&str]) -> Fixture {
    let store = Store::open_in_memory().expect("open store");
    let table = store.create_table("People").expect("create table");
    let column = store
        .add_column(table.id, "Name", ColumnKind::Text)
        .expect("add column");
    for value in rows {
        let row = store.add_row(table.id, Uuid::new_v4()).expect("add row");
        store
            .upsert_cell(row.id, column.id, Some(value))
            .expect("seed cell");
    }

    let engine = SyncEngine::new(store);
    let mut cache = QueryCache::new();
    let key = QueryKey::unfiltered(table.id, 100);
    engine
        .fetch_next_page(&mut cache, &key)
        .expect("load first page");

    Fixture {
        engine,
        cache,
        key,
        column_id: column.id,
    }
}

fn cached_value(fx: &Fixture, row_id: Uuid) -> Option<String> {
    fx.cache
        .get(&fx.key)
        .and_then(|q| q.rows().find(|r| r.id == row_id))
        .and_then(|r| r.cell(fx.column_id))
        .and_then(|c| c.value.clone())
}

fn first_row_id(fx: &Fixture) -> Uuid {
    fx.cache
        .get(&fx.key)
        .and_then(|q| q.rows().next())
        .map(|r| r.id)
        .expect("a loaded row")
}

#[test]
fn committed_cell_edits_land_in_cache_and_store() {
    let mut fx = loaded(&["5"]);
    let row_id = first_row_id(&fx);

    let cell = fx
        .engine
        .commit_cell(
            &mut fx.cache,
            &fx.key,
            row_id,
            fx.column_id,
            ColumnKind::Text,
            Some("7"),
        )
        .expect("commit");
    assert_eq!(cell.value.as_deref(), Some("7"));
    assert_eq!(cached_value(&fx, row_id), Some("7".into()));

    let page = fx
        .engine
        .store()
        .get_page(&fx.key.page_request(None))
        .expect("page");
    assert_eq!(
        page.items[0].cell(fx.column_id).and_then(|c| c.value.clone()),
        Some("7".into())
    );
}

#[test]
fn a_failed_commit_restores_the_previous_value() {
    let mut fx = loaded(&[]);

    // A row the cache believes in but the store never stored: the write
    // fails on the foreign key and must roll back in place.
    let phantom = Uuid::new_v4();
    let ticket = fx.cache.begin_fetch(&fx.key).expect("fetch starts");
    fx.cache.complete_fetch(
        &fx.key,
        ticket,
        RowPage {
            items: vec![RowData {
                id: phantom,
                table_id: fx.key.table_id,
                position: 0,
                cells: vec![CellData {
                    id: Uuid::new_v4(),
                    column_id: fx.column_id,
                    value: Some("5".into()),
                }],
            }],
            search_matches: Vec::new(),
            total_filtered_count: None,
            next_cursor: None,
        },
    );

    let err = fx
        .engine
        .commit_cell(
            &mut fx.cache,
            &fx.key,
            phantom,
            fx.column_id,
            ColumnKind::Text,
            Some("7"),
        )
        .expect_err("store rejects the phantom row");
    assert!(matches!(err, SyncError::Store(_)));
    assert_eq!(cached_value(&fx, phantom), Some("5".into()));
}

#[test]
fn rejected_input_never_reaches_cache_or_store() {
    let mut fx = loaded(&["5"]);
    let row_id = first_row_id(&fx);

    let err = fx
        .engine
        .commit_cell(
            &mut fx.cache,
            &fx.key,
            row_id,
            fx.column_id,
            ColumnKind::Number,
            Some("not a number"),
        )
        .expect_err("validation rejects");
    assert!(matches!(err, SyncError::InvalidInput(_)));
    assert_eq!(cached_value(&fx, row_id), Some("5".into()));
}

#[test]
fn a_rollback_is_scoped_to_its_own_cell() {
    let mut fx = loaded(&["original"]);
    let row_id = first_row_id(&fx);

    fx.engine
        .commit_cell(
            &mut fx.cache,
            &fx.key,
            row_id,
            fx.column_id,
            ColumnKind::Text,
            Some("edited"),
        )
        .expect("first edit commits");

    // A column the store has never seen: the write fails on the foreign
    // key, and only that cell's optimistic state is undone.
    let bogus_column = Uuid::new_v4();
    let err = fx
        .engine
        .commit_cell(
            &mut fx.cache,
            &fx.key,
            row_id,
            bogus_column,
            ColumnKind::Text,
            Some("never lands"),
        )
        .expect_err("unknown column");
    assert!(matches!(err, SyncError::Store(_)));

    assert_eq!(cached_value(&fx, row_id), Some("edited".into()));
    assert_eq!(
        fx.cache.cell_slot(&fx.key, row_id, bogus_column),
        Some(CellSlot::Missing)
    );
}

#[test]
fn editing_an_unloaded_row_is_refused() {
    let mut fx = loaded(&["5"]);

    let err = fx
        .engine
        .commit_cell(
            &mut fx.cache,
            &fx.key,
            Uuid::new_v4(),
            fx.column_id,
            ColumnKind::Text,
            Some("7"),
        )
        .expect_err("row not loaded");
    assert!(matches!(err, SyncError::RowNotLoaded(_)));
}

#[test]
fn clearing_a_numeric_cell_is_always_valid() {
    let mut fx = loaded(&["5"]);
    let row_id = first_row_id(&fx);

    let cell = fx
        .engine
        .commit_cell(
            &mut fx.cache,
            &fx.key,
            row_id,
            fx.column_id,
            ColumnKind::Number,
            None,
        )
        .expect("clearing passes validation");
    assert_eq!(cell.value, None);
    assert_eq!(cached_value(&fx, row_id), None);
}

#[test]
fn added_rows_reconcile_in_place() {
    let mut fx = loaded(&["a", "b"]);

    let outcome = fx.engine.add_row(&mut fx.cache, &fx.key).expect("add row");
    assert_eq!(outcome, RowAddOutcome::Reconciled);
    assert_eq!(fx.cache.loaded_row_count(&fx.key), 3);
    assert_eq!(fx.cache.row_count(fx.key.table_id), Some(3));
    assert_eq!(fx.engine.store().row_count(fx.key.table_id).expect("count"), 3);

    // The committed row replaced the synthetic one: it carries the real
    // per-column null cells.
    let last = fx
        .cache
        .get(&fx.key)
        .and_then(|q| q.rows().last())
        .expect("added row");
    assert_eq!(last.cells.len(), 1);
    assert_eq!(last.position, 2);
}

#[test]
fn adding_to_an_unfetched_stream_requires_a_refetch() {
    let store = Store::open_in_memory().expect("open store");
    let table = store.create_table("People").expect("create table");
    let engine = SyncEngine::new(store);
    let mut cache = QueryCache::new();
    let key = QueryKey::unfiltered(table.id, 100);

    let outcome = engine.add_row(&mut cache, &key).expect("add row");
    assert_eq!(outcome, RowAddOutcome::RefetchRequired);
    assert_eq!(cache.row_count(table.id), Some(1));
    assert_eq!(engine.store().row_count(table.id).expect("count"), 1);
}

#[test]
fn a_failed_add_restores_the_loaded_pages() {
    let mut fx = loaded(&["a"]);

    // Point the stream at a table the store does not have. The optimistic
    // row appends to the loaded page, then the insert fails on the foreign
    // key and the page snapshot comes back.
    let bogus = QueryKey::unfiltered(Uuid::new_v4(), 100);
    let ticket = fx.cache.begin_fetch(&bogus).expect("fetch starts");
    fx.cache.complete_fetch(
        &bogus,
        ticket,
        RowPage {
            items: Vec::new(),
            search_matches: Vec::new(),
            total_filtered_count: None,
            next_cursor: None,
        },
    );

    let err = fx
        .engine
        .add_row(&mut fx.cache, &bogus)
        .expect_err("unknown table");
    assert!(matches!(err, SyncError::Store(_)));
    assert_eq!(fx.cache.loaded_row_count(&bogus), 0);
}

#[test]
fn bulk_adds_settle_the_count_on_the_store_total() {
    let mut fx = loaded(&["a", "b"]);
    fx.cache.set_row_count(fx.key.table_id, 2);

    let report = fx
        .engine
        .add_bulk_rows(&mut fx.cache, &fx.key, 50)
        .expect("bulk add");
    assert_eq!(report.inserted, 50);
    assert!(!report.failed);

    assert_eq!(fx.cache.row_count(fx.key.table_id), Some(52));
    // Pages were invalidated; the next fetch starts over.
    assert_eq!(fx.cache.loaded_row_count(&fx.key), 0);
    let page = fx
        .engine
        .fetch_next_page(&mut fx.cache, &fx.key)
        .expect("refetch")
        .expect("page accepted");
    assert_eq!(page.items.len(), 52);
}

#[test]
fn a_rejected_bulk_add_rolls_the_count_back() {
    let mut fx = loaded(&["a", "b"]);
    fx.cache.set_row_count(fx.key.table_id, 2);

    let err = fx
        .engine
        .add_bulk_rows(&mut fx.cache, &fx.key, MAX_BULK_ROWS + 1)
        .expect_err("over the cap");
    assert!(matches!(
        err,
        SyncError::Store(StoreError::BulkCountExceeded { .. })
    ));
    assert_eq!(fx.cache.row_count(fx.key.table_id), Some(2));
}

#[test]
fn fetch_next_page_walks_the_stream_to_exhaustion() {
    let store = Store::open_in_memory().expect("open store");
    let table = store.create_table("People").expect("create table");
    for _ in 0..5 {
        store.add_row(table.id, Uuid::new_v4()).expect("add row");
    }
    let engine = SyncEngine::new(store);
    let mut cache = QueryCache::new();
    let key = QueryKey::unfiltered(table.id, 2);

    let mut fetched = 0;
    while let Some(page) = engine.fetch_next_page(&mut cache, &key).expect("fetch") {
        fetched += page.items.len();
    }
    assert_eq!(fetched, 5);
    assert_eq!(cache.loaded_row_count(&key), 5);

    // Exhausted streams stay put.
    assert!(engine.fetch_next_page(&mut cache, &key).expect("fetch").is_none());
    assert_eq!(cache.loaded_row_count(&key), 5);
}

#[test]
fn an_edit_during_a_fetch_discards_the_stale_page() {
    let mut fx = loaded(&["a", "b", "c"]);

    // Simulate a fetch that was in flight when an edit landed: the ticket
    // predates the cancellation, so its page must not be appended.
    fx.cache.invalidate(&fx.key);
    let ticket = fx.cache.begin_fetch(&fx.key).expect("fetch starts");

    let page = fx
        .engine
        .store()
        .get_page(&fx.key.page_request(None))
        .expect("page");

    fx.cache.cancel_in_flight(&fx.key);
    assert!(!fx.cache.complete_fetch(&fx.key, ticket, page));
    assert_eq!(fx.cache.loaded_row_count(&fx.key), 0);
}
