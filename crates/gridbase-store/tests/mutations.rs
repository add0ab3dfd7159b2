mod common;

use common::request;
use gridbase_model::{ColumnKind, ViewConfig};
use gridbase_store::StoreError;
use pretty_assertions::assert_eq;
use uuid::Uuid;

#[test]
fn add_row_creates_one_null_cell_per_column() {
    let store = common::store();
    let table = store.create_table("People").expect("create table");
    let name = store
        .add_column(table.id, "Name", ColumnKind::Text)
        .expect("add column");
    let age = store
        .add_column(table.id, "Age", ColumnKind::Number)
        .expect("add column");

    let row = store.add_row(table.id, Uuid::new_v4()).expect("add row");
    assert_eq!(row.position, 0);
    assert_eq!(row.cells.len(), 2);
    assert!(row.cells.iter().all(|cell| cell.value.is_none()));
    assert!(row.cell(name.id).is_some());
    assert!(row.cell(age.id).is_some());

    let second = store.add_row(table.id, Uuid::new_v4()).expect("add row");
    assert_eq!(second.position, 1);
    assert_eq!(store.row_count(table.id).expect("count"), 2);
}

#[test]
fn add_row_keeps_the_client_supplied_id() {
    let store = common::store();
    let table = store.create_table("People").expect("create table");

    let client_id = Uuid::new_v4();
    let row = store.add_row(table.id, client_id).expect("add row");
    assert_eq!(row.id, client_id);

    let page = store.get_page(&request(table.id, 10)).expect("page");
    assert_eq!(page.items[0].id, client_id);
}

#[test]
fn upsert_cell_inserts_then_updates_in_place() {
    let store = common::store();
    let table = store.create_table("People").expect("create table");
    let column = store
        .add_column(table.id, "Name", ColumnKind::Text)
        .expect("add column");
    let row = store.add_row(table.id, Uuid::new_v4()).expect("add row");

    let first = store
        .upsert_cell(row.id, column.id, Some("a"))
        .expect("upsert");
    assert_eq!(first.value.as_deref(), Some("a"));

    let second = store
        .upsert_cell(row.id, column.id, Some("b"))
        .expect("upsert");
    assert_eq!(second.value.as_deref(), Some("b"));
    assert_eq!(second.id, first.id);

    let cleared = store.upsert_cell(row.id, column.id, None).expect("upsert");
    assert_eq!(cleared.value, None);
}

#[test]
fn a_late_column_is_not_backfilled_until_edited() {
    let store = common::store();
    let table = store.create_table("People").expect("create table");
    let row = store.add_row(table.id, Uuid::new_v4()).expect("add row");

    let column = store
        .add_column(table.id, "Added Later", ColumnKind::Text)
        .expect("add column");

    let page = store.get_page(&request(table.id, 10)).expect("page");
    assert!(page.items[0].cell(column.id).is_none());

    store
        .upsert_cell(row.id, column.id, Some("now it exists"))
        .expect("upsert");
    let page = store.get_page(&request(table.id, 10)).expect("page");
    assert_eq!(
        page.items[0]
            .cell(column.id)
            .and_then(|c| c.value.as_deref()),
        Some("now it exists")
    );
}

#[test]
fn blank_names_are_rejected() {
    let store = common::store();
    assert!(matches!(
        store.create_table("   "),
        Err(StoreError::InvalidName(_))
    ));

    let table = store.create_table("Ok").expect("create table");
    assert!(matches!(
        store.add_column(table.id, "", ColumnKind::Text),
        Err(StoreError::InvalidName(_))
    ));
}

#[test]
fn missing_tables_and_views_surface_as_not_found() {
    let store = common::store();
    let missing = Uuid::new_v4();

    assert!(matches!(
        store.get_table(missing),
        Err(StoreError::TableNotFound(id)) if id == missing
    ));
    assert!(matches!(
        store.get_view(missing),
        Err(StoreError::ViewNotFound(id)) if id == missing
    ));
    assert!(matches!(
        store.update_view(missing, &ViewConfig::default()),
        Err(StoreError::ViewNotFound(_))
    ));
}

#[test]
fn views_round_trip_their_config() {
    let store = common::store();
    let table = store.create_table("People").expect("create table");
    let column = store
        .add_column(table.id, "Name", ColumnKind::Text)
        .expect("add column");

    let config = ViewConfig {
        hidden_columns: vec![column.id],
        ..ViewConfig::default()
    };
    let view = store
        .create_view(table.id, "Grid view", config.clone())
        .expect("create view");

    let loaded = store.get_view(view.id).expect("get view");
    assert_eq!(loaded.config, config);
    assert_eq!(loaded.name, "Grid view");
}

#[test]
fn partial_view_updates_leave_other_fields_alone() {
    let store = common::store();
    let table = store.create_table("People").expect("create table");
    let column = store
        .add_column(table.id, "Name", ColumnKind::Text)
        .expect("add column");

    let view = store
        .create_view(
            table.id,
            "Grid view",
            ViewConfig {
                hidden_columns: vec![column.id],
                ..ViewConfig::default()
            },
        )
        .expect("create view");

    store
        .update_view_sorting(
            view.id,
            &[gridbase_model::SortRule {
                column_id: column.id,
                direction: gridbase_model::SortDirection::Desc,
            }],
        )
        .expect("update sorting");

    let loaded = store.get_view(view.id).expect("get view");
    assert_eq!(loaded.config.sorting.len(), 1);
    assert_eq!(loaded.config.hidden_columns, vec![column.id]);
}

#[test]
fn table_views_list_alphabetically() {
    let store = common::store();
    let table = store.create_table("People").expect("create table");
    for name in ["Zebra", "Alpha", "Middle"] {
        store
            .create_view(table.id, name, ViewConfig::default())
            .expect("create view");
    }

    let with_views = store.get_table_with_views(table.id).expect("load");
    let names: Vec<&str> = with_views.views.iter().map(|v| v.name.as_str()).collect();
    assert_eq!(names, vec!["Alpha", "Middle", "Zebra"]);
}
