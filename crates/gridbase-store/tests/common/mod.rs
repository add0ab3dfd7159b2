#![allow(dead_code)]

use gridbase_model::{
    Column, ColumnKind, FilterOp, FilterRule, PageRequest, RowPage, SortDirection, SortRule,
};
use gridbase_store::Store;
use uuid::Uuid;

pub fn store() -> Store {
    Store::open_in_memory().expect("open in-memory store")
}

pub struct Fixture {
    pub store: Store,
    pub table_id: Uuid,
    pub column: Column,
}

/// One table with a single column and one row per entry in `values`.
/// `None` leaves the row's cell at the null it was created with.
pub fn single_column(kind: ColumnKind, values: &[Option<&str>]) -> Fixture {
    let store = store();
    let table = store.create_table("People").expect("create table");
    let column = store
        .add_column(table.id, "Value", kind)
        .expect("add column");

    for value in values {
        let row = store.add_row(table.id, Uuid::new_v4()).expect("add row");
        if let Some(value) = value {
            store
                .upsert_cell(row.id, column.id, Some(value))
                .expect("seed cell");
        }
    }

    Fixture {
        store,
        table_id: table.id,
        column,
    }
}

pub fn request(table_id: Uuid, limit: u64) -> PageRequest {
    PageRequest {
        table_id,
        limit,
        cursor: None,
        filters: Vec::new(),
        sorting: Vec::new(),
        search: None,
    }
}

pub fn filter(column_id: Uuid, op: FilterOp, value: Option<&str>) -> FilterRule {
    FilterRule {
        column_id,
        op,
        value: value.map(String::from),
    }
}

pub fn sort(column_id: Uuid, direction: SortDirection) -> SortRule {
    SortRule {
        column_id,
        direction,
    }
}

/// The page's values for one column, in row order.
pub fn page_values(page: &RowPage, column_id: Uuid) -> Vec<Option<String>> {
    page.items
        .iter()
        .map(|row| row.cell(column_id).and_then(|cell| cell.value.clone()))
        .collect()
}

pub fn some_strings(values: &[&str]) -> Vec<Option<String>> {
    values.iter().map(|v| Some(v.to_string())).collect()
}
