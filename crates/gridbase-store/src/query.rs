use crate::predicate::Predicate;
use crate::store::{load_columns, Result, Store};
use gridbase_model::{
    cell_ref, CellData, Column, PageRequest, RowData, RowPage, SearchMatch, SortDirection,
};
use rusqlite::types::Value as SqlValue;
use rusqlite::{params, params_from_iter, Connection};
use std::collections::HashMap;
use uuid::Uuid;

impl Store {
    /// Execute one page of the windowed row query.
    ///
    /// - `cursor` is an offset (previous offset + limit); absent means 0.
    /// - `limit + 1` rows are fetched; the extra row only signals that a next
    ///   page exists and is trimmed from the result.
    /// - The first sort rule is honored (numeric columns compare as reals,
    ///   NULLS LAST); `position ASC` is always the final tie-break, so page
    ///   boundaries are deterministic across requests.
    /// - Filters AND-combine; rules naming unknown columns are dropped.
    /// - `total_filtered_count` is computed only on the first page of a
    ///   filtered query. Elsewhere callers use the unfiltered row count.
    /// - A non-empty search term annotates matching column names and, for
    ///   cells, the rows of *this page* with page-local row indexes.
    pub fn get_page(&self, request: &PageRequest) -> Result<RowPage> {
        let conn = self.conn.lock().expect("store mutex poisoned");
        fetch_page(&conn, request)
    }
}

fn fetch_page(conn: &Connection, request: &PageRequest) -> Result<RowPage> {
    let offset = request.cursor.unwrap_or(0);
    let limit = request.limit.max(1);
    let has_filters = !request.filters.is_empty();

    // Column metadata is only needed to interpret filters and sorting.
    let needs_columns = has_filters || !request.sorting.is_empty();
    let column_map: HashMap<Uuid, Column> = if needs_columns {
        load_columns(conn, request.table_id)?
            .into_iter()
            .map(|c| (c.id, c))
            .collect()
    } else {
        HashMap::new()
    };

    // WHERE: table scope plus one EXISTS subquery per recognized filter rule.
    let mut where_sql = String::from("rows.table_id = ?");
    let mut where_params: Vec<SqlValue> = vec![SqlValue::from(request.table_id.to_string())];
    for rule in &request.filters {
        if !column_map.contains_key(&rule.column_id) {
            continue;
        }
        where_sql.push_str(
            " AND EXISTS (SELECT 1 FROM cells WHERE cells.row_id = rows.id AND cells.column_id = ? AND ",
        );
        where_params.push(SqlValue::from(rule.column_id.to_string()));
        Predicate::from_rule(rule).push_sql(&mut where_sql, &mut where_params);
        where_sql.push(')');
    }

    // ORDER BY: first sort rule only; position is always the stable tie-break.
    let mut order_sql = String::new();
    let mut order_params: Vec<SqlValue> = Vec::new();
    if let Some(sort) = request.sorting.first() {
        if let Some(column) = column_map.get(&sort.column_id) {
            let value_sql =
                "(SELECT cells.value FROM cells WHERE cells.row_id = rows.id AND cells.column_id = ? LIMIT 1)";
            order_params.push(SqlValue::from(column.id.to_string()));
            let cast_sql = if column.kind.is_numeric() {
                format!("parse_real({value_sql})")
            } else {
                value_sql.to_string()
            };
            let direction = match sort.direction {
                SortDirection::Asc => "ASC",
                SortDirection::Desc => "DESC",
            };
            order_sql.push_str(&format!("{cast_sql} {direction} NULLS LAST, "));
        }
    }
    order_sql.push_str("rows.position ASC");

    let page_sql = format!(
        "SELECT rows.id, rows.position FROM rows WHERE {where_sql} ORDER BY {order_sql} LIMIT ? OFFSET ?"
    );
    let mut page_params = where_params.clone();
    page_params.extend(order_params);
    page_params.push(SqlValue::from(
        i64::try_from(limit.saturating_add(1)).unwrap_or(i64::MAX),
    ));
    page_params.push(SqlValue::from(i64::try_from(offset).unwrap_or(i64::MAX)));

    let mut stmt = conn.prepare(&page_sql)?;
    let mapped = stmt.query_map(params_from_iter(page_params.iter()), |r| {
        let id: String = r.get(0)?;
        let position: i64 = r.get(1)?;
        Ok((
            Uuid::parse_str(&id).map_err(|_| rusqlite::Error::InvalidQuery)?,
            position,
        ))
    })?;
    let mut page_rows: Vec<(Uuid, i64)> = Vec::new();
    for row in mapped {
        page_rows.push(row?);
    }

    let limit_usize = usize::try_from(limit).unwrap_or(usize::MAX);
    let has_more = page_rows.len() > limit_usize;
    if has_more {
        page_rows.truncate(limit_usize);
    }

    // The count query is only worth running when its result can't be derived
    // elsewhere: the first page of a filtered query. Unfiltered callers use
    // the separately cached row count.
    let total_filtered_count = if has_filters && offset == 0 {
        let count_sql = format!("SELECT COUNT(*) FROM rows WHERE {where_sql}");
        let count: u64 = conn.query_row(&count_sql, params_from_iter(where_params.iter()), |r| {
            r.get(0)
        })?;
        Some(count)
    } else {
        None
    };

    // Full cell data for the visible rows, grouped per row in column order.
    let mut cells_by_row: HashMap<Uuid, Vec<CellData>> = HashMap::new();
    if !page_rows.is_empty() {
        let placeholders = vec!["?"; page_rows.len()].join(", ");
        let cells_sql = format!(
            "SELECT cells.row_id, cells.id, cells.column_id, cells.value \
             FROM cells JOIN columns ON columns.id = cells.column_id \
             WHERE cells.row_id IN ({placeholders}) \
             ORDER BY columns.position"
        );
        let id_params: Vec<SqlValue> = page_rows
            .iter()
            .map(|(id, _)| SqlValue::from(id.to_string()))
            .collect();
        let mut stmt = conn.prepare(&cells_sql)?;
        let mapped = stmt.query_map(params_from_iter(id_params.iter()), |r| {
            let row_id: String = r.get(0)?;
            let id: String = r.get(1)?;
            let column_id: String = r.get(2)?;
            Ok((
                Uuid::parse_str(&row_id).map_err(|_| rusqlite::Error::InvalidQuery)?,
                CellData {
                    id: Uuid::parse_str(&id).map_err(|_| rusqlite::Error::InvalidQuery)?,
                    column_id: Uuid::parse_str(&column_id)
                        .map_err(|_| rusqlite::Error::InvalidQuery)?,
                    value: r.get(3)?,
                },
            ))
        })?;
        for item in mapped {
            let (row_id, cell) = item?;
            cells_by_row.entry(row_id).or_default().push(cell);
        }
    }

    let items: Vec<RowData> = page_rows
        .iter()
        .map(|&(id, position)| RowData {
            id,
            table_id: request.table_id,
            position,
            cells: cells_by_row.remove(&id).unwrap_or_default(),
        })
        .collect();

    // Global search (independent of filters): column-name matches, then cell
    // matches over the rows already loaded for this page. Cell match row
    // indexes are page-local by design.
    let mut search_matches = Vec::new();
    if let Some(term) = request
        .search
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
    {
        let mut stmt = conn.prepare(
            "SELECT id FROM columns WHERE table_id = ?1 AND instr(LOWER(name), LOWER(?2)) > 0 ORDER BY position",
        )?;
        let mapped = stmt.query_map(params![request.table_id.to_string(), term], |r| {
            let id: String = r.get(0)?;
            Uuid::parse_str(&id).map_err(|_| rusqlite::Error::InvalidQuery)
        })?;
        for column_id in mapped {
            search_matches.push(SearchMatch::Column {
                column_id: column_id?,
            });
        }

        let term_lower = term.to_lowercase();
        for (row_index, row) in items.iter().enumerate() {
            for cell in &row.cells {
                if let Some(value) = &cell.value {
                    if value.to_lowercase().contains(&term_lower) {
                        search_matches.push(SearchMatch::Cell {
                            cell_id: cell_ref(row.id, cell.column_id),
                            row_index,
                        });
                    }
                }
            }
        }
    }

    let next_cursor = has_more.then(|| offset + limit);

    Ok(RowPage {
        items,
        search_matches,
        total_filtered_count,
        next_cursor,
    })
}
