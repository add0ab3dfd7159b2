use crate::schema;
use gridbase_model::{
    validate_name, CellData, Column, ColumnKind, NameError, RowData, SortRule, FilterRule,
    TableMeta, TableWithViews, ViewConfig, ViewMeta,
};
use rusqlite::functions::FunctionFlags;
use rusqlite::{params, Connection, OpenFlags, OptionalExtension};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid name: {0}")]
    InvalidName(#[from] NameError),
    #[error("table not found: {0}")]
    TableNotFound(Uuid),
    #[error("view not found: {0}")]
    ViewNotFound(Uuid),
    #[error("row creation returned no row")]
    RowCreationFailed,
    #[error("bulk insert of {requested} rows exceeds the {max} row limit")]
    BulkCountExceeded { requested: u64, max: u64 },
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// SQLite-backed row store.
///
/// The connection is shared behind a mutex; every operation that spans
/// multiple statements runs inside a transaction on that connection.
#[derive(Debug, Clone)]
pub struct Store {
    pub(crate) conn: Arc<Mutex<Connection>>,
}

impl Store {
    pub fn open_path(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path)?;
        configure(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        configure(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn open_uri(uri: &str) -> Result<Self> {
        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_CREATE
            | OpenFlags::SQLITE_OPEN_URI;
        let conn = Connection::open_with_flags(uri, flags)?;
        configure(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn create_table(&self, name: &str) -> Result<TableMeta> {
        let table = TableMeta {
            id: Uuid::new_v4(),
            name: validate_name(name)?.to_string(),
        };

        let conn = self.conn.lock().expect("store mutex poisoned");
        conn.execute(
            "INSERT INTO tables (id, name) VALUES (?1, ?2)",
            params![table.id.to_string(), &table.name],
        )?;

        Ok(table)
    }

    pub fn get_table(&self, id: Uuid) -> Result<TableMeta> {
        let conn = self.conn.lock().expect("store mutex poisoned");
        let row = conn
            .query_row(
                "SELECT id, name FROM tables WHERE id = ?1",
                params![id.to_string()],
                |r| {
                    let id: String = r.get(0)?;
                    Ok(TableMeta {
                        id: Uuid::parse_str(&id).map_err(|_| rusqlite::Error::InvalidQuery)?,
                        name: r.get(1)?,
                    })
                },
            )
            .optional()?;

        row.ok_or(StoreError::TableNotFound(id))
    }

    /// Add a column at the end of the table's column order.
    ///
    /// Existing rows are not backfilled: a missing cell reads as empty, and
    /// the next edit materializes it via [`Store::upsert_cell`].
    pub fn add_column(&self, table_id: Uuid, name: &str, kind: ColumnKind) -> Result<Column> {
        let name = validate_name(name)?.to_string();
        self.get_table(table_id)?;

        let mut conn = self.conn.lock().expect("store mutex poisoned");
        let tx = conn.transaction()?;
        let position: i64 = tx.query_row(
            "SELECT COALESCE(MAX(position) + 1, 0) FROM columns WHERE table_id = ?1",
            params![table_id.to_string()],
            |r| r.get(0),
        )?;

        let column = Column {
            id: Uuid::new_v4(),
            table_id,
            name,
            kind,
            position,
        };
        tx.execute(
            "INSERT INTO columns (id, table_id, name, kind, position) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                column.id.to_string(),
                table_id.to_string(),
                &column.name,
                column.kind.as_str(),
                column.position
            ],
        )?;
        tx.commit()?;

        Ok(column)
    }

    /// All columns of a table, in display order.
    pub fn get_columns(&self, table_id: Uuid) -> Result<Vec<Column>> {
        let conn = self.conn.lock().expect("store mutex poisoned");
        load_columns(&conn, table_id)
    }

    pub fn get_table_with_views(&self, table_id: Uuid) -> Result<TableWithViews> {
        let table = self.get_table(table_id)?;

        let conn = self.conn.lock().expect("store mutex poisoned");
        let mut stmt = conn.prepare(
            "SELECT id, table_id, name, config FROM views WHERE table_id = ?1 ORDER BY name",
        )?;
        let rows = stmt.query_map(params![table_id.to_string()], map_view_row)?;

        let mut views = Vec::new();
        for view in rows {
            views.push(view?);
        }
        Ok(TableWithViews { table, views })
    }

    pub fn create_view(&self, table_id: Uuid, name: &str, config: ViewConfig) -> Result<ViewMeta> {
        let view = ViewMeta {
            id: Uuid::new_v4(),
            table_id,
            name: validate_name(name)?.to_string(),
            config,
        };

        let conn = self.conn.lock().expect("store mutex poisoned");
        conn.execute(
            "INSERT INTO views (id, table_id, name, config) VALUES (?1, ?2, ?3, ?4)",
            params![
                view.id.to_string(),
                table_id.to_string(),
                &view.name,
                serde_json::to_string(&view.config)?
            ],
        )?;

        Ok(view)
    }

    pub fn get_view(&self, view_id: Uuid) -> Result<ViewMeta> {
        let conn = self.conn.lock().expect("store mutex poisoned");
        let row = conn
            .query_row(
                "SELECT id, table_id, name, config FROM views WHERE id = ?1",
                params![view_id.to_string()],
                map_view_row,
            )
            .optional()?;

        row.ok_or(StoreError::ViewNotFound(view_id))
    }

    /// Replace a view's entire configuration.
    pub fn update_view(&self, view_id: Uuid, config: &ViewConfig) -> Result<()> {
        let conn = self.conn.lock().expect("store mutex poisoned");
        let updated = conn.execute(
            "UPDATE views SET config = ?1 WHERE id = ?2",
            params![serde_json::to_string(config)?, view_id.to_string()],
        )?;
        if updated == 0 {
            return Err(StoreError::ViewNotFound(view_id));
        }
        Ok(())
    }

    pub fn update_view_sorting(&self, view_id: Uuid, sorting: &[SortRule]) -> Result<()> {
        self.update_view_config(view_id, |config| config.sorting = sorting.to_vec())
    }

    pub fn update_view_filters(&self, view_id: Uuid, filters: &[FilterRule]) -> Result<()> {
        self.update_view_config(view_id, |config| config.filters = filters.to_vec())
    }

    pub fn update_view_hidden(&self, view_id: Uuid, hidden: &[Uuid]) -> Result<()> {
        self.update_view_config(view_id, |config| config.hidden_columns = hidden.to_vec())
    }

    fn update_view_config(&self, view_id: Uuid, f: impl FnOnce(&mut ViewConfig)) -> Result<()> {
        let mut conn = self.conn.lock().expect("store mutex poisoned");
        let tx = conn.transaction()?;
        let raw: Option<String> = tx
            .query_row(
                "SELECT config FROM views WHERE id = ?1",
                params![view_id.to_string()],
                |r| r.get(0),
            )
            .optional()?;
        let Some(raw) = raw else {
            return Err(StoreError::ViewNotFound(view_id));
        };

        let mut config: ViewConfig = serde_json::from_str(&raw).unwrap_or_default();
        f(&mut config);

        tx.execute(
            "UPDATE views SET config = ?1 WHERE id = ?2",
            params![serde_json::to_string(&config)?, view_id.to_string()],
        )?;
        tx.commit()?;
        Ok(())
    }

    /// Unfiltered row count for a table.
    pub fn row_count(&self, table_id: Uuid) -> Result<u64> {
        let conn = self.conn.lock().expect("store mutex poisoned");
        let count: u64 = conn.query_row(
            "SELECT COUNT(*) FROM rows WHERE table_id = ?1",
            params![table_id.to_string()],
            |r| r.get(0),
        )?;
        Ok(count)
    }

    /// Create a single row with the caller-supplied id, plus one null cell
    /// per existing column. All-or-nothing.
    ///
    /// The client generates the id so an optimistic synthetic row can later
    /// be matched against the committed one.
    pub fn add_row(&self, table_id: Uuid, client_id: Uuid) -> Result<RowData> {
        let mut conn = self.conn.lock().expect("store mutex poisoned");
        let tx = conn.transaction()?;

        let columns = load_columns(&tx, table_id)?;
        let position = next_row_position(&tx, table_id)?;

        let inserted = tx.execute(
            "INSERT INTO rows (id, table_id, position) VALUES (?1, ?2, ?3)",
            params![client_id.to_string(), table_id.to_string(), position],
        )?;
        if inserted == 0 {
            return Err(StoreError::RowCreationFailed);
        }

        let mut cells = Vec::with_capacity(columns.len());
        {
            let mut stmt = tx.prepare(
                "INSERT INTO cells (id, row_id, column_id, value) VALUES (?1, ?2, ?3, NULL)",
            )?;
            for column in &columns {
                let cell_id = Uuid::new_v4();
                stmt.execute(params![
                    cell_id.to_string(),
                    client_id.to_string(),
                    column.id.to_string()
                ])?;
                cells.push(CellData {
                    id: cell_id,
                    column_id: column.id,
                    value: None,
                });
            }
        }

        tx.commit()?;
        Ok(RowData {
            id: client_id,
            table_id,
            position,
            cells,
        })
    }

    /// Insert or update the cell at (row, column) and return its stored form.
    pub fn upsert_cell(
        &self,
        row_id: Uuid,
        column_id: Uuid,
        value: Option<&str>,
    ) -> Result<CellData> {
        let conn = self.conn.lock().expect("store mutex poisoned");
        conn.execute(
            r#"
            INSERT INTO cells (id, row_id, column_id, value)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(row_id, column_id) DO UPDATE SET value = excluded.value
            "#,
            params![
                Uuid::new_v4().to_string(),
                row_id.to_string(),
                column_id.to_string(),
                value
            ],
        )?;

        let cell = conn.query_row(
            "SELECT id, column_id, value FROM cells WHERE row_id = ?1 AND column_id = ?2",
            params![row_id.to_string(), column_id.to_string()],
            |r| {
                let id: String = r.get(0)?;
                let column_id: String = r.get(1)?;
                Ok(CellData {
                    id: Uuid::parse_str(&id).map_err(|_| rusqlite::Error::InvalidQuery)?,
                    column_id: Uuid::parse_str(&column_id)
                        .map_err(|_| rusqlite::Error::InvalidQuery)?,
                    value: r.get(2)?,
                })
            },
        )?;
        Ok(cell)
    }
}

fn configure(conn: &Connection) -> rusqlite::Result<()> {
    conn.busy_timeout(Duration::from_secs(5))?;

    // Strict numeric coercion for filter/sort casts. SQLite's `CAST(x AS
    // REAL)` turns non-numeric text into 0.0, which would let "abc" satisfy
    // numeric comparisons; `parse_real` yields NULL instead, so such cells
    // never match and sort after real numbers (NULLS LAST).
    conn.create_scalar_function(
        "parse_real",
        1,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| {
            let value: Option<String> = ctx.get(0)?;
            Ok(value.and_then(|v| v.trim().parse::<f64>().ok()))
        },
    )?;

    schema::init(conn)?;
    Ok(())
}

fn map_view_row(r: &rusqlite::Row<'_>) -> rusqlite::Result<ViewMeta> {
    let id: String = r.get(0)?;
    let table_id: String = r.get(1)?;
    let raw_config: String = r.get(3)?;
    Ok(ViewMeta {
        id: Uuid::parse_str(&id).map_err(|_| rusqlite::Error::InvalidQuery)?,
        table_id: Uuid::parse_str(&table_id).map_err(|_| rusqlite::Error::InvalidQuery)?,
        name: r.get(2)?,
        // Configs written by older builds may not parse; degrade to defaults
        // rather than failing the whole view list.
        config: serde_json::from_str(&raw_config).unwrap_or_default(),
    })
}

pub(crate) fn load_columns(conn: &Connection, table_id: Uuid) -> Result<Vec<Column>> {
    let mut stmt = conn.prepare(
        "SELECT id, table_id, name, kind, position FROM columns WHERE table_id = ?1 ORDER BY position",
    )?;
    let rows = stmt.query_map(params![table_id.to_string()], |r| {
        let id: String = r.get(0)?;
        let table_id: String = r.get(1)?;
        let kind: String = r.get(3)?;
        Ok(Column {
            id: Uuid::parse_str(&id).map_err(|_| rusqlite::Error::InvalidQuery)?,
            table_id: Uuid::parse_str(&table_id).map_err(|_| rusqlite::Error::InvalidQuery)?,
            name: r.get(2)?,
            kind: ColumnKind::parse_lossy(&kind),
            position: r.get(4)?,
        })
    })?;

    let mut columns = Vec::new();
    for column in rows {
        columns.push(column?);
    }
    Ok(columns)
}

/// Next free row position within a table. Positions are monotonic per table;
/// bulk inserts claim a whole range up front so ordering stays deterministic
/// across batches.
pub(crate) fn next_row_position(conn: &Connection, table_id: Uuid) -> Result<i64> {
    let position: i64 = conn.query_row(
        "SELECT COALESCE(MAX(position) + 1, 0) FROM rows WHERE table_id = ?1",
        params![table_id.to_string()],
        |r| r.get(0),
    )?;
    Ok(position)
}
