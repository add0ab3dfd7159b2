use rusqlite::Connection;

pub(crate) fn init(conn: &Connection) -> rusqlite::Result<()> {
    // Ensure foreign keys are enforced (disabled by default in SQLite).
    conn.pragma_update(None, "foreign_keys", "ON")?;

    conn.execute_batch(
        r#"
        -- Core tables
        CREATE TABLE IF NOT EXISTS tables (
          id TEXT PRIMARY KEY,
          name TEXT NOT NULL,
          created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
        );

        CREATE TABLE IF NOT EXISTS columns (
          id TEXT PRIMARY KEY,
          table_id TEXT NOT NULL REFERENCES tables(id),
          name TEXT NOT NULL,
          kind TEXT NOT NULL DEFAULT 'string',  -- 'string', 'number'
          position INTEGER NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_columns_table ON columns(table_id, position);

        CREATE TABLE IF NOT EXISTS rows (
          id TEXT PRIMARY KEY,
          table_id TEXT NOT NULL REFERENCES tables(id),
          position INTEGER NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_rows_table_position ON rows(table_id, position);

        CREATE TABLE IF NOT EXISTS cells (
          id TEXT PRIMARY KEY,
          row_id TEXT NOT NULL REFERENCES rows(id),
          column_id TEXT NOT NULL REFERENCES columns(id),
          value TEXT,
          UNIQUE (row_id, column_id)
        );

        CREATE INDEX IF NOT EXISTS idx_cells_row ON cells(row_id);
        CREATE INDEX IF NOT EXISTS idx_cells_column_value ON cells(column_id, value);

        CREATE TABLE IF NOT EXISTS views (
          id TEXT PRIMARY KEY,
          table_id TEXT NOT NULL REFERENCES tables(id),
          name TEXT NOT NULL,
          config JSON NOT NULL DEFAULT '{}'
        );

        CREATE INDEX IF NOT EXISTS idx_views_table ON views(table_id);
        "#,
    )?;

    // Best-effort migrations for databases that predate newer columns. SQLite
    // only supports ADD COLUMN migrations, so we opportunistically add missing
    // columns when opening an existing database.
    ensure_column_kind(conn)?;

    Ok(())
}

fn ensure_column_kind(conn: &Connection) -> rusqlite::Result<()> {
    let mut stmt = conn.prepare("PRAGMA table_info(columns)")?;
    let rows = stmt.query_map([], |row| row.get::<_, String>(1))?;
    let mut existing = std::collections::HashSet::new();
    for name in rows {
        existing.insert(name?);
    }

    if !existing.contains("kind") {
        conn.execute(
            "ALTER TABLE columns ADD COLUMN kind TEXT NOT NULL DEFAULT 'string'",
            [],
        )?;
    }

    Ok(())
}
