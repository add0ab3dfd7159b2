use crate::fake;
use crate::store::{next_row_position, Result, Store, StoreError};
use gridbase_model::Column;
use rusqlite::params_from_iter;
use rusqlite::types::Value as SqlValue;
use std::collections::HashMap;
use tracing::{debug, warn};
use uuid::Uuid;

/// Hard cap on a single bulk insert request.
pub const MAX_BULK_ROWS: u64 = 100_000;
/// Rows per batch; each batch commits in its own transaction.
pub const ROW_BATCH_SIZE: u64 = 9_500;
/// Cell rows buffered before a flush inside a batch transaction.
pub const CELL_FLUSH_SIZE: usize = 12_500;

// SQLite's default host-parameter limit is 32766; at 4 parameters per cell
// row a single multi-row INSERT must stay under ~8191 rows.
const MAX_CELL_ROWS_PER_STMT: usize = 8_000;

/// Outcome of a bulk insert.
///
/// Partial failure is reported here rather than as an `Err`: batches
/// committed before the failing one stay committed, so callers can show a
/// partial-success message instead of treating it as total failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkInsertReport {
    /// Rows from fully committed batches.
    pub inserted: u64,
    pub requested: u64,
    pub failed: bool,
    pub error: Option<String>,
}

impl Store {
    /// Insert `count` rows of synthesized data in batches of
    /// [`ROW_BATCH_SIZE`], each in its own transaction.
    ///
    /// A batch failure stops the loop: earlier batches stay committed, later
    /// ones never start, and the report carries the error. Row positions for
    /// the whole operation are claimed up front from the per-table counter,
    /// so ordering stays monotonic across batches.
    pub fn add_bulk_rows(&self, table_id: Uuid, count: u64) -> Result<BulkInsertReport> {
        if count > MAX_BULK_ROWS {
            return Err(StoreError::BulkCountExceeded {
                requested: count,
                max: MAX_BULK_ROWS,
            });
        }
        self.get_table(table_id)?;
        let columns = self.get_columns(table_id)?;

        let base_position = {
            let conn = self.conn.lock().expect("store mutex poisoned");
            next_row_position(&conn, table_id)?
        };

        debug!(
            table = %table_id,
            count,
            columns = columns.len(),
            base_position,
            "starting bulk row insert"
        );

        let report = run_batches(count, ROW_BATCH_SIZE, |batch_index, batch_size| {
            let offset = i64::try_from(batch_index * ROW_BATCH_SIZE).unwrap_or(i64::MAX);
            self.insert_batch(table_id, &columns, base_position + offset, batch_size)
        });

        debug!(
            table = %table_id,
            inserted = report.inserted,
            requested = report.requested,
            failed = report.failed,
            "bulk row insert finished"
        );
        Ok(report)
    }

    /// One batch: rows first (to fix their ids and positions), then cells in
    /// flush chunks, all inside a single transaction. Tables with no columns
    /// get bare rows.
    fn insert_batch(
        &self,
        table_id: Uuid,
        columns: &[Column],
        base_position: i64,
        batch_size: u64,
    ) -> Result<()> {
        let mut rng = rand::thread_rng();
        let batch_len = usize::try_from(batch_size).unwrap_or(usize::MAX);

        let mut conn = self.conn.lock().expect("store mutex poisoned");
        let tx = conn.transaction()?;

        let mut row_ids = Vec::with_capacity(batch_len);
        {
            let mut stmt =
                tx.prepare("INSERT INTO rows (id, table_id, position) VALUES (?1, ?2, ?3)")?;
            for i in 0..batch_size {
                let id = Uuid::new_v4();
                let position = base_position + i64::try_from(i).unwrap_or(i64::MAX);
                stmt.execute(rusqlite::params![
                    id.to_string(),
                    table_id.to_string(),
                    position
                ])?;
                row_ids.push(id);
            }
        }

        let values_by_column: HashMap<Uuid, Vec<String>> = columns
            .iter()
            .map(|column| (column.id, fake::column_values(column, batch_len, &mut rng)))
            .collect();

        let mut buffer: Vec<(Uuid, Uuid, String)> = Vec::with_capacity(CELL_FLUSH_SIZE.min(4096));
        for (row_index, row_id) in row_ids.iter().enumerate() {
            for column in columns {
                let value = values_by_column[&column.id][row_index].clone();
                buffer.push((*row_id, column.id, value));
                if buffer.len() >= CELL_FLUSH_SIZE {
                    flush_cells(&tx, &buffer)?;
                    buffer.clear();
                }
            }
        }
        if !buffer.is_empty() {
            flush_cells(&tx, &buffer)?;
        }

        tx.commit()?;
        Ok(())
    }
}

fn flush_cells(tx: &rusqlite::Transaction<'_>, cells: &[(Uuid, Uuid, String)]) -> Result<()> {
    for chunk in cells.chunks(MAX_CELL_ROWS_PER_STMT) {
        let values_sql = vec!["(?, ?, ?, ?)"; chunk.len()].join(", ");
        let sql = format!("INSERT INTO cells (id, row_id, column_id, value) VALUES {values_sql}");

        let mut sql_params: Vec<SqlValue> = Vec::with_capacity(chunk.len() * 4);
        for (row_id, column_id, value) in chunk {
            sql_params.push(SqlValue::from(Uuid::new_v4().to_string()));
            sql_params.push(SqlValue::from(row_id.to_string()));
            sql_params.push(SqlValue::from(column_id.to_string()));
            sql_params.push(SqlValue::from(value.clone()));
        }
        tx.execute(&sql, params_from_iter(sql_params.iter()))?;
    }
    Ok(())
}

/// Drive `requested` rows through fixed-size batches, stopping at the first
/// failure. Committed batches stay committed; the failing batch's error is
/// carried in the report.
fn run_batches(
    requested: u64,
    batch_size: u64,
    mut insert: impl FnMut(u64, u64) -> Result<()>,
) -> BulkInsertReport {
    let mut inserted = 0u64;
    let mut remaining = requested;
    let mut batch_index = 0u64;
    let mut error = None;

    while remaining > 0 {
        let size = remaining.min(batch_size);
        match insert(batch_index, size) {
            Ok(()) => inserted += size,
            Err(err) => {
                warn!(
                    batch = batch_index,
                    %err,
                    "bulk insert batch failed; aborting remaining batches"
                );
                error = Some(err.to_string());
                break;
            }
        }
        remaining -= size;
        batch_index += 1;
    }

    BulkInsertReport {
        inserted,
        requested,
        failed: error.is_some(),
        error,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batches_split_with_a_short_tail() {
        let mut sizes = Vec::new();
        let report = run_batches(20_000, 9_500, |_, size| {
            sizes.push(size);
            Ok(())
        });
        assert_eq!(sizes, vec![9_500, 9_500, 1_000]);
        assert_eq!(report.inserted, 20_000);
        assert!(!report.failed);
        assert_eq!(report.error, None);
    }

    #[test]
    fn failure_stops_later_batches_and_keeps_earlier_ones() {
        let mut attempted = Vec::new();
        let report = run_batches(20_000, 9_500, |batch_index, size| {
            attempted.push(batch_index);
            if batch_index == 1 {
                return Err(StoreError::RowCreationFailed);
            }
            let _ = size;
            Ok(())
        });
        assert_eq!(attempted, vec![0, 1]);
        assert_eq!(report.inserted, 9_500);
        assert_eq!(report.requested, 20_000);
        assert!(report.failed);
        assert!(report.error.is_some());
    }

    #[test]
    fn zero_rows_is_a_clean_no_op() {
        let report = run_batches(0, 9_500, |_, _| panic!("no batches expected"));
        assert_eq!(report.inserted, 0);
        assert!(!report.failed);
    }
}
