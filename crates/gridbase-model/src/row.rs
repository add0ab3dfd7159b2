use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single cell of a row. At most one cell exists per (row, column).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellData {
    pub id: Uuid,
    pub column_id: Uuid,
    /// Nullable text payload; numeric columns store numeric text.
    pub value: Option<String>,
}

/// A row with its denormalized cells, as returned by the query service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowData {
    pub id: Uuid,
    pub table_id: Uuid,
    /// Stable insertion-order key. The query service always appends
    /// `position ASC` as the final tie-break, so page boundaries stay
    /// deterministic across requests even without an explicit sort.
    pub position: i64,
    pub cells: Vec<CellData>,
}

impl RowData {
    pub fn cell(&self, column_id: Uuid) -> Option<&CellData> {
        self.cells.iter().find(|c| c.column_id == column_id)
    }

    pub fn cell_mut(&mut self, column_id: Uuid) -> Option<&mut CellData> {
        self.cells.iter_mut().find(|c| c.column_id == column_id)
    }
}

/// Composite id `"{row_id}_{column_id}"` used to address a cell in search
/// matches and at the UI boundary.
pub fn cell_ref(row_id: Uuid, column_id: Uuid) -> String {
    format!("{row_id}_{column_id}")
}
