use crate::view::ViewMeta;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Table metadata. The column set is fetched separately.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableMeta {
    pub id: Uuid,
    pub name: String,
}

/// A table together with its saved views.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableWithViews {
    pub table: TableMeta,
    pub views: Vec<ViewMeta>,
}
