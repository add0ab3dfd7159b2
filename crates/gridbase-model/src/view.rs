use crate::query::{FilterRule, SortRule};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A saved grid configuration: sort rules, filter rules, hidden columns.
///
/// All fields default to empty so configs persisted by older builds (or a
/// bare `{}`) deserialize cleanly.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewConfig {
    #[serde(default)]
    pub sorting: Vec<SortRule>,
    #[serde(default)]
    pub filters: Vec<FilterRule>,
    #[serde(default)]
    pub hidden_columns: Vec<Uuid>,
}

/// A named view of a table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewMeta {
    pub id: Uuid,
    pub table_id: Uuid,
    pub name: String,
    pub config: ViewConfig,
}
