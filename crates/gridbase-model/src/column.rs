use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Declared type of a column, driving sort and filter semantics.
///
/// Persisted as the strings `"string"` / `"number"`. Unknown stored kinds
/// degrade to [`ColumnKind::Text`] so older databases keep loading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColumnKind {
    #[serde(rename = "string")]
    Text,
    #[serde(rename = "number")]
    Number,
}

impl ColumnKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnKind::Text => "string",
            ColumnKind::Number => "number",
        }
    }

    /// Parse a stored kind string, degrading unknown kinds to text.
    pub fn parse_lossy(s: &str) -> Self {
        match s {
            "number" => ColumnKind::Number,
            _ => ColumnKind::Text,
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, ColumnKind::Number)
    }
}

impl Default for ColumnKind {
    fn default() -> Self {
        ColumnKind::Text
    }
}

impl fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A column of a table, with a stable display position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub id: Uuid,
    pub table_id: Uuid,
    pub name: String,
    pub kind: ColumnKind,
    pub position: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_lossy_degrades_unknown_kinds_to_text() {
        assert_eq!(ColumnKind::parse_lossy("number"), ColumnKind::Number);
        assert_eq!(ColumnKind::parse_lossy("string"), ColumnKind::Text);
        assert_eq!(ColumnKind::parse_lossy("attachment"), ColumnKind::Text);
        assert_eq!(ColumnKind::parse_lossy(""), ColumnKind::Text);
    }
}
