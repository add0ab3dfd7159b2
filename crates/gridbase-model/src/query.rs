use crate::row::RowData;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Sort direction for a single rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

/// One sort rule. Only the first rule of a request is honored by the query
/// engine (single-column sort); additional rules are accepted but ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SortRule {
    pub column_id: Uuid,
    pub direction: SortDirection,
}

/// Filter operator over a column's cell value.
///
/// A tagged enum rather than raw operator strings: the store lowers these to
/// structured predicates, which keeps operator semantics centrally testable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FilterOp {
    Equals,
    Contains,
    NotContains,
    GreaterThan,
    LessThan,
    IsEmpty,
    IsNotEmpty,
}

impl FilterOp {
    /// Whether the operator compares against a user-supplied value.
    pub fn needs_value(&self) -> bool {
        !matches!(self, FilterOp::IsEmpty | FilterOp::IsNotEmpty)
    }

    /// Whether the operator compares numerically (values are cast to real).
    pub fn is_numeric(&self) -> bool {
        matches!(self, FilterOp::GreaterThan | FilterOp::LessThan)
    }

    /// Parse the UI-level operator string. Unknown operators yield `None`.
    pub fn parse(s: &str) -> Option<Self> {
        Some(match s {
            "equals" => FilterOp::Equals,
            "contains" => FilterOp::Contains,
            "notContains" => FilterOp::NotContains,
            "greaterThan" => FilterOp::GreaterThan,
            "lessThan" => FilterOp::LessThan,
            "isEmpty" => FilterOp::IsEmpty,
            "isNotEmpty" => FilterOp::IsNotEmpty,
            _ => return None,
        })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FilterOp::Equals => "equals",
            FilterOp::Contains => "contains",
            FilterOp::NotContains => "notContains",
            FilterOp::GreaterThan => "greaterThan",
            FilterOp::LessThan => "lessThan",
            FilterOp::IsEmpty => "isEmpty",
            FilterOp::IsNotEmpty => "isNotEmpty",
        }
    }
}

/// One filter rule. Rules on a request are implicitly AND-combined: a row
/// qualifies only if it satisfies every rule.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FilterRule {
    pub column_id: Uuid,
    pub op: FilterOp,
    /// Comparison value; `None` for operators that don't take one.
    pub value: Option<String>,
}

/// Search annotation returned alongside a page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum SearchMatch {
    /// A column whose name matched the search term.
    #[serde(rename_all = "camelCase")]
    Column { column_id: Uuid },
    /// A cell whose value matched, addressed by composite cell id.
    ///
    /// `row_index` is the index of the row within the *returned page*, not a
    /// global row index; callers mapping matches onto a virtualized list must
    /// offset by the page start themselves.
    #[serde(rename_all = "camelCase")]
    Cell { cell_id: String, row_index: usize },
}

/// A paginated row query, keyed by everything that affects the result set.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PageRequest {
    pub table_id: Uuid,
    pub limit: u64,
    /// Offset cursor (previous offset + limit); `None` means the first page.
    pub cursor: Option<u64>,
    pub filters: Vec<FilterRule>,
    pub sorting: Vec<SortRule>,
    /// Global search term, independent of filters.
    pub search: Option<String>,
}

/// One page of rows plus match annotations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowPage {
    pub items: Vec<RowData>,
    pub search_matches: Vec<SearchMatch>,
    /// Present only on the first page of a filtered query. Callers must fall
    /// back to the unfiltered row count when absent.
    pub total_filtered_count: Option<u64>,
    /// Offset of the next page; absent on the terminal page.
    pub next_cursor: Option<u64>,
}
