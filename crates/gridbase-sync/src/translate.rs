use gridbase_model::{Column, FilterOp, FilterRule, SortDirection, SortRule};
use uuid::Uuid;

/// Raw per-column filter state as produced by the UI layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UiColumnFilter {
    /// Column identifier (already matching storage column ids).
    pub column_id: String,
    pub operator: String,
    pub value: Option<String>,
}

/// Raw per-column sort state as produced by the UI layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UiColumnSort {
    pub column_id: String,
    pub descending: bool,
}

/// Translate UI filter state into normalized filter rules.
///
/// Entries naming unknown columns or unknown operators are dropped silently.
/// Numeric operators keep their raw value: non-parseable values are the
/// store's concern, where they lower to a never-matching predicate instead
/// of an error.
pub fn translate_filters(ui: &[UiColumnFilter], columns: &[Column]) -> Vec<FilterRule> {
    ui.iter()
        .filter_map(|filter| {
            let column_id = Uuid::parse_str(&filter.column_id).ok()?;
            columns.iter().find(|c| c.id == column_id)?;
            let op = FilterOp::parse(&filter.operator)?;
            let value = if op.needs_value() {
                filter.value.clone()
            } else {
                None
            };
            Some(FilterRule {
                column_id,
                op,
                value,
            })
        })
        .collect()
}

/// Translate UI sort state into normalized sort rules, unknown columns
/// dropped. The query engine only honors the first rule; the rest ride
/// along for view persistence.
pub fn translate_sorting(ui: &[UiColumnSort], columns: &[Column]) -> Vec<SortRule> {
    ui.iter()
        .filter_map(|sort| {
            let column_id = Uuid::parse_str(&sort.column_id).ok()?;
            columns.iter().find(|c| c.id == column_id)?;
            Some(SortRule {
                column_id,
                direction: if sort.descending {
                    SortDirection::Desc
                } else {
                    SortDirection::Asc
                },
            })
        })
        .collect()
}
