use gridbase_model::{FilterOp, FilterRule};
use rusqlite::types::Value as SqlValue;

/// Structured predicate over a single column's cell value.
///
/// Filter operators are lowered to this tagged descriptor instead of
/// concatenated SQL fragments, so operator semantics stay centrally
/// testable and parameters are always bound, never interpolated.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// Case-insensitive exact match.
    TextEquals(String),
    /// Case-insensitive substring match.
    TextContains(String),
    /// Non-null value that does not contain the substring.
    TextNotContains(String),
    GreaterThan(f64),
    LessThan(f64),
    IsNull,
    IsNotNull,
    /// Matches no rows. Produced for numeric operators whose comparison
    /// value is not parseable: the query must return nothing, not error.
    Never,
}

impl Predicate {
    /// Lower a filter rule to its predicate.
    pub fn from_rule(rule: &FilterRule) -> Self {
        let value = rule.value.as_deref().unwrap_or("");
        match rule.op {
            FilterOp::Equals => Predicate::TextEquals(value.to_string()),
            FilterOp::Contains => Predicate::TextContains(value.to_string()),
            FilterOp::NotContains => Predicate::TextNotContains(value.to_string()),
            FilterOp::GreaterThan => match value.trim().parse::<f64>() {
                Ok(n) => Predicate::GreaterThan(n),
                Err(_) => Predicate::Never,
            },
            FilterOp::LessThan => match value.trim().parse::<f64>() {
                Ok(n) => Predicate::LessThan(n),
                Err(_) => Predicate::Never,
            },
            FilterOp::IsEmpty => Predicate::IsNull,
            FilterOp::IsNotEmpty => Predicate::IsNotNull,
        }
    }

    /// Append the SQL condition over `cells.value` to `sql`, pushing bound
    /// parameters onto `params` in placeholder order.
    ///
    /// Numeric comparisons go through the `parse_real` SQL function the store
    /// registers at connection open: unlike SQLite's `CAST`, it yields NULL
    /// for non-numeric text, so such cells never satisfy a numeric operator.
    pub(crate) fn push_sql(&self, sql: &mut String, params: &mut Vec<SqlValue>) {
        match self {
            Predicate::TextEquals(v) => {
                sql.push_str("LOWER(cells.value) = LOWER(?)");
                params.push(SqlValue::from(v.clone()));
            }
            Predicate::TextContains(v) => {
                sql.push_str("instr(LOWER(cells.value), LOWER(?)) > 0");
                params.push(SqlValue::from(v.clone()));
            }
            Predicate::TextNotContains(v) => {
                sql.push_str("cells.value IS NOT NULL AND instr(LOWER(cells.value), LOWER(?)) = 0");
                params.push(SqlValue::from(v.clone()));
            }
            Predicate::GreaterThan(n) => {
                sql.push_str("parse_real(cells.value) > ?");
                params.push(SqlValue::from(*n));
            }
            Predicate::LessThan(n) => {
                sql.push_str("parse_real(cells.value) < ?");
                params.push(SqlValue::from(*n));
            }
            Predicate::IsNull => sql.push_str("cells.value IS NULL"),
            Predicate::IsNotNull => sql.push_str("cells.value IS NOT NULL"),
            Predicate::Never => sql.push_str("0"),
        }
    }
}
