use crate::column::ColumnKind;
use thiserror::Error;

pub const MAX_NAME_LEN: usize = 255;

/// Errors from display-name validation (tables, columns, views).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NameError {
    #[error("name cannot be empty")]
    Empty,
    #[error("name exceeds the 255 character limit")]
    TooLong,
}

/// Validate a table/column/view display name, returning the trimmed form.
pub fn validate_name(name: &str) -> Result<&str, NameError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(NameError::Empty);
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(NameError::TooLong);
    }
    Ok(name)
}

/// Errors from pre-dispatch cell input validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("value {value:?} is not numeric")]
    NotNumeric { value: String },
}

/// Validate user input for a cell before it is dispatched to the store.
///
/// Numeric columns only accept numeric text. Empty or absent input always
/// passes (it clears the cell). Rejected edits revert in place and never
/// reach the store.
pub fn validate_cell_input(kind: ColumnKind, value: Option<&str>) -> Result<(), InputError> {
    let Some(value) = value else { return Ok(()) };
    if value.trim().is_empty() {
        return Ok(());
    }
    if kind.is_numeric() && value.trim().parse::<f64>().is_err() {
        return Err(InputError::NotNumeric {
            value: value.to_string(),
        });
    }
    Ok(())
}
