use std::collections::HashSet;
use std::fmt;

use tracing::trace;

use crate::domain::StagingError;
use crate::table::Table;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum FilterSelection {
    #[default]
    NoFilter,
    Column { column: String, value: String },
}

impl FilterSelection {
    pub fn new(column: impl Into<String>, value: impl Into<String>) -> Self {
        FilterSelection::Column {
            column: column.into(),
            value: value.into(),
        }
    }

    pub fn column(&self) -> Option<&str> {
        match self {
            FilterSelection::NoFilter => None,
            FilterSelection::Column { column, .. } => Some(column),
        }
    }
}

impl fmt::Display for FilterSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterSelection::NoFilter => write!(f, "no filter"),
            FilterSelection::Column { column, value } => write!(f, "{column} = \"{value}\""),
        }
    }
}

/// Distinct values of `column` in first-seen order. Blank cells are skipped,
/// they can never equal a selected value.
pub fn distinct_values(table: &Table, column: &str) -> Result<Vec<String>, StagingError> {
    let mut seen = HashSet::new();
    let values = table
        .column(column)?
        .filter_map(|c| c.as_deref())
        .filter(|v| seen.insert(*v))
        .map(str::to_string)
        .collect();
    Ok(values)
}

/// Rows whose `column` cell equals the selected value exactly, in table order.
/// [`FilterSelection::NoFilter`] returns the table unchanged.
pub fn apply(table: &Table, selection: &FilterSelection) -> Result<Table, StagingError> {
    match selection {
        FilterSelection::NoFilter => Ok(table.clone()),
        FilterSelection::Column { column, value } => {
            let cidx = table.column_index(column)?;
            let filtered =
                table.retain_rows(|r| r.cells[cidx].as_deref() == Some(value.as_str()));
            trace!(
                "Filter {} matched {} of {} rows",
                selection,
                filtered.nrows(),
                table.nrows()
            );
            Ok(filtered)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn staff() -> Table {
        Table::from_records(
            &["ID", "Name", "Dept"],
            &[
                vec!["001", "Alice", "IT"],
                vec!["002", "Bob", "Sales"],
                vec!["003", "Carol", "IT"],
                vec!["004", "Dan", ""],
                vec!["005", "Eve", "it"],
            ],
        )
    }

    #[test]
    fn no_filter_returns_everything() {
        let t = staff();
        assert_eq!(apply(&t, &FilterSelection::NoFilter).unwrap(), t);
    }

    #[test]
    fn filter_is_exact_and_order_stable() {
        let t = staff();
        let out = apply(&t, &FilterSelection::new("Dept", "IT")).unwrap();
        assert_eq!(out.ordinals(), vec![1, 3]);
        assert_eq!(out.columns(), t.columns());
    }

    #[test]
    fn filter_is_whitespace_sensitive() {
        let t = staff();
        let out = apply(&t, &FilterSelection::new("Dept", "IT ")).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn unknown_column_is_an_error() {
        let t = staff();
        let err = apply(&t, &FilterSelection::new("Salary", "1")).unwrap_err();
        assert!(matches!(err, StagingError::UnknownColumn(name) if name == "Salary"));
    }

    #[test]
    fn distinct_values_in_first_seen_order() {
        let t = staff();
        assert_eq!(
            distinct_values(&t, "Dept").unwrap(),
            vec!["IT".to_string(), "Sales".to_string(), "it".to_string()]
        );
        assert!(distinct_values(&t, "Nope").is_err());
    }
}
