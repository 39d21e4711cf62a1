use crate::domain::StagingError;

/// A cell is text or blank. Blank is `None`.
pub type Cell = Option<String>;

/// One record of a [`Table`]. `ordinal` is the 1-based position the row had
/// in the ingested file and is what the audit log is keyed on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    pub ordinal: usize,
    pub cells: Vec<Cell>,
}

impl Row {
    pub fn new(ordinal: usize, cells: Vec<Cell>) -> Self {
        Self { ordinal, cells }
    }

    /// Number of cells that are not blank.
    pub fn populated(&self) -> usize {
        self.cells
            .iter()
            .filter(|c| c.as_deref().is_some_and(|s| !s.trim().is_empty()))
            .count()
    }
}

/// Ordered column names plus fixed-shape rows, all text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Row>,
}

impl Table {
    /// Builds a table, padding or truncating each row to the column count.
    pub fn new(columns: Vec<String>, rows: Vec<Row>) -> Self {
        let width = columns.len();
        let rows = rows
            .into_iter()
            .map(|mut r| {
                r.cells.resize(width, None);
                r
            })
            .collect();
        Self { columns, rows }
    }

    /// Convenience constructor numbering rows 1..=n. Empty strings become blanks.
    pub fn from_records<S: AsRef<str>>(columns: &[S], records: &[Vec<&str>]) -> Self {
        let rows = records
            .iter()
            .enumerate()
            .map(|(idx, rec)| {
                let cells = rec
                    .iter()
                    .map(|s| if s.is_empty() { None } else { Some(s.to_string()) })
                    .collect();
                Row::new(idx + 1, cells)
            })
            .collect();
        Table::new(
            columns.iter().map(|c| c.as_ref().to_string()).collect(),
            rows,
        )
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn nrows(&self) -> usize {
        self.rows.len()
    }

    pub fn ncolumns(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of `name` in the column list.
    pub fn column_index(&self, name: &str) -> Result<usize, StagingError> {
        self.columns
            .iter()
            .position(|c| c == name)
            .ok_or_else(|| StagingError::UnknownColumn(name.to_string()))
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }

    /// All cells of one column, in row order.
    pub fn column(&self, name: &str) -> Result<impl Iterator<Item = &Cell>, StagingError> {
        let idx = self.column_index(name)?;
        Ok(self.rows.iter().map(move |r| &r.cells[idx]))
    }

    pub fn cell(&self, row: usize, column: usize) -> Option<&str> {
        self.rows
            .get(row)
            .and_then(|r| r.cells.get(column))
            .and_then(|c| c.as_deref())
    }

    /// Cell values only, without ordinals. Two tables with equal values hold
    /// the same data even if their rows came from different files.
    pub fn values(&self) -> Vec<Vec<Cell>> {
        self.rows.iter().map(|r| r.cells.clone()).collect()
    }

    pub fn ordinals(&self) -> Vec<usize> {
        self.rows.iter().map(|r| r.ordinal).collect()
    }

    /// Copy of the table keeping only rows for which `keep` holds.
    pub fn retain_rows<F>(&self, mut keep: F) -> Table
    where
        F: FnMut(&Row) -> bool,
    {
        Table {
            columns: self.columns.clone(),
            rows: self.rows.iter().filter(|r| keep(r)).cloned().collect(),
        }
    }

    // -------------------- Edit layer ---------------------- //

    /// Overwrite one cell. A trimmed-empty value is stored as blank.
    pub fn set_cell(
        &mut self,
        row: usize,
        column: &str,
        value: impl Into<String>,
    ) -> Result<(), StagingError> {
        let cidx = self.column_index(column)?;
        let value: String = value.into();
        let r = self
            .rows
            .get_mut(row)
            .ok_or(StagingError::RowOutOfRange(row))?;
        r.cells[cidx] = if value.trim().is_empty() { None } else { Some(value) };
        Ok(())
    }

    /// Append an all-blank row and return its index.
    pub fn push_blank_row(&mut self) -> usize {
        let ordinal = self.rows.iter().map(|r| r.ordinal).max().unwrap_or(0) + 1;
        self.rows.push(Row::new(ordinal, vec![None; self.columns.len()]));
        self.rows.len() - 1
    }

    pub fn remove_row(&mut self, row: usize) -> Result<Row, StagingError> {
        if row >= self.rows.len() {
            return Err(StagingError::RowOutOfRange(row));
        }
        Ok(self.rows.remove(row))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roster() -> Table {
        Table::from_records(
            &["ID", "Name", "Dept"],
            &[vec!["001", "Alice", "IT"], vec!["002", "Bob", ""]],
        )
    }

    #[test]
    fn rows_are_padded_to_column_count() {
        let t = Table::new(
            vec!["a".into(), "b".into(), "c".into()],
            vec![Row::new(1, vec![Some("x".into())])],
        );
        assert_eq!(t.rows()[0].cells, vec![Some("x".into()), None, None]);
    }

    #[test]
    fn column_lookup_fails_on_unknown_name() {
        let t = roster();
        assert_eq!(t.column_index("Name").unwrap(), 1);
        assert!(matches!(
            t.column_index("Salary"),
            Err(StagingError::UnknownColumn(name)) if name == "Salary"
        ));
    }

    #[test]
    fn populated_counts_non_blank_cells() {
        let t = roster();
        assert_eq!(t.rows()[0].populated(), 3);
        assert_eq!(t.rows()[1].populated(), 2);
        assert_eq!(Row::new(1, vec![Some("  ".into()), None]).populated(), 0);
    }

    #[test]
    fn set_cell_stores_blank_for_empty_input() {
        let mut t = roster();
        t.set_cell(0, "Dept", "Sales").unwrap();
        t.set_cell(1, "Name", "   ").unwrap();
        assert_eq!(t.cell(0, 2), Some("Sales"));
        assert_eq!(t.cell(1, 1), None);
        assert!(matches!(
            t.set_cell(5, "Dept", "x"),
            Err(StagingError::RowOutOfRange(5))
        ));
    }

    #[test]
    fn pushed_rows_get_a_fresh_ordinal() {
        let mut t = roster();
        let idx = t.push_blank_row();
        assert_eq!(idx, 2);
        assert_eq!(t.rows()[2].ordinal, 3);
        assert_eq!(t.rows()[2].cells, vec![None, None, None]);
    }

    #[test]
    fn remove_row_returns_the_row() {
        let mut t = roster();
        let removed = t.remove_row(0).unwrap();
        assert_eq!(removed.ordinal, 1);
        assert_eq!(t.nrows(), 1);
        assert!(t.remove_row(1).is_err());
    }
}
