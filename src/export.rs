use std::collections::HashSet;
use std::fs;
use std::path::Path;

use polars::prelude::*;
use tracing::info;

use crate::domain::StagingError;
use crate::table::Table;

/// Serialize `table` as UTF-8 CSV: header row, comma separated, blanks as
/// empty fields, no index column.
pub fn to_csv_bytes(table: &Table) -> Result<Vec<u8>, StagingError> {
    let mut df = to_frame(table)?;
    let mut buf: Vec<u8> = Vec::new();
    CsvWriter::new(&mut buf)
        .include_header(true)
        .with_separator(b',')
        .finish(&mut df)?;
    Ok(buf)
}

pub fn write_path(table: &Table, path: &Path) -> Result<(), StagingError> {
    let bytes = to_csv_bytes(table)?;
    fs::write(path, bytes)?;
    info!("Wrote {} rows to {}", table.nrows(), path.display());
    Ok(())
}

fn to_frame(table: &Table) -> Result<DataFrame, StagingError> {
    // Collecting series into a frame panics on repeated names
    let mut seen = HashSet::with_capacity(table.ncolumns());
    if let Some(dup) = table.columns().iter().find(|c| !seen.insert(c.as_str())) {
        return Err(StagingError::DuplicateColumn(dup.clone()));
    }

    Ok(table
        .columns()
        .iter()
        .enumerate()
        .map(|(cidx, name)| {
            let values: Vec<Option<String>> =
                table.rows().iter().map(|r| r.cells[cidx].clone()).collect();
            Series::new(name.as_str().into(), values)
        })
        .collect())
}

/// Quote a value for a single CSV line (clipboard row copies).
pub fn quote_field(value: &str) -> String {
    let needs_escaping = value.contains('"');
    let needs_wrapping =
        needs_escaping || value.chars().any(|c| matches!(c, ',' | '\n' | '\r'));
    let mut out = value.to_string();

    if needs_escaping {
        out = out.replace('"', "\"\"");
    }
    if needs_wrapping {
        out = format!("\"{out}\"");
    }
    out
}

/// One table row as a CSV line, without a trailing newline.
pub fn row_to_line(table: &Table, row: usize) -> Option<String> {
    table.rows().get(row).map(|r| {
        r.cells
            .iter()
            .map(|c| quote_field(c.as_deref().unwrap_or("")))
            .collect::<Vec<String>>()
            .join(",")
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest;

    #[test]
    fn exports_header_and_text_values() {
        let t = Table::from_records(
            &["ID", "Name", "Dept"],
            &[vec!["001", "Alice", "IT"], vec!["002", "Bob", ""]],
        );
        let text = String::from_utf8(to_csv_bytes(&t).unwrap()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines, vec!["ID,Name,Dept", "001,Alice,IT", "002,Bob,"]);
    }

    #[test]
    fn reingest_gives_same_values() {
        let t = Table::from_records(
            &["ID", "Note"],
            &[vec!["007", "says \"hi\", twice"], vec!["010", ""]],
        );
        let back = ingest::read_bytes(&to_csv_bytes(&t).unwrap()).unwrap();
        assert_eq!(back.columns(), t.columns());
        assert_eq!(back.values(), t.values());
    }

    #[test]
    fn write_path_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        let t = Table::from_records(&["a", "b"], &[vec!["1", "2"]]);
        write_path(&t, &path).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap().lines().count(), 2);
    }

    #[test]
    fn repeated_column_names_are_an_error() {
        let t = Table::from_records(&["a", "a"], &[vec!["1", "2"]]);
        assert!(matches!(
            to_csv_bytes(&t).unwrap_err(),
            StagingError::DuplicateColumn(name) if name == "a"
        ));
    }

    #[test]
    fn row_lines_are_quoted() {
        let t = Table::from_records(&["a", "b", "c"], &[vec!["Doe, Jane", "x\"y", ""]]);
        assert_eq!(
            row_to_line(&t, 0).unwrap(),
            "\"Doe, Jane\",\"x\"\"y\","
        );
        assert_eq!(row_to_line(&t, 1), None);
    }
}
