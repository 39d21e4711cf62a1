//! The cleaning pass applied once to every freshly ingested table.
//!
//! Steps run in a fixed order, each on the output of the previous one:
//!
//! 1. blank normalization: trimmed-empty cells become blank
//! 2. ghost-row removal: rows with fewer than [`MIN_POPULATED_CELLS`] populated cells go
//! 3. cell trimming
//! 4. header trimming (a collision is [`StagingError::DuplicateColumn`])
//! 5. duplicate-row removal, lowest ordinal wins
//!
//! Every raw row that does not survive ends up in the [`AuditLog`] with its
//! original, uncleaned values.

use std::collections::{HashMap, HashSet};
use std::fmt;

use rayon::prelude::*;
use tracing::{debug, info, trace};

use crate::domain::StagingError;
use crate::table::{Cell, Row, Table};

/// Rows with fewer populated cells than this are ghost rows.
pub const MIN_POPULATED_CELLS: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemovalReason {
    GhostRow,
    DuplicateRow,
}

impl fmt::Display for RemovalReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RemovalReason::GhostRow => write!(f, "ghost row"),
            RemovalReason::DuplicateRow => write!(f, "duplicate"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditEntry {
    /// The row exactly as it was ingested.
    pub row: Row,
    pub reason: RemovalReason,
}

/// Rows dropped by the sanitizer, in original order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuditLog {
    columns: Vec<String>,
    entries: Vec<AuditEntry>,
}

impl AuditLog {
    pub fn entries(&self) -> &[AuditEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn ordinals(&self) -> Vec<usize> {
        self.entries.iter().map(|e| e.row.ordinal).collect()
    }

    pub fn contains(&self, ordinal: usize) -> bool {
        self.entries.iter().any(|e| e.row.ordinal == ordinal)
    }

    pub fn count(&self, reason: RemovalReason) -> usize {
        self.entries.iter().filter(|e| e.reason == reason).count()
    }

    /// Render the log as a table for display or export: the original row
    /// number, the reason, then the original (raw) columns.
    pub fn to_table(&self) -> Table {
        let mut columns = vec![
            audit_column("Row", &self.columns),
            audit_column("Reason", &self.columns),
        ];
        columns.extend(self.columns.iter().cloned());
        let rows = self
            .entries
            .iter()
            .map(|e| {
                let mut cells: Vec<Cell> = Vec::with_capacity(columns.len());
                cells.push(Some(e.row.ordinal.to_string()));
                cells.push(Some(e.reason.to_string()));
                cells.extend(e.row.cells.iter().cloned());
                Row::new(e.row.ordinal, cells)
            })
            .collect();
        Table::new(columns, rows)
    }
}

/// `base`, or `base_1`, `base_2`, ... if the data already has such a column.
fn audit_column(base: &str, taken: &[String]) -> String {
    let mut name = base.to_string();
    let mut n = 0;
    while taken.contains(&name) {
        n += 1;
        name = format!("{base}_{n}");
    }
    name
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    pub raw_rows: usize,
    pub kept_rows: usize,
    pub ghost_rows: usize,
    pub duplicate_rows: usize,
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Kept {} of {} rows ({} ghost, {} duplicate removed)",
            self.kept_rows, self.raw_rows, self.ghost_rows, self.duplicate_rows
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sanitized {
    pub cleaned: Table,
    pub removed: AuditLog,
}

impl Sanitized {
    pub fn summary(&self) -> Summary {
        Summary {
            raw_rows: self.cleaned.nrows() + self.removed.len(),
            kept_rows: self.cleaned.nrows(),
            ghost_rows: self.removed.count(RemovalReason::GhostRow),
            duplicate_rows: self.removed.count(RemovalReason::DuplicateRow),
        }
    }
}

pub fn sanitize(raw: &Table) -> Result<Sanitized, StagingError> {
    let mut reasons: HashMap<usize, RemovalReason> = HashMap::new();

    // 1. Blank normalization
    let mut rows: Vec<Row> = raw
        .rows()
        .par_iter()
        .map(|r| Row::new(r.ordinal, r.cells.iter().map(normalize_blank).collect()))
        .collect();

    // 2. Ghost rows
    rows.retain(|r| {
        let keep = r.populated() >= MIN_POPULATED_CELLS;
        if !keep {
            trace!("Ghost row {}: {} populated cells", r.ordinal, r.populated());
            reasons.insert(r.ordinal, RemovalReason::GhostRow);
        }
        keep
    });

    // 3. Cell whitespace
    rows.par_iter_mut().for_each(|r| {
        for s in r.cells.iter_mut().flatten() {
            let trimmed = s.trim();
            if trimmed.len() != s.len() {
                *s = trimmed.to_string();
            }
        }
    });

    // 4. Headers
    let columns = trim_headers(raw.columns())?;

    // 5. Duplicates, first occurrence wins
    let duplicates: Vec<usize> = {
        let mut seen: HashSet<&[Cell]> = HashSet::with_capacity(rows.len());
        rows.iter()
            .filter(|r| !seen.insert(r.cells.as_slice()))
            .map(|r| r.ordinal)
            .collect()
    };
    for ordinal in duplicates {
        trace!("Duplicate row {}", ordinal);
        reasons.insert(ordinal, RemovalReason::DuplicateRow);
    }
    rows.retain(|r| !reasons.contains_key(&r.ordinal));

    let entries: Vec<AuditEntry> = raw
        .rows()
        .iter()
        .filter_map(|r| {
            reasons.get(&r.ordinal).map(|&reason| AuditEntry {
                row: r.clone(),
                reason,
            })
        })
        .collect();

    let result = Sanitized {
        cleaned: Table::new(columns, rows),
        removed: AuditLog {
            columns: raw.columns().to_vec(),
            entries,
        },
    };
    info!("{}", result.summary());
    debug!("Removed rows: {:?}", result.removed.ordinals());
    Ok(result)
}

fn normalize_blank(cell: &Cell) -> Cell {
    match cell {
        Some(s) if s.trim().is_empty() => None,
        other => other.clone(),
    }
}

fn trim_headers(columns: &[String]) -> Result<Vec<String>, StagingError> {
    let mut seen = HashSet::with_capacity(columns.len());
    columns
        .iter()
        .map(|c| {
            let name = c.trim().to_string();
            if seen.insert(name.clone()) {
                Ok(name)
            } else {
                Err(StagingError::DuplicateColumn(name))
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cells(values: &[&str]) -> Vec<Cell> {
        values.iter().map(|s| Some(s.to_string())).collect()
    }

    #[test]
    fn whitespace_only_cells_become_blank() {
        let raw = Table::new(
            vec!["a".into(), "b".into(), "c".into()],
            vec![Row::new(1, cells(&["x", "   ", "y"]))],
        );
        let out = sanitize(&raw).unwrap();
        assert_eq!(out.cleaned.rows()[0].cells[1], None);
    }

    #[test]
    fn rows_with_one_populated_cell_are_ghosts() {
        let raw = Table::new(
            vec!["a".into(), "b".into(), "c".into()],
            vec![
                Row::new(1, cells(&["x", " ", "\t"])),
                Row::new(2, cells(&["x", "y", " "])),
                Row::new(3, vec![None, None, None]),
            ],
        );
        let out = sanitize(&raw).unwrap();
        assert_eq!(out.cleaned.ordinals(), vec![2]);
        assert_eq!(out.removed.ordinals(), vec![1, 3]);
        assert!(
            out.removed
                .entries()
                .iter()
                .all(|e| e.reason == RemovalReason::GhostRow)
        );
    }

    #[test]
    fn cells_and_headers_are_trimmed() {
        let raw = Table::new(
            vec![" ID ".into(), "Name\t".into()],
            vec![Row::new(1, cells(&["  001", "Mary  Ann "]))],
        );
        let out = sanitize(&raw).unwrap();
        assert_eq!(out.cleaned.columns(), &["ID", "Name"]);
        assert_eq!(out.cleaned.cell(0, 0), Some("001"));
        assert_eq!(out.cleaned.cell(0, 1), Some("Mary  Ann"));
    }

    #[test]
    fn header_collision_after_trim_fails() {
        let raw = Table::new(vec!["Name".into(), " Name".into()], vec![]);
        assert!(matches!(
            sanitize(&raw),
            Err(StagingError::DuplicateColumn(name)) if name == "Name"
        ));
    }

    #[test]
    fn duplicates_keep_lowest_ordinal() {
        let raw = Table::new(
            vec!["a".into(), "b".into()],
            vec![
                Row::new(1, cells(&["x", "y"])),
                Row::new(2, cells(&["x ", " y"])),
                Row::new(3, cells(&["z", "y"])),
                Row::new(4, cells(&["x", "y"])),
            ],
        );
        let out = sanitize(&raw).unwrap();
        assert_eq!(out.cleaned.ordinals(), vec![1, 3]);
        assert_eq!(out.removed.ordinals(), vec![2, 4]);
        assert_eq!(out.removed.count(RemovalReason::DuplicateRow), 2);
    }

    #[test]
    fn audit_keeps_original_values() {
        let raw = Table::new(
            vec!["a".into(), "b".into()],
            vec![
                Row::new(1, cells(&["x", "y"])),
                Row::new(2, cells(&[" x", "y "])),
            ],
        );
        let out = sanitize(&raw).unwrap();
        let entry = &out.removed.entries()[0];
        assert_eq!(entry.row.cells, cells(&[" x", "y "]));
    }

    #[test]
    fn all_ghost_rows_give_empty_table() {
        let raw = Table::new(
            vec!["a".into(), "b".into()],
            vec![Row::new(1, vec![None, None]), Row::new(2, cells(&["", "q"]))],
        );
        let out = sanitize(&raw).unwrap();
        assert!(out.cleaned.is_empty());
        assert_eq!(out.cleaned.columns(), &["a", "b"]);
        assert_eq!(out.removed.len(), 2);
    }

    #[test]
    fn audit_table_lists_row_and_reason() {
        let raw = Table::new(
            vec!["a".into(), "b".into()],
            vec![Row::new(1, cells(&["x", "y"])), Row::new(2, vec![None, None])],
        );
        let log = sanitize(&raw).unwrap().removed.to_table();
        assert_eq!(log.columns(), &["Row", "Reason", "a", "b"]);
        assert_eq!(log.cell(0, 0), Some("2"));
        assert_eq!(log.cell(0, 1), Some("ghost row"));
    }

    #[test]
    fn audit_columns_do_not_clash_with_data_columns() {
        let raw = Table::new(
            vec!["Row".into(), "Reason".into(), "Row_1".into()],
            vec![Row::new(1, cells(&["x", "", ""]))],
        );
        let log = sanitize(&raw).unwrap().removed.to_table();
        assert_eq!(
            log.columns(),
            &["Row_2", "Reason_1", "Row", "Reason", "Row_1"]
        );
        assert_eq!(log.cell(0, 2), Some("x"));
    }

    #[test]
    fn summary_counts_reasons() {
        let raw = Table::new(
            vec!["a".into(), "b".into()],
            vec![
                Row::new(1, cells(&["x", "y"])),
                Row::new(2, cells(&["x", "y"])),
                Row::new(3, vec![None, None]),
            ],
        );
        let summary = sanitize(&raw).unwrap().summary();
        assert_eq!(
            summary,
            Summary {
                raw_rows: 3,
                kept_rows: 1,
                ghost_rows: 1,
                duplicate_rows: 1
            }
        );
    }
}
