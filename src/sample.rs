use crate::table::{Row, Table};

pub const ROSTER_COLUMNS: [&str; 6] = ["ID", "Name", "Department", "Email", "Salary", "Start Date"];

/// Fixed employee roster for trying the tool without a file. It contains
/// one of everything the sanitizer cleans up: padded headers and values, a
/// ghost row, an empty row and an exact duplicate.
pub fn employee_roster() -> Table {
    let records: [[&str; 6]; 11] = [
        ["001", "Alice Johnson", "IT", "alice@example.com", "72000", "2019-03-01"],
        ["002", "Bob Smith", "Sales", "bob@example.com", "58000", "2020-07-15"],
        ["003", "Carol White", "Sales", "carol@example.com", "61000", "2018-11-20"],
        ["", "", "", "", "", ""],
        ["004", "  David Brown ", "IT", "david@example.com", "69000", "2021-01-04"],
        ["005", "Eve Davis", "HR", "eve@example.com", "54000", "2022-05-30"],
        ["003", "Carol White", "Sales", "carol@example.com", "61000", "2018-11-20"],
        ["   ", "Frank", "  ", "", "", ""],
        ["006", "Grace Lee", "Finance", "grace@example.com", "80000", "2017-09-12"],
        ["007", "Henry Wilson", "IT", "", "66000", "2023-02-27"],
        ["008", "Ivy Martin", "Marketing", "ivy@example.com", "", "2021-10-18"],
    ];

    let columns = ROSTER_COLUMNS
        .iter()
        .enumerate()
        .map(|(idx, c)| if idx == 1 { format!(" {c} ") } else { c.to_string() })
        .collect();

    let rows = records
        .iter()
        .enumerate()
        .map(|(idx, rec)| {
            Row::new(
                idx + 1,
                rec.iter()
                    .map(|s| if s.is_empty() { None } else { Some(s.to_string()) })
                    .collect(),
            )
        })
        .collect();

    Table::new(columns, rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sanitize::{RemovalReason, sanitize};

    #[test]
    fn roster_has_six_columns() {
        let t = employee_roster();
        assert_eq!(t.ncolumns(), 6);
        assert_eq!(t.nrows(), 11);
        assert_eq!(t.cell(0, 0), Some("001"));
    }

    #[test]
    fn roster_exercises_every_rule() {
        let out = sanitize(&employee_roster()).unwrap();
        assert_eq!(out.cleaned.columns(), &ROSTER_COLUMNS);
        assert_eq!(out.cleaned.nrows(), 8);
        assert_eq!(out.removed.ordinals(), vec![4, 7, 8]);
        assert_eq!(out.removed.count(RemovalReason::GhostRow), 2);
        assert_eq!(out.removed.count(RemovalReason::DuplicateRow), 1);
        assert_eq!(out.cleaned.cell(3, 1), Some("David Brown"));
    }
}
