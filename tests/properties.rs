// Property tests for the cleaning and filtering pipeline.
// Soak: PROPTEST_CASES=10000 cargo test --release --test properties

use proptest::prelude::*;
use staging::export;
use staging::filter::{self, FilterSelection};
use staging::ingest;
use staging::sanitize::{MIN_POPULATED_CELLS, sanitize};
use staging::{Cell, Row, Table};

fn config() -> ProptestConfig {
    ProptestConfig {
        cases: std::env::var("PROPTEST_CASES")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(256),
        failure_persistence: None,
        ..ProptestConfig::default()
    }
}

const COLUMNS: [&str; 4] = ["ID", "Name", "Dept", "Zip"];

/// Mostly short codes from a small alphabet so duplicates happen,
/// sometimes padded, sometimes blank or whitespace only.
fn arb_cell() -> impl Strategy<Value = Cell> {
    prop_oneof![
        4 => r"[0-9]{1,3}".prop_map(Some),
        3 => r"[ab]{1,2}".prop_map(Some),
        1 => r" [a-c]{1,3} ".prop_map(Some),
        1 => r"[a-c] [a-c]".prop_map(Some),
        1 => r"[ \t]{1,2}".prop_map(Some),
        2 => Just(None),
    ]
}

fn arb_table() -> impl Strategy<Value = Table> {
    prop::collection::vec(prop::collection::vec(arb_cell(), COLUMNS.len()), 0..30).prop_map(
        |records| {
            let rows = records
                .into_iter()
                .enumerate()
                .map(|(idx, cells)| Row::new(idx + 1, cells))
                .collect();
            Table::new(COLUMNS.iter().map(|c| c.to_string()).collect(), rows)
        },
    )
}

proptest! {
    #![proptest_config(config())]

    #[test]
    fn sanitize_is_idempotent(raw in arb_table()) {
        let once = sanitize(&raw).unwrap();
        let twice = sanitize(&once.cleaned).unwrap();
        prop_assert_eq!(&twice.cleaned, &once.cleaned);
        prop_assert!(twice.removed.is_empty());
    }

    #[test]
    fn ghost_rows_are_always_audited(raw in arb_table()) {
        let out = sanitize(&raw).unwrap();
        let kept = out.cleaned.ordinals();
        for row in raw.rows() {
            if row.populated() < MIN_POPULATED_CELLS {
                prop_assert!(!kept.contains(&row.ordinal));
                prop_assert!(out.removed.contains(row.ordinal));
            }
        }
    }

    #[test]
    fn every_raw_row_is_kept_or_audited(raw in arb_table()) {
        let out = sanitize(&raw).unwrap();
        let mut seen = out.cleaned.ordinals();
        seen.extend(out.removed.ordinals());
        seen.sort_unstable();
        prop_assert_eq!(seen, raw.ordinals());
    }

    #[test]
    fn filter_is_sound_complete_and_stable(raw in arb_table(), col in 0..COLUMNS.len(), pick in 0usize..8) {
        let cleaned = sanitize(&raw).unwrap().cleaned;
        let column = COLUMNS[col];
        let values = filter::distinct_values(&cleaned, column).unwrap();
        prop_assume!(!values.is_empty());
        let value = values[pick % values.len()].clone();

        let out = filter::apply(&cleaned, &FilterSelection::new(column, value.clone())).unwrap();
        let expected: Vec<usize> = cleaned
            .rows()
            .iter()
            .filter(|r| r.cells[col].as_deref() == Some(value.as_str()))
            .map(|r| r.ordinal)
            .collect();
        prop_assert!(out.rows().iter().all(|r| r.cells[col].as_deref() == Some(value.as_str())));
        prop_assert_eq!(out.ordinals(), expected);
    }

    #[test]
    fn export_then_ingest_round_trips(raw in arb_table()) {
        let cleaned = sanitize(&raw).unwrap().cleaned;
        let bytes = export::to_csv_bytes(&cleaned).unwrap();
        let back = ingest::read_bytes(&bytes).unwrap();
        prop_assert_eq!(back.columns(), cleaned.columns());
        prop_assert_eq!(back.values(), cleaned.values());
    }
}
