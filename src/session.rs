//! One user's working state: the raw table, its cleaned form, the audit log,
//! the filter selection and the (possibly edited) filtered table.
//!
//! Everything downstream of a change is recomputed through explicit calls:
//! a new raw table re-runs the sanitizer, a new selection re-runs the filter.
//! Nothing else triggers work.

use std::path::Path;

use tracing::{debug, info, warn};

use crate::domain::StagingError;
use crate::export;
use crate::filter::{self, FilterSelection};
use crate::sanitize::{self, AuditLog, Summary};
use crate::table::Table;

#[derive(Debug, Clone)]
pub struct Session {
    raw: Table,
    cleaned: Table,
    removed: AuditLog,
    summary: Summary,
    selection: FilterSelection,
    filtered: Table,
    edited: Table,
}

impl Session {
    pub fn new(raw: Table) -> Result<Self, StagingError> {
        let sanitized = sanitize::sanitize(&raw)?;
        let summary = sanitized.summary();
        let filtered = sanitized.cleaned.clone();
        Ok(Self {
            raw,
            cleaned: sanitized.cleaned,
            removed: sanitized.removed,
            summary,
            selection: FilterSelection::NoFilter,
            edited: filtered.clone(),
            filtered,
        })
    }

    /// Replace the raw table. The current selection is kept if its column
    /// still exists, otherwise it falls back to no filter.
    pub fn load(&mut self, raw: Table) -> Result<(), StagingError> {
        let sanitized = sanitize::sanitize(&raw)?;
        self.summary = sanitized.summary();
        self.raw = raw;
        self.cleaned = sanitized.cleaned;
        self.removed = sanitized.removed;
        info!("Loaded new table: {}", self.summary);

        let selection = std::mem::take(&mut self.selection);
        self.refilter(selection);
        Ok(())
    }

    /// Change the filter. Returns `false` when the selection referenced an
    /// unknown column and was reset to no filter.
    pub fn select(&mut self, selection: FilterSelection) -> bool {
        if selection == self.selection {
            debug!("Selection unchanged, keeping filtered table");
            return true;
        }
        self.refilter(selection)
    }

    fn refilter(&mut self, selection: FilterSelection) -> bool {
        let (selection, filtered, kept) = match filter::apply(&self.cleaned, &selection) {
            Ok(filtered) => (selection, filtered, true),
            Err(e) => {
                warn!("Resetting stale selection ({selection}): {e}");
                (FilterSelection::NoFilter, self.cleaned.clone(), false)
            }
        };
        self.selection = selection;
        self.edited = filtered.clone();
        self.filtered = filtered;
        kept
    }

    pub fn distinct_values(&self, column: &str) -> Result<Vec<String>, StagingError> {
        filter::distinct_values(&self.cleaned, column)
    }

    /// Write the edited table.
    pub fn export(&self, path: &Path) -> Result<(), StagingError> {
        export::write_path(&self.edited, path)
    }

    pub fn export_removed(&self, path: &Path) -> Result<(), StagingError> {
        export::write_path(&self.removed.to_table(), path)
    }

    pub fn raw(&self) -> &Table {
        &self.raw
    }

    pub fn cleaned(&self) -> &Table {
        &self.cleaned
    }

    pub fn removed(&self) -> &AuditLog {
        &self.removed
    }

    pub fn summary(&self) -> Summary {
        self.summary
    }

    pub fn selection(&self) -> &FilterSelection {
        &self.selection
    }

    pub fn filtered(&self) -> &Table {
        &self.filtered
    }

    pub fn edited(&self) -> &Table {
        &self.edited
    }

    /// Manual edits go here. They are never sanitized.
    pub fn edited_mut(&mut self) -> &mut Table {
        &mut self.edited
    }
}
