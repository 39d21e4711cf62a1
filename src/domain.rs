use std::fmt;
use std::io::Error;
use std::path::PathBuf;

use derive_setters::Setters;
use polars::error::PolarsError;
use ratatui::crossterm::event::KeyEvent;

pub const DEFAULT_EXPORT_FILE: &str = "filtered_data.csv";

pub const HELP_TEXT: &str = "\
Navigation
  ←↓↑→ / hjkl   move selection
  PgUp / PgDn   page up / down
  g / G         first / last row
  Tab / S-Tab   next / previous view

Filter
  f             select filter column
  v             select filter value
  x             clear filter

Edit (Filtered view)
  Enter / e     edit selected cell
  a             add a row
  d             delete selected row
  w             export edited table

Other
  y / Y         copy cell / row to clipboard
  ?             this help
  Esc           close popup / cancel
  q             quit";

#[derive(Debug)]
pub enum StagingError {
    MalformedInput(String),
    Encoding(String),
    UnknownColumn(String),
    DuplicateColumn(String),
    RowOutOfRange(usize),
    IoError(Error),
    PolarsError(PolarsError),
    LoadingFailed(String),
    FileNotFound,
    PermissionDenied,
    UnknownFileType,
}

impl StagingError {
    /// Errors that end up in front of the user as "could not read file".
    pub fn is_read_failure(&self) -> bool {
        matches!(
            self,
            StagingError::MalformedInput(_)
                | StagingError::Encoding(_)
                | StagingError::LoadingFailed(_)
                | StagingError::FileNotFound
                | StagingError::PermissionDenied
                | StagingError::UnknownFileType
        )
    }
}

impl fmt::Display for StagingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StagingError::MalformedInput(msg) => write!(f, "could not read file: {msg}"),
            StagingError::Encoding(msg) => {
                write!(f, "could not read file: invalid encoding ({msg})")
            }
            StagingError::UnknownColumn(name) => write!(f, "unknown column \"{name}\""),
            StagingError::DuplicateColumn(name) => {
                write!(f, "duplicate column \"{name}\" after trimming headers")
            }
            StagingError::RowOutOfRange(idx) => write!(f, "row {idx} is out of range"),
            StagingError::IoError(e) => write!(f, "io error: {e}"),
            StagingError::PolarsError(e) => write!(f, "polars error: {e}"),
            StagingError::LoadingFailed(msg) => write!(f, "could not read file: {msg}"),
            StagingError::FileNotFound => write!(f, "could not read file: file not found"),
            StagingError::PermissionDenied => {
                write!(f, "could not read file: permission denied")
            }
            StagingError::UnknownFileType => {
                write!(f, "could not read file: not a csv file")
            }
        }
    }
}

impl std::error::Error for StagingError {}

impl From<Error> for StagingError {
    fn from(err: Error) -> Self {
        StagingError::IoError(err)
    }
}

impl From<PolarsError> for StagingError {
    fn from(err: PolarsError) -> Self {
        StagingError::PolarsError(err)
    }
}

#[derive(Debug, Clone, Setters)]
#[setters(into)]
pub struct StagingConfig {
    /// Milliseconds the controller waits for a terminal event.
    pub event_poll_time: u64,
    pub max_column_width: usize,
    /// Where the TUI writes the edited table.
    pub export_path: PathBuf,
}

impl Default for StagingConfig {
    fn default() -> Self {
        Self {
            event_poll_time: 100,
            max_column_width: 30,
            export_path: PathBuf::from(DEFAULT_EXPORT_FILE),
        }
    }
}

/// What a popup selector is choosing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PickMode {
    FilterColumn,
    FilterValue,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    Quit,
    MoveUp,
    MoveDown,
    MoveLeft,
    MoveRight,
    MovePageUp,
    MovePageDown,
    MoveBeginning,
    MoveEnd,
    NextView,
    PreviousView,
    PickFilterColumn,
    PickFilterValue,
    ClearFilter,
    EditCell,
    AddRow,
    DeleteRow,
    Export,
    CopyCell,
    CopyRow,
    Help,
    Enter,
    Exit,
    Resize(usize, usize),
    RawKey(KeyEvent),
}
