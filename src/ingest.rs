//! Ingestion: CSV text in, all-text [`Table`] out.
//!
//! Nothing is typed on the way in. Values such as `001` or `02134` keep
//! their leading zeros, every cell is either blank or the exact field text.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Instant;

use csv::StringRecord;
use tracing::{debug, info, trace};

use crate::domain::StagingError;
use crate::table::{Cell, Row, Table};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

#[derive(Debug)]
pub struct FileInfo {
    pub path: PathBuf,
    pub file_size: u64,
}

/// Load a CSV file from disk.
pub fn read_path(path: &Path) -> Result<Table, StagingError> {
    let file_info = get_file_info(path)?;
    debug!(
        "Reading {} ({} bytes)",
        file_info.path.display(),
        file_info.file_size
    );
    let bytes = fs::read(&file_info.path)?;
    read_bytes(&bytes)
}

/// Decode `bytes` as UTF-8 and parse them. An optional BOM is skipped.
pub fn read_bytes(bytes: &[u8]) -> Result<Table, StagingError> {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    let text = std::str::from_utf8(bytes).map_err(|e| StagingError::Encoding(e.to_string()))?;
    read_str(text)
}

/// Parse CSV text with a header row.
///
/// Blank lines are skipped and do not take an ordinal. Records shorter than
/// the header are padded with blanks, longer ones are malformed. Empty
/// header names become `Unnamed: <position>`, repeated ones are rejected.
pub fn read_str(text: &str) -> Result<Table, StagingError> {
    let start_time = Instant::now();
    if text.trim().is_empty() {
        return Err(StagingError::MalformedInput("missing header row".into()));
    }

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());

    let header = reader.headers().map_err(malformed)?.clone();
    let columns = header_names(&header)?;

    let mut rows = Vec::new();
    let mut last = header;
    for (idx, result) in reader.records().enumerate() {
        let record = result.map_err(malformed)?;
        let ordinal = idx + 1;
        if record.len() > columns.len() {
            return Err(StagingError::MalformedInput(format!(
                "row {ordinal} has {} fields, header has {}",
                record.len(),
                columns.len()
            )));
        }
        rows.push(Row::new(ordinal, record.iter().map(to_cell).collect()));
        last = record;
    }

    if ends_inside_quotes(text, &last) {
        return Err(StagingError::MalformedInput(
            "unterminated quoted field".into(),
        ));
    }

    trace!("Columns: {:?}", columns);
    let table = Table::new(columns, rows);
    info!(
        "Parsed {} rows x {} columns in {}ms",
        table.nrows(),
        table.ncolumns(),
        start_time.elapsed().as_millis()
    );
    Ok(table)
}

fn malformed(e: csv::Error) -> StagingError {
    StagingError::MalformedInput(e.to_string())
}

fn to_cell(field: &str) -> Cell {
    (!field.is_empty()).then(|| field.to_string())
}

fn header_names(header: &StringRecord) -> Result<Vec<String>, StagingError> {
    let mut names: Vec<String> = Vec::with_capacity(header.len());
    for (idx, name) in header.iter().enumerate() {
        let name = if name.is_empty() {
            format!("Unnamed: {idx}")
        } else {
            name.to_string()
        };
        if names.contains(&name) {
            return Err(StagingError::DuplicateColumn(name));
        }
        names.push(name);
    }
    Ok(names)
}

/// The reader accepts a quote that is never closed: the field simply runs
/// to the end of the input. Such a field is the last one read, its text is
/// a verbatim suffix of the input and the opening quote sits right before
/// it, at the start of a field.
fn ends_inside_quotes(text: &str, last: &StringRecord) -> bool {
    let Some(field) = last.iter().next_back() else {
        return false;
    };
    let Some(before) = text.strip_suffix(field) else {
        return false;
    };
    match before.strip_suffix('"') {
        Some(rest) => rest.is_empty() || rest.ends_with([',', '\n', '\r']),
        None => false,
    }
}

pub fn get_file_info(path: &Path) -> Result<FileInfo, StagingError> {
    let metadata = fs::metadata(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => StagingError::FileNotFound,
        ErrorKind::PermissionDenied => StagingError::PermissionDenied,
        _ => StagingError::IoError(e),
    })?;
    if !metadata.is_file() {
        return Err(StagingError::LoadingFailed("Not a file!".into()));
    }
    if !is_csv(path) {
        return Err(StagingError::UnknownFileType);
    }

    Ok(FileInfo {
        path: path.to_path_buf(),
        file_size: metadata.len(),
    })
}

fn is_csv(path: &Path) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .is_some_and(|s| s.eq_ignore_ascii_case("csv"))
}
