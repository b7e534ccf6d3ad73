//! CSV ingest of a date-indexed numeric table (the "master dataset").
//!
//! Layout: the first column holds the observation date, every other column is
//! a numeric series. The header names become column names.
//!
//! Design goals:
//! - **Strict schema** for the header (clear errors + exit code 2)
//! - **Row-level validation** (skip bad rows, but report what happened)
//! - **Deterministic behavior**: rows are sorted by date, the first of any
//!   duplicated date wins

use std::collections::{BTreeMap, HashSet};
use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::NaiveDate;
use csv::StringRecord;
use log::warn;

use crate::domain::Frame;
use crate::error::AppError;

/// Cell markers read as "missing" (case-insensitive), besides the empty cell.
const MISSING_MARKERS: [&str; 4] = [".", "na", "nan", "n/a"];

/// A row-level problem encountered during ingest.
///
/// Rows with an unusable date are skipped; a bad numeric cell only blanks that
/// cell.
#[derive(Debug, Clone, PartialEq)]
pub struct RowError {
    pub line: usize,
    pub column: Option<String>,
    pub message: String,
}

/// Ingest output: the frame plus what happened along the way.
#[derive(Debug, Clone)]
pub struct IngestedFrame {
    pub frame: Frame,
    pub row_errors: Vec<RowError>,
    pub rows_read: usize,
    pub rows_used: usize,
    pub duplicate_dates: usize,
}

/// Open and ingest a CSV file.
pub fn load_frame(path: &Path) -> Result<IngestedFrame, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open CSV '{}': {e}", path.display())))?;
    read_frame(file)
}

/// Ingest CSV from any reader.
pub fn read_frame<R: Read>(input: R) -> Result<IngestedFrame, AppError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(input);

    let headers = reader
        .headers()
        .map_err(|e| AppError::new(2, format!("Failed to read CSV headers: {e}")))?
        .clone();
    let columns = value_columns(&headers)?;

    let mut rows: BTreeMap<NaiveDate, Vec<Option<f64>>> = BTreeMap::new();
    let mut row_errors = Vec::new();
    let mut rows_read = 0usize;
    let mut duplicate_dates = 0usize;

    for (idx, result) in reader.records().enumerate() {
        // records() starts after the header; CSV lines are 1-based.
        let line = idx + 2;
        rows_read += 1;

        let record = match result {
            Ok(r) => r,
            Err(e) => {
                row_errors.push(RowError {
                    line,
                    column: None,
                    message: format!("CSV parse error: {e}"),
                });
                continue;
            }
        };

        let date = match record.get(0).map(parse_date) {
            Some(Ok(d)) => d,
            Some(Err(message)) => {
                row_errors.push(RowError {
                    line,
                    column: None,
                    message,
                });
                continue;
            }
            None => continue,
        };

        if rows.contains_key(&date) {
            duplicate_dates += 1;
            continue;
        }

        let values = columns
            .iter()
            .enumerate()
            .map(|(i, name)| match parse_value(record.get(i + 1)) {
                Ok(v) => v,
                Err(message) => {
                    row_errors.push(RowError {
                        line,
                        column: Some(name.clone()),
                        message,
                    });
                    None
                }
            })
            .collect();
        rows.insert(date, values);
    }

    if duplicate_dates > 0 {
        warn!("ingest: {duplicate_dates} row(s) repeat an earlier date; kept the first occurrence");
    }

    let rows_used = rows.len();
    if rows_used == 0 {
        return Err(AppError::new(3, "No rows with a valid date in the input CSV."));
    }

    let mut frame = Frame::new(rows.keys().copied().collect())?;
    for (i, name) in columns.iter().enumerate() {
        let values = rows.values().map(|row| row[i]).collect();
        frame.insert_column(name.clone(), values)?;
    }

    Ok(IngestedFrame {
        frame,
        row_errors,
        rows_read,
        rows_used,
        duplicate_dates,
    })
}

/// Names of the value columns (everything after the date column).
fn value_columns(headers: &StringRecord) -> Result<Vec<String>, AppError> {
    let names: Vec<String> = headers.iter().map(normalize_header_name).collect();
    if names.len() < 2 {
        return Err(AppError::new(
            2,
            "Input CSV needs a date column followed by at least one value column.",
        ));
    }

    let mut seen = HashSet::new();
    for name in &names[1..] {
        if name.is_empty() {
            return Err(AppError::new(2, "Input CSV has an unnamed value column."));
        }
        if !seen.insert(name.as_str()) {
            return Err(AppError::new(2, format!("Duplicate column in input CSV: `{name}`")));
        }
    }
    Ok(names[1..].to_vec())
}

fn normalize_header_name(name: &str) -> String {
    // Excel and other tools sometimes emit UTF-8 CSVs with a BOM prefix on the
    // first header. Left in place it would become part of the column name.
    name.trim().trim_start_matches('\u{feff}').to_string()
}

fn parse_date(s: &str) -> Result<NaiveDate, String> {
    // Pandas exports may carry a time part on daily data.
    let s = s.split_whitespace().next().unwrap_or_default();
    const FMTS: [&str; 4] = ["%Y-%m-%d", "%d/%m/%Y", "%d-%m-%Y", "%Y/%m/%d"];
    for fmt in FMTS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Ok(d);
        }
    }
    Err(format!(
        "Invalid date '{s}'. Expected one of: YYYY-MM-DD, DD/MM/YYYY, DD-MM-YYYY, YYYY/MM/DD."
    ))
}

/// `Ok(None)` for missing markers (and absent trailing cells).
fn parse_value(s: Option<&str>) -> Result<Option<f64>, String> {
    let Some(s) = s.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(None);
    };
    if MISSING_MARKERS.iter().any(|m| s.eq_ignore_ascii_case(m)) {
        return Ok(None);
    }
    let v = s
        .parse::<f64>()
        .map_err(|_| format!("Invalid number '{s}'; treated as missing."))?;
    Ok(v.is_finite().then_some(v))
}
