//! Export analysis results.
//!
//! Tables are plain CSV so they are easy to consume in spreadsheets or
//! downstream scripts; undefined values are written as empty cells. The
//! Granger log is appended to, so repeated runs accumulate in one file.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;

use serde::Serialize;

use crate::analysis::regime::RegimeComparison;
use crate::analysis::sync::{SYNC_INDEX_NAME, SyncIndex};
use crate::analysis::CrossCorrelation;
use crate::domain::Frame;
use crate::error::AppError;

/// `lag,correlation` for every lag of the window.
pub fn write_ccf_csv(path: &Path, ccf: &CrossCorrelation) -> Result<(), AppError> {
    let mut writer = csv::Writer::from_path(path)
        .map_err(|e| AppError::new(2, format!("Failed to create CCF CSV '{}': {e}", path.display())))?;
    writer
        .write_record(["lag", "correlation"])
        .map_err(|e| write_error("CCF CSV header", e))?;
    for entry in &ccf.entries {
        writer
            .write_record([entry.lag.to_string(), fmt_opt(entry.correlation, 6)])
            .map_err(|e| write_error("CCF CSV row", e))?;
    }
    writer.flush().map_err(|e| write_error("CCF CSV", e))?;
    Ok(())
}

/// `pair,calm,stress,diff,status`, one row per compared pair.
pub fn write_regime_csv(path: &Path, comparisons: &[RegimeComparison]) -> Result<(), AppError> {
    let mut writer = csv::Writer::from_path(path)
        .map_err(|e| AppError::new(2, format!("Failed to create regime CSV '{}': {e}", path.display())))?;
    writer
        .write_record(["pair", "calm", "stress", "diff", "status"])
        .map_err(|e| write_error("regime CSV header", e))?;
    for c in comparisons {
        let record = [
            c.pair_label(),
            fmt_opt(c.calm, 4),
            fmt_opt(c.stress, 4),
            fmt_opt(c.diff, 4),
            c.shift.map(|s| s.label().to_string()).unwrap_or_default(),
        ];
        writer.write_record(&record).map_err(|e| write_error("regime CSV row", e))?;
    }
    writer.flush().map_err(|e| write_error("regime CSV", e))?;
    Ok(())
}

/// Append a block of text (a formatted Granger report) to a log file.
pub fn append_granger_log(path: &Path, block: &str) -> Result<(), AppError> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open Granger log '{}': {e}", path.display())))?;
    writeln!(file, "{block}").map_err(|e| write_error("Granger log", e))?;
    Ok(())
}

/// The whole frame: `date` followed by every column.
pub fn write_frame_csv(path: &Path, frame: &Frame) -> Result<(), AppError> {
    let mut writer = csv::Writer::from_path(path)
        .map_err(|e| AppError::new(2, format!("Failed to create frame CSV '{}': {e}", path.display())))?;

    let mut header = vec!["date"];
    header.extend(frame.column_names());
    writer.write_record(&header).map_err(|e| write_error("frame CSV header", e))?;

    for (row, date) in frame.dates().iter().enumerate() {
        let mut record = vec![date.to_string()];
        record.extend(frame.columns().iter().map(|c| fmt_opt(c.values[row], 10)));
        writer.write_record(&record).map_err(|e| write_error("frame CSV row", e))?;
    }
    writer.flush().map_err(|e| write_error("frame CSV", e))?;
    Ok(())
}

/// Rolling pair correlations and the index itself, one row per date.
pub fn write_sync_csv(path: &Path, sync: &SyncIndex) -> Result<(), AppError> {
    let mut writer = csv::Writer::from_path(path)
        .map_err(|e| AppError::new(2, format!("Failed to create sync CSV '{}': {e}", path.display())))?;

    let mut header = vec!["date".to_string()];
    header.extend(sync.pairs.iter().map(|p| p.label()));
    header.push(SYNC_INDEX_NAME.to_string());
    writer.write_record(&header).map_err(|e| write_error("sync CSV header", e))?;

    for (row, date) in sync.dates.iter().enumerate() {
        let mut record = vec![date.to_string()];
        record.extend(sync.pairs.iter().map(|p| fmt_opt(p.values[row], 6)));
        record.push(fmt_opt(sync.index[row], 6));
        writer.write_record(&record).map_err(|e| write_error("sync CSV row", e))?;
    }
    writer.flush().map_err(|e| write_error("sync CSV", e))?;
    Ok(())
}

/// Pretty-printed JSON of any result structure.
pub fn write_summary_json<T: Serialize>(path: &Path, summary: &T) -> Result<(), AppError> {
    let file = create(path, "summary JSON")?;
    serde_json::to_writer_pretty(file, summary)
        .map_err(|e| AppError::new(2, format!("Failed to write summary JSON: {e}")))?;
    Ok(())
}

fn create(path: &Path, what: &str) -> Result<File, AppError> {
    File::create(path).map_err(|e| AppError::new(2, format!("Failed to create {what} '{}': {e}", path.display())))
}

fn write_error(what: &str, e: impl std::fmt::Display) -> AppError {
    AppError::new(2, format!("Failed to write {what}: {e}"))
}

fn fmt_opt(value: Option<f64>, decimals: usize) -> String {
    value.map(|v| format!("{v:.decimals$}")).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::ccf::LagCorrelation;
    use crate::domain::{LagWindow, RegimeShift};
    use chrono::NaiveDate;

    #[test]
    fn ccf_csv_leaves_undefined_lags_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ccf.csv");
        let ccf = CrossCorrelation {
            first_name: "STRESS".into(),
            second_name: "FLOW".into(),
            window: LagWindow::new(1).unwrap(),
            entries: vec![
                LagCorrelation { lag: -1, correlation: None, n_pairs: 1 },
                LagCorrelation { lag: 0, correlation: Some(0.5), n_pairs: 2 },
                LagCorrelation { lag: 1, correlation: Some(-0.25), n_pairs: 1 },
            ],
        };
        write_ccf_csv(&path, &ccf).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text, "lag,correlation\n-1,\n0,0.500000\n1,-0.250000\n");

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 3);
        assert!(rows.iter().all(|r| r.len() == 2));
        assert_eq!(&rows[0][1], "");
    }

    #[test]
    fn regime_csv_has_one_row_per_pair() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("regimes.csv");
        let rows = vec![
            RegimeComparison {
                first: "A".into(),
                second: "B".into(),
                calm: Some(0.1),
                stress: Some(0.5),
                diff: Some(0.4),
                shift: Some(RegimeShift::Converge),
            },
            RegimeComparison {
                first: "A".into(),
                second: "C".into(),
                calm: None,
                stress: Some(0.2),
                diff: None,
                shift: None,
            },
        ];
        write_regime_csv(&path, &rows).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "pair,calm,stress,diff,status");
        assert_eq!(lines[1], "A vs B,0.1000,0.5000,0.4000,CONVERGE");
        assert_eq!(lines[2], "A vs C,,0.2000,,");
    }

    #[test]
    fn granger_log_appends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("granger.txt");
        append_granger_log(&path, "first").unwrap();
        append_granger_log(&path, "second").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "first\nsecond\n");
    }

    #[test]
    fn frame_csv_round_trips_through_ingest() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frame.csv");
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let mut frame = Frame::new((0..3).map(|i| start + chrono::Duration::days(i)).collect()).unwrap();
        frame.insert_column("X", vec![Some(1.5), None, Some(-2.0)]).unwrap();
        write_frame_csv(&path, &frame).unwrap();

        let back = crate::io::ingest::load_frame(&path).unwrap();
        assert_eq!(back.frame, frame);
    }
}
