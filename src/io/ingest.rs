//! CSV ingest for the daily per-location dataset.
//!
//! This module turns an OWID-style CSV into `DailyRecord`s restricted to the
//! study window.
//!
//! - **Strict schema**: a missing required column aborts the run (exit code 2)
//! - **Lenient cells**: blank or malformed numbers become `None`
//! - **Row-level errors**: rows without a usable location or date are skipped
//!   and reported, never fatal

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::NaiveDate;
use csv::StringRecord;
use tracing::{debug, info, warn};

use crate::domain::{DailyRecord, DateWindow};
use crate::error::AppError;

const COL_LOCATION: &str = "location";
const COL_DATE: &str = "date";
const COL_POSITIVE_RATE: &str = "positive_rate";
const COL_VACCINATED: &str = "people_fully_vaccinated_per_hundred";

const REQUIRED_COLUMNS: [&str; 4] = [COL_LOCATION, COL_DATE, COL_POSITIVE_RATE, COL_VACCINATED];

/// A row-level error encountered during ingest.
#[derive(Debug, Clone)]
pub struct RowError {
    pub line: usize,
    pub message: String,
}

/// Ingest output: windowed records plus bookkeeping about what was dropped.
#[derive(Debug, Clone)]
pub struct DailyData {
    pub records: Vec<DailyRecord>,
    pub row_errors: Vec<RowError>,
    pub rows_read: usize,
    /// Rows parsed fine but outside the date window.
    pub rows_outside_window: usize,
}

/// Load the daily dataset from a CSV file.
pub fn load_daily_records(path: &Path, window: &DateWindow) -> Result<DailyData, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::input(format!("Failed to open CSV '{}': {e}", path.display())))?;
    let data = read_daily_records(file, window)?;

    info!(
        path = %path.display(),
        rows_read = data.rows_read,
        rows_kept = data.records.len(),
        rows_outside_window = data.rows_outside_window,
        row_errors = data.row_errors.len(),
        "Loaded daily dataset"
    );
    Ok(data)
}

/// Parse the daily dataset from any reader (file, buffer, network body).
pub fn read_daily_records<R: Read>(reader: R, window: &DateWindow) -> Result<DailyData, AppError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = reader
        .headers()
        .map_err(|e| AppError::input(format!("Failed to read CSV headers: {e}")))?
        .clone();
    let header_map = build_header_map(&headers);
    ensure_required_columns_exist(&header_map)?;

    let mut records = Vec::new();
    let mut row_errors = Vec::new();
    let mut rows_read = 0usize;
    let mut rows_outside_window = 0usize;

    for (idx, result) in reader.records().enumerate() {
        // Header occupies line 1.
        let line = idx + 2;
        rows_read += 1;

        let record = match result {
            Ok(r) => r,
            Err(e) => {
                row_errors.push(RowError {
                    line,
                    message: format!("CSV parse error: {e}"),
                });
                continue;
            }
        };

        match parse_row(&record, &header_map) {
            Ok(row) if window.contains(row.date) => records.push(row),
            Ok(_) => rows_outside_window += 1,
            Err(message) => row_errors.push(RowError { line, message }),
        }
    }

    if !row_errors.is_empty() {
        warn!(count = row_errors.len(), "Skipped unparseable daily rows");
        for e in row_errors.iter().take(5) {
            debug!(line = e.line, "{}", e.message);
        }
    }

    Ok(DailyData {
        records,
        row_errors,
        rows_read,
        rows_outside_window,
    })
}

pub(crate) fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(idx, name)| (normalize_header_name(name), idx))
        .collect()
}

pub(crate) fn normalize_header_name(name: &str) -> String {
    // Spreadsheet exports often prefix the first header with a UTF-8 BOM.
    let name = name.trim().trim_start_matches('\u{feff}');
    name.to_ascii_lowercase()
}

fn ensure_required_columns_exist(header_map: &HashMap<String, usize>) -> Result<(), AppError> {
    for col in REQUIRED_COLUMNS {
        if !header_map.contains_key(col) {
            return Err(AppError::input(format!("Missing required column: `{col}`")));
        }
    }
    Ok(())
}

fn parse_row(record: &StringRecord, header_map: &HashMap<String, usize>) -> Result<DailyRecord, String> {
    let location = get_required(record, header_map, COL_LOCATION)?.to_string();
    let date = parse_date(get_required(record, header_map, COL_DATE)?)?;
    let positive_rate = parse_opt_f64(get_optional(record, header_map, COL_POSITIVE_RATE));
    let vaccinated_per_hundred = parse_opt_f64(get_optional(record, header_map, COL_VACCINATED));

    Ok(DailyRecord {
        location,
        date,
        positive_rate,
        vaccinated_per_hundred,
    })
}

fn get_required<'a>(
    record: &'a StringRecord,
    header_map: &HashMap<String, usize>,
    name: &str,
) -> Result<&'a str, String> {
    let idx = header_map
        .get(name)
        .ok_or_else(|| format!("Missing required column: `{name}`"))?;
    record
        .get(*idx)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| format!("Missing required value: `{name}`"))
}

fn get_optional<'a>(record: &'a StringRecord, header_map: &HashMap<String, usize>, name: &str) -> Option<&'a str> {
    let idx = header_map.get(name)?;
    record.get(*idx).map(str::trim).filter(|s| !s.is_empty())
}

pub(crate) fn parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|_| format!("Invalid date '{s}'. Expected YYYY-MM-DD."))
}

fn parse_opt_f64(s: Option<&str>) -> Option<f64> {
    let v = s?.parse::<f64>().ok()?;
    if v.is_finite() { Some(v) } else { None }
}
