//! Export the merged weekly table to CSV.
//!
//! The export is meant to be easy to consume in spreadsheets or a separate
//! modelling/plotting step. Missing values are written as empty cells.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::domain::MergedRecord;
use crate::error::AppError;

/// Write merged rows to a CSV file.
pub fn write_merged_csv(path: &Path, rows: &[MergedRecord]) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::input(format!("Failed to create export CSV '{}': {e}", path.display())))?;
    write_merged(file, rows)?;
    tracing::info!(path = %path.display(), rows = rows.len(), "Wrote merged table");
    Ok(())
}

/// Write merged rows as CSV to any writer.
pub fn write_merged<W: Write>(writer: W, rows: &[MergedRecord]) -> Result<(), AppError> {
    let mut wtr = csv::Writer::from_writer(writer);
    if rows.is_empty() {
        // `serialize` derives the header from the first row; keep the schema for empty output.
        wtr.write_record([
            "week",
            "location",
            "avg_positive",
            "vaccination",
            "hits",
            "hit_vac",
            "hit_vac_lag",
            "hits_lag",
            "vac_lag",
        ])
        .map_err(|e| AppError::input(format!("Failed to write export CSV header: {e}")))?;
    }
    for row in rows {
        wtr.serialize(row)
            .map_err(|e| AppError::input(format!("Failed to write export CSV row: {e}")))?;
    }
    wtr.flush()
        .map_err(|e| AppError::input(format!("Failed to flush export CSV: {e}")))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_header_and_blank_lags() {
        let rows = vec![MergedRecord {
            week: 3,
            location: "United Kingdom".to_string(),
            avg_positive: Some(0.05),
            vaccination: 40.0,
            hits: Some(50),
            hit_vac: Some(3000.0),
            hit_vac_lag: None,
            hits_lag: None,
            vac_lag: None,
        }];
        let mut buf = Vec::new();
        write_merged(&mut buf, &rows).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next().unwrap(),
            "week,location,avg_positive,vaccination,hits,hit_vac,hit_vac_lag,hits_lag,vac_lag"
        );
        assert_eq!(lines.next().unwrap(), "3,United Kingdom,0.05,40.0,50,3000.0,,,");
    }

    #[test]
    fn empty_table_keeps_header() {
        let mut buf = Vec::new();
        write_merged(&mut buf, &[]).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.starts_with("week,location,"));
        assert_eq!(text.lines().count(), 1);
    }
}
