//! Spreadsheet extraction: every sheet rendered as CSV text.
//!
//! Workbooks (`.xlsx`, `.xls`, `.xlsm`, `.ods`) are read with calamine and
//! each sheet is written under a `--- Sheet: <name> ---` marker, rows that
//! are entirely empty skipped. Plain `.csv` input is normalised through the
//! csv crate without a marker.

use crate::error::{BoxedCause, DocReviewError};
use calamine::{open_workbook_auto_from_rs, Data, Reader};
use std::io::Cursor;
use tracing::{debug, info};

/// Marker placed before the rows of a worksheet.
pub fn sheet_marker(name: &str) -> String {
    format!("--- Sheet: {name} ---")
}

/// Extract all sheets of a workbook as CSV blocks.
pub async fn extract_workbook(filename: &str, bytes: Vec<u8>) -> Result<String, DocReviewError> {
    let name = filename.to_string();
    let text = tokio::task::spawn_blocking(move || workbook_to_text(bytes))
        .await
        .map_err(|e| DocReviewError::Internal(format!("spreadsheet task panicked: {e}")))?
        .map_err(|e| DocReviewError::extraction(name, "spreadsheet", e))?;
    info!("Spreadsheet '{}': {} chars", filename, text.chars().count());
    Ok(text)
}

/// Re-emit CSV bytes as normalised CSV text.
pub fn extract_csv(filename: &str, bytes: &[u8]) -> Result<String, DocReviewError> {
    csv_to_text(bytes).map_err(|e| DocReviewError::extraction(filename, "CSV", e))
}

fn workbook_to_text(bytes: Vec<u8>) -> Result<String, BoxedCause> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))?;

    let mut blocks = Vec::new();
    for sheet_name in workbook.sheet_names().to_vec() {
        let range = workbook.worksheet_range(&sheet_name)?;
        let rows: Vec<Vec<String>> = range
            .rows()
            .map(|row| row.iter().map(cell_text).collect::<Vec<_>>())
            .filter(|cells| cells.iter().any(|c| !c.is_empty()))
            .collect();
        debug!("Sheet '{}': {} non-empty rows", sheet_name, rows.len());
        blocks.push(format!("{}\n{}", sheet_marker(&sheet_name), rows_to_csv(&rows)?));
    }
    Ok(blocks.join("\n"))
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        other => other.to_string(),
    }
}

fn csv_to_text(bytes: &[u8]) -> Result<String, BoxedCause> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(bytes);

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(record.iter().map(str::to_string).collect::<Vec<_>>());
    }
    rows_to_csv(&rows)
}

fn rows_to_csv(rows: &[Vec<String>]) -> Result<String, BoxedCause> {
    let mut writer = csv::WriterBuilder::new()
        .flexible(true)
        .from_writer(Vec::new());
    for row in rows {
        writer.write_record(row)?;
    }
    let bytes = writer.into_inner().map_err(|e| e.into_error())?;
    Ok(String::from_utf8(bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn csv_is_normalised() {
        let text = extract_csv("t.csv", b"Name,Score\n\"Smith, J\",42\nshort\n").unwrap();
        assert_eq!(text, "Name,Score\n\"Smith, J\",42\nshort\n");
    }

    #[test]
    fn empty_csv_is_empty_text() {
        assert_eq!(extract_csv("e.csv", b"").unwrap(), "");
    }

    #[test]
    fn invalid_utf8_csv_is_extraction_error() {
        let err = extract_csv("bad.csv", &[0xff, 0xfe, b',', 0x80]).unwrap_err();
        assert!(matches!(err, DocReviewError::Extraction { .. }), "got: {err}");
    }

    #[test]
    fn data_cells_render_without_type_noise() {
        assert_eq!(cell_text(&Data::Empty), "");
        assert_eq!(cell_text(&Data::String("Budget".into())), "Budget");
        assert_eq!(cell_text(&Data::Int(7)), "7");
        assert_eq!(cell_text(&Data::Bool(true)), "true");
    }

    #[tokio::test]
    async fn garbage_workbook_fails_cleanly() {
        let err = extract_workbook("x.xlsx", b"not a workbook".to_vec())
            .await
            .unwrap_err();
        assert!(matches!(err, DocReviewError::Extraction { .. }), "got: {err}");
    }

    #[test]
    fn marker_format() {
        assert_eq!(sheet_marker("Q1"), "--- Sheet: Q1 ---");
    }
}
