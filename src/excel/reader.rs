use calamine::{open_workbook_auto_from_rs, Data, Reader};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::io::Cursor;
use std::path::Path;

use super::types::*;

/// Header given to a column whose header cell is blank
const EMPTY_HEADER: &str = "__EMPTY";

/// Decode the first sheet of a workbook into column-keyed rows.
///
/// The first row of the used range is the header row. Rows without any
/// non-empty cell are skipped.
pub fn decode_rows(bytes: &[u8]) -> Result<DecodedSheet, ExcelError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))
        .map_err(|e| ExcelError::invalid_format(format!("Failed to open workbook: {}", e)))?;

    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(ExcelError::no_sheets)?;

    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|e| ExcelError::read_error(format!("Failed to read sheet '{}': {}", sheet_name, e)))?;

    let mut rows_iter = range.rows();
    let headers = match rows_iter.next() {
        Some(header_cells) => build_headers(header_cells),
        None => Vec::new(),
    };

    let mut rows = Vec::new();
    for cells in rows_iter {
        let mut row = SourceRow::new();
        for (header, cell) in headers.iter().zip(cells.iter()) {
            let value = convert_cell_value(Some(cell));
            if !value.is_empty() {
                row.insert(header.clone(), value);
            }
        }
        if !row.is_empty() {
            rows.push(row);
        }
    }

    Ok(DecodedSheet {
        sheet_name,
        headers,
        rows,
    })
}

/// Read a workbook from disk, returning the decoded sheet and file metadata
pub fn read_rows(path: &str) -> Result<(DecodedSheet, SourceFileInfo), ExcelError> {
    let file_path = Path::new(path);

    if !file_path.exists() {
        return Err(ExcelError::file_not_found(path));
    }

    let bytes = std::fs::read(file_path)
        .map_err(|e| ExcelError::read_error(format!("Failed to read file: {}", e)))?;

    let name = file_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string());

    let sheet = decode_rows(&bytes)?;
    let info = file_info(&name, &bytes, &sheet);
    Ok((sheet, info))
}

/// Build the metadata record for a decoded upload
pub fn file_info(name: &str, bytes: &[u8], sheet: &DecodedSheet) -> SourceFileInfo {
    SourceFileInfo {
        name: name.to_string(),
        checksum: compute_checksum(bytes),
        row_count: sheet.rows.len() as u32,
        loaded_at: chrono::Utc::now().timestamp_millis(),
    }
}

/// Header names for the first row. Blank headers become `__EMPTY`, `__EMPTY_1`, ...
/// and repeated names get a numeric suffix so every column stays addressable.
fn build_headers(cells: &[Data]) -> Vec<String> {
    let mut seen: HashMap<String, u32> = HashMap::new();
    let mut headers = Vec::with_capacity(cells.len());

    for cell in cells {
        let base = convert_cell_value(Some(cell))
            .to_text()
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| EMPTY_HEADER.to_string());

        let mut name = base.clone();
        if let Some(&start) = seen.get(&base) {
            let mut count = start;
            loop {
                name = format!("{}_{}", base, count);
                count += 1;
                if !seen.contains_key(&name) {
                    break;
                }
            }
            seen.insert(base, count);
        }
        seen.entry(name.clone()).or_insert(1);
        headers.push(name);
    }

    headers
}

/// Convert calamine Data to our CellValue
fn convert_cell_value(cell: Option<&Data>) -> CellValue {
    match cell {
        None => CellValue::Empty,
        Some(data) => match data {
            Data::Empty => CellValue::Empty,
            Data::String(s) => CellValue::String(s.clone()),
            Data::Float(f) => CellValue::Number(*f),
            Data::Int(i) => CellValue::Number(*i as f64),
            Data::Bool(b) => CellValue::Boolean(*b),
            Data::DateTime(dt) => CellValue::DateTime(format_excel_datetime(dt.as_f64())),
            Data::DateTimeIso(s) => CellValue::DateTime(s.clone()),
            Data::DurationIso(s) => CellValue::String(s.clone()),
            Data::Error(e) => CellValue::Error(e.to_string()),
        },
    }
}

/// Format Excel datetime (days since 1899-12-30) to ISO 8601
fn format_excel_datetime(value: f64) -> String {
    let Some(epoch) = chrono::NaiveDate::from_ymd_opt(1899, 12, 30).and_then(|d| d.and_hms_opt(0, 0, 0)) else {
        return value.to_string();
    };

    // Round to whole seconds before splitting so a value just short of midnight
    // carries into the next day.
    let total_seconds = (value * 86400.0).round() as i64;
    let datetime = epoch + chrono::Duration::seconds(total_seconds);

    datetime.format("%Y-%m-%dT%H:%M:%S").to_string()
}

/// Compute SHA-256 checksum of file contents
pub fn compute_checksum(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}
