use umya_spreadsheet::{new_file, writer, Worksheet};

use super::reader::compute_checksum;
use super::types::ExcelError;
use crate::reconcile::ReconciliationState;

const DIFFERENCES_SHEET: &str = "Differences";
const UNMATCHED_SHEET: &str = "Unmatched";

const DIFFERENCE_HEADERS: [&str; 5] = ["編號", "欄位", "原值", "新值", "已處理"];

/// Export the current discrepancies to a new workbook.
///
/// The first sheet lists every differing (record, field) pair, resolved or not.
/// A second sheet lists ids of baseline records that found no match.
/// Returns the checksum of the written file.
pub fn export_report(state: &ReconciliationState, output_path: &str) -> Result<String, ExcelError> {
    let mut book = new_file();

    let sheet = book
        .get_sheet_by_name_mut("Sheet1")
        .ok_or_else(|| ExcelError::write_error("New workbook has no default sheet"))?;
    sheet.set_name(DIFFERENCES_SHEET);
    write_differences(sheet, state);

    let sheet = book
        .new_sheet(UNMATCHED_SHEET)
        .map_err(|e| ExcelError::write_error(format!("Failed to add sheet: {}", e)))?;
    write_unmatched(sheet, state);

    writer::xlsx::write(&book, output_path)
        .map_err(|e| ExcelError::write_error(format!("Failed to write file: {}", e)))?;

    let bytes = std::fs::read(output_path)
        .map_err(|e| ExcelError::read_error(format!("Failed to read back report: {}", e)))?;
    Ok(compute_checksum(&bytes))
}

fn write_differences(sheet: &mut Worksheet, state: &ReconciliationState) {
    for (col_idx, header) in DIFFERENCE_HEADERS.iter().enumerate() {
        sheet.get_cell_mut((col_idx as u32 + 1, 1)).set_value(*header);
    }

    let mut row_num = 2u32;
    for record in state.records() {
        let Some(updated) = record.updated.as_ref() else {
            continue;
        };
        for field in record.different_fields() {
            let values = [
                record.id.as_str(),
                field.label(),
                record.baseline.get(field).unwrap_or_default(),
                updated.get(field).unwrap_or_default(),
                if record.is_resolved(field) { "Y" } else { "N" },
            ];
            for (col_idx, value) in values.iter().enumerate() {
                sheet.get_cell_mut((col_idx as u32 + 1, row_num)).set_value(*value);
            }
            row_num += 1;
        }
    }
}

fn write_unmatched(sheet: &mut Worksheet, state: &ReconciliationState) {
    sheet.get_cell_mut((1, 1)).set_value("編號");

    let mut row_num = 2u32;
    for record in state.records().iter().filter(|r| !r.matched) {
        sheet.get_cell_mut((1, row_num)).set_value(record.id.as_str());
        row_num += 1;
    }
}
