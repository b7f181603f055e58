use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Represents a cell value with type information
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum CellValue {
    Empty,
    String(String),
    Number(f64),
    Boolean(bool),
    DateTime(String), // ISO 8601 format
    Error(String),
}

impl Default for CellValue {
    fn default() -> Self {
        CellValue::Empty
    }
}

impl CellValue {
    /// String form used for comparison and display.
    ///
    /// Whole numbers drop the fractional part (`10`, not `10.0`), which is how the
    /// listings exported by the platforms are compared by operators.
    pub fn to_text(&self) -> Option<String> {
        match self {
            CellValue::Empty => None,
            CellValue::String(s) => Some(s.clone()),
            CellValue::Number(n) => Some(format_number(*n)),
            CellValue::Boolean(b) => Some(b.to_string()),
            CellValue::DateTime(dt) => Some(dt.clone()),
            CellValue::Error(e) => Some(e.clone()),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::String(s) => s.is_empty(),
            _ => false,
        }
    }
}

fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

/// One decoded data row, addressable by header name.
///
/// Columns that were empty in the sheet are simply absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceRow {
    cells: HashMap<String, CellValue>,
}

impl SourceRow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, column: impl Into<String>, value: CellValue) {
        self.cells.insert(column.into(), value);
    }

    pub fn get(&self, column: &str) -> Option<&CellValue> {
        self.cells.get(column)
    }

    /// Coerced text of a column, `None` when the column is missing or empty.
    pub fn text(&self, column: &str) -> Option<String> {
        self.cells
            .get(column)
            .filter(|v| !v.is_empty())
            .and_then(CellValue::to_text)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for SourceRow {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut row = SourceRow::new();
        for (k, v) in iter {
            row.insert(k, CellValue::String(v.into()));
        }
        row
    }
}

/// Result of decoding the first sheet of a workbook
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecodedSheet {
    pub sheet_name: String,
    pub headers: Vec<String>,
    pub rows: Vec<SourceRow>,
}

/// Metadata about an uploaded file, shown next to the upload buttons
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceFileInfo {
    pub name: String,
    pub checksum: String,
    pub row_count: u32,
    pub loaded_at: i64,
}

/// Excel-specific errors
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExcelError {
    pub message: String,
    pub error_type: ExcelErrorType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExcelErrorType {
    FileNotFound,
    InvalidFormat,
    NoSheets,
    ReadError,
    WriteError,
}

impl std::fmt::Display for ExcelError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ExcelError {}

impl ExcelError {
    pub fn new(message: impl Into<String>, error_type: ExcelErrorType) -> Self {
        ExcelError {
            message: message.into(),
            error_type,
        }
    }

    pub fn file_not_found(path: &str) -> Self {
        ExcelError::new(format!("File not found: {}", path), ExcelErrorType::FileNotFound)
    }

    pub fn invalid_format(message: impl Into<String>) -> Self {
        ExcelError::new(message, ExcelErrorType::InvalidFormat)
    }

    pub fn no_sheets() -> Self {
        ExcelError::new("Workbook contains no sheets", ExcelErrorType::NoSheets)
    }

    pub fn read_error(message: impl Into<String>) -> Self {
        ExcelError::new(message, ExcelErrorType::ReadError)
    }

    pub fn write_error(message: impl Into<String>) -> Self {
        ExcelError::new(message, ExcelErrorType::WriteError)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_number_text() {
        assert_eq!(CellValue::Number(10.0).to_text().as_deref(), Some("10"));
        assert_eq!(CellValue::Number(-3.0).to_text().as_deref(), Some("-3"));
        assert_eq!(CellValue::Number(10.5).to_text().as_deref(), Some("10.5"));
        assert_eq!(CellValue::Boolean(true).to_text().as_deref(), Some("true"));
        assert_eq!(CellValue::Empty.to_text(), None);
    }

    #[test]
    fn test_row_text_skips_empty() {
        let mut row = SourceRow::new();
        row.insert("a", CellValue::String(String::new()));
        row.insert("b", CellValue::Number(0.0));
        assert_eq!(row.text("a"), None);
        assert_eq!(row.text("b").as_deref(), Some("0"));
        assert_eq!(row.text("missing"), None);
    }
}
