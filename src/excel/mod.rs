//! Excel module for decoding uploaded listings and exporting reports.
//!
//! This module provides:
//! - Decoding the first sheet of a workbook into column-keyed rows
//! - File metadata (name, checksum, row count) for uploads
//! - Writing a discrepancy report workbook

pub mod types;
pub mod reader;
pub mod writer;

// Re-export commonly used types and functions
pub use types::*;
pub use reader::{decode_rows, read_rows, file_info, compute_checksum};
pub use writer::export_report;
