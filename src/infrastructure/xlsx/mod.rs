// ============================================================
// XLSX INFRASTRUCTURE LAYER
// ============================================================
// Spreadsheet import (calamine) and export (rust_xlsxwriter)

mod xlsx_reader;
mod xlsx_writer;

pub use xlsx_reader::XlsxImporter;
pub use xlsx_writer::{column_width, XlsxExporter, SHEET_TITLE, XLSX_CONTENT_TYPE, XLSX_FILE_NAME};
