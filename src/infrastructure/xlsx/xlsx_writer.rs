use rust_xlsxwriter::{Workbook, XlsxError};

use crate::domain::contact::{ExportRecord, CONTACT_HEADERS};
use crate::domain::error::{AppError, Result};
use crate::domain::file::ExportFile;
use crate::infrastructure::formats::ContactExporter;

pub const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";
pub const XLSX_FILE_NAME: &str = "contact_export.xlsx";
pub const SHEET_TITLE: &str = "Contacts";

const MAX_COLUMN_WIDTH: usize = 50;

/// Writes contacts to a single-sheet workbook with auto-sized columns.
#[derive(Debug, Default)]
pub struct XlsxExporter;

impl XlsxExporter {
    pub fn new() -> Self {
        Self
    }
}

impl ContactExporter for XlsxExporter {
    fn export(&self, records: &[ExportRecord]) -> Result<ExportFile> {
        let mut workbook = Workbook::new();
        let mut widths = [0usize; CONTACT_HEADERS.len()];

        {
            let worksheet = workbook.add_worksheet();
            worksheet.set_name(SHEET_TITLE).map_err(workbook_error)?;

            for (col, header) in (0u16..).zip(CONTACT_HEADERS) {
                worksheet
                    .write_string(0, col, header)
                    .map_err(|e| AppError::row(1, e.to_string()))?;
                track_width(&mut widths, col, header);
            }

            for (row, record) in (1u32..).zip(records) {
                for (col, value) in (0u16..).zip(record.cells()) {
                    worksheet.write_string(row, col, value).map_err(|e| {
                        AppError::row(row as usize + 1, format!("column {}: {}", col + 1, e))
                    })?;
                    track_width(&mut widths, col, value);
                }
            }

            for (col, longest) in (0u16..).zip(widths) {
                worksheet
                    .set_column_width(col, column_width(longest) as f64)
                    .map_err(workbook_error)?;
            }
        }

        let bytes = workbook.save_to_buffer().map_err(workbook_error)?;

        tracing::info!(records = records.len(), "Rendered XLSX export");

        Ok(ExportFile {
            content_type: XLSX_CONTENT_TYPE.to_string(),
            file_name: XLSX_FILE_NAME.to_string(),
            bytes,
        })
    }
}

fn track_width(widths: &mut [usize], col: u16, value: &str) {
    let slot = &mut widths[col as usize];
    *slot = (*slot).max(value.chars().count());
}

/// Longest rendered cell plus padding, capped.
pub fn column_width(longest: usize) -> usize {
    (longest + 2).min(MAX_COLUMN_WIDTH)
}

fn workbook_error(err: XlsxError) -> AppError {
    AppError::Internal(format!("Failed to build workbook: {}", err))
}
