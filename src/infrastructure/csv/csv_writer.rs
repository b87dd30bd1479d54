use csv::{Terminator, WriterBuilder};

use crate::domain::contact::{ExportRecord, CONTACT_HEADERS};
use crate::domain::error::{AppError, Result};
use crate::domain::file::ExportFile;
use crate::infrastructure::formats::ContactExporter;

pub const CSV_CONTENT_TYPE: &str = "text/csv; charset=utf-16";
pub const CSV_FILE_NAME: &str = "contact_export.csv";

/// Writes contacts as comma-separated UTF-16 text.
#[derive(Debug, Default)]
pub struct CsvExporter;

impl CsvExporter {
    pub fn new() -> Self {
        Self
    }
}

impl ContactExporter for CsvExporter {
    fn export(&self, records: &[ExportRecord]) -> Result<ExportFile> {
        let mut writer = WriterBuilder::new()
            .delimiter(b',')
            .terminator(Terminator::CRLF)
            .from_writer(Vec::new());

        writer
            .write_record(CONTACT_HEADERS)
            .map_err(|e| AppError::row(1, e.to_string()))?;

        for (index, record) in records.iter().enumerate() {
            writer
                .write_record(record.cells())
                .map_err(|e| AppError::row(index + 2, e.to_string()))?;
        }

        let utf8 = writer
            .into_inner()
            .map_err(|e| AppError::Internal(format!("Failed to flush CSV writer: {}", e)))?;
        let text = String::from_utf8(utf8)
            .map_err(|e| AppError::Internal(format!("CSV writer produced invalid text: {}", e)))?;

        tracing::info!(records = records.len(), "Rendered CSV export");

        Ok(ExportFile {
            content_type: CSV_CONTENT_TYPE.to_string(),
            file_name: CSV_FILE_NAME.to_string(),
            bytes: encode_utf16(&text),
        })
    }
}

/// UTF-16 little-endian with a leading BOM.
pub fn encode_utf16(text: &str) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(2 + text.len() * 2);
    bytes.extend_from_slice(&[0xFF, 0xFE]);
    for unit in text.encode_utf16() {
        bytes.extend_from_slice(&unit.to_le_bytes());
    }
    bytes
}
