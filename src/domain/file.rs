use crate::domain::error::{AppError, Result};

pub const CSV_FORMAT: &str = "csv";
pub const XLSX_FORMAT: &str = "xlsx";

/// A file received from the client: declared name plus raw bytes.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }

    /// Importer key derived from the file extension.
    pub fn format(&self) -> Result<&'static str> {
        detect_file_format(&self.name)
    }
}

/// A rendered export ready to be written as a response body.
#[derive(Debug, Clone)]
pub struct ExportFile {
    pub content_type: String,
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl ExportFile {
    pub fn content_disposition(&self) -> String {
        format!("attachment; filename=\"{}\"", self.file_name)
    }
}

/// Maps a file name to an importer key by its extension.
///
/// `csv` maps to the delimited-text importer, `xlsx` and `xls` to the
/// spreadsheet importer. Anything else is rejected before reading content.
pub fn detect_file_format(file_name: &str) -> Result<&'static str> {
    let extension = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "csv" => Ok(CSV_FORMAT),
        "xlsx" | "xls" => Ok(XLSX_FORMAT),
        _ => {
            tracing::warn!(file_name, extension = %extension, "Unsupported upload extension");
            Err(AppError::UnsupportedFormat(format!(
                "unsupported file extension '{}' in {}",
                extension, file_name
            )))
        }
    }
}
