use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    /// Unknown file extension or registry key.
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// File bytes or workbook structure could not be decoded.
    #[error("Decode error: {0}")]
    DecodeError(String),

    /// A single row (1-based, header is row 1) could not be converted.
    #[error("Row conversion error at row {row}: {reason}")]
    RowConversionError { row: usize, reason: String },

    /// The file decoded fine but contained no valid contact rows.
    #[error("No contacts could be extracted from {0}")]
    NoContactsExtracted(String),

    #[error("CRM API error: {0}")]
    CrmApi(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("IO error: {0}")]
    IoError(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn row(row: usize, reason: impl Into<String>) -> Self {
        AppError::RowConversionError {
            row,
            reason: reason.into(),
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::IoError(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
