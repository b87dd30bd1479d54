// ============================================================
// CSV PARSER
// ============================================================
// Decode UTF-16 uploads, sniff the delimiter, read contact rows

use std::borrow::Cow;

use csv::{ReaderBuilder, StringRecord, Trim};
use encoding_rs::{UTF_16BE, UTF_16LE};

use crate::domain::contact::{NormalizedContact, RawRow, CONTACT_HEADERS};
use crate::domain::error::{AppError, Result};
use crate::domain::file::UploadedFile;
use crate::infrastructure::formats::{collect_contacts, ContactImporter, RowErrorPolicy};

const BYTE_ORDER_MARK: char = '\u{feff}';

/// Candidate delimiters, in priority order.
const DELIMITERS: [u8; 3] = [b',', b';', b'\t'];

/// Delimited-text contact importer
pub struct CsvImporter {
    /// What to do with rows that fail to parse (default: skip)
    policy: RowErrorPolicy,
}

impl Default for CsvImporter {
    fn default() -> Self {
        Self {
            policy: RowErrorPolicy::SkipRow,
        }
    }
}

impl CsvImporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(mut self, policy: RowErrorPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Parse already-decoded CSV text into contacts
    pub fn parse_content(&self, content: &str) -> Result<Vec<NormalizedContact>> {
        let lines = clean_lines(content);
        let first_line = lines
            .first()
            .ok_or_else(|| AppError::DecodeError("CSV file is empty".to_string()))?;

        let delimiter = detect_delimiter(first_line);
        tracing::debug!(delimiter = %(delimiter as char).escape_default(), "Detected CSV delimiter");

        let rows = read_rows(&lines.join("\n"), delimiter)?;
        collect_contacts(rows, self.policy, "csv")
    }
}

impl ContactImporter for CsvImporter {
    fn import(&self, file: &UploadedFile) -> Result<Vec<NormalizedContact>> {
        let content = decode_utf16(&file.bytes)?;
        self.parse_content(&content).map_err(|e| match e {
            AppError::DecodeError(msg) => {
                AppError::DecodeError(format!("{} ({})", msg, file.name))
            }
            other => other,
        })
    }
}

/// Decode UTF-16 bytes. A BOM picks the byte order, otherwise little-endian.
pub fn decode_utf16(bytes: &[u8]) -> Result<String> {
    let (encoding, body) = match bytes {
        [0xFF, 0xFE, rest @ ..] => (UTF_16LE, rest),
        [0xFE, 0xFF, rest @ ..] => (UTF_16BE, rest),
        _ => (UTF_16LE, bytes),
    };

    encoding
        .decode_without_bom_handling_and_without_replacement(body)
        .map(Cow::into_owned)
        .ok_or_else(|| AppError::DecodeError("file is not valid UTF-16 text".to_string()))
}

/// Split into lines, dropping byte-order marks. A line that carried a BOM
/// also loses its quote characters, which BOM-prefixed headers pick up.
fn clean_lines(content: &str) -> Vec<String> {
    let content = content.strip_prefix(BYTE_ORDER_MARK).unwrap_or(content);

    content
        .lines()
        .map(|line| {
            if line.contains(BYTE_ORDER_MARK) {
                line.replace(BYTE_ORDER_MARK, "").replace('"', "")
            } else {
                line.to_string()
            }
        })
        .collect()
}

/// First of comma, semicolon, tab present in `first_line`; comma otherwise.
pub fn detect_delimiter(first_line: &str) -> u8 {
    DELIMITERS
        .into_iter()
        .find(|&delimiter| first_line.contains(delimiter as char))
        .unwrap_or(b',')
}

/// Read records against the header row. Each row is 1-based with the
/// header as row 1. Fields past the header are ignored; a row too short to
/// reach every contact column the header declares is an error.
fn read_rows(content: &str, delimiter: u8) -> Result<Vec<Result<RawRow>>> {
    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter)
        .trim(Trim::None)
        .flexible(true)
        .from_reader(content.as_bytes());

    let headers = reader
        .headers()
        .map_err(|e| AppError::DecodeError(format!("Failed to read CSV headers: {}", e)))?
        .clone();

    let required = required_width(&headers);

    let rows = reader
        .records()
        .enumerate()
        .map(|(index, record)| {
            let record = record.map_err(|e| AppError::row(index + 2, e.to_string()))?;
            if record.len() < required {
                return Err(AppError::row(
                    index + 2,
                    format!(
                        "expected at least {} fields, found {}",
                        required,
                        record.len()
                    ),
                ));
            }
            Ok(headers.iter().zip(record.iter()).collect::<RawRow>())
        })
        .collect();

    Ok(rows)
}

/// Fields a row needs to cover the last contact column present in `headers`.
fn required_width(headers: &StringRecord) -> usize {
    headers
        .iter()
        .enumerate()
        .filter(|(_, header)| CONTACT_HEADERS.contains(&header.trim().to_lowercase().as_str()))
        .map(|(index, _)| index + 1)
        .max()
        .unwrap_or(0)
}
