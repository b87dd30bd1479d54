use std::io::Cursor;

use calamine::{open_workbook_auto_from_rs, Data, Range, Reader};

use crate::domain::contact::{NormalizedContact, RawRow};
use crate::domain::error::{AppError, Result};
use crate::domain::file::UploadedFile;
use crate::infrastructure::formats::{collect_contacts, ContactImporter, RowErrorPolicy};

/// Spreadsheet contact importer (xlsx, xls).
pub struct XlsxImporter {
    policy: RowErrorPolicy,
}

impl Default for XlsxImporter {
    fn default() -> Self {
        Self {
            policy: RowErrorPolicy::AbortImport,
        }
    }
}

impl XlsxImporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(mut self, policy: RowErrorPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn parse_range(&self, range: &Range<Data>) -> Result<Vec<NormalizedContact>> {
        let rows = rows_from_range(range)?;
        collect_contacts(rows, self.policy, "xlsx")
    }
}

impl ContactImporter for XlsxImporter {
    fn import(&self, file: &UploadedFile) -> Result<Vec<NormalizedContact>> {
        let range = read_first_worksheet(&file.bytes).map_err(|e| {
            tracing::error!(file_name = %file.name, error = %e, "Failed to open workbook");
            e
        })?;
        self.parse_range(&range)
    }
}

fn read_first_worksheet(bytes: &[u8]) -> Result<Range<Data>> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))
        .map_err(|e| AppError::DecodeError(format!("Failed to open workbook: {}", e)))?;

    workbook
        .worksheet_range_at(0)
        .ok_or_else(|| AppError::DecodeError("No worksheet found".to_string()))?
        .map_err(|e| AppError::DecodeError(format!("Failed to read worksheet: {}", e)))
}

/// Row 1 holds headers; every later row up to the last used one becomes a
/// `RawRow`. Positions are absolute, so a sheet whose data starts below or
/// right of A1 still lines up with its headers.
fn rows_from_range(range: &Range<Data>) -> Result<Vec<Result<RawRow>>> {
    let Some((last_row, last_col)) = range.end() else {
        return Ok(Vec::new());
    };

    let headers = (0..=last_col)
        .map(|col| {
            cell_text(range, 0, col)
                .map(|header| header.trim().to_lowercase())
                .map_err(|reason| AppError::row(1, reason))
        })
        .collect::<Result<Vec<String>>>()?;

    let rows = (1..=last_row)
        .map(|row| {
            let mut raw = RawRow::new();
            for (col, header) in (0..).zip(&headers) {
                let value = cell_text(range, row, col)
                    .map_err(|reason| AppError::row(row as usize + 1, reason))?;
                raw.insert(header, value);
            }
            Ok(raw)
        })
        .collect();

    Ok(rows)
}

fn cell_text(range: &Range<Data>, row: u32, col: u32) -> std::result::Result<String, String> {
    match range.get_value((row, col)) {
        None | Some(Data::Empty) => Ok(String::new()),
        Some(Data::String(text)) | Some(Data::DateTimeIso(text)) | Some(Data::DurationIso(text)) => {
            Ok(text.clone())
        }
        Some(Data::Error(error)) => Err(format!(
            "cell {} holds error value {}",
            cell_reference(row, col),
            error
        )),
        Some(other) => Ok(other.to_string()),
    }
}

/// A1-style reference for log and error messages.
fn cell_reference(row: u32, col: u32) -> String {
    let mut letters = Vec::new();
    let mut n = col + 1;
    while n > 0 {
        let rem = ((n - 1) % 26) as u8;
        letters.push((b'A' + rem) as char);
        n = (n - 1) / 26;
    }
    letters.iter().rev().collect::<String>() + &(row + 1).to_string()
}
