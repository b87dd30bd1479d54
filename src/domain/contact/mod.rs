// ============================================================
// CONTACT DOMAIN LAYER
// ============================================================
// Tabular contact shapes shared by the exporters and importers
// No I/O, no async

mod company_name;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub use company_name::normalize_company_name;

/// Localized column headers, in file column order.
pub const COLUMN_NAME: &str = "имя";
pub const COLUMN_LAST_NAME: &str = "фамилия";
pub const COLUMN_PHONE: &str = "номер телефона";
pub const COLUMN_EMAIL: &str = "почта";
pub const COLUMN_COMPANY: &str = "компания";

pub const CONTACT_HEADERS: [&str; 5] = [
    COLUMN_NAME,
    COLUMN_LAST_NAME,
    COLUMN_PHONE,
    COLUMN_EMAIL,
    COLUMN_COMPANY,
];

/// One file row keyed by header, exactly as read.
///
/// Headers are trimmed and lower-cased on insertion so both readers match
/// the localized column names the same way.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRow {
    values: HashMap<String, String>,
}

impl RawRow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, header: &str, value: impl Into<String>) {
        self.values
            .insert(header.trim().to_lowercase(), value.into());
    }

    /// Value under `header`, or `""` when the column is missing.
    pub fn get(&self, header: &str) -> &str {
        self.values.get(header).map(String::as_str).unwrap_or("")
    }

    /// A row is usable when it has a first or a last name.
    pub fn is_valid(&self) -> bool {
        !self.get(COLUMN_NAME).trim().is_empty() || !self.get(COLUMN_LAST_NAME).trim().is_empty()
    }
}

impl<H: AsRef<str>, V: Into<String>> FromIterator<(H, V)> for RawRow {
    fn from_iter<I: IntoIterator<Item = (H, V)>>(iter: I) -> Self {
        let mut row = RawRow::new();
        for (header, value) in iter {
            row.insert(header.as_ref(), value);
        }
        row
    }
}

/// Canonical contact produced by an import.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct NormalizedContact {
    pub name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub company_name: Option<String>,
}

impl NormalizedContact {
    /// Validates and normalizes a raw row. Returns `None` for rows without
    /// any name; those are filtered, not reported.
    pub fn from_raw_row(row: &RawRow) -> Option<Self> {
        if !row.is_valid() {
            return None;
        }

        Some(Self {
            name: non_empty(row.get(COLUMN_NAME)),
            last_name: non_empty(row.get(COLUMN_LAST_NAME)),
            phone: non_empty(row.get(COLUMN_PHONE)),
            email: non_empty(row.get(COLUMN_EMAIL)),
            company_name: non_empty(row.get(COLUMN_COMPANY))
                .map(|company| normalize_company_name(&company)),
        })
    }
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Flat contact handed to an exporter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct ExportRecord {
    pub id: String,
    pub name: String,
    pub last_name: String,
    pub phone: String,
    pub email: String,
    pub company: String,
}

impl ExportRecord {
    /// Cell values in `CONTACT_HEADERS` order. The ID is not exported.
    pub fn cells(&self) -> [&str; 5] {
        [
            &self.name,
            &self.last_name,
            &self.phone,
            &self.email,
            &self.company,
        ]
    }
}
