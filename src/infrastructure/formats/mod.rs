// ============================================================
// FILE FORMATS
// ============================================================
// Exporter/importer capabilities and the shared row pipeline

mod registry;

use tracing::{error, info, warn};

use crate::domain::contact::{ExportRecord, NormalizedContact, RawRow};
use crate::domain::error::Result;
use crate::domain::file::{ExportFile, UploadedFile};

pub use registry::{
    default_exporters, default_importers, ExporterRegistry, FormatRegistry, ImporterRegistry,
};

/// Renders export records into a downloadable file.
pub trait ContactExporter: Send + Sync {
    fn export(&self, records: &[ExportRecord]) -> Result<ExportFile>;
}

/// Parses an uploaded file into normalized contacts.
pub trait ContactImporter: Send + Sync {
    fn import(&self, file: &UploadedFile) -> Result<Vec<NormalizedContact>>;
}

/// What an importer does with a row it cannot convert.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RowErrorPolicy {
    /// Log the row and keep going; the import returns the remaining rows.
    #[default]
    SkipRow,
    /// Fail the whole import with the row's error.
    AbortImport,
}

/// Validates and normalizes raw rows, applying `policy` to rows that
/// failed to convert. Rows without a name are filtered silently.
pub fn collect_contacts<I>(
    rows: I,
    policy: RowErrorPolicy,
    source: &str,
) -> Result<Vec<NormalizedContact>>
where
    I: IntoIterator<Item = Result<RawRow>>,
{
    let mut contacts = Vec::new();
    let mut skipped = 0usize;
    let mut dropped = 0usize;

    for row in rows {
        match row {
            Ok(raw) => match NormalizedContact::from_raw_row(&raw) {
                Some(contact) => contacts.push(contact),
                None => dropped += 1,
            },
            Err(err) => match policy {
                RowErrorPolicy::SkipRow => {
                    warn!(source, error = %err, "Skipping unreadable row");
                    skipped += 1;
                }
                RowErrorPolicy::AbortImport => {
                    error!(source, error = %err, "Aborting import on unreadable row");
                    return Err(err);
                }
            },
        }
    }

    info!(
        source,
        contacts = contacts.len(),
        skipped,
        dropped,
        "Rows processed"
    );

    Ok(contacts)
}

/// Picks the importer from the file extension and runs it.
pub fn process_uploaded_file(
    file: &UploadedFile,
    importers: &ImporterRegistry,
) -> Result<Vec<NormalizedContact>> {
    let format = file.format()?;
    let importer = importers.resolve(format)?;
    importer.import(file)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::error::AppError;

    fn named(name: &str) -> Result<RawRow> {
        Ok([("имя", name)].into_iter().collect())
    }

    fn rows() -> Vec<Result<RawRow>> {
        vec![
            named("Анна"),
            Err(AppError::row(3, "broken")),
            named(""),
            named("Борис"),
        ]
    }

    #[test]
    fn test_skip_policy_keeps_remaining_rows() {
        let contacts = collect_contacts(rows(), RowErrorPolicy::SkipRow, "test").unwrap();
        let names: Vec<_> = contacts.iter().map(|c| c.name.as_deref()).collect();
        assert_eq!(names, vec![Some("Анна"), Some("Борис")]);
    }

    #[test]
    fn test_abort_policy_fails_whole_import() {
        let err = collect_contacts(rows(), RowErrorPolicy::AbortImport, "test").unwrap_err();
        assert!(matches!(err, AppError::RowConversionError { row: 3, .. }));
    }

    #[test]
    fn test_unknown_extension_fails_before_reading() {
        let file = UploadedFile::new("contacts.pdf", vec![0xFF; 4]);
        let err = process_uploaded_file(&file, &default_importers()).unwrap_err();
        assert!(matches!(err, AppError::UnsupportedFormat(_)));
    }
}
