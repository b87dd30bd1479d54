use std::collections::HashMap;
use std::sync::Arc;

use super::{ContactExporter, ContactImporter};
use crate::domain::error::{AppError, Result};
use crate::domain::file::{CSV_FORMAT, XLSX_FORMAT};
use crate::infrastructure::csv::{CsvExporter, CsvImporter};
use crate::infrastructure::xlsx::{XlsxExporter, XlsxImporter};

/// Key -> implementation map. Keys are case-insensitive.
///
/// Built once at startup and shared read-only afterwards, so lookups need
/// no locking.
pub struct FormatRegistry<T: ?Sized> {
    entries: HashMap<String, Arc<T>>,
}

pub type ExporterRegistry = FormatRegistry<dyn ContactExporter>;
pub type ImporterRegistry = FormatRegistry<dyn ContactImporter>;

impl<T: ?Sized> Default for FormatRegistry<T> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }
}

impl<T: ?Sized> FormatRegistry<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `key` to `implementation`, returning the binding it replaced.
    pub fn register(&mut self, key: &str, implementation: Arc<T>) -> Option<Arc<T>> {
        self.entries.insert(fold_key(key), implementation)
    }

    pub fn resolve(&self, key: &str) -> Result<Arc<T>> {
        self.entries
            .get(&fold_key(key))
            .cloned()
            .ok_or_else(|| AppError::UnsupportedFormat(format!("no handler registered for '{}'", key)))
    }

    /// Registered keys, sorted.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.entries.keys().cloned().collect();
        keys.sort();
        keys
    }
}

fn fold_key(key: &str) -> String {
    key.trim().to_lowercase()
}

pub fn default_exporters() -> ExporterRegistry {
    let mut registry = ExporterRegistry::new();
    registry.register(CSV_FORMAT, Arc::new(CsvExporter::new()));
    registry.register(XLSX_FORMAT, Arc::new(XlsxExporter::new()));
    registry
}

pub fn default_importers() -> ImporterRegistry {
    let mut registry = ImporterRegistry::new();
    registry.register(CSV_FORMAT, Arc::new(CsvImporter::new()));
    registry.register(XLSX_FORMAT, Arc::new(XlsxImporter::new()));
    registry
}
