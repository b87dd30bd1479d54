// ============================================================
// CSV INFRASTRUCTURE LAYER
// ============================================================
// UTF-16 delimited-text import and export of contacts

mod csv_parser;
mod csv_writer;

pub use csv_parser::{decode_utf16, detect_delimiter, CsvImporter};
pub use csv_writer::{encode_utf16, CsvExporter, CSV_CONTENT_TYPE, CSV_FILE_NAME};
