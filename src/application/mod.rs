pub mod use_cases;

pub use use_cases::contact_export::ContactExportUseCase;
pub use use_cases::contact_import::{ContactImportUseCase, ImportSummary, MessageType};
