use serde::Serialize;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

use crate::domain::crm::{contact_add_fields, CrmCompany, METHOD_COMPANY_LIST, METHOD_CONTACT_ADD};
use crate::domain::error::{AppError, Result};
use crate::domain::file::UploadedFile;
use crate::infrastructure::crm_client::{BatchCall, BatchOptions, CrmApi};
use crate::infrastructure::formats::{process_uploaded_file, ImporterRegistry};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    Success,
    Warning,
}

/// Outcome of an import, shaped for the UI's message banner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub message_type: MessageType,
    pub message_content: String,
    pub total: usize,
    pub created: usize,
    pub failed: usize,
    pub errors: Vec<String>,
}

impl ImportSummary {
    pub fn no_contacts(file_name: &str) -> Self {
        Self {
            message_type: MessageType::Warning,
            message_content: format!("No contacts with a name were found in {}", file_name),
            total: 0,
            created: 0,
            failed: 0,
            errors: Vec::new(),
        }
    }
}

pub struct ContactImportUseCase {
    crm: Arc<dyn CrmApi>,
    importers: Arc<ImporterRegistry>,
    batch_options: BatchOptions,
}

impl ContactImportUseCase {
    pub fn new(crm: Arc<dyn CrmApi>, importers: Arc<ImporterRegistry>, chunk_size: usize) -> Self {
        Self {
            crm,
            importers,
            batch_options: BatchOptions {
                halt: false,
                chunk_size,
            },
        }
    }

    pub async fn execute(&self, file: &UploadedFile) -> Result<ImportSummary> {
        let contacts = process_uploaded_file(file, &self.importers)?;
        if contacts.is_empty() {
            return Err(AppError::NoContactsExtracted(file.name.clone()));
        }

        let company_ids = self.company_ids().await?;

        let calls: Vec<BatchCall> = contacts
            .iter()
            .enumerate()
            .map(|(index, contact)| {
                let company_id = contact
                    .company_name
                    .as_deref()
                    .and_then(|name| company_ids.get(name))
                    .map(String::as_str);
                BatchCall::new(
                    contact_label(index),
                    METHOD_CONTACT_ADD,
                    json!({"fields": contact_add_fields(contact, company_id)}),
                )
            })
            .collect();

        let outcomes = self.crm.batch_api_call(calls, self.batch_options).await?;

        let mut created = 0;
        let mut errors = Vec::new();
        for index in 0..contacts.len() {
            let label = contact_label(index);
            match outcomes.get(&label) {
                Some(outcome) if outcome.is_ok() => created += 1,
                Some(outcome) => {
                    let error = outcome.error.clone().unwrap_or_default();
                    warn!(label = %label, error = %error, "Contact was not created");
                    errors.push(format!("{}: {}", label, error));
                }
                None => {
                    warn!(label = %label, "Contact add returned no outcome");
                    errors.push(format!("{}: no response", label));
                }
            }
        }

        let total = contacts.len();
        let failed = total - created;
        info!(file_name = %file.name, total, created, failed, "Contacts imported");

        Ok(ImportSummary {
            message_type: if failed == 0 {
                MessageType::Success
            } else {
                MessageType::Warning
            },
            message_content: format!("Imported {} of {} contacts", created, total),
            total,
            created,
            failed,
            errors,
        })
    }

    /// Company title -> ID. The first company wins on duplicate titles.
    async fn company_ids(&self) -> Result<HashMap<String, String>> {
        let companies = self
            .crm
            .call_list_method(METHOD_COMPANY_LIST, json!({"select": ["ID", "TITLE"]}))
            .await?;

        let mut ids = HashMap::new();
        for company in companies
            .into_iter()
            .filter_map(|value| serde_json::from_value::<CrmCompany>(value).ok())
        {
            if let (Some(id), Some(title)) = (company.id, company.title) {
                ids.entry(title).or_insert(id);
            }
        }
        Ok(ids)
    }
}

fn contact_label(index: usize) -> String {
    format!("contact_{}", index + 1)
}
