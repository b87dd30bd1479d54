use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

use crate::domain::contact::ExportRecord;
use crate::domain::crm::{
    CrmCompany, CrmContact, METHOD_COMPANY_LIST, METHOD_CONTACT_GET, METHOD_CONTACT_LIST,
};
use crate::domain::error::Result;
use crate::domain::file::ExportFile;
use crate::infrastructure::crm_client::{BatchCall, BatchOptions, BatchOutcome, CrmApi};
use crate::infrastructure::formats::ExporterRegistry;

pub struct ContactExportUseCase {
    crm: Arc<dyn CrmApi>,
    exporters: Arc<ExporterRegistry>,
    batch_options: BatchOptions,
}

impl ContactExportUseCase {
    pub fn new(crm: Arc<dyn CrmApi>, exporters: Arc<ExporterRegistry>, chunk_size: usize) -> Self {
        Self {
            crm,
            exporters,
            batch_options: BatchOptions {
                halt: false,
                chunk_size,
            },
        }
    }

    pub async fn execute(&self, format: &str) -> Result<ExportFile> {
        // Unknown formats fail before any CRM traffic.
        let exporter = self.exporters.resolve(format)?;

        let records = self.fetch_records().await?;
        let file = exporter.export(&records)?;

        info!(
            format,
            records = records.len(),
            file_name = %file.file_name,
            "Contacts exported"
        );
        Ok(file)
    }

    /// Loads every contact and flattens it, in listing order. Contacts whose
    /// individual fetch failed are logged and left out.
    pub async fn fetch_records(&self) -> Result<Vec<ExportRecord>> {
        let listed = self
            .crm
            .call_list_method(METHOD_CONTACT_LIST, json!({"select": ["ID"]}))
            .await?;

        let contact_ids: Vec<String> = listed
            .into_iter()
            .filter_map(|value| serde_json::from_value::<CrmContact>(value).ok()?.id)
            .collect();

        let calls = contact_ids
            .iter()
            .map(|id| BatchCall::new(contact_label(id), METHOD_CONTACT_GET, json!({"ID": id})))
            .collect();
        let outcomes = self.crm.batch_api_call(calls, self.batch_options).await?;

        let companies = self.company_titles().await?;
        info!(
            contacts = contact_ids.len(),
            companies = companies.len(),
            "Loaded CRM data for export"
        );

        let mut records = Vec::with_capacity(contact_ids.len());
        for id in &contact_ids {
            match outcomes.get(&contact_label(id)) {
                Some(BatchOutcome {
                    result: Some(result),
                    error: None,
                }) => match serde_json::from_value::<CrmContact>(result.clone()) {
                    Ok(contact) => records.push(contact.to_export_record(&companies)),
                    Err(e) => warn!(contact_id = %id, error = %e, "Unexpected contact payload"),
                },
                Some(BatchOutcome {
                    error: Some(error), ..
                }) => warn!(contact_id = %id, error = %error, "Skipping contact that failed to load"),
                _ => warn!(contact_id = %id, "No result for contact"),
            }
        }

        Ok(records)
    }

    /// Company ID -> title.
    async fn company_titles(&self) -> Result<HashMap<String, String>> {
        let companies = self
            .crm
            .call_list_method(METHOD_COMPANY_LIST, json!({"select": ["ID", "TITLE"]}))
            .await?;

        Ok(companies
            .into_iter()
            .filter_map(|value| serde_json::from_value::<CrmCompany>(value).ok())
            .filter_map(|company| Some((company.id?, company.title.unwrap_or_default())))
            .collect())
    }
}

fn contact_label(id: &str) -> String {
    format!("contact_{}", id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::use_cases::fake_crm::FakeCrm;
    use crate::domain::error::AppError;
    use crate::infrastructure::csv::decode_utf16;
    use crate::infrastructure::formats::default_exporters;
    use pretty_assertions::assert_eq;

    fn use_case(crm: FakeCrm) -> ContactExportUseCase {
        ContactExportUseCase::new(Arc::new(crm), Arc::new(default_exporters()), 50)
    }

    fn crm() -> FakeCrm {
        FakeCrm::new()
            .with_contact(json!({
                "ID": "1", "NAME": "Иван", "LAST_NAME": "Петров",
                "PHONE": [{"VALUE": "+79000000000", "VALUE_TYPE": "WORK"}],
                "COMPANY_ID": "10"
            }))
            .with_contact(json!({"ID": "2", "NAME": "Сломанный"}))
            .with_contact(json!({
                "ID": "3", "NAME": null, "LAST_NAME": "Сидорова",
                "EMAIL": [{"VALUE": "s@example.com", "VALUE_TYPE": "HOME"}]
            }))
            .with_company(json!({"ID": "10", "TITLE": "ООО \"Ромашка\""}))
            .failing("contact_2")
    }

    #[tokio::test]
    async fn test_fetch_records_skips_failed_calls() {
        let records = use_case(crm()).fetch_records().await.unwrap();

        assert_eq!(
            records,
            vec![
                ExportRecord {
                    id: "1".to_string(),
                    name: "Иван".to_string(),
                    last_name: "Петров".to_string(),
                    phone: "+79000000000".to_string(),
                    email: String::new(),
                    company: "ООО \"Ромашка\"".to_string(),
                },
                ExportRecord {
                    id: "3".to_string(),
                    name: String::new(),
                    last_name: "Сидорова".to_string(),
                    phone: String::new(),
                    email: "s@example.com".to_string(),
                    company: String::new(),
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_execute_renders_csv() {
        let file = use_case(crm()).execute("CSV").await.unwrap();
        let text = decode_utf16(&file.bytes).unwrap();

        assert_eq!(file.file_name, "contact_export.csv");
        assert_eq!(text.lines().count(), 3);
        assert!(text.contains("Иван,Петров,+79000000000,,\"ООО \"\"Ромашка\"\"\""));
    }

    #[tokio::test]
    async fn test_unknown_format_fails_before_crm_calls() {
        let crm = Arc::new(crm());
        let use_case = ContactExportUseCase::new(crm.clone(), Arc::new(default_exporters()), 50);

        let err = use_case.execute("pdf").await.unwrap_err();

        assert!(matches!(err, AppError::UnsupportedFormat(_)));
        assert_eq!(crm.request_count(), 0);
    }
}
