use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use crate::domain::crm::{METHOD_COMPANY_LIST, METHOD_CONTACT_ADD, METHOD_CONTACT_GET, METHOD_CONTACT_LIST};
use crate::domain::error::{AppError, Result};
use crate::infrastructure::crm_client::{BatchCall, BatchOptions, BatchOutcome, CrmApi};

/// In-memory CRM for use case tests.
#[derive(Default)]
pub(crate) struct FakeCrm {
    contacts: Vec<Value>,
    companies: Vec<Value>,
    failing: HashSet<String>,
    requests: Mutex<usize>,
    added: Mutex<Vec<Value>>,
}

impl FakeCrm {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_contact(mut self, contact: Value) -> Self {
        self.contacts.push(contact);
        self
    }

    pub(crate) fn with_company(mut self, company: Value) -> Self {
        self.companies.push(company);
        self
    }

    /// Batch calls with this label report an error.
    pub(crate) fn failing(mut self, label: &str) -> Self {
        self.failing.insert(label.to_string());
        self
    }

    pub(crate) fn request_count(&self) -> usize {
        *self.requests.lock().unwrap()
    }

    /// `fields` of every successful `crm.contact.add`.
    pub(crate) fn added(&self) -> Vec<Value> {
        self.added.lock().unwrap().clone()
    }

    fn count_request(&self) {
        *self.requests.lock().unwrap() += 1;
    }
}

#[async_trait]
impl CrmApi for FakeCrm {
    async fn call_list_method(&self, method: &str, _params: Value) -> Result<Vec<Value>> {
        self.count_request();
        match method {
            METHOD_CONTACT_LIST => Ok(self
                .contacts
                .iter()
                .map(|contact| json!({"ID": contact["ID"]}))
                .collect()),
            METHOD_COMPANY_LIST => Ok(self.companies.clone()),
            other => Err(AppError::CrmApi(format!("unexpected list method {}", other))),
        }
    }

    async fn batch_api_call(
        &self,
        calls: Vec<BatchCall>,
        _options: BatchOptions,
    ) -> Result<HashMap<String, BatchOutcome>> {
        self.count_request();
        let mut outcomes = HashMap::new();

        for call in calls {
            let outcome = if self.failing.contains(&call.label) {
                BatchOutcome::failed("NOT_FOUND: Not found")
            } else {
                match call.method.as_str() {
                    METHOD_CONTACT_GET => self
                        .contacts
                        .iter()
                        .find(|contact| contact["ID"] == call.params["ID"])
                        .cloned()
                        .map(BatchOutcome::succeeded)
                        .unwrap_or_else(|| BatchOutcome::failed("NOT_FOUND")),
                    METHOD_CONTACT_ADD => {
                        let mut added = self.added.lock().unwrap();
                        added.push(call.params["fields"].clone());
                        BatchOutcome::succeeded(json!(100 + added.len()))
                    }
                    other => BatchOutcome::failed(format!("unexpected method {}", other)),
                }
            };
            outcomes.insert(call.label, outcome);
        }

        Ok(outcomes)
    }
}
