use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{json, Map, Value};
use std::collections::HashMap;

use crate::domain::contact::{ExportRecord, NormalizedContact};

pub const METHOD_CONTACT_LIST: &str = "crm.contact.list";
pub const METHOD_CONTACT_GET: &str = "crm.contact.get";
pub const METHOD_CONTACT_ADD: &str = "crm.contact.add";
pub const METHOD_COMPANY_LIST: &str = "crm.company.list";

/// Value type attached to phones and emails created by an import.
pub const WORK_VALUE_TYPE: &str = "WORK";

/// One entry of a multi-valued CRM field such as PHONE or EMAIL.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultiField {
    #[serde(rename = "VALUE", default)]
    pub value: String,
    #[serde(rename = "VALUE_TYPE", default)]
    pub value_type: Option<String>,
}

impl MultiField {
    pub fn work(value: &str) -> Self {
        Self {
            value: value.to_string(),
            value_type: Some(WORK_VALUE_TYPE.to_string()),
        }
    }
}

/// Contact as returned by `crm.contact.get`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CrmContact {
    #[serde(rename = "ID", default, deserialize_with = "optional_id")]
    pub id: Option<String>,
    #[serde(rename = "NAME", default)]
    pub name: Option<String>,
    #[serde(rename = "LAST_NAME", default)]
    pub last_name: Option<String>,
    #[serde(rename = "PHONE", default)]
    pub phone: Option<Vec<MultiField>>,
    #[serde(rename = "EMAIL", default)]
    pub email: Option<Vec<MultiField>>,
    #[serde(rename = "COMPANY_ID", default, deserialize_with = "optional_id")]
    pub company_id: Option<String>,
}

impl CrmContact {
    /// CRM reports "no company" as null, "" or "0".
    pub fn company_key(&self) -> Option<&str> {
        self.company_id
            .as_deref()
            .filter(|id| !id.is_empty() && *id != "0")
    }

    /// Flattens the contact: first phone, first email, company title
    /// looked up in `companies` (ID -> TITLE).
    pub fn to_export_record(&self, companies: &HashMap<String, String>) -> ExportRecord {
        let company = match self.company_key() {
            Some(company_id) => match companies.get(company_id) {
                Some(title) => title.clone(),
                None => {
                    tracing::warn!(
                        contact_id = self.id.as_deref().unwrap_or_default(),
                        company_id,
                        "Contact references unknown company"
                    );
                    String::new()
                }
            },
            None => String::new(),
        };

        ExportRecord {
            id: self.id.clone().unwrap_or_default(),
            name: self.name.clone().unwrap_or_default(),
            last_name: self.last_name.clone().unwrap_or_default(),
            phone: first_value(&self.phone),
            email: first_value(&self.email),
            company,
        }
    }
}

fn first_value(field: &Option<Vec<MultiField>>) -> String {
    field
        .as_ref()
        .and_then(|values| values.first())
        .map(|entry| entry.value.clone())
        .unwrap_or_default()
}

/// Company as returned by `crm.company.list` with `select: [ID, TITLE]`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CrmCompany {
    #[serde(rename = "ID", default, deserialize_with = "optional_id")]
    pub id: Option<String>,
    #[serde(rename = "TITLE", default)]
    pub title: Option<String>,
}

/// `fields` payload for `crm.contact.add`. Absent values are omitted.
pub fn contact_add_fields(contact: &NormalizedContact, company_id: Option<&str>) -> Value {
    let mut fields = Map::new();

    if let Some(name) = &contact.name {
        fields.insert("NAME".to_string(), json!(name));
    }
    if let Some(last_name) = &contact.last_name {
        fields.insert("LAST_NAME".to_string(), json!(last_name));
    }
    if let Some(phone) = &contact.phone {
        fields.insert("PHONE".to_string(), json!([MultiField::work(phone)]));
    }
    if let Some(email) = &contact.email {
        fields.insert("EMAIL".to_string(), json!([MultiField::work(email)]));
    }
    if let Some(company_id) = company_id {
        fields.insert("COMPANY_ID".to_string(), json!(company_id));
    }

    Value::Object(fields)
}

fn optional_id<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(id)) => Some(id),
        Some(Value::Number(id)) => Some(id.to_string()),
        _ => None,
    })
}
