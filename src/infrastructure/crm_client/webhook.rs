use async_trait::async_trait;
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use url::form_urlencoded;
use url::Url;

use super::{BatchCall, BatchOptions, BatchOutcome, CrmApi, MAX_BATCH_SIZE};
use crate::domain::error::{AppError, Result};

/// REST client for a CRM inbound webhook (`https://host/rest/<user>/<token>/`).
pub struct WebhookCrmClient {
    client: reqwest::Client,
    base_url: Url,
}

impl WebhookCrmClient {
    pub fn new(webhook_url: &str) -> Result<Self> {
        let mut base_url = Url::parse(webhook_url)
            .map_err(|e| AppError::Config(format!("Invalid webhook URL: {}", e)))?;

        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Ok(Self {
            client: reqwest::Client::new(),
            base_url,
        })
    }

    async fn post(&self, method: &str, body: &Value) -> Result<Value> {
        let url = self
            .base_url
            .join(&format!("{}.json", method))
            .map_err(|e| AppError::CrmApi(format!("Invalid method name {}: {}", method, e)))?;

        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| AppError::CrmApi(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(AppError::CrmApi(format!(
                "{} returned {}: {}",
                method, status, text
            )));
        }

        let json: Value = response
            .json()
            .await
            .map_err(|e| AppError::CrmApi(format!("Failed to parse JSON: {}", e)))?;

        if let Some(error) = json.get("error") {
            return Err(AppError::CrmApi(format!(
                "{} failed: {}",
                method,
                describe_error(error, json.get("error_description"))
            )));
        }

        Ok(json)
    }
}

#[async_trait]
impl CrmApi for WebhookCrmClient {
    async fn call_list_method(&self, method: &str, params: Value) -> Result<Vec<Value>> {
        let mut items = Vec::new();
        let mut start = 0u64;

        loop {
            let mut body = match params.clone() {
                Value::Object(map) => map,
                _ => Map::new(),
            };
            body.insert("start".to_string(), json!(start));

            let page = self.post(method, &Value::Object(body)).await?;

            match page.get("result") {
                Some(Value::Array(records)) => items.extend(records.iter().cloned()),
                _ => {
                    return Err(AppError::CrmApi(format!(
                        "{} returned no result list",
                        method
                    )))
                }
            }

            match page.get("next").and_then(Value::as_u64) {
                Some(next) if next > start => start = next,
                _ => break,
            }
        }

        tracing::debug!(method, count = items.len(), "Listed CRM records");
        Ok(items)
    }

    async fn batch_api_call(
        &self,
        calls: Vec<BatchCall>,
        options: BatchOptions,
    ) -> Result<HashMap<String, BatchOutcome>> {
        let chunk_size = options.chunk_size.clamp(1, MAX_BATCH_SIZE);
        let mut outcomes = HashMap::with_capacity(calls.len());

        for chunk in calls.chunks(chunk_size) {
            let cmd: Map<String, Value> = chunk
                .iter()
                .map(|call| {
                    let command = format!("{}?{}", call.method, build_query(&call.params));
                    (call.label.clone(), Value::String(command))
                })
                .collect();

            let body = json!({
                "halt": if options.halt { 1 } else { 0 },
                "cmd": cmd,
            });

            let response = self.post("batch", &body).await?;
            let payload = &response["result"];
            let results = payload.get("result").and_then(Value::as_object);
            let errors = payload.get("result_error").and_then(Value::as_object);

            let mut chunk_failed = false;
            for call in chunk {
                let error = errors
                    .and_then(|errors| errors.get(&call.label))
                    .map(|error| describe_error(error, None));
                let result = results.and_then(|results| results.get(&call.label));

                let outcome = match (result, error) {
                    (_, Some(error)) => {
                        chunk_failed = true;
                        BatchOutcome::failed(error)
                    }
                    (Some(result), None) => BatchOutcome::succeeded(result.clone()),
                    (None, None) => BatchOutcome::failed("call was not executed"),
                };
                outcomes.insert(call.label.clone(), outcome);
            }

            if options.halt && chunk_failed {
                tracing::warn!("Batch halted after a failed call");
                break;
            }
        }

        Ok(outcomes)
    }
}

fn describe_error(error: &Value, description: Option<&Value>) -> String {
    match (error, description.and_then(Value::as_str)) {
        (Value::String(code), Some(description)) => format!("{}: {}", code, description),
        (Value::String(code), None) => code.clone(),
        (Value::Object(fields), _) => {
            let code = fields.get("error").and_then(Value::as_str).unwrap_or("error");
            match fields.get("error_description").and_then(Value::as_str) {
                Some(description) if !description.is_empty() => {
                    format!("{}: {}", code, description)
                }
                _ => code.to_string(),
            }
        }
        (other, _) => other.to_string(),
    }
}

/// PHP-style nested query string: `fields[PHONE][0][VALUE]=...`.
/// Nulls are omitted, booleans become 1/0.
pub fn build_query(params: &Value) -> String {
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    append_pairs(&mut serializer, "", params);
    serializer.finish()
}

fn append_pairs(serializer: &mut form_urlencoded::Serializer<'_, String>, prefix: &str, value: &Value) {
    let nested = |key: &str| {
        if prefix.is_empty() {
            key.to_string()
        } else {
            format!("{}[{}]", prefix, key)
        }
    };

    match value {
        Value::Object(map) => {
            for (key, value) in map {
                append_pairs(serializer, &nested(key), value);
            }
        }
        Value::Array(items) => {
            for (index, value) in items.iter().enumerate() {
                append_pairs(serializer, &nested(&index.to_string()), value);
            }
        }
        Value::String(text) => {
            serializer.append_pair(prefix, text);
        }
        Value::Number(number) => {
            serializer.append_pair(prefix, &number.to_string());
        }
        Value::Bool(flag) => {
            serializer.append_pair(prefix, if *flag { "1" } else { "0" });
        }
        Value::Null => {}
    }
}
