pub mod webhook;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;

use crate::domain::error::Result;

pub use webhook::WebhookCrmClient;

/// The CRM rejects batches larger than this.
pub const MAX_BATCH_SIZE: usize = 50;

/// One logical call inside a batch.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchCall {
    pub label: String,
    pub method: String,
    pub params: Value,
}

impl BatchCall {
    pub fn new(label: impl Into<String>, method: impl Into<String>, params: Value) -> Self {
        Self {
            label: label.into(),
            method: method.into(),
            params,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchOptions {
    /// Stop after the first chunk that reports an error
    pub halt: bool,
    /// Calls per batch request, clamped to `1..=MAX_BATCH_SIZE`
    pub chunk_size: usize,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            halt: false,
            chunk_size: MAX_BATCH_SIZE,
        }
    }
}

/// Per-call result of a batch. Exactly one of the fields is set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchOutcome {
    pub result: Option<Value>,
    pub error: Option<String>,
}

impl BatchOutcome {
    pub fn succeeded(result: Value) -> Self {
        Self {
            result: Some(result),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            result: None,
            error: Some(error.into()),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Remote CRM operations the use cases depend on.
#[async_trait]
pub trait CrmApi: Send + Sync {
    /// Every record of a list method, following pagination to the end.
    async fn call_list_method(&self, method: &str, params: Value) -> Result<Vec<Value>>;

    /// Runs `calls` in chunks; one failing call does not fail the others.
    async fn batch_api_call(
        &self,
        calls: Vec<BatchCall>,
        options: BatchOptions,
    ) -> Result<HashMap<String, BatchOutcome>>;
}
