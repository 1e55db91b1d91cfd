use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ApiError;

/// One key/value pair written to a state store.
///
/// A missing etag means no optimistic-concurrency check is requested; it is
/// never sent as an empty string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateItem {
    pub key: String,
    pub value: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,
}

impl StateItem {
    pub fn new<T: Serialize + ?Sized>(key: impl Into<String>, value: &T) -> Result<Self, ApiError> {
        let key = key.into();
        let value = serde_json::to_value(value)
            .map_err(|e| ApiError::internal(e, format!("could not encode state for key {key:?}")))?;
        Ok(Self {
            key,
            value,
            etag: None,
        })
    }

    pub fn with_etag(self, etag: impl Into<String>) -> Self {
        Self {
            etag: Some(etag.into()),
            ..self
        }
    }
}

/// Remote key/value state.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Write all items in one call. Any failure is `INTERNAL_SERVER_ERROR`.
    async fn set_state(&self, store: &str, items: Vec<StateItem>) -> Result<(), ApiError>;

    /// Read and decode one key. A missing or empty value is `NOT_FOUND`.
    async fn get_state<T>(&self, store: &str, key: &str) -> Result<T, ApiError>
    where
        T: DeserializeOwned + Send;
}
