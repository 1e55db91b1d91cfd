use async_trait::async_trait;
use serde::de::DeserializeOwned;

use super::{decode_secret, decode_state, ConnectError};
use crate::components::{Api, SecretStore, StateItem, StateStore};
use crate::config::SidecarConfig;
use crate::error::ApiError;
use crate::sdk;

/// Client variant that goes through the SDK layer.
#[derive(Debug, Clone)]
pub struct SdkClient {
    inner: sdk::Client,
}

impl SdkClient {
    pub async fn connect(config: &SidecarConfig) -> Result<Self, ConnectError> {
        Ok(Self::new(sdk::Client::connect(config).await?))
    }

    pub fn new(inner: sdk::Client) -> Self {
        Self { inner }
    }
}

fn to_sdk(item: StateItem) -> Result<sdk::SetStateItem, ApiError> {
    let value = serde_json::to_vec(&item.value).map_err(|e| {
        ApiError::internal(e, format!("could not encode state for key {:?}", item.key))
    })?;
    Ok(sdk::SetStateItem {
        key: item.key,
        value,
        etag: item.etag,
        ..Default::default()
    })
}

#[async_trait]
impl StateStore for SdkClient {
    async fn set_state(&self, store: &str, items: Vec<StateItem>) -> Result<(), ApiError> {
        let items = items
            .into_iter()
            .map(to_sdk)
            .collect::<Result<Vec<_>, _>>()?;
        self.inner
            .save_bulk_state(store, items)
            .await
            .map_err(|e| ApiError::internal(e, format!("could not save state to {store:?}")))
    }

    async fn get_state<T>(&self, store: &str, key: &str) -> Result<T, ApiError>
    where
        T: DeserializeOwned + Send,
    {
        let item = self
            .inner
            .get_state(store, key)
            .await
            .map_err(|e| ApiError::internal(e, format!("could not get state {key:?}")))?;
        decode_state(store, key, &item.value)
    }
}

#[async_trait]
impl SecretStore for SdkClient {
    async fn get_secret<T>(&self, store: &str, name: &str) -> Result<T, ApiError>
    where
        T: DeserializeOwned + Send,
    {
        let data = self
            .inner
            .get_secret(store, name)
            .await
            .map_err(|e| ApiError::internal(e, format!("could not get secret {name:?}")))?;
        decode_secret(name, data)
    }
}

impl Api for SdkClient {
    fn name(&self) -> &'static str {
        "Rust SDK"
    }
}
