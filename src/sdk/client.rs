//! The host SDK's sidecar client.
//!
//! This is the object the SDK-mediated transport delegates to, the way an
//! application would use a Dapr SDK client: typed responses that keep the
//! etag, bulk writes, and the `DAPR_API_TOKEN` sent as `dapr-api-token` on
//! every call. The direct gRPC client speaks the same stubs but exposes only
//! the raw capability set.

use std::collections::HashMap;

use tonic::metadata::AsciiMetadataValue;
use tonic::transport::{Channel, Endpoint};

use super::SdkError;
use crate::config::SidecarConfig;
use crate::context::outbound_request;
use crate::dapr::proto::{
    self, DaprClient, Etag, GetSecretRequest, GetStateRequest, SaveStateRequest, StateConsistency,
};

const API_TOKEN_METADATA: &str = "dapr-api-token";

/// A state value as read from the store. An absent key reads as empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StateResponse {
    pub key: String,
    pub value: Vec<u8>,
    pub etag: Option<String>,
}

/// A state value to write.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SetStateItem {
    pub key: String,
    pub value: Vec<u8>,
    pub etag: Option<String>,
    pub metadata: HashMap<String, String>,
}

/// Typed client for the sidecar's gRPC API.
#[derive(Debug, Clone)]
pub struct Client {
    stub: DaprClient<Channel>,
    api_token: Option<AsciiMetadataValue>,
}

impl Client {
    pub async fn connect(config: &SidecarConfig) -> Result<Self, SdkError> {
        let channel = Endpoint::from_shared(config.grpc_endpoint()?)?
            .connect()
            .await?;
        let client = Self::with_channel(channel);
        match config.api_token() {
            Some(token) => client.with_api_token(token),
            None => Ok(client),
        }
    }

    pub fn with_channel(channel: Channel) -> Self {
        Self {
            stub: DaprClient::new(channel),
            api_token: None,
        }
    }

    /// Send `token` as `dapr-api-token` on every call.
    pub fn with_api_token(self, token: &str) -> Result<Self, SdkError> {
        let token = AsciiMetadataValue::try_from(token).map_err(|_| SdkError::InvalidApiToken)?;
        Ok(Self {
            api_token: Some(token),
            ..self
        })
    }

    fn request<T>(&self, message: T) -> tonic::Request<T> {
        let mut request = outbound_request(message, None);
        if let Some(token) = &self.api_token {
            request
                .metadata_mut()
                .insert(API_TOKEN_METADATA, token.clone());
        }
        request
    }

    /// Read `key` with strong consistency.
    pub async fn get_state(&self, store: &str, key: &str) -> Result<StateResponse, SdkError> {
        let response = self
            .stub
            .clone()
            .get_state(self.request(GetStateRequest {
                store_name: store.to_string(),
                key: key.to_string(),
                consistency: StateConsistency::ConsistencyStrong as i32,
                ..Default::default()
            }))
            .await?
            .into_inner();

        Ok(StateResponse {
            key: key.to_string(),
            value: response.data,
            etag: Some(response.etag).filter(|etag| !etag.is_empty()),
        })
    }

    /// Write all items in one call.
    pub async fn save_bulk_state(&self, store: &str, items: Vec<SetStateItem>) -> Result<(), SdkError> {
        let states = items
            .into_iter()
            .map(|item| proto::StateItem {
                key: item.key,
                value: item.value,
                etag: item.etag.map(|value| Etag { value }),
                metadata: item.metadata,
                options: None,
            })
            .collect();

        self.stub
            .clone()
            .save_state(self.request(SaveStateRequest {
                store_name: store.to_string(),
                states,
            }))
            .await?;
        Ok(())
    }

    /// Read a secret's key/value map. A missing secret reads as empty.
    pub async fn get_secret(&self, store: &str, key: &str) -> Result<HashMap<String, String>, SdkError> {
        let response = self
            .stub
            .clone()
            .get_secret(self.request(GetSecretRequest {
                store_name: store.to_string(),
                key: key.to_string(),
                ..Default::default()
            }))
            .await?
            .into_inner();
        Ok(response.data)
    }
}
