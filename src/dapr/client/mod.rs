//! Transport clients for the sidecar's state and secret APIs.
//!
//! Three interchangeable variants implement [`Api`]:
//!
//! - [`HttpClient`]: direct HTTP calls with reqwest;
//! - [`GrpcClient`]: direct calls on the generated Dapr gRPC stub;
//! - [`SdkClient`]: delegates to the higher-level [`crate::sdk::Client`].
//!
//! [`Client`] is the closed set of variants; the process picks one at start
//! with [`Client::connect`] and repositories only ever see the traits.

#[cfg(feature = "grpc")]
mod grpc;
#[cfg(feature = "http")]
mod http;
#[cfg(feature = "grpc")]
mod sdk;

#[cfg(feature = "grpc")]
pub use grpc::GrpcClient;
#[cfg(feature = "http")]
pub use http::{HttpClient, UnexpectedStatus};
#[cfg(feature = "grpc")]
pub use sdk::SdkClient;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::components::{Api, SecretStore, StateItem, StateStore};
use crate::config::{ClientKind, ConfigError, SidecarConfig};
use crate::error::ApiError;

#[derive(Debug, Error)]
pub enum ConnectError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("invalid sidecar address {address:?}: {reason}")]
    InvalidAddress { address: String, reason: String },
    #[cfg(feature = "http")]
    #[error("could not build HTTP client: {0}")]
    Http(#[from] reqwest::Error),
    #[cfg(feature = "grpc")]
    #[error("could not connect to sidecar: {0}")]
    Transport(#[from] tonic::transport::Error),
    #[cfg(feature = "grpc")]
    #[error(transparent)]
    Sdk(#[from] crate::sdk::SdkError),
    #[error("{0:?} client is not compiled into this build")]
    Unsupported(ClientKind),
}

/// The transport client chosen at startup.
#[derive(Debug, Clone)]
pub enum Client {
    #[cfg(feature = "http")]
    Http(HttpClient),
    #[cfg(feature = "grpc")]
    Grpc(GrpcClient),
    #[cfg(feature = "grpc")]
    Sdk(SdkClient),
}

impl Client {
    /// Construct the variant selected by `kind`.
    ///
    /// The gRPC and SDK variants connect eagerly; a sidecar that is not
    /// listening fails here rather than on the first call.
    pub async fn connect(kind: ClientKind, config: &SidecarConfig) -> Result<Self, ConnectError> {
        let client = match kind {
            #[cfg(feature = "http")]
            ClientKind::Http => Client::Http(HttpClient::new(config)?),
            #[cfg(feature = "grpc")]
            ClientKind::Grpc => Client::Grpc(GrpcClient::connect(config).await?),
            #[cfg(feature = "grpc")]
            ClientKind::Sdk => Client::Sdk(SdkClient::connect(config).await?),
            #[allow(unreachable_patterns)]
            other => return Err(ConnectError::Unsupported(other)),
        };
        tracing::info!(name = client.name(), "client initialized");
        Ok(client)
    }
}

#[async_trait]
impl StateStore for Client {
    async fn set_state(&self, store: &str, items: Vec<StateItem>) -> Result<(), ApiError> {
        match self {
            #[cfg(feature = "http")]
            Client::Http(client) => client.set_state(store, items).await,
            #[cfg(feature = "grpc")]
            Client::Grpc(client) => client.set_state(store, items).await,
            #[cfg(feature = "grpc")]
            Client::Sdk(client) => client.set_state(store, items).await,
        }
    }

    async fn get_state<T>(&self, store: &str, key: &str) -> Result<T, ApiError>
    where
        T: DeserializeOwned + Send,
    {
        match self {
            #[cfg(feature = "http")]
            Client::Http(client) => client.get_state(store, key).await,
            #[cfg(feature = "grpc")]
            Client::Grpc(client) => client.get_state(store, key).await,
            #[cfg(feature = "grpc")]
            Client::Sdk(client) => client.get_state(store, key).await,
        }
    }
}

#[async_trait]
impl SecretStore for Client {
    async fn get_secret<T>(&self, store: &str, name: &str) -> Result<T, ApiError>
    where
        T: DeserializeOwned + Send,
    {
        match self {
            #[cfg(feature = "http")]
            Client::Http(client) => client.get_secret(store, name).await,
            #[cfg(feature = "grpc")]
            Client::Grpc(client) => client.get_secret(store, name).await,
            #[cfg(feature = "grpc")]
            Client::Sdk(client) => client.get_secret(store, name).await,
        }
    }
}

impl Api for Client {
    fn name(&self) -> &'static str {
        match self {
            #[cfg(feature = "http")]
            Client::Http(client) => client.name(),
            #[cfg(feature = "grpc")]
            Client::Grpc(client) => client.name(),
            #[cfg(feature = "grpc")]
            Client::Sdk(client) => client.name(),
        }
    }
}

/// Decode a secret's key/value map into `T`.
#[cfg(feature = "grpc")]
pub(crate) fn decode_secret<T: DeserializeOwned>(
    name: &str,
    data: std::collections::HashMap<String, String>,
) -> Result<T, ApiError> {
    if data.is_empty() {
        return Err(ApiError::not_found(format!("secret {name:?} not found")));
    }
    let map: serde_json::Map<String, serde_json::Value> = data
        .into_iter()
        .map(|(k, v)| (k, serde_json::Value::String(v)))
        .collect();
    serde_json::from_value(serde_json::Value::Object(map))
        .map_err(|e| ApiError::internal(e, format!("could not decode secret {name:?}")))
}

/// Decode a state value; empty data means the key does not exist.
#[cfg(feature = "grpc")]
pub(crate) fn decode_state<T: DeserializeOwned>(
    store: &str,
    key: &str,
    data: &[u8],
) -> Result<T, ApiError> {
    if data.is_empty() {
        return Err(ApiError::not_found(format!(
            "key {key:?} not found in state store {store:?}"
        )));
    }
    serde_json::from_slice(data)
        .map_err(|e| ApiError::internal(e, format!("could not decode state for key {key:?}")))
}
