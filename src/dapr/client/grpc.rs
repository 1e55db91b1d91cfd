use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tonic::service::interceptor::InterceptedService;
use tonic::transport::{Channel, Endpoint};

use super::{decode_secret, decode_state, ConnectError};
use crate::components::{Api, SecretStore, StateItem, StateStore};
use crate::config::SidecarConfig;
use crate::context::PropagateMetadata;
use crate::dapr::proto::{
    self, DaprClient, GetSecretRequest, GetStateRequest, SaveStateRequest, StateConsistency,
};
use crate::error::ApiError;

type Stub = DaprClient<InterceptedService<Channel, PropagateMetadata>>;

/// Direct gRPC client for the sidecar API.
///
/// The channel is opened once at construction. Every call carries the
/// metadata of the inbound request being handled.
#[derive(Debug, Clone)]
pub struct GrpcClient {
    stub: Stub,
}

impl GrpcClient {
    /// Connect to the sidecar's gRPC port; fails when `DAPR_GRPC_PORT` was
    /// not configured or the sidecar is not listening.
    pub async fn connect(config: &SidecarConfig) -> Result<Self, ConnectError> {
        let address = config.grpc_endpoint()?;
        let channel = Endpoint::from_shared(address)?.connect().await?;
        Ok(Self::with_channel(channel))
    }

    /// Build a client over an already open channel.
    pub fn with_channel(channel: Channel) -> Self {
        Self {
            stub: DaprClient::with_interceptor(channel, PropagateMetadata),
        }
    }
}

fn to_proto(item: StateItem) -> Result<proto::StateItem, ApiError> {
    let value = serde_json::to_vec(&item.value).map_err(|e| {
        ApiError::internal(e, format!("could not encode state for key {:?}", item.key))
    })?;
    Ok(proto::StateItem {
        key: item.key,
        value,
        etag: item.etag.map(|value| proto::Etag { value }),
        ..Default::default()
    })
}

#[async_trait]
impl StateStore for GrpcClient {
    async fn set_state(&self, store: &str, items: Vec<StateItem>) -> Result<(), ApiError> {
        let states = items
            .into_iter()
            .map(to_proto)
            .collect::<Result<Vec<_>, _>>()?;

        self.stub
            .clone()
            .save_state(SaveStateRequest {
                store_name: store.to_string(),
                states,
            })
            .await
            .map_err(|status| {
                ApiError::internal(status, format!("could not save state to {store:?}"))
            })?;
        Ok(())
    }

    async fn get_state<T>(&self, store: &str, key: &str) -> Result<T, ApiError>
    where
        T: DeserializeOwned + Send,
    {
        let response = self
            .stub
            .clone()
            .get_state(GetStateRequest {
                store_name: store.to_string(),
                key: key.to_string(),
                consistency: StateConsistency::ConsistencyStrong as i32,
                ..Default::default()
            })
            .await
            .map_err(|status| ApiError::internal(status, format!("could not get state {key:?}")))?
            .into_inner();

        decode_state(store, key, &response.data)
    }
}

#[async_trait]
impl SecretStore for GrpcClient {
    async fn get_secret<T>(&self, store: &str, name: &str) -> Result<T, ApiError>
    where
        T: DeserializeOwned + Send,
    {
        let response = self
            .stub
            .clone()
            .get_secret(GetSecretRequest {
                store_name: store.to_string(),
                key: name.to_string(),
                ..Default::default()
            })
            .await
            .map_err(|status| ApiError::internal(status, format!("could not get secret {name:?}")))?
            .into_inner();

        decode_secret(name, response.data)
    }
}

impl Api for GrpcClient {
    fn name(&self) -> &'static str {
        "Custom gRPC"
    }
}
