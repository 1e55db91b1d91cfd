use async_trait::async_trait;
use tonic::transport::{Channel, Endpoint};

use super::Product;
use crate::config::SidecarConfig;
use crate::context::outbound_request;
use crate::dapr::client::ConnectError;
use crate::error::ApiError;
use crate::features::Store;
use crate::products::proto::{self, ProductRequest, ProductsClient};
use crate::products::APP_ID;

/// Products through the sidecar's gRPC service invocation.
///
/// Every call carries the inbound call metadata plus `dapr-app-id: products`
/// so the sidecar forwards it to the products app.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    client: ProductsClient<Channel>,
}

impl ProductRepository {
    /// Connect to the sidecar's gRPC port, waiting until the channel is up.
    pub async fn connect(config: &SidecarConfig) -> Result<Self, ConnectError> {
        let channel = Endpoint::from_shared(config.grpc_endpoint()?)?
            .connect()
            .await?;
        Ok(Self::with_channel(channel))
    }

    pub fn with_channel(channel: Channel) -> Self {
        Self {
            client: ProductsClient::new(channel),
        }
    }
}

#[async_trait]
impl Store<Product> for ProductRepository {
    async fn load(&self, id: &str) -> Result<Product, ApiError> {
        tracing::info!(id, "invoking products service: GetProduct");
        let request = outbound_request(ProductRequest { id: id.to_string() }, Some(APP_ID));
        let product = self
            .client
            .clone()
            .get_product(request)
            .await
            .map_err(ApiError::from_status)?;
        Ok(product.into_inner().into())
    }

    async fn save(&self, product: &Product) -> Result<(), ApiError> {
        tracing::info!(id = %product.id, "invoking products service: SaveProduct");
        let request = outbound_request(proto::Product::from(product), Some(APP_ID));
        self.client
            .clone()
            .save_product(request)
            .await
            .map_err(ApiError::from_status)?;
        Ok(())
    }
}
