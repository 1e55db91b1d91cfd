use std::collections::HashMap;
use std::sync::RwLock;

use tonic::{Request, Response, Status};

use super::proto::{Product, ProductRequest, Products, ProductsServer};
use crate::dapr::proto::Empty;

/// `Products` over an in-memory map. Reads run concurrently, writes are
/// exclusive.
#[derive(Debug, Default)]
pub struct InMemoryProducts {
    products: RwLock<HashMap<String, Product>>,
}

impl InMemoryProducts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_server(self) -> ProductsServer<Self> {
        ProductsServer::new(self)
    }
}

#[tonic::async_trait]
impl Products for InMemoryProducts {
    async fn get_product(
        &self,
        request: Request<ProductRequest>,
    ) -> Result<Response<Product>, Status> {
        let id = request.into_inner().id;
        tracing::info!(id = %id, "get product");
        let products = self
            .products
            .read()
            .map_err(|_| Status::internal("products lock poisoned"))?;
        products
            .get(&id)
            .cloned()
            .map(Response::new)
            .ok_or_else(|| Status::not_found(format!("product {id:?} not found")))
    }

    async fn save_product(&self, request: Request<Product>) -> Result<Response<Empty>, Status> {
        let product = request.into_inner();
        tracing::info!(id = %product.id, "save product");
        self.products
            .write()
            .map_err(|_| Status::internal("products lock poisoned"))?
            .insert(product.id.clone(), product);
        Ok(Response::new(Empty {}))
    }
}
