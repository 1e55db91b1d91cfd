//! Products, owned by the separate products service and reached through
//! the sidecar.

mod repository;

pub use repository::ProductRepository;

use serde::{Deserialize, Serialize};

use super::Resource;
use crate::products::proto;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub description: String,
    pub price: f64,
}

impl Resource for Product {
    const KIND: &'static str = "product";
    const COLLECTION: &'static str = "products";
    const EVENT_PATH: &'static str = "/products.v1";
    const MATCH: Option<&'static str> = None;
    const PRIORITY: i32 = 0;

    fn id(&self) -> &str {
        &self.id
    }
}

impl From<proto::Product> for Product {
    fn from(product: proto::Product) -> Self {
        Self {
            id: product.id,
            description: product.description,
            price: product.price,
        }
    }
}

impl From<&Product> for proto::Product {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id.clone(),
            description: product.description.clone(),
            price: product.price,
        }
    }
}
