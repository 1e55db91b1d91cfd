//! `products` package messages and the generated `Products` service.

#[derive(Clone, PartialEq, prost::Message)]
pub struct ProductRequest {
    #[prost(string, tag = "1")]
    pub id: String,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct Product {
    #[prost(string, tag = "1")]
    pub id: String,
    #[prost(string, tag = "2")]
    pub description: String,
    #[prost(double, tag = "3")]
    pub price: f64,
}

include!(concat!(env!("OUT_DIR"), "/products.Products.rs"));

pub use products_client::ProductsClient;
pub use products_server::{Products, ProductsServer};
