//! The products service: a small gRPC service the inventory process reaches
//! through the sidecar's service invocation.

pub mod proto;
mod server;

pub use server::InMemoryProducts;

/// App id the products service runs under.
pub const APP_ID: &str = "products";
