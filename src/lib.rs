//! Inventory service on a Dapr sidecar.
//!
//! Three feature modules (widgets, gadgets, products) declare their topic
//! interest once. The declarations are served through three callback
//! bindings: a raw HTTP surface, a raw gRPC `AppCallback` service and an
//! SDK-style service layer. The modules read and write state and fetch
//! secrets through one of three interchangeable clients.
//!
//! ## Example
//!
//! ```ignore
//! let client = Client::connect(ClientKind::Grpc, &SidecarConfig::from_env()?).await?;
//! let gadgets = ResourceService::new(GadgetRepository::new(Arc::new(client)));
//!
//! let subscriptions = Arc::new(subscribe(&[&gadgets]));
//! let table = Arc::new(dispatch::table(&[&gadgets]));
//! let app = dapr::server::http::router(subscriptions, table);
//! ```

pub mod components;
pub mod config;
pub mod context;
pub mod dapr;
pub mod database;
pub mod error;
pub mod features;
#[cfg(feature = "grpc")]
pub mod products;
pub mod runtime;
#[cfg(feature = "grpc")]
pub mod sdk;

pub use components::{Api, SecretStore, StateItem, StateStore};
pub use config::{ClientKind, ListenConfig, SidecarConfig};
pub use context::CallContext;
#[cfg(any(feature = "http", feature = "grpc"))]
pub use dapr::client::Client;
pub use error::ApiError;
pub use features::{Resource, ResourceService, Store};
