//! Feature modules: widgets, gadgets and products.
//!
//! All three publish on the same `pubsub`/`inventory` topic and are told
//! apart by the routing rules each module declares.

pub mod gadgets;
#[cfg(feature = "grpc")]
pub mod products;
mod service;
pub mod widgets;

#[cfg(feature = "grpc")]
pub use service::sdk_subscription;
pub use service::{declaration, Resource, ResourceService, Store};

pub const PUBSUB_NAME: &str = "pubsub";
pub const TOPIC: &str = "inventory";
