//! Everything that speaks to or is called by the Dapr sidecar.
//!
//! - [`client`]: the three interchangeable transport clients;
//! - [`subscription`]: topic declarations and their aggregation;
//! - [`dispatch`]: path to handler routing for the raw callback servers;
//! - [`cloudevent`]: the CloudEvent envelope decoder;
//! - [`server`]: the raw HTTP and gRPC callback servers.

#[cfg(any(feature = "http", feature = "grpc"))]
pub mod client;
pub mod cloudevent;
pub mod dispatch;
#[cfg(feature = "grpc")]
pub mod proto;
pub mod server;
pub mod subscription;

pub use cloudevent::{DecodeError, Envelope};
pub use dispatch::{DispatchTable, EventRegistrar, HandlerNotFound};
pub use subscription::{subscribe, Rule, Routes, Subscriber, Subscription};
