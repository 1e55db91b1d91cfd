//! A small, typed Dapr application SDK.
//!
//! The third transport delegates to this layer instead of speaking the wire
//! protocol itself:
//!
//! - [`Client`]: typed calls on the sidecar (`get_state`, `save_bulk_state`,
//!   `get_secret`), authenticated with `DAPR_API_TOKEN` when one is set;
//! - [`Service`]: topic handler registration, served over HTTP by
//!   [`HttpService`] or over gRPC by [`GrpcService`]. Both keep their own
//!   route map; there is no shared dispatch table at this level.
//!
//! ## Example
//!
//! ```ignore
//! let mut service = sdk::GrpcService::new();
//! service.add_topic_event_handler(
//!     sdk::Subscription::new("pubsub", "inventory", "/widgets.v1")
//!         .with_match(r#"event.type == "widget.v1""#)
//!         .with_priority(1),
//!     sdk::topic_handler(|event| async move {
//!         let widget: Widget = event.decode()?;
//!         store.save(&widget).await
//!     }),
//! )?;
//! service.serve(listener, shutdown).await?;
//! ```

mod client;
mod event;
mod grpc;
#[cfg(feature = "http")]
mod http;
mod service;

pub use client::{Client, SetStateItem, StateResponse};
pub use event::{TopicEvent, TopicEventData};
pub use grpc::GrpcService;
#[cfg(feature = "http")]
pub use http::HttpService;
pub use service::{
    register_all, topic_handler, SdkRegistrar, Service, Subscription, TopicEventHandler,
    TopicRegistrar,
};

use thiserror::Error;

use crate::config::ConfigError;

#[derive(Debug, Error)]
pub enum SdkError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("could not connect to sidecar: {0}")]
    Transport(#[from] tonic::transport::Error),
    #[error("sidecar call failed: {0}")]
    Status(#[from] tonic::Status),
    #[error("DAPR_API_TOKEN is not valid metadata")]
    InvalidApiToken,
    #[error("invalid subscription: {0}")]
    InvalidSubscription(&'static str),
    #[error("route {0:?} is already registered")]
    DuplicateRoute(String),
    #[error("topic {topic:?} on pubsub {pubsub:?} already has a default route")]
    DuplicateDefaultRoute { pubsub: String, topic: String },
    /// Several registrations failed; each is listed.
    #[error("{}", .0.iter().map(ToString::to_string).collect::<Vec<_>>().join("; "))]
    Multiple(Vec<SdkError>),
}
