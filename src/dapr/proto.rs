//! Dapr runtime API messages (`dapr.proto.runtime.v1` and the parts of
//! `dapr.proto.common.v1` it uses).
//!
//! Hand-derived prost messages: field tags follow the published Dapr protos so
//! the generated clients and servers interoperate with a real sidecar. Only
//! the fields this crate reads or writes are declared; protobuf ignores the
//! rest on decode.

use std::collections::HashMap;

// ---------------------------------------------------------------------------
// Common
// ---------------------------------------------------------------------------

/// `google.protobuf.Empty`.
#[derive(Clone, PartialEq, prost::Message)]
pub struct Empty {}

/// `google.protobuf.Any`.
#[derive(Clone, PartialEq, prost::Message)]
pub struct Any {
    #[prost(string, tag = "1")]
    pub type_url: String,
    #[prost(bytes = "vec", tag = "2")]
    pub value: Vec<u8>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration)]
#[repr(i32)]
pub enum StateConsistency {
    ConsistencyUnspecified = 0,
    ConsistencyEventual = 1,
    ConsistencyStrong = 2,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration)]
#[repr(i32)]
pub enum StateConcurrency {
    ConcurrencyUnspecified = 0,
    ConcurrencyFirstWrite = 1,
    ConcurrencyLastWrite = 2,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct StateOptions {
    #[prost(enumeration = "StateConcurrency", tag = "1")]
    pub concurrency: i32,
    #[prost(enumeration = "StateConsistency", tag = "2")]
    pub consistency: i32,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct Etag {
    #[prost(string, tag = "1")]
    pub value: String,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct StateItem {
    #[prost(string, tag = "1")]
    pub key: String,
    #[prost(bytes = "vec", tag = "2")]
    pub value: Vec<u8>,
    #[prost(message, optional, tag = "3")]
    pub etag: Option<Etag>,
    #[prost(map = "string, string", tag = "4")]
    pub metadata: HashMap<String, String>,
    #[prost(message, optional, tag = "5")]
    pub options: Option<StateOptions>,
}

// ---------------------------------------------------------------------------
// Dapr (sidecar API)
// ---------------------------------------------------------------------------

#[derive(Clone, PartialEq, prost::Message)]
pub struct GetStateRequest {
    #[prost(string, tag = "1")]
    pub store_name: String,
    #[prost(string, tag = "2")]
    pub key: String,
    #[prost(enumeration = "StateConsistency", tag = "3")]
    pub consistency: i32,
    #[prost(map = "string, string", tag = "4")]
    pub metadata: HashMap<String, String>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct GetStateResponse {
    #[prost(bytes = "vec", tag = "1")]
    pub data: Vec<u8>,
    #[prost(string, tag = "2")]
    pub etag: String,
    #[prost(map = "string, string", tag = "3")]
    pub metadata: HashMap<String, String>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct SaveStateRequest {
    #[prost(string, tag = "1")]
    pub store_name: String,
    #[prost(message, repeated, tag = "2")]
    pub states: Vec<StateItem>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct GetSecretRequest {
    #[prost(string, tag = "1")]
    pub store_name: String,
    #[prost(string, tag = "2")]
    pub key: String,
    #[prost(map = "string, string", tag = "3")]
    pub metadata: HashMap<String, String>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct GetSecretResponse {
    #[prost(map = "string, string", tag = "1")]
    pub data: HashMap<String, String>,
}

// ---------------------------------------------------------------------------
// AppCallback (application API called by the sidecar)
// ---------------------------------------------------------------------------

#[derive(Clone, PartialEq, prost::Message)]
pub struct InvokeRequest {
    #[prost(string, tag = "1")]
    pub method: String,
    #[prost(message, optional, tag = "2")]
    pub data: Option<Any>,
    #[prost(string, tag = "3")]
    pub content_type: String,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct InvokeResponse {
    #[prost(message, optional, tag = "1")]
    pub data: Option<Any>,
    #[prost(string, tag = "2")]
    pub content_type: String,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct TopicRule {
    /// CEL expression; `match` on the wire.
    #[prost(string, tag = "1")]
    pub match_expr: String,
    #[prost(string, tag = "2")]
    pub path: String,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct TopicRoutes {
    #[prost(message, repeated, tag = "1")]
    pub rules: Vec<TopicRule>,
    #[prost(string, tag = "2")]
    pub default: String,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct TopicSubscription {
    #[prost(string, tag = "1")]
    pub pubsub_name: String,
    #[prost(string, tag = "2")]
    pub topic: String,
    #[prost(map = "string, string", tag = "3")]
    pub metadata: HashMap<String, String>,
    #[prost(message, optional, tag = "5")]
    pub routes: Option<TopicRoutes>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct ListTopicSubscriptionsResponse {
    #[prost(message, repeated, tag = "1")]
    pub subscriptions: Vec<TopicSubscription>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct TopicEventRequest {
    #[prost(string, tag = "1")]
    pub id: String,
    #[prost(string, tag = "2")]
    pub source: String,
    /// CloudEvent `type`.
    #[prost(string, tag = "3")]
    pub event_type: String,
    #[prost(string, tag = "4")]
    pub spec_version: String,
    #[prost(string, tag = "5")]
    pub data_content_type: String,
    #[prost(string, tag = "6")]
    pub topic: String,
    #[prost(bytes = "vec", tag = "7")]
    pub data: Vec<u8>,
    #[prost(string, tag = "8")]
    pub pubsub_name: String,
    #[prost(string, tag = "9")]
    pub path: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration)]
#[repr(i32)]
pub enum TopicEventStatus {
    Success = 0,
    Retry = 1,
    Drop = 2,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct TopicEventResponse {
    #[prost(enumeration = "TopicEventStatus", tag = "1")]
    pub status: i32,
}

impl TopicEventResponse {
    pub fn with_status(status: TopicEventStatus) -> Self {
        Self {
            status: status as i32,
        }
    }
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct ListInputBindingsResponse {
    #[prost(string, repeated, tag = "1")]
    pub bindings: Vec<String>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct BindingEventRequest {
    #[prost(string, tag = "1")]
    pub name: String,
    #[prost(bytes = "vec", tag = "2")]
    pub data: Vec<u8>,
    #[prost(map = "string, string", tag = "3")]
    pub metadata: HashMap<String, String>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct BindingEventResponse {
    #[prost(string, tag = "1")]
    pub store_name: String,
    #[prost(message, repeated, tag = "2")]
    pub states: Vec<StateItem>,
    #[prost(string, repeated, tag = "3")]
    pub to: Vec<String>,
    #[prost(bytes = "vec", tag = "4")]
    pub data: Vec<u8>,
}

// ---------------------------------------------------------------------------
// Generated service traits + servers/clients
// ---------------------------------------------------------------------------

include!(concat!(env!("OUT_DIR"), "/dapr.proto.runtime.v1.Dapr.rs"));
include!(concat!(env!("OUT_DIR"), "/dapr.proto.runtime.v1.AppCallback.rs"));

pub use app_callback_client::AppCallbackClient;
pub use app_callback_server::{AppCallback, AppCallbackServer};
pub use dapr_client::DaprClient;
pub use dapr_server::{Dapr, DaprServer};
