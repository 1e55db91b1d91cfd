//! Transport client integration tests.
//!
//! Each test starts a fake sidecar (axum for the HTTP API, tonic for the
//! gRPC API) on ephemeral ports and drives it through one client variant.

#![cfg(all(feature = "http", feature = "grpc"))]

mod support;

mod http_client;
