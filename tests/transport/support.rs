//! A fake sidecar serving the state and secrets APIs over HTTP and gRPC.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use dapr_inventory::config::SidecarConfig;
use dapr_inventory::context::CallContext;
use dapr_inventory::dapr::proto::{
    Dapr, DaprServer, Empty, GetSecretRequest, GetSecretResponse, GetStateRequest,
    GetStateResponse, SaveStateRequest,
};
use serde::Deserialize;
use tokio::net::TcpListener;
use tokio_stream::wrappers::TcpListenerStream;

type Key = (String, String);

#[derive(Clone, Default)]
pub struct Sidecar {
    state: Arc<Mutex<HashMap<Key, Vec<u8>>>>,
    etags: Arc<Mutex<HashMap<Key, String>>>,
    secrets: Arc<Mutex<HashMap<Key, HashMap<String, String>>>>,
    seen: Arc<Mutex<Vec<CallContext>>>,
    reject_writes: bool,
}

impl Sidecar {
    /// A sidecar whose state writes always fail, over HTTP and gRPC.
    pub fn rejecting_writes() -> Self {
        Self {
            reject_writes: true,
            ..Self::default()
        }
    }

    pub fn put_secret(&self, store: &str, name: &str, values: &[(&str, &str)]) {
        let values = values
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        self.secrets
            .lock()
            .unwrap()
            .insert((store.into(), name.into()), values);
    }

    pub fn state(&self, store: &str, key: &str) -> Option<Vec<u8>> {
        self.state
            .lock()
            .unwrap()
            .get(&(store.into(), key.into()))
            .cloned()
    }

    /// Etag sent with the last write of `key`, if any.
    pub fn etag(&self, store: &str, key: &str) -> Option<String> {
        self.etags
            .lock()
            .unwrap()
            .get(&(store.into(), key.into()))
            .cloned()
    }

    fn put_state(&self, store: &str, key: &str, value: Vec<u8>, etag: Option<String>) {
        let key: Key = (store.into(), key.into());
        match etag {
            Some(etag) => self.etags.lock().unwrap().insert(key.clone(), etag),
            None => self.etags.lock().unwrap().remove(&key),
        };
        self.state.lock().unwrap().insert(key, value);
    }

    fn secret(&self, store: &str, name: &str) -> Option<HashMap<String, String>> {
        self.secrets
            .lock()
            .unwrap()
            .get(&(store.into(), name.into()))
            .cloned()
    }

    /// Metadata of every gRPC call received, in order.
    pub fn seen(&self) -> Vec<CallContext> {
        self.seen.lock().unwrap().clone()
    }

    fn record<T>(&self, request: &tonic::Request<T>) {
        self.seen
            .lock()
            .unwrap()
            .push(CallContext::from_metadata(request.metadata()));
    }
}

/// Start both APIs and return a config pointing at them.
pub async fn start(sidecar: Sidecar) -> SidecarConfig {
    let http = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let http_port = http.local_addr().unwrap().port();
    let app = Router::new()
        .route("/v1.0/state/:store", post(save_state))
        .route("/v1.0/state/:store/:key", get(get_state))
        .route("/v1.0/secrets/:store/:name", get(get_secret))
        .with_state(sidecar.clone());
    tokio::spawn(async move {
        axum::serve(http, app).await.unwrap();
    });

    let grpc = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let grpc_port = grpc.local_addr().unwrap().port();
    tokio::spawn(async move {
        tonic::transport::Server::builder()
            .add_service(DaprServer::new(sidecar))
            .serve_with_incoming(TcpListenerStream::new(grpc))
            .await
            .unwrap();
    });

    SidecarConfig::default()
        .with_http_port(http_port)
        .with_grpc_port(grpc_port)
}

// -----------------------------------------------------------------------------
// HTTP API
// -----------------------------------------------------------------------------

#[derive(Deserialize)]
struct Item {
    key: String,
    value: serde_json::Value,
    etag: Option<String>,
}

async fn save_state(
    State(sidecar): State<Sidecar>,
    Path(store): Path<String>,
    Json(items): Json<Vec<Item>>,
) -> Response {
    if sidecar.reject_writes {
        return (StatusCode::INTERNAL_SERVER_ERROR, "state store is down").into_response();
    }
    for item in items {
        let value = serde_json::to_vec(&item.value).unwrap();
        sidecar.put_state(&store, &item.key, value, item.etag);
    }
    StatusCode::NO_CONTENT.into_response()
}

async fn get_state(
    State(sidecar): State<Sidecar>,
    Path((store, key)): Path<(String, String)>,
) -> Response {
    match sidecar.state(&store, &key) {
        Some(bytes) => (StatusCode::OK, bytes).into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    }
}

async fn get_secret(
    State(sidecar): State<Sidecar>,
    Path((store, name)): Path<(String, String)>,
) -> Response {
    match sidecar.secret(&store, &name) {
        Some(values) => Json(values).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

// -----------------------------------------------------------------------------
// gRPC API
// -----------------------------------------------------------------------------

#[tonic::async_trait]
impl Dapr for Sidecar {
    async fn get_state(
        &self,
        request: tonic::Request<GetStateRequest>,
    ) -> Result<tonic::Response<GetStateResponse>, tonic::Status> {
        self.record(&request);
        let request = request.into_inner();
        Ok(tonic::Response::new(GetStateResponse {
            data: self
                .state(&request.store_name, &request.key)
                .unwrap_or_default(),
            ..Default::default()
        }))
    }

    async fn save_state(
        &self,
        request: tonic::Request<SaveStateRequest>,
    ) -> Result<tonic::Response<Empty>, tonic::Status> {
        self.record(&request);
        if self.reject_writes {
            return Err(tonic::Status::unavailable("state store is down"));
        }
        let request = request.into_inner();
        for item in request.states {
            let etag = item.etag.map(|etag| etag.value);
            self.put_state(&request.store_name, &item.key, item.value, etag);
        }
        Ok(tonic::Response::new(Empty {}))
    }

    async fn get_secret(
        &self,
        request: tonic::Request<GetSecretRequest>,
    ) -> Result<tonic::Response<GetSecretResponse>, tonic::Status> {
        self.record(&request);
        let request = request.into_inner();
        Ok(tonic::Response::new(GetSecretResponse {
            data: self
                .secret(&request.store_name, &request.key)
                .unwrap_or_default(),
        }))
    }
}
