//! The direct HTTP client against the fake sidecar.

use std::collections::HashMap;
use std::sync::Arc;

use dapr_inventory::components::{Api, SecretStore, StateItem, StateStore};
use dapr_inventory::config::{ClientKind, SidecarConfig};
use dapr_inventory::dapr::client::{Client, ConnectError, HttpClient};
use dapr_inventory::features::gadgets::{Gadget, GadgetRepository};
use dapr_inventory::features::Store;
use serde_json::{json, Value};
use tokio::net::TcpListener;

use crate::support::{self, Sidecar};

#[tokio::test]
async fn save_then_load() {
    let sidecar = Sidecar::default();
    let client = HttpClient::new(&support::start(sidecar.clone()).await).unwrap();

    let item = StateItem::new("gadget:g1", &json!({ "id": "g1", "price": 2.5 })).unwrap();
    client.set_state("statestore", vec![item]).await.unwrap();

    assert!(sidecar.state("statestore", "gadget:g1").is_some());
    let value: Value = client.get_state("statestore", "gadget:g1").await.unwrap();
    assert_eq!(value, json!({ "id": "g1", "price": 2.5 }));
}

#[tokio::test]
async fn forwards_etag_only_when_present() {
    let sidecar = Sidecar::default();
    let client = HttpClient::new(&support::start(sidecar.clone()).await).unwrap();

    let items = vec![
        StateItem::new("a", &1).unwrap(),
        StateItem::new("b", &2).unwrap().with_etag("7"),
    ];
    client.set_state("statestore", items).await.unwrap();

    assert_eq!(sidecar.etag("statestore", "a"), None);
    assert_eq!(sidecar.etag("statestore", "b").as_deref(), Some("7"));
}

#[tokio::test]
async fn save_failure_is_internal() {
    let sidecar = Sidecar::rejecting_writes();
    let client = HttpClient::new(&support::start(sidecar.clone()).await).unwrap();

    let err = client
        .set_state("statestore", vec![StateItem::new("a", &1).unwrap()])
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "INTERNAL_SERVER_ERROR");
    assert_eq!(err.code(), 500);
    assert_eq!(err.message(), r#"could not save state to "statestore""#);
    assert!(sidecar.state("statestore", "a").is_none());
}

#[tokio::test]
async fn unreachable_sidecar_is_internal() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    let client = HttpClient::new(&SidecarConfig::default().with_http_port(port)).unwrap();

    let err = client
        .set_state("statestore", vec![StateItem::new("a", &1).unwrap()])
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "INTERNAL_SERVER_ERROR");
    assert_eq!(err.code(), 500);

    let err = client
        .get_state::<Value>("statestore", "a")
        .await
        .unwrap_err();
    assert_eq!(err.code(), 500);
}

#[tokio::test]
async fn missing_key_is_not_found() {
    let client = HttpClient::new(&support::start(Sidecar::default()).await).unwrap();
    let err = client
        .get_state::<Value>("statestore", "gadget:nope")
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn reads_secrets() {
    let sidecar = Sidecar::default();
    sidecar.put_secret("secrets", "postgres", &[("host", "db:5432"), ("username", "app")]);
    let client = HttpClient::new(&support::start(sidecar).await).unwrap();

    let secret: HashMap<String, String> = client.get_secret("secrets", "postgres").await.unwrap();
    assert_eq!(secret["host"], "db:5432");

    let err = client
        .get_secret::<HashMap<String, String>>("secrets", "missing")
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn gadget_repository_round_trip() {
    let config = support::start(Sidecar::default()).await;
    let client = Client::connect(ClientKind::Http, &config).await.unwrap();
    assert_eq!(client.name(), "Custom HTTP (reqwest)");
    let gadgets = GadgetRepository::new(Arc::new(client));

    let gadget = Gadget {
        id: "g7".into(),
        description: "sprocket".into(),
        price: 4.0,
    };
    gadgets.save(&gadget).await.unwrap();
    assert_eq!(gadgets.load("g7").await.unwrap(), gadget);

    let err = gadgets.load("g8").await.unwrap_err();
    assert_eq!(err.message(), r#"gadget "g8" not found"#);
}

#[tokio::test]
async fn missing_port_fails_at_construction() {
    let err = HttpClient::new(&SidecarConfig::default()).unwrap_err();
    assert!(matches!(err, ConnectError::Config(_)));
}
