//! Raw HTTP callback surface.

use std::sync::Arc;

use dapr_inventory::dapr::dispatch;
use dapr_inventory::dapr::server;
use dapr_inventory::dapr::subscription::subscribe;
use serde_json::{json, Value};

use crate::support::{self, cloud_event, Modules};

async fn start(modules: &Modules) -> String {
    let subscriptions = Arc::new(subscribe(&modules.subscribers()));
    let table = Arc::new(dispatch::table(&modules.registrars()));
    let app = server::http::router(subscriptions, table);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

#[tokio::test]
async fn serves_merged_subscriptions() {
    let modules = Modules::new();
    let base = start(&modules).await;

    let body: Value = reqwest::get(format!("{base}/dapr/subscribe"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body, support::expected_subscriptions());
}

#[tokio::test]
async fn delivers_each_module_its_events() {
    let modules = Modules::new();
    let base = start(&modules).await;
    let client = reqwest::Client::new();

    for (path, event) in [
        ("widgets.v1", cloud_event("widget.v1", support::widget_data())),
        ("gadgets.v1", cloud_event("gadget.v1", support::gadget_data())),
        ("products.v1", cloud_event("product.v1", support::product_data())),
    ] {
        let resp = client
            .post(format!("{base}/{path}"))
            .json(&event)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
        assert_eq!(resp.text().await.unwrap(), "OK");
    }

    assert_eq!(modules.widgets.items()[0].id, "w1");
    assert_eq!(modules.gadgets.items()[0].price, 10.0);
    assert_eq!(modules.products.items()[0].description, "product");
}

#[tokio::test]
async fn unregistered_path_fails_without_stopping_the_server() {
    let modules = Modules::new();
    let base = start(&modules).await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("{base}/unregistered"))
        .json(&cloud_event("other.v1", json!({})))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 500);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["type"], "INTERNAL_SERVER_ERROR");
    assert_eq!(body["code"], 500);
    assert!(body["message"]
        .as_str()
        .unwrap()
        .contains("handler not found"));

    let resp = client
        .post(format!("{base}/gadgets.v1"))
        .json(&cloud_event("gadget.v1", support::gadget_data()))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
}

#[tokio::test]
async fn malformed_envelope_is_a_bad_request() {
    let modules = Modules::new();
    let base = start(&modules).await;

    let resp = reqwest::Client::new()
        .post(format!("{base}/widgets.v1"))
        .body("not a cloud event")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["type"], "BAD_REQUEST");
    assert!(modules.widgets.items().is_empty());
}

#[tokio::test]
async fn store_failure_is_encoded() {
    let modules = Modules::with_failing_gadgets();
    let base = start(&modules).await;

    let resp = reqwest::Client::new()
        .post(format!("{base}/gadgets.v1"))
        .json(&cloud_event("gadget.v1", support::gadget_data()))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 500);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(
        body,
        json!({
            "type": "INTERNAL_SERVER_ERROR",
            "code": 500,
            "message": "could not save gadget \"g1\""
        })
    );
}

#[tokio::test]
async fn handlers_see_inbound_headers() {
    let modules = Modules::new();
    let base = start(&modules).await;

    reqwest::Client::new()
        .post(format!("{base}/widgets.v1"))
        .header("traceparent", "00-0af7-b7ad-01")
        .json(&cloud_event("widget.v1", support::widget_data()))
        .send()
        .await
        .unwrap();

    let contexts = modules.widgets.contexts();
    assert_eq!(contexts[0].get("traceparent"), Some("00-0af7-b7ad-01"));
}
