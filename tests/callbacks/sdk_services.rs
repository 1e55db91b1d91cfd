//! SDK-mediated services: routes come from the SDK registrations.

use dapr_inventory::dapr::proto::{
    AppCallbackClient, Empty, TopicEventRequest, TopicEventStatus,
};
use dapr_inventory::sdk::{register_all, GrpcService, HttpService};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio_stream::wrappers::TcpListenerStream;

use crate::support::{self, cloud_event, Modules};

async fn start_http(modules: &Modules) -> String {
    let mut service = HttpService::new();
    register_all(&mut service, &modules.sdk_registrars()).unwrap();
    let app = service.router();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

async fn start_grpc(modules: &Modules) -> AppCallbackClient<tonic::transport::Channel> {
    let mut service = GrpcService::new();
    register_all(&mut service, &modules.sdk_registrars()).unwrap();
    let server = service.into_server();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        tonic::transport::Server::builder()
            .add_service(server)
            .serve_with_incoming(TcpListenerStream::new(listener))
            .await
            .unwrap();
    });
    AppCallbackClient::connect(format!("http://{addr}"))
        .await
        .unwrap()
}

#[tokio::test]
async fn http_subscriptions_follow_priority() {
    let modules = Modules::new();
    let base = start_http(&modules).await;

    let body: Value = reqwest::get(format!("{base}/dapr/subscribe"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body, support::expected_subscriptions());
}

#[tokio::test]
async fn http_success_and_drop() {
    let modules = Modules::with_failing_gadgets();
    let base = start_http(&modules).await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("{base}/widgets.v1"))
        .json(&cloud_event("widget.v1", support::widget_data()))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.json::<Value>().await.unwrap(), json!({ "status": "SUCCESS" }));
    assert_eq!(modules.widgets.items()[0].id, "w1");

    let resp = client
        .post(format!("{base}/gadgets.v1"))
        .json(&cloud_event("gadget.v1", support::gadget_data()))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.json::<Value>().await.unwrap(), json!({ "status": "DROP" }));
}

#[tokio::test]
async fn http_unknown_route_is_internal() {
    let modules = Modules::new();
    let base = start_http(&modules).await;

    let resp = reqwest::Client::new()
        .post(format!("{base}/unregistered"))
        .json(&cloud_event("other.v1", json!({})))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 500);
}

#[tokio::test]
async fn grpc_subscriptions_and_delivery() {
    let modules = Modules::with_failing_gadgets();
    let mut client = start_grpc(&modules).await;

    let response = client
        .list_topic_subscriptions(Empty {})
        .await
        .unwrap()
        .into_inner();
    let routes = response.subscriptions[0].routes.clone().unwrap();
    let paths: Vec<&str> = routes.rules.iter().map(|rule| rule.path.as_str()).collect();
    assert_eq!(paths, vec!["/widgets.v1", "/gadgets.v1"]);
    assert_eq!(routes.default, "/products.v1");

    let product = TopicEventRequest {
        id: "evt-2".into(),
        event_type: "product.v1".into(),
        data_content_type: "application/json".into(),
        data: serde_json::to_vec(&support::product_data()).unwrap(),
        path: "/products.v1".into(),
        ..Default::default()
    };
    let response = client.on_topic_event(product).await.unwrap().into_inner();
    assert_eq!(response.status(), TopicEventStatus::Success);
    assert_eq!(modules.products.items()[0].price, 3.5);

    let gadget = TopicEventRequest {
        id: "evt-3".into(),
        event_type: "gadget.v1".into(),
        data_content_type: "application/json".into(),
        data: serde_json::to_vec(&support::gadget_data()).unwrap(),
        path: "/gadgets.v1".into(),
        ..Default::default()
    };
    let response = client.on_topic_event(gadget).await.unwrap().into_inner();
    assert_eq!(response.status(), TopicEventStatus::Drop);
}
