//! Raw gRPC `AppCallback` service.

use std::sync::Arc;

use dapr_inventory::dapr::dispatch;
use dapr_inventory::dapr::proto::{
    AppCallbackClient, Empty, TopicEventRequest, TopicEventStatus,
};
use dapr_inventory::dapr::server;
use dapr_inventory::dapr::subscription::subscribe;
use serde_json::Value;
use tokio::net::TcpListener;
use tokio_stream::wrappers::TcpListenerStream;
use tonic::transport::Channel;

use crate::support::{self, Modules};

async fn start(modules: &Modules) -> AppCallbackClient<Channel> {
    let subscriptions = Arc::new(subscribe(&modules.subscribers()));
    let table = Arc::new(dispatch::table(&modules.registrars()));
    let service = server::grpc::server(subscriptions, table);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        tonic::transport::Server::builder()
            .add_service(service)
            .serve_with_incoming(TcpListenerStream::new(listener))
            .await
            .unwrap();
    });

    AppCallbackClient::connect(format!("http://{addr}"))
        .await
        .unwrap()
}

fn event(path: &str, event_type: &str, data: Value) -> TopicEventRequest {
    TopicEventRequest {
        id: "evt-1".into(),
        source: "inventory-tests".into(),
        event_type: event_type.into(),
        spec_version: "1.0".into(),
        data_content_type: "application/json".into(),
        topic: "inventory".into(),
        data: serde_json::to_vec(&data).unwrap(),
        pubsub_name: "pubsub".into(),
        path: path.into(),
    }
}

#[tokio::test]
async fn lists_merged_subscriptions() {
    let modules = Modules::new();
    let mut client = start(&modules).await;

    let response = client
        .list_topic_subscriptions(Empty {})
        .await
        .unwrap()
        .into_inner();
    assert_eq!(response.subscriptions.len(), 1);

    let subscription = &response.subscriptions[0];
    assert_eq!(subscription.pubsub_name, "pubsub");
    assert_eq!(subscription.topic, "inventory");
    let routes = subscription.routes.as_ref().unwrap();
    let rules: Vec<(&str, &str)> = routes
        .rules
        .iter()
        .map(|rule| (rule.match_expr.as_str(), rule.path.as_str()))
        .collect();
    assert_eq!(
        rules,
        vec![
            (r#"event.type == "widget.v1""#, "/widgets.v1"),
            (r#"event.type == "gadget.v1""#, "/gadgets.v1"),
        ]
    );
    assert_eq!(routes.default, "/products.v1");
}

#[tokio::test]
async fn delivers_by_path() {
    let modules = Modules::new();
    let mut client = start(&modules).await;

    let response = client
        .on_topic_event(event("/products.v1", "product.v1", support::product_data()))
        .await
        .unwrap()
        .into_inner();
    assert_eq!(response.status(), TopicEventStatus::Success);
    assert_eq!(modules.products.items()[0].id, "p1");
    assert!(modules.widgets.items().is_empty());
}

#[tokio::test]
async fn unregistered_path_is_internal() {
    let modules = Modules::new();
    let mut client = start(&modules).await;

    let status = client
        .on_topic_event(event("/unregistered", "other.v1", Value::Null))
        .await
        .unwrap_err();
    assert_eq!(status.code(), tonic::Code::Internal);
    assert!(status.message().contains("handler not found"));

    let response = client
        .on_topic_event(event("/widgets.v1", "widget.v1", support::widget_data()))
        .await
        .unwrap()
        .into_inner();
    assert_eq!(response.status(), TopicEventStatus::Success);
}

#[tokio::test]
async fn store_failure_is_a_status() {
    let modules = Modules::with_failing_gadgets();
    let mut client = start(&modules).await;

    let status = client
        .on_topic_event(event("/gadgets.v1", "gadget.v1", support::gadget_data()))
        .await
        .unwrap_err();
    assert_eq!(status.code(), tonic::Code::Internal);
    assert_eq!(status.message(), r#"could not save gadget "g1""#);
}

#[tokio::test]
async fn handlers_see_inbound_metadata() {
    let modules = Modules::new();
    let mut client = start(&modules).await;

    let mut request = tonic::Request::new(event("/widgets.v1", "widget.v1", support::widget_data()));
    request
        .metadata_mut()
        .insert("traceparent", "00-1234-5678-01".parse().unwrap());
    client.on_topic_event(request).await.unwrap();

    let contexts = modules.widgets.contexts();
    assert_eq!(contexts[0].get("traceparent"), Some("00-1234-5678-01"));
}
