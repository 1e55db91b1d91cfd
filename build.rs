use tonic_build::manual::{Builder, Method, Service};

fn unary(name: &str, route: &str, input: &str, output: &str) -> Method {
    Method::builder()
        .name(name)
        .route_name(route)
        .input_type(input)
        .output_type(output)
        .codec_path("tonic::codec::ProstCodec")
        .build()
}

fn main() {
    // The Dapr and Products stubs are only referenced from grpc-gated modules.
    if std::env::var("CARGO_FEATURE_GRPC").is_err() {
        return;
    }

    const DAPR: &str = "crate::dapr::proto";
    const PRODUCTS: &str = "crate::products::proto";

    // Sidecar API used by the clients (subset of dapr.proto.runtime.v1.Dapr).
    let sidecar = Service::builder()
        .name("Dapr")
        .package("dapr.proto.runtime.v1")
        .method(unary(
            "get_state",
            "GetState",
            &format!("{DAPR}::GetStateRequest"),
            &format!("{DAPR}::GetStateResponse"),
        ))
        .method(unary(
            "save_state",
            "SaveState",
            &format!("{DAPR}::SaveStateRequest"),
            &format!("{DAPR}::Empty"),
        ))
        .method(unary(
            "get_secret",
            "GetSecret",
            &format!("{DAPR}::GetSecretRequest"),
            &format!("{DAPR}::GetSecretResponse"),
        ))
        .build();

    // Callback service the sidecar invokes on the application.
    let app_callback = Service::builder()
        .name("AppCallback")
        .package("dapr.proto.runtime.v1")
        .method(unary(
            "on_invoke",
            "OnInvoke",
            &format!("{DAPR}::InvokeRequest"),
            &format!("{DAPR}::InvokeResponse"),
        ))
        .method(unary(
            "list_topic_subscriptions",
            "ListTopicSubscriptions",
            &format!("{DAPR}::Empty"),
            &format!("{DAPR}::ListTopicSubscriptionsResponse"),
        ))
        .method(unary(
            "on_topic_event",
            "OnTopicEvent",
            &format!("{DAPR}::TopicEventRequest"),
            &format!("{DAPR}::TopicEventResponse"),
        ))
        .method(unary(
            "list_input_bindings",
            "ListInputBindings",
            &format!("{DAPR}::Empty"),
            &format!("{DAPR}::ListInputBindingsResponse"),
        ))
        .method(unary(
            "on_binding_event",
            "OnBindingEvent",
            &format!("{DAPR}::BindingEventRequest"),
            &format!("{DAPR}::BindingEventResponse"),
        ))
        .build();

    let products = Service::builder()
        .name("Products")
        .package("products")
        .method(unary(
            "get_product",
            "GetProduct",
            &format!("{PRODUCTS}::ProductRequest"),
            &format!("{PRODUCTS}::Product"),
        ))
        .method(unary(
            "save_product",
            "SaveProduct",
            &format!("{PRODUCTS}::Product"),
            &format!("{DAPR}::Empty"),
        ))
        .build();

    Builder::new().compile(&[sidecar, app_callback, products]);
}
