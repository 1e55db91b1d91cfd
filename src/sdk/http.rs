use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use tokio::net::TcpListener;

use super::event::TopicEvent;
use super::service::{Service, Subscription, TopicEventHandler, TopicRegistrar};
use super::SdkError;
use crate::context::CallContext;
use crate::dapr::dispatch::HandlerNotFound;
use crate::dapr::subscription;
use crate::error::ApiError;
use crate::runtime::Shutdown;

/// SDK topic service over HTTP.
///
/// Answers `GET /dapr/subscribe` from its registrations and routes
/// `POST /:route` deliveries to the matching handler. A failing handler is
/// logged and the event dropped (`{"status":"DROP"}`), never retried.
#[derive(Debug, Default)]
pub struct HttpService {
    registrar: TopicRegistrar,
}

#[derive(Clone)]
struct Routes {
    subscriptions: Arc<Vec<subscription::Subscription>>,
    registrar: Arc<TopicRegistrar>,
}

impl HttpService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Freeze the registrations into a router.
    pub fn router(self) -> Router {
        let subscriptions = Arc::new(self.registrar.subscriptions());
        Router::new()
            .route("/dapr/subscribe", get(subscribe_handler))
            .route("/:route", post(event_handler))
            .with_state(Routes {
                subscriptions,
                registrar: Arc::new(self.registrar),
            })
    }

    pub async fn serve(self, listener: TcpListener, shutdown: Shutdown) -> std::io::Result<()> {
        crate::dapr::server::http::serve(listener, self.router(), shutdown).await
    }
}

impl Service for HttpService {
    fn add_topic_event_handler(
        &mut self,
        subscription: Subscription,
        handler: TopicEventHandler,
    ) -> Result<(), SdkError> {
        self.registrar.add(subscription, handler)
    }
}

async fn subscribe_handler(State(routes): State<Routes>) -> Json<Vec<subscription::Subscription>> {
    Json(routes.subscriptions.as_ref().clone())
}

async fn event_handler(
    State(routes): State<Routes>,
    Path(route): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let event = match TopicEvent::from_http_body(&body) {
        Ok(event) => event,
        Err(err) => return ApiError::from(err).into_response(),
    };

    let event_id = event.id.clone();
    let context = CallContext::from_headers(&headers);
    match context.scope(routes.registrar.dispatch(&route, event)).await {
        None => {
            let err = HandlerNotFound {
                path: format!("/{route}"),
            };
            tracing::error!(route = %route, event_id = %event_id, "{err}");
            let message = err.to_string();
            ApiError::internal(err, message).into_response()
        }
        Some(Err(err)) => {
            tracing::warn!(route = %route, event_id = %event_id, error = %err, "topic handler failed, dropping event");
            Json(json!({ "status": "DROP" })).into_response()
        }
        Some(Ok(())) => Json(json!({ "status": "SUCCESS" })).into_response(),
    }
}
