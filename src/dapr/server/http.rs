//! Raw HTTP callback surface for the sidecar.
//!
//! ## Routes
//!
//! - `GET /dapr/subscribe`: the merged subscription descriptors as JSON.
//! - `POST /:path`: a CloudEvent delivery. Decoded, then dispatched to the
//!   handler registered for `/{path}`. Success answers `200 OK`; failures
//!   answer with the `ApiError` status and JSON body.
//!
//! ## Example
//!
//! ```ignore
//! let subscriptions = Arc::new(subscribe(&[&widgets, &gadgets, &products]));
//! let table = Arc::new(dispatch::table(&[&widgets, &gadgets, &products]));
//! let app = dapr::server::http::router(subscriptions, table);
//! dapr::server::http::serve(listener, app, shutdown).await?;
//! ```

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use tokio::net::TcpListener;

use crate::context::CallContext;
use crate::dapr::cloudevent;
use crate::dapr::dispatch::DispatchTable;
use crate::dapr::subscription::Subscription;
use crate::error::ApiError;
use crate::runtime::Shutdown;

#[derive(Clone)]
struct Callbacks {
    subscriptions: Arc<Vec<Subscription>>,
    table: Arc<DispatchTable>,
}

/// Build the callback router.
pub fn router(subscriptions: Arc<Vec<Subscription>>, table: Arc<DispatchTable>) -> Router {
    Router::new()
        .route("/dapr/subscribe", get(subscribe_handler))
        .route("/:path", post(event_handler))
        .with_state(Callbacks {
            subscriptions,
            table,
        })
}

/// Serve `app` on `listener` until `shutdown` fires, then drain in-flight
/// requests.
pub async fn serve(listener: TcpListener, app: Router, shutdown: Shutdown) -> std::io::Result<()> {
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown.wait())
        .await
}

/// `GET /dapr/subscribe`
async fn subscribe_handler(State(callbacks): State<Callbacks>) -> Json<Vec<Subscription>> {
    Json(callbacks.subscriptions.as_ref().clone())
}

/// `POST /:path`
async fn event_handler(
    State(callbacks): State<Callbacks>,
    Path(path): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let envelope = match cloudevent::decode(&body) {
        Ok(envelope) => envelope,
        Err(err) => {
            tracing::warn!(path = %path, error = %err, "rejected malformed event");
            return ApiError::from(err).into_response();
        }
    };

    let context = CallContext::from_headers(&headers);
    match context
        .scope(callbacks.table.dispatch(&path, envelope))
        .await
    {
        Ok(()) => (StatusCode::OK, "OK").into_response(),
        Err(err) => err.into_response(),
    }
}
