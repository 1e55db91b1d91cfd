//! Raw gRPC `AppCallback` service for the sidecar.
//!
//! `ListTopicSubscriptions` answers with the same merged descriptors as the
//! HTTP surface; `OnTopicEvent` dispatches by the event's `path`. Bindings and
//! service invocation are not used and answer empty.

use std::sync::Arc;

use tokio::net::TcpListener;
use tokio_stream::wrappers::TcpListenerStream;
use tonic::{Request, Response, Status};

use crate::context::CallContext;
use crate::dapr::cloudevent::Envelope;
use crate::dapr::dispatch::DispatchTable;
use crate::dapr::proto::{
    AppCallback, AppCallbackServer, BindingEventRequest, BindingEventResponse, Empty,
    InvokeRequest, InvokeResponse, ListInputBindingsResponse, ListTopicSubscriptionsResponse,
    TopicEventRequest, TopicEventResponse, TopicEventStatus,
};
use crate::dapr::subscription::Subscription;
use crate::runtime::Shutdown;

/// `AppCallback` implementation over a frozen dispatch table.
pub struct CallbackService {
    subscriptions: Arc<Vec<Subscription>>,
    table: Arc<DispatchTable>,
}

impl CallbackService {
    pub fn new(subscriptions: Arc<Vec<Subscription>>, table: Arc<DispatchTable>) -> Self {
        Self {
            subscriptions,
            table,
        }
    }
}

// -----------------------------------------------------------------------------
// Unused callbacks
// -----------------------------------------------------------------------------

/// Answers for the `AppCallback` methods this application does not use,
/// shared by every `AppCallback` implementation in the crate.
pub(crate) mod unused {
    use super::*;

    pub(crate) fn on_invoke(request: &InvokeRequest) -> Result<Response<InvokeResponse>, Status> {
        tracing::debug!(method = %request.method, "ignoring service invocation");
        Ok(Response::new(InvokeResponse::default()))
    }

    pub(crate) fn list_input_bindings() -> Result<Response<ListInputBindingsResponse>, Status> {
        Ok(Response::new(ListInputBindingsResponse::default()))
    }

    pub(crate) fn on_binding_event(
        request: &BindingEventRequest,
    ) -> Result<Response<BindingEventResponse>, Status> {
        tracing::debug!(binding = %request.name, "ignoring binding event");
        Ok(Response::new(BindingEventResponse::default()))
    }
}

#[tonic::async_trait]
impl AppCallback for CallbackService {
    async fn on_invoke(
        &self,
        request: Request<InvokeRequest>,
    ) -> Result<Response<InvokeResponse>, Status> {
        unused::on_invoke(request.get_ref())
    }

    async fn list_topic_subscriptions(
        &self,
        _request: Request<Empty>,
    ) -> Result<Response<ListTopicSubscriptionsResponse>, Status> {
        Ok(Response::new(ListTopicSubscriptionsResponse {
            subscriptions: self.subscriptions.iter().map(Into::into).collect(),
        }))
    }

    async fn on_topic_event(
        &self,
        request: Request<TopicEventRequest>,
    ) -> Result<Response<TopicEventResponse>, Status> {
        let context = CallContext::from_metadata(request.metadata());
        let event = request.into_inner();
        let path = event.path.clone();
        let envelope = Envelope::from(event);

        context.scope(self.table.dispatch(&path, envelope)).await?;
        Ok(Response::new(TopicEventResponse::with_status(
            TopicEventStatus::Success,
        )))
    }

    async fn list_input_bindings(
        &self,
        _request: Request<Empty>,
    ) -> Result<Response<ListInputBindingsResponse>, Status> {
        unused::list_input_bindings()
    }

    async fn on_binding_event(
        &self,
        request: Request<BindingEventRequest>,
    ) -> Result<Response<BindingEventResponse>, Status> {
        unused::on_binding_event(request.get_ref())
    }
}

/// Create an `AppCallbackServer` from the shared descriptors and table.
pub fn server(
    subscriptions: Arc<Vec<Subscription>>,
    table: Arc<DispatchTable>,
) -> AppCallbackServer<CallbackService> {
    AppCallbackServer::new(CallbackService::new(subscriptions, table))
}

/// Serve `router` on `listener` until `shutdown` fires.
pub async fn serve(
    listener: TcpListener,
    router: tonic::transport::server::Router,
    shutdown: Shutdown,
) -> Result<(), tonic::transport::Error> {
    router
        .serve_with_incoming_shutdown(TcpListenerStream::new(listener), shutdown.wait())
        .await
}
