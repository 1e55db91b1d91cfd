use std::sync::Arc;

use tokio::net::TcpListener;
use tonic::transport::Server;
use tonic::{Request, Response, Status};

use super::event::TopicEvent;
use super::service::{Service, Subscription, TopicEventHandler, TopicRegistrar};
use super::SdkError;
use crate::context::CallContext;
use crate::dapr::dispatch::HandlerNotFound;
use crate::dapr::server::grpc::unused;
use crate::dapr::proto::{
    AppCallback, AppCallbackServer, BindingEventRequest, BindingEventResponse, Empty,
    InvokeRequest, InvokeResponse, ListInputBindingsResponse, ListTopicSubscriptionsResponse,
    TopicEventRequest, TopicEventResponse, TopicEventStatus, TopicSubscription,
};
use crate::runtime::Shutdown;

/// SDK topic service over gRPC (`AppCallback`).
///
/// A failing handler is logged and answered with `DROP`.
#[derive(Debug, Default)]
pub struct GrpcService {
    registrar: TopicRegistrar,
}

impl GrpcService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Freeze the registrations into a tonic service.
    pub fn into_server(self) -> AppCallbackServer<SdkCallbacks> {
        AppCallbackServer::new(self.freeze())
    }

    fn freeze(self) -> SdkCallbacks {
        SdkCallbacks {
            subscriptions: self
                .registrar
                .subscriptions()
                .iter()
                .map(Into::into)
                .collect(),
            registrar: Arc::new(self.registrar),
        }
    }

    pub async fn serve(
        self,
        listener: TcpListener,
        shutdown: Shutdown,
    ) -> Result<(), tonic::transport::Error> {
        let router = Server::builder().add_service(self.into_server());
        crate::dapr::server::grpc::serve(listener, router, shutdown).await
    }
}

impl Service for GrpcService {
    fn add_topic_event_handler(
        &mut self,
        subscription: Subscription,
        handler: TopicEventHandler,
    ) -> Result<(), SdkError> {
        self.registrar.add(subscription, handler)
    }
}

/// Frozen SDK registrations serving `AppCallback`.
pub struct SdkCallbacks {
    subscriptions: Vec<TopicSubscription>,
    registrar: Arc<TopicRegistrar>,
}

#[tonic::async_trait]
impl AppCallback for SdkCallbacks {
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
            subscriptions: self.subscriptions.clone(),
        }))
    }

    async fn on_topic_event(
        &self,
        request: Request<TopicEventRequest>,
    ) -> Result<Response<TopicEventResponse>, Status> {
        let context = CallContext::from_metadata(request.metadata());
        let event = request.into_inner();
        let path = event.path.clone();
        let event_id = event.id.clone();

        let status = match context
            .scope(self.registrar.dispatch(&path, TopicEvent::from(event)))
            .await
        {
            None => {
                let err = HandlerNotFound { path };
                tracing::error!(path = %err.path, event_id = %event_id, "{err}");
                return Err(Status::internal(err.to_string()));
            }
            Some(Err(err)) => {
                tracing::warn!(path = %path, event_id = %event_id, error = %err, "topic handler failed, dropping event");
                TopicEventStatus::Drop
            }
            Some(Ok(())) => TopicEventStatus::Success,
        };
        Ok(Response::new(TopicEventResponse::with_status(status)))
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
