//! The shape every feature module shares.
//!
//! A feature module is a [`Resource`] type plus a [`Store`] for it.
//! [`ResourceService`] turns that pair into everything the process serves:
//! the topic declaration, the raw transport handler, the SDK handler and the
//! public REST route.
//!
//! ## Example
//!
//! ```ignore
//! let widgets = ResourceService::new(WidgetRepository::new(db));
//! let subscriptions = subscribe(&[&widgets]);
//! let table = dispatch::table(&[&widgets]);
//! let api = widgets.routes();
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::{PUBSUB_NAME, TOPIC};
use crate::dapr::cloudevent::Envelope;
use crate::dapr::dispatch::{DispatchTable, EventRegistrar};
use crate::dapr::subscription::{Subscriber, Subscription};
use crate::error::ApiError;

/// Load and save one resource type.
#[async_trait]
pub trait Store<T>: Send + Sync {
    async fn load(&self, id: &str) -> Result<T, ApiError>;

    async fn save(&self, item: &T) -> Result<(), ApiError>;
}

/// A resource carried on the inventory topic.
pub trait Resource: Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Singular name used in logs.
    const KIND: &'static str;
    /// REST collection, served at `/v1/{COLLECTION}/:id`.
    const COLLECTION: &'static str;
    /// Callback path events are delivered to.
    const EVENT_PATH: &'static str;
    /// Routing rule expression. `None` makes `EVENT_PATH` the topic's
    /// default route.
    const MATCH: Option<&'static str>;
    /// Rule ordering for the SDK services, lowest first.
    const PRIORITY: i32;

    fn id(&self) -> &str;
}

/// The topic declaration for `T`.
pub fn declaration<T: Resource>() -> Subscription {
    let subscription = Subscription::new(PUBSUB_NAME, TOPIC);
    match T::MATCH {
        Some(match_expr) => subscription.rule(match_expr, T::EVENT_PATH),
        None => subscription.default_route(T::EVENT_PATH),
    }
}

/// Serves one resource type over every transport.
pub struct ResourceService<T> {
    store: Arc<dyn Store<T>>,
}

impl<T> Clone for ResourceService<T> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<T: Resource> ResourceService<T> {
    pub fn new<S>(store: S) -> Self
    where
        S: Store<T> + 'static,
    {
        Self {
            store: Arc::new(store),
        }
    }

    pub async fn get(&self, id: &str) -> Result<T, ApiError> {
        self.store.load(id).await
    }

    /// Decode the envelope payload as `T` and save it.
    pub async fn handle_event(&self, envelope: Envelope) -> Result<(), ApiError> {
        save_event(Arc::clone(&self.store), envelope).await
    }
}

async fn save_event<T: Resource>(
    store: Arc<dyn Store<T>>,
    envelope: Envelope,
) -> Result<(), ApiError> {
    let item: T = envelope.data()?;
    tracing::debug!(kind = T::KIND, id = item.id(), event_id = %envelope.id, "received event");
    store.save(&item).await
}

impl<T: Resource> Subscriber for ResourceService<T> {
    fn subscriptions(&self) -> Vec<Subscription> {
        vec![declaration::<T>()]
    }
}

impl<T: Resource> EventRegistrar for ResourceService<T> {
    fn register_events(&self, table: &mut DispatchTable) {
        let store = Arc::clone(&self.store);
        table.register(T::EVENT_PATH, move |envelope| {
            save_event(Arc::clone(&store), envelope)
        });
    }
}

// -----------------------------------------------------------------------------
// SDK registration
// -----------------------------------------------------------------------------

#[cfg(feature = "grpc")]
mod sdk_registration {
    use std::sync::Arc;

    use super::{Resource, ResourceService, PUBSUB_NAME, TOPIC};
    use crate::sdk::{self, topic_handler, SdkError, SdkRegistrar, Service};

    /// The SDK subscription for `T`.
    pub fn sdk_subscription<T: Resource>() -> sdk::Subscription {
        let subscription =
            sdk::Subscription::new(PUBSUB_NAME, TOPIC, T::EVENT_PATH).with_priority(T::PRIORITY);
        match T::MATCH {
            Some(match_expr) => subscription.with_match(match_expr),
            None => subscription,
        }
    }

    impl<T: Resource> SdkRegistrar for ResourceService<T> {
        fn register_sdk(&self, service: &mut dyn Service) -> Result<(), SdkError> {
            let store = Arc::clone(&self.store);
            service.add_topic_event_handler(
                sdk_subscription::<T>(),
                topic_handler(move |event: sdk::TopicEvent| {
                    let store = Arc::clone(&store);
                    async move {
                        let item: T = event.decode()?;
                        tracing::debug!(kind = T::KIND, id = item.id(), event_id = %event.id, "received event");
                        store.save(&item).await
                    }
                }),
            )
        }
    }
}

#[cfg(feature = "grpc")]
pub use sdk_registration::sdk_subscription;

// -----------------------------------------------------------------------------
// Public REST
// -----------------------------------------------------------------------------

#[cfg(feature = "http")]
mod rest {
    use axum::extract::{Path, State};
    use axum::routing::get;
    use axum::{Json, Router};

    use super::{Resource, ResourceService};
    use crate::error::ApiError;

    impl<T: Resource> ResourceService<T> {
        /// `GET /v1/{collection}/:id`.
        pub fn routes(&self) -> Router {
            Router::new()
                .route(&format!("/v1/{}/:id", T::COLLECTION), get(get_one::<T>))
                .with_state(self.clone())
        }
    }

    async fn get_one<T: Resource>(
        State(service): State<ResourceService<T>>,
        Path(id): Path<String>,
    ) -> Result<Json<T>, ApiError> {
        service.get(&id).await.map(Json)
    }
}
