//! Topic handler registration shared by the HTTP and gRPC SDK services.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt};

use super::event::TopicEvent;
use super::SdkError;
use crate::dapr::subscription;
use crate::error::ApiError;

/// One topic subscription as the SDK sees it: a single route, optionally
/// guarded by a match expression.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Subscription {
    pub pubsub_name: String,
    pub topic: String,
    pub route: String,
    /// CEL expression; `None` makes `route` the topic's default route.
    pub match_expr: Option<String>,
    /// Lower values are evaluated first.
    pub priority: i32,
    pub metadata: BTreeMap<String, String>,
}

impl Subscription {
    pub fn new(
        pubsub_name: impl Into<String>,
        topic: impl Into<String>,
        route: impl Into<String>,
    ) -> Self {
        Self {
            pubsub_name: pubsub_name.into(),
            topic: topic.into(),
            route: route.into(),
            ..Self::default()
        }
    }

    pub fn with_match(self, match_expr: impl Into<String>) -> Self {
        Self {
            match_expr: Some(match_expr.into()),
            ..self
        }
    }

    pub fn with_priority(self, priority: i32) -> Self {
        Self { priority, ..self }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// A topic event handler.
pub type TopicEventHandler = Arc<dyn Fn(TopicEvent) -> BoxFuture<'static, Result<(), ApiError>> + Send + Sync>;

/// Box an async closure as a [`TopicEventHandler`].
pub fn topic_handler<F, Fut>(handler: F) -> TopicEventHandler
where
    F: Fn(TopicEvent) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), ApiError>> + Send + 'static,
{
    Arc::new(move |event| handler(event).boxed())
}

/// A service that accepts topic event handlers.
pub trait Service {
    fn add_topic_event_handler(
        &mut self,
        subscription: Subscription,
        handler: TopicEventHandler,
    ) -> Result<(), SdkError>;
}

/// A feature module's registration with an SDK service.
pub trait SdkRegistrar {
    fn register_sdk(&self, service: &mut dyn Service) -> Result<(), SdkError>;
}

/// Register every module, collecting all failures instead of stopping at the
/// first.
pub fn register_all(
    service: &mut dyn Service,
    registrars: &[&dyn SdkRegistrar],
) -> Result<(), SdkError> {
    let mut errors: Vec<SdkError> = registrars
        .iter()
        .filter_map(|registrar| registrar.register_sdk(service).err())
        .collect();
    match errors.len() {
        0 => Ok(()),
        1 => Err(errors.remove(0)),
        _ => Err(SdkError::Multiple(errors)),
    }
}

struct TopicEntry {
    pubsub_name: String,
    topic: String,
    metadata: BTreeMap<String, String>,
    /// `(priority, match, route)`, kept sorted by priority.
    rules: Vec<(i32, String, String)>,
    default: Option<String>,
}

/// Route map and subscription list behind both SDK services.
#[derive(Default)]
pub struct TopicRegistrar {
    topics: Vec<TopicEntry>,
    handlers: HashMap<String, TopicEventHandler>,
}

impl TopicRegistrar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a subscription and its handler.
    ///
    /// Rejects empty names, a route that is already taken and a second
    /// default route for the same topic. A rejected call changes nothing.
    pub fn add(&mut self, subscription: Subscription, handler: TopicEventHandler) -> Result<(), SdkError> {
        if subscription.pubsub_name.is_empty() {
            return Err(SdkError::InvalidSubscription("pubsub name is required"));
        }
        if subscription.topic.is_empty() {
            return Err(SdkError::InvalidSubscription("topic is required"));
        }
        if subscription.route.is_empty() {
            return Err(SdkError::InvalidSubscription("route is required"));
        }

        let route = normalize_route(&subscription.route);
        if self.handlers.contains_key(&route) {
            return Err(SdkError::DuplicateRoute(route));
        }

        let match_expr = subscription.match_expr.filter(|m| !m.is_empty());
        let position = self
            .topics
            .iter()
            .position(|t| t.pubsub_name == subscription.pubsub_name && t.topic == subscription.topic);

        if match_expr.is_none() {
            if let Some(entry) = position.map(|i| &self.topics[i]) {
                if entry.default.is_some() {
                    return Err(SdkError::DuplicateDefaultRoute {
                        pubsub: subscription.pubsub_name,
                        topic: subscription.topic,
                    });
                }
            }
        }

        let position = position.unwrap_or_else(|| {
            self.topics.push(TopicEntry {
                pubsub_name: subscription.pubsub_name.clone(),
                topic: subscription.topic.clone(),
                metadata: BTreeMap::new(),
                rules: Vec::new(),
                default: None,
            });
            self.topics.len() - 1
        });
        let entry = &mut self.topics[position];

        for (key, value) in subscription.metadata {
            entry.metadata.entry(key).or_insert(value);
        }
        match match_expr {
            Some(match_expr) => {
                entry.rules.push((subscription.priority, match_expr, route.clone()));
                // Stable: equal priorities keep registration order.
                entry.rules.sort_by_key(|(priority, _, _)| *priority);
            }
            None => entry.default = Some(route.clone()),
        }

        tracing::debug!(route = %route, pubsub = %entry.pubsub_name, topic = %entry.topic, "topic handler added");
        self.handlers.insert(route, handler);
        Ok(())
    }

    /// The handler registered for `route`, if any.
    pub fn handler(&self, route: &str) -> Option<TopicEventHandler> {
        self.handlers.get(&normalize_route(route)).cloned()
    }

    /// Subscriptions in the sidecar's wire shape, rules in priority order.
    pub fn subscriptions(&self) -> Vec<subscription::Subscription> {
        self.topics
            .iter()
            .map(|entry| {
                let mut descriptor =
                    subscription::Subscription::new(entry.pubsub_name.clone(), entry.topic.clone());
                descriptor.metadata = entry.metadata.clone();
                for (_, match_expr, route) in &entry.rules {
                    descriptor = descriptor.rule(match_expr.clone(), route.clone());
                }
                if let Some(default) = &entry.default {
                    descriptor = descriptor.default_route(default.clone());
                }
                descriptor
            })
            .collect()
    }

    /// Run the handler for `route` on `event`.
    ///
    /// `None` when nothing is registered for the route.
    pub async fn dispatch(&self, route: &str, event: TopicEvent) -> Option<Result<(), ApiError>> {
        let handler = self.handler(route)?;
        Some(handler(event).await)
    }
}

impl fmt::Debug for TopicRegistrar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut routes: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        routes.sort_unstable();
        f.debug_struct("TopicRegistrar")
            .field("routes", &routes)
            .finish()
    }
}

impl Service for TopicRegistrar {
    fn add_topic_event_handler(
        &mut self,
        subscription: Subscription,
        handler: TopicEventHandler,
    ) -> Result<(), SdkError> {
        self.add(subscription, handler)
    }
}

fn normalize_route(route: &str) -> String {
    if route.starts_with('/') {
        route.to_string()
    } else {
        format!("/{route}")
    }
}
