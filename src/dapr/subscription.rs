//! Topic subscriptions and their aggregation across feature modules.
//!
//! Each feature module declares the `(pubsub, topic)` pairs it wants events
//! from. [`subscribe`] merges those declarations into one descriptor per
//! pair, which is what the sidecar reads from `GET /dapr/subscribe` or the
//! gRPC `ListTopicSubscriptions` call.
//!
//! Merge rules:
//! - descriptors appear in the order their pair was first seen;
//! - routing rules are appended in arrival order, never reordered or
//!   deduplicated;
//! - the first non-empty default route wins and every later one is logged as
//!   a conflict;
//! - metadata keys merge with the first writer winning.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

/// One routing rule: events matching the CEL expression go to `path`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    #[serde(rename = "match")]
    pub match_expr: String,
    pub path: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Routes {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rules: Vec<Rule>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
}

/// A topic subscription, used both for a module's declaration and for the
/// merged descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    pub pubsubname: String,
    pub topic: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, String>,
    pub routes: Routes,
}

impl Subscription {
    pub fn new(pubsubname: impl Into<String>, topic: impl Into<String>) -> Self {
        Self {
            pubsubname: pubsubname.into(),
            topic: topic.into(),
            metadata: BTreeMap::new(),
            routes: Routes::default(),
        }
    }

    /// Add a routing rule.
    pub fn rule(mut self, match_expr: impl Into<String>, path: impl Into<String>) -> Self {
        self.routes.rules.push(Rule {
            match_expr: match_expr.into(),
            path: path.into(),
        });
        self
    }

    /// Set the route used when no rule matches.
    pub fn default_route(mut self, path: impl Into<String>) -> Self {
        self.routes.default = Some(path.into());
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// The default route, if set and non-empty.
    pub fn default_path(&self) -> Option<&str> {
        self.routes.default.as_deref().filter(|path| !path.is_empty())
    }
}

/// Something that declares topic subscriptions.
pub trait Subscriber {
    fn subscriptions(&self) -> Vec<Subscription>;
}

/// Merge the declarations of `subscribers`, in order.
pub fn subscribe(subscribers: &[&dyn Subscriber]) -> Vec<Subscription> {
    merge(subscribers.iter().flat_map(|s| s.subscriptions()))
}

/// Merge declarations into one descriptor per `(pubsubname, topic)`.
pub fn merge<I>(declarations: I) -> Vec<Subscription>
where
    I: IntoIterator<Item = Subscription>,
{
    let mut merged: Vec<Subscription> = Vec::new();
    let mut index: HashMap<(String, String), usize> = HashMap::new();

    for declaration in declarations {
        let key = (declaration.pubsubname.clone(), declaration.topic.clone());
        let position = *index.entry(key).or_insert_with(|| {
            merged.push(Subscription::new(
                declaration.pubsubname.clone(),
                declaration.topic.clone(),
            ));
            merged.len() - 1
        });
        let descriptor = &mut merged[position];

        for (key, value) in &declaration.metadata {
            descriptor
                .metadata
                .entry(key.clone())
                .or_insert_with(|| value.clone());
        }

        if let Some(path) = declaration.default_path() {
            match descriptor.default_path() {
                None => descriptor.routes.default = Some(path.to_string()),
                Some(existing) => tracing::error!(
                    pubsub = %descriptor.pubsubname,
                    topic = %descriptor.topic,
                    existing,
                    duplicate = path,
                    "duplicate default route"
                ),
            }
        }

        descriptor.routes.rules.extend(declaration.routes.rules);
    }

    merged
}

#[cfg(feature = "grpc")]
impl From<&Subscription> for super::proto::TopicSubscription {
    fn from(subscription: &Subscription) -> Self {
        use super::proto::{TopicRoutes, TopicRule};

        Self {
            pubsub_name: subscription.pubsubname.clone(),
            topic: subscription.topic.clone(),
            metadata: subscription
                .metadata
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
            routes: Some(TopicRoutes {
                rules: subscription
                    .routes
                    .rules
                    .iter()
                    .map(|rule| TopicRule {
                        match_expr: rule.match_expr.clone(),
                        path: rule.path.clone(),
                    })
                    .collect(),
                default: subscription.routes.default.clone().unwrap_or_default(),
            }),
        }
    }
}
