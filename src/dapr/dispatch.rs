//! Event handler registry and dispatch by routing path.
//!
//! The raw HTTP and raw gRPC callback servers each own one `DispatchTable`.
//! Feature modules fill it through [`EventRegistrar`] before the table is
//! frozen into an `Arc` and handed to a server, so nothing can register once
//! traffic is flowing.
//!
//! ## Example
//!
//! ```ignore
//! let mut table = DispatchTable::new();
//! table.register("/widgets.v1", |envelope| async move {
//!     let widget: Widget = envelope.data()?;
//!     store.save(&widget).await
//! });
//! let table = Arc::new(table);
//! table.dispatch("/widgets.v1", envelope).await?;
//! ```

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt};
use thiserror::Error;

use super::cloudevent::Envelope;
use crate::error::ApiError;

pub type HandlerFuture = BoxFuture<'static, Result<(), ApiError>>;

/// An event handler: receives the envelope, returns the outcome.
pub type EventHandler = Arc<dyn Fn(Envelope) -> HandlerFuture + Send + Sync>;

/// No handler is registered for the path an event was delivered to.
///
/// This is a registration or deployment mismatch, never a caller error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("handler not found for path {path:?}")]
pub struct HandlerNotFound {
    pub path: String,
}

/// Routing path → handler.
#[derive(Clone, Default)]
pub struct DispatchTable {
    handlers: HashMap<String, EventHandler>,
}

impl DispatchTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for `path`.
    ///
    /// Paths are matched with a leading `/`, added here if missing.
    /// Registering a path twice replaces the earlier handler.
    pub fn register<F, Fut>(&mut self, path: &str, handler: F) -> &mut Self
    where
        F: Fn(Envelope) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), ApiError>> + Send + 'static,
    {
        let path = normalize_path(path);
        let handler: EventHandler = Arc::new(move |envelope| handler(envelope).boxed());
        if self.handlers.insert(path.clone(), handler).is_some() {
            tracing::warn!(path = %path, "event handler replaced");
        }
        self
    }

    pub fn contains(&self, path: &str) -> bool {
        self.handlers.contains_key(&normalize_path(path))
    }

    /// Registered paths, sorted.
    pub fn paths(&self) -> Vec<&str> {
        let mut paths: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        paths.sort_unstable();
        paths
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Route `envelope` to the handler for `path` and return its result
    /// unchanged.
    pub async fn dispatch(&self, path: &str, envelope: Envelope) -> Result<(), ApiError> {
        let path = normalize_path(path);
        let Some(handler) = self.handlers.get(&path).cloned() else {
            let err = HandlerNotFound { path };
            tracing::error!(path = %err.path, event_id = %envelope.id, "{err}");
            let message = err.to_string();
            return Err(ApiError::internal(err, message));
        };
        handler(envelope).await
    }
}

impl fmt::Debug for DispatchTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DispatchTable")
            .field("paths", &self.paths())
            .finish()
    }
}

/// A feature module's handler registration for the raw transports.
pub trait EventRegistrar {
    fn register_events(&self, table: &mut DispatchTable);
}

/// Build one table from every registrar, in order.
pub fn table(registrars: &[&dyn EventRegistrar]) -> DispatchTable {
    let mut table = DispatchTable::new();
    for registrar in registrars {
        registrar.register_events(&mut table);
    }
    table
}

fn normalize_path(path: &str) -> String {
    if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{path}")
    }
}
