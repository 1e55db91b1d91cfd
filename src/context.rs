//! Inbound call metadata, carried across outbound calls.
//!
//! Each callback handler runs inside [`CallContext::scope`], which makes the
//! inbound metadata (HTTP headers or gRPC metadata) available to anything the
//! handler calls through [`CallContext::current`]. Outbound gRPC calls copy it
//! onto the request with [`outbound_request`], so caller context such as
//! tracing headers reaches the sidecar without every repository threading a
//! context argument by hand.
//!
//! Dropping the handler future (client disconnect, shutdown) drops any
//! in-flight outbound call with it.

use std::future::Future;

/// Metadata key the sidecar uses to route service invocation.
pub const APP_ID_METADATA: &str = "dapr-app-id";

/// Keys that describe the inbound connection itself and must not be copied
/// onto an outbound call.
const RESERVED_KEYS: &[&str] = &[
    "host",
    "connection",
    "content-length",
    "content-type",
    "keep-alive",
    "proxy-connection",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
    "user-agent",
    "accept-encoding",
    "dapr-api-token",
];

tokio::task_local! {
    static CURRENT: CallContext;
}

/// Metadata of the inbound request being handled.
///
/// Keys are lowercased; a key may appear more than once, in arrival order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallContext {
    metadata: Vec<(String, String)>,
}

impl CallContext {
    /// Create an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a context from key/value pairs.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut context = Self::new();
        for (key, value) in pairs {
            context.append(key, value);
        }
        context
    }

    /// Append a value, keeping any existing values for the same key.
    pub fn append(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.metadata
            .push((key.into().to_ascii_lowercase(), value.into()));
    }

    /// First value for `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.metadata
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }

    /// All values for `key`, in arrival order.
    pub fn get_all<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.metadata
            .iter()
            .filter(move |(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.metadata.is_empty()
    }

    pub fn metadata(&self) -> &[(String, String)] {
        &self.metadata
    }

    /// Copy of this context addressed to another application.
    ///
    /// The copy keeps every inbound value and appends `dapr-app-id`.
    pub fn invoking(&self, app_id: &str) -> Self {
        let mut context = self.clone();
        context.append(APP_ID_METADATA, app_id);
        context
    }

    /// The context of the handler currently running on this task, or an
    /// empty one outside any handler.
    pub fn current() -> Self {
        CURRENT.try_with(Clone::clone).unwrap_or_default()
    }

    /// Run `future` with this context installed as [`CallContext::current`].
    pub async fn scope<F: Future>(self, future: F) -> F::Output {
        CURRENT.scope(self, future).await
    }

    fn is_forwardable(key: &str) -> bool {
        !key.starts_with("grpc-") && !key.starts_with(':') && !RESERVED_KEYS.contains(&key)
    }
}

#[cfg(feature = "http")]
impl CallContext {
    /// Build a context from HTTP request headers.
    pub fn from_headers(headers: &axum::http::HeaderMap) -> Self {
        let mut context = Self::new();
        for (name, value) in headers.iter() {
            if let Ok(v) = value.to_str() {
                context.append(name.as_str(), v);
            }
        }
        context
    }
}

#[cfg(feature = "grpc")]
impl CallContext {
    /// Build a context from inbound gRPC metadata (ASCII entries only).
    pub fn from_metadata(metadata: &tonic::metadata::MetadataMap) -> Self {
        let mut context = Self::new();
        for kv in metadata.iter() {
            if let tonic::metadata::KeyAndValueRef::Ascii(key, value) = kv {
                if let Ok(v) = value.to_str() {
                    context.append(key.as_str(), v);
                }
            }
        }
        context
    }

    /// Write this context onto an outbound gRPC request.
    ///
    /// Connection-level keys are skipped, as is anything that is not valid
    /// ASCII metadata.
    pub fn apply<T>(&self, request: &mut tonic::Request<T>) {
        use tonic::metadata::{AsciiMetadataKey, AsciiMetadataValue};

        let metadata = request.metadata_mut();
        for (key, value) in &self.metadata {
            if !Self::is_forwardable(key) {
                continue;
            }
            let (Ok(key), Ok(value)) = (
                AsciiMetadataKey::from_bytes(key.as_bytes()),
                AsciiMetadataValue::try_from(value.as_str()),
            ) else {
                continue;
            };
            metadata.append(key, value);
        }
    }
}

/// Copy the current call context onto an outbound gRPC request.
///
/// With an `app_id` the request is addressed to that application through the
/// sidecar. This is the one place outbound metadata is assembled; the gRPC
/// client interceptor and the service-invocation repositories both use it.
#[cfg(feature = "grpc")]
pub fn propagate<T>(request: &mut tonic::Request<T>, app_id: Option<&str>) {
    let context = match app_id {
        Some(app_id) => CallContext::current().invoking(app_id),
        None => CallContext::current(),
    };
    context.apply(request);
}

/// Wrap `message` in a request carrying the current call context.
#[cfg(feature = "grpc")]
pub fn outbound_request<T>(message: T, app_id: Option<&str>) -> tonic::Request<T> {
    let mut request = tonic::Request::new(message);
    propagate(&mut request, app_id);
    request
}

/// Interceptor that copies the current call context onto every call made
/// through a client it is installed on.
#[cfg(feature = "grpc")]
#[derive(Debug, Clone, Copy, Default)]
pub struct PropagateMetadata;

#[cfg(feature = "grpc")]
impl tonic::service::Interceptor for PropagateMetadata {
    fn call(&mut self, mut request: tonic::Request<()>) -> Result<tonic::Request<()>, tonic::Status> {
        propagate(&mut request, None);
        Ok(request)
    }
}
