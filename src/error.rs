//! Error model shared by every transport.
//!
//! `ApiError` is the single user-facing failure shape. Repositories and
//! clients build it with [`ApiError::not_found`] / [`ApiError::internal`],
//! and every transport funnels failures through [`normalize`] before
//! encoding them (JSON body + status for HTTP, `tonic::Status` for gRPC).
//!
//! ## Example
//!
//! ```ignore
//! let err = ApiError::not_found(format!("widget {:?} not found", "w1"));
//! assert_eq!(err.code(), 404);
//! assert_eq!(err.message(), r#"widget "w1" not found"#);
//! ```

use std::collections::BTreeMap;
use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Free-form diagnostic metadata attached to an error. Never sent on the wire.
pub type Metadata = BTreeMap<String, Value>;

pub const NOT_FOUND: &str = "NOT_FOUND";
pub const INTERNAL_SERVER_ERROR: &str = "INTERNAL_SERVER_ERROR";
pub const BAD_REQUEST: &str = "BAD_REQUEST";

/// Metadata key under which `internal` records the wrapped cause.
pub const CAUSE_METADATA_KEY: &str = "error";

/// A failure description with a machine-readable kind and a status code.
///
/// Only `type`, `code`, `message` and `details` serialize; the metadata and
/// the wrapped cause stay in-process for diagnostics.
#[derive(Clone, Serialize)]
pub struct ApiError {
    #[serde(rename = "type")]
    kind: String,
    code: u16,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<Value>,
    #[serde(skip)]
    metadata: Option<Metadata>,
    #[serde(skip)]
    cause: Option<Arc<dyn StdError + Send + Sync + 'static>>,
}

impl ApiError {
    pub fn new(kind: impl Into<String>, code: u16, message: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            code,
            message: message.into(),
            details: None,
            metadata: None,
            cause: None,
        }
    }

    /// `NOT_FOUND` / 404.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(NOT_FOUND, 404, message)
    }

    /// `BAD_REQUEST` / 400. Used for malformed inbound payloads.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(BAD_REQUEST, 400, message)
    }

    /// `INTERNAL_SERVER_ERROR` / 500 wrapping `cause`.
    ///
    /// The cause's text is also recorded under the `"error"` metadata key.
    pub fn internal<E>(cause: E, message: impl Into<String>) -> Self
    where
        E: Into<BoxError>,
    {
        let cause: BoxError = cause.into();
        let cause: Arc<dyn StdError + Send + Sync> = Arc::from(cause);
        let mut metadata = Metadata::new();
        metadata.insert(
            CAUSE_METADATA_KEY.to_string(),
            Value::String(cause.to_string()),
        );
        Self {
            kind: INTERNAL_SERVER_ERROR.to_string(),
            code: 500,
            message: message.into(),
            details: None,
            metadata: Some(metadata),
            cause: Some(cause),
        }
    }

    /// Normalize any boxed error: an `ApiError` passes through unchanged,
    /// anything else becomes `internal` with its own text as the message.
    pub fn from_error(err: BoxError) -> Self {
        match err.downcast::<ApiError>() {
            Ok(err) => *err,
            Err(other) => {
                let message = other.to_string();
                Self::internal(other, message)
            }
        }
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn code(&self) -> u16 {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn details(&self) -> Option<&Value> {
        self.details.as_ref()
    }

    pub fn metadata(&self) -> Option<&Metadata> {
        self.metadata.as_ref()
    }

    pub fn is_not_found(&self) -> bool {
        self.code == 404
    }

    /// Downcast the wrapped cause, if any, to a concrete error type.
    pub fn cause_as<E: StdError + 'static>(&self) -> Option<&E> {
        self.cause.as_deref().and_then(|cause| cause.downcast_ref::<E>())
    }

    pub fn with_message(self, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..self
        }
    }

    pub fn with_details(self, details: Value) -> Self {
        Self {
            details: Some(details),
            ..self
        }
    }

    pub fn with_metadata(self, metadata: Metadata) -> Self {
        Self {
            metadata: Some(metadata),
            ..self
        }
    }

    pub fn with_cause<E: Into<BoxError>>(self, cause: E) -> Self {
        let cause: BoxError = cause.into();
        Self {
            cause: Some(Arc::from(cause)),
            ..self
        }
    }
}

/// Normalize an optional failure into the shared error shape.
///
/// `None` stays `None`; an `ApiError` is returned as-is; any other error is
/// wrapped as `INTERNAL_SERVER_ERROR`.
pub fn normalize<E: Into<BoxError>>(err: Option<E>) -> Option<ApiError> {
    err.map(|err| ApiError::from_error(err.into()))
}

impl fmt::Debug for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiError")
            .field("kind", &self.kind)
            .field("code", &self.code)
            .field("message", &self.message)
            .field("details", &self.details)
            .field("metadata", &self.metadata)
            .field("cause", &self.cause.as_ref().map(|c| c.to_string()))
            .finish()
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.cause {
            Some(cause) => write!(f, "{}: {}", self.message, cause),
            None => f.write_str(&self.message),
        }
    }
}

impl StdError for ApiError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.cause
            .as_deref()
            .map(|cause| cause as &(dyn StdError + 'static))
    }
}

/// Equality covers the wire-visible fields; the cause is not comparable.
impl PartialEq for ApiError {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
            && self.code == other.code
            && self.message == other.message
            && self.details == other.details
            && self.metadata == other.metadata
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        let message = err.to_string();
        Self::internal(err, message)
    }
}

// -----------------------------------------------------------------------------
// HTTP encoding
// -----------------------------------------------------------------------------

#[cfg(feature = "http")]
impl axum::response::IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        use axum::http::StatusCode;

        let status =
            StatusCode::from_u16(self.code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if status.is_server_error() {
            tracing::error!(kind = %self.kind, code = self.code, error = %self, "request failed");
        }
        (status, axum::Json(self)).into_response()
    }
}

// -----------------------------------------------------------------------------
// gRPC encoding
// -----------------------------------------------------------------------------

#[cfg(feature = "grpc")]
impl ApiError {
    /// Map a gRPC status onto the taxonomy.
    pub fn from_status(status: tonic::Status) -> Self {
        match status.code() {
            tonic::Code::NotFound => Self::not_found(status.message()),
            tonic::Code::InvalidArgument => Self::bad_request(status.message()),
            _ => {
                let message = status.message().to_string();
                Self::internal(status, message)
            }
        }
    }
}

#[cfg(feature = "grpc")]
impl From<ApiError> for tonic::Status {
    fn from(err: ApiError) -> Self {
        match err.code {
            404 => tonic::Status::not_found(err.message),
            400 => tonic::Status::invalid_argument(err.message),
            _ => {
                tracing::error!(kind = %err.kind, error = %err, "request failed");
                tonic::Status::internal(err.message)
            }
        }
    }
}
