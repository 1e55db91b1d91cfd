//! CloudEvent envelope decoding.
//!
//! The sidecar wraps every published message in a CloudEvents 1.0 envelope.
//! [`decode`] turns the structured-mode JSON body of a raw HTTP delivery into
//! an [`Envelope`]; gRPC deliveries arrive already split into fields and are
//! converted with `Envelope::from(TopicEventRequest)`.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::error::ApiError;

/// Malformed inbound event. Never retried.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("malformed cloud event: {0}")]
    Envelope(#[from] serde_json::Error),
    #[error("malformed data_base64: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("could not decode event data: {0}")]
    Data(#[source] serde_json::Error),
}

impl From<DecodeError> for ApiError {
    fn from(err: DecodeError) -> Self {
        ApiError::bad_request(err.to_string()).with_cause(err)
    }
}

/// A decoded event, independent of the wire encoding it arrived in.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Envelope {
    pub id: String,
    pub source: String,
    pub spec_version: String,
    pub event_type: String,
    pub data_content_type: Option<String>,
    pub data_schema: Option<String>,
    pub subject: Option<String>,
    pub time: Option<DateTime<Utc>>,
    pub payload: Vec<u8>,
}

impl Envelope {
    /// Unmarshal the payload into `T`.
    pub fn data<T: DeserializeOwned>(&self) -> Result<T, DecodeError> {
        serde_json::from_slice(&self.payload).map_err(DecodeError::Data)
    }
}

#[derive(Deserialize)]
struct WireEvent {
    #[serde(default)]
    id: String,
    #[serde(default)]
    source: String,
    #[serde(default, rename = "specversion")]
    spec_version: String,
    #[serde(default, rename = "type")]
    event_type: String,
    #[serde(default, rename = "datacontenttype")]
    data_content_type: Option<String>,
    #[serde(default, rename = "dataschema")]
    data_schema: Option<String>,
    #[serde(default)]
    subject: Option<String>,
    #[serde(default)]
    time: Option<DateTime<Utc>>,
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    data_base64: Option<String>,
}

/// Decode a structured-mode CloudEvent JSON body.
pub fn decode(body: &[u8]) -> Result<Envelope, DecodeError> {
    let wire: WireEvent = serde_json::from_slice(body)?;
    let payload = payload(
        wire.data_content_type.as_deref(),
        wire.data,
        wire.data_base64,
    )?;
    Ok(Envelope {
        id: wire.id,
        source: wire.source,
        spec_version: wire.spec_version,
        event_type: wire.event_type,
        data_content_type: wire.data_content_type,
        data_schema: wire.data_schema,
        subject: wire.subject,
        time: wire.time,
        payload,
    })
}

fn payload(
    content_type: Option<&str>,
    data: Option<Value>,
    data_base64: Option<String>,
) -> Result<Vec<u8>, DecodeError> {
    if let Some(encoded) = data_base64 {
        return Ok(STANDARD.decode(encoded)?);
    }
    match data {
        None => Ok(Vec::new()),
        Some(Value::String(text)) if !is_json(content_type) => Ok(text.into_bytes()),
        Some(value) => Ok(serde_json::to_vec(&value)?),
    }
}

/// A missing content type means JSON.
pub(crate) fn is_json(content_type: Option<&str>) -> bool {
    let Some(content_type) = content_type else {
        return true;
    };
    let media_type = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    media_type == "application/json" || media_type == "text/json" || media_type.ends_with("+json")
}

#[cfg(feature = "grpc")]
impl From<super::proto::TopicEventRequest> for Envelope {
    fn from(event: super::proto::TopicEventRequest) -> Self {
        let non_empty = |s: String| if s.is_empty() { None } else { Some(s) };
        Self {
            id: event.id,
            source: event.source,
            spec_version: event.spec_version,
            event_type: event.event_type,
            data_content_type: non_empty(event.data_content_type),
            data_schema: None,
            subject: None,
            time: None,
            payload: event.data,
        }
    }
}
