use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use crate::dapr::cloudevent::{self, DecodeError, Envelope};
use crate::dapr::proto::TopicEventRequest;

/// Event data in whichever form the transport produced it.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum TopicEventData {
    #[default]
    Empty,
    Bytes(Vec<u8>),
    Text(String),
    /// Already-parsed JSON.
    Structured(Value),
}

/// A topic event as delivered to an SDK handler.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TopicEvent {
    pub id: String,
    pub source: String,
    pub event_type: String,
    pub spec_version: String,
    pub data_content_type: Option<String>,
    pub subject: Option<String>,
    pub time: Option<DateTime<Utc>>,
    pub topic: String,
    pub pubsub_name: String,
    pub data: TopicEventData,
}

impl TopicEvent {
    /// Unmarshal the data into `T`.
    ///
    /// Structured data is serialised back to bytes first: the SDK hands out
    /// parsed JSON, while typed decoding starts from bytes.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, DecodeError> {
        let bytes = self.raw_data()?;
        serde_json::from_slice(&bytes).map_err(DecodeError::Data)
    }

    /// The data as bytes, whatever form it arrived in.
    pub fn raw_data(&self) -> Result<Vec<u8>, DecodeError> {
        match &self.data {
            TopicEventData::Empty => Ok(Vec::new()),
            TopicEventData::Bytes(bytes) => Ok(bytes.clone()),
            TopicEventData::Text(text) => Ok(text.clone().into_bytes()),
            TopicEventData::Structured(value) => Ok(serde_json::to_vec(value)?),
        }
    }

    /// Normalise into the transport-independent envelope.
    pub fn to_envelope(&self) -> Result<Envelope, DecodeError> {
        Ok(Envelope {
            id: self.id.clone(),
            source: self.source.clone(),
            spec_version: self.spec_version.clone(),
            event_type: self.event_type.clone(),
            data_content_type: self.data_content_type.clone(),
            data_schema: None,
            subject: self.subject.clone(),
            time: self.time,
            payload: self.raw_data()?,
        })
    }

    /// Parse an HTTP delivery (structured-mode CloudEvent JSON).
    pub fn from_http_body(body: &[u8]) -> Result<Self, DecodeError> {
        #[derive(Deserialize)]
        struct Wire {
            #[serde(default)]
            id: String,
            #[serde(default)]
            source: String,
            #[serde(default, rename = "type")]
            event_type: String,
            #[serde(default, rename = "specversion")]
            spec_version: String,
            #[serde(default, rename = "datacontenttype")]
            data_content_type: Option<String>,
            #[serde(default)]
            subject: Option<String>,
            #[serde(default)]
            time: Option<DateTime<Utc>>,
            #[serde(default)]
            topic: String,
            #[serde(default)]
            pubsubname: String,
            #[serde(default)]
            data: Option<Value>,
            #[serde(default)]
            data_base64: Option<String>,
        }

        let wire: Wire = serde_json::from_slice(body)?;
        let data = match (wire.data_base64, wire.data) {
            (Some(encoded), _) => {
                use base64::Engine;
                TopicEventData::Bytes(base64::engine::general_purpose::STANDARD.decode(encoded)?)
            }
            (None, None) | (None, Some(Value::Null)) => TopicEventData::Empty,
            (None, Some(Value::String(text)))
                if !cloudevent::is_json(wire.data_content_type.as_deref()) =>
            {
                TopicEventData::Text(text)
            }
            (None, Some(value)) => TopicEventData::Structured(value),
        };

        Ok(Self {
            id: wire.id,
            source: wire.source,
            event_type: wire.event_type,
            spec_version: wire.spec_version,
            data_content_type: wire.data_content_type,
            subject: wire.subject,
            time: wire.time,
            topic: wire.topic,
            pubsub_name: wire.pubsubname,
            data,
        })
    }
}

impl From<TopicEventRequest> for TopicEvent {
    /// JSON data is parsed (falling back to raw bytes if it does not parse),
    /// `text/*` becomes text and anything else stays bytes.
    fn from(event: TopicEventRequest) -> Self {
        let content_type = if event.data_content_type.is_empty() {
            None
        } else {
            Some(event.data_content_type)
        };

        let data = if event.data.is_empty() {
            TopicEventData::Empty
        } else if cloudevent::is_json(content_type.as_deref()) {
            match serde_json::from_slice::<Value>(&event.data) {
                Ok(value) => TopicEventData::Structured(value),
                Err(_) => TopicEventData::Bytes(event.data),
            }
        } else if content_type
            .as_deref()
            .is_some_and(|ct| ct.starts_with("text/"))
        {
            match String::from_utf8(event.data) {
                Ok(text) => TopicEventData::Text(text),
                Err(err) => TopicEventData::Bytes(err.into_bytes()),
            }
        } else {
            TopicEventData::Bytes(event.data)
        };

        Self {
            id: event.id,
            source: event.source,
            event_type: event.event_type,
            spec_version: event.spec_version,
            data_content_type: content_type,
            subject: None,
            time: None,
            topic: event.topic,
            pubsub_name: event.pubsub_name,
            data,
        }
    }
}
