//! Transport message types.

use std::collections::HashMap;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// One serialized envelope travelling over a transport.
#[derive(Debug, Clone)]
pub struct TransportMessage {
    /// The JSON payload.
    pub payload: Bytes,

    /// Metadata associated with the message.
    pub metadata: TransportMessageMetadata,
}

impl TransportMessage {
    /// Creates a new `TransportMessage` with default metadata.
    pub fn new(payload: impl Into<Bytes>) -> Self {
        Self {
            payload: payload.into(),
            metadata: TransportMessageMetadata::default(),
        }
    }

    /// Creates a JSON message tagged with a correlation id.
    pub fn json(payload: impl Into<Bytes>, correlation_id: impl Into<String>) -> Self {
        Self {
            payload: payload.into(),
            metadata: TransportMessageMetadata {
                content_type: Some("application/json".to_string()),
                correlation_id: Some(correlation_id.into()),
                headers: HashMap::new(),
            },
        }
    }

    /// Returns the size of the message payload in bytes.
    pub fn size(&self) -> usize {
        self.payload.len()
    }

    /// Returns the correlation ID of the message, if specified.
    pub fn correlation_id(&self) -> Option<&str> {
        self.metadata.correlation_id.as_deref()
    }
}

/// Metadata associated with a `TransportMessage`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransportMessageMetadata {
    /// The MIME type of the payload (e.g., "application/json").
    pub content_type: Option<String>,

    /// An ID used to correlate requests and responses in logs.
    pub correlation_id: Option<String>,

    /// Transport-specific headers.
    pub headers: HashMap<String, String>,
}
