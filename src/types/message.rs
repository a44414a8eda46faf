//! Message audit records, the input of a reconstruction pass.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Location of a logical service instance.
///
/// Two addresses denote the same endpoint identity iff name, host and
/// host id all match exactly (case-sensitive).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EndpointAddress {
    /// Logical endpoint name.
    pub name: String,
    /// Machine the endpoint runs on.
    #[serde(default)]
    pub host: String,
    /// Stable identifier of the host.
    #[serde(default)]
    pub host_id: String,
}

impl EndpointAddress {
    /// Create a new endpoint address.
    pub fn new(name: impl Into<String>, host: impl Into<String>, host_id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            host: host.into(),
            host_id: host_id.into(),
        }
    }
}

impl fmt::Display for EndpointAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.name, self.host)
    }
}

/// Why a message was sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageIntent {
    /// Point-to-point command.
    Send,
    /// Event published to subscribers.
    Publish,
    /// Subscription request.
    Subscribe,
    /// Unsubscription request.
    Unsubscribe,
    /// Reply to the originator of the incoming message.
    Reply,
    /// Infrastructure initialization message.
    Init,
}

impl MessageIntent {
    /// Parse intent from string.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "send" => Some(Self::Send),
            "publish" => Some(Self::Publish),
            "subscribe" => Some(Self::Subscribe),
            "unsubscribe" => Some(Self::Unsubscribe),
            "reply" => Some(Self::Reply),
            "init" => Some(Self::Init),
            _ => None,
        }
    }
}

impl Default for MessageIntent {
    fn default() -> Self {
        Self::Send
    }
}

impl fmt::Display for MessageIntent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Send => write!(f, "send"),
            Self::Publish => write!(f, "publish"),
            Self::Subscribe => write!(f, "subscribe"),
            Self::Unsubscribe => write!(f, "unsubscribe"),
            Self::Reply => write!(f, "reply"),
            Self::Init => write!(f, "init"),
        }
    }
}

/// Processing status recorded by the audit service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageStatus {
    /// Processing failed.
    Failed,
    /// Processing failed more than once.
    RepeatedFailure,
    /// Processed without error.
    Successful,
    /// Failed earlier, succeeded on retry.
    ResolvedSuccessfully,
    /// Failure archived by an operator.
    ArchivedFailure,
    /// A retry was requested and is pending.
    RetryIssued,
}

impl MessageStatus {
    /// Whether this status marks the processing attempt as failed.
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            Self::Failed | Self::RepeatedFailure | Self::ArchivedFailure
        )
    }
}

impl Default for MessageStatus {
    fn default() -> Self {
        Self::Successful
    }
}

/// A single message header.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Header {
    /// Header key as written by the sender.
    pub key: String,
    /// Raw header value.
    #[serde(default)]
    pub value: String,
}

impl Header {
    /// Create a new header.
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// A saga (long-running workflow) invoked while processing a message.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SagaInfo {
    /// Assembly qualified saga type name.
    pub saga_type: String,
    /// Saga instance identifier.
    #[serde(default)]
    pub saga_id: Option<String>,
    /// Change applied to the saga instance ("New", "Updated", "Completed").
    #[serde(default)]
    pub change_status: Option<String>,
}

impl SagaInfo {
    /// Create saga info with only a type name.
    pub fn new(saga_type: impl Into<String>) -> Self {
        Self {
            saga_type: saga_type.into(),
            saga_id: None,
            change_status: None,
        }
    }
}

/// One audited message, as fetched from the audit service.
///
/// Immutable input of reconstruction. The causal parent lives in the
/// related-to header; see [`crate::headers`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredMessage {
    /// Transport-level message identifier.
    pub message_id: String,
    /// Parent message id as reported by the audit service, if any.
    #[serde(default)]
    pub related_to_message_id: Option<String>,
    /// Endpoint that sent the message.
    pub sending_endpoint: EndpointAddress,
    /// Endpoint that processed the message.
    pub receiving_endpoint: EndpointAddress,
    /// Assembly qualified message type name.
    #[serde(default)]
    pub message_type: String,
    /// Why the message was sent.
    #[serde(default)]
    pub message_intent: MessageIntent,
    /// Headers in wire order.
    #[serde(default)]
    pub headers: Vec<Header>,
    /// When the sender dispatched the message.
    #[serde(default)]
    pub time_sent: Option<DateTime<Utc>>,
    /// When the receiver finished processing the message.
    #[serde(default)]
    pub processed_at: Option<DateTime<Utc>>,
    /// Processing outcome.
    #[serde(default)]
    pub status: MessageStatus,
    /// Sagas invoked while processing, in audit order.
    #[serde(default)]
    pub invoked_sagas: Vec<SagaInfo>,
}

impl StoredMessage {
    /// Create a message with defaults for everything but identity and routing.
    pub fn new(
        message_id: impl Into<String>,
        sending_endpoint: EndpointAddress,
        receiving_endpoint: EndpointAddress,
        message_type: impl Into<String>,
    ) -> Self {
        Self {
            message_id: message_id.into(),
            related_to_message_id: None,
            sending_endpoint,
            receiving_endpoint,
            message_type: message_type.into(),
            message_intent: MessageIntent::Send,
            headers: Vec::new(),
            time_sent: None,
            processed_at: None,
            status: MessageStatus::Successful,
            invoked_sagas: Vec::new(),
        }
    }

    /// Set the message intent.
    pub fn with_intent(mut self, intent: MessageIntent) -> Self {
        self.message_intent = intent;
        self
    }

    /// Append a header.
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push(Header::new(key, value));
        self
    }

    /// Set sent and processed timestamps.
    pub fn with_times(mut self, time_sent: DateTime<Utc>, processed_at: DateTime<Utc>) -> Self {
        self.time_sent = Some(time_sent);
        self.processed_at = Some(processed_at);
        self
    }

    /// Set the processing status.
    pub fn with_status(mut self, status: MessageStatus) -> Self {
        self.status = status;
        self
    }

    /// Append an invoked saga.
    pub fn with_saga(mut self, saga: SagaInfo) -> Self {
        self.invoked_sagas.push(saga);
        self
    }

    /// Whether the message was sent and processed by the same endpoint identity.
    pub fn is_local(&self) -> bool {
        self.sending_endpoint == self.receiving_endpoint
    }
}
