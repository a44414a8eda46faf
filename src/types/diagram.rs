//! Sequence diagram model: endpoints, handlers and arrows.
//!
//! All entities live in arenas owned by [`SequenceDiagram`] and refer to
//! each other by index handles. An arrow is only ever created already
//! linked to its sending and processing handlers (see [`SequenceDiagram::link`]).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::message::EndpointAddress;
use crate::canonical::canonical_hash_hex;

/// Handle of an endpoint within a [`SequenceDiagram`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EndpointId(pub(crate) usize);

/// Handle of a handler within a [`SequenceDiagram`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HandlerId(pub(crate) usize);

/// Handle of an arrow within a [`SequenceDiagram`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArrowId(pub(crate) usize);

impl EndpointId {
    /// Position of the endpoint in diagram order.
    pub fn index(&self) -> usize {
        self.0
    }
}

impl HandlerId {
    /// Position of the handler in creation order.
    pub fn index(&self) -> usize {
        self.0
    }
}

impl ArrowId {
    /// Position of the arrow in traversal order.
    pub fn index(&self) -> usize {
        self.0
    }
}

/// Semantic type of a message exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArrowType {
    /// Published event.
    Event,
    /// Command sent to another endpoint.
    Command,
    /// Saga timeout delivered back to the saga.
    Timeout,
    /// Message sent and processed by the same endpoint.
    LocalDispatch,
}

impl ArrowType {
    /// Parse arrow type from string.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "event" => Some(Self::Event),
            "command" => Some(Self::Command),
            "timeout" => Some(Self::Timeout),
            "local_dispatch" | "local-dispatch" | "local" => Some(Self::LocalDispatch),
            _ => None,
        }
    }
}

impl fmt::Display for ArrowType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Event => write!(f, "event"),
            Self::Command => write!(f, "command"),
            Self::Timeout => write!(f, "timeout"),
            Self::LocalDispatch => write!(f, "local_dispatch"),
        }
    }
}

/// Outcome of a handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HandlerState {
    /// Completed successfully.
    Success,
    /// Processing failed.
    Fail,
}

impl Default for HandlerState {
    fn default() -> Self {
        Self::Success
    }
}

/// A lifeline in the diagram: one endpoint identity at one version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointItem {
    /// Endpoint identity.
    pub address: EndpointAddress,
    /// Version tag, when one was observed.
    pub version: Option<String>,
    /// Handlers on this lifeline, in first-seen order.
    pub handlers: Vec<HandlerId>,
}

impl EndpointItem {
    /// Create an endpoint item without handlers.
    pub fn new(address: EndpointAddress, version: Option<String>) -> Self {
        Self {
            address,
            version,
            handlers: Vec::new(),
        }
    }

    /// Endpoint name.
    pub fn name(&self) -> &str {
        &self.address.name
    }
}

/// One processing step at one endpoint: the point on a lifeline where a
/// message is sent from or handled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Handler {
    /// Triggering message id, or the root sentinel for root senders.
    pub id: String,
    /// Display name (the processed message type), absent for pure senders.
    pub name: Option<String>,
    /// Owning endpoint.
    pub endpoint: EndpointId,
    /// Outcome of the step.
    pub state: HandlerState,
    /// Saga this step ran in, if any.
    pub part_of_saga: Option<String>,
    /// When the step happened.
    pub handled_at: Option<DateTime<Utc>>,
    incoming: Option<ArrowId>,
    outgoing: Vec<ArrowId>,
}

impl Handler {
    /// Create an unlinked handler owned by `endpoint`.
    pub fn new(id: impl Into<String>, endpoint: EndpointId) -> Self {
        Self {
            id: id.into(),
            name: None,
            endpoint,
            state: HandlerState::Success,
            part_of_saga: None,
            handled_at: None,
            incoming: None,
            outgoing: Vec::new(),
        }
    }

    /// Arrow that triggered this handler.
    pub fn incoming(&self) -> Option<ArrowId> {
        self.incoming
    }

    /// Arrows sent by this handler, in traversal order.
    pub fn outgoing(&self) -> &[ArrowId] {
        &self.outgoing
    }

    /// Set the incoming arrow. Returns `false` if one was already set.
    fn set_incoming(&mut self, arrow: ArrowId) -> bool {
        if self.incoming.is_some() {
            return false;
        }
        self.incoming = Some(arrow);
        true
    }
}

/// Unlinked arrow value, produced by classification before linking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArrowDraft {
    /// Triggering message id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Semantic type.
    pub arrow_type: ArrowType,
}

/// Directed, classified message from a sending to a processing handler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Arrow {
    /// Triggering message id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Semantic type.
    pub arrow_type: ArrowType,
    /// Sending handler.
    pub from: HandlerId,
    /// Processing handler.
    pub to: HandlerId,
}

/// Outcome of [`SequenceDiagram::link`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Link {
    /// The new arrow.
    pub arrow: ArrowId,
    /// Whether the arrow became the processing handler's incoming arrow.
    /// `false` when the handler already had one, which is kept.
    pub incoming_set: bool,
}

/// Reconstructed conversation, ready for rendering.
///
/// Endpoints are in first-seen traversal order, arrows in traversal order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequenceDiagram {
    endpoints: Vec<EndpointItem>,
    handlers: Vec<Handler>,
    arrows: Vec<Arrow>,
}

impl SequenceDiagram {
    /// Create an empty diagram.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an endpoint lifeline.
    pub fn push_endpoint(&mut self, endpoint: EndpointItem) -> EndpointId {
        self.endpoints.push(endpoint);
        EndpointId(self.endpoints.len() - 1)
    }

    /// Store a handler in the arena without attaching it to its endpoint.
    pub(crate) fn push_handler(&mut self, handler: Handler) -> HandlerId {
        self.handlers.push(handler);
        HandlerId(self.handlers.len() - 1)
    }

    /// Attach a stored handler to its endpoint's lifeline.
    pub(crate) fn attach_handler(&mut self, id: HandlerId) {
        let endpoint = self.handlers[id.0].endpoint;
        self.endpoints[endpoint.0].handlers.push(id);
    }

    /// Create an arrow from a draft and wire it between two handlers.
    ///
    /// The arrow is appended to `from`'s outgoing list. It becomes `to`'s
    /// incoming arrow unless `to` already has one.
    pub fn link(&mut self, draft: ArrowDraft, from: HandlerId, to: HandlerId) -> Link {
        let arrow = ArrowId(self.arrows.len());
        self.arrows.push(Arrow {
            id: draft.id,
            name: draft.name,
            arrow_type: draft.arrow_type,
            from,
            to,
        });

        let incoming_set = self.handlers[to.0].set_incoming(arrow);
        self.handlers[from.0].outgoing.push(arrow);

        Link { arrow, incoming_set }
    }

    /// All endpoints in diagram order.
    pub fn endpoints(&self) -> &[EndpointItem] {
        &self.endpoints
    }

    /// Iterate endpoints with their handles.
    pub fn endpoint_ids(&self) -> impl Iterator<Item = EndpointId> {
        (0..self.endpoints.len()).map(EndpointId)
    }

    /// Get an endpoint by handle.
    pub fn endpoint(&self, id: EndpointId) -> Option<&EndpointItem> {
        self.endpoints.get(id.0)
    }

    /// Get a handler by handle.
    pub fn handler(&self, id: HandlerId) -> Option<&Handler> {
        self.handlers.get(id.0)
    }

    /// Get an arrow by handle.
    pub fn arrow(&self, id: ArrowId) -> Option<&Arrow> {
        self.arrows.get(id.0)
    }

    /// Handlers on an endpoint's lifeline, in order.
    pub fn handlers_of(&self, endpoint: EndpointId) -> impl Iterator<Item = &Handler> {
        self.endpoints
            .get(endpoint.0)
            .into_iter()
            .flat_map(move |e| e.handlers.iter().map(move |h| &self.handlers[h.0]))
    }

    /// Incoming arrow of a handler.
    pub fn incoming(&self, handler: HandlerId) -> Option<&Arrow> {
        self.handler(handler)
            .and_then(|h| h.incoming)
            .map(|a| &self.arrows[a.0])
    }

    /// Outgoing arrows of a handler, in order.
    pub fn outgoing(&self, handler: HandlerId) -> impl Iterator<Item = &Arrow> {
        self.handler(handler)
            .into_iter()
            .flat_map(move |h| h.outgoing.iter().map(move |a| &self.arrows[a.0]))
    }

    /// All handlers in creation order.
    pub fn handlers(&self) -> &[Handler] {
        &self.handlers
    }

    /// All arrows in traversal order.
    pub fn arrows(&self) -> &[Arrow] {
        &self.arrows
    }

    /// Number of endpoints.
    pub fn num_endpoints(&self) -> usize {
        self.endpoints.len()
    }

    /// Number of handlers.
    pub fn num_handlers(&self) -> usize {
        self.handlers.len()
    }

    /// Number of arrows.
    pub fn num_arrows(&self) -> usize {
        self.arrows.len()
    }

    /// Whether the diagram is empty.
    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }

    /// Stable hex fingerprint of the whole diagram.
    ///
    /// Equal diagrams always have equal fingerprints.
    pub fn fingerprint(&self) -> Result<String, serde_json::Error> {
        canonical_hash_hex(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(id: &str, arrow_type: ArrowType) -> ArrowDraft {
        ArrowDraft {
            id: id.to_string(),
            name: id.to_string(),
            arrow_type,
        }
    }

    fn two_handler_diagram() -> (SequenceDiagram, HandlerId, HandlerId) {
        let mut diagram = SequenceDiagram::new();
        let a = diagram.push_endpoint(EndpointItem::new(EndpointAddress::new("A", "h", "1"), None));
        let b = diagram.push_endpoint(EndpointItem::new(EndpointAddress::new("B", "h", "2"), None));
        let from = diagram.push_handler(Handler::new("First", a));
        let to = diagram.push_handler(Handler::new("m1", b));
        diagram.attach_handler(from);
        diagram.attach_handler(to);
        (diagram, from, to)
    }

    #[test]
    fn test_link_wires_both_ends() {
        let (mut diagram, from, to) = two_handler_diagram();

        let link = diagram.link(draft("m1", ArrowType::Command), from, to);

        assert!(link.incoming_set);
        assert_eq!(diagram.handler(to).unwrap().incoming(), Some(link.arrow));
        assert_eq!(diagram.handler(from).unwrap().outgoing(), &[link.arrow]);
        let arrow = diagram.arrow(link.arrow).unwrap();
        assert_eq!(arrow.from, from);
        assert_eq!(arrow.to, to);
    }

    #[test]
    fn test_incoming_is_never_overwritten() {
        let (mut diagram, from, to) = two_handler_diagram();

        let first = diagram.link(draft("m1", ArrowType::Command), from, to);
        let second = diagram.link(draft("m1", ArrowType::Command), from, to);

        assert!(first.incoming_set);
        assert!(!second.incoming_set);
        assert_eq!(diagram.handler(to).unwrap().incoming(), Some(first.arrow));
        assert_eq!(diagram.handler(from).unwrap().outgoing().len(), 2);
        assert_eq!(diagram.num_arrows(), 2);
    }

    #[test]
    fn test_handlers_of_follows_attach_order() {
        let (diagram, _, _) = two_handler_diagram();
        let ids: Vec<_> = diagram.endpoint_ids().collect();

        let names: Vec<_> = diagram.handlers_of(ids[0]).map(|h| h.id.as_str()).collect();
        assert_eq!(names, vec!["First"]);
        let names: Vec<_> = diagram.handlers_of(ids[1]).map(|h| h.id.as_str()).collect();
        assert_eq!(names, vec!["m1"]);
    }

    #[test]
    fn test_arrow_type_parsing() {
        assert_eq!(ArrowType::from_str("Event"), Some(ArrowType::Event));
        assert_eq!(ArrowType::from_str("local-dispatch"), Some(ArrowType::LocalDispatch));
        assert_eq!(ArrowType::from_str("bogus"), None);
        assert_eq!(ArrowType::LocalDispatch.to_string(), "local_dispatch");
    }

    #[test]
    fn test_fingerprint_tracks_content() {
        let (mut diagram, from, to) = two_handler_diagram();
        let before = diagram.fingerprint().unwrap();
        assert_eq!(before, diagram.clone().fingerprint().unwrap());

        diagram.link(draft("m1", ArrowType::Event), from, to);
        assert_ne!(before, diagram.fingerprint().unwrap());
    }
}
