//! Core types for the conversation kernel.

pub mod message;
pub mod diagram;

pub use message::{EndpointAddress, Header, MessageIntent, MessageStatus, SagaInfo, StoredMessage};
pub use diagram::{
    Arrow, ArrowDraft, ArrowId, ArrowType, EndpointId, EndpointItem, Handler, HandlerId,
    HandlerState, Link, SequenceDiagram,
};
