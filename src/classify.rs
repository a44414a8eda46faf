//! Endpoint, handler and arrow classification for single records.
//!
//! Everything here builds unlinked values; wiring happens in the assembler.

use crate::headers::{self, HeaderError};
use crate::humanize;
use crate::options::CreatorOptions;
use crate::tree::WalkStep;
use crate::types::{
    ArrowDraft, ArrowType, EndpointId, EndpointItem, Handler, HandlerState, MessageIntent,
    StoredMessage,
};

/// Derives model values from audit records under a set of options.
#[derive(Debug, Clone, Copy)]
pub struct Classifier<'o> {
    options: &'o CreatorOptions,
}

impl<'o> Classifier<'o> {
    /// Create a classifier.
    pub fn new(options: &'o CreatorOptions) -> Self {
        Self { options }
    }

    fn version<'m>(&self, message: &'m StoredMessage) -> Option<&'m str> {
        headers::find(&message.headers, headers::VERSION, &self.options.header_prefix)
    }

    fn display_name(&self, type_name: &str) -> String {
        if self.options.humanize_type_names {
            humanize::type_name(type_name)
        } else {
            type_name.to_string()
        }
    }

    /// Endpoint prototype for the sender, tagged with the version header.
    pub fn sending_endpoint(&self, message: &StoredMessage) -> EndpointItem {
        EndpointItem::new(
            message.sending_endpoint.clone(),
            self.version(message).map(str::to_string),
        )
    }

    /// Endpoint prototype for the receiver.
    ///
    /// The version header describes the sender, so the receiver only gets it
    /// for local dispatch.
    pub fn processing_endpoint(&self, message: &StoredMessage) -> EndpointItem {
        let version = if message.is_local() {
            self.version(message).map(str::to_string)
        } else {
            None
        };
        EndpointItem::new(message.receiving_endpoint.clone(), version)
    }

    /// Handler that sent the step's message.
    ///
    /// Its id is the resolved parent's message id, or the root sentinel when
    /// the message is a root (orphans included).
    pub fn sending_handler(&self, step: &WalkStep<'_>, endpoint: EndpointId) -> Handler {
        let id = match step.parent {
            Some(parent) => parent.message_id.clone(),
            None => self.options.root_handler_id.clone(),
        };
        let mut handler = Handler::new(id, endpoint);
        handler.handled_at = step.message.time_sent;
        handler.state = HandlerState::Success;
        handler
    }

    /// Handler that processed the message.
    pub fn processing_handler(&self, message: &StoredMessage, endpoint: EndpointId) -> Handler {
        let mut handler = Handler::new(message.message_id.clone(), endpoint);
        handler.name = Some(message.message_type.clone());
        handler.handled_at = message.processed_at;
        handler.state = if message.status.is_failure() {
            HandlerState::Fail
        } else {
            HandlerState::Success
        };
        // Only the first saga is shown.
        handler.part_of_saga = message
            .invoked_sagas
            .first()
            .map(|saga| self.display_name(&saga.saga_type));
        handler
    }

    /// Semantic type of the exchange.
    ///
    /// Publish wins over everything; then saga timeouts; then local dispatch.
    pub fn arrow_type(&self, message: &StoredMessage) -> Result<ArrowType, HeaderError> {
        if message.message_intent == MessageIntent::Publish {
            return Ok(ArrowType::Event);
        }

        let is_timeout = headers::find_bool(
            &message.headers,
            headers::IS_SAGA_TIMEOUT,
            &self.options.header_prefix,
        )?;

        Ok(if is_timeout {
            ArrowType::Timeout
        } else if message.is_local() {
            ArrowType::LocalDispatch
        } else {
            ArrowType::Command
        })
    }

    /// Unlinked arrow for the message.
    pub fn arrow(&self, message: &StoredMessage) -> Result<ArrowDraft, HeaderError> {
        Ok(ArrowDraft {
            id: message.message_id.clone(),
            name: self.display_name(&message.message_type),
            arrow_type: self.arrow_type(message)?,
        })
    }
}
