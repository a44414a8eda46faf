//! Sequence diagram assembler.
//!
//! Turns a flat batch of audit records into a [`SequenceDiagram`].

use std::collections::HashMap;

use crate::classify::Classifier;
use crate::headers::HeaderError;
use crate::options::CreatorOptions;
use crate::registry::{EndpointRegistry, EndpointSlot, HandlerRegistry, RegistryError};
use crate::tree::{MessageForest, WalkStep};
use crate::types::{EndpointId, EndpointItem, SequenceDiagram, StoredMessage};

/// Error type for diagram reconstruction.
///
/// Any error aborts the whole batch; no partial diagram is produced.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    /// A header the classifier depends on could not be parsed.
    #[error("Malformed header on message {message_id}: {source}")]
    MalformedHeader {
        /// Message carrying the header.
        message_id: String,
        /// Parse failure.
        #[source]
        source: HeaderError,
    },
    /// Endpoint lookup before registration (internal consistency violation).
    #[error("Internal registry error: {0}")]
    Registry(#[from] RegistryError),
}

impl ModelError {
    /// Whether this error is a broken internal invariant rather than bad input.
    pub fn is_internal(&self) -> bool {
        matches!(self, Self::Registry(_))
    }
}

/// Reconstructs conversations into sequence diagrams.
///
/// ## Algorithm
///
/// 1. Build the causal forest and walk it into traversal order
/// 2. Register every sending endpoint, then every processing endpoint
/// 3. For each record in order:
///    - Resolve both endpoints, appending first sightings to the diagram
///    - Deduplicate the sending and processing handlers, attaching new ones
///    - Classify the arrow and link it between the two handlers
///
/// A creator holds no per-pass state, so it can be shared across threads
/// and reused for any number of batches.
#[derive(Debug, Clone, Default)]
pub struct ModelCreator {
    options: CreatorOptions,
}

impl ModelCreator {
    /// Create a creator with the given options.
    pub fn new(options: CreatorOptions) -> Self {
        Self { options }
    }

    /// Get the options.
    pub fn options(&self) -> &CreatorOptions {
        &self.options
    }

    /// Reconstruct the diagram for one batch of records.
    pub fn create(&self, messages: &[StoredMessage]) -> Result<SequenceDiagram, ModelError> {
        let classifier = Classifier::new(&self.options);
        let forest = MessageForest::build(messages, &self.options);
        let steps: Vec<WalkStep<'_>> = forest.walk().collect();

        let mut registry = EndpointRegistry::new();
        for step in &steps {
            registry.register(classifier.sending_endpoint(step.message));
        }
        for step in &steps {
            registry.register(classifier.processing_endpoint(step.message));
        }

        let mut assembly = Assembly::new(&registry);

        for step in &steps {
            let message = step.message;

            let sending = assembly.place(&classifier.sending_endpoint(message))?;
            let processing = assembly.place(&classifier.processing_endpoint(message))?;

            let from = assembly
                .handlers
                .try_register(&mut assembly.diagram, classifier.sending_handler(step, sending));
            if from.is_new {
                assembly.diagram.attach_handler(from.handler);
            }

            let to = assembly
                .handlers
                .try_register(&mut assembly.diagram, classifier.processing_handler(message, processing));
            if to.is_new {
                assembly.diagram.attach_handler(to.handler);
            }

            let draft = classifier
                .arrow(message)
                .map_err(|source| ModelError::MalformedHeader {
                    message_id: message.message_id.clone(),
                    source,
                })?;

            let link = assembly.diagram.link(draft, from.handler, to.handler);
            if !link.incoming_set {
                tracing::warn!(
                    message_id = %message.message_id,
                    "Handler already has an incoming arrow, keeping the first"
                );
            }
        }

        let diagram = assembly.diagram;
        tracing::debug!(
            records = messages.len(),
            endpoints = diagram.num_endpoints(),
            handlers = diagram.num_handlers(),
            arrows = diagram.num_arrows(),
            "Built sequence diagram"
        );

        Ok(diagram)
    }
}

/// Reconstruct a diagram with default options.
pub fn create_diagram(messages: &[StoredMessage]) -> Result<SequenceDiagram, ModelError> {
    ModelCreator::default().create(messages)
}

/// Mutable state of one reconstruction pass.
struct Assembly<'r> {
    registry: &'r EndpointRegistry,
    placed: HashMap<EndpointSlot, EndpointId>,
    handlers: HandlerRegistry,
    diagram: SequenceDiagram,
}

impl<'r> Assembly<'r> {
    fn new(registry: &'r EndpointRegistry) -> Self {
        Self {
            registry,
            placed: HashMap::new(),
            handlers: HandlerRegistry::new(),
            diagram: SequenceDiagram::new(),
        }
    }

    /// Resolve a prototype to its diagram endpoint, appending it on first sight.
    fn place(&mut self, prototype: &EndpointItem) -> Result<EndpointId, RegistryError> {
        let slot = self.registry.get(prototype)?;
        if let Some(&id) = self.placed.get(&slot) {
            return Ok(id);
        }

        let id = self.diagram.push_endpoint(self.registry.item(slot).clone());
        self.placed.insert(slot, id);
        Ok(id)
    }
}
