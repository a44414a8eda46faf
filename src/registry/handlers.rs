//! Handler deduplication.

use std::collections::HashMap;

use crate::types::{EndpointId, Handler, HandlerId, SequenceDiagram};

/// Result of [`HandlerRegistry::try_register`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Registration {
    /// The canonical handler for the candidate's key.
    pub handler: HandlerId,
    /// Whether the candidate was stored (first sighting of its key).
    pub is_new: bool,
}

/// Ensures one handler per `(handler id, endpoint)` in a diagram.
///
/// Endpoints with different versions are different owners, so the key uses
/// the diagram's endpoint handle rather than the endpoint identity.
#[derive(Debug, Clone, Default)]
pub struct HandlerRegistry {
    lookup: HashMap<(String, EndpointId), HandlerId>,
}

impl HandlerRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the existing handler for the candidate's key, or store the
    /// candidate in `diagram` and return it as new.
    ///
    /// New handlers are stored but not attached to their endpoint's
    /// lifeline; that is the caller's first-time wiring.
    pub fn try_register(&mut self, diagram: &mut SequenceDiagram, candidate: Handler) -> Registration {
        let key = (candidate.id.clone(), candidate.endpoint);
        if let Some(&handler) = self.lookup.get(&key) {
            return Registration {
                handler,
                is_new: false,
            };
        }

        let handler = diagram.push_handler(candidate);
        self.lookup.insert(key, handler);
        Registration {
            handler,
            is_new: true,
        }
    }

    /// Number of distinct handlers seen.
    pub fn len(&self) -> usize {
        self.lookup.len()
    }

    /// Whether no handler was registered.
    pub fn is_empty(&self) -> bool {
        self.lookup.is_empty()
    }
}
