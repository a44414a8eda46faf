//! # conversation-kernel
//!
//! Deterministic reconstruction of sequence diagrams from message audit records.
//!
//! The kernel answers one question:
//!
//! > Given an unordered batch of audited messages, who sent what to whom, in which causal order?
//!
//! ## Core Contract
//!
//! 1. Group records into causal trees via the related-to header
//! 2. Walk the trees parent-before-child, siblings by `(time_sent, processed_at)`
//! 3. Deduplicate endpoints (tolerating version skew) and handlers
//! 4. Emit exactly one classified arrow per record, linked sender to processor
//!
//! ## Architecture
//!
//! ```text
//! StoredMessage[] → MessageForest → Walk → Classifier → SequenceDiagram
//!                                            ↓
//!                          EndpointRegistry + HandlerRegistry
//! ```
//!
//! ## Determinism Guarantees
//!
//! - Same batch + same options → structurally equal diagram (equal fingerprint)
//! - Roots keep input order; only siblings are time-sorted
//! - Endpoints appear in first-seen traversal order, arrows in traversal order
//!
//! Reconstruction is pure and synchronous. Each call owns its registries, so
//! independent batches can be reconstructed on separate threads.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod types;
pub mod headers;
pub mod humanize;
pub mod options;
pub mod tree;
pub mod registry;
pub mod classify;
pub mod creator;
pub mod canonical;

// Re-exports
pub use types::{
    Arrow, ArrowDraft, ArrowId, ArrowType, EndpointAddress, EndpointId, EndpointItem, Handler,
    HandlerId, HandlerState, Header, Link, MessageIntent, MessageStatus, SagaInfo,
    SequenceDiagram, StoredMessage,
};
pub use headers::HeaderError;
pub use options::{CreatorOptions, DEFAULT_HEADER_PREFIX, DEFAULT_ROOT_HANDLER_ID};
pub use tree::{MessageForest, Walk, WalkStep};
pub use registry::{EndpointRegistry, EndpointSlot, HandlerRegistry, Registration, RegistryError};
pub use classify::Classifier;
pub use creator::{create_diagram, ModelCreator, ModelError};
pub use canonical::{canonical_hash, canonical_hash_hex, to_canonical_bytes};
