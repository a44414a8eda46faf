//! Deduplicating registries used while assembling a diagram.
//!
//! Both registries are scoped to a single reconstruction pass.

pub mod endpoints;
pub mod handlers;

pub use endpoints::{EndpointRegistry, EndpointSlot, RegistryError};
pub use handlers::{HandlerRegistry, Registration};
