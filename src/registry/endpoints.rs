//! Endpoint registry: version-tolerant endpoint deduplication.

use std::collections::BTreeMap;

use crate::types::{EndpointAddress, EndpointItem};

/// Error type for endpoint registry lookups.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    /// Lookup of an identity that was never registered.
    #[error("Endpoint not registered: {name} on {host} ({host_id})")]
    EndpointNotRegistered {
        /// Endpoint name.
        name: String,
        /// Endpoint host.
        host: String,
        /// Endpoint host id.
        host_id: String,
    },
}

impl RegistryError {
    fn not_registered(address: &EndpointAddress) -> Self {
        Self::EndpointNotRegistered {
            name: address.name.clone(),
            host: address.host.clone(),
            host_id: address.host_id.clone(),
        }
    }
}

/// Handle of a canonical endpoint stored in an [`EndpointRegistry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EndpointSlot(usize);

/// Canonical endpoint items bucketed by identity and told apart by version.
///
/// Buckets are keyed by `(name, host, host_id)`. Each bucket holds at most
/// one item per version, and holds an unversioned item only if that item
/// was registered into an empty bucket.
#[derive(Debug, Clone, Default)]
pub struct EndpointRegistry {
    items: Vec<EndpointItem>,
    buckets: BTreeMap<EndpointAddress, Vec<EndpointSlot>>,
}

impl EndpointRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an endpoint prototype.
    ///
    /// Returns the slot of a newly stored item, or `None` if an item with
    /// the same version exists or an unversioned item was skipped because
    /// the bucket is not empty.
    pub fn register(&mut self, item: EndpointItem) -> Option<EndpointSlot> {
        let bucket = self.buckets.entry(item.address.clone()).or_default();

        let exists = bucket
            .iter()
            .any(|slot| self.items[slot.0].version == item.version);
        if exists || (item.version.is_none() && !bucket.is_empty()) {
            return None;
        }

        let slot = EndpointSlot(self.items.len());
        self.items.push(item);
        bucket.push(slot);
        Some(slot)
    }

    /// Find the best canonical item for a prototype.
    ///
    /// Preference: a versioned item with the prototype's version, then any
    /// item with an equal version (unversioned to unversioned), then the
    /// bucket's first item.
    pub fn get(&self, prototype: &EndpointItem) -> Result<EndpointSlot, RegistryError> {
        let bucket = self
            .buckets
            .get(&prototype.address)
            .filter(|b| !b.is_empty())
            .ok_or_else(|| RegistryError::not_registered(&prototype.address))?;

        let version_at = |slot: EndpointSlot| self.items[slot.0].version.as_deref();

        let versioned = prototype
            .version
            .as_deref()
            .and_then(|wanted| bucket.iter().find(|s| version_at(**s) == Some(wanted)));

        Ok(*versioned
            .or_else(|| {
                bucket
                    .iter()
                    .find(|s| version_at(**s) == prototype.version.as_deref())
            })
            .unwrap_or(&bucket[0]))
    }

    /// Canonical item stored at `slot`.
    pub fn item(&self, slot: EndpointSlot) -> &EndpointItem {
        &self.items[slot.0]
    }

    /// All items of one identity, in registration order.
    pub fn versions_of(&self, address: &EndpointAddress) -> Vec<&EndpointItem> {
        self.buckets
            .get(address)
            .map(|b| b.iter().map(|s| &self.items[s.0]).collect())
            .unwrap_or_default()
    }

    /// Number of canonical items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether nothing was registered.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
