//! Reconstruction options.
//!
//! Options are plain data with serde support so callers can load them from
//! whatever configuration source they own. The fingerprint lets downstream
//! caches key diagrams by the options they were built with.

use serde::{Deserialize, Serialize};

use crate::canonical::canonical_hash_hex;

/// Header key prefix written by NServiceBus.
pub const DEFAULT_HEADER_PREFIX: &str = "NServiceBus.";

/// Id of the sending handler of a root message.
pub const DEFAULT_ROOT_HANDLER_ID: &str = "First";

/// Options for [`crate::ModelCreator`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CreatorOptions {
    /// Prefix tolerated in front of header keys. Lookups match the bare key
    /// and the prefixed key, case-insensitively.
    pub header_prefix: String,
    /// Sentinel id for the sending handler of root messages.
    pub root_handler_id: String,
    /// Humanize type names for arrow names and saga labels.
    pub humanize_type_names: bool,
}

impl Default for CreatorOptions {
    fn default() -> Self {
        Self {
            header_prefix: DEFAULT_HEADER_PREFIX.to_string(),
            root_handler_id: DEFAULT_ROOT_HANDLER_ID.to_string(),
            humanize_type_names: true,
        }
    }
}

impl CreatorOptions {
    /// Options that keep raw type names.
    pub fn raw_names() -> Self {
        Self {
            humanize_type_names: false,
            ..Self::default()
        }
    }

    /// Set the header prefix.
    pub fn with_header_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.header_prefix = prefix.into();
        self
    }

    /// Set the root handler sentinel.
    pub fn with_root_handler_id(mut self, id: impl Into<String>) -> Self {
        self.root_handler_id = id.into();
        self
    }

    /// Stable hex hash of these options.
    pub fn fingerprint(&self) -> Result<String, serde_json::Error> {
        canonical_hash_hex(self)
    }
}
