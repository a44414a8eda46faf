//! Header keys and prefix-tolerant header lookup.
//!
//! Some senders write `NServiceBus.RelatedTo`, others plain `RelatedTo`, in
//! any casing. Lookups accept both forms and return the first match in wire order.

use crate::types::Header;

/// Id of the message that caused this one.
pub const RELATED_TO: &str = "RelatedTo";

/// Version of the sending endpoint's messaging library.
pub const VERSION: &str = "Version";

/// Set to `true` on saga timeout messages.
pub const IS_SAGA_TIMEOUT: &str = "IsSagaTimeoutMessage";

/// Error parsing a header value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HeaderError {
    /// Value is not a boolean literal.
    #[error("Header {key} is not a boolean: {value:?}")]
    InvalidBool {
        /// Header key as looked up.
        key: String,
        /// Offending value.
        value: String,
    },
}

/// Find a header value by key, tolerating `prefix` and ignoring case.
pub fn find<'a>(headers: &'a [Header], key: &str, prefix: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|h| h.key.eq_ignore_ascii_case(key) || is_prefixed(&h.key, prefix, key))
        .map(|h| h.value.as_str())
}

fn is_prefixed(candidate: &str, prefix: &str, key: &str) -> bool {
    candidate.len() == prefix.len() + key.len()
        && candidate.is_char_boundary(prefix.len())
        && candidate[..prefix.len()].eq_ignore_ascii_case(prefix)
        && candidate[prefix.len()..].eq_ignore_ascii_case(key)
}

/// Read a boolean header. Missing or empty values read as `false`.
///
/// Accepts `true`/`false` in any casing with surrounding whitespace; any
/// other text is an error.
pub fn find_bool(headers: &[Header], key: &str, prefix: &str) -> Result<bool, HeaderError> {
    match find(headers, key, prefix) {
        None => Ok(false),
        Some(value) if value.is_empty() => Ok(false),
        Some(value) => parse_bool(value).ok_or_else(|| HeaderError::InvalidBool {
            key: key.to_string(),
            value: value.to_string(),
        }),
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    let trimmed = value.trim();
    if trimmed.eq_ignore_ascii_case("true") {
        Some(true)
    } else if trimmed.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}
