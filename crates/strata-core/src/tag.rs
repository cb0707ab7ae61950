//! Identity tag codec.
//!
//! The dispatcher injects each entity's internal id into the backend's
//! property map under a reserved key. Backends that preserve unknown
//! properties across their own renames thereby let the dispatcher
//! re-discover the entity after an external rename.
//!
//! The reserved key and the value encoding are part of the external
//! interface: backends must not expose the key to end users, and the
//! combined-view builder strips it from presentable properties. A corrupted
//! value is treated as absent (logged, never fatal).

use std::collections::BTreeMap;

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;

/// Reserved property key carrying the identity tag.
pub const IDENTITY_TAG_KEY: &str = "strata.identifier";

/// Version prefix of the current tag encoding.
const TAG_PREFIX: &str = "v1-";

/// Encodes an internal id as an identity tag value.
///
/// The encoding is injective: the versioned prefix is followed by the
/// URL-safe base64 of the id's big-endian bytes.
#[must_use]
pub fn encode(id: u64) -> String {
    format!("{TAG_PREFIX}{}", URL_SAFE_NO_PAD.encode(id.to_be_bytes()))
}

/// Decodes an identity tag value back to the internal id.
///
/// Returns `None` on malformed input; a warning is logged so corrupted tags
/// surface in operator logs without failing the operation.
#[must_use]
pub fn decode(value: &str) -> Option<u64> {
    let decoded = value
        .strip_prefix(TAG_PREFIX)
        .and_then(|body| URL_SAFE_NO_PAD.decode(body).ok())
        .and_then(|bytes| <[u8; 8]>::try_from(bytes.as_slice()).ok())
        .map(u64::from_be_bytes);

    if decoded.is_none() {
        tracing::warn!(tag = %value, "malformed identity tag, treating as absent");
    }
    decoded
}

/// Returns a copy of `props` with the reserved key bound to the encoded id.
///
/// If the key was already present with a different value, the new value wins;
/// this only happens on the creation path, where the caller-supplied map is
/// not allowed to carry a foreign identity.
#[must_use]
pub fn inject_into(props: &BTreeMap<String, String>, id: u64) -> BTreeMap<String, String> {
    let mut out = props.clone();
    out.insert(IDENTITY_TAG_KEY.to_string(), encode(id));
    out
}

/// Reads and decodes the reserved key from a property map, if present.
#[must_use]
pub fn extract(props: &BTreeMap<String, String>) -> Option<u64> {
    props.get(IDENTITY_TAG_KEY).and_then(|v| decode(v))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_decode_roundtrip() {
        for id in [0, 1, 42, u64::MAX, u64::MAX >> 1] {
            assert_eq!(decode(&encode(id)), Some(id));
        }
    }

    #[test]
    fn inject_then_extract_recovers_id() {
        let mut props = BTreeMap::new();
        props.insert("k".to_string(), "v".to_string());

        let tagged = inject_into(&props, 42);
        assert_eq!(extract(&tagged), Some(42));
        assert_eq!(tagged.get("k").map(String::as_str), Some("v"));
        // Input map untouched.
        assert!(!props.contains_key(IDENTITY_TAG_KEY));
    }

    #[test]
    fn new_value_wins_on_reinjection() {
        let props = inject_into(&BTreeMap::new(), 7);
        let retagged = inject_into(&props, 99);
        assert_eq!(extract(&retagged), Some(99));
    }

    #[test]
    fn malformed_values_decode_to_none() {
        assert_eq!(decode(""), None);
        assert_eq!(decode("v1-"), None);
        assert_eq!(decode("v1-!!!!"), None);
        assert_eq!(decode("v2-AAAAAAAAAAA"), None);
        // Wrong payload length.
        assert_eq!(decode("v1-AAAA"), None);
    }

    #[test]
    fn extract_ignores_missing_key() {
        assert_eq!(extract(&BTreeMap::new()), None);
    }

    #[test]
    fn encoding_is_injective_for_distinct_ids() {
        assert_ne!(encode(1), encode(2));
        assert_ne!(encode(0), encode(u64::MAX));
    }
}
