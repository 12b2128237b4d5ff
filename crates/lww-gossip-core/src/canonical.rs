//! Canonical encoding and boundary validation
//!
//! Wire structs use postcard serialization with strict constraints:
//! - Field order is Rust struct field order
//! - Integers are varint encoded (signed values zigzag first)
//! - Node names are validated before they enter a message or a peer list

use crate::error::{Error, Result};
use crate::types::GossipMessage;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Longest node name accepted on the wire or on the command line.
pub const MAX_NODE_NAME_LEN: usize = 255;

/// Serialize a value to canonical bytes using postcard.
pub fn canonical_bytes<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    postcard::to_allocvec(value).map_err(Error::from)
}

/// Deserialize canonical bytes produced by [`canonical_bytes`].
pub fn from_canonical_bytes<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    postcard::from_bytes(bytes).map_err(Error::from)
}

/// Check a node name: non-empty, bounded, printable, and free of `@`.
pub fn validate_node_name(name: &str) -> Result<()> {
    let reason = if name.is_empty() {
        "empty"
    } else if name.len() > MAX_NODE_NAME_LEN {
        "too long"
    } else if name.contains('@') {
        "contains '@'"
    } else if name.chars().any(|c| c.is_control() || c.is_whitespace()) {
        "contains whitespace or control characters"
    } else {
        return Ok(());
    };
    Err(Error::InvalidNodeName {
        name: name.to_string(),
        reason,
    })
}

/// Decode and validate an inbound gossip message.
pub fn decode_gossip_message(bytes: &[u8]) -> Result<GossipMessage> {
    let msg: GossipMessage = from_canonical_bytes(bytes)?;
    validate_node_name(&msg.origin)?;
    Ok(msg)
}
