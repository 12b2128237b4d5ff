//! Core protocol types for LWW gossip
//!
//! All wire types are designed for deterministic serialization via postcard.
//! Field order matters for canonical encoding.

use crate::canonical::validate_node_name;
use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;

/// 32-byte fixed-size array used for identifiers.
pub type Bytes32 = [u8; 32];

// =============================================================================
// IDENTITY
// =============================================================================

/// Stable node identifier: BLAKE3("lww-gossip-node-v1:" || name)
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub Bytes32);

impl NodeId {
    /// Derive the identifier for a node name
    pub fn from_name(name: &str) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(b"lww-gossip-node-v1:");
        hasher.update(name.as_bytes());
        Self(*hasher.finalize().as_bytes())
    }

    pub fn as_bytes(&self) -> &Bytes32 {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(&self.0[..8]))
    }
}

// =============================================================================
// PEERS
// =============================================================================

/// A gossip target handed out by the membership provider for one round.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct PeerTarget {
    /// Identity, distinct from the local node's
    pub id: NodeId,
    /// Human-readable node name
    pub name: String,
    /// Where pushes are delivered
    pub addr: SocketAddr,
}

impl PeerTarget {
    /// Create a target, deriving its id from the name
    pub fn new(name: impl Into<String>, addr: SocketAddr) -> Self {
        let name = name.into();
        Self {
            id: NodeId::from_name(&name),
            name,
            addr,
        }
    }
}

impl fmt::Display for PeerTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.name, self.addr)
    }
}

/// Parses `name@host:port`.
impl FromStr for PeerTarget {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, addr) = s
            .split_once('@')
            .ok_or_else(|| Error::InvalidPeerSpec(s.to_string()))?;
        validate_node_name(name)?;
        let addr = addr.parse().map_err(|source| Error::InvalidAddress {
            addr: addr.to_string(),
            source,
        })?;
        Ok(Self::new(name, addr))
    }
}

// =============================================================================
// REPLICATED STATE
// =============================================================================

/// A consistent `(value, generation)` pair read under one lock acquisition.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Snapshot {
    pub value: i64,
    pub generation: u64,
}

impl fmt::Display for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "State: {} Generation: {}", self.value, self.generation)
    }
}

// =============================================================================
// GOSSIP
// =============================================================================

/// One pushed copy of the sender's state.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct GossipMessage {
    pub value: i64,
    pub generation: u64,
    /// Sender's node name. Provenance for logs only; never consulted by merge.
    pub origin: String,
}

impl GossipMessage {
    pub fn new(snapshot: Snapshot, origin: impl Into<String>) -> Self {
        Self {
            value: snapshot.value,
            generation: snapshot.generation,
            origin: origin.into(),
        }
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            value: self.value,
            generation: self.generation,
        }
    }
}
