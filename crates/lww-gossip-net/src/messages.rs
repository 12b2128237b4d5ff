//! Message serialization helpers
//!
//! Each frame type carries one postcard-encoded payload:
//!
//! | frame      | payload          |
//! |------------|------------------|
//! | `Push`     | `GossipMessage`  |
//! | `PushAck`  | `PushAck`        |
//! | `Set`      | `SetRequest`     |
//! | `Value`    | `Snapshot`       |
//! | `Rejected` | UTF-8 reason     |
//!
//! `Ping`, `Pong` and `Get` have empty payloads.

use crate::framing::{Frame, FrameType};
use lww_gossip_core::canonical::{canonical_bytes, decode_gossip_message, from_canonical_bytes};
use lww_gossip_core::{GossipMessage, Result, Snapshot};
use serde::{Deserialize, Serialize};

/// Reply to a push
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct PushAck {
    /// Whether the receiver adopted the pushed copy
    pub accepted: bool,
}

/// Local write request
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct SetRequest {
    pub value: i64,
}

impl Frame {
    pub fn push(msg: &GossipMessage) -> Result<Self> {
        Ok(Self::new(FrameType::Push, canonical_bytes(msg)?))
    }

    pub fn push_ack(accepted: bool) -> Result<Self> {
        Ok(Self::new(
            FrameType::PushAck,
            canonical_bytes(&PushAck { accepted })?,
        ))
    }

    pub fn set(value: i64) -> Result<Self> {
        Ok(Self::new(FrameType::Set, canonical_bytes(&SetRequest { value })?))
    }

    pub fn value(snapshot: Snapshot) -> Result<Self> {
        Ok(Self::new(FrameType::Value, canonical_bytes(&snapshot)?))
    }

    /// Decode a `Push` payload, validating the origin name
    pub fn to_gossip_message(&self) -> Result<GossipMessage> {
        decode_gossip_message(&self.payload)
    }

    pub fn to_push_ack(&self) -> Result<PushAck> {
        from_canonical_bytes(&self.payload)
    }

    pub fn to_set_request(&self) -> Result<SetRequest> {
        from_canonical_bytes(&self.payload)
    }

    pub fn to_snapshot(&self) -> Result<Snapshot> {
        from_canonical_bytes(&self.payload)
    }
}
