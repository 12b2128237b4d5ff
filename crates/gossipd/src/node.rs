//! The local replica and its accessors
//!
//! `Node` owns the register and is what presentation layers talk to: read the
//! value, write a new one, or hand over a copy pushed by a peer.

use crate::receive::ReceiveHandler;
use crate::stats::GossipStats;
use lww_gossip_core::{GossipMessage, Snapshot, VersionedValue};
use std::sync::Arc;
use tracing::{info, warn};

pub struct Node {
    name: String,
    value: Arc<VersionedValue>,
    receiver: ReceiveHandler,
    stats: Arc<GossipStats>,
}

impl Node {
    pub fn new(name: impl Into<String>, initial_value: i64) -> Self {
        let value = Arc::new(VersionedValue::new(initial_value));
        let stats = Arc::new(GossipStats::new());
        Self {
            name: name.into(),
            receiver: ReceiveHandler::new(value.clone(), stats.clone()),
            value,
            stats,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Shared register, for the disseminator
    pub fn value(&self) -> &Arc<VersionedValue> {
        &self.value
    }

    pub fn stats(&self) -> &Arc<GossipStats> {
        &self.stats
    }

    /// Current `(value, generation)`
    pub fn get(&self) -> Snapshot {
        self.value.read()
    }

    /// Local write; bumps the generation
    pub fn set(&self, value: i64) -> lww_gossip_core::Result<Snapshot> {
        let snapshot = self.value.write(value).map_err(|e| {
            warn!("Rejected local write of {}: {}", value, e);
            e
        })?;
        self.stats.record_local_write();
        info!("Set value {} (generation {})", snapshot.value, snapshot.generation);
        Ok(snapshot)
    }

    /// Apply a copy pushed by a peer; returns whether it was adopted
    pub fn notify(&self, msg: &GossipMessage) -> bool {
        self.receiver.on_push(msg)
    }
}
