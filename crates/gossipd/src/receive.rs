//! Inbound push handling

use crate::stats::GossipStats;
use lww_gossip_core::{GossipMessage, VersionedValue};
use std::sync::Arc;
use tracing::{debug, info};

/// Applies pushed copies to the local register
#[derive(Clone)]
pub struct ReceiveHandler {
    value: Arc<VersionedValue>,
    stats: Arc<GossipStats>,
}

impl ReceiveHandler {
    pub fn new(value: Arc<VersionedValue>, stats: Arc<GossipStats>) -> Self {
        Self { value, stats }
    }

    /// Merge a pushed copy. Returns whether it was adopted; a stale or
    /// duplicate copy is a no-op, not an error.
    pub fn on_push(&self, msg: &GossipMessage) -> bool {
        let adopted = self.value.merge(msg.value, msg.generation);
        self.stats.record_merge(adopted);

        if adopted {
            info!(
                "NewVal: {} Gen: {} Notifier: {}",
                msg.value, msg.generation, msg.origin
            );
        } else {
            debug!(
                "Ignored generation {} from {} (local is newer or equal)",
                msg.generation, msg.origin
            );
        }
        adopted
    }
}
