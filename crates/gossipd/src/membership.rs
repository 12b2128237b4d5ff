//! Static member registry
//!
//! Members are seeded from configuration and changed only through explicit
//! calls; there is no failure detector here. Every status change is logged
//! the way cluster membership events are.

use lww_gossip_core::{MembershipError, MembershipProvider, NodeId, PeerTarget};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::time::Instant;
use thiserror::Error;
use tracing::{info, warn};

/// Registry errors
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Unknown member: {0}")]
    UnknownMember(String),
    #[error("Refusing to register the local node as a peer: {0}")]
    LocalNode(String),
}

/// Member status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberStatus {
    /// Eligible for gossip
    Alive,
    /// Declared unreachable by an operator or embedding code
    Failed,
    /// Left the cluster voluntarily
    Left,
}

/// Member information
#[derive(Debug, Clone)]
pub struct Member {
    pub peer: PeerTarget,
    pub status: MemberStatus,
    /// When the member was first registered
    pub joined_at: Instant,
    /// Last status transition
    pub status_changed_at: Instant,
}

/// Member registry keyed by node name
pub struct MembershipManager {
    local_id: NodeId,
    local_name: String,
    members: RwLock<BTreeMap<String, Member>>,
}

impl MembershipManager {
    /// Create an empty registry for the named local node
    pub fn new(local_name: impl Into<String>) -> Self {
        let local_name = local_name.into();
        Self {
            local_id: NodeId::from_name(&local_name),
            local_name,
            members: RwLock::new(BTreeMap::new()),
        }
    }

    /// Create a registry seeded with peers; the local node is skipped
    pub fn with_peers(local_name: impl Into<String>, peers: impl IntoIterator<Item = PeerTarget>) -> Self {
        let manager = Self::new(local_name);
        for peer in peers {
            if let Err(e) = manager.join(peer) {
                warn!("Skipping seed peer: {}", e);
            }
        }
        manager
    }

    pub fn local_name(&self) -> &str {
        &self.local_name
    }

    /// Register a peer as alive, or revive a known one. Returns whether the
    /// member was new or changed status.
    pub fn join(&self, peer: PeerTarget) -> Result<bool, RegistryError> {
        if peer.id == self.local_id {
            return Err(RegistryError::LocalNode(peer.to_string()));
        }

        let now = Instant::now();
        let mut members = self.members.write();
        match members.get_mut(&peer.name) {
            Some(member) if member.status == MemberStatus::Alive && member.peer == peer => Ok(false),
            Some(member) => {
                info!("EventMemberUpdate: {} ({:?} -> Alive)", peer, member.status);
                member.peer = peer;
                member.status = MemberStatus::Alive;
                member.status_changed_at = now;
                Ok(true)
            }
            None => {
                info!("EventMemberJoin: {}", peer);
                members.insert(
                    peer.name.clone(),
                    Member {
                        peer,
                        status: MemberStatus::Alive,
                        joined_at: now,
                        status_changed_at: now,
                    },
                );
                Ok(true)
            }
        }
    }

    /// Mark a member as having left
    pub fn leave(&self, name: &str) -> Result<(), RegistryError> {
        self.set_status(name, MemberStatus::Left)
    }

    /// Mark a member as failed
    pub fn mark_failed(&self, name: &str) -> Result<(), RegistryError> {
        self.set_status(name, MemberStatus::Failed)
    }

    fn set_status(&self, name: &str, status: MemberStatus) -> Result<(), RegistryError> {
        let mut members = self.members.write();
        let member = members
            .get_mut(name)
            .ok_or_else(|| RegistryError::UnknownMember(name.to_string()))?;

        if member.status != status {
            match status {
                MemberStatus::Alive => info!("EventMemberUpdate: {} alive", member.peer),
                MemberStatus::Failed => info!("EventMemberFailed: {}", member.peer),
                MemberStatus::Left => info!("EventMemberLeave: {}", member.peer),
            }
            member.status = status;
            member.status_changed_at = Instant::now();
        }
        Ok(())
    }

    /// Check if a member is eligible for gossip
    pub fn is_alive(&self, name: &str) -> bool {
        self.members
            .read()
            .get(name)
            .map(|m| m.status == MemberStatus::Alive)
            .unwrap_or(false)
    }

    /// All members in name order, any status
    pub fn list_members(&self) -> Vec<Member> {
        self.members.read().values().cloned().collect()
    }

    /// Get membership stats
    pub fn stats(&self) -> MembershipStats {
        let members = self.members.read();
        let count = |status: MemberStatus| members.values().filter(|m| m.status == status).count();
        MembershipStats {
            total: members.len(),
            alive: count(MemberStatus::Alive),
            failed: count(MemberStatus::Failed),
            left: count(MemberStatus::Left),
        }
    }
}

impl MembershipProvider for MembershipManager {
    fn live_peers(&self) -> Result<Vec<PeerTarget>, MembershipError> {
        Ok(self
            .members
            .read()
            .values()
            .filter(|m| m.status == MemberStatus::Alive && m.peer.id != self.local_id)
            .map(|m| m.peer.clone())
            .collect())
    }
}

/// Membership statistics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MembershipStats {
    pub total: usize,
    pub alive: usize,
    pub failed: usize,
    pub left: usize,
}
